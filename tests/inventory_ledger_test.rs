// ==========================================
// 库存台账并发控制测试
// ==========================================
// 职责: 验证预留的原子性 (检查 + 变更在同一临界区)
// 场景: 可用 5, 两个并发预留各需 4 → 恰好一个成功
// ==========================================

#[path = "helpers/test_data_builder.rs"]
mod test_data_builder;

#[cfg(test)]
mod inventory_ledger_test {
    use crate::test_data_builder::ctx;
    use fab_quote_engine::domain::inventory::MaterialDemand;
    use fab_quote_engine::domain::types::{MovementKind, UnitOfMeasure};
    use fab_quote_engine::ledger::{InventoryLedger, LedgerError};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Barrier};
    use std::thread;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn ledger_with(material_id: &str, quantity: Decimal) -> Arc<InventoryLedger> {
        let ledger = Arc::new(InventoryLedger::new());
        ledger
            .register_item(material_id, material_id, UnitOfMeasure::Un)
            .unwrap();
        ledger
            .receive(material_id, quantity, Some("NF-1"), &ctx("almoxarifado"))
            .unwrap();
        ledger
    }

    fn demand(material_id: &str, quantity: Decimal) -> Vec<MaterialDemand> {
        vec![MaterialDemand::new(material_id, material_id, UnitOfMeasure::Un, quantity)]
    }

    // ==========================================
    // 测试用例 1: 两个并发预留只有一个成功
    // ==========================================

    #[test]
    fn test_concurrent_reservations_never_oversell() {
        for _round in 0..50 {
            let ledger = ledger_with("CHAPA-A", dec!(5));
            let barrier = Arc::new(Barrier::new(2));

            let handles: Vec<_> = ["OP-1", "OP-2"]
                .into_iter()
                .map(|order_id| {
                    let ledger = ledger.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        ledger.reserve(order_id, &demand("CHAPA-A", dec!(4)), &ctx("pcp"))
                    })
                })
                .collect();

            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            let ok = results.iter().filter(|r| r.is_ok()).count();
            assert_eq!(ok, 1);

            let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
            assert!(matches!(failure, LedgerError::InsufficientStock { .. }));
            assert_eq!(failure.shortfalls()[0].available, dec!(1));

            let item = ledger.item("CHAPA-A").unwrap();
            assert_eq!(item.reserved, dec!(4));
            assert_eq!(item.available(), dec!(1));
            assert!(ledger.verify_consistency().unwrap().is_empty());
        }
    }

    // ==========================================
    // 测试用例 2: 多线程小额预留总量不超可用
    // ==========================================

    #[test]
    fn test_many_small_reservations_stop_at_zero() {
        let ledger = ledger_with("TUBO", dec!(10));
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    ledger
                        .reserve(&format!("OP-{}", i), &demand("TUBO", dec!(1)), &ctx("pcp"))
                        .is_ok()
                })
            })
            .collect();

        let ok = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(ok, 10);
        assert_eq!(ledger.item("TUBO").unwrap().available(), Decimal::ZERO);
        assert!(ledger.verify_consistency().unwrap().is_empty());
    }

    // ==========================================
    // 测试用例 3: 并发消耗与释放保持流水一致
    // ==========================================

    #[test]
    fn test_concurrent_consume_and_release_keep_log_consistent() {
        let ledger = ledger_with("CHAPA-B", dec!(20));
        for i in 0..4 {
            ledger
                .reserve(&format!("OP-{}", i), &demand("CHAPA-B", dec!(5)), &ctx("pcp"))
                .unwrap();
        }

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    let order_id = format!("OP-{}", i);
                    if i % 2 == 0 {
                        ledger
                            .consume(&order_id, &demand("CHAPA-B", dec!(5)), &ctx("pcp"))
                            .map(|m| m.len())
                    } else {
                        ledger.release_order(&order_id, &ctx("pcp")).map(|m| m.len())
                    }
                })
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap().is_ok());
        }

        let item = ledger.item("CHAPA-B").unwrap();
        assert_eq!(item.total, dec!(10));
        assert_eq!(item.reserved, Decimal::ZERO);

        let exits = ledger
            .movements()
            .unwrap()
            .iter()
            .filter(|m| m.kind == MovementKind::Exit)
            .count();
        assert_eq!(exits, 2);
        assert!(ledger.verify_consistency().unwrap().is_empty());
    }
}

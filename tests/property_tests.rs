// ==========================================
// 属性测试
// ==========================================
// 职责: 对随机输入验证不变量
// - 排样: 件数守恒、不重叠、不越界、只用允许规格
// - 成本: 分类之和 == 总成本
// - 定价: 目标毛利恒等式、最终价格 >= 成本
// - 台账: 可用量检查幂等且不修改状态
// ==========================================

#[path = "helpers/test_data_builder.rs"]
mod test_data_builder;

use crate::test_data_builder::ctx;
use fab_quote_engine::config::catalog::StaticCatalog;
use fab_quote_engine::config::engine_config::{
    EngineConfig, NestingConfig, PricingConfig, TaxRegime,
};
use fab_quote_engine::domain::costing::{CostBreakdown, CostCategory, CostDetail, MarginMethod};
use fab_quote_engine::domain::inventory::MaterialDemand;
use fab_quote_engine::domain::nesting::SheetStock;
use fab_quote_engine::domain::part::{Bom, MaterialKey, PartSpec, ProductRequest, SheetPart};
use fab_quote_engine::domain::types::{ProductCategory, UnitOfMeasure};
use fab_quote_engine::engine::nesting::NestingOptimizer;
use fab_quote_engine::engine::pricing::PricingCalculator;
use fab_quote_engine::engine::quote_pipeline::QuotePipeline;
use fab_quote_engine::ledger::InventoryLedger;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

// ==========================================
// 生成器
// ==========================================

fn sheet_bom(pieces: &[(u32, u32, u32, bool)]) -> Bom {
    let parts = pieces
        .iter()
        .enumerate()
        .map(|(i, (length_mm, width_mm, quantity, thin))| {
            let thickness = if *thin { Decimal::new(8, 1) } else { Decimal::ONE };
            PartSpec::Sheet(SheetPart {
                part_id: format!("P{}", i),
                description: format!("peça {}", i),
                material: MaterialKey::new("inox304", thickness),
                length_mm: *length_mm,
                width_mm: *width_mm,
                quantity: *quantity,
                unit_weight_kg: Decimal::ONE,
            })
        })
        .collect();
    Bom {
        model_id: "teste".to_string(),
        category: ProductCategory::Worktop,
        parts,
        processes: Vec::new(),
    }
}

fn piece() -> impl Strategy<Value = (u32, u32, u32, bool)> {
    (50u32..=2000, 50u32..=1250, 1u32..=4, any::<bool>())
}

fn worktop_request() -> impl Strategy<Value = ProductRequest> {
    (400u32..=2900, 300u32..=900, 600u32..=1100, any::<bool>(), any::<bool>()).prop_map(
        |(l, w, h, backsplash, shelf)| {
            let mut request = ProductRequest::new("bancada-simples", l, w, h, "inox304");
            request.features.backsplash = backsplash;
            request.features.shelf = shelf;
            request
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // ==========================================
    // 排样
    // ==========================================

    #[test]
    fn prop_nesting_is_complete_and_valid(
        pieces in prop::collection::vec(piece(), 1..8),
        kerf in 0u32..=5,
    ) {
        let bom = sheet_bom(&pieces);
        let plan = NestingOptimizer::new()
            .nest(&bom, &SheetStock::PERMITTED, &NestingConfig { kerf_mm: kerf })
            .unwrap();

        prop_assert!(plan.verify(&bom).is_empty(), "{:?}", plan.verify(&bom));
        for group in &plan.groups {
            prop_assert!(group.stock.is_permitted());
        }
        let placed: usize = plan.groups.iter().map(|g| g.placement_count()).sum();
        let expected: u32 = pieces.iter().map(|p| p.2).sum();
        prop_assert_eq!(placed, expected as usize);
    }

    #[test]
    fn prop_nesting_is_deterministic(pieces in prop::collection::vec(piece(), 1..6)) {
        let bom = sheet_bom(&pieces);
        let optimizer = NestingOptimizer::new();
        let config = NestingConfig::default();
        let a = optimizer.nest(&bom, &SheetStock::PERMITTED, &config).unwrap();
        let b = optimizer.nest(&bom, &SheetStock::PERMITTED, &config).unwrap();
        prop_assert_eq!(a, b);
    }

    // ==========================================
    // 成本与定价
    // ==========================================

    #[test]
    fn prop_cost_categories_sum_to_total(request in worktop_request()) {
        let pipeline = QuotePipeline::new(Arc::new(StaticCatalog::default_table()));
        let snapshot = pipeline.calculate(&request, &EngineConfig::default_table()).unwrap();

        let sum: Decimal = snapshot.cost.categories().iter().map(|c| c.amount).sum();
        prop_assert_eq!(sum, snapshot.cost.total());
        prop_assert!(snapshot.unit_price() >= snapshot.cost.total());
        prop_assert!(snapshot.nesting.verify(&snapshot.bom).is_empty());
    }

    #[test]
    fn prop_target_margin_identity(
        cost_cents in 1i64..10_000_000,
        margin in 0i64..90,
        tax in 0i64..30,
    ) {
        let cost = Decimal::new(cost_cents, 2);
        let breakdown = CostBreakdown::from_details(vec![CostDetail {
            category: CostCategory::Materials,
            description: "material".to_string(),
            quantity: Decimal::ONE,
            unit_cost: cost,
            amount: cost,
        }]);
        let config = PricingConfig {
            margin_method: MarginMethod::TargetMargin,
            margin_pct: Decimal::from(margin),
            category_margin_overrides: BTreeMap::new(),
            allow_negative_margin: false,
            tax_regime: TaxRegime::Simplified { rate_pct: Decimal::from(tax) },
        };
        let result = PricingCalculator::new()
            .price(&breakdown, ProductCategory::Worktop, &config)
            .unwrap();

        let m = Decimal::from(margin) / Decimal::ONE_HUNDRED;
        let diff = (result.net_price * (Decimal::ONE - m) - cost).abs();
        prop_assert!(diff < Decimal::new(1, 8), "diff={}", diff);
        prop_assert!(result.final_unit_price >= cost);
        prop_assert_eq!(result.final_unit_price, result.final_unit_price.round_dp(2));
    }

    // ==========================================
    // 台账
    // ==========================================

    #[test]
    fn prop_check_availability_is_idempotent(
        stock in prop::collection::vec(0i64..100, 3),
        wanted in prop::collection::vec(0i64..150, 4),
    ) {
        let ledger = InventoryLedger::new();
        let ids = ["A", "B", "C", "D"];
        for (id, qty) in ids.iter().zip(stock.iter()) {
            ledger.register_item(id, id, UnitOfMeasure::Un).unwrap();
            if *qty > 0 {
                ledger.receive(id, Decimal::from(*qty), None, &ctx("almoxarifado")).unwrap();
            }
        }
        let demand: Vec<MaterialDemand> = ids
            .iter()
            .zip(wanted.iter())
            .filter(|(_, q)| **q > 0)
            .map(|(id, q)| MaterialDemand::new(id, id, UnitOfMeasure::Un, Decimal::from(*q)))
            .collect();

        let before = ledger.movements().unwrap().len();
        let first = ledger.check_availability(&demand).unwrap();
        let second = ledger.check_availability(&demand).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(ledger.movements().unwrap().len(), before);

        for shortfall in &first {
            prop_assert_eq!(shortfall.missing, shortfall.demanded - shortfall.available);
            prop_assert!(shortfall.missing > Decimal::ZERO);
            prop_assert_eq!(shortfall.known, shortfall.material_id != "D");
        }
    }
}

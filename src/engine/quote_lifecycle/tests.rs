use super::*;
use crate::config::catalog::StaticCatalog;
use crate::config::engine_config::EngineConfig;
use crate::domain::audit::AuditAction;
use crate::domain::costing::CostBreakdown;
use crate::domain::nesting::SheetStock;
use crate::domain::part::ProductRequest;
use crate::engine::quote_pipeline::QuotePipeline;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;

// ==========================================
// 测试辅助函数
// ==========================================

fn ctx() -> TransitionContext {
    TransitionContext::new("vendas", Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap())
}

fn worktop_snapshot() -> Arc<CalculationSnapshot> {
    let pipeline = QuotePipeline::new(Arc::new(StaticCatalog::default_table()));
    let request = ProductRequest::new("bancada-simples", 1200, 600, 850, "inox304");
    Arc::new(
        pipeline
            .calculate(&request, &EngineConfig::default_table())
            .unwrap(),
    )
}

/// 把排样改成不允许的 1800×1200 板
fn snapshot_with_disallowed_stock() -> Arc<CalculationSnapshot> {
    let mut snapshot = (*worktop_snapshot()).clone();
    let bad = SheetStock::new(1800, 1200);
    for group in &mut snapshot.nesting.groups {
        group.stock = bad;
        for sheet in &mut group.sheets {
            sheet.stock = bad;
        }
    }
    Arc::new(snapshot)
}

fn draft() -> Quote {
    Quote::draft("ORC-0001", "C-77", "Restaurante Sabor", 15, "vendas", ctx().at)
}

fn draft_with_line(quantity: u32) -> Quote {
    QuoteLifecycle::new()
        .add_line(&draft(), worktop_snapshot(), quantity, &ctx())
        .unwrap()
        .state
}

fn submitted() -> Quote {
    QuoteLifecycle::new()
        .transition(&draft_with_line(2), QuoteEvent::Submit, &ctx())
        .unwrap()
        .state
}

fn approved() -> Quote {
    QuoteLifecycle::new()
        .transition(&submitted(), QuoteEvent::Approve, &ctx())
        .unwrap()
        .state
}

// ==========================================
// 提交校验
// ==========================================

#[test]
fn test_submit_without_lines_fails_with_no_items() {
    let err = QuoteLifecycle::new()
        .transition(&draft(), QuoteEvent::Submit, &ctx())
        .unwrap_err();
    let violations = err.violations();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].code, "NO_ITEMS");
    assert!(err.to_string().contains("at least 1 item"));
}

#[test]
fn test_submit_with_disallowed_stock_size_fails() {
    let quote = QuoteLifecycle::new()
        .add_line(&draft(), snapshot_with_disallowed_stock(), 1, &ctx())
        .unwrap()
        .state;
    let err = QuoteLifecycle::new()
        .transition(&quote, QuoteEvent::Submit, &ctx())
        .unwrap_err();

    let disallowed: Vec<_> = err
        .violations()
        .iter()
        .filter(|v| v.code == "DISALLOWED_STOCK_SIZE")
        .collect();
    assert_eq!(disallowed.len(), 1);
    assert!(disallowed[0].message.contains("1800x1200"));
    assert_eq!(disallowed[0].line_no, Some(1));
}

#[test]
fn test_submit_reports_every_violation() {
    let mut broken = (*snapshot_with_disallowed_stock()).clone();
    broken.bom.model_id = "mesa-redonda".to_string();
    broken.cost = CostBreakdown::from_details(Vec::new());

    let lifecycle = QuoteLifecycle::new();
    let quote = lifecycle
        .add_line(&draft(), Arc::new(broken), 1, &ctx())
        .unwrap()
        .state;
    let violations = lifecycle.validate_for_submission(&quote);

    let codes: Vec<&str> = violations.iter().map(|v| v.code.as_str()).collect();
    assert!(codes.contains(&"UNKNOWN_MODEL"));
    assert!(codes.contains(&"DISALLOWED_STOCK_SIZE"));
    assert!(codes.contains(&"EMPTY_COST"));
}

#[test]
fn test_valid_quote_passes_validation() {
    assert!(QuoteLifecycle::new()
        .validate_for_submission(&draft_with_line(1))
        .is_empty());
}

// ==========================================
// 流转
// ==========================================

#[test]
fn test_happy_path_to_converted() {
    let lifecycle = QuoteLifecycle::new();
    let quote = draft_with_line(2);
    assert_eq!(quote.revision, 1);
    assert_eq!(quote.subtotal, quote.lines[0].unit_price * dec!(2));

    let submitted = lifecycle
        .transition(&quote, QuoteEvent::Submit, &ctx())
        .unwrap();
    assert_eq!(submitted.state.status, QuoteStatus::AwaitingApproval);
    assert_eq!(submitted.facts[0].action, AuditAction::QuoteSubmitted);
    assert_eq!(submitted.facts[0].before.as_ref().unwrap()["status"], "DRAFT");
    assert_eq!(
        submitted.facts[0].after.as_ref().unwrap()["status"],
        "AWAITING_APPROVAL"
    );

    let approved = lifecycle
        .transition(&submitted.state, QuoteEvent::Approve, &ctx())
        .unwrap();
    assert_eq!(approved.state.status, QuoteStatus::Approved);

    let converted = lifecycle
        .transition(
            &approved.state,
            QuoteEvent::Convert {
                order_id: "OP-1".to_string(),
            },
            &ctx(),
        )
        .unwrap();
    assert_eq!(converted.state.status, QuoteStatus::Converted);
    assert_eq!(converted.state.production_order_id.as_deref(), Some("OP-1"));
    assert_eq!(converted.state.revision, 4);
    assert_eq!(converted.facts[0].action, AuditAction::QuoteConverted);
}

#[test]
fn test_transition_does_not_mutate_input() {
    let quote = draft_with_line(1);
    let snapshot = quote.clone();
    let _ = QuoteLifecycle::new()
        .transition(&quote, QuoteEvent::Submit, &ctx())
        .unwrap();
    assert_eq!(quote, snapshot);
}

#[test]
fn test_second_conversion_fails() {
    let lifecycle = QuoteLifecycle::new();
    let converted = lifecycle
        .transition(
            &approved(),
            QuoteEvent::Convert {
                order_id: "OP-1".to_string(),
            },
            &ctx(),
        )
        .unwrap()
        .state;

    let err = lifecycle
        .transition(
            &converted,
            QuoteEvent::Convert {
                order_id: "OP-2".to_string(),
            },
            &ctx(),
        )
        .unwrap_err();
    assert_eq!(
        err,
        QuoteError::AlreadyConverted {
            quote_id: converted.quote_id.clone(),
            order_id: "OP-1".to_string(),
        }
    );
}

#[test]
fn test_convert_from_draft_is_invalid() {
    let err = QuoteLifecycle::new()
        .transition(
            &draft_with_line(1),
            QuoteEvent::Convert {
                order_id: "OP-1".to_string(),
            },
            &ctx(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        QuoteError::InvalidTransition {
            from: QuoteStatus::Draft,
            ..
        }
    ));
}

#[test]
fn test_reject_requires_reason_and_is_terminal() {
    let lifecycle = QuoteLifecycle::new();
    let err = lifecycle
        .transition(
            &submitted(),
            QuoteEvent::Reject {
                reason: "   ".to_string(),
            },
            &ctx(),
        )
        .unwrap_err();
    assert_eq!(err, QuoteError::EmptyReason);

    let rejected = lifecycle
        .transition(
            &submitted(),
            QuoteEvent::Reject {
                reason: "preço acima do orçamento".to_string(),
            },
            &ctx(),
        )
        .unwrap();
    assert_eq!(rejected.state.status, QuoteStatus::Rejected);
    assert_eq!(
        rejected.state.rejection_reason.as_deref(),
        Some("preço acima do orçamento")
    );
    assert_eq!(
        rejected.facts[0].detail.as_deref(),
        Some("preço acima do orçamento")
    );

    let err = lifecycle
        .transition(&rejected.state, QuoteEvent::Approve, &ctx())
        .unwrap_err();
    assert!(matches!(err, QuoteError::InvalidTransition { .. }));
}

#[test]
fn test_approve_after_validity_fails() {
    let late = TransitionContext::new("gerente", ctx().at + Duration::days(30));
    let err = QuoteLifecycle::new()
        .transition(&submitted(), QuoteEvent::Approve, &late)
        .unwrap_err();
    assert!(matches!(err, QuoteError::Expired { .. }));
}

// ==========================================
// 草稿编辑
// ==========================================

#[test]
fn test_editing_outside_draft_fails() {
    let err = QuoteLifecycle::new()
        .add_line(&submitted(), worktop_snapshot(), 1, &ctx())
        .unwrap_err();
    assert_eq!(
        err,
        QuoteError::NotEditable {
            status: QuoteStatus::AwaitingApproval
        }
    );
}

#[test]
fn test_add_line_rejects_zero_quantity() {
    let err = QuoteLifecycle::new()
        .add_line(&draft(), worktop_snapshot(), 0, &ctx())
        .unwrap_err();
    assert_eq!(err, QuoteError::InvalidQuantity { quantity: 0 });
}

#[test]
fn test_remove_line() {
    let lifecycle = QuoteLifecycle::new();
    let quote = lifecycle
        .add_line(&draft_with_line(1), worktop_snapshot(), 3, &ctx())
        .unwrap()
        .state;
    assert_eq!(quote.lines.len(), 2);

    let removed = lifecycle.remove_line(&quote, 1, &ctx()).unwrap().state;
    assert_eq!(removed.lines.len(), 1);
    assert_eq!(removed.lines[0].line_no, 2);
    assert_eq!(removed.subtotal, removed.lines[0].subtotal);

    let err = lifecycle.remove_line(&removed, 7, &ctx()).unwrap_err();
    assert_eq!(err, QuoteError::LineNotFound { line_no: 7 });
}

#[test]
fn test_set_discount() {
    let lifecycle = QuoteLifecycle::new();
    let quote = draft_with_line(1);

    let discounted = lifecycle
        .set_discount(&quote, Discount::Percent(dec!(10)), &ctx())
        .unwrap()
        .state;
    assert_eq!(
        discounted.discount_amount,
        crate::domain::costing::money(quote.subtotal * dec!(0.1))
    );
    assert_eq!(discounted.total, discounted.subtotal - discounted.discount_amount);

    let err = lifecycle
        .set_discount(&quote, Discount::Percent(dec!(120)), &ctx())
        .unwrap_err();
    assert!(matches!(err, QuoteError::InvalidDiscount(_)));

    let err = lifecycle
        .set_discount(&quote, Discount::Amount(dec!(-5)), &ctx())
        .unwrap_err();
    assert!(matches!(err, QuoteError::InvalidDiscount(_)));
}

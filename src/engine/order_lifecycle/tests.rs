use super::*;
use crate::config::catalog::StaticCatalog;
use crate::config::engine_config::EngineConfig;
use crate::domain::part::ProductRequest;
use crate::engine::quote_pipeline::QuotePipeline;
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use std::sync::Arc;

// ==========================================
// 测试辅助函数
// ==========================================

fn ctx() -> TransitionContext {
    TransitionContext::new("pcp", Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap())
}

fn approved_quote(quantity: u32) -> Quote {
    let pipeline = QuotePipeline::new(Arc::new(StaticCatalog::default_table()));
    let request = ProductRequest::new("bancada-simples", 1200, 600, 850, "inox304");
    let snapshot = pipeline
        .calculate(&request, &EngineConfig::default_table())
        .unwrap();

    let quotes = QuoteLifecycle::new();
    let quote = Quote::draft("ORC-0002", "C-10", "Padaria Central", 15, "vendas", ctx().at);
    let quote = quotes
        .add_line(&quote, Arc::new(snapshot), quantity, &ctx())
        .unwrap()
        .state;
    let quote = quotes
        .transition(&quote, QuoteEvent::Submit, &ctx())
        .unwrap()
        .state;
    quotes
        .transition(&quote, QuoteEvent::Approve, &ctx())
        .unwrap()
        .state
}

fn pending_order() -> ProductionOrder {
    OrderLifecycle::new()
        .create_from_quote(&approved_quote(1), OrderOptions::new("OP-0001"), &ctx())
        .unwrap()
        .order
}

fn apply(order: &ProductionOrder, event: OrderEvent) -> Result<ProductionOrder, OrderError> {
    OrderLifecycle::new()
        .transition(order, event, &ctx())
        .map(|t| t.state)
}

fn in_production() -> ProductionOrder {
    let reserved = apply(&pending_order(), OrderEvent::MaterialsReserved).unwrap();
    apply(&reserved, OrderEvent::Start).unwrap()
}

// ==========================================
// 订单创建
// ==========================================

#[test]
fn test_create_from_approved_quote() {
    let quote = approved_quote(3);
    let creation = OrderLifecycle::new()
        .create_from_quote(
            &quote,
            OrderOptions::new("OP-0001").with_priority(OrderPriority::High),
            &ctx(),
        )
        .unwrap();

    let order = &creation.order;
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.quote_id, quote.quote_id);
    assert_eq!(order.priority, OrderPriority::High);
    assert!(!order.materials_reserved);

    assert_eq!(creation.quote.status, QuoteStatus::Converted);
    assert_eq!(
        creation.quote.production_order_id.as_deref(),
        Some(order.order_id.as_str())
    );

    let actions: Vec<AuditAction> = creation.facts.iter().map(|f| f.action).collect();
    assert_eq!(actions, vec![AuditAction::QuoteConverted, AuditAction::OrderCreated]);
}

#[test]
fn test_demand_is_scaled_by_quantity() {
    let quote = approved_quote(3);
    let single = quote.lines[0].snapshot.material_demand();
    let demand = aggregate_demand(&quote);

    assert_eq!(demand.len(), single.len());
    for (total, one) in demand.iter().zip(single.iter()) {
        assert_eq!(total.material_id, one.material_id);
        assert_eq!(total.quantity, one.quantity * dec!(3));
    }
}

#[test]
fn test_create_requires_approved_quote() {
    let draft = Quote::draft("ORC-0003", "C-10", "Padaria Central", 15, "vendas", ctx().at);
    let err = OrderLifecycle::new()
        .create_from_quote(&draft, OrderOptions::new("OP-0002"), &ctx())
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::QuoteNotApproved {
            status: QuoteStatus::Draft,
            ..
        }
    ));
}

#[test]
fn test_quote_cannot_be_converted_twice() {
    let lifecycle = OrderLifecycle::new();
    let first = lifecycle
        .create_from_quote(&approved_quote(1), OrderOptions::new("OP-0001"), &ctx())
        .unwrap();

    let err = lifecycle
        .create_from_quote(&first.quote, OrderOptions::new("OP-0002"), &ctx())
        .unwrap_err();
    assert_eq!(
        err,
        OrderError::AlreadyConverted {
            quote_id: first.quote.quote_id.clone(),
            order_id: first.order.order_id.clone(),
        }
    );
}

// ==========================================
// 状态流转
// ==========================================

#[test]
fn test_start_requires_reservation() {
    let err = apply(&pending_order(), OrderEvent::Start).unwrap_err();
    assert!(matches!(err, OrderError::ReservationRequired { .. }));
}

#[test]
fn test_reserve_twice_is_invalid() {
    let reserved = apply(&pending_order(), OrderEvent::MaterialsReserved).unwrap();
    assert!(reserved.materials_reserved);
    let err = apply(&reserved, OrderEvent::MaterialsReserved).unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
}

#[test]
fn test_full_production_cycle() {
    let order = in_production();
    assert_eq!(order.status, OrderStatus::InProduction);
    assert!(order.materials_consumed);
    assert_eq!(order.started_at, Some(ctx().at));

    let paused = apply(
        &order,
        OrderEvent::Pause {
            reason: "falta de gás".to_string(),
        },
    )
    .unwrap();
    assert_eq!(paused.status, OrderStatus::Paused);
    assert_eq!(paused.pause_reason.as_deref(), Some("falta de gás"));

    let resumed = apply(
        &paused,
        OrderEvent::Resume {
            reason: "gás reposto".to_string(),
        },
    )
    .unwrap();
    assert_eq!(resumed.status, OrderStatus::InProduction);
    assert_eq!(resumed.pause_reason, None);

    let done = apply(&resumed, OrderEvent::Complete).unwrap();
    assert_eq!(done.status, OrderStatus::Completed);
    assert_eq!(done.completed_at, Some(ctx().at));
    assert_eq!(done.revision, order.revision + 3);
}

#[test]
fn test_pause_and_cancel_require_reason() {
    let err = apply(
        &in_production(),
        OrderEvent::Pause {
            reason: String::new(),
        },
    )
    .unwrap_err();
    assert_eq!(
        err,
        OrderError::EmptyReason {
            event: "PAUSE".to_string()
        }
    );

    let err = apply(
        &pending_order(),
        OrderEvent::Cancel {
            reason: "  ".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, OrderError::EmptyReason { .. }));
}

#[test]
fn test_cancel_only_while_pending() {
    let reserved = apply(&pending_order(), OrderEvent::MaterialsReserved).unwrap();
    let cancelled = apply(
        &reserved,
        OrderEvent::Cancel {
            reason: "cliente desistiu".to_string(),
        },
    )
    .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(!cancelled.materials_reserved);
    assert_eq!(cancelled.cancel_reason.as_deref(), Some("cliente desistiu"));

    let err = apply(
        &in_production(),
        OrderEvent::Cancel {
            reason: "cliente desistiu".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::InProduction,
            ..
        }
    ));
}

#[test]
fn test_terminal_states_accept_nothing() {
    let done = apply(&in_production(), OrderEvent::Complete).unwrap();
    for event in [
        OrderEvent::Start,
        OrderEvent::Complete,
        OrderEvent::Resume {
            reason: "x".to_string(),
        },
    ] {
        assert!(matches!(
            apply(&done, event),
            Err(OrderError::InvalidTransition { .. })
        ));
    }
}

#[test]
fn test_transition_fact_records_change() {
    let order = pending_order();
    let transition = OrderLifecycle::new()
        .transition(&order, OrderEvent::MaterialsReserved, &ctx())
        .unwrap();
    let fact = &transition.facts[0];
    assert_eq!(fact.action, AuditAction::MaterialsReserved);
    assert_eq!(fact.module, AuditModule::ProductionOrder);
    assert_eq!(fact.before.as_ref().unwrap()["materials_reserved"], false);
    assert_eq!(fact.after.as_ref().unwrap()["materials_reserved"], true);
    assert_eq!(fact.actor, "pcp");
}

// ==========================================
// 金属加工报价生产系统 - 命令行演示入口
// ==========================================
// 流程: 计算报价 → 审批 → 转生产订单 → 预留 → 开工 → 完工
// 环境变量: RUST_LOG (日志级别), FAB_QUOTE_CONFIG (配置文件)
// ==========================================

use anyhow::{Context, Result};
use fab_quote_engine::api::{OrderStore, ProductionApi, QuoteApi, QuoteStore};
use fab_quote_engine::config::catalog::StaticCatalog;
use fab_quote_engine::config::config_manager::ConfigManager;
use fab_quote_engine::domain::part::FeatureFlags;
use fab_quote_engine::domain::quote::Discount;
use fab_quote_engine::engine::events::{OptionalAuditPublisher, RecordingAuditPublisher};
use fab_quote_engine::engine::order_lifecycle::OrderOptions;
use fab_quote_engine::{
    logging, InventoryLedger, ProductRequest, QuotePipeline, TransitionContext, UnitOfMeasure,
};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn main() -> Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", fab_quote_engine::APP_NAME, fab_quote_engine::VERSION);
    tracing::info!("==================================================");

    let config = Arc::new(ConfigManager::load().context("加载配置失败")?);
    let pipeline = Arc::new(QuotePipeline::new(Arc::new(StaticCatalog::default_table())));
    let recorder = Arc::new(RecordingAuditPublisher::new());
    let publisher = OptionalAuditPublisher::with_publisher(recorder.clone());
    let quotes = Arc::new(QuoteStore::new());
    let ledger = Arc::new(InventoryLedger::new());

    let quote_api = QuoteApi::new(pipeline, config, quotes.clone(), publisher.clone());
    let production_api = ProductionApi::new(
        quotes,
        Arc::new(OrderStore::new()),
        ledger.clone(),
        publisher,
    );

    // 报价
    let sales = TransitionContext::now("vendas");
    let quote = quote_api.create_quote("ORC-0001", "C-001", "Restaurante Exemplo", 15, &sales)?;
    let worktop = ProductRequest::new("bancada-simples", 1900, 700, 900, "inox304").with_features(
        FeatureFlags {
            backsplash: true,
            shelf: true,
            ..FeatureFlags::default()
        },
    );
    let sink = ProductRequest::new("bancada-com-cuba", 1500, 600, 900, "inox304");
    quote_api.add_line(&quote.quote_id, &worktop, 2, &sales)?;
    quote_api.add_line(&quote.quote_id, &sink, 1, &sales)?;
    let quote = quote_api.set_discount(&quote.quote_id, Discount::Percent(dec!(5)), &sales)?;

    for line in &quote.lines {
        let snapshot = &line.snapshot;
        println!(
            "#{} {} x{}: chapas={} custo={} preço={}",
            line.line_no,
            snapshot.model_id(),
            line.quantity,
            snapshot.nesting.summary.total_sheets,
            snapshot.cost.total().round_dp(2),
            line.unit_price
        );
    }
    println!(
        "subtotal={} desconto={} total={}",
        quote.subtotal, quote.discount_amount, quote.total
    );

    quote_api.submit(&quote.quote_id, &sales)?;
    quote_api.approve(&quote.quote_id, &TransitionContext::now("gerente"))?;

    // 生产
    let pcp = TransitionContext::now("pcp");
    let order = production_api.create_order(&quote.quote_id, OrderOptions::new("OP-0001"), &pcp)?;

    for shortfall in production_api.check_materials(&order.order_id)? {
        let unit = order
            .demand
            .iter()
            .find(|d| d.material_id == shortfall.material_id)
            .map(|d| d.unit)
            .unwrap_or(UnitOfMeasure::Un);
        if !shortfall.known {
            ledger.register_item(&shortfall.material_id, &shortfall.material_id, unit)?;
        }
        ledger.receive(&shortfall.material_id, shortfall.missing, Some("NF-DEMO"), &pcp)?;
    }

    production_api.reserve_materials(&order.order_id, &pcp)?;
    production_api.start_production(&order.order_id, &pcp)?;
    let order = production_api.complete(&order.order_id, &pcp)?;
    println!("ordem {} status={}", order.order_no, order.status);

    let problems = ledger.verify_consistency()?;
    anyhow::ensure!(problems.is_empty(), "台账不一致: {:?}", problems);

    for fact in recorder.facts() {
        println!("audit: {} {} by {}", fact.action.as_str(), fact.record_name, fact.actor);
    }
    Ok(())
}

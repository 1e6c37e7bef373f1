// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use fab_quote_engine::api::{OrderStore, ProductionApi, QuoteApi, QuoteStore};
use fab_quote_engine::config::catalog::StaticCatalog;
use fab_quote_engine::config::config_manager::ConfigManager;
use fab_quote_engine::domain::inventory::MaterialDemand;
use fab_quote_engine::domain::part::{FeatureFlags, ProductRequest};
use fab_quote_engine::domain::types::Finish;
use fab_quote_engine::engine::events::{OptionalAuditPublisher, RecordingAuditPublisher};
use fab_quote_engine::engine::quote_pipeline::QuotePipeline;
use fab_quote_engine::engine::transition::TransitionContext;
use fab_quote_engine::ledger::InventoryLedger;
use rust_decimal::Decimal;
use std::sync::Arc;

// ==========================================
// ProductRequest 构建器
// ==========================================

pub struct RequestBuilder {
    request: ProductRequest,
}

impl RequestBuilder {
    pub fn worktop(length_mm: u32, width_mm: u32, height_mm: u32) -> Self {
        Self {
            request: ProductRequest::new(
                "bancada-simples",
                length_mm,
                width_mm,
                height_mm,
                "inox304",
            ),
        }
    }

    pub fn sink_worktop(length_mm: u32, width_mm: u32, height_mm: u32) -> Self {
        Self {
            request: ProductRequest::new(
                "bancada-com-cuba",
                length_mm,
                width_mm,
                height_mm,
                "inox304",
            ),
        }
    }

    pub fn shelf(length_mm: u32, width_mm: u32) -> Self {
        Self {
            request: ProductRequest::new("prateleira-lisa", length_mm, width_mm, 40, "inox430"),
        }
    }

    pub fn grade(mut self, grade_id: &str) -> Self {
        self.request.grade_id = grade_id.to_string();
        self
    }

    pub fn finish(mut self, finish: Finish) -> Self {
        self.request.finish = finish;
        self
    }

    pub fn backsplash(mut self) -> Self {
        self.request.features.backsplash = true;
        self
    }

    pub fn under_shelf(mut self) -> Self {
        self.request.features.shelf = true;
        self
    }

    pub fn basin(mut self) -> Self {
        self.request.features.basin = true;
        self
    }

    pub fn feet(mut self, count: u32) -> Self {
        self.request.features = FeatureFlags {
            feet_count: Some(count),
            ..self.request.features
        };
        self
    }

    pub fn build(self) -> ProductRequest {
        self.request
    }
}

// ==========================================
// 测试环境
// ==========================================

/// 固定时间点 (2026-03-02 09:00 UTC)
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

pub fn ctx(actor: &str) -> TransitionContext {
    TransitionContext::new(actor, fixed_time())
}

pub struct TestEnv {
    pub quote_api: QuoteApi,
    pub production_api: ProductionApi,
    pub ledger: Arc<InventoryLedger>,
    pub quotes: Arc<QuoteStore>,
    pub recorder: Arc<RecordingAuditPublisher>,
}

impl TestEnv {
    pub fn new() -> Self {
        let pipeline = Arc::new(QuotePipeline::new(Arc::new(StaticCatalog::default_table())));
        let recorder = Arc::new(RecordingAuditPublisher::new());
        let publisher = OptionalAuditPublisher::with_publisher(recorder.clone());
        let quotes = Arc::new(QuoteStore::new());
        let ledger = Arc::new(InventoryLedger::new());

        let quote_api = QuoteApi::new(
            pipeline,
            Arc::new(ConfigManager::default_table()),
            quotes.clone(),
            publisher.clone(),
        );
        let production_api = ProductionApi::new(
            quotes.clone(),
            Arc::new(OrderStore::new()),
            ledger.clone(),
            publisher,
        );

        Self {
            quote_api,
            production_api,
            ledger,
            quotes,
            recorder,
        }
    }

    /// 创建并批准报价单, 返回 quote_id
    pub fn approved_quote(&self, lines: &[(ProductRequest, u32)]) -> String {
        let sales = ctx("vendas");
        let quote = self
            .quote_api
            .create_quote("ORC-T", "C-T", "Cliente Teste", 30, &sales)
            .unwrap();
        for (request, quantity) in lines {
            self.quote_api
                .add_line(&quote.quote_id, request, *quantity, &sales)
                .unwrap();
        }
        self.quote_api.submit(&quote.quote_id, &sales).unwrap();
        self.quote_api
            .approve(&quote.quote_id, &ctx("gerente"))
            .unwrap();
        quote.quote_id
    }
}

/// 按需求登记物料并入库 (数量 = 需求 × factor)
pub fn stock_ledger(ledger: &InventoryLedger, demand: &[MaterialDemand], factor: Decimal) {
    let c = ctx("almoxarifado");
    for d in demand {
        if ledger.item(&d.material_id).is_err() {
            ledger
                .register_item(&d.material_id, &d.display_name, d.unit)
                .unwrap();
        }
        ledger
            .receive(&d.material_id, d.quantity * factor, Some("NF-TESTE"), &c)
            .unwrap();
    }
}

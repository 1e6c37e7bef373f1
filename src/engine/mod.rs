// ==========================================
// 金属加工报价生产系统 - 引擎层
// ==========================================
// 职责: BOM 生成、排样、成本、定价、报价单/生产订单状态机
// 红线: 引擎为纯计算, 不持有共享可变状态, 所有失败必须给出原因
// ==========================================

pub mod bom_builder;
pub mod cost_calculator;
pub mod error;
pub mod events;
pub mod nesting;
pub mod order_lifecycle;
pub mod pricing;
pub mod quote_lifecycle;
pub mod quote_pipeline;
pub mod transition;

// 重导出核心引擎
pub use bom_builder::{BomBuilder, ModelDefinition, ModelKind, ModelRegistry};
pub use cost_calculator::{estimate_process_times, CostCalculator, ProcessTime};
pub use error::{CalcError, CalcResult};
pub use events::{
    AuditFactPublisher, NoOpAuditPublisher, OptionalAuditPublisher, RecordingAuditPublisher,
};
pub use nesting::NestingOptimizer;
pub use order_lifecycle::{
    aggregate_demand, OrderCreation, OrderError, OrderEvent, OrderLifecycle, OrderOptions,
};
pub use pricing::PricingCalculator;
pub use quote_lifecycle::{QuoteError, QuoteEvent, QuoteLifecycle, QuoteViolation};
pub use quote_pipeline::QuotePipeline;
pub use transition::{Transition, TransitionContext};

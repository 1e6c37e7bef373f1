// ==========================================
// 金属加工报价生产系统 - 核心库
// ==========================================
// 范围: 参数化产品 → BOM → 排样 → 成本 → 定价 → 报价单 → 生产订单 → 库存台账
// 系统定位: 纯计算引擎 + 状态机 + 进程内库存台账 (无界面、无持久化)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 引擎配置与目录
pub mod config;

// 引擎层 - 计算与状态机
pub mod engine;

// 库存台账 - 唯一共享可变资源
pub mod ledger;

// API 层 - 业务接口
pub mod api;

// 日志系统
pub mod logging;

// 性能埋点
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    Finish, MovementKind, OrderPriority, OrderStatus, ProcessStep, ProductCategory, QuoteStatus,
    UnitOfMeasure,
};

// 领域实体
pub use domain::{
    AuditFact, Bom, CalculationSnapshot, CostBreakdown, FeatureFlags, MaterialDemand, NestingPlan,
    PricingResult, ProductRequest, ProductionOrder, Quote, SheetStock, Shortfall,
};

// 引擎
pub use engine::{
    BomBuilder, CalcError, CostCalculator, NestingOptimizer, OrderLifecycle, PricingCalculator,
    QuoteLifecycle, QuotePipeline, TransitionContext,
};

// 台账
pub use ledger::{InventoryLedger, LedgerError};

// API
pub use api::{ApiError, ProductionApi, QuoteApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "金属加工报价生产系统";

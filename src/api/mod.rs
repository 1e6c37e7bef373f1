// ==========================================
// 金属加工报价生产系统 - API 层
// ==========================================
// 职责: 组合引擎、库存台账、审计发布, 对外提供报价与生产接口
// ==========================================

pub mod error;
pub mod production_api;
pub mod quote_api;
pub mod store;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use production_api::ProductionApi;
pub use quote_api::QuoteApi;
pub use store::{InMemoryStore, OrderStore, QuoteStore, Record};

// ==========================================
// 金属加工报价生产系统 - 配置层
// ==========================================
// 职责: 引擎配置 (成本/定价/排样/工时)、目录查询接口
// 说明: 配置与目录均由调用方在计算前同步提供
// ==========================================

pub mod catalog;
pub mod config_manager;
pub mod engine_config;

// 重导出
pub use catalog::{AccessoryDefinition, CatalogLookup, MaterialGrade, StaticCatalog, TubeDefinition};
pub use config_manager::{
    config_keys, default_config_path, ConfigError, ConfigManager, ConfigSource,
};
pub use engine_config::{
    CostConfig, EngineConfig, NestingConfig, PricingConfig, ProcessTimeTable, TaxRegime,
};

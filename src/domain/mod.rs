// ==========================================
// 金属加工报价生产系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、值对象
// 红线: 不含引擎逻辑, 不含库存台账并发控制
// ==========================================

pub mod audit;
pub mod costing;
pub mod inventory;
pub mod nesting;
pub mod part;
pub mod production_order;
pub mod quote;
pub mod snapshot;
pub mod types;

// 重导出核心类型
pub use audit::{AuditAction, AuditFact, AuditModule};
pub use costing::{
    money, CategoryAmount, CostBreakdown, CostCategory, CostDetail, MarginMethod, PricingResult,
    TaxLine,
};
pub use inventory::{merge_demands, InventoryItem, MaterialDemand, Shortfall, StockMovement};
pub use nesting::{NestingPlan, NestingResult, NestingSummary, Placement, SheetInstance, SheetStock};
pub use part::{
    AccessoryPart, Bom, FeatureFlags, MaterialKey, PartSpec, ProductRequest, SheetPart, TubePart,
};
pub use production_order::ProductionOrder;
pub use quote::{Discount, Quote, QuoteLine};
pub use snapshot::{sheet_material_id, CalculationSnapshot};
pub use types::{
    Finish, MovementKind, OrderPriority, OrderStatus, ProcessStep, ProductCategory, QuoteStatus,
    UnitOfMeasure,
};

// ==========================================
// 金属加工报价生产系统 - BOM 生成引擎
// ==========================================
// 职责: 型号注册表 + 展开规则 → 零件清单与工序
// 红线: 未知型号/尺寸越界直接拒绝, 不做修正
// ==========================================

mod core;
mod models;
mod rules;


pub use core::BomBuilder;
pub use models::{DimensionRange, ModelDefinition, ModelKind, ModelRegistry};
pub(crate) use rules::has_basin;

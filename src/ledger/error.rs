// ==========================================
// 金属加工报价生产系统 - 库存台账错误类型
// ==========================================
// 分类:
// - 库存不足: 可由调用方补货后重试
// - 超量消耗/超量释放/负余额: 编程错误, 不重试
// ==========================================

use crate::domain::inventory::Shortfall;
use crate::domain::types::MovementKind;
use rust_decimal::Decimal;
use thiserror::Error;

/// 库存台账错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("未知物料: {material_id}")]
    UnknownMaterial { material_id: String },

    #[error("库存不足: {}", format_shortfalls(.shortfalls))]
    InsufficientStock { shortfalls: Vec<Shortfall> },

    #[error("消耗超出预留: material={material_id}, requested={requested}, reserved={reserved}")]
    OverConsumption {
        material_id: String,
        requested: Decimal,
        reserved: Decimal,
    },

    #[error("释放超出预留: material={material_id}, requested={requested}, reserved={reserved}")]
    OverRelease {
        material_id: String,
        requested: Decimal,
        reserved: Decimal,
    },

    #[error("预留类流水只能经由订单操作产生: material={material_id}, kind={kind}")]
    ReservationMovement {
        material_id: String,
        kind: MovementKind,
    },

    #[error("余额将为负: material={material_id}, total={total}, reserved={reserved}")]
    NegativeBalance {
        material_id: String,
        total: Decimal,
        reserved: Decimal,
    },

    #[error("数量无效: material={material_id}, quantity={quantity}")]
    InvalidQuantity {
        material_id: String,
        quantity: Decimal,
    },

    #[error("物料已登记: {material_id}")]
    DuplicateMaterial { material_id: String },

    #[error("台账锁获取失败: {0}")]
    LockPoisoned(String),
}

impl LedgerError {
    /// 缺口列表 (非库存不足错误返回空)
    pub fn shortfalls(&self) -> &[Shortfall] {
        match self {
            LedgerError::InsufficientStock { shortfalls } => shortfalls,
            _ => &[],
        }
    }
}

fn format_shortfalls(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| format!("{} 缺 {}", s.material_id, s.missing))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result 类型别名
pub type LedgerResult<T> = Result<T, LedgerError>;

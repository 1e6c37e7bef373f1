// ==========================================
// 金属加工报价生产系统 - 计算引擎错误类型
// ==========================================
// 分类:
// - 输入校验错误 (型号/尺寸/特征/毛利): 不重试, 返回可修正的明细
// - 政策违规 (零件超出标准板): 不重试
// - 配置缺失: 不重试, 属于配置问题
// ==========================================

use rust_decimal::Decimal;
use thiserror::Error;

/// 计算引擎错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    // ===== 输入校验错误 =====
    #[error("未知型号: {model_id}")]
    UnknownModel { model_id: String },

    #[error("尺寸超出范围 (model={model_id}, field={field}): 值 {value}mm 超出范围 [{min}, {max}]")]
    DimensionOutOfRange {
        model_id: String,
        field: String,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("特征参数无效 (model={model_id}): {message}")]
    InvalidFeature { model_id: String, message: String },

    #[error("毛利率无效: margin={margin_pct}%, {reason}")]
    InvalidMargin { margin_pct: Decimal, reason: String },

    #[error("税率无效: {0}")]
    InvalidTaxRate(String),

    // ===== 目录错误 =====
    #[error("未知材质: {grade_id}")]
    UnknownGrade { grade_id: String },

    #[error("未知管材: {tube_id}")]
    UnknownTube { tube_id: String },

    #[error("未知配件: {accessory_id}")]
    UnknownAccessory { accessory_id: String },

    // ===== 政策违规 =====
    #[error("零件超出标准板: part={part_id}, size={length_mm}x{width_mm}mm")]
    PieceExceedsStock {
        part_id: String,
        length_mm: u32,
        width_mm: u32,
    },

    #[error("不允许的标准板规格: {0}")]
    UnsupportedStockSize(String),

    // ===== 配置错误 =====
    #[error("配置缺失: {key}")]
    MissingConfig { key: String },

    #[error("配置无效: {0}")]
    InvalidConfig(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    Internal(String),
}

/// Result 类型别名
pub type CalcResult<T> = Result<T, CalcError>;

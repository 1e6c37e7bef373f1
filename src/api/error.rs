// ==========================================
// 金属加工报价生产系统 - API层错误类型
// ==========================================
// 职责: 汇总各层错误, 对外给出可解释的失败原因
// 规则: 仅库存不足可重试, 其余错误均为确定性失败
// ==========================================

use crate::config::config_manager::ConfigError;
use crate::engine::error::CalcError;
use crate::engine::order_lifecycle::OrderError;
use crate::engine::quote_lifecycle::{QuoteError, QuoteViolation};
use crate::ledger::error::LedgerError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 下层错误
    // ==========================================
    #[error("计算失败: {0}")]
    Calc(#[from] CalcError),

    #[error("报价单操作失败: {0}")]
    Quote(#[from] QuoteError),

    #[error("生产订单操作失败: {0}")]
    Order(#[from] OrderError),

    #[error("库存台账操作失败: {0}")]
    Ledger(#[from] LedgerError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    // ==========================================
    // 存储错误
    // ==========================================
    #[error("资源未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("资源已存在: {entity} with id={id}")]
    AlreadyExists { entity: String, id: String },

    #[error("版本冲突: {entity} id={id}, expected_revision={expected}, actual_revision={actual}")]
    RevisionConflict {
        entity: String,
        id: String,
        expected: u32,
        actual: u32,
    },

    #[error("存储锁获取失败: {0}")]
    LockPoisoned(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否可重试 (仅库存不足: 补货后可再次预留)
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Ledger(LedgerError::InsufficientStock { .. }))
    }

    /// 报价单提交校验违规 (其他错误返回空)
    pub fn violations(&self) -> &[QuoteViolation] {
        match self {
            ApiError::Quote(err) => err.violations(),
            ApiError::Order(OrderError::Quote(err)) => err.violations(),
            _ => &[],
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

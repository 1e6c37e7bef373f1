// ==========================================
// 金属加工报价生产系统 - 状态流转公共类型
// ==========================================
// 红线: 流转为纯函数, 返回新状态 + 审计事实, 不原地修改
// ==========================================

use crate::domain::audit::AuditFact;
use chrono::{DateTime, Utc};

/// 流转上下文 (操作人 + 时间, 由调用方提供)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionContext {
    pub actor: String,
    pub at: DateTime<Utc>,
}

impl TransitionContext {
    pub fn new(actor: &str, at: DateTime<Utc>) -> Self {
        Self {
            actor: actor.to_string(),
            at,
        }
    }

    /// 以当前时间创建
    pub fn now(actor: &str) -> Self {
        Self::new(actor, Utc::now())
    }
}

/// 流转结果
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T> {
    pub state: T,
    pub facts: Vec<AuditFact>,
}

impl<T> Transition<T> {
    pub fn new(state: T, fact: AuditFact) -> Self {
        Self {
            state,
            facts: vec![fact],
        }
    }

    pub fn into_parts(self) -> (T, Vec<AuditFact>) {
        (self.state, self.facts)
    }
}

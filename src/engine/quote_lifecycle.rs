// ==========================================
// 金属加工报价生产系统 - 报价单状态机
// ==========================================
// 状态: Draft → AwaitingApproval → {Approved | Rejected}; Approved → Converted
// 红线: 提交校验列出全部违规, 不在第一条处停止
// 红线: 已关联生产订单的报价单不可再次转换
// 红线: 仅草稿可编辑明细与折扣
// ==========================================

use crate::domain::audit::{AuditAction, AuditFact, AuditModule};
use crate::domain::quote::{Discount, Quote, QuoteLine};
use crate::domain::snapshot::CalculationSnapshot;
use crate::domain::types::QuoteStatus;
use crate::engine::bom_builder::ModelRegistry;
use crate::engine::transition::{Transition, TransitionContext};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

// ==========================================
// 事件与违规
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteEvent {
    Submit,
    Approve,
    Reject { reason: String },
    Convert { order_id: String },
}

impl QuoteEvent {
    pub fn name(&self) -> &'static str {
        match self {
            QuoteEvent::Submit => "SUBMIT",
            QuoteEvent::Approve => "APPROVE",
            QuoteEvent::Reject { .. } => "REJECT",
            QuoteEvent::Convert { .. } => "CONVERT",
        }
    }
}

/// 提交校验违规项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteViolation {
    pub code: String,
    pub line_no: Option<u32>,
    pub message: String,
}

impl QuoteViolation {
    fn quote(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            line_no: None,
            message: message.to_string(),
        }
    }

    fn line(code: &str, line_no: u32, message: String) -> Self {
        Self {
            code: code.to_string(),
            line_no: Some(line_no),
            message,
        }
    }
}

impl fmt::Display for QuoteViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_no {
            Some(n) => write!(f, "{} (line {}): {}", self.code, n, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

fn format_violations(violations: &[QuoteViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ==========================================
// QuoteError - 报价单错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    #[error("报价单校验失败: {}", format_violations(.violations))]
    Validation { violations: Vec<QuoteViolation> },

    #[error("报价单已转换为生产订单: quote_id={quote_id}, order_id={order_id}")]
    AlreadyConverted { quote_id: String, order_id: String },

    #[error("非法状态流转: {from} 不接受事件 {event}")]
    InvalidTransition { from: QuoteStatus, event: String },

    #[error("报价单不可编辑 (status={status})")]
    NotEditable { status: QuoteStatus },

    #[error("报价明细不存在: line_no={line_no}")]
    LineNotFound { line_no: u32 },

    #[error("折扣无效: {0}")]
    InvalidDiscount(String),

    #[error("数量无效: {quantity}")]
    InvalidQuantity { quantity: u32 },

    #[error("报价单已过期: valid_until={valid_until}")]
    Expired { valid_until: NaiveDate },

    #[error("驳回原因不能为空")]
    EmptyReason,
}

impl QuoteError {
    /// 校验违规列表 (非校验错误返回空)
    pub fn violations(&self) -> &[QuoteViolation] {
        match self {
            QuoteError::Validation { violations } => violations,
            _ => &[],
        }
    }
}

// ==========================================
// QuoteLifecycle - 报价单状态机
// ==========================================
pub struct QuoteLifecycle {
    registry: ModelRegistry,
}

impl QuoteLifecycle {
    pub fn new() -> Self {
        Self {
            registry: ModelRegistry::standard(),
        }
    }

    pub fn with_registry(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    // ==========================================
    // 提交校验
    // ==========================================

    /// 校验报价单是否可提交审批
    ///
    /// # 返回
    /// 全部违规项 (空表示通过)
    ///
    /// # 校验规则
    /// 1. 至少 1 条明细
    /// 2. 每条明细: 数量 > 0, 型号有效, BOM 非空, 排样非空且只用允许规格, 排样守恒, 成本非空
    pub fn validate_for_submission(&self, quote: &Quote) -> Vec<QuoteViolation> {
        let mut violations = Vec::new();

        if quote.lines.is_empty() {
            violations.push(QuoteViolation::quote(
                "NO_ITEMS",
                "quote requires at least 1 item",
            ));
        }

        for line in &quote.lines {
            let n = line.line_no;
            let snapshot = &line.snapshot;

            if line.quantity == 0 {
                violations.push(QuoteViolation::line("ZERO_QUANTITY", n, "数量必须大于 0".to_string()));
            }
            if !self.registry.contains(snapshot.model_id()) {
                violations.push(QuoteViolation::line(
                    "UNKNOWN_MODEL",
                    n,
                    format!("型号不在目录中: {}", snapshot.model_id()),
                ));
            }
            if snapshot.bom.is_empty() {
                violations.push(QuoteViolation::line("EMPTY_BOM", n, "BOM 为空".to_string()));
            }
            if snapshot.nesting.is_empty() {
                violations.push(QuoteViolation::line("EMPTY_NESTING", n, "排样结果为空".to_string()));
            }
            for problem in snapshot.nesting.verify(&snapshot.bom) {
                let code = if problem.starts_with("DISALLOWED_STOCK_SIZE") {
                    "DISALLOWED_STOCK_SIZE"
                } else {
                    "NESTING_INVARIANT"
                };
                violations.push(QuoteViolation::line(code, n, problem));
            }
            if snapshot.cost.is_empty() {
                violations.push(QuoteViolation::line("EMPTY_COST", n, "成本构成为空".to_string()));
            }
        }

        violations
    }

    // ==========================================
    // 状态流转
    // ==========================================

    /// 状态流转
    ///
    /// # 参数
    /// - `quote`: 当前报价单 (不修改)
    /// - `event`: 事件
    /// - `ctx`: 操作人与时间
    ///
    /// # 返回
    /// 新状态 + 审计事实
    #[instrument(
        skip(self, quote, event, ctx),
        fields(quote_id = %quote.quote_id, event = event.name())
    )]
    pub fn transition(
        &self,
        quote: &Quote,
        event: QuoteEvent,
        ctx: &TransitionContext,
    ) -> Result<Transition<Quote>, QuoteError> {
        // 已转换优先判断, 保证重复转换得到明确错误
        if let QuoteEvent::Convert { .. } = event {
            if let Some(order_id) = &quote.production_order_id {
                return Err(QuoteError::AlreadyConverted {
                    quote_id: quote.quote_id.clone(),
                    order_id: order_id.clone(),
                });
            }
        }

        let mut next = quote.clone();
        let (action, detail) = match (quote.status, &event) {
            (QuoteStatus::Draft, QuoteEvent::Submit) => {
                let violations = self.validate_for_submission(quote);
                if !violations.is_empty() {
                    warn!(violations = violations.len(), "报价单提交校验失败");
                    return Err(QuoteError::Validation { violations });
                }
                next.status = QuoteStatus::AwaitingApproval;
                (AuditAction::QuoteSubmitted, None)
            }
            (QuoteStatus::AwaitingApproval, QuoteEvent::Approve) => {
                if quote.is_expired_at(ctx.at) {
                    return Err(QuoteError::Expired {
                        valid_until: quote.valid_until,
                    });
                }
                next.status = QuoteStatus::Approved;
                (AuditAction::QuoteApproved, None)
            }
            (QuoteStatus::AwaitingApproval, QuoteEvent::Reject { reason }) => {
                let reason = reason.trim();
                if reason.is_empty() {
                    return Err(QuoteError::EmptyReason);
                }
                next.status = QuoteStatus::Rejected;
                next.rejection_reason = Some(reason.to_string());
                (AuditAction::QuoteRejected, Some(reason.to_string()))
            }
            (QuoteStatus::Approved, QuoteEvent::Convert { order_id }) => {
                next.status = QuoteStatus::Converted;
                next.production_order_id = Some(order_id.clone());
                (AuditAction::QuoteConverted, Some(format!("order_id={}", order_id)))
            }
            (from, event) => {
                return Err(QuoteError::InvalidTransition {
                    from,
                    event: event.name().to_string(),
                })
            }
        };

        let transition = Self::commit(quote, next, action, detail, ctx);
        info!(status = %transition.state.status, "报价单状态流转");
        Ok(transition)
    }

    // ==========================================
    // 草稿编辑
    // ==========================================

    /// 添加明细
    pub fn add_line(
        &self,
        quote: &Quote,
        snapshot: Arc<CalculationSnapshot>,
        quantity: u32,
        ctx: &TransitionContext,
    ) -> Result<Transition<Quote>, QuoteError> {
        Self::ensure_editable(quote)?;
        if quantity == 0 {
            return Err(QuoteError::InvalidQuantity { quantity });
        }

        let mut next = quote.clone();
        let line_no = next.next_line_no();
        let model_id = snapshot.model_id().to_string();
        next.lines.push(QuoteLine::new(line_no, snapshot, quantity));
        next.recalculate_totals();

        Ok(Self::commit(
            quote,
            next,
            AuditAction::QuoteLineAdded,
            Some(format!("line_no={}, model_id={}, quantity={}", line_no, model_id, quantity)),
            ctx,
        ))
    }

    /// 删除明细
    pub fn remove_line(
        &self,
        quote: &Quote,
        line_no: u32,
        ctx: &TransitionContext,
    ) -> Result<Transition<Quote>, QuoteError> {
        Self::ensure_editable(quote)?;

        let mut next = quote.clone();
        let before = next.lines.len();
        next.lines.retain(|l| l.line_no != line_no);
        if next.lines.len() == before {
            return Err(QuoteError::LineNotFound { line_no });
        }
        next.recalculate_totals();

        Ok(Self::commit(
            quote,
            next,
            AuditAction::QuoteLineRemoved,
            Some(format!("line_no={}", line_no)),
            ctx,
        ))
    }

    /// 设置折扣
    ///
    /// # 规则
    /// - 百分比折扣在 [0, 100]
    /// - 金额折扣非负 (超过小计时按小计封顶)
    pub fn set_discount(
        &self,
        quote: &Quote,
        discount: Discount,
        ctx: &TransitionContext,
    ) -> Result<Transition<Quote>, QuoteError> {
        Self::ensure_editable(quote)?;
        match discount {
            Discount::Percent(pct) if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED => {
                return Err(QuoteError::InvalidDiscount(format!(
                    "百分比折扣必须在 0~100 之间: {}",
                    pct
                )));
            }
            Discount::Amount(amount) if amount < Decimal::ZERO => {
                return Err(QuoteError::InvalidDiscount(format!(
                    "折扣金额不能为负: {}",
                    amount
                )));
            }
            _ => {}
        }

        let mut next = quote.clone();
        next.discount = discount;
        next.recalculate_totals();
        let detail = format!("discount_amount={}", next.discount_amount);

        Ok(Self::commit(
            quote,
            next,
            AuditAction::QuoteDiscountChanged,
            Some(detail),
            ctx,
        ))
    }

    fn ensure_editable(quote: &Quote) -> Result<(), QuoteError> {
        if !quote.is_draft() {
            return Err(QuoteError::NotEditable {
                status: quote.status,
            });
        }
        Ok(())
    }

    /// 提交新状态: revision + 1, 记录审计事实
    fn commit(
        before: &Quote,
        mut next: Quote,
        action: AuditAction,
        detail: Option<String>,
        ctx: &TransitionContext,
    ) -> Transition<Quote> {
        next.revision = before.revision + 1;
        next.updated_at = ctx.at;

        let mut fact = AuditFact::new(
            action,
            AuditModule::Quote,
            &next.quote_id,
            &next.quote_no,
            &ctx.actor,
            ctx.at,
        )
        .with_change(Some(before.audit_summary()), Some(next.audit_summary()));
        if let Some(detail) = detail {
            fact = fact.with_detail(detail);
        }

        Transition::new(next, fact)
    }
}

impl Default for QuoteLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;

// ==========================================
// 金属加工报价生产系统 - 生产订单状态机
// ==========================================
// 状态: PENDING → IN_PRODUCTION ⇄ PAUSED → COMPLETED; PENDING → CANCELLED
// 红线: 仅已批准且未转换的报价单可派生生产订单 (1:1)
// 红线: 开工前必须已预留物料, 开工即消耗
// 红线: 暂停/恢复/取消必须给出原因
// ==========================================

use crate::domain::audit::{AuditAction, AuditFact, AuditModule};
use crate::domain::inventory::{merge_demands, MaterialDemand};
use crate::domain::production_order::ProductionOrder;
use crate::domain::quote::Quote;
use crate::domain::types::{OrderPriority, OrderStatus, QuoteStatus};
use crate::engine::quote_lifecycle::{QuoteError, QuoteEvent, QuoteLifecycle};
use crate::engine::transition::{Transition, TransitionContext};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument};

// ==========================================
// 事件
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEvent {
    MaterialsReserved,
    Start,
    Pause { reason: String },
    Resume { reason: String },
    Complete,
    Cancel { reason: String },
}

impl OrderEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OrderEvent::MaterialsReserved => "MATERIALS_RESERVED",
            OrderEvent::Start => "START",
            OrderEvent::Pause { .. } => "PAUSE",
            OrderEvent::Resume { .. } => "RESUME",
            OrderEvent::Complete => "COMPLETE",
            OrderEvent::Cancel { .. } => "CANCEL",
        }
    }
}

// ==========================================
// OrderError - 生产订单错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("报价单未批准, 不能生成生产订单: quote_id={quote_id}, status={status}")]
    QuoteNotApproved { quote_id: String, status: QuoteStatus },

    #[error("报价单已转换为生产订单: quote_id={quote_id}, order_id={order_id}")]
    AlreadyConverted { quote_id: String, order_id: String },

    #[error("开工前必须预留物料: order_id={order_id}")]
    ReservationRequired { order_id: String },

    #[error("非法状态流转: {from} 不接受事件 {event}")]
    InvalidTransition { from: OrderStatus, event: String },

    #[error("{event} 必须给出原因")]
    EmptyReason { event: String },

    #[error(transparent)]
    Quote(#[from] QuoteError),
}

/// 生产订单创建参数
#[derive(Debug, Clone, Default)]
pub struct OrderOptions {
    pub order_no: String,
    pub priority: OrderPriority,
    pub forecast_date: Option<NaiveDate>,
}

impl OrderOptions {
    pub fn new(order_no: &str) -> Self {
        Self {
            order_no: order_no.to_string(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: OrderPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_forecast_date(mut self, date: NaiveDate) -> Self {
        self.forecast_date = Some(date);
        self
    }
}

/// 订单创建结果: 新订单 + 已转换的报价单 + 双方审计事实
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreation {
    pub order: ProductionOrder,
    pub quote: Quote,
    pub facts: Vec<AuditFact>,
}

// ==========================================
// OrderLifecycle - 生产订单状态机
// ==========================================
pub struct OrderLifecycle {
    quotes: QuoteLifecycle,
}

impl OrderLifecycle {
    pub fn new() -> Self {
        Self {
            quotes: QuoteLifecycle::new(),
        }
    }

    pub fn with_quote_lifecycle(quotes: QuoteLifecycle) -> Self {
        Self { quotes }
    }

    /// 由已批准报价单派生生产订单
    ///
    /// # 规则
    /// - 报价单已关联订单 → AlreadyConverted
    /// - 报价单非 APPROVED → QuoteNotApproved
    /// - 物料需求 = Σ(明细快照需求 × 数量), 按物料ID合并
    #[instrument(skip(self, quote, options, ctx), fields(quote_id = %quote.quote_id))]
    pub fn create_from_quote(
        &self,
        quote: &Quote,
        options: OrderOptions,
        ctx: &TransitionContext,
    ) -> Result<OrderCreation, OrderError> {
        if let Some(order_id) = &quote.production_order_id {
            return Err(OrderError::AlreadyConverted {
                quote_id: quote.quote_id.clone(),
                order_id: order_id.clone(),
            });
        }
        if quote.status != QuoteStatus::Approved {
            return Err(OrderError::QuoteNotApproved {
                quote_id: quote.quote_id.clone(),
                status: quote.status,
            });
        }

        let order_id = uuid::Uuid::new_v4().to_string();
        let converted = self.quotes.transition(
            quote,
            QuoteEvent::Convert {
                order_id: order_id.clone(),
            },
            ctx,
        )?;

        let order = ProductionOrder {
            order_id,
            order_no: options.order_no,
            quote_id: quote.quote_id.clone(),
            customer_name: quote.customer_name.clone(),
            demand: aggregate_demand(quote),
            status: OrderStatus::Pending,
            priority: options.priority,
            materials_reserved: false,
            materials_consumed: false,
            pause_reason: None,
            cancel_reason: None,
            opened_at: ctx.at,
            forecast_date: options.forecast_date,
            started_at: None,
            completed_at: None,
            updated_at: ctx.at,
            revision: 1,
        };

        let created = AuditFact::new(
            AuditAction::OrderCreated,
            AuditModule::ProductionOrder,
            &order.order_id,
            &order.order_no,
            &ctx.actor,
            ctx.at,
        )
        .with_change(None, Some(order.audit_summary()))
        .with_detail(format!("quote_no={}", quote.quote_no));

        let (quote, mut facts) = converted.into_parts();
        facts.push(created);

        info!(
            order_id = %order.order_id,
            demand_lines = order.demand.len(),
            "生产订单已创建"
        );
        Ok(OrderCreation { order, quote, facts })
    }

    /// 状态流转
    ///
    /// # 参数
    /// - `order`: 当前订单 (不修改)
    /// - `event`: 事件
    /// - `ctx`: 操作人与时间
    ///
    /// # 说明
    /// START 只在状态上标记已消耗, 实际库存消耗由调用方在提交新状态前完成
    #[instrument(
        skip(self, order, event, ctx),
        fields(order_id = %order.order_id, event = event.name())
    )]
    pub fn transition(
        &self,
        order: &ProductionOrder,
        event: OrderEvent,
        ctx: &TransitionContext,
    ) -> Result<Transition<ProductionOrder>, OrderError> {
        let mut next = order.clone();
        let (action, detail) = match (order.status, &event) {
            (OrderStatus::Pending, OrderEvent::MaterialsReserved) if !order.materials_reserved => {
                next.materials_reserved = true;
                (AuditAction::MaterialsReserved, None)
            }
            (OrderStatus::Pending, OrderEvent::Start) => {
                if !order.materials_reserved {
                    return Err(OrderError::ReservationRequired {
                        order_id: order.order_id.clone(),
                    });
                }
                next.status = OrderStatus::InProduction;
                next.started_at = Some(ctx.at);
                next.materials_consumed = true;
                (AuditAction::ProductionStarted, None)
            }
            (OrderStatus::InProduction, OrderEvent::Pause { reason }) => {
                let reason = required_reason(&event, reason)?;
                next.status = OrderStatus::Paused;
                next.pause_reason = Some(reason.clone());
                (AuditAction::ProductionPaused, Some(reason))
            }
            (OrderStatus::Paused, OrderEvent::Resume { reason }) => {
                let reason = required_reason(&event, reason)?;
                next.status = OrderStatus::InProduction;
                next.pause_reason = None;
                (AuditAction::ProductionResumed, Some(reason))
            }
            (OrderStatus::InProduction, OrderEvent::Complete) => {
                next.status = OrderStatus::Completed;
                next.completed_at = Some(ctx.at);
                (AuditAction::ProductionCompleted, None)
            }
            (OrderStatus::Pending, OrderEvent::Cancel { reason }) => {
                let reason = required_reason(&event, reason)?;
                next.status = OrderStatus::Cancelled;
                next.materials_reserved = false;
                next.cancel_reason = Some(reason.clone());
                (AuditAction::OrderCancelled, Some(reason))
            }
            (from, event) => {
                return Err(OrderError::InvalidTransition {
                    from,
                    event: event.name().to_string(),
                })
            }
        };

        next.revision = order.revision + 1;
        next.updated_at = ctx.at;

        let mut fact = AuditFact::new(
            action,
            AuditModule::ProductionOrder,
            &next.order_id,
            &next.order_no,
            &ctx.actor,
            ctx.at,
        )
        .with_change(Some(order.audit_summary()), Some(next.audit_summary()));
        if let Some(detail) = detail {
            fact = fact.with_detail(detail);
        }

        info!(status = %next.status, "生产订单状态流转");
        Ok(Transition::new(next, fact))
    }
}

impl Default for OrderLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// 报价单全部明细的物料需求 (按数量放大后合并)
pub fn aggregate_demand(quote: &Quote) -> Vec<MaterialDemand> {
    let scaled: Vec<MaterialDemand> = quote
        .lines
        .iter()
        .flat_map(|line| {
            let factor = Decimal::from(line.quantity);
            line.snapshot
                .material_demand()
                .into_iter()
                .map(move |d| d.scaled(factor))
        })
        .collect();
    merge_demands(&scaled)
}

fn required_reason(event: &OrderEvent, reason: &str) -> Result<String, OrderError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(OrderError::EmptyReason {
            event: event.name().to_string(),
        });
    }
    Ok(reason.to_string())
}

#[cfg(test)]
mod tests;

// ==========================================
// 金属加工报价生产系统 - 生产订单 API
// ==========================================
// 职责: 报价单转生产订单、物料检查/预留、开工/暂停/恢复/完工/取消
// 红线: 台账操作成功后才写回订单新状态 (失败不留下部分结果)
// 红线: 取消待生产订单时释放其全部预留
// 红线: 回滚只退回本次调用产生的台账变更
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::store::{OrderStore, QuoteStore};
use crate::domain::audit::{AuditAction, AuditFact, AuditModule};
use crate::domain::inventory::{Shortfall, StockMovement};
use crate::domain::production_order::ProductionOrder;
use crate::engine::events::OptionalAuditPublisher;
use crate::engine::order_lifecycle::{OrderEvent, OrderLifecycle, OrderOptions};
use crate::engine::transition::TransitionContext;
use crate::ledger::inventory_ledger::InventoryLedger;
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ==========================================
// ProductionApi - 生产订单 API
// ==========================================
pub struct ProductionApi {
    lifecycle: OrderLifecycle,
    quotes: Arc<QuoteStore>,
    orders: Arc<OrderStore>,
    ledger: Arc<InventoryLedger>,
    publisher: OptionalAuditPublisher,
}

impl ProductionApi {
    /// 创建生产订单 API
    ///
    /// # 参数
    /// - quotes: 报价单存储 (与报价单 API 共享)
    /// - orders: 生产订单存储
    /// - ledger: 库存台账 (注入, 全局唯一共享可变资源)
    /// - publisher: 审计事实发布者
    pub fn new(
        quotes: Arc<QuoteStore>,
        orders: Arc<OrderStore>,
        ledger: Arc<InventoryLedger>,
        publisher: OptionalAuditPublisher,
    ) -> Self {
        Self {
            lifecycle: OrderLifecycle::new(),
            quotes,
            orders,
            ledger,
            publisher,
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: OrderLifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    // ==========================================
    // 订单创建
    // ==========================================

    /// 由已批准报价单创建生产订单
    ///
    /// 报价单写回带 revision 校验, 并发转换同一报价单只有一个成功
    #[instrument(skip(self, options, ctx))]
    pub fn create_order(
        &self,
        quote_id: &str,
        options: OrderOptions,
        ctx: &TransitionContext,
    ) -> ApiResult<ProductionOrder> {
        let quote = self.quotes.get(quote_id)?;
        let creation = self.lifecycle.create_from_quote(&quote, options, ctx)?;

        self.quotes.replace(quote.revision, creation.quote)?;
        self.orders.insert(creation.order.clone())?;
        self.publisher.publish_all(&creation.facts);
        Ok(creation.order)
    }

    // ==========================================
    // 物料
    // ==========================================

    /// 物料缺口 (供缺料提示, 不修改状态)
    pub fn check_materials(&self, order_id: &str) -> ApiResult<Vec<Shortfall>> {
        let order = self.orders.get(order_id)?;
        Ok(self.ledger.check_availability(&order.demand)?)
    }

    /// 预留订单物料 (全有或全无)
    #[instrument(skip(self, ctx))]
    pub fn reserve_materials(
        &self,
        order_id: &str,
        ctx: &TransitionContext,
    ) -> ApiResult<ProductionOrder> {
        let order = self.orders.get(order_id)?;
        self.reserve_for(order, ctx)
    }

    fn reserve_for(
        &self,
        order: ProductionOrder,
        ctx: &TransitionContext,
    ) -> ApiResult<ProductionOrder> {
        let (next, mut facts) = self
            .lifecycle
            .transition(&order, OrderEvent::MaterialsReserved, ctx)?
            .into_parts();

        let movements = self.ledger.reserve(&order.order_id, &order.demand, ctx)?;
        if let Err(e) = self.orders.replace(order.revision, next.clone()) {
            // 写回失败时只退回本次预留的数量
            if let Err(release_err) = self.ledger.release(&order.order_id, &order.demand, ctx) {
                warn!(error = %release_err, "预留回滚失败");
            }
            return Err(e);
        }

        facts.push(stock_fact(AuditAction::StockReserved, &next, &movements, ctx));
        self.publisher.publish_all(&facts);
        Ok(next)
    }

    // ==========================================
    // 生产
    // ==========================================

    /// 开工: 要求已预留, 消耗预留物料后写回
    #[instrument(skip(self, ctx))]
    pub fn start_production(
        &self,
        order_id: &str,
        ctx: &TransitionContext,
    ) -> ApiResult<ProductionOrder> {
        let order = self.orders.get(order_id)?;
        let (next, mut facts) = self
            .lifecycle
            .transition(&order, OrderEvent::Start, ctx)?
            .into_parts();

        let movements = self.ledger.consume(&order.order_id, &order.demand, ctx)?;
        self.orders.replace(order.revision, next.clone())?;

        facts.push(stock_fact(AuditAction::StockConsumed, &next, &movements, ctx));
        self.publisher.publish_all(&facts);
        info!(order_no = %next.order_no, "生产已开工");
        Ok(next)
    }

    pub fn pause(
        &self,
        order_id: &str,
        reason: &str,
        ctx: &TransitionContext,
    ) -> ApiResult<ProductionOrder> {
        self.apply(
            order_id,
            OrderEvent::Pause {
                reason: reason.to_string(),
            },
            ctx,
        )
    }

    pub fn resume(
        &self,
        order_id: &str,
        reason: &str,
        ctx: &TransitionContext,
    ) -> ApiResult<ProductionOrder> {
        self.apply(
            order_id,
            OrderEvent::Resume {
                reason: reason.to_string(),
            },
            ctx,
        )
    }

    pub fn complete(&self, order_id: &str, ctx: &TransitionContext) -> ApiResult<ProductionOrder> {
        self.apply(order_id, OrderEvent::Complete, ctx)
    }

    /// 取消待生产订单, 释放其全部预留
    ///
    /// # 规则
    /// - 订单写回 (revision 校验) 先于释放, 并发取消只有一个释放预留
    /// - 释放失败时恢复订单原状态, 不发布审计事实
    #[instrument(skip(self, ctx))]
    pub fn cancel(
        &self,
        order_id: &str,
        reason: &str,
        ctx: &TransitionContext,
    ) -> ApiResult<ProductionOrder> {
        let order = self.orders.get(order_id)?;
        let (next, mut facts) = self
            .lifecycle
            .transition(
                &order,
                OrderEvent::Cancel {
                    reason: reason.to_string(),
                },
                ctx,
            )?
            .into_parts();

        self.orders.replace(order.revision, next.clone())?;
        let movements = match self.ledger.release_order(&order.order_id, ctx) {
            Ok(movements) => movements,
            Err(e) => {
                if let Err(restore_err) = self.orders.replace(next.revision, order) {
                    warn!(error = %restore_err, "取消回滚失败");
                }
                return Err(e.into());
            }
        };
        if !movements.is_empty() {
            facts.push(stock_fact(AuditAction::StockReleased, &next, &movements, ctx));
        }
        self.publisher.publish_all(&facts);
        Ok(next)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_order(&self, order_id: &str) -> ApiResult<ProductionOrder> {
        self.orders.get(order_id)
    }

    /// 报价单对应的生产订单
    pub fn order_for_quote(&self, quote_id: &str) -> ApiResult<ProductionOrder> {
        self.orders
            .find(|o| o.quote_id == quote_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "ProductionOrder".to_string(),
                id: format!("quote_id={}", quote_id),
            })
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    /// 无台账副作用的流转
    fn apply(
        &self,
        order_id: &str,
        event: OrderEvent,
        ctx: &TransitionContext,
    ) -> ApiResult<ProductionOrder> {
        let order = self.orders.get(order_id)?;
        let (next, facts) = self.lifecycle.transition(&order, event, ctx)?.into_parts();
        self.orders.replace(order.revision, next.clone())?;
        self.publisher.publish_all(&facts);
        Ok(next)
    }
}

/// 库存审计事实 (记录到订单名下)
fn stock_fact(
    action: AuditAction,
    order: &ProductionOrder,
    movements: &[StockMovement],
    ctx: &TransitionContext,
) -> AuditFact {
    let detail = movements
        .iter()
        .map(|m| format!("{} {} {}", m.kind, m.material_id, m.quantity))
        .collect::<Vec<_>>()
        .join("; ");
    AuditFact::new(
        action,
        AuditModule::Inventory,
        &order.order_id,
        &order.order_no,
        &ctx.actor,
        ctx.at,
    )
    .with_detail(detail)
}

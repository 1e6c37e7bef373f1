// ==========================================
// 金属加工报价生产系统 - 报价单 API
// ==========================================
// 职责: 报价计算、草稿编辑、提交/审批/驳回
// 说明: 状态机为纯函数, 本层负责读取 → 流转 → 乐观锁写回 → 发布审计事实
// ==========================================

use crate::api::error::ApiResult;
use crate::api::store::QuoteStore;
use crate::config::config_manager::ConfigManager;
use crate::domain::part::ProductRequest;
use crate::domain::quote::{Discount, Quote};
use crate::domain::snapshot::CalculationSnapshot;
use crate::engine::events::OptionalAuditPublisher;
use crate::engine::quote_lifecycle::{QuoteError, QuoteEvent, QuoteLifecycle};
use crate::engine::quote_pipeline::QuotePipeline;
use crate::engine::transition::{Transition, TransitionContext};
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// QuoteApi - 报价单 API
// ==========================================
pub struct QuoteApi {
    pipeline: Arc<QuotePipeline>,
    lifecycle: QuoteLifecycle,
    config: Arc<ConfigManager>,
    quotes: Arc<QuoteStore>,
    publisher: OptionalAuditPublisher,
}

impl QuoteApi {
    /// 创建报价单 API
    ///
    /// # 参数
    /// - pipeline: 报价计算编排器
    /// - config: 配置管理器 (每次计算读取当前配置)
    /// - quotes: 报价单存储 (与生产订单 API 共享)
    /// - publisher: 审计事实发布者
    pub fn new(
        pipeline: Arc<QuotePipeline>,
        config: Arc<ConfigManager>,
        quotes: Arc<QuoteStore>,
        publisher: OptionalAuditPublisher,
    ) -> Self {
        let lifecycle = QuoteLifecycle::with_registry(pipeline.bom_builder().registry().clone());
        Self {
            pipeline,
            lifecycle,
            config,
            quotes,
            publisher,
        }
    }

    // ==========================================
    // 计算
    // ==========================================

    /// 计算单个产品 (预览, 不落入报价单)
    pub fn calculate(&self, request: &ProductRequest) -> ApiResult<CalculationSnapshot> {
        Ok(self.pipeline.calculate(request, self.config.config())?)
    }

    // ==========================================
    // 草稿
    // ==========================================

    /// 新建草稿报价单
    pub fn create_quote(
        &self,
        quote_no: &str,
        customer_id: &str,
        customer_name: &str,
        valid_days: u32,
        ctx: &TransitionContext,
    ) -> ApiResult<Quote> {
        let quote = Quote::draft(
            quote_no,
            customer_id,
            customer_name,
            valid_days,
            &ctx.actor,
            ctx.at,
        );
        self.quotes.insert(quote.clone())?;
        info!(quote_id = %quote.quote_id, quote_no, "草稿报价单已创建");
        Ok(quote)
    }

    /// 计算并添加明细
    #[instrument(skip(self, request, ctx), fields(model_id = %request.model_id))]
    pub fn add_line(
        &self,
        quote_id: &str,
        request: &ProductRequest,
        quantity: u32,
        ctx: &TransitionContext,
    ) -> ApiResult<Quote> {
        let snapshot = Arc::new(self.calculate(request)?);
        self.apply(quote_id, |quote| {
            self.lifecycle.add_line(quote, snapshot.clone(), quantity, ctx)
        })
    }

    pub fn remove_line(
        &self,
        quote_id: &str,
        line_no: u32,
        ctx: &TransitionContext,
    ) -> ApiResult<Quote> {
        self.apply(quote_id, |quote| self.lifecycle.remove_line(quote, line_no, ctx))
    }

    pub fn set_discount(
        &self,
        quote_id: &str,
        discount: Discount,
        ctx: &TransitionContext,
    ) -> ApiResult<Quote> {
        self.apply(quote_id, |quote| self.lifecycle.set_discount(quote, discount, ctx))
    }

    // ==========================================
    // 审批流
    // ==========================================

    pub fn submit(&self, quote_id: &str, ctx: &TransitionContext) -> ApiResult<Quote> {
        self.apply(quote_id, |quote| {
            self.lifecycle.transition(quote, QuoteEvent::Submit, ctx)
        })
    }

    pub fn approve(&self, quote_id: &str, ctx: &TransitionContext) -> ApiResult<Quote> {
        self.apply(quote_id, |quote| {
            self.lifecycle.transition(quote, QuoteEvent::Approve, ctx)
        })
    }

    pub fn reject(
        &self,
        quote_id: &str,
        reason: &str,
        ctx: &TransitionContext,
    ) -> ApiResult<Quote> {
        self.apply(quote_id, |quote| {
            self.lifecycle.transition(
                quote,
                QuoteEvent::Reject {
                    reason: reason.to_string(),
                },
                ctx,
            )
        })
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_quote(&self, quote_id: &str) -> ApiResult<Quote> {
        self.quotes.get(quote_id)
    }

    /// 读取 → 流转 → 写回 → 发布
    fn apply<F>(&self, quote_id: &str, step: F) -> ApiResult<Quote>
    where
        F: FnOnce(&Quote) -> Result<Transition<Quote>, QuoteError>,
    {
        let current = self.quotes.get(quote_id)?;
        let (next, facts) = step(&current)?.into_parts();
        self.quotes.replace(current.revision, next.clone())?;
        self.publisher.publish_all(&facts);
        Ok(next)
    }
}

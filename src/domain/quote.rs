// ==========================================
// 金属加工报价生产系统 - 报价单领域模型
// ==========================================
// 职责: 报价单聚合根、报价明细、折扣
// 红线: 审批后不可变更 (仅允许状态流转与生产订单回写)
// 红线: 报价单 -> 生产订单 为显式引用 (production_order_id)
// ==========================================

use crate::domain::costing::money;
use crate::domain::snapshot::CalculationSnapshot;
use crate::domain::types::QuoteStatus;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ==========================================
// QuoteLine - 报价明细
// ==========================================
// 快照以 Arc 共享, 明细只持有只读引用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub line_no: u32,
    pub snapshot: Arc<CalculationSnapshot>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl QuoteLine {
    pub fn new(line_no: u32, snapshot: Arc<CalculationSnapshot>, quantity: u32) -> Self {
        let unit_price = snapshot.unit_price();
        Self {
            line_no,
            snapshot,
            quantity,
            unit_price,
            subtotal: unit_price * Decimal::from(quantity),
        }
    }
}

// ==========================================
// Discount - 折扣
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Discount {
    None,
    Percent(Decimal), // 百分比 (0-100)
    Amount(Decimal),  // 固定金额
}

impl Default for Discount {
    fn default() -> Self {
        Discount::None
    }
}

impl Discount {
    /// 折扣金额 (不超过小计)
    pub fn amount_for(&self, subtotal: Decimal) -> Decimal {
        let raw = match self {
            Discount::None => Decimal::ZERO,
            Discount::Percent(pct) => subtotal * *pct / Decimal::ONE_HUNDRED,
            Discount::Amount(amount) => *amount,
        };
        money(raw.min(subtotal).max(Decimal::ZERO))
    }
}

// ==========================================
// Quote - 报价单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    // ===== 主键 =====
    pub quote_id: String,
    pub quote_no: String,

    // ===== 客户 =====
    pub customer_id: String,
    pub customer_name: String,

    // ===== 明细与金额 =====
    pub lines: Vec<QuoteLine>,
    pub discount: Discount,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,

    // ===== 有效期 =====
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,

    // ===== 状态 =====
    pub status: QuoteStatus,
    pub production_order_id: Option<String>,
    pub rejection_reason: Option<String>,

    // ===== 审计 =====
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: u32,
}

impl Quote {
    /// 创建草稿报价单
    ///
    /// # 参数
    /// - `quote_no`: 报价单号 (展示用)
    /// - `customer_id` / `customer_name`: 客户引用
    /// - `valid_days`: 有效天数
    /// - `created_by`: 创建人
    /// - `now`: 创建时间
    pub fn draft(
        quote_no: &str,
        customer_id: &str,
        customer_name: &str,
        valid_days: u32,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let valid_from = now.date_naive();
        Self {
            quote_id: uuid::Uuid::new_v4().to_string(),
            quote_no: quote_no.to_string(),
            customer_id: customer_id.to_string(),
            customer_name: customer_name.to_string(),
            lines: Vec::new(),
            discount: Discount::None,
            subtotal: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            valid_from,
            valid_until: valid_from + chrono::Duration::days(valid_days as i64),
            status: QuoteStatus::Draft,
            production_order_id: None,
            rejection_reason: None,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.status == QuoteStatus::Draft
    }

    pub fn is_converted(&self) -> bool {
        self.production_order_id.is_some() || self.status == QuoteStatus::Converted
    }

    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        at.date_naive() > self.valid_until
    }

    pub fn next_line_no(&self) -> u32 {
        self.lines.iter().map(|l| l.line_no).max().unwrap_or(0) + 1
    }

    /// 重算小计/折扣/合计
    pub fn recalculate_totals(&mut self) {
        self.subtotal = self.lines.iter().map(|l| l.subtotal).sum();
        self.discount_amount = self.discount.amount_for(self.subtotal);
        self.total = self.subtotal - self.discount_amount;
    }

    /// 审计摘要 (before/after)
    pub fn audit_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status.to_string(),
            "lines": self.lines.len(),
            "subtotal": self.subtotal.to_string(),
            "total": self.total.to_string(),
            "production_order_id": self.production_order_id,
            "revision": self.revision,
        })
    }
}

// ==========================================
// 金属加工报价生产系统 - 生产订单领域模型
// ==========================================
// 职责: 生产订单聚合根 (由已批准报价单 1:1 派生)
// 红线: quote_id 必填; 物料需求在创建时一次性汇总, 之后不再变更
// ==========================================

use crate::domain::inventory::MaterialDemand;
use crate::domain::types::{OrderPriority, OrderStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrder {
    // ===== 主键与来源 =====
    pub order_id: String,
    pub order_no: String,
    pub quote_id: String,
    pub customer_name: String,

    // ===== 物料需求 (冗余快照) =====
    pub demand: Vec<MaterialDemand>,

    // ===== 状态 =====
    pub status: OrderStatus,
    pub priority: OrderPriority,
    pub materials_reserved: bool,
    pub materials_consumed: bool,
    pub pause_reason: Option<String>,
    pub cancel_reason: Option<String>,

    // ===== 日期 =====
    pub opened_at: DateTime<Utc>,
    pub forecast_date: Option<NaiveDate>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,

    pub updated_at: DateTime<Utc>,
    pub revision: u32,
}

impl ProductionOrder {
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// 审计摘要 (before/after)
    pub fn audit_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status.to_string(),
            "priority": self.priority.to_string(),
            "materials_reserved": self.materials_reserved,
            "materials_consumed": self.materials_consumed,
            "demand_lines": self.demand.len(),
            "revision": self.revision,
        })
    }
}

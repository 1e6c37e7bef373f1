// ==========================================
// 金属加工报价生产系统 - 审计事实领域模型
// ==========================================
// 红线: 每次状态流转必须产出审计事实
// 说明: 核心只负责产出, 持久化/保留策略由外部审计协作方决定
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// AuditFact - 审计事实
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFact {
    pub fact_id: String,           // 事实ID (UUID)
    pub action: AuditAction,       // 动作
    pub module: AuditModule,       // 模块
    pub record_id: String,         // 记录ID
    pub record_name: String,       // 记录名称 (报价单号/订单号/物料ID)
    pub before: Option<JsonValue>, // 变更前摘要
    pub after: Option<JsonValue>,  // 变更后摘要
    pub actor: String,             // 操作人
    pub at: DateTime<Utc>,         // 发生时间
    pub detail: Option<String>,    // 说明 (驳回原因/暂停原因等)
}

// ==========================================
// AuditModule - 模块
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditModule {
    Quote,
    ProductionOrder,
    Inventory,
}

// ==========================================
// AuditAction - 动作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    // ===== 报价单 =====
    QuoteLineAdded,
    QuoteLineRemoved,
    QuoteDiscountChanged,
    QuoteSubmitted,
    QuoteApproved,
    QuoteRejected,
    QuoteConverted,
    // ===== 生产订单 =====
    OrderCreated,
    MaterialsReserved,
    ProductionStarted,
    ProductionPaused,
    ProductionResumed,
    ProductionCompleted,
    OrderCancelled,
    // ===== 库存 =====
    StockReserved,
    StockConsumed,
    StockReleased,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::QuoteLineAdded => "QuoteLineAdded",
            AuditAction::QuoteLineRemoved => "QuoteLineRemoved",
            AuditAction::QuoteDiscountChanged => "QuoteDiscountChanged",
            AuditAction::QuoteSubmitted => "QuoteSubmitted",
            AuditAction::QuoteApproved => "QuoteApproved",
            AuditAction::QuoteRejected => "QuoteRejected",
            AuditAction::QuoteConverted => "QuoteConverted",
            AuditAction::OrderCreated => "OrderCreated",
            AuditAction::MaterialsReserved => "MaterialsReserved",
            AuditAction::ProductionStarted => "ProductionStarted",
            AuditAction::ProductionPaused => "ProductionPaused",
            AuditAction::ProductionResumed => "ProductionResumed",
            AuditAction::ProductionCompleted => "ProductionCompleted",
            AuditAction::OrderCancelled => "OrderCancelled",
            AuditAction::StockReserved => "StockReserved",
            AuditAction::StockConsumed => "StockConsumed",
            AuditAction::StockReleased => "StockReleased",
        }
    }
}

impl AuditFact {
    /// 创建新的审计事实
    ///
    /// # 参数
    /// - `action`: 动作
    /// - `module`: 模块
    /// - `record_id` / `record_name`: 记录标识
    /// - `actor`: 操作人
    /// - `at`: 发生时间
    pub fn new(
        action: AuditAction,
        module: AuditModule,
        record_id: &str,
        record_name: &str,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            fact_id: uuid::Uuid::new_v4().to_string(),
            action,
            module,
            record_id: record_id.to_string(),
            record_name: record_name.to_string(),
            before: None,
            after: None,
            actor: actor.to_string(),
            at,
            detail: None,
        }
    }

    /// 设置变更前后摘要
    pub fn with_change(mut self, before: Option<JsonValue>, after: Option<JsonValue>) -> Self {
        self.before = before;
        self.after = after;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// 生成展示ID
    pub fn get_display_id(&self) -> String {
        format!("{}_{}", self.action.as_str(), &self.fact_id[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_builder() {
        let fact = AuditFact::new(
            AuditAction::QuoteApproved,
            AuditModule::Quote,
            "Q1",
            "ORC-0001",
            "gerente",
            Utc::now(),
        )
        .with_change(
            Some(serde_json::json!({"status": "AWAITING_APPROVAL"})),
            Some(serde_json::json!({"status": "APPROVED"})),
        )
        .with_detail("ok");

        assert_eq!(fact.record_name, "ORC-0001");
        assert_eq!(fact.after.as_ref().unwrap()["status"], "APPROVED");
        assert!(fact.get_display_id().starts_with("QuoteApproved_"));

        let json = serde_json::to_value(&fact).unwrap();
        assert_eq!(json["module"], "QUOTE");
    }
}

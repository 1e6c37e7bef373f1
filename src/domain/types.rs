// ==========================================
// 金属加工报价生产系统 - 领域类型定义
// ==========================================
// 职责: 枚举类型与状态码 (序列化格式与外部存储一致)
// ==========================================

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 表面处理 (Finish)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Finish {
    Raw,      // 原色 (无表面处理工序)
    Brushed,  // 拉丝
    Polished, // 抛光
}

impl Finish {
    /// 表面处理工时系数 (相对拉丝)
    pub fn time_factor(&self) -> Decimal {
        match self {
            Finish::Raw => dec!(0),
            Finish::Brushed => dec!(1),
            Finish::Polished => dec!(2.5),
        }
    }
}

impl fmt::Display for Finish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finish::Raw => write!(f, "RAW"),
            Finish::Brushed => write!(f, "BRUSHED"),
            Finish::Polished => write!(f, "POLISHED"),
        }
    }
}

// ==========================================
// 产品类别 (Product Category)
// ==========================================
// 用途: 包装成本查表、分类毛利覆写
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    Worktop,     // 工作台
    SinkWorktop, // 水槽工作台
    Shelf,       // 层板
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductCategory::Worktop => write!(f, "WORKTOP"),
            ProductCategory::SinkWorktop => write!(f, "SINK_WORKTOP"),
            ProductCategory::Shelf => write!(f, "SHELF"),
        }
    }
}

// ==========================================
// 计量单位 (Unit of Measure)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitOfMeasure {
    Kg, // 千克
    M,  // 米
    Un, // 件/张
}

impl fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitOfMeasure::Kg => write!(f, "kg"),
            UnitOfMeasure::M => write!(f, "m"),
            UnitOfMeasure::Un => write!(f, "un"),
        }
    }
}

// ==========================================
// 工序 (Process Step)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStep {
    Cut,      // 下料
    Bend,     // 折弯
    Weld,     // 焊接
    Finish,   // 表面处理
    Assembly, // 装配
    Pack,     // 包装
}

impl ProcessStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStep::Cut => "CUT",
            ProcessStep::Bend => "BEND",
            ProcessStep::Weld => "WELD",
            ProcessStep::Finish => "FINISH",
            ProcessStep::Assembly => "ASSEMBLY",
            ProcessStep::Pack => "PACK",
        }
    }
}

impl fmt::Display for ProcessStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 报价单状态 (Quote Status)
// ==========================================
// 状态机: DRAFT -> AWAITING_APPROVAL -> {APPROVED | REJECTED}
//         APPROVED -> CONVERTED (生成生产订单, 单向)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Draft,            // 草稿
    AwaitingApproval, // 待审批
    Approved,         // 已批准
    Rejected,         // 已驳回
    Converted,        // 已转生产
}

impl QuoteStatus {
    /// 终态判断 (REJECTED / CONVERTED 不再接受任何事件)
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuoteStatus::Rejected | QuoteStatus::Converted)
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteStatus::Draft => write!(f, "DRAFT"),
            QuoteStatus::AwaitingApproval => write!(f, "AWAITING_APPROVAL"),
            QuoteStatus::Approved => write!(f, "APPROVED"),
            QuoteStatus::Rejected => write!(f, "REJECTED"),
            QuoteStatus::Converted => write!(f, "CONVERTED"),
        }
    }
}

// ==========================================
// 生产订单状态 (Production Order Status)
// ==========================================
// 状态机: PENDING -> {IN_PRODUCTION <-> PAUSED} -> COMPLETED
//         PENDING -> CANCELLED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,      // 待生产
    InProduction, // 生产中
    Paused,       // 暂停
    Completed,    // 已完工
    Cancelled,    // 已取消
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::InProduction => write!(f, "IN_PRODUCTION"),
            OrderStatus::Paused => write!(f, "PAUSED"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// ==========================================
// 生产优先级 (Order Priority)
// ==========================================
// 顺序: Low < Normal < High < Urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for OrderPriority {
    fn default() -> Self {
        OrderPriority::Normal
    }
}

impl fmt::Display for OrderPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderPriority::Low => write!(f, "LOW"),
            OrderPriority::Normal => write!(f, "NORMAL"),
            OrderPriority::High => write!(f, "HIGH"),
            OrderPriority::Urgent => write!(f, "URGENT"),
        }
    }
}

// ==========================================
// 库存流水类型 (Movement Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    Entry,   // 入库 (total +)
    Exit,    // 出库 (total -)
    Reserve, // 预留 (reserved +)
    Release, // 释放预留 (reserved -)
    Adjust,  // 盘点调整 (total ±)
}

impl MovementKind {
    /// 数量为 quantity 的该类流水对 (总量, 预留量) 的增量
    pub fn deltas(&self, quantity: Decimal) -> (Decimal, Decimal) {
        match self {
            MovementKind::Entry | MovementKind::Adjust => (quantity, Decimal::ZERO),
            MovementKind::Exit => (-quantity, Decimal::ZERO),
            MovementKind::Reserve => (Decimal::ZERO, quantity),
            MovementKind::Release => (Decimal::ZERO, -quantity),
        }
    }

    /// 是否改变预留量 (只能经由订单预留/消耗/释放产生)
    pub fn touches_reservation(&self) -> bool {
        matches!(self, MovementKind::Reserve | MovementKind::Release)
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementKind::Entry => write!(f, "ENTRY"),
            MovementKind::Exit => write!(f, "EXIT"),
            MovementKind::Reserve => write!(f, "RESERVE"),
            MovementKind::Release => write!(f, "RELEASE"),
            MovementKind::Adjust => write!(f, "ADJUST"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization_is_screaming_snake_case() {
        let json = serde_json::to_string(&QuoteStatus::AwaitingApproval).unwrap();
        assert_eq!(json, "\"AWAITING_APPROVAL\"");

        let parsed: OrderStatus = serde_json::from_str("\"IN_PRODUCTION\"").unwrap();
        assert_eq!(parsed, OrderStatus::InProduction);
    }

    #[test]
    fn test_terminal_states() {
        assert!(QuoteStatus::Converted.is_terminal());
        assert!(QuoteStatus::Rejected.is_terminal());
        assert!(!QuoteStatus::Approved.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Paused.is_terminal());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(OrderPriority::Urgent > OrderPriority::High);
        assert!(OrderPriority::Low < OrderPriority::Normal);
        assert_eq!(OrderPriority::default(), OrderPriority::Normal);
    }
}

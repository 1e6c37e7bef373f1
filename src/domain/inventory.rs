// ==========================================
// 金属加工报价生产系统 - 库存领域模型
// ==========================================
// 职责: 库存台账条目、库存流水、物料需求、缺口
// 红线: 可用量 = 总量 - 预留量, 两者均不得为负
// 红线: 流水只追加, 余额可由流水重放得到
// ==========================================

use crate::domain::types::{MovementKind, UnitOfMeasure};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// MaterialDemand - 物料需求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDemand {
    pub material_id: String,
    pub display_name: String,
    pub unit: UnitOfMeasure,
    pub quantity: Decimal,
}

impl MaterialDemand {
    pub fn new(
        material_id: &str,
        display_name: &str,
        unit: UnitOfMeasure,
        quantity: Decimal,
    ) -> Self {
        Self {
            material_id: material_id.to_string(),
            display_name: display_name.to_string(),
            unit,
            quantity,
        }
    }

    pub fn scaled(&self, factor: Decimal) -> Self {
        Self {
            quantity: self.quantity * factor,
            ..self.clone()
        }
    }
}

/// 按物料ID合并需求 (输出按物料ID排序, 保证确定性)
pub fn merge_demands<'a, I>(demands: I) -> Vec<MaterialDemand>
where
    I: IntoIterator<Item = &'a MaterialDemand>,
{
    let mut merged: BTreeMap<String, MaterialDemand> = BTreeMap::new();
    for d in demands {
        merged
            .entry(d.material_id.clone())
            .and_modify(|m| m.quantity += d.quantity)
            .or_insert_with(|| d.clone());
    }
    merged.into_values().collect()
}

// ==========================================
// Shortfall - 库存缺口
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortfall {
    pub material_id: String,
    pub demanded: Decimal,
    pub available: Decimal,
    pub missing: Decimal,
    pub known: bool, // false: 台账中不存在该物料 (缺口=全部需求)
}

// ==========================================
// InventoryItem - 库存台账条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub material_id: String,
    pub display_name: String,
    pub unit: UnitOfMeasure,
    pub total: Decimal,    // 账面总量
    pub reserved: Decimal, // 已预留
}

impl InventoryItem {
    pub fn new(material_id: &str, display_name: &str, unit: UnitOfMeasure) -> Self {
        Self {
            material_id: material_id.to_string(),
            display_name: display_name.to_string(),
            unit,
            total: Decimal::ZERO,
            reserved: Decimal::ZERO,
        }
    }

    /// 可用量
    pub fn available(&self) -> Decimal {
        self.total - self.reserved
    }

    pub fn is_consistent(&self) -> bool {
        self.total >= Decimal::ZERO
            && self.reserved >= Decimal::ZERO
            && self.available() >= Decimal::ZERO
    }
}

// ==========================================
// StockMovement - 库存流水 (只追加)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub movement_id: String,
    pub seq_no: u64,
    pub material_id: String,
    pub kind: MovementKind,
    pub quantity: Decimal,        // Adjust 可为负, 其余恒为正
    pub total_after: Decimal,     // 变动后总量
    pub reserved_after: Decimal,  // 变动后预留量
    pub origin: Option<String>,   // 来源单据 (生产订单号等)
    pub actor: String,
    pub at: DateTime<Utc>,
}

impl StockMovement {
    pub fn available_after(&self) -> Decimal {
        self.total_after - self.reserved_after
    }

    /// 该流水对 (总量, 预留量) 的增量
    pub fn deltas(&self) -> (Decimal, Decimal) {
        self.kind.deltas(self.quantity)
    }
}

// ==========================================
// 金属加工报价生产系统 - 计算快照
// ==========================================
// 职责: 冻结一次计算的全部输出 {BOM, 排样, 成本, 定价}
// 红线: 快照挂到报价明细后不再原地重算, 重新计算生成新快照
// ==========================================

use crate::domain::costing::{CostBreakdown, PricingResult};
use crate::domain::inventory::{merge_demands, MaterialDemand};
use crate::domain::nesting::{NestingPlan, SheetStock};
use crate::domain::part::{Bom, MaterialKey, ProductRequest};
use crate::domain::types::UnitOfMeasure;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSnapshot {
    pub snapshot_id: String,
    pub request: ProductRequest,
    pub bom: Bom,
    pub nesting: NestingPlan,
    pub cost: CostBreakdown,
    pub pricing: PricingResult,
    pub calculated_at: DateTime<Utc>,
}

impl CalculationSnapshot {
    pub fn model_id(&self) -> &str {
        &self.bom.model_id
    }

    pub fn unit_price(&self) -> Decimal {
        self.pricing.final_unit_price
    }

    /// 单件物料需求
    ///
    /// - 板材: 按排样所用标准板张数计 (材质+厚度+规格)
    /// - 管材: 按总长度 (米) 计
    /// - 配件: 按件数计
    pub fn material_demand(&self) -> Vec<MaterialDemand> {
        let mut demands = Vec::new();

        for group in &self.nesting.groups {
            demands.push(MaterialDemand::new(
                &sheet_material_id(&group.material, &group.stock),
                &format!(
                    "Chapa {} {:.2}mm {}",
                    group.material.grade_id, group.material.thickness_mm, group.stock
                ),
                UnitOfMeasure::Un,
                Decimal::from(group.sheet_count()),
            ));
        }
        for tube in self.bom.tube_parts() {
            demands.push(MaterialDemand::new(
                &tube.tube_id,
                &format!("Tubo {}", tube.tube_id),
                UnitOfMeasure::M,
                tube.total_length_m(),
            ));
        }
        for acc in self.bom.accessory_parts() {
            demands.push(MaterialDemand::new(
                &acc.accessory_id,
                &acc.description,
                UnitOfMeasure::Un,
                Decimal::from(acc.quantity),
            ));
        }

        merge_demands(&demands)
    }
}

/// 板材库存物料ID: CHAPA-{牌号}-{厚度}-{规格}
pub fn sheet_material_id(material: &MaterialKey, stock: &SheetStock) -> String {
    format!(
        "CHAPA-{}-{:.2}-{}",
        material.grade_id, material.thickness_mm, stock
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sheet_material_id_format() {
        let id = sheet_material_id(&MaterialKey::new("inox304", dec!(1)), &SheetStock::SMALL);
        assert_eq!(id, "CHAPA-inox304-1.00-2000x1250");
    }
}

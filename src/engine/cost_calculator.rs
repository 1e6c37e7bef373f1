// ==========================================
// 金属加工报价生产系统 - 成本计算引擎
// ==========================================
// 职责: BOM + 排样结果 + 工时 → 成本构成
// 红线: 板材按排样用板张数计价 (切割浪费计入成本), 不按零件面积
// 红线: 累计过程全精度, 仅展示时保留 2 位小数
// 红线: 包装成本表缺项直接报错, 不兜底
// ==========================================

use crate::config::catalog::CatalogLookup;
use crate::config::engine_config::{CostConfig, ProcessTimeTable};
use crate::domain::costing::{CostBreakdown, CostCategory, CostDetail};
use crate::domain::nesting::NestingPlan;
use crate::domain::part::Bom;
use crate::domain::types::{Finish, ProcessStep};
use crate::engine::bom_builder::has_basin;
use crate::engine::error::{CalcError, CalcResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// 工序标准工时
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessTime {
    pub step: ProcessStep,
    pub minutes: Decimal,
}

/// 估算工序工时
///
/// # 参数
/// - `bom`: 物料清单 (只对其中列出的工序估算)
/// - `finish`: 表面处理 (决定表面处理系数)
/// - `table`: 标准工时表
///
/// # 返回
/// 按 BOM 工序顺序的工时列表
pub fn estimate_process_times(
    bom: &Bom,
    finish: Finish,
    table: &ProcessTimeTable,
) -> Vec<ProcessTime> {
    let sheet_pieces = Decimal::from(bom.sheet_piece_count());
    let tube_pieces = Decimal::from(bom.tube_parts().map(|t| t.quantity).sum::<u32>());
    let accessories = Decimal::from(bom.accessory_parts().map(|a| a.quantity).sum::<u32>());
    let basins = if has_basin(&bom.parts) {
        Decimal::ONE
    } else {
        Decimal::ZERO
    };

    bom.processes
        .iter()
        .map(|step| {
            let minutes = match step {
                ProcessStep::Cut => {
                    table.setup_minutes
                        + table.cut_minutes_per_sheet_piece * sheet_pieces
                        + table.cut_minutes_per_tube_piece * tube_pieces
                }
                ProcessStep::Bend => table.bend_minutes_per_sheet_piece * sheet_pieces,
                ProcessStep::Weld => {
                    table.weld_minutes_per_tube_piece * tube_pieces
                        + table.weld_minutes_per_basin * basins
                }
                ProcessStep::Finish => {
                    table.finish_minutes_per_m2 * bom.sheet_area_m2() * finish.time_factor()
                }
                ProcessStep::Assembly => table.assembly_minutes_per_accessory * accessories,
                ProcessStep::Pack => table.pack_minutes,
            };
            ProcessTime {
                step: *step,
                minutes,
            }
        })
        .collect()
}

// ==========================================
// CostCalculator - 成本计算引擎
// ==========================================
pub struct CostCalculator {
    // 无状态引擎, 单价与费率全部由参数传入
}

impl CostCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算成本构成
    ///
    /// # 参数
    /// - `bom`: 物料清单
    /// - `nesting`: 排样结果 (板材按用板张数 × 整板重量计价)
    /// - `processes`: 工序工时
    /// - `config`: 成本配置 (损耗率/人工费率/制造费用率/包装成本表)
    /// - `catalog`: 目录 (材质/管材/配件单价)
    ///
    /// # 计算规则
    /// - 材料 = Σ(整板重量 × 单价/kg) + Σ(管材米数 × 单价/m) + Σ(配件数量 × 单价)
    /// - 损耗 = 材料 × 损耗率
    /// - 人工 = Σ工时(分钟) / 60 × 小时费率
    /// - 包装 = 包装成本表[产品类别]
    /// - 制造费用 = (材料 + 损耗 + 人工) × 制造费用率
    #[instrument(skip_all, fields(model_id = %bom.model_id))]
    pub fn cost(
        &self,
        bom: &Bom,
        nesting: &NestingPlan,
        processes: &[ProcessTime],
        config: &CostConfig,
        catalog: &dyn CatalogLookup,
    ) -> CalcResult<CostBreakdown> {
        if bom.is_empty() {
            return Ok(CostBreakdown::from_details(Vec::new()));
        }
        Self::check_config(config)?;

        let mut details = Self::material_details(bom, nesting, catalog)?;
        let materials: Decimal = details.iter().map(|d| d.amount).sum();

        let loss = materials * config.loss_pct / Decimal::ONE_HUNDRED;
        details.push(CostDetail {
            category: CostCategory::Loss,
            description: format!("损耗 {}%", config.loss_pct),
            quantity: materials,
            unit_cost: config.loss_pct / Decimal::ONE_HUNDRED,
            amount: loss,
        });

        let mut labor = Decimal::ZERO;
        for process in processes {
            let hours = process.minutes / Decimal::from(60);
            let amount = hours * config.labor_rate_per_hour;
            labor += amount;
            details.push(CostDetail {
                category: CostCategory::Labor,
                description: format!("工序 {}", process.step),
                quantity: hours,
                unit_cost: config.labor_rate_per_hour,
                amount,
            });
        }

        let packaging = config
            .packaging_costs
            .get(&bom.category)
            .copied()
            .ok_or_else(|| CalcError::MissingConfig {
                key: format!("cost.packaging_costs[{}]", bom.category),
            })?;
        details.push(CostDetail {
            category: CostCategory::Packaging,
            description: format!("包装 {}", bom.category),
            quantity: Decimal::ONE,
            unit_cost: packaging,
            amount: packaging,
        });

        let overhead_base = materials + loss + labor;
        details.push(CostDetail {
            category: CostCategory::Overhead,
            description: format!("制造费用 {}%", config.overhead_pct),
            quantity: overhead_base,
            unit_cost: config.overhead_pct / Decimal::ONE_HUNDRED,
            amount: overhead_base * config.overhead_pct / Decimal::ONE_HUNDRED,
        });

        let breakdown = CostBreakdown::from_details(details);
        debug!(
            materials = %materials,
            labor = %labor,
            total = %breakdown.total(),
            "成本计算完成"
        );
        Ok(breakdown)
    }

    fn check_config(config: &CostConfig) -> CalcResult<()> {
        let fields = [
            ("cost.loss_pct", config.loss_pct),
            ("cost.labor_rate_per_hour", config.labor_rate_per_hour),
            ("cost.overhead_pct", config.overhead_pct),
        ];
        for (key, value) in fields {
            if value < Decimal::ZERO {
                return Err(CalcError::InvalidConfig(format!("{} 不能为负: {}", key, value)));
            }
        }
        Ok(())
    }

    fn material_details(
        bom: &Bom,
        nesting: &NestingPlan,
        catalog: &dyn CatalogLookup,
    ) -> CalcResult<Vec<CostDetail>> {
        let mut details = Vec::new();

        // 板材: 整板重量 = 板面积 × 厚度 × 密度
        for group in &nesting.groups {
            let grade = catalog
                .material_grade(&group.material.grade_id)
                .ok_or_else(|| CalcError::UnknownGrade {
                    grade_id: group.material.grade_id.clone(),
                })?;
            let sheet_weight = Decimal::from(group.stock.area_mm2())
                * group.material.thickness_mm
                * grade.density_g_cm3
                / Decimal::from(1_000_000);
            let weight = sheet_weight * Decimal::from(group.sheet_count());
            details.push(CostDetail {
                category: CostCategory::Materials,
                description: format!(
                    "板材 {} {} × {}",
                    group.material,
                    group.stock,
                    group.sheet_count()
                ),
                quantity: weight,
                unit_cost: grade.price_per_kg,
                amount: weight * grade.price_per_kg,
            });
        }

        // 管材: 按规格汇总米数
        let mut tube_meters: BTreeMap<&str, Decimal> = BTreeMap::new();
        for tube in bom.tube_parts() {
            *tube_meters.entry(tube.tube_id.as_str()).or_insert(Decimal::ZERO) +=
                tube.total_length_m();
        }
        for (tube_id, meters) in tube_meters {
            let tube = catalog
                .tube_definition(tube_id)
                .ok_or_else(|| CalcError::UnknownTube {
                    tube_id: tube_id.to_string(),
                })?;
            details.push(CostDetail {
                category: CostCategory::Materials,
                description: format!("管材 {}", tube.name),
                quantity: meters,
                unit_cost: tube.price_per_m,
                amount: meters * tube.price_per_m,
            });
        }

        for part in bom.accessory_parts() {
            let accessory = catalog
                .accessory_definition(&part.accessory_id)
                .ok_or_else(|| CalcError::UnknownAccessory {
                    accessory_id: part.accessory_id.clone(),
                })?;
            let quantity = Decimal::from(part.quantity);
            details.push(CostDetail {
                category: CostCategory::Materials,
                description: format!("配件 {}", accessory.name),
                quantity,
                unit_cost: accessory.unit_price,
                amount: quantity * accessory.unit_price,
            });
        }

        Ok(details)
    }
}

impl Default for CostCalculator {
    fn default() -> Self {
        Self::new()
    }
}

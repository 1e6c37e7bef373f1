// ==========================================
// 金属加工报价生产系统 - 引擎配置项
// ==========================================
// 职责: 成本/定价/排样/工时配置 (每次计算由调用方传入)
// 红线: 引擎不静默兜底, 默认值只存在于 default_table()
// ==========================================

use crate::domain::costing::MarginMethod;
use crate::domain::types::ProductCategory;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// EngineConfig - 总配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub cost: CostConfig,
    pub pricing: PricingConfig,
    #[serde(default)]
    pub nesting: NestingConfig,
    pub process_times: ProcessTimeTable,
}

impl EngineConfig {
    /// 默认配置表 (唯一的默认值来源)
    pub fn default_table() -> Self {
        Self {
            cost: CostConfig {
                loss_pct: dec!(5),
                labor_rate_per_hour: dec!(85.00),
                overhead_pct: dec!(12),
                packaging_costs: BTreeMap::from([
                    (ProductCategory::Worktop, dec!(65.00)),
                    (ProductCategory::SinkWorktop, dec!(80.00)),
                    (ProductCategory::Shelf, dec!(25.00)),
                ]),
            },
            pricing: PricingConfig {
                margin_method: MarginMethod::TargetMargin,
                margin_pct: dec!(35),
                category_margin_overrides: BTreeMap::new(),
                allow_negative_margin: false,
                tax_regime: TaxRegime::Simplified { rate_pct: dec!(8) },
            },
            nesting: NestingConfig::default(),
            process_times: ProcessTimeTable {
                setup_minutes: dec!(30),
                cut_minutes_per_sheet_piece: dec!(6),
                cut_minutes_per_tube_piece: dec!(2),
                bend_minutes_per_sheet_piece: dec!(8),
                weld_minutes_per_tube_piece: dec!(10),
                weld_minutes_per_basin: dec!(45),
                finish_minutes_per_m2: dec!(20),
                assembly_minutes_per_accessory: dec!(3),
                pack_minutes: dec!(15),
            },
        }
    }

    /// 校验配置
    ///
    /// # 返回
    /// 违规描述列表 (空表示通过)
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let non_negative = [
            ("cost.loss_pct", self.cost.loss_pct),
            ("cost.labor_rate_per_hour", self.cost.labor_rate_per_hour),
            ("cost.overhead_pct", self.cost.overhead_pct),
        ];
        for (key, value) in non_negative {
            if value < Decimal::ZERO {
                problems.push(format!("{} 不能为负: {}", key, value));
            }
        }
        for (category, cost) in &self.cost.packaging_costs {
            if *cost < Decimal::ZERO {
                problems.push(format!("cost.packaging_costs[{}] 不能为负: {}", category, cost));
            }
        }

        let margins = std::iter::once(("pricing.margin_pct".to_string(), self.pricing.margin_pct))
            .chain(
                self.pricing
                    .category_margin_overrides
                    .iter()
                    .map(|(c, m)| (format!("pricing.category_margin_overrides[{}]", c), *m)),
            );
        for (key, margin) in margins {
            if self.pricing.margin_method == MarginMethod::TargetMargin
                && margin >= Decimal::ONE_HUNDRED
            {
                problems.push(format!("{} 目标毛利必须小于 100%: {}", key, margin));
            }
            if margin <= -Decimal::ONE_HUNDRED {
                problems.push(format!("{} 必须大于 -100%: {}", key, margin));
            }
            if margin < Decimal::ZERO && !self.pricing.allow_negative_margin {
                problems.push(format!("{} 为负且未允许负毛利: {}", key, margin));
            }
        }

        if let Err(reason) = self.pricing.tax_regime.check() {
            problems.push(format!("pricing.tax_regime {}", reason));
        }

        problems
    }
}

// ==========================================
// CostConfig - 成本配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostConfig {
    pub loss_pct: Decimal,             // 材料损耗率 (%)
    pub labor_rate_per_hour: Decimal,  // 人工小时费率
    pub overhead_pct: Decimal,         // 制造费用率 (%), 基数 = 材料(含损耗) + 人工
    pub packaging_costs: BTreeMap<ProductCategory, Decimal>, // 包装成本表
}

// ==========================================
// PricingConfig - 定价配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub margin_method: MarginMethod,
    pub margin_pct: Decimal,
    #[serde(default)]
    pub category_margin_overrides: BTreeMap<ProductCategory, Decimal>,
    #[serde(default)]
    pub allow_negative_margin: bool,
    pub tax_regime: TaxRegime,
}

impl PricingConfig {
    /// 按产品类别取毛利率 (分类覆写优先)
    pub fn margin_for(&self, category: ProductCategory) -> Decimal {
        self.category_margin_overrides
            .get(&category)
            .copied()
            .unwrap_or(self.margin_pct)
    }
}

// ==========================================
// TaxRegime - 税制
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "regime", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxRegime {
    /// 简易税制: 单一价内税率
    Simplified { rate_pct: Decimal },
    /// 分项税制: ICMS/PIS/COFINS 价内, IPI 价外
    Itemized {
        icms_pct: Decimal,
        ipi_pct: Decimal,
        pis_pct: Decimal,
        cofins_pct: Decimal,
    },
}

impl TaxRegime {
    /// 价内税率合计 (%)
    pub fn inclusive_rate_pct(&self) -> Decimal {
        match self {
            TaxRegime::Simplified { rate_pct } => *rate_pct,
            TaxRegime::Itemized {
                icms_pct,
                pis_pct,
                cofins_pct,
                ..
            } => *icms_pct + *pis_pct + *cofins_pct,
        }
    }

    /// 税率合法性: 非负, 价内税率合计 < 100%
    pub fn check(&self) -> Result<(), String> {
        let rates: Vec<Decimal> = match self {
            TaxRegime::Simplified { rate_pct } => vec![*rate_pct],
            TaxRegime::Itemized {
                icms_pct,
                ipi_pct,
                pis_pct,
                cofins_pct,
            } => vec![*icms_pct, *ipi_pct, *pis_pct, *cofins_pct],
        };
        if rates.iter().any(|r| *r < Decimal::ZERO) {
            return Err("税率不能为负".to_string());
        }
        if self.inclusive_rate_pct() >= Decimal::ONE_HUNDRED {
            return Err(format!(
                "价内税率合计必须小于 100%: {}",
                self.inclusive_rate_pct()
            ));
        }
        Ok(())
    }
}

// ==========================================
// NestingConfig - 排样配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestingConfig {
    pub kerf_mm: u32, // 切缝 (件间间隙)
}

impl Default for NestingConfig {
    fn default() -> Self {
        Self { kerf_mm: 2 }
    }
}

// ==========================================
// ProcessTimeTable - 标准工时表 (分钟)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessTimeTable {
    pub setup_minutes: Decimal,                 // 准备 (计入下料)
    pub cut_minutes_per_sheet_piece: Decimal,   // 板材下料 / 件
    pub cut_minutes_per_tube_piece: Decimal,    // 管材下料 / 根
    pub bend_minutes_per_sheet_piece: Decimal,  // 折弯 / 件
    pub weld_minutes_per_tube_piece: Decimal,   // 焊接 / 根
    pub weld_minutes_per_basin: Decimal,        // 水槽焊接 / 个
    pub finish_minutes_per_m2: Decimal,         // 表面处理 / m² (乘以表面处理系数)
    pub assembly_minutes_per_accessory: Decimal, // 装配 / 件
    pub pack_minutes: Decimal,                  // 包装 / 台
}

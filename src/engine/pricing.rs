// ==========================================
// 金属加工报价生产系统 - 定价引擎
// ==========================================
// 职责: 成本 → 不含税价 (毛利/加成) → 含税单价 (税制倒算)
// 红线: 目标毛利 ≥ 100% 为配置错误, 直接拒绝
// 红线: 含税单价 ≥ 成本, 除非显式允许负毛利
// ==========================================

use crate::config::engine_config::{PricingConfig, TaxRegime};
use crate::domain::costing::{money, CostBreakdown, MarginMethod, PricingResult, TaxLine};
use crate::domain::types::ProductCategory;
use crate::engine::error::{CalcError, CalcResult};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, instrument, warn};

// ==========================================
// PricingCalculator - 定价引擎
// ==========================================
pub struct PricingCalculator {
    // 无状态引擎
}

impl PricingCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 定价
    ///
    /// # 参数
    /// - `cost`: 成本构成 (取全精度总成本)
    /// - `category`: 产品类别 (用于分类毛利覆写)
    /// - `config`: 定价配置
    ///
    /// # 返回
    /// - `Ok(PricingResult)`
    /// - `Err(InvalidMargin)`: 目标毛利 ≥ 100%, 或负毛利未被允许
    /// - `Err(InvalidTaxRate)`: 税率为负或价内税率合计 ≥ 100%
    ///
    /// # 计算规则
    /// - 目标毛利: 不含税价 = 成本 / (1 - m)
    /// - 加成: 不含税价 = 成本 × (1 + m)
    /// - 简易税制: 含税价 = 不含税价 / (1 - 税率)
    /// - 分项税制: ICMS/PIS/COFINS 价内倒算, IPI 在价内含税价基础上价外加收
    #[instrument(skip(self, cost, config), fields(total_cost = %cost.total()))]
    pub fn price(
        &self,
        cost: &CostBreakdown,
        category: ProductCategory,
        config: &PricingConfig,
    ) -> CalcResult<PricingResult> {
        let base_cost = cost.total();
        let margin_pct = config.margin_for(category);
        let negative = margin_pct < Decimal::ZERO;

        if negative && !config.allow_negative_margin {
            return Err(CalcError::InvalidMargin {
                margin_pct,
                reason: "负毛利未被允许".to_string(),
            });
        }

        let rate = margin_pct / Decimal::ONE_HUNDRED;
        let net_price = match config.margin_method {
            MarginMethod::TargetMargin => {
                if margin_pct >= Decimal::ONE_HUNDRED {
                    return Err(CalcError::InvalidMargin {
                        margin_pct,
                        reason: "目标毛利必须小于 100%".to_string(),
                    });
                }
                base_cost / (Decimal::ONE - rate)
            }
            MarginMethod::Markup => {
                if margin_pct <= -Decimal::ONE_HUNDRED {
                    return Err(CalcError::InvalidMargin {
                        margin_pct,
                        reason: "加成必须大于 -100%".to_string(),
                    });
                }
                base_cost * (Decimal::ONE + rate)
            }
        };

        config
            .tax_regime
            .check()
            .map_err(CalcError::InvalidTaxRate)?;
        let (gross, taxes) = Self::gross_up(net_price, &config.tax_regime);
        let tax_total: Decimal = taxes.iter().map(|t| t.amount).sum();

        let mut final_unit_price = money(gross);
        if !negative && final_unit_price < base_cost {
            // 舍入后低于成本时向上取整到分
            final_unit_price = base_cost.round_dp_with_strategy(2, RoundingStrategy::AwayFromZero);
        }
        if negative {
            warn!(margin_pct = %margin_pct, "负毛利定价 (已显式允许)");
        }

        debug!(
            net_price = %net_price,
            tax_total = %tax_total,
            final_unit_price = %final_unit_price,
            "定价完成"
        );

        Ok(PricingResult {
            base_cost,
            margin_method: config.margin_method,
            margin_pct,
            net_price,
            taxes,
            tax_total,
            final_unit_price,
            negative_margin_override: negative,
        })
    }

    /// 税制倒算
    ///
    /// # 返回
    /// (含税价, 税项明细)
    fn gross_up(net_price: Decimal, regime: &TaxRegime) -> (Decimal, Vec<TaxLine>) {
        let inclusive_rate = regime.inclusive_rate_pct() / Decimal::ONE_HUNDRED;
        let inclusive_gross = net_price / (Decimal::ONE - inclusive_rate);
        let line = |tax: &str, rate_pct: Decimal, base: Decimal, inclusive: bool| TaxLine {
            tax: tax.to_string(),
            rate_pct,
            amount: base * rate_pct / Decimal::ONE_HUNDRED,
            inclusive,
        };

        match regime {
            TaxRegime::Simplified { rate_pct } => (
                inclusive_gross,
                vec![line("SIMPLES", *rate_pct, inclusive_gross, true)],
            ),
            TaxRegime::Itemized {
                icms_pct,
                ipi_pct,
                pis_pct,
                cofins_pct,
            } => {
                let ipi = line("IPI", *ipi_pct, inclusive_gross, false);
                let gross = inclusive_gross + ipi.amount;
                (
                    gross,
                    vec![
                        line("ICMS", *icms_pct, inclusive_gross, true),
                        ipi,
                        line("PIS", *pis_pct, inclusive_gross, true),
                        line("COFINS", *cofins_pct, inclusive_gross, true),
                    ],
                )
            }
        }
    }
}

impl Default for PricingCalculator {
    fn default() -> Self {
        Self::new()
    }
}

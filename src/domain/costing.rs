// ==========================================
// 金属加工报价生产系统 - 成本与定价领域模型
// ==========================================
// 职责: 成本分类明细 (CostBreakdown) 与定价结果 (PricingResult)
// 红线: 分类金额之和 == 总成本 (累计过程不做舍入)
// 红线: 最终价格 >= 基础成本, 除非显式允许负毛利
// ==========================================

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CostCategory - 成本分类
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostCategory {
    Materials, // 材料
    Loss,      // 损耗
    Labor,     // 人工
    Packaging, // 包装
    Overhead,  // 制造费用
}

impl fmt::Display for CostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostCategory::Materials => write!(f, "MATERIALS"),
            CostCategory::Loss => write!(f, "LOSS"),
            CostCategory::Labor => write!(f, "LABOR"),
            CostCategory::Packaging => write!(f, "PACKAGING"),
            CostCategory::Overhead => write!(f, "OVERHEAD"),
        }
    }
}

/// 分类合计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAmount {
    pub category: CostCategory,
    pub amount: Decimal,
}

/// 成本明细行 (可解释性)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostDetail {
    pub category: CostCategory,
    pub description: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub amount: Decimal,
}

// ==========================================
// CostBreakdown - 成本构成
// ==========================================
// 只能通过 from_details 构造 (反序列化同样经由明细重新汇总), 总额始终等于分类之和
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CostBreakdownRecord")]
pub struct CostBreakdown {
    categories: Vec<CategoryAmount>,
    details: Vec<CostDetail>,
    total: Decimal,
}

/// 反序列化入口: 只读取明细行, 分类与总额不信任外部输入
#[derive(Deserialize)]
struct CostBreakdownRecord {
    details: Vec<CostDetail>,
}

impl From<CostBreakdownRecord> for CostBreakdown {
    fn from(record: CostBreakdownRecord) -> Self {
        Self::from_details(record.details)
    }
}

impl CostBreakdown {
    /// 由明细行构造 (分类按固定顺序汇总, 金额为 0 的分类保留)
    pub fn from_details(details: Vec<CostDetail>) -> Self {
        let order = [
            CostCategory::Materials,
            CostCategory::Loss,
            CostCategory::Labor,
            CostCategory::Packaging,
            CostCategory::Overhead,
        ];
        let categories: Vec<CategoryAmount> = if details.is_empty() {
            Vec::new()
        } else {
            order
                .iter()
                .map(|c| CategoryAmount {
                    category: *c,
                    amount: details
                        .iter()
                        .filter(|d| d.category == *c)
                        .map(|d| d.amount)
                        .sum(),
                })
                .collect()
        };
        let total = categories.iter().map(|c| c.amount).sum();
        Self {
            categories,
            details,
            total,
        }
    }

    pub fn categories(&self) -> &[CategoryAmount] {
        &self.categories
    }

    pub fn details(&self) -> &[CostDetail] {
        &self.details
    }

    /// 总成本 (全精度)
    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn amount_of(&self, category: CostCategory) -> Decimal {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// 展示用: 分类金额保留 2 位小数
    pub fn rounded_categories(&self) -> Vec<CategoryAmount> {
        self.categories
            .iter()
            .map(|c| CategoryAmount {
                category: c.category,
                amount: money(c.amount),
            })
            .collect()
    }
}

// ==========================================
// 定价方式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarginMethod {
    TargetMargin, // 目标毛利: 成本 / (1 - m)
    Markup,       // 加成: 成本 × (1 + m)
}

impl fmt::Display for MarginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginMethod::TargetMargin => write!(f, "TARGET_MARGIN"),
            MarginMethod::Markup => write!(f, "MARKUP"),
        }
    }
}

/// 税项明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxLine {
    pub tax: String,       // 税种 (SIMPLES/ICMS/IPI/PIS/COFINS)
    pub rate_pct: Decimal, // 税率 (%)
    pub amount: Decimal,   // 税额
    pub inclusive: bool,   // 价内税 (true) / 价外税 (false)
}

// ==========================================
// PricingResult - 定价结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub base_cost: Decimal,        // 基础成本
    pub margin_method: MarginMethod,
    pub margin_pct: Decimal,       // 实际采用的毛利/加成率 (%)
    pub net_price: Decimal,        // 不含税价 (成本 + 毛利)
    pub taxes: Vec<TaxLine>,       // 税项
    pub tax_total: Decimal,        // 税额合计
    pub final_unit_price: Decimal, // 含税单价 (2 位小数)
    pub negative_margin_override: bool,
}

impl PricingResult {
    /// 实际毛利率 (基于不含税价)
    pub fn effective_margin_pct(&self) -> Decimal {
        if self.net_price.is_zero() {
            return Decimal::ZERO;
        }
        (self.net_price - self.base_cost) * Decimal::ONE_HUNDRED / self.net_price
    }
}

/// 金额展示舍入 (2 位小数, 四舍五入)
pub fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

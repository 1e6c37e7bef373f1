// ==========================================
// 金属加工报价生产系统 - 排样领域模型
// ==========================================
// 职责: 标准板规格、板实例、零件落位、排样结果
// 红线: 标准板仅允许 2000×1250 / 3000×1250 两种
// 红线: BOM 中每个板材件在排样结果中恰好出现一次
// 红线: 同一张板上落位互不重叠且不越界
// ==========================================

use crate::domain::part::{Bom, MaterialKey};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// SheetStock - 标准板规格
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SheetStock {
    pub length_mm: u32,
    pub width_mm: u32,
}

impl SheetStock {
    pub const SMALL: SheetStock = SheetStock {
        length_mm: 2000,
        width_mm: 1250,
    };
    pub const LARGE: SheetStock = SheetStock {
        length_mm: 3000,
        width_mm: 1250,
    };

    /// 政策允许的标准板 (按面积升序)
    pub const PERMITTED: [SheetStock; 2] = [SheetStock::SMALL, SheetStock::LARGE];

    pub fn new(length_mm: u32, width_mm: u32) -> Self {
        Self {
            length_mm,
            width_mm,
        }
    }

    pub fn is_permitted(&self) -> bool {
        SheetStock::PERMITTED.contains(self)
    }

    pub fn area_mm2(&self) -> u64 {
        self.length_mm as u64 * self.width_mm as u64
    }

    /// 零件在任一方向上可放入该板
    pub fn can_hold(&self, length_mm: u32, width_mm: u32) -> bool {
        (length_mm <= self.length_mm && width_mm <= self.width_mm)
            || (width_mm <= self.length_mm && length_mm <= self.width_mm)
    }
}

impl fmt::Display for SheetStock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.length_mm, self.width_mm)
    }
}

// ==========================================
// Placement - 零件落位
// ==========================================
// 坐标原点为板左下角, x 沿板长方向, y 沿板宽方向
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub piece_id: String, // 件号 (part_id#序号)
    pub part_id: String,  // 零件代号
    pub x_mm: u32,
    pub y_mm: u32,
    pub length_mm: u32,   // 落位后沿 x 方向尺寸
    pub width_mm: u32,    // 落位后沿 y 方向尺寸
    pub rotated: bool,    // 是否旋转 90°
}

impl Placement {
    pub fn area_mm2(&self) -> u64 {
        self.length_mm as u64 * self.width_mm as u64
    }

    pub fn overlaps(&self, other: &Placement) -> bool {
        self.x_mm < other.x_mm + other.length_mm
            && other.x_mm < self.x_mm + self.length_mm
            && self.y_mm < other.y_mm + other.width_mm
            && other.y_mm < self.y_mm + self.width_mm
    }

    pub fn within(&self, stock: &SheetStock) -> bool {
        self.x_mm as u64 + self.length_mm as u64 <= stock.length_mm as u64
            && self.y_mm as u64 + self.width_mm as u64 <= stock.width_mm as u64
    }

    /// 原始 (未旋转) 尺寸
    pub fn nominal_size(&self) -> (u32, u32) {
        if self.rotated {
            (self.width_mm, self.length_mm)
        } else {
            (self.length_mm, self.width_mm)
        }
    }
}

// ==========================================
// SheetInstance - 板实例
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetInstance {
    pub sheet_no: u32,
    pub stock: SheetStock,
    pub placements: Vec<Placement>,
}

impl SheetInstance {
    pub fn used_area_mm2(&self) -> u64 {
        self.placements.iter().map(|p| p.area_mm2()).sum()
    }

    /// 利用率 (%)
    pub fn utilization_pct(&self) -> Decimal {
        percent(self.used_area_mm2(), self.stock.area_mm2())
    }
}

// ==========================================
// NestingResult - 单一材质+厚度分组的排样结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestingResult {
    pub material: MaterialKey,
    pub stock: SheetStock,
    pub sheets: Vec<SheetInstance>,
    pub used_area_mm2: u64,
    pub waste_area_mm2: u64,
    pub waste_pct: Decimal,
}

impl NestingResult {
    pub fn sheet_count(&self) -> u32 {
        self.sheets.len() as u32
    }

    pub fn stock_area_mm2(&self) -> u64 {
        self.stock.area_mm2() * self.sheets.len() as u64
    }

    pub fn placement_count(&self) -> usize {
        self.sheets.iter().map(|s| s.placements.len()).sum()
    }
}

// ==========================================
// NestingPlan - 全部分组汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestingPlan {
    pub groups: Vec<NestingResult>,
    pub summary: NestingSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NestingSummary {
    pub total_sheets: u32,
    pub stock_area_mm2: u64,
    pub used_area_mm2: u64,
    pub waste_area_mm2: u64,
    pub waste_pct: Decimal,
}

impl NestingPlan {
    /// 由分组结果汇总
    pub fn from_groups(groups: Vec<NestingResult>) -> Self {
        let total_sheets = groups.iter().map(|g| g.sheet_count()).sum();
        let stock_area_mm2: u64 = groups.iter().map(|g| g.stock_area_mm2()).sum();
        let used_area_mm2: u64 = groups.iter().map(|g| g.used_area_mm2).sum();
        let waste_area_mm2 = stock_area_mm2.saturating_sub(used_area_mm2);
        let summary = NestingSummary {
            total_sheets,
            stock_area_mm2,
            used_area_mm2,
            waste_area_mm2,
            waste_pct: percent(waste_area_mm2, stock_area_mm2),
        };
        Self { groups, summary }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() || self.summary.total_sheets == 0
    }

    pub fn group(&self, material: &MaterialKey) -> Option<&NestingResult> {
        self.groups.iter().find(|g| &g.material == material)
    }

    /// 校验排样结果与 BOM 的一致性
    ///
    /// # 返回
    /// 违规描述列表 (空表示通过)
    ///
    /// # 校验规则
    /// 1. 标准板必须为允许规格
    /// 2. 落位不越界
    /// 3. 同一张板上落位两两不重叠
    /// 4. 落位件集合与 BOM 板材件集合 (按零件代号+尺寸计数) 完全一致
    pub fn verify(&self, bom: &Bom) -> Vec<String> {
        let mut violations = Vec::new();

        for group in &self.groups {
            if !group.stock.is_permitted() {
                violations.push(format!(
                    "DISALLOWED_STOCK_SIZE: material={}, stock={}",
                    group.material, group.stock
                ));
            }
            for sheet in &group.sheets {
                if sheet.stock != group.stock {
                    violations.push(format!(
                        "MIXED_STOCK_SIZE: material={}, sheet_no={}, stock={}",
                        group.material, sheet.sheet_no, sheet.stock
                    ));
                }
                for (i, a) in sheet.placements.iter().enumerate() {
                    if !a.within(&sheet.stock) {
                        violations.push(format!(
                            "OUT_OF_BOUNDS: material={}, sheet_no={}, piece={}",
                            group.material, sheet.sheet_no, a.piece_id
                        ));
                    }
                    for b in sheet.placements.iter().skip(i + 1) {
                        if a.overlaps(b) {
                            violations.push(format!(
                                "OVERLAP: material={}, sheet_no={}, pieces={}/{}",
                                group.material, sheet.sheet_no, a.piece_id, b.piece_id
                            ));
                        }
                    }
                }
            }
        }

        // 件数守恒: (材质, 零件代号, 尺寸) -> 数量
        let mut expected: BTreeMap<(MaterialKey, String, u32, u32), i64> = BTreeMap::new();
        for part in bom.sheet_parts() {
            *expected
                .entry((
                    part.material.clone(),
                    part.part_id.clone(),
                    part.length_mm,
                    part.width_mm,
                ))
                .or_insert(0) += part.quantity as i64;
        }
        for group in &self.groups {
            for sheet in &group.sheets {
                for p in &sheet.placements {
                    let (length_mm, width_mm) = p.nominal_size();
                    *expected
                        .entry((group.material.clone(), p.part_id.clone(), length_mm, width_mm))
                        .or_insert(0) -= 1;
                }
            }
        }
        for ((material, part_id, length_mm, width_mm), diff) in expected {
            if diff > 0 {
                violations.push(format!(
                    "MISSING_PIECE: material={}, part={}, size={}x{}, missing={}",
                    material, part_id, length_mm, width_mm, diff
                ));
            } else if diff < 0 {
                violations.push(format!(
                    "DUPLICATED_PIECE: material={}, part={}, size={}x{}, extra={}",
                    material, part_id, length_mm, width_mm, -diff
                ));
            }
        }

        violations
    }
}

/// 面积百分比 (保留 4 位小数)
pub(crate) fn percent(part: u64, whole: u64) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole)).round_dp(4)
}

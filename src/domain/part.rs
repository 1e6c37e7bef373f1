// ==========================================
// 金属加工报价生产系统 - 物料清单领域模型
// ==========================================
// 职责: 参数化产品请求、零件规格 (板/管/配件)、BOM
// 红线: BOM 生成后不可变更 (仅由 BomBuilder 产出)
// ==========================================

use crate::domain::types::{Finish, ProcessStep, ProductCategory, UnitOfMeasure};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ProductRequest - 参数化产品请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRequest {
    pub model_id: String,  // 型号ID (如 bancada-simples)
    pub length_mm: u32,    // 外形长度
    pub width_mm: u32,     // 外形宽度 (进深)
    pub height_mm: u32,    // 外形高度
    pub grade_id: String,  // 材质牌号 (如 inox304)
    pub finish: Finish,    // 表面处理
    #[serde(default)]
    pub features: FeatureFlags,
}

impl ProductRequest {
    /// 创建不带可选特征的请求
    pub fn new(
        model_id: &str,
        length_mm: u32,
        width_mm: u32,
        height_mm: u32,
        grade_id: &str,
    ) -> Self {
        Self {
            model_id: model_id.to_string(),
            length_mm,
            width_mm,
            height_mm,
            grade_id: grade_id.to_string(),
            finish: Finish::Brushed,
            features: FeatureFlags::default(),
        }
    }

    pub fn with_finish(mut self, finish: Finish) -> Self {
        self.finish = finish;
        self
    }

    pub fn with_features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }
}

// ==========================================
// FeatureFlags - 可选特征
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default)]
    pub backsplash: bool,            // 后挡水
    #[serde(default)]
    pub shelf: bool,                 // 下层板
    #[serde(default)]
    pub basin: bool,                 // 水槽
    #[serde(default)]
    pub feet_count: Option<u32>,     // 支脚数量 (None 时按长度推导)
}

// ==========================================
// MaterialKey - 材质+厚度分组键
// ==========================================
// 用途: 排样分组、材料需求汇总
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaterialKey {
    pub grade_id: String,
    pub thickness_mm: Decimal,
}

impl MaterialKey {
    pub fn new(grade_id: &str, thickness_mm: Decimal) -> Self {
        Self {
            grade_id: grade_id.to_string(),
            thickness_mm: thickness_mm.normalize(),
        }
    }
}

impl fmt::Display for MaterialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:.2}mm", self.grade_id, self.thickness_mm)
    }
}

// ==========================================
// 零件规格 (封闭变体: 板/管/配件)
// ==========================================

/// 板材零件 (展开后的下料尺寸)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetPart {
    pub part_id: String,        // 零件代号 (如 TAMPO)
    pub description: String,    // 描述
    pub material: MaterialKey,  // 材质+厚度
    pub length_mm: u32,         // 展开长度
    pub width_mm: u32,          // 展开宽度
    pub quantity: u32,          // 数量
    pub unit_weight_kg: Decimal, // 单件重量 (展开面积 × 厚度 × 密度)
}

impl SheetPart {
    /// 单件面积 (mm²)
    pub fn area_mm2(&self) -> u64 {
        self.length_mm as u64 * self.width_mm as u64
    }
}

/// 管材零件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TubePart {
    pub part_id: String,
    pub description: String,
    pub tube_id: String,         // 管材规格ID
    pub length_mm: u32,          // 单根下料长度
    pub quantity: u32,
    pub unit_weight_kg: Decimal, // 单根重量 (长度 × 米重)
}

impl TubePart {
    /// 总长度 (米)
    pub fn total_length_m(&self) -> Decimal {
        Decimal::from(self.length_mm) * Decimal::from(self.quantity) / Decimal::from(1000)
    }
}

/// 配件 (外购件)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessoryPart {
    pub part_id: String,
    pub description: String,
    pub accessory_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartSpec {
    Sheet(SheetPart),
    Tube(TubePart),
    Accessory(AccessoryPart),
}

impl PartSpec {
    pub fn part_id(&self) -> &str {
        match self {
            PartSpec::Sheet(p) => &p.part_id,
            PartSpec::Tube(p) => &p.part_id,
            PartSpec::Accessory(p) => &p.part_id,
        }
    }

    pub fn quantity(&self) -> u32 {
        match self {
            PartSpec::Sheet(p) => p.quantity,
            PartSpec::Tube(p) => p.quantity,
            PartSpec::Accessory(p) => p.quantity,
        }
    }

    pub fn unit(&self) -> UnitOfMeasure {
        match self {
            PartSpec::Sheet(_) => UnitOfMeasure::Kg,
            PartSpec::Tube(_) => UnitOfMeasure::M,
            PartSpec::Accessory(_) => UnitOfMeasure::Un,
        }
    }

    /// 总重量 (配件不计重)
    pub fn total_weight_kg(&self) -> Decimal {
        match self {
            PartSpec::Sheet(p) => p.unit_weight_kg * Decimal::from(p.quantity),
            PartSpec::Tube(p) => p.unit_weight_kg * Decimal::from(p.quantity),
            PartSpec::Accessory(_) => Decimal::ZERO,
        }
    }
}

// ==========================================
// Bom - 物料清单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bom {
    pub model_id: String,
    pub category: ProductCategory,
    pub parts: Vec<PartSpec>,
    pub processes: Vec<ProcessStep>,
}

impl Bom {
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn sheet_parts(&self) -> impl Iterator<Item = &SheetPart> {
        self.parts.iter().filter_map(|p| match p {
            PartSpec::Sheet(s) => Some(s),
            _ => None,
        })
    }

    pub fn tube_parts(&self) -> impl Iterator<Item = &TubePart> {
        self.parts.iter().filter_map(|p| match p {
            PartSpec::Tube(t) => Some(t),
            _ => None,
        })
    }

    pub fn accessory_parts(&self) -> impl Iterator<Item = &AccessoryPart> {
        self.parts.iter().filter_map(|p| match p {
            PartSpec::Accessory(a) => Some(a),
            _ => None,
        })
    }

    /// 板材件数合计 (按数量展开)
    pub fn sheet_piece_count(&self) -> u32 {
        self.sheet_parts().map(|p| p.quantity).sum()
    }

    /// 板材展开面积合计 (m²)
    pub fn sheet_area_m2(&self) -> Decimal {
        let mm2: u64 = self
            .sheet_parts()
            .map(|p| p.area_mm2() * p.quantity as u64)
            .sum();
        Decimal::from(mm2) / Decimal::from(1_000_000)
    }

    /// 零件原始重量合计 (不含排样损耗)
    pub fn raw_weight_kg(&self) -> Decimal {
        self.parts.iter().map(|p| p.total_weight_kg()).sum()
    }
}

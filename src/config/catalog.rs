// ==========================================
// 金属加工报价生产系统 - 目录查询接口
// ==========================================
// 职责: 材质单价/密度、管材定义、配件定义、标准板规格 (只读)
// 说明: 目录数据由外部协作方提供, 引擎不抓取也不缓存
// 红线: 标准板规格为政策固定值, 目录不可配置
// ==========================================

use crate::domain::nesting::SheetStock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// 目录条目
// ==========================================

/// 材质牌号
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialGrade {
    pub grade_id: String,
    pub name: String,
    pub density_g_cm3: Decimal, // 密度 (g/cm³)
    pub price_per_kg: Decimal,  // 单价 (每千克)
}

/// 管材定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TubeDefinition {
    pub tube_id: String,
    pub name: String,
    pub kg_per_m: Decimal,     // 米重
    pub price_per_m: Decimal,  // 单价 (每米)
}

/// 配件定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessoryDefinition {
    pub accessory_id: String,
    pub name: String,
    pub unit_price: Decimal,
}

// ==========================================
// Trait: CatalogLookup
// ==========================================
// 用途: BomBuilder / CostCalculator 的目录依赖 (注入)
pub trait CatalogLookup: Send + Sync {
    /// 查询材质牌号
    fn material_grade(&self, grade_id: &str) -> Option<&MaterialGrade>;

    /// 查询管材定义
    fn tube_definition(&self, tube_id: &str) -> Option<&TubeDefinition>;

    /// 查询配件定义
    fn accessory_definition(&self, accessory_id: &str) -> Option<&AccessoryDefinition>;

    /// 材质单价 (每千克)
    fn material_price(&self, grade_id: &str) -> Option<Decimal> {
        self.material_grade(grade_id).map(|g| g.price_per_kg)
    }

    /// 标准板规格 (政策固定, 实现方不应覆写)
    fn standard_sheet_sizes(&self) -> [SheetStock; 2] {
        SheetStock::PERMITTED
    }
}

// ==========================================
// StaticCatalog - 内存目录
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    grades: HashMap<String, MaterialGrade>,
    tubes: HashMap<String, TubeDefinition>,
    accessories: HashMap<String, AccessoryDefinition>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grade(mut self, grade: MaterialGrade) -> Self {
        self.grades.insert(grade.grade_id.clone(), grade);
        self
    }

    pub fn with_tube(mut self, tube: TubeDefinition) -> Self {
        self.tubes.insert(tube.tube_id.clone(), tube);
        self
    }

    pub fn with_accessory(mut self, accessory: AccessoryDefinition) -> Self {
        self.accessories
            .insert(accessory.accessory_id.clone(), accessory);
        self
    }

    /// 默认目录表 (演示与测试用)
    pub fn default_table() -> Self {
        Self::new()
            .with_grade(grade("inox304", "Aço inox AISI 304", dec!(7.93), dec!(32.50)))
            .with_grade(grade("inox430", "Aço inox AISI 430", dec!(7.70), dec!(21.00)))
            .with_grade(grade("galvanizado", "Aço galvanizado", dec!(7.85), dec!(9.80)))
            .with_tube(tube("tubo-40x40", "Tubo inox 40x40x1.2", dec!(1.45), dec!(48.00)))
            .with_tube(tube("tubo-25x25", "Tubo inox 25x25x1.2", dec!(0.88), dec!(29.00)))
            .with_accessory(accessory("pe-regulavel", "Pé regulável nylon", dec!(18.50)))
            .with_accessory(accessory("cuba-500x400x250", "Cuba inox 500x400x250", dec!(380.00)))
            .with_accessory(accessory("valvula-americana", "Válvula americana 3 1/2", dec!(45.00)))
            .with_accessory(accessory("mao-francesa-300", "Mão francesa 300mm", dec!(42.00)))
    }
}

impl CatalogLookup for StaticCatalog {
    fn material_grade(&self, grade_id: &str) -> Option<&MaterialGrade> {
        self.grades.get(grade_id)
    }

    fn tube_definition(&self, tube_id: &str) -> Option<&TubeDefinition> {
        self.tubes.get(tube_id)
    }

    fn accessory_definition(&self, accessory_id: &str) -> Option<&AccessoryDefinition> {
        self.accessories.get(accessory_id)
    }
}

fn grade(id: &str, name: &str, density: Decimal, price: Decimal) -> MaterialGrade {
    MaterialGrade {
        grade_id: id.to_string(),
        name: name.to_string(),
        density_g_cm3: density,
        price_per_kg: price,
    }
}

fn tube(id: &str, name: &str, kg_per_m: Decimal, price_per_m: Decimal) -> TubeDefinition {
    TubeDefinition {
        tube_id: id.to_string(),
        name: name.to_string(),
        kg_per_m,
        price_per_m,
    }
}

fn accessory(id: &str, name: &str, unit_price: Decimal) -> AccessoryDefinition {
    AccessoryDefinition {
        accessory_id: id.to_string(),
        name: name.to_string(),
        unit_price,
    }
}

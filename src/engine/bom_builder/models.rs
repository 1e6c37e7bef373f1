// ==========================================
// 金属加工报价生产系统 - 型号注册表
// ==========================================
// 职责: 型号定义 (类别、尺寸上下限、展开规则类型)
// ==========================================

use crate::domain::types::ProductCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 展开规则类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    Worktop,     // 工作台 (台面 + 管腿 + 框架)
    SinkWorktop, // 水槽工作台 (水槽必选)
    WallShelf,   // 壁挂层板 (层板 + 三角支架)
}

/// 尺寸范围 (闭区间, mm)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionRange {
    pub min: u32,
    pub max: u32,
}

impl DimensionRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// 型号定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub model_id: String,
    pub name: String,
    pub kind: ModelKind,
    pub category: ProductCategory,
    pub length: DimensionRange,
    pub width: DimensionRange,
    pub height: DimensionRange, // 层板型号为折边高度
}

// ==========================================
// ModelRegistry - 型号注册表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelDefinition>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标准型号
    pub fn standard() -> Self {
        Self::new()
            .with_model(ModelDefinition {
                model_id: "bancada-simples".to_string(),
                name: "Bancada simples".to_string(),
                kind: ModelKind::Worktop,
                category: ProductCategory::Worktop,
                length: DimensionRange::new(400, 2900),
                width: DimensionRange::new(300, 900),
                height: DimensionRange::new(600, 1100),
            })
            .with_model(ModelDefinition {
                model_id: "bancada-com-cuba".to_string(),
                name: "Bancada com cuba".to_string(),
                kind: ModelKind::SinkWorktop,
                category: ProductCategory::SinkWorktop,
                length: DimensionRange::new(800, 2900),
                width: DimensionRange::new(500, 900),
                height: DimensionRange::new(800, 1000),
            })
            .with_model(ModelDefinition {
                model_id: "prateleira-lisa".to_string(),
                name: "Prateleira lisa".to_string(),
                kind: ModelKind::WallShelf,
                category: ProductCategory::Shelf,
                length: DimensionRange::new(300, 2800),
                width: DimensionRange::new(150, 600),
                height: DimensionRange::new(20, 60),
            })
    }

    pub fn with_model(mut self, model: ModelDefinition) -> Self {
        self.models.insert(model.model_id.clone(), model);
        self
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelDefinition> {
        self.models.get(model_id)
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.models.contains_key(model_id)
    }

    pub fn model_ids(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(|k| k.as_str())
    }
}

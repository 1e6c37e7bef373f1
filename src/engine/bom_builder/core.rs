// ==========================================
// 金属加工报价生产系统 - BOM 生成引擎
// ==========================================
// 职责: 参数化请求 → BOM (零件 + 工序)
// 输入: ProductRequest + 目录
// 输出: Bom
// 红线: 纯函数, 不读写任何外部状态
// ==========================================

use super::models::{ModelDefinition, ModelRegistry};
use super::rules::{self, ExpansionContext};
use crate::config::catalog::CatalogLookup;
use crate::domain::part::{Bom, ProductRequest};
use crate::engine::error::{CalcError, CalcResult};
use tracing::{debug, info, instrument};

// ==========================================
// BomBuilder - BOM 生成引擎
// ==========================================
pub struct BomBuilder {
    registry: ModelRegistry,
}

impl BomBuilder {
    /// 使用标准型号注册表创建
    pub fn new() -> Self {
        Self {
            registry: ModelRegistry::standard(),
        }
    }

    pub fn with_registry(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// 生成 BOM
    ///
    /// # 参数
    /// - `request`: 参数化产品请求
    /// - `catalog`: 目录 (材质/管材/配件)
    ///
    /// # 返回
    /// - `Ok(Bom)`: 零件与工序
    /// - `Err(CalcError)`: 未知型号 / 尺寸越界 / 特征无效 / 未知材质
    ///
    /// # 校验顺序
    /// 1. 型号存在
    /// 2. 长/宽/高在型号范围内
    /// 3. 材质存在
    /// 4. 特征组合合法
    #[instrument(skip(self, catalog), fields(model_id = %request.model_id))]
    pub fn build(&self, request: &ProductRequest, catalog: &dyn CatalogLookup) -> CalcResult<Bom> {
        let model = self
            .registry
            .get(&request.model_id)
            .ok_or_else(|| CalcError::UnknownModel {
                model_id: request.model_id.clone(),
            })?;

        Self::check_dimensions(model, request)?;

        let grade = catalog
            .material_grade(&request.grade_id)
            .ok_or_else(|| CalcError::UnknownGrade {
                grade_id: request.grade_id.clone(),
            })?;

        rules::check_features(model, request)?;

        let parts = rules::expand(&ExpansionContext {
            model,
            request,
            grade,
            catalog,
        })?;
        let processes = rules::derive_processes(&parts, request.finish);

        debug!(parts = parts.len(), processes = ?processes, "BOM 展开完成");

        let bom = Bom {
            model_id: model.model_id.clone(),
            category: model.category,
            parts,
            processes,
        };

        info!(
            sheet_pieces = bom.sheet_piece_count(),
            raw_weight_kg = %bom.raw_weight_kg(),
            "BOM 生成完成"
        );
        Ok(bom)
    }

    fn check_dimensions(model: &ModelDefinition, request: &ProductRequest) -> CalcResult<()> {
        let checks = [
            ("length_mm", request.length_mm, model.length),
            ("width_mm", request.width_mm, model.width),
            ("height_mm", request.height_mm, model.height),
        ];
        for (field, value, range) in checks {
            if value == 0 || !range.contains(value) {
                return Err(CalcError::DimensionOutOfRange {
                    model_id: model.model_id.clone(),
                    field: field.to_string(),
                    value,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }
}

impl Default for BomBuilder {
    fn default() -> Self {
        Self::new()
    }
}

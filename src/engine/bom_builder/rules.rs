// ==========================================
// 金属加工报价生产系统 - BOM 展开规则
// ==========================================
// 职责: 按型号类型把外形尺寸展开为板/管/配件零件
// 红线: 展开尺寸向上取整到整毫米 (宁大勿小)
// 红线: 重量 = 面积(长度) × 厚度 × 密度, 不含排样损耗
// ==========================================

use super::models::{ModelDefinition, ModelKind};
use crate::config::catalog::{CatalogLookup, MaterialGrade};
use crate::domain::part::{
    AccessoryPart, FeatureFlags, MaterialKey, PartSpec, ProductRequest, SheetPart, TubePart,
};
use crate::domain::types::{Finish, ProcessStep};
use crate::engine::error::{CalcError, CalcResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===== 工艺常量 (mm) =====
const SKIRT_MM: u32 = 40; // 台面裙边高度
const BACKSPLASH_HEIGHT_MM: u32 = 100; // 后挡水高度
const BACKSPLASH_FLANGE_MM: u32 = 20; // 后挡水顶部折边
const SHELF_FOLD_MM: u32 = 30; // 下层板折边
const LEG_SETBACK_MM: u32 = 50; // 管腿距台面边缘
const FOOT_HEIGHT_MM: u32 = 40; // 可调脚高度
const BASIN_MIN_LENGTH_MM: u32 = 800;
const BASIN_MIN_WIDTH_MM: u32 = 500;

// ===== 目录ID =====
const LEG_TUBE: &str = "tubo-40x40";
const FRAME_TUBE: &str = "tubo-25x25";
const FOOT_ACCESSORY: &str = "pe-regulavel";
const BASIN_ACCESSORY: &str = "cuba-500x400x250";
const DRAIN_ACCESSORY: &str = "valvula-americana";
const BRACKET_ACCESSORY: &str = "mao-francesa-300";

const BASIN_PART_ID: &str = "CUBA";

fn top_thickness_mm() -> Decimal {
    dec!(1.0)
}

fn under_shelf_thickness_mm() -> Decimal {
    dec!(0.8)
}

/// 展开上下文
pub(crate) struct ExpansionContext<'a> {
    pub model: &'a ModelDefinition,
    pub request: &'a ProductRequest,
    pub grade: &'a MaterialGrade,
    pub catalog: &'a dyn CatalogLookup,
}

/// 校验特征组合
///
/// # 规则
/// - 层板型号不支持任何可选特征
/// - 工作台加水槽要求长 ≥ 800, 宽 ≥ 500
/// - 支脚数必须为偶数且在 4..=8
pub(crate) fn check_features(model: &ModelDefinition, request: &ProductRequest) -> CalcResult<()> {
    let features = &request.features;
    let invalid = |message: String| CalcError::InvalidFeature {
        model_id: model.model_id.clone(),
        message,
    };

    match model.kind {
        ModelKind::WallShelf => {
            let mut unsupported = Vec::new();
            if features.backsplash {
                unsupported.push("backsplash");
            }
            if features.shelf {
                unsupported.push("shelf");
            }
            if features.basin {
                unsupported.push("basin");
            }
            if features.feet_count.is_some() {
                unsupported.push("feet_count");
            }
            if !unsupported.is_empty() {
                return Err(invalid(format!("型号不支持特征: {}", unsupported.join(", "))));
            }
        }
        ModelKind::Worktop if features.basin => {
            if request.length_mm < BASIN_MIN_LENGTH_MM || request.width_mm < BASIN_MIN_WIDTH_MM {
                return Err(invalid(format!(
                    "水槽要求台面至少 {}x{}mm",
                    BASIN_MIN_LENGTH_MM, BASIN_MIN_WIDTH_MM
                )));
            }
        }
        _ => {}
    }

    if let Some(count) = features.feet_count {
        if count % 2 != 0 || !(4..=8).contains(&count) {
            return Err(invalid(format!("支脚数必须为 4~8 之间的偶数: {}", count)));
        }
    }

    Ok(())
}

/// 管腿数量: 显式指定优先, 否则长度 ≤ 2000 取 4, 否则取 6
pub(crate) fn leg_count(length_mm: u32, features: &FeatureFlags) -> u32 {
    features
        .feet_count
        .unwrap_or(if length_mm <= 2000 { 4 } else { 6 })
}

/// 按型号类型展开零件
pub(crate) fn expand(ctx: &ExpansionContext<'_>) -> CalcResult<Vec<PartSpec>> {
    match ctx.model.kind {
        ModelKind::Worktop => expand_worktop(ctx, ctx.request.features.basin),
        ModelKind::SinkWorktop => expand_worktop(ctx, true),
        ModelKind::WallShelf => expand_wall_shelf(ctx),
    }
}

fn expand_worktop(ctx: &ExpansionContext<'_>, with_basin: bool) -> CalcResult<Vec<PartSpec>> {
    let req = ctx.request;
    let features = &req.features;
    let top_t = top_thickness_mm();
    let top_key = MaterialKey::new(&req.grade_id, top_t);
    let mut parts = Vec::new();

    // 台面: 四边裙边折弯, 每边展开 (裙边 - 厚度)
    let skirt_fold = Decimal::from(SKIRT_MM) - top_t;
    parts.push(sheet_part(
        ctx,
        "TAMPO",
        "Tampo com saia dobrada",
        &top_key,
        blank_mm(req.length_mm, skirt_fold, 2)?,
        blank_mm(req.width_mm, skirt_fold, 2)?,
        1,
    ));

    if features.backsplash {
        parts.push(sheet_part(
            ctx,
            "ESPELHO",
            "Espelho traseiro",
            &top_key,
            req.length_mm,
            blank_mm(BACKSPLASH_HEIGHT_MM, Decimal::from(BACKSPLASH_FLANGE_MM) - top_t, 1)?,
            1,
        ));
    }

    let inner_length = req.length_mm.saturating_sub(2 * LEG_SETBACK_MM);
    let inner_width = req.width_mm.saturating_sub(2 * LEG_SETBACK_MM);

    if features.shelf {
        let shelf_t = under_shelf_thickness_mm();
        let shelf_fold = Decimal::from(SHELF_FOLD_MM) - shelf_t;
        parts.push(sheet_part(
            ctx,
            "PRATELEIRA_INFERIOR",
            "Prateleira inferior",
            &MaterialKey::new(&req.grade_id, shelf_t),
            blank_mm(inner_length, shelf_fold, 2)?,
            blank_mm(inner_width, shelf_fold, 2)?,
            1,
        ));
    }

    // 管腿 + 上框架 (下层板时加下框架)
    let legs = leg_count(req.length_mm, features);
    let top_t_mm = top_t.ceil().to_u32().unwrap_or(0);
    let leg_length = req
        .height_mm
        .saturating_sub(top_t_mm)
        .saturating_sub(FOOT_HEIGHT_MM);
    parts.push(tube_part(ctx, "PE", "Pé tubular", LEG_TUBE, leg_length, legs)?);
    parts.push(tube_part(
        ctx,
        "QUADRO_LONGITUDINAL",
        "Quadro longitudinal",
        FRAME_TUBE,
        inner_length,
        2,
    )?);
    parts.push(tube_part(
        ctx,
        "QUADRO_TRANSVERSAL",
        "Quadro transversal",
        FRAME_TUBE,
        inner_width,
        legs / 2,
    )?);
    if features.shelf {
        parts.push(tube_part(
            ctx,
            "TRAVESSA_INFERIOR_L",
            "Travessa inferior longitudinal",
            FRAME_TUBE,
            inner_length,
            2,
        )?);
        parts.push(tube_part(
            ctx,
            "TRAVESSA_INFERIOR_T",
            "Travessa inferior transversal",
            FRAME_TUBE,
            inner_width,
            legs / 2,
        )?);
    }

    parts.push(accessory_part(ctx, "SAPATA", "Pé regulável", FOOT_ACCESSORY, legs)?);
    if with_basin {
        parts.push(accessory_part(ctx, BASIN_PART_ID, "Cuba soldada", BASIN_ACCESSORY, 1)?);
        parts.push(accessory_part(ctx, "VALVULA", "Válvula de escoamento", DRAIN_ACCESSORY, 1)?);
    }

    Ok(parts)
}

fn expand_wall_shelf(ctx: &ExpansionContext<'_>) -> CalcResult<Vec<PartSpec>> {
    let req = ctx.request;
    let t = top_thickness_mm();
    // height_mm 为折边高度
    let edge_fold = Decimal::from(req.height_mm) - t;

    Ok(vec![
        sheet_part(
            ctx,
            "PRATELEIRA",
            "Prateleira com borda dobrada",
            &MaterialKey::new(&req.grade_id, t),
            blank_mm(req.length_mm, edge_fold, 2)?,
            blank_mm(req.width_mm, edge_fold, 2)?,
            1,
        ),
        accessory_part(ctx, "MAO_FRANCESA", "Mão francesa", BRACKET_ACCESSORY, 2)?,
    ])
}

/// 推导工序
///
/// # 规则
/// 下料 → 折弯(有板件) → 焊接(有管件或水槽) → 表面处理(非原色) → 装配(有配件) → 包装
pub(crate) fn derive_processes(parts: &[PartSpec], finish: Finish) -> Vec<ProcessStep> {
    let has_sheet = parts.iter().any(|p| matches!(p, PartSpec::Sheet(_)));
    let has_tube = parts.iter().any(|p| matches!(p, PartSpec::Tube(_)));
    let has_accessory = parts.iter().any(|p| matches!(p, PartSpec::Accessory(_)));
    let basin = has_basin(parts);

    let mut steps = vec![ProcessStep::Cut];
    if has_sheet {
        steps.push(ProcessStep::Bend);
    }
    if has_tube || basin {
        steps.push(ProcessStep::Weld);
    }
    if finish != Finish::Raw {
        steps.push(ProcessStep::Finish);
    }
    if has_accessory {
        steps.push(ProcessStep::Assembly);
    }
    steps.push(ProcessStep::Pack);
    steps
}

/// 水槽是否在 BOM 中
pub(crate) fn has_basin<'a, I: IntoIterator<Item = &'a PartSpec>>(parts: I) -> bool {
    parts.into_iter().any(|p| p.part_id() == BASIN_PART_ID)
}

// ==========================================
// 零件构造
// ==========================================

/// 展开尺寸: base + fold × folds, 向上取整
fn blank_mm(base: u32, fold: Decimal, folds: u32) -> CalcResult<u32> {
    let value = (Decimal::from(base) + fold * Decimal::from(folds)).ceil();
    value
        .to_u32()
        .ok_or_else(|| CalcError::Internal(format!("展开尺寸越界: {}", value)))
}

/// 板件重量 (kg) = 长 × 宽 × 厚 (mm³) × 密度 (g/cm³) / 1e6
fn sheet_weight_kg(
    length_mm: u32,
    width_mm: u32,
    thickness_mm: Decimal,
    density: Decimal,
) -> Decimal {
    (Decimal::from(length_mm) * Decimal::from(width_mm) * thickness_mm * density
        / Decimal::from(1_000_000))
    .round_dp(3)
}

fn sheet_part(
    ctx: &ExpansionContext<'_>,
    part_id: &str,
    description: &str,
    material: &MaterialKey,
    length_mm: u32,
    width_mm: u32,
    quantity: u32,
) -> PartSpec {
    PartSpec::Sheet(SheetPart {
        part_id: part_id.to_string(),
        description: description.to_string(),
        material: material.clone(),
        length_mm,
        width_mm,
        quantity,
        unit_weight_kg: sheet_weight_kg(
            length_mm,
            width_mm,
            material.thickness_mm,
            ctx.grade.density_g_cm3,
        ),
    })
}

fn tube_part(
    ctx: &ExpansionContext<'_>,
    part_id: &str,
    description: &str,
    tube_id: &str,
    length_mm: u32,
    quantity: u32,
) -> CalcResult<PartSpec> {
    let tube = ctx
        .catalog
        .tube_definition(tube_id)
        .ok_or_else(|| CalcError::UnknownTube {
            tube_id: tube_id.to_string(),
        })?;
    Ok(PartSpec::Tube(TubePart {
        part_id: part_id.to_string(),
        description: description.to_string(),
        tube_id: tube_id.to_string(),
        length_mm,
        quantity,
        unit_weight_kg: (Decimal::from(length_mm) / Decimal::from(1000) * tube.kg_per_m)
            .round_dp(3),
    }))
}

fn accessory_part(
    ctx: &ExpansionContext<'_>,
    part_id: &str,
    description: &str,
    accessory_id: &str,
    quantity: u32,
) -> CalcResult<PartSpec> {
    if ctx.catalog.accessory_definition(accessory_id).is_none() {
        return Err(CalcError::UnknownAccessory {
            accessory_id: accessory_id.to_string(),
        });
    }
    Ok(PartSpec::Accessory(AccessoryPart {
        part_id: part_id.to_string(),
        description: description.to_string(),
        accessory_id: accessory_id.to_string(),
        quantity,
    }))
}

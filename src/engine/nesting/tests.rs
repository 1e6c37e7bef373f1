use super::*;
use crate::domain::part::{PartSpec, SheetPart};
use crate::domain::types::ProductCategory;
use rust_decimal_macros::dec;

// ==========================================
// 测试辅助函数
// ==========================================

fn sheet(part_id: &str, grade: &str, length: u32, width: u32, quantity: u32) -> PartSpec {
    PartSpec::Sheet(SheetPart {
        part_id: part_id.to_string(),
        description: part_id.to_string(),
        material: MaterialKey::new(grade, dec!(1.0)),
        length_mm: length,
        width_mm: width,
        quantity,
        unit_weight_kg: dec!(1),
    })
}

fn bom(parts: Vec<PartSpec>) -> Bom {
    Bom {
        model_id: "test".to_string(),
        category: ProductCategory::Worktop,
        parts,
        processes: Vec::new(),
    }
}

fn no_kerf() -> NestingConfig {
    NestingConfig { kerf_mm: 0 }
}

fn nest(bom: &Bom, config: &NestingConfig) -> CalcResult<NestingPlan> {
    NestingOptimizer::new().nest(bom, &SheetStock::PERMITTED, config)
}

// ==========================================
// 选板
// ==========================================

#[test]
fn test_single_worktop_top_uses_one_small_sheet() {
    let bom = bom(vec![sheet("TAMPO", "inox304", 1278, 678, 1)]);
    let plan = nest(&bom, &NestingConfig::default()).unwrap();

    assert_eq!(plan.groups.len(), 1);
    let group = &plan.groups[0];
    assert_eq!(group.stock, SheetStock::SMALL);
    assert_eq!(group.sheet_count(), 1);
    assert_eq!(group.used_area_mm2, 1278 * 678);
    assert_eq!(group.waste_area_mm2, 2000 * 1250 - 1278 * 678);
    assert!(plan.verify(&bom).is_empty());
}

#[test]
fn test_long_piece_forces_large_sheet() {
    let bom = bom(vec![sheet("TAMPO", "inox304", 2500, 800, 1)]);
    let plan = nest(&bom, &NestingConfig::default()).unwrap();
    assert_eq!(plan.groups[0].stock, SheetStock::LARGE);
    assert_eq!(plan.summary.total_sheets, 1);
}

#[test]
fn test_kerf_can_change_stock_choice() {
    let bom = bom(vec![sheet("PAINEL", "inox304", 1000, 1250, 2)]);

    // 无切缝: 两块正好铺满一张小板
    let plan = nest(&bom, &no_kerf()).unwrap();
    assert_eq!(plan.groups[0].stock, SheetStock::SMALL);
    assert_eq!(plan.groups[0].sheet_count(), 1);
    assert_eq!(plan.groups[0].waste_area_mm2, 0);

    // 2mm 切缝: 小板需两张, 大板一张浪费更少
    let plan = nest(&bom, &NestingConfig { kerf_mm: 2 }).unwrap();
    assert_eq!(plan.groups[0].stock, SheetStock::LARGE);
    assert_eq!(plan.groups[0].sheet_count(), 1);
    assert!(plan.verify(&bom).is_empty());
}

#[test]
fn test_equal_waste_prefers_fewer_sheets() {
    // 小板 3 张 / 大板 2 张, 总面积相同, 浪费均为 0
    let bom = bom(vec![sheet("PAINEL", "inox304", 1000, 1250, 6)]);
    let plan = nest(&bom, &no_kerf()).unwrap();
    assert_eq!(plan.groups[0].stock, SheetStock::LARGE);
    assert_eq!(plan.groups[0].sheet_count(), 2);
    assert_eq!(plan.summary.waste_area_mm2, 0);
}

#[test]
fn test_rotation_is_used_when_needed() {
    let bom = bom(vec![sheet("LATERAL", "inox304", 1250, 1900, 1)]);
    let plan = nest(&bom, &no_kerf()).unwrap();
    let placement = &plan.groups[0].sheets[0].placements[0];
    assert!(placement.rotated);
    assert_eq!((placement.length_mm, placement.width_mm), (1900, 1250));
    assert_eq!(placement.nominal_size(), (1250, 1900));
    assert!(plan.verify(&bom).is_empty());
}

// ==========================================
// 分组与守恒
// ==========================================

#[test]
fn test_groups_by_material_and_thickness() {
    let mut parts = vec![
        sheet("TAMPO", "inox304", 1278, 678, 1),
        sheet("ESPELHO", "inox304", 1200, 119, 1),
        sheet("PRATELEIRA", "inox430", 900, 400, 2),
    ];
    parts.push(PartSpec::Sheet(SheetPart {
        part_id: "REFORCO".to_string(),
        description: "reforco".to_string(),
        material: MaterialKey::new("inox304", dec!(0.8)),
        length_mm: 500,
        width_mm: 100,
        quantity: 4,
        unit_weight_kg: dec!(0.3),
    }));
    let bom = bom(parts);
    let plan = nest(&bom, &NestingConfig::default()).unwrap();

    assert_eq!(plan.groups.len(), 3);
    let top = plan.group(&MaterialKey::new("inox304", dec!(1))).unwrap();
    assert_eq!(top.placement_count(), 2);
    let thin = plan.group(&MaterialKey::new("inox304", dec!(0.8))).unwrap();
    assert_eq!(thin.placement_count(), 4);
    assert_eq!(plan.summary.total_sheets, 3);
    assert!(plan.verify(&bom).is_empty());
}

#[test]
fn test_many_pieces_are_all_placed_without_overlap() {
    let bom = bom(vec![
        sheet("A", "inox304", 900, 600, 7),
        sheet("B", "inox304", 450, 300, 11),
        sheet("C", "inox304", 1800, 200, 3),
    ]);
    let plan = nest(&bom, &NestingConfig::default()).unwrap();
    assert_eq!(plan.groups[0].placement_count(), 21);
    assert!(plan.verify(&bom).is_empty(), "{:?}", plan.verify(&bom));
}

#[test]
fn test_no_sheet_parts_gives_empty_plan() {
    let plan = nest(&bom(Vec::new()), &NestingConfig::default()).unwrap();
    assert!(plan.is_empty());
    assert_eq!(plan.summary.total_sheets, 0);
}

#[test]
fn test_nesting_is_deterministic() {
    let bom = bom(vec![
        sheet("A", "inox304", 700, 500, 5),
        sheet("B", "inox304", 500, 700, 5),
        sheet("C", "inox430", 300, 300, 9),
    ]);
    let a = nest(&bom, &NestingConfig::default()).unwrap();
    let b = nest(&bom, &NestingConfig::default()).unwrap();
    assert_eq!(a, b);
}

// ==========================================
// 错误
// ==========================================

#[test]
fn test_piece_exceeding_both_stocks() {
    for (length, width) in [(3100, 100), (1300, 1300)] {
        let bom = bom(vec![sheet("GIGANTE", "inox304", length, width, 1)]);
        let err = nest(&bom, &NestingConfig::default()).unwrap_err();
        assert_eq!(
            err,
            CalcError::PieceExceedsStock {
                part_id: "GIGANTE".to_string(),
                length_mm: length,
                width_mm: width,
            }
        );
    }
}

#[test]
fn test_disallowed_stock_size_is_rejected() {
    let bom = bom(vec![sheet("TAMPO", "inox304", 1000, 500, 1)]);
    let err = NestingOptimizer::new()
        .nest(
            &bom,
            &[SheetStock::SMALL, SheetStock::new(1800, 1200)],
            &NestingConfig::default(),
        )
        .unwrap_err();
    assert_eq!(err, CalcError::UnsupportedStockSize("1800x1200".to_string()));

    let err = NestingOptimizer::new()
        .nest(&bom, &[], &NestingConfig::default())
        .unwrap_err();
    assert!(matches!(err, CalcError::UnsupportedStockSize(_)));
}

#[test]
fn test_single_permitted_size_is_honoured() {
    let bom = bom(vec![sheet("TAMPO", "inox304", 1000, 500, 1)]);
    let plan = NestingOptimizer::new()
        .nest(&bom, &[SheetStock::LARGE], &NestingConfig::default())
        .unwrap();
    assert_eq!(plan.groups[0].stock, SheetStock::LARGE);
}

// ==========================================
// 金属加工报价生产系统 - 排样优化引擎
// ==========================================
// 职责: 板材零件按 材质+厚度 分组, 排入标准板
// 算法: 贪心剪切 (guillotine) 装箱, 每张板维护空闲矩形列表
// 红线: 只允许 2000×1250 / 3000×1250 两种标准板
// 红线: 无随机性, 相同输入得到相同结果
// ==========================================
// 注: 启发式算法, 不保证最优; 平局规则固定且可测
// ==========================================

use crate::config::engine_config::NestingConfig;
use crate::domain::nesting::{
    percent, NestingPlan, NestingResult, Placement, SheetInstance, SheetStock,
};
use crate::domain::part::{Bom, MaterialKey};
use crate::engine::error::{CalcError, CalcResult};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

#[cfg(test)]
mod tests;

/// 待排零件 (按数量展开后的单件)
#[derive(Debug, Clone)]
struct Piece {
    piece_id: String,
    part_id: String,
    length_mm: u32,
    width_mm: u32,
}

impl Piece {
    fn area_mm2(&self) -> u64 {
        self.length_mm as u64 * self.width_mm as u64
    }
}

/// 空闲矩形
#[derive(Debug, Clone, Copy)]
struct FreeRect {
    x: u32,
    y: u32,
    length: u32,
    width: u32,
}

impl FreeRect {
    fn area_mm2(&self) -> u64 {
        self.length as u64 * self.width as u64
    }

    fn fits(&self, length: u32, width: u32) -> bool {
        length <= self.length && width <= self.width
    }
}

/// 排样中的板 (空闲矩形列表 + 已落位零件)
struct OpenSheet {
    placements: Vec<Placement>,
    free: Vec<FreeRect>,
}

impl OpenSheet {
    fn new(stock: SheetStock) -> Self {
        Self {
            placements: Vec::new(),
            free: vec![FreeRect {
                x: 0,
                y: 0,
                length: stock.length_mm,
                width: stock.width_mm,
            }],
        }
    }

    /// 最佳面积匹配: 剩余面积最小的空闲矩形; 先试不旋转, 再试旋转
    fn find_slot(&self, piece: &Piece) -> Option<(usize, bool)> {
        let mut best: Option<(usize, bool, u64)> = None;
        for (idx, rect) in self.free.iter().enumerate() {
            let rotated = if rect.fits(piece.length_mm, piece.width_mm) {
                false
            } else if piece.length_mm != piece.width_mm
                && rect.fits(piece.width_mm, piece.length_mm)
            {
                true
            } else {
                continue;
            };
            let leftover = rect.area_mm2() - piece.area_mm2();
            if best.map_or(true, |(_, _, b)| leftover < b) {
                best = Some((idx, rotated, leftover));
            }
        }
        best.map(|(idx, rotated, _)| (idx, rotated))
    }

    /// 落位并沿较短剩余边切分
    fn place(&mut self, piece: &Piece, slot: (usize, bool), kerf_mm: u32) {
        let (idx, rotated) = slot;
        let rect = self.free.remove(idx);
        let (length, width) = if rotated {
            (piece.width_mm, piece.length_mm)
        } else {
            (piece.length_mm, piece.width_mm)
        };

        self.placements.push(Placement {
            piece_id: piece.piece_id.clone(),
            part_id: piece.part_id.clone(),
            x_mm: rect.x,
            y_mm: rect.y,
            length_mm: length,
            width_mm: width,
            rotated,
        });

        // 切缝计入占用, 板边不需要切缝
        let used_length = (length + kerf_mm).min(rect.length);
        let used_width = (width + kerf_mm).min(rect.width);
        let rest_length = rect.length - used_length;
        let rest_width = rect.width - used_width;

        let (right, top) = if rest_length < rest_width {
            // 横切: 上方矩形取整段长度
            (
                FreeRect {
                    x: rect.x + used_length,
                    y: rect.y,
                    length: rest_length,
                    width: used_width,
                },
                FreeRect {
                    x: rect.x,
                    y: rect.y + used_width,
                    length: rect.length,
                    width: rest_width,
                },
            )
        } else {
            // 纵切: 右侧矩形取整段宽度
            (
                FreeRect {
                    x: rect.x + used_length,
                    y: rect.y,
                    length: rest_length,
                    width: rect.width,
                },
                FreeRect {
                    x: rect.x,
                    y: rect.y + used_width,
                    length: used_length,
                    width: rest_width,
                },
            )
        };
        for r in [right, top] {
            if r.length > 0 && r.width > 0 {
                self.free.push(r);
            }
        }
    }
}

// ==========================================
// NestingOptimizer - 排样优化引擎
// ==========================================
pub struct NestingOptimizer {
    // 无状态引擎, 切缝等参数通过 NestingConfig 传入
}

impl NestingOptimizer {
    pub fn new() -> Self {
        Self {}
    }

    /// 排样
    ///
    /// # 参数
    /// - `bom`: 物料清单 (仅处理板材零件)
    /// - `sizes`: 可选标准板 (必须是政策允许的规格)
    /// - `config`: 排样配置 (切缝)
    ///
    /// # 返回
    /// - `Ok(NestingPlan)`: 每个 材质+厚度 分组一份结果 + 汇总
    /// - `Err(UnsupportedStockSize)`: 传入了不允许的标准板
    /// - `Err(PieceExceedsStock)`: 零件在任何方向都放不进任何标准板
    ///
    /// # 选板规则
    /// 1. 两种板张数相同 → 取小板
    /// 2. 否则取浪费面积小者
    /// 3. 浪费相同 → 张数少者, 再取总面积小者
    #[instrument(skip(self, bom, sizes, config), fields(model_id = %bom.model_id))]
    pub fn nest(
        &self,
        bom: &Bom,
        sizes: &[SheetStock],
        config: &NestingConfig,
    ) -> CalcResult<NestingPlan> {
        let stocks = Self::check_sizes(sizes)?;

        let mut groups: BTreeMap<MaterialKey, Vec<Piece>> = BTreeMap::new();
        for part in bom.sheet_parts() {
            let pieces = groups.entry(part.material.clone()).or_default();
            for n in 1..=part.quantity {
                pieces.push(Piece {
                    piece_id: format!("{}#{}", part.part_id, n),
                    part_id: part.part_id.clone(),
                    length_mm: part.length_mm,
                    width_mm: part.width_mm,
                });
            }
        }

        let mut results = Vec::with_capacity(groups.len());
        for (material, mut pieces) in groups {
            if pieces.is_empty() {
                continue;
            }
            // 稳定排序: 面积相同保持 BOM 顺序
            pieces.sort_by(|a, b| b.area_mm2().cmp(&a.area_mm2()));
            results.push(self.nest_group(material, &pieces, &stocks, config.kerf_mm)?);
        }

        let plan = NestingPlan::from_groups(results);
        info!(
            groups = plan.groups.len(),
            total_sheets = plan.summary.total_sheets,
            waste_pct = %plan.summary.waste_pct,
            "排样完成"
        );
        Ok(plan)
    }

    /// 校验并去重标准板 (按面积升序)
    fn check_sizes(sizes: &[SheetStock]) -> CalcResult<Vec<SheetStock>> {
        if sizes.is_empty() {
            return Err(CalcError::UnsupportedStockSize("未提供标准板规格".to_string()));
        }
        let rejected: Vec<String> = sizes
            .iter()
            .filter(|s| !s.is_permitted())
            .map(|s| s.to_string())
            .collect();
        if !rejected.is_empty() {
            return Err(CalcError::UnsupportedStockSize(rejected.join(", ")));
        }
        let mut stocks = sizes.to_vec();
        stocks.sort_by_key(|s| (s.area_mm2(), s.length_mm));
        stocks.dedup();
        Ok(stocks)
    }

    fn nest_group(
        &self,
        material: MaterialKey,
        pieces: &[Piece],
        stocks: &[SheetStock],
        kerf_mm: u32,
    ) -> CalcResult<NestingResult> {
        for piece in pieces {
            if !stocks.iter().any(|s| s.can_hold(piece.length_mm, piece.width_mm)) {
                return Err(CalcError::PieceExceedsStock {
                    part_id: piece.part_id.clone(),
                    length_mm: piece.length_mm,
                    width_mm: piece.width_mm,
                });
            }
        }

        let mut chosen: Option<NestingResult> = None;
        for stock in stocks {
            if !pieces.iter().all(|p| stock.can_hold(p.length_mm, p.width_mm)) {
                continue;
            }
            let candidate = Self::pack(&material, *stock, pieces, kerf_mm);
            debug!(
                material = %material,
                stock = %stock,
                sheets = candidate.sheet_count(),
                waste_area_mm2 = candidate.waste_area_mm2,
                "候选标准板"
            );
            chosen = match chosen {
                Some(best) if !Self::prefer(&candidate, &best) => Some(best),
                _ => Some(candidate),
            };
        }

        chosen.ok_or_else(|| {
            CalcError::Internal(format!("分组 {} 没有可容纳全部零件的标准板", material))
        })
    }

    /// 候选 a 是否优于 b
    fn prefer(a: &NestingResult, b: &NestingResult) -> bool {
        if a.sheet_count() == b.sheet_count() {
            return a.stock.area_mm2() < b.stock.area_mm2();
        }
        (a.waste_area_mm2, a.sheet_count(), a.stock_area_mm2())
            < (b.waste_area_mm2, b.sheet_count(), b.stock_area_mm2())
    }

    /// 在单一标准板上排样 (首张可放的板优先, 放不下则开新板)
    fn pack(
        material: &MaterialKey,
        stock: SheetStock,
        pieces: &[Piece],
        kerf_mm: u32,
    ) -> NestingResult {
        let mut sheets: Vec<OpenSheet> = Vec::new();

        for piece in pieces {
            let slot = sheets
                .iter()
                .enumerate()
                .find_map(|(i, sheet)| sheet.find_slot(piece).map(|slot| (i, slot)));
            match slot {
                Some((i, slot)) => sheets[i].place(piece, slot, kerf_mm),
                None => {
                    let mut sheet = OpenSheet::new(stock);
                    if let Some(slot) = sheet.find_slot(piece) {
                        sheet.place(piece, slot, kerf_mm);
                    }
                    sheets.push(sheet);
                }
            }
        }

        let sheets: Vec<SheetInstance> = sheets
            .into_iter()
            .enumerate()
            .map(|(i, s)| SheetInstance {
                sheet_no: i as u32 + 1,
                stock,
                placements: s.placements,
            })
            .collect();
        let used_area_mm2: u64 = sheets.iter().map(|s| s.used_area_mm2()).sum();
        let stock_area_mm2 = stock.area_mm2() * sheets.len() as u64;
        let waste_area_mm2 = stock_area_mm2.saturating_sub(used_area_mm2);

        NestingResult {
            material: material.clone(),
            stock,
            sheets,
            used_area_mm2,
            waste_area_mm2,
            waste_pct: percent(waste_area_mm2, stock_area_mm2),
        }
    }
}

impl Default for NestingOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

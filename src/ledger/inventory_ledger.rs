// ==========================================
// 金属加工报价生产系统 - 库存台账
// ==========================================
// 职责: 物料登记、入库、可用量检查、预留、消耗、释放、盘点调整
// 红线: 预留为全有或全无, 检查与变更在同一把锁内完成
// 红线: 流水只追加; 增量余额必须等于流水重放结果
// 红线: 未知物料不隐式创建
// 红线: 多条流水的操作先整体校验余额, 任一失败则不写入任何流水
// ==========================================

use crate::domain::inventory::{
    merge_demands, InventoryItem, MaterialDemand, Shortfall, StockMovement,
};
use crate::domain::types::{MovementKind, UnitOfMeasure};
use crate::engine::transition::TransitionContext;
use crate::ledger::error::{LedgerError, LedgerResult};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

/// 由流水重放得到的余额
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayedBalance {
    pub total: Decimal,
    pub reserved: Decimal,
}

#[derive(Debug, Default)]
struct LedgerState {
    items: BTreeMap<String, InventoryItem>,
    movements: Vec<StockMovement>,
    // order_id -> (material_id -> 未消耗的预留量)
    reservations: BTreeMap<String, BTreeMap<String, Decimal>>,
    next_seq: u64,
}

impl LedgerState {
    fn item(&self, material_id: &str) -> LedgerResult<&InventoryItem> {
        self.items
            .get(material_id)
            .ok_or_else(|| LedgerError::UnknownMaterial {
                material_id: material_id.to_string(),
            })
    }

    fn shortfalls(&self, demand: &[MaterialDemand]) -> Vec<Shortfall> {
        demand
            .iter()
            .filter_map(|d| {
                let (available, known) = match self.items.get(&d.material_id) {
                    Some(item) => (item.available(), true),
                    None => (Decimal::ZERO, false),
                };
                (d.quantity > available).then(|| Shortfall {
                    material_id: d.material_id.clone(),
                    demanded: d.quantity,
                    available,
                    missing: d.quantity - available,
                    known,
                })
            })
            .collect()
    }

    /// 按顺序模拟一批流水, 返回每一步后的 (总量, 预留量); 不修改状态
    fn stage(&self, steps: &[Step]) -> LedgerResult<Vec<(Decimal, Decimal)>> {
        let mut staged: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
        let mut balances = Vec::with_capacity(steps.len());
        for step in steps {
            let item = self.item(&step.material_id)?;
            let (total, reserved) = staged
                .get(step.material_id.as_str())
                .copied()
                .unwrap_or((item.total, item.reserved));
            let (d_total, d_reserved) = step.kind.deltas(step.quantity);
            let next = (total + d_total, reserved + d_reserved);
            check_balance(&step.material_id, next.0, next.1)?;
            staged.insert(step.material_id.as_str(), next);
            balances.push(next);
        }
        Ok(balances)
    }

    /// 整批校验通过后追加流水并同步余额
    fn commit(
        &mut self,
        steps: &[Step],
        origin: Option<&str>,
        ctx: &TransitionContext,
    ) -> LedgerResult<Vec<StockMovement>> {
        let balances = self.stage(steps)?;

        let mut movements = Vec::with_capacity(steps.len());
        for (step, (total, reserved)) in steps.iter().zip(balances) {
            if let Some(item) = self.items.get_mut(&step.material_id) {
                item.total = total;
                item.reserved = reserved;
            }
            self.next_seq += 1;
            let movement = StockMovement {
                movement_id: uuid::Uuid::new_v4().to_string(),
                seq_no: self.next_seq,
                material_id: step.material_id.clone(),
                kind: step.kind,
                quantity: step.quantity,
                total_after: total,
                reserved_after: reserved,
                origin: origin.map(str::to_string),
                actor: ctx.actor.clone(),
                at: ctx.at,
            };
            self.movements.push(movement.clone());
            movements.push(movement);
        }
        Ok(movements)
    }

    fn commit_one(
        &mut self,
        material_id: &str,
        kind: MovementKind,
        quantity: Decimal,
        origin: Option<&str>,
        ctx: &TransitionContext,
    ) -> LedgerResult<StockMovement> {
        let mut movements = self.commit(&[Step::new(material_id, kind, quantity)], origin, ctx)?;
        movements.pop().ok_or_else(|| LedgerError::UnknownMaterial {
            material_id: material_id.to_string(),
        })
    }

    fn held(&self, order_id: &str, material_id: &str) -> Decimal {
        self.reservations
            .get(order_id)
            .and_then(|r| r.get(material_id))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn take_reservation(&mut self, order_id: &str, material_id: &str, quantity: Decimal) {
        if let Some(per_order) = self.reservations.get_mut(order_id) {
            if let Some(held) = per_order.get_mut(material_id) {
                *held -= quantity;
                if *held <= Decimal::ZERO {
                    per_order.remove(material_id);
                }
            }
            if per_order.is_empty() {
                self.reservations.remove(order_id);
            }
        }
    }
}

/// 一条待写入的流水
struct Step {
    material_id: String,
    kind: MovementKind,
    quantity: Decimal,
}

impl Step {
    fn new(material_id: &str, kind: MovementKind, quantity: Decimal) -> Self {
        Self {
            material_id: material_id.to_string(),
            kind,
            quantity,
        }
    }
}

// ==========================================
// InventoryLedger - 库存台账
// ==========================================
// 一把全局锁: 预期并发低, 换取检查+变更的原子性
#[derive(Debug, Default)]
pub struct InventoryLedger {
    state: Mutex<LedgerState>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, LedgerState>> {
        self.state
            .lock()
            .map_err(|e| LedgerError::LockPoisoned(e.to_string()))
    }

    /// 持锁线程 panic, 使台账锁中毒
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.state.lock();
            panic!("台账锁中毒");
        }));
    }

    // ==========================================
    // 物料登记与入库
    // ==========================================

    /// 登记物料 (初始余额为 0)
    pub fn register_item(
        &self,
        material_id: &str,
        display_name: &str,
        unit: UnitOfMeasure,
    ) -> LedgerResult<()> {
        let mut state = self.lock()?;
        if state.items.contains_key(material_id) {
            return Err(LedgerError::DuplicateMaterial {
                material_id: material_id.to_string(),
            });
        }
        state.items.insert(
            material_id.to_string(),
            InventoryItem::new(material_id, display_name, unit),
        );
        debug!(material_id, "物料已登记");
        Ok(())
    }

    /// 入库
    pub fn receive(
        &self,
        material_id: &str,
        quantity: Decimal,
        origin: Option<&str>,
        ctx: &TransitionContext,
    ) -> LedgerResult<StockMovement> {
        positive(material_id, quantity)?;
        let mut state = self.lock()?;
        let movement = state.commit_one(material_id, MovementKind::Entry, quantity, origin, ctx)?;
        info!(material_id, quantity = %quantity, total = %movement.total_after, "入库");
        Ok(movement)
    }

    /// 盘点调整 (有符号), 调整后总量不得低于预留量
    pub fn adjust(
        &self,
        material_id: &str,
        delta: Decimal,
        reason: &str,
        ctx: &TransitionContext,
    ) -> LedgerResult<StockMovement> {
        if delta.is_zero() {
            return Err(LedgerError::InvalidQuantity {
                material_id: material_id.to_string(),
                quantity: delta,
            });
        }
        let mut state = self.lock()?;
        let movement =
            state.commit_one(material_id, MovementKind::Adjust, delta, Some(reason), ctx)?;
        info!(material_id, delta = %delta, reason, "盘点调整");
        Ok(movement)
    }

    /// 原始流水记录
    ///
    /// # 规则
    /// - 只接受 ENTRY / EXIT / ADJUST; RESERVE / RELEASE 必须经由订单操作
    /// - ADJUST 数量可正可负 (非 0), 其余类型数量必须 > 0
    /// - 任何导致 总量/预留量/可用量 为负的流水被拒绝
    pub fn record_movement(
        &self,
        material_id: &str,
        kind: MovementKind,
        quantity: Decimal,
        origin: Option<&str>,
        ctx: &TransitionContext,
    ) -> LedgerResult<StockMovement> {
        if kind.touches_reservation() {
            return Err(LedgerError::ReservationMovement {
                material_id: material_id.to_string(),
                kind,
            });
        }
        match kind {
            MovementKind::Adjust if !quantity.is_zero() => {}
            MovementKind::Adjust => {
                return Err(LedgerError::InvalidQuantity {
                    material_id: material_id.to_string(),
                    quantity,
                })
            }
            _ => positive(material_id, quantity)?,
        }
        let mut state = self.lock()?;
        state.commit_one(material_id, kind, quantity, origin, ctx)
    }

    // ==========================================
    // 可用量检查 / 预留 / 消耗 / 释放
    // ==========================================

    /// 检查可用量
    ///
    /// # 返回
    /// 仅不足的物料及缺口 (未知物料: known=false, 缺口=全部需求); 不修改状态
    pub fn check_availability(
        &self,
        demand: &[MaterialDemand],
    ) -> LedgerResult<Vec<Shortfall>> {
        let merged = merge_demands(demand);
        let state = self.lock()?;
        Ok(state.shortfalls(&merged))
    }

    /// 为订单预留物料 (全有或全无)
    ///
    /// # 规则
    /// 1. 需求按物料合并; 数量 <= 0 → InvalidQuantity
    /// 2. 任一物料未知 → UnknownMaterial
    /// 3. 任一物料不足 → InsufficientStock (列出全部缺口), 不留下部分预留
    /// 4. 否则每个物料追加一条 RESERVE 流水
    #[instrument(
        skip(self, order_id, demand, ctx),
        fields(order_id = %order_id, lines = demand.len())
    )]
    pub fn reserve(
        &self,
        order_id: &str,
        demand: &[MaterialDemand],
        ctx: &TransitionContext,
    ) -> LedgerResult<Vec<StockMovement>> {
        let merged = merge_demands(demand);
        for d in &merged {
            positive(&d.material_id, d.quantity)?;
        }

        let mut state = self.lock()?;
        for d in &merged {
            state.item(&d.material_id)?;
        }
        let shortfalls = state.shortfalls(&merged);
        if !shortfalls.is_empty() {
            warn!(shortfalls = shortfalls.len(), "库存不足, 预留失败");
            return Err(LedgerError::InsufficientStock { shortfalls });
        }

        let steps: Vec<Step> = merged
            .iter()
            .map(|d| Step::new(&d.material_id, MovementKind::Reserve, d.quantity))
            .collect();
        let movements = state.commit(&steps, Some(order_id), ctx)?;
        for d in &merged {
            *state
                .reservations
                .entry(order_id.to_string())
                .or_default()
                .entry(d.material_id.clone())
                .or_insert(Decimal::ZERO) += d.quantity;
        }

        info!(materials = movements.len(), "物料已预留");
        Ok(movements)
    }

    /// 消耗订单已预留的物料
    ///
    /// # 规则
    /// - 消耗量不得超过该订单在该物料上的预留量 (OverConsumption)
    /// - 每个物料追加 RELEASE + EXIT 两条流水, 整批校验通过后才写入
    #[instrument(
        skip(self, order_id, demand, ctx),
        fields(order_id = %order_id, lines = demand.len())
    )]
    pub fn consume(
        &self,
        order_id: &str,
        demand: &[MaterialDemand],
        ctx: &TransitionContext,
    ) -> LedgerResult<Vec<StockMovement>> {
        let merged = merge_demands(demand);
        for d in &merged {
            positive(&d.material_id, d.quantity)?;
        }

        let mut state = self.lock()?;
        for d in &merged {
            state.item(&d.material_id)?;
            let reserved = state.held(order_id, &d.material_id);
            if d.quantity > reserved {
                return Err(LedgerError::OverConsumption {
                    material_id: d.material_id.clone(),
                    requested: d.quantity,
                    reserved,
                });
            }
        }

        let steps: Vec<Step> = merged
            .iter()
            .flat_map(|d| {
                [
                    Step::new(&d.material_id, MovementKind::Release, d.quantity),
                    Step::new(&d.material_id, MovementKind::Exit, d.quantity),
                ]
            })
            .collect();
        let movements = state.commit(&steps, Some(order_id), ctx)?;
        for d in &merged {
            state.take_reservation(order_id, &d.material_id, d.quantity);
        }

        info!(materials = merged.len(), "物料已消耗");
        Ok(movements)
    }

    /// 释放订单的部分预留 (只退回给定数量, 订单其余预留保持不变)
    ///
    /// # 规则
    /// - 释放量不得超过该订单在该物料上的预留量 (OverRelease)
    /// - 每个物料追加一条 RELEASE 流水
    #[instrument(
        skip(self, order_id, demand, ctx),
        fields(order_id = %order_id, lines = demand.len())
    )]
    pub fn release(
        &self,
        order_id: &str,
        demand: &[MaterialDemand],
        ctx: &TransitionContext,
    ) -> LedgerResult<Vec<StockMovement>> {
        let merged = merge_demands(demand);
        for d in &merged {
            positive(&d.material_id, d.quantity)?;
        }

        let mut state = self.lock()?;
        for d in &merged {
            state.item(&d.material_id)?;
            let reserved = state.held(order_id, &d.material_id);
            if d.quantity > reserved {
                return Err(LedgerError::OverRelease {
                    material_id: d.material_id.clone(),
                    requested: d.quantity,
                    reserved,
                });
            }
        }

        let steps: Vec<Step> = merged
            .iter()
            .map(|d| Step::new(&d.material_id, MovementKind::Release, d.quantity))
            .collect();
        let movements = state.commit(&steps, Some(order_id), ctx)?;
        for d in &merged {
            state.take_reservation(order_id, &d.material_id, d.quantity);
        }

        info!(materials = movements.len(), "部分预留已释放");
        Ok(movements)
    }

    /// 释放订单全部未消耗的预留 (无预留时返回空)
    #[instrument(skip(self, order_id, ctx), fields(order_id = %order_id))]
    pub fn release_order(
        &self,
        order_id: &str,
        ctx: &TransitionContext,
    ) -> LedgerResult<Vec<StockMovement>> {
        let mut state = self.lock()?;
        let Some(held) = state.reservations.get(order_id) else {
            return Ok(Vec::new());
        };

        let steps: Vec<Step> = held
            .iter()
            .map(|(material_id, quantity)| {
                Step::new(material_id, MovementKind::Release, *quantity)
            })
            .collect();
        let movements = state.commit(&steps, Some(order_id), ctx)?;
        state.reservations.remove(order_id);
        info!(materials = movements.len(), "预留已释放");
        Ok(movements)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn item(&self, material_id: &str) -> LedgerResult<InventoryItem> {
        let state = self.lock()?;
        state.item(material_id).cloned()
    }

    pub fn items(&self) -> LedgerResult<Vec<InventoryItem>> {
        let state = self.lock()?;
        Ok(state.items.values().cloned().collect())
    }

    /// 订单当前持有的预留 (material_id -> 数量)
    pub fn reserved_for(&self, order_id: &str) -> LedgerResult<BTreeMap<String, Decimal>> {
        let state = self.lock()?;
        Ok(state.reservations.get(order_id).cloned().unwrap_or_default())
    }

    pub fn movements(&self) -> LedgerResult<Vec<StockMovement>> {
        let state = self.lock()?;
        Ok(state.movements.clone())
    }

    /// 按来源单据筛选流水
    pub fn movements_for(&self, origin: &str) -> LedgerResult<Vec<StockMovement>> {
        let state = self.lock()?;
        Ok(state
            .movements
            .iter()
            .filter(|m| m.origin.as_deref() == Some(origin))
            .cloned()
            .collect())
    }

    // ==========================================
    // 一致性
    // ==========================================

    /// 由流水重放余额 (已登记但无流水的物料为 0)
    pub fn replay_balances(&self) -> LedgerResult<BTreeMap<String, ReplayedBalance>> {
        let state = self.lock()?;
        Ok(replay(&state))
    }

    /// 校验增量余额与流水重放一致, 且无负值
    ///
    /// # 返回
    /// 不一致描述列表 (空表示一致)
    pub fn verify_consistency(&self) -> LedgerResult<Vec<String>> {
        let state = self.lock()?;
        let replayed = replay(&state);
        let mut problems = Vec::new();

        for item in state.items.values() {
            if !item.is_consistent() {
                problems.push(format!(
                    "NEGATIVE_BALANCE: material={}, total={}, reserved={}",
                    item.material_id, item.total, item.reserved
                ));
            }
            let balance = replayed.get(&item.material_id).copied().unwrap_or_default();
            if balance.total != item.total || balance.reserved != item.reserved {
                problems.push(format!(
                    "REPLAY_MISMATCH: material={}, ledger={}/{}, replay={}/{}",
                    item.material_id, item.total, item.reserved, balance.total, balance.reserved
                ));
            }
        }

        let mut held: BTreeMap<&str, Decimal> = BTreeMap::new();
        for per_order in state.reservations.values() {
            for (material_id, quantity) in per_order {
                *held.entry(material_id.as_str()).or_insert(Decimal::ZERO) += *quantity;
            }
        }
        for (material_id, quantity) in held {
            let reserved = state
                .items
                .get(material_id)
                .map(|i| i.reserved)
                .unwrap_or(Decimal::ZERO);
            if quantity != reserved {
                problems.push(format!(
                    "RESERVATION_MISMATCH: material={}, orders={}, ledger={}",
                    material_id, quantity, reserved
                ));
            }
        }

        Ok(problems)
    }
}

fn replay(state: &LedgerState) -> BTreeMap<String, ReplayedBalance> {
    let mut balances: BTreeMap<String, ReplayedBalance> = state
        .items
        .keys()
        .map(|id| (id.clone(), ReplayedBalance::default()))
        .collect();
    for movement in &state.movements {
        let (d_total, d_reserved) = movement.deltas();
        let balance = balances.entry(movement.material_id.clone()).or_default();
        balance.total += d_total;
        balance.reserved += d_reserved;
    }
    balances
}

fn check_balance(material_id: &str, total: Decimal, reserved: Decimal) -> LedgerResult<()> {
    if total < Decimal::ZERO || reserved < Decimal::ZERO || reserved > total {
        return Err(LedgerError::NegativeBalance {
            material_id: material_id.to_string(),
            total,
            reserved,
        });
    }
    Ok(())
}

fn positive(material_id: &str, quantity: Decimal) -> LedgerResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(LedgerError::InvalidQuantity {
            material_id: material_id.to_string(),
            quantity,
        });
    }
    Ok(())
}

// ==========================================
// 金属加工报价生产系统 - 库存台账层
// ==========================================
// 职责: 唯一的共享可变资源 (预留/消耗/流水)
// 红线: 台账实例显式注入, 不使用进程级单例
// ==========================================

pub mod error;
pub mod inventory_ledger;

pub use error::{LedgerError, LedgerResult};
pub use inventory_ledger::{InventoryLedger, ReplayedBalance};

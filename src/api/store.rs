// ==========================================
// 金属加工报价生产系统 - 内存记录存储
// ==========================================
// 职责: 报价单/生产订单的进程内存储 (单写者 + 乐观锁)
// 红线: 写回必须携带读取时的 revision, 不一致即拒绝
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::production_order::ProductionOrder;
use crate::domain::quote::Quote;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// 可存储的聚合根
pub trait Record: Clone + Send {
    const ENTITY: &'static str;

    fn id(&self) -> &str;
    fn revision(&self) -> u32;
}

impl Record for Quote {
    const ENTITY: &'static str = "Quote";

    fn id(&self) -> &str {
        &self.quote_id
    }

    fn revision(&self) -> u32 {
        self.revision
    }
}

impl Record for ProductionOrder {
    const ENTITY: &'static str = "ProductionOrder";

    fn id(&self) -> &str {
        &self.order_id
    }

    fn revision(&self) -> u32 {
        self.revision
    }
}

// ==========================================
// InMemoryStore - 内存存储
// ==========================================
#[derive(Debug)]
pub struct InMemoryStore<T: Record> {
    records: Mutex<HashMap<String, T>>,
}

impl<T: Record> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, HashMap<String, T>>> {
        self.records
            .lock()
            .map_err(|e| ApiError::LockPoisoned(e.to_string()))
    }

    pub fn insert(&self, record: T) -> ApiResult<()> {
        let mut records = self.lock()?;
        if records.contains_key(record.id()) {
            return Err(ApiError::AlreadyExists {
                entity: T::ENTITY.to_string(),
                id: record.id().to_string(),
            });
        }
        records.insert(record.id().to_string(), record);
        Ok(())
    }

    pub fn get(&self, id: &str) -> ApiResult<T> {
        let records = self.lock()?;
        records.get(id).cloned().ok_or_else(|| ApiError::NotFound {
            entity: T::ENTITY.to_string(),
            id: id.to_string(),
        })
    }

    /// 乐观锁写回
    ///
    /// # 参数
    /// - `expected_revision`: 读取时的 revision
    /// - `record`: 新状态
    pub fn replace(&self, expected_revision: u32, record: T) -> ApiResult<()> {
        let mut records = self.lock()?;
        let current = records.get(record.id()).ok_or_else(|| ApiError::NotFound {
            entity: T::ENTITY.to_string(),
            id: record.id().to_string(),
        })?;
        if current.revision() != expected_revision {
            return Err(ApiError::RevisionConflict {
                entity: T::ENTITY.to_string(),
                id: record.id().to_string(),
                expected: expected_revision,
                actual: current.revision(),
            });
        }
        records.insert(record.id().to_string(), record);
        Ok(())
    }

    pub fn find<F>(&self, predicate: F) -> ApiResult<Option<T>>
    where
        F: Fn(&T) -> bool,
    {
        let records = self.lock()?;
        Ok(records.values().find(|r| predicate(r)).cloned())
    }

    pub fn len(&self) -> ApiResult<usize> {
        Ok(self.lock()?.len())
    }
}

impl<T: Record> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub type QuoteStore = InMemoryStore<Quote>;
pub type OrderStore = InMemoryStore<ProductionOrder>;

// ==========================================
// 金属加工报价生产系统 - 审计事实发布
// ==========================================
// 职责: 定义审计事实发布 trait, 实现依赖倒置
// 说明: 核心只产出事实, 持久化由外部审计协作方实现此 trait
// ==========================================

use crate::domain::audit::AuditFact;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 审计事实发布 Trait
// ==========================================

/// 审计事实发布者 Trait
///
/// # 实现说明
/// - 外部审计协作方决定持久化与保留策略
/// - 发布失败不回滚业务状态, 由 API 层记录告警
pub trait AuditFactPublisher: Send + Sync {
    /// 发布审计事实
    ///
    /// # 返回
    /// - `Ok(())`: 已交给审计方
    /// - `Err`: 发布失败
    fn publish(&self, fact: &AuditFact) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作发布者
///
/// 用于不需要审计的场景 (如单元测试)
#[derive(Debug, Clone, Default)]
pub struct NoOpAuditPublisher;

impl AuditFactPublisher for NoOpAuditPublisher {
    fn publish(&self, fact: &AuditFact) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpAuditPublisher: 跳过审计事实 - action={}, record_id={}",
            fact.action.as_str(),
            fact.record_id
        );
        Ok(())
    }
}

/// 内存记录发布者
///
/// 保留全部已发布事实, 供测试断言与演示输出
#[derive(Debug, Default)]
pub struct RecordingAuditPublisher {
    facts: Mutex<Vec<AuditFact>>,
}

impl RecordingAuditPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已发布事实快照
    pub fn facts(&self) -> Vec<AuditFact> {
        self.facts.lock().map(|f| f.clone()).unwrap_or_default()
    }

    /// 取出并清空
    pub fn take(&self) -> Vec<AuditFact> {
        self.facts
            .lock()
            .map(|mut f| std::mem::take(&mut *f))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.facts.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditFactPublisher for RecordingAuditPublisher {
    fn publish(&self, fact: &AuditFact) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut facts = self
            .facts
            .lock()
            .map_err(|e| format!("审计记录锁中毒: {}", e))?;
        facts.push(fact.clone());
        Ok(())
    }
}

/// 可选的审计发布者包装
///
/// 简化 Option<Arc<dyn AuditFactPublisher>> 的使用
#[derive(Clone)]
pub struct OptionalAuditPublisher {
    inner: Option<Arc<dyn AuditFactPublisher>>,
}

impl OptionalAuditPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn AuditFactPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例 (不发布)
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 逐条发布, 失败只记录告警
    ///
    /// # 返回
    /// 发布失败的条数
    pub fn publish_all(&self, facts: &[AuditFact]) -> usize {
        let Some(publisher) = &self.inner else {
            tracing::debug!(
                "OptionalAuditPublisher: 未配置发布者, 跳过 {} 条审计事实",
                facts.len()
            );
            return 0;
        };
        let mut failed = 0;
        for fact in facts {
            if let Err(e) = publisher.publish(fact) {
                failed += 1;
                tracing::warn!(
                    action = fact.action.as_str(),
                    record_id = %fact.record_id,
                    error = %e,
                    "审计事实发布失败"
                );
            }
        }
        failed
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalAuditPublisher {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit::{AuditAction, AuditModule};
    use chrono::Utc;

    fn fact(action: AuditAction) -> AuditFact {
        AuditFact::new(action, AuditModule::Quote, "Q1", "ORC-0001", "tester", Utc::now())
    }

    struct FailingPublisher;

    impl AuditFactPublisher for FailingPublisher {
        fn publish(&self, _fact: &AuditFact) -> Result<(), Box<dyn Error + Send + Sync>> {
            Err("audit store offline".into())
        }
    }

    #[test]
    fn test_noop_publisher() {
        assert!(NoOpAuditPublisher.publish(&fact(AuditAction::QuoteSubmitted)).is_ok());
    }

    #[test]
    fn test_recording_publisher() {
        let recorder = Arc::new(RecordingAuditPublisher::new());
        let publisher = OptionalAuditPublisher::with_publisher(recorder.clone());
        assert!(publisher.is_configured());

        let failed = publisher.publish_all(&[
            fact(AuditAction::QuoteSubmitted),
            fact(AuditAction::QuoteApproved),
        ]);
        assert_eq!(failed, 0);
        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.facts()[1].action, AuditAction::QuoteApproved);

        let taken = recorder.take();
        assert_eq!(taken.len(), 2);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_optional_publisher_none() {
        let publisher = OptionalAuditPublisher::none();
        assert!(!publisher.is_configured());
        assert_eq!(publisher.publish_all(&[fact(AuditAction::QuoteSubmitted)]), 0);
    }

    #[test]
    fn test_publish_failures_are_counted() {
        let publisher = OptionalAuditPublisher::with_publisher(Arc::new(FailingPublisher));
        let failed = publisher.publish_all(&[
            fact(AuditAction::QuoteSubmitted),
            fact(AuditAction::QuoteRejected),
        ]);
        assert_eq!(failed, 2);
    }
}

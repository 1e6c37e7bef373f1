// ==========================================
// 金属加工报价生产系统 - 计算耗时统计
// ==========================================
// 职责: 计算阶段耗时 (BOM/排样/成本/定价) 与慢计算告警
// ==========================================

use std::cell::Cell;
use std::sync::OnceLock;
use std::time::Instant;

/// 慢计算阈值环境变量 (毫秒)
pub const SLOW_CALC_MS_ENV: &str = "FAB_QUOTE_SLOW_CALC_MS";

const DEFAULT_SLOW_CALC_MS: u64 = 50;

static SLOW_CALC_THRESHOLD_MS: OnceLock<u64> = OnceLock::new();

thread_local! {
    static PERF_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// 慢计算阈值 (首次读取环境变量后固定)
pub fn slow_threshold_ms() -> u64 {
    *SLOW_CALC_THRESHOLD_MS.get_or_init(|| {
        std::env::var(SLOW_CALC_MS_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_SLOW_CALC_MS)
    })
}

/// 当前线程上活跃的 PerfGuard 层数
pub fn current_depth() -> u32 {
    PERF_DEPTH.with(|d| d.get())
}

/// 性能统计 Guard: 记录 elapsed_us 与嵌套层级, 超过阈值升级为 warn
///
/// 使用方式:
/// ```ignore
/// let _perf = fab_quote_engine::perf::PerfGuard::new("nest");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    depth: u32,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        let depth = PERF_DEPTH.with(|d| {
            let next = d.get().saturating_add(1);
            d.set(next);
            next
        });
        Self {
            op,
            start: Instant::now(),
            depth,
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let elapsed_us = elapsed.as_micros() as u64;

        if elapsed.as_millis() as u64 >= slow_threshold_ms() {
            tracing::warn!(
                target: "perf",
                op = self.op,
                elapsed_us,
                depth = self.depth,
                "slow calculation"
            );
        } else {
            tracing::info!(
                target: "perf",
                op = self.op,
                elapsed_us,
                depth = self.depth,
                "done"
            );
        }

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

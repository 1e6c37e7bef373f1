// ==========================================
// 金属加工报价生产系统 - 报价计算编排器
// ==========================================
// 用途: 协调 BOM → 排样 → 工时 → 成本 → 定价, 产出计算快照
// 红线: 纯计算, 无共享可变状态, 各明细可并行
// ==========================================

use crate::config::catalog::CatalogLookup;
use crate::config::engine_config::EngineConfig;
use crate::domain::part::ProductRequest;
use crate::domain::snapshot::CalculationSnapshot;
use crate::engine::bom_builder::BomBuilder;
use crate::engine::cost_calculator::{estimate_process_times, CostCalculator};
use crate::engine::error::CalcResult;
use crate::engine::nesting::NestingOptimizer;
use crate::engine::pricing::PricingCalculator;
use crate::perf::PerfGuard;
use chrono::Utc;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ==========================================
// QuotePipeline - 报价计算编排器
// ==========================================
pub struct QuotePipeline {
    catalog: Arc<dyn CatalogLookup>,
    bom_builder: BomBuilder,
    nesting: NestingOptimizer,
    cost: CostCalculator,
    pricing: PricingCalculator,
}

impl QuotePipeline {
    /// 创建编排器
    ///
    /// # 参数
    /// - catalog: 目录 (注入, 只读)
    pub fn new(catalog: Arc<dyn CatalogLookup>) -> Self {
        Self {
            catalog,
            bom_builder: BomBuilder::new(),
            nesting: NestingOptimizer::new(),
            cost: CostCalculator::new(),
            pricing: PricingCalculator::new(),
        }
    }

    /// 替换 BOM 生成引擎 (自定义型号注册表)
    pub fn with_bom_builder(mut self, bom_builder: BomBuilder) -> Self {
        self.bom_builder = bom_builder;
        self
    }

    pub fn catalog(&self) -> &dyn CatalogLookup {
        self.catalog.as_ref()
    }

    pub fn bom_builder(&self) -> &BomBuilder {
        &self.bom_builder
    }

    /// 计算单个明细
    ///
    /// # 参数
    /// - request: 参数化产品请求
    /// - config: 引擎配置 (每次计算由调用方传入)
    ///
    /// # 返回
    /// 不可变计算快照
    #[instrument(skip(self, config), fields(model_id = %request.model_id))]
    pub fn calculate(
        &self,
        request: &ProductRequest,
        config: &EngineConfig,
    ) -> CalcResult<CalculationSnapshot> {
        let _perf = PerfGuard::new("calculate_line");
        let catalog = self.catalog.as_ref();

        // 步骤1: BOM
        let bom = {
            let _p = PerfGuard::new("build_bom");
            self.bom_builder.build(request, catalog)?
        };

        // 步骤2: 排样
        let nesting = {
            let _p = PerfGuard::new("nest");
            self.nesting
                .nest(&bom, &catalog.standard_sheet_sizes(), &config.nesting)?
        };

        // 步骤3: 工时 + 成本
        let cost = {
            let _p = PerfGuard::new("cost");
            let processes = estimate_process_times(&bom, request.finish, &config.process_times);
            self.cost
                .cost(&bom, &nesting, &processes, &config.cost, catalog)?
        };

        // 步骤4: 定价
        let pricing = {
            let _p = PerfGuard::new("price");
            self.pricing.price(&cost, bom.category, &config.pricing)?
        };

        info!(
            sheets = nesting.summary.total_sheets,
            total_cost = %cost.total(),
            unit_price = %pricing.final_unit_price,
            "明细计算完成"
        );

        Ok(CalculationSnapshot {
            snapshot_id: uuid::Uuid::new_v4().to_string(),
            request: request.clone(),
            bom,
            nesting,
            cost,
            pricing,
            calculated_at: Utc::now(),
        })
    }

    /// 并行计算多个明细
    ///
    /// # 返回
    /// 与输入顺序一致的结果列表 (单条失败不影响其他明细)
    pub fn calculate_many(
        &self,
        requests: &[ProductRequest],
        config: &EngineConfig,
    ) -> Vec<CalcResult<CalculationSnapshot>> {
        let _perf = PerfGuard::new("calculate_many");
        let results: Vec<CalcResult<CalculationSnapshot>> = requests
            .par_iter()
            .map(|request| self.calculate(request, config))
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!(total = requests.len(), failed, "部分明细计算失败");
        }
        results
    }
}

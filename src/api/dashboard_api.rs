// ==========================================
// 工程师能力矩阵系统 - 驾驶舱 API
// ==========================================
// 职责: 聚合评分与分析结果，供前端图表与报表使用
// 架构: API 层 → Engine 层 (ScoringEngine / AnalyticsEngine)
// 每次调用重新加载并计算，不做缓存
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::assessment::{AssessmentLedger, CoreSkillLedger};
use crate::domain::entity::{Engineer, EntityCatalog};
use crate::domain::types::Shift;
use crate::engine::analytics::{AnalyticsEngine, Insight, ShiftSummary, SkillGapRow, TrainingItem};
use crate::engine::core_skills::{CoreCategoryRollup, CoreSkillScore, CoreSkillScoring};
use crate::engine::scoring::{
    AreaRollup, CompletionRate, EngineerScore, HeatmapRow, MachineRollup, RadarPoint, ScoreDistribution,
    ScoringEngine,
};
use crate::engine::trend::{predict_from_snapshots, TrendPrediction};
use crate::repository::{AssessmentRepository, EntityRepository, SnapshotRepository};

// ==========================================
// 响应结构
// ==========================================

/// 单个工程师的完整报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerReport {
    pub engineer: Engineer,
    pub score: EngineerScore,
    pub area_rollups: Vec<AreaRollup>,
    pub machine_rollups: Vec<MachineRollup>,
    pub radar: Vec<RadarPoint>,
    pub training_plan: Vec<TrainingItem>,
    pub core_skills: CoreSkillScore,
    pub core_categories: Vec<CoreCategoryRollup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEngineer {
    pub rank: usize,
    pub engineer_id: String,
    pub name: String,
    pub shift: Shift,
    pub percent: f64,
}

/// 团队驾驶舱
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDashboard {
    pub engineer_count: usize,
    pub competency_count: usize,
    pub team_completion: CompletionRate,
    pub distribution: ScoreDistribution,
    pub skills_gap: Vec<SkillGapRow>,
    pub shifts: Vec<ShiftSummary>,
    pub ranking: Vec<RankedEngineer>,
    pub trend: Option<TrendPrediction>,
    pub insights: Vec<Insight>,
}

// ==========================================
// DashboardApi - 驾驶舱 API
// ==========================================
pub struct DashboardApi {
    entity_repo: Arc<EntityRepository>,
    assessment_repo: Arc<AssessmentRepository>,
    snapshot_repo: Arc<SnapshotRepository>,
    config: Arc<ConfigManager>,
}

impl DashboardApi {
    pub fn new(
        entity_repo: Arc<EntityRepository>,
        assessment_repo: Arc<AssessmentRepository>,
        snapshot_repo: Arc<SnapshotRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            entity_repo,
            assessment_repo,
            snapshot_repo,
            config,
        }
    }

    fn load(&self) -> ApiResult<(EntityCatalog, AssessmentLedger)> {
        let policy = self.config.history_policy()?;
        let catalog = self.entity_repo.load_catalog()?;
        let ledger = self.assessment_repo.load_ledger(policy)?;
        Ok((catalog, ledger))
    }

    // ==========================================
    // 工程师视角
    // ==========================================

    /// 工程师报告：完成度、区域/机台汇总、雷达图、培训计划、核心技能
    ///
    /// # 参数
    /// - weighted: 雷达图是否按机台重要度加权
    pub fn engineer_report(&self, engineer_id: &str, weighted: bool) -> ApiResult<EngineerReport> {
        let (catalog, ledger) = self.load()?;
        let engineer = catalog
            .find_engineer(engineer_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Engineer(id={})不存在", engineer_id)))?;

        let core_ledger: CoreSkillLedger = self.assessment_repo.load_ledger(ledger.policy())?;
        let analytics = AnalyticsEngine::new(&catalog, &ledger);
        let scoring = analytics.scoring();
        let core = CoreSkillScoring::new(&catalog, &core_ledger);

        tracing::debug!(engineer_id, weighted, "生成工程师报告");
        Ok(EngineerReport {
            score: scoring.score_engineer(engineer_id),
            area_rollups: scoring.area_rollups(engineer_id),
            machine_rollups: scoring.machine_rollups(engineer_id),
            radar: scoring.radar_by_area(engineer_id, weighted),
            training_plan: analytics.training_plan(engineer_id),
            core_skills: core.score_engineer(engineer_id),
            core_categories: core.category_rollups(engineer_id),
            engineer,
        })
    }

    pub fn training_plan(&self, engineer_id: &str) -> ApiResult<Vec<TrainingItem>> {
        let (catalog, ledger) = self.load()?;
        if catalog.find_engineer(engineer_id).is_none() {
            return Err(ApiError::NotFound(format!("Engineer(id={})不存在", engineer_id)));
        }
        Ok(AnalyticsEngine::new(&catalog, &ledger).training_plan(engineer_id))
    }

    // ==========================================
    // 团队视角
    // ==========================================

    /// 热力图（可按区域过滤；未知区域返回空）
    pub fn heatmap(&self, area_filter: Option<&str>) -> ApiResult<Vec<HeatmapRow>> {
        let (catalog, ledger) = self.load()?;
        Ok(ScoringEngine::new(&catalog, &ledger).heatmap(area_filter))
    }

    pub fn skills_gap(&self, area_filter: Option<&str>) -> ApiResult<Vec<SkillGapRow>> {
        let (catalog, ledger) = self.load()?;
        Ok(AnalyticsEngine::new(&catalog, &ledger).skills_gap(area_filter))
    }

    pub fn shift_comparison(&self, weighted: bool) -> ApiResult<Vec<ShiftSummary>> {
        let (catalog, ledger) = self.load()?;
        Ok(AnalyticsEngine::new(&catalog, &ledger).shift_comparison(weighted))
    }

    /// 团队驾驶舱：完成度、分布、技能缺口、班次、排名、趋势、洞察
    pub fn team_dashboard(&self, weighted: bool) -> ApiResult<TeamDashboard> {
        let (catalog, ledger) = self.load()?;
        let snapshots = self.snapshot_repo.list()?;
        let trend = predict_from_snapshots(&snapshots);

        let analytics = AnalyticsEngine::new(&catalog, &ledger);
        let scoring = analytics.scoring();

        let ranking = scoring
            .rank_engineers(weighted)
            .into_iter()
            .enumerate()
            .map(|(index, (engineer, score))| RankedEngineer {
                rank: index + 1,
                engineer_id: engineer.id.clone(),
                name: engineer.name.clone(),
                shift: engineer.shift,
                percent: score.percent(weighted),
            })
            .collect();

        let dashboard = TeamDashboard {
            engineer_count: catalog.engineers.len(),
            competency_count: catalog.competency_count(),
            team_completion: scoring.team_completion(),
            distribution: scoring.score_distribution(),
            skills_gap: analytics.skills_gap(None),
            shifts: analytics.shift_comparison(weighted),
            ranking,
            insights: analytics.generate_insights(trend.as_ref(), weighted),
            trend,
        };

        tracing::debug!(
            engineers = dashboard.engineer_count,
            insights = dashboard.insights.len(),
            snapshots = snapshots.len(),
            "生成团队驾驶舱"
        );
        Ok(dashboard)
    }
}

// ==========================================
// 工程师能力矩阵系统 - 分析引擎
// ==========================================
// 职责: 技能缺口、培训计划、班次对比、自动洞察
// 输入: ScoringEngine (实体目录 + 台账的只读视图)
// 输出: 纯数据记录，供驾驶舱/报表展示
// ==========================================
// 红线: 只读，不修改台账；可并行调用
// ==========================================

mod gap;
mod insight;
mod shift;

#[cfg(test)]
mod tests;

use crate::domain::assessment::AssessmentLedger;
use crate::domain::entity::EntityCatalog;
use crate::engine::scoring::ScoringEngine;

pub use gap::{SkillGapRow, TrainingItem, GAP_SIGNIFICANCE_THRESHOLD};
pub use insight::{
    shift_gap_insight, top_performer_insight, training_priority_insight, trend_insight, Insight,
    TopPerformer, SHIFT_GAP_ALERT_THRESHOLD, TOP_PERFORMER_THRESHOLD, TRAINING_NEED_WARNING_PERCENT,
};
pub use shift::{shift_spread, ShiftSpread, ShiftSummary};

// ==========================================
// AnalyticsEngine - 分析引擎
// ==========================================
pub struct AnalyticsEngine<'a> {
    scoring: ScoringEngine<'a>,
}

impl<'a> AnalyticsEngine<'a> {
    pub fn new(catalog: &'a EntityCatalog, ledger: &'a AssessmentLedger) -> Self {
        Self {
            scoring: ScoringEngine::new(catalog, ledger),
        }
    }

    pub fn scoring(&self) -> &ScoringEngine<'a> {
        &self.scoring
    }
}

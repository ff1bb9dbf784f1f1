use super::shift::{shift_spread, ShiftSummary};
use super::AnalyticsEngine;
use crate::domain::types::{InsightKind, TrendDirection};
use crate::engine::scoring::ScoreDistribution;
use crate::engine::trend::TrendPrediction;
use serde::{Deserialize, Serialize};

/// 班次差距告警阈值（百分点）
pub const SHIFT_GAP_ALERT_THRESHOLD: f64 = 10.0;
/// 需培训单元占比告警阈值（%）
pub const TRAINING_NEED_WARNING_PERCENT: f64 = 30.0;
/// 优秀员工完成度阈值（%）
pub const TOP_PERFORMER_THRESHOLD: f64 = 85.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformer {
    pub engineer_id: String,
    pub name: String,
    pub percent: f64,
}

// ==========================================
// 规则: 各自独立，只依赖各自的聚合输入
// ==========================================

/// 趋势规则
pub fn trend_insight(trend: Option<&TrendPrediction>) -> Option<Insight> {
    let trend = trend?;
    match trend.trend {
        TrendDirection::Up => Some(Insight {
            kind: InsightKind::Positive,
            title: "能力提升趋势".to_string(),
            message: format!(
                "团队完成度预计提升 {:.1} 个百分点，下一期预测 {:.1}%",
                trend.change.abs(),
                trend.predicted
            ),
        }),
        TrendDirection::Down => Some(Insight {
            kind: InsightKind::Warning,
            title: "能力下滑趋势".to_string(),
            message: format!(
                "团队完成度预计下降 {:.1} 个百分点，下一期预测 {:.1}%",
                trend.change.abs(),
                trend.predicted
            ),
        }),
        TrendDirection::Stable => None,
    }
}

/// 班次差距规则：最好与最差班次平均完成度相差超过 10 个百分点
pub fn shift_gap_insight(summaries: &[ShiftSummary]) -> Option<Insight> {
    let spread = shift_spread(summaries)?;
    if spread.gap <= SHIFT_GAP_ALERT_THRESHOLD {
        return None;
    }
    Some(Insight {
        kind: InsightKind::Alert,
        title: "班次能力差距".to_string(),
        message: format!(
            "{} 班 ({:.1}%) 与 {} 班 ({:.1}%) 相差 {:.1} 个百分点",
            spread.best, spread.best_percent, spread.worst, spread.worst_percent, spread.gap
        ),
    })
}

/// 培训需求规则：超过 30% 的单元低于 2 分
pub fn training_priority_insight(distribution: &ScoreDistribution) -> Option<Insight> {
    let share = distribution.needs_training_percent();
    if share <= TRAINING_NEED_WARNING_PERCENT {
        return None;
    }
    Some(Insight {
        kind: InsightKind::Warning,
        title: "培训需求偏高".to_string(),
        message: format!(
            "{:.1}% 的能力单元 ({}/{}) 低于胜任分数，需要安排培训",
            share, distribution.needs_training, distribution.total_cells
        ),
    })
}

/// 优秀员工规则：最高完成度 ≥ 85%
pub fn top_performer_insight(top: Option<&TopPerformer>) -> Option<Insight> {
    let top = top?;
    if top.percent < TOP_PERFORMER_THRESHOLD {
        return None;
    }
    Some(Insight {
        kind: InsightKind::Positive,
        title: "优秀员工".to_string(),
        message: format!("{} 的整体完成度达到 {:.1}%", top.name, top.percent),
    })
}

impl<'a> AnalyticsEngine<'a> {
    /// 完成度最高的工程师
    pub fn top_performer(&self, weighted: bool) -> Option<TopPerformer> {
        self.scoring
            .rank_engineers(weighted)
            .into_iter()
            .next()
            .map(|(engineer, score)| TopPerformer {
                engineer_id: engineer.id.clone(),
                name: engineer.name.clone(),
                percent: score.percent(weighted),
            })
    }

    /// 生成全部洞察（按 趋势 → 班次 → 培训 → 优秀员工 顺序拼接）
    ///
    /// weighted 与驾驶舱的班次对比、排名口径一致
    pub fn generate_insights(&self, trend: Option<&TrendPrediction>, weighted: bool) -> Vec<Insight> {
        let shifts = self.shift_comparison(weighted);
        let distribution = self.scoring.score_distribution();
        let top = self.top_performer(weighted);

        [
            trend_insight(trend),
            shift_gap_insight(&shifts),
            training_priority_insight(&distribution),
            top_performer_insight(top.as_ref()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

use super::AnalyticsEngine;
use crate::domain::types::{GapPriority, TrainingPriority, COMPETENT_THRESHOLD};
use serde::{Deserialize, Serialize};

/// 缺口显著性阈值：gap <= 0.5 不列为培训重点
pub const GAP_SIGNIFICANCE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGapRow {
    pub area_id: String,
    pub area: String,
    pub machine_id: String,
    pub machine: String,
    pub competency_id: String,
    pub competency: String,
    pub current_avg: f64,
    pub target: u32,
    pub gap: f64,
    pub priority: GapPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingItem {
    pub area_id: String,
    pub area: String,
    pub machine_id: String,
    pub machine: String,
    pub competency_id: String,
    pub competency: String,
    pub current_score: u32,
    pub target_score: u32,
    pub priority: TrainingPriority,
}

impl<'a> AnalyticsEngine<'a> {
    /// 团队技能缺口（按 gap 降序）
    ///
    /// - current_avg = Σ 全员得分 / 工程师人数
    /// - gap = maxScore - current_avg，仅保留 gap > 0.5
    /// - 无工程师时返回空列表
    pub fn skills_gap(&self, area_filter: Option<&str>) -> Vec<SkillGapRow> {
        let catalog = self.scoring.catalog();
        let engineer_count = catalog.engineers.len();
        if engineer_count == 0 {
            return Vec::new();
        }

        let mut rows: Vec<SkillGapRow> = catalog
            .competency_cells()
            .filter(|cell| area_filter.map_or(true, |a| cell.area.id == a))
            .filter_map(|cell| {
                let total: u64 = catalog
                    .engineers
                    .iter()
                    .map(|e| self.scoring.cell_score(&e.id, &cell) as u64)
                    .sum();
                let current_avg = total as f64 / engineer_count as f64;
                let gap = cell.competency.max_score as f64 - current_avg;
                if gap <= GAP_SIGNIFICANCE_THRESHOLD {
                    return None;
                }
                Some(SkillGapRow {
                    area_id: cell.area.id.clone(),
                    area: cell.area.name.clone(),
                    machine_id: cell.machine.id.clone(),
                    machine: cell.machine.name.clone(),
                    competency_id: cell.competency.id.clone(),
                    competency: cell.competency.name.clone(),
                    current_avg,
                    target: cell.competency.max_score,
                    gap,
                    priority: GapPriority::from_gap(gap),
                })
            })
            .collect();

        rows.sort_by(|a, b| b.gap.total_cmp(&a.gap));
        rows
    }

    /// 个人培训计划（按当前分数升序）
    ///
    /// 收录全部 score < 2 的能力项，目标分为该能力项满分。
    pub fn training_plan(&self, engineer_id: &str) -> Vec<TrainingItem> {
        let mut items: Vec<TrainingItem> = self
            .scoring
            .catalog()
            .competency_cells()
            .filter_map(|cell| {
                let current_score = self.scoring.cell_score(engineer_id, &cell);
                if current_score >= COMPETENT_THRESHOLD {
                    return None;
                }
                Some(TrainingItem {
                    area_id: cell.area.id.clone(),
                    area: cell.area.name.clone(),
                    machine_id: cell.machine.id.clone(),
                    machine: cell.machine.name.clone(),
                    competency_id: cell.competency.id.clone(),
                    competency: cell.competency.name.clone(),
                    current_score,
                    target_score: cell.competency.max_score,
                    priority: TrainingPriority::from_score(current_score),
                })
            })
            .collect();

        items.sort_by_key(|item| item.current_score);
        items
    }
}

// ==========================================
// 工程师能力矩阵系统 - 评分引擎
// ==========================================
// 职责: 由实体目录 + 评分台账推导完成度指标
// 输入: EntityCatalog + AssessmentLedger (只读借用)
// 输出: 原始/加权总分、完成度、区域/机台汇总、雷达图、热力图、分布
// ==========================================
// 红线:
// - 纯函数，无缓存，每次调用重新计算
// - 遍历始终从现存实体出发，孤儿评分不会进入汇总
// - 分母为 0 时百分比为 0，不产生 NaN
// ==========================================

use crate::domain::assessment::{AssessmentKey, AssessmentLedger};
use crate::domain::entity::{CompetencyCell, Engineer, EntityCatalog};
use crate::domain::types::{HeatmapBand, Shift, COMPETENT_THRESHOLD, DEFAULT_MAX_SCORE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 雷达图满分刻度
pub const RADAR_FULL_MARK: f64 = 100.0;

/// 百分比计算 (分母为 0 返回 0)
pub fn percent(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        return 0.0;
    }
    numerator / denominator * 100.0
}

// ==========================================
// 输出记录
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerScore {
    pub engineer_id: String,
    pub raw: u64,
    pub weighted: u64,
    pub max_raw: u64,
    pub max_weighted: u64,
    pub raw_percent: f64,
    pub weighted_percent: f64,
}

impl EngineerScore {
    pub fn percent(&self, weighted: bool) -> f64 {
        if weighted {
            self.weighted_percent
        } else {
            self.raw_percent
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRollup {
    pub area_id: String,
    pub area_name: String,
    pub raw: u64,
    pub weighted: u64,
    pub raw_percent: f64,
    pub weighted_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineRollup {
    pub area_id: String,
    pub machine_id: String,
    pub machine_name: String,
    pub importance: u32,
    pub raw: u64,
    pub max_raw: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarPoint {
    pub area: String,
    pub percent: f64,
    pub full_mark: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub area_id: String,
    pub machine_id: String,
    pub competency_id: String,
    pub competency_name: String,
    pub score: u32,
    pub max_score: u32,
    pub percent_of_max: f64,
    pub band: HeatmapBand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapRow {
    pub engineer_id: String,
    pub engineer_name: String,
    pub shift: Shift,
    pub cells: Vec<HeatmapCell>,
}

/// 分数分布直方图（工程师 × 能力项，缺省记 0 分）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDistribution {
    pub counts: BTreeMap<u32, usize>,
    pub total_cells: usize,
    /// score < 2 的单元数
    pub needs_training: usize,
}

impl ScoreDistribution {
    fn empty() -> Self {
        Self {
            counts: (0..=DEFAULT_MAX_SCORE).map(|s| (s, 0)).collect(),
            total_cells: 0,
            needs_training: 0,
        }
    }

    fn record(&mut self, score: u32) {
        *self.counts.entry(score).or_insert(0) += 1;
        self.total_cells += 1;
        if score < COMPETENT_THRESHOLD {
            self.needs_training += 1;
        }
    }

    pub fn count(&self, score: u32) -> usize {
        self.counts.get(&score).copied().unwrap_or(0)
    }

    /// 需培训单元占比 (0~100)
    pub fn needs_training_percent(&self) -> f64 {
        percent(self.needs_training as f64, self.total_cells as f64)
    }
}

/// 团队整体完成度 (快照趋势使用的标量)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRate {
    pub total_score: u64,
    pub total_max_score: u64,
    pub percent: f64,
}

// ==========================================
// Tally - 累加器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    raw: u64,
    weighted: u64,
    max_raw: u64,
    max_weighted: u64,
}

impl Tally {
    fn add(&mut self, score: u32, max_score: u32, importance: u32) {
        let (score, max_score, importance) = (score as u64, max_score as u64, importance as u64);
        self.raw += score;
        self.weighted += score * importance;
        self.max_raw += max_score;
        self.max_weighted += max_score * importance;
    }

    fn raw_percent(&self) -> f64 {
        percent(self.raw as f64, self.max_raw as f64)
    }

    fn weighted_percent(&self) -> f64 {
        percent(self.weighted as f64, self.max_weighted as f64)
    }
}

// ==========================================
// ScoringEngine - 评分引擎
// ==========================================
pub struct ScoringEngine<'a> {
    catalog: &'a EntityCatalog,
    ledger: &'a AssessmentLedger,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(catalog: &'a EntityCatalog, ledger: &'a AssessmentLedger) -> Self {
        Self { catalog, ledger }
    }

    pub fn catalog(&self) -> &'a EntityCatalog {
        self.catalog
    }

    pub fn ledger(&self) -> &'a AssessmentLedger {
        self.ledger
    }

    /// 单元分数（台账缺省为 0）
    pub fn cell_score(&self, engineer_id: &str, cell: &CompetencyCell<'_>) -> u32 {
        let key = AssessmentKey::new(
            engineer_id,
            cell.area.id.as_str(),
            cell.machine.id.as_str(),
            cell.competency.id.as_str(),
        );
        self.ledger.get_score(&key)
    }

    fn tally<F>(&self, engineer_id: &str, include: F) -> Tally
    where
        F: Fn(&CompetencyCell<'_>) -> bool,
    {
        let mut tally = Tally::default();
        for cell in self.catalog.competency_cells().filter(|c| include(c)) {
            tally.add(
                self.cell_score(engineer_id, &cell),
                cell.competency.max_score,
                cell.machine.importance,
            );
        }
        tally
    }

    // ==========================================
    // 工程师得分
    // ==========================================

    /// 工程师总分与完成度
    ///
    /// - raw = Σ score
    /// - weighted = Σ score × importance
    /// - raw_percent = raw / Σ maxScore × 100
    /// - weighted_percent = weighted / Σ (maxScore × importance) × 100
    pub fn score_engineer(&self, engineer_id: &str) -> EngineerScore {
        let tally = self.tally(engineer_id, |_| true);
        EngineerScore {
            engineer_id: engineer_id.to_string(),
            raw: tally.raw,
            weighted: tally.weighted,
            max_raw: tally.max_raw,
            max_weighted: tally.max_weighted,
            raw_percent: tally.raw_percent(),
            weighted_percent: tally.weighted_percent(),
        }
    }

    /// 按生产区域汇总
    pub fn area_rollups(&self, engineer_id: &str) -> Vec<AreaRollup> {
        self.catalog
            .production_areas
            .iter()
            .map(|area| {
                let tally = self.tally(engineer_id, |c| c.area.id == area.id);
                AreaRollup {
                    area_id: area.id.clone(),
                    area_name: area.name.clone(),
                    raw: tally.raw,
                    weighted: tally.weighted,
                    raw_percent: tally.raw_percent(),
                    weighted_percent: tally.weighted_percent(),
                }
            })
            .collect()
    }

    /// 按机台汇总（机台内部不加权）
    pub fn machine_rollups(&self, engineer_id: &str) -> Vec<MachineRollup> {
        let mut rollups = Vec::new();
        for area in &self.catalog.production_areas {
            for machine in &area.machines {
                let tally = self.tally(engineer_id, |c| c.area.id == area.id && c.machine.id == machine.id);
                rollups.push(MachineRollup {
                    area_id: area.id.clone(),
                    machine_id: machine.id.clone(),
                    machine_name: machine.name.clone(),
                    importance: machine.importance,
                    raw: tally.raw,
                    max_raw: tally.max_raw,
                    percent: tally.raw_percent(),
                });
            }
        }
        rollups
    }

    /// 雷达图：每个区域一个点，满分 100
    pub fn radar_by_area(&self, engineer_id: &str, weighted: bool) -> Vec<RadarPoint> {
        self.area_rollups(engineer_id)
            .into_iter()
            .map(|rollup| RadarPoint {
                area: rollup.area_name,
                percent: if weighted {
                    rollup.weighted_percent
                } else {
                    rollup.raw_percent
                },
                full_mark: RADAR_FULL_MARK,
            })
            .collect()
    }

    // ==========================================
    // 热力图
    // ==========================================

    /// 单个热力图单元；能力项不存在时返回 None
    pub fn heatmap_cell(
        &self,
        engineer_id: &str,
        area_id: &str,
        machine_id: &str,
        competency_id: &str,
    ) -> Option<HeatmapCell> {
        let cell = self
            .catalog
            .competency_cells()
            .find(|c| c.area.id == area_id && c.machine.id == machine_id && c.competency.id == competency_id)?;
        Some(self.build_heatmap_cell(engineer_id, &cell))
    }

    fn build_heatmap_cell(&self, engineer_id: &str, cell: &CompetencyCell<'_>) -> HeatmapCell {
        let score = self.cell_score(engineer_id, cell);
        let max_score = cell.competency.max_score;
        let percent_of_max = percent(score as f64, max_score as f64);
        HeatmapCell {
            area_id: cell.area.id.clone(),
            machine_id: cell.machine.id.clone(),
            competency_id: cell.competency.id.clone(),
            competency_name: cell.competency.name.clone(),
            score,
            max_score,
            percent_of_max,
            band: HeatmapBand::from_percent(percent_of_max),
        }
    }

    /// 完整热力图（可按区域过滤）
    pub fn heatmap(&self, area_filter: Option<&str>) -> Vec<HeatmapRow> {
        self.catalog
            .engineers
            .iter()
            .map(|engineer| HeatmapRow {
                engineer_id: engineer.id.clone(),
                engineer_name: engineer.name.clone(),
                shift: engineer.shift,
                cells: self
                    .catalog
                    .competency_cells()
                    .filter(|c| area_filter.map_or(true, |a| c.area.id == a))
                    .map(|c| self.build_heatmap_cell(&engineer.id, &c))
                    .collect(),
            })
            .collect()
    }

    // ==========================================
    // 团队聚合
    // ==========================================

    /// 分数分布：遍历全部 (工程师 × 能力项)，缺省记 0 分
    pub fn score_distribution(&self) -> ScoreDistribution {
        let mut distribution = ScoreDistribution::empty();
        for engineer in &self.catalog.engineers {
            for cell in self.catalog.competency_cells() {
                distribution.record(self.cell_score(&engineer.id, &cell));
            }
        }
        distribution
    }

    /// 团队整体完成度 = Σ 全部得分 / Σ 全部满分 × 100（不加权）
    pub fn team_completion(&self) -> CompletionRate {
        let mut total = Tally::default();
        for engineer in &self.catalog.engineers {
            let tally = self.tally(&engineer.id, |_| true);
            total.raw += tally.raw;
            total.max_raw += tally.max_raw;
        }
        CompletionRate {
            total_score: total.raw,
            total_max_score: total.max_raw,
            percent: total.raw_percent(),
        }
    }

    /// 全员得分
    pub fn score_all(&self) -> Vec<(&'a Engineer, EngineerScore)> {
        self.catalog
            .engineers
            .iter()
            .map(|e| (e, self.score_engineer(&e.id)))
            .collect()
    }

    /// 按完成度降序排名（并列保持目录顺序）
    pub fn rank_engineers(&self, weighted: bool) -> Vec<(&'a Engineer, EngineerScore)> {
        let mut ranked = self.score_all();
        ranked.sort_by(|a, b| b.1.percent(weighted).total_cmp(&a.1.percent(weighted)));
        ranked
    }
}

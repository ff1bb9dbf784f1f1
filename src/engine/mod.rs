// ==========================================
// 工程师能力矩阵系统 - 引擎层
// ==========================================
// 职责: 由实体目录 + 台账 + 快照推导指标
// 红线: Engine 不拼 SQL，只读借用领域对象，不持有状态
// ==========================================

pub mod analytics;
pub mod core_skills;
pub mod scoring;
pub mod trend;

// 重导出核心引擎
pub use analytics::{AnalyticsEngine, Insight, ShiftSummary, SkillGapRow, TrainingItem};
pub use core_skills::{CoreCategoryRollup, CoreSkillScore, CoreSkillScoring};
pub use scoring::{
    AreaRollup, CompletionRate, EngineerScore, HeatmapCell, HeatmapRow, MachineRollup, RadarPoint,
    ScoreDistribution, ScoringEngine,
};
pub use trend::{
    completion_history, completion_rate_of, predict_from_snapshots, predict_trend,
    CompletionPoint, TrendPrediction, TREND_WINDOW,
};

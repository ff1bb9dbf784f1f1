// ==========================================
// 工程师能力矩阵系统 - 领域模型层
// ==========================================
// 职责: 定义实体、评分台账、快照与领域类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod assessment;
pub mod entity;
pub mod snapshot;
pub mod types;

// 重导出核心类型
pub use assessment::{
    AssessmentEntry, AssessmentKey, AssessmentLedger, BulkScoreOutcome, CoreSkillKey,
    CoreSkillLedger, HistoryPolicy, Ledger, LedgerError, LedgerKey, RejectedWrite, ScoreChange,
    validate_score,
};
pub use entity::{
    CatalogError, Competency, CompetencyCell, CoreSkill, CoreSkillCategory, Engineer,
    EntityCatalog, Machine, ProductionArea, User,
};
pub use snapshot::{Snapshot, SnapshotData, DEFAULT_SNAPSHOT_RETENTION};
pub use types::{
    GapPriority, HeatmapBand, InsightKind, Shift, TrainingPriority, TrendDirection, UserRole,
    COMPETENT_THRESHOLD, DEFAULT_MAX_SCORE,
};

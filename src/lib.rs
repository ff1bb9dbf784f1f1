// ==========================================
// 工程师能力矩阵系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 能力评分与分析（评分台账、快照趋势、培训建议）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体、台账、快照与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 评分与分析
pub mod engine;

// 导入层 - 数据包校验与导入/导出
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    GapPriority, HeatmapBand, InsightKind, Shift, TrainingPriority, TrendDirection, UserRole,
};

// 领域实体
pub use domain::{
    AssessmentEntry, AssessmentKey, AssessmentLedger, CoreSkillKey, CoreSkillLedger, EntityCatalog,
    HistoryPolicy, Snapshot,
};

// 引擎
pub use engine::{AnalyticsEngine, CoreSkillScoring, ScoringEngine};

// API
pub use api::{AssessmentApi, DashboardApi, EntityApi, SnapshotApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "工程师能力矩阵系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

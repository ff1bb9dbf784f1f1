// ==========================================
// 工程师能力矩阵系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 UI / HTTP 协作方调用
// ==========================================

pub mod assessment_api;
pub mod config_api;
pub mod dashboard_api;
pub mod entity_api;
pub mod error;
pub mod import_api;
pub mod snapshot_api;

// 重导出核心类型
pub use assessment_api::AssessmentApi;
pub use config_api::{ConfigApi, SystemSettings};
pub use dashboard_api::{DashboardApi, EngineerReport, RankedEngineer, TeamDashboard};
pub use entity_api::EntityApi;
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportSummary};
pub use snapshot_api::SnapshotApi;

// ==========================================
// 工程师能力矩阵系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{AssessmentApi, ConfigApi, DashboardApi, EntityApi, ImportApi, SnapshotApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::repository::{AssessmentRepository, EntityRepository, SnapshotRepository};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "COMPETENCY_MATRIX_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源；所有仓储共用一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 实体管理API
    pub entity_api: Arc<EntityApi>,

    /// 评分API
    pub assessment_api: Arc<AssessmentApi>,

    /// 快照API
    pub snapshot_api: Arc<SnapshotApi>,

    /// 驾驶舱API
    pub dashboard_api: Arc<DashboardApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,

    /// 数据包导入/导出API
    pub import_api: Arc<ImportApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时自动创建并建表）
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let entity_repo = Arc::new(EntityRepository::new(conn.clone()));
        let assessment_repo = Arc::new(AssessmentRepository::new(conn.clone()));
        let snapshot_repo = Arc::new(SnapshotRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let entity_api = Arc::new(EntityApi::new(entity_repo.clone()));
        let assessment_api = Arc::new(AssessmentApi::new(
            entity_repo.clone(),
            assessment_repo.clone(),
            config_manager.clone(),
        ));
        let snapshot_api = Arc::new(SnapshotApi::new(
            entity_repo.clone(),
            assessment_repo.clone(),
            snapshot_repo.clone(),
            config_manager.clone(),
        ));
        let dashboard_api = Arc::new(DashboardApi::new(
            entity_repo.clone(),
            assessment_repo.clone(),
            snapshot_repo,
            config_manager.clone(),
        ));
        let config_api = Arc::new(ConfigApi::new(config_manager.clone()));
        let import_api = Arc::new(ImportApi::new(entity_repo, assessment_repo, config_manager));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            entity_api,
            assessment_api,
            snapshot_api,
            dashboard_api,
            config_api,
            import_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先使用 COMPETENCY_MATRIX_DB_PATH；否则放在用户数据目录下
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./competency_matrix.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("competency-matrix");
        match std::fs::create_dir_all(&dir) {
            Ok(()) => path = dir.join("competency_matrix.db"),
            Err(e) => tracing::warn!("无法创建数据目录 {}: {}，使用当前目录", dir.display(), e),
        }
    }

    path.to_string_lossy().to_string()
}

// ==========================================
// 工程师能力矩阵系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::entity::CatalogError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 解析错误 =====
    #[error("数据包 JSON 解析失败: {0}")]
    JsonParseError(String),

    // ===== 数据质量错误 =====
    #[error("数据包校验未通过: {errors} 个错误, {warnings} 个警告")]
    ValidationFailed { errors: usize, warnings: usize },

    #[error("实体目录构建失败: {0}")]
    CatalogError(#[from] CatalogError),

    // ===== 数据库错误 =====
    #[error("数据库错误: {0}")]
    RepositoryError(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::JsonParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

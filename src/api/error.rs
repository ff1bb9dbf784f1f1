// ==========================================
// 工程师能力矩阵系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把领域/仓储错误转换为用户可读的错误消息
// ==========================================

use crate::domain::assessment::LedgerError;
use crate::domain::entity::CatalogError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("数据包导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseTransactionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从领域错误转换
// ==========================================
impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::MalformedKey(_) => ApiError::InvalidInput(err.to_string()),
            LedgerError::ScoreOutOfRange { .. } | LedgerError::UnknownReference(_) => {
                ApiError::ValidationError(err.to_string())
            }
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            CatalogError::DuplicateId { .. } => ApiError::BusinessRuleViolation(err.to_string()),
            CatalogError::InvalidImportance(_)
            | CatalogError::InvalidMaxScore(_)
            | CatalogError::EmptyField(_)
            | CatalogError::InvalidId { .. } => ApiError::InvalidInput(err.to_string()),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::RepositoryError(e) => e.into(),
            ImportError::ValidationFailed { .. } => ApiError::ValidationError(err.to_string()),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_errors_map_to_validation() {
        let err: ApiError = LedgerError::ScoreOutOfRange {
            key: "E1|PA1|M1|C1".to_string(),
            score: 4,
            max_score: 3,
        }
        .into();
        assert!(matches!(err, ApiError::ValidationError(_)));

        let err: ApiError = LedgerError::MalformedKey("x".to_string()).into();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_repository_not_found_keeps_context() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "Snapshot".to_string(),
            id: "S1".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "资源未找到: Snapshot(id=S1)不存在");
    }
}

// ==========================================
// 工程师能力矩阵系统 - 导入层
// ==========================================
// 职责: 数据包 (JSON) 语义校验、导入与导出
// 文件格式解析 (Excel 等) 由外部协作方负责
// ==========================================

pub mod bundle;
pub mod error;

// 重导出核心类型
pub use bundle::{
    export_bundle, parse_bundle, validate_bundle, BundleReport, BundleViolation, DataBundle,
    ImportedData, ViolationLevel,
};
pub use error::{ImportError, ImportResult};

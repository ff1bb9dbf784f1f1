// ==========================================
// 工程师能力矩阵系统 - 配置管理 API
// ==========================================
// 职责: 配置查询、更新、快照/恢复
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ConfigManager};

/// 当前生效的系统设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSettings {
    /// 每键历史保留条数；None 表示不限
    pub history_cap: Option<usize>,
    pub snapshot_retention: usize,
}

pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    pub fn get_settings(&self) -> ApiResult<SystemSettings> {
        Ok(SystemSettings {
            history_cap: self.config_manager.history_policy()?.max_entries_per_key,
            snapshot_retention: self.config_manager.snapshot_retention()?,
        })
    }

    /// 设置每键历史保留条数（None 或 0 表示不限）
    ///
    /// 新上限在下一次写入该键时生效。
    pub fn set_history_cap(&self, cap: Option<usize>) -> ApiResult<()> {
        let value = cap.unwrap_or(0).to_string();
        self.config_manager
            .set_global_config_value(config_keys::HISTORY_CAP, &value)?;
        Ok(())
    }

    /// 设置快照保留数量（至少 1）
    ///
    /// 新数量在下一次拍摄快照时生效。
    pub fn set_snapshot_retention(&self, retention: usize) -> ApiResult<()> {
        if retention == 0 {
            return Err(ApiError::InvalidInput("快照保留数量必须 >= 1".to_string()));
        }
        self.config_manager
            .set_global_config_value(config_keys::SNAPSHOT_RETENTION, &retention.to_string())?;
        Ok(())
    }

    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        Ok(self.config_manager.get_config_snapshot()?)
    }

    pub fn restore_from_snapshot(&self, snapshot_json: &str) -> ApiResult<usize> {
        let restored = self.config_manager.restore_config_from_snapshot(snapshot_json)?;
        tracing::info!(restored, "配置已从快照恢复");
        Ok(restored)
    }
}

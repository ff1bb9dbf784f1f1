// ==========================================
// 工程师能力矩阵系统 - 快照 API
// ==========================================
// 职责: 显式拍摄快照、按保留策略清理、历史完成度与趋势
// 红线: 快照只能由显式操作创建，创建后不可修改
// ==========================================

use std::sync::Arc;

use chrono::Utc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::snapshot::Snapshot;
use crate::engine::trend::{completion_history, predict_from_snapshots, CompletionPoint, TrendPrediction};
use crate::repository::{AssessmentRepository, EntityRepository, SnapshotHeader, SnapshotRepository};

pub struct SnapshotApi {
    entity_repo: Arc<EntityRepository>,
    assessment_repo: Arc<AssessmentRepository>,
    snapshot_repo: Arc<SnapshotRepository>,
    config: Arc<ConfigManager>,
}

impl SnapshotApi {
    pub fn new(
        entity_repo: Arc<EntityRepository>,
        assessment_repo: Arc<AssessmentRepository>,
        snapshot_repo: Arc<SnapshotRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            entity_repo,
            assessment_repo,
            snapshot_repo,
            config,
        }
    }

    /// 拍摄快照（当前实体 + 机台能力项台账的深拷贝）
    ///
    /// 写入后按 snapshot.retention 清理最旧的快照。
    pub fn take_snapshot(&self, description: &str) -> ApiResult<SnapshotHeader> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ApiError::InvalidInput("快照描述不能为空".to_string()));
        }

        let policy = self.config.history_policy()?;
        let catalog = self.entity_repo.load_catalog()?;
        let ledger = self.assessment_repo.load_ledger(policy)?;
        let snapshot = Snapshot::capture(description, &catalog, &ledger, Utc::now().naive_utc());

        self.snapshot_repo.insert(&snapshot)?;
        let retention = self.config.snapshot_retention()?;
        let pruned = self.snapshot_repo.prune(retention)?;

        tracing::info!(
            snapshot_id = %snapshot.id,
            description,
            assessments = snapshot.data.assessments.len(),
            pruned,
            "快照已创建"
        );
        Ok(SnapshotHeader {
            id: snapshot.id,
            timestamp: snapshot.timestamp,
            description: snapshot.description,
        })
    }

    /// 快照列表（旧 → 新）
    pub fn list_snapshots(&self) -> ApiResult<Vec<SnapshotHeader>> {
        Ok(self.snapshot_repo.list_headers()?)
    }

    pub fn get_snapshot(&self, snapshot_id: &str) -> ApiResult<Snapshot> {
        self.snapshot_repo
            .find_by_id(snapshot_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Snapshot(id={})不存在", snapshot_id)))
    }

    pub fn delete_snapshot(&self, snapshot_id: &str) -> ApiResult<()> {
        self.snapshot_repo.delete(snapshot_id)?;
        tracing::info!(snapshot_id, "快照已删除");
        Ok(())
    }

    /// 各快照的团队完成度（旧 → 新）
    pub fn completion_history(&self) -> ApiResult<Vec<CompletionPoint>> {
        let snapshots = self.snapshot_repo.list()?;
        Ok(completion_history(&snapshots))
    }

    /// 基于最近快照的趋势预测；快照少于 2 个时为 None
    pub fn predict_trend(&self) -> ApiResult<Option<TrendPrediction>> {
        let snapshots = self.snapshot_repo.list()?;
        let prediction = predict_from_snapshots(&snapshots);
        tracing::debug!(snapshots = snapshots.len(), has_prediction = prediction.is_some(), "趋势预测");
        Ok(prediction)
    }
}

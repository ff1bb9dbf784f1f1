// ==========================================
// 工程师能力矩阵系统 - 评分 API
// ==========================================
// 职责: 评分写入/查询，校验在落库之前完成
// 红线:
// - 越界/格式错误/引用不存在的写入不落库
// - 批量写入逐键独立，不做跨键事务
// ==========================================

use std::sync::Arc;

use chrono::Utc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::assessment::{
    validate_score, AssessmentEntry, AssessmentKey, AssessmentLedger, BulkScoreOutcome, CoreSkillKey,
    CoreSkillLedger, LedgerKey, RejectedWrite, ScoreChange,
};
use crate::domain::entity::EntityCatalog;
use crate::repository::{AssessmentRepository, EntityRepository};

// ==========================================
// AssessmentApi - 评分 API
// ==========================================
pub struct AssessmentApi {
    entity_repo: Arc<EntityRepository>,
    assessment_repo: Arc<AssessmentRepository>,
    config: Arc<ConfigManager>,
}

impl AssessmentApi {
    pub fn new(
        entity_repo: Arc<EntityRepository>,
        assessment_repo: Arc<AssessmentRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            entity_repo,
            assessment_repo,
            config,
        }
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 写入机台能力项评分
    ///
    /// # 参数
    /// - key: "engineerId|areaId|machineId|competencyId"
    /// - value: 分数（允许 0 ~ maxScore）
    /// - actor: 评估人
    pub fn set_score(&self, key: &str, value: i32, actor: &str) -> ApiResult<ScoreChange> {
        let key: AssessmentKey = parse_key(key)?;
        let catalog = self.entity_repo.load_catalog()?;
        self.write_score(&catalog, &key, value, actor)
    }

    /// 写入核心技能评分
    ///
    /// # 参数
    /// - key: "engineerId|categoryId|skillId"
    pub fn set_core_skill_score(&self, key: &str, value: i32, actor: &str) -> ApiResult<ScoreChange> {
        let key: CoreSkillKey = parse_key(key)?;
        let catalog = self.entity_repo.load_catalog()?;
        self.write_score(&catalog, &key, value, actor)
    }

    /// 批量写入同一分数
    ///
    /// 逐键校验、逐键落库；单键失败记入 rejected，不影响其余键。
    pub fn bulk_set_score(&self, keys: &[String], value: i32, actor: &str) -> ApiResult<BulkScoreOutcome> {
        let catalog = self.entity_repo.load_catalog()?;
        let mut outcome = BulkScoreOutcome::default();

        for raw in keys {
            let result = parse_key::<AssessmentKey>(raw)
                .and_then(|key| self.write_score(&catalog, &key, value, actor));
            match result {
                Ok(_) => outcome.applied += 1,
                Err(e) => outcome.rejected.push(RejectedWrite {
                    key: raw.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        tracing::info!(
            applied = outcome.applied,
            rejected = outcome.rejected.len(),
            actor,
            "批量评分写入完成"
        );
        Ok(outcome)
    }

    fn write_score<K: LedgerKey>(
        &self,
        catalog: &EntityCatalog,
        key: &K,
        value: i32,
        actor: &str,
    ) -> ApiResult<ScoreChange> {
        if actor.trim().is_empty() {
            return Err(ApiError::InvalidInput("评估人不能为空".to_string()));
        }
        if let Err(e) = validate_score(catalog, key, value) {
            tracing::warn!(ledger = K::LEDGER, key = %key, value, error = %e, "评分写入被拒绝");
            return Err(e.into());
        }

        let policy = self.config.history_policy()?;
        let (_, change) = self.assessment_repo.record_score(
            key,
            value as u32,
            actor,
            Utc::now().naive_utc(),
            &policy,
        )?;

        tracing::info!(
            ledger = K::LEDGER,
            key = %key,
            old_score = change.old_score,
            new_score = change.new_score,
            actor,
            "评分已写入"
        );
        Ok(change)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 读取机台能力项分数；未评分为 0
    pub fn get_score(&self, key: &str) -> ApiResult<u32> {
        let key: AssessmentKey = parse_key(key)?;
        Ok(self
            .assessment_repo
            .find_entry(&key)?
            .map(|entry| entry.score)
            .unwrap_or(0))
    }

    /// 读取核心技能分数；未评分为 0
    pub fn get_core_skill_score(&self, key: &str) -> ApiResult<u32> {
        let key: CoreSkillKey = parse_key(key)?;
        Ok(self
            .assessment_repo
            .find_entry(&key)?
            .map(|entry| entry.score)
            .unwrap_or(0))
    }

    pub fn get_entry(&self, key: &str) -> ApiResult<Option<AssessmentEntry>> {
        let key: AssessmentKey = parse_key(key)?;
        Ok(self.assessment_repo.find_entry(&key)?)
    }

    /// 单键评分历史（旧 → 新）
    pub fn get_history(&self, key: &str) -> ApiResult<Vec<ScoreChange>> {
        let key: AssessmentKey = parse_key(key)?;
        Ok(self.assessment_repo.history(&key)?)
    }

    pub fn load_ledger(&self) -> ApiResult<AssessmentLedger> {
        let policy = self.config.history_policy()?;
        Ok(self.assessment_repo.load_ledger(policy)?)
    }

    pub fn load_core_skill_ledger(&self) -> ApiResult<CoreSkillLedger> {
        let policy = self.config.history_policy()?;
        Ok(self.assessment_repo.load_ledger(policy)?)
    }

    // ==========================================
    // 维护
    // ==========================================

    /// 清理引用已删除实体的孤儿评分，返回清理条数
    pub fn purge_orphans(&self) -> ApiResult<usize> {
        let catalog = self.entity_repo.load_catalog()?;

        let machine_orphans = self.load_ledger()?.orphan_keys(&catalog);
        let core_orphans = self.load_core_skill_ledger()?.orphan_keys(&catalog);

        let removed = self.assessment_repo.delete_entries(&machine_orphans)?
            + self.assessment_repo.delete_entries(&core_orphans)?;
        if removed > 0 {
            tracing::info!(removed, "孤儿评分已清理");
        }
        Ok(removed)
    }
}

fn parse_key<K: LedgerKey>(raw: &str) -> ApiResult<K> {
    raw.parse::<K>().map_err(ApiError::from)
}

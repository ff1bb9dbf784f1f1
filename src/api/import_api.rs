// ==========================================
// 工程师能力矩阵系统 - 数据包导入/导出 API
// ==========================================
// 职责: 数据包校验、整体替换导入、导出
// 流程: 解析 JSON → 语义校验 → 构建目录与台账 → 落库
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::config::ConfigManager;
use crate::domain::assessment::{AssessmentKey, CoreSkillKey, Ledger};
use crate::importer::{export_bundle, parse_bundle, validate_bundle, BundleReport};
use crate::repository::{AssessmentRepository, EntityRepository};

/// 导入结果摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub areas: usize,
    pub engineers: usize,
    pub core_skill_categories: usize,
    pub assessments: usize,
    pub core_skill_assessments: usize,
    /// 因引用不存在而丢弃的评分条数
    pub dropped: usize,
}

pub struct ImportApi {
    entity_repo: Arc<EntityRepository>,
    assessment_repo: Arc<AssessmentRepository>,
    config: Arc<ConfigManager>,
}

impl ImportApi {
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

    /// 只校验，不落库
    pub fn validate(&self, json: &str) -> ApiResult<BundleReport> {
        let bundle = parse_bundle(json)?;
        Ok(validate_bundle(&bundle))
    }

    /// 导入数据包，整体替换实体目录与两本台账
    ///
    /// 存在 Error 级问题时拒绝导入，数据库保持不变。
    pub fn import(&self, json: &str) -> ApiResult<ImportSummary> {
        let bundle = parse_bundle(json)?;
        let policy = self.config.history_policy()?;
        let mut imported = bundle.into_parts(policy)?;

        // 数据包不含用户，沿用现有用户
        imported.catalog.users = self.entity_repo.load_catalog()?.users;

        self.entity_repo.save_catalog(&imported.catalog)?;
        let assessments = self.assessment_repo.save_ledger(&imported.ledger)?;
        let core_skill_assessments = self.assessment_repo.save_ledger(&imported.core_ledger)?;

        let summary = ImportSummary {
            areas: imported.catalog.production_areas.len(),
            engineers: imported.catalog.engineers.len(),
            core_skill_categories: imported.catalog.core_skill_categories.len(),
            assessments,
            core_skill_assessments,
            dropped: imported.dropped,
        };
        tracing::info!(?summary, "数据包导入完成");
        Ok(summary)
    }

    /// 导出当前数据为 JSON 数据包
    pub fn export(&self) -> ApiResult<String> {
        let policy = self.config.history_policy()?;
        let catalog = self.entity_repo.load_catalog()?;
        let ledger: Ledger<AssessmentKey> = self.assessment_repo.load_ledger(policy)?;
        let core_ledger: Ledger<CoreSkillKey> = self.assessment_repo.load_ledger(policy)?;

        let bundle = export_bundle(&catalog, &ledger, &core_ledger);
        tracing::debug!(
            areas = bundle.production_areas.len(),
            assessments = bundle.assessments.len(),
            "导出数据包"
        );
        Ok(bundle.to_json_pretty()?)
    }
}

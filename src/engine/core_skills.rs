// ==========================================
// 工程师能力矩阵系统 - 核心技能评分
// ==========================================
// 与机台无关的两级体系: 分类 → 技能
// 核心技能不加权
// ==========================================

use crate::domain::assessment::{CoreSkillKey, CoreSkillLedger};
use crate::domain::entity::EntityCatalog;
use crate::domain::types::COMPETENT_THRESHOLD;
use crate::engine::scoring::percent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreSkillScore {
    pub engineer_id: String,
    pub raw: u64,
    pub max_raw: u64,
    pub percent: f64,
    /// score < 2 的核心技能数
    pub below_competent: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreCategoryRollup {
    pub category_id: String,
    pub category_name: String,
    pub raw: u64,
    pub max_raw: u64,
    pub percent: f64,
}

pub struct CoreSkillScoring<'a> {
    catalog: &'a EntityCatalog,
    ledger: &'a CoreSkillLedger,
}

impl<'a> CoreSkillScoring<'a> {
    pub fn new(catalog: &'a EntityCatalog, ledger: &'a CoreSkillLedger) -> Self {
        Self { catalog, ledger }
    }

    fn skill_score(&self, engineer_id: &str, category_id: &str, skill_id: &str) -> u32 {
        self.ledger
            .get_score(&CoreSkillKey::new(engineer_id, category_id, skill_id))
    }

    /// 工程师核心技能总分
    pub fn score_engineer(&self, engineer_id: &str) -> CoreSkillScore {
        let mut raw = 0u64;
        let mut max_raw = 0u64;
        let mut below_competent = 0usize;
        for category in &self.catalog.core_skill_categories {
            for skill in &category.skills {
                let score = self.skill_score(engineer_id, &category.id, &skill.id);
                raw += score as u64;
                max_raw += skill.max_score as u64;
                if score < COMPETENT_THRESHOLD {
                    below_competent += 1;
                }
            }
        }
        CoreSkillScore {
            engineer_id: engineer_id.to_string(),
            raw,
            max_raw,
            percent: percent(raw as f64, max_raw as f64),
            below_competent,
        }
    }

    /// 按分类汇总
    pub fn category_rollups(&self, engineer_id: &str) -> Vec<CoreCategoryRollup> {
        self.catalog
            .core_skill_categories
            .iter()
            .map(|category| {
                let (raw, max_raw) = category.skills.iter().fold((0u64, 0u64), |(raw, max), skill| {
                    (
                        raw + self.skill_score(engineer_id, &category.id, &skill.id) as u64,
                        max + skill.max_score as u64,
                    )
                });
                CoreCategoryRollup {
                    category_id: category.id.clone(),
                    category_name: category.name.clone(),
                    raw,
                    max_raw,
                    percent: percent(raw as f64, max_raw as f64),
                }
            })
            .collect()
    }
}

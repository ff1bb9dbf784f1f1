// ==========================================
// 工程师能力矩阵系统 - 数据包导入/导出
// ==========================================
// 格式: camelCase JSON
// {productionAreas, engineers, coreSkillCategories,
//  assessments, coreSkillAssessments}
// ==========================================
// 职责: 语义校验 + 构建实体目录与台账
// 文件读写由调用方负责
// ==========================================

use crate::domain::assessment::{
    AssessmentEntry, AssessmentKey, AssessmentLedger, CoreSkillKey, CoreSkillLedger, HistoryPolicy,
    Ledger, LedgerKey, KEY_SEPARATOR,
};
use crate::domain::entity::{
    CoreSkillCategory, Engineer, EntityCatalog, ProductionArea, MAX_IMPORTANCE, MIN_IMPORTANCE,
};
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ==========================================
// DataBundle - 数据包
// ==========================================
/// 评分以原始字符串键保存，以便把格式错误的键报告出来而不是整体解析失败
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataBundle {
    #[serde(default)]
    pub production_areas: Vec<ProductionArea>,
    #[serde(default)]
    pub engineers: Vec<Engineer>,
    #[serde(default)]
    pub core_skill_categories: Vec<CoreSkillCategory>,
    #[serde(default)]
    pub assessments: BTreeMap<String, AssessmentEntry>,
    #[serde(default)]
    pub core_skill_assessments: BTreeMap<String, AssessmentEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationLevel {
    /// 阻断导入
    Error,
    /// 导入时丢弃对应记录
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleViolation {
    pub level: ViolationLevel,
    pub location: String,
    pub message: String,
}

/// 数据包校验报告
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleReport {
    pub area_count: usize,
    pub engineer_count: usize,
    pub competency_count: usize,
    pub assessment_count: usize,
    pub core_skill_assessment_count: usize,
    pub violations: Vec<BundleViolation>,
}

impl BundleReport {
    pub fn error_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.level == ViolationLevel::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.violations.len() - self.error_count()
    }

    pub fn is_importable(&self) -> bool {
        self.error_count() == 0
    }

    fn error(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.violations.push(BundleViolation {
            level: ViolationLevel::Error,
            location: location.into(),
            message: message.into(),
        });
    }

    fn warning(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.violations.push(BundleViolation {
            level: ViolationLevel::Warning,
            location: location.into(),
            message: message.into(),
        });
    }
}

/// 导入结果
#[derive(Debug, Clone)]
pub struct ImportedData {
    pub catalog: EntityCatalog,
    pub ledger: AssessmentLedger,
    pub core_ledger: CoreSkillLedger,
    /// 因引用不存在而丢弃的评分条数
    pub dropped: usize,
}

// ==========================================
// 解析 / 导出
// ==========================================

pub fn parse_bundle(json: &str) -> ImportResult<DataBundle> {
    Ok(serde_json::from_str(json)?)
}

/// 导出当前实体目录与两本台账
pub fn export_bundle(
    catalog: &EntityCatalog,
    ledger: &AssessmentLedger,
    core_ledger: &CoreSkillLedger,
) -> DataBundle {
    DataBundle {
        production_areas: catalog.production_areas.clone(),
        engineers: catalog.engineers.clone(),
        core_skill_categories: catalog.core_skill_categories.clone(),
        assessments: stringify_entries(ledger),
        core_skill_assessments: stringify_entries(core_ledger),
    }
}

impl DataBundle {
    pub fn to_json_pretty(&self) -> ImportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 未经校验的实体目录视图，仅用于引用解析
    fn lookup_catalog(&self) -> EntityCatalog {
        EntityCatalog {
            production_areas: self.production_areas.clone(),
            engineers: self.engineers.clone(),
            core_skill_categories: self.core_skill_categories.clone(),
            users: Vec::new(),
        }
    }

    /// 校验通过后构建实体目录与台账；存在 Error 级问题时拒绝
    pub fn into_parts(self, policy: HistoryPolicy) -> ImportResult<ImportedData> {
        let report = validate_bundle(&self);
        if !report.is_importable() {
            return Err(ImportError::ValidationFailed {
                errors: report.error_count(),
                warnings: report.warning_count(),
            });
        }

        let mut catalog = EntityCatalog::new();
        for area in self.production_areas {
            catalog.add_area(area)?;
        }
        for engineer in self.engineers {
            catalog.add_engineer(engineer)?;
        }
        for category in self.core_skill_categories {
            catalog.add_core_category(category)?;
        }

        let (ledger, dropped_machine) = build_ledger::<AssessmentKey>(&catalog, self.assessments, policy);
        let (core_ledger, dropped_core) =
            build_ledger::<CoreSkillKey>(&catalog, self.core_skill_assessments, policy);

        Ok(ImportedData {
            catalog,
            ledger,
            core_ledger,
            dropped: dropped_machine + dropped_core,
        })
    }
}

fn stringify_entries<K: LedgerKey>(ledger: &Ledger<K>) -> BTreeMap<String, AssessmentEntry> {
    ledger
        .entries()
        .iter()
        .map(|(key, entry)| (key.to_string(), entry.clone()))
        .collect()
}

fn build_ledger<K: LedgerKey>(
    catalog: &EntityCatalog,
    raw: BTreeMap<String, AssessmentEntry>,
    policy: HistoryPolicy,
) -> (Ledger<K>, usize) {
    let mut ledger = Ledger::new(policy);
    let mut dropped = 0;
    for (raw_key, entry) in raw {
        match raw_key.parse::<K>() {
            Ok(key) if key.max_score_in(catalog).is_some() => ledger.insert_entry(key, entry),
            _ => dropped += 1,
        }
    }
    (ledger, dropped)
}

// ==========================================
// 语义校验
// ==========================================

/// 校验数据包，返回全部问题（不在第一处失败）
///
/// Error: 重复 ID、重要度越界、满分 < 1、空 ID、复合键格式错误、分数越界
/// Warning: 评分引用的实体不存在（导入时丢弃）
pub fn validate_bundle(bundle: &DataBundle) -> BundleReport {
    let mut report = BundleReport {
        area_count: bundle.production_areas.len(),
        engineer_count: bundle.engineers.len(),
        assessment_count: bundle.assessments.len(),
        core_skill_assessment_count: bundle.core_skill_assessments.len(),
        ..BundleReport::default()
    };

    validate_areas(bundle, &mut report);
    validate_engineers(bundle, &mut report);
    validate_core_categories(bundle, &mut report);

    let catalog = bundle.lookup_catalog();
    report.competency_count = catalog.competency_count();
    validate_entries::<AssessmentKey>(&catalog, "assessments", &bundle.assessments, &mut report);
    validate_entries::<CoreSkillKey>(
        &catalog,
        "coreSkillAssessments",
        &bundle.core_skill_assessments,
        &mut report,
    );

    report
}

fn check_id(report: &mut BundleReport, seen: &mut HashSet<String>, location: &str, id: &str) {
    if id.trim().is_empty() {
        report.error(location, "ID 为空");
    } else if id.contains(KEY_SEPARATOR) {
        report.error(location, format!("ID 不能包含分隔符 '{}': {}", KEY_SEPARATOR, id));
    } else if !seen.insert(id.to_string()) {
        report.error(location, format!("ID 重复: {}", id));
    }
}

fn validate_areas(bundle: &DataBundle, report: &mut BundleReport) {
    let mut area_ids = HashSet::new();
    for area in &bundle.production_areas {
        let area_loc = format!("productionAreas[{}]", area.id);
        check_id(report, &mut area_ids, &area_loc, &area.id);

        let mut machine_ids = HashSet::new();
        for machine in &area.machines {
            let machine_loc = format!("{}.machines[{}]", area_loc, machine.id);
            check_id(report, &mut machine_ids, &machine_loc, &machine.id);
            if !(MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(&machine.importance) {
                report.error(
                    &machine_loc,
                    format!(
                        "importance={} 超出范围 {}~{}",
                        machine.importance, MIN_IMPORTANCE, MAX_IMPORTANCE
                    ),
                );
            }

            let mut competency_ids = HashSet::new();
            for competency in &machine.competencies {
                let competency_loc = format!("{}.competencies[{}]", machine_loc, competency.id);
                check_id(report, &mut competency_ids, &competency_loc, &competency.id);
                if competency.max_score < 1 {
                    report.error(&competency_loc, "maxScore 必须 >= 1");
                }
            }
        }
    }
}

fn validate_engineers(bundle: &DataBundle, report: &mut BundleReport) {
    let mut seen = HashSet::new();
    for engineer in &bundle.engineers {
        check_id(report, &mut seen, &format!("engineers[{}]", engineer.id), &engineer.id);
    }
}

fn validate_core_categories(bundle: &DataBundle, report: &mut BundleReport) {
    let mut category_ids = HashSet::new();
    for category in &bundle.core_skill_categories {
        let category_loc = format!("coreSkillCategories[{}]", category.id);
        check_id(report, &mut category_ids, &category_loc, &category.id);

        let mut skill_ids = HashSet::new();
        for skill in &category.skills {
            let skill_loc = format!("{}.skills[{}]", category_loc, skill.id);
            check_id(report, &mut skill_ids, &skill_loc, &skill.id);
            if skill.max_score < 1 {
                report.error(&skill_loc, "maxScore 必须 >= 1");
            }
        }
    }
}

fn validate_entries<K: LedgerKey>(
    catalog: &EntityCatalog,
    section: &str,
    entries: &BTreeMap<String, AssessmentEntry>,
    report: &mut BundleReport,
) {
    for (raw_key, entry) in entries {
        let location = format!("{}[{}]", section, raw_key);
        let key = match raw_key.parse::<K>() {
            Ok(key) => key,
            Err(e) => {
                report.error(&location, e.to_string());
                continue;
            }
        };
        match key.max_score_in(catalog) {
            None => report.warning(&location, "引用的实体不存在，导入时丢弃"),
            Some(max_score) if entry.score > max_score => {
                report.error(&location, format!("score={} 超出范围 0~{}", entry.score, max_score));
            }
            Some(_) => {}
        }
    }
}

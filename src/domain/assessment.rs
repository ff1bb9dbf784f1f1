// ==========================================
// 工程师能力矩阵系统 - 评分台账 (Assessment Ledger)
// ==========================================
// 键: engineerId|areaId|machineId|competencyId (机台能力项)
//     engineerId|categoryId|skillId            (核心技能)
// 值: AssessmentEntry {score, last_updated, updated_by, history}
// ==========================================
// 红线:
// - 台账中不存在的键，语义分数为 0 (未培训)
// - 写入必须校验 0 <= score <= maxScore，越界写入不落地
// - 历史只追加，单次写入恰好追加一条
// - 同一键并发写入: 后写覆盖 (last write wins)，不做乐观锁
// ==========================================

use crate::domain::entity::EntityCatalog;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use thiserror::Error;

/// 复合键分隔符
pub const KEY_SEPARATOR: char = '|';

// ==========================================
// LedgerError - 台账边界错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("评分越界: key={key}, score={score}, 允许范围 0~{max_score}")]
    ScoreOutOfRange {
        key: String,
        score: i32,
        max_score: u32,
    },

    #[error("复合键格式错误: {0}")]
    MalformedKey(String),

    #[error("评分键引用的实体不存在: {0}")]
    UnknownReference(String),
}

// ==========================================
// LedgerKey - 台账键抽象
// ==========================================
/// 两套台账（机台能力项 / 核心技能）共用一套写入与校验逻辑
pub trait LedgerKey:
    Clone + Eq + Ord + Hash + fmt::Display + FromStr<Err = LedgerError>
{
    /// 持久化时区分台账的标识
    const LEDGER: &'static str;

    fn engineer_id(&self) -> &str;

    /// 在实体目录中解析该键对应的满分；引用不存在时返回 None
    fn max_score_in(&self, catalog: &EntityCatalog) -> Option<u32>;
}

fn split_key(raw: &str, expected: usize) -> Result<Vec<String>, LedgerError> {
    let parts: Vec<&str> = raw.split(KEY_SEPARATOR).collect();
    if parts.len() != expected || parts.iter().any(|p| p.trim().is_empty()) {
        return Err(LedgerError::MalformedKey(raw.to_string()));
    }
    Ok(parts.into_iter().map(|p| p.to_string()).collect())
}

// ==========================================
// AssessmentKey - 机台能力项评分键
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssessmentKey {
    pub engineer_id: String,
    pub area_id: String,
    pub machine_id: String,
    pub competency_id: String,
}

impl AssessmentKey {
    pub fn new(
        engineer_id: impl Into<String>,
        area_id: impl Into<String>,
        machine_id: impl Into<String>,
        competency_id: impl Into<String>,
    ) -> Self {
        Self {
            engineer_id: engineer_id.into(),
            area_id: area_id.into(),
            machine_id: machine_id.into(),
            competency_id: competency_id.into(),
        }
    }
}

impl fmt::Display for AssessmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.engineer_id, self.area_id, self.machine_id, self.competency_id
        )
    }
}

impl FromStr for AssessmentKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = split_key(s, 4)?.into_iter();
        // split_key 已保证恰好 4 段
        let mut next = || parts.next().unwrap_or_default();
        Ok(Self {
            engineer_id: next(),
            area_id: next(),
            machine_id: next(),
            competency_id: next(),
        })
    }
}

impl LedgerKey for AssessmentKey {
    const LEDGER: &'static str = "MACHINE";

    fn engineer_id(&self) -> &str {
        &self.engineer_id
    }

    fn max_score_in(&self, catalog: &EntityCatalog) -> Option<u32> {
        catalog.find_engineer(&self.engineer_id)?;
        catalog
            .find_competency(&self.area_id, &self.machine_id, &self.competency_id)
            .map(|c| c.max_score)
    }
}

// ==========================================
// CoreSkillKey - 核心技能评分键
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoreSkillKey {
    pub engineer_id: String,
    pub category_id: String,
    pub skill_id: String,
}

impl CoreSkillKey {
    pub fn new(
        engineer_id: impl Into<String>,
        category_id: impl Into<String>,
        skill_id: impl Into<String>,
    ) -> Self {
        Self {
            engineer_id: engineer_id.into(),
            category_id: category_id.into(),
            skill_id: skill_id.into(),
        }
    }
}

impl fmt::Display for CoreSkillKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.engineer_id, self.category_id, self.skill_id)
    }
}

impl FromStr for CoreSkillKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = split_key(s, 3)?.into_iter();
        let mut next = || parts.next().unwrap_or_default();
        Ok(Self {
            engineer_id: next(),
            category_id: next(),
            skill_id: next(),
        })
    }
}

impl LedgerKey for CoreSkillKey {
    const LEDGER: &'static str = "CORE_SKILL";

    fn engineer_id(&self) -> &str {
        &self.engineer_id
    }

    fn max_score_in(&self, catalog: &EntityCatalog) -> Option<u32> {
        catalog.find_engineer(&self.engineer_id)?;
        catalog
            .find_core_skill(&self.category_id, &self.skill_id)
            .map(|s| s.max_score)
    }
}

// 复合键以字符串形式序列化，台账整体表现为 JSON 对象
macro_rules! impl_string_serde {
    ($key:ty) => {
        impl Serialize for $key {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $key {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_string_serde!(AssessmentKey);
impl_string_serde!(CoreSkillKey);

// ==========================================
// AssessmentEntry - 评分记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreChange {
    pub timestamp: NaiveDateTime,
    pub old_score: u32,
    pub new_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentEntry {
    pub score: u32,
    pub last_updated: NaiveDateTime,
    pub updated_by: String,
    #[serde(default)]
    pub history: Vec<ScoreChange>,
}

impl AssessmentEntry {
    /// 记录一次评分写入（调用方已完成范围校验）
    fn record(&mut self, new_score: u32, actor: &str, at: NaiveDateTime, policy: &HistoryPolicy) -> ScoreChange {
        let change = ScoreChange {
            timestamp: at,
            old_score: self.score,
            new_score,
        };
        self.score = new_score;
        self.last_updated = at;
        self.updated_by = actor.to_string();
        self.history.push(change.clone());
        policy.enforce(&mut self.history);
        change
    }

    fn untouched(at: NaiveDateTime) -> Self {
        Self {
            score: 0,
            last_updated: at,
            updated_by: String::new(),
            history: Vec::new(),
        }
    }

    /// 在 history 中追加一条变更并应用
    ///
    /// 供持久化层在单键读-改-写时复用，与内存台账的写入语义一致。
    pub fn apply_change(
        existing: Option<AssessmentEntry>,
        new_score: u32,
        actor: &str,
        at: NaiveDateTime,
        policy: &HistoryPolicy,
    ) -> (AssessmentEntry, ScoreChange) {
        let mut entry = existing.unwrap_or_else(|| AssessmentEntry::untouched(at));
        let change = entry.record(new_score, actor, at, policy);
        (entry, change)
    }
}

// ==========================================
// HistoryPolicy - 历史保留策略
// ==========================================
/// 每键历史保留上限；None 表示不限。超限时丢弃最旧记录，保留下来的记录不做任何改写。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPolicy {
    pub max_entries_per_key: Option<usize>,
}

impl HistoryPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn capped(max_entries_per_key: usize) -> Self {
        Self {
            max_entries_per_key: Some(max_entries_per_key.max(1)),
        }
    }

    fn enforce(&self, history: &mut Vec<ScoreChange>) {
        if let Some(cap) = self.max_entries_per_key {
            if history.len() > cap {
                let overflow = history.len() - cap;
                history.drain(..overflow);
            }
        }
    }
}

/// 写入前的范围与引用校验，返回该键满分
pub fn validate_score<K: LedgerKey>(catalog: &EntityCatalog, key: &K, value: i32) -> Result<u32, LedgerError> {
    let max_score = key
        .max_score_in(catalog)
        .ok_or_else(|| LedgerError::UnknownReference(key.to_string()))?;
    if value < 0 || value as u32 > max_score {
        return Err(LedgerError::ScoreOutOfRange {
            key: key.to_string(),
            score: value,
            max_score,
        });
    }
    Ok(max_score)
}

// ==========================================
// 批量写入结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RejectedWrite {
    pub key: String,
    pub reason: String,
}

/// 批量写入逐键独立执行，允许部分成功
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkScoreOutcome {
    pub applied: usize,
    pub rejected: Vec<RejectedWrite>,
}

impl BulkScoreOutcome {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

// ==========================================
// Ledger - 评分台账
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger<K: LedgerKey> {
    entries: BTreeMap<K, AssessmentEntry>,
    policy: HistoryPolicy,
}

pub type AssessmentLedger = Ledger<AssessmentKey>;
pub type CoreSkillLedger = Ledger<CoreSkillKey>;

impl<K: LedgerKey> Default for Ledger<K> {
    fn default() -> Self {
        Self::new(HistoryPolicy::default())
    }
}

impl<K: LedgerKey> Ledger<K> {
    pub fn new(policy: HistoryPolicy) -> Self {
        Self {
            entries: BTreeMap::new(),
            policy,
        }
    }

    /// 从已持久化的记录构建台账（不再追加历史）
    pub fn from_entries(entries: BTreeMap<K, AssessmentEntry>, policy: HistoryPolicy) -> Self {
        Self { entries, policy }
    }

    pub fn policy(&self) -> HistoryPolicy {
        self.policy
    }

    pub fn entries(&self) -> &BTreeMap<K, AssessmentEntry> {
        &self.entries
    }

    pub fn into_entries(self) -> BTreeMap<K, AssessmentEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, key: &K) -> Option<&AssessmentEntry> {
        self.entries.get(key)
    }

    /// 读取分数；不存在时为 0，永不失败
    pub fn get_score(&self, key: &K) -> u32 {
        self.entries.get(key).map(|e| e.score).unwrap_or(0)
    }

    /// 校验一次写入，返回该键满分
    pub fn validate(&self, catalog: &EntityCatalog, key: &K, value: i32) -> Result<u32, LedgerError> {
        validate_score(catalog, key, value)
    }

    /// 写入分数（时间戳取当前 UTC）
    pub fn set_score(
        &mut self,
        catalog: &EntityCatalog,
        key: K,
        value: i32,
        actor: &str,
    ) -> Result<ScoreChange, LedgerError> {
        self.set_score_at(catalog, key, value, actor, Utc::now().naive_utc())
    }

    /// 写入分数（显式时间戳）
    ///
    /// 校验失败时台账保持不变。
    pub fn set_score_at(
        &mut self,
        catalog: &EntityCatalog,
        key: K,
        value: i32,
        actor: &str,
        at: NaiveDateTime,
    ) -> Result<ScoreChange, LedgerError> {
        self.validate(catalog, &key, value)?;
        let policy = self.policy;
        let entry = self
            .entries
            .entry(key)
            .or_insert_with(|| AssessmentEntry::untouched(at));
        Ok(entry.record(value as u32, actor, at, &policy))
    }

    /// 批量写入同一分数；逐键独立校验，不做跨键事务
    pub fn bulk_set_score(
        &mut self,
        catalog: &EntityCatalog,
        keys: &[K],
        value: i32,
        actor: &str,
    ) -> BulkScoreOutcome {
        let at = Utc::now().naive_utc();
        let mut outcome = BulkScoreOutcome::default();
        for key in keys {
            match self.set_score_at(catalog, key.clone(), value, actor, at) {
                Ok(_) => outcome.applied += 1,
                Err(e) => outcome.rejected.push(RejectedWrite {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            }
        }
        outcome
    }

    /// 直接放入一条已存在的记录（用于加载/导入）
    pub fn insert_entry(&mut self, key: K, entry: AssessmentEntry) {
        self.entries.insert(key, entry);
    }

    /// 引用已删除实体的孤儿键
    pub fn orphan_keys(&self, catalog: &EntityCatalog) -> Vec<K> {
        self.entries
            .keys()
            .filter(|key| key.max_score_in(catalog).is_none())
            .cloned()
            .collect()
    }

    /// 清理引用已删除实体的孤儿记录，返回清理条数
    pub fn purge_orphans(&mut self, catalog: &EntityCatalog) -> usize {
        let orphans = self.orphan_keys(catalog);
        for key in &orphans {
            self.entries.remove(key);
        }
        orphans.len()
    }
}

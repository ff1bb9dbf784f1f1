// ==========================================
// 工程师能力矩阵系统 - 评分台账数据仓储
// ==========================================
// 表: assessment (当前值) / assessment_history (只追加)
// 两套台账共表，以 ledger 列区分 (LedgerKey::LEDGER)
// ==========================================
// 红线:
// - 单键写入在一个事务内完成: 读当前值 → 更新 → 追加一条历史
// - 同一键并发写入后写覆盖，不做乐观锁
// ==========================================

use crate::db::{format_datetime, parse_datetime};
use crate::domain::assessment::{AssessmentEntry, HistoryPolicy, Ledger, LedgerKey, ScoreChange};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ==========================================
// AssessmentRepository - 评分台账仓储
// ==========================================
pub struct AssessmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssessmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 读取
    // ==========================================

    /// 加载整本台账（含历史）
    ///
    /// 无法解析的键记 warn 后跳过，不阻断加载。
    pub fn load_ledger<K: LedgerKey>(&self, policy: HistoryPolicy) -> RepositoryResult<Ledger<K>> {
        let conn = self.get_conn()?;

        let mut entries: BTreeMap<K, AssessmentEntry> = BTreeMap::new();
        {
            let mut stmt = conn.prepare(
                "SELECT assessment_key, score, last_updated, updated_by
                 FROM assessment WHERE ledger = ?1",
            )?;
            let rows = stmt.query_map(params![K::LEDGER], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?;
            for row in rows {
                let (raw_key, score, last_updated, updated_by) = row?;
                let key = match raw_key.parse::<K>() {
                    Ok(key) => key,
                    Err(e) => {
                        tracing::warn!(ledger = K::LEDGER, key = %raw_key, error = %e, "跳过无法解析的评分键");
                        continue;
                    }
                };
                entries.insert(
                    key,
                    AssessmentEntry {
                        score,
                        last_updated: parse_datetime("assessment.last_updated", &last_updated)?,
                        updated_by,
                        history: Vec::new(),
                    },
                );
            }
        }

        let mut stmt = conn.prepare(
            "SELECT assessment_key, changed_at, old_score, new_score
             FROM assessment_history WHERE ledger = ?1 ORDER BY history_id",
        )?;
        let rows = stmt.query_map(params![K::LEDGER], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, u32>(3)?,
            ))
        })?;
        for row in rows {
            let (raw_key, changed_at, old_score, new_score) = row?;
            let Ok(key) = raw_key.parse::<K>() else {
                continue;
            };
            if let Some(entry) = entries.get_mut(&key) {
                entry.history.push(ScoreChange {
                    timestamp: parse_datetime("assessment_history.changed_at", &changed_at)?,
                    old_score,
                    new_score,
                });
            }
        }

        Ok(Ledger::from_entries(entries, policy))
    }

    /// 查询单键记录（含历史）；不存在返回 None
    pub fn find_entry<K: LedgerKey>(&self, key: &K) -> RepositoryResult<Option<AssessmentEntry>> {
        let conn = self.get_conn()?;
        let Some(mut entry) = read_current(&conn, K::LEDGER, &key.to_string())? else {
            return Ok(None);
        };
        entry.history = read_history(&conn, K::LEDGER, &key.to_string())?;
        Ok(Some(entry))
    }

    /// 单键历史（旧 → 新）
    pub fn history<K: LedgerKey>(&self, key: &K) -> RepositoryResult<Vec<ScoreChange>> {
        let conn = self.get_conn()?;
        read_history(&conn, K::LEDGER, &key.to_string())
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 记录一次评分写入（调用方已完成范围校验）
    ///
    /// 返回写入后的记录与本次变更。
    pub fn record_score<K: LedgerKey>(
        &self,
        key: &K,
        new_score: u32,
        actor: &str,
        at: NaiveDateTime,
        policy: &HistoryPolicy,
    ) -> RepositoryResult<(AssessmentEntry, ScoreChange)> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let raw_key = key.to_string();

        let existing = read_current(&tx, K::LEDGER, &raw_key)?;
        let (mut entry, change) = AssessmentEntry::apply_change(existing, new_score, actor, at, policy);

        upsert_current(&tx, K::LEDGER, key, &entry)?;
        append_history(&tx, K::LEDGER, &raw_key, &change)?;
        if let Some(cap) = policy.max_entries_per_key {
            prune_history(&tx, K::LEDGER, &raw_key, cap)?;
        }
        entry.history = read_history(&tx, K::LEDGER, &raw_key)?;

        tx.commit()?;
        Ok((entry, change))
    }

    /// 写入一条完整记录（当前值 + 历史整体替换），用于导入
    pub fn save_entry<K: LedgerKey>(&self, key: &K, entry: &AssessmentEntry) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        replace_entry(&tx, K::LEDGER, key, entry)?;
        tx.commit()?;
        Ok(())
    }

    /// 事务内整体替换某本台账
    pub fn save_ledger<K: LedgerKey>(&self, ledger: &Ledger<K>) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM assessment_history WHERE ledger = ?1", params![K::LEDGER])?;
        tx.execute("DELETE FROM assessment WHERE ledger = ?1", params![K::LEDGER])?;
        for (key, entry) in ledger.entries() {
            replace_entry(&tx, K::LEDGER, key, entry)?;
        }
        tx.commit()?;
        Ok(ledger.len())
    }

    /// 删除指定键的记录与历史，返回删除的记录数
    pub fn delete_entries<K: LedgerKey>(&self, keys: &[K]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut removed = 0;
        for key in keys {
            let raw_key = key.to_string();
            tx.execute(
                "DELETE FROM assessment_history WHERE ledger = ?1 AND assessment_key = ?2",
                params![K::LEDGER, raw_key],
            )?;
            removed += tx.execute(
                "DELETE FROM assessment WHERE ledger = ?1 AND assessment_key = ?2",
                params![K::LEDGER, raw_key],
            )?;
        }
        tx.commit()?;
        Ok(removed)
    }
}

// ==========================================
// SQL 辅助函数
// ==========================================

fn read_current(conn: &Connection, ledger: &str, raw_key: &str) -> RepositoryResult<Option<AssessmentEntry>> {
    let row = conn
        .query_row(
            "SELECT score, last_updated, updated_by FROM assessment
             WHERE ledger = ?1 AND assessment_key = ?2",
            params![ledger, raw_key],
            |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    row.map(|(score, last_updated, updated_by)| {
        Ok(AssessmentEntry {
            score,
            last_updated: parse_datetime("assessment.last_updated", &last_updated)?,
            updated_by,
            history: Vec::new(),
        })
    })
    .transpose()
}

fn read_history(conn: &Connection, ledger: &str, raw_key: &str) -> RepositoryResult<Vec<ScoreChange>> {
    let mut stmt = conn.prepare(
        "SELECT changed_at, old_score, new_score FROM assessment_history
         WHERE ledger = ?1 AND assessment_key = ?2 ORDER BY history_id",
    )?;
    let rows = stmt.query_map(params![ledger, raw_key], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, u32>(1)?,
            row.get::<_, u32>(2)?,
        ))
    })?;

    let mut history = Vec::new();
    for row in rows {
        let (changed_at, old_score, new_score) = row?;
        history.push(ScoreChange {
            timestamp: parse_datetime("assessment_history.changed_at", &changed_at)?,
            old_score,
            new_score,
        });
    }
    Ok(history)
}

fn upsert_current<K: LedgerKey>(
    conn: &Connection,
    ledger: &str,
    key: &K,
    entry: &AssessmentEntry,
) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO assessment (ledger, assessment_key, engineer_id, score, last_updated, updated_by)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(ledger, assessment_key) DO UPDATE SET
            score = excluded.score,
            last_updated = excluded.last_updated,
            updated_by = excluded.updated_by
        "#,
        params![
            ledger,
            key.to_string(),
            key.engineer_id(),
            entry.score,
            format_datetime(&entry.last_updated),
            entry.updated_by,
        ],
    )?;
    Ok(())
}

fn append_history(conn: &Connection, ledger: &str, raw_key: &str, change: &ScoreChange) -> RepositoryResult<()> {
    conn.execute(
        "INSERT INTO assessment_history (ledger, assessment_key, changed_at, old_score, new_score)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            ledger,
            raw_key,
            format_datetime(&change.timestamp),
            change.old_score,
            change.new_score
        ],
    )?;
    Ok(())
}

/// 只保留最新 cap 条历史，保留下来的行不做改写
fn prune_history(conn: &Connection, ledger: &str, raw_key: &str, cap: usize) -> RepositoryResult<usize> {
    let removed = conn.execute(
        r#"
        DELETE FROM assessment_history
        WHERE ledger = ?1 AND assessment_key = ?2 AND history_id NOT IN (
            SELECT history_id FROM assessment_history
            WHERE ledger = ?1 AND assessment_key = ?2
            ORDER BY history_id DESC LIMIT ?3
        )
        "#,
        params![ledger, raw_key, cap as i64],
    )?;
    Ok(removed)
}

fn replace_entry<K: LedgerKey>(
    conn: &Connection,
    ledger: &str,
    key: &K,
    entry: &AssessmentEntry,
) -> RepositoryResult<()> {
    let raw_key = key.to_string();
    upsert_current(conn, ledger, key, entry)?;
    conn.execute(
        "DELETE FROM assessment_history WHERE ledger = ?1 AND assessment_key = ?2",
        params![ledger, raw_key],
    )?;
    for change in &entry.history {
        append_history(conn, ledger, &raw_key, change)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, ensure_schema};
    use crate::domain::assessment::{AssessmentKey, CoreSkillKey};
    use chrono::NaiveDate;

    fn repo() -> AssessmentRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        AssessmentRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_record_score_creates_entry_and_history() {
        let repo = repo();
        let key = AssessmentKey::new("E1", "PA1", "M1", "C1");
        let policy = HistoryPolicy::unbounded();

        let (entry, change) = repo.record_score(&key, 2, "lead", ts(8), &policy).unwrap();
        assert_eq!(change.old_score, 0);
        assert_eq!(entry.score, 2);
        assert_eq!(entry.history.len(), 1);

        let (entry, change) = repo.record_score(&key, 2, "lead", ts(9), &policy).unwrap();
        assert_eq!(change.old_score, 2);
        assert_eq!(change.new_score, 2);
        assert_eq!(entry.history.len(), 2);

        let stored = repo.find_entry(&key).unwrap().unwrap();
        assert_eq!(stored, entry);
        assert_eq!(stored.last_updated, ts(9));
    }

    #[test]
    fn test_history_cap_prunes_oldest_rows() {
        let repo = repo();
        let key = AssessmentKey::new("E1", "PA1", "M1", "C1");
        let policy = HistoryPolicy::capped(2);
        for (hour, score) in [(1, 1), (2, 2), (3, 3)] {
            repo.record_score(&key, score, "lead", ts(hour), &policy).unwrap();
        }

        let history = repo.history(&key).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].timestamp, ts(2));
        assert_eq!(history[1].new_score, 3);
    }

    #[test]
    fn test_ledgers_are_isolated() {
        let repo = repo();
        let policy = HistoryPolicy::unbounded();
        repo.record_score(&AssessmentKey::new("E1", "PA1", "M1", "C1"), 3, "lead", ts(8), &policy)
            .unwrap();
        repo.record_score(&CoreSkillKey::new("E1", "K1", "S1"), 1, "lead", ts(8), &policy)
            .unwrap();

        let machine: Ledger<AssessmentKey> = repo.load_ledger(policy).unwrap();
        let core: Ledger<CoreSkillKey> = repo.load_ledger(policy).unwrap();
        assert_eq!(machine.len(), 1);
        assert_eq!(core.len(), 1);
        assert_eq!(core.get_score(&CoreSkillKey::new("E1", "K1", "S1")), 1);
    }

    #[test]
    fn test_load_ledger_attaches_history_in_order() {
        let repo = repo();
        let policy = HistoryPolicy::unbounded();
        let key = AssessmentKey::new("E1", "PA1", "M1", "C1");
        repo.record_score(&key, 1, "a", ts(1), &policy).unwrap();
        repo.record_score(&key, 3, "b", ts(2), &policy).unwrap();

        let ledger: Ledger<AssessmentKey> = repo.load_ledger(policy).unwrap();
        let entry = ledger.entry(&key).unwrap();
        assert_eq!(entry.updated_by, "b");
        assert_eq!(entry.history.iter().map(|c| c.new_score).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_save_ledger_replaces_and_delete_entries() {
        let repo = repo();
        let policy = HistoryPolicy::unbounded();
        repo.record_score(&AssessmentKey::new("E9", "PA1", "M1", "C1"), 2, "a", ts(1), &policy)
            .unwrap();

        let mut ledger: Ledger<AssessmentKey> = Ledger::new(policy);
        let key = AssessmentKey::new("E1", "PA1", "M1", "C1");
        ledger.insert_entry(
            key.clone(),
            AssessmentEntry {
                score: 3,
                last_updated: ts(5),
                updated_by: "import".to_string(),
                history: vec![ScoreChange { timestamp: ts(5), old_score: 0, new_score: 3 }],
            },
        );
        assert_eq!(repo.save_ledger(&ledger).unwrap(), 1);

        let loaded: Ledger<AssessmentKey> = repo.load_ledger(policy).unwrap();
        assert_eq!(loaded.entries(), ledger.entries());

        assert_eq!(repo.delete_entries(&[key.clone()]).unwrap(), 1);
        assert!(repo.find_entry(&key).unwrap().is_none());
        assert!(repo.history(&key).unwrap().is_empty());
    }
}

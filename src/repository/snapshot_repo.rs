// ==========================================
// 工程师能力矩阵系统 - 快照数据仓储
// ==========================================
// 表: snapshot (data_json 为 SnapshotData 的 JSON 文本)
// 红线: 快照只增不改；删除仅来自保留策略或显式删除
// ==========================================

use crate::db::{format_datetime, parse_datetime};
use crate::domain::snapshot::{Snapshot, SnapshotData};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 快照摘要（不含数据体）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotHeader {
    pub id: String,
    pub timestamp: NaiveDateTime,
    pub description: String,
}

// ==========================================
// SnapshotRepository - 快照仓储
// ==========================================
pub struct SnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SnapshotRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入快照
    pub fn insert(&self, snapshot: &Snapshot) -> RepositoryResult<()> {
        let data_json = serde_json::to_string(&snapshot.data)?;
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO snapshot (snapshot_id, created_at, description, data_json)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                snapshot.id,
                format_datetime(&snapshot.timestamp),
                snapshot.description,
                data_json
            ],
        )?;
        Ok(())
    }

    /// 全部快照（旧 → 新）
    pub fn list(&self) -> RepositoryResult<Vec<Snapshot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT snapshot_id, created_at, description, data_json
             FROM snapshot ORDER BY created_at, rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut snapshots = Vec::new();
        for row in rows {
            let (id, created_at, description, data_json) = row?;
            snapshots.push(to_snapshot(id, &created_at, description, &data_json)?);
        }
        Ok(snapshots)
    }

    /// 快照摘要列表（旧 → 新）
    pub fn list_headers(&self) -> RepositoryResult<Vec<SnapshotHeader>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT snapshot_id, created_at, description FROM snapshot ORDER BY created_at, rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut headers = Vec::new();
        for row in rows {
            let (id, created_at, description) = row?;
            headers.push(SnapshotHeader {
                id,
                timestamp: parse_datetime("snapshot.created_at", &created_at)?,
                description,
            });
        }
        Ok(headers)
    }

    /// 按 ID 查询
    pub fn find_by_id(&self, snapshot_id: &str) -> RepositoryResult<Option<Snapshot>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                "SELECT snapshot_id, created_at, description, data_json FROM snapshot WHERE snapshot_id = ?1",
                params![snapshot_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, created_at, description, data_json)| to_snapshot(id, &created_at, description, &data_json))
            .transpose()
    }

    pub fn delete(&self, snapshot_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM snapshot WHERE snapshot_id = ?1", params![snapshot_id])?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Snapshot".to_string(),
                id: snapshot_id.to_string(),
            });
        }
        Ok(())
    }

    /// 只保留最新的 retention 个快照，返回删除数量
    pub fn prune(&self, retention: usize) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let removed = conn.execute(
            r#"
            DELETE FROM snapshot WHERE snapshot_id NOT IN (
                SELECT snapshot_id FROM snapshot ORDER BY created_at DESC, rowid DESC LIMIT ?1
            )
            "#,
            params![retention.max(1) as i64],
        )?;
        if removed > 0 {
            tracing::info!(removed, retention, "已按保留策略清理旧快照");
        }
        Ok(removed)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM snapshot", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn to_snapshot(id: String, created_at: &str, description: String, data_json: &str) -> RepositoryResult<Snapshot> {
    let data: SnapshotData = serde_json::from_str(data_json)?;
    Ok(Snapshot {
        id,
        timestamp: parse_datetime("snapshot.created_at", created_at)?,
        description,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, ensure_schema};
    use crate::domain::assessment::{AssessmentKey, AssessmentLedger};
    use crate::domain::entity::{Competency, Engineer, EntityCatalog, Machine, ProductionArea};
    use crate::domain::types::Shift;
    use chrono::NaiveDate;

    fn repo() -> SnapshotRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        SnapshotRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn snapshot(day: u32) -> Snapshot {
        let mut catalog = EntityCatalog::new();
        catalog
            .add_area(
                ProductionArea::new("PA1", "Filling")
                    .with_machine(Machine::new("M1", "Filler", 2).with_competency(Competency::new("C1", "Setup"))),
            )
            .unwrap();
        catalog.add_engineer(Engineer::new("E1", "Alice", Shift::A)).unwrap();
        let mut ledger = AssessmentLedger::default();
        ledger
            .set_score_at(&catalog, AssessmentKey::new("E1", "PA1", "M1", "C1"), 2, "lead", ts(day))
            .unwrap();
        Snapshot::capture(&format!("day {}", day), &catalog, &ledger, ts(day))
    }

    #[test]
    fn test_insert_and_find_round_trip() {
        let repo = repo();
        let snap = snapshot(1);
        repo.insert(&snap).unwrap();

        let loaded = repo.find_by_id(&snap.id).unwrap().unwrap();
        assert_eq!(loaded, snap);
        assert!(repo.find_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_list_is_ascending_by_time() {
        let repo = repo();
        for day in [3, 1, 2] {
            repo.insert(&snapshot(day)).unwrap();
        }
        let days: Vec<_> = repo.list().unwrap().iter().map(|s| s.description.clone()).collect();
        assert_eq!(days, vec!["day 1", "day 2", "day 3"]);
        assert_eq!(repo.list_headers().unwrap()[0].timestamp, ts(1));
    }

    #[test]
    fn test_prune_keeps_newest() {
        let repo = repo();
        for day in 1..=5 {
            repo.insert(&snapshot(day)).unwrap();
        }
        assert_eq!(repo.prune(3).unwrap(), 2);
        assert_eq!(repo.count().unwrap(), 3);
        assert_eq!(repo.list().unwrap()[0].timestamp, ts(3));
    }

    #[test]
    fn test_delete_missing_snapshot_is_not_found() {
        let repo = repo();
        assert!(matches!(repo.delete("nope"), Err(RepositoryError::NotFound { .. })));
    }
}

// ==========================================
// 工程师能力矩阵系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，保证外键级联在每个连接上都生效
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - ensure_schema 幂等建表，启动时与测试中共用
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式（保留小数秒，历史排序依赖它）
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

// ==========================================
// Schema
// ==========================================
// 评分表不对实体表建外键：删除实体时评分记录保留为孤儿，
// 由遍历逻辑天然忽略，需要时再显式清理。
// ==========================================
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_scope (
    scope_id TEXT PRIMARY KEY,
    scope_type TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS production_area (
    area_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    sort_order INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS machine (
    area_id TEXT NOT NULL REFERENCES production_area(area_id) ON DELETE CASCADE,
    machine_id TEXT NOT NULL,
    name TEXT NOT NULL,
    importance INTEGER NOT NULL CHECK (importance BETWEEN 1 AND 10),
    sort_order INTEGER NOT NULL,
    PRIMARY KEY (area_id, machine_id)
);

CREATE TABLE IF NOT EXISTS competency (
    area_id TEXT NOT NULL,
    machine_id TEXT NOT NULL,
    competency_id TEXT NOT NULL,
    name TEXT NOT NULL,
    max_score INTEGER NOT NULL CHECK (max_score >= 1),
    sort_order INTEGER NOT NULL,
    PRIMARY KEY (area_id, machine_id, competency_id),
    FOREIGN KEY (area_id, machine_id) REFERENCES machine(area_id, machine_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS engineer (
    engineer_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    shift TEXT NOT NULL,
    sort_order INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS core_skill_category (
    category_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    sort_order INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS core_skill (
    category_id TEXT NOT NULL REFERENCES core_skill_category(category_id) ON DELETE CASCADE,
    skill_id TEXT NOT NULL,
    name TEXT NOT NULL,
    max_score INTEGER NOT NULL CHECK (max_score >= 1),
    sort_order INTEGER NOT NULL,
    PRIMARY KEY (category_id, skill_id)
);

CREATE TABLE IF NOT EXISTS app_user (
    user_id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    role TEXT NOT NULL,
    sort_order INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS assessment (
    ledger TEXT NOT NULL,
    assessment_key TEXT NOT NULL,
    engineer_id TEXT NOT NULL,
    score INTEGER NOT NULL CHECK (score >= 0),
    last_updated TEXT NOT NULL,
    updated_by TEXT NOT NULL,
    PRIMARY KEY (ledger, assessment_key)
);

CREATE INDEX IF NOT EXISTS idx_assessment_engineer ON assessment(ledger, engineer_id);

CREATE TABLE IF NOT EXISTS assessment_history (
    history_id INTEGER PRIMARY KEY AUTOINCREMENT,
    ledger TEXT NOT NULL,
    assessment_key TEXT NOT NULL,
    changed_at TEXT NOT NULL,
    old_score INTEGER NOT NULL,
    new_score INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_history_key ON assessment_history(ledger, assessment_key, history_id);

CREATE TABLE IF NOT EXISTS snapshot (
    snapshot_id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    description TEXT NOT NULL,
    data_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_snapshot_created ON snapshot(created_at);

INSERT OR IGNORE INTO config_scope (scope_id, scope_type) VALUES ('global', 'GLOBAL');
"#;

/// 幂等建表并登记 schema_version
pub fn ensure_schema(conn: &Connection) -> RepositoryResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    let version = read_schema_version(conn)?;
    if version != Some(CURRENT_SCHEMA_VERSION) {
        tracing::warn!(
            expected = CURRENT_SCHEMA_VERSION,
            actual = ?version,
            "数据库 schema_version 与代码不一致"
        );
    }
    Ok(())
}

// ==========================================
// 时间戳编解码
// ==========================================

pub fn format_datetime(value: &NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

pub fn parse_datetime(field: &str, raw: &str) -> RepositoryResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).map_err(|e| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("无法解析时间 '{}': {}", raw, e),
    })
}

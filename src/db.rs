// ==========================================
// 价格表导入服务 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 批量写入期间的完整性约束放宽以 RAII Guard 形式限定作用域
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

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

/// 建表（幂等）
///
/// 上传记录/目录/价格/行错误四张业务表，以及上传任务队列表。
/// nomenclatures 的 (code, brand) 唯一约束是目录唯一性语义的落点：
/// 同一次 flush 内的重复候选会在此约束上失败。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS price_list_uploads (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            price_list_id   INTEGER NOT NULL,
            status          INTEGER NOT NULL DEFAULT 0,
            file_basename   TEXT NOT NULL DEFAULT '',
            file_name       TEXT NOT NULL DEFAULT '',
            file_path       TEXT NOT NULL DEFAULT '',
            file_size       REAL NOT NULL DEFAULT 0,
            brand           TEXT,
            currency        TEXT NOT NULL DEFAULT '',
            currency_value  REAL NOT NULL DEFAULT 1.0,
            markup          REAL NOT NULL DEFAULT 1.0,
            col_delimiter   TEXT NOT NULL DEFAULT ';',
            character_set   TEXT NOT NULL DEFAULT 'utf-8',
            comment_price   TEXT,
            columns_config  TEXT NOT NULL DEFAULT '{}',
            start_row       INTEGER NOT NULL DEFAULT 1,
            rows            INTEGER NOT NULL DEFAULT 0,
            rows_loaded     INTEGER NOT NULL DEFAULT 0,
            rows_error      INTEGER NOT NULL DEFAULT 0,
            loaded_at       TEXT,
            created_by      INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS nomenclatures (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            code          TEXT NOT NULL,
            replace_code  TEXT,
            brand         TEXT NOT NULL,
            description   TEXT,
            is_auto_added INTEGER NOT NULL DEFAULT 0,
            created_by    INTEGER,
            updated_by    INTEGER,
            created_at    TEXT,
            updated_at    TEXT,
            UNIQUE (code, brand)
        );

        CREATE TABLE IF NOT EXISTS prices (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            nomenclature_id INTEGER NOT NULL,
            price_list_id   INTEGER NOT NULL,
            upload_id       INTEGER NOT NULL,
            owner_id        TEXT NOT NULL,
            code            TEXT NOT NULL,
            replace_code    TEXT,
            description     TEXT,
            price           REAL NOT NULL,
            price_default   REAL NOT NULL,
            amount          INTEGER NOT NULL,
            comment         TEXT,
            created_by      INTEGER,
            created_at      TEXT
        );

        CREATE TABLE IF NOT EXISTS price_list_upload_rows (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            upload_id  INTEGER NOT NULL,
            no_row     INTEGER NOT NULL,
            text       TEXT NOT NULL,
            created_at TEXT
        );

        CREATE TABLE IF NOT EXISTS price_list_upload_queue (
            task_id       TEXT PRIMARY KEY,
            payload       TEXT NOT NULL,
            status        TEXT NOT NULL DEFAULT 'PENDING',
            created_at    TEXT NOT NULL,
            started_at    TEXT,
            completed_at  TEXT,
            error_message TEXT
        );
        "#,
    )
}

// ==========================================
// IntegrityGuard - 批量写入期间的约束放宽
// ==========================================
// 大批量落库期间关闭外键检查并降低同步级别，提升吞吐。
// Drop 时无条件恢复，包括中途某个分片写入失败的退出路径。
pub struct IntegrityGuard {
    conn: Option<Arc<Mutex<Connection>>>,
}

impl IntegrityGuard {
    /// 放宽指定连接的完整性约束，返回作用域守卫
    pub fn relax(conn: Arc<Mutex<Connection>>) -> rusqlite::Result<Self> {
        {
            let guard = conn.lock().map_err(|_| rusqlite::Error::InvalidQuery)?;
            guard.execute_batch("PRAGMA foreign_keys = OFF; PRAGMA synchronous = OFF;")?;
        }
        Ok(Self { conn: Some(conn) })
    }

    /// 无操作守卫（无真实连接的场景，如测试替身）
    pub fn noop() -> Self {
        Self { conn: None }
    }
}

impl Drop for IntegrityGuard {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            match conn.lock() {
                Ok(guard) => {
                    if let Err(e) = guard
                        .execute_batch("PRAGMA foreign_keys = ON; PRAGMA synchronous = FULL;")
                    {
                        warn!(error = %e, "恢复完整性约束失败");
                    }
                }
                Err(_) => warn!("恢复完整性约束失败: 连接锁已污染"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN (
                    'price_list_uploads', 'nomenclatures', 'prices',
                    'price_list_upload_rows', 'price_list_upload_queue')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 5);
    }

    #[test]
    fn test_integrity_guard_restores_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        {
            let _guard = IntegrityGuard::relax(conn.clone()).unwrap();
            let fk: i64 = conn
                .lock()
                .unwrap()
                .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                .unwrap();
            assert_eq!(fk, 0);
        }

        let fk: i64 = conn
            .lock()
            .unwrap()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_nomenclature_unique_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO nomenclatures (code, brand) VALUES ('A1', 'BOSCH')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO nomenclatures (code, brand) VALUES ('A1', 'BOSCH')",
            [],
        );
        assert!(dup.is_err());
    }
}

// ==========================================
// 价格表导入服务 - 价格表 Repository 实现
// ==========================================
// 职责: 实现摄取相关数据访问（使用 rusqlite）
// 约束: 所有写入参数化；批量写入 = 每分片一个事务 + 预编译语句逐行执行
// ==========================================

use crate::db::{open_sqlite_connection, IntegrityGuard};
use crate::domain::{CatalogEntry, PendingCreate, PriceInsertRecord, RunSummary, Upload, UploadStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::price_list_repo::PriceListRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// PriceListRepositoryImpl
// ==========================================
pub struct PriceListRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl PriceListRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 Repository
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    /// 共享底层连接（队列等同库组件复用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    fn lock_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 行 → Upload（列顺序与 SELECT 对齐）
    fn upload_from_row(row: &Row) -> rusqlite::Result<Upload> {
        Ok(Upload {
            id: row.get(0)?,
            price_list_id: row.get(1)?,
            status: row.get(2)?,
            file_basename: row.get(3)?,
            file_name: row.get(4)?,
            file_path: row.get(5)?,
            file_size: row.get(6)?,
            brand: row.get(7)?,
            currency: row.get(8)?,
            currency_value: row.get(9)?,
            markup: row.get(10)?,
            col_delimiter: row.get(11)?,
            character_set: row.get(12)?,
            comment_price: row.get(13)?,
            columns_config: row.get(14)?,
            start_row: row.get(15)?,
            rows: row.get(16)?,
            rows_loaded: row.get(17)?,
            rows_error: row.get(18)?,
            loaded_at: row.get(19)?,
            created_by: row.get(20)?,
        })
    }

    /// 在事务中批量插入目录候选
    fn bulk_insert_catalog_entries_tx(
        tx: &Transaction,
        entries: &[PendingCreate],
    ) -> RepositoryResult<usize> {
        let now = Utc::now();
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO nomenclatures (
                code, replace_code, brand, description,
                is_auto_added, created_by, updated_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?7, ?8)
            "#,
        )?;

        let mut count = 0;
        for entry in entries {
            stmt.execute(params![
                entry.code,
                entry.replace_code,
                entry.brand,
                entry.description,
                entry.created_by,
                entry.created_by,
                now,
                now,
            ])?;
            count += 1;
        }

        Ok(count)
    }

    /// 在事务中批量插入价格记录
    fn bulk_insert_prices_tx(
        tx: &Transaction,
        rows: &[PriceInsertRecord],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO prices (
                nomenclature_id, price_list_id, upload_id, owner_id,
                code, replace_code, description, price, price_default,
                amount, comment, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )?;

        let mut count = 0;
        for record in rows {
            stmt.execute(params![
                record.nomenclature_id,
                record.price_list_id,
                record.upload_id,
                record.owner_id,
                record.code,
                record.replace_code,
                record.description,
                record.price,
                record.price_default,
                record.amount,
                record.comment,
                record.created_by,
                record.created_at,
            ])?;
            count += 1;
        }

        Ok(count)
    }
}

#[async_trait]
impl PriceListRepository for PriceListRepositoryImpl {
    async fn upload_by_id(&self, upload_id: i64) -> RepositoryResult<Upload> {
        let conn = self.lock_conn()?;

        let upload = conn
            .query_row(
                r#"
                SELECT id, price_list_id, status, file_basename, file_name, file_path,
                       file_size, brand, currency, currency_value, markup, col_delimiter,
                       character_set, comment_price, columns_config, start_row,
                       rows, rows_loaded, rows_error, loaded_at, created_by
                FROM price_list_uploads
                WHERE id = ?1
                "#,
                params![upload_id],
                Self::upload_from_row,
            )
            .optional()?;

        upload.ok_or_else(|| RepositoryError::NotFound {
            entity: "Upload".to_string(),
            id: upload_id.to_string(),
        })
    }

    async fn find_catalog_entry(
        &self,
        code: &str,
        brand: &str,
    ) -> RepositoryResult<Option<CatalogEntry>> {
        let conn = self.lock_conn()?;

        let entry = conn
            .query_row(
                r#"
                SELECT id, code, replace_code, brand, description
                FROM nomenclatures
                WHERE code = ?1 AND brand = ?2
                "#,
                params![code, brand],
                |row| {
                    Ok(CatalogEntry {
                        id: row.get(0)?,
                        code: row.get(1)?,
                        replace_code: row.get(2)?,
                        brand: row.get(3)?,
                        description: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(entry)
    }

    async fn bulk_insert_catalog_entries(
        &self,
        entries: &[PendingCreate],
    ) -> RepositoryResult<usize> {
        let mut conn = self.lock_conn()?;

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let count = Self::bulk_insert_catalog_entries_tx(&tx, entries)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(count)
    }

    async fn bulk_insert_prices(&self, rows: &[PriceInsertRecord]) -> RepositoryResult<usize> {
        let mut conn = self.lock_conn()?;

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let count = Self::bulk_insert_prices_tx(&tx, rows)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(count)
    }

    async fn insert_row_error(
        &self,
        upload_id: i64,
        row_number: usize,
        message: &str,
    ) -> RepositoryResult<()> {
        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            INSERT INTO price_list_upload_rows (upload_id, no_row, text, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![upload_id, row_number as i64, message, Utc::now()],
        )?;

        Ok(())
    }

    async fn finish_upload(&self, upload_id: i64, summary: &RunSummary) -> RepositoryResult<()> {
        let conn = self.lock_conn()?;

        let updated = conn.execute(
            r#"
            UPDATE price_list_uploads
            SET rows = ?1, rows_loaded = ?2, rows_error = ?3, loaded_at = ?4, status = ?5
            WHERE id = ?6
            "#,
            params![
                summary.rows_scanned as i64,
                summary.rows_loaded as i64,
                summary.rows_error as i64,
                Utc::now(),
                UploadStatus::Loaded.as_i32(),
                upload_id,
            ],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Upload".to_string(),
                id: upload_id.to_string(),
            });
        }

        Ok(())
    }

    fn integrity_guard(&self) -> RepositoryResult<IntegrityGuard> {
        IntegrityGuard::relax(self.conn.clone())
            .map_err(|e| RepositoryError::DatabaseQueryError(e.to_string()))
    }
}

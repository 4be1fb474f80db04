// ==========================================
// 价格表导入服务 - 上传任务队列
// ==========================================
// 职责: 管理上传任务的入队/领取/回执，避免并发冲突
// 载荷: 每个任务一条 JSON 消息 {"upload_id": <id>}，除此之外无其他字段
// ==========================================

use crate::repository::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// QueueMessage - 队列消息载荷
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueMessage {
    pub upload_id: i64,
}

/// 上传任务状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// 等待中
    Pending,
    /// 执行中
    Running,
    /// 已完成
    Completed,
    /// 失败
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "PENDING" => TaskStatus::Pending,
            "RUNNING" => TaskStatus::Running,
            "COMPLETED" => TaskStatus::Completed,
            _ => TaskStatus::Failed,
        }
    }
}

/// 上传任务
#[derive(Debug, Clone)]
pub struct UploadTask {
    /// 任务 ID
    pub task_id: String,
    /// 消息载荷（JSON）
    pub payload: String,
    /// 任务状态
    pub status: TaskStatus,
    /// 入队时间
    pub created_at: String,
    /// 开始执行时间
    pub started_at: Option<String>,
    /// 完成时间
    pub completed_at: Option<String>,
    /// 错误信息
    pub error_message: Option<String>,
}

// ==========================================
// UploadQueue - 上传任务队列
// ==========================================
pub struct UploadQueue {
    conn: Arc<Mutex<Connection>>,
}

impl UploadQueue {
    /// 创建队列管理器并确保队列表存在
    pub fn new(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let queue = Self { conn };
        queue.ensure_queue_table()?;
        Ok(queue)
    }

    /// 确保上传任务队列表存在
    fn ensure_queue_table(&self) -> RepositoryResult<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            r#"
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
        )?;
        Ok(())
    }

    fn lock_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 入队一个上传任务
    ///
    /// # 返回
    /// - Ok(String): 新任务 ID
    pub fn enqueue(&self, upload_id: i64) -> RepositoryResult<String> {
        let task_id = Uuid::new_v4().to_string();
        let payload = serde_json::to_string(&QueueMessage { upload_id })
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;

        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO price_list_upload_queue (task_id, payload, status, created_at)
            VALUES (?1, ?2, 'PENDING', ?3)
            "#,
            params![task_id, payload, Utc::now().to_rfc3339()],
        )?;

        Ok(task_id)
    }

    /// 领取最早入队的等待任务并置为执行中
    ///
    /// # 返回
    /// - Ok(Some(task)): 已领取的任务
    /// - Ok(None): 队列为空
    pub fn claim_next(&self) -> RepositoryResult<Option<UploadTask>> {
        let conn = self.lock_conn()?;

        let task = conn
            .query_row(
                r#"
                SELECT task_id, payload, status, created_at, started_at, completed_at, error_message
                FROM price_list_upload_queue
                WHERE status = 'PENDING'
                ORDER BY created_at ASC, task_id ASC
                LIMIT 1
                "#,
                [],
                |row| {
                    Ok(UploadTask {
                        task_id: row.get(0)?,
                        payload: row.get(1)?,
                        status: TaskStatus::from_str(&row.get::<_, String>(2)?),
                        created_at: row.get(3)?,
                        started_at: row.get(4)?,
                        completed_at: row.get(5)?,
                        error_message: row.get(6)?,
                    })
                },
            )
            .optional()?;

        let Some(mut task) = task else {
            return Ok(None);
        };

        conn.execute(
            "UPDATE price_list_upload_queue SET status = 'RUNNING', started_at = ?1 WHERE task_id = ?2",
            params![Utc::now().to_rfc3339(), task.task_id],
        )?;
        task.status = TaskStatus::Running;

        Ok(Some(task))
    }

    /// 标记任务完成
    pub fn mark_completed(&self, task_id: &str) -> RepositoryResult<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "UPDATE price_list_upload_queue SET status = 'COMPLETED', completed_at = ?1 WHERE task_id = ?2",
            params![Utc::now().to_rfc3339(), task_id],
        )?;
        Ok(())
    }

    /// 标记任务失败并保留错误信息
    pub fn mark_failed(&self, task_id: &str, error_message: &str) -> RepositoryResult<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            UPDATE price_list_upload_queue
            SET status = 'FAILED', completed_at = ?1, error_message = ?2
            WHERE task_id = ?3
            "#,
            params![Utc::now().to_rfc3339(), error_message, task_id],
        )?;
        Ok(())
    }

    /// 等待中的任务数（监控用）
    pub fn pending_count(&self) -> RepositoryResult<i64> {
        let conn = self.lock_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM price_list_upload_queue WHERE status = 'PENDING'",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

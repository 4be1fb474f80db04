// ==========================================
// 价格表导入服务 - 摄取层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 两级严重度: RowIssue 只影响单行；IngestError 终止整次运行
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 运行级（致命）错误类型
///
/// 任何变体都终止当前上传的处理；是否同时终止整个 Worker
/// 由调用方的 FatalPolicy 决定，而不是在这里硬编码。
#[derive(Error, Debug)]
pub enum IngestError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx）")]
    UnsupportedFormat(String),

    #[error("Excel 解析失败: {0}")]
    WorkbookParse(String),

    // ===== 任务数据错误 =====
    #[error("上传记录不存在: upload_id={0}")]
    UnknownUpload(i64),

    #[error("队列消息格式错误: {0}")]
    QueueMessageInvalid(String),

    #[error("列映射配置无效: {0}")]
    ColumnMappingInvalid(String),

    // ===== 存储错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::FileNotFound(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for IngestError {
    fn from(err: calamine::XlsxError) -> Self {
        IngestError::WorkbookParse(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::ColumnMappingInvalid(err.to_string())
    }
}

/// Result 类型别名
pub type IngestResult<T> = Result<T, IngestError>;

// ==========================================
// RowIssue - 行级错误
// ==========================================
// 经 ErrorSink 记录到上传的行错误表；该行被排除，运行继续
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    pub row_number: usize, // 文件内行号（1 起）
    pub message: String,   // 面向用户的错误文案（已本地化）
}

impl RowIssue {
    pub fn new(row_number: usize, message: impl Into<String>) -> Self {
        Self {
            row_number,
            message: message.into(),
        }
    }
}

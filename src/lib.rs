// ==========================================
// 价格表导入服务 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 队列驱动的价格表摄取 Worker
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 摄取层 - 解析 / 对账 / 批量落库
pub mod ingest;

// 任务队列 - 上传任务的领取与回执
pub mod queue;

// 配置层 - Worker 运行参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    CatalogEntry, ColumnMapping, PendingCreate, PriceInsertRecord, RawPriceRecord, RunSummary,
    Upload, UploadStatus,
};

// 摄取层
pub use ingest::{
    CatalogResolver, ErrorSink, IngestError, IngestResult, IngestionOrchestrator,
    PendingCreateBatcher, PriceRowBuilder, Resolution, RowIssue, RowParser, RunState,
};

// 仓储
pub use repository::{
    PriceListRepository, PriceListRepositoryImpl, RepositoryError, RepositoryResult,
};

// 队列
pub use queue::{QueueMessage, TaskStatus, UploadQueue, UploadTask};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "价格表导入服务";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

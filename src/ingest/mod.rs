// ==========================================
// 价格表导入服务 - 摄取层
// ==========================================
// 职责: 价格表文件的解析、两遍目录对账与批量落库
// 流程: 读取 → 行解析 → 目录解析 → 补建 flush → 对账 → 价格落库
// ==========================================

// 模块声明
pub mod catalog_resolver;
pub mod error;
pub mod error_sink;
pub mod orchestrator;
pub mod pending_batcher;
pub mod price_builder;
pub mod reader;
pub mod row_parser;

// 重导出核心类型
pub use catalog_resolver::{CatalogResolver, Resolution};
pub use error::{IngestError, IngestResult, RowIssue};
pub use error_sink::ErrorSink;
pub use orchestrator::{IngestionOrchestrator, ParkedRow, RunState, PRICE_INSERT_CHUNK_SIZE};
pub use pending_batcher::{PendingCreateBatcher, CATALOG_CREATE_CHUNK_SIZE};
pub use price_builder::PriceRowBuilder;
pub use reader::read_rows;
pub use row_parser::RowParser;

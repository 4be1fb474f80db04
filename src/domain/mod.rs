// ==========================================
// 价格表导入服务 - 领域层
// ==========================================
// 职责: 定义摄取管道的实体与类型
// 红线: 领域结构不持有连接，不做数据访问
// ==========================================

pub mod catalog;
pub mod price;
pub mod upload;

// 重导出核心类型
pub use catalog::{CatalogEntry, PendingCreate};
pub use price::{PriceInsertRecord, RawPriceRecord};
pub use upload::{ColumnMapping, RunSummary, Upload, UploadStatus};

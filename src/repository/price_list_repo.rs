// ==========================================
// 价格表导入服务 - 价格表 Repository Trait
// ==========================================
// 职责: 定义摄取相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据读写
// ==========================================

use crate::db::IntegrityGuard;
use crate::domain::{CatalogEntry, PendingCreate, PriceInsertRecord, RunSummary, Upload};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// PriceListRepository Trait
// ==========================================
// 用途: 摄取管道面向存储的窄契约
// 实现者: PriceListRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait PriceListRepository: Send + Sync {
    // ===== 上传记录读取 =====

    /// 按 ID 加载上传记录全量字段
    ///
    /// # 返回
    /// - Ok(Upload): 上传记录
    /// - Err(NotFound): ID 不存在
    async fn upload_by_id(&self, upload_id: i64) -> RepositoryResult<Upload>;

    // ===== 目录契约 =====

    /// 按 (code, brand) 精确匹配查找目录条目
    ///
    /// # 返回
    /// - Ok(Some(entry)): 命中
    /// - Ok(None): 未命中（非错误，触发第一遍扫描的挂起）
    async fn find_catalog_entry(
        &self,
        code: &str,
        brand: &str,
    ) -> RepositoryResult<Option<CatalogEntry>>;

    /// 批量插入目录补建候选（单个分片，一个事务）
    ///
    /// # 返回
    /// - Ok(usize): 成功插入的记录数
    /// - Err: 数据库错误（该分片事务回滚；重复 (code, brand) 在唯一约束上失败）
    async fn bulk_insert_catalog_entries(
        &self,
        entries: &[PendingCreate],
    ) -> RepositoryResult<usize>;

    // ===== 价格表写入契约 =====

    /// 批量插入价格记录（单个分片，一个事务）
    async fn bulk_insert_prices(&self, rows: &[PriceInsertRecord]) -> RepositoryResult<usize>;

    // ===== 行错误写入契约 =====

    /// 追加一条行级错误（尽力而为；失败由调用方记日志，不中断运行）
    async fn insert_row_error(
        &self,
        upload_id: i64,
        row_number: usize,
        message: &str,
    ) -> RepositoryResult<()>;

    // ===== 运行结果回写 =====

    /// 回写上传记录的计数器/完成时间/状态
    async fn finish_upload(&self, upload_id: i64, summary: &RunSummary) -> RepositoryResult<()>;

    // ===== 批量写入期间的约束放宽 =====

    /// 获取一次 flush 作用域的完整性放宽守卫
    ///
    /// 守卫 Drop 时恢复约束，包括分片失败的退出路径
    fn integrity_guard(&self) -> RepositoryResult<IntegrityGuard>;
}

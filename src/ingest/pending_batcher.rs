// ==========================================
// 价格表导入服务 - 目录补建批处理器
// ==========================================
// 职责: 跨整个文件累积补建候选，flush 时按固定分片批量落库
// 契约: 不去重；分片失败中止剩余分片并对整次运行致命；
//       已提交分片保留（flush 整体无事务包裹）
// ==========================================

use crate::domain::PendingCreate;
use crate::repository::{PriceListRepository, RepositoryResult};
use tracing::{debug, info};

/// 目录补建分片大小
pub const CATALOG_CREATE_CHUNK_SIZE: usize = 50_000;

pub struct PendingCreateBatcher {
    pending: Vec<PendingCreate>,
    chunk_size: usize,
}

impl Default for PendingCreateBatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingCreateBatcher {
    pub fn new() -> Self {
        Self::with_chunk_size(CATALOG_CREATE_CHUNK_SIZE)
    }

    /// 指定分片大小构造（测试分片透明性时使用）
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        assert!(chunk_size > 0);
        Self {
            pending: Vec::new(),
            chunk_size,
        }
    }

    /// 按到达顺序入批一个补建候选
    pub fn push(&mut self, pending: PendingCreate) {
        self.pending.push(pending);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// 将累积候选分片落库，成功后整体清空
    ///
    /// 完整性放宽守卫覆盖整个 flush，任一退出路径都恢复约束。
    /// 某分片失败时，先行分片已提交的状态保留，错误向上传播。
    ///
    /// # 返回
    /// - Ok(usize): 落库的候选数（空批为 0，属正常 no-op）
    pub async fn flush<R: PriceListRepository>(&mut self, repo: &R) -> RepositoryResult<usize> {
        if self.pending.is_empty() {
            debug!("无目录补建候选，flush 为 no-op");
            return Ok(0);
        }

        info!(candidates = self.pending.len(), "开始目录补建 flush");

        let _guard = repo.integrity_guard()?;
        let mut written = 0;
        for chunk in self.pending.chunks(self.chunk_size) {
            written += repo.bulk_insert_catalog_entries(chunk).await?;
        }

        self.pending.clear();
        info!(written = written, "目录补建 flush 完成");
        Ok(written)
    }
}

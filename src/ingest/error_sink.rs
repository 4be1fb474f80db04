// ==========================================
// 价格表导入服务 - 行错误记录器
// ==========================================
// 职责: 将行级错误按 (上传, 行号, 文案) 追加到存储
// 契约: 尽力而为——记录失败只打日志，不影响该行已定的排除决定
// ==========================================

use crate::ingest::error::RowIssue;
use crate::repository::PriceListRepository;
use tracing::warn;

pub struct ErrorSink<'a, R: PriceListRepository> {
    repo: &'a R,
    upload_id: i64,
    recorded: usize,
}

impl<'a, R: PriceListRepository> ErrorSink<'a, R> {
    pub fn new(repo: &'a R, upload_id: i64) -> Self {
        Self {
            repo,
            upload_id,
            recorded: 0,
        }
    }

    /// 记录一条行级错误
    ///
    /// 无论存储写入是否成功，该行都计入错误行数并被排除
    pub async fn record(&mut self, issue: &RowIssue) {
        if let Err(e) = self
            .repo
            .insert_row_error(self.upload_id, issue.row_number, &issue.message)
            .await
        {
            warn!(
                upload_id = self.upload_id,
                row_number = issue.row_number,
                error = %e,
                "行错误写入失败"
            );
        }
        self.recorded += 1;
    }

    /// 已记录的错误行数
    pub fn count(&self) -> usize {
        self.recorded
    }
}

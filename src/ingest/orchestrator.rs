// ==========================================
// 价格表导入服务 - 摄取编排器
// ==========================================
// 职责: 驱动一次上传的两遍对账流程
// 状态: Scanning → Flushing → Reconciling → Writing → Done
// 流程: 扫描解析行 → 目录命中即构建/未命中即挂起 →
//       补建目录 → 重驱挂起行 → 分片落库价格
// ==========================================

use crate::domain::{ColumnMapping, PriceInsertRecord, RunSummary, Upload};
use crate::i18n::t;
use crate::ingest::catalog_resolver::{CatalogResolver, Resolution};
use crate::ingest::error::{IngestError, IngestResult, RowIssue};
use crate::ingest::error_sink::ErrorSink;
use crate::ingest::pending_batcher::PendingCreateBatcher;
use crate::ingest::price_builder::PriceRowBuilder;
use crate::ingest::reader;
use crate::ingest::row_parser::RowParser;
use crate::repository::{PriceListRepository, RepositoryError};
use calamine::Data;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 价格落库分片大小（与目录补建分片常量各自独立）
pub const PRICE_INSERT_CHUNK_SIZE: usize = 10_000;

// ==========================================
// RunState - 运行状态机
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// 第一遍扫描: 解析 + 目录解析 + 挂起未命中
    Scanning,
    /// 目录补建 flush（零候选也经过此态）
    Flushing,
    /// 第二遍: 重驱挂起行，此时应命中
    Reconciling,
    /// 价格记录分片落库
    Writing,
    /// 终态，运行汇总可用
    Done,
}

impl RunState {
    pub fn as_str(&self) -> &str {
        match self {
            RunState::Scanning => "SCANNING",
            RunState::Flushing => "FLUSHING",
            RunState::Reconciling => "RECONCILING",
            RunState::Writing => "WRITING",
            RunState::Done => "DONE",
        }
    }
}

// ==========================================
// ParkedRow - 挂起行
// ==========================================
// 第一遍目录未命中的 (行号, 原始行) 对，留待第二遍重解析。
// 与补建候选 1:1 对应；若 flush 丢失候选，第二遍必须以行错误
// 显式暴露，而不是静默跳过。
pub struct ParkedRow {
    pub row_number: usize,
    pub cells: Vec<Data>,
}

// ==========================================
// IngestionOrchestrator - 摄取编排器
// ==========================================
pub struct IngestionOrchestrator<R: PriceListRepository> {
    repo: R,
    price_chunk_size: usize,
}

impl<R: PriceListRepository> IngestionOrchestrator<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            price_chunk_size: PRICE_INSERT_CHUNK_SIZE,
        }
    }

    /// 指定价格分片大小构造（测试分片透明性时使用）
    pub fn with_price_chunk_size(repo: R, price_chunk_size: usize) -> Self {
        assert!(price_chunk_size > 0);
        Self {
            repo,
            price_chunk_size,
        }
    }

    /// 按队列消息中的上传 ID 加载记录并运行
    pub async fn run_by_id(&self, upload_id: i64) -> IngestResult<RunSummary> {
        let upload = self.repo.upload_by_id(upload_id).await.map_err(|e| match e {
            RepositoryError::NotFound { .. } => IngestError::UnknownUpload(upload_id),
            other => IngestError::Repository(other),
        })?;

        self.run(&upload).await
    }

    /// 运行一次上传的完整摄取流程
    ///
    /// # 返回
    /// - Ok(RunSummary): Done 态的运行汇总
    /// - Err(IngestError): 运行级错误；行级错误不在此返回
    #[instrument(skip(self, upload), fields(upload_id = upload.id))]
    pub async fn run(&self, upload: &Upload) -> IngestResult<RunSummary> {
        let run_id = Uuid::new_v4().to_string();
        info!(
            run_id = %run_id,
            file = %upload.file_basename,
            price_list_id = upload.price_list_id,
            "开始处理价格表上传"
        );

        // 列映射每次上传解析一次；缺必填列位即致命
        let mapping = ColumnMapping::from_json(&upload.columns_config)?;
        mapping
            .validate(upload.brand_override().is_some())
            .map_err(IngestError::ColumnMappingInvalid)?;

        // 准入 + 物化行（非 .xlsx 在此短路，零行被读取）
        let rows = reader::read_rows(Path::new(&upload.file_path))?;
        info!(total_rows = rows.len(), "文件读取完成");

        let parser = RowParser::new(upload, mapping);
        let resolver = CatalogResolver::new(&self.repo);
        let builder = PriceRowBuilder::new(upload);
        let mut batcher = PendingCreateBatcher::new();
        let mut sink = ErrorSink::new(&self.repo, upload.id);

        let mut parked: Vec<ParkedRow> = Vec::new();
        let mut price_rows: Vec<PriceInsertRecord> = Vec::new();
        let mut scanned = 0usize;

        // === Scanning: 第一遍扫描 ===
        let mut state = RunState::Scanning;
        debug!(state = state.as_str(), start_row = upload.start_row, "进入扫描");
        let start = (upload.start_row.max(1) as usize) - 1;
        for (idx, cells) in rows.iter().enumerate().skip(start) {
            // 跳过完全空白的行
            if cells.iter().all(|c| matches!(c, Data::Empty)) {
                continue;
            }

            let row_number = idx + 1;
            scanned += 1;

            match parser.parse(row_number, cells) {
                Err(issue) => sink.record(&issue).await,
                Ok(record) => match resolver.resolve(&record, upload.created_by).await? {
                    Resolution::Hit(entry) => price_rows.push(builder.build(&entry, &record)),
                    Resolution::Miss(pending) => {
                        batcher.push(pending);
                        parked.push(ParkedRow {
                            row_number,
                            cells: cells.clone(),
                        });
                    }
                },
            }
        }
        info!(
            scanned = scanned,
            hits = price_rows.len(),
            parked = parked.len(),
            errors = sink.count(),
            "扫描完成"
        );

        // === Flushing: 目录补建（零候选也无条件进入下一态）===
        state = RunState::Flushing;
        debug!(state = state.as_str(), "进入目录补建");
        let creates_flushed = batcher.flush(&self.repo).await?;

        // === Reconciling: 重驱挂起行 ===
        state = RunState::Reconciling;
        debug!(state = state.as_str(), parked = parked.len(), "进入对账");
        for row in &parked {
            match parser.parse(row.row_number, &row.cells) {
                Err(issue) => sink.record(&issue).await,
                Ok(record) => match resolver.resolve(&record, upload.created_by).await? {
                    Resolution::Hit(entry) => price_rows.push(builder.build(&entry, &record)),
                    Resolution::Miss(_) => {
                        // 补建后仍未命中说明候选在 flush 中丢失——
                        // 这里必须显式暴露为硬性行错误，不做二次挂起
                        error!(
                            row_number = row.row_number,
                            code = %record.code,
                            brand = %record.brand,
                            "目录补建后仍未命中"
                        );
                        sink.record(&RowIssue::new(
                            row.row_number,
                            t("ingest.catalog_still_missing"),
                        ))
                        .await;
                    }
                },
            }
        }

        // === Writing: 价格分片落库 ===
        state = RunState::Writing;
        debug!(state = state.as_str(), rows = price_rows.len(), "进入价格落库");
        let mut written = 0usize;
        if !price_rows.is_empty() {
            let _guard = self.repo.integrity_guard()?;
            for chunk in price_rows.chunks(self.price_chunk_size) {
                written += self.repo.bulk_insert_prices(chunk).await?;
            }
        }

        // === Done ===
        state = RunState::Done;
        let summary = RunSummary {
            rows_scanned: scanned,
            rows_loaded: written,
            rows_error: sink.count(),
            creates_flushed,
        };

        // 回写计数器为尽力而为，不使已完成的运行失败
        if let Err(e) = self.repo.finish_upload(upload.id, &summary).await {
            warn!(upload_id = upload.id, error = %e, "上传计数器回写失败");
        }

        info!(
            run_id = %run_id,
            state = state.as_str(),
            rows_scanned = summary.rows_scanned,
            rows_loaded = summary.rows_loaded,
            rows_error = summary.rows_error,
            creates_flushed = summary.creates_flushed,
            "价格表上传处理完成"
        );

        Ok(summary)
    }
}

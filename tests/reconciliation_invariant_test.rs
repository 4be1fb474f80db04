// ==========================================
// 对账不变式测试
// ==========================================
// 测试目标: 挂起行与补建候选 1:1 对应；
// 若 flush 静默丢失候选，第二遍必须以硬性行错误显式暴露，
// 而不是静默跳过该行
// ==========================================


use async_trait::async_trait;
use price_list_loader::db::IntegrityGuard;
use price_list_loader::domain::{
    CatalogEntry, PendingCreate, PriceInsertRecord, RunSummary, Upload,
};
use price_list_loader::repository::RepositoryResult;
use price_list_loader::{logging, IngestionOrchestrator, PriceListRepository, PriceListRepositoryImpl};
use test_helpers::*;

/// 假装补建成功、实则丢弃候选的仓储替身（模拟截断性丢失）
struct DroppingRepo {
    inner: PriceListRepositoryImpl,
}

#[async_trait]
impl PriceListRepository for DroppingRepo {
    async fn upload_by_id(&self, upload_id: i64) -> RepositoryResult<Upload> {
        self.inner.upload_by_id(upload_id).await
    }

    async fn find_catalog_entry(
        &self,
        code: &str,
        brand: &str,
    ) -> RepositoryResult<Option<CatalogEntry>> {
        self.inner.find_catalog_entry(code, brand).await
    }

    async fn bulk_insert_catalog_entries(
        &self,
        entries: &[PendingCreate],
    ) -> RepositoryResult<usize> {
        // 报告写入成功但不落库
        Ok(entries.len())
    }

    async fn bulk_insert_prices(&self, rows: &[PriceInsertRecord]) -> RepositoryResult<usize> {
        self.inner.bulk_insert_prices(rows).await
    }

    async fn insert_row_error(
        &self,
        upload_id: i64,
        row_number: usize,
        message: &str,
    ) -> RepositoryResult<()> {
        self.inner.insert_row_error(upload_id, row_number, message).await
    }

    async fn finish_upload(&self, upload_id: i64, summary: &RunSummary) -> RepositoryResult<()> {
        self.inner.finish_upload(upload_id, summary).await
    }

    fn integrity_guard(&self) -> RepositoryResult<IntegrityGuard> {
        self.inner.integrity_guard()
    }
}

#[tokio::test]
async fn test_lost_candidate_surfaces_as_hard_row_error() {
    logging::init_test();
    let (dir, db_path) = create_test_db();
    let conn = rusqlite::Connection::open(&db_path).unwrap();

    let xlsx = dir.path().join("prices.xlsx");
    write_xlsx(
        &xlsx,
        &[
            header_row(),
            price_row("OWN-1", "NEW-1", "", "BOSCH", "", 10.0, 1.0, ""),
            price_row("OWN-2", "NEW-2", "", "BOSCH", "", 20.0, 2.0, ""),
        ],
    );

    let upload_id = insert_upload(
        &conn,
        &UploadSeed {
            file_path: xlsx.to_string_lossy().to_string(),
            ..Default::default()
        },
    );

    let repo = DroppingRepo {
        inner: PriceListRepositoryImpl::new(&db_path).unwrap(),
    };
    let summary = IngestionOrchestrator::new(repo)
        .run_by_id(upload_id)
        .await
        .unwrap();

    // 候选“成功”但丢失 → 第二遍仍未命中 → 每个挂起行一条硬性行错误
    assert_eq!(summary.creates_flushed, 2);
    assert_eq!(summary.rows_loaded, 0);
    assert_eq!(summary.rows_error, 2);

    assert_eq!(count_rows(&conn, "prices"), 0);
    assert_eq!(count_rows(&conn, "price_list_upload_rows"), 2);

    let text: String = conn
        .query_row(
            "SELECT text FROM price_list_upload_rows ORDER BY no_row LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(text, price_list_loader::i18n::t("ingest.catalog_still_missing"));
}

// ==========================================
// Worker 消费流程集成测试
// ==========================================
// 测试目标: 队列消息 → 上传加载 → 摄取运行 → 任务回执 的完整链路
// ==========================================


use price_list_loader::{
    logging, IngestionOrchestrator, PriceListRepositoryImpl, QueueMessage, TaskStatus, UploadQueue,
};
use rusqlite::params;
use test_helpers::*;

#[tokio::test]
async fn test_queue_message_drives_full_ingestion() {
    logging::init_test();
    let (dir, db_path) = create_test_db();
    let conn = rusqlite::Connection::open(&db_path).unwrap();

    insert_catalog_entry(&conn, "A100", "BOSCH", None, None);

    let xlsx = dir.path().join("prices.xlsx");
    write_xlsx(
        &xlsx,
        &[
            header_row(),
            price_row("OWN-9", "A100", "", "BOSCH", "", 100.0, 5.0, ""),
        ],
    );

    let upload_id = insert_upload(
        &conn,
        &UploadSeed {
            file_path: xlsx.to_string_lossy().to_string(),
            ..Default::default()
        },
    );

    // Worker 主循环的单次迭代
    let repo = PriceListRepositoryImpl::new(&db_path).unwrap();
    let queue = UploadQueue::new(repo.connection()).unwrap();
    let orchestrator = IngestionOrchestrator::new(repo);

    queue.enqueue(upload_id).unwrap();
    let task = queue.claim_next().unwrap().expect("queue should hold one task");

    let message: QueueMessage = serde_json::from_str(&task.payload).unwrap();
    assert_eq!(message.upload_id, upload_id);

    let summary = orchestrator.run_by_id(message.upload_id).await.unwrap();
    queue.mark_completed(&task.task_id).unwrap();

    assert_eq!(summary.rows_loaded, 1);
    assert_eq!(count_rows(&conn, "prices"), 1);

    let status: String = conn
        .query_row(
            "SELECT status FROM price_list_upload_queue WHERE task_id = ?1",
            params![task.task_id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(TaskStatus::from_str(&status), TaskStatus::Completed);
    assert!(queue.claim_next().unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_queue_payload_detected() {
    logging::init_test();
    let (_dir, db_path) = create_test_db();

    let repo = PriceListRepositoryImpl::new(&db_path).unwrap();
    let queue = UploadQueue::new(repo.connection()).unwrap();

    // 绕过 enqueue 塞入坏载荷（消息格式是外部契约，可能被破坏）
    {
        let conn = repo.connection();
        let guard = conn.lock().unwrap();
        guard
            .execute(
                r#"
                INSERT INTO price_list_upload_queue (task_id, payload, status, created_at)
                VALUES ('bad-task', 'not a json', 'PENDING', '2024-01-01T00:00:00Z')
                "#,
                [],
            )
            .unwrap();
    }

    let task = queue.claim_next().unwrap().unwrap();
    let parsed = serde_json::from_str::<QueueMessage>(&task.payload);
    assert!(parsed.is_err());

    queue.mark_failed(&task.task_id, "队列消息格式错误").unwrap();

    let (status, error_message): (String, Option<String>) = {
        let conn = repo.connection();
        let guard = conn.lock().unwrap();
        guard
            .query_row(
                "SELECT status, error_message FROM price_list_upload_queue WHERE task_id = 'bad-task'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap()
    };
    assert_eq!(TaskStatus::from_str(&status), TaskStatus::Failed);
    assert_eq!(error_message.as_deref(), Some("队列消息格式错误"));
}

#[tokio::test]
async fn test_failed_run_leaves_task_failed_and_queue_consumable() {
    logging::init_test();
    let (dir, db_path) = create_test_db();
    let conn = rusqlite::Connection::open(&db_path).unwrap();

    // 任务一指向不支持的文件，任务二正常
    let docx = dir.path().join("prices.docx");
    std::fs::write(&docx, b"nope").unwrap();
    let bad_upload = insert_upload(
        &conn,
        &UploadSeed {
            file_basename: "prices.docx".to_string(),
            file_path: docx.to_string_lossy().to_string(),
            ..Default::default()
        },
    );

    insert_catalog_entry(&conn, "A100", "BOSCH", None, None);
    let xlsx = dir.path().join("prices.xlsx");
    write_xlsx(
        &xlsx,
        &[
            header_row(),
            price_row("OWN-9", "A100", "", "BOSCH", "", 10.0, 1.0, ""),
        ],
    );
    let good_upload = insert_upload(
        &conn,
        &UploadSeed {
            file_path: xlsx.to_string_lossy().to_string(),
            ..Default::default()
        },
    );

    let repo = PriceListRepositoryImpl::new(&db_path).unwrap();
    let queue = UploadQueue::new(repo.connection()).unwrap();
    let orchestrator = IngestionOrchestrator::new(repo);

    queue.enqueue(bad_upload).unwrap();
    queue.enqueue(good_upload).unwrap();

    // SkipJob 策略下的两次循环迭代
    let task = queue.claim_next().unwrap().unwrap();
    let message: QueueMessage = serde_json::from_str(&task.payload).unwrap();
    let result = orchestrator.run_by_id(message.upload_id).await;
    assert!(result.is_err());
    queue.mark_failed(&task.task_id, &result.unwrap_err().to_string()).unwrap();

    let task = queue.claim_next().unwrap().unwrap();
    let message: QueueMessage = serde_json::from_str(&task.payload).unwrap();
    let summary = orchestrator.run_by_id(message.upload_id).await.unwrap();
    queue.mark_completed(&task.task_id).unwrap();

    assert_eq!(summary.rows_loaded, 1);
    assert_eq!(count_rows(&conn, "prices"), 1);
}

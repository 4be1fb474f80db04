// ==========================================
// 价格表导入服务 - Worker 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 流程: 轮询上传任务队列 → 按消息中的 upload_id 运行摄取编排器
// ==========================================

use price_list_loader::config::{FatalPolicy, WorkerConfig};
use price_list_loader::ingest::IngestError;
use price_list_loader::{
    db, logging, IngestionOrchestrator, PriceListRepositoryImpl, QueueMessage, UploadQueue,
    UploadTask,
};
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // .env 仅用于本地/部署参数，缺失时静默跳过
    dotenvy::dotenv().ok();

    // 初始化日志系统
    logging::init();

    // 行级错误文案语言（默认中文）
    let locale = std::env::var("PRICE_LIST_LOCALE").unwrap_or_else(|_| "zh-CN".to_string());
    price_list_loader::i18n::set_locale(&locale);

    info!("==================================================");
    info!("{} - 报价数据摄取管道", price_list_loader::APP_NAME);
    info!("系统版本: {}", price_list_loader::VERSION);
    info!("==================================================");

    let config = WorkerConfig::from_env();
    info!(db_path = %config.db_path, poll_ms = config.poll_interval_ms, "使用数据库");

    let repo = PriceListRepositoryImpl::new(&config.db_path).expect("无法初始化数据仓储");

    // 建表幂等，首次运行与测试环境直接可用
    {
        let conn = repo.connection();
        let guard = conn.lock().expect("连接锁已污染");
        db::init_schema(&guard).expect("无法初始化数据库结构");
    }

    let queue = UploadQueue::new(repo.connection()).expect("无法初始化上传任务队列");
    let orchestrator = IngestionOrchestrator::new(repo);

    info!("开始消费上传任务队列");
    loop {
        let task = match queue.claim_next() {
            Ok(task) => task,
            Err(e) => {
                error!(error = %e, "队列领取失败");
                tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
                continue;
            }
        };

        let Some(task) = task else {
            tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
            continue;
        };

        if let Err(e) = process_task(&orchestrator, &queue, &task).await {
            error!(task_id = %task.task_id, error = %e, "上传任务处理失败");
            if let Err(mark_err) = queue.mark_failed(&task.task_id, &e.to_string()) {
                error!(task_id = %task.task_id, error = %mark_err, "任务失败回执写入失败");
            }

            match config.fatal_policy {
                FatalPolicy::HaltProcess => {
                    // 宁可停摆也不静默丢批：运行级错误默认终止整个 Worker
                    error!("按 HaltProcess 策略终止 Worker");
                    std::process::exit(1);
                }
                FatalPolicy::SkipJob => continue,
            }
        }
    }
}

/// 处理一个已领取的队列任务
async fn process_task<R: price_list_loader::PriceListRepository>(
    orchestrator: &IngestionOrchestrator<R>,
    queue: &UploadQueue,
    task: &UploadTask,
) -> Result<(), IngestError> {
    info!(task_id = %task.task_id, payload = %task.payload, "领取上传任务");

    let message: QueueMessage = serde_json::from_str(&task.payload)
        .map_err(|e| IngestError::QueueMessageInvalid(e.to_string()))?;

    let summary = orchestrator.run_by_id(message.upload_id).await?;

    queue
        .mark_completed(&task.task_id)
        .map_err(IngestError::Repository)?;

    info!(
        task_id = %task.task_id,
        upload_id = message.upload_id,
        rows_loaded = summary.rows_loaded,
        rows_error = summary.rows_error,
        "上传任务完成"
    );

    Ok(())
}

// ==========================================
// 价格表导入服务 - Worker 配置
// ==========================================
// 职责: 从环境变量装配 Worker 运行参数（.env 由入口加载）
// ==========================================

use std::path::PathBuf;

/// 默认队列轮询间隔（毫秒）
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

// ==========================================
// FatalPolicy - 运行级错误的进程策略
// ==========================================
// 运行级错误必然终止当前上传；是否连带终止整个 Worker 进程
// 由该策略显式决定。默认 HaltProcess：宁可停摆也不静默丢批。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalPolicy {
    /// 终止整个 Worker 进程
    HaltProcess,
    /// 放弃当前任务，继续消费队列
    SkipJob,
}

impl FatalPolicy {
    pub fn from_env_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "skip" | "skip_job" => FatalPolicy::SkipJob,
            _ => FatalPolicy::HaltProcess,
        }
    }
}

// ==========================================
// WorkerConfig - Worker 运行参数
// ==========================================
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// 数据库文件路径
    pub db_path: String,
    /// 队列轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 运行级错误的进程策略
    pub fatal_policy: FatalPolicy,
}

impl WorkerConfig {
    /// 从环境变量装配配置
    ///
    /// # 环境变量
    /// - PRICE_LIST_DB_PATH: 数据库路径（默认见 default_db_path）
    /// - PRICE_LIST_POLL_MS: 轮询间隔毫秒
    /// - PRICE_LIST_FATAL_POLICY: halt（默认）或 skip
    pub fn from_env() -> Self {
        let db_path = default_db_path();

        let poll_interval_ms = std::env::var("PRICE_LIST_POLL_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        let fatal_policy = std::env::var("PRICE_LIST_FATAL_POLICY")
            .map(|v| FatalPolicy::from_env_value(&v))
            .unwrap_or(FatalPolicy::HaltProcess);

        Self {
            db_path,
            poll_interval_ms,
            fatal_policy,
        }
    }
}

/// 解析数据库文件路径
///
/// 优先级: 环境变量显式指定 > 用户数据目录 > 当前目录回退
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var("PRICE_LIST_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./price_lists.db");

    if let Some(data_dir) = dirs::data_dir() {
        path = data_dir.join("price-list-loader");
        if std::fs::create_dir_all(&path).is_ok() {
            path = path.join("price_lists.db");
        } else {
            path = PathBuf::from("./price_lists.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_policy_parsing() {
        assert_eq!(FatalPolicy::from_env_value("skip"), FatalPolicy::SkipJob);
        assert_eq!(FatalPolicy::from_env_value("SKIP_JOB"), FatalPolicy::SkipJob);
        assert_eq!(FatalPolicy::from_env_value("halt"), FatalPolicy::HaltProcess);
        // 未知取默认
        assert_eq!(FatalPolicy::from_env_value("??"), FatalPolicy::HaltProcess);
    }

    #[test]
    fn test_default_db_path_not_empty() {
        let path = default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }
}

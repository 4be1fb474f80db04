// ==========================================
// 价格表导入服务 - 上传任务领域模型
// ==========================================
// 职责: 一次价格表上传的全量描述（文件位置/定价参数/列映射/行游标）
// 用途: 按队列消息中的 upload_id 从存储加载一次，运行期内不可变
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// UploadStatus - 上传记录状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    /// 已入队，等待处理
    Queued,
    /// 处理中
    Loading,
    /// 已加载完成
    Loaded,
    /// 加载失败
    Failed,
}

impl UploadStatus {
    pub fn as_i32(&self) -> i32 {
        match self {
            UploadStatus::Queued => 0,
            UploadStatus::Loading => 1,
            UploadStatus::Loaded => 2,
            UploadStatus::Failed => 3,
        }
    }

    pub fn from_i32(v: i32) -> Self {
        match v {
            1 => UploadStatus::Loading,
            2 => UploadStatus::Loaded,
            3 => UploadStatus::Failed,
            _ => UploadStatus::Queued,
        }
    }
}

// ==========================================
// Upload - 上传记录
// ==========================================
// 对齐: price_list_uploads 表
// 说明: col_delimiter/character_set 面向文本类容器格式预留，
//       当前 .xlsx 路径不消费这两个字段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    // ===== 主键与归属 =====
    pub id: i64,            // 上传记录 ID
    pub price_list_id: i64, // 归属价格表 ID
    pub status: i32,        // 记录状态（UploadStatus）

    // ===== 文件信息 =====
    pub file_basename: String, // 原始文件名（不含路径）
    pub file_name: String,     // 存储文件名
    pub file_path: String,     // 文件完整路径
    pub file_size: f64,        // 文件大小（字节）

    // ===== 定价参数 =====
    pub brand: Option<String>, // 文件级品牌覆盖（为空则品牌取列）
    pub currency: String,      // 货币代码
    pub currency_value: f64,   // 货币换算系数
    pub markup: f64,           // 加价系数

    // ===== 解析参数 =====
    pub col_delimiter: String,         // 列分隔符（文本格式预留）
    pub character_set: String,         // 字符集（文本格式预留）
    pub comment_price: Option<String>, // 默认备注文案（无备注列时使用）
    pub columns_config: String,        // 列映射 JSON 载荷
    pub start_row: i64,                // 数据起始行（1 起）

    // ===== 计数器与审计 =====
    pub rows: i64,                 // 扫描行数
    pub rows_loaded: i64,          // 已加载行数
    pub rows_error: i64,           // 错误行数
    pub loaded_at: Option<String>, // 加载完成时间
    pub created_by: i64,           // 创建人 ID
}

impl Upload {
    /// 文件级品牌覆盖（空字符串视为未设置）
    pub fn brand_override(&self) -> Option<&str> {
        self.brand
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }

    /// 默认备注文案（空字符串视为未设置）
    pub fn default_comment(&self) -> Option<&str> {
        self.comment_price
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

// ==========================================
// ColumnMapping - 列映射
// ==========================================
// 语义字段名 → 1 起列号；0/缺省 = 该字段在文件中不存在
// 必填位: code / price / amount / owner_id；brand 在无文件级覆盖时必填
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default)]
    pub owner_id: usize,
    #[serde(default)]
    pub code: usize,
    #[serde(default)]
    pub replace_code: usize,
    #[serde(default)]
    pub brand: usize,
    #[serde(default)]
    pub description: usize,
    #[serde(default)]
    pub price: usize,
    #[serde(default)]
    pub amount: usize,
    #[serde(default)]
    pub comment: usize,
}

impl ColumnMapping {
    /// 解析列映射 JSON 载荷（每次上传解析一次）
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }

    /// 校验必填列位是否齐备
    ///
    /// # 参数
    /// - has_brand_override: 上传是否带文件级品牌覆盖
    ///
    /// # 返回
    /// - Err(message): 首个缺失的必填列位
    pub fn validate(&self, has_brand_override: bool) -> Result<(), String> {
        if self.code == 0 {
            return Err("缺少必填列位: code".to_string());
        }
        if self.price == 0 {
            return Err("缺少必填列位: price".to_string());
        }
        if self.amount == 0 {
            return Err("缺少必填列位: amount".to_string());
        }
        if self.owner_id == 0 {
            return Err("缺少必填列位: owner_id".to_string());
        }
        if self.brand == 0 && !has_brand_override {
            return Err("缺少必填列位: brand（且无文件级品牌覆盖）".to_string());
        }
        Ok(())
    }
}

// ==========================================
// RunSummary - 单次运行汇总
// ==========================================
// Done 态对调用方可见的计数；同时用于回写上传记录的计数器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// 扫描过的行数（起始行之后、跳过全空行）
    pub rows_scanned: usize,
    /// 成功写入价格表的行数
    pub rows_loaded: usize,
    /// 记录为行错误的行数
    pub rows_error: usize,
    /// 本次补建的目录条目数
    pub creates_flushed: usize,
}

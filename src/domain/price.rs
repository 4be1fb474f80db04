// ==========================================
// 价格表导入服务 - 价格行领域模型
// ==========================================
// 职责: 行解析的中间结构与最终价格落库记录
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// RawPriceRecord - 行解析中间结构
// ==========================================
// 用途: 摄取管道中间产物（单元格读取 → 类型转换 → 此结构）
// 生命周期: 仅在一次上传运行内
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPriceRecord {
    pub row_number: usize, // 文件内行号（1 起）

    // ===== 商品身份 =====
    pub owner_id: String,             // 货主编号
    pub code: String,                 // 商品编码（非空）
    pub replace_code: Option<String>, // 替换编码
    pub brand: String,                // 品牌（列或文件级覆盖，非空）
    pub description: Option<String>,  // 商品描述

    // ===== 报价 =====
    pub price: f64,              // 原始价（换算前）
    pub amount: i64,             // 数量
    pub comment: Option<String>, // 备注
}

// ==========================================
// PriceInsertRecord - 价格落库记录
// ==========================================
// 对齐: prices 表
// 构建后不可变，按批次累积落库
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceInsertRecord {
    pub nomenclature_id: i64, // 目录条目 ID
    pub price_list_id: i64,
    pub upload_id: i64,
    pub owner_id: String,
    pub code: String,                 // 取目录条目的编码
    pub replace_code: Option<String>, // 取目录条目的替换编码
    pub description: Option<String>,  // 取目录条目的描述
    pub price: f64,                   // 计算价 = 原始价 × 货币系数 × 加价系数
    pub price_default: f64,           // 原始价
    pub amount: i64,
    pub comment: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// 价格表导入服务 - 商品目录领域模型
// ==========================================
// 职责: 参考目录条目及其“待补建”候选
// 用途: 目录按 (code, brand) 唯一；本管道只读或新建，从不更新
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// CatalogEntry - 目录条目
// ==========================================
// 对齐: nomenclatures 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,                      // 内部标识
    pub code: String,                 // 商品编码
    pub replace_code: Option<String>, // 替换编码
    pub brand: String,                // 品牌
    pub description: Option<String>,  // 商品描述
}

// ==========================================
// PendingCreate - 待补建目录候选
// ==========================================
// 生命周期: 第一遍扫描目录未命中时产生，flush 落库后整体清空；
// 落库后必须能按 (code, brand) 命中
// 说明: 不做去重——同一新 (code, brand) 的两行各产生一个候选，
//       在 (code, brand) 唯一约束上由 flush 失败暴露
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCreate {
    pub code: String,
    pub replace_code: Option<String>,
    pub brand: String,
    pub description: Option<String>,
    pub created_by: i64, // 补建人（取上传创建人）
}

impl PendingCreate {
    /// 由行字段构造候选
    pub fn new(
        code: impl Into<String>,
        replace_code: Option<String>,
        brand: impl Into<String>,
        description: Option<String>,
        created_by: i64,
    ) -> Self {
        Self {
            code: code.into(),
            replace_code,
            brand: brand.into(),
            description,
            created_by,
        }
    }
}

// ==========================================
// 价格表导入服务 - 价格行构建器
// ==========================================
// 职责: 由目录条目 + 行字段 + 上传级定价参数生成落库记录
// 计算: price = price_default × currency_value × markup（直接浮点乘法，不舍入）
// 说明: 负价/零数量等领域校验在当前行为中不存在，解析成功即入库
// ==========================================

use crate::domain::{CatalogEntry, PriceInsertRecord, RawPriceRecord, Upload};
use chrono::Utc;

pub struct PriceRowBuilder {
    price_list_id: i64,
    upload_id: i64,
    currency_value: f64,
    markup: f64,
    created_by: i64,
}

impl PriceRowBuilder {
    /// 由上传记录提取定价参数
    pub fn new(upload: &Upload) -> Self {
        Self {
            price_list_id: upload.price_list_id,
            upload_id: upload.id,
            currency_value: upload.currency_value,
            markup: upload.markup,
            created_by: upload.created_by,
        }
    }

    /// 构建一条价格落库记录
    ///
    /// 编码/替换编码/描述取目录条目（而非行字段），保证与目录一致
    pub fn build(&self, entry: &CatalogEntry, record: &RawPriceRecord) -> PriceInsertRecord {
        PriceInsertRecord {
            nomenclature_id: entry.id,
            price_list_id: self.price_list_id,
            upload_id: self.upload_id,
            owner_id: record.owner_id.clone(),
            code: entry.code.clone(),
            replace_code: entry.replace_code.clone(),
            description: entry.description.clone(),
            price: record.price * self.currency_value * self.markup,
            price_default: record.price,
            amount: record.amount,
            comment: record.comment.clone(),
            created_by: self.created_by,
            created_at: Utc::now(),
        }
    }
}

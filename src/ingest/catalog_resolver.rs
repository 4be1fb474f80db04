// ==========================================
// 价格表导入服务 - 目录解析器
// ==========================================
// 职责: 按 (code, brand) 精确匹配解析商品身份
// 契约: 未命中不是错误——它是第一遍扫描挂起该行的触发条件
// ==========================================

use crate::domain::{CatalogEntry, PendingCreate, RawPriceRecord};
use crate::repository::{PriceListRepository, RepositoryResult};

// ==========================================
// Resolution - 解析结果
// ==========================================
#[derive(Debug, Clone)]
pub enum Resolution {
    /// 命中已有目录条目
    Hit(CatalogEntry),
    /// 未命中；携带可直接入批的补建候选
    Miss(PendingCreate),
}

pub struct CatalogResolver<'a, R: PriceListRepository> {
    repo: &'a R,
}

impl<'a, R: PriceListRepository> CatalogResolver<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// 解析一行的商品身份
    ///
    /// # 参数
    /// - record: 已解析的行字段
    /// - created_by: 未命中时补建候选的创建人
    ///
    /// # 返回
    /// - Ok(Hit): 目录命中
    /// - Ok(Miss): 目录未命中，候选由行字段构成
    /// - Err: 存储访问失败（运行级）
    pub async fn resolve(
        &self,
        record: &RawPriceRecord,
        created_by: i64,
    ) -> RepositoryResult<Resolution> {
        match self
            .repo
            .find_catalog_entry(&record.code, &record.brand)
            .await?
        {
            Some(entry) => Ok(Resolution::Hit(entry)),
            None => Ok(Resolution::Miss(PendingCreate::new(
                record.code.clone(),
                record.replace_code.clone(),
                record.brand.clone(),
                record.description.clone(),
                created_by,
            ))),
        }
    }
}

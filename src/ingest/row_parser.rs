// ==========================================
// 价格表导入服务 - 行解析器
// ==========================================
// 职责: 按列映射从一行类型化单元格提取行字段
// 契约: 单行快速失败——首个失败字段即产生 RowIssue，该行不再继续
// 说明: 品牌可被上传记录的文件级覆盖取代，此时品牌列被忽略
// ==========================================

use crate::domain::{ColumnMapping, RawPriceRecord, Upload};
use crate::i18n::t;
use crate::ingest::error::RowIssue;
use calamine::Data;

/// 单元格读取结果
///
/// Unreadable = 单元格本身不可读（错误单元格），Unparsable = 文本无法转换为目标类型
enum CellFailure {
    Unreadable,
    Unparsable,
}

pub struct RowParser {
    mapping: ColumnMapping,
    brand_override: Option<String>,
    default_comment: Option<String>,
}

impl RowParser {
    /// 由上传记录与已校验的列映射构造解析器
    pub fn new(upload: &Upload, mapping: ColumnMapping) -> Self {
        Self {
            mapping,
            brand_override: upload.brand_override().map(str::to_string),
            default_comment: upload.default_comment().map(str::to_string),
        }
    }

    /// 解析一行
    ///
    /// # 参数
    /// - row_number: 文件内行号（1 起，用于错误上报）
    /// - cells: 该行的类型化单元格
    ///
    /// # 返回
    /// - Ok(RawPriceRecord): 全部字段提取成功
    /// - Err(RowIssue): 首个失败字段的行级错误
    pub fn parse(&self, row_number: usize, cells: &[Data]) -> Result<RawPriceRecord, RowIssue> {
        let issue = |key: &str| RowIssue::new(row_number, t(key));

        // 品牌: 文件级覆盖优先，否则取品牌列
        let brand = match &self.brand_override {
            Some(b) => b.clone(),
            None => self
                .text_at(cells, self.mapping.brand)
                .map_err(|_| issue("ingest.brand_format"))?
                .unwrap_or_default(),
        };

        let code = self
            .text_at(cells, self.mapping.code)
            .map_err(|_| issue("ingest.code_format"))?
            .unwrap_or_default();

        // 编码与品牌共同构成商品身份，缺一不可
        if code.is_empty() || brand.is_empty() {
            return Err(issue("ingest.identity_missing"));
        }

        let replace_code = self
            .optional_text_at(cells, self.mapping.replace_code)
            .map_err(|_| issue("ingest.replace_code_format"))?;

        let description = self
            .optional_text_at(cells, self.mapping.description)
            .map_err(|_| issue("ingest.description_format"))?;

        let price = self.f64_at(cells, self.mapping.price).map_err(|f| match f {
            CellFailure::Unreadable => issue("ingest.price_format"),
            CellFailure::Unparsable => issue("ingest.price_undefined"),
        })?;

        let amount = self.i64_at(cells, self.mapping.amount).map_err(|f| match f {
            CellFailure::Unreadable => issue("ingest.amount_format"),
            CellFailure::Unparsable => issue("ingest.amount_undefined"),
        })?;

        let owner_id = self
            .text_at(cells, self.mapping.owner_id)
            .map_err(|_| issue("ingest.owner_format"))?
            .unwrap_or_default();
        if owner_id.is_empty() {
            return Err(issue("ingest.owner_missing"));
        }

        let comment = self
            .optional_text_at(cells, self.mapping.comment)
            .map_err(|_| issue("ingest.comment_format"))?
            .or_else(|| self.default_comment.clone());

        Ok(RawPriceRecord {
            row_number,
            owner_id,
            code,
            replace_code,
            brand,
            description,
            price,
            amount,
            comment,
        })
    }

    // ===== 单元格读取辅助 =====

    /// 取 1 起列号对应的单元格；列号 0 或行宽不足 = 单元格不存在
    fn cell_at<'a>(&self, cells: &'a [Data], pos: usize) -> Option<&'a Data> {
        if pos == 0 {
            return None;
        }
        cells.get(pos - 1)
    }

    /// 文本字段: 缺失单元格视为空串，错误单元格视为不可读
    fn text_at(&self, cells: &[Data], pos: usize) -> Result<Option<String>, CellFailure> {
        match self.cell_at(cells, pos) {
            None => Ok(None),
            Some(cell) => text_value(cell).map(Some).ok_or(CellFailure::Unreadable),
        }
    }

    /// 可选文本字段: 仅在列位存在时读取，空串归一为 None
    fn optional_text_at(&self, cells: &[Data], pos: usize) -> Result<Option<String>, CellFailure> {
        Ok(self
            .text_at(cells, pos)?
            .filter(|s| !s.is_empty()))
    }

    fn f64_at(&self, cells: &[Data], pos: usize) -> Result<f64, CellFailure> {
        match self.cell_at(cells, pos) {
            None => Err(CellFailure::Unparsable),
            Some(Data::Float(f)) => Ok(*f),
            Some(Data::Int(i)) => Ok(*i as f64),
            Some(Data::Error(_)) => Err(CellFailure::Unreadable),
            Some(cell) => text_value(cell)
                .ok_or(CellFailure::Unreadable)?
                .parse::<f64>()
                .map_err(|_| CellFailure::Unparsable),
        }
    }

    fn i64_at(&self, cells: &[Data], pos: usize) -> Result<i64, CellFailure> {
        match self.cell_at(cells, pos) {
            None => Err(CellFailure::Unparsable),
            Some(Data::Int(i)) => Ok(*i),
            Some(Data::Float(f)) if f.fract() == 0.0 => Ok(*f as i64),
            Some(Data::Float(_)) => Err(CellFailure::Unparsable),
            Some(Data::Error(_)) => Err(CellFailure::Unreadable),
            Some(cell) => text_value(cell)
                .ok_or(CellFailure::Unreadable)?
                .parse::<i64>()
                .map_err(|_| CellFailure::Unparsable),
        }
    }
}

/// 单元格的文本呈现（数值编码列常见，如编码 12345 存为数值单元格）
fn text_value(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => Some(String::new()),
        Data::String(s) => Some(s.trim().to_string()),
        Data::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::Error(_) => None,
        // 日期/时长单元格按显示值处理
        other => Some(other.to_string().trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    fn upload(brand: Option<&str>, comment_price: Option<&str>) -> Upload {
        Upload {
            id: 1,
            price_list_id: 10,
            status: 0,
            file_basename: "prices.xlsx".to_string(),
            file_name: "prices.xlsx".to_string(),
            file_path: "/tmp/prices.xlsx".to_string(),
            file_size: 0.0,
            brand: brand.map(str::to_string),
            currency: "EUR".to_string(),
            currency_value: 1.0,
            markup: 1.0,
            col_delimiter: ";".to_string(),
            character_set: "utf-8".to_string(),
            comment_price: comment_price.map(str::to_string),
            columns_config: String::new(),
            start_row: 1,
            rows: 0,
            rows_loaded: 0,
            rows_error: 0,
            loaded_at: None,
            created_by: 7,
        }
    }

    fn full_mapping() -> ColumnMapping {
        ColumnMapping {
            owner_id: 1,
            code: 2,
            replace_code: 3,
            brand: 4,
            description: 5,
            price: 6,
            amount: 7,
            comment: 8,
        }
    }

    fn full_row() -> Vec<Data> {
        vec![
            Data::String("OWN-9".to_string()),
            Data::String("A100".to_string()),
            Data::String("A100R".to_string()),
            Data::String("BOSCH".to_string()),
            Data::String("Oil filter".to_string()),
            Data::Float(100.0),
            Data::Float(5.0),
            Data::String("in stock".to_string()),
        ]
    }

    #[test]
    fn test_parse_full_row() {
        let parser = RowParser::new(&upload(None, None), full_mapping());
        let record = parser.parse(3, &full_row()).unwrap();

        assert_eq!(record.row_number, 3);
        assert_eq!(record.owner_id, "OWN-9");
        assert_eq!(record.code, "A100");
        assert_eq!(record.replace_code.as_deref(), Some("A100R"));
        assert_eq!(record.brand, "BOSCH");
        assert_eq!(record.description.as_deref(), Some("Oil filter"));
        assert_eq!(record.price, 100.0);
        assert_eq!(record.amount, 5);
        assert_eq!(record.comment.as_deref(), Some("in stock"));
    }

    #[test]
    fn test_brand_override_wins_over_column() {
        let parser = RowParser::new(&upload(Some("MANN"), None), full_mapping());
        let record = parser.parse(1, &full_row()).unwrap();
        assert_eq!(record.brand, "MANN");
    }

    #[test]
    fn test_empty_code_is_identity_error() {
        let mut row = full_row();
        row[1] = Data::Empty;
        let parser = RowParser::new(&upload(None, None), full_mapping());

        let issue = parser.parse(5, &row).unwrap_err();
        assert_eq!(issue.row_number, 5);
        assert_eq!(issue.message, t("ingest.identity_missing"));
    }

    #[test]
    fn test_numeric_code_cell_reads_as_text() {
        let mut row = full_row();
        row[1] = Data::Float(123456.0);
        let parser = RowParser::new(&upload(None, None), full_mapping());

        let record = parser.parse(1, &row).unwrap();
        assert_eq!(record.code, "123456");
    }

    #[test]
    fn test_unparsable_price_is_row_issue() {
        let mut row = full_row();
        row[5] = Data::String("n/a".to_string());
        let parser = RowParser::new(&upload(None, None), full_mapping());

        let issue = parser.parse(2, &row).unwrap_err();
        assert_eq!(issue.message, t("ingest.price_undefined"));
    }

    #[test]
    fn test_error_cell_price_is_format_issue() {
        let mut row = full_row();
        row[5] = Data::Error(CellErrorType::Value);
        let parser = RowParser::new(&upload(None, None), full_mapping());

        let issue = parser.parse(2, &row).unwrap_err();
        assert_eq!(issue.message, t("ingest.price_format"));
    }

    #[test]
    fn test_fractional_amount_is_row_issue() {
        let mut row = full_row();
        row[6] = Data::Float(2.5);
        let parser = RowParser::new(&upload(None, None), full_mapping());

        let issue = parser.parse(4, &row).unwrap_err();
        assert_eq!(issue.message, t("ingest.amount_undefined"));
    }

    #[test]
    fn test_string_price_with_decimal_point() {
        let mut row = full_row();
        row[5] = Data::String("99.90".to_string());
        let parser = RowParser::new(&upload(None, None), full_mapping());

        let record = parser.parse(1, &row).unwrap();
        assert_eq!(record.price, 99.90);
    }

    #[test]
    fn test_missing_owner_is_row_issue() {
        let mut row = full_row();
        row[0] = Data::Empty;
        let parser = RowParser::new(&upload(None, None), full_mapping());

        let issue = parser.parse(6, &row).unwrap_err();
        assert_eq!(issue.message, t("ingest.owner_missing"));
    }

    #[test]
    fn test_short_row_missing_price_cell() {
        // 行宽不足时，缺失的必填数值单元格等价于无法确定
        let row = full_row()[..4].to_vec();
        let parser = RowParser::new(&upload(None, None), full_mapping());

        let issue = parser.parse(7, &row).unwrap_err();
        assert_eq!(issue.message, t("ingest.price_undefined"));
    }

    #[test]
    fn test_default_comment_applies_when_column_absent() {
        let mut mapping = full_mapping();
        mapping.comment = 0;
        let parser = RowParser::new(&upload(None, Some("retail price")), mapping);

        let record = parser.parse(1, &full_row()).unwrap();
        assert_eq!(record.comment.as_deref(), Some("retail price"));
    }

    #[test]
    fn test_optional_columns_absent() {
        let mapping = ColumnMapping {
            owner_id: 1,
            code: 2,
            replace_code: 0,
            brand: 3,
            description: 0,
            price: 4,
            amount: 5,
            comment: 0,
        };
        let row = vec![
            Data::String("OWN-1".to_string()),
            Data::String("B200".to_string()),
            Data::String("FEBI".to_string()),
            Data::Float(10.0),
            Data::Int(1),
        ];
        let parser = RowParser::new(&upload(None, None), mapping);

        let record = parser.parse(1, &row).unwrap();
        assert_eq!(record.replace_code, None);
        assert_eq!(record.description, None);
        assert_eq!(record.comment, None);
    }
}

// ==========================================
// 价格表导入服务 - 价格表文件读取
// ==========================================
// 职责: 扩展名准入 + 打开工作簿 + 物化首个工作表的行
// 支持: 仅 .xlsx；其他扩展名在进入扫描前即以致命错误拒绝
// ==========================================

use crate::ingest::error::{IngestError, IngestResult};
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;

/// 读取价格表文件的全部行（含表头区，行游标由调用方控制）
///
/// # 参数
/// - file_path: 上传文件路径
///
/// # 返回
/// - Ok(rows): 首个工作表的行，单元格保持类型化
/// - Err(UnsupportedFormat): 非 .xlsx 扩展名
pub fn read_rows(file_path: &Path) -> IngestResult<Vec<Vec<Data>>> {
    // 检查扩展名（先于任何文件读取）
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ext != "xlsx" {
        return Err(IngestError::UnsupportedFormat(ext));
    }

    // 检查文件存在
    if !file_path.exists() {
        return Err(IngestError::FileNotFound(
            file_path.display().to_string(),
        ));
    }

    // 打开 Excel 文件
    let mut workbook: Xlsx<_> = open_workbook(file_path)?;

    // 读取第一个 sheet
    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| IngestError::WorkbookParse("Excel 文件无工作表".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IngestError::WorkbookParse(e.to_string()))?;

    Ok(range.rows().map(|row| row.to_vec()).collect())
}

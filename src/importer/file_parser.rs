// ==========================================
// CRM 线索导入 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析（表头行 + 按位置对齐的数据行）
// 支持: CSV (.csv / 文本) / Excel (.xlsx/.xls)
// 说明: CSV 使用 csv crate 解析，引号内的逗号不会错列
// ==========================================

use crate::domain::import::{ParsedFile, RawRecord};
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为表头 + 原始行
    ///
    /// # 返回
    /// - Ok(ParsedFile): 至少包含一行数据
    /// - Err: 文件不存在、格式错误、内容不足
    fn parse_file(&self, file_path: &Path) -> ImportResult<ParsedFile>;
}

/// 检查文件存在
fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_string())
}

/// 由表格行（第一行为表头）组装解析结果
///
/// 完全空白的数据行被跳过，但行号仍按文件位置计数
fn assemble(file_name: Option<String>, mut rows: Vec<Vec<String>>) -> ImportResult<ParsedFile> {
    if rows.is_empty() {
        return Err(ImportError::EmptyInput);
    }

    let header_row = rows.remove(0);
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            let h = if idx == 0 { h.trim_start_matches('\u{feff}') } else { h.as_str() };
            h.trim().to_string()
        })
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::MissingHeaders);
    }

    let records: Vec<RawRecord> = rows
        .into_iter()
        .enumerate()
        .map(|(idx, cells)| RawRecord::new(idx + 1, cells))
        .filter(|r| !r.is_blank())
        .collect();

    if records.is_empty() {
        return Err(ImportError::EmptyInput);
    }

    let parsed = ParsedFile {
        file_name,
        headers,
        rows: records,
    };
    if let Some(dup) = parsed.duplicate_header() {
        return Err(ImportError::DuplicateHeader(dup.to_string()));
    }
    Ok(parsed)
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 从任意 Reader 解析 CSV
    pub fn parse_reader<R: Read>(
        &self,
        reader: R,
        file_name: Option<String>,
    ) -> ImportResult<ParsedFile> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        assemble(file_name, rows)
    }

    /// 从已上传的文本内容解析 CSV
    pub fn parse_text(&self, content: &str) -> ImportResult<ParsedFile> {
        self.parse_reader(content.as_bytes(), None)
    }
}

impl FileParser for CsvParser {
    fn parse_file(&self, file_path: &Path) -> ImportResult<ParsedFile> {
        ensure_exists(file_path)?;

        // 检查扩展名
        if let Some(ext) = file_path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(file_path)?;
        self.parse_reader(file, file_name_of(file_path))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 只读取第一个工作表
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_file(&self, file_path: &Path) -> ImportResult<ParsedFile> {
        ensure_exists(file_path)?;

        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        assemble(file_name_of(file_path), rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_file(&self, file_path: &Path) -> ImportResult<ParsedFile> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" | "txt" => {
                ensure_exists(file_path)?;
                let file = File::open(file_path)?;
                CsvParser.parse_reader(file, file_name_of(file_path))
            }
            "xlsx" | "xls" => ExcelParser.parse_file(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

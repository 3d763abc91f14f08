// ==========================================
// CRM 线索导入 - 导入过程领域模型
// ==========================================
// 职责: 原始行 / 列映射 / 校验产物 / 导入结果
// 红线: 单次导入独占自身状态，不跨批次共享
// ==========================================

use crate::domain::types::MappingTarget;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ==========================================
// RawRecord - 原始行记录
// ==========================================
// 按位置与表头对齐，解析后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub row_number: usize,  // 数据行号（从 1 开始，不含表头）
    pub cells: Vec<String>, // 单元格（原样保留）
}

impl RawRecord {
    pub fn new(row_number: usize, cells: Vec<String>) -> Self {
        Self { row_number, cells }
    }

    /// 按列位置取值，行长度不足时视为空
    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

// ==========================================
// ParsedFile - 文件解析产物
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedFile {
    pub file_name: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<RawRecord>,
}

impl ParsedFile {
    /// 第一个重复出现的非空表头（映射按列名寻址，列名必须唯一）
    pub fn duplicate_header(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.headers
            .iter()
            .map(String::as_str)
            .find(|h| !h.is_empty() && !seen.insert(*h))
    }
}

// ==========================================
// MappingEntry - 单列映射（两阶段值）
// ==========================================
// suggested: 自动匹配结果
// overridden: 用户显式选择，设置后不再重新推导
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub header: String,
    pub suggested: MappingTarget,
    pub overridden: Option<MappingTarget>,
}

impl MappingEntry {
    /// 生效的映射目标（用户选择优先）
    pub fn effective(&self) -> &MappingTarget {
        self.overridden.as_ref().unwrap_or(&self.suggested)
    }
}

// ==========================================
// HeaderMapping - 表头到目标字段的映射
// ==========================================
// 定义域恰为表头列表，entries[i] 对应第 i 列
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMapping {
    entries: Vec<MappingEntry>,
}

impl HeaderMapping {
    pub fn new(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.header.as_str())
    }

    /// 查询某表头的生效目标
    pub fn target_of(&self, header: &str) -> Option<&MappingTarget> {
        self.entries
            .iter()
            .find(|e| e.header == header)
            .map(MappingEntry::effective)
    }

    /// 设置用户覆写，表头不存在时返回 false
    pub fn set_override(&mut self, header: &str, target: MappingTarget) -> bool {
        match self.entries.iter_mut().find(|e| e.header == header) {
            Some(entry) => {
                entry.overridden = Some(target);
                true
            }
            None => false,
        }
    }

    /// 清除用户覆写，恢复自动建议
    pub fn clear_override(&mut self, header: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.header == header) {
            Some(entry) => {
                entry.overridden = None;
                true
            }
            None => false,
        }
    }

    /// 已被映射的目标字段（去重）
    pub fn mapped_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if let Some(id) = entry.effective().field_id() {
                if !fields.contains(&id) {
                    fields.push(id);
                }
            }
        }
        fields
    }

    /// 被多个表头映射的字段: (字段, 表头列表)，按字段首次出现顺序
    pub fn duplicate_fields(&self) -> Vec<(String, Vec<String>)> {
        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for entry in &self.entries {
            if let Some(id) = entry.effective().field_id() {
                match grouped.iter_mut().find(|(f, _)| f == id) {
                    Some((_, headers)) => headers.push(entry.header.clone()),
                    None => grouped.push((id.to_string(), vec![entry.header.clone()])),
                }
            }
        }
        grouped.retain(|(_, headers)| headers.len() > 1);
        grouped
    }
}

// ==========================================
// ImportRecord - 映射后的待导入记录
// ==========================================
// 字段 ID → 值（已 TRIM，空值不入表）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub row_number: usize,
    pub values: BTreeMap<String, String>,
}

impl ImportRecord {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, field_id: &str) -> Option<&str> {
        self.values.get(field_id).map(String::as_str)
    }

    pub fn set(&mut self, field_id: &str, value: String) {
        self.values.insert(field_id.to_string(), value);
    }
}

// ==========================================
// ErrorRow - 校验失败行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRow {
    pub original_cells: RawRecord,
    pub identifying_name: Option<String>, // 映射到 name 的单元格值（用于报告）
    pub error_message: String,
}

// ==========================================
// RowWarning - 软失败（已自动修正）
// ==========================================
// 不保留原始非法值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowWarning {
    pub row_number: usize,
    pub field_id: String,
    pub message: String,
}

// ==========================================
// ValidationReport - 校验结果划分
// ==========================================
// 每一行恰好落入 valid 或 errors 之一
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: Vec<ImportRecord>,
    pub errors: Vec<ErrorRow>,
    pub warnings: Vec<RowWarning>,
}

impl ValidationReport {
    pub fn total_rows(&self) -> usize {
        self.valid.len() + self.errors.len()
    }
}

// ==========================================
// ErrorDetail - 单行错误明细（报告用）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub row_index: usize,
    pub identifying_name: String,
    pub error_message: String,
}

impl From<&ErrorRow> for ErrorDetail {
    fn from(row: &ErrorRow) -> Self {
        ErrorDetail {
            row_index: row.original_cells.row_number,
            identifying_name: row.identifying_name.clone().unwrap_or_default(),
            error_message: row.error_message.clone(),
        }
    }
}

// ==========================================
// ImportOutcome - 一次批量写入的结果
// ==========================================
// 不变式: success_count + error_count == submitted_count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub batch_id: String,
    pub submitted_count: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub error_details: Option<Vec<ErrorDetail>>, // 可定位到行的失败明细
    pub batch_error: Option<String>,             // 整批失败时的汇总错误
}

impl ImportOutcome {
    pub fn is_batch_failure(&self) -> bool {
        self.batch_error.is_some()
    }
}

// ==========================================
// CRM 线索导入 - 结果报告器
// ==========================================
// 职责: 汇总成功/失败计数 + 错误明细 + CSV 错误报告
// 约束: 只读，不触发任何写入（报告文件除外）
// ==========================================

use crate::domain::import::{ErrorDetail, ErrorRow, ImportOutcome, ValidationReport};
use crate::importer::error::{ImportError, ImportResult};
use csv::{QuoteStyle, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

/// 错误报告表头
pub const ERROR_REPORT_HEADER: &str = "RowNumber,LeadName,Error";

// ==========================================
// ImportReport - 单次导入的最终报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: Option<String>,
    pub total_rows: usize,
    pub success_count: usize,
    pub error_count: usize,            // 校验失败 + 写入失败
    pub validation_error_count: usize, // 校验阶段被排除的行
    pub submission_error_count: usize, // 提交后未持久化的行
    pub corrected_count: usize,        // 软失败已修正的行
    pub batch_error: Option<String>,
    pub preview: Vec<ErrorDetail>, // 前 N 条错误
    pub details: Vec<ErrorDetail>, // 全部可定位错误
}

pub struct ResultReporter {
    preview_limit: usize,
}

impl ResultReporter {
    pub fn new(preview_limit: usize) -> Self {
        Self { preview_limit }
    }

    /// 仅依据执行结果生成报告
    pub fn summarize_outcome(&self, outcome: &ImportOutcome) -> ImportReport {
        self.build(&[], 0, outcome)
    }

    /// 合并校验结果与执行结果生成报告
    ///
    /// 明细顺序: 校验错误（按行号）在前，写入失败在后
    pub fn build_report(
        &self,
        validation: &ValidationReport,
        outcome: &ImportOutcome,
    ) -> ImportReport {
        self.build(&validation.errors, validation.warnings.len(), outcome)
    }

    fn build(
        &self,
        error_rows: &[ErrorRow],
        corrected_count: usize,
        outcome: &ImportOutcome,
    ) -> ImportReport {
        let mut details: Vec<ErrorDetail> = error_rows.iter().map(ErrorDetail::from).collect();
        details.sort_by_key(|d| d.row_index);
        if let Some(submission) = &outcome.error_details {
            details.extend(submission.iter().cloned());
        }

        let validation_error_count = error_rows.len();
        let preview = details.iter().take(self.preview_limit).cloned().collect();

        ImportReport {
            batch_id: Some(outcome.batch_id.clone()),
            total_rows: validation_error_count + outcome.submitted_count,
            success_count: outcome.success_count,
            error_count: validation_error_count + outcome.error_count,
            validation_error_count,
            submission_error_count: outcome.error_count,
            corrected_count,
            batch_error: outcome.batch_error.clone(),
            preview,
            details,
        }
    }

    /// 渲染文本摘要（供命令行/日志展示）
    pub fn render_summary(&self, report: &ImportReport) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "导入完成: 共 {} 行，成功 {} 行，失败 {} 行（校验 {} / 写入 {}），自动修正 {} 行",
            report.total_rows,
            report.success_count,
            report.error_count,
            report.validation_error_count,
            report.submission_error_count,
            report.corrected_count,
        );

        if let Some(batch_error) = &report.batch_error {
            let _ = writeln!(out, "整批失败: {}", batch_error);
        }

        if !report.preview.is_empty() {
            let _ = writeln!(out, "错误明细（前 {} 条）:", report.preview.len());
            for detail in &report.preview {
                let _ = writeln!(
                    out,
                    "  第 {} 行 [{}]: {}",
                    detail.row_index, detail.identifying_name, detail.error_message
                );
            }
            if report.details.len() > report.preview.len() {
                let _ = writeln!(
                    out,
                    "  ... 另有 {} 条，请下载错误报告",
                    report.details.len() - report.preview.len()
                );
            }
        }

        out
    }

    /// 生成 CSV 错误报告（表头 RowNumber,LeadName,Error；字段全部加引号）
    pub fn error_csv(&self, details: &[ErrorDetail]) -> ImportResult<String> {
        let mut buf: Vec<u8> = Vec::new();
        writeln!(buf, "{}", ERROR_REPORT_HEADER)
            .map_err(|e| ImportError::ReportWriteError(e.to_string()))?;

        {
            let mut writer = WriterBuilder::new()
                .quote_style(QuoteStyle::Always)
                .from_writer(&mut buf);

            for detail in details {
                writer
                    .write_record([
                        detail.row_index.to_string(),
                        detail.identifying_name.clone(),
                        detail.error_message.clone(),
                    ])
                    .map_err(|e| ImportError::ReportWriteError(e.to_string()))?;
            }
            writer
                .flush()
                .map_err(|e| ImportError::ReportWriteError(e.to_string()))?;
        }

        String::from_utf8(buf).map_err(|e| ImportError::ReportWriteError(e.to_string()))
    }

    /// 由校验错误行直接生成 CSV 错误报告（保持输入顺序）
    pub fn error_rows_csv(&self, rows: &[ErrorRow]) -> ImportResult<String> {
        let details: Vec<ErrorDetail> = rows.iter().map(ErrorDetail::from).collect();
        self.error_csv(&details)
    }

    /// 写出 CSV 错误报告文件
    pub fn write_error_csv<P: AsRef<Path>>(
        &self,
        details: &[ErrorDetail],
        path: P,
    ) -> ImportResult<()> {
        let content = self.error_csv(details)?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| ImportError::ReportWriteError(e.to_string()))
    }
}

impl Default for ResultReporter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ERROR_PREVIEW_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::RawRecord;

    fn error_row(n: usize, name: Option<&str>, message: &str) -> ErrorRow {
        ErrorRow {
            original_cells: RawRecord::new(n, vec![name.unwrap_or("").to_string()]),
            identifying_name: name.map(|s| s.to_string()),
            error_message: message.to_string(),
        }
    }

    fn outcome(submitted: usize, success: usize, details: Option<Vec<ErrorDetail>>) -> ImportOutcome {
        ImportOutcome {
            batch_id: "batch-1".to_string(),
            submitted_count: submitted,
            success_count: success,
            error_count: submitted - success,
            error_details: details,
            batch_error: None,
        }
    }

    #[test]
    fn test_build_report_merges_counts() {
        let validation = ValidationReport {
            valid: Vec::new(),
            errors: vec![
                error_row(4, Some("Max"), "字段 email 邮箱格式无效: bad"),
                error_row(2, None, "缺少必填字段: name"),
            ],
            warnings: Vec::new(),
        };
        let submitted = outcome(
            3,
            2,
            Some(vec![ErrorDetail {
                row_index: 3,
                identifying_name: "John".to_string(),
                error_message: "dup".to_string(),
            }]),
        );

        let report = ResultReporter::new(2).build_report(&validation, &submitted);

        assert_eq!(report.total_rows, 5);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.error_count, 3);
        assert_eq!(report.validation_error_count, 2);
        assert_eq!(report.submission_error_count, 1);
        let rows: Vec<usize> = report.details.iter().map(|d| d.row_index).collect();
        assert_eq!(rows, vec![2, 4, 3]);
        assert_eq!(report.preview.len(), 2);
    }

    #[test]
    fn test_render_summary_mentions_batch_error() {
        let mut failed = outcome(2, 0, None);
        failed.batch_error = Some("批量写入失败: denied".to_string());

        let reporter = ResultReporter::default();
        let text = reporter.render_summary(&reporter.summarize_outcome(&failed));

        assert!(text.contains("失败 2 行"));
        assert!(text.contains("整批失败"));
    }

    #[test]
    fn test_error_csv_quotes_every_field() {
        let reporter = ResultReporter::default();
        let csv = reporter
            .error_rows_csv(&[error_row(7, Some("Doe, \"JD\" Jane"), "bad")])
            .unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "RowNumber,LeadName,Error");
        assert_eq!(lines[1], r#""7","Doe, ""JD"" Jane","bad""#);
    }

    #[test]
    fn test_error_csv_round_trip() {
        let reporter = ResultReporter::default();
        let rows = vec![
            error_row(3, Some("A, B"), "缺少必填字段: email"),
            error_row(1, None, "缺少必填字段: name; 缺少必填字段: email"),
            error_row(9, Some("Line\nBreak"), "x"),
        ];

        let csv = reporter.error_rows_csv(&rows).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let parsed: Vec<(String, String, String)> = reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                (r[0].to_string(), r[1].to_string(), r[2].to_string())
            })
            .collect();

        assert_eq!(parsed.len(), rows.len());
        for (row, (num, name, msg)) in rows.iter().zip(parsed) {
            assert_eq!(num, row.original_cells.row_number.to_string());
            assert_eq!(name, row.identifying_name.clone().unwrap_or_default());
            assert_eq!(msg, row.error_message);
        }
    }

    #[test]
    fn test_write_error_csv_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.csv");

        let reporter = ResultReporter::default();
        reporter
            .write_error_csv(
                &[ErrorDetail {
                    row_index: 1,
                    identifying_name: "Jane".to_string(),
                    error_message: "bad".to_string(),
                }],
                &path,
            )
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("RowNumber,LeadName,Error\n"));
    }
}

// ==========================================
// CRM 线索导入 - 行校验器实现
// ==========================================
// 职责: 映射覆盖检查 + 逐行校验，划分为有效记录 / 错误行
// 失败分级:
// - 硬失败（必填缺失 / 邮箱格式错误）: 行进入 ErrorRow，不提交
// - 软失败（枚举值非法）: 记录告警，重置为默认值，行保留
// ==========================================

use crate::domain::import::{ErrorRow, ImportRecord, RawRecord, RowWarning, ValidationReport};
use crate::domain::types::FieldFormat;
use crate::importer::column_mapper::FrozenMapping;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::schema::{lead_fields, SchemaRegistry};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern must compile")
});

/// 邮箱格式检查
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// 单行校验结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Valid(ImportRecord, Vec<RowWarning>),
    Invalid(ErrorRow),
}

pub struct RowValidator {
    schema: SchemaRegistry,
}

impl RowValidator {
    pub fn new(schema: SchemaRegistry) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// 检查映射是否覆盖全部必填字段
    ///
    /// # 返回
    /// - Err(MissingRequiredMappings): 按注册表顺序列出缺失字段
    pub fn check_coverage(&self, mapping: &FrozenMapping) -> ImportResult<()> {
        let mapped = mapping.mapping().mapped_fields();
        let missing: Vec<String> = self
            .schema
            .required_fields()
            .filter(|spec| !mapped.contains(&spec.field_id.as_str()))
            .map(|spec| spec.field_id.clone())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MissingRequiredMappings { fields: missing })
        }
    }

    /// 校验全部行
    ///
    /// 映射不完整时整体中止，不产出任何行
    pub fn validate(
        &self,
        mapping: &FrozenMapping,
        rows: &[RawRecord],
    ) -> ImportResult<ValidationReport> {
        self.check_coverage(mapping)?;

        let mut report = ValidationReport::default();
        for row in rows {
            match self.validate_row(mapping, row) {
                RowOutcome::Valid(record, mut warnings) => {
                    report.valid.push(record);
                    report.warnings.append(&mut warnings);
                }
                RowOutcome::Invalid(error_row) => {
                    debug!(
                        row_number = row.row_number,
                        error = %error_row.error_message,
                        "行校验失败"
                    );
                    report.errors.push(error_row);
                }
            }
        }

        info!(
            total = rows.len(),
            valid = report.valid.len(),
            invalid = report.errors.len(),
            corrected = report.warnings.len(),
            "行校验完成"
        );

        Ok(report)
    }

    /// 校验单行（不会失败，非法行转为 ErrorRow）
    pub fn validate_row(&self, mapping: &FrozenMapping, row: &RawRecord) -> RowOutcome {
        let mut record = self.build_record(mapping, row);
        let mut failures: Vec<String> = Vec::new();
        let mut warnings: Vec<RowWarning> = Vec::new();

        for spec in self.schema.fields() {
            let field_id = spec.field_id.as_str();

            // 必填检查
            let value = match record.get(field_id) {
                Some(v) => v.to_string(),
                None => {
                    if spec.required {
                        failures.push(format!("缺少必填字段: {}", field_id));
                    }
                    continue;
                }
            };

            // 枚举检查（软失败）
            if !spec.allows(&value) {
                match &spec.default_value {
                    Some(default) => {
                        record.set(field_id, default.clone());
                        warnings.push(RowWarning {
                            row_number: row.row_number,
                            field_id: field_id.to_string(),
                            message: format!("字段 {} 取值无效，已重置为 {}", field_id, default),
                        });
                    }
                    None => {
                        record.values.remove(field_id);
                        warnings.push(RowWarning {
                            row_number: row.row_number,
                            field_id: field_id.to_string(),
                            message: format!("字段 {} 取值无效，已清空", field_id),
                        });
                    }
                }
            }

            // 格式检查（硬失败）
            if spec.format == FieldFormat::Email && !is_valid_email(&value) {
                failures.push(format!("字段 {} 邮箱格式无效: {}", field_id, value));
            }
        }

        if failures.is_empty() {
            RowOutcome::Valid(record, warnings)
        } else {
            let identifying_name = record.get(lead_fields::NAME).map(|s| s.to_string());
            RowOutcome::Invalid(ErrorRow {
                original_cells: row.clone(),
                identifying_name,
                error_message: failures.join("; "),
            })
        }
    }

    /// 按映射复制单元格（TRIM 后非空才写入）
    fn build_record(&self, mapping: &FrozenMapping, row: &RawRecord) -> ImportRecord {
        let mut record = ImportRecord::new(row.row_number);

        for (idx, entry) in mapping.mapping().entries().iter().enumerate() {
            let Some(field_id) = entry.effective().field_id() else {
                continue;
            };
            if !self.schema.contains(field_id) {
                continue;
            }

            let value = row.cell(idx).trim();
            if !value.is_empty() {
                record.set(field_id, value.to_string());
            }
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::MappingTarget;
    use crate::importer::column_mapper::ColumnMapper;
    use crate::importer::schema::TargetFieldSpec;

    /// 场景用字段表: name/email 必填，status ∈ {New, Contacted}
    fn scenario_schema() -> SchemaRegistry {
        SchemaRegistry::new(vec![
            TargetFieldSpec::text("name", "Name").required(),
            TargetFieldSpec::text("email", "Email")
                .required()
                .with_format(FieldFormat::Email),
            TargetFieldSpec::text("status", "Status").with_allowed_values(&["New", "Contacted"], "New"),
        ])
    }

    fn frozen(headers: &[&str], schema: &SchemaRegistry) -> FrozenMapping {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        ColumnMapper.freeze(ColumnMapper.suggest(&headers, schema)).unwrap()
    }

    fn row(n: usize, cells: &[&str]) -> RawRecord {
        RawRecord::new(n, cells.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn test_unmapped_optional_enum_is_left_unset() {
        let schema = scenario_schema();
        let mapping = frozen(&["Full Name", "Email Address", "Stat"], &schema);
        let validator = RowValidator::new(schema);

        let report = validator
            .validate(&mapping, &[row(1, &["Jane Doe", "jane@x.com", "Bogus"])])
            .unwrap();

        assert_eq!(report.valid.len(), 1);
        assert!(report.errors.is_empty());
        assert_eq!(report.valid[0].get("name"), Some("Jane Doe"));
        assert_eq!(report.valid[0].get("status"), None);
    }

    #[test]
    fn test_invalid_enum_is_soft_failure() {
        let schema = scenario_schema();
        let mapping = frozen(&["Name", "Email", "Status"], &schema);
        let validator = RowValidator::new(schema);

        let report = validator
            .validate(&mapping, &[row(1, &["Jane Doe", "jane@x.com", "Bogus"])])
            .unwrap();

        assert_eq!(report.valid.len(), 1);
        assert_eq!(report.valid[0].get("status"), Some("New"));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].field_id, "status");
        assert!(!report.warnings[0].message.contains("Bogus"));
    }

    #[test]
    fn test_enum_membership_is_case_sensitive() {
        let schema = scenario_schema();
        let mapping = frozen(&["Name", "Email", "Status"], &schema);
        let validator = RowValidator::new(schema);

        let report = validator
            .validate(&mapping, &[row(1, &["Jane", "jane@x.com", "contacted"])])
            .unwrap();
        assert_eq!(report.valid[0].get("status"), Some("New"));
    }

    #[test]
    fn test_missing_required_value_is_error_row() {
        let schema = scenario_schema();
        let mapping = frozen(&["Full Name", "Email Address", "Stat"], &schema);
        let validator = RowValidator::new(schema);

        let report = validator
            .validate(&mapping, &[row(1, &["", "jane@x.com", "New"])])
            .unwrap();

        assert!(report.valid.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].error_message.contains("name"));
        assert_eq!(report.errors[0].original_cells.cells, vec!["", "jane@x.com", "New"]);
    }

    #[test]
    fn test_whitespace_only_counts_as_missing() {
        let schema = scenario_schema();
        let mapping = frozen(&["Name", "Email"], &schema);
        let validator = RowValidator::new(schema);

        let report = validator
            .validate(&mapping, &[row(1, &["   ", "jane@x.com"])])
            .unwrap();
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_bad_email_is_hard_failure() {
        let schema = scenario_schema();
        let mapping = frozen(&["Name", "Email"], &schema);
        let validator = RowValidator::new(schema);

        let report = validator
            .validate(&mapping, &[row(1, &["Jane", "not-an-email"])])
            .unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].identifying_name.as_deref(), Some("Jane"));
        assert!(report.errors[0].error_message.contains("email"));
    }

    #[test]
    fn test_multiple_failures_are_joined() {
        let schema = scenario_schema();
        let mapping = frozen(&["Name", "Email"], &schema);
        let validator = RowValidator::new(schema);

        match validator.validate_row(&mapping, &row(1, &["", ""])) {
            RowOutcome::Invalid(err) => {
                assert_eq!(err.error_message, "缺少必填字段: name; 缺少必填字段: email");
            }
            other => panic!("expected invalid row, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_mapping_aborts() {
        let schema = scenario_schema();
        let mapping = frozen(&["Full Name", "Stat"], &schema);
        let validator = RowValidator::new(schema);

        let result = validator.validate(&mapping, &[row(1, &["Jane", "New"])]);

        match result {
            Err(ImportError::MissingRequiredMappings { fields }) => {
                assert_eq!(fields, vec!["email".to_string()]);
            }
            other => panic!("expected MissingRequiredMappings, got {:?}", other),
        }
    }

    #[test]
    fn test_ignored_columns_contribute_nothing() {
        let schema = scenario_schema();
        let headers: Vec<String> = ["Name", "Email", "Status"].iter().map(|h| h.to_string()).collect();
        let mut mapping = ColumnMapper.suggest(&headers, &schema);
        ColumnMapper
            .assign(&mut mapping, &schema, "Status", MappingTarget::Ignore)
            .unwrap();
        let mapping = ColumnMapper.freeze(mapping).unwrap();
        let validator = RowValidator::new(schema);

        let report = validator
            .validate(&mapping, &[row(1, &["Jane", "jane@x.com", "Contacted"])])
            .unwrap();
        assert_eq!(report.valid[0].get("status"), None);
    }

    #[test]
    fn test_partition_is_total_and_disjoint() {
        let schema = scenario_schema();
        let mapping = frozen(&["Name", "Email", "Status"], &schema);
        let validator = RowValidator::new(schema);

        let rows = vec![
            row(1, &["A", "a@x.com", "New"]),
            row(2, &["", "b@x.com", "New"]),
            row(3, &["C", "bad", "New"]),
            row(4, &["D", "d@x.com", "Weird"]),
            row(5, &["E"]),
        ];
        let report = validator.validate(&mapping, &rows).unwrap();

        assert_eq!(report.total_rows(), rows.len());
        let mut seen: Vec<usize> = report
            .valid
            .iter()
            .map(|r| r.row_number)
            .chain(report.errors.iter().map(|e| e.original_cells.row_number))
            .collect();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("jane@x.com"));
        assert!(!is_valid_email("jane@x"));
        assert!(!is_valid_email("jane doe@x.com"));
        assert!(!is_valid_email("@x.com"));
    }
}

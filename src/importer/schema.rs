// ==========================================
// CRM 线索导入 - 目标字段注册表
// ==========================================
// 职责: 定义可识别的目标字段、必填性、枚举取值、格式约束
// 生命周期: 进程启动时构建，之后只读
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::types::FieldFormat;
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 线索字段 ID
pub mod lead_fields {
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const COMPANY: &str = "company";
    pub const JOB_TITLE: &str = "job_title";
    pub const SOURCE: &str = "source";
    pub const STATUS: &str = "status";
    pub const NOTES: &str = "notes";
}

/// 线索状态默认取值
pub const DEFAULT_LEAD_STATUSES: [&str; 4] = ["New", "Contacted", "Qualified", "Lost"];

/// 线索状态默认值
pub const DEFAULT_LEAD_STATUS: &str = "New";

// ==========================================
// TargetFieldSpec - 目标字段定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFieldSpec {
    pub field_id: String,
    pub label: String,
    pub required: bool,
    pub allowed_values: Option<Vec<String>>, // 枚举字段取值（大小写敏感）
    pub default_value: Option<String>,       // 枚举字段默认值
    pub format: FieldFormat,
    pub aliases: Vec<String>, // 额外的表头别名（参与模糊匹配）
}

impl TargetFieldSpec {
    /// 普通文本字段
    pub fn text(field_id: &str, label: &str) -> Self {
        Self {
            field_id: field_id.to_string(),
            label: label.to_string(),
            required: false,
            allowed_values: None,
            default_value: None,
            format: FieldFormat::Text,
            aliases: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_format(mut self, format: FieldFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_allowed_values(mut self, values: &[&str], default: &str) -> Self {
        self.allowed_values = Some(values.iter().map(|v| v.to_string()).collect());
        self.default_value = Some(default.to_string());
        self
    }

    pub fn is_enum(&self) -> bool {
        self.allowed_values.is_some()
    }

    /// 枚举成员判定（大小写敏感）
    pub fn allows(&self, value: &str) -> bool {
        match &self.allowed_values {
            Some(values) => values.iter().any(|v| v == value),
            None => true,
        }
    }
}

// ==========================================
// SchemaRegistry - 字段注册表
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    fields: Vec<TargetFieldSpec>,
}

impl SchemaRegistry {
    pub fn new(fields: Vec<TargetFieldSpec>) -> Self {
        Self { fields }
    }

    /// 线索导入的标准字段表
    pub fn leads() -> Self {
        use lead_fields::*;

        Self::new(vec![
            TargetFieldSpec::text(NAME, "Name")
                .required()
                .with_aliases(&["lead name", "contact name"]),
            TargetFieldSpec::text(EMAIL, "Email")
                .required()
                .with_format(FieldFormat::Email)
                .with_aliases(&["e-mail"]),
            TargetFieldSpec::text(PHONE, "Phone").with_aliases(&["mobile", "telephone"]),
            TargetFieldSpec::text(COMPANY, "Company")
                .with_aliases(&["organization", "organisation"]),
            TargetFieldSpec::text(JOB_TITLE, "Job Title").with_aliases(&["title", "position"]),
            TargetFieldSpec::text(SOURCE, "Source").with_aliases(&["lead source", "channel"]),
            TargetFieldSpec::text(STATUS, "Status")
                .with_allowed_values(&DEFAULT_LEAD_STATUSES, DEFAULT_LEAD_STATUS),
            TargetFieldSpec::text(NOTES, "Notes").with_aliases(&["comment", "description"]),
        ])
    }

    pub fn fields(&self) -> &[TargetFieldSpec] {
        &self.fields
    }

    pub fn get(&self, field_id: &str) -> Option<&TargetFieldSpec> {
        self.fields.iter().find(|f| f.field_id == field_id)
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.get(field_id).is_some()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &TargetFieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    /// 用参考列表替换某枚举字段的取值与默认值，返回新的注册表
    pub fn with_allowed_values(
        &self,
        field_id: &str,
        values: Vec<String>,
        default: String,
    ) -> ImportResult<Self> {
        if !values.contains(&default) {
            return Err(ImportError::ConfigReadError {
                key: field_id.to_string(),
                message: format!("默认值 {} 不在取值列表中", default),
            });
        }

        let mut fields = self.fields.clone();
        let spec = fields
            .iter_mut()
            .find(|f| f.field_id == field_id)
            .ok_or_else(|| ImportError::UnknownField(field_id.to_string()))?;
        spec.allowed_values = Some(values);
        spec.default_value = Some(default);

        Ok(Self { fields })
    }
}

/// 读取状态参考列表，构建线索字段表（一次性读取）
pub async fn load_lead_schema<C>(config: &C) -> ImportResult<SchemaRegistry>
where
    C: ImportConfigReader + ?Sized,
{
    let values = config.get_lead_status_values().await?;
    let default = config.get_default_lead_status().await?;
    debug!(statuses = ?values, default = %default, "加载线索状态参考列表");

    SchemaRegistry::leads().with_allowed_values(lead_fields::STATUS, values, default)
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::leads()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_schema_required_fields() {
        let schema = SchemaRegistry::leads();
        let required: Vec<&str> = schema
            .required_fields()
            .map(|f| f.field_id.as_str())
            .collect();
        assert_eq!(required, vec![lead_fields::NAME, lead_fields::EMAIL]);
    }

    #[test]
    fn test_status_allows_case_sensitive() {
        let schema = SchemaRegistry::leads();
        let status = schema.get(lead_fields::STATUS).unwrap();
        assert!(status.allows("New"));
        assert!(!status.allows("new"));
        assert_eq!(status.default_value.as_deref(), Some("New"));
    }

    #[test]
    fn test_with_allowed_values_replaces_reference_list() {
        let schema = SchemaRegistry::leads();
        let updated = schema
            .with_allowed_values(
                lead_fields::STATUS,
                vec!["Open".to_string(), "Closed".to_string()],
                "Open".to_string(),
            )
            .unwrap();

        assert!(updated.get(lead_fields::STATUS).unwrap().allows("Closed"));
        // 原注册表不变
        assert!(!schema.get(lead_fields::STATUS).unwrap().allows("Closed"));
    }

    #[test]
    fn test_with_allowed_values_rejects_foreign_default() {
        let schema = SchemaRegistry::leads();
        let result = schema.with_allowed_values(
            lead_fields::STATUS,
            vec!["Open".to_string()],
            "New".to_string(),
        );
        assert!(result.is_err());
    }
}

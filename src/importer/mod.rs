// ==========================================
// CRM 线索导入 - 导入层
// ==========================================
// 职责: 表格文件 → 列映射 → 行校验 → 批量写入 → 结果报告
// 支持: CSV, Excel
// ==========================================

// 模块声明
pub mod column_mapper;
pub mod error;
pub mod file_parser;
pub mod import_executor;
pub mod import_session;
pub mod lead_importer;
pub mod result_reporter;
pub mod row_validator;
pub mod schema;

// 重导出核心类型
pub use column_mapper::{normalize_key, ColumnMapper, FrozenMapping};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, UniversalFileParser};
pub use import_executor::ImportExecutor;
pub use import_session::ImportSession;
pub use lead_importer::{LeadImportRun, LeadImporter};
pub use result_reporter::{ImportReport, ResultReporter, ERROR_REPORT_HEADER};
pub use row_validator::{is_valid_email, RowOutcome, RowValidator};
pub use schema::{lead_fields, load_lead_schema, SchemaRegistry, TargetFieldSpec};

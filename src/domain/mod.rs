// ==========================================
// CRM 线索导入 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑，不含导入流程逻辑
// ==========================================

pub mod import;
pub mod lead;
pub mod types;

// 重导出核心类型
pub use import::{
    ErrorDetail, ErrorRow, HeaderMapping, ImportOutcome, ImportRecord, MappingEntry, ParsedFile,
    RawRecord, RowWarning, ValidationReport,
};
pub use lead::{Lead, LeadFilter, NewLead};
pub use types::{FieldFormat, ImportStage, MappingTarget};

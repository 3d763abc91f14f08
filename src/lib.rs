// ==========================================
// CRM 线索导入 - 核心库
// ==========================================
// 职责: 表格文件批量导入线索（映射 / 校验 / 写入 / 报告）
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 存储边界
pub mod repository;

// 导入层 - 导入流水线
pub mod importer;

// 配置层 - 参考列表与报告配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{FieldFormat, ImportStage, MappingTarget};

// 领域实体
pub use domain::{
    ErrorDetail, ErrorRow, HeaderMapping, ImportOutcome, ImportRecord, Lead, LeadFilter, NewLead,
    ParsedFile, RawRecord, ValidationReport,
};

// 导入流水线
pub use importer::{
    ColumnMapper, ImportError, ImportExecutor, ImportReport, ImportResult, ImportSession,
    LeadImportRun, LeadImporter, ResultReporter, RowValidator, SchemaRegistry,
};

// 存储与配置
pub use config::{ConfigManager, ImportConfigReader};
pub use repository::{LeadRepositoryImpl, LeadStore, RepositoryError};

// ==========================================
// 版本信息
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "CRM 线索导入";

// ==========================================
// CRM 线索导入 - 配置层
// ==========================================
// 职责: 导入相关配置读取（状态参考列表 / 默认值 / 报告行数）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULT_ERROR_PREVIEW_LIMIT};
pub use import_config_trait::{ConfigError, ImportConfigReader};

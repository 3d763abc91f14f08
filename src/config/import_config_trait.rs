// ==========================================
// CRM 线索导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use thiserror::Error;

/// 配置读取错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置读取失败 (key: {key}): {message}")]
    ReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ValueError {
        key: String,
        value: String,
        message: String,
    },
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 线索状态参考列表 =====

    /// 获取线索状态取值列表
    ///
    /// # 默认值
    /// - ["New", "Contacted", "Qualified", "Lost"]
    async fn get_lead_status_values(&self) -> Result<Vec<String>, ConfigError>;

    /// 获取线索状态默认值（枚举非法或缺失时使用）
    ///
    /// # 默认值
    /// - New
    async fn get_default_lead_status(&self) -> Result<String, ConfigError>;

    // ===== 报告配置 =====

    /// 获取结果页展示的错误行数上限
    ///
    /// # 默认值
    /// - 10
    async fn get_error_preview_limit(&self) -> Result<usize, ConfigError>;
}

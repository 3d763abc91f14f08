// ==========================================
// CRM 线索导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{ConfigError, ImportConfigReader};
use crate::db::open_sqlite_connection;
use crate::importer::schema::{DEFAULT_LEAD_STATUS, DEFAULT_LEAD_STATUSES};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 配置键
pub mod config_keys {
    pub const LEAD_STATUS_VALUES: &str = "import.lead_status_values";
    pub const DEFAULT_LEAD_STATUS: &str = "import.default_lead_status";
    pub const ERROR_PREVIEW_LIMIT: &str = "import.error_preview_limit";
}

/// 错误预览默认行数
pub const DEFAULT_ERROR_PREVIEW_LIMIT: usize = 10;

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path).map_err(|e| ConfigError::ReadError {
            key: "*".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let read_error = |message: String| ConfigError::ReadError {
            key: key.to_string(),
            message,
        };

        let conn = self
            .conn
            .lock()
            .map_err(|e| read_error(format!("锁获取失败: {}", e)))?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| read_error(e.to_string()))
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self.conn.lock().map_err(|e| ConfigError::ReadError {
            key: key.to_string(),
            message: format!("锁获取失败: {}", e),
        })?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT (scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![GLOBAL_SCOPE, key, value],
        )
        .map_err(|e| ConfigError::ReadError {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        Ok(())
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_lead_status_values(&self) -> Result<Vec<String>, ConfigError> {
        let defaults: Vec<String> = DEFAULT_LEAD_STATUSES.iter().map(|s| s.to_string()).collect();

        let Some(value) = self.get_config_value(config_keys::LEAD_STATUS_VALUES)? else {
            return Ok(defaults);
        };

        let values: Vec<String> =
            serde_json::from_str(&value).map_err(|e| ConfigError::ValueError {
                key: config_keys::LEAD_STATUS_VALUES.to_string(),
                value: value.clone(),
                message: e.to_string(),
            })?;

        if values.is_empty() {
            tracing::warn!(
                config_key = config_keys::LEAD_STATUS_VALUES,
                "线索状态列表为空，使用默认列表"
            );
            return Ok(defaults);
        }
        Ok(values)
    }

    async fn get_default_lead_status(&self) -> Result<String, ConfigError> {
        self.get_config_or_default(config_keys::DEFAULT_LEAD_STATUS, DEFAULT_LEAD_STATUS)
    }

    async fn get_error_preview_limit(&self) -> Result<usize, ConfigError> {
        let value = self.get_config_or_default(
            config_keys::ERROR_PREVIEW_LIMIT,
            &DEFAULT_ERROR_PREVIEW_LIMIT.to_string(),
        )?;
        value
            .trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::ValueError {
                key: config_keys::ERROR_PREVIEW_LIMIT.to_string(),
                value: value.clone(),
                message: e.to_string(),
            })
    }
}

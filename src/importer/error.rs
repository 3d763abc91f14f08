// ==========================================
// CRM 线索导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级失败不走错误通道，进入 ErrorRow
// ==========================================

use crate::config::ConfigError;
use crate::domain::types::ImportStage;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 结构性输入错误（映射前中止）=====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.xlsx/.xls）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("文件内容不足: 至少需要表头行和一行数据")]
    EmptyInput,

    #[error("表头缺失: 第一行没有任何列名")]
    MissingHeaders,

    #[error("表头重复: {0}")]
    DuplicateHeader(String),

    // ===== 映射错误（校验前中止）=====
    #[error("必填字段未映射: {}", fields.join(", "))]
    MissingRequiredMappings { fields: Vec<String> },

    #[error("字段 {field} 被多个列重复映射: {}", headers.join(", "))]
    DuplicateMapping { field: String, headers: Vec<String> },

    #[error("未知表头: {0}")]
    UnknownHeader(String),

    #[error("未知目标字段: {0}")]
    UnknownField(String),

    // ===== 流程错误 =====
    #[error("当前阶段不允许该操作: 期望 {expected}，实际 {actual}")]
    InvalidStage {
        expected: ImportStage,
        actual: ImportStage,
    },

    // ===== 报告错误 =====
    #[error("错误报告写出失败: {0}")]
    ReportWriteError(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<ConfigError>
impl From<ConfigError> for ImportError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ReadError { key, message } => ImportError::ConfigReadError { key, message },
            ConfigError::ValueError { key, value, message } => ImportError::ConfigReadError {
                key,
                message: format!("{} (value: {})", message, value),
            },
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

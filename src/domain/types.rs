// ==========================================
// CRM 线索导入 - 领域类型定义
// ==========================================
// 职责: 导入流程中的枚举类型（阶段 / 映射目标 / 字段格式）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 导入阶段 (Import Stage)
// ==========================================
// 顺序推进: Upload → Mapping → Review → Result
// 任一阶段可 restart 回到 Upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStage {
    Upload,  // 等待上传文件
    Mapping, // 列映射（用户可调整）
    Review,  // 校验结果复核
    Result,  // 已提交，展示结果
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStage::Upload => write!(f, "UPLOAD"),
            ImportStage::Mapping => write!(f, "MAPPING"),
            ImportStage::Review => write!(f, "REVIEW"),
            ImportStage::Result => write!(f, "RESULT"),
        }
    }
}

// ==========================================
// 映射目标 (Mapping Target)
// ==========================================
// 一个源列要么映射到目标字段，要么显式忽略，要么未设置
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "field", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MappingTarget {
    Field(String), // 目标字段 ID
    Ignore,        // 用户显式忽略
    Unset,         // 未映射
}

impl MappingTarget {
    /// 返回目标字段 ID（仅 Field 变体）
    pub fn field_id(&self) -> Option<&str> {
        match self {
            MappingTarget::Field(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for MappingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingTarget::Field(id) => write!(f, "{}", id),
            MappingTarget::Ignore => write!(f, "(ignore)"),
            MappingTarget::Unset => write!(f, "(unset)"),
        }
    }
}

// ==========================================
// 字段格式约束 (Field Format)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldFormat {
    Text,  // 任意文本
    Email, // 邮箱格式（local@domain.tld）
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldFormat::Text => write!(f, "TEXT"),
            FieldFormat::Email => write!(f, "EMAIL"),
        }
    }
}

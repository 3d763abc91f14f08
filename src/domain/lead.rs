// ==========================================
// CRM 线索导入 - 线索领域模型
// ==========================================
// 对齐: leads 表
// 用途: 导入层写入，查询接口只读
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// NewLead - 待写入的线索
// ==========================================
// lead_id 由客户端生成，用于写入后对账
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    pub lead_id: String,   // 线索 ID（UUID）
    pub tenant_id: String, // 租户/组织 ID

    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub source: Option<String>,
    pub status: String,
    pub notes: Option<String>,

    pub row_number: usize, // 源文件行号（不落库，仅用于对账）
}

// ==========================================
// Lead - 已持久化的线索
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub lead_id: String,
    pub tenant_id: String,

    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub source: Option<String>,
    pub status: String,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
}

// ==========================================
// LeadFilter - 线索查询过滤条件
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadFilter {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

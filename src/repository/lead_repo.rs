// ==========================================
// CRM 线索导入 - 线索存储 Trait
// ==========================================
// 职责: 定义存储边界接口（不包含实现）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::lead::{Lead, LeadFilter, NewLead};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::sync::Arc;

// ==========================================
// LeadStore Trait
// ==========================================
// 用途: 线索批量写入 / 查询
// 实现者: LeadRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// 批量插入线索（单次请求）
    ///
    /// # 返回
    /// - Ok(Vec<Lead>): 实际持久化的记录（可能少于提交数量）
    /// - Err: 传输/权限/数据库错误（无法得知逐行结果）
    async fn bulk_insert(&self, leads: Vec<NewLead>) -> RepositoryResult<Vec<Lead>>;

    /// 按租户查询线索
    ///
    /// # 参数
    /// - tenant_id: 租户 ID
    /// - filter: 过滤条件
    async fn list(&self, tenant_id: &str, filter: &LeadFilter) -> RepositoryResult<Vec<Lead>>;
}

// 共享存储（导入器与查询命令共用同一连接）
#[async_trait]
impl<T> LeadStore for Arc<T>
where
    T: LeadStore + ?Sized,
{
    async fn bulk_insert(&self, leads: Vec<NewLead>) -> RepositoryResult<Vec<Lead>> {
        (**self).bulk_insert(leads).await
    }

    async fn list(&self, tenant_id: &str, filter: &LeadFilter) -> RepositoryResult<Vec<Lead>> {
        (**self).list(tenant_id, filter).await
    }
}

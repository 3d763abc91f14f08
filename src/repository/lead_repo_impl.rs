// ==========================================
// CRM 线索导入 - 线索存储 Repository 实现
// ==========================================
// 职责: 实现 LeadStore（使用 rusqlite）
// 写入策略: 单事务 INSERT OR IGNORE，(tenant_id, email) 冲突的行被跳过
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::lead::{Lead, LeadFilter, NewLead};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::lead_repo::LeadStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// LeadRepositoryImpl
// ==========================================
pub struct LeadRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl LeadRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 在事务中逐行插入，返回实际写入的行
    fn bulk_insert_tx(tx: &Transaction, leads: &[NewLead]) -> RepositoryResult<Vec<Lead>> {
        let mut stmt = tx.prepare(
            r#"
            INSERT OR IGNORE INTO leads (
                lead_id, tenant_id, name, email, phone, company,
                job_title, source, status, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )?;

        let created_at = Utc::now();
        let mut inserted = Vec::with_capacity(leads.len());
        for lead in leads {
            let changed = stmt.execute(params![
                lead.lead_id,
                lead.tenant_id,
                lead.name,
                lead.email,
                lead.phone,
                lead.company,
                lead.job_title,
                lead.source,
                lead.status,
                lead.notes,
                created_at,
            ])?;

            if changed == 1 {
                inserted.push(Lead {
                    lead_id: lead.lead_id.clone(),
                    tenant_id: lead.tenant_id.clone(),
                    name: lead.name.clone(),
                    email: lead.email.clone(),
                    phone: lead.phone.clone(),
                    company: lead.company.clone(),
                    job_title: lead.job_title.clone(),
                    source: lead.source.clone(),
                    status: lead.status.clone(),
                    notes: lead.notes.clone(),
                    created_at,
                });
            }
        }

        Ok(inserted)
    }

    fn map_lead_row(row: &Row) -> rusqlite::Result<Lead> {
        Ok(Lead {
            lead_id: row.get(0)?,
            tenant_id: row.get(1)?,
            name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            company: row.get(5)?,
            job_title: row.get(6)?,
            source: row.get(7)?,
            status: row.get(8)?,
            notes: row.get(9)?,
            created_at: row.get::<_, DateTime<Utc>>(10)?,
        })
    }
}

#[async_trait]
impl LeadStore for LeadRepositoryImpl {
    /// 批量插入（事务化）
    async fn bulk_insert(&self, leads: Vec<NewLead>) -> RepositoryResult<Vec<Lead>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let inserted = Self::bulk_insert_tx(&tx, &leads)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(inserted)
    }

    async fn list(&self, tenant_id: &str, filter: &LeadFilter) -> RepositoryResult<Vec<Lead>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        // LIMIT -1 表示不限制；超出 i64 的上限按不限制处理
        let limit: i64 = filter
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);

        let mut stmt = conn.prepare(
            r#"
            SELECT lead_id, tenant_id, name, email, phone, company,
                   job_title, source, status, notes, created_at
            FROM leads
            WHERE tenant_id = ?1 AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at, rowid
            LIMIT ?3
            "#,
        )?;

        let leads = stmt
            .query_map(params![tenant_id, filter.status, limit], Self::map_lead_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(leads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn memory_repo() -> LeadRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        LeadRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn new_lead(tenant: &str, name: &str, email: &str, status: &str) -> NewLead {
        NewLead {
            lead_id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant.to_string(),
            name: name.to_string(),
            email: Some(email.to_string()),
            phone: None,
            company: None,
            job_title: None,
            source: None,
            status: status.to_string(),
            notes: None,
            row_number: 1,
        }
    }

    #[tokio::test]
    async fn test_bulk_insert_skips_duplicate_email() {
        let repo = memory_repo();

        let inserted = repo
            .bulk_insert(vec![
                new_lead("org-1", "Jane", "jane@x.com", "New"),
                new_lead("org-1", "Jane Again", "jane@x.com", "New"),
                new_lead("org-1", "John", "john@x.com", "Contacted"),
            ])
            .await
            .unwrap();

        assert_eq!(inserted.len(), 2);
        assert_eq!(inserted[0].name, "Jane");
        assert_eq!(inserted[1].name, "John");
    }

    #[tokio::test]
    async fn test_same_email_allowed_across_tenants() {
        let repo = memory_repo();

        let inserted = repo
            .bulk_insert(vec![
                new_lead("org-1", "Jane", "jane@x.com", "New"),
                new_lead("org-2", "Jane", "jane@x.com", "New"),
            ])
            .await
            .unwrap();

        assert_eq!(inserted.len(), 2);
    }

    #[tokio::test]
    async fn test_list_filters_by_tenant_and_status() {
        let repo = memory_repo();
        repo.bulk_insert(vec![
            new_lead("org-1", "Jane", "jane@x.com", "New"),
            new_lead("org-1", "John", "john@x.com", "Contacted"),
            new_lead("org-2", "Max", "max@x.com", "New"),
        ])
        .await
        .unwrap();

        let all = repo.list("org-1", &LeadFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let filter = LeadFilter {
            status: Some("New".to_string()),
            limit: None,
        };
        let new_only = repo.list("org-1", &filter).await.unwrap();
        assert_eq!(new_only.len(), 1);
        assert_eq!(new_only[0].name, "Jane");

        let limited = LeadFilter {
            status: None,
            limit: Some(1),
        };
        assert_eq!(repo.list("org-1", &limited).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_with_huge_limit_returns_all() {
        let repo = memory_repo();
        repo.bulk_insert(vec![
            new_lead("org-1", "Jane", "jane@x.com", "New"),
            new_lead("org-1", "John", "john@x.com", "Contacted"),
        ])
        .await
        .unwrap();

        let filter = LeadFilter {
            status: None,
            limit: Some(usize::MAX),
        };
        assert_eq!(repo.list("org-1", &filter).await.unwrap().len(), 2);
    }
}

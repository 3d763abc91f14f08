// ==========================================
// CRM 线索导入 - 导入执行器
// ==========================================
// 职责: 补默认值 → 附加租户 ID → 单次批量写入 → 对账
// 约束:
// - 每次导入对存储边界只有一次写调用，不重试、不拆批
// - 租户 ID 由调用方显式传入
// ==========================================

use crate::domain::import::{ErrorDetail, ImportOutcome, ImportRecord};
use crate::domain::lead::NewLead;
use crate::importer::schema::{lead_fields, SchemaRegistry};
use crate::repository::LeadStore;
use std::collections::HashSet;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// 存储层未返回的行的错误信息
pub const NOT_PERSISTED_MESSAGE: &str = "未被存储层持久化（可能与已有线索重复）";

pub struct ImportExecutor<S>
where
    S: LeadStore,
{
    store: S,
    schema: SchemaRegistry,
}

impl<S> ImportExecutor<S>
where
    S: LeadStore,
{
    pub fn new(store: S, schema: SchemaRegistry) -> Self {
        Self { store, schema }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// 为未设置的枚举字段补默认值
    pub fn apply_defaults(&self, record: &mut ImportRecord) {
        for spec in self.schema.fields() {
            if let Some(default) = &spec.default_value {
                if record.get(&spec.field_id).is_none() {
                    record.set(&spec.field_id, default.clone());
                }
            }
        }
    }

    /// 转换为存储边界记录（附加租户 ID 与线索 ID）
    pub fn prepare(&self, records: Vec<ImportRecord>, tenant_id: &str) -> Vec<NewLead> {
        records
            .into_iter()
            .map(|mut record| {
                self.apply_defaults(&mut record);
                let take = |field: &str| record.get(field).map(|v| v.to_string());

                NewLead {
                    lead_id: Uuid::new_v4().to_string(),
                    tenant_id: tenant_id.to_string(),
                    name: take(lead_fields::NAME).unwrap_or_default(),
                    email: take(lead_fields::EMAIL),
                    phone: take(lead_fields::PHONE),
                    company: take(lead_fields::COMPANY),
                    job_title: take(lead_fields::JOB_TITLE),
                    source: take(lead_fields::SOURCE),
                    status: take(lead_fields::STATUS).unwrap_or_default(),
                    notes: take(lead_fields::NOTES),
                    row_number: record.row_number,
                }
            })
            .collect()
    }

    /// 执行批量导入
    ///
    /// # 返回
    /// - ImportOutcome: success_count + error_count == 提交数
    /// - 存储层整体失败时 success_count = 0，附汇总错误，无逐行明细
    #[instrument(skip(self, records), fields(submitted = records.len()))]
    pub async fn execute(&self, records: Vec<ImportRecord>, tenant_id: &str) -> ImportOutcome {
        let batch_id = Uuid::new_v4().to_string();
        let leads = self.prepare(records, tenant_id);
        let submitted = leads.len();

        if submitted == 0 {
            info!(batch_id = %batch_id, "无有效记录，跳过写入");
            return ImportOutcome {
                batch_id,
                submitted_count: 0,
                success_count: 0,
                error_count: 0,
                error_details: None,
                batch_error: None,
            };
        }

        info!(batch_id = %batch_id, tenant_id = %tenant_id, submitted, "提交批量写入");

        // 保留对账所需信息（行号 / 名称）
        let ledger: Vec<(String, usize, String)> = leads
            .iter()
            .map(|l| (l.lead_id.clone(), l.row_number, l.name.clone()))
            .collect();

        match self.store.bulk_insert(leads).await {
            Ok(inserted) => {
                let persisted: HashSet<String> =
                    inserted.into_iter().map(|lead| lead.lead_id).collect();

                let missing: Vec<ErrorDetail> = ledger
                    .into_iter()
                    .filter(|(id, _, _)| !persisted.contains(id))
                    .map(|(_, row_index, name)| ErrorDetail {
                        row_index,
                        identifying_name: name,
                        error_message: NOT_PERSISTED_MESSAGE.to_string(),
                    })
                    .collect();

                let error_count = missing.len();
                let success_count = submitted - error_count;
                if error_count > 0 {
                    warn!(batch_id = %batch_id, success_count, error_count, "部分记录未持久化");
                } else {
                    info!(batch_id = %batch_id, success_count, "批量写入完成");
                }

                ImportOutcome {
                    batch_id,
                    submitted_count: submitted,
                    success_count,
                    error_count,
                    error_details: if missing.is_empty() { None } else { Some(missing) },
                    batch_error: None,
                }
            }
            Err(e) => {
                error!(batch_id = %batch_id, error = %e, "批量写入失败");

                ImportOutcome {
                    batch_id,
                    submitted_count: submitted,
                    success_count: 0,
                    error_count: submitted,
                    error_details: None,
                    batch_error: Some(format!("批量写入失败: {}", e)),
                }
            }
        }
    }
}

// ==========================================
// CRM 线索导入 - 线索导入器（非交互流程）
// ==========================================
// 职责: 整合导入流程，从文件到存储
// 流程: 读配置 → 解析 → 映射建议 → 应用覆盖 → 校验 → 写入 → 报告
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::import::{HeaderMapping, ParsedFile, ValidationReport};
use crate::domain::types::MappingTarget;
use crate::importer::column_mapper::ColumnMapper;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{FileParser, UniversalFileParser};
use crate::importer::import_executor::ImportExecutor;
use crate::importer::import_session::ImportSession;
use crate::importer::result_reporter::{ImportReport, ResultReporter};
use crate::importer::schema::{load_lead_schema, SchemaRegistry};
use crate::repository::LeadStore;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// 单次导入的完整产出
#[derive(Debug, Clone)]
pub struct LeadImportRun {
    pub mapping: HeaderMapping,
    pub validation: ValidationReport,
    pub report: ImportReport,
    pub elapsed: Duration,
}

// ==========================================
// LeadImporter - 线索导入器
// ==========================================
pub struct LeadImporter<S, C>
where
    S: LeadStore,
    C: ImportConfigReader,
{
    store: Arc<S>,
    config: C,
    file_parser: Box<dyn FileParser>,
}

impl<S, C> LeadImporter<S, C>
where
    S: LeadStore,
    C: ImportConfigReader,
{
    pub fn new(store: Arc<S>, config: C) -> Self {
        Self {
            store,
            config,
            file_parser: Box::new(UniversalFileParser),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// 读取参考列表构建字段表
    pub async fn load_schema(&self) -> ImportResult<SchemaRegistry> {
        load_lead_schema(&self.config).await
    }

    /// 解析文件并给出映射建议（不写入）
    pub async fn preview(&self, file_path: &Path) -> ImportResult<(ParsedFile, HeaderMapping)> {
        let schema = self.load_schema().await?;
        let parsed = self.file_parser.parse_file(file_path)?;
        let mapping = ColumnMapper.suggest(&parsed.headers, &schema);
        Ok((parsed, mapping))
    }

    /// 导入文件
    ///
    /// # 参数
    /// - file_path: .csv/.xlsx/.xls 文件
    /// - tenant_id: 调用方租户 ID
    /// - overrides: 按表头覆盖的映射（在自动建议之后应用）
    ///
    /// # 返回
    /// - Ok(LeadImportRun): 含写入失败在内的完整结果
    /// - Err: 结构性错误（文件/表头/映射不完整/配置）
    #[instrument(skip(self, file_path, overrides))]
    pub async fn import_file(
        &self,
        file_path: &Path,
        tenant_id: &str,
        overrides: &[(String, MappingTarget)],
    ) -> ImportResult<LeadImportRun> {
        let start_time = Instant::now();
        info!(file_path = %file_path.display(), "开始导入线索");

        let schema = self.load_schema().await?;
        let preview_limit = self.config.get_error_preview_limit().await?;

        // === 步骤 1: 解析文件 ===
        let parsed = self.file_parser.parse_file(file_path)?;

        // === 步骤 2: 映射建议 + 覆盖 ===
        let mut session = ImportSession::new(schema.clone());
        session.upload(parsed)?;
        for (header, target) in overrides {
            debug!(header = %header, target = %target, "应用映射覆盖");
            session.set_target(header, target.clone())?;
        }

        // === 步骤 3: 冻结映射 + 行校验 ===
        session.review()?;

        // === 步骤 4: 批量写入 ===
        let executor = ImportExecutor::new(Arc::clone(&self.store), schema);
        session.submit(&executor, tenant_id).await?;

        // === 步骤 5: 报告 ===
        let report = session.report(&ResultReporter::new(preview_limit))?;
        let elapsed = start_time.elapsed();
        info!(
            success_count = report.success_count,
            error_count = report.error_count,
            elapsed_ms = elapsed.as_millis() as u64,
            "线索导入完成"
        );

        let (Some(mapping), Some(validation)) = (session.mapping(), session.validation()) else {
            return Err(ImportError::InternalError(
                "导入会话缺少映射或校验结果".to_string(),
            ));
        };

        Ok(LeadImportRun {
            mapping: mapping.clone(),
            validation: validation.clone(),
            report,
            elapsed,
        })
    }
}

// ==========================================
// CRM 线索导入 - 导入会话（分步状态机）
// ==========================================
// 阶段: Upload → Mapping → Review → Result
// 约束:
// - 同一会话内各阶段串行，必须显式推进
// - 会话独占自身的映射/行/校验状态，不与其他会话共享
// - 任一阶段可 restart 回到 Upload，已有状态全部丢弃
// ==========================================

use crate::domain::import::{HeaderMapping, ImportOutcome, ParsedFile, ValidationReport};
use crate::domain::types::{ImportStage, MappingTarget};
use crate::importer::column_mapper::{ColumnMapper, FrozenMapping};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_executor::ImportExecutor;
use crate::importer::result_reporter::{ImportReport, ResultReporter};
use crate::importer::row_validator::RowValidator;
use crate::importer::schema::SchemaRegistry;
use crate::repository::LeadStore;
use tracing::{info, warn};

pub struct ImportSession {
    stage: ImportStage,
    mapper: ColumnMapper,
    validator: RowValidator,

    parsed: Option<ParsedFile>,
    mapping: Option<HeaderMapping>,
    frozen: Option<FrozenMapping>,
    validation: Option<ValidationReport>,
    outcome: Option<ImportOutcome>,
}

impl ImportSession {
    pub fn new(schema: SchemaRegistry) -> Self {
        Self {
            stage: ImportStage::Upload,
            mapper: ColumnMapper,
            validator: RowValidator::new(schema),
            parsed: None,
            mapping: None,
            frozen: None,
            validation: None,
            outcome: None,
        }
    }

    pub fn stage(&self) -> ImportStage {
        self.stage
    }

    pub fn schema(&self) -> &SchemaRegistry {
        self.validator.schema()
    }

    pub fn parsed(&self) -> Option<&ParsedFile> {
        self.parsed.as_ref()
    }

    /// 当前映射（Mapping 阶段可变，Review 之后为冻结快照）
    pub fn mapping(&self) -> Option<&HeaderMapping> {
        match &self.frozen {
            Some(frozen) => Some(frozen.mapping()),
            None => self.mapping.as_ref(),
        }
    }

    pub fn validation(&self) -> Option<&ValidationReport> {
        self.validation.as_ref()
    }

    pub fn outcome(&self) -> Option<&ImportOutcome> {
        self.outcome.as_ref()
    }

    fn expect_stage(&self, expected: ImportStage) -> ImportResult<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(ImportError::InvalidStage {
                expected,
                actual: self.stage,
            })
        }
    }

    /// 上传文件并生成映射建议（Upload → Mapping）
    pub fn upload(&mut self, parsed: ParsedFile) -> ImportResult<&HeaderMapping> {
        self.expect_stage(ImportStage::Upload)?;
        if let Some(dup) = parsed.duplicate_header() {
            return Err(ImportError::DuplicateHeader(dup.to_string()));
        }

        let mapping = self.mapper.suggest(&parsed.headers, self.validator.schema());
        info!(
            file_name = ?parsed.file_name,
            columns = parsed.headers.len(),
            rows = parsed.rows.len(),
            mapped = mapping.mapped_fields().len(),
            "文件已上传，生成列映射建议"
        );

        self.parsed = Some(parsed);
        self.stage = ImportStage::Mapping;
        Ok(&*self.mapping.insert(mapping))
    }

    /// 用户调整某列映射（仅 Mapping 阶段）
    pub fn set_target(&mut self, header: &str, target: MappingTarget) -> ImportResult<()> {
        self.expect_stage(ImportStage::Mapping)?;

        let mapping = self
            .mapping
            .as_mut()
            .ok_or_else(|| ImportError::InternalError("映射阶段缺少映射".to_string()))?;
        self.mapper
            .assign(mapping, self.validator.schema(), header, target)
    }

    /// 撤销某列的手动映射，恢复自动建议（仅 Mapping 阶段）
    pub fn clear_target(&mut self, header: &str) -> ImportResult<()> {
        self.expect_stage(ImportStage::Mapping)?;

        let mapping = self
            .mapping
            .as_mut()
            .ok_or_else(|| ImportError::InternalError("映射阶段缺少映射".to_string()))?;
        if mapping.clear_override(header) {
            Ok(())
        } else {
            Err(ImportError::UnknownHeader(header.to_string()))
        }
    }

    /// 冻结映射并校验全部行（Mapping → Review）
    ///
    /// 映射不完整/重复时停留在 Mapping 阶段并返回错误
    pub fn review(&mut self) -> ImportResult<&ValidationReport> {
        self.expect_stage(ImportStage::Mapping)?;

        let (Some(mapping), Some(parsed)) = (self.mapping.as_ref(), self.parsed.as_ref()) else {
            return Err(ImportError::InternalError("映射阶段缺少上传数据".to_string()));
        };

        let frozen = self.mapper.freeze(mapping.clone())?;
        let report = match self.validator.validate(&frozen, &parsed.rows) {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "映射校验未通过，返回映射阶段");
                return Err(e);
            }
        };

        self.frozen = Some(frozen);
        self.stage = ImportStage::Review;
        Ok(&*self.validation.insert(report))
    }

    /// 从复核返回映射阶段（Review → Mapping）
    pub fn back_to_mapping(&mut self) -> ImportResult<()> {
        self.expect_stage(ImportStage::Review)?;

        if let Some(frozen) = self.frozen.take() {
            self.mapping = Some(frozen.into_inner());
        }
        self.validation = None;
        self.stage = ImportStage::Mapping;
        Ok(())
    }

    /// 提交有效记录（Review → Result）
    ///
    /// 存储层失败不会返回 Err，而是体现在 ImportOutcome 中
    pub async fn submit<S>(
        &mut self,
        executor: &ImportExecutor<S>,
        tenant_id: &str,
    ) -> ImportResult<&ImportOutcome>
    where
        S: LeadStore,
    {
        self.expect_stage(ImportStage::Review)?;

        let records = self
            .validation
            .as_ref()
            .map(|v| v.valid.clone())
            .ok_or_else(|| ImportError::InternalError("复核阶段缺少校验结果".to_string()))?;

        let outcome = executor.execute(records, tenant_id).await;

        self.stage = ImportStage::Result;
        Ok(&*self.outcome.insert(outcome))
    }

    /// 生成最终报告（仅 Result 阶段）
    pub fn report(&self, reporter: &ResultReporter) -> ImportResult<ImportReport> {
        self.expect_stage(ImportStage::Result)?;

        match (&self.validation, &self.outcome) {
            (Some(validation), Some(outcome)) => Ok(reporter.build_report(validation, outcome)),
            _ => Err(ImportError::InternalError("结果阶段缺少导入结果".to_string())),
        }
    }

    /// 丢弃全部状态，回到 Upload
    pub fn restart(&mut self) {
        self.parsed = None;
        self.mapping = None;
        self.frozen = None;
        self.validation = None;
        self.outcome = None;
        self.stage = ImportStage::Upload;
    }
}

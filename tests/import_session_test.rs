// ==========================================
// ImportSession 集成测试
// ==========================================
// 测试目标: 分步导入流程（上传 → 映射 → 复核 → 结果）
// ==========================================


use async_trait::async_trait;
use crm_lead_import::importer::CsvParser;
use crm_lead_import::repository::RepositoryResult;
use crm_lead_import::{
    ImportError, ImportExecutor, ImportSession, ImportStage, Lead, LeadFilter, LeadRepositoryImpl,
    LeadStore, MappingTarget, NewLead, RepositoryError, ResultReporter, SchemaRegistry,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use test_helpers::{create_test_db, open_shared};

const CSV: &str = "\
Full Name,Contact,Stat,Notes
Jane Doe,jane@example.com,Qualified,met at expo
John Roe,john@example,Contacted,
,anon@example.com,New,
";

/// 始终拒绝写入的存储（模拟权限/传输失败）
#[derive(Default)]
struct RejectingStore {
    calls: AtomicUsize,
}

#[async_trait]
impl LeadStore for RejectingStore {
    async fn bulk_insert(&self, _leads: Vec<NewLead>) -> RepositoryResult<Vec<Lead>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RepositoryError::DatabaseConnectionError(
            "permission denied".to_string(),
        ))
    }

    async fn list(&self, _tenant_id: &str, _filter: &LeadFilter) -> RepositoryResult<Vec<Lead>> {
        Ok(Vec::new())
    }
}

fn uploaded_session() -> ImportSession {
    let mut session = ImportSession::new(SchemaRegistry::leads());
    session
        .upload(CsvParser.parse_text(CSV).unwrap())
        .unwrap();
    session
}

#[tokio::test]
async fn test_full_session_against_sqlite() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let store = LeadRepositoryImpl::from_connection(open_shared(&db_path));
    let executor = ImportExecutor::new(store, SchemaRegistry::leads());

    let mut session = uploaded_session();
    assert_eq!(session.stage(), ImportStage::Mapping);

    // Contact 无法自动识别，必须手动映射
    assert!(matches!(
        session.review(),
        Err(ImportError::MissingRequiredMappings { .. })
    ));
    session
        .set_target("Contact", MappingTarget::Field("email".to_string()))
        .unwrap();
    session
        .set_target("Stat", MappingTarget::Field("status".to_string()))
        .unwrap();

    let validation = session.review().unwrap();
    assert_eq!(validation.valid.len(), 1);
    assert_eq!(validation.errors.len(), 2);

    // 复核阶段不允许改映射
    assert!(matches!(
        session.set_target("Notes", MappingTarget::Ignore),
        Err(ImportError::InvalidStage {
            expected: ImportStage::Mapping,
            actual: ImportStage::Review,
        })
    ));

    let outcome = session.submit(&executor, "org-1").await.unwrap();
    assert_eq!(outcome.success_count, 1);
    assert_eq!(outcome.error_count, 0);
    assert_eq!(session.stage(), ImportStage::Result);

    let report = session.report(&ResultReporter::default()).unwrap();
    assert_eq!(report.total_rows, 3);
    assert_eq!(report.success_count, 1);
    assert_eq!(report.error_count, 2);

    let leads = executor
        .store()
        .list("org-1", &LeadFilter::default())
        .await
        .unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].status, "Qualified");
    assert_eq!(leads[0].notes.as_deref(), Some("met at expo"));

    // 结果阶段不能再次提交
    assert!(session.submit(&executor, "org-1").await.is_err());

    session.restart();
    assert_eq!(session.stage(), ImportStage::Upload);
    assert!(session.outcome().is_none());
}

#[tokio::test]
async fn test_boundary_failure_surfaces_in_report() {
    let executor = ImportExecutor::new(RejectingStore::default(), SchemaRegistry::leads());

    let mut session = uploaded_session();
    session
        .set_target("Contact", MappingTarget::Field("email".to_string()))
        .unwrap();
    session.review().unwrap();

    let outcome = session.submit(&executor, "org-1").await.unwrap();
    assert_eq!(outcome.success_count, 0);
    assert_eq!(outcome.error_count, 1);
    assert!(outcome.error_details.is_none());
    assert!(outcome.batch_error.is_some());
    assert_eq!(executor.store().calls.load(Ordering::SeqCst), 1);

    let reporter = ResultReporter::default();
    let report = session.report(&reporter).unwrap();
    assert_eq!(report.error_count, 3);
    assert!(reporter.render_summary(&report).contains("permission denied"));
}

#[tokio::test]
async fn test_all_rows_invalid_skips_submission() {
    let executor = ImportExecutor::new(RejectingStore::default(), SchemaRegistry::leads());

    let mut session = ImportSession::new(SchemaRegistry::leads());
    session
        .upload(CsvParser.parse_text("Name,Email\nJane,not-an-email\n").unwrap())
        .unwrap();
    session.review().unwrap();

    let outcome = session.submit(&executor, "org-1").await.unwrap();
    assert_eq!(outcome.submitted_count, 0);
    assert!(outcome.batch_error.is_none());
    assert_eq!(executor.store().calls.load(Ordering::SeqCst), 0);

    let report = session.report(&ResultReporter::default()).unwrap();
    assert_eq!(report.success_count, 0);
    assert_eq!(report.error_count, 1);
}

#[test]
fn test_duplicate_header_never_reaches_mapping() {
    let err = CsvParser
        .parse_text("Name,Email,Email\nJane,bad,jane@x.com\n")
        .unwrap_err();
    assert!(matches!(err, ImportError::DuplicateHeader(ref h) if h == "Email"));

    // 去掉重复列后可正常忽略多余列
    let mut session = ImportSession::new(SchemaRegistry::leads());
    session
        .upload(
            CsvParser
                .parse_text("Name,Email,Work Email\nJane,jane@x.com,bad\n")
                .unwrap(),
        )
        .unwrap();
    session.set_target("Work Email", MappingTarget::Ignore).unwrap();
    let validation = session.review().unwrap();
    assert_eq!(validation.valid.len(), 1);
    assert_eq!(validation.valid[0].get("email"), Some("jane@x.com"));
}

// ==========================================
// CRM 线索导入 - 命令行入口
// ==========================================
// 命令: preview / import / list / set-config
// 日志写 stderr，结果写 stdout
// ==========================================

use anyhow::{bail, Context, Result};
use clap::Parser;
use commands::Commands;
use crm_lead_import::config::ConfigManager;
use crm_lead_import::db::{default_db_path, open_and_init};
use crm_lead_import::logging::{self, LogFormat};
use crm_lead_import::{
    LeadFilter, LeadImporter, LeadRepositoryImpl, LeadStore, MappingTarget, ResultReporter,
};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

mod commands;

#[derive(Parser)]
#[command(name = "crm-lead-import", version, about = "CRM 线索批量导入")]
struct Cli {
    #[arg(long, global = true, help = "以 JSON 格式输出日志")]
    json_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_with_format(if cli.json_log {
        LogFormat::Json
    } else {
        LogFormat::Text
    });
    tracing::debug!(version = crm_lead_import::VERSION, "{}", crm_lead_import::APP_NAME);

    match cli.command {
        Commands::Preview { file, db } => {
            let conn = open_db(db)?;
            let importer = importer_for(conn);

            let (parsed, mapping) = importer.preview(&file).await?;
            println!(
                "文件: {}（{} 列，{} 行数据）",
                file.display(),
                parsed.headers.len(),
                parsed.rows.len()
            );
            for entry in mapping.entries() {
                println!("  {:<24} -> {}", entry.header, entry.effective());
            }
        }

        Commands::Import {
            file,
            tenant,
            db,
            maps,
            ignores,
            error_report,
            json,
        } => {
            let overrides = build_overrides(&maps, &ignores)?;
            let conn = open_db(db)?;
            let importer = importer_for(conn);

            let run = importer.import_file(&file, &tenant, &overrides).await?;

            let reporter = ResultReporter::default();
            if json {
                println!("{}", serde_json::to_string_pretty(&run.report)?);
            } else {
                print!("{}", reporter.render_summary(&run.report));
            }

            if let Some(out) = error_report {
                reporter
                    .write_error_csv(&run.report.details, &out)
                    .with_context(|| format!("无法写出错误报告: {}", out.display()))?;
                println!("错误报告已写出: {}", out.display());
            }
        }

        Commands::List {
            tenant,
            db,
            status,
            limit,
        } => {
            let conn = open_db(db)?;
            let store = LeadRepositoryImpl::from_connection(conn);

            let leads = store.list(&tenant, &LeadFilter { status, limit }).await?;
            for lead in &leads {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    lead.created_at.format("%Y-%m-%d %H:%M:%S"),
                    lead.status,
                    lead.name,
                    lead.email.as_deref().unwrap_or("-"),
                    lead.company.as_deref().unwrap_or("-"),
                );
            }
            println!("共 {} 条", leads.len());
        }

        Commands::SetConfig { key, value, db } => {
            let conn = open_db(db)?;
            ConfigManager::from_connection(conn).set_config_value(&key, &value)?;
            println!("{} = {}", key, value);
        }
    }

    Ok(())
}

fn open_db(db: Option<PathBuf>) -> Result<Arc<Mutex<Connection>>> {
    let path = db.unwrap_or_else(default_db_path);
    let path_str = path
        .to_str()
        .with_context(|| format!("数据库路径不是有效 UTF-8: {}", path.display()))?;

    tracing::info!(db_path = %path_str, "打开数据库");
    let conn = open_and_init(path_str)
        .with_context(|| format!("无法打开数据库: {}", path_str))?;
    Ok(Arc::new(Mutex::new(conn)))
}

fn importer_for(conn: Arc<Mutex<Connection>>) -> LeadImporter<LeadRepositoryImpl, ConfigManager> {
    let store = Arc::new(LeadRepositoryImpl::from_connection(Arc::clone(&conn)));
    LeadImporter::new(store, ConfigManager::from_connection(conn))
}

/// 解析 --map "Header=field" 与 --ignore Header
fn build_overrides(maps: &[String], ignores: &[String]) -> Result<Vec<(String, MappingTarget)>> {
    let mut overrides = Vec::with_capacity(maps.len() + ignores.len());

    for raw in maps {
        // 表头可能包含 '='，字段 ID 不会
        let Some((header, field)) = raw.rsplit_once('=') else {
            bail!("--map 参数格式应为 Header=field: {}", raw);
        };
        let (header, field) = (header.trim(), field.trim());
        if header.is_empty() || field.is_empty() {
            bail!("--map 参数格式应为 Header=field: {}", raw);
        }
        overrides.push((header.to_string(), MappingTarget::Field(field.to_string())));
    }

    for header in ignores {
        overrides.push((header.trim().to_string(), MappingTarget::Ignore));
    }

    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_overrides() {
        let overrides = build_overrides(
            &["Contact = email".to_string(), "a=b=name".to_string()],
            &["Internal ID".to_string()],
        )
        .unwrap();

        assert_eq!(
            overrides,
            vec![
                ("Contact".to_string(), MappingTarget::Field("email".to_string())),
                ("a=b".to_string(), MappingTarget::Field("name".to_string())),
                ("Internal ID".to_string(), MappingTarget::Ignore),
            ]
        );
    }

    #[test]
    fn test_build_overrides_rejects_malformed() {
        assert!(build_overrides(&["Contact".to_string()], &[]).is_err());
        assert!(build_overrides(&["=email".to_string()], &[]).is_err());
    }
}

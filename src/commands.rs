use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// 解析文件并显示列映射建议（不写入）
    Preview {
        #[arg(long, help = "CSV / Excel 文件路径")]
        file: PathBuf,

        #[arg(long, env = "CRM_LEAD_IMPORT_DB_PATH", help = "数据库路径")]
        db: Option<PathBuf>,
    },

    /// 导入线索
    Import {
        #[arg(long, help = "CSV / Excel 文件路径")]
        file: PathBuf,

        #[arg(long, help = "租户 ID")]
        tenant: String,

        #[arg(long, env = "CRM_LEAD_IMPORT_DB_PATH", help = "数据库路径")]
        db: Option<PathBuf>,

        #[arg(long = "map", value_name = "HEADER=FIELD", help = "覆盖列映射，可重复")]
        maps: Vec<String>,

        #[arg(long = "ignore", value_name = "HEADER", help = "忽略某列，可重复")]
        ignores: Vec<String>,

        #[arg(long, value_name = "OUT.csv", help = "错误报告输出路径")]
        error_report: Option<PathBuf>,

        #[arg(long, help = "以 JSON 输出报告")]
        json: bool,
    },

    /// 查询已导入的线索
    List {
        #[arg(long, help = "租户 ID")]
        tenant: String,

        #[arg(long, env = "CRM_LEAD_IMPORT_DB_PATH", help = "数据库路径")]
        db: Option<PathBuf>,

        #[arg(long, help = "按状态过滤")]
        status: Option<String>,

        #[arg(long, help = "最多返回条数")]
        limit: Option<usize>,
    },

    /// 写入导入配置（config_kv）
    SetConfig {
        #[arg(long, help = "配置键，如 import.lead_status_values")]
        key: String,

        #[arg(long, help = "配置值")]
        value: String,

        #[arg(long, env = "CRM_LEAD_IMPORT_DB_PATH", help = "数据库路径")]
        db: Option<PathBuf>,
    },
}

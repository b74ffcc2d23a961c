// ==========================================
// 物料库存对账系统 - 命令行入口
// ==========================================
// 子命令: preview / import / history / changes / delete / materials / stats
// 选项: --db 指定数据库（缺省读 STOCK_RECONCILE_DB 或用户数据目录）
//       --json-log 以 JSON 行格式输出日志（stderr）
// 输出: ApiResponse JSON（stdout）
// ==========================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use stock_reconcile::api::{ApiError, ApiResponse};
use stock_reconcile::app::{get_default_db_path, AppState};
use stock_reconcile::domain::{MaterialQuery, MaterialSortField, SortOrder};

#[derive(Debug, Parser)]
#[command(name = "stock-reconcile")]
#[command(about = "物料库存对账: 快照导入、差异检测与可撤销台账")]
#[command(version)]
struct Cli {
    /// 数据库文件路径
    #[arg(long, global = true)]
    db: Option<String>,

    /// 日志输出为 JSON 行
    #[arg(long, global = true)]
    json_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 预览快照与当前目录的差异（不写库）
    Preview { file: PathBuf },

    /// 预览并提交快照
    Import { file: PathBuf },

    /// 导入历史（最新在前）
    History {
        #[arg(default_value_t = 1)]
        page: u32,
        /// 0 = 返回全部
        #[arg(default_value_t = 20)]
        limit: u32,
    },

    /// 某次导入的台账明细
    Changes { history_id: String },

    /// 删除导入历史（最近一次导入会被撤销）
    Delete { history_id: String },

    /// 物料列表
    Materials {
        /// 按编码/名称模糊搜索
        search: Option<String>,

        /// 包含已停用物料
        #[arg(long)]
        all: bool,

        #[arg(long, default_value_t = 1)]
        page: u32,

        /// 0 = 返回全部
        #[arg(long, default_value_t = 0)]
        limit: u32,

        /// code / name / quantity / sequence
        #[arg(long, default_value = "code")]
        sort: MaterialSortField,

        /// asc / desc
        #[arg(long, default_value = "asc")]
        order: SortOrder,
    },

    /// 目录总览
    Stats,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.json_log {
        stock_reconcile::logging::init_json();
    } else {
        stock_reconcile::logging::init();
    }

    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    tracing::info!("{} v{}", stock_reconcile::APP_NAME, stock_reconcile::VERSION);
    tracing::info!("使用数据库: {}", db_path);

    let state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Preview { file } => emit(state.import_api.preview_file(&file).await),
        Commands::Import { file } => emit(state.import_api.import_file(&file).await),
        Commands::History { page, limit } => emit(state.history_api.list_histories(page, limit)),
        Commands::Changes { history_id } => emit(state.history_api.get_changes(&history_id)),
        Commands::Delete { history_id } => emit(state.history_api.delete_history(&history_id)),
        Commands::Materials {
            search,
            all,
            page,
            limit,
            sort,
            order,
        } => {
            let query = MaterialQuery {
                search,
                include_inactive: all,
                page,
                limit,
                sort_by: sort,
                order,
            };
            emit(state.material_api.list_materials(&query))
        }
        Commands::Stats => emit(state.dashboard_api.get_stats()),
    }
}

fn emit<T: Serialize>(result: Result<T, ApiError>) -> ExitCode {
    let response = ApiResponse::from_result(result);
    println!("{}", response.to_json());
    if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

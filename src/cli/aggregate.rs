//! # aggregate 子命令 CLI 定义
//!
//! 聚合四类筛选数据并导出按式记录
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/aggregate.rs`

use clap::Args;
use std::path::PathBuf;

/// 文档库连接参数（aggregate / edges 共用）
#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Path to the store config file (JSON with "root" and optional "path_map")
    #[arg(long, env = "TCOAGG_DB_CONFIG")]
    pub db_config: Option<PathBuf>,

    /// Directory holding the collection JSON files (overrides the config file)
    #[arg(long)]
    pub db_root: Option<PathBuf>,

    /// Calculation directory prefix substitution, FROM=TO (overrides the config file)
    #[arg(long)]
    pub path_map: Option<String>,
}

/// aggregate 子命令参数
#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// Chemical formulas to aggregate (e.g. MgO Al2O3 SnO2)
    #[arg(required_unless_present = "formula_file", value_parser = super::parse_formula)]
    pub formulas: Vec<String>,

    /// Read additional formulas from a file, one per line (# starts a comment)
    #[arg(long)]
    pub formula_file: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Output JSON file for the aggregated records
    #[arg(long, default_value = "p_type_tco.json")]
    pub output: PathBuf,

    /// Also export a flat CSV of the records
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Scatter plot of average hole mass vs optical gap (PNG)
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Parallel jobs for potential extraction (0 = all cores)
    #[arg(long, short = 'j', default_value_t = 0)]
    pub jobs: usize,
}

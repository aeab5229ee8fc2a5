//! # edges 子命令 CLI 定义
//!
//! 查看两来源能带边的调和结果
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/edges.rs`

use super::aggregate::StoreArgs;
use clap::Args;
use std::path::PathBuf;

/// edges 子命令参数
#[derive(Args, Debug)]
pub struct EdgesArgs {
    /// Chemical formulas to inspect
    #[arg(required = true, value_parser = super::parse_formula)]
    pub formulas: Vec<String>,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Optional JSON export of the reconciled edges
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Optional CSV export of the reconciled edges
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

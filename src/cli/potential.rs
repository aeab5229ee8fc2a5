//! # potential 子命令 CLI 定义
//!
//! 从计算目录提取氧芯静电势
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/potential.rs`

use clap::Args;
use std::path::PathBuf;

/// potential 子命令参数
#[derive(Args, Debug)]
pub struct PotentialArgs {
    /// Calculation directory (must hold CONTCAR + OUTCAR), or a parent to scan
    pub root: PathBuf,

    /// Scan subdirectories of ROOT for calculation folders
    #[arg(long, short = 'r')]
    pub recursive: bool,

    /// Glob pattern matched against calculation directory names (with --recursive)
    #[arg(long, default_value = "*")]
    pub pattern: String,

    /// Parallel jobs (0 = all cores)
    #[arg(long, short = 'j', default_value_t = 0)]
    pub jobs: usize,

    /// Optional CSV export of per-directory results
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `aggregate/`, `store/`, `potential/`, `utils/`
//! - 子模块: aggregate, edges, potential

pub mod aggregate;
pub mod edges;
pub mod potential;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Aggregate(args) => aggregate::execute(args),
        Commands::Edges(args) => edges::execute(args),
        Commands::Potential(args) => potential::execute(args),
    }
}

//! # Tcoagg - p 型透明导电氧化物筛选数据聚合器
//!
//! 把分散在文档库与 VASP 计算目录中的筛选物性按化学式聚合成
//! 完整记录：有效质量、光学带隙、两来源调和的能带边、氧芯静电势。
//!
//! ## 子命令
//! - `aggregate` - 聚合四类数据并导出按式记录
//! - `edges`     - 查看两来源能带边的调和结果
//! - `potential` - 从计算目录提取氧芯静电势
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── aggregate/ (按式聚合)
//!   │     ├── store/     (文档库访问)
//!   │     ├── potential/ (氧芯静电势提取)
//!   │     │     └── parsers/ (VASP 输出解析)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod aggregate;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod potential;
mod store;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}

//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `aggregate`: 聚合四类筛选数据成按式记录
//! - `edges`: 查看两来源能带边的调和结果
//! - `potential`: 从计算目录提取氧芯静电势
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: aggregate, edges, potential

pub mod aggregate;
pub mod edges;
pub mod potential;

use clap::{Parser, Subcommand};
use regex::Regex;

/// Tcoagg - p 型透明导电氧化物筛选数据聚合器
#[derive(Parser)]
#[command(name = "tcoagg")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Aggregates p-type TCO screening data into per-formula records", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate every screening category into per-formula records
    Aggregate(aggregate::AggregateArgs),

    /// Show reconciled band edges from the absorption and band sources
    Edges(edges::EdgesArgs),

    /// Extract oxygen core potentials from calculation directories
    Potential(potential::PotentialArgs),
}

/// 校验化学式参数 (例: MgO, Al2O3, SnO2)
pub(crate) fn parse_formula(value: &str) -> std::result::Result<String, String> {
    let re = Regex::new(r"^([A-Z][a-z]?\d*)+$").unwrap();
    if re.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(format!("'{}' is not a chemical formula", value))
    }
}

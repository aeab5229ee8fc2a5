//! # potential 子命令实现
//!
//! 扫描计算目录并批量提取氧芯静电势。
//!
//! ## 功能
//! - 单目录提取，或用 --recursive 递归查找含 CONTCAR/OUTCAR 的目录
//! - rayon 并行提取，逐目录报告失败
//! - 未正常收尾的计算不进入表格与 CSV
//! - 终端表格与可选 CSV 导出
//!
//! ## 依赖关系
//! - 使用 `cli/potential.rs` 定义的参数
//! - 使用 `potential/` 提取逻辑
//! - 使用 `utils/output.rs`

use crate::cli::potential::PotentialArgs;
use crate::error::{Result, TcoaggError};
use crate::models::OxygenPotentialEntry;
use crate::potential;
use crate::utils::output;

use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 提取结果行
#[derive(Debug, Clone, Tabled)]
struct PotentialRow {
    #[tabled(rename = "Directory")]
    dir: String,
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "O sites")]
    oxygen_sites: String,
    #[tabled(rename = "Average (eV)")]
    average: String,
    #[tabled(rename = "Spread (eV)")]
    spread: String,
}

/// 执行氧芯静电势提取
pub fn execute(args: PotentialArgs) -> Result<()> {
    output::print_header("Extracting Oxygen Core Potentials");

    let dirs = if args.recursive {
        potential::scan_calculation_dirs(&args.root, &args.pattern)?
    } else {
        if !args.root.is_dir() {
            return Err(TcoaggError::DirectoryNotFound {
                path: args.root.display().to_string(),
            });
        }
        vec![args.root.clone()]
    };

    if dirs.is_empty() {
        output::print_warning(&format!(
            "No calculation directories under '{}' match '{}'",
            args.root.display(),
            args.pattern
        ));
        return Ok(());
    }
    output::print_info(&format!("Found {} calculation directories", dirs.len()));

    let results = potential::extract_many(&dirs, args.jobs);
    let total = results.len();
    let (extracted, failed, unfinished) = finished_results(results);

    if extracted.is_empty() {
        output::print_warning("No directory yielded oxygen potentials.");
        return Ok(());
    }

    let mut rows: Vec<PotentialRow> = Vec::new();
    let mut csv_rows: Vec<CsvRow> = Vec::new();

    for (dir, sites) in &extracted {
        let entry = OxygenPotentialEntry::new(sites.potentials.clone());
        rows.push(PotentialRow {
            dir: dir.display().to_string(),
            formula: sites.formula.clone(),
            oxygen_sites: format!("{}/{}", sites.potentials.len(), sites.total_sites),
            average: format_option(entry.average()),
            spread: format_option(entry.spread()),
        });
        csv_rows.push(CsvRow {
            dir: dir.display().to_string(),
            formula: sites.formula.clone(),
            entry,
            total_sites: sites.total_sites,
        });
    }

    let table = Table::new(&rows);
    println!("{}", table);

    if let Some(ref csv_path) = args.csv {
        save_potentials_csv(&csv_rows, csv_path)?;
        output::print_success(&format!("CSV saved to '{}'", csv_path.display()));
    }

    output::print_done(&format!(
        "{} of {} directories extracted ({} failed, {} unfinished)",
        rows.len(),
        total,
        failed,
        unfinished
    ));

    Ok(())
}

/// 把提取结果按是否可用分流
///
/// 未正常收尾的 OUTCAR，其最后一个势能块是中间离子步，不计入结果。
fn finished_results(
    results: Vec<(PathBuf, Result<potential::OxygenSites>)>,
) -> (Vec<(PathBuf, potential::OxygenSites)>, usize, usize) {
    let mut finished = Vec::new();
    let mut failed = 0usize;
    let mut unfinished = 0usize;

    for (dir, result) in results {
        match result {
            Ok(sites) if sites.is_finished => finished.push((dir, sites)),
            Ok(_) => {
                unfinished += 1;
                output::print_warning(&format!(
                    "{}: calculation did not finish, skipping",
                    dir.display()
                ));
            }
            Err(e) => {
                failed += 1;
                output::print_error(&format!("{}: {}", dir.display(), e));
            }
        }
    }

    (finished, failed, unfinished)
}

struct CsvRow {
    dir: String,
    formula: String,
    entry: OxygenPotentialEntry,
    total_sites: usize,
}

fn format_option(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "-".to_string(),
    }
}

/// 保存提取结果到 CSV
fn save_potentials_csv(rows: &[CsvRow], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| TcoaggError::CsvError(e))?;

    wtr.write_record([
        "dir",
        "formula",
        "n_oxygen_sites",
        "n_total_sites",
        "average",
        "spread",
    ])
    .map_err(|e| TcoaggError::CsvError(e))?;

    for row in rows {
        wtr.write_record(&[
            row.dir.clone(),
            row.formula.clone(),
            row.entry.potentials.len().to_string(),
            row.total_sites.to_string(),
            row.entry
                .average()
                .map(|v| format!("{:.10}", v))
                .unwrap_or_default(),
            row.entry
                .spread()
                .map(|v| format!("{:.10}", v))
                .unwrap_or_default(),
        ])
        .map_err(|e| TcoaggError::CsvError(e))?;
    }

    wtr.flush().map_err(|e| TcoaggError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

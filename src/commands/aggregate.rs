//! # aggregate 子命令实现
//!
//! 聚合四类筛选数据并导出按式记录。
//!
//! ## 功能
//! - 解析数据库配置与命令行覆盖项
//! - 驱动聚合器，逐式报告跳过原因
//! - 终端表格、JSON / CSV 导出
//! - 可选绘制「空穴质量 - 光学带隙」筛选散点图
//!
//! ## 依赖关系
//! - 使用 `cli/aggregate.rs` 定义的参数
//! - 使用 `aggregate/`, `store/`
//! - 使用 `utils/output.rs`

use crate::aggregate::Aggregator;
use crate::cli::aggregate::{AggregateArgs, StoreArgs};
use crate::error::{Result, TcoaggError};
use crate::models::TcoRecord;
use crate::store::{JsonDirStore, StoreConfig};
use crate::utils::output;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tabled::{Table, Tabled};

/// 聚合结果行
#[derive(Debug, Clone, Tabled)]
struct RecordRow {
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "ave p mass")]
    ave_p_mass: String,
    #[tabled(rename = "min p mass")]
    min_p_mass: String,
    #[tabled(rename = "Optical gap (eV)")]
    optical_gap: String,
    #[tabled(rename = "Band gap (eV)")]
    band_gap: String,
    #[tabled(rename = "VBM diff")]
    vbm_diff: String,
    #[tabled(rename = "CBM diff")]
    cbm_diff: String,
}

/// 解析配置并打开文档库
pub(crate) fn open_store(args: &StoreArgs) -> Result<(JsonDirStore, StoreConfig)> {
    let config = StoreConfig::resolve(
        args.db_config.as_deref(),
        args.db_root.as_deref(),
        args.path_map.as_deref(),
    )?;
    let store = JsonDirStore::open(&config.root)?;
    Ok((store, config))
}

/// 合并命令行化学式与 --formula-file 文件中的化学式
fn collect_formulas(args: &AggregateArgs) -> Result<Vec<String>> {
    let mut formulas = args.formulas.clone();

    if let Some(ref path) = args.formula_file {
        let content = fs::read_to_string(path).map_err(|e| TcoaggError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        for line in content.lines() {
            let entry = line.split('#').next().unwrap_or("").trim();
            if entry.is_empty() {
                continue;
            }
            formulas.push(
                crate::cli::parse_formula(entry)
                    .map_err(|_| TcoaggError::InvalidFormula(entry.to_string()))?,
            );
        }
    }

    if formulas.is_empty() {
        return Err(TcoaggError::InvalidArgument(
            "no formulas to aggregate".to_string(),
        ));
    }

    Ok(formulas)
}

/// 执行聚合
pub fn execute(args: AggregateArgs) -> Result<()> {
    output::print_header("Aggregating p-type TCO Screening Data");

    let formulas = collect_formulas(&args)?;
    let (store, config) = open_store(&args.store)?;
    output::print_info(&format!(
        "Store '{}', {} formula(s) requested",
        config.root.display(),
        formulas.len()
    ));

    let outcome = Aggregator::new(&store)
        .with_path_map(config.path_map.clone())
        .with_jobs(args.jobs)
        .aggregate(&formulas)?;

    for skipped in &outcome.skipped {
        let missing: Vec<String> = skipped.missing.iter().map(|c| c.to_string()).collect();
        output::print_skip(&format!("{}: missing {}", skipped.formula, missing.join(", ")));
    }

    if outcome.records.is_empty() {
        output::print_warning("No formula had data in every category.");
        return Ok(());
    }

    let rows: Vec<RecordRow> = outcome
        .records
        .iter()
        .map(|(formula, r)| RecordRow {
            formula: formula.clone(),
            ave_p_mass: format!("{:.3}", r.ave_p_mass),
            min_p_mass: format!("{:.3}", r.min_p_mass),
            optical_gap: format!("{:.3}", r.optical_gap),
            band_gap: format!("{:.3}", r.band_gap),
            vbm_diff: format!("{:.3}", r.vbm_diff),
            cbm_diff: format!("{:.3}", r.cbm_diff),
        })
        .collect();

    let table = Table::new(&rows);
    println!("{}", table);

    save_records_json(&outcome.records, &args.output)?;
    output::print_success(&format!("Records saved to '{}'", args.output.display()));

    if let Some(ref csv_path) = args.csv {
        save_records_csv(&outcome.records, csv_path)?;
        output::print_success(&format!("CSV saved to '{}'", csv_path.display()));
    }

    if let Some(ref plot_path) = args.plot {
        plot_mass_vs_gap(&outcome.records, plot_path)?;
        output::print_success(&format!(
            "Screening plot saved to '{}'",
            plot_path.display()
        ));
    }

    output::print_done(&format!(
        "{} record(s) aggregated, {} skipped",
        outcome.records.len(),
        outcome.skipped.len()
    ));

    Ok(())
}

/// 按互操作 schema 写出 JSON 文档
fn save_records_json(records: &BTreeMap<String, TcoRecord>, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).map_err(|e| TcoaggError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 保存扁平 CSV
fn save_records_csv(records: &BTreeMap<String, TcoRecord>, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| TcoaggError::CsvError(e))?;

    wtr.write_record([
        "formula",
        "ave_p_mass",
        "min_p_mass",
        "ave_n_mass",
        "min_n_mass",
        "optical_gap",
        "vbm",
        "cbm",
        "vbm_diff",
        "cbm_diff",
        "band_gap",
        "n_oxygen_sites",
        "oxygen_core_potential_diff",
        "vbm_from_oxygen_core_potential",
    ])
    .map_err(|e| TcoaggError::CsvError(e))?;

    for (formula, r) in records {
        wtr.write_record(&[
            formula.clone(),
            format!("{:.10}", r.ave_p_mass),
            format!("{:.10}", r.min_p_mass),
            format!("{:.10}", r.ave_n_mass),
            format!("{:.10}", r.min_n_mass),
            format!("{:.10}", r.optical_gap),
            format!("{:.10}", r.vbm_band_edge.energy),
            format!("{:.10}", r.cbm_band_edge.energy),
            format!("{:.3}", r.vbm_diff),
            format!("{:.3}", r.cbm_diff),
            format!("{:.3}", r.band_gap),
            r.oxygen_core_potentials.len().to_string(),
            format!("{:.10}", r.oxygen_core_potential_diff),
            format!("{:.10}", r.vbm_from_oxygen_core_potential),
        ])
        .map_err(|e| TcoaggError::CsvError(e))?;
    }

    wtr.flush().map_err(|e| TcoaggError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 绘制筛选散点图：平均空穴质量 vs 光学带隙
fn plot_mass_vs_gap(records: &BTreeMap<String, TcoRecord>, output_path: &Path) -> Result<()> {
    use plotters::prelude::*;

    let points: Vec<(f64, f64, String)> = records
        .iter()
        .map(|(formula, r)| (r.ave_p_mass, r.optical_gap, formula.clone()))
        .collect();

    if points.is_empty() {
        return Err(TcoaggError::Other("No data to plot".to_string()));
    }

    let x_min = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let x_max = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let y_min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let y_max = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let x_margin = ((x_max - x_min).abs() * 0.1).max(0.2);
    let y_margin = ((y_max - y_min).abs() * 0.1).max(0.2);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| TcoaggError::Other(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("p-type TCO Screening Map", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (x_min - x_margin)..(x_max + x_margin),
            (y_min - y_margin)..(y_max + y_margin),
        )
        .map_err(|e| TcoaggError::Other(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Average hole mass (m0)")
        .y_desc("Optical gap (eV)")
        .draw()
        .map_err(|e| TcoaggError::Other(e.to_string()))?;

    chart
        .draw_series(
            points
                .iter()
                .map(|(x, y, _)| Circle::new((*x, *y), 5, BLUE.filled())),
        )
        .map_err(|e| TcoaggError::Other(e.to_string()))?;

    // 式名标注在点的右侧
    chart
        .draw_series(points.iter().map(|(x, y, formula)| {
            Text::new(formula.clone(), (*x + x_margin * 0.1, *y), ("sans-serif", 14))
        }))
        .map_err(|e| TcoaggError::Other(e.to_string()))?;

    root.present()
        .map_err(|e| TcoaggError::Other(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args_with(formulas: &[&str], formula_file: Option<std::path::PathBuf>) -> AggregateArgs {
        AggregateArgs {
            formulas: formulas.iter().map(|s| s.to_string()).collect(),
            formula_file,
            store: StoreArgs {
                db_config: None,
                db_root: None,
                path_map: None,
            },
            output: std::path::PathBuf::from("p_type_tco.json"),
            csv: None,
            plot: None,
            jobs: 0,
        }
    }

    #[test]
    fn test_collect_formulas_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("formulas.txt");
        let mut f = fs::File::create(&list).unwrap();
        writeln!(f, "MgO").unwrap();
        writeln!(f, "# hybrid set").unwrap();
        writeln!(f, "  Al2O3  # corundum").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "SnO2").unwrap();

        let formulas = collect_formulas(&args_with(&["CuAlO2"], Some(list))).unwrap();
        assert_eq!(formulas, vec!["CuAlO2", "MgO", "Al2O3", "SnO2"]);
    }

    #[test]
    fn test_collect_formulas_rejects_bad_entry() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("formulas.txt");
        fs::write(&list, "MgO\nnot a formula\n").unwrap();

        let result = collect_formulas(&args_with(&[], Some(list)));
        assert!(matches!(result, Err(TcoaggError::InvalidFormula(_))));
    }

    #[test]
    fn test_collect_formulas_empty_is_error() {
        let result = collect_formulas(&args_with(&[], None));
        assert!(matches!(result, Err(TcoaggError::InvalidArgument(_))));
    }
}

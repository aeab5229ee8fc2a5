//! # edges 子命令实现
//!
//! 查看两来源能带边的调和结果与分歧度。
//!
//! ## 依赖关系
//! - 使用 `cli/edges.rs` 定义的参数
//! - 使用 `aggregate/` 的能带边拉取
//! - 使用 `utils/output.rs`

use crate::aggregate::Aggregator;
use crate::cli::edges::EdgesArgs;
use crate::error::{Result, TcoaggError};
use crate::models::BandEdgePair;
use crate::utils::output;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tabled::{Table, Tabled};

/// 能带边结果行
#[derive(Debug, Clone, Tabled)]
struct EdgeRow {
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "VBM (eV)")]
    vbm: String,
    #[tabled(rename = "CBM (eV)")]
    cbm: String,
    #[tabled(rename = "Band gap (eV)")]
    band_gap: String,
    #[tabled(rename = "VBM diff")]
    vbm_diff: String,
    #[tabled(rename = "CBM diff")]
    cbm_diff: String,
    #[tabled(rename = "Source")]
    source: String,
}

/// 执行能带边查看
pub fn execute(args: EdgesArgs) -> Result<()> {
    output::print_header("Reconciled Band Edges");

    let (store, _config) = super::aggregate::open_store(&args.store)?;

    let requested: BTreeSet<String> = args.formulas.iter().cloned().collect();
    let edges = Aggregator::new(&store).fetch_band_edges(&requested)?;

    for formula in &requested {
        if !edges.contains_key(formula) {
            output::print_skip(&format!("{}: band edges incomplete", formula));
        }
    }

    if edges.is_empty() {
        output::print_warning("No formula had band edges in both sources.");
        return Ok(());
    }

    let rows: Vec<EdgeRow> = edges
        .iter()
        .map(|(formula, pair)| EdgeRow {
            formula: formula.clone(),
            vbm: format!("{:.4}", pair.vbm.edge.energy),
            cbm: format!("{:.4}", pair.cbm.edge.energy),
            band_gap: format!("{:.3}", pair.band_gap()),
            vbm_diff: format!("{:.3}", pair.vbm.disagreement),
            cbm_diff: format!("{:.3}", pair.cbm.disagreement),
            source: pair
                .vbm
                .edge
                .data_source
                .clone()
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    let table = Table::new(&rows);
    println!("{}", table);

    if let Some(ref json_path) = args.output {
        save_edges_json(&edges, json_path)?;
        output::print_success(&format!("Edges saved to '{}'", json_path.display()));
    }

    if let Some(ref csv_path) = args.csv {
        save_edges_csv(&edges, csv_path)?;
        output::print_success(&format!("CSV saved to '{}'", csv_path.display()));
    }

    Ok(())
}

/// 保存调和结果到 JSON
fn save_edges_json(edges: &BTreeMap<String, BandEdgePair>, path: &Path) -> Result<()> {
    let mut doc = serde_json::Map::new();
    for (formula, pair) in edges {
        doc.insert(
            formula.clone(),
            serde_json::json!({
                "vbm_band_edge": &pair.vbm.edge,
                "cbm_band_edge": &pair.cbm.edge,
                "vbm_diff": pair.vbm.disagreement,
                "cbm_diff": pair.cbm.disagreement,
                "band_gap": pair.band_gap(),
            }),
        );
    }

    let json = serde_json::to_string_pretty(&doc)?;
    fs::write(path, json).map_err(|e| TcoaggError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 保存调和结果到 CSV
fn save_edges_csv(edges: &BTreeMap<String, BandEdgePair>, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| TcoaggError::CsvError(e))?;

    wtr.write_record(["formula", "vbm", "cbm", "band_gap", "vbm_diff", "cbm_diff"])
        .map_err(|e| TcoaggError::CsvError(e))?;

    for (formula, pair) in edges {
        wtr.write_record(&[
            formula.clone(),
            format!("{:.10}", pair.vbm.edge.energy),
            format!("{:.10}", pair.cbm.edge.energy),
            format!("{:.3}", pair.band_gap()),
            format!("{:.3}", pair.vbm.disagreement),
            format!("{:.3}", pair.cbm.disagreement),
        ])
        .map_err(|e| TcoaggError::CsvError(e))?;
    }

    wtr.flush().map_err(|e| TcoaggError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

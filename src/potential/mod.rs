//! # 氧芯静电势提取模块
//!
//! 从 VASP 计算目录读取 CONTCAR 与 OUTCAR，把逐位点势能按位点顺序
//! 与元素配对，筛出氧位点的芯区平均静电势。
//!
//! ## 功能
//! - 单目录提取，带位点数一致性检查
//! - 递归扫描含 CONTCAR/OUTCAR 的计算目录
//! - 基于 rayon 的并行批量提取
//!
//! ## 依赖关系
//! - 使用 `parsers/poscar.rs`, `parsers/outcar.rs`
//! - 使用 `utils/progress.rs` 创建进度条
//! - 被 `aggregate/`, `commands/potential.rs` 调用

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::error::{Result, TcoaggError};
use crate::parsers::{parse_outcar, parse_poscar_file};
use crate::utils::progress;

/// 氧元素符号
const OXYGEN: &str = "O";

/// 单个计算目录的提取结果
#[derive(Debug, Clone, PartialEq)]
pub struct OxygenSites {
    /// 约化化学式（来自 CONTCAR）
    pub formula: String,
    /// 氧位点芯区静电势，按位点顺序
    pub potentials: Vec<f64>,
    /// 结构的位点总数
    pub total_sites: usize,
    /// OUTCAR 是否正常收尾
    pub is_finished: bool,
}

/// 从计算目录提取氧位点芯区静电势
///
/// CONTCAR 提供位点顺序与元素，OUTCAR 提供同顺序的势能值；
/// 两者长度不一致说明结构与输出不属于同一次计算。
pub fn extract_oxygen_potentials(dir: &Path) -> Result<OxygenSites> {
    let contcar = dir.join("CONTCAR");
    let outcar = dir.join("OUTCAR");

    for file in [&contcar, &outcar] {
        if !file.is_file() {
            return Err(TcoaggError::SourceUnavailable {
                name: "calculation output".to_string(),
                path: file.display().to_string(),
            });
        }
    }

    let crystal = parse_poscar_file(&contcar)?;
    let summary = parse_outcar(&outcar)?;

    if summary.core_potentials.is_empty() {
        return Err(TcoaggError::ParseError {
            format: "outcar".to_string(),
            path: outcar.display().to_string(),
            reason: "no electrostatic potential block".to_string(),
        });
    }

    if summary.core_potentials.len() != crystal.num_sites() {
        return Err(TcoaggError::InconsistentData {
            context: dir.display().to_string(),
            expected: crystal.num_sites(),
            found: summary.core_potentials.len(),
        });
    }

    let potentials = crystal
        .atoms
        .iter()
        .zip(summary.core_potentials.iter())
        .filter(|(atom, _)| atom.element == OXYGEN)
        .map(|(_, &value)| value)
        .collect();

    Ok(OxygenSites {
        formula: crystal.reduced_formula(),
        potentials,
        total_sites: crystal.num_sites(),
        is_finished: summary.is_finished,
    })
}

/// 扫描根目录下的计算目录
///
/// 目录需同时含有 CONTCAR 与 OUTCAR；`pattern` 按目录名过滤。
/// 返回结果排序后输出，保证多次运行顺序一致。
pub fn scan_calculation_dirs(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(TcoaggError::DirectoryNotFound {
            path: root.display().to_string(),
        });
    }

    let glob_pattern = glob::Pattern::new(pattern).map_err(|e| {
        TcoaggError::InvalidArgument(format!("Invalid pattern '{}': {}", pattern, e))
    })?;

    let mut dirs = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        if !glob_pattern.matches(name) {
            continue;
        }
        if path.join("CONTCAR").is_file() && path.join("OUTCAR").is_file() {
            dirs.push(path.to_path_buf());
        }
    }

    dirs.sort();
    Ok(dirs)
}

/// 并行提取多个计算目录
///
/// 结果按输入顺序返回；`jobs` 为 0 时使用全部 CPU 核。
pub fn extract_many(dirs: &[PathBuf], jobs: usize) -> Vec<(PathBuf, Result<OxygenSites>)> {
    let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
    let pb = progress::create_progress_bar(dirs.len() as u64, "Extracting");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .unwrap();

    let results = pool.install(|| {
        dirs.par_iter()
            .map(|dir| {
                let result = extract_oxygen_potentials(dir);
                pb.inc(1);
                (dir.clone(), result)
            })
            .collect()
    });

    pb.finish_and_clear();
    results
}

//! # 按式聚合模块
//!
//! 把四类筛选数据按化学式拼成完整记录：有效质量、光学带隙、
//! 两来源调和后的能带边、氧芯静电势。
//!
//! ## 流程
//! - 四个类别各自批量拉取，返回「化学式 -> 条目」映射
//! - 以有效质量类为主键集逐式装配
//! - 任一类别缺失的化学式跳过并记入清单，不中断其余化学式
//! - 类别拉取本身的失败（源不可达、坏条目）中止整次请求
//!
//! ## 依赖关系
//! - 使用 `store/` 文档库接口、`models/` 数据模型、`potential/`
//! - 被 `commands/aggregate.rs` 调用

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use crate::error::{Result, TcoaggError};
use crate::models::band_edge::{BAND_EDGE_CLASS, SOURCE_ABSORPTION, SOURCE_BAND};
use crate::models::effective_mass::EFFECTIVE_MASS_CLASS;
use crate::models::optical::DIELE_FUNC_CLASS;
use crate::models::{
    reconcile_edge, BandEdge, BandEdgeKind, BandEdgePair, CarrierType, DieleFuncDoc,
    EffectiveMassDoc, EffectiveMassEntry, OxygenPotentialEntry, TcoRecord,
};
use crate::potential;
use crate::store::{
    decode_payload, decode_tagged, document_formula, Document, DocumentStore, PathMap,
    ABSORPTION_COLLECTION, BAND_COLLECTION, EFFECTIVE_MASS_COLLECTION, POTENTIAL_COLLECTION,
};

/// 载流子浓度取值点 (cm^-3)
pub const CARRIER_CONCENTRATION: f64 = 1e18;

/// 光学带隙的吸收系数阈值 (cm^-1)
pub const ABSORPTION_THRESHOLD: f64 = 1e4;

/// 数据类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    /// 有效质量（主键集）
    EffectiveMass,
    /// 光学带隙
    OpticalGap,
    /// 能带边
    BandEdge,
    /// 氧芯静电势
    OxygenPotential,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::EffectiveMass => "effective_mass",
            Category::OpticalGap => "optical_gap",
            Category::BandEdge => "band_edge",
            Category::OxygenPotential => "oxygen_potential",
        };
        write!(f, "{}", name)
    }
}

/// 被跳过的化学式与其缺失的类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFormula {
    pub formula: String,
    pub missing: Vec<Category>,
}

/// 聚合结果：完整记录映射 + 跳过清单
#[derive(Debug, Default)]
pub struct AggregateOutcome {
    /// 全类别命中的化学式及其记录，按式名有序
    pub records: BTreeMap<String, TcoRecord>,
    /// 因类别缺失被跳过的化学式
    pub skipped: Vec<SkippedFormula>,
}

/// 聚合器
///
/// 文档库由调用方打开并注入，聚合器只读使用。
pub struct Aggregator<'a> {
    store: &'a dyn DocumentStore,
    path_map: Option<PathMap>,
    jobs: usize,
}

impl<'a> Aggregator<'a> {
    /// 创建聚合器
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            path_map: None,
            jobs: 0,
        }
    }

    /// 设置计算目录前缀替换规则
    pub fn with_path_map(mut self, path_map: Option<PathMap>) -> Self {
        self.path_map = path_map;
        self
    }

    /// 设置氧势提取的并行作业数（0 = 全部核）
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// 拉取有效质量类
    ///
    /// 每条记录在标准浓度下求空穴/电子的平均与最小质量。
    pub fn fetch_effective_mass(
        &self,
        formulas: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, EffectiveMassEntry>> {
        let docs = self.store.find(EFFECTIVE_MASS_COLLECTION, formulas, &[])?;

        let mut result = BTreeMap::new();
        for doc in &docs {
            let formula = document_formula(doc, EFFECTIVE_MASS_COLLECTION)?;
            let em: EffectiveMassDoc = decode_payload(
                doc,
                "effective_mass",
                EFFECTIVE_MASS_CLASS,
                EFFECTIVE_MASS_COLLECTION,
                formula,
            )?;

            let (ave_p_mass, min_p_mass) = masses_at(&em, CarrierType::Hole, formula)?;
            let (ave_n_mass, min_n_mass) = masses_at(&em, CarrierType::Electron, formula)?;
            result.insert(
                formula.to_string(),
                EffectiveMassEntry {
                    ave_p_mass,
                    min_p_mass,
                    ave_n_mass,
                    min_n_mass,
                },
            );
        }
        Ok(result)
    }

    /// 拉取光学带隙类
    ///
    /// 吸收系数从未越过阈值的化学式不计入结果。
    pub fn fetch_optical_gap(
        &self,
        formulas: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, f64>> {
        let docs = self
            .store
            .find(ABSORPTION_COLLECTION, formulas, &["diele_func"])?;

        let mut result = BTreeMap::new();
        for doc in &docs {
            let formula = document_formula(doc, ABSORPTION_COLLECTION)?;
            let diele: DieleFuncDoc = decode_payload(
                doc,
                "diele_func",
                DIELE_FUNC_CLASS,
                ABSORPTION_COLLECTION,
                formula,
            )?;

            if let Some(gap) = diele.min_energy_with_coeff(ABSORPTION_THRESHOLD) {
                result.insert(formula.to_string(), gap);
            }
        }
        Ok(result)
    }

    /// 拉取并调和能带边类
    ///
    /// 以吸收谱集合为驱动；同式在能带结构集合中无对应文档时，
    /// 该式不进入本类结果，由装配阶段作为缺类报告。
    pub fn fetch_band_edges(
        &self,
        formulas: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, BandEdgePair>> {
        let docs = self
            .store
            .find(ABSORPTION_COLLECTION, formulas, &["band_edge"])?;

        let mut result = BTreeMap::new();
        for doc in &docs {
            let formula = document_formula(doc, ABSORPTION_COLLECTION)?;
            let (abs_vbm, abs_cbm) = decode_edge_pair(doc, ABSORPTION_COLLECTION, formula)?;
            let abs_vbm = abs_vbm.with_data_source(SOURCE_ABSORPTION);
            let abs_cbm = abs_cbm.with_data_source(SOURCE_ABSORPTION);

            let band_doc = match self.store.find_one(BAND_COLLECTION, formula, &["band_edge"])? {
                Some(doc) => doc,
                None => continue,
            };
            let (band_vbm, band_cbm) = decode_edge_pair(&band_doc, BAND_COLLECTION, formula)?;
            let band_vbm = band_vbm.with_data_source(SOURCE_BAND);
            let band_cbm = band_cbm.with_data_source(SOURCE_BAND);

            let pair = BandEdgePair {
                vbm: reconcile_edge(&abs_vbm, &band_vbm, BandEdgeKind::Vbm),
                cbm: reconcile_edge(&abs_cbm, &band_cbm, BandEdgeKind::Cbm),
            };
            result.insert(formula.to_string(), pair);
        }
        Ok(result)
    }

    /// 拉取氧芯静电势类
    ///
    /// 文档只含计算目录引用；应用前缀替换后并行提取。
    /// 无氧位点的条目不计入结果。
    pub fn fetch_oxygen_potentials(
        &self,
        formulas: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, OxygenPotentialEntry>> {
        let docs = self.store.find(POTENTIAL_COLLECTION, formulas, &["dir"])?;

        let mut refs: Vec<(String, PathBuf)> = Vec::new();
        for doc in &docs {
            let formula = document_formula(doc, POTENTIAL_COLLECTION)?;
            let dir = doc
                .get("dir")
                .and_then(|v| v.as_str())
                .ok_or_else(|| TcoaggError::MalformedEntry {
                    collection: POTENTIAL_COLLECTION.to_string(),
                    entry: formula.to_string(),
                    reason: "missing string field 'dir'".to_string(),
                })?;

            let mapped = match &self.path_map {
                Some(map) => map.apply(dir),
                None => dir.to_string(),
            };
            refs.push((formula.to_string(), PathBuf::from(mapped)));
        }

        let dirs: Vec<PathBuf> = refs.iter().map(|(_, dir)| dir.clone()).collect();
        let extractions = potential::extract_many(&dirs, self.jobs);

        let mut result = BTreeMap::new();
        for ((formula, _), (_, extraction)) in refs.iter().zip(extractions) {
            let sites = extraction?;
            if sites.potentials.is_empty() {
                continue;
            }
            result.insert(formula.clone(), OxygenPotentialEntry::new(sites.potentials));
        }
        Ok(result)
    }

    /// 聚合入口
    ///
    /// 重复化学式去重；输出对固定源数据可重复。
    pub fn aggregate(&self, formulas: &[String]) -> Result<AggregateOutcome> {
        let requested: BTreeSet<String> = formulas.iter().cloned().collect();

        let masses = self.fetch_effective_mass(&requested)?;
        let gaps = self.fetch_optical_gap(&requested)?;
        let edges = self.fetch_band_edges(&requested)?;
        let oxygen = self.fetch_oxygen_potentials(&requested)?;

        let mut outcome = AggregateOutcome::default();
        for (formula, mass) in &masses {
            let gap = gaps.get(formula);
            let pair = edges.get(formula);
            let sites = oxygen.get(formula);

            let mut missing = Vec::new();
            if gap.is_none() {
                missing.push(Category::OpticalGap);
            }
            if pair.is_none() {
                missing.push(Category::BandEdge);
            }
            if sites.is_none() {
                missing.push(Category::OxygenPotential);
            }

            if let (Some(&gap), Some(pair), Some(sites)) = (gap, pair, sites) {
                match TcoRecord::assemble(mass, gap, pair, sites) {
                    Some(record) => {
                        outcome.records.insert(formula.clone(), record);
                    }
                    None => outcome.skipped.push(SkippedFormula {
                        formula: formula.clone(),
                        missing: vec![Category::OxygenPotential],
                    }),
                }
            } else {
                outcome.skipped.push(SkippedFormula {
                    formula: formula.clone(),
                    missing,
                });
            }
        }
        Ok(outcome)
    }
}

/// 读取指定载流子在标准浓度下的 (平均, 最小) 质量
fn masses_at(em: &EffectiveMassDoc, carrier: CarrierType, formula: &str) -> Result<(f64, f64)> {
    let ave = em.average_mass(carrier, CARRIER_CONCENTRATION);
    let min = em.minimum_mass(carrier, CARRIER_CONCENTRATION);
    match (ave, min) {
        (Some(ave), Some(min)) => Ok((ave, min)),
        _ => Err(TcoaggError::MalformedEntry {
            collection: EFFECTIVE_MASS_COLLECTION.to_string(),
            entry: formula.to_string(),
            reason: format!(
                "no {} mass tabulated at {:e} cm^-3",
                carrier, CARRIER_CONCENTRATION
            ),
        }),
    }
}

/// 解码文档 band_edge 字段的 (VBM, CBM) 载荷
fn decode_edge_pair(
    doc: &Document,
    collection: &str,
    formula: &str,
) -> Result<(BandEdge, BandEdge)> {
    let field = doc
        .get("band_edge")
        .ok_or_else(|| TcoaggError::MalformedEntry {
            collection: collection.to_string(),
            entry: formula.to_string(),
            reason: "missing payload field 'band_edge'".to_string(),
        })?;

    let vbm = edge_component(field, "vbm", collection, formula)?;
    let cbm = edge_component(field, "cbm", collection, formula)?;
    Ok((vbm, cbm))
}

fn edge_component(
    field: &serde_json::Value,
    key: &str,
    collection: &str,
    formula: &str,
) -> Result<BandEdge> {
    let value = field.get(key).ok_or_else(|| TcoaggError::MalformedEntry {
        collection: collection.to_string(),
        entry: formula.to_string(),
        reason: format!("missing 'band_edge.{}'", key),
    })?;
    decode_tagged(value, BAND_EDGE_CLASS, collection, formula)
}

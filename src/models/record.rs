//! # 聚合记录数据模型
//!
//! 氧芯静电势条目与最终的每化学式聚合记录。
//! 记录字段名是与下游消费方的互操作约定，不可改动。
//!
//! 衍生量（带隙、氧势平均/极差、VBM 相对氧势）只在组装时
//! 由已调和/原始值重新计算，绝不独立存储输入。
//!
//! ## 依赖关系
//! - 被 `aggregate/` 和 `commands/` 使用
//! - 使用 `models/band_edge.rs`, `models/effective_mass.rs`

use serde::{Deserialize, Serialize};

use super::band_edge::{BandEdge, BandEdgePair};
use super::effective_mass::EffectiveMassEntry;

/// 氧芯静电势条目：弛豫结构中各氧位点的平均静电势
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OxygenPotentialEntry {
    /// 各氧位点的芯区平均静电势 (V)，按结构文件位点顺序
    pub potentials: Vec<f64>,
}

impl OxygenPotentialEntry {
    pub fn new(potentials: Vec<f64>) -> Self {
        OxygenPotentialEntry { potentials }
    }

    /// 位点平均值；无氧位点时返回 None
    pub fn average(&self) -> Option<f64> {
        if self.potentials.is_empty() {
            return None;
        }
        Some(self.potentials.iter().sum::<f64>() / self.potentials.len() as f64)
    }

    /// 极差 (max - min)；无氧位点时返回 None
    pub fn spread(&self) -> Option<f64> {
        if self.potentials.is_empty() {
            return None;
        }
        let max = self.potentials.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = self.potentials.iter().cloned().fold(f64::INFINITY, f64::min);
        Some(max - min)
    }
}

/// 每化学式的聚合记录
///
/// 字段名与序列化后的键名一一对应（下游互操作约定）。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TcoRecord {
    /// 平均空穴质量 (m_e)
    pub ave_p_mass: f64,

    /// 最小空穴质量 (m_e)
    pub min_p_mass: f64,

    /// 平均电子质量 (m_e)
    pub ave_n_mass: f64,

    /// 最小电子质量 (m_e)
    pub min_n_mass: f64,

    /// 光学带隙 (eV)
    pub optical_gap: f64,

    /// 调和后的价带顶
    pub vbm_band_edge: BandEdge,

    /// 调和后的导带底
    pub cbm_band_edge: BandEdge,

    /// VBM 两来源能量分歧 (eV)
    pub vbm_diff: f64,

    /// CBM 两来源能量分歧 (eV)
    pub cbm_diff: f64,

    /// 带隙 = CBM - VBM (eV)
    pub band_gap: f64,

    /// 各氧位点芯区静电势 (V)
    pub oxygen_core_potentials: Vec<f64>,

    /// 氧势极差 (max - min)
    pub oxygen_core_potential_diff: f64,

    /// VBM 相对氧势平均值 = VBM - 平均氧势
    pub vbm_from_oxygen_core_potential: f64,
}

impl TcoRecord {
    /// 由四个类别的条目组装一条完整记录
    ///
    /// 有效质量字段原样穿透；衍生量在此统一计算。
    /// 氧位点序列为空时无法求衍生量，返回 None。
    pub fn assemble(
        mass: &EffectiveMassEntry,
        optical_gap: f64,
        edges: &BandEdgePair,
        oxygen: &OxygenPotentialEntry,
    ) -> Option<Self> {
        let oxygen_ave = oxygen.average()?;
        let oxygen_diff = oxygen.spread()?;

        Some(TcoRecord {
            ave_p_mass: mass.ave_p_mass,
            min_p_mass: mass.min_p_mass,
            ave_n_mass: mass.ave_n_mass,
            min_n_mass: mass.min_n_mass,
            optical_gap,
            vbm_band_edge: edges.vbm.edge.clone(),
            cbm_band_edge: edges.cbm.edge.clone(),
            vbm_diff: edges.vbm.disagreement,
            cbm_diff: edges.cbm.disagreement,
            band_gap: edges.band_gap(),
            oxygen_core_potentials: oxygen.potentials.clone(),
            oxygen_core_potential_diff: oxygen_diff,
            vbm_from_oxygen_core_potential: edges.vbm.edge.energy - oxygen_ave,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::band_edge::{reconcile_edge, BandEdgeKind, ReconciledEdge};

    fn edge(energy: f64, source: &str) -> BandEdge {
        BandEdge {
            energy,
            spin: 1,
            band_index: 20,
            kpoint_index: 0,
            kpoint_coords: [0.0, 0.0, 0.0],
            symbol: None,
            data_source: Some(source.to_string()),
        }
    }

    fn reconciled(energy: f64) -> ReconciledEdge {
        reconcile_edge(
            &edge(energy, "absorption"),
            &edge(energy, "band"),
            BandEdgeKind::Vbm,
        )
    }

    fn mass_entry() -> EffectiveMassEntry {
        EffectiveMassEntry {
            ave_p_mass: 2.097823279476968,
            min_p_mass: 2.097823279476967,
            ave_n_mass: 0.41,
            min_n_mass: 0.39,
        }
    }

    #[test]
    fn test_oxygen_entry_average_and_spread() {
        let entry = OxygenPotentialEntry::new(vec![-10.0, -15.0, -20.0]);
        assert!((entry.average().unwrap() - (-15.0)).abs() < 1e-12);
        assert!((entry.spread().unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_oxygen_entry_empty_has_no_derived_values() {
        let entry = OxygenPotentialEntry::new(vec![]);
        assert!(entry.average().is_none());
        assert!(entry.spread().is_none());
    }

    #[test]
    fn test_assemble_derived_quantities() {
        let edges = BandEdgePair {
            vbm: reconciled(10.0),
            cbm: reconciled(13.2),
        };
        let oxygen = OxygenPotentialEntry::new(vec![-10.0, -15.0, -20.0]);

        let record = TcoRecord::assemble(&mass_entry(), 9.5176, &edges, &oxygen).unwrap();
        assert!((record.band_gap - 3.2).abs() < 1e-9);
        assert!((record.vbm_from_oxygen_core_potential - 25.0).abs() < 1e-12);
        assert!((record.oxygen_core_potential_diff - 10.0).abs() < 1e-12);
        assert!((record.optical_gap - 9.5176).abs() < 1e-12);
    }

    #[test]
    fn test_assemble_passes_mass_values_through_unchanged() {
        let edges = BandEdgePair {
            vbm: reconciled(3.9742),
            cbm: reconciled(13.3062),
        };
        let oxygen = OxygenPotentialEntry::new(vec![-60.0]);

        let record = TcoRecord::assemble(&mass_entry(), 9.5176, &edges, &oxygen).unwrap();
        assert_eq!(record.ave_p_mass, 2.097823279476968);
        assert_eq!(record.min_p_mass, 2.097823279476967);
    }

    #[test]
    fn test_assemble_empty_oxygen_yields_none() {
        let edges = BandEdgePair {
            vbm: reconciled(3.9742),
            cbm: reconciled(13.3062),
        };
        let oxygen = OxygenPotentialEntry::new(vec![]);

        assert!(TcoRecord::assemble(&mass_entry(), 9.5176, &edges, &oxygen).is_none());
    }

    #[test]
    fn test_serialized_field_names_match_interop_schema() {
        let edges = BandEdgePair {
            vbm: reconciled(3.9742),
            cbm: reconciled(13.3062),
        };
        let oxygen = OxygenPotentialEntry::new(vec![-60.0, -62.0]);
        let record = TcoRecord::assemble(&mass_entry(), 9.5176, &edges, &oxygen).unwrap();

        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();

        let expected = [
            "ave_p_mass",
            "min_p_mass",
            "ave_n_mass",
            "min_n_mass",
            "optical_gap",
            "vbm_band_edge",
            "cbm_band_edge",
            "vbm_diff",
            "cbm_diff",
            "band_gap",
            "oxygen_core_potentials",
            "oxygen_core_potential_diff",
            "vbm_from_oxygen_core_potential",
        ];
        for key in expected {
            assert!(obj.contains_key(key), "missing field: {}", key);
        }
        assert_eq!(obj.len(), expected.len());
    }
}

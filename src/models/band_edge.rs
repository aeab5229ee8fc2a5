//! # 能带边数据模型
//!
//! 表示单个能带边（VBM / CBM）测量值，并实现两个独立来源
//! （吸收谱推导 vs 能带结构推导）之间的调和逻辑。
//!
//! ## 合并策略
//! - VBM 取能量较高者，CBM 取能量较低者（更极端的边更可信）
//! - 能量相等时保留第一个参数（调用方约定第一个为吸收谱来源）
//! - 合并后的 `data_source` 恒为两来源标签以单个空格连接，第一个参数在前
//! - 分歧度 = |E_a - E_b|，四舍五入到 3 位小数
//!
//! ## 依赖关系
//! - 被 `aggregate/` 和 `commands/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};

/// 载荷 @class 标签
pub const BAND_EDGE_CLASS: &str = "BandEdge";

/// 吸收谱来源标签
pub const SOURCE_ABSORPTION: &str = "absorption";

/// 能带结构来源标签
pub const SOURCE_BAND: &str = "band";

/// 能带边类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandEdgeKind {
    /// 价带顶
    Vbm,
    /// 导带底
    Cbm,
}

impl std::fmt::Display for BandEdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BandEdgeKind::Vbm => write!(f, "vbm"),
            BandEdgeKind::Cbm => write!(f, "cbm"),
        }
    }
}

/// 单个能带边测量值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandEdge {
    /// 能量 (eV)
    pub energy: f64,

    /// 自旋指标 (1 = up, -1 = down)
    pub spin: i32,

    /// 能带序号
    pub band_index: usize,

    /// k 点序号
    pub kpoint_index: usize,

    /// k 点分数坐标
    pub kpoint_coords: [f64; 3],

    /// 可选：k 点符号 (如 "Γ")
    #[serde(default)]
    pub symbol: Option<String>,

    /// 来源标签，由调用方设置
    #[serde(default)]
    pub data_source: Option<String>,
}

impl BandEdge {
    /// 设置来源标签
    pub fn with_data_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = Some(source.into());
        self
    }
}

/// 调和结果：采纳的能带边加上两来源的能量分歧度
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledEdge {
    /// 合并后的能带边
    pub edge: BandEdge,

    /// 两来源能量差的绝对值 (eV)，3 位小数
    pub disagreement: f64,
}

/// 每化学式的一对调和能带边
#[derive(Debug, Clone, PartialEq)]
pub struct BandEdgePair {
    pub vbm: ReconciledEdge,
    pub cbm: ReconciledEdge,
}

impl BandEdgePair {
    /// 带隙 = CBM 能量 - VBM 能量 (eV)，3 位小数
    pub fn band_gap(&self) -> f64 {
        round3(self.cbm.edge.energy - self.vbm.edge.energy)
    }
}

/// 合并同一能带边的两个独立测量值
///
/// VBM 保留能量较高者，CBM 保留能量较低者；能量相等时保留 `a`。
/// 合并值的 `data_source` 为 `"<a 标签> <b 标签>"`。
pub fn merge_band_edge(a: &BandEdge, b: &BandEdge, kind: BandEdgeKind) -> BandEdge {
    let keep_b = match kind {
        BandEdgeKind::Vbm => b.energy > a.energy,
        BandEdgeKind::Cbm => b.energy < a.energy,
    };

    let mut merged = if keep_b { b.clone() } else { a.clone() };
    merged.data_source = Some(join_sources(a, b));
    merged
}

/// 两来源能量分歧度，对参数交换对称
pub fn edge_disagreement(a: &BandEdge, b: &BandEdge) -> f64 {
    round3((a.energy - b.energy).abs())
}

/// 合并 + 分歧度
pub fn reconcile_edge(a: &BandEdge, b: &BandEdge, kind: BandEdgeKind) -> ReconciledEdge {
    ReconciledEdge {
        edge: merge_band_edge(a, b, kind),
        disagreement: edge_disagreement(a, b),
    }
}

/// 四舍五入到 3 位小数
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn join_sources(a: &BandEdge, b: &BandEdge) -> String {
    let a_tag = a.data_source.as_deref().unwrap_or("unknown");
    let b_tag = b.data_source.as_deref().unwrap_or("unknown");
    format!("{} {}", a_tag, b_tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(energy: f64, band_index: usize, source: &str) -> BandEdge {
        BandEdge {
            energy,
            spin: 1,
            band_index,
            kpoint_index: 0,
            kpoint_coords: [0.0, 0.0, 0.0],
            symbol: None,
            data_source: Some(source.to_string()),
        }
    }

    #[test]
    fn test_merge_vbm_keeps_higher_energy() {
        let a = edge(3.9742, 23, SOURCE_ABSORPTION);
        let b = edge(3.9732, 23, SOURCE_BAND);

        let merged = merge_band_edge(&a, &b, BandEdgeKind::Vbm);
        assert!((merged.energy - 3.9742).abs() < 1e-12);

        // b 更高时采纳 b 的能量与位置信息
        let b_higher = edge(4.1, 25, SOURCE_BAND);
        let merged = merge_band_edge(&a, &b_higher, BandEdgeKind::Vbm);
        assert!((merged.energy - 4.1).abs() < 1e-12);
        assert_eq!(merged.band_index, 25);
    }

    #[test]
    fn test_merge_cbm_keeps_lower_energy() {
        let a = edge(13.3062, 24, SOURCE_ABSORPTION);
        let b = edge(13.2950, 24, SOURCE_BAND);

        let merged = merge_band_edge(&a, &b, BandEdgeKind::Cbm);
        assert!((merged.energy - 13.2950).abs() < 1e-12);
    }

    #[test]
    fn test_merge_tie_prefers_first_argument() {
        let a = edge(13.3062, 24, SOURCE_ABSORPTION);
        let b = edge(13.3062, 26, SOURCE_BAND);

        let merged = merge_band_edge(&a, &b, BandEdgeKind::Cbm);
        assert_eq!(merged.band_index, 24);

        let merged = merge_band_edge(&a, &b, BandEdgeKind::Vbm);
        assert_eq!(merged.band_index, 24);
    }

    #[test]
    fn test_merged_source_label_order_is_fixed() {
        let a = edge(3.9742, 23, SOURCE_ABSORPTION);
        let b = edge(4.1, 25, SOURCE_BAND);

        // 即使采纳 b，标签顺序仍为 "absorption band"
        let merged = merge_band_edge(&a, &b, BandEdgeKind::Vbm);
        assert_eq!(merged.data_source.as_deref(), Some("absorption band"));
    }

    #[test]
    fn test_disagreement_rounded_to_three_decimals() {
        let a = edge(3.9742, 23, SOURCE_ABSORPTION);
        let b = edge(3.9732, 23, SOURCE_BAND);

        let diff = edge_disagreement(&a, &b);
        assert!((diff - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_disagreement_symmetric_and_non_negative() {
        let a = edge(5.2, 10, SOURCE_ABSORPTION);
        let b = edge(5.8, 11, SOURCE_BAND);

        let d_ab = edge_disagreement(&a, &b);
        let d_ba = edge_disagreement(&b, &a);
        assert!((d_ab - d_ba).abs() < 1e-12);
        assert!(d_ab >= 0.0);
    }

    #[test]
    fn test_band_gap_from_reconciled_pair() {
        let vbm = reconcile_edge(
            &edge(3.9742, 23, SOURCE_ABSORPTION),
            &edge(3.9732, 23, SOURCE_BAND),
            BandEdgeKind::Vbm,
        );
        let cbm = reconcile_edge(
            &edge(13.3062, 24, SOURCE_ABSORPTION),
            &edge(13.3062, 24, SOURCE_BAND),
            BandEdgeKind::Cbm,
        );

        let pair = BandEdgePair { vbm, cbm };
        assert!((pair.band_gap() - 9.332).abs() < 1e-9);
        assert!((pair.vbm.disagreement - 0.001).abs() < 1e-12);
        assert!((pair.cbm.disagreement - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_band_edge_deserialize_tolerates_payload_tags() {
        let json = r#"{
            "@module": "analyzer.band_edge_properties",
            "@class": "BandEdge",
            "energy": 3.9742,
            "spin": 1,
            "band_index": 23,
            "kpoint_index": 0,
            "kpoint_coords": [0.0, 0.0, 0.0],
            "symbol": null,
            "data_source": null
        }"#;

        let parsed: BandEdge = serde_json::from_str(json).unwrap();
        assert!((parsed.energy - 3.9742).abs() < 1e-12);
        assert_eq!(parsed.band_index, 23);
        assert_eq!(parsed.data_source, None);
    }
}

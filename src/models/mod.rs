//! # 数据模型模块
//!
//! 定义各属性类别的条目、能带边调和逻辑与最终聚合记录。
//!
//! ## 依赖关系
//! - 被 `store/`, `aggregate/`, `potential/`, `commands/` 使用
//! - 子模块: band_edge, effective_mass, optical, record, structure

pub mod band_edge;
pub mod effective_mass;
pub mod optical;
pub mod record;
pub mod structure;

pub use band_edge::{
    merge_band_edge, reconcile_edge, BandEdge, BandEdgeKind, BandEdgePair, ReconciledEdge,
};
pub use effective_mass::{CarrierType, EffectiveMassDoc, EffectiveMassEntry};
pub use optical::DieleFuncDoc;
pub use record::{OxygenPotentialEntry, TcoRecord};
pub use structure::{Atom, Crystal, Lattice};

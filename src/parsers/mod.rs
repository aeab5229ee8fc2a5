//! # 解析器模块
//!
//! VASP 输出文件的解析器。
//!
//! ## 依赖关系
//! - 被 `potential/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: poscar, outcar

pub mod outcar;
pub mod poscar;

pub use outcar::{parse_outcar, OutcarSummary};
pub use poscar::parse_poscar_file;

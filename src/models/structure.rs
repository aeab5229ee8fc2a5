//! # 晶体结构数据模型
//!
//! 弛豫结构的最小表示：晶格与按文件顺序排列的位点序列。
//! 位点顺序是与静电势输出按位置配对的依据，解析后不得重排。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `potential/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};

/// 晶格参数表示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }
}

/// 原子位点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 坐标 [x, y, z]（按文件原样保存）
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
        }
    }
}

/// 晶体结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crystal {
    /// 结构名称
    pub name: String,

    /// 晶格
    pub lattice: Lattice,

    /// 位点列表（文件顺序）
    pub atoms: Vec<Atom>,
}

impl Crystal {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Crystal {
            name: name.into(),
            lattice,
            atoms,
        }
    }

    /// 位点总数
    pub fn num_sites(&self) -> usize {
        self.atoms.len()
    }

    /// 约化化学式（氧化物惯例：阳离子按字母序，氧在末尾）
    ///
    /// 元素计数先除以最大公约数，计数 1 省略。仅用于显示，
    /// 不用作跨数据源的严格一致性检查。
    pub fn reduced_formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }

        let divisor = counts.values().fold(0, |acc, &c| gcd(acc, c)).max(1);

        let mut parts: Vec<(&str, usize)> = counts
            .iter()
            .filter(|(el, _)| **el != "O")
            .map(|(el, c)| (*el, c / divisor))
            .collect();
        if let Some(o_count) = counts.get("O") {
            parts.push(("O", o_count / divisor));
        }

        parts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crystal_with(elements: &[(&str, usize)]) -> Crystal {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]);
        let mut atoms = Vec::new();
        for (el, count) in elements {
            for _ in 0..*count {
                atoms.push(Atom::new(*el, [0.0, 0.0, 0.0]));
            }
        }
        Crystal::new("test", lattice, atoms)
    }

    #[test]
    fn test_reduced_formula_simple_oxide() {
        let crystal = crystal_with(&[("Mg", 1), ("O", 1)]);
        assert_eq!(crystal.reduced_formula(), "MgO");
    }

    #[test]
    fn test_reduced_formula_divides_by_gcd() {
        let crystal = crystal_with(&[("Al", 4), ("O", 6)]);
        assert_eq!(crystal.reduced_formula(), "Al2O3");

        let supercell = crystal_with(&[("Mg", 8), ("O", 8)]);
        assert_eq!(supercell.reduced_formula(), "MgO");
    }

    #[test]
    fn test_reduced_formula_puts_oxygen_last() {
        let crystal = crystal_with(&[("Sn", 2), ("O", 4)]);
        assert_eq!(crystal.reduced_formula(), "SnO2");
    }

    #[test]
    fn test_num_sites_counts_all_atoms() {
        let crystal = crystal_with(&[("Al", 4), ("O", 6)]);
        assert_eq!(crystal.num_sites(), 10);
    }
}

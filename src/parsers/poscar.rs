//! # VASP POSCAR 格式解析器
//!
//! 解析 VASP POSCAR/CONTCAR 文件，用于确定位点顺序与元素归属。
//!
//! ## POSCAR 格式说明
//! ```text
//! Comment line (structure name)
//! 1.0                    # scaling factor
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+)
//! n1 n2 ...              # number of atoms per element
//! Selective dynamics     # optional
//! Direct/Cartesian       # coordinate type
//! x1 y1 z1               # atom positions
//! ...
//! ```
//!
//! ## 依赖关系
//! - 被 `potential/` 模块使用
//! - 使用 `models/structure.rs`

use crate::error::{Result, TcoaggError};
use crate::models::{Atom, Crystal, Lattice};
use std::fs;
use std::path::Path;

/// 解析 POSCAR/CONTCAR 文件
pub fn parse_poscar_file(path: &Path) -> Result<Crystal> {
    let content = fs::read_to_string(path).map_err(|e| TcoaggError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let default_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    parse_poscar_content(&content, default_name)
}

/// 从字符串内容解析 POSCAR 格式
///
/// 位点顺序与文件中的行顺序一致，后续与 OUTCAR 逐位点配对依赖这一点。
pub fn parse_poscar_content(content: &str, default_name: &str) -> Result<Crystal> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.len() < 8 {
        return Err(parse_error(default_name, "file too short"));
    }

    // Line 0: 注释/结构名
    let name = match lines[0].trim() {
        "" => default_name.to_string(),
        trimmed => trimmed.to_string(),
    };

    // Line 1: 缩放因子
    let scale: f64 = lines[1].trim().parse().unwrap_or(1.0);

    // Lines 2-4: 晶格矢量
    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        let vector = parse_vector3(lines[2 + i]).ok_or_else(|| {
            parse_error(&name, &format!("invalid lattice vector at line {}", 3 + i))
        })?;
        *row = [vector[0] * scale, vector[1] * scale, vector[2] * scale];
    }
    let lattice = Lattice::from_vectors(matrix);

    // Line 5: 元素符号 (VASP 5+) 或原子计数 (VASP 4)
    let line5: Vec<&str> = lines[5].split_whitespace().collect();
    if line5.is_empty() {
        return Err(parse_error(&name, "missing element line"));
    }
    let (elements, counts, mut coord_line) = if line5[0].parse::<usize>().is_ok() {
        // VASP 4: 无元素行，用占位符命名
        let counts: Vec<usize> = line5.iter().filter_map(|s| s.parse().ok()).collect();
        let elements: Vec<String> = (1..=counts.len()).map(|i| format!("X{}", i)).collect();
        (elements, counts, 6)
    } else {
        let elements: Vec<String> = line5.iter().map(|s| s.to_string()).collect();
        let counts: Vec<usize> = lines[6]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        (elements, counts, 7)
    };

    if elements.len() != counts.len() {
        return Err(parse_error(&name, "element and count rows differ in length"));
    }

    // 可选的 Selective dynamics 行
    if lines
        .get(coord_line)
        .map(|l| l.trim().to_lowercase().starts_with("selective"))
        .unwrap_or(false)
    {
        coord_line += 1;
    }

    let coord_type = lines
        .get(coord_line)
        .map(|l| l.trim().to_lowercase())
        .ok_or_else(|| parse_error(&name, "missing coordinate type line"))?;
    let is_cartesian = coord_type.starts_with('c') || coord_type.starts_with('k');

    // 逐元素读取原子位置
    let mut atoms: Vec<Atom> = Vec::new();
    let mut line_idx = coord_line + 1;

    for (element, &count) in elements.iter().zip(counts.iter()) {
        for _ in 0..count {
            let line = lines.get(line_idx).ok_or_else(|| {
                parse_error(&name, &format!("expected {} positions for {}", count, element))
            })?;
            let coords = parse_vector3(line)
                .ok_or_else(|| parse_error(&name, &format!("bad position at line {}", line_idx + 1)))?;

            let position = if is_cartesian {
                cart_to_frac(coords, &lattice)
            } else {
                coords
            };
            atoms.push(Atom::new(element.clone(), position));
            line_idx += 1;
        }
    }

    Ok(Crystal::new(name, lattice, atoms))
}

fn parse_error(name: &str, reason: &str) -> TcoaggError {
    TcoaggError::ParseError {
        format: "poscar".to_string(),
        path: name.to_string(),
        reason: reason.to_string(),
    }
}

/// 取行首三个浮点数；不足三个返回 None
fn parse_vector3(line: &str) -> Option<[f64; 3]> {
    let mut parts = line.split_whitespace().map(|s| s.parse::<f64>());
    let x = parts.next()?.ok()?;
    let y = parts.next()?.ok()?;
    let z = parts.next()?.ok()?;
    Some([x, y, z])
}

/// 笛卡尔坐标转分数坐标
fn cart_to_frac(cart: [f64; 3], lattice: &Lattice) -> [f64; 3] {
    let m = lattice.matrix;
    let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);

    if det.abs() < 1e-10 {
        return cart;
    }

    let inv = [
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) / det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) / det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) / det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) / det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) / det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) / det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) / det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) / det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) / det,
        ],
    ];

    [
        inv[0][0] * cart[0] + inv[0][1] * cart[1] + inv[0][2] * cart[2],
        inv[1][0] * cart[0] + inv[1][1] * cart[1] + inv[1][2] * cart[2],
        inv[2][0] * cart[0] + inv[2][1] * cart[1] + inv[2][2] * cart[2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_contcar_vasp5() {
        let content = r#"MgO relaxed
1.0
4.25 0.0 0.0
0.0 4.25 0.0
0.0 0.0 4.25
Mg O
4 4
Direct
0.0 0.0 0.0
0.5 0.5 0.0
0.5 0.0 0.5
0.0 0.5 0.5
0.5 0.0 0.0
0.0 0.5 0.0
0.0 0.0 0.5
0.5 0.5 0.5
"#;
        let crystal = parse_poscar_content(content, "CONTCAR").unwrap();
        assert_eq!(crystal.name, "MgO relaxed");
        assert_eq!(crystal.num_sites(), 8);
        assert_eq!(crystal.reduced_formula(), "MgO");

        // 位点顺序按文件行序
        assert_eq!(crystal.atoms[0].element, "Mg");
        assert_eq!(crystal.atoms[4].element, "O");
    }

    #[test]
    fn test_parse_poscar_with_scale() {
        let content = r#"SnO2
2.0
2.37 0.0 0.0
0.0 2.37 0.0
0.0 0.0 1.59
Sn O
2 4
Direct
0.0 0.0 0.0
0.5 0.5 0.5
0.305 0.305 0.0
0.695 0.695 0.0
0.805 0.195 0.5
0.195 0.805 0.5
"#;
        let crystal = parse_poscar_content(content, "SnO2").unwrap();
        assert!((crystal.lattice.matrix[0][0] - 4.74).abs() < 1e-9);
        assert_eq!(crystal.reduced_formula(), "SnO2");
    }

    #[test]
    fn test_parse_poscar_selective_dynamics() {
        let content = r#"ZnO slab
1.0
3.25 0.0 0.0
0.0 3.25 0.0
0.0 0.0 5.2
Zn O
2 2
Selective dynamics
Direct
0.0 0.0 0.0 T T T
0.333 0.667 0.5 T T T
0.0 0.0 0.375 F F F
0.333 0.667 0.875 F F F
"#;
        let crystal = parse_poscar_content(content, "ZnO").unwrap();
        assert_eq!(crystal.num_sites(), 4);
    }

    #[test]
    fn test_parse_poscar_vasp4_counts_only() {
        let content = r#"unknown oxide
1.0
4.0 0.0 0.0
0.0 4.0 0.0
0.0 0.0 4.0
1 2
Direct
0.0 0.0 0.0
0.5 0.5 0.0
0.5 0.0 0.5
"#;
        let crystal = parse_poscar_content(content, "POSCAR").unwrap();
        assert_eq!(crystal.num_sites(), 3);
        assert_eq!(crystal.atoms[0].element, "X1");
        assert_eq!(crystal.atoms[1].element, "X2");
    }

    #[test]
    fn test_parse_poscar_cartesian_positions() {
        let content = r#"MgO cart
1.0
4.0 0.0 0.0
0.0 4.0 0.0
0.0 0.0 4.0
Mg O
1 1
Cartesian
0.0 0.0 0.0
2.0 2.0 2.0
"#;
        let crystal = parse_poscar_content(content, "MgO").unwrap();
        let o_pos = crystal.atoms[1].position;
        assert!((o_pos[0] - 0.5).abs() < 1e-9);
        assert!((o_pos[1] - 0.5).abs() < 1e-9);
        assert!((o_pos[2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_poscar_too_short() {
        let err = parse_poscar_content("MgO\n1.0\n", "MgO").unwrap_err();
        assert!(matches!(err, TcoaggError::ParseError { .. }));
    }

    #[test]
    fn test_parse_poscar_truncated_positions() {
        let content = r#"MgO
1.0
4.0 0.0 0.0
0.0 4.0 0.0
0.0 0.0 4.0
Mg O
1 2
Direct
0.0 0.0 0.0
0.5 0.5 0.5
"#;
        let err = parse_poscar_content(content, "MgO").unwrap_err();
        assert!(matches!(err, TcoaggError::ParseError { .. }));
    }
}

//! # VASP OUTCAR 解析器
//!
//! 从 OUTCAR 提取逐位点的芯区平均静电势。
//! 势能块每个离子步打印一次，取最后一个块作为收敛值。
//!
//! ## 块格式说明
//! ```text
//!  average (electrostatic) potential at core
//!   the test charge radii are     0.7215
//!   (the norm of the test charge is              1.0000)
//!        1 -50.6035       2 -50.6035       3 -77.0864
//!        4 -77.0864
//!
//!   E-fermi :   1.9157     XC(G=0): -11.2811
//! ```
//!
//! ## 依赖关系
//! - 被 `potential/` 模块使用

use crate::error::{Result, TcoaggError};
use std::fs;
use std::path::Path;

/// 势能块起始标记
const POTENTIAL_MARKER: &str = "average (electrostatic) potential at core";

/// 计算正常收尾的标记
const FINISHED_MARKER: &str = "General timing and accounting informations for this job";

/// OUTCAR 中与聚合相关的内容
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcarSummary {
    /// 逐位点芯区平均静电势，顺序与 CONTCAR 位点一致
    pub core_potentials: Vec<f64>,
    /// 计算是否正常收尾
    pub is_finished: bool,
}

/// 解析 VASP OUTCAR 文件
pub fn parse_outcar(path: &Path) -> Result<OutcarSummary> {
    let content = fs::read_to_string(path).map_err(|e| TcoaggError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(parse_outcar_content(&content))
}

/// 从字符串内容解析 OUTCAR
pub fn parse_outcar_content(content: &str) -> OutcarSummary {
    let mut summary = OutcarSummary::default();
    let mut in_block = false;
    let mut current: Vec<f64> = Vec::new();

    for line in content.lines() {
        if line.contains(POTENTIAL_MARKER) {
            in_block = true;
            current.clear();
            continue;
        }

        if in_block {
            match parse_potential_pairs(line) {
                Some(values) => current.extend(values),
                None => {
                    // 表头行在数据前出现，跳过；数据后的首个非配对行关闭块
                    if !current.is_empty() {
                        in_block = false;
                        summary.core_potentials = std::mem::take(&mut current);
                    }
                }
            }
        }

        if line.contains(FINISHED_MARKER) {
            summary.is_finished = true;
        }
    }

    // 文件在块内截断时保留已读到的值
    if in_block && !current.is_empty() {
        summary.core_potentials = current;
    }

    summary
}

/// 解析「位点编号 势能值」交替出现的行
///
/// 整行必须由完整的配对组成，否则判为非数据行。
fn parse_potential_pairs(line: &str) -> Option<Vec<f64>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() % 2 != 0 {
        return None;
    }

    let mut values = Vec::with_capacity(tokens.len() / 2);
    for pair in tokens.chunks(2) {
        pair[0].parse::<usize>().ok()?;
        values.push(pair[1].parse::<f64>().ok()?);
    }
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTCAR_TWO_STEPS: &str = r#" vasp.6.3.0
 POTCAR:    PAW_PBE Mg 13Apr2007
 average (electrostatic) potential at core
  the test charge radii are     0.7215  0.7215
  (the norm of the test charge is              1.0000)
       1 -45.0000       2 -45.0000       3 -70.0000
       4 -70.0000

  E-fermi :   1.9157     XC(G=0): -11.2811     alpha+bet : -6.6131
 ionic step 2
 average (electrostatic) potential at core
  the test charge radii are     0.7215  0.7215
  (the norm of the test charge is              1.0000)
       1 -50.6035       2 -50.6035       3 -77.0864
       4 -77.0864

  E-fermi :   1.9201     XC(G=0): -11.2811     alpha+bet : -6.6131
 General timing and accounting informations for this job:
"#;

    #[test]
    fn test_parse_outcar_takes_last_block() {
        let summary = parse_outcar_content(OUTCAR_TWO_STEPS);
        assert_eq!(
            summary.core_potentials,
            vec![-50.6035, -50.6035, -77.0864, -77.0864]
        );
    }

    #[test]
    fn test_parse_outcar_finished_flag() {
        let summary = parse_outcar_content(OUTCAR_TWO_STEPS);
        assert!(summary.is_finished);

        let truncated = OUTCAR_TWO_STEPS.replace(FINISHED_MARKER, "");
        assert!(!parse_outcar_content(&truncated).is_finished);
    }

    #[test]
    fn test_parse_outcar_multi_line_block() {
        let content = r#" average (electrostatic) potential at core
  the test charge radii are     0.7215
  (the norm of the test charge is              1.0000)
       1 -50.1       2 -50.2       3 -50.3       4 -50.4       5 -50.5
       6 -77.1

  E-fermi :   2.0
"#;
        let summary = parse_outcar_content(content);
        assert_eq!(
            summary.core_potentials,
            vec![-50.1, -50.2, -50.3, -50.4, -50.5, -77.1]
        );
    }

    #[test]
    fn test_parse_outcar_no_potential_block() {
        let summary = parse_outcar_content("some unrelated output\n E-fermi :   2.0\n");
        assert!(summary.core_potentials.is_empty());
    }

    #[test]
    fn test_parse_outcar_truncated_in_block() {
        let content = r#" average (electrostatic) potential at core
       1 -50.1       2 -50.2
"#;
        let summary = parse_outcar_content(content);
        assert_eq!(summary.core_potentials, vec![-50.1, -50.2]);
    }

    #[test]
    fn test_parse_potential_pairs_rejects_headers() {
        assert!(parse_potential_pairs("  the test charge radii are     0.7215").is_none());
        assert!(parse_potential_pairs("  E-fermi :   1.9157").is_none());
        assert!(parse_potential_pairs("").is_none());
    }

    #[test]
    fn test_parse_outcar_missing_file() {
        let err = parse_outcar(Path::new("/no/such/OUTCAR")).unwrap_err();
        assert!(matches!(err, TcoaggError::FileReadError { .. }));
    }
}

//! # 光学吸收数据模型
//!
//! 数据库中的介电函数载荷：光子能量网格与吸收系数序列。
//! 光学带隙取方向平均吸收系数首次超过目标值的最低光子能量。
//!
//! ## 依赖关系
//! - 被 `aggregate/` 使用
//! - 被 `store/` 解码

use serde::{Deserialize, Serialize};

/// 介电函数载荷的 @class 标签
pub const DIELE_FUNC_CLASS: &str = "DieleFuncData";

/// 介电函数 / 吸收系数载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DieleFuncDoc {
    /// 光子能量网格 (eV)
    pub energies: Vec<f64>,

    /// 吸收系数序列 (cm^-1)；各方向分量在前，方向平均在最后
    pub absorption_coeff: Vec<Vec<f64>>,
}

impl DieleFuncDoc {
    /// 方向平均的吸收系数序列（最后一个分量）
    pub fn averaged_coeff(&self) -> Option<&[f64]> {
        self.absorption_coeff.last().map(|v| v.as_slice())
    }

    /// 吸收系数首次超过 `target` 的最低光子能量 (eV)
    ///
    /// 从未超过时返回 `None`。
    pub fn min_energy_with_coeff(&self, target: f64) -> Option<f64> {
        let coeff = self.averaged_coeff()?;
        self.energies
            .iter()
            .zip(coeff.iter())
            .find(|(_, &c)| c > target)
            .map(|(&e, _)| e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_crossing_energy() {
        let doc = DieleFuncDoc {
            energies: vec![0.0, 1.0, 2.0, 3.0, 4.0],
            absorption_coeff: vec![vec![0.0, 10.0, 5e3, 2e4, 8e5]],
        };
        let gap = doc.min_energy_with_coeff(1e4).unwrap();
        assert!((gap - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_never_crossing_yields_none() {
        let doc = DieleFuncDoc {
            energies: vec![0.0, 1.0, 2.0],
            absorption_coeff: vec![vec![0.0, 1.0, 2.0]],
        };
        assert!(doc.min_energy_with_coeff(1e4).is_none());
    }

    #[test]
    fn test_uses_last_component_as_average() {
        // 三个方向分量 + 平均；只有平均序列决定带隙
        let doc = DieleFuncDoc {
            energies: vec![1.0, 2.0, 3.0],
            absorption_coeff: vec![
                vec![1e5, 1e5, 1e5],
                vec![0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0],
                vec![0.0, 2e4, 3e4],
            ],
        };
        let gap = doc.min_energy_with_coeff(1e4).unwrap();
        assert!((gap - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_deserialize_payload() {
        let json = r#"{
            "@module": "analyzer.dielectric_function",
            "@class": "DieleFuncData",
            "energies": [0.0, 5.0, 9.5176, 12.0],
            "absorption_coeff": [[0.0, 100.0, 50000.0, 900000.0]]
        }"#;

        let doc: DieleFuncDoc = serde_json::from_str(json).unwrap();
        let gap = doc.min_energy_with_coeff(1e4).unwrap();
        assert!((gap - 9.5176).abs() < 1e-12);
    }
}

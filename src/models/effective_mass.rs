//! # 有效质量数据模型
//!
//! 数据库中的有效质量载荷：按载流子浓度索引的 3x3 质量张量，
//! 以及在固定浓度下求值得到的每化学式条目。
//!
//! 平均质量取张量三个本征值的平均（即 trace/3），
//! 最小质量取最小本征值（对称 3x3 本征值解析求解）。
//!
//! ## 依赖关系
//! - 被 `aggregate/` 使用
//! - 被 `store/` 解码

use serde::{Deserialize, Serialize};

/// 有效质量载荷的 @class 标签
pub const EFFECTIVE_MASS_CLASS: &str = "EffectiveMass";

/// 载流子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierType {
    /// 空穴 (p 型)
    Hole,
    /// 电子 (n 型)
    Electron,
}

impl std::fmt::Display for CarrierType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CarrierType::Hole => write!(f, "p"),
            CarrierType::Electron => write!(f, "n"),
        }
    }
}

/// 有效质量张量载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveMassDoc {
    /// 空穴质量张量，按浓度索引 (单位: m_e)
    pub p: Vec<[[f64; 3]; 3]>,

    /// 电子质量张量，按浓度索引 (单位: m_e)
    pub n: Vec<[[f64; 3]; 3]>,

    /// 温度 (K)
    pub temperature: f64,

    /// 载流子浓度列表 (cm^-3)
    pub concentrations: Vec<f64>,
}

impl EffectiveMassDoc {
    /// 查找浓度对应的索引
    fn concentration_index(&self, concentration: f64) -> Option<usize> {
        self.concentrations
            .iter()
            .position(|&c| (c - concentration).abs() <= concentration.abs() * 1e-9)
    }

    /// 指定载流子和浓度下的质量张量
    fn tensor(&self, carrier: CarrierType, concentration: f64) -> Option<&[[f64; 3]; 3]> {
        let idx = self.concentration_index(concentration)?;
        match carrier {
            CarrierType::Hole => self.p.get(idx),
            CarrierType::Electron => self.n.get(idx),
        }
    }

    /// 平均质量 = trace/3 (单位: m_e)
    pub fn average_mass(&self, carrier: CarrierType, concentration: f64) -> Option<f64> {
        self.tensor(carrier, concentration)
            .map(|t| (t[0][0] + t[1][1] + t[2][2]) / 3.0)
    }

    /// 最小质量 = 最小本征值 (单位: m_e)
    pub fn minimum_mass(&self, carrier: CarrierType, concentration: f64) -> Option<f64> {
        self.tensor(carrier, concentration)
            .map(|t| symmetric_eigenvalues(t).0)
    }
}

/// 单化学式的有效质量条目，在固定载流子浓度下求值
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveMassEntry {
    /// 平均空穴质量 (m_e)
    pub ave_p_mass: f64,

    /// 最小空穴质量 (m_e)
    pub min_p_mass: f64,

    /// 平均电子质量 (m_e)
    pub ave_n_mass: f64,

    /// 最小电子质量 (m_e)
    pub min_n_mass: f64,
}

/// 对称 3x3 矩阵本征值，升序返回 (最小, 中间, 最大)
///
/// 三角恒等式解法；输入张量按对称处理（off-diagonal 取平均）。
fn symmetric_eigenvalues(m: &[[f64; 3]; 3]) -> (f64, f64, f64) {
    let a11 = m[0][0];
    let a22 = m[1][1];
    let a33 = m[2][2];
    let a12 = (m[0][1] + m[1][0]) / 2.0;
    let a13 = (m[0][2] + m[2][0]) / 2.0;
    let a23 = (m[1][2] + m[2][1]) / 2.0;

    let p1 = a12 * a12 + a13 * a13 + a23 * a23;
    if p1 == 0.0 {
        // 已是对角阵
        let mut eig = [a11, a22, a33];
        eig.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        return (eig[0], eig[1], eig[2]);
    }

    let q = (a11 + a22 + a33) / 3.0;
    let p2 = (a11 - q).powi(2) + (a22 - q).powi(2) + (a33 - q).powi(2) + 2.0 * p1;
    let p = (p2 / 6.0).sqrt();

    // B = (A - qI) / p
    let b11 = (a11 - q) / p;
    let b22 = (a22 - q) / p;
    let b33 = (a33 - q) / p;
    let b12 = a12 / p;
    let b13 = a13 / p;
    let b23 = a23 / p;

    let det_b = b11 * (b22 * b33 - b23 * b23) - b12 * (b12 * b33 - b23 * b13)
        + b13 * (b12 * b23 - b22 * b13);

    let r = (det_b / 2.0).clamp(-1.0, 1.0);
    let phi = r.acos() / 3.0;

    let eig_max = q + 2.0 * p * phi.cos();
    let eig_min = q + 2.0 * p * (phi + 2.0 * std::f64::consts::PI / 3.0).cos();
    let eig_mid = 3.0 * q - eig_max - eig_min;

    (eig_min, eig_mid, eig_max)
}

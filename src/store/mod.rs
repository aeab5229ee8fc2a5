//! # 文档数据库访问模块
//!
//! 定义只读文档库接口与带 @class 标签的载荷解码。
//! 过滤条件的形状固定：formula 属于给定集合，外加可选字段投影。
//!
//! ## 依赖关系
//! - 被 `aggregate/` 和 `commands/` 使用
//! - 子模块: config, json_dir

pub mod config;
pub mod json_dir;

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;

use crate::error::{Result, TcoaggError};

pub use config::{PathMap, StoreConfig};
pub use json_dir::JsonDirStore;

// ─────────────────────────────────────────────────────────────
// 集合名（数据互操作约定）
// ─────────────────────────────────────────────────────────────

/// 有效质量集合
pub const EFFECTIVE_MASS_COLLECTION: &str = "effective_mass_dd_hybrid";

/// 吸收谱集合（介电函数 + 能带边）
pub const ABSORPTION_COLLECTION: &str = "absorption_dd_hybrid";

/// 能带结构集合
pub const BAND_COLLECTION: &str = "band_dd_hybrid";

/// 计算目录引用集合（氧芯静电势）
pub const POTENTIAL_COLLECTION: &str = "potential_dd_hybrid";

/// 解码后的文档（JSON 对象）
pub type Document = serde_json::Map<String, serde_json::Value>;

/// 只读文档库接口
///
/// 聚合器通过构造参数注入具体实现；生命周期由调用方管理。
pub trait DocumentStore {
    /// 批量查询：返回 formula 命中的全部文档
    ///
    /// `projection` 为字段白名单（formula 恒保留），空切片表示全部字段。
    fn find(
        &self,
        collection: &str,
        formulas: &BTreeSet<String>,
        projection: &[&str],
    ) -> Result<Vec<Document>>;

    /// 单条查询：返回指定 formula 的第一个文档
    fn find_one(
        &self,
        collection: &str,
        formula: &str,
        projection: &[&str],
    ) -> Result<Option<Document>> {
        let mut formulas = BTreeSet::new();
        formulas.insert(formula.to_string());
        Ok(self.find(collection, &formulas, projection)?.into_iter().next())
    }
}

/// 取出文档的 formula 键
///
/// 每个文档必须携带字符串 formula 字段；缺失视为坏条目。
pub fn document_formula<'a>(doc: &'a Document, collection: &str) -> Result<&'a str> {
    doc.get("formula")
        .and_then(|v| v.as_str())
        .ok_or_else(|| TcoaggError::MalformedEntry {
            collection: collection.to_string(),
            entry: "<unknown>".to_string(),
            reason: "missing string field 'formula'".to_string(),
        })
}

/// 解码带 @class 标签的 JSON 载荷值
///
/// 标签缺失或与期望不符即拒绝，不信任字段访问的侥幸成功。
pub fn decode_tagged<T: DeserializeOwned>(
    value: &serde_json::Value,
    expected_class: &str,
    collection: &str,
    entry: &str,
) -> Result<T> {
    let class = value.get("@class").and_then(|c| c.as_str());
    if class != Some(expected_class) {
        return Err(TcoaggError::MalformedEntry {
            collection: collection.to_string(),
            entry: entry.to_string(),
            reason: format!("payload has @class {:?}, expected \"{}\"", class, expected_class),
        });
    }

    serde_json::from_value(value.clone()).map_err(|e| TcoaggError::MalformedEntry {
        collection: collection.to_string(),
        entry: entry.to_string(),
        reason: e.to_string(),
    })
}

/// 解码文档中带 @class 标签的载荷字段
pub fn decode_payload<T: DeserializeOwned>(
    doc: &Document,
    field: &str,
    expected_class: &str,
    collection: &str,
    formula: &str,
) -> Result<T> {
    let value = doc
        .get(field)
        .ok_or_else(|| TcoaggError::MalformedEntry {
            collection: collection.to_string(),
            entry: formula.to_string(),
            reason: format!("missing payload field '{}'", field),
        })?;
    decode_tagged(value, expected_class, collection, formula)
}

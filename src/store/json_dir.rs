//! # JSON 目录存储模块
//!
//! `DocumentStore` 的文件后端：根目录下每个集合对应一个
//! `<collection>.json` 文件，内容为文档对象数组。
//! 集合在导出后只读，每次查询整文件加载。

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::{document_formula, Document, DocumentStore};
use crate::error::{Result, TcoaggError};

/// 目录式 JSON 文档库
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    /// 打开根目录；目录不存在即拒绝
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(TcoaggError::SourceUnavailable {
                name: "document store".to_string(),
                path: root.display().to_string(),
            });
        }
        Ok(Self { root })
    }

    /// 集合文件路径
    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{}.json", collection))
    }

    /// 加载整个集合
    ///
    /// 任何一条坏文档都中止本次加载，宁缺毋错。
    fn load_collection(&self, collection: &str) -> Result<Vec<Document>> {
        let path = self.collection_path(collection);
        let content = fs::read_to_string(&path).map_err(|_| TcoaggError::SourceUnavailable {
            name: collection.to_string(),
            path: path.display().to_string(),
        })?;

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| TcoaggError::MalformedEntry {
                collection: collection.to_string(),
                entry: "<file>".to_string(),
                reason: e.to_string(),
            })?;

        let array = value.as_array().ok_or_else(|| TcoaggError::MalformedEntry {
            collection: collection.to_string(),
            entry: "<file>".to_string(),
            reason: "top level is not an array".to_string(),
        })?;

        array
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_object().cloned().ok_or_else(|| TcoaggError::MalformedEntry {
                    collection: collection.to_string(),
                    entry: format!("#{}", index),
                    reason: "document is not an object".to_string(),
                })
            })
            .collect()
    }
}

impl DocumentStore for JsonDirStore {
    fn find(
        &self,
        collection: &str,
        formulas: &BTreeSet<String>,
        projection: &[&str],
    ) -> Result<Vec<Document>> {
        let docs = self.load_collection(collection)?;
        let mut matched = Vec::new();
        for doc in docs {
            let formula = document_formula(&doc, collection)?;
            if formulas.contains(formula) {
                matched.push(apply_projection(doc, projection));
            }
        }
        Ok(matched)
    }
}

/// 字段投影；formula 恒保留
fn apply_projection(doc: Document, projection: &[&str]) -> Document {
    if projection.is_empty() {
        return doc;
    }
    doc.into_iter()
        .filter(|(key, _)| key == "formula" || projection.contains(&key.as_str()))
        .collect()
}

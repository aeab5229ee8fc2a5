//! # 统一错误处理模块
//!
//! 定义 tcoagg 的所有错误类型，使用 `thiserror` 派生。
//!
//! 跨类别缺失（某化学式在次级类别中不存在）不是错误：
//! 它通过 `aggregate::SkippedFormula` 旁路通道上报，不会中断聚合。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// tcoagg 统一错误类型
#[derive(Error, Debug)]
pub enum TcoaggError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 数据源错误
    // ─────────────────────────────────────────────────────────────
    #[error("Source unavailable: {name} ({path})")]
    SourceUnavailable { name: String, path: String },

    #[error("Malformed entry in '{collection}' ({entry}): {reason}")]
    MalformedEntry {
        collection: String,
        entry: String,
        reason: String,
    },

    #[error("Inconsistent data: {context}: expected {expected}, found {found}")]
    InconsistentData {
        context: String,
        expected: usize,
        found: usize,
    },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid chemical formula: {0}")]
    InvalidFormula(String),

    // ─────────────────────────────────────────────────────────────
    // 序列化错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, TcoaggError>;

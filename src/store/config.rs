//! # 数据库配置模块
//!
//! 加载 JSON 配置文件并与命令行覆盖项合并。
//! 配置内容：集合文件根目录，以及计算目录的存储根替换规则。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TcoaggError};

/// 存储根前缀替换
///
/// 计算目录字段记录的是写库机器上的绝对路径；本机挂载点不同时
/// 用 from -> to 替换前缀。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMap {
    /// 原前缀
    pub from: String,
    /// 替换后前缀
    pub to: String,
}

impl PathMap {
    /// 应用前缀替换；不匹配时原样返回
    pub fn apply(&self, path: &str) -> String {
        match path.strip_prefix(&self.from) {
            Some(rest) => format!("{}{}", self.to, rest),
            None => path.to_string(),
        }
    }

    /// 解析命令行形式 "FROM=TO"
    pub fn parse(value: &str) -> Result<Self> {
        let (from, to) = value.split_once('=').ok_or_else(|| {
            TcoaggError::InvalidArgument(format!(
                "path map must be FROM=TO, got '{}'",
                value
            ))
        })?;
        if from.is_empty() {
            return Err(TcoaggError::InvalidArgument(
                "path map FROM part is empty".to_string(),
            ));
        }
        Ok(Self {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// 集合 JSON 文件所在目录
    pub root: PathBuf,
    /// 计算目录前缀替换（可选）
    #[serde(default)]
    pub path_map: Option<PathMap>,
}

impl StoreConfig {
    /// 从 JSON 配置文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| TcoaggError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| TcoaggError::ParseError {
            format: "store config".to_string(),
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// 合并配置文件与命令行覆盖项
    ///
    /// 优先级：命令行 > 配置文件。两处都未给出根目录时报参数错误。
    pub fn resolve(
        config_file: Option<&Path>,
        db_root: Option<&Path>,
        path_map: Option<&str>,
    ) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::load(path)?,
            None => Self {
                root: PathBuf::new(),
                path_map: None,
            },
        };

        if let Some(root) = db_root {
            config.root = root.to_path_buf();
        }
        if config.root.as_os_str().is_empty() {
            return Err(TcoaggError::InvalidArgument(
                "no store root: pass --db-root or a config file with \"root\"".to_string(),
            ));
        }

        if let Some(value) = path_map {
            config.path_map = Some(PathMap::parse(value)?);
        }

        Ok(config)
    }

    /// 对计算目录应用替换规则；未配置规则时原样返回
    pub fn map_dir(&self, dir: &str) -> String {
        match &self.path_map {
            Some(map) => map.apply(dir),
            None => dir.to_string(),
        }
    }
}

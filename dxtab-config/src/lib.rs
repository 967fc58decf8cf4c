use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            preview: PreviewConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `DXTAB_CONFIG`，否则寻找
    /// `./config/default.toml`。若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("DXTAB_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 结构预览的默认行为。
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    /// 预览显示的最大实体数量。
    #[serde(default = "PreviewConfig::default_max_entities")]
    pub max_entities: usize,
}

impl PreviewConfig {
    fn default_max_entities() -> usize {
        200
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_entities: Self::default_max_entities(),
        }
    }
}

/// 导出行为配置。
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// 未显式给出输出路径时，替换输入扩展名所用的后缀。
    #[serde(default = "ExportConfig::default_output_extension")]
    pub output_extension: String,
}

impl ExportConfig {
    fn default_output_extension() -> String {
        "csv".to_string()
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_extension: Self::default_output_extension(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

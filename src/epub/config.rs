//! 读取器配置模块
//!
//! 提供OPF后备路径和文件名占位符的配置管理，支持从YAML文件加载配置。

use crate::epub::error::{EpubError, Result};
use crate::epub::locator::DEFAULT_FALLBACK_PATHS;
use crate::epub::naming::UNKNOWN;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 默认配置文件名
pub const DEFAULT_CONFIG_PATH: &str = "bookmeta.yaml";

/// 元数据读取与重命名的配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// container.xml之后依次尝试的OPF路径
    pub fallback_paths: Vec<String>,
    /// 文件名中无法确定的部分使用的占位符
    pub unknown: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            fallback_paths: DEFAULT_FALLBACK_PATHS.iter().map(|p| p.to_string()).collect(),
            unknown: UNKNOWN.to_string(),
        }
    }
}

impl ReaderConfig {
    /// 从YAML配置文件加载
    ///
    /// 文件中缺失的字段使用默认值。
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| EpubError::ConfigError(format!("无法读取配置文件 {}: {}", path.display(), e)))?;

        serde_yml::from_str(&content)
            .map_err(|e| EpubError::ConfigError(format!("配置文件格式错误: {}", e)))
    }

    /// 指定了路径时从文件加载，否则使用默认配置
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// 生成默认配置文件
    ///
    /// 目标文件已存在时返回错误，不会覆盖。
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            return Err(EpubError::ConfigError(format!("配置文件已存在: {}", path.display())));
        }

        let yaml_content = serde_yml::to_string(&Self::default())
            .map_err(|e| EpubError::ConfigError(format!("序列化配置失败: {}", e)))?;

        // 在YAML内容前添加注释说明
        let content_with_header = format!(
            "# bookmeta 配置文件\n# fallback_paths: container.xml之后依次尝试的OPF路径（精确匹配）\n# unknown: 文件名中无法确定的部分使用的占位符\n\n{}",
            yaml_content
        );

        fs::write(path, content_with_header)
            .map_err(|e| EpubError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

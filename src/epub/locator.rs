//! OPF包文件定位
//!
//! 标准规定OPF的位置由container.xml给出，但实际的EPUB文件经常放错位置，
//! 因此按固定优先级依次尝试多个候选路径，取第一个在归档中精确存在的路径。

use std::io::{Read, Seek};

use log::{debug, warn};

use crate::epub::archive::EpubArchive;
use crate::epub::container::Container;
use crate::epub::error::EpubError;
use crate::epub::xml::CONTAINER_PATH;

/// container.xml之后依次尝试的候选路径
pub const DEFAULT_FALLBACK_PATHS: [&str; 4] = [
    "OEBPS/content.opf",
    "OEBPS/Content.opf",
    "content.opf",
    "Content.opf",
];

/// OPF包文件定位器
#[derive(Debug, Clone)]
pub struct DescriptorLocator {
    fallback_paths: Vec<String>,
}

impl Default for DescriptorLocator {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_PATHS.iter().map(|p| p.to_string()).collect())
    }
}

impl DescriptorLocator {
    /// 使用自定义的后备路径列表创建定位器
    pub fn new(fallback_paths: Vec<String>) -> Self {
        Self { fallback_paths }
    }

    /// 按优先级生成候选路径列表
    ///
    /// container.xml中声明的路径（如果有）排在最前面。
    pub fn candidates<R: Read + Seek>(&self, archive: &mut EpubArchive<R>) -> Vec<String> {
        let mut candidates = Vec::with_capacity(self.fallback_paths.len() + 1);
        if let Some(declared) = Self::path_from_container(archive) {
            candidates.push(declared);
        }
        candidates.extend(self.fallback_paths.iter().cloned());
        candidates
    }

    /// 定位OPF包文件
    ///
    /// # 返回值
    /// * `Option<String>` - 第一个在归档中精确存在的候选路径，全部不存在时为 `None`
    pub fn locate<R: Read + Seek>(&self, archive: &mut EpubArchive<R>) -> Option<String> {
        let candidates = self.candidates(archive);
        let members = archive.list_members();

        let found = candidates.into_iter().find(|candidate| {
            let exists = members.contains(candidate);
            debug!("候选OPF路径 {}: {}", candidate, if exists { "存在" } else { "不存在" });
            exists
        });

        if found.is_none() {
            debug!("没有找到OPF包文件");
        }
        found
    }

    /// 从container.xml读取OPF路径
    ///
    /// container.xml缺失、无法读取或没有可用的full-path时返回 `None`，不视为错误。
    fn path_from_container<R: Read + Seek>(archive: &mut EpubArchive<R>) -> Option<String> {
        let content = match archive.read_member(CONTAINER_PATH) {
            Ok(content) => content,
            Err(EpubError::MemberNotFound(_)) => {
                debug!("归档中没有 {}", CONTAINER_PATH);
                return None;
            }
            Err(e) => {
                warn!("无法读取 {}: {}", CONTAINER_PATH, e);
                return None;
            }
        };

        match Container::parse_xml(&content) {
            Ok(container) => {
                let path = container.opf_path().map(str::to_string);
                if path.is_none() {
                    warn!("{} 中没有可用的rootfile full-path", CONTAINER_PATH);
                }
                path
            }
            Err(e) => {
                warn!("无法解析 {}: {}", CONTAINER_PATH, e);
                None
            }
        }
    }
}

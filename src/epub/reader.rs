use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use log::{debug, info};

use crate::epub::archive::EpubArchive;
use crate::epub::config::ReaderConfig;
use crate::epub::error::Result;
use crate::epub::locator::DescriptorLocator;
use crate::epub::opf::{MetadataDict, MetadataExtractor};

/// EPUB元数据读取器
///
/// 把归档读取、OPF定位和元数据提取串起来。读取器持有打开的归档，
/// 被drop时归档随之关闭；提取出的 `MetadataDict` 不引用归档。
pub struct EpubMetaReader<R = File> {
    archive: EpubArchive<R>,
    locator: DescriptorLocator,
}

impl EpubMetaReader<File> {
    /// 使用默认配置打开EPUB文件
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    ///
    /// # 返回值
    /// * `Result<EpubMetaReader>` - 文件无法作为zip归档打开时返回错误
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, &ReaderConfig::default())
    }

    /// 使用指定配置打开EPUB文件
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: &ReaderConfig) -> Result<Self> {
        let archive = EpubArchive::open(path)?;
        Ok(Self::new(archive, config))
    }
}

impl<R: Read + Seek> EpubMetaReader<R> {
    pub fn new(archive: EpubArchive<R>, config: &ReaderConfig) -> Self {
        Self {
            archive,
            locator: DescriptorLocator::new(config.fallback_paths.clone()),
        }
    }

    /// 获取OPF包文件在归档中的路径
    ///
    /// # 返回值
    /// * `Option<String>` - 所有候选路径都不存在时为 `None`
    pub fn find_contents_file(&mut self) -> Option<String> {
        self.locator.locate(&mut self.archive)
    }

    /// 读取OPF包文件的内容
    pub fn read_contents_file(&mut self) -> Result<Option<Vec<u8>>> {
        match self.find_contents_file() {
            Some(path) => {
                info!("OPF包文件: {}", path);
                self.archive.read_member(&path).map(Some)
            }
            None => Ok(None),
        }
    }

    /// 查找并提取元数据
    ///
    /// # 返回值
    /// * `Ok(Some(MetadataDict))` - 找到了metadata元素（可能为空）
    /// * `Ok(None)` - 没有OPF包文件，或OPF中没有metadata元素
    /// * `Err(EpubError)` - OPF存在但不是合法的XML
    pub fn get_metadata(&mut self) -> Result<Option<MetadataDict>> {
        let Some(contents) = self.read_contents_file()? else {
            debug!("归档中没有可用的OPF包文件");
            return Ok(None);
        };
        MetadataExtractor::extract(&contents)
    }
}

/// 打开EPUB文件、提取元数据并立即释放归档
pub fn read_metadata<P: AsRef<Path>>(path: P, config: &ReaderConfig) -> Result<Option<MetadataDict>> {
    let mut reader = EpubMetaReader::open_with_config(path, config)?;
    reader.get_metadata()
}

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use log::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::epub::error::{EpubError, Result};

/// 一个打开的EPUB（zip）归档
///
/// 归档句柄在实例的整个生命周期内保持打开，实例被drop时释放。
pub struct EpubArchive<R = File> {
    archive: ZipArchive<R>,
}

impl EpubArchive<File> {
    /// 从文件路径打开归档
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    ///
    /// # 返回值
    /// * `Result<EpubArchive>` - 文件不存在或不是有效的zip归档时返回 `ArchiveOpen` 错误
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let open_error = |source: ZipError| EpubError::ArchiveOpen {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(|e| open_error(ZipError::Io(e)))?;
        let archive = ZipArchive::new(file).map_err(open_error)?;
        debug!("已打开归档 {}，共 {} 个条目", path.display(), archive.len());

        Ok(Self { archive })
    }
}

impl<R: Read + Seek> EpubArchive<R> {
    /// 从任意可随机访问的数据源创建归档
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    /// 列出归档中的所有条目路径
    pub fn list_members(&self) -> HashSet<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// 归档中是否存在指定路径的条目（精确匹配）
    pub fn contains(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    /// 读取指定条目的二进制内容
    ///
    /// # 参数
    /// * `name` - 条目在归档中的路径
    ///
    /// # 返回值
    /// * `Result<Vec<u8>>` - 条目不存在时返回 `MemberNotFound`
    pub fn read_member(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Err(EpubError::MemberNotFound(name.to_string())),
            Err(e) => return Err(e.into()),
        };

        // 头部声明的大小不可信，不据此预分配
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

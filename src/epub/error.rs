use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpubError>;

/// Epub元数据读取相关的错误类型
///
/// "未找到"类的情况（没有container.xml、没有OPF、没有metadata元素）
/// 不会出现在这里，它们以 `None` 的形式在管线中传递。
#[derive(Error, Debug)]
pub enum EpubError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("无法打开归档文件 {}: {source}", .path.display())]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("归档中不存在条目: {0}")]
    MemberNotFound(String),

    #[error("XML解析错误: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("XML文档格式错误: {0}")]
    MalformedXml(String),

    #[error("配置文件错误: {0}")]
    ConfigError(String),

    #[error("目标文件已存在: {}", .0.display())]
    RenameTargetExists(PathBuf),

    #[error("无效的目标文件名: {0}")]
    InvalidTargetName(String),

    #[error("无法将 {} 重命名为 {}: {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EpubError {
    /// 是否属于"输入格式错误"（无法打开的归档、无法解析的XML）
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            EpubError::ArchiveOpen { .. } | EpubError::XmlError(_) | EpubError::MalformedXml(_)
        )
    }
}

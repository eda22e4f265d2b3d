pub mod epub;

// === 核心API重新导出 ===

/// EPUB元数据读取器（主要接口）
pub use epub::{EpubMetaReader, read_metadata};

/// 错误处理
pub use epub::{EpubError, Result};

// === 数据结构 ===

/// 规范化的元数据模型
pub use epub::{FieldValue, MetaValue, MetadataDict, MetadataField};

/// 文件名生成与重命名
pub use epub::{FilenameComposer, rename_file};

/// 配置
pub use epub::ReaderConfig;

// === 底层组件（高级用法） ===

/// 归档与容器组件
pub use epub::{Container, DescriptorLocator, EpubArchive, RootFile};

/// OPF元数据提取
pub use epub::MetadataExtractor;

// === 库信息 ===

/// 库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库的描述
pub const DESCRIPTION: &str = "读取EPUB元数据并据此规范化重命名文件";

// === 便捷函数 ===

/// 快速打开EPUB文件
///
/// 这是 `EpubMetaReader::open` 的便捷包装函数。
///
/// # 参数
/// * `path` - EPUB文件路径
///
/// # 返回值
/// * `Result<EpubMetaReader>` - 读取器实例
///
/// # 示例
///
/// ```no_run
/// let mut reader = bookmeta::open("book.epub")?;
/// if let Some(metadata) = reader.get_metadata()? {
///     let name = bookmeta::FilenameComposer::default().compose(&metadata);
///     println!("新文件名: {}", name);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<EpubMetaReader> {
    EpubMetaReader::open(path)
}

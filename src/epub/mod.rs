pub mod error;
pub mod xml;
pub mod archive;
pub mod container;
pub mod locator;
pub mod opf;
pub mod config;
pub mod naming;
pub mod reader;

// 重新导出错误处理
pub use error::{EpubError, Result};

// 重新导出归档与容器相关
pub use archive::EpubArchive;
pub use container::{Container, RootFile};
pub use locator::{DescriptorLocator, DEFAULT_FALLBACK_PATHS};

// 重新导出OPF相关
pub use opf::{FieldValue, MetaValue, MetadataDict, MetadataExtractor, MetadataField};

// 重新导出配置、命名与读取器
pub use config::ReaderConfig;
pub use naming::{FilenameComposer, rename_file};
pub use reader::{EpubMetaReader, read_metadata};

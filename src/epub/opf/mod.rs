//! OPF（Open Packaging Format）元数据模块
//!
//! 此模块提供OPF包文件中Dublin Core元数据的提取与规范化表示。

mod metadata;
mod parser;

pub use metadata::{
    FieldValue,
    MetaValue,
    MetadataDict,
    MetadataField,
    EVENT_PUBLICATION,
    ROLE_AUTHOR,
    SCHEME_ISBN,
};
pub use parser::MetadataExtractor;

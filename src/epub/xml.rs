//! XML命名空间常量与名称规范化
//!
//! 标签匹配使用quick-xml的命名空间解析（`NsReader`），
//! 这里的 `strip_namespace` 只用于属性名的规范化。

/// OPF包文件命名空间
pub const OPF_NS: &[u8] = b"http://www.idpf.org/2007/opf";

/// Dublin Core元素命名空间
pub const DC_NS: &[u8] = b"http://purl.org/dc/elements/1.1/";

/// container.xml命名空间
pub const CONTAINER_NS: &[u8] = b"urn:oasis:names:tc:opendocument:xmlns:container";

/// container.xml在归档中的固定位置
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// 去掉名称中的命名空间部分
///
/// 同时接受 `{namespace-uri}localname` 形式和带前缀的 `prefix:localname` 形式，
/// 只保留 `localname`。
pub fn strip_namespace(name: &str) -> &str {
    if name.starts_with('{') {
        if let Some(end) = name.find('}') {
            return &name[end + 1..];
        }
    }
    match name.rfind(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// 规范化属性名：去掉命名空间并转为小写
pub fn normalize_attribute_name(name: &str) -> String {
    strip_namespace(name).to_lowercase()
}

/// 文本是否只包含空白字符
pub fn is_blank(text: &[u8]) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

//! OPF解析器模块
//!
//! 从OPF包文件中提取 `metadata` 元素下的Dublin Core元数据。

use crate::epub::error::{EpubError, Result};
use crate::epub::opf::metadata::{MetaValue, MetadataDict, MetadataField};
use crate::epub::xml::{DC_NS, OPF_NS, is_blank};
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

/// 根元素的深度
const ROOT_DEPTH: usize = 1;
/// `metadata` 元素的深度（根元素的直接子元素）
const METADATA_DEPTH: usize = 2;
/// Dublin Core元素的深度（`metadata` 的直接子元素）
const FIELD_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetadataSection {
    NotSeen,
    Inside,
    Done,
}

/// 正在读取的Dublin Core元素
struct PendingElement {
    field: MetadataField,
    attributes: Vec<(String, String)>,
    text: String,
    /// 遇到第一个子元素后不再收集文本
    collecting_text: bool,
}

/// OPF元数据提取器
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// 解析OPF文件内容并提取元数据
    ///
    /// 只识别OPF命名空间下、作为根元素直接子元素的第一个 `metadata` 元素，
    /// 以及其中Dublin Core命名空间下的直接子元素。
    ///
    /// # 参数
    /// * `xml_content` - OPF文件的XML内容
    ///
    /// # 返回值
    /// * `Ok(Some(MetadataDict))` - 找到metadata元素
    /// * `Ok(None)` - 文档合法但没有metadata元素
    /// * `Err(EpubError)` - XML格式错误
    pub fn extract(xml_content: &[u8]) -> Result<Option<MetadataDict>> {
        let mut reader = NsReader::from_reader(xml_content);
        reader.config_mut().expand_empty_elements = true;

        let mut metadata = MetadataDict::new();
        let mut section = MetadataSection::NotSeen;
        let mut pending: Option<PendingElement> = None;
        let mut depth = 0usize;
        let mut seen_root = false;
        let mut buf = Vec::new();

        loop {
            let (ns, event) = reader.read_resolved_event_into(&mut buf)?;
            let in_opf_ns = matches!(&ns, ResolveResult::Bound(Namespace(uri)) if *uri == OPF_NS);
            let in_dc_ns = matches!(&ns, ResolveResult::Bound(Namespace(uri)) if *uri == DC_NS);

            match event {
                Event::Start(ref e) => {
                    depth += 1;
                    if depth == ROOT_DEPTH {
                        if seen_root {
                            return Err(EpubError::MalformedXml("OPF文档存在多个根元素".to_string()));
                        }
                        seen_root = true;
                    }

                    match (section, depth) {
                        (MetadataSection::NotSeen, METADATA_DEPTH)
                            if in_opf_ns && e.local_name().as_ref() == b"metadata" =>
                        {
                            section = MetadataSection::Inside;
                        }
                        (MetadataSection::Inside, FIELD_DEPTH) if in_dc_ns => {
                            if let Some(field) = MetadataField::from_name(e.local_name().as_ref()) {
                                pending = Some(Self::start_field(field, e)?);
                            }
                        }
                        _ => {
                            if let Some(element) = pending.as_mut() {
                                element.collecting_text = false;
                            }
                        }
                    }
                }
                Event::End(_) => {
                    match (section, depth) {
                        (MetadataSection::Inside, FIELD_DEPTH) => {
                            if let Some(element) = pending.take() {
                                metadata = Self::finish_field(metadata, element);
                            }
                        }
                        (MetadataSection::Inside, METADATA_DEPTH) => {
                            section = MetadataSection::Done;
                        }
                        _ => {}
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Text(ref e) if depth == 0 => {
                    if !is_blank(e) {
                        return Err(EpubError::MalformedXml("OPF文档根元素之外存在文本".to_string()));
                    }
                }
                Event::CData(_) if depth == 0 => {
                    return Err(EpubError::MalformedXml("OPF文档根元素之外存在CDATA".to_string()));
                }
                Event::Text(ref e) => {
                    if let Some(element) = pending.as_mut().filter(|el| el.collecting_text) {
                        element.text.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) => {
                    if let Some(element) = pending.as_mut().filter(|el| el.collecting_text) {
                        element.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !seen_root {
            return Err(EpubError::MalformedXml("OPF文档没有根元素".to_string()));
        }
        if depth != 0 {
            return Err(EpubError::MalformedXml("OPF文档中存在未闭合的元素".to_string()));
        }

        if section == MetadataSection::NotSeen {
            debug!("OPF文档中没有metadata元素");
            return Ok(None);
        }
        Ok(Some(metadata))
    }

    /// 读取Dublin Core元素的属性，跳过命名空间声明
    fn start_field(field: MetadataField, e: &BytesStart) -> Result<PendingElement> {
        let mut attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| EpubError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(PendingElement {
            field,
            attributes,
            text: String::new(),
            collecting_text: true,
        })
    }

    /// 把读完的元素写入元数据；单值字段只保留第一次出现的元素
    fn finish_field(metadata: MetadataDict, element: PendingElement) -> MetadataDict {
        if !element.field.is_multiple() && metadata.contains(element.field) {
            return metadata;
        }
        let value = MetaValue::new(element.text.trim(), element.attributes);
        metadata.with_value(element.field, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::testutil::opf_xml;

    fn extract(children: &str) -> MetadataDict {
        MetadataExtractor::extract(opf_xml(children).as_bytes())
            .expect("解析OPF失败")
            .expect("没有找到metadata元素")
    }

    #[test]
    fn test_simple_xml_parsing() {
        let md = extract(concat!(
            r#"<dc:title>  Test Book: A Subtitle </dc:title>"#,
            r#"<dc:creator opf:role="aut" opf:file-as="Author, Test">Test Author</dc:creator>"#,
            r#"<dc:language>en</dc:language>"#,
            r#"<dc:publisher>Pub &amp; Co</dc:publisher>"#,
            r#"<dc:description><![CDATA[<b>bold</b> text]]></dc:description>"#,
        ));

        assert_eq!(md.title().unwrap().value(), "Test Book: A Subtitle");
        assert_eq!(md.language().unwrap().value(), "en");
        assert_eq!(md.publisher().unwrap().value(), "Pub & Co");
        assert_eq!(md.description().unwrap().value(), "<b>bold</b> text");

        let authors = md.authors();
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].value(), "Test Author");
        assert_eq!(authors[0].attribute("file-as"), Some("Author, Test"));
        // 命名空间声明不算属性
        assert_eq!(authors[0].attributes().len(), 2);
    }

    #[test]
    fn test_multiple_fields_keep_document_order() {
        let md = extract(concat!(
            r#"<dc:creator opf:role="aut">First</dc:creator>"#,
            r#"<dc:title>Book</dc:title>"#,
            r#"<dc:creator opf:role="edt">Second</dc:creator>"#,
            r#"<dc:creator>Third</dc:creator>"#,
            r#"<dc:contributor opf:role="trl">Translator</dc:contributor>"#,
        ));

        let names: Vec<&str> = md.creators(None).iter().map(|c| c.value()).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
        assert_eq!(md.contributors(Some("trl"))[0].value(), "Translator");
    }

    #[test]
    fn test_single_field_takes_first_match() {
        let md = extract(r#"<dc:title>First</dc:title><dc:title>Second</dc:title>"#);
        assert_eq!(md.title().unwrap().value(), "First");
    }

    #[test]
    fn test_empty_tag_yields_empty_value() {
        let md = extract(r#"<dc:title/><dc:date opf:event="publication"></dc:date>"#);
        assert_eq!(md.title().unwrap().value(), "");
        assert!(md.contains(MetadataField::Title));
        assert_eq!(md.publication_date()[0].value(), "");
    }

    #[test]
    fn test_zero_identifiers() {
        let md = extract(r#"<dc:title>Book</dc:title>"#);
        assert!(!md.contains(MetadataField::Identifier));
        assert!(md.identifiers(None).is_empty());
        assert!(md.isbn().is_empty());
    }

    #[test]
    fn test_elements_outside_dc_namespace_are_ignored() {
        let md = extract(concat!(
            r#"<title>No namespace</title>"#,
            r#"<x:creator xmlns:x="urn:example">Other namespace</x:creator>"#,
            r#"<dc:subject>Not modelled</dc:subject>"#,
            r#"<meta name="cover" content="cover-image"/>"#,
        ));
        assert!(md.is_empty());
    }

    #[test]
    fn test_nested_dc_elements_are_ignored() {
        let md = extract(r#"<dc-metadata><dc:title>Nested</dc:title></dc-metadata>"#);
        assert!(md.title().is_none());
    }

    #[test]
    fn test_text_after_child_element_is_dropped() {
        let md = extract(r#"<dc:title>Main<span>inner</span>tail</dc:title>"#);
        assert_eq!(md.title().unwrap().value(), "Main");
    }

    #[test]
    fn test_default_dc_namespace_and_prefixed_attributes() {
        let xml = r#"<package xmlns="http://www.idpf.org/2007/opf">
<metadata>
  <identifier xmlns="http://purl.org/dc/elements/1.1/" xmlns:o="http://www.idpf.org/2007/opf" o:Scheme="ISBN">0-13-468599-X</identifier>
</metadata>
</package>"#;
        let md = MetadataExtractor::extract(xml.as_bytes()).unwrap().unwrap();
        assert_eq!(md.isbn()[0].value(), "0-13-468599-X");
    }

    #[test]
    fn test_missing_metadata_is_absence() {
        let xml = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
<manifest></manifest>
</package>"#;
        assert!(MetadataExtractor::extract(xml.as_bytes()).unwrap().is_none());
    }

    #[test]
    fn test_metadata_in_wrong_namespace_is_absence() {
        let xml = r#"<package xmlns="urn:example:not-opf"><metadata/></package>"#;
        assert!(MetadataExtractor::extract(xml.as_bytes()).unwrap().is_none());
    }

    #[test]
    fn test_empty_metadata_section() {
        let xml = r#"<package xmlns="http://www.idpf.org/2007/opf"><metadata/></package>"#;
        let md = MetadataExtractor::extract(xml.as_bytes()).unwrap();
        assert_eq!(md, Some(MetadataDict::new()));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let mismatched = r#"<package xmlns="http://www.idpf.org/2007/opf"><metadata></package>"#;
        let err = MetadataExtractor::extract(mismatched.as_bytes()).unwrap_err();
        assert!(err.is_malformed_input());

        let unclosed = r#"<package xmlns="http://www.idpf.org/2007/opf"><metadata>"#;
        let err = MetadataExtractor::extract(unclosed.as_bytes()).unwrap_err();
        assert!(err.is_malformed_input());

        let err = MetadataExtractor::extract(b"   ").unwrap_err();
        assert!(matches!(err, EpubError::MalformedXml(_)));
    }

    #[test]
    fn test_text_outside_root_is_an_error() {
        let trailing = r#"<package xmlns="http://www.idpf.org/2007/opf"><metadata/></package> trailing garbage"#;
        let err = MetadataExtractor::extract(trailing.as_bytes()).unwrap_err();
        assert!(matches!(err, EpubError::MalformedXml(_)));

        let leading = r#"junk<package xmlns="http://www.idpf.org/2007/opf"><metadata/></package>"#;
        assert!(MetadataExtractor::extract(leading.as_bytes()).is_err());

        let whitespace = "\n<package xmlns=\"http://www.idpf.org/2007/opf\"><metadata/></package>\n\n";
        assert!(MetadataExtractor::extract(whitespace.as_bytes()).unwrap().is_some());
    }
}

use crate::epub::error::{EpubError, Result};
use crate::epub::xml::{CONTAINER_NS, is_blank};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

/// Container.xml中的rootfile信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootFile {
    /// full-path属性，缺失时为 `None`
    pub full_path: Option<String>,
    pub media_type: Option<String>,
}

/// Container.xml的解析结果
#[derive(Debug, Clone, Default)]
pub struct Container {
    /// `container/rootfiles/rootfile` 元素，按文档顺序
    pub rootfiles: Vec<RootFile>,
}

impl Container {
    /// 解析container.xml内容
    ///
    /// 只接受container命名空间下、位于根元素的 `rootfiles` 子元素中的 `rootfile`，
    /// 多个 `rootfiles` 元素中的 `rootfile` 按文档顺序合并。
    ///
    /// # 参数
    /// * `xml_content` - container.xml的文件内容
    ///
    /// # 返回值
    /// * `Result<Container, EpubError>` - XML格式错误时返回错误；没有rootfile时返回空列表
    pub fn parse_xml(xml_content: &[u8]) -> Result<Container> {
        let mut reader = NsReader::from_reader(xml_content);
        reader.config_mut().expand_empty_elements = true;

        let mut rootfiles = Vec::new();
        let mut buf = Vec::new();
        let mut depth = 0usize;
        let mut in_rootfiles = false;
        let mut seen_root = false;

        loop {
            let (ns, event) = reader.read_resolved_event_into(&mut buf)?;
            let in_container_ns = matches!(&ns, ResolveResult::Bound(Namespace(uri)) if *uri == CONTAINER_NS);
            match event {
                Event::Start(ref e) => {
                    depth += 1;
                    seen_root = true;
                    let local_name = e.local_name();
                    match (depth, local_name.as_ref()) {
                        (2, b"rootfiles") if in_container_ns => in_rootfiles = true,
                        (3, b"rootfile") if in_container_ns && in_rootfiles => {
                            rootfiles.push(Self::parse_rootfile(e)?);
                        }
                        _ => {}
                    }
                }
                Event::End(_) => {
                    if depth == 2 {
                        in_rootfiles = false;
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Text(ref e) if depth == 0 && !is_blank(e) => {
                    return Err(EpubError::MalformedXml("container.xml根元素之外存在文本".to_string()));
                }
                Event::CData(_) if depth == 0 => {
                    return Err(EpubError::MalformedXml("container.xml根元素之外存在CDATA".to_string()));
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !seen_root {
            return Err(EpubError::MalformedXml("container.xml没有根元素".to_string()));
        }
        if depth != 0 {
            return Err(EpubError::MalformedXml("container.xml中存在未闭合的元素".to_string()));
        }

        Ok(Container { rootfiles })
    }

    fn parse_rootfile(e: &BytesStart) -> Result<RootFile> {
        let mut rootfile = RootFile {
            full_path: None,
            media_type: None,
        };

        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|e| EpubError::XmlError(quick_xml::Error::InvalidAttr(e)))?;
            match attr.key.as_ref() {
                b"full-path" => {
                    rootfile.full_path = Some(attr.unescape_value()?.into_owned());
                }
                b"media-type" => {
                    rootfile.media_type = Some(attr.unescape_value()?.into_owned());
                }
                _ => {}
            }
        }

        Ok(rootfile)
    }

    /// 获取OPF文件路径
    ///
    /// 取第一个rootfile的full-path属性；属性缺失或为空时返回 `None`。
    pub fn opf_path(&self) -> Option<&str> {
        self.rootfiles
            .first()
            .and_then(|rootfile| rootfile.full_path.as_deref())
            .filter(|path| !path.is_empty())
    }
}

//! 元数据模型
//!
//! `MetadataDict` 是每本书规范化后的元数据记录：四个单值字段和四个多值字段。
//! 字段存在与否由类型表达（`Option` / 非空 `Vec`），标签存在但没有文本时值为空字符串。

use crate::epub::xml::normalize_attribute_name;
use std::collections::BTreeMap;
use std::fmt;

/// 作者的角色代码（MARC relator）
pub const ROLE_AUTHOR: &str = "aut";
/// ISBN标识符的scheme
pub const SCHEME_ISBN: &str = "ISBN";
/// 出版日期的event
pub const EVENT_PUBLICATION: &str = "publication";

/// 一条元数据：文本内容加上元素属性
///
/// 属性名在构造时去掉命名空间并转为小写（`opf:role` → `role`），
/// 同名属性后者覆盖前者。构造后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetaValue {
    value: String,
    attributes: BTreeMap<String, String>,
}

impl MetaValue {
    pub fn new<I, K, V>(value: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let attributes = attributes
            .into_iter()
            .map(|(k, v)| (normalize_attribute_name(k.as_ref()), v.into()))
            .collect();
        Self {
            value: value.into(),
            attributes,
        }
    }

    /// 没有属性的元数据
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(value, std::iter::empty::<(&str, String)>())
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// 按规范化后的属性名查找属性值
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn has_attribute(&self, name: &str, expected: &str) -> bool {
        self.attribute(name) == Some(expected)
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// 元数据字段名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetadataField {
    Publisher,
    Language,
    Title,
    Description,
    Creator,
    Contributor,
    Identifier,
    Date,
}

impl MetadataField {
    /// 所有字段，单值字段在前
    pub const ALL: [MetadataField; 8] = [
        MetadataField::Publisher,
        MetadataField::Language,
        MetadataField::Title,
        MetadataField::Description,
        MetadataField::Creator,
        MetadataField::Contributor,
        MetadataField::Identifier,
        MetadataField::Date,
    ];

    /// 对应的Dublin Core元素名
    pub fn as_str(self) -> &'static str {
        match self {
            MetadataField::Publisher => "publisher",
            MetadataField::Language => "language",
            MetadataField::Title => "title",
            MetadataField::Description => "description",
            MetadataField::Creator => "creator",
            MetadataField::Contributor => "contributor",
            MetadataField::Identifier => "identifier",
            MetadataField::Date => "date",
        }
    }

    /// 是否为多值字段
    pub fn is_multiple(self) -> bool {
        matches!(
            self,
            MetadataField::Creator
                | MetadataField::Contributor
                | MetadataField::Identifier
                | MetadataField::Date
        )
    }

    /// 按Dublin Core元素名查找字段（区分大小写）
    pub fn from_name(name: &[u8]) -> Option<MetadataField> {
        MetadataField::ALL
            .into_iter()
            .find(|field| field.as_str().as_bytes() == name)
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一个字段的取值视图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Single(&'a MetaValue),
    Multiple(&'a [MetaValue]),
}

/// 一本书的规范化元数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataDict {
    publisher: Option<MetaValue>,
    language: Option<MetaValue>,
    title: Option<MetaValue>,
    description: Option<MetaValue>,
    creator: Vec<MetaValue>,
    contributor: Vec<MetaValue>,
    identifier: Vec<MetaValue>,
    date: Vec<MetaValue>,
}

impl MetadataDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置字段值：单值字段直接替换，多值字段按顺序追加
    pub fn with_value(mut self, field: MetadataField, value: MetaValue) -> Self {
        match field {
            MetadataField::Publisher => self.publisher = Some(value),
            MetadataField::Language => self.language = Some(value),
            MetadataField::Title => self.title = Some(value),
            MetadataField::Description => self.description = Some(value),
            MetadataField::Creator => self.creator.push(value),
            MetadataField::Contributor => self.contributor.push(value),
            MetadataField::Identifier => self.identifier.push(value),
            MetadataField::Date => self.date.push(value),
        }
        self
    }

    /// 获取字段值，字段不存在时返回 `None`
    pub fn get(&self, field: MetadataField) -> Option<FieldValue<'_>> {
        match field {
            MetadataField::Publisher => self.publisher.as_ref().map(FieldValue::Single),
            MetadataField::Language => self.language.as_ref().map(FieldValue::Single),
            MetadataField::Title => self.title.as_ref().map(FieldValue::Single),
            MetadataField::Description => self.description.as_ref().map(FieldValue::Single),
            MetadataField::Creator => non_empty(&self.creator),
            MetadataField::Contributor => non_empty(&self.contributor),
            MetadataField::Identifier => non_empty(&self.identifier),
            MetadataField::Date => non_empty(&self.date),
        }
    }

    pub fn contains(&self, field: MetadataField) -> bool {
        self.get(field).is_some()
    }

    /// 按固定顺序遍历存在的字段
    pub fn fields(&self) -> impl Iterator<Item = (MetadataField, FieldValue<'_>)> + '_ {
        MetadataField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }

    pub fn publisher(&self) -> Option<&MetaValue> {
        self.publisher.as_ref()
    }

    pub fn language(&self) -> Option<&MetaValue> {
        self.language.as_ref()
    }

    pub fn title(&self) -> Option<&MetaValue> {
        self.title.as_ref()
    }

    pub fn description(&self) -> Option<&MetaValue> {
        self.description.as_ref()
    }

    /// 创建者，可按role过滤
    pub fn creators(&self, role: Option<&str>) -> Vec<&MetaValue> {
        filter_by(&self.creator, "role", role)
    }

    /// role为 `aut` 的创建者
    pub fn authors(&self) -> Vec<&MetaValue> {
        self.creators(Some(ROLE_AUTHOR))
    }

    /// 贡献者，可按role过滤
    pub fn contributors(&self, role: Option<&str>) -> Vec<&MetaValue> {
        filter_by(&self.contributor, "role", role)
    }

    /// 标识符，可按scheme过滤
    pub fn identifiers(&self, scheme: Option<&str>) -> Vec<&MetaValue> {
        filter_by(&self.identifier, "scheme", scheme)
    }

    /// scheme为 `ISBN` 的标识符
    pub fn isbn(&self) -> Vec<&MetaValue> {
        self.identifiers(Some(SCHEME_ISBN))
    }

    /// 日期，可按event过滤
    pub fn dates(&self, event: Option<&str>) -> Vec<&MetaValue> {
        filter_by(&self.date, "event", event)
    }

    /// event为 `publication` 的日期
    pub fn publication_date(&self) -> Vec<&MetaValue> {
        self.dates(Some(EVENT_PUBLICATION))
    }
}

fn non_empty(values: &[MetaValue]) -> Option<FieldValue<'_>> {
    if values.is_empty() {
        None
    } else {
        Some(FieldValue::Multiple(values))
    }
}

fn filter_by<'a>(values: &'a [MetaValue], attribute: &str, expected: Option<&str>) -> Vec<&'a MetaValue> {
    match expected {
        Some(expected) => values
            .iter()
            .filter(|value| value.has_attribute(attribute, expected))
            .collect(),
        None => values.iter().collect(),
    }
}

/// 单行原始表示，如 `{'title': 'X', 'creator': MetaValue('A', role='aut')}`
impl fmt::Display for MetadataDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (field, value)) in self.fields().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}': ", field)?;
            match value {
                FieldValue::Single(v) => write!(f, "'{}'", v)?,
                FieldValue::Multiple(values) => {
                    for (j, v) in values.iter().enumerate() {
                        if j > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "MetaValue('{}'", v.value())?;
                        for (k, attr) in v.attributes() {
                            write!(f, ", {}='{}'", k, attr)?;
                        }
                        f.write_str(")")?;
                    }
                }
            }
        }
        f.write_str("}")
    }
}

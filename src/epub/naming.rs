//! 根据元数据生成规范文件名
//!
//! 文件名模板：`<作者姓氏> (<年份>) <短标题> (isbn<ISBN>).epub`，
//! 每一部分无法确定时使用占位符（默认 `UNKNOWN`）。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::epub::error::{EpubError, Result};
use crate::epub::opf::MetadataDict;

/// 默认占位符
pub const UNKNOWN: &str = "UNKNOWN";

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}").expect("year regex is valid"));

static ISBN_NOISE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[- ]+").expect("isbn regex is valid"));

/// 文件名生成器
#[derive(Debug, Clone)]
pub struct FilenameComposer {
    unknown: String,
}

impl Default for FilenameComposer {
    fn default() -> Self {
        Self::new(UNKNOWN)
    }
}

impl FilenameComposer {
    pub fn new(unknown: impl Into<String>) -> Self {
        Self {
            unknown: unknown.into(),
        }
    }

    /// 生成目标文件名
    ///
    /// 相同的元数据总是得到相同的文件名；元数据缺失时不会失败。
    pub fn compose(&self, metadata: &MetadataDict) -> String {
        format!(
            "{} ({}) {} (isbn{}).epub",
            self.surname(metadata),
            self.year(metadata),
            self.short_title(metadata),
            self.isbn(metadata)
        )
    }

    /// 第一作者的姓氏
    ///
    /// 优先取 `authors()`，没有时退回全部创建者。先用 `file-as` 属性逗号前的部分，
    /// 再用姓名按空格分割后的最后一段。
    pub fn surname(&self, metadata: &MetadataDict) -> String {
        let mut candidates = metadata.authors();
        if candidates.is_empty() {
            candidates = metadata.creators(None);
        }
        let Some(first) = candidates.first() else {
            return self.unknown.clone();
        };

        let from_file_as = first
            .attribute("file-as")
            .and_then(|file_as| file_as.split(',').next())
            .filter(|surname| !surname.is_empty());
        let from_name = first.value().split(' ').next_back().filter(|surname| !surname.is_empty());

        from_file_as
            .or(from_name)
            .map(str::to_string)
            .unwrap_or_else(|| self.unknown.clone())
    }

    /// 出版年份
    ///
    /// 优先取出版日期，没有时退回全部日期；取按字符串比较最早的一个，
    /// 再截取开头的4位数字。
    pub fn year(&self, metadata: &MetadataDict) -> String {
        let mut dates = metadata.publication_date();
        if dates.is_empty() {
            dates = metadata.dates(None);
        }

        dates
            .into_iter()
            .map(|date| date.value())
            .min()
            .and_then(|earliest| YEAR_RE.find(earliest))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| self.unknown.clone())
    }

    /// 短标题：标题中第一个冒号之前的部分
    pub fn short_title(&self, metadata: &MetadataDict) -> String {
        match metadata.title() {
            Some(title) => title.value().split(':').next().unwrap_or_default().trim().to_string(),
            None => self.unknown.clone(),
        }
    }

    /// ISBN
    ///
    /// 优先取scheme为ISBN的第一个标识符；没有时按文档顺序找第一个
    /// 去掉连字符和空格后长度为10或13的标识符。不做校验位检查。
    pub fn isbn(&self, metadata: &MetadataDict) -> String {
        if let Some(isbn) = metadata.isbn().first() {
            return clean_isbn(isbn.value());
        }

        metadata
            .identifiers(None)
            .into_iter()
            .map(|identifier| clean_isbn(identifier.value()))
            .find(|cleaned| matches!(cleaned.chars().count(), 10 | 13))
            .unwrap_or_else(|| self.unknown.clone())
    }
}

/// 去掉连字符和空格并转为大写
fn clean_isbn(value: &str) -> String {
    ISBN_NOISE_RE.replace_all(value, "").to_uppercase()
}

/// 把文件重命名为 `file_name`，目标与源文件位于同一目录
///
/// 文件已经是目标名称时不做任何操作。目标已存在、文件名包含路径分隔符
/// 或文件系统拒绝时返回错误，源文件保持不变。
pub fn rename_file<P: AsRef<Path>>(source: P, file_name: &str) -> Result<PathBuf> {
    let source = source.as_ref();
    if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name == "." || file_name == ".." {
        return Err(EpubError::InvalidTargetName(file_name.to_string()));
    }

    let target = match source.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    };
    if target == source {
        debug!("{} 已是目标文件名", source.display());
        return Ok(target);
    }
    if target.exists() {
        return Err(EpubError::RenameTargetExists(target));
    }

    match move_no_clobber(source, &target) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(EpubError::RenameTargetExists(target));
        }
        Err(e) => {
            return Err(EpubError::Rename {
                from: source.to_path_buf(),
                to: target,
                source: e,
            });
        }
    }
    info!("已重命名 {} -> {}", source.display(), target.display());

    Ok(target)
}

/// 不覆盖已有文件的移动
///
/// 先建立硬链接再删除源文件，目标已存在时以 `AlreadyExists` 失败。
/// 文件系统不支持硬链接时退回 `fs::rename`，此时不能排除检查之后才出现的目标文件。
fn move_no_clobber(source: &Path, target: &Path) -> io::Result<()> {
    match fs::hard_link(source, target) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(e),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(e),
        Err(e) => {
            debug!("无法建立硬链接 ({})，改用rename", e);
            return fs::rename(source, target);
        }
    }

    if let Err(e) = fs::remove_file(source) {
        let _ = fs::remove_file(target);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::opf::{MetaValue, MetadataField};

    fn value(text: &str, attrs: &[(&str, &str)]) -> MetaValue {
        MetaValue::new(text, attrs.iter().copied())
    }

    fn sample_metadata() -> MetadataDict {
        MetadataDict::new()
            .with_value(MetadataField::Title, MetaValue::text("Effective Java: Third Edition"))
            .with_value(MetadataField::Creator, value("Joshua Bloch", &[("role", "aut"), ("file-as", "Bloch, Joshua")]))
            .with_value(MetadataField::Identifier, value("978-0-13-468599-1", &[("scheme", "ISBN")]))
            .with_value(MetadataField::Date, value("2018-01-06", &[("event", "publication")]))
    }

    #[test]
    fn test_compose_full_name() {
        let composer = FilenameComposer::default();
        assert_eq!(
            composer.compose(&sample_metadata()),
            "Bloch (2018) Effective Java (isbn9780134685991).epub"
        );
    }

    #[test]
    fn test_compose_is_deterministic() {
        let composer = FilenameComposer::default();
        let md = sample_metadata();
        assert_eq!(composer.compose(&md), composer.compose(&md));
    }

    #[test]
    fn test_compose_empty_metadata() {
        let composer = FilenameComposer::default();
        assert_eq!(
            composer.compose(&MetadataDict::new()),
            "UNKNOWN (UNKNOWN) UNKNOWN (isbnUNKNOWN).epub"
        );
        assert_eq!(
            FilenameComposer::new("NA").compose(&MetadataDict::new()),
            "NA (NA) NA (isbnNA).epub"
        );
    }

    #[test]
    fn test_surname_prefers_author_file_as() {
        let md = MetadataDict::new()
            .with_value(MetadataField::Creator, value("Jane Doe", &[("role", "aut"), ("file-as", "Doe, Jane")]))
            .with_value(MetadataField::Creator, value("Ed Itor", &[("role", "edt")]));
        assert_eq!(FilenameComposer::default().surname(&md), "Doe");
    }

    #[test]
    fn test_surname_falls_back_to_creators_and_last_token() {
        let md = MetadataDict::new()
            .with_value(MetadataField::Creator, value("Ed Van Itor", &[("role", "edt")]))
            .with_value(MetadataField::Creator, value("Someone Else", &[]));
        assert_eq!(FilenameComposer::default().surname(&md), "Itor");
    }

    #[test]
    fn test_surname_empty_file_as_component() {
        let md = MetadataDict::new().with_value(MetadataField::Creator, value("Plato", &[("file-as", ", Plato")]));
        assert_eq!(FilenameComposer::default().surname(&md), "Plato");

        let md = MetadataDict::new().with_value(MetadataField::Creator, value("", &[]));
        assert_eq!(FilenameComposer::default().surname(&md), UNKNOWN);
    }

    #[test]
    fn test_year_picks_earliest_publication_date() {
        let md = MetadataDict::new()
            .with_value(MetadataField::Date, value("2005-03-01", &[("event", "publication")]))
            .with_value(MetadataField::Date, value("1999-07-15", &[("event", "publication")]))
            .with_value(MetadataField::Date, value("1980", &[("event", "creation")]));
        assert_eq!(FilenameComposer::default().year(&md), "1999");
    }

    #[test]
    fn test_year_falls_back_to_any_date() {
        let md = MetadataDict::new()
            .with_value(MetadataField::Date, value("2012-05", &[("event", "modification")]))
            .with_value(MetadataField::Date, value("2010-01-01", &[]));
        assert_eq!(FilenameComposer::default().year(&md), "2010");
    }

    #[test]
    fn test_year_without_leading_digits() {
        let md = MetadataDict::new().with_value(MetadataField::Date, MetaValue::text("circa 1900"));
        assert_eq!(FilenameComposer::default().year(&md), UNKNOWN);
    }

    #[test]
    fn test_short_title() {
        let composer = FilenameComposer::default();
        let md = MetadataDict::new().with_value(MetadataField::Title, MetaValue::text("Dune"));
        assert_eq!(composer.short_title(&md), "Dune");

        let md = MetadataDict::new().with_value(MetadataField::Title, MetaValue::text("Title : Sub: More"));
        assert_eq!(composer.short_title(&md), "Title");
    }

    #[test]
    fn test_isbn_scheme_preferred() {
        let md = MetadataDict::new()
            .with_value(MetadataField::Identifier, value("0-13-468599-x", &[]))
            .with_value(MetadataField::Identifier, value("978-0-13-468599-1", &[("scheme", "ISBN")]));
        assert_eq!(FilenameComposer::default().isbn(&md), "9780134685991");
    }

    #[test]
    fn test_isbn_length_heuristic() {
        let md = MetadataDict::new()
            .with_value(MetadataField::Identifier, value("urn:uuid:0a1b2c3d", &[("scheme", "UUID")]))
            .with_value(MetadataField::Identifier, value("0 13 468599 x", &[]))
            .with_value(MetadataField::Identifier, value("9780134685991", &[]));
        assert_eq!(FilenameComposer::default().isbn(&md), "013468599X");
    }

    #[test]
    fn test_isbn_none_qualifies() {
        let md = MetadataDict::new().with_value(MetadataField::Identifier, value("urn:uuid:1234", &[]));
        assert_eq!(FilenameComposer::default().isbn(&md), UNKNOWN);
    }

    #[test]
    fn test_rename_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.epub");
        fs::write(&source, b"epub").unwrap();

        let target = rename_file(&source, "Doe (1999) Book (isbnUNKNOWN).epub").unwrap();
        assert_eq!(target, dir.path().join("Doe (1999) Book (isbnUNKNOWN).epub"));
        assert!(target.exists());
        assert!(!source.exists());
    }

    #[test]
    fn test_rename_refuses_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.epub");
        let existing = dir.path().join("taken.epub");
        fs::write(&source, b"source").unwrap();
        fs::write(&existing, b"existing").unwrap();

        let result = rename_file(&source, "taken.epub");
        assert!(matches!(result, Err(EpubError::RenameTargetExists(_))));
        assert_eq!(fs::read(&source).unwrap(), b"source");
        assert_eq!(fs::read(&existing).unwrap(), b"existing");
    }

    #[test]
    fn test_rename_refuses_path_separators() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.epub");
        fs::write(&source, b"source").unwrap();

        let result = rename_file(&source, "AC/DC (1999) Book (isbnUNKNOWN).epub");
        assert!(matches!(result, Err(EpubError::InvalidTargetName(_))));
        assert!(source.exists());
    }

    #[test]
    fn test_rename_to_current_name_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Doe (1999) Book (isbnUNKNOWN).epub");
        fs::write(&source, b"source").unwrap();

        let target = rename_file(&source, "Doe (1999) Book (isbnUNKNOWN).epub").unwrap();
        assert_eq!(target, source);
        assert_eq!(fs::read(&source).unwrap(), b"source");
    }

    #[test]
    fn test_move_never_overwrites_target() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.epub");
        let target = dir.path().join("taken.epub");
        fs::write(&source, b"source").unwrap();
        fs::write(&target, b"existing").unwrap();

        // 跳过rename_file中的存在性检查，直接验证移动本身不会覆盖目标
        let err = move_no_clobber(&source, &target).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&source).unwrap(), b"source");
        assert_eq!(fs::read(&target).unwrap(), b"existing");
    }

    #[test]
    fn test_move_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.epub");
        let target = dir.path().join("moved.epub");
        fs::write(&source, b"source").unwrap();

        move_no_clobber(&source, &target).unwrap();
        assert!(!source.exists());
        assert_eq!(fs::read(&target).unwrap(), b"source");
    }

    #[test]
    fn test_rename_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = rename_file(dir.path().join("missing.epub"), "new.epub");
        assert!(matches!(result, Err(EpubError::Rename { .. })));
    }
}

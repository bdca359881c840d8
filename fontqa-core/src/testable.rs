//! The things checks look at.

use std::{
    fmt::{Debug, Display},
    fs,
    path::{Path, PathBuf},
};

use skrifa::{
    raw::{FontRef, ReadError, TableProvider},
    Tag,
};

use crate::error::Error;

/// A single font file, read into memory and known to be decodable.
///
/// Tables are decoded on demand through [Testable::font]; nothing here is
/// mutable once constructed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Testable {
    filename: PathBuf,
    data: Vec<u8>,
}

impl Testable {
    /// Read a font from disk.
    pub fn new(path: impl AsRef<Path>) -> Result<Testable, Error> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| Error::FileIo {
            path: path.to_path_buf(),
            source,
        })?;
        Testable::from_bytes(path, data)
    }

    /// Wrap bytes that came from somewhere other than the filesystem.
    ///
    /// The filename is still required, checks that pair fonts up use it.
    pub fn from_bytes(filename: impl Into<PathBuf>, data: Vec<u8>) -> Result<Testable, Error> {
        let filename = filename.into();
        if let Err(source) = FontRef::new(&data) {
            return Err(Error::MalformedResource {
                path: filename,
                source,
            });
        }
        Ok(Testable { filename, data })
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// The final component of the filename, lossily converted
    pub fn basename(&self) -> String {
        self.filename
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Typed access to the tables of this font
    pub fn font(&self) -> Result<FontRef<'_>, ReadError> {
        FontRef::new(&self.data)
    }

    pub fn has_table(&self, tag: Tag) -> bool {
        self.font()
            .map(|f| f.table_data(tag).is_some())
            .unwrap_or_default()
    }

    pub fn is_variable_font(&self) -> bool {
        self.font().map(|f| f.fvar().is_ok()).unwrap_or_default()
    }
}

impl Debug for Testable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Testable")
            .field("filename", &self.filename)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// The fonts of a family, for checks that compare fonts against each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestableCollection {
    pub testables: Vec<Testable>,
}

impl TestableCollection {
    pub fn new(testables: Vec<Testable>) -> Self {
        TestableCollection { testables }
    }

    /// Read every path, failing on the first one that is not a usable font
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self, Error> {
        paths
            .iter()
            .map(Testable::new)
            .collect::<Result<Vec<_>, _>>()
            .map(TestableCollection::new)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Testable> {
        self.testables.iter()
    }

    pub fn len(&self) -> usize {
        self.testables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.testables.is_empty()
    }
}

impl<'a> IntoIterator for &'a TestableCollection {
    type Item = &'a Testable;
    type IntoIter = std::slice::Iter<'a, Testable>;

    fn into_iter(self) -> Self::IntoIter {
        self.testables.iter()
    }
}

/// What a check is handed: one font, or the whole family.
#[derive(Debug, Clone, Copy)]
pub enum TestableType<'a> {
    Single(&'a Testable),
    Collection(&'a TestableCollection),
}

impl TestableType<'_> {
    pub fn arity(&self) -> Arity {
        match self {
            TestableType::Single(..) => Arity::Single,
            TestableType::Collection(..) => Arity::Collection,
        }
    }

    /// A name for reports; collections have none of their own.
    pub fn filename(&self) -> Option<&Path> {
        match self {
            TestableType::Single(t) => Some(t.filename()),
            TestableType::Collection(..) => None,
        }
    }
}

/// Whether something operates on a single font or a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Single,
    Collection,
}

impl Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Single => f.write_str("a single font"),
            Arity::Collection => f.write_str("a collection of fonts"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codetesting::TestFontBuilder;

    #[test]
    fn garbage_is_malformed() {
        let result = Testable::from_bytes("junk.ttf", b"this is not a font".to_vec());
        assert!(
            matches!(result, Err(Error::MalformedResource { .. })),
            "{result:?}"
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = Testable::new("/definitely/not/here.ttf");
        assert!(matches!(result, Err(Error::FileIo { .. })), "{result:?}");
    }

    #[test]
    fn variable_font_has_fvar() {
        let vf = TestFontBuilder::new("Family[wght].ttf")
            .axis("wght", 100.0, 400.0, 900.0)
            .build();
        let sf = TestFontBuilder::new("Family-Regular.ttf").build();
        assert!(vf.is_variable_font());
        assert!(!sf.is_variable_font());
        assert!(vf.has_table(Tag::new(b"fvar")));
        assert_eq!("Family[wght].ttf", vf.basename());
    }
}

use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    rc::Rc,
};

use tern_evaluator::{FileId, NearestLoc, SourceLoc, Span};

/// A source file that has been read into memory.
pub struct SourceFile {
    id: FileId,
    name: String,
    text: String,
}

impl SourceFile {
    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The span of the last character, or an empty span for an empty file.
    pub fn eof_span(&self) -> Span {
        match self.text.chars().count() {
            0 => Span::empty(),
            len => Span::new(len - 1, 1),
        }
    }
}

/// A shared handle to a [`SourceFile`] that compares and hashes based on
/// the address of the file rather than its contents, so two files with the
/// same text remain distinct request inputs.
#[derive(Clone)]
pub struct SourceFileRef(Rc<SourceFile>);

impl PartialEq for SourceFileRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SourceFileRef {}

impl Hash for SourceFileRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl Deref for SourceFileRef {
    type Target = SourceFile;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for SourceFileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl NearestLoc for SourceFileRef {
    fn nearest_loc(&self) -> Option<SourceLoc> {
        Some(SourceLoc::new(self.id, Span::empty()))
    }
}

/// Every file handed to the compiler, indexed by [`FileId`].
#[derive(Default)]
pub struct SourceFiles {
    files: Vec<SourceFileRef>,
}

impl SourceFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> SourceFileRef {
        let id = FileId::new(self.files.len() as u32);
        let file = SourceFileRef(Rc::new(SourceFile {
            id,
            name: name.into(),
            text: text.into(),
        }));

        self.files.push(file.clone());
        file
    }

    pub fn get(&self, id: FileId) -> Option<&SourceFileRef> {
        self.files.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceFileRef> {
        self.files.iter()
    }
}

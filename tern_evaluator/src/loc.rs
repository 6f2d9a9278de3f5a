use std::{
    cmp::{max, min},
    fmt,
    ops::Range,
    rc::Rc,
};

/// Identifies a source file known to the embedding compiler.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FileId(u32);

impl FileId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// Represents a highlighted span in a source
/// listing.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Span {
    pub start: usize,
    pub length: usize,
}

impl Span {
    pub const fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Create an empty span that highlights nothing.
    pub const fn empty() -> Self {
        Self {
            start: 0,
            length: 0,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub const fn end(&self) -> usize {
        self.start + self.length
    }

    /// Adjust this span so that it contains `other`.
    /// For instance, if we have two spans:
    /// ```text
    /// let x = a + b;
    ///         ^   ^
    ///    span_a   span_b
    /// ```
    ///
    /// ...then `span_a.grow_to_contain(&span_b)` would make `span_a` cover
    /// `a + b`. `span_b.grow_to_contain(&span_a)` would produce the same
    /// result.
    pub fn grow_to_contain(&mut self, other: &Span) {
        if other.is_empty() {
            // x + 0 = x,
            // so we don't need to do anything
        } else if self.is_empty() {
            // 0 + x = x,
            // so we must take on the value of other
            *self = *other;
        } else {
            // Span from where the earliest start to the latest end
            let start = min(self.start, other.start);
            let end = max(self.end(), other.end());
            self.start = start;
            self.length = end - start;
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end()
    }
}

/// A span within a particular file.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SourceLoc {
    pub file: FileId,
    pub span: Span,
}

impl SourceLoc {
    pub const fn new(file: FileId, span: Span) -> Self {
        Self { file, span }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..{}", self.file, self.span.start, self.span.end())
    }
}

/// Implemented by anything that may be used as a request input.
///
/// Inputs that can point somewhere in the source override
/// [`nearest_loc`](NearestLoc::nearest_loc); everything else keeps the
/// default and is skipped when a request looks for a location to attach
/// diagnostics to.
pub trait NearestLoc {
    fn nearest_loc(&self) -> Option<SourceLoc> {
        None
    }
}

macro_rules! no_source_loc {
    ($($typ:ty),* $(,)?) => {
        $(impl NearestLoc for $typ {})*
    };
}

no_source_loc!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, str, String,
);

impl NearestLoc for SourceLoc {
    fn nearest_loc(&self) -> Option<SourceLoc> {
        Some(*self)
    }
}

/// A file on its own points at its start.
impl NearestLoc for FileId {
    fn nearest_loc(&self) -> Option<SourceLoc> {
        Some(SourceLoc::new(*self, Span::empty()))
    }
}

impl<T: NearestLoc + ?Sized> NearestLoc for &T {
    fn nearest_loc(&self) -> Option<SourceLoc> {
        (**self).nearest_loc()
    }
}

impl<T: NearestLoc + ?Sized> NearestLoc for Rc<T> {
    fn nearest_loc(&self) -> Option<SourceLoc> {
        (**self).nearest_loc()
    }
}

impl<T: NearestLoc> NearestLoc for Option<T> {
    fn nearest_loc(&self) -> Option<SourceLoc> {
        self.as_ref().and_then(NearestLoc::nearest_loc)
    }
}

impl<T: NearestLoc> NearestLoc for [T] {
    fn nearest_loc(&self) -> Option<SourceLoc> {
        self.iter().find_map(NearestLoc::nearest_loc)
    }
}

impl<T: NearestLoc> NearestLoc for Vec<T> {
    fn nearest_loc(&self) -> Option<SourceLoc> {
        self.as_slice().nearest_loc()
    }
}

/// A request input that holds one of two alternatives.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Either<L, R> {
    Left(L),
    Right(R),
}

impl<L: NearestLoc, R: NearestLoc> NearestLoc for Either<L, R> {
    fn nearest_loc(&self) -> Option<SourceLoc> {
        match self {
            Either::Left(left) => left.nearest_loc(),
            Either::Right(right) => right.nearest_loc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grow_to_contain_low_high() {
        // foo + foo = foo
        // ^       ^   ^^^
        let mut span_a = Span::new(0, 1);
        let span_b = Span::new(2, 1);
        span_a.grow_to_contain(&span_b);

        assert_eq!(span_a, Span::new(0, 3));
    }

    #[test]
    fn grow_to_contain_high_low() {
        // foo + foo = foo
        //   ^   ^     ^^^
        let mut span_a = Span::new(2, 1);
        let span_b = Span::new(0, 1);
        span_a.grow_to_contain(&span_b);

        assert_eq!(span_a, Span::new(0, 3));
    }

    #[test]
    fn grow_to_contain_empty() {
        let mut span_a = Span::empty();
        let span_b = Span::new(4, 2);
        span_a.grow_to_contain(&span_b);
        assert_eq!(span_a, span_b);

        span_a.grow_to_contain(&Span::empty());
        assert_eq!(span_a, span_b);
    }

    #[test]
    fn either_reports_the_active_alternative() {
        let loc = SourceLoc::new(FileId::new(3), Span::new(10, 2));
        let left: Either<SourceLoc, u32> = Either::Left(loc);
        let right: Either<SourceLoc, u32> = Either::Right(7);

        assert_eq!(left.nearest_loc(), Some(loc));
        assert_eq!(right.nearest_loc(), None);
    }

    #[test]
    fn wrappers_forward_to_the_inner_value() {
        let loc = SourceLoc::new(FileId::new(1), Span::new(0, 1));
        assert_eq!(Some(Rc::new(loc)).nearest_loc(), Some(loc));
        assert_eq!(vec![None, Some(loc)].nearest_loc(), Some(loc));
        assert_eq!(None::<SourceLoc>.nearest_loc(), None);
    }
}

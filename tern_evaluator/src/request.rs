//! Describing requests: the [`Request`] trait the evaluator works with, and
//! the [`SimpleRequest`] base most request types are built from.

use bitflags::bitflags;
use std::{
    fmt,
    hash::{Hash, Hasher},
};

use crate::{
    dependencies::DependencyCollector,
    diagnostics::Diagnostics,
    loc::{FileId, NearestLoc, SourceLoc},
    type_id::RequestTypeId,
};

bitflags! {
    /// The caching policy of a request type, plus its role in dependency
    /// tracking.
    ///
    /// Exactly one of `UNCACHED`, `CACHED` and `SEPARATELY_CACHED` should
    /// be set.
    pub struct RequestFlags: u8 {
        /// Always recompute.
        const UNCACHED = 1 << 0;
        /// Memoized in the evaluator's own cache.
        const CACHED = 1 << 1;
        /// Memoized in a store owned by the request type.
        const SEPARATELY_CACHED = 1 << 2;
        /// Opens a new unit of dependency attribution (usually a file).
        const DEPENDENCY_SOURCE = 1 << 3;
        /// Records a reference for every result it produces.
        const DEPENDENCY_SINK = 1 << 4;
    }
}

impl RequestFlags {
    pub const fn is_ever_cached(self) -> bool {
        self.intersects(Self::CACHED.union(Self::SEPARATELY_CACHED))
    }

    pub const fn has_external_cache(self) -> bool {
        self.contains(Self::SEPARATELY_CACHED)
    }

    pub const fn is_dependency_source(self) -> bool {
        self.contains(Self::DEPENDENCY_SOURCE)
    }

    pub const fn is_dependency_sink(self) -> bool {
        self.contains(Self::DEPENDENCY_SINK)
    }
}

/// A unit of demand-driven computation.
///
/// Two requests that compare equal are the same computation: they share a
/// cache entry and are treated as the same frame when looking for cycles.
/// The computation itself is not part of the request; it is installed in
/// the evaluator with [`RequestFunctions`](crate::RequestFunctions).
pub trait Request: Clone + Eq + Hash + fmt::Display + 'static {
    type Output: Clone + 'static;

    const ID: RequestTypeId;
    const NAME: &'static str;
    const FLAGS: RequestFlags;

    const IS_EVER_CACHED: bool = Self::FLAGS.is_ever_cached();
    const HAS_EXTERNAL_CACHE: bool = Self::FLAGS.has_external_cache();
    const IS_DEPENDENCY_SOURCE: bool = Self::FLAGS.is_dependency_source();
    const IS_DEPENDENCY_SINK: bool = Self::FLAGS.is_dependency_sink();

    /// Whether this particular instance should be cached. Only consulted
    /// for request types that are cached at all.
    fn is_cached(&self) -> bool {
        Self::IS_EVER_CACHED
    }

    fn nearest_loc(&self) -> Option<SourceLoc> {
        None
    }

    /// Reports that this request depends on itself.
    fn diagnose_cycle(&self, diags: &mut Diagnostics) {
        diags.error(self.nearest_loc(), "circular reference");
    }

    /// Reports that this request is one of the steps of a cycle.
    fn note_cycle_step(&self, diags: &mut Diagnostics) {
        diags.note(
            self.nearest_loc(),
            format!("circular reference through `{}`", self),
        );
    }

    /// Looks the result up in the external cache of a separately cached
    /// request.
    fn cached_result(&self) -> Option<Self::Output> {
        None
    }

    /// Stores a result in the external cache of a separately cached
    /// request.
    fn cache_result(&self, _output: Self::Output) {}

    /// The file whose references a dependency source collects.
    fn read_dependency_source(&self) -> Option<FileId> {
        None
    }

    /// Records the references implied by `output` for a dependency sink.
    fn write_dependency_sink(
        &self,
        _collector: &mut DependencyCollector<'_>,
        _output: &Self::Output,
    ) {
    }
}

/// The input tuple of a [`SimpleRequest`].
pub trait RequestInputs: Clone + Eq + Hash + 'static {
    /// The location of the first input, from left to right, that has one.
    fn nearest_loc(&self) -> Option<SourceLoc>;

    /// Writes the inputs as a comma separated list.
    fn fmt_inputs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

macro_rules! tuple_inputs {
    ($($typ:ident $var:ident),*) => {
        impl<$($typ),*> RequestInputs for ($($typ,)*)
        where
            $($typ: NearestLoc + fmt::Debug + Clone + Eq + Hash + 'static),*
        {
            fn nearest_loc(&self) -> Option<SourceLoc> {
                let ($($var,)*) = self;
                let inputs: &[&dyn NearestLoc] = &[$($var),*];
                inputs.iter().find_map(|input| input.nearest_loc())
            }

            fn fmt_inputs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let ($($var,)*) = self;
                let inputs: &[&dyn fmt::Debug] = &[$($var),*];

                for (index, input) in inputs.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}", input)?;
                }

                Ok(())
            }
        }
    };
}

tuple_inputs!();
tuple_inputs!(A a);
tuple_inputs!(A a, B b);
tuple_inputs!(A a, B b, C c);
tuple_inputs!(A a, B b, C c, D d);
tuple_inputs!(A a, B b, C c, D d, E e);

/// Describes a request type built on [`SimpleRequest`].
///
/// Implement this on an uninhabited marker type and name the request with
/// an alias:
///
/// ```
/// use tern_evaluator::{RequestFlags, RequestKind, RequestTypeId, SimpleRequest, Zone};
///
/// pub enum SumKind {}
///
/// impl RequestKind for SumKind {
///     type Inputs = (i64, i64);
///     type Output = i64;
///
///     const ID: RequestTypeId = RequestTypeId::new(Zone::Testing, 0);
///     const NAME: &'static str = "Sum";
///     const FLAGS: RequestFlags = RequestFlags::CACHED;
/// }
///
/// pub type Sum = SimpleRequest<SumKind>;
///
/// assert_eq!(Sum::new((2, 3)).to_string(), "Sum(2, 3)");
/// ```
pub trait RequestKind: Sized + 'static {
    type Inputs: RequestInputs;
    type Output: Clone + 'static;

    const ID: RequestTypeId;
    const NAME: &'static str;
    const FLAGS: RequestFlags;

    fn is_cached(_request: &SimpleRequest<Self>) -> bool {
        true
    }

    fn nearest_loc(request: &SimpleRequest<Self>) -> Option<SourceLoc> {
        request.inputs().nearest_loc()
    }

    fn cycle_message(_request: &SimpleRequest<Self>) -> String {
        "circular reference".to_owned()
    }

    fn cycle_step_message(request: &SimpleRequest<Self>) -> String {
        format!("circular reference through `{}`", request)
    }

    fn cached_result(_request: &SimpleRequest<Self>) -> Option<Self::Output> {
        None
    }

    fn cache_result(_request: &SimpleRequest<Self>, _output: Self::Output) {}

    fn read_dependency_source(_request: &SimpleRequest<Self>) -> Option<FileId> {
        None
    }

    fn write_dependency_sink(
        _request: &SimpleRequest<Self>,
        _collector: &mut DependencyCollector<'_>,
        _output: &Self::Output,
    ) {
    }
}

/// A request that is nothing more than its input tuple.
///
/// Equality and hashing are structural over the inputs.
pub struct SimpleRequest<K: RequestKind> {
    storage: K::Inputs,
}

impl<K: RequestKind> SimpleRequest<K> {
    pub fn new(inputs: K::Inputs) -> Self {
        Self { storage: inputs }
    }

    pub fn inputs(&self) -> &K::Inputs {
        &self.storage
    }

    pub fn into_inputs(self) -> K::Inputs {
        self.storage
    }
}

impl<K: RequestKind> Clone for SimpleRequest<K> {
    fn clone(&self) -> Self {
        Self::new(self.storage.clone())
    }
}

impl<K: RequestKind> PartialEq for SimpleRequest<K> {
    fn eq(&self, other: &Self) -> bool {
        self.storage == other.storage
    }
}

impl<K: RequestKind> Eq for SimpleRequest<K> {}

impl<K: RequestKind> Hash for SimpleRequest<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.storage.hash(state);
    }
}

impl<K: RequestKind> fmt::Display for SimpleRequest<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", K::NAME)?;
        self.storage.fmt_inputs(f)?;
        write!(f, ")")
    }
}

impl<K: RequestKind> fmt::Debug for SimpleRequest<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<K: RequestKind> Request for SimpleRequest<K> {
    type Output = K::Output;

    const ID: RequestTypeId = K::ID;
    const NAME: &'static str = K::NAME;
    const FLAGS: RequestFlags = K::FLAGS;

    fn is_cached(&self) -> bool {
        Self::IS_EVER_CACHED && K::is_cached(self)
    }

    fn nearest_loc(&self) -> Option<SourceLoc> {
        K::nearest_loc(self)
    }

    fn diagnose_cycle(&self, diags: &mut Diagnostics) {
        diags.error(self.nearest_loc(), K::cycle_message(self));
    }

    fn note_cycle_step(&self, diags: &mut Diagnostics) {
        diags.note(self.nearest_loc(), K::cycle_step_message(self));
    }

    fn cached_result(&self) -> Option<Self::Output> {
        K::cached_result(self)
    }

    fn cache_result(&self, output: Self::Output) {
        K::cache_result(self, output)
    }

    fn read_dependency_source(&self) -> Option<FileId> {
        K::read_dependency_source(self)
    }

    fn write_dependency_sink(
        &self,
        collector: &mut DependencyCollector<'_>,
        output: &Self::Output,
    ) {
        K::write_dependency_sink(self, collector, output)
    }
}

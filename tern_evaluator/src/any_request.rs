//! Type-erased request handles.
//!
//! [`ActiveRequest`] borrows a request for as long as it is being
//! evaluated, which is all cycle detection needs. [`AnyRequest`] owns a
//! shared copy and can be kept around: in a cycle error, or as a node of
//! the dependency graph. Both are a pointer and a hash wide, no matter how
//! large the request's inputs are.

use fxhash::FxHasher64;
use std::{
    any::Any,
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

use crate::{diagnostics::Diagnostics, request::Request, type_id::RequestTypeId};

/// The operations every request supports once its type is forgotten.
pub(crate) trait ErasedRequest {
    fn request_type_id(&self) -> RequestTypeId;
    fn request_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn hash_value(&self) -> u64;
    fn equals(&self, other: &dyn ErasedRequest) -> bool;
    fn fmt_request(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn diagnose_cycle(&self, diags: &mut Diagnostics);
    fn note_cycle_step(&self, diags: &mut Diagnostics);
    fn to_any_request(&self) -> AnyRequest;
}

impl<R: Request> ErasedRequest for R {
    fn request_type_id(&self) -> RequestTypeId {
        R::ID
    }

    fn request_name(&self) -> &'static str {
        R::NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn hash_value(&self) -> u64 {
        let mut hasher = FxHasher64::default();
        R::ID.hash(&mut hasher);
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn equals(&self, other: &dyn ErasedRequest) -> bool {
        if other.request_type_id() != R::ID {
            return false;
        }

        other
            .as_any()
            .downcast_ref::<R>()
            .map_or(false, |other| self == other)
    }

    fn fmt_request(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }

    fn diagnose_cycle(&self, diags: &mut Diagnostics) {
        Request::diagnose_cycle(self, diags);
    }

    fn note_cycle_step(&self, diags: &mut Diagnostics) {
        Request::note_cycle_step(self, diags);
    }

    fn to_any_request(&self) -> AnyRequest {
        AnyRequest::new(self.clone())
    }
}

fn downcast<R: Request>(request: &dyn ErasedRequest) -> Option<&R> {
    if request.request_type_id() == R::ID {
        request.as_any().downcast_ref()
    } else {
        None
    }
}

const EMPTY_MARKER: u64 = 0;
const TOMBSTONE_MARKER: u64 = 1;

/// An owned request of any type.
///
/// Besides real requests, an `AnyRequest` can be one of two markers,
/// [`empty`](AnyRequest::empty) and [`tombstone`](AnyRequest::tombstone),
/// which hold no request and only compare equal to themselves.
#[derive(Clone)]
pub struct AnyRequest {
    /// The request's hash, or which marker this is when `request` is `None`.
    hash: u64,
    request: Option<Rc<dyn ErasedRequest>>,
}

impl AnyRequest {
    pub fn new<R: Request>(request: R) -> Self {
        Self {
            hash: ErasedRequest::hash_value(&request),
            request: Some(Rc::new(request)),
        }
    }

    pub const fn empty() -> Self {
        Self {
            hash: EMPTY_MARKER,
            request: None,
        }
    }

    pub const fn tombstone() -> Self {
        Self {
            hash: TOMBSTONE_MARKER,
            request: None,
        }
    }

    /// Returns whether this is one of the markers rather than a request.
    pub fn is_marker(&self) -> bool {
        self.request.is_none()
    }

    fn erased(&self) -> Option<&dyn ErasedRequest> {
        self.request.as_deref()
    }

    pub fn type_id(&self) -> Option<RequestTypeId> {
        self.erased().map(|request| request.request_type_id())
    }

    pub fn name(&self) -> Option<&'static str> {
        self.erased().map(|request| request.request_name())
    }

    /// The request, if it is an `R`.
    pub fn downcast<R: Request>(&self) -> Option<&R> {
        downcast(self.erased()?)
    }

    /// Reports that this request depends on itself. Markers report nothing.
    pub fn diagnose_cycle(&self, diags: &mut Diagnostics) {
        if let Some(request) = self.erased() {
            request.diagnose_cycle(diags);
        }
    }

    /// Reports that this request is a step of a cycle. Markers report
    /// nothing.
    pub fn note_cycle_step(&self, diags: &mut Diagnostics) {
        if let Some(request) = self.erased() {
            request.note_cycle_step(diags);
        }
    }
}

impl PartialEq for AnyRequest {
    fn eq(&self, other: &Self) -> bool {
        if self.hash != other.hash {
            return false;
        }

        match (self.erased(), other.erased()) {
            (Some(lhs), Some(rhs)) => lhs.equals(rhs),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Eq for AnyRequest {}

impl Hash for AnyRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_marker().hash(state);
        state.write_u64(self.hash);
    }
}

impl fmt::Display for AnyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.erased() {
            Some(request) => request.fmt_request(f),
            None if self.hash == EMPTY_MARKER => f.write_str("<empty>"),
            None => f.write_str("<tombstone>"),
        }
    }
}

impl fmt::Debug for AnyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_id() {
            Some(id) => write!(f, "AnyRequest({:?}, {})", id, self),
            None => write!(f, "AnyRequest({})", self),
        }
    }
}

/// A request that is currently being evaluated, borrowed from the frame
/// that evaluates it.
#[derive(Clone, Copy)]
pub struct ActiveRequest<'a> {
    request: &'a dyn ErasedRequest,
    hash: u64,
}

impl<'a> ActiveRequest<'a> {
    pub fn new<R: Request>(request: &'a R) -> Self {
        Self {
            request,
            hash: ErasedRequest::hash_value(request),
        }
    }

    pub fn type_id(&self) -> RequestTypeId {
        self.request.request_type_id()
    }

    pub fn name(&self) -> &'static str {
        self.request.request_name()
    }

    pub fn downcast<R: Request>(&self) -> Option<&'a R> {
        downcast(self.request)
    }

    pub fn diagnose_cycle(&self, diags: &mut Diagnostics) {
        self.request.diagnose_cycle(diags);
    }

    pub fn note_cycle_step(&self, diags: &mut Diagnostics) {
        self.request.note_cycle_step(diags);
    }

    /// Copies the request into an owned handle.
    pub fn to_any_request(&self) -> AnyRequest {
        self.request.to_any_request()
    }
}

impl PartialEq for ActiveRequest<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.request.equals(other.request)
    }
}

impl Eq for ActiveRequest<'_> {}

impl Hash for ActiveRequest<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Display for ActiveRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.request.fmt_request(f)
    }
}

impl fmt::Debug for ActiveRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActiveRequest({:?}, {})", self.type_id(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_requests::{Product, Sum};
    use fxhash::hash64;
    use std::mem::size_of;

    #[test]
    fn handles_stay_small() {
        assert!(size_of::<ActiveRequest<'_>>() <= 2 * size_of::<usize>() + size_of::<u64>());
        assert!(size_of::<AnyRequest>() <= 2 * size_of::<usize>() + size_of::<u64>());
    }

    #[test]
    fn equal_requests_make_equal_handles() {
        let lhs = Sum::new((2, 3));
        let rhs = Sum::new((2, 3));
        assert_eq!(ActiveRequest::new(&lhs), ActiveRequest::new(&rhs));
        assert_eq!(AnyRequest::new(lhs.clone()), AnyRequest::new(rhs));
        assert_eq!(
            hash64(&ActiveRequest::new(&lhs)),
            hash64(&ActiveRequest::new(&lhs.clone()))
        );
    }

    #[test]
    fn different_types_with_equal_inputs_differ() {
        let sum = Sum::new((2, 3));
        let product = Product::new((2, 3));
        assert_ne!(ActiveRequest::new(&sum), ActiveRequest::new(&product));
        assert_ne!(AnyRequest::new(sum), AnyRequest::new(product));
    }

    #[test]
    fn markers_only_equal_themselves() {
        let request = AnyRequest::new(Sum::new((0, 0)));
        assert_eq!(AnyRequest::empty(), AnyRequest::empty());
        assert_eq!(AnyRequest::tombstone(), AnyRequest::tombstone());
        assert_ne!(AnyRequest::empty(), AnyRequest::tombstone());
        assert_ne!(AnyRequest::empty(), request);
        assert_ne!(request, AnyRequest::tombstone());
        assert!(AnyRequest::empty().is_marker());
        assert!(!request.is_marker());
        assert_eq!(AnyRequest::empty().type_id(), None);
    }

    #[test]
    fn downcast_checks_the_type() {
        let sum = Sum::new((1, 2));
        let active = ActiveRequest::new(&sum);
        assert_eq!(active.downcast::<Sum>(), Some(&sum));
        assert_eq!(active.downcast::<Product>(), None);

        let owned = active.to_any_request();
        assert_eq!(owned.downcast::<Sum>(), Some(&sum));
        assert_eq!(owned.downcast::<Product>(), None);
        assert_eq!(AnyRequest::tombstone().downcast::<Sum>(), None);
    }

    #[test]
    fn displays_like_the_request() {
        let sum = Sum::new((1, 2));
        assert_eq!(ActiveRequest::new(&sum).to_string(), "Sum(1, 2)");
        assert_eq!(AnyRequest::new(sum).to_string(), "Sum(1, 2)");
        assert_eq!(AnyRequest::empty().to_string(), "<empty>");
    }

    #[test]
    fn cycle_diagnostics_are_forwarded() {
        let sum = Sum::new((1, 2));
        let mut diags = Diagnostics::new();
        ActiveRequest::new(&sum).diagnose_cycle(&mut diags);
        AnyRequest::new(sum).note_cycle_step(&mut diags);
        AnyRequest::empty().note_cycle_step(&mut diags);

        let messages: Vec<_> = diags.iter().map(|diag| diag.message.as_str()).collect();
        assert_eq!(
            messages,
            ["circular reference", "circular reference through `Sum(1, 2)`"]
        );
    }
}

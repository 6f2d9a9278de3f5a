//! A demand-driven request evaluator.
//!
//! Every phase of the compiler is phrased as [`Request`]s: values that
//! describe a computation and its inputs. The [`Evaluator`] computes a
//! request when it is first asked for, memoizes the result according to the
//! request's caching policy, turns a request that transitively asks for
//! itself into a diagnosed [`CyclicalRequestError`] instead of infinite
//! recursion, and records which names each computation looked at so an
//! incremental build can later decide what to recompute.

#![warn(unused_imports)]
#![warn(unused_must_use)]

mod any_request;
mod cache;
mod dependencies;
mod diagnostics;
mod error;
mod evaluator;
mod graph;
mod loc;
mod registry;
mod request;
mod stats;
mod type_id;

#[cfg(test)]
mod test_requests;

pub use any_request::{ActiveRequest, AnyRequest};
pub use cache::RequestCache;
pub use dependencies::{DependencyCollector, DependencyRecorder, EntityId, Name, Reference};
pub use diagnostics::{Diagnostic, Diagnostics, Level};
pub use error::CyclicalRequestError;
pub use evaluator::{EvalContext, Evaluator, EvaluatorOptions, RequestBatch};
pub use loc::{Either, FileId, NearestLoc, SourceLoc, Span};
pub use registry::{RequestFunction, RequestFunctions};
pub use request::{Request, RequestFlags, RequestInputs, RequestKind, SimpleRequest};
pub use stats::RequestTypeStatistics;
pub use type_id::{RequestTypeId, Zone};

//! The evaluator: runs requests on demand, memoizes their results, and
//! detects requests that end up depending on themselves.
//!
//! Evaluation is an ordinary recursive call. A request's computation
//! receives an [`EvalContext`] and asks it for whatever sub-requests it
//! needs; each nested call pushes a frame that lives on the
//! Rust call stack and links back to its caller. Those frames are the
//! active-request stack, so a frame can only be popped by returning from
//! the call that pushed it.

use std::{iter, time::Instant};
use tern_log::*;

use crate::{
    any_request::{ActiveRequest, AnyRequest},
    cache::RequestCache,
    dependencies::{DependencyCollector, DependencyRecorder, Reference},
    diagnostics::{Diagnostic, Diagnostics},
    error::CyclicalRequestError,
    graph::DependencyGraph,
    loc::FileId,
    registry::{RequestFunctions, RequestRegistry},
    request::Request,
    stats::{RequestStatistics, RequestTypeStatistics},
};

/// Debugging aids, all off by default.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EvaluatorOptions {
    /// Log the whole active-request stack whenever a cycle is found.
    pub debug_dump_cycles: bool,
    /// Remember which request evaluated which, for
    /// [`Evaluator::dump_dependencies`] and
    /// [`Evaluator::dependencies_graphviz`].
    pub build_dependency_graph: bool,
    /// Count and time every fresh computation, for
    /// [`Evaluator::statistics`].
    pub collect_statistics: bool,
}

/// Owns everything that outlives a single evaluation: computations,
/// caches, recorded references and diagnostics.
///
/// An evaluator is single-threaded; parallel compilation uses one per
/// thread.
pub struct Evaluator {
    options: EvaluatorOptions,
    registry: RequestRegistry,
    cache: RequestCache,
    recorder: DependencyRecorder,
    diagnostics: Diagnostics,
    statistics: RequestStatistics,
    graph: DependencyGraph,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_options(EvaluatorOptions::default())
    }

    pub fn with_options(options: EvaluatorOptions) -> Self {
        Self {
            options,
            registry: RequestRegistry::new(),
            cache: RequestCache::new(),
            recorder: DependencyRecorder::new(),
            diagnostics: Diagnostics::new(),
            statistics: RequestStatistics::default(),
            graph: DependencyGraph::default(),
        }
    }

    pub fn options(&self) -> EvaluatorOptions {
        self.options
    }

    /// Installs the computations of one zone. Every zone is registered
    /// once, before any of its requests are evaluated.
    ///
    /// # Panics
    ///
    /// If the zone was already registered.
    pub fn register_request_functions(&mut self, functions: RequestFunctions) {
        self.registry.install(functions);
    }

    fn context(&mut self) -> EvalContext<'_> {
        EvalContext {
            evaluator: self,
            active: None,
        }
    }

    /// Evaluates `request`, or returns its cached result.
    ///
    /// # Panics
    ///
    /// If no computation is registered for `R`.
    pub fn evaluate<R: Request>(&mut self, request: &R) -> Result<R::Output, CyclicalRequestError> {
        self.context().evaluate(request)
    }

    /// Evaluates `request`, substituting `default` if it turns out to be
    /// cyclical.
    pub fn evaluate_or_default<R: Request>(
        &mut self,
        request: &R,
        default: R::Output,
    ) -> R::Output {
        self.context().evaluate_or_default(request, default)
    }

    /// Evaluates a tuple of request references in order, returning a tuple
    /// of their results.
    pub fn evaluate_all<B: RequestBatch>(&mut self, batch: B) -> B::Outputs {
        self.context().evaluate_all(batch)
    }

    /// Caches `output` as the result of `request` without computing it.
    ///
    /// Requests with an external cache are handed `output` through
    /// [`Request::cache_result`].
    ///
    /// # Panics
    ///
    /// If `R` is never cached, or `request` already has a result in the
    /// evaluator's cache.
    pub fn cache_output<R: Request>(&mut self, request: R, output: R::Output) {
        assert!(
            R::IS_EVER_CACHED,
            "cannot cache the output of uncached request `{}`",
            request
        );
        assert!(
            request.is_cached(),
            "cannot cache the output of request `{}`, which opted out of caching",
            request
        );

        trace!("caching output of {} by hand", request);

        if R::HAS_EXTERNAL_CACHE {
            request.cache_result(output);
        } else {
            self.cache.insert(request, output);
        }
    }

    /// Drops the cached result of `request` and the references it recorded,
    /// so that the next evaluation computes it again. Returns whether there
    /// was a result to drop.
    ///
    /// Requests with an external cache are left alone: their result is
    /// still served from that cache, so their references must stay
    /// available for replaying.
    pub fn clear_cached_output<R: Request>(&mut self, request: &R) -> bool {
        if R::HAS_EXTERNAL_CACHE {
            return false;
        }

        self.recorder.clear_request(request);
        self.cache.erase(request)
    }

    pub fn has_cached_result<R: Request>(&self, request: &R) -> bool {
        if !R::IS_EVER_CACHED || !request.is_cached() {
            false
        } else if R::HAS_EXTERNAL_CACHE {
            request.cached_result().is_some()
        } else {
            self.cache.contains(request)
        }
    }

    /// Drops every result in the evaluator's own cache, along with the
    /// references recorded for replaying them. External caches and the
    /// references already filed under source files are kept.
    pub fn clear_cache(&mut self) {
        debug!("clearing {} cached result(s)", self.cache.len());
        self.cache.clear();
        self.recorder.clear_requests();
    }

    /// Calls `f` with every reference recorded by the dependency sources of
    /// `source`, in no particular order.
    pub fn enumerate_references_in_file(&self, source: FileId, f: impl FnMut(&Reference)) {
        self.recorder.enumerate_references_in_file(source, f);
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Removes and returns every diagnostic reported so far.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    /// Per request type computation counts and times, ordered by request
    /// type. Empty unless [`EvaluatorOptions::collect_statistics`] is set.
    pub fn statistics(&self) -> Vec<RequestTypeStatistics> {
        self.statistics.snapshot()
    }

    /// Renders the requests `root` evaluated, transitively, as a tree.
    /// Only `root` itself is shown unless
    /// [`EvaluatorOptions::build_dependency_graph`] is set.
    pub fn dump_dependencies<R: Request>(&self, root: &R) -> String {
        self.graph.dump(&AnyRequest::new(root.clone()))
    }

    /// Renders every recorded evaluation edge as a Graphviz digraph.
    pub fn dependencies_graphviz(&self) -> String {
        debug!("rendering {} request(s) as graphviz", self.graph.len());
        self.graph.graphviz()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// One link of the active-request stack.
struct ActiveFrame<'a> {
    request: ActiveRequest<'a>,
    parent: Option<&'a ActiveFrame<'a>>,
}

/// The active frames from innermost to outermost.
fn frames<'a>(top: Option<&'a ActiveFrame<'a>>) -> impl Iterator<Item = &'a ActiveFrame<'a>> {
    iter::successors(top, |frame| frame.parent)
}

/// The evaluator as seen from inside a computation.
pub struct EvalContext<'a> {
    evaluator: &'a mut Evaluator,
    active: Option<&'a ActiveFrame<'a>>,
}

impl<'a> EvalContext<'a> {
    /// Evaluates `request`, or returns its cached result.
    ///
    /// If `request` is already being evaluated further up, the cycle is
    /// diagnosed and an error is returned instead. Nothing is cached for the
    /// cyclical evaluation.
    pub fn evaluate<R: Request>(&mut self, request: &R) -> Result<R::Output, CyclicalRequestError> {
        let active = ActiveRequest::new(request);

        if self.evaluator.options.build_dependency_graph {
            self.record_edge(active);
        }

        if self.has_active_request(active) {
            return Err(self.diagnose_cycle(active));
        }

        let frame = ActiveFrame {
            request: active,
            parent: self.active,
        };

        let output = EvalContext {
            evaluator: &mut *self.evaluator,
            active: Some(&frame),
        }
        .evaluate_active(request);

        if R::IS_DEPENDENCY_SOURCE {
            if let Some(source) = request.read_dependency_source() {
                trace!("filing references of {} under {}", request, source);
                self.evaluator
                    .recorder
                    .handle_dependency_source_request(request, source);
            }
        }

        Ok(output)
    }

    pub fn evaluate_or_default<R: Request>(
        &mut self,
        request: &R,
        default: R::Output,
    ) -> R::Output {
        self.evaluate(request).unwrap_or(default)
    }

    pub fn evaluate_all<B: RequestBatch>(&mut self, batch: B) -> B::Outputs {
        batch.evaluate_in(self)
    }

    /// Returns whether `request` is being evaluated somewhere up the call
    /// stack, which is exactly when evaluating it would be cyclical.
    pub fn has_active<R: Request>(&self, request: &R) -> bool {
        self.has_active_request(ActiveRequest::new(request))
    }

    fn has_active_request(&self, request: ActiveRequest<'_>) -> bool {
        frames(self.active).any(|frame| frame.request == request)
    }

    /// The request whose computation this context was handed to.
    pub fn current_request(&self) -> Option<ActiveRequest<'a>> {
        self.active.map(|frame| frame.request)
    }

    /// Records references into the scope of the innermost cached request.
    pub fn record(&mut self, record: impl FnOnce(&mut DependencyCollector<'_>)) {
        self.evaluator.recorder.record(record);
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.evaluator.diagnostics
    }

    /// Steps 4 to 6 of an evaluation, run with the frame of `request` on
    /// top of the stack.
    fn evaluate_active<R: Request>(&mut self, request: &R) -> R::Output {
        if !R::IS_EVER_CACHED || !request.is_cached() {
            return self.compute(request);
        }

        if R::HAS_EXTERNAL_CACHE {
            if let Some(output) = request.cached_result() {
                trace!("external cache hit for {}", request);
                self.replay(request, &output);
                return output;
            }

            let output = self.compute(request);
            request.cache_result(output.clone());
            return output;
        }

        if let Some(output) = self.evaluator.cache.get(request) {
            let output = output.clone();
            trace!("cache hit for {}", request);
            self.replay(request, &output);
            return output;
        }

        let output = self.compute(request);
        self.evaluator.cache.insert(request.clone(), output.clone());
        output
    }

    /// Runs the registered computation of `request`.
    fn compute<R: Request>(&mut self, request: &R) -> R::Output {
        let function = self.evaluator.registry.function::<R>();
        let opens_scope = (R::IS_EVER_CACHED && request.is_cached()) || R::IS_DEPENDENCY_SOURCE;

        trace!("computing {}", request);

        if opens_scope {
            self.evaluator.recorder.begin_request();
        }

        let start = self.evaluator.options.collect_statistics.then(Instant::now);
        let output = function(request, self);

        if let Some(start) = start {
            self.evaluator
                .statistics
                .record(R::ID, R::NAME, start.elapsed());
        }

        if opens_scope {
            self.evaluator.recorder.end_request(request);
        }

        if R::IS_DEPENDENCY_SINK {
            self.write_dependency_sink(request, &output);
        }

        output
    }

    /// Contributes what `request` recorded when it was computed, as if it
    /// had been computed again.
    fn replay<R: Request>(&mut self, request: &R, output: &R::Output) {
        self.evaluator.recorder.replay_cached_request(request);

        if R::IS_DEPENDENCY_SINK {
            self.write_dependency_sink(request, output);
        }
    }

    fn write_dependency_sink<R: Request>(&mut self, request: &R, output: &R::Output) {
        self.evaluator
            .recorder
            .record(|collector| request.write_dependency_sink(collector, output));
    }

    fn record_edge(&mut self, child: ActiveRequest<'_>) {
        let child = child.to_any_request();

        match self.active {
            Some(parent) => self
                .evaluator
                .graph
                .add_dependency(parent.request.to_any_request(), child),
            None => self.evaluator.graph.add_request(child),
        }
    }

    /// Reports `cyclic` and every frame of the cycle it closes.
    fn diagnose_cycle(&mut self, cyclic: ActiveRequest<'_>) -> CyclicalRequestError {
        if self.evaluator.options.debug_dump_cycles {
            warning!("cycle detected while evaluating {}", cyclic);

            for frame in frames(self.active) {
                if frame.request == cyclic {
                    warning!("  {} (cycle starts here)", frame.request);
                } else {
                    warning!("  {}", frame.request);
                }
            }
        }

        let diags = &mut self.evaluator.diagnostics;
        cyclic.diagnose_cycle(diags);

        for frame in frames(self.active) {
            if frame.request == cyclic {
                return CyclicalRequestError::new(cyclic.to_any_request());
            }

            frame.request.note_cycle_step(diags);
        }

        unreachable!("`{}` closed a cycle but is not being evaluated", cyclic)
    }
}

/// A tuple of request references that can be evaluated in one call.
pub trait RequestBatch {
    type Outputs;

    fn evaluate_in(self, cx: &mut EvalContext<'_>) -> Self::Outputs;
}

macro_rules! request_batch {
    ($($typ:ident $var:ident),+) => {
        impl<'r, $($typ: Request),+> RequestBatch for ($(&'r $typ,)+) {
            type Outputs = ($(Result<<$typ as Request>::Output, CyclicalRequestError>,)+);

            fn evaluate_in(self, cx: &mut EvalContext<'_>) -> Self::Outputs {
                let ($($var,)+) = self;
                ($(cx.evaluate($var),)+)
            }
        }
    };
}

request_batch!(A a);
request_batch!(A a, B b);
request_batch!(A a, B b, C c);
request_batch!(A a, B b, C c, D d);

//! Recording which names each request looked at.
//!
//! While a cached request runs, every [`Reference`] written through a
//! [`DependencyCollector`] lands in a scope owned by that request. When the
//! request finishes its scope is remembered, so a later cache hit can
//! replay exactly the same references, and is folded into the scope of the
//! request that asked for it. Dependency sources additionally file what
//! they saw under their source file, for the incremental build to read
//! back with [`DependencyRecorder::enumerate_references_in_file`].

use fxhash::{FxBuildHasher, FxHashMap, FxHashSet};
use indexmap::IndexSet;
use std::{fmt, rc::Rc};
use tern_log::*;

use crate::{
    cache::RequestTables,
    loc::{FileId, NearestLoc},
    request::Request,
};

/// A declared name. Cheap to clone.
pub type Name = Rc<str>;

/// An entity (usually a nominal type) whose members can be looked up.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct EntityId(u32);

impl EntityId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl NearestLoc for EntityId {}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// A named dependency discovered while evaluating a request.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Reference {
    /// A specific member of `subject` was used.
    UsedMember { subject: EntityId, name: Name },
    /// Any member of `subject`, present or future, may matter.
    PotentialMember { subject: EntityId },
    /// A name was looked up at the top level.
    TopLevel { name: Name },
    /// A name was looked up dynamically, on any type.
    Dynamic { name: Name },
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::UsedMember { subject, name } => write!(f, "member {}.{}", subject, name),
            Reference::PotentialMember { subject } => write!(f, "potential member of {}", subject),
            Reference::TopLevel { name } => write!(f, "top-level {}", name),
            Reference::Dynamic { name } => write!(f, "dynamic lookup {}", name),
        }
    }
}

type ReferenceSet = IndexSet<Reference, FxBuildHasher>;

/// Owns every reference recorded by one evaluator.
pub struct DependencyRecorder {
    /// References filed under each dependency source.
    file_references: FxHashMap<FileId, FxHashSet<Reference>>,
    /// The references each cached request produced, for replaying on a
    /// cache hit.
    request_references: RequestTables,
    /// One scope per request that is currently collecting references,
    /// innermost last.
    active_request_references: Vec<ReferenceSet>,
}

impl DependencyRecorder {
    pub fn new() -> Self {
        Self {
            file_references: FxHashMap::default(),
            request_references: RequestTables::new(),
            active_request_references: Vec::new(),
        }
    }

    /// Opens a scope for a request that is about to be computed.
    pub(crate) fn begin_request(&mut self) {
        self.active_request_references.push(ReferenceSet::default());
    }

    /// Closes the scope of `request`, remembering what it saw and handing
    /// it to the enclosing scope.
    pub(crate) fn end_request<R: Request>(&mut self, request: &R) {
        let recorded = match self.active_request_references.pop() {
            Some(recorded) => recorded,
            None => panic!("no dependency scope is open for `{}`", request),
        };

        // Nothing to replay; drop whatever an earlier computation left.
        if recorded.is_empty() {
            self.clear_request(request);
            return;
        }

        trace!("{} recorded {} reference(s)", request, recorded.len());

        let recorded: Vec<_> = recorded.into_iter().collect();

        if let Some(parent) = self.active_request_references.last_mut() {
            parent.extend(recorded.iter().cloned());
        }

        self.request_references
            .table_mut::<R, Rc<[Reference]>>()
            .insert(request.clone(), recorded.into());
    }

    /// Feeds the references `request` recorded when it was computed into
    /// the innermost scope, as if it had been computed again.
    pub(crate) fn replay_cached_request<R: Request>(&mut self, request: &R) {
        let scope = match self.active_request_references.last_mut() {
            Some(scope) => scope,
            None => return,
        };

        let recorded = self
            .request_references
            .table::<R, Rc<[Reference]>>()
            .and_then(|table| table.get(request));

        if let Some(recorded) = recorded {
            trace!("replaying {} reference(s) of {}", recorded.len(), request);
            scope.extend(recorded.iter().cloned());
        }
    }

    /// Files the references recorded for a dependency source under
    /// `source`.
    pub(crate) fn handle_dependency_source_request<R: Request>(
        &mut self,
        request: &R,
        source: FileId,
    ) {
        let recorded = self
            .request_references
            .table::<R, Rc<[Reference]>>()
            .and_then(|table| table.get(request));

        if let Some(recorded) = recorded {
            self.file_references
                .entry(source)
                .or_default()
                .extend(recorded.iter().cloned());
        }
    }

    /// Adds a reference to the innermost scope. Dropped if nothing is
    /// collecting.
    pub(crate) fn record_dependency(&mut self, reference: Reference) {
        if let Some(scope) = self.active_request_references.last_mut() {
            scope.insert(reference);
        }
    }

    /// Runs `record` with a collector that writes into the innermost scope.
    ///
    /// The collector borrows the recorder, so recordings cannot nest.
    pub fn record(&mut self, record: impl FnOnce(&mut DependencyCollector<'_>)) {
        let mut collector = DependencyCollector { recorder: self };
        record(&mut collector);
    }

    /// Forgets what `request` recorded, so a recomputation starts afresh.
    pub(crate) fn clear_request<R: Request>(&mut self, request: &R) {
        if let Some(table) = self
            .request_references
            .existing_table_mut::<R, Rc<[Reference]>>()
        {
            table.remove(request);
        }
    }

    /// Forgets every request's recorded references. References already
    /// filed under a source are kept.
    pub(crate) fn clear_requests(&mut self) {
        self.request_references.clear();
    }

    /// Calls `f` with every reference filed under `source`, in no
    /// particular order.
    pub fn enumerate_references_in_file(&self, source: FileId, mut f: impl FnMut(&Reference)) {
        if let Some(references) = self.file_references.get(&source) {
            references.iter().for_each(|reference| f(reference));
        }
    }

    /// The number of scopes currently collecting references.
    pub fn active_scopes(&self) -> usize {
        self.active_request_references.len()
    }
}

impl Default for DependencyRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Records references into the scope of the request being evaluated.
pub struct DependencyCollector<'a> {
    recorder: &'a mut DependencyRecorder,
}

impl<'a> DependencyCollector<'a> {
    pub fn add_reference(&mut self, reference: Reference) {
        self.recorder.record_dependency(reference);
    }

    pub fn add_used_member(&mut self, subject: EntityId, name: impl Into<Name>) {
        self.add_reference(Reference::UsedMember {
            subject,
            name: name.into(),
        });
    }

    pub fn add_potential_member(&mut self, subject: EntityId) {
        self.add_reference(Reference::PotentialMember { subject });
    }

    pub fn add_top_level_name(&mut self, name: impl Into<Name>) {
        self.add_reference(Reference::TopLevel { name: name.into() });
    }

    pub fn add_dynamic_lookup_name(&mut self, name: impl Into<Name>) {
        self.add_reference(Reference::Dynamic { name: name.into() });
    }
}

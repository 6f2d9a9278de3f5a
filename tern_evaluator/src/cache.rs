//! Per-request-type storage.
//!
//! Every request type gets its own strongly typed table, found by indexing
//! with the zone and local id of its [`RequestTypeId`]. Looking a request
//! up never hashes or compares against requests of other types, and
//! clearing one type's entries cannot disturb another's.

use fxhash::FxHashMap;
use std::{any::Any, collections::hash_map::Entry};

use crate::{request::Request, type_id::Zone};

trait ErasedTable {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clear(&mut self);
    fn len(&self) -> usize;
}

struct Table<R: Request, V> {
    entries: FxHashMap<R, V>,
}

impl<R: Request, V: 'static> ErasedTable for Table<R, V> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

fn collision<R: Request>() -> ! {
    panic!(
        "request type id {} of `{}` is already used by another request type",
        R::ID,
        R::NAME
    )
}

/// A table of `V`s for every request type, keyed by the requests
/// themselves.
pub(crate) struct RequestTables {
    zones: Vec<Vec<Option<Box<dyn ErasedTable>>>>,
}

impl RequestTables {
    pub(crate) fn new() -> Self {
        Self {
            zones: (0..Zone::COUNT).map(|_| Vec::new()).collect(),
        }
    }

    fn slot<R: Request>(&self) -> Option<&dyn ErasedTable> {
        let id = R::ID;
        self.zones[id.zone().index()]
            .get(usize::from(id.local_id()))?
            .as_deref()
    }

    /// The table for `R`, if anything was ever stored for it.
    pub(crate) fn table<R: Request, V: 'static>(&self) -> Option<&FxHashMap<R, V>> {
        let slot = self.slot::<R>()?;
        match slot.as_any().downcast_ref::<Table<R, V>>() {
            Some(table) => Some(&table.entries),
            None => collision::<R>(),
        }
    }

    /// The table for `R`, if anything was ever stored for it.
    pub(crate) fn existing_table_mut<R: Request, V: 'static>(
        &mut self,
    ) -> Option<&mut FxHashMap<R, V>> {
        let id = R::ID;
        let slot = self.zones[id.zone().index()]
            .get_mut(usize::from(id.local_id()))?
            .as_deref_mut()?;

        match slot.as_any_mut().downcast_mut::<Table<R, V>>() {
            Some(table) => Some(&mut table.entries),
            None => collision::<R>(),
        }
    }

    /// The table for `R`, creating it (and growing its zone) on first use.
    pub(crate) fn table_mut<R: Request, V: 'static>(&mut self) -> &mut FxHashMap<R, V> {
        let id = R::ID;
        let zone = &mut self.zones[id.zone().index()];
        let local_id = usize::from(id.local_id());

        if zone.len() <= local_id {
            zone.resize_with(local_id + 1, || None);
        }

        let slot = zone[local_id].get_or_insert_with(|| {
            let table: Box<dyn ErasedTable> = Box::new(Table::<R, V> {
                entries: FxHashMap::default(),
            });
            table
        });

        match slot.as_any_mut().downcast_mut::<Table<R, V>>() {
            Some(table) => &mut table.entries,
            None => collision::<R>(),
        }
    }

    /// Empties every table, keeping their allocations.
    pub(crate) fn clear(&mut self) {
        for table in self.zones.iter_mut().flatten().flatten() {
            table.clear();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.zones.iter().flatten().flatten().map(|table| table.len()).sum()
    }
}

/// Results of cached requests, one typed map per request type.
pub struct RequestCache {
    tables: RequestTables,
}

impl RequestCache {
    pub fn new() -> Self {
        Self {
            tables: RequestTables::new(),
        }
    }

    pub fn get<R: Request>(&self, request: &R) -> Option<&R::Output> {
        self.tables.table::<R, R::Output>()?.get(request)
    }

    pub fn contains<R: Request>(&self, request: &R) -> bool {
        self.get(request).is_some()
    }

    /// Caches the result of `request`.
    ///
    /// # Panics
    ///
    /// If `request` already has a cached result. Cached results never
    /// change once they are stored.
    pub fn insert<R: Request>(&mut self, request: R, output: R::Output) {
        match self.tables.table_mut::<R, R::Output>().entry(request) {
            Entry::Occupied(entry) => panic!("request `{}` was already cached", entry.key()),
            Entry::Vacant(entry) => {
                entry.insert(output);
            },
        }
    }

    /// Removes the cached result of `request`, returning whether there was
    /// one.
    pub fn erase<R: Request>(&mut self, request: &R) -> bool {
        self.tables
            .existing_table_mut::<R, R::Output>()
            .map_or(false, |table| table.remove(request).is_some())
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }

    /// Total number of cached results across all request types.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;

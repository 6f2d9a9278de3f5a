//! The table of request computations, filled in once per zone at startup.

use std::any::Any;
use tern_log::*;

use crate::{evaluator::EvalContext, request::Request, type_id::Zone};

/// The computation behind a request type.
pub type RequestFunction<R> = fn(&R, &mut EvalContext<'_>) -> <R as Request>::Output;

/// The computations of one zone, indexed by local id.
///
/// ```ignore
/// let functions = RequestFunctions::new(Zone::Parse)
///     .register::<ParseModule>(parse_module)
///     .register::<ParseExpr>(parse_expr);
/// evaluator.register_request_functions(functions);
/// ```
pub struct RequestFunctions {
    zone: Zone,
    functions: Vec<Option<Box<dyn Any>>>,
}

impl RequestFunctions {
    pub fn new(zone: Zone) -> Self {
        Self {
            zone,
            functions: Vec::new(),
        }
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Installs the computation of `R`.
    ///
    /// # Panics
    ///
    /// If `R` belongs to another zone, or its local id already has a
    /// computation.
    pub fn register<R: Request>(mut self, function: RequestFunction<R>) -> Self {
        assert_eq!(
            R::ID.zone(),
            self.zone,
            "`{}` cannot be registered in zone {}",
            R::NAME,
            self.zone
        );

        let local_id = usize::from(R::ID.local_id());
        if self.functions.len() <= local_id {
            self.functions.resize_with(local_id + 1, || None);
        }

        let slot = &mut self.functions[local_id];
        assert!(
            slot.is_none(),
            "request type id {} of `{}` is registered twice",
            R::ID,
            R::NAME
        );
        let function: Box<dyn Any> = Box::new(function);
        *slot = Some(function);
        self
    }

    pub fn len(&self) -> usize {
        self.functions.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every zone's computations.
pub(crate) struct RequestRegistry {
    zones: Vec<Option<RequestFunctions>>,
}

impl RequestRegistry {
    pub(crate) fn new() -> Self {
        Self {
            zones: (0..Zone::COUNT).map(|_| None).collect(),
        }
    }

    pub(crate) fn install(&mut self, functions: RequestFunctions) {
        let zone = functions.zone;
        let slot = &mut self.zones[zone.index()];
        assert!(slot.is_none(), "zone {} is registered twice", zone);

        debug!(
            "registered {} request function(s) in zone {}",
            functions.len(),
            zone
        );
        *slot = Some(functions);
    }

    /// The computation of `R`.
    ///
    /// # Panics
    ///
    /// If nothing was registered for `R`.
    pub(crate) fn function<R: Request>(&self) -> RequestFunction<R> {
        let zone = match &self.zones[R::ID.zone().index()] {
            Some(zone) => zone,
            None => panic!(
                "`{}` was evaluated before zone {} was registered",
                R::NAME,
                R::ID.zone()
            ),
        };

        let function = zone
            .functions
            .get(usize::from(R::ID.local_id()))
            .and_then(Option::as_ref);

        match function.map(|function| function.downcast_ref::<RequestFunction<R>>()) {
            Some(Some(function)) => *function,
            Some(None) => panic!(
                "request type id {} of `{}` is registered for another request type",
                R::ID,
                R::NAME
            ),
            None => panic!("no request function is registered for `{}`", R::NAME),
        }
    }
}

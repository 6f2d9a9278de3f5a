//! Small request types shared by the unit tests.

use fxhash::FxHashMap;
use std::cell::RefCell;

use crate::{
    dependencies::{DependencyCollector, EntityId},
    error::CyclicalRequestError,
    evaluator::{EvalContext, Evaluator, EvaluatorOptions},
    loc::FileId,
    registry::{RequestFunction, RequestFunctions},
    request::{RequestFlags, RequestKind, SimpleRequest},
    type_id::{RequestTypeId, Zone},
};

thread_local! {
    static CALLS: RefCell<FxHashMap<&'static str, usize>> = RefCell::default();
    static EXTERNAL_STORE: RefCell<FxHashMap<u32, u32>> = RefCell::default();
}

/// Counts a run of the computation of `name`.
pub fn called(name: &'static str) {
    CALLS.with(|calls| *calls.borrow_mut().entry(name).or_default() += 1);
}

/// How many times the computation of `name` ran on this thread.
pub fn calls(name: &str) -> usize {
    CALLS.with(|calls| calls.borrow().get(name).copied().unwrap_or(0))
}

pub fn external_store_len() -> usize {
    EXTERNAL_STORE.with(|store| store.borrow().len())
}

macro_rules! kind {
    ($kind:ident, $alias:ident, $id:expr, $inputs:ty => $output:ty, $flags:expr) => {
        pub enum $kind {}

        pub type $alias = SimpleRequest<$kind>;

        impl RequestKind for $kind {
            type Inputs = $inputs;
            type Output = $output;

            const ID: RequestTypeId = RequestTypeId::new(Zone::Testing, $id);
            const NAME: &'static str = stringify!($alias);
            const FLAGS: RequestFlags = $flags;
        }
    };
}

kind!(SumKind, Sum, 0, (i64, i64) => i64, RequestFlags::CACHED);
kind!(ProductKind, Product, 1, (i64, i64) => i64, RequestFlags::CACHED);

pub type Parity = Result<bool, CyclicalRequestError>;

kind!(EvenKind, Even, 2, (u32,) => Parity, RequestFlags::CACHED);
kind!(OddKind, Odd, 3, (u32,) => Parity, RequestFlags::CACHED);

kind!(TotalKind, Total, 7, (Vec<String>,) => usize, RequestFlags::UNCACHED);
kind!(UnregisteredKind, Unregistered, 10, () => (), RequestFlags::UNCACHED);

/// Looks a top-level name up; the result is the length of the name.
pub enum LookupKind {}

pub type Lookup = SimpleRequest<LookupKind>;

impl RequestKind for LookupKind {
    type Inputs = (String,);
    type Output = usize;

    const ID: RequestTypeId = RequestTypeId::new(Zone::Testing, 4);
    const NAME: &'static str = "Lookup";
    const FLAGS: RequestFlags = RequestFlags::CACHED.union(RequestFlags::DEPENDENCY_SINK);

    fn write_dependency_sink(
        request: &SimpleRequest<Self>,
        collector: &mut DependencyCollector<'_>,
        _output: &usize,
    ) {
        collector.add_top_level_name(request.inputs().0.as_str());
    }
}

/// Looks a member of an entity up, recording both the member and that any
/// other member could matter.
pub enum MemberKind {}

pub type Member = SimpleRequest<MemberKind>;

impl RequestKind for MemberKind {
    type Inputs = (EntityId, String);
    type Output = usize;

    const ID: RequestTypeId = RequestTypeId::new(Zone::Testing, 5);
    const NAME: &'static str = "Member";
    const FLAGS: RequestFlags = RequestFlags::CACHED.union(RequestFlags::DEPENDENCY_SINK);

    fn write_dependency_sink(
        request: &SimpleRequest<Self>,
        collector: &mut DependencyCollector<'_>,
        _output: &usize,
    ) {
        let (subject, name) = request.inputs();
        collector.add_used_member(*subject, name.as_str());
        collector.add_potential_member(*subject);
    }
}

/// Checks a file by looking up each of its names.
pub enum CheckFileKind {}

pub type CheckFile = SimpleRequest<CheckFileKind>;

impl RequestKind for CheckFileKind {
    type Inputs = (FileId, Vec<String>);
    type Output = usize;

    const ID: RequestTypeId = RequestTypeId::new(Zone::Testing, 6);
    const NAME: &'static str = "CheckFile";
    const FLAGS: RequestFlags = RequestFlags::CACHED.union(RequestFlags::DEPENDENCY_SOURCE);

    fn read_dependency_source(request: &SimpleRequest<Self>) -> Option<FileId> {
        Some(request.inputs().0)
    }
}

/// Doubles its input, remembering results outside the evaluator.
pub enum ExternalKind {}

pub type External = SimpleRequest<ExternalKind>;

impl RequestKind for ExternalKind {
    type Inputs = (u32,);
    type Output = u32;

    const ID: RequestTypeId = RequestTypeId::new(Zone::Testing, 8);
    const NAME: &'static str = "External";
    const FLAGS: RequestFlags = RequestFlags::SEPARATELY_CACHED;

    fn cached_result(request: &SimpleRequest<Self>) -> Option<u32> {
        EXTERNAL_STORE.with(|store| store.borrow().get(&request.inputs().0).copied())
    }

    fn cache_result(request: &SimpleRequest<Self>, output: u32) {
        EXTERNAL_STORE.with(|store| store.borrow_mut().insert(request.inputs().0, output));
    }
}

/// Only cached for even inputs.
pub enum SometimesKind {}

pub type Sometimes = SimpleRequest<SometimesKind>;

impl RequestKind for SometimesKind {
    type Inputs = (u32,);
    type Output = u32;

    const ID: RequestTypeId = RequestTypeId::new(Zone::Testing, 9);
    const NAME: &'static str = "Sometimes";
    const FLAGS: RequestFlags = RequestFlags::CACHED;

    fn is_cached(request: &SimpleRequest<Self>) -> bool {
        request.inputs().0 % 2 == 0
    }
}

pub fn sum(request: &Sum, _cx: &mut EvalContext<'_>) -> i64 {
    called("Sum");
    let (a, b) = *request.inputs();
    a + b
}

/// Multiplication by repeated addition, so products evaluate sums.
pub fn product(request: &Product, cx: &mut EvalContext<'_>) -> i64 {
    called("Product");
    let (a, b) = *request.inputs();
    (0..b).fold(0, |acc, _| cx.evaluate_or_default(&Sum::new((acc, a)), 0))
}

pub fn even(request: &Even, cx: &mut EvalContext<'_>) -> Parity {
    called("Even");
    match request.inputs().0 {
        0 => Ok(true),
        n => cx.evaluate(&Odd::new((n - 1,)))?,
    }
}

pub fn odd(request: &Odd, cx: &mut EvalContext<'_>) -> Parity {
    called("Odd");
    match request.inputs().0 {
        0 => Ok(false),
        n => cx.evaluate(&Even::new((n - 1,)))?,
    }
}

/// `Even(0)` asks for `Odd(0)`.
pub fn buggy_even(request: &Even, cx: &mut EvalContext<'_>) -> Parity {
    called("Even");
    let n = request.inputs().0;
    cx.evaluate(&Odd::new((n.saturating_sub(1),)))?
}

/// `Odd(0)` asks for `Even(0)`.
pub fn buggy_odd(request: &Odd, cx: &mut EvalContext<'_>) -> Parity {
    called("Odd");
    let n = request.inputs().0;
    cx.evaluate(&Even::new((n.saturating_sub(1),)))?
}

pub fn lookup(request: &Lookup, _cx: &mut EvalContext<'_>) -> usize {
    called("Lookup");
    request.inputs().0.len()
}

pub fn member(request: &Member, _cx: &mut EvalContext<'_>) -> usize {
    called("Member");
    request.inputs().1.len()
}

pub fn check_file(request: &CheckFile, cx: &mut EvalContext<'_>) -> usize {
    called("CheckFile");
    request
        .inputs()
        .1
        .iter()
        .map(|name| cx.evaluate_or_default(&Lookup::new((name.clone(),)), 0))
        .sum()
}

pub fn total(request: &Total, cx: &mut EvalContext<'_>) -> usize {
    called("Total");
    request
        .inputs()
        .0
        .iter()
        .map(|name| cx.evaluate_or_default(&Lookup::new((name.clone(),)), 0))
        .sum()
}

pub fn external(request: &External, _cx: &mut EvalContext<'_>) -> u32 {
    called("External");
    request.inputs().0 * 2
}

pub fn sometimes(request: &Sometimes, _cx: &mut EvalContext<'_>) -> u32 {
    called("Sometimes");
    request.inputs().0 + 1
}

/// The `Testing` zone, with the given computations for `Even` and `Odd`.
pub fn testing_functions(
    even: RequestFunction<Even>,
    odd: RequestFunction<Odd>,
) -> RequestFunctions {
    RequestFunctions::new(Zone::Testing)
        .register::<Sum>(sum)
        .register::<Product>(product)
        .register::<Even>(even)
        .register::<Odd>(odd)
        .register::<Lookup>(lookup)
        .register::<Member>(member)
        .register::<CheckFile>(check_file)
        .register::<Total>(total)
        .register::<External>(external)
        .register::<Sometimes>(sometimes)
}

pub fn evaluator_with(options: EvaluatorOptions) -> Evaluator {
    CALLS.with(|calls| calls.borrow_mut().clear());
    EXTERNAL_STORE.with(|store| store.borrow_mut().clear());

    let mut evaluator = Evaluator::with_options(options);
    evaluator.register_request_functions(testing_functions(even, odd));
    evaluator
}

pub fn evaluator() -> Evaluator {
    evaluator_with(EvaluatorOptions::default())
}

pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

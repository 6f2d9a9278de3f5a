use tern_evaluator::{
    DependencyCollector, EvalContext, Name, RequestFlags, RequestFunctions, RequestKind,
    RequestTypeId, SimpleRequest, Zone,
};

use super::parse::ParseModule;
use crate::{parser::ast::DeclRef, source::SourceFileRef};

/// Finds the declaration a top-level name refers to.
///
/// Whether or not it is found, the name is recorded as a reference of the
/// file being checked: declaring it later changes the answer.
pub enum LookupTopLevelKind {}

pub type LookupTopLevel = SimpleRequest<LookupTopLevelKind>;

impl RequestKind for LookupTopLevelKind {
    type Inputs = (SourceFileRef, Name);
    type Output = Option<DeclRef>;

    const ID: RequestTypeId = RequestTypeId::new(Zone::NameLookup, 0);
    const NAME: &'static str = "LookupTopLevel";
    const FLAGS: RequestFlags = RequestFlags::CACHED.union(RequestFlags::DEPENDENCY_SINK);

    fn write_dependency_sink(
        request: &LookupTopLevel,
        collector: &mut DependencyCollector<'_>,
        _output: &Option<DeclRef>,
    ) {
        collector.add_top_level_name(request.inputs().1.clone());
    }
}

fn lookup_top_level(request: &LookupTopLevel, cx: &mut EvalContext<'_>) -> Option<DeclRef> {
    let (source, name) = request.inputs();
    let module = cx.evaluate_or_default(&ParseModule::new((source.clone(),)), None)?;
    module.find(name).cloned()
}

pub fn functions() -> RequestFunctions {
    RequestFunctions::new(Zone::NameLookup).register::<LookupTopLevel>(lookup_top_level)
}

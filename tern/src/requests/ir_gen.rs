use std::fmt::Write;

use tern_evaluator::{
    EvalContext, RequestFlags, RequestFunctions, RequestKind, RequestTypeId, SimpleRequest, Zone,
};

use super::{
    parse::ParseModule,
    type_check::{CheckModule, ValueOfDecl},
};
use crate::source::SourceFileRef;

/// LLVM-style textual IR for a file, with one global per declaration.
///
/// Never cached: the text is only wanted once, at the very end.
pub enum EmitIrKind {}

pub type EmitIr = SimpleRequest<EmitIrKind>;

impl RequestKind for EmitIrKind {
    type Inputs = (SourceFileRef,);
    type Output = Option<String>;

    const ID: RequestTypeId = RequestTypeId::new(Zone::IrGen, 0);
    const NAME: &'static str = "EmitIr";
    const FLAGS: RequestFlags = RequestFlags::UNCACHED;
}

fn emit_ir(request: &EmitIr, cx: &mut EvalContext<'_>) -> Option<String> {
    let (source,) = request.inputs();

    let (ok, module) = cx.evaluate_all((
        &CheckModule::new((source.clone(),)),
        &ParseModule::new((source.clone(),)),
    ));

    let module = match (ok, module) {
        (Ok(true), Ok(Some(module))) => module,
        _ => return None,
    };

    let mut res = format!("; ModuleID = '{}'\n", source.name());

    for decl in &module.declarations {
        let value = cx.evaluate_or_default(&ValueOfDecl::new((decl.clone(),)), None)?;
        // Writing to a `String` cannot fail
        let _ = writeln!(res, "@{} = global i64 {}", decl.name, value);
    }

    Some(res)
}

pub fn functions() -> RequestFunctions {
    RequestFunctions::new(Zone::IrGen).register::<EmitIr>(emit_ir)
}

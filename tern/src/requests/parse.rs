use std::rc::Rc;

use tern_evaluator::{
    EvalContext, RequestFlags, RequestFunctions, RequestKind, RequestTypeId, SimpleRequest,
    SourceLoc, Zone,
};
use tern_log::*;

use crate::{
    lexer::{lex, LexError},
    parser::{ast::Module, parse},
    source::SourceFileRef,
};

/// Lexes and parses a source file. Yields `None` if the file has errors,
/// which have already been reported.
pub enum ParseModuleKind {}

pub type ParseModule = SimpleRequest<ParseModuleKind>;

impl RequestKind for ParseModuleKind {
    type Inputs = (SourceFileRef,);
    type Output = Option<Rc<Module>>;

    const ID: RequestTypeId = RequestTypeId::new(Zone::Parse, 0);
    const NAME: &'static str = "ParseModule";
    const FLAGS: RequestFlags = RequestFlags::CACHED;
}

fn parse_module(request: &ParseModule, cx: &mut EvalContext<'_>) -> Option<Rc<Module>> {
    let (source,) = request.inputs();
    trace!("parsing {}", source.name());

    let tokens = match lex(source.text()) {
        Ok(tokens) => tokens,

        Err(err) => {
            let diags = cx.diagnostics_mut();
            diags.error(Some(SourceLoc::new(source.id(), err.span())), &err);

            if let LexError::CouldntParseInt(_, _, parse_err) = &err {
                diags.note(None, format!("str::parse says: {}", parse_err));
            }

            return None;
        },
    };

    match parse(tokens, source) {
        Ok(module) => Some(Rc::new(module)),

        Err(err) => {
            let diags = cx.diagnostics_mut();
            diags.error(Some(SourceLoc::new(source.id(), err.span())), &err);

            if let Some(note) = err.expected_note() {
                diags.note(None, note);
            }

            None
        },
    }
}

pub fn functions() -> RequestFunctions {
    RequestFunctions::new(Zone::Parse).register::<ParseModule>(parse_module)
}

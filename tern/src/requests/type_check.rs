use tern_evaluator::{
    EvalContext, FileId, RequestFlags, RequestFunctions, RequestKind, RequestTypeId,
    SimpleRequest, SourceLoc, Span, Zone,
};
use tern_log::*;

use super::{name_lookup::LookupTopLevel, parse::ParseModule};
use crate::{
    parser::ast::{BinaryOperator, DeclRef, Expression, ExpressionKind, UnaryOperator},
    source::SourceFileRef,
};

/// The constant value of a declaration, or `None` if it has none.
pub enum ValueOfDeclKind {}

pub type ValueOfDecl = SimpleRequest<ValueOfDeclKind>;

impl RequestKind for ValueOfDeclKind {
    type Inputs = (DeclRef,);
    type Output = Option<i64>;

    const ID: RequestTypeId = RequestTypeId::new(Zone::TypeChecker, 0);
    const NAME: &'static str = "ValueOfDecl";
    const FLAGS: RequestFlags = RequestFlags::CACHED;

    fn cycle_message(request: &ValueOfDecl) -> String {
        format!("the value of `{}` depends on itself", request.inputs().0.name)
    }

    fn cycle_step_message(request: &ValueOfDecl) -> String {
        format!("which needs the value of `{}`", request.inputs().0.name)
    }
}

fn value_of_decl(request: &ValueOfDecl, cx: &mut EvalContext<'_>) -> Option<i64> {
    let (decl,) = request.inputs();
    trace!("folding `{}`", decl.name);
    fold(&decl.value, decl, cx)
}

fn fold(expr: &Expression, decl: &DeclRef, cx: &mut EvalContext<'_>) -> Option<i64> {
    let loc = |span: Span| Some(SourceLoc::new(decl.source.id(), span));

    let res = match &expr.kind {
        ExpressionKind::Integer(value) => return Some(*value),

        ExpressionKind::Identifier(name) => {
            let lookup = LookupTopLevel::new((decl.source.clone(), name.clone()));

            return match cx.evaluate_or_default(&lookup, None) {
                // A cycle has already been diagnosed
                Some(target) => cx.evaluate_or_default(&ValueOfDecl::new((target,)), None),

                None => {
                    let message = format!("cannot find `{}` in this file", name);
                    cx.diagnostics_mut().error(loc(expr.span), message);
                    None
                },
            };
        },

        ExpressionKind::UnaryOperation(UnaryOperator::Negative, operand) => {
            fold(operand, decl, cx)?.checked_neg()
        },

        ExpressionKind::BinaryOperation(lhs, op, rhs) => {
            // Fold both sides so both get their errors reported
            let (lhs, rhs) = (fold(lhs, decl, cx), fold(rhs, decl, cx));
            let (lhs, rhs) = (lhs?, rhs?);

            match op {
                BinaryOperator::Add => lhs.checked_add(rhs),
                BinaryOperator::Subtract => lhs.checked_sub(rhs),
                BinaryOperator::Multiply => lhs.checked_mul(rhs),
            }
        },
    };

    if res.is_none() {
        cx.diagnostics_mut()
            .error(loc(expr.span), "this arithmetic operation overflows");
    }

    res
}

/// Folds every declaration of a file. Yields whether the file is free of
/// errors.
pub enum CheckModuleKind {}

pub type CheckModule = SimpleRequest<CheckModuleKind>;

impl RequestKind for CheckModuleKind {
    type Inputs = (SourceFileRef,);
    type Output = bool;

    const ID: RequestTypeId = RequestTypeId::new(Zone::TypeChecker, 1);
    const NAME: &'static str = "CheckModule";
    const FLAGS: RequestFlags = RequestFlags::CACHED.union(RequestFlags::DEPENDENCY_SOURCE);

    fn read_dependency_source(request: &CheckModule) -> Option<FileId> {
        Some(request.inputs().0.id())
    }
}

fn check_module(request: &CheckModule, cx: &mut EvalContext<'_>) -> bool {
    let (source,) = request.inputs();
    debug!("checking {}", source.name());

    let module = match cx.evaluate_or_default(&ParseModule::new((source.clone(),)), None) {
        Some(module) => module,
        None => return false,
    };

    let mut ok = true;

    for decl in &module.declarations {
        if let Some(first) = module.find(&decl.name).filter(|first| *first != decl) {
            let diags = cx.diagnostics_mut();
            diags.error(
                Some(SourceLoc::new(source.id(), decl.name_span)),
                format!("`{}` is declared more than once", decl.name),
            );
            diags.note(
                Some(SourceLoc::new(source.id(), first.span)),
                "first declared here",
            );

            ok = false;
            continue;
        }

        if cx
            .evaluate_or_default(&ValueOfDecl::new((decl.clone(),)), None)
            .is_none()
        {
            ok = false;
        }
    }

    ok
}

pub fn functions() -> RequestFunctions {
    RequestFunctions::new(Zone::TypeChecker)
        .register::<ValueOfDecl>(value_of_decl)
        .register::<CheckModule>(check_module)
}

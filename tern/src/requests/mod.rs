//! The compiler's phases, phrased as requests.

mod ir_gen;
mod name_lookup;
mod parse;
mod type_check;


use tern_evaluator::Evaluator;

pub use self::{ir_gen::EmitIr, type_check::CheckModule};

/// Installs the computation of every request type, one zone at a time.
pub fn register_requests(evaluator: &mut Evaluator) {
    evaluator.register_request_functions(parse::functions());
    evaluator.register_request_functions(name_lookup::functions());
    evaluator.register_request_functions(type_check::functions());
    evaluator.register_request_functions(ir_gen::functions());
}

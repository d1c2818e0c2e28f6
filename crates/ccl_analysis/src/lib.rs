//! Semantic analyser for CCL: symbol resolution, type checking, diagnostics.
//!
//! The only public entry point is [`analyse`]; everything else is exposed so
//! that a driver crate can build a [`ast::Program`] and report results, but
//! the pass itself is always run start to finish through this one function.

pub mod analysis;
pub mod ast;
pub mod builtins;
pub mod diagnostic;
pub mod scope;
pub mod symbol;
pub mod types;

use ccl_base::Interner;

pub use analysis::AnalysedProgram;
pub use diagnostic::Diagnostic;

/// Runs the full analyser over `program`: annotations first, then the body,
/// top to bottom. Returns the first diagnostic encountered anywhere, or the
/// successfully annotated program.
pub fn analyse<'ast>(program: &ast::Program<'ast>, interner: &Interner) -> diagnostic::Result<AnalysedProgram> {
    log::debug!(
        "analysing program with {} top-level statements and {} annotations",
        program.body.len(),
        program.annotations.len()
    );
    let result = analysis::analyse(program, interner);
    match &result {
        Ok(_) => log::trace!("analysis completed with no diagnostics"),
        Err(d) => log::trace!("analysis aborted: {d}"),
    }
    result
}

//! The four checking passes, sharing one [`Checker`] context.
//!
//! Control flow matches the fail-fast, two-phase design: annotations are
//! resolved into the global scope first, then the body is walked top to
//! bottom. The first diagnostic produced anywhere aborts the whole pass.

pub mod annotations;
pub mod constraints;
pub mod expressions;
pub mod statements;

use std::collections::{HashMap, HashSet};

use ccl_base::{Interner, Symbol};

use crate::ast::Program;
use crate::diagnostic::Result;
use crate::scope::ScopeStack;

pub use annotations::SubstitutionInfo;
pub use expressions::TypedExprTable;

/// Shared, mutable state threaded through every checking function. Not
/// `Clone`: there is exactly one of these per `analyse` call.
pub struct Checker<'a> {
    pub interner: &'a Interner,
    pub scopes: ScopeStack,
    pub substitutions: HashMap<Symbol, SubstitutionInfo>,
    /// Object-annotation or loop-introduced names currently usable as an
    /// index — i.e. bound by an enclosing `for each` or `sum`.
    pub bound_objects: HashSet<Symbol>,
    /// Atom pairs tied together by an active bond decomposition
    /// (`name = [i, j] is bond`), used to validate two-atom bond-parameter
    /// subscripts.
    pub bonded_pairs: Vec<(Symbol, Symbol)>,
    pub types: TypedExprTable,
}

impl<'a> Checker<'a> {
    pub fn new(interner: &'a Interner) -> Self {
        Self {
            interner,
            scopes: ScopeStack::new(),
            substitutions: HashMap::new(),
            bound_objects: HashSet::new(),
            bonded_pairs: Vec::new(),
            types: TypedExprTable::default(),
        }
    }

    pub fn name_of(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    pub fn is_bonded(&self, a: Symbol, b: Symbol) -> bool {
        self.bonded_pairs.iter().any(|&(x, y)| (x, y) == (a, b) || (x, y) == (b, a))
    }
}

/// The result of a successful analysis: the expression-type side table.
/// Symbol resolution is implicit in the input tree (every `Symbol` is
/// already the handle the scope stack used during checking).
pub struct AnalysedProgram {
    pub types: TypedExprTable,
}

/// The single entry point: checks `program`'s annotations, then its body,
/// against `interner` (used to turn `Symbol`s back into names for
/// diagnostics). Returns the first diagnostic encountered, in annotations-
/// then-body, source order.
pub fn analyse<'ast>(program: &Program<'ast>, interner: &Interner) -> Result<AnalysedProgram> {
    let mut checker = Checker::new(interner);
    annotations::resolve(&mut checker, program.annotations)?;
    statements::check_block(&mut checker, program.body)?;
    Ok(AnalysedProgram { types: checker.types })
}

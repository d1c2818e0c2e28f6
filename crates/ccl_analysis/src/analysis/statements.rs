//! Statement checker: assignments and the two loop forms.

use ccl_base::{Span, Symbol};

use crate::ast::{LValue, ObjectKind, Stmt};
use crate::diagnostic::{Diagnostic, Result};
use crate::symbol::{SymbolClass, SymbolRecord};
use crate::types::{IndexKind, Type};

use super::Checker;

impl<'a> Checker<'a> {
    pub fn check_stmt(&mut self, stmt: &Stmt<'_>) -> Result<()> {
        match stmt {
            Stmt::Assign { lhs, rhs, span } => self.check_assign(lhs, rhs, *span),
            Stmt::For { var, lo, hi, body, span } => self.check_for(*var, lo, hi, body, *span),
            Stmt::ForEach { kind, name, decomposition, constraint, body, span } => {
                self.check_for_each(*kind, *name, *decomposition, constraint.as_deref(), body, *span)
            }
        }
    }

    fn check_assign(&mut self, lhs: &LValue<'_>, rhs: &crate::ast::Expr<'_>, span: Span) -> Result<()> {
        let rhs_ty = self.check_expr(rhs)?;
        let name = lhs.name();

        if let Some(record) = self.scopes.lookup(name).cloned() {
            match record.class {
                SymbolClass::LoopVariable => {
                    return Err(Diagnostic::cannot_assign_to_loop_variable(self.name_of(name), lhs.span()));
                }
                SymbolClass::Substitution => {
                    return Err(Diagnostic::cannot_assign_to_substitution(self.name_of(name), lhs.span()));
                }
                SymbolClass::Parameter | SymbolClass::Property | SymbolClass::Constant
                    if matches!(lhs, LValue::Name(_, _)) =>
                {
                    return Err(Diagnostic::cannot_assign_to_symbol_class(
                        record.class.noun(),
                        self.name_of(name),
                        lhs.span(),
                    ));
                }
                _ => {}
            }

            match lhs {
                LValue::Name(_, _) => {
                    if !rhs_ty.is_numeric_scalar() && !rhs_ty.is_array() {
                        return Err(Diagnostic::only_numbers_and_arrays_can_be_assigned(rhs_ty, span));
                    }
                    Ok(())
                }
                LValue::Index(_, indices, _) => match &record.ty {
                    Type::Array(elem, dims) => {
                        let index_kinds = self.index_kinds_of(indices)?;
                        if index_kinds.len() != dims.len() {
                            return Err(Diagnostic::cannot_assign_mismatched_array(
                                Type::Array(Box::new(rhs_ty.promoted()), index_kinds),
                                self.name_of(name),
                                record.ty.clone(),
                                span,
                            ));
                        }
                        if index_kinds != *dims {
                            let given: Vec<Type> = index_kinds
                                .iter()
                                .map(|k| match k {
                                    IndexKind::Atom => Type::Atom,
                                    IndexKind::Bond => Type::Bond,
                                })
                                .collect();
                            return Err(Diagnostic::cannot_index_array(record.ty.clone(), given, span));
                        }
                        Ok(())
                    }
                    Type::AtomParameter | Type::BondParameter | Type::CommonParameter | Type::Substitution(_, _) => {
                        Err(Diagnostic::cannot_assign_non_array(record.ty.clone(), span))
                    }
                    other => {
                        let given: Vec<Type> =
                            indices.iter().map(|e| self.check_expr(e)).collect::<Result<_>>()?;
                        Err(Diagnostic::cannot_index_scalar(other.clone(), given, span))
                    }
                },
            }
        } else {
            self.declare_new_lvalue(lhs, rhs_ty, span)
        }
    }

    fn declare_new_lvalue(&mut self, lhs: &LValue<'_>, rhs_ty: Type, span: Span) -> Result<()> {
        if !rhs_ty.is_numeric_scalar() && !rhs_ty.is_array() {
            return Err(Diagnostic::only_numbers_and_arrays_can_be_assigned(rhs_ty, span));
        }
        match lhs {
            LValue::Name(name, def_span) => {
                self.scopes.bind(SymbolRecord::new(
                    *name,
                    SymbolClass::ScalarVariable,
                    rhs_ty,
                    *def_span,
                ));
                Ok(())
            }
            LValue::Index(name, indices, def_span) => {
                let index_kinds = self.index_kinds_of(indices)?;
                let elem = rhs_ty.promoted();
                self.scopes.bind(SymbolRecord::new(
                    *name,
                    SymbolClass::ArrayVariable,
                    Type::Array(Box::new(elem), index_kinds),
                    *def_span,
                ));
                Ok(())
            }
        }
    }

    /// Resolves each subscript expression of a new array lvalue to its index
    /// kind: every one must be a currently bound `Atom`/`Bond` object name.
    fn index_kinds_of(&mut self, indices: &[&crate::ast::Expr<'_>]) -> Result<Vec<IndexKind>> {
        indices
            .iter()
            .map(|e| {
                let ty = self.check_expr(e)?;
                match ty {
                    Type::Atom => Ok(IndexKind::Atom),
                    Type::Bond => Ok(IndexKind::Bond),
                    other => Err(Diagnostic::cannot_index_scalar(other, vec![], e.span())),
                }
            })
            .collect()
    }

    fn check_for(
        &mut self,
        var: Symbol,
        lo: &crate::ast::Expr<'_>,
        hi: &crate::ast::Expr<'_>,
        body: &[Stmt<'_>],
        span: Span,
    ) -> Result<()> {
        let lo_ty = self.check_expr(lo)?;
        let hi_ty = self.check_expr(hi)?;
        if lo_ty != Type::Int || hi_ty != Type::Int {
            return Err(Diagnostic::cannot_perform_op("range", lo_ty, hi_ty, span));
        }
        if self.scopes.is_defined(var) {
            return Err(Diagnostic::loop_variable_already_defined(self.name_of(var), span));
        }

        self.scopes.push_scope();
        self.scopes.bind(SymbolRecord::new(var, SymbolClass::LoopVariable, Type::Int, span));
        let result = check_block(self, body);
        self.scopes.pop_scope();
        result
    }

    fn check_for_each(
        &mut self,
        kind: ObjectKind,
        name: Symbol,
        decomposition: Option<(Symbol, Symbol)>,
        constraint: Option<&crate::ast::Constraint<'_>>,
        body: &[Stmt<'_>],
        span: Span,
    ) -> Result<()> {
        let object_ty = match kind {
            ObjectKind::Atom => Type::Atom,
            ObjectKind::Bond => Type::Bond,
        };

        let reuse_existing = match self.scopes.lookup(name) {
            Some(record) if record.class == SymbolClass::ObjectVariable && record.ty == object_ty => true,
            Some(_) => {
                return Err(Diagnostic::symbol_already_defined_as_something_else(self.name_of(name), span));
            }
            None => false,
        };

        self.scopes.push_scope();
        if !reuse_existing {
            self.scopes.bind(SymbolRecord::new(name, SymbolClass::ObjectVariable, object_ty, span));
        }
        self.bound_objects.insert(name);

        let mut decomposed = None;
        if let Some((i, j)) = decomposition {
            if self.scopes.is_defined(i) || self.scopes.is_defined(j) {
                self.scopes.pop_scope();
                self.bound_objects.remove(&name);
                return Err(Diagnostic::decomposition_used_already_defined_names(self.name_of(name), span));
            }
            self.scopes.bind(SymbolRecord::new(i, SymbolClass::ObjectVariable, Type::Atom, span));
            self.scopes.bind(SymbolRecord::new(j, SymbolClass::ObjectVariable, Type::Atom, span));
            self.bound_objects.insert(i);
            self.bound_objects.insert(j);
            self.bonded_pairs.push((i, j));
            decomposed = Some((i, j));
        }

        let result = (|| -> Result<()> {
            if let Some(c) = constraint {
                self.check_constraint(c)?;
            }
            check_block(self, body)
        })();

        if let Some((i, j)) = decomposed {
            self.bonded_pairs.retain(|&p| p != (i, j));
            self.bound_objects.remove(&i);
            self.bound_objects.remove(&j);
        }
        self.bound_objects.remove(&name);
        self.scopes.pop_scope();
        result
    }
}

pub fn check_block(checker: &mut Checker<'_>, body: &[Stmt<'_>]) -> Result<()> {
    for stmt in body {
        checker.check_stmt(stmt)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;
    use ccl_base::Interner;

    #[test]
    fn reassigning_loop_variable_is_rejected() {
        let mut interner = Interner::new();
        let mut checker = Checker::new(&interner);
        let i = interner.intern("i");
        let zero = Expr::Int(0, Span::default());
        let ten = Expr::Int(10, Span::default());
        let one = Expr::Int(1, Span::default());
        let assign = Stmt::Assign {
            lhs: LValue::Name(i, Span::default()),
            rhs: &one,
            span: Span::default(),
        };
        let body = [assign];
        let for_stmt = Stmt::For { var: i, lo: &zero, hi: &ten, body: &body, span: Span::default() };
        let err = checker.check_stmt(&for_stmt).unwrap_err();
        assert_eq!(err.to_string(), "Cannot assign to loop variable i.");
    }

    #[test]
    fn for_each_then_index_mismatch_is_rejected() {
        let mut interner = Interner::new();
        let mut checker = Checker::new(&interner);
        let a = interner.intern("a");
        let b = interner.intern("b");
        let q = interner.intern("q");

        let a_name = Expr::Name(a, Span::default());
        let one = Expr::Int(1, Span::default());
        let a_indices: &[&Expr<'_>] = &[&a_name];
        let assign_a = Stmt::Assign {
            lhs: LValue::Index(q, a_indices, Span::default()),
            rhs: &one,
            span: Span::default(),
        };
        let first_loop = Stmt::ForEach {
            kind: ObjectKind::Atom,
            name: a,
            decomposition: None,
            constraint: None,
            body: &[assign_a],
            span: Span::default(),
        };
        checker.check_stmt(&first_loop).unwrap();

        let b_name = Expr::Name(b, Span::default());
        let two = Expr::Int(1, Span::default());
        let b_indices: &[&Expr<'_>] = &[&b_name];
        let assign_b = Stmt::Assign {
            lhs: LValue::Index(q, b_indices, Span::default()),
            rhs: &two,
            span: Span::default(),
        };
        let second_loop = Stmt::ForEach {
            kind: ObjectKind::Bond,
            name: b,
            decomposition: None,
            constraint: None,
            body: &[assign_b],
            span: Span::default(),
        };
        let err = checker.check_stmt(&second_loop).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot index Array of type Float[Atom] using index/indices of type(s) Bond."
        );
    }
}

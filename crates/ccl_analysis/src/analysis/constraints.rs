//! Constraint checker: `and`/`or`/`not`, relational comparisons, predicates.

use ccl_base::Symbol;

use crate::ast::{Constraint, Expr};
use crate::builtins;
use crate::diagnostic::{Diagnostic, Result};
use crate::types::Type;

use super::Checker;

impl<'a> Checker<'a> {
    pub fn check_constraint(&mut self, constraint: &Constraint<'_>) -> Result<()> {
        match constraint {
            Constraint::And(l, r, _) | Constraint::Or(l, r, _) => {
                self.check_constraint(l)?;
                self.check_constraint(r)
            }
            Constraint::Not(inner, _) => self.check_constraint(inner),
            Constraint::Compare(_, lhs, rhs, span) => {
                let a = self.check_expr(lhs)?;
                let b = self.check_expr(rhs)?;
                if !a.is_numeric_scalar() || !b.is_numeric_scalar() {
                    return Err(Diagnostic::cannot_perform_op("compare", a, b, *span));
                }
                Ok(())
            }
            Constraint::Predicate(sym, args, span) => self.check_predicate(*sym, args, *span),
        }
    }

    fn check_predicate(&mut self, sym: Symbol, args: &[&Expr<'_>], span: ccl_base::Span) -> Result<()> {
        let name = self.name_of(sym).to_string();
        let sig = builtins::lookup_predicate(&name)
            .ok_or_else(|| Diagnostic::predicate_not_defined(name.clone(), span))?;

        // `element`'s second argument names an element by bare identifier; it is
        // never itself a value expression, so it must not be resolved through
        // the scope like a real operand.
        if name == "element" {
            if args.len() != sig.args.len() {
                return Err(Diagnostic::predicate_wrong_arity(name, sig.args.len(), args.len(), span));
            }
            let subject = self.check_expr(args[0])?;
            if subject != Type::Atom {
                return Err(Diagnostic::predicate_element_argument_not_atom(span));
            }
            return match args[1] {
                Expr::Name(elem_sym, _) => {
                    let elem_name = self.name_of(*elem_sym).to_string();
                    if !builtins::is_known_element(&elem_name) {
                        return Err(Diagnostic::unknown_element(elem_name, span));
                    }
                    Ok(())
                }
                _ => Err(Diagnostic::predicate_element_expected_string_argument(span)),
            };
        }

        if args.len() != sig.args.len() {
            return Err(Diagnostic::predicate_wrong_arity(name, sig.args.len(), args.len(), span));
        }

        let arg_types: Vec<Type> = args.iter().map(|a| self.check_expr(a)).collect::<Result<_>>()?;

        match name.as_str() {
            "near" => {
                for ty in arg_types[..2].iter() {
                    if *ty != Type::Atom && *ty != Type::Bond {
                        return Err(Diagnostic::incompatible_argument_type(
                            name.clone(),
                            ty.clone(),
                            Type::Atom,
                            span,
                        ));
                    }
                }
                if arg_types[2] != Type::Int && arg_types[2] != Type::Float {
                    return Err(Diagnostic::predicate_near_expected_numeric_argument(span));
                }
            }
            "bonded" => {
                for (got, expected) in arg_types.iter().zip(sig.args.iter()) {
                    if got != expected {
                        return Err(Diagnostic::incompatible_argument_type(
                            name.clone(),
                            got.clone(),
                            expected.clone(),
                            span,
                        ));
                    }
                }
                if let (Expr::Name(a, _), Expr::Name(b, _)) = (args[0], args[1]) {
                    self.bonded_pairs.push((*a, *b));
                }
            }
            _ => {
                for (got, expected) in arg_types.iter().zip(sig.args.iter()) {
                    if got != expected {
                        return Err(Diagnostic::incompatible_argument_type(
                            name.clone(),
                            got.clone(),
                            expected.clone(),
                            span,
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{SymbolClass, SymbolRecord};
    use ccl_base::{Interner, Span};

    #[test]
    fn unknown_predicate_is_rejected() {
        let mut interner = Interner::new();
        let mut checker = Checker::new(&interner);
        let love = interner.intern("love");
        let args: &[&Expr<'_>] = &[];
        let c = Constraint::Predicate(love, args, Span::default());
        let err = checker.check_constraint(&c).unwrap_err();
        assert_eq!(err.to_string(), "Predicate love not defined.");
    }

    #[test]
    fn near_wrong_arity_is_rejected() {
        let mut interner = Interner::new();
        let mut checker = Checker::new(&interner);
        let near = interner.intern("near");
        let i = interner.intern("i");
        checker
            .scopes
            .bind(SymbolRecord::new(i, SymbolClass::ObjectVariable, Type::Atom, Span::default()));
        checker.bound_objects.insert(i);
        let name_expr = Expr::Name(i, Span::default());
        let args: &[&Expr<'_>] = &[&name_expr];
        let c = Constraint::Predicate(near, args, Span::default());
        let err = checker.check_constraint(&c).unwrap_err();
        assert_eq!(err.to_string(), "Predicate near should have 3 arguments but got 1 instead.");
    }

    #[test]
    fn element_with_unknown_element_name() {
        let mut interner = Interner::new();
        let mut checker = Checker::new(&interner);
        let element = interner.intern("element");
        let i = interner.intern("i");
        let adamantine = interner.intern("adamantine");
        checker
            .scopes
            .bind(SymbolRecord::new(i, SymbolClass::ObjectVariable, Type::Atom, Span::default()));
        checker.bound_objects.insert(i);
        let i_expr = Expr::Name(i, Span::default());
        let elem_expr = Expr::Name(adamantine, Span::default());
        let args: &[&Expr<'_>] = &[&i_expr, &elem_expr];
        let c = Constraint::Predicate(element, args, Span::default());
        let err = checker.check_constraint(&c).unwrap_err();
        assert_eq!(err.to_string(), "Unknown element adamantine.");
    }
}

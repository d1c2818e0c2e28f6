//! Annotation resolver: builds the global scope from the `where` block.
//!
//! Processed strictly in source order — an annotation may only see names
//! installed by annotations that precede it. Substitution clauses are the
//! one shape that accumulates state across possibly-non-adjacent
//! annotations of the same name; [`SubstitutionInfo`] tracks that state and
//! the whole group is checked for completeness once the block ends.
//!
//! A substitution formal's index kind is inferred from how it is used inside
//! the clause's own `rhs`/constraint, the same way a subscript expression's
//! index kind is derived from what it subscripts: a formal forced to `Atom`
//! by an `element`/`bonded` predicate, or one used as a subscript index whose
//! position expects a particular kind, takes that kind. A formal with no
//! such evidence anywhere in the clause defaults to `Atom`.

use std::collections::HashMap;

use ccl_base::{Span, Symbol};

use crate::ast::{Annotation, Constraint, Expr, ParamCategory, SubstitutionClause};
use crate::builtins;
use crate::diagnostic::{Diagnostic, Result};
use crate::symbol::{SymbolClass, SymbolRecord};
use crate::types::{IndexKind, Type};

use super::Checker;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SubstState {
    Undeclared,
    DeclaredPartial,
    Complete,
}

/// Accumulated state for one substitution name across all of its clauses.
pub struct SubstitutionInfo {
    pub first_span: Span,
    pub index_kinds: Option<Vec<IndexKind>>,
    pub result_ty: Option<Type>,
    state: SubstState,
    seen_constraints: Vec<String>,
}

impl SubstitutionInfo {
    fn new(span: Span) -> Self {
        Self {
            first_span: span,
            index_kinds: None,
            result_ty: None,
            state: SubstState::Undeclared,
            seen_constraints: Vec::new(),
        }
    }
}

pub fn resolve(checker: &mut Checker<'_>, annotations: &[Annotation<'_>]) -> Result<()> {
    for annotation in annotations {
        match annotation {
            Annotation::Parameter { name, category, span } => {
                resolve_parameter(checker, *name, *category, *span)?;
            }
            Annotation::Object { name, kind, constraint: _, decomposition, span } => {
                resolve_object(checker, *name, *kind, *decomposition, *span)?;
            }
            Annotation::Property { name, property, span } => {
                resolve_property(checker, *name, *property, *span)?;
            }
            Annotation::Constant { name, property, element, span } => {
                resolve_constant(checker, *name, *property, *element, *span)?;
            }
            Annotation::Substitution(clause) => {
                resolve_substitution_clause(checker, clause)?;
            }
        }
    }
    finish_substitutions(checker)
}

fn reject_if_defined(checker: &Checker<'_>, name: Symbol, span: Span) -> Result<()> {
    if checker.scopes.is_defined(name) {
        return Err(Diagnostic::symbol_already_defined(checker.name_of(name), span));
    }
    Ok(())
}

fn resolve_parameter(checker: &mut Checker<'_>, name: Symbol, category: ParamCategory, span: Span) -> Result<()> {
    reject_if_defined(checker, name, span)?;
    let ty = match category {
        ParamCategory::Atom => Type::AtomParameter,
        ParamCategory::Bond => Type::BondParameter,
        ParamCategory::Common => Type::CommonParameter,
    };
    checker.scopes.bind_global(SymbolRecord::new(name, SymbolClass::Parameter, ty, span));
    Ok(())
}

fn resolve_object(
    checker: &mut Checker<'_>,
    name: Symbol,
    kind: crate::ast::ObjectKind,
    decomposition: Option<(Symbol, Symbol)>,
    span: Span,
) -> Result<()> {
    reject_if_defined(checker, name, span)?;
    let ty = match kind {
        crate::ast::ObjectKind::Atom => Type::Atom,
        crate::ast::ObjectKind::Bond => Type::Bond,
    };
    checker.scopes.bind_global(SymbolRecord::new(name, SymbolClass::ObjectVariable, ty, span));

    if let Some((i, j)) = decomposition {
        if checker.scopes.is_defined(i) || checker.scopes.is_defined(j) {
            return Err(Diagnostic::decomposition_used_already_defined_names(checker.name_of(name), span));
        }
        checker
            .scopes
            .bind_global(SymbolRecord::new(i, SymbolClass::ObjectVariable, Type::Atom, span));
        checker
            .scopes
            .bind_global(SymbolRecord::new(j, SymbolClass::ObjectVariable, Type::Atom, span));
        checker.bonded_pairs.push((i, j));
    }
    Ok(())
}

fn resolve_property(
    checker: &mut Checker<'_>,
    name: Symbol,
    property: crate::ast::PropertyKind,
    span: Span,
) -> Result<()> {
    reject_if_defined(checker, name, span)?;
    let sig = builtins::property_signature(property);
    let args = sig
        .indices
        .iter()
        .map(|k| match k {
            IndexKind::Atom => Type::Atom,
            IndexKind::Bond => Type::Bond,
        })
        .collect();
    let result = match sig.result {
        builtins::PropertyResult::Float => Type::Float,
        builtins::PropertyResult::Bool => Type::Bool,
    };
    let ty = Type::Function(args, Box::new(result));
    checker.scopes.bind_global(SymbolRecord::new(name, SymbolClass::Property, ty, span));
    Ok(())
}

fn resolve_constant(
    checker: &mut Checker<'_>,
    name: Symbol,
    _property: crate::ast::PropertyKind,
    element: Symbol,
    span: Span,
) -> Result<()> {
    reject_if_defined(checker, name, span)?;
    let element_name = checker.name_of(element).to_string();
    if !builtins::is_known_element(&element_name) {
        return Err(Diagnostic::element_not_known(element_name, span));
    }
    checker.scopes.bind_global(SymbolRecord::new(name, SymbolClass::Constant, Type::Float, span));
    Ok(())
}

fn resolve_substitution_clause(checker: &mut Checker<'_>, clause: &SubstitutionClause<'_>) -> Result<()> {
    let name = clause.name;

    if !checker.substitutions.contains_key(&name) {
        if let Some(existing) = checker.scopes.lookup(name) {
            if existing.class != SymbolClass::Substitution {
                return Err(Diagnostic::symbol_already_defined_as_something_else(
                    checker.name_of(name),
                    clause.span,
                ));
            }
        }
        checker.substitutions.insert(name, SubstitutionInfo::new(clause.span));
        checker.scopes.bind_global(SymbolRecord::new(
            name,
            SymbolClass::Substitution,
            Type::Substitution(Box::new(Type::Bool), Vec::new()),
            clause.span,
        ));
    }

    if clause.formals.is_empty() && clause.constraint.is_some() {
        return Err(Diagnostic::substitution_cannot_have_constraint(checker.name_of(name), clause.span));
    }

    reject_nested_substitution(checker, name, clause.rhs)?;

    let kinds = infer_formal_kinds(checker, clause.formals, clause.rhs, clause.constraint);
    {
        let info = checker.substitutions.get(&name).expect("just inserted");
        if let Some(existing) = &info.index_kinds {
            if *existing != kinds {
                return Err(Diagnostic::substitution_different_indices(checker.name_of(name), clause.span));
            }
        }
    }
    checker.substitutions.get_mut(&name).unwrap().index_kinds = Some(kinds.clone());

    checker.scopes.push_scope();
    for (&formal, kind) in clause.formals.iter().zip(kinds.iter()) {
        let ty = match kind {
            IndexKind::Atom => Type::Atom,
            IndexKind::Bond => Type::Bond,
        };
        checker.scopes.bind(SymbolRecord::new(formal, SymbolClass::ObjectVariable, ty, clause.span));
        checker.bound_objects.insert(formal);
    }

    let body_result = (|| -> Result<Type> {
        if let Some(c) = clause.constraint {
            checker.check_constraint(c)?;
        }
        checker.check_expr(clause.rhs)
    })();

    for &formal in clause.formals {
        checker.bound_objects.remove(&formal);
    }
    checker.scopes.pop_scope();
    let rhs_ty = body_result?;

    let existing_result = checker.substitutions.get(&name).unwrap().result_ty.clone();
    let new_result_ty = match existing_result {
        None => rhs_ty,
        Some(existing) => Type::unify_element(&existing, &rhs_ty).ok_or_else(|| {
            Diagnostic::substitution_clauses_disagree_on_type(checker.name_of(name), clause.span)
        })?,
    };
    checker.substitutions.get_mut(&name).unwrap().result_ty = Some(new_result_ty);

    if let Some(constraint) = clause.constraint {
        let fingerprint = structural_fingerprint_constraint(checker, constraint);
        let info = checker.substitutions.get_mut(&name).unwrap();
        if info.seen_constraints.contains(&fingerprint) {
            return Err(Diagnostic::same_constraint_already_defined(checker.name_of(name), clause.span));
        }
        info.seen_constraints.push(fingerprint);
        if info.state != SubstState::Complete {
            info.state = SubstState::DeclaredPartial;
        }
    } else {
        checker.substitutions.get_mut(&name).unwrap().state = SubstState::Complete;
    }

    let info = checker.substitutions.get(&name).unwrap();
    let final_ty = Type::Substitution(
        Box::new(info.result_ty.clone().unwrap_or(Type::Bool)),
        info.index_kinds.clone().unwrap_or_default(),
    );
    checker
        .scopes
        .bind_global(SymbolRecord::new(name, SymbolClass::Substitution, final_ty, clause.span));

    Ok(())
}

fn reject_nested_substitution(checker: &Checker<'_>, owner: Symbol, expr: &Expr<'_>) -> Result<()> {
    match expr {
        Expr::Name(sym, span) | Expr::Subscript(sym, _, span) => {
            if let Some(record) = checker.scopes.lookup(*sym) {
                if record.class == SymbolClass::Substitution && *sym != owner {
                    return Err(Diagnostic::cannot_nest_substitution(
                        checker.name_of(*sym),
                        checker.name_of(owner),
                        *span,
                    ));
                }
            }
            if let Expr::Subscript(_, args, _) = expr {
                for a in *args {
                    reject_nested_substitution(checker, owner, a)?;
                }
            }
            Ok(())
        }
        Expr::Unary(_, inner, _) => reject_nested_substitution(checker, owner, inner),
        Expr::Binary(_, l, r, _) => {
            reject_nested_substitution(checker, owner, l)?;
            reject_nested_substitution(checker, owner, r)
        }
        Expr::Call(_, args, _) => {
            for a in *args {
                reject_nested_substitution(checker, owner, a)?;
            }
            Ok(())
        }
        Expr::Sum(_, body, _) => reject_nested_substitution(checker, owner, body),
        Expr::Ee { diag, off, rhs, .. } => {
            reject_nested_substitution(checker, owner, diag)?;
            reject_nested_substitution(checker, owner, off)?;
            reject_nested_substitution(checker, owner, rhs)
        }
        Expr::Int(_, _) | Expr::Float(_, _) => Ok(()),
    }
}

/// Infers each formal's index kind from its usage inside `rhs`/`constraint`,
/// falling back to `Atom` for a formal with no determining usage.
fn infer_formal_kinds(
    checker: &Checker<'_>,
    formals: &[Symbol],
    rhs: &Expr<'_>,
    constraint: Option<&Constraint<'_>>,
) -> Vec<IndexKind> {
    let mut found: HashMap<Symbol, IndexKind> = HashMap::new();
    if let Some(c) = constraint {
        collect_kinds_from_constraint(checker, c, &mut found);
    }
    collect_kinds_from_expr(checker, rhs, &mut found);
    formals.iter().map(|f| found.get(f).copied().unwrap_or(IndexKind::Atom)).collect()
}

fn name_of_expr(expr: &Expr<'_>) -> Option<Symbol> {
    match expr {
        Expr::Name(sym, _) => Some(*sym),
        _ => None,
    }
}

fn collect_kinds_from_constraint(checker: &Checker<'_>, c: &Constraint<'_>, found: &mut HashMap<Symbol, IndexKind>) {
    match c {
        Constraint::And(l, r, _) | Constraint::Or(l, r, _) => {
            collect_kinds_from_constraint(checker, l, found);
            collect_kinds_from_constraint(checker, r, found);
        }
        Constraint::Not(inner, _) => collect_kinds_from_constraint(checker, inner, found),
        Constraint::Compare(_, l, r, _) => {
            collect_kinds_from_expr(checker, l, found);
            collect_kinds_from_expr(checker, r, found);
        }
        Constraint::Predicate(sym, args, _) => {
            let name = checker.name_of(*sym);
            if name == "element" || name == "bonded" {
                for a in args.iter().take(2) {
                    if let Some(s) = name_of_expr(a) {
                        found.entry(s).or_insert(IndexKind::Atom);
                    }
                }
            }
            for a in *args {
                collect_kinds_from_expr(checker, a, found);
            }
        }
    }
}

/// Walks an expression tree looking for subscript sites where one of the
/// indices is a bare name: the index kind the subscripted symbol expects at
/// that position becomes the evidence for that name's kind.
fn collect_kinds_from_expr(checker: &Checker<'_>, e: &Expr<'_>, found: &mut HashMap<Symbol, IndexKind>) {
    match e {
        Expr::Int(_, _) | Expr::Float(_, _) | Expr::Name(_, _) => {}
        Expr::Subscript(sym, indices, _) => {
            if let Some(record) = checker.scopes.lookup(*sym) {
                let expected: Option<Vec<IndexKind>> = match &record.ty {
                    Type::Array(_, dims) => Some(dims.clone()),
                    Type::AtomParameter => Some(vec![IndexKind::Atom]),
                    Type::BondParameter if indices.len() == 1 => Some(vec![IndexKind::Bond]),
                    Type::BondParameter => Some(vec![IndexKind::Atom, IndexKind::Atom]),
                    Type::Substitution(_, dims) => Some(dims.clone()),
                    _ => None,
                };
                if let Some(expected) = expected {
                    for (idx, kind) in indices.iter().zip(expected.iter()) {
                        if let Some(s) = name_of_expr(idx) {
                            found.entry(s).or_insert(*kind);
                        }
                    }
                }
            }
            for idx in *indices {
                collect_kinds_from_expr(checker, idx, found);
            }
        }
        Expr::Unary(_, inner, _) => collect_kinds_from_expr(checker, inner, found),
        Expr::Binary(_, l, r, _) => {
            collect_kinds_from_expr(checker, l, found);
            collect_kinds_from_expr(checker, r, found);
        }
        Expr::Call(_, args, _) => {
            for a in *args {
                collect_kinds_from_expr(checker, a, found);
            }
        }
        Expr::Sum(_, body, _) => collect_kinds_from_expr(checker, body, found),
        Expr::Ee { diag, off, rhs, .. } => {
            collect_kinds_from_expr(checker, diag, found);
            collect_kinds_from_expr(checker, off, found);
            collect_kinds_from_expr(checker, rhs, found);
        }
    }
}

fn finish_substitutions(checker: &mut Checker<'_>) -> Result<()> {
    let mut names: Vec<Symbol> = checker.substitutions.keys().copied().collect();
    names.sort_by_key(|s| s.index());
    for name in names {
        let info = checker.substitutions.get(&name).unwrap();
        let needs_default = !info.seen_constraints.is_empty();
        if needs_default && info.state != SubstState::Complete {
            return Err(Diagnostic::no_default_for_substitution(checker.name_of(name), info.first_span));
        }
    }
    Ok(())
}

/// A structural fingerprint of a constraint tree, ignoring spans, used to
/// detect a literally-duplicated constraint on the same substitution name.
fn structural_fingerprint_constraint(checker: &Checker<'_>, c: &Constraint<'_>) -> String {
    match c {
        Constraint::And(l, r, _) => format!(
            "and({},{})",
            structural_fingerprint_constraint(checker, l),
            structural_fingerprint_constraint(checker, r)
        ),
        Constraint::Or(l, r, _) => format!(
            "or({},{})",
            structural_fingerprint_constraint(checker, l),
            structural_fingerprint_constraint(checker, r)
        ),
        Constraint::Not(inner, _) => format!("not({})", structural_fingerprint_constraint(checker, inner)),
        Constraint::Compare(op, l, r, _) => format!(
            "cmp({:?},{},{})",
            op,
            structural_fingerprint_expr(checker, l),
            structural_fingerprint_expr(checker, r)
        ),
        Constraint::Predicate(sym, args, _) => format!(
            "pred({},{})",
            checker.name_of(*sym),
            args.iter()
                .map(|a| structural_fingerprint_expr(checker, a))
                .collect::<Vec<_>>()
                .join(",")
        ),
    }
}

fn structural_fingerprint_expr(checker: &Checker<'_>, e: &Expr<'_>) -> String {
    match e {
        Expr::Int(v, _) => format!("int({v})"),
        Expr::Float(v, _) => format!("float({v})"),
        Expr::Name(sym, _) => format!("name({})", checker.name_of(*sym)),
        Expr::Subscript(sym, args, _) => format!(
            "sub({},{})",
            checker.name_of(*sym),
            args.iter()
                .map(|a| structural_fingerprint_expr(checker, a))
                .collect::<Vec<_>>()
                .join(",")
        ),
        Expr::Unary(op, inner, _) => format!("unary({:?},{})", op, structural_fingerprint_expr(checker, inner)),
        Expr::Binary(op, l, r, _) => format!(
            "bin({:?},{},{})",
            op,
            structural_fingerprint_expr(checker, l),
            structural_fingerprint_expr(checker, r)
        ),
        Expr::Call(sym, args, _) => format!(
            "call({},{})",
            checker.name_of(*sym),
            args.iter()
                .map(|a| structural_fingerprint_expr(checker, a))
                .collect::<Vec<_>>()
                .join(",")
        ),
        Expr::Sum(sym, body, _) => format!("sum({},{})", checker.name_of(*sym), structural_fingerprint_expr(checker, body)),
        Expr::Ee { i, j, diag, off, rhs, .. } => format!(
            "ee({},{},{},{},{})",
            checker.name_of(*i),
            checker.name_of(*j),
            structural_fingerprint_expr(checker, diag),
            structural_fingerprint_expr(checker, off),
            structural_fingerprint_expr(checker, rhs)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccl_base::Interner;

    #[test]
    fn duplicate_object_annotation_is_rejected() {
        let mut interner = Interner::new();
        let mut checker = Checker::new(&interner);
        let a = interner.intern("a");
        let annotations = [
            Annotation::Object {
                name: a,
                kind: crate::ast::ObjectKind::Atom,
                constraint: None,
                decomposition: None,
                span: Span::default(),
            },
            Annotation::Object {
                name: a,
                kind: crate::ast::ObjectKind::Bond,
                constraint: None,
                decomposition: None,
                span: Span::default(),
            },
        ];
        let err = resolve(&mut checker, &annotations).unwrap_err();
        assert_eq!(err.to_string(), "Symbol a already defined.");
    }

    #[test]
    fn substitution_without_default_is_rejected() {
        let mut interner = Interner::new();
        let mut checker = Checker::new(&interner);
        let d = interner.intern("d");
        let i = interner.intern("i");
        let element = interner.intern("element");
        let hydrogen = interner.intern("hydrogen");
        checker
            .scopes
            .bind_global(SymbolRecord::new(element, SymbolClass::Property, Type::Bool, Span::default()));

        let i_name = Expr::Name(i, Span::default());
        let hydrogen_name = Expr::Name(hydrogen, Span::default());
        let pred_args: &[&Expr<'_>] = &[&i_name, &hydrogen_name];
        let pred = Constraint::Predicate(element, pred_args, Span::default());
        let one = Expr::Int(1, Span::default());
        let formals = [i];
        let clause = SubstitutionClause {
            name: d,
            formals: &formals,
            rhs: &one,
            constraint: Some(&pred),
            span: Span::default(),
        };
        let annotations = [Annotation::Substitution(clause)];
        let err = resolve(&mut checker, &annotations).unwrap_err();
        assert_eq!(err.to_string(), "No default option specified for Substitution symbol d.");
    }

    #[test]
    fn constant_with_unknown_element_is_rejected() {
        let mut interner = Interner::new();
        let mut checker = Checker::new(&interner);
        let en = interner.intern("en_h");
        let adamantine = interner.intern("adamantine");
        let annotations = [Annotation::Constant {
            name: en,
            property: crate::ast::PropertyKind::Electronegativity,
            element: adamantine,
            span: Span::default(),
        }];
        let err = resolve(&mut checker, &annotations).unwrap_err();
        assert_eq!(err.to_string(), "Element adamantine not known.");
    }
}

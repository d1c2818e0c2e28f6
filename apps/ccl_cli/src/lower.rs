//! Lowers a [`crate::surface`] tree into the analyser's arena/`Symbol`-based
//! `ast::Program`, interning every name exactly once along the way.

use std::fmt;

use ccl_base::{Arena, Interner, Span, Symbol};
use ccl_analysis::ast;

use crate::surface;

/// One arena per node type, since [`Arena<T>`] is monomorphic. All share a
/// single lifetime, tied to the `Program` produced from them.
#[derive(Default)]
pub struct Arenas<'a> {
    exprs: Arena<ast::Expr<'a>>,
    expr_refs: Arena<&'a ast::Expr<'a>>,
    constraints: Arena<ast::Constraint<'a>>,
    stmts: Arena<ast::Stmt<'a>>,
    annotations: Arena<ast::Annotation<'a>>,
    symbols: Arena<Symbol>,
}

/// An unrecognized tag in the surface tree. Serde only validates the shape
/// of each node, not the closed set of values a tagged field is allowed to
/// hold, so a misspelled or unsupported tag (`"bondd"`, `"electronegtivity"`)
/// surfaces only here, at lowering, rather than being silently reinterpreted
/// as some other node.
#[derive(Debug)]
pub struct LowerError(String);

impl fmt::Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for LowerError {}

type Result<T> = std::result::Result<T, LowerError>;

fn unknown_tag(field: &str, got: &str) -> LowerError {
    LowerError(format!("unrecognized {field} {got:?}"))
}

pub fn lower<'a>(
    arenas: &'a Arenas<'a>,
    interner: &mut Interner,
    program: &surface::Program,
) -> Result<ast::Program<'a>> {
    let body: Vec<ast::Stmt<'a>> = program
        .body
        .iter()
        .map(|s| lower_stmt(arenas, interner, s))
        .collect::<Result<_>>()?;
    let annotations: Vec<ast::Annotation<'a>> = program
        .annotations
        .iter()
        .map(|a| lower_annotation(arenas, interner, a))
        .collect::<Result<_>>()?;
    Ok(ast::Program {
        body: arenas.stmts.alloc_slice(body),
        annotations: arenas.annotations.alloc_slice(annotations),
    })
}

fn lower_expr<'a>(arenas: &'a Arenas<'a>, interner: &mut Interner, e: &surface::Expr) -> Result<&'a ast::Expr<'a>> {
    let node = match e {
        surface::Expr::Int { value } => ast::Expr::Int(*value, Span::default()),
        surface::Expr::Float { value } => ast::Expr::Float(*value, Span::default()),
        surface::Expr::Name { name } => ast::Expr::Name(interner.intern(name), Span::default()),
        surface::Expr::Subscript { name, indices } => {
            let lowered = lower_expr_refs(arenas, interner, indices)?;
            ast::Expr::Subscript(interner.intern(name), lowered, Span::default())
        }
        surface::Expr::Unary { op, operand } => {
            let op = lower_unary_op(op)?;
            let operand = lower_expr(arenas, interner, operand)?;
            ast::Expr::Unary(op, operand, Span::default())
        }
        surface::Expr::Binary { op, lhs, rhs } => {
            let op = lower_binary_op(op)?;
            let lhs = lower_expr(arenas, interner, lhs)?;
            let rhs = lower_expr(arenas, interner, rhs)?;
            ast::Expr::Binary(op, lhs, rhs, Span::default())
        }
        surface::Expr::Call { name, args } => {
            let args = lower_expr_refs(arenas, interner, args)?;
            ast::Expr::Call(interner.intern(name), args, Span::default())
        }
        surface::Expr::Sum { iter, body } => {
            let body = lower_expr(arenas, interner, body)?;
            ast::Expr::Sum(interner.intern(iter), body, Span::default())
        }
        surface::Expr::Ee { i, j, diag, off, rhs } => ast::Expr::Ee {
            i: interner.intern(i),
            j: interner.intern(j),
            diag: lower_expr(arenas, interner, diag)?,
            off: lower_expr(arenas, interner, off)?,
            rhs: lower_expr(arenas, interner, rhs)?,
            span: Span::default(),
        },
    };
    Ok(arenas.exprs.alloc(node))
}

fn lower_expr_refs<'a>(
    arenas: &'a Arenas<'a>,
    interner: &mut Interner,
    exprs: &[surface::Expr],
) -> Result<&'a [&'a ast::Expr<'a>]> {
    let lowered: Vec<&'a ast::Expr<'a>> =
        exprs.iter().map(|e| lower_expr(arenas, interner, e)).collect::<Result<_>>()?;
    Ok(arenas.expr_refs.alloc_slice(lowered))
}

fn lower_constraint<'a>(
    arenas: &'a Arenas<'a>,
    interner: &mut Interner,
    c: &surface::Constraint,
) -> Result<&'a ast::Constraint<'a>> {
    let node = match c {
        surface::Constraint::And { lhs, rhs } => {
            let lhs = lower_constraint(arenas, interner, lhs)?;
            let rhs = lower_constraint(arenas, interner, rhs)?;
            ast::Constraint::And(lhs, rhs, Span::default())
        }
        surface::Constraint::Or { lhs, rhs } => {
            let lhs = lower_constraint(arenas, interner, lhs)?;
            let rhs = lower_constraint(arenas, interner, rhs)?;
            ast::Constraint::Or(lhs, rhs, Span::default())
        }
        surface::Constraint::Not { inner } => {
            let inner = lower_constraint(arenas, interner, inner)?;
            ast::Constraint::Not(inner, Span::default())
        }
        surface::Constraint::Compare { op, lhs, rhs } => {
            let op = lower_compare_op(op)?;
            let lhs = lower_expr(arenas, interner, lhs)?;
            let rhs = lower_expr(arenas, interner, rhs)?;
            ast::Constraint::Compare(op, lhs, rhs, Span::default())
        }
        surface::Constraint::Predicate { name, args } => {
            let args = lower_expr_refs(arenas, interner, args)?;
            ast::Constraint::Predicate(interner.intern(name), args, Span::default())
        }
    };
    Ok(arenas.constraints.alloc(node))
}

fn lower_lvalue<'a>(arenas: &'a Arenas<'a>, interner: &mut Interner, lv: &surface::LValue) -> Result<ast::LValue<'a>> {
    Ok(match lv {
        surface::LValue::Name { name } => ast::LValue::Name(interner.intern(name), Span::default()),
        surface::LValue::Index { name, indices } => {
            let indices = lower_expr_refs(arenas, interner, indices)?;
            ast::LValue::Index(interner.intern(name), indices, Span::default())
        }
    })
}

fn lower_stmt<'a>(arenas: &'a Arenas<'a>, interner: &mut Interner, s: &surface::Stmt) -> Result<ast::Stmt<'a>> {
    Ok(match s {
        surface::Stmt::Assign { lhs, rhs } => ast::Stmt::Assign {
            lhs: lower_lvalue(arenas, interner, lhs)?,
            rhs: lower_expr(arenas, interner, rhs)?,
            span: Span::default(),
        },
        surface::Stmt::For { var, lo, hi, body } => {
            let lo = lower_expr(arenas, interner, lo)?;
            let hi = lower_expr(arenas, interner, hi)?;
            let lowered_body: Vec<ast::Stmt<'a>> =
                body.iter().map(|s| lower_stmt(arenas, interner, s)).collect::<Result<_>>()?;
            ast::Stmt::For {
                var: interner.intern(var),
                lo,
                hi,
                body: arenas.stmts.alloc_slice(lowered_body),
                span: Span::default(),
            }
        }
        surface::Stmt::ForEach { object_kind, name, decomposition, constraint, body } => {
            let kind = lower_object_kind(object_kind)?;
            let constraint = constraint.as_ref().map(|c| lower_constraint(arenas, interner, c)).transpose()?;
            let lowered_body: Vec<ast::Stmt<'a>> =
                body.iter().map(|s| lower_stmt(arenas, interner, s)).collect::<Result<_>>()?;
            ast::Stmt::ForEach {
                kind,
                name: interner.intern(name),
                decomposition: decomposition
                    .as_ref()
                    .map(|(i, j)| (interner.intern(i), interner.intern(j))),
                constraint,
                body: arenas.stmts.alloc_slice(lowered_body),
                span: Span::default(),
            }
        }
    })
}

fn lower_annotation<'a>(
    arenas: &'a Arenas<'a>,
    interner: &mut Interner,
    a: &surface::Annotation,
) -> Result<ast::Annotation<'a>> {
    Ok(match a {
        surface::Annotation::Parameter { name, category } => ast::Annotation::Parameter {
            name: interner.intern(name),
            category: lower_param_category(category)?,
            span: Span::default(),
        },
        surface::Annotation::Object { name, object_kind, constraint, decomposition } => {
            let kind = lower_object_kind(object_kind)?;
            let constraint = constraint.as_ref().map(|c| lower_constraint(arenas, interner, c)).transpose()?;
            ast::Annotation::Object {
                name: interner.intern(name),
                kind,
                constraint,
                decomposition: decomposition
                    .as_ref()
                    .map(|(i, j)| (interner.intern(i), interner.intern(j))),
                span: Span::default(),
            }
        }
        surface::Annotation::Property { name, property } => ast::Annotation::Property {
            name: interner.intern(name),
            property: lower_property_kind(property)?,
            span: Span::default(),
        },
        surface::Annotation::Constant { name, property, element } => ast::Annotation::Constant {
            name: interner.intern(name),
            property: lower_property_kind(property)?,
            element: interner.intern(element),
            span: Span::default(),
        },
        surface::Annotation::Substitution(clause) => {
            let formals: Vec<Symbol> = clause.formals.iter().map(|f| interner.intern(f)).collect();
            let rhs = lower_expr(arenas, interner, &clause.rhs)?;
            let constraint = clause
                .constraint
                .as_ref()
                .map(|c| lower_constraint(arenas, interner, c))
                .transpose()?;
            ast::Annotation::Substitution(ast::SubstitutionClause {
                name: interner.intern(&clause.name),
                formals: arenas.symbols.alloc_slice(formals),
                rhs,
                constraint,
                span: Span::default(),
            })
        }
    })
}

fn lower_object_kind(s: &str) -> Result<ast::ObjectKind> {
    match s {
        "atom" => Ok(ast::ObjectKind::Atom),
        "bond" => Ok(ast::ObjectKind::Bond),
        other => Err(unknown_tag("object kind", other)),
    }
}

fn lower_param_category(s: &str) -> Result<ast::ParamCategory> {
    match s {
        "atom" => Ok(ast::ParamCategory::Atom),
        "bond" => Ok(ast::ParamCategory::Bond),
        "common" => Ok(ast::ParamCategory::Common),
        other => Err(unknown_tag("parameter category", other)),
    }
}

fn lower_property_kind(s: &str) -> Result<ast::PropertyKind> {
    ast::PropertyKind::from_words(s).ok_or_else(|| unknown_tag("property", s))
}

fn lower_unary_op(s: &str) -> Result<ast::UnaryOp> {
    match s {
        "+" => Ok(ast::UnaryOp::Plus),
        "-" => Ok(ast::UnaryOp::Minus),
        other => Err(unknown_tag("unary operator", other)),
    }
}

fn lower_binary_op(s: &str) -> Result<ast::BinaryOp> {
    match s {
        "+" => Ok(ast::BinaryOp::Add),
        "-" => Ok(ast::BinaryOp::Sub),
        "*" => Ok(ast::BinaryOp::Mul),
        "/" => Ok(ast::BinaryOp::Div),
        "^" => Ok(ast::BinaryOp::Pow),
        other => Err(unknown_tag("binary operator", other)),
    }
}

fn lower_compare_op(s: &str) -> Result<ast::CompareOp> {
    match s {
        "<" => Ok(ast::CompareOp::Lt),
        ">" => Ok(ast::CompareOp::Gt),
        "<=" => Ok(ast::CompareOp::Le),
        ">=" => Ok(ast::CompareOp::Ge),
        "==" => Ok(ast::CompareOp::Eq),
        "!=" => Ok(ast::CompareOp::Ne),
        other => Err(unknown_tag("compare operator", other)),
    }
}

//! The JSON surface tree this driver accepts on its command line.
//!
//! The real lexer and parser for CCL's concrete syntax are out of scope for
//! this repository (see the crate-level docs); this is a stand-in input
//! format that carries the same shape the parser would hand the analyser —
//! owned, `String`-keyed, with no interning or arena allocation of its own.
//! [`crate::lower`] turns it into the analyser's actual `ast::Program`.

use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub annotations: Vec<Annotation>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Int { value: i64 },
    Float { value: f64 },
    Name { name: String },
    Subscript { name: String, indices: Vec<Expr> },
    Unary { op: String, operand: Box<Expr> },
    Binary { op: String, lhs: Box<Expr>, rhs: Box<Expr> },
    Call { name: String, args: Vec<Expr> },
    Sum { iter: String, body: Box<Expr> },
    Ee { i: String, j: String, diag: Box<Expr>, off: Box<Expr>, rhs: Box<Expr> },
}

#[derive(Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    And { lhs: Box<Constraint>, rhs: Box<Constraint> },
    Or { lhs: Box<Constraint>, rhs: Box<Constraint> },
    Not { inner: Box<Constraint> },
    Compare { op: String, lhs: Expr, rhs: Expr },
    Predicate { name: String, args: Vec<Expr> },
}

#[derive(Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LValue {
    Name { name: String },
    Index { name: String, indices: Vec<Expr> },
}

#[derive(Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    Assign {
        lhs: LValue,
        rhs: Expr,
    },
    For {
        var: String,
        lo: Expr,
        hi: Expr,
        body: Vec<Stmt>,
    },
    ForEach {
        object_kind: String,
        name: String,
        decomposition: Option<(String, String)>,
        constraint: Option<Constraint>,
        body: Vec<Stmt>,
    },
}

#[derive(Deserialize, Debug)]
pub struct SubstitutionClause {
    pub name: String,
    pub formals: Vec<String>,
    pub rhs: Expr,
    pub constraint: Option<Constraint>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    Parameter {
        name: String,
        category: String,
    },
    Object {
        name: String,
        object_kind: String,
        constraint: Option<Constraint>,
        decomposition: Option<(String, String)>,
    },
    Property {
        name: String,
        property: String,
    },
    Constant {
        name: String,
        property: String,
        element: String,
    },
    Substitution(SubstitutionClause),
}

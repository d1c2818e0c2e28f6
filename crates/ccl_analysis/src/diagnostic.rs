//! Diagnostics: the analyser's sole error currency.
//!
//! Every fallible function in this crate returns `Result<T, Diagnostic>` and
//! propagates failures with `?`, building the `Diagnostic` once at the point
//! of detection — the same discipline the base infrastructure's
//! [`ccl_base::SpannedError`] follows, but with a stricter contract:
//! `Display` must reproduce one of a fixed catalogue of sentences verbatim,
//! since that wording is the acceptance surface for the whole analyser.
//!
//! The `Span` is carried alongside the message for a caller that wants to
//! underline source text; it never appears in the displayed sentence itself.

use std::fmt;

use ccl_base::Span;

use crate::types::Type;

pub type Result<T> = std::result::Result<T, Diagnostic>;

/// A single analyser diagnostic: a fixed sentence plus the span of the
/// syntax that triggered it.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    kind: Kind,
    span: Span,
}

impl Diagnostic {
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    fn new(kind: Kind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn symbol_already_defined(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::SymbolAlreadyDefined { name: name.into() }, span)
    }

    pub fn symbol_already_defined_as_something_else(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::SymbolAlreadyDefinedAsSomethingElse { name: name.into() }, span)
    }

    pub fn loop_variable_already_defined(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::LoopVariableAlreadyDefined { name: name.into() }, span)
    }

    pub fn decomposition_used_already_defined_names(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::DecompositionUsedAlreadyDefinedNames { name: name.into() }, span)
    }

    pub fn symbol_not_defined(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::SymbolNotDefined { name: name.into() }, span)
    }

    pub fn object_not_bound_to_any_for_foreach_sum(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::ObjectNotBoundToAnyForForeachSum { name: name.into() }, span)
    }

    pub fn object_not_bound_to_foreach_or_sum(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::ObjectNotBoundToForeachOrSum { name: name.into() }, span)
    }

    pub fn property_not_known(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::PropertyNotKnown { name: name.into() }, span)
    }

    pub fn function_not_a_property(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::FunctionNotAProperty { name: name.into() }, span)
    }

    pub fn element_not_known(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::ElementNotKnown { name: name.into() }, span)
    }

    pub fn unknown_element(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::UnknownElement { name: name.into() }, span)
    }

    pub fn substitution_different_indices(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::SubstitutionDifferentIndices { name: name.into() }, span)
    }

    pub fn substitution_clauses_disagree_on_type(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::SubstitutionClausesDisagreeOnType { name: name.into() }, span)
    }

    pub fn no_default_for_substitution(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::NoDefaultForSubstitution { name: name.into() }, span)
    }

    pub fn same_constraint_already_defined(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::SameConstraintAlreadyDefined { name: name.into() }, span)
    }

    pub fn substitution_cannot_have_constraint(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::SubstitutionCannotHaveConstraint { name: name.into() }, span)
    }

    pub fn cannot_nest_substitution(inner: impl Into<String>, outer: impl Into<String>, span: Span) -> Self {
        Self::new(
            Kind::CannotNestSubstitution { inner: inner.into(), outer: outer.into() },
            span,
        )
    }

    pub fn cannot_assign_to_loop_variable(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::CannotAssignToLoopVariable { name: name.into() }, span)
    }

    pub fn cannot_assign_to_substitution(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::CannotAssignToSubstitution { name: name.into() }, span)
    }

    pub fn cannot_assign_to_symbol_class(noun: &'static str, name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::CannotAssignToSymbolClass { noun, name: name.into() }, span)
    }

    pub fn only_numbers_and_arrays_can_be_assigned(found: Type, span: Span) -> Self {
        Self::new(Kind::OnlyNumbersAndArraysCanBeAssigned { found }, span)
    }

    pub fn cannot_assign_mismatched_array(rhs: Type, name: impl Into<String>, existing: Type, span: Span) -> Self {
        Self::new(
            Kind::CannotAssignMismatchedArray { rhs, name: name.into(), existing },
            span,
        )
    }

    pub fn cannot_index_scalar(ty: Type, indices: Vec<Type>, span: Span) -> Self {
        Self::new(Kind::CannotIndexScalar { ty, indices }, span)
    }

    pub fn cannot_assign_non_array(ty: Type, span: Span) -> Self {
        Self::new(Kind::CannotAssignNonArray { ty }, span)
    }

    pub fn cannot_index_array(elem_ty: Type, given: Vec<Type>, span: Span) -> Self {
        Self::new(Kind::CannotIndexArray { elem_ty, given }, span)
    }

    pub fn cannot_index_common_parameter(span: Span) -> Self {
        Self::new(Kind::CannotIndexCommonParameter, span)
    }

    pub fn cannot_index_atom_parameter_with_bond(span: Span) -> Self {
        Self::new(Kind::CannotIndexAtomParameterWithBond, span)
    }

    pub fn cannot_index_bond_parameter_with_atom(span: Span) -> Self {
        Self::new(Kind::CannotIndexBondParameterWithAtom, span)
    }

    pub fn cannot_index_bond_parameter_by_non_bonded_atoms(span: Span) -> Self {
        Self::new(Kind::CannotIndexBondParameterByNonBondedAtoms, span)
    }

    pub fn bad_number_of_indices(name: impl Into<String>, got: usize, expected: usize, span: Span) -> Self {
        Self::new(Kind::BadNumberOfIndices { name: name.into(), got, expected }, span)
    }

    pub fn substitution_indices_must_be_atom_or_bond(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::SubstitutionIndicesMustBeAtomOrBond { name: name.into() }, span)
    }

    pub fn cannot_perform_non_mul_div_between_number_and_array(span: Span) -> Self {
        Self::new(Kind::CannotPerformNonMulDivBetweenNumberAndArray, span)
    }

    pub fn cannot_perform_div(a: Type, b: Type, span: Span) -> Self {
        Self::new(Kind::CannotPerformDiv { a, b }, span)
    }

    pub fn cannot_perform_op(op: &'static str, a: Type, b: Type, span: Span) -> Self {
        Self::new(Kind::CannotPerformOp { op, a, b }, span)
    }

    pub fn cannot_perform_unary_op(op: &'static str, ty: Type, span: Span) -> Self {
        Self::new(Kind::CannotPerformUnaryOp { op, ty }, span)
    }

    pub fn cannot_multiply_matrices(a: Type, b: Type, span: Span) -> Self {
        Self::new(Kind::CannotMultiplyMatrices { a, b }, span)
    }

    pub fn cannot_multiply_vector(a: Type, b: Type, span: Span) -> Self {
        Self::new(Kind::CannotMultiplyVector { a, b }, span)
    }

    pub fn cannot_perform_dot_product(a: Type, b: Type, span: Span) -> Self {
        Self::new(Kind::CannotPerformDotProduct { a, b }, span)
    }

    pub fn function_not_known(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::FunctionNotKnown { name: name.into() }, span)
    }

    pub fn incompatible_argument_type(name: impl Into<String>, got: Type, expected: Type, span: Span) -> Self {
        Self::new(
            Kind::IncompatibleArgumentType { name: name.into(), got, expected },
            span,
        )
    }

    pub fn sum_must_iterate_over_atom_or_bond(found: Type, span: Span) -> Self {
        Self::new(Kind::SumMustIterateOverAtomOrBond { found }, span)
    }

    pub fn ee_parts_must_be_float(span: Span) -> Self {
        Self::new(Kind::EePartsMustBeFloat, span)
    }

    pub fn ee_index_already_defined(span: Span) -> Self {
        Self::new(Kind::EeIndexAlreadyDefined, span)
    }

    pub fn predicate_not_defined(name: impl Into<String>, span: Span) -> Self {
        Self::new(Kind::PredicateNotDefined { name: name.into() }, span)
    }

    pub fn predicate_wrong_arity(name: impl Into<String>, expected: usize, got: usize, span: Span) -> Self {
        Self::new(
            Kind::PredicateWrongArity { name: name.into(), expected, got },
            span,
        )
    }

    pub fn predicate_element_argument_not_atom(span: Span) -> Self {
        Self::new(Kind::PredicateElementArgumentNotAtom, span)
    }

    pub fn predicate_element_expected_string_argument(span: Span) -> Self {
        Self::new(Kind::PredicateElementExpectedStringArgument, span)
    }

    pub fn predicate_near_expected_numeric_argument(span: Span) -> Self {
        Self::new(Kind::PredicateNearExpectedNumericArgument, span)
    }

    pub fn function_wrong_arity(name: impl Into<String>, expected: usize, got: usize, span: Span) -> Self {
        Self::new(
            Kind::FunctionWrongArity { name: name.into(), expected, got },
            span,
        )
    }
}

/// The fixed catalogue of diagnostic shapes. `Display` on [`Diagnostic`]
/// matches each to its exact sentence; wording is part of the contract and
/// must not drift.
#[derive(Debug, Clone)]
pub enum Kind {
    SymbolAlreadyDefined { name: String },
    SymbolAlreadyDefinedAsSomethingElse { name: String },
    LoopVariableAlreadyDefined { name: String },
    DecompositionUsedAlreadyDefinedNames { name: String },
    SymbolNotDefined { name: String },
    ObjectNotBoundToAnyForForeachSum { name: String },
    ObjectNotBoundToForeachOrSum { name: String },
    PropertyNotKnown { name: String },
    FunctionNotAProperty { name: String },
    ElementNotKnown { name: String },
    UnknownElement { name: String },
    SubstitutionDifferentIndices { name: String },
    SubstitutionClausesDisagreeOnType { name: String },
    NoDefaultForSubstitution { name: String },
    SameConstraintAlreadyDefined { name: String },
    SubstitutionCannotHaveConstraint { name: String },
    CannotNestSubstitution { inner: String, outer: String },
    CannotAssignToLoopVariable { name: String },
    CannotAssignToSubstitution { name: String },
    CannotAssignToSymbolClass { noun: &'static str, name: String },
    OnlyNumbersAndArraysCanBeAssigned { found: Type },
    CannotAssignMismatchedArray { rhs: Type, name: String, existing: Type },
    CannotIndexScalar { ty: Type, indices: Vec<Type> },
    CannotAssignNonArray { ty: Type },
    CannotIndexArray { elem_ty: Type, given: Vec<Type> },
    CannotIndexCommonParameter,
    CannotIndexAtomParameterWithBond,
    CannotIndexBondParameterWithAtom,
    CannotIndexBondParameterByNonBondedAtoms,
    BadNumberOfIndices { name: String, got: usize, expected: usize },
    SubstitutionIndicesMustBeAtomOrBond { name: String },
    CannotPerformNonMulDivBetweenNumberAndArray,
    CannotPerformDiv { a: Type, b: Type },
    CannotPerformOp { op: &'static str, a: Type, b: Type },
    CannotPerformUnaryOp { op: &'static str, ty: Type },
    CannotMultiplyMatrices { a: Type, b: Type },
    CannotMultiplyVector { a: Type, b: Type },
    CannotPerformDotProduct { a: Type, b: Type },
    FunctionNotKnown { name: String },
    IncompatibleArgumentType { name: String, got: Type, expected: Type },
    SumMustIterateOverAtomOrBond { found: Type },
    EePartsMustBeFloat,
    EeIndexAlreadyDefined,
    PredicateNotDefined { name: String },
    PredicateWrongArity { name: String, expected: usize, got: usize },
    PredicateElementArgumentNotAtom,
    PredicateElementExpectedStringArgument,
    PredicateNearExpectedNumericArgument,
    FunctionWrongArity { name: String, expected: usize, got: usize },
}

fn join_types(types: &[Type]) -> String {
    types.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::SymbolAlreadyDefined { name } => write!(f, "Symbol {} already defined.", name),
            Kind::SymbolAlreadyDefinedAsSomethingElse { name } => {
                write!(f, "Symbol {} already defined as something else.", name)
            }
            Kind::LoopVariableAlreadyDefined { name } => {
                write!(f, "Loop variable {} already defined.", name)
            }
            Kind::DecompositionUsedAlreadyDefinedNames { name } => write!(
                f,
                "Decomposition of bond symbol {} used already defined names.",
                name
            ),
            Kind::SymbolNotDefined { name } => write!(f, "Symbol {} not defined.", name),
            Kind::ObjectNotBoundToAnyForForeachSum { name } => {
                write!(f, "Object {} not bound to any For/ForEach/Sum.", name)
            }
            Kind::ObjectNotBoundToForeachOrSum { name } => {
                write!(f, "Object {} not bound to ForEach or Sum.", name)
            }
            Kind::PropertyNotKnown { name } => write!(f, "Property {} is not known.", name),
            Kind::FunctionNotAProperty { name } => write!(f, "Function {} is not a property.", name),
            Kind::ElementNotKnown { name } => write!(f, "Element {} not known.", name),
            Kind::UnknownElement { name } => write!(f, "Unknown element {}.", name),
            Kind::SubstitutionDifferentIndices { name } => {
                write!(f, "Substitution symbol {} has different indices defined.", name)
            }
            Kind::SubstitutionClausesDisagreeOnType { name } => write!(
                f,
                "All expressions within a substitution symbol {} must have same type.",
                name
            ),
            Kind::NoDefaultForSubstitution { name } => {
                write!(f, "No default option specified for Substitution symbol {}.", name)
            }
            Kind::SameConstraintAlreadyDefined { name } => {
                write!(f, "Same constraint already defined for symbol {}.", name)
            }
            Kind::SubstitutionCannotHaveConstraint { name } => {
                write!(f, "Substitution symbol {} cannot have a constraint.", name)
            }
            Kind::CannotNestSubstitution { inner, outer } => write!(
                f,
                "Cannot nest substitution {} in another substitution {}.",
                inner, outer
            ),
            Kind::CannotAssignToLoopVariable { name } => {
                write!(f, "Cannot assign to loop variable {}.", name)
            }
            Kind::CannotAssignToSubstitution { name } => {
                write!(f, "Cannot assign to a substitution symbol {}.", name)
            }
            Kind::CannotAssignToSymbolClass { noun, name } => {
                write!(f, "Cannot assign to a {} symbol {}.", noun, name)
            }
            Kind::OnlyNumbersAndArraysCanBeAssigned { found } => write!(
                f,
                "Only Numbers and Arrays can be assigned not {}.",
                found
            ),
            Kind::CannotAssignMismatchedArray { rhs, name, existing } => write!(
                f,
                "Cannot assign {} to the variable {} of type {}.",
                rhs, name, existing
            ),
            Kind::CannotIndexScalar { ty, indices } => write!(
                f,
                "Cannot index type {} with indices of type(s) {}.",
                ty,
                join_types(indices)
            ),
            Kind::CannotAssignNonArray { ty } => write!(f, "Cannot assign to non-Array type {}.", ty),
            Kind::CannotIndexArray { elem_ty, given } => write!(
                f,
                "Cannot index Array of type {} using index/indices of type(s) {}.",
                elem_ty,
                join_types(given)
            ),
            Kind::CannotIndexCommonParameter => write!(f, "Cannot index common parameter."),
            Kind::CannotIndexAtomParameterWithBond => {
                write!(f, "Cannot index atom parameter with Bond.")
            }
            Kind::CannotIndexBondParameterWithAtom => {
                write!(f, "Cannot index bond parameter with Atom.")
            }
            Kind::CannotIndexBondParameterByNonBondedAtoms => {
                write!(f, "Cannot index bond parameter by two non-bonded atoms.")
            }
            Kind::BadNumberOfIndices { name, got, expected } => write!(
                f,
                "Bad number of indices for {}, got {}, expected {}.",
                name, got, expected
            ),
            Kind::SubstitutionIndicesMustBeAtomOrBond { name } => write!(
                f,
                "Substitution indices for symbol {} must have type Atom or Bond.",
                name
            ),
            Kind::CannotPerformNonMulDivBetweenNumberAndArray => write!(
                f,
                "Cannot perform operation other than * or / between Number and Array."
            ),
            Kind::CannotPerformDiv { a, b } => {
                write!(f, "Cannot perform / for types {} and {}.", a, b)
            }
            Kind::CannotPerformOp { op, a, b } => {
                write!(f, "Cannot perform {} for types {} and {}.", op, a, b)
            }
            Kind::CannotPerformUnaryOp { op, ty } => {
                write!(f, "Cannot perform unary {} for type {}.", op, ty)
            }
            Kind::CannotMultiplyMatrices { a, b } => {
                write!(f, "Cannot multiply matrices of type {} and {}.", a, b)
            }
            Kind::CannotMultiplyVector { a, b } => {
                write!(f, "Cannot multiply vector of type {} and {}.", a, b)
            }
            Kind::CannotPerformDotProduct { a, b } => {
                write!(f, "Cannot perform dot product for types {} and {}.", a, b)
            }
            Kind::FunctionNotKnown { name } => write!(f, "Function {} is not known.", name),
            Kind::IncompatibleArgumentType { name, got, expected } => write!(
                f,
                "Incompatible argument type for function {}. Got {}, expected {}.",
                name, got, expected
            ),
            Kind::SumMustIterateOverAtomOrBond { found } => write!(
                f,
                "Sum has to iterate over Atom or Bond not {}.",
                found
            ),
            Kind::EePartsMustBeFloat => {
                write!(f, "EE expression has to have all parts with Float type.")
            }
            Kind::EeIndexAlreadyDefined => {
                write!(f, "Index/indices for EE expression already defined.")
            }
            Kind::PredicateNotDefined { name } => write!(f, "Predicate {} not defined.", name),
            Kind::PredicateWrongArity { name, expected, got } => write!(
                f,
                "Predicate {} should have {} arguments but got {} instead.",
                name, expected, got
            ),
            Kind::PredicateElementArgumentNotAtom => {
                write!(f, "Predicate's element argument is not Atom.")
            }
            Kind::PredicateElementExpectedStringArgument => {
                write!(f, "Predicate element expected string argument.")
            }
            Kind::PredicateNearExpectedNumericArgument => {
                write!(f, "Predicate near expected numeric argument.")
            }
            Kind::FunctionWrongArity { name, expected, got } => write!(
                f,
                "Function {} should have {} arguments but got {} instead.",
                name, expected, got
            ),
        }
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 1)
    }

    #[test]
    fn symbol_already_defined_matches_concrete_scenario() {
        let d = Diagnostic::symbol_already_defined("a", span());
        assert_eq!(d.to_string(), "Symbol a already defined.");
    }

    #[test]
    fn no_default_option_matches_concrete_scenario() {
        let d = Diagnostic::no_default_for_substitution("d", span());
        assert_eq!(
            d.to_string(),
            "No default option specified for Substitution symbol d."
        );
    }

    #[test]
    fn cannot_assign_to_loop_variable_matches_concrete_scenario() {
        let d = Diagnostic::cannot_assign_to_loop_variable("i", span());
        assert_eq!(d.to_string(), "Cannot assign to loop variable i.");
    }

    #[test]
    fn cannot_index_array_matches_concrete_scenario() {
        use crate::types::IndexKind;
        let elem_ty = Type::Array(Box::new(Type::Float), vec![IndexKind::Atom]);
        let d = Diagnostic::cannot_index_array(elem_ty, vec![Type::Bond], span());
        assert_eq!(
            d.to_string(),
            "Cannot index Array of type Float[Atom] using index/indices of type(s) Bond."
        );
    }

    #[test]
    fn unknown_element_matches_concrete_scenario() {
        let d = Diagnostic::unknown_element("adamantine", span());
        assert_eq!(d.to_string(), "Unknown element adamantine.");
    }

    #[test]
    fn diagnostic_exposes_its_span() {
        let d = Diagnostic::symbol_not_defined("s", Span::new(3, 4));
        assert_eq!(d.span(), Span::new(3, 4));
    }

    #[test]
    fn incompatible_argument_type_wording() {
        let d = Diagnostic::incompatible_argument_type("sin", Type::Atom, Type::Float, span());
        assert_eq!(
            d.to_string(),
            "Incompatible argument type for function sin. Got Atom, expected Float."
        );
    }

    #[test]
    fn predicate_wrong_arity_wording() {
        let d = Diagnostic::predicate_wrong_arity("near", 3, 1, span());
        assert_eq!(
            d.to_string(),
            "Predicate near should have 3 arguments but got 1 instead."
        );
    }
}

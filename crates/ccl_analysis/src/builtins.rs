//! The fixed built-in registry: functions, predicates, properties, elements.
//!
//! None of this is user-extensible — it is compiled in once and shared
//! read-only for the lifetime of an analysis run, matching the "no
//! process-wide mutable state" requirement for this pass.

use crate::types::{IndexKind, Type};

/// Signature of a built-in function: positional argument types and a result type.
pub struct FunctionSig {
    pub name: &'static str,
    pub args: &'static [Type],
    pub result: Type,
}

/// Signature of a built-in predicate: positional argument types, result always `Bool`.
pub struct PredicateSig {
    pub name: &'static str,
    pub args: &'static [Type],
}

/// Signature of a built-in property: how many atom/bond indices it takes and
/// what scalar type it yields once fully indexed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertySig {
    pub indices: &'static [IndexKind],
    pub result: PropertyResult,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyResult {
    Float,
    Bool,
}

fn function_table() -> Vec<FunctionSig> {
    vec![
        FunctionSig { name: "sin", args: &[Type::Float], result: Type::Float },
        FunctionSig { name: "cos", args: &[Type::Float], result: Type::Float },
        FunctionSig { name: "exp", args: &[Type::Float], result: Type::Float },
        FunctionSig { name: "log", args: &[Type::Float], result: Type::Float },
        FunctionSig { name: "sqrt", args: &[Type::Float], result: Type::Float },
        FunctionSig {
            name: "inv",
            args: &[],
            result: Type::Array(Box::new(Type::Float), vec![IndexKind::Atom, IndexKind::Atom]),
        },
        FunctionSig { name: "distance", args: &[Type::Atom, Type::Atom], result: Type::Float },
    ]
}

/// Looks up a built-in function by name. `inv`'s single-argument signature is
/// shape-dependent (`Float[Atom,Atom] -> Float[Atom,Atom]`), so its `args`
/// slot above is empty; callers must special-case it against the actual
/// argument's array shape rather than comparing to a fixed `Type`.
pub fn lookup_function(name: &str) -> Option<FunctionSig> {
    function_table().into_iter().find(|f| f.name == name)
}

fn predicate_table() -> Vec<PredicateSig> {
    vec![
        PredicateSig { name: "bonded", args: &[Type::Atom, Type::Atom] },
        PredicateSig { name: "element", args: &[Type::Atom, Type::String] },
        PredicateSig { name: "near", args: &[Type::Atom, Type::Atom, Type::Float] },
        PredicateSig {
            name: "bond_distance",
            args: &[Type::Atom, Type::Atom, Type::Int],
        },
    ]
}

pub fn lookup_predicate(name: &str) -> Option<PredicateSig> {
    predicate_table().into_iter().find(|p| p.name == name)
}

/// Looks up a property by its parsed [`crate::ast::PropertyKind`], returning
/// its index arity and result kind. `distance`/`bond_distance` are
/// two-argument properties yielding `Float[Atom,Atom]`; the rest take a
/// single index.
pub fn property_signature(kind: crate::ast::PropertyKind) -> PropertySig {
    use crate::ast::PropertyKind::*;
    match kind {
        Electronegativity => PropertySig { indices: &[IndexKind::Atom], result: PropertyResult::Float },
        CovRadius => PropertySig { indices: &[IndexKind::Atom], result: PropertyResult::Float },
        VdwRadius => PropertySig { indices: &[IndexKind::Atom], result: PropertyResult::Float },
        BondOrder => PropertySig { indices: &[IndexKind::Bond], result: PropertyResult::Float },
        FormalCharge => PropertySig { indices: &[IndexKind::Atom], result: PropertyResult::Float },
        Distance => PropertySig {
            indices: &[IndexKind::Atom, IndexKind::Atom],
            result: PropertyResult::Float,
        },
        BondDistance => PropertySig {
            indices: &[IndexKind::Atom, IndexKind::Atom],
            result: PropertyResult::Float,
        },
    }
}

/// Standard periodic-table symbols, lower-cased, plus their full lower-case
/// names. `element(i, s)` and the `<property> of <element>` annotation both
/// validate against this set.
const ELEMENT_NAMES: &[&str] = &[
    "h", "hydrogen", "he", "helium", "li", "lithium", "be", "beryllium", "b", "boron", "c",
    "carbon", "n", "nitrogen", "o", "oxygen", "f", "fluorine", "ne", "neon", "na", "sodium",
    "mg", "magnesium", "al", "aluminium", "aluminum", "si", "silicon", "p", "phosphorus", "s",
    "sulfur", "sulphur", "cl", "chlorine", "ar", "argon", "k", "potassium", "ca", "calcium",
    "fe", "iron", "cu", "copper", "zn", "zinc", "br", "bromine", "i", "iodine", "au", "gold",
];

pub fn is_known_element(name: &str) -> bool {
    ELEMENT_NAMES.contains(&name.to_ascii_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sin_is_float_to_float() {
        let sig = lookup_function("sin").unwrap();
        assert_eq!(sig.args, &[Type::Float]);
        assert_eq!(sig.result, Type::Float);
    }

    #[test]
    fn unknown_function_is_absent() {
        assert!(lookup_function("magic").is_none());
    }

    #[test]
    fn near_accepts_two_objects_and_a_float() {
        let sig = lookup_predicate("near").unwrap();
        assert_eq!(sig.args, &[Type::Atom, Type::Atom, Type::Float]);
    }

    #[test]
    fn distance_property_is_two_indexed() {
        let sig = property_signature(crate::ast::PropertyKind::Distance);
        assert_eq!(sig.indices, &[IndexKind::Atom, IndexKind::Atom]);
    }

    #[test]
    fn electronegativity_is_single_atom_indexed() {
        let sig = property_signature(crate::ast::PropertyKind::Electronegativity);
        assert_eq!(sig.indices, &[IndexKind::Atom]);
    }

    #[test]
    fn hydrogen_and_alias_h_are_known() {
        assert!(is_known_element("hydrogen"));
        assert!(is_known_element("H"));
    }

    #[test]
    fn adamantine_is_not_a_known_element() {
        assert!(!is_known_element("adamantine"));
    }
}

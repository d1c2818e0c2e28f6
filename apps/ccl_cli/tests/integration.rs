//! End-to-end checks: JSON surface program on disk, through the full
//! `ccl-cli` pipeline (read, deserialize, lower, analyse).

use std::io::Write;

use tempfile::NamedTempFile;

fn check(json: &str) -> Result<(), String> {
    let mut file = NamedTempFile::new().expect("create temp file");
    write!(file, "{json}").expect("write temp file");
    ccl_cli::check_file(file.path()).map_err(|e| e.to_string())
}

#[test]
fn duplicate_object_annotation_is_rejected() {
    let json = r#"{
        "body": [],
        "annotations": [
            {"kind": "object", "name": "a", "object_kind": "atom", "constraint": null, "decomposition": null},
            {"kind": "object", "name": "a", "object_kind": "bond", "constraint": null, "decomposition": null}
        ]
    }"#;
    let err = check(json).unwrap_err();
    assert_eq!(err, "Symbol a already defined.");
}

#[test]
fn substitution_without_default_is_rejected() {
    let json = r#"{
        "body": [],
        "annotations": [
            {
                "kind": "substitution",
                "name": "d",
                "formals": ["i"],
                "rhs": {"kind": "int", "value": 1},
                "constraint": {"kind": "predicate", "name": "element", "args": [
                    {"kind": "name", "name": "i"},
                    {"kind": "name", "name": "hydrogen"}
                ]}
            }
        ]
    }"#;
    let err = check(json).unwrap_err();
    assert_eq!(err, "No default option specified for Substitution symbol d.");
}

#[test]
fn reassigning_loop_variable_is_rejected() {
    let json = r#"{
        "body": [
            {
                "kind": "for",
                "var": "i",
                "lo": {"kind": "int", "value": 0},
                "hi": {"kind": "int", "value": 10},
                "body": [
                    {
                        "kind": "assign",
                        "lhs": {"kind": "name", "name": "i"},
                        "rhs": {"kind": "int", "value": 1}
                    }
                ]
            }
        ],
        "annotations": []
    }"#;
    let err = check(json).unwrap_err();
    assert_eq!(err, "Cannot assign to loop variable i.");
}

#[test]
fn atom_then_bond_array_reuse_is_rejected() {
    let json = r#"{
        "body": [
            {
                "kind": "for_each",
                "object_kind": "atom",
                "name": "a",
                "decomposition": null,
                "constraint": null,
                "body": [
                    {
                        "kind": "assign",
                        "lhs": {"kind": "index", "name": "q", "indices": [{"kind": "name", "name": "a"}]},
                        "rhs": {"kind": "int", "value": 1}
                    }
                ]
            },
            {
                "kind": "for_each",
                "object_kind": "bond",
                "name": "b",
                "decomposition": null,
                "constraint": null,
                "body": [
                    {
                        "kind": "assign",
                        "lhs": {"kind": "index", "name": "q", "indices": [{"kind": "name", "name": "b"}]},
                        "rhs": {"kind": "int", "value": 1}
                    }
                ]
            }
        ],
        "annotations": []
    }"#;
    let err = check(json).unwrap_err();
    assert_eq!(err, "Cannot index Array of type Float[Atom] using index/indices of type(s) Bond.");
}

#[test]
fn unknown_element_in_second_clause_is_rejected() {
    let json = r#"{
        "body": [],
        "annotations": [
            {
                "kind": "substitution",
                "name": "d",
                "formals": ["i"],
                "rhs": {"kind": "int", "value": 1},
                "constraint": {"kind": "predicate", "name": "element", "args": [
                    {"kind": "name", "name": "i"},
                    {"kind": "name", "name": "adamantine"}
                ]}
            },
            {
                "kind": "substitution",
                "name": "d",
                "formals": ["i"],
                "rhs": {"kind": "int", "value": 2},
                "constraint": null
            }
        ]
    }"#;
    let err = check(json).unwrap_err();
    assert_eq!(err, "Unknown element adamantine.");
}

#[test]
fn peoe_style_program_analyses_cleanly() {
    let json = r#"{
        "body": [
            {
                "kind": "for_each",
                "object_kind": "atom",
                "name": "a",
                "decomposition": null,
                "constraint": null,
                "body": [
                    {
                        "kind": "assign",
                        "lhs": {"kind": "index", "name": "q", "indices": [{"kind": "name", "name": "a"}]},
                        "rhs": {"kind": "call", "name": "chi", "args": [{"kind": "name", "name": "a"}]}
                    }
                ]
            }
        ],
        "annotations": [
            {"kind": "object", "name": "a", "object_kind": "atom", "constraint": null, "decomposition": null},
            {"kind": "property", "name": "chi", "property": "electronegativity"}
        ]
    }"#;
    check(json).unwrap();
}

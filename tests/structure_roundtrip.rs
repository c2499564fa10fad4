//! Round-trip property: reassembling the tree of a well-formed regex
//! reproduces the input, and the result still compiles.

use proptest::prelude::*;

use rextree::rextree::parsing::parse;
use rextree::rextree::serializing::serialize;
use rextree::rextree::token::{RowKind, TokenColumn, TokenValue};
use rextree::rextree::tree::{NodeId, Tree};
use rextree::rextree::validation::{EngineValidator, RegexValidator};

/// Structural fingerprint used for semantic comparison: row kind, value and
/// group name of every non-empty node in document order.
fn shape(tree: &Tree<TokenValue>) -> Vec<(RowKind, String, String)> {
    fn collect(tree: &Tree<TokenValue>, id: NodeId, out: &mut Vec<(RowKind, String, String)>) {
        let kind = tree
            .data(id, TokenColumn::RowType.index())
            .map(TokenValue::row_kind)
            .unwrap_or(RowKind::Text);
        let value = tree
            .data(id, TokenColumn::Value.index())
            .map(|c| c.str().to_string())
            .unwrap_or_default();
        let name = tree
            .data(id, TokenColumn::GroupName.index())
            .map(|c| c.str().to_string())
            .unwrap_or_default();
        // synthetic empty literals are noise, not structure
        if !(kind == RowKind::Text && value.is_empty()) {
            out.push((kind, value, name));
        }
        for child in tree.children(id) {
            collect(tree, *child, out);
        }
    }
    let mut out = Vec::new();
    for child in tree.children(tree.root()) {
        collect(tree, *child, &mut out);
    }
    out
}

/// Well-formed regex fragments: literal runs, escaped parens, anonymous,
/// named and atomic groups, nested a few levels deep.
fn regex_fragment() -> impl Strategy<Value = String> {
    let literal = prop_oneof![
        "[a-z0-9]{1,6}".prop_map(|s| s),
        Just(r"\d+".to_string()),
        Just(r"\(esc\)".to_string()),
        Just("x|y".to_string()),
    ];
    literal.prop_recursive(3, 24, 4, |inner| {
        let name = "[a-z][a-z0-9]{0,5}";
        prop_oneof![
            inner.clone().prop_map(|s| format!("({})", s)),
            (name, inner.clone()).prop_map(|(n, s)| format!("(?<{}>{})", n, s)),
            (name, inner.clone()).prop_map(|(n, s)| format!("(?'{}'{})", n, s)),
            (name, inner.clone()).prop_map(|(n, s)| format!("(?P<{}>{})", n, s)),
            inner.clone().prop_map(|s| format!("(?>{})", s)),
            prop::collection::vec(inner, 1..4).prop_map(|parts| parts.concat()),
        ]
    })
}

proptest! {
    #[test]
    fn roundtrip_reproduces_input(input in regex_fragment()) {
        let tree = parse(&input);
        let serialized = serialize(&tree);
        prop_assert_eq!(&serialized, &input);
    }

    #[test]
    fn roundtrip_output_still_compiles(input in regex_fragment()) {
        prop_assert!(EngineValidator.validate(&input).is_ok(), "generator made an invalid input");
        let serialized = serialize(&parse(&input));
        prop_assert!(EngineValidator.validate(&serialized).is_ok());
    }

    #[test]
    fn roundtrip_preserves_structure(input in regex_fragment()) {
        let first = parse(&input);
        let again = parse(&serialize(&first));
        prop_assert_eq!(shape(&first), shape(&again));
    }
}

#[test]
fn test_roundtrip_adds_nothing_visible_for_empty_groups() {
    // implicit empty-text synthesis must not change the reassembled string
    for input in ["()", "(?>)", "(()())"] {
        assert_eq!(serialize(&parse(input)), input);
    }
}

#[test]
fn test_group_census_is_preserved() {
    let input = r"(?<a>1(?>2)(3))(?P<b>4)";
    let tree = parse(&serialize(&parse(input)));
    let counts = shape(&tree)
        .into_iter()
        .filter(|(kind, _, _)| *kind != RowKind::Text)
        .count();
    assert_eq!(counts, 4);
}

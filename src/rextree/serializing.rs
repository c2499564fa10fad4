//! Regex reassembly from the token tree
//!
//! The inverse of [`parsing`](super::parsing): walks the tree in document
//! order and reconstructs the regex string, emitting opening syntax on the
//! way down and closing syntax on the way up. The reconstructed string is a
//! candidate only; callers validate it through the
//! [`validation`](super::validation) port before adopting it.

use super::token::{GroupSyntax, RowKind, TokenColumn, TokenValue};
use super::tree::{Traversal, Tree};

/// Reconstructs the regex string from the tree under `tree`'s root.
pub fn serialize(tree: &Tree<TokenValue>) -> String {
    let out = std::cell::RefCell::new(String::new());
    let mut pre = |t: &Tree<TokenValue>, id| {
        let row = t
            .data(id, TokenColumn::RowType.index())
            .map(TokenValue::row_kind)
            .unwrap_or(RowKind::Text);
        let mut out = out.borrow_mut();
        match row {
            RowKind::Text => {
                if let Some(cell) = t.data(id, TokenColumn::Value.index()) {
                    out.push_str(cell.str());
                }
            }
            RowKind::VarGroup | RowKind::NonVarGroup => {
                out.push('(');
                let name = t
                    .data(id, TokenColumn::GroupName.index())
                    .map(|c| c.str().to_string())
                    .unwrap_or_default();
                if !name.is_empty() {
                    let syntax = t
                        .data(id, TokenColumn::GroupSyntax.index())
                        .and_then(TokenValue::syntax)
                        .unwrap_or(GroupSyntax::Angle);
                    out.push_str(syntax.opening());
                    out.push_str(&name);
                    out.push(syntax.closing());
                }
            }
            RowKind::NonCapturingGroup => {
                out.push_str("(?>");
            }
        }
        true
    };
    let mut post = |t: &Tree<TokenValue>, id| {
        let row = t
            .data(id, TokenColumn::RowType.index())
            .map(TokenValue::row_kind)
            .unwrap_or(RowKind::Text);
        if row != RowKind::Text {
            out.borrow_mut().push(')');
        }
        true
    };
    tree.walk(
        tree.root(),
        Some(&mut pre),
        Some(&mut post),
        Traversal::document_children(),
    );
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::super::parsing::parse;
    use super::*;

    fn roundtrip(input: &str) -> String {
        serialize(&parse(input))
    }

    #[test]
    fn test_plain_text_roundtrips() {
        assert_eq!(roundtrip(r"abc\d+"), r"abc\d+");
    }

    #[test]
    fn test_groups_roundtrip_verbatim() {
        for input in [
            "a(bc)d",
            "(?>atomic)",
            "(?<name>x)",
            "(?'name'x)",
            "(?P<name>x)",
            "((a)(b))c",
            r"\(not\)(yes)",
        ] {
            assert_eq!(roundtrip(input), input);
        }
    }

    #[test]
    fn test_empty_group_roundtrips() {
        // the synthetic empty text child adds nothing visible
        assert_eq!(roundtrip("()"), "()");
        assert_eq!(roundtrip("(?>)"), "(?>)");
    }

    #[test]
    fn test_unbalanced_input_closes_open_groups() {
        // an unterminated group gains its missing delimiter on the way out
        assert_eq!(roundtrip("(ab"), "(ab)");
    }
}

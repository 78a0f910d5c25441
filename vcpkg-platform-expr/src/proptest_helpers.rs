// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property-testing generators for [`PlatformExpr`], gated behind the `proptest1` feature.

use crate::expr::{ExprNode, PlatformExpr};
use crate::parser::ParseMode;
use proptest::prelude::*;
use std::sync::Arc;

const KNOWN_IDENTS: &[&str] = &["windows", "linux", "osx", "android", "uwp", "arm", "arm64", "x64", "x86"];

fn ident_strategy() -> impl Strategy<Value = ExprNode> {
    proptest::sample::select(KNOWN_IDENTS).prop_map(|s| ExprNode::Ident(s.to_string()))
}

fn node_strategy() -> impl Strategy<Value = ExprNode> {
    let leaf = ident_strategy();
    leaf.prop_recursive(4, 16, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| ExprNode::Not(Box::new(e))),
            proptest::collection::vec(inner.clone(), 2..=2).prop_map(ExprNode::All),
            proptest::collection::vec(inner, 2..=2).prop_map(ExprNode::Any),
        ]
    })
}

fn render(node: &ExprNode) -> String {
    match node {
        ExprNode::Ident(name) => name.clone(),
        ExprNode::Not(inner) => format!("!({})", render(inner)),
        ExprNode::All(children) => format!(
            "({})",
            children
                .iter()
                .map(render)
                .collect::<Vec<_>>()
                .join(" & ")
        ),
        ExprNode::Any(children) => format!(
            "({})",
            children
                .iter()
                .map(render)
                .collect::<Vec<_>>()
                .join(" | ")
        ),
    }
}

impl Arbitrary for PlatformExpr {
    type Parameters = ();
    type Strategy = BoxedStrategy<PlatformExpr>;

    fn arbitrary_with(_args: ()) -> Self::Strategy {
        node_strategy()
            .prop_map(|node| {
                let text = render(&node);
                PlatformExpr::parse(&text, ParseMode::Permissive)
                    .unwrap_or_else(|_| panic!("generated expression '{}' failed to parse", text))
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn arbitrary_expressions_always_parse(expr in any::<PlatformExpr>()) {
            // Re-parsing the rendered text must reproduce an equivalent AST.
            let reparsed = PlatformExpr::parse(expr.expression_str(), ParseMode::Permissive).unwrap();
            prop_assert_eq!(expr.node().cloned(), reparsed.node().cloned());
        }
    }

    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send_sync::<Arc<ExprNode>>();
    }
}

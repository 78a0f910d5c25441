// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::expr::ExprNode;
use crate::vars::{eval_predicate, PlatformVars};

pub(crate) fn evaluate_node(node: &ExprNode, vars: &PlatformVars) -> bool {
    match node {
        ExprNode::Any(children) => children.iter().any(|child| evaluate_node(child, vars)),
        ExprNode::All(children) => children.iter().all(|child| evaluate_node(child, vars)),
        ExprNode::Not(inner) => !evaluate_node(inner, vars),
        ExprNode::Ident(name) => eval_predicate(name, vars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, ParseMode};

    fn eval(expr: &str, system: &str, arch: &str) -> bool {
        let node = parse(expr, ParseMode::Permissive).unwrap();
        evaluate_node(&node, &PlatformVars::new(system, arch))
    }

    #[test]
    fn windows_and_not_arm() {
        assert!(eval("windows & !arm", "Windows", "x64"));
        assert!(!eval("windows & !arm", "Windows", "arm64"));
        assert!(!eval("windows & !arm", "Linux", "x64"));
    }

    #[test]
    fn any_of_two_oses() {
        assert!(eval("linux | osx", "Linux", "x64"));
        assert!(eval("linux | osx", "Darwin", "x64"));
        assert!(!eval("linux | osx", "Windows", "x64"));
    }

    #[test]
    fn nested_parens() {
        assert!(eval("!(windows | uwp)", "Linux", "x64"));
        assert!(!eval("!(windows | uwp)", "Windows", "x64"));
    }
}

//! Rewriting of `lighten()`/`darken()` calls inside a value tree.
//!
//! One pass rewrites every call whose color is already known: a hex literal
//! or a canonical `hsla()` literal. A call wrapping another `lighten` or
//! `darken` is skipped during the pass that rewrites the inner call, so
//! nesting `n` deep resolves after `n` passes (see
//! [`crate::stylesheet::Processor`]).

use crate::color::Hsl;
use crate::error::Diagnostic;
use crate::transform::{self, Op, Resolution};
use crate::value::{Function, Node, ValueTree};

/// Result of one rewriting pass over a declaration value.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteOutcome {
    /// The serialized value after the pass.
    pub value: String,
    /// Problems with calls that were left as written.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of calls replaced by `hsla()` literals.
    pub rewritten: usize,
    /// Number of calls waiting on a nested call.
    pub deferred: usize,
}

impl RewriteOutcome {
    /// Whether this pass changed anything, and so whether another pass may
    /// make further progress.
    pub fn changed(&self) -> bool {
        self.rewritten > 0
    }
}

/// Counters and diagnostics collected while rewriting a tree in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewriteReport {
    pub diagnostics: Vec<Diagnostic>,
    pub rewritten: usize,
    pub deferred: usize,
}

/// Rewrite every resolvable call in `tree`, leaving the rest untouched.
pub fn rewrite_tree(tree: &mut ValueTree) -> RewriteReport {
    let mut report = RewriteReport::default();

    tree.walk_functions_mut(|function| {
        let Some(op) = Op::from_name(&function.name) else {
            return;
        };

        match transform::resolve(op, function) {
            Resolution::Resolved(hsl) => {
                tracing::debug!("{op}() resolved to {hsl}");
                replace_with_hsla(function, hsl);
                report.rewritten += 1;
            }
            Resolution::Deferred => report.deferred += 1,
            Resolution::Failed(diagnostic) => {
                tracing::debug!("leaving {function} as written: {diagnostic}");
                report.diagnostics.push(diagnostic);
            }
        }
    });

    report
}

/// Parse `value`, run one rewriting pass and serialize the result.
pub fn rewrite_value(value: &str) -> RewriteOutcome {
    let mut tree = ValueTree::parse(value);
    let report = rewrite_tree(&mut tree);

    RewriteOutcome {
        value: tree.to_string(),
        diagnostics: report.diagnostics,
        rewritten: report.rewritten,
        deferred: report.deferred,
    }
}

/// Turn `function` into the canonical `hsla(h, s%, l%, 1)` literal.
fn replace_with_hsla(function: &mut Function, hsl: Hsl) {
    let separator = || Node::Divider(", ".to_string());

    function.name = "hsla".to_string();
    function.nodes = vec![
        Node::Literal(hsl.h.to_string()),
        separator(),
        Node::Literal(format!("{}%", hsl.s)),
        separator(),
        Node::Literal(format!("{}%", hsl.l)),
        separator(),
        Node::Literal("1".to_string()),
    ];
    function.closed = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_lighten_hex() {
        let outcome = rewrite_value("lighten(#5E6469, 57%)");
        assert_eq!(outcome.value, "hsla(207, 6%, 96%, 1)");
        assert!(outcome.diagnostics.is_empty());
        assert!(outcome.changed());
    }

    #[test]
    fn test_rewrite_lighten_hsla() {
        let outcome = rewrite_value("lighten(hsla(197, 100%, 50%, 1), 10%)");
        assert_eq!(outcome.value, "hsla(197, 100%, 60%, 1)");
    }

    #[test]
    fn test_rewrite_darken_hex() {
        let outcome = rewrite_value("darken(#f0f0f0, 15%)");
        assert_eq!(outcome.value, "hsla(0, 0%, 79%, 1)");
    }

    #[test]
    fn test_rewrite_keeps_surrounding_terms() {
        let outcome = rewrite_value("1px solid darken(#f0f0f0, 15%) !important");
        assert_eq!(outcome.value, "1px solid hsla(0, 0%, 79%, 1) !important");
    }

    #[test]
    fn test_rewrite_multiple_calls() {
        let outcome =
            rewrite_value("linear-gradient(lighten(#000, 10%), darken(#fff, 10%))");
        assert_eq!(
            outcome.value,
            "linear-gradient(hsla(0, 0%, 10%, 1), hsla(0, 0%, 90%, 1))"
        );
        assert_eq!(outcome.rewritten, 2);
    }

    #[test]
    fn test_nested_call_resolves_over_two_passes() {
        let first = rewrite_value("darken(lighten(#5E6469, 57%), 3%)");
        assert_eq!(first.value, "darken(hsla(207, 6%, 96%, 1), 3%)");
        assert_eq!(first.rewritten, 1);
        assert_eq!(first.deferred, 1);

        let second = rewrite_value(&first.value);
        assert_eq!(second.value, "hsla(207, 6%, 93%, 1)");
        assert_eq!(second.deferred, 0);
    }

    #[test]
    fn test_values_without_calls_are_unchanged() {
        for value in [
            "red",
            "rgba(0, 0, 0, .5)",
            "hsla(1, 2%, 3%, 1)",
            "calc(100% - 4px) /* lighten */",
            "\"darken(#fff, 10%)\"",
        ] {
            let outcome = rewrite_value(value);
            assert_eq!(outcome.value, value);
            assert!(!outcome.changed());
            assert!(outcome.diagnostics.is_empty());
        }
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        for value in [
            "lighten(#5E6469, 57%)",
            "darken(#f0f0f0, 15%) lighten(#abc, 100%)",
            "lighten(#fff)",
        ] {
            let once = rewrite_value(value).value;
            let twice = rewrite_value(&once);
            assert_eq!(twice.value, once);
            assert!(!twice.changed());
        }
    }

    #[test]
    fn test_invalid_calls_are_left_as_written() {
        let cases = [
            (
                "lighten(#fff)",
                "Invalid call to lighten(): Expected 2 arguments",
            ),
            (
                "darken(red, 10%)",
                "Invalid call to darken(): First argument must be a hex value, hsla color, or nested lighten/darken",
            ),
            (
                "lighten(#fff, 10)",
                "Invalid call to lighten(): Second argument must be a percentage",
            ),
            ("lighten(#12345, 10%)", "Unable to convert #12345 to RGB"),
        ];

        for (value, message) in cases {
            let outcome = rewrite_value(value);
            assert_eq!(outcome.value, value);
            assert_eq!(outcome.rewritten, 0);
            let messages: Vec<String> =
                outcome.diagnostics.iter().map(|d| d.to_string()).collect();
            assert_eq!(messages, vec![message.to_string()]);
        }
    }

    #[test]
    fn test_failure_does_not_block_siblings() {
        let outcome = rewrite_value("lighten(bad, 1%), darken(#fff, 50%)");
        assert_eq!(outcome.value, "lighten(bad, 1%), hsla(0, 0%, 50%, 1)");
        assert_eq!(outcome.diagnostics.len(), 1);
    }

    #[test]
    fn test_function_names_are_case_sensitive() {
        let outcome = rewrite_value("Lighten(#fff, 10%)");
        assert_eq!(outcome.value, "Lighten(#fff, 10%)");
        assert!(outcome.diagnostics.is_empty());
    }
}

//! Argument shape checks for `lighten()`/`darken()` calls.

use crate::error::Diagnostic;
use crate::transform::Op;
use crate::value::{Function, Node};

/// Function names accepted as a nested first argument.
const NESTED_COLOR_FUNCTIONS: &[&str] = &["hsla", "lighten", "darken"];

/// The color term of a call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorArg<'a> {
    /// A `#`-prefixed hex literal (not yet checked for valid digits).
    Hex(&'a str),
    /// An `hsla(...)` literal or a nested `lighten`/`darken` call.
    Function(&'a Function),
}

/// The two positional arguments of a well-formed call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallArgs<'a> {
    pub color: ColorArg<'a>,
    /// Percentage literal, still carrying its trailing `%`.
    pub percentage: &'a str,
}

/// Check the arguments of `call` and split them into color and percentage.
///
/// Rules are applied in order: argument count, then the color term, then
/// the percentage term. The first rule that fails decides the diagnostic.
pub fn validate(call: &Function, op: Op) -> Result<CallArgs<'_>, Diagnostic> {
    let mut args = call.arguments();
    let (Some(color), Some(percentage), None) = (args.next(), args.next(), args.next()) else {
        return Err(Diagnostic::InvalidArgumentCount { op: op.to_string() });
    };

    let color = match color {
        Node::Function(nested) if NESTED_COLOR_FUNCTIONS.contains(&nested.name.as_str()) => {
            ColorArg::Function(nested)
        }
        Node::Literal(text) if text.starts_with('#') => ColorArg::Hex(text),
        _ => return Err(Diagnostic::InvalidColorArgument { op: op.to_string() }),
    };

    let percentage = match percentage {
        Node::Literal(text) if text.ends_with('%') => text.as_str(),
        _ => return Err(Diagnostic::InvalidPercentageArgument { op: op.to_string() }),
    };

    Ok(CallArgs { color, percentage })
}

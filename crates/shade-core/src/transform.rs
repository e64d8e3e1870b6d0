//! Resolution of a single `lighten()`/`darken()` call to an HSL color.

use std::fmt;

use crate::color::{self, Hsl};
use crate::error::Diagnostic;
use crate::validate::{self, ColorArg};
use crate::value::Function;

/// Lightness operation named by a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Lighten,
    Darken,
}

impl Op {
    /// Match a function name exactly (names are case-sensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lighten" => Some(Op::Lighten),
            "darken" => Some(Op::Darken),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Op::Lighten => "lighten",
            Op::Darken => "darken",
        }
    }

    /// Shift `lightness` by `percentage`, clamped to `[0, 100]`.
    fn apply(self, lightness: f64, percentage: f64) -> f64 {
        match self {
            Op::Lighten => (lightness + percentage).min(100.0),
            Op::Darken => (lightness - percentage).max(0.0),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of resolving one call.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The call evaluates to this color.
    Resolved(Hsl),
    /// The color argument is itself a `lighten`/`darken` call. It has to be
    /// rewritten first; the caller should revisit this call afterwards.
    Deferred,
    /// The call is malformed and stays as written.
    Failed(Diagnostic),
}

impl From<Result<Hsl, Diagnostic>> for Resolution {
    fn from(result: Result<Hsl, Diagnostic>) -> Self {
        match result {
            Ok(hsl) => Resolution::Resolved(hsl),
            Err(diagnostic) => Resolution::Failed(diagnostic),
        }
    }
}

/// Resolve `op` applied to the arguments of `call`.
///
/// Only one level is evaluated: a nested `lighten`/`darken` argument yields
/// [`Resolution::Deferred`] rather than being resolved recursively.
pub fn resolve(op: Op, call: &Function) -> Resolution {
    let args = match validate::validate(call, op) {
        Ok(args) => args,
        Err(diagnostic) => return Resolution::Failed(diagnostic),
    };

    let base = match args.color {
        ColorArg::Hex(hex) => color::hex_to_hsl(hex),
        ColorArg::Function(nested) => match nested_color(op, nested) {
            Some(base) => base,
            None => return Resolution::Deferred,
        },
    };

    let result = base.and_then(|hsl| {
        let percentage = parse_percentage(args.percentage, op)?;
        tracing::debug!(?hsl, percentage, "applying {op}()");
        Ok(hsl.with_lightness(op.apply(hsl.l, percentage)))
    });

    result.into()
}

/// Color of a nested function argument, or `None` while it is a
/// `lighten`/`darken` call that has to be rewritten first.
///
/// [`validate::validate`] only admits `hsla`, `lighten` and `darken` as
/// nested names, so the last arm is reached only by direct calls.
fn nested_color(op: Op, nested: &Function) -> Option<Result<Hsl, Diagnostic>> {
    match nested.name.as_str() {
        "hsla" => Some(color::parse_hsla(&nested.to_string())),
        "lighten" | "darken" => {
            tracing::trace!("deferring {op}() until nested {}() is rewritten", nested.name);
            None
        }
        other => Some(Err(Diagnostic::UnsupportedNestedFunction {
            name: other.to_string(),
        })),
    }
}

/// Parse a `N%` literal into a non-negative number. Fractions are allowed.
fn parse_percentage(text: &str, op: Op) -> Result<f64, Diagnostic> {
    text.strip_suffix('%')
        .and_then(|number| number.parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
        .ok_or_else(|| Diagnostic::InvalidPercentageArgument { op: op.to_string() })
}

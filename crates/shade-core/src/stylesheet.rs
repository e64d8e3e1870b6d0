//! Stylesheet processing.
//!
//! [`Processor`] finds declarations in a stylesheet, expands `$variables`,
//! and rewrites each declaration value until it stops changing. Only the
//! value text of rewritten declarations is touched; everything else in the
//! stylesheet is copied through byte for byte.
//!
//! Declarations and `$name` references are located by the `scan` module,
//! which tokenizes with `cssparser`, so terminators inside comments, quoted
//! strings and parentheses never end a declaration.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::Diagnostic;
use crate::rewrite;
use crate::scan;

/// A non-fatal problem found while processing a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// 1-based line of the declaration.
    pub line: usize,
    /// 1-based column of the declaration, in UTF-16 code units.
    pub column: usize,
    /// Property name of the declaration.
    pub property: String,
    pub message: String,
}

/// Output of [`Processor::process`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub css: String,
    pub warnings: Vec<Warning>,
}

/// Result of rewriting one declaration value to a fixed point.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationRewrite {
    pub value: String,
    /// Distinct diagnostics across all passes, in first-seen order.
    pub diagnostics: Vec<Diagnostic>,
    pub passes: u32,
    /// The pass limit was hit while nested calls were still pending.
    pub exhausted: bool,
}

/// Rewrites `lighten()`/`darken()` calls across a whole stylesheet.
#[derive(Debug, Clone)]
pub struct Processor {
    max_passes: u32,
    variables: bool,
}

impl Processor {
    pub fn new(config: &Config) -> Self {
        Self {
            max_passes: config.rewrite.max_passes.max(1),
            variables: config.variables.enabled,
        }
    }

    /// Process a stylesheet. Never fails: problems become warnings and the
    /// affected text is left as written.
    pub fn process(&self, css: &str) -> Processed {
        let mut out = String::with_capacity(css.len());
        let mut cursor = 0;
        let mut variables: HashMap<String, String> = HashMap::new();
        let mut warnings = Vec::new();

        for decl in scan::declarations(css) {
            let property = &css[decl.property.clone()];
            let raw_value = &css[decl.value.clone()];
            let (line, column) = (decl.line, decl.column);
            let mut report = |message: String| {
                debug!("{}:{}: {}: {}", line, column, property, message);
                warnings.push(Warning {
                    line,
                    column,
                    property: property.to_string(),
                    message,
                });
            };

            let value = if self.variables {
                substitute_variables(raw_value, &variables, &mut report)
            } else {
                Cow::Borrowed(raw_value)
            };

            if self.variables && property.starts_with('$') {
                debug!("defining variable {} = {}", property, value);
                variables.insert(property[1..].to_string(), value.into_owned());

                // The definition and its trailing whitespace are dropped
                out.push_str(&css[cursor..decl.start]);
                cursor = skip_whitespace(css, decl.end);
                continue;
            }

            if !mentions_color_function(&value) {
                if let Cow::Owned(expanded) = value {
                    out.push_str(&css[cursor..decl.value.start]);
                    out.push_str(&expanded);
                    cursor = decl.value.end;
                }
                continue;
            }

            let rewritten = self.rewrite_declaration(&value);
            for diagnostic in &rewritten.diagnostics {
                report(diagnostic.to_string());
            }
            if rewritten.exhausted {
                report(format!(
                    "Gave up after {} passes; nested lighten()/darken() calls remain unresolved",
                    rewritten.passes
                ));
            }

            if rewritten.value != raw_value {
                out.push_str(&css[cursor..decl.value.start]);
                out.push_str(&rewritten.value);
                cursor = decl.value.end;
            }
        }

        out.push_str(&css[cursor..]);
        Processed { css: out, warnings }
    }

    /// Rewrite one declaration value, revisiting it after every pass that
    /// made progress so nested calls resolve from the inside out.
    pub fn rewrite_declaration(&self, value: &str) -> DeclarationRewrite {
        let mut current = value.to_string();
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let mut pending = false;
        let mut passes = 0;

        while passes < self.max_passes {
            passes += 1;
            let outcome = rewrite::rewrite_value(&current);

            for diagnostic in outcome.diagnostics.iter() {
                if !diagnostics.contains(diagnostic) {
                    diagnostics.push(diagnostic.clone());
                }
            }

            let changed = outcome.changed();
            pending = outcome.deferred > 0;
            current = outcome.value;
            debug!(passes, changed, pending, "rewrote {current}");

            if !changed || !pending {
                pending = false;
                break;
            }
        }

        DeclarationRewrite {
            value: current,
            diagnostics,
            passes,
            exhausted: pending,
        }
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

/// Cheap pre-check so untouched declarations skip parsing.
fn mentions_color_function(value: &str) -> bool {
    value.contains("lighten") || value.contains("darken")
}

/// Replace known `$name` references; unknown ones are left and reported.
fn substitute_variables<'v>(
    value: &'v str,
    variables: &HashMap<String, String>,
    report: &mut impl FnMut(String),
) -> Cow<'v, str> {
    if !value.contains('$') {
        return Cow::Borrowed(value);
    }

    let mut expanded = String::with_capacity(value.len());
    let mut cursor = 0;

    for reference in scan::variable_references(value) {
        let name = &value[reference.start + 1..reference.end];
        match variables.get(name) {
            Some(replacement) => {
                expanded.push_str(&value[cursor..reference.start]);
                expanded.push_str(replacement);
                cursor = reference.end;
            }
            None => report(format!("Undefined variable ${name}")),
        }
    }

    if cursor == 0 {
        return Cow::Borrowed(value);
    }
    expanded.push_str(&value[cursor..]);
    Cow::Owned(expanded)
}

fn skip_whitespace(css: &str, from: usize) -> usize {
    let rest = &css[from..];
    from + (rest.len() - rest.trim_start().len())
}

//! Token-level scanning of stylesheet text.
//!
//! Declarations and `$variable` references are located with `cssparser`
//! and reported as byte ranges into the scanned text, so callers can splice
//! replacements without disturbing anything else.
//!
//! A statement ending in a `{...}` block is a rule or at-rule prelude and
//! the block is scanned in turn. A statement ending in `;`, `}` or end of
//! input that has a `:` outside any parentheses is a declaration.

use std::ops::Range;

use cssparser::{ParseError, Parser, ParserInput, Token};

use crate::value::{MAX_NESTING, skip_block};

/// Byte ranges and position of one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Declaration {
    /// Start of the property name.
    pub start: usize,
    /// End of the statement, past a `;` terminator if there is one.
    pub end: usize,
    /// 1-based line of the property name.
    pub line: usize,
    /// 1-based column of the property name, in UTF-16 code units.
    pub column: usize,
    pub property: Range<usize>,
    /// The value with surrounding whitespace and comments excluded.
    pub value: Range<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Start {
    offset: usize,
    line: usize,
    column: usize,
}

/// Scan state for the statement currently being read.
#[derive(Debug, Default)]
struct Statement {
    start: Option<Start>,
    /// End of the last token that wasn't whitespace or a comment.
    last_end: usize,
    /// End of the property name, once the `:` has been seen.
    property_end: Option<usize>,
    colon_end: usize,
    value_start: Option<usize>,
}

impl Statement {
    /// Close the statement at `end` and reset.
    fn finish(&mut self, css: &str, end: usize) -> Option<Declaration> {
        let statement = std::mem::take(self);
        let start = statement.start?;
        let property_end = statement.property_end?;

        let property = &css[start.offset..property_end];
        if property.is_empty() || property.starts_with('@') {
            return None;
        }

        let value = match statement.value_start {
            Some(value_start) => value_start..statement.last_end,
            None => statement.colon_end..statement.colon_end,
        };

        Some(Declaration {
            start: start.offset,
            end,
            line: start.line,
            column: start.column,
            property: start.offset..property_end,
            value,
        })
    }
}

/// Find every declaration in `css`, in source order.
pub(crate) fn declarations(css: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut found = Vec::new();
    scan_block(&mut parser, css, 0, &mut found);
    found
}

fn scan_block<'i>(
    input: &mut Parser<'i, '_>,
    css: &str,
    depth: usize,
    found: &mut Vec<Declaration>,
) {
    let mut statement = Statement::default();

    loop {
        let before = input.position().byte_index();
        let location = input.current_source_location();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        let trivia = matches!(token, Token::WhiteSpace(_) | Token::Comment(_));
        if statement.start.is_none() && !trivia {
            statement.start = Some(Start {
                offset: before,
                line: location.line as usize + 1,
                column: location.column as usize,
            });
        }

        match token {
            Token::WhiteSpace(_) | Token::Comment(_) => {}
            Token::Semicolon => {
                let end = input.position().byte_index();
                found.extend(statement.finish(css, end));
            }
            Token::CloseCurlyBracket => {
                // Stray closer at the top level
                found.extend(statement.finish(css, before));
            }
            Token::CurlyBracketBlock => {
                statement = Statement::default();
                if depth < MAX_NESTING {
                    let _ = input.parse_nested_block(|nested| {
                        scan_block(nested, css, depth + 1, found);
                        Ok::<(), ParseError<'i, ()>>(())
                    });
                } else {
                    skip_block(input);
                }
            }
            Token::Colon if statement.property_end.is_none() => {
                let property_start = statement.start.map_or(before, |start| start.offset);
                statement.property_end = Some(statement.last_end.max(property_start));
                statement.colon_end = input.position().byte_index();
            }
            other => {
                if matches!(
                    other,
                    Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock
                ) {
                    skip_block(input);
                }
                if statement.property_end.is_some() && statement.value_start.is_none() {
                    statement.value_start = Some(before);
                }
                statement.last_end = input.position().byte_index();
            }
        }
    }

    let end = input.position().byte_index();
    found.extend(statement.finish(css, end));
}

/// Byte ranges of the `$name` references in a declaration value, `$`
/// included. Quoted strings and comments are not searched.
pub(crate) fn variable_references(value: &str) -> Vec<Range<usize>> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    let mut references = Vec::new();
    collect_variables(&mut parser, 0, &mut references);
    references
}

fn collect_variables<'i>(
    input: &mut Parser<'i, '_>,
    depth: usize,
    references: &mut Vec<Range<usize>>,
) {
    let mut sigil: Option<usize> = None;

    loop {
        let before = input.position().byte_index();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match (sigil.take(), token) {
            (_, Token::Delim('$')) => sigil = Some(before),
            (Some(start), Token::Ident(_)) => {
                references.push(start..input.position().byte_index());
            }
            (
                _,
                Token::Function(_)
                | Token::ParenthesisBlock
                | Token::SquareBracketBlock
                | Token::CurlyBracketBlock,
            ) => {
                if depth < MAX_NESTING {
                    let _ = input.parse_nested_block(|nested| {
                        collect_variables(nested, depth + 1, references);
                        Ok::<(), ParseError<'i, ()>>(())
                    });
                } else {
                    skip_block(input);
                }
            }
            _ => {}
        }
    }
}

//! CSS value trees.
//!
//! A declaration value is tokenized with `cssparser` and grouped into a flat
//! sequence of literals, dividers and function calls, with function
//! arguments parsed recursively. Every node carries the exact source text
//! of its tokens, so serializing a freshly parsed tree reproduces the input
//! verbatim.
//!
//! - Literals are runs of adjacent word tokens (`#fff`, `10%`, `!important`)
//!   and unquoted `url(...)` tokens.
//! - Quoted strings are kept apart from literals and are never arguments.
//! - Dividers are the trivia between terms: a run of whitespace and comments
//!   containing at most one `,`, `/` or `:` separator.
//! - Function calls hold their name and argument nodes. An unterminated call
//!   at the end of input is kept as written (no `)` is added).
//! - Calls nested deeper than [`MAX_NESTING`] and `[...]`/`{...}` blocks are
//!   kept as single literals.

use std::fmt;

use cssparser::{ParseError, Parser, ParserInput, SourcePosition, Token};

/// Deepest call nesting that is parsed into nodes.
pub const MAX_NESTING: usize = 64;

/// One node of a parsed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Literal(String),
    /// A quoted string, quotes included.
    Quoted(String),
    Divider(String),
    Function(Function),
}

/// A function call such as `lighten(#fff, 10%)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// Name as written, empty for a bare `(...)` group.
    pub name: String,
    pub nodes: Vec<Node>,
    /// Whether the call was terminated by `)`.
    pub closed: bool,
}

impl Function {
    /// Argument terms: words and nested calls. Dividers and quoted strings
    /// are skipped.
    pub fn arguments(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Literal(_) | Node::Function(_)))
    }
}

/// A parsed declaration value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueTree {
    pub nodes: Vec<Node>,
}

impl ValueTree {
    /// Parse a declaration value. Parsing never fails; malformed input
    /// degrades to literal text.
    pub fn parse(value: &str) -> Self {
        let mut input = ParserInput::new(value);
        let mut parser = Parser::new(&mut input);
        Self {
            nodes: parse_nodes(&mut parser, 0),
        }
    }

    /// Visit every function call depth-first, parent before children.
    ///
    /// The callback may replace a call's name and arguments; traversal then
    /// continues into the replacement arguments.
    pub fn walk_functions_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Function),
    {
        walk_nodes_mut(&mut self.nodes, &mut f);
    }
}

fn walk_nodes_mut<F>(nodes: &mut [Node], f: &mut F)
where
    F: FnMut(&mut Function),
{
    for node in nodes {
        if let Node::Function(function) = node {
            f(function);
            walk_nodes_mut(&mut function.nodes, f);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal(text) | Node::Quoted(text) | Node::Divider(text) => f.write_str(text),
            Node::Function(function) => write!(f, "{function}"),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for node in &self.nodes {
            write!(f, "{node}")?;
        }
        if self.closed {
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Display for ValueTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

/// A run of tokens that becomes one node once it ends.
#[derive(Debug, Clone, Copy)]
enum Run {
    Divider {
        start: SourcePosition,
        separated: bool,
    },
    Word {
        start: SourcePosition,
    },
}

fn finish_run(input: &Parser<'_, '_>, run: &mut Option<Run>, end: SourcePosition, nodes: &mut Vec<Node>) {
    let node = match run.take() {
        Some(Run::Divider { start, .. }) => Node::Divider(input.slice(start..end).to_string()),
        Some(Run::Word { start }) => Node::Literal(input.slice(start..end).to_string()),
        None => return,
    };
    nodes.push(node);
}

/// Parse nodes until the end of `input`, which for a nested parser is the
/// closing `)` of the enclosing call.
fn parse_nodes(input: &mut Parser<'_, '_>, depth: usize) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut run: Option<Run> = None;

    loop {
        let start = input.position();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::WhiteSpace(_) | Token::Comment(_) => {
                if !matches!(run, Some(Run::Divider { .. })) {
                    finish_run(input, &mut run, start, &mut nodes);
                    run = Some(Run::Divider {
                        start,
                        separated: false,
                    });
                }
            }
            Token::Comma | Token::Colon | Token::Delim('/') => match run {
                Some(Run::Divider {
                    start: open,
                    separated: false,
                }) => {
                    run = Some(Run::Divider {
                        start: open,
                        separated: true,
                    });
                }
                _ => {
                    finish_run(input, &mut run, start, &mut nodes);
                    run = Some(Run::Divider {
                        start,
                        separated: true,
                    });
                }
            },
            Token::Function(_) | Token::ParenthesisBlock => {
                finish_run(input, &mut run, start, &mut nodes);
                nodes.push(parse_call(input, start, depth));
            }
            Token::SquareBracketBlock | Token::CurlyBracketBlock => {
                finish_run(input, &mut run, start, &mut nodes);
                skip_block(input);
                nodes.push(Node::Literal(input.slice_from(start).to_string()));
            }
            Token::QuotedString(_) | Token::BadString(_) => {
                finish_run(input, &mut run, start, &mut nodes);
                nodes.push(Node::Quoted(input.slice_from(start).to_string()));
            }
            Token::CloseParenthesis | Token::CloseSquareBracket | Token::CloseCurlyBracket => {
                // Stray closer
                finish_run(input, &mut run, start, &mut nodes);
                nodes.push(Node::Literal(input.slice_from(start).to_string()));
            }
            _ => {
                if !matches!(run, Some(Run::Word { .. })) {
                    finish_run(input, &mut run, start, &mut nodes);
                    run = Some(Run::Word { start });
                }
            }
        }
    }

    let end = input.position();
    finish_run(input, &mut run, end, &mut nodes);
    nodes
}

/// Parse a call whose `name(` (or bare `(`) token starting at `start` was
/// just consumed.
fn parse_call<'i>(input: &mut Parser<'i, '_>, start: SourcePosition, depth: usize) -> Node {
    if depth >= MAX_NESTING {
        skip_block(input);
        return Node::Literal(input.slice_from(start).to_string());
    }

    let opening = input.slice_from(start);
    let name = opening.strip_suffix('(').unwrap_or(opening).to_string();

    let mut nodes = Vec::new();
    let mut end = input.position();
    let _ = input.parse_nested_block(|nested| {
        nodes = parse_nodes(nested, depth + 1);
        end = nested.position();
        Ok::<(), ParseError<'i, ()>>(())
    });

    // Anything consumed past the arguments is the closing `)`
    let closed = !input.slice(end..input.position()).is_empty();

    Node::Function(Function {
        name,
        nodes,
        closed,
    })
}

/// Consume the block whose opening token was just returned.
pub(crate) fn skip_block<'i>(input: &mut Parser<'i, '_>) {
    let _ = input.parse_nested_block(|nested| {
        while nested.next_including_whitespace_and_comments().is_ok() {}
        Ok::<(), ParseError<'i, ()>>(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(text: &str) -> Node {
        Node::Literal(text.to_string())
    }

    fn quoted(text: &str) -> Node {
        Node::Quoted(text.to_string())
    }

    fn divider(text: &str) -> Node {
        Node::Divider(text.to_string())
    }

    fn call(name: &str, nodes: Vec<Node>) -> Node {
        Node::Function(Function {
            name: name.to_string(),
            nodes,
            closed: true,
        })
    }

    fn depth(nodes: &[Node]) -> usize {
        nodes
            .iter()
            .map(|node| match node {
                Node::Function(f) => 1 + depth(&f.nodes),
                _ => 0,
            })
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_parse_simple_call() {
        let tree = ValueTree::parse("lighten(#5E6469, 57%)");
        assert_eq!(
            tree.nodes,
            vec![call(
                "lighten",
                vec![literal("#5E6469"), divider(", "), literal("57%")]
            )]
        );
    }

    #[test]
    fn test_parse_nested_call() {
        let tree = ValueTree::parse("darken(lighten(#fff, 1%), 3%)");
        assert_eq!(
            tree.nodes,
            vec![call(
                "darken",
                vec![
                    call("lighten", vec![literal("#fff"), divider(", "), literal("1%")]),
                    divider(", "),
                    literal("3%"),
                ]
            )]
        );
    }

    #[test]
    fn test_parse_space_separated_terms() {
        let tree = ValueTree::parse("1px solid lighten(#000, 5%)");
        assert_eq!(tree.nodes.len(), 5);
        assert_eq!(tree.nodes[0], literal("1px"));
        assert_eq!(tree.nodes[1], divider(" "));
        assert_eq!(tree.nodes[2], literal("solid"));
        assert!(matches!(&tree.nodes[4], Node::Function(f) if f.name == "lighten"));
    }

    #[test]
    fn test_adjacent_tokens_form_one_literal() {
        let tree = ValueTree::parse("red!important -1.5e2px");
        assert_eq!(
            tree.nodes,
            vec![literal("red!important"), divider(" "), literal("-1.5e2px")]
        );
    }

    #[test]
    fn test_divider_holds_at_most_one_separator() {
        let tree = ValueTree::parse("a , ,b");
        assert_eq!(
            tree.nodes,
            vec![literal("a"), divider(" , "), divider(","), literal("b")]
        );
    }

    #[test]
    fn test_comments_are_dividers() {
        let tree = ValueTree::parse("a /* note */ b");
        assert_eq!(tree.nodes, vec![literal("a"), divider(" /* note */ "), literal("b")]);
    }

    #[test]
    fn test_quoted_strings_are_separate_nodes() {
        let tree = ValueTree::parse(r#""a, (b" 'c\'d'"#);
        assert_eq!(
            tree.nodes,
            vec![quoted(r#""a, (b""#), divider(" "), quoted(r"'c\'d'")]
        );
    }

    #[test]
    fn test_unquoted_url_is_opaque() {
        let tree = ValueTree::parse("url(http://x.test/a,b.png) no-repeat");
        assert_eq!(tree.nodes[0], literal("url(http://x.test/a,b.png)"));
        assert_eq!(tree.nodes[2], literal("no-repeat"));
    }

    #[test]
    fn test_bracket_blocks_are_single_literals() {
        let tree = ValueTree::parse("[full-start] minmax(1em, 1fr)");
        assert_eq!(tree.nodes[0], literal("[full-start]"));
        assert!(matches!(&tree.nodes[2], Node::Function(f) if f.name == "minmax"));
    }

    #[test]
    fn test_bare_group_is_unnamed_call() {
        let tree = ValueTree::parse("(a)");
        assert_eq!(tree.nodes, vec![call("", vec![literal("a")])]);
    }

    #[test]
    fn test_unclosed_call_is_kept_open() {
        let tree = ValueTree::parse("lighten(#fff, 10%");
        match &tree.nodes[0] {
            Node::Function(f) => {
                assert_eq!(f.name, "lighten");
                assert!(!f.closed);
            }
            other => panic!("expected function, got {other:?}"),
        }
        assert_eq!(tree.to_string(), "lighten(#fff, 10%");
    }

    #[test]
    fn test_round_trip_preserves_input() {
        for value in [
            "",
            "red",
            "  1px  solid #fff ",
            "rgba(0,0,0,.5) , hsla( 1 , 2% , 3% , 1 )",
            "calc(100% - (2 * var(--gap, 4px)))",
            "url( 'a b.png' ) / auto",
            "url(data:image/png;base64,AAAA)",
            "\"unterminated",
            "a) b",
            "f(a] b) }",
            "font: 12px/1.5 \"Helvetica Neue\", sans-serif !important",
            "f(g(h(",
            "/* only a comment",
            "é(ü, ß)",
            r"a\(b c\,d",
        ] {
            let tree = ValueTree::parse(value);
            let serialized = tree.to_string();
            assert_eq!(serialized, value);
            assert_eq!(ValueTree::parse(&serialized), tree);
        }
    }

    #[test]
    fn test_deep_nesting_is_capped() {
        let value = "(".repeat(100_000);
        let tree = ValueTree::parse(&value);
        assert_eq!(tree.to_string(), value);
        assert_eq!(depth(&tree.nodes), MAX_NESTING);
    }

    #[test]
    fn test_calls_past_nesting_cap_are_literals() {
        let inner = "lighten(".repeat(MAX_NESTING + 10) + "#fff, 1%" + &")".repeat(MAX_NESTING + 10);
        let tree = ValueTree::parse(&inner);
        assert_eq!(tree.to_string(), inner);
        assert_eq!(depth(&tree.nodes), MAX_NESTING);
    }

    #[test]
    fn test_arguments_skip_dividers_and_strings() {
        let tree = ValueTree::parse("lighten( #fff ,\"x\", 10% )");
        let Node::Function(f) = &tree.nodes[0] else {
            panic!("expected function");
        };
        let args: Vec<&Node> = f.arguments().collect();
        assert_eq!(args, vec![&literal("#fff"), &literal("10%")]);
    }

    #[test]
    fn test_walk_visits_parents_before_children() {
        let mut tree = ValueTree::parse("a(b(c()), d())");
        let mut seen = Vec::new();
        tree.walk_functions_mut(|f| seen.push(f.name.clone()));
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_walk_descends_into_replaced_arguments() {
        let mut tree = ValueTree::parse("outer(x)");
        let mut seen = Vec::new();
        tree.walk_functions_mut(|f| {
            seen.push(f.name.clone());
            if f.name == "outer" {
                f.nodes = vec![call("inner", Vec::new())];
            }
        });
        assert_eq!(seen, vec!["outer", "inner"]);
        assert_eq!(tree.to_string(), "outer(inner())");
    }
}

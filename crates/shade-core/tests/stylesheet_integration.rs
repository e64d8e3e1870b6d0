//! End-to-end stylesheet fixtures.

use shade_core::{Config, Processor};

fn run(input: &str, output: &str) {
    let processed = Processor::new(&Config::default()).process(input);
    assert_eq!(processed.css, output);
    assert!(
        processed.warnings.is_empty(),
        "unexpected warnings: {:?}",
        processed.warnings
    );
}

#[test]
fn test_lighten_hex_in_rule() {
    run(
        "td { background: lighten(#5E6469, 57%); }",
        "td { background: hsla(207, 6%, 96%, 1); }",
    );
}

#[test]
fn test_lighten_hsla_in_rule() {
    run(
        "td { background: lighten(hsla(197, 100%, 50%, 1), 10%); }",
        "td { background: hsla(197, 100%, 60%, 1); }",
    );
}

#[test]
fn test_darken_top_level_declaration() {
    run(
        "background: darken(#f0f0f0, 15%);",
        "background: hsla(0, 0%, 79%, 1);",
    );
}

#[test]
fn test_nested_darken_through_variables() {
    run(
        "$primary-color: #5E6469;\n\
         $table-stripe-color: lighten($primary-color, 57%);\n\
         \n\
         td { background: darken($table-stripe-color, 3%); }",
        "td { background: hsla(207, 6%, 93%, 1); }",
    );
}

#[test]
fn test_output_is_a_fixed_point() {
    let processor = Processor::default();
    let input = "\
        .a { color: lighten(#5E6469, 57%); }\n\
        .b { color: darken(lighten(#5E6469, 57%), 3%); }\n\
        .c { border: 1px solid darken(#f0f0f0, 15%); }\n";

    let once = processor.process(input);
    let twice = processor.process(&once.css);
    assert_eq!(twice.css, once.css);
    assert!(twice.warnings.is_empty());
}

#[test]
fn test_stylesheet_without_calls_is_unchanged() {
    let input = "@charset \"utf-8\";\n\
                 :root { --gap: 4px; }\n\
                 a:hover, a:focus { color: hsla(10, 20%, 30%, 1); /* darken later */ }\n\
                 @media (max-width: 600px) { a { margin: calc(var(--gap) * 2) } }\n";
    run(input, input);
}

#[test]
fn test_invalid_calls_warn_and_pass_through() {
    let input = "a {\n  color: lighten(#fff);\n  background: darken(red, 10%);\n  border-color: lighten(#fff, 10);\n}\n";
    let processed = Processor::default().process(input);

    assert_eq!(processed.css, input);
    let lines: Vec<usize> = processed.warnings.iter().map(|w| w.line).collect();
    assert_eq!(lines, vec![2, 3, 4]);
    assert!(processed.warnings[2].message.contains("Second argument must be a percentage"));
}

//! Property tests for lexer losslessness and parser totality.
//!
//! Inputs are assembled from Gherkin-shaped line fragments, arbitrary text
//! and every supported line terminator, so the generated documents hit
//! keyword, tag, table and docstring paths as well as garbage lines.

use proptest::prelude::*;
use shiftlefter_gherkin::{TokenKind, lex, parse, parse_str, reconstruct};

fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Feature: F".to_string()),
        Just("  Rule: R".to_string()),
        Just("  Background:".to_string()),
        Just("  Scenario: S".to_string()),
        Just("  Scenario Outline: <x>".to_string()),
        Just("    Examples:".to_string()),
        Just("    Given a <x> step".to_string()),
        Just("    And more +".to_string()),
        Just("    * star".to_string()),
        Just("      | a | b\\|c |".to_string()),
        Just("      \"\"\"".to_string()),
        Just("      ```json".to_string()),
        Just("@tag @other".to_string()),
        Just("@bad tag".to_string()),
        Just("# language: fr".to_string()),
        Just("# language: xx".to_string()),
        Just("Fonctionnalité: F".to_string()),
        Just("# comment".to_string()),
        Just("\t ".to_string()),
        Just(String::new()),
        "[^\r\n]{0,24}",
    ]
}

fn terminator() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("\n"), Just("\r\n"), Just("\r")]
}

fn document() -> impl Strategy<Value = String> {
    (
        prop::collection::vec((fragment(), terminator()), 0..24),
        fragment(),
    )
        .prop_map(|(lines, last)| {
            let mut doc: String = lines
                .into_iter()
                .map(|(line, eol)| format!("{line}{eol}"))
                .collect();
            doc.push_str(&last);
            doc
        })
}

proptest! {
    #[test]
    fn reconstruct_is_identity(doc in document()) {
        prop_assert_eq!(reconstruct(&lex(&doc)), doc);
    }

    #[test]
    fn arbitrary_text_roundtrips(doc in "(?s).{0,200}") {
        prop_assert_eq!(reconstruct(&lex(&doc)), doc);
    }

    #[test]
    fn tokens_are_indexed_and_end_with_eof(doc in document()) {
        let tokens = lex(&doc);
        for (expected, token) in tokens.iter().enumerate() {
            prop_assert_eq!(token.index, expected);
        }
        let last = tokens.last().map(|t| matches!(t.kind, TokenKind::Eof));
        prop_assert_eq!(last, Some(true));
        let eofs = tokens.iter().filter(|t| t.is_eof()).count();
        prop_assert_eq!(eofs, 1);
    }

    #[test]
    fn lines_increase_by_one(doc in document()) {
        let tokens = lex(&doc);
        for pair in tokens.windows(2) {
            if let [before, after] = pair {
                prop_assert_eq!(after.location.line, before.location.line + 1);
            }
        }
    }

    #[test]
    fn parser_is_total_and_errors_are_sorted(doc in document()) {
        let result = parse_str(&doc);
        let locations: Vec<_> = result.errors.iter().map(|e| e.location).collect();
        let mut sorted = locations.clone();
        sorted.sort();
        prop_assert_eq!(locations, sorted);
        prop_assert_eq!(reconstruct(&result.tokens), doc);
    }

    #[test]
    fn spans_stay_within_tokens(doc in document()) {
        let result = parse(lex(&doc));
        for feature in result.features() {
            prop_assert!(feature.span.start <= feature.span.end);
            prop_assert!(feature.span.end < result.tokens.len());
            let text = result.source_text(feature.span);
            prop_assert!(doc.contains(&text));
        }
    }
}

//! The elapsed-time expression grammar and its evaluator.
//!
//! Grammar (keywords case-insensitive, tokens whitespace-separated):
//!
//! ```text
//! unit       ::= year(s) | week(s) | day(s) | hour(s)
//!              | minute(s) | min(s) | second(s) | sec(s)
//! term       ::= <non-negative integer> <unit>
//! expression ::= term+ "late"
//! ```
//!
//! The grammar is regular, so a single left-to-right pass over the tokens is
//! enough — no combinator machinery. Each term's unit keyword is
//! canonicalized first, then `quantity × seconds_per(unit)` is accumulated
//! across terms. The trailing `late` keyword fixes the direction sign at +1;
//! no opposite keyword exists, so totals are always non-negative.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ParseError;
use crate::unit::TimeUnit;

/// The mandatory direction keyword terminating every expression.
const DIRECTION_LATE: &str = "late";

// ── Data model ──────────────────────────────────────────────────────────────

/// One `<quantity> <unit>` pair within an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Term {
    /// The non-negative quantity as written.
    pub quantity: u64,
    /// The canonical unit.
    pub unit: TimeUnit,
}

impl Term {
    /// Seconds this term contributes to the total.
    pub fn delta_seconds(&self) -> f64 {
        self.quantity as f64 * self.unit.seconds_per() as f64
    }
}

/// A fully parsed elapsed-time expression.
///
/// Constructed by [`parse`]; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeTime {
    /// The terms in input order. Repeated units stay separate.
    pub terms: Vec<Term>,
    /// Sum of all terms' seconds. The `late` direction keyword contributes
    /// a multiplier of +1, so this is never negative.
    pub total_seconds: f64,
    /// The input with whitespace runs collapsed to single spaces and outer
    /// whitespace trimmed.
    pub original: String,
}

impl RelativeTime {
    /// The absolute instant this offset points at, counted backwards from a
    /// caller-supplied anchor.
    ///
    /// The anchor is explicit — typically `Utc::now()` at the call site —
    /// so this stays a pure function.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    ///
    /// let seen = lateness::parse("2 days late").unwrap();
    /// let anchor = Utc.with_ymd_and_hms(2026, 3, 16, 12, 0, 0).unwrap();
    /// assert_eq!(
    ///     seen.resolve_before(anchor),
    ///     Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap(),
    /// );
    /// ```
    pub fn resolve_before(&self, anchor: DateTime<Utc>) -> DateTime<Utc> {
        anchor - chrono::Duration::seconds(self.total_seconds as i64)
    }
}

// ── Parsing ─────────────────────────────────────────────────────────────────

/// Parse an elapsed-time expression like `"2 days 3 hours late"`.
///
/// Pure function of its input; safe to call from anywhere without
/// coordination. The whole input must match the grammar — a quantity of 0 is
/// legal, repeated units are summed, and nothing may follow the `late`
/// keyword.
///
/// # Errors
///
/// Returns a [`ParseError`] carrying the input and the byte offset of the
/// failure when the input does not match the grammar: empty input, a
/// non-integer or negative quantity, an unknown unit keyword, a missing
/// `late` marker, or trailing tokens.
///
/// # Examples
///
/// ```
/// let parsed = lateness::parse("10 mins late").unwrap();
/// assert_eq!(parsed.total_seconds, 600.0);
///
/// assert!(lateness::parse("10 mins").is_err());
/// ```
pub fn parse(input: &str) -> Result<RelativeTime, ParseError> {
    let tokens = tokenize(input);
    let mut terms = Vec::new();
    let mut i = 0;

    loop {
        let Some(token) = tokens.get(i) else {
            return Err(if terms.is_empty() {
                ParseError::Empty {
                    input: input.to_string(),
                }
            } else {
                ParseError::MissingDirection {
                    input: input.to_string(),
                    offset: input.len(),
                }
            });
        };

        if token.text.eq_ignore_ascii_case(DIRECTION_LATE) && !terms.is_empty() {
            if let Some(extra) = tokens.get(i + 1) {
                return Err(ParseError::TrailingInput {
                    input: input.to_string(),
                    rest: extra.text.to_string(),
                    offset: extra.offset,
                });
            }
            break;
        }

        let quantity = parse_quantity(token, input)?;
        let Some(unit_token) = tokens.get(i + 1) else {
            return Err(ParseError::ExpectedUnit {
                input: input.to_string(),
                offset: input.len(),
            });
        };
        let unit = TimeUnit::from_keyword(unit_token.text).ok_or_else(|| {
            ParseError::UnknownUnit {
                input: input.to_string(),
                word: unit_token.text.to_string(),
                offset: unit_token.offset,
            }
        })?;

        terms.push(Term { quantity, unit });
        i += 2;
    }

    let total_seconds = terms.iter().map(Term::delta_seconds).sum();

    Ok(RelativeTime {
        terms,
        total_seconds,
        original: normalize(input),
    })
}

/// A whitespace-delimited token and its byte offset in the input.
struct Token<'a> {
    text: &'a str,
    offset: usize,
}

/// Split on whitespace runs, keeping byte offsets for error reporting.
fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, ch) in input.char_indices() {
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(Token {
                    text: &input[s..i],
                    offset: s,
                });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            text: &input[s..],
            offset: s,
        });
    }
    tokens
}

/// A quantity is a bare run of ASCII digits — no sign, no decimal point.
fn parse_quantity(token: &Token<'_>, input: &str) -> Result<u64, ParseError> {
    if token.text.is_empty() || !token.text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::ExpectedQuantity {
            input: input.to_string(),
            offset: token.offset,
        });
    }
    token
        .text
        .parse()
        .map_err(|_| ParseError::QuantityOutOfRange {
            input: input.to_string(),
            quantity: token.text.to_string(),
            offset: token.offset,
        })
}

/// Collapse whitespace runs to single spaces and trim the ends.
fn normalize(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_reference_expressions() {
        for (input, expected) in [
            ("10 secs late", 10.0),
            ("100 secs late", 100.0),
            ("10 mins late", 600.0),
            ("1 hour late", 3_600.0),
            ("2 hours late", 7_200.0),
            ("1 day late", 86_400.0),
            ("2 days late", 172_800.0),
            ("2 days 3 hours late", 183_600.0),
        ] {
            let parsed = parse(input).unwrap();
            assert_eq!(parsed.total_seconds, expected, "input: {input}");
        }
    }

    #[test]
    fn test_every_unit_times_quantity() {
        for unit in [
            TimeUnit::Year,
            TimeUnit::Week,
            TimeUnit::Day,
            TimeUnit::Hour,
            TimeUnit::Minute,
            TimeUnit::Second,
        ] {
            for quantity in [0u64, 1, 2, 17, 365] {
                let input = format!("{quantity} {unit} late");
                let parsed = parse(&input).unwrap();
                assert_eq!(
                    parsed.total_seconds,
                    quantity as f64 * unit.seconds_per() as f64,
                    "input: {input}"
                );
            }
        }
    }

    #[test]
    fn test_year_is_a_flat_365_days() {
        assert_eq!(parse("1 year late").unwrap().total_seconds, 31_536_000.0);
    }

    #[test]
    fn test_zero_quantity_contributes_nothing() {
        let parsed = parse("0 days 5 secs late").unwrap();
        assert_eq!(parsed.total_seconds, 5.0);
    }

    #[test]
    fn test_plural_is_quantity_independent() {
        assert_eq!(
            parse("1 days late").unwrap().total_seconds,
            parse("1 day late").unwrap().total_seconds,
        );
        assert_eq!(
            parse("2 day late").unwrap().total_seconds,
            parse("2 days late").unwrap().total_seconds,
        );
    }

    #[test]
    fn test_abbreviations_match_full_words() {
        assert_eq!(
            parse("10 min late").unwrap().total_seconds,
            parse("10 minutes late").unwrap().total_seconds,
        );
        assert_eq!(
            parse("10 secs late").unwrap().total_seconds,
            parse("10 seconds late").unwrap().total_seconds,
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let parsed = parse("2 DAYS 3 Hours LATE").unwrap();
        assert_eq!(parsed.total_seconds, 183_600.0);
    }

    #[test]
    fn test_repeated_units_are_summed_not_merged() {
        let parsed = parse("1 day 1 day late").unwrap();
        assert_eq!(parsed.total_seconds, 172_800.0);
        assert_eq!(
            parsed.terms,
            vec![
                Term {
                    quantity: 1,
                    unit: TimeUnit::Day
                },
                Term {
                    quantity: 1,
                    unit: TimeUnit::Day
                },
            ]
        );
    }

    #[test]
    fn test_original_collapses_whitespace() {
        let parsed = parse("  2   days \t 3  hours   late ").unwrap();
        assert_eq!(parsed.original, "2 days 3 hours late");
        assert_eq!(parsed.total_seconds, 183_600.0);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(parse(""), Err(ParseError::Empty { .. })));
        assert!(matches!(parse("   \t "), Err(ParseError::Empty { .. })));
    }

    #[test]
    fn test_missing_late_marker_is_rejected() {
        let err = parse("2 days 3 hours").unwrap_err();
        assert!(matches!(err, ParseError::MissingDirection { .. }));
        assert_eq!(err.offset(), "2 days 3 hours".len());
    }

    #[test]
    fn test_bare_late_is_rejected() {
        // "late" with no preceding term is an empty term list, which reads
        // as a token where a quantity was required.
        assert!(matches!(
            parse("late"),
            Err(ParseError::ExpectedQuantity { .. })
        ));
    }

    #[test]
    fn test_unknown_unit_is_rejected() {
        let err = parse("2 fortnights late").unwrap_err();
        match err {
            ParseError::UnknownUnit { word, offset, .. } => {
                assert_eq!(word, "fortnights");
                assert_eq!(offset, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_quantity_without_unit_is_rejected() {
        assert!(matches!(parse("2"), Err(ParseError::ExpectedUnit { .. })));
        // A quantity directly followed by the direction keyword has no unit;
        // the keyword lands in unit position and is not a unit.
        assert!(matches!(
            parse("2 late"),
            Err(ParseError::UnknownUnit { .. })
        ));
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        assert!(matches!(
            parse("-2 days late"),
            Err(ParseError::ExpectedQuantity { .. })
        ));
    }

    #[test]
    fn test_non_integer_quantity_is_rejected() {
        assert!(matches!(
            parse("2.5 hours late"),
            Err(ParseError::ExpectedQuantity { .. })
        ));
        assert!(matches!(
            parse("+2 hours late"),
            Err(ParseError::ExpectedQuantity { .. })
        ));
    }

    #[test]
    fn test_oversized_quantity_is_rejected() {
        assert!(matches!(
            parse("99999999999999999999999 secs late"),
            Err(ParseError::QuantityOutOfRange { .. })
        ));
    }

    #[test]
    fn test_trailing_input_is_rejected() {
        let err = parse("2 days late again").unwrap_err();
        match err {
            ParseError::TrailingInput { rest, offset, .. } => {
                assert_eq!(rest, "again");
                assert_eq!(offset, 12);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_reports_input_and_offset() {
        let err = parse("10 bogus late").unwrap_err();
        assert_eq!(err.input(), "10 bogus late");
        assert_eq!(err.offset(), 3);
    }

    #[test]
    fn test_resolve_before_anchor() {
        let anchor = Utc.with_ymd_and_hms(2026, 3, 16, 12, 0, 0).unwrap();
        let parsed = parse("2 days 3 hours late").unwrap();
        assert_eq!(
            parsed.resolve_before(anchor),
            Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap(),
        );
    }

    #[test]
    fn test_serializes_with_canonical_unit_names() {
        let parsed = parse("10 mins late").unwrap();
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["terms"][0]["unit"], "minute");
        assert_eq!(json["total_seconds"], 600.0);
        assert_eq!(json["original"], "10 mins late");
    }

    /// Every accepted spelling paired with its canonical unit.
    const SPELLINGS: &[(&str, TimeUnit)] = &[
        ("year", TimeUnit::Year),
        ("years", TimeUnit::Year),
        ("week", TimeUnit::Week),
        ("weeks", TimeUnit::Week),
        ("day", TimeUnit::Day),
        ("days", TimeUnit::Day),
        ("hour", TimeUnit::Hour),
        ("hours", TimeUnit::Hour),
        ("minute", TimeUnit::Minute),
        ("minutes", TimeUnit::Minute),
        ("min", TimeUnit::Minute),
        ("mins", TimeUnit::Minute),
        ("second", TimeUnit::Second),
        ("seconds", TimeUnit::Second),
        ("sec", TimeUnit::Second),
        ("secs", TimeUnit::Second),
    ];

    proptest! {
        #[test]
        fn prop_single_term_matches_unit_arithmetic(
            (spelling, unit) in prop::sample::select(SPELLINGS),
            quantity in 0u64..=1_000_000,
        ) {
            let parsed = parse(&format!("{quantity} {spelling} late")).unwrap();
            prop_assert_eq!(
                parsed.total_seconds,
                quantity as f64 * unit.seconds_per() as f64
            );
        }

        #[test]
        fn prop_multi_term_totals_are_summed(
            terms in prop::collection::vec(
                (0u64..=10_000, prop::sample::select(SPELLINGS)),
                1..6,
            ),
        ) {
            let body = terms
                .iter()
                .map(|(q, (spelling, _))| format!("{q} {spelling}"))
                .collect::<Vec<_>>()
                .join(" ");
            let parsed = parse(&format!("{body} late")).unwrap();
            let expected: f64 = terms
                .iter()
                .map(|(q, (_, unit))| *q as f64 * unit.seconds_per() as f64)
                .sum();
            prop_assert_eq!(parsed.total_seconds, expected);
        }

        #[test]
        fn prop_padding_never_changes_the_total(
            quantity in 0u64..=1_000_000,
            pad_left in "[ \t]{0,3}",
            pad_mid in "[ \t]{1,3}",
            pad_right in "[ \t]{0,3}",
        ) {
            let input = format!("{pad_left}{quantity}{pad_mid}mins {DIRECTION_LATE}{pad_right}");
            let parsed = parse(&input).unwrap();
            prop_assert_eq!(parsed.total_seconds, quantity as f64 * 60.0);
            prop_assert_eq!(parsed.original, format!("{quantity} mins late"));
        }
    }
}

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::contact::{split_lines, ContactPair};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// Digits are ASCII only; OCR output in other scripts never yields a number.
// Ten digits starting 6–9, optionally led by +91 with a space or hyphen.
re!(re_indian_mobile,
    r"(?:\+91[\s\-]?|\b)[6-9][0-9]{9}\b");
// Loose international grouping: country code, optional (area), two digit groups.
re!(re_international,
    r"(?:\+?[0-9]{1,3}[\-.\s]?)?(?:\(?[0-9]{3,5}\)?[\-.\s]?)?[0-9]{3,5}[\-.\s]?[0-9]{3,5}");

// ── Phone pattern policy ─────────────────────────────────────────────────────

/// Which phone-number pattern the extractor looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhonePattern {
    /// Indian mobile numbers: `[6-9]` followed by nine digits, optional `+91`.
    #[default]
    IndianMobile,
    /// Generic digit groupings with separators and parenthesized area codes.
    International,
}

impl PhonePattern {
    fn regex(self) -> &'static Regex {
        match self {
            PhonePattern::IndianMobile => re_indian_mobile(),
            PhonePattern::International => re_international(),
        }
    }
}

impl fmt::Display for PhonePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhonePattern::IndianMobile => write!(f, "indian_mobile"),
            PhonePattern::International => write!(f, "international"),
        }
    }
}

impl FromStr for PhonePattern {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "indian_mobile" => Ok(PhonePattern::IndianMobile),
            "international" => Ok(PhonePattern::International),
            other => Err(format!("Unknown phone pattern: '{other}'")),
        }
    }
}

// ── Public extraction API ─────────────────────────────────────────────────────

/// Splits OCR lines into contact pairs. Pure: the same lines always yield the
/// same pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactExtractor {
    pattern: PhonePattern,
}

impl ContactExtractor {
    pub fn new(pattern: PhonePattern) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> PhonePattern {
        self.pattern
    }

    /// Extract one candidate pair from a single line.
    ///
    /// All number matches are joined with a space. The name is the line with
    /// the first occurrence of that joined string removed, so when several
    /// matches are not adjacent the numbers stay inside the name.
    pub fn extract_line(&self, line: &str) -> ContactPair {
        let line = line.trim();
        let number = self
            .pattern
            .regex()
            .find_iter(line)
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if number.is_empty() {
            return ContactPair::new(line, "");
        }

        let name = line.replacen(&number, "", 1).trim().to_string();
        ContactPair { name, number }
    }

    /// One candidate per line, in line order. Nothing is filtered.
    pub fn extract_lines<S: AsRef<str>>(&self, lines: &[S]) -> Vec<ContactPair> {
        lines.iter().map(|l| self.extract_line(l.as_ref())).collect()
    }

    /// Split raw OCR texts into lines, extract, and drop empty pairs.
    pub fn extract_contacts<I, S>(&self, texts: I) -> Vec<ContactPair>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines = split_lines(texts);
        self.extract_lines(&lines)
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn mobile() -> ContactExtractor {
        ContactExtractor::new(PhonePattern::IndianMobile)
    }

    fn international() -> ContactExtractor {
        ContactExtractor::new(PhonePattern::International)
    }

    // ── Indian mobile pattern ─────────────────────────────────────────────────

    #[test]
    fn name_followed_by_number() {
        let p = mobile().extract_line("John Doe 9876543210");
        assert_eq!(p, ContactPair::new("John Doe", "9876543210"));
    }

    #[test]
    fn country_code_is_part_of_number() {
        assert_eq!(mobile().extract_line("+91 9876543210"), ContactPair::new("", "+91 9876543210"));
        assert_eq!(mobile().extract_line("+91-9876543210 Priya"), ContactPair::new("Priya", "+91-9876543210"));
        assert_eq!(mobile().extract_line("Tel:+919876543210"), ContactPair::new("Tel:", "+919876543210"));
    }

    #[test]
    fn line_without_digits_is_all_name() {
        let p = mobile().extract_line("Random text no digits");
        assert_eq!(p, ContactPair::new("Random text no digits", ""));
    }

    #[test]
    fn number_only_line() {
        assert_eq!(mobile().extract_line("7012345678"), ContactPair::new("", "7012345678"));
    }

    #[test]
    fn number_embedded_mid_text() {
        let p = mobile().extract_line("Call 9123456789 after 6pm");
        assert_eq!(p.number, "9123456789");
        assert_eq!(p.name, "Call  after 6pm");
    }

    #[test]
    fn rejects_numbers_not_starting_six_to_nine() {
        assert_eq!(mobile().extract_line("Office 5123456789").number, "");
        assert_eq!(mobile().extract_line("Pin 400001").number, "");
    }

    #[test]
    fn rejects_digit_runs_longer_than_ten() {
        assert_eq!(mobile().extract_line("Acct 98765432101234").number, "");
        assert_eq!(mobile().extract_line("Ref 919876543210").number, "");
    }

    #[test]
    fn adjacent_numbers_are_joined_and_removed() {
        let p = mobile().extract_line("Ravi 9876543210 9123456789");
        assert_eq!(p.number, "9876543210 9123456789");
        assert_eq!(p.name, "Ravi");
    }

    #[test]
    fn separated_numbers_stay_in_name() {
        // The joined number string does not occur verbatim, so nothing is removed.
        let p = mobile().extract_line("Ravi 9876543210 / 9123456789");
        assert_eq!(p.number, "9876543210 9123456789");
        assert_eq!(p.name, "Ravi 9876543210 / 9123456789");
    }

    // ── International pattern ─────────────────────────────────────────────────

    #[test]
    fn international_matches_dashed_groups() {
        let p = international().extract_line("Call 555-123-4567");
        assert_eq!(p, ContactPair::new("Call", "555-123-4567"));
    }

    #[test]
    fn international_needs_at_least_six_digits() {
        assert_eq!(international().extract_line("Front desk 123456"), ContactPair::new("Front desk", "123456"));
        assert_eq!(international().extract_line("Room 12345").number, "");
    }

    #[test]
    fn international_matches_parenthesized_area_code() {
        let p = international().extract_line("Office (022) 2345 6789");
        assert_eq!(p, ContactPair::new("Office", "(022) 2345 6789"));
    }

    #[test]
    fn non_ascii_digits_are_not_numbers() {
        let arabic = "Tel \u{661}\u{662}\u{663}\u{664}\u{665}\u{666}\u{667}\u{668}\u{669}\u{660}";
        assert_eq!(international().extract_line(arabic), ContactPair::new(arabic, ""));
        assert_eq!(mobile().extract_line(arabic).number, "");

        let devanagari = "Ph 9\u{96e}\u{96d}\u{96c}\u{96b}\u{96a}\u{969}\u{968}\u{967}\u{966}";
        assert_eq!(mobile().extract_line(devanagari), ContactPair::new(devanagari, ""));
        assert_eq!(international().extract_line(devanagari).number, "");
    }

    #[test]
    fn patterns_disagree_on_same_input() {
        let line = "Office 5123456789";
        assert_eq!(mobile().extract_line(line).number, "");
        assert_eq!(international().extract_line(line).number, "5123456789");
    }

    // ── Batch behaviour ───────────────────────────────────────────────────────

    #[test]
    fn one_candidate_per_line_in_order() {
        let lines = ["Asha 9876543210", "no number", "9123456789"];
        let pairs = mobile().extract_lines(&lines);
        assert_eq!(pairs.len(), lines.len());
        assert_eq!(pairs[0].name, "Asha");
        assert_eq!(pairs[1].name, "no number");
        assert_eq!(pairs[2].number, "9123456789");
    }

    #[test]
    fn extraction_is_idempotent() {
        let lines = ["Asha 9876543210", "Bala +91 9123456789", "notes"];
        assert_eq!(mobile().extract_lines(&lines), mobile().extract_lines(&lines));
    }

    #[test]
    fn extract_contacts_flattens_texts_and_filters() {
        let texts = ["Asha 9876543210\n\n  \nBala", "", "+91 9123456789"];
        let pairs = mobile().extract_contacts(texts);
        assert_eq!(
            pairs,
            vec![
                ContactPair::new("Asha", "9876543210"),
                ContactPair::new("Bala", ""),
                ContactPair::new("", "+91 9123456789"),
            ]
        );
    }

    #[test]
    fn duplicates_are_preserved() {
        let pairs = mobile().extract_contacts(["Asha 9876543210\nAsha 9876543210"]);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], pairs[1]);
    }

    #[test]
    fn empty_extracted_pairs_are_dropped() {
        assert!(mobile().extract_contacts(["", "   \n\t"]).is_empty());
        assert!(mobile().extract_line("   ").is_empty());
    }

    #[test]
    fn phone_pattern_roundtrip() {
        for p in [PhonePattern::IndianMobile, PhonePattern::International] {
            assert_eq!(PhonePattern::from_str(&p.to_string()).unwrap(), p);
        }
        assert!(PhonePattern::from_str("nanp").is_err());
    }

    #[test]
    fn no_panic_on_garbage_input() {
        let _ = mobile().extract_contacts(["!@#$%^&*()\n\0\x01\x02"]);
        let _ = international().extract_contacts(["(((((\n+++---..."]);
    }
}

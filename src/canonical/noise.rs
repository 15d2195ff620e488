//! Noise-row filtering.
//!
//! Statement tables interleave transactions with repeated column headers,
//! page totals and section banners. Each is recognized by a phrase in the
//! row's leading cell. The phrases are compiled into one alternation so a
//! row is scanned once, and a row is dropped if any phrase occurs in it.

use regex::Regex;

/// A phrase that marks a non-transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoisePattern {
    /// Literal text to look for (not a regex)
    pub phrase: &'static str,
    /// Match regardless of case
    pub case_insensitive: bool,
}

impl NoisePattern {
    /// Case-sensitive phrase.
    pub const fn exact(phrase: &'static str) -> Self {
        Self {
            phrase,
            case_insensitive: false,
        }
    }

    /// Case-insensitive phrase.
    pub const fn any_case(phrase: &'static str) -> Self {
        Self {
            phrase,
            case_insensitive: true,
        }
    }

    /// Regex fragment matching this phrase.
    fn fragment(&self) -> String {
        let escaped = regex::escape(self.phrase);
        if self.case_insensitive {
            format!("(?i:{})", escaped)
        } else {
            escaped
        }
    }

    /// Compile this phrase on its own.
    pub fn to_regex(&self) -> Regex {
        // Escaped literals always compile.
        Regex::new(&self.fragment()).expect("escaped noise phrase is a valid regex")
    }
}

/// Phrases found in the leading cell of statement noise rows.
pub const DEFAULT_NOISE_PATTERNS: &[NoisePattern] = &[
    NoisePattern::any_case("Sl"),
    NoisePattern::any_case("No"),
    NoisePattern::exact("Page Total"),
    NoisePattern::exact("Opening Bal"),
    NoisePattern::exact("Legends"),
    NoisePattern::any_case("Tran"),
];

/// Single-pass filter over leading cells.
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    patterns: Vec<NoisePattern>,
    combined: Option<Regex>,
}

impl NoiseFilter {
    /// Build a filter from a set of phrases.
    pub fn new(patterns: &[NoisePattern]) -> Self {
        let combined = if patterns.is_empty() {
            None
        } else {
            let alternation = patterns
                .iter()
                .map(NoisePattern::fragment)
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&alternation).expect("alternation of escaped phrases is valid"))
        };

        Self {
            patterns: patterns.to_vec(),
            combined,
        }
    }

    /// The phrases this filter was built from.
    pub fn patterns(&self) -> &[NoisePattern] {
        &self.patterns
    }

    /// Check if a leading cell marks a noise row.
    pub fn is_noise(&self, leading_cell: &str) -> bool {
        self.combined
            .as_ref()
            .is_some_and(|re| re.is_match(leading_cell))
    }

    /// Keep the rows whose leading cell is not noise, in order.
    pub fn retain_rows(&self, rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
        rows.into_iter()
            .filter(|row| !self.is_noise(row.first().map(String::as_str).unwrap_or("")))
            .collect()
    }
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_PATTERNS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_headers_and_totals() {
        let filter = NoiseFilter::default();
        assert!(filter.is_noise("Sl No"));
        assert!(filter.is_noise("SL"));
        assert!(filter.is_noise("Page Total"));
        assert!(filter.is_noise("Opening Bal: 1,000.00"));
        assert!(filter.is_noise("Legends"));
        assert!(filter.is_noise("TRAN ID"));
        assert!(!filter.is_noise("17"));
        assert!(!filter.is_noise(""));
    }

    #[test]
    fn test_case_sensitive_phrases() {
        let filter = NoiseFilter::default();
        assert!(!filter.is_noise("page total"));
        assert!(!filter.is_noise("legends"));
    }

    #[test]
    fn test_phrases_are_literal() {
        let filter = NoiseFilter::new(&[NoisePattern::exact("A/C (Dr).")]);
        assert!(filter.is_noise("Total A/C (Dr)."));
        assert!(!filter.is_noise("A/C Dr"));
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = NoiseFilter::new(&[]);
        assert!(!filter.is_noise("Sl No"));
        let rows = vec![vec!["Sl No".to_string()]];
        assert_eq!(filter.retain_rows(rows).len(), 1);
    }

    #[test]
    fn test_retain_rows_preserves_order() {
        let filter = NoiseFilter::default();
        let rows: Vec<Vec<String>> = ["1", "Sl No", "2", "Page Total", "3"]
            .iter()
            .map(|c| vec![c.to_string(), "x".to_string()])
            .collect();
        let kept: Vec<_> = filter
            .retain_rows(rows)
            .into_iter()
            .map(|r| r[0].clone())
            .collect();
        assert_eq!(kept, vec!["1", "2", "3"]);
    }
}

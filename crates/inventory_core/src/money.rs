use std::{fmt, str::FromStr};

use thiserror::Error;

/// Thousands grouping used when rendering amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Grouping {
    /// `12,34,567.00`: the last three digits, then pairs.
    #[default]
    Indian,
    /// `1,234,567.00`
    Western,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown money grouping '{0}' (expected 'indian' or 'western')")]
pub struct UnknownGrouping(pub String);

impl FromStr for Grouping {
    type Err = UnknownGrouping;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indian" | "en-in" => Ok(Self::Indian),
            "western" | "international" | "en-us" => Ok(Self::Western),
            other => Err(UnknownGrouping(other.to_string())),
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Indian => "indian",
            Self::Western => "western",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyFormat {
    pub symbol: String,
    pub grouping: Grouping,
}

impl Default for MoneyFormat {
    fn default() -> Self {
        Self {
            symbol: "₹".into(),
            grouping: Grouping::Indian,
        }
    }
}

impl MoneyFormat {
    /// Amount with the currency symbol, e.g. `₹ 1,234.50`.
    pub fn format(&self, amount: f64) -> String {
        let plain = self.format_plain(amount);
        if self.symbol.is_empty() {
            plain
        } else {
            format!("{} {plain}", self.symbol)
        }
    }

    pub fn format_plain(&self, amount: f64) -> String {
        format_amount(amount, self.grouping)
    }
}

/// Two decimal places with thousands separators.
pub fn format_amount(amount: f64, grouping: Grouping) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let grouped = group_digits(whole, grouping);
    // Rounding can turn a tiny negative into zero; keep "-0.00" out of the view.
    let negative = amount < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9'));
    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

fn group_digits(digits: &str, grouping: Grouping) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let width = match grouping {
        Grouping::Indian => 2,
        Grouping::Western => 3,
    };

    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(width);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    groups.push(tail);
    groups.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_amounts_have_two_decimals() {
        assert_eq!(format_amount(0.0, Grouping::Indian), "0.00");
        assert_eq!(format_amount(10.0, Grouping::Indian), "10.00");
        assert_eq!(format_amount(230.5, Grouping::Western), "230.50");
        assert_eq!(format_amount(999.999, Grouping::Western), "1,000.00");
    }

    #[test]
    fn indian_grouping_uses_pairs_after_the_first_thousand() {
        assert_eq!(format_amount(1234.0, Grouping::Indian), "1,234.00");
        assert_eq!(format_amount(123456.0, Grouping::Indian), "1,23,456.00");
        assert_eq!(format_amount(1234567.891, Grouping::Indian), "12,34,567.89");
    }

    #[test]
    fn western_grouping_uses_triples() {
        assert_eq!(format_amount(1234567.891, Grouping::Western), "1,234,567.89");
        assert_eq!(format_amount(100000.0, Grouping::Western), "100,000.00");
    }

    #[test]
    fn negative_amounts_keep_their_sign() {
        assert_eq!(format_amount(-1500.25, Grouping::Western), "-1,500.25");
        assert_eq!(format_amount(-0.001, Grouping::Western), "0.00");
    }

    #[test]
    fn symbol_is_prefixed_with_a_space() {
        let money = MoneyFormat::default();
        assert_eq!(money.format(230.0), "₹ 230.00");
        let bare = MoneyFormat {
            symbol: String::new(),
            grouping: Grouping::Western,
        };
        assert_eq!(bare.format(1000.0), "1,000.00");
    }

    #[test]
    fn grouping_parses_locale_names() {
        assert_eq!("en-IN".parse::<Grouping>(), Ok(Grouping::Indian));
        assert_eq!("Western".parse::<Grouping>(), Ok(Grouping::Western));
        assert!("metric".parse::<Grouping>().is_err());
    }
}

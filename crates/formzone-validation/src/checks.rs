//! Per-kind checks on a single captured value

use chrono::NaiveDate;
use formzone_schema::FieldKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

pub(crate) static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});
static IRISH_MOBILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^08[356789]\d{7}$").expect("mobile pattern"));

/// Why a value failed its check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFlag {
    /// Nothing but whitespace
    Blank,
    /// Not all ASCII digits
    NotInteger,
    /// Not digits with at most one decimal point
    NotDecimal,
    /// Not a `dd/mm/yyyy` date
    NotDate,
    /// Not an email address
    NotEmail,
    /// Not an Irish mobile number
    NotMobile,
}

impl fmt::Display for ValueFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueFlag::Blank => "value is empty",
            ValueFlag::NotInteger => "value is not a whole number",
            ValueFlag::NotDecimal => "value is not a decimal number",
            ValueFlag::NotDate => "value is not a dd/mm/yyyy date",
            ValueFlag::NotEmail => "value is not an email address",
            ValueFlag::NotMobile => "value is not a mobile number",
        })
    }
}

/// Checks a single value can be put through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCheck {
    /// Contains text
    Text,
    /// Whole number
    Integer,
    /// Decimal number
    Decimal,
    /// `dd/mm/yyyy`
    Date,
    /// Email address
    Email,
    /// Irish mobile number
    Mobile,
}

impl ValueCheck {
    /// Check implied by a field kind, if any
    #[must_use]
    pub const fn for_kind(kind: FieldKind) -> Option<ValueCheck> {
        match kind {
            FieldKind::TextField => Some(ValueCheck::Text),
            FieldKind::IntegerField => Some(ValueCheck::Integer),
            FieldKind::DecimalField => Some(ValueCheck::Decimal),
            _ => None,
        }
    }

    /// Run the check
    ///
    /// # Errors
    ///
    /// The [`ValueFlag`] describing the failure.
    pub fn check(self, value: &str) -> Result<(), ValueFlag> {
        if value.trim().is_empty() {
            return Err(ValueFlag::Blank);
        }
        let ok = match self {
            ValueCheck::Text => true,
            ValueCheck::Integer => value.chars().all(|c| c.is_ascii_digit()),
            ValueCheck::Decimal => is_decimal(value),
            ValueCheck::Date => is_valid_date(value),
            ValueCheck::Email => EMAIL.is_match(value),
            ValueCheck::Mobile => IRISH_MOBILE.is_match(value),
        };
        if ok {
            return Ok(());
        }
        Err(match self {
            ValueCheck::Text => ValueFlag::Blank,
            ValueCheck::Integer => ValueFlag::NotInteger,
            ValueCheck::Decimal => ValueFlag::NotDecimal,
            ValueCheck::Date => ValueFlag::NotDate,
            ValueCheck::Email => ValueFlag::NotEmail,
            ValueCheck::Mobile => ValueFlag::NotMobile,
        })
    }
}

/// Flag for a value typed into a field of `kind`
///
/// Only numeric kinds are checked and an empty value is never flagged; the
/// value is stored either way.
#[must_use]
pub fn check_value(kind: FieldKind, value: &str) -> Option<ValueFlag> {
    if !kind.is_numeric() || value.is_empty() {
        return None;
    }
    ValueCheck::for_kind(kind).and_then(|check| check.check(value).err())
}

/// True for a real calendar date written `dd/mm/yyyy`
#[must_use]
pub fn is_valid_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%d/%m/%Y").is_ok()
}

fn is_decimal(value: &str) -> bool {
    let digits = value.replacen('.', "", 1);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_checks() {
        assert_eq!(ValueCheck::Integer.check("0042"), Ok(()));
        assert_eq!(ValueCheck::Integer.check("4.2"), Err(ValueFlag::NotInteger));
        assert_eq!(ValueCheck::Decimal.check("4.2"), Ok(()));
        assert_eq!(ValueCheck::Decimal.check(".5"), Ok(()));
        assert_eq!(ValueCheck::Decimal.check("4.2.1"), Err(ValueFlag::NotDecimal));
        assert_eq!(ValueCheck::Decimal.check("-1"), Err(ValueFlag::NotDecimal));
        assert_eq!(ValueCheck::Integer.check("  "), Err(ValueFlag::Blank));
    }

    #[test]
    fn dates() {
        assert!(is_valid_date("29/02/2024"));
        assert!(!is_valid_date("29/02/2023"));
        assert!(!is_valid_date("2024-02-01"));
    }

    #[test]
    fn contact_checks() {
        assert_eq!(ValueCheck::Email.check("a.b@example.ie"), Ok(()));
        assert_eq!(ValueCheck::Email.check("a.b@example"), Err(ValueFlag::NotEmail));
        assert_eq!(ValueCheck::Mobile.check("0871234567"), Ok(()));
        assert_eq!(ValueCheck::Mobile.check("0811234567"), Err(ValueFlag::NotMobile));
    }

    #[test]
    fn capture_flags_only_bad_numbers() {
        assert_eq!(check_value(FieldKind::IntegerField, "12a"), Some(ValueFlag::NotInteger));
        assert_eq!(check_value(FieldKind::IntegerField, ""), None);
        assert_eq!(check_value(FieldKind::TextField, "anything"), None);
        assert_eq!(check_value(FieldKind::DecimalField, "3.14"), None);
    }
}

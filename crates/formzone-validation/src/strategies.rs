//! Built-in validation strategies
//!
//! Each strategy inspects one record's values for the fields named by its
//! rule and returns findings. Parameter problems are [`ConfigError`]s so the
//! runner can skip the rule and report it.

use crate::checks::EMAIL;
use crate::context::{Finding, ValidationContext};
use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Strategy result
pub type StrategyResult = Result<Vec<Finding>, ConfigError>;

/// Irish Eircode routing keys, tolerating OCR swaps of 5/s, 0/o and 8/b
const EIRCODE_PATTERN: &str = concat!(
    r"\b(?:(a(4[125s]|6[37]|7[5s]|[8b][1-6s]|9[12468b])",
    r"|c1[5s]|d([0o][1-9sb]|1[0-8osb]|2[024o]|6w)|e(2[15s]|3[24]|4[15s]|[5s]3|91)|f(12|2[368b]",
    r"|3[15s]|4[25s]|[5s][26]|9[1-4])|h(1[2468b]|23|[5s][34]|6[25s]|[79]1)|k(3[246]|4[5s]|[5s]6|67|7[8b])",
    r"|n(3[79]|[49]1)|p(1[247]|2[45s]|3[126]|4[37]|[5s][16]|6[17]|7[25s]|[8b][15s])|r(14|21|3[25s]|4[25s]",
    r"|[5s][16]|9[35s])|t(12|23|34|4[5s]|[5s]6)|v(1[45s]|23|3[15s]|42|9[2-5s])|w(12|23|34|91)|x(3[5s]|42|91)",
    r"|y(14|2[15s]|3[45s]))\s?[acdefhknprtvwxy\d]{4})\b",
);

/// Northern Ireland (BT) postcodes; inward letters exclude C, I, K, M, O, V
const NI_POSTCODE_PATTERN: &str = concat!(
    r"\bBT",
    r"([1-9]|[1-4][0-9]|5[1-8]|6[0-9]|7[01]|7[4-9]|8[0-2]|9[2-4])",
    r"\s?\d[ABDEGHJLNPQRSTUWXYZ]{2}\b",
);

static EIRCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("(?i)^(?:{EIRCODE_PATTERN})")).expect("eircode pattern"));
static NI_POSTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("(?i)^(?:{NI_POSTCODE_PATTERN})")).expect("postcode pattern"));
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").expect("phone pattern"));

/// Tick semantics for validation: any non-empty value other than `false`
#[must_use]
pub fn is_ticked(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.eq_ignore_ascii_case("false")
}

fn require_fields<'c>(
    ctx: &'c ValidationContext<'_>,
    min: usize,
    expected: &'static str,
) -> Result<&'c [String], ConfigError> {
    let fields = ctx.field_names();
    if fields.len() < min {
        return Err(ConfigError::FieldCount {
            strategy: ctx.rule.strategy.clone(),
            expected,
            actual: fields.len(),
        });
    }
    Ok(fields)
}

/// More than `params.max` (default 1) ticked → one finding on the last ticked
pub fn max_tickboxes(ctx: &ValidationContext<'_>) -> StrategyResult {
    let fields = require_fields(ctx, 1, "at least 1")?;
    let max = ctx.rule.param_u64("max", 1)?;
    let ticked: Vec<&String> = fields.iter().filter(|f| is_ticked(ctx.value(f))).collect();
    let count = ticked.len() as u64;
    match ticked.last() {
        Some(last) if count > max => Ok(vec![ctx.finding(
            last,
            format!("At most {max} of these may be ticked; {count} are ticked."),
        )]),
        _ => Ok(Vec::new()),
    }
}

/// `params.exclusive_field` ticked together with any other field → one finding on it
pub fn mutually_exclusive(ctx: &ValidationContext<'_>) -> StrategyResult {
    let fields = require_fields(ctx, 2, "at least 2")?;
    let exclusive = ctx.rule.param_str("exclusive_field")?;
    if !ctx.field_to_page.contains_key(exclusive) {
        return Err(ConfigError::UnknownField(exclusive.to_string()));
    }
    let other_ticked = fields
        .iter()
        .filter(|f| f.as_str() != exclusive)
        .any(|f| is_ticked(ctx.value(f)));
    if is_ticked(ctx.value(exclusive)) && other_ticked {
        return Ok(vec![ctx.finding(
            exclusive,
            "This option is mutually exclusive with the others; do not tick both.",
        )]);
    }
    Ok(Vec::new())
}

/// First field's value must key a row of the lookup list
pub fn value_exists_in_lookup(ctx: &ValidationContext<'_>) -> StrategyResult {
    let fields = require_fields(ctx, 1, "at least 1")?;
    let lookup = ctx.require_lookup()?;
    let column = lookup_column(ctx)?;
    let field = &fields[0];
    let value = ctx.value(field);
    if value.trim().is_empty() || lookup.lookup(value, column).is_some() {
        return Ok(Vec::new());
    }
    Ok(vec![ctx.finding(field, format!("Value '{value}' not found in lookup list."))])
}

/// Second field must equal the lookup list entry keyed by the first field
pub fn match_value_in_lookup(ctx: &ValidationContext<'_>) -> StrategyResult {
    let fields = require_fields(ctx, 2, "at least 2")?;
    let lookup = ctx.require_lookup()?;
    let column = lookup_column(ctx)?;
    let (key_field, matched_field) = (&fields[0], &fields[1]);
    let key = ctx.value(key_field);
    let indexed = ctx.value(matched_field);
    if key.trim().is_empty() || indexed.trim().is_empty() {
        return Ok(Vec::new());
    }
    match lookup.lookup(key, column) {
        Some(expected) if expected != indexed => Ok(vec![ctx.finding(
            matched_field,
            format!("Indexed value {indexed} does not match the value in the lookup list {expected}"),
        )]),
        _ => Ok(Vec::new()),
    }
}

/// Two numbers within `params.tolerance` (default 0.01) of each other
///
/// A mismatch is reported on both fields; when they sit on different pages
/// each message also quotes the other page.
pub fn numbers_nearly_equal(ctx: &ValidationContext<'_>) -> StrategyResult {
    let fields = ctx.field_names();
    if fields.len() != 2 {
        return Err(ConfigError::FieldCount {
            strategy: ctx.rule.strategy.clone(),
            expected: "exactly 2",
            actual: fields.len(),
        });
    }
    let tolerance = ctx.rule.param_f64("tolerance", 0.01)?;
    let (first, second) = (&fields[0], &fields[1]);
    let (Some(a), Some(b)) = (parse_number(ctx.value(first)), parse_number(ctx.value(second))) else {
        return Ok(Vec::new());
    };
    if (b - a).abs() <= a.abs() * tolerance {
        return Ok(Vec::new());
    }

    let percent = format_number(tolerance * 100.0);
    let (a, b) = (format_number(a), format_number(b));
    let (page_a, page_b) = (ctx.page(first), ctx.page(second));
    let mut to_first = format!(
        "This number ({a}) is not within {percent}% of '{}'s value ({b}).",
        second.to_uppercase()
    );
    let mut to_second = format!(
        "This number ({b}) is not within {percent}% of '{}'s value ({a}).",
        first.to_uppercase()
    );
    if page_a != page_b {
        to_first.push_str(&format!(" On page {page_b}, '{}'s value is {b}.", second.to_uppercase()));
        to_second.push_str(&format!(" On page {page_a}, '{}'s value is {a}.", first.to_uppercase()));
    }
    Ok(vec![
        Finding::new(page_a, first.as_str(), to_first),
        Finding::new(page_b, second.as_str(), to_second),
    ])
}

/// Every field must hold an email address
pub fn email_addresses_valid(ctx: &ValidationContext<'_>) -> StrategyResult {
    each_value(ctx, |value| {
        (!EMAIL.is_match(value)).then(|| format!("Invalid email address: {value}"))
    })
}

/// Every field must hold a ten-digit phone number
pub fn phone_numbers_valid(ctx: &ValidationContext<'_>) -> StrategyResult {
    each_value(ctx, |value| {
        (!PHONE.is_match(value)).then(|| format!("Invalid phone number: {value}"))
    })
}

/// Every field's length must be one of `params.num_characters` (default `[1]`)
pub fn num_characters_valid(ctx: &ValidationContext<'_>) -> StrategyResult {
    let permitted = ctx.rule.param_usize_list("num_characters", &[1])?;
    each_value(ctx, |value| {
        let length = value.chars().count();
        (!permitted.contains(&length)).then(|| {
            format!("The length of {value} is {length}. Permitted lengths are: {permitted:?}")
        })
    })
}

/// Every field must hold an Eircode
pub fn eircode_valid(ctx: &ValidationContext<'_>) -> StrategyResult {
    each_value(ctx, |value| {
        (!EIRCODE.is_match(value)).then(|| format!("Invalid eircode: {value}"))
    })
}

/// Every field must hold a Northern Ireland postcode
pub fn ni_postcode_valid(ctx: &ValidationContext<'_>) -> StrategyResult {
    each_value(ctx, |value| {
        (!NI_POSTCODE.is_match(value)).then(|| format!("Invalid NI postcode: {value}"))
    })
}

/// First field is the total of the remaining fields
pub fn sum_should_equal_total(ctx: &ValidationContext<'_>) -> StrategyResult {
    let fields = require_fields(ctx, 2, "at least 2")?;
    let total_field = &fields[0];
    let raw_total = ctx.value(total_field);
    if raw_total.trim().is_empty() {
        return Ok(Vec::new());
    }
    let cleaned: String = raw_total
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let Ok(total) = cleaned.parse::<f64>() else {
        return Ok(vec![ctx.finding(
            total_field,
            format!("Total value '{raw_total}' is not a valid number."),
        )]);
    };

    let mut findings = Vec::new();
    let mut sum = 0.0;
    for field in &fields[1..] {
        let raw = ctx.value(field);
        if raw.trim().is_empty() {
            continue;
        }
        match parse_number(raw) {
            Some(n) => sum += n,
            None => findings.push(ctx.finding(field, format!("Value '{raw}' is not a valid number."))),
        }
    }
    if (sum - total).abs() > 1e-9 {
        findings.push(ctx.finding(
            total_field,
            format!(
                "The sum of the fields is {}, but the total is {}.",
                format_number(sum),
                format_number(total)
            ),
        ));
    }
    Ok(findings)
}

/// Apply `check` to every field's trimmed value
///
/// An empty value anywhere in the list means the rule does not apply to
/// this record yet, so nothing is reported.
fn each_value<F>(ctx: &ValidationContext<'_>, check: F) -> StrategyResult
where
    F: Fn(&str) -> Option<String>,
{
    let fields = require_fields(ctx, 1, "at least 1")?;
    let mut findings = Vec::new();
    for field in fields {
        let value = ctx.value(field).trim();
        if value.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(message) = check(value) {
            findings.push(ctx.finding(field, message));
        }
    }
    Ok(findings)
}

fn lookup_column(ctx: &ValidationContext<'_>) -> Result<usize, ConfigError> {
    let column = ctx.rule.param_u64("lookup_column", 0)?;
    usize::try_from(column).map_err(|_| ConfigError::malformed("lookup_column", "a column index"))
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().replace(',', "").parse().ok()
}

/// Whole numbers keep one decimal place (`9.0`) so messages match
/// comments already stored in existing ledgers
fn format_number(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{x:.1}")
    } else {
        format!("{x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LookupTable;
    use crate::rule::ValidationRule;
    use std::collections::HashMap;

    struct Fixture {
        values: HashMap<String, String>,
        pages: HashMap<String, u32>,
        lookup: Option<LookupTable>,
    }

    impl Fixture {
        fn new(values: &[(&str, &str)]) -> Self {
            Self {
                values: values
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                pages: values.iter().map(|(k, _)| ((*k).to_string(), 1)).collect(),
                lookup: None,
            }
        }

        fn on_page(mut self, field: &str, page: u32) -> Self {
            self.pages.insert(field.to_string(), page);
            self
        }

        fn with_lookup(mut self, csv: &str) -> Self {
            self.lookup = Some(LookupTable::from_reader(csv.as_bytes(), 0).unwrap());
            self
        }

        fn run(&self, strategy: fn(&ValidationContext<'_>) -> StrategyResult, rule: &ValidationRule) -> StrategyResult {
            strategy(&ValidationContext {
                values: &self.values,
                rule,
                field_to_page: &self.pages,
                lookup: self.lookup.as_ref(),
            })
        }
    }

    #[test]
    fn max_tickboxes_blames_last_ticked() {
        let fx = Fixture::new(&[("a", "Ticked"), ("b", "Ticked"), ("c", "Ticked"), ("d", "Ticked")]);
        let rule = ValidationRule::new("max_tickboxes", ["a", "b", "c", "d"]).with_param("max", 3);
        let findings = fx.run(max_tickboxes, &rule).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].field, "d");
        assert_eq!(findings[0].message, "At most 3 of these may be ticked; 4 are ticked.");
    }

    #[test]
    fn max_tickboxes_defaults_to_one() {
        let fx = Fixture::new(&[("a", "Ticked"), ("b", ""), ("c", "yes")]);
        let rule = ValidationRule::new("max_tickboxes", ["a", "b", "c"]);
        let findings = fx.run(max_tickboxes, &rule).unwrap();
        assert_eq!(findings[0].field, "c");

        let fx = Fixture::new(&[("a", "Ticked"), ("b", "false")]);
        let rule = ValidationRule::new("max_tickboxes", ["a", "b"]);
        assert!(fx.run(max_tickboxes, &rule).unwrap().is_empty());
    }

    #[test]
    fn mutually_exclusive_cases() {
        let rule = ValidationRule::new("mutually_exclusive", ["none", "x", "y"])
            .with_param("exclusive_field", "none");

        let fx = Fixture::new(&[("none", "Ticked"), ("x", "Ticked"), ("y", "")]);
        let findings = fx.run(mutually_exclusive, &rule).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].field, "none");

        let fx = Fixture::new(&[("none", "Ticked"), ("x", ""), ("y", "")]);
        assert!(fx.run(mutually_exclusive, &rule).unwrap().is_empty());

        let fx = Fixture::new(&[("none", ""), ("x", "Ticked"), ("y", "Ticked")]);
        assert!(fx.run(mutually_exclusive, &rule).unwrap().is_empty());
    }

    #[test]
    fn mutually_exclusive_needs_its_parameter() {
        let fx = Fixture::new(&[("none", "Ticked"), ("x", "Ticked")]);
        let rule = ValidationRule::new("mutually_exclusive", ["none", "x"]);
        assert!(matches!(
            fx.run(mutually_exclusive, &rule),
            Err(ConfigError::MissingParameter(_))
        ));
        let rule = rule.with_param("exclusive_field", "ghost");
        assert!(matches!(fx.run(mutually_exclusive, &rule), Err(ConfigError::UnknownField(_))));
    }

    #[test]
    fn lookup_strategies() {
        let list = "id,name\nA1,Ann\nB2,Bob\n";
        let fx = Fixture::new(&[("id", "Z9"), ("name", "Ann")]).with_lookup(list);
        let rule = ValidationRule::new("value_exists_in_lookup", ["id"]);
        let findings = fx.run(value_exists_in_lookup, &rule).unwrap();
        assert_eq!(findings[0].message, "Value 'Z9' not found in lookup list.");

        let fx = Fixture::new(&[("id", "B2"), ("name", "Ann")]).with_lookup(list);
        let rule = ValidationRule::new("match_value_in_lookup", ["id", "name"]).with_param("lookup_column", 1);
        let findings = fx.run(match_value_in_lookup, &rule).unwrap();
        assert_eq!(findings[0].field, "name");
        assert_eq!(
            findings[0].message,
            "Indexed value Ann does not match the value in the lookup list Bob"
        );

        let fx = Fixture::new(&[("id", "B2")]);
        let rule = ValidationRule::new("value_exists_in_lookup", ["id"]);
        assert!(matches!(
            fx.run(value_exists_in_lookup, &rule),
            Err(ConfigError::LookupUnavailable(_))
        ));
    }

    #[test]
    fn numbers_nearly_equal_across_pages() {
        let fx = Fixture::new(&[("a", "100"), ("b", "103")]).on_page("b", 2);
        let rule = ValidationRule::new("numbers_nearly_equal", ["a", "b"]);
        let findings = fx.run(numbers_nearly_equal, &rule).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!((findings[0].page, findings[1].page), (1, 2));
        assert_eq!(
            findings[0].message,
            "This number (100.0) is not within 1.0% of 'B's value (103.0). On page 2, 'B's value is 103.0."
        );
        assert_eq!(
            findings[1].message,
            "This number (103.0) is not within 1.0% of 'A's value (100.0). On page 1, 'A's value is 100.0."
        );

        let fx = Fixture::new(&[("a", "100"), ("b", "100.5")]);
        assert!(fx.run(numbers_nearly_equal, &rule).unwrap().is_empty());

        let fx = Fixture::new(&[("a", "100"), ("b", "")]);
        assert!(fx.run(numbers_nearly_equal, &rule).unwrap().is_empty());
    }

    #[test]
    fn numbers_in_messages_keep_a_decimal_place() {
        assert_eq!(format_number(9.0), "9.0");
        assert_eq!(format_number(-3.0), "-3.0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn single_value_formats() {
        let fx = Fixture::new(&[("e", "someone@example.com"), ("p", "08712345")]);
        assert!(fx.run(email_addresses_valid, &ValidationRule::new("email_addresses_valid", ["e"])).unwrap().is_empty());
        let findings = fx.run(phone_numbers_valid, &ValidationRule::new("phone_numbers_valid", ["p"])).unwrap();
        assert_eq!(findings[0].message, "Invalid phone number: 08712345");

        let rule = ValidationRule::new("num_characters_valid", ["p"]).with_param("num_characters", vec![7, 8]);
        assert!(fx.run(num_characters_valid, &rule).unwrap().is_empty());
    }

    #[test]
    fn empty_value_suppresses_rule() {
        let fx = Fixture::new(&[("a", "bad"), ("b", "")]);
        let rule = ValidationRule::new("email_addresses_valid", ["a", "b"]);
        assert!(fx.run(email_addresses_valid, &rule).unwrap().is_empty());
    }

    #[test]
    fn postcodes() {
        let rule = ValidationRule::new("eircode_valid", ["code"]);
        for good in ["D02 X285", "a65f4e2", "T12 AB34"] {
            let fx = Fixture::new(&[("code", good)]);
            assert!(fx.run(eircode_valid, &rule).unwrap().is_empty(), "{good}");
        }
        let fx = Fixture::new(&[("code", "Z99 1234")]);
        assert_eq!(fx.run(eircode_valid, &rule).unwrap().len(), 1);

        let rule = ValidationRule::new("ni_postcode_valid", ["code"]);
        for good in ["BT1 1AA", "bt12 3ab", "BT94 5XY"] {
            let fx = Fixture::new(&[("code", good)]);
            assert!(fx.run(ni_postcode_valid, &rule).unwrap().is_empty(), "{good}");
        }
        for bad in ["BT50 1AA", "BT1 1CA", "SW1A 1AA"] {
            let fx = Fixture::new(&[("code", bad)]);
            assert_eq!(fx.run(ni_postcode_valid, &rule).unwrap().len(), 1, "{bad}");
        }
    }

    #[test]
    fn sum_should_equal_total_cases() {
        let rule = ValidationRule::new("sum_should_equal_total", ["total", "x", "y"]);
        let fx = Fixture::new(&[("total", "1,250"), ("x", "1,000"), ("y", "250")]);
        assert!(fx.run(sum_should_equal_total, &rule).unwrap().is_empty());

        let fx = Fixture::new(&[("total", "10"), ("x", "4"), ("y", "5")]);
        let findings = fx.run(sum_should_equal_total, &rule).unwrap();
        assert_eq!(findings[0].field, "total");
        assert_eq!(findings[0].message, "The sum of the fields is 9.0, but the total is 10.0.");

        let fx = Fixture::new(&[("total", "10"), ("x", "four"), ("y", "10")]);
        let findings = fx.run(sum_should_equal_total, &rule).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].field, "x");
    }

    #[test]
    fn empty_field_list_is_config_error() {
        let fx = Fixture::new(&[]);
        let rule = ValidationRule::new("max_tickboxes", Vec::<String>::new());
        assert!(matches!(fx.run(max_tickboxes, &rule), Err(ConfigError::FieldCount { .. })));
    }
}

//! Field rules for hotel records.
//!
//! Each rule is a plain function returning `Result<T, Violation>`. A
//! [`Violations`] collector runs every rule for a record and keeps all
//! failures in field order, so one bad field never hides another.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;
use validator::ValidateEmail;

use crate::hotels::csv::RawRow;

pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

const IS_OPEN_MESSAGE: &str = "isOpen must be a boolean value; For csv import should be 0 or 1";

/// A hotel record that passed every field rule and is ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelCandidate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_link: Option<String>,
    pub country: String,
    pub city: String,
    pub address: String,
    pub email: String,
    pub is_open: bool,
    pub longitude: String,
    pub latitude: String,
}

/// A single failed constraint on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub constraint: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, constraint: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            constraint,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Collects violations across fields while keeping successful values.
#[derive(Debug, Default)]
pub struct Violations {
    found: Vec<Violation>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one rule, returning the value when it passed.
    pub fn check<T>(&mut self, outcome: Result<T, Violation>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(violation) => {
                self.found.push(violation);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.found
    }
}

/// Non-empty text.
pub fn required_text(field: &'static str, value: Option<&str>) -> Result<String, Violation> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(Violation::new(
            field,
            "isNotEmpty",
            format!("{field} should not be empty"),
        )),
    }
}

pub fn email(field: &'static str, value: Option<&str>) -> Result<String, Violation> {
    let text = value.map(str::trim).unwrap_or_default().to_string();
    if !text.is_empty() && text.validate_email() {
        Ok(text)
    } else {
        Err(Violation::new(
            field,
            "isEmail",
            format!("{field} must be an email"),
        ))
    }
}

/// Optional absolute http(s) URL. Missing or empty input is not an error.
pub fn web_link(field: &'static str, value: Option<&str>) -> Result<Option<String>, Violation> {
    let text = match value.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => return Ok(None),
    };

    // The URL parser strips tabs and line breaks instead of failing.
    let has_blank = text.chars().any(|c| c.is_whitespace() || c.is_control());

    match Url::parse(text) {
        Ok(url) if !has_blank && matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(Some(text.to_string()))
        }
        _ => Err(Violation::new(
            field,
            "isUrl",
            format!("{field} must be a URL address"),
        )),
    }
}

/// CSV boolean: only the literals `"1"` and `"0"` are accepted.
pub fn csv_flag(field: &'static str, value: Option<&str>) -> Result<bool, Violation> {
    match value {
        Some("1") => Ok(true),
        Some("0") => Ok(false),
        _ => Err(Violation::new(field, "isBoolean", IS_OPEN_MESSAGE)),
    }
}

/// JSON boolean; absence is a violation.
pub fn required_flag(field: &'static str, value: Option<bool>) -> Result<bool, Violation> {
    value.ok_or_else(|| {
        Violation::new(
            field,
            "isBoolean",
            format!("{field} must be a boolean value"),
        )
    })
}

/// Numeric string within `[min, max]`, returned in its original textual form.
pub fn coordinate(
    field: &'static str,
    value: Option<&str>,
    (min, max): (f64, f64),
) -> Result<String, Violation> {
    let text = match value.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => {
            return Err(Violation::new(
                field,
                "isNotEmpty",
                format!("{field} should not be empty"),
            ));
        }
    };

    let number = match text.parse::<f64>() {
        Ok(number) if is_plain_decimal(text) => number,
        _ => {
            return Err(Violation::new(
                field,
                "isNumberString",
                format!("{field} must be a number string"),
            ));
        }
    };

    if number < min {
        Err(Violation::new(
            field,
            "min",
            format!("{field} must not be less than {min}"),
        ))
    } else if number > max {
        Err(Violation::new(
            field,
            "max",
            format!("{field} must not be greater than {max}"),
        ))
    } else {
        Ok(text.to_string())
    }
}

/// Optional sign, digits, then optionally a dot and more digits. Rejects the
/// exponent, `inf`/`NaN` and bare-dot forms `f64::from_str` would take.
fn is_plain_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

    digits(whole) && fraction.is_none_or(digits)
}

/// Validate one decoded CSV row.
///
/// Every field is checked, and all violations are returned in declaration
/// order: name, webLink, country, city, address, email, isOpen, longitude,
/// latitude.
pub fn validate_row(row: &RawRow) -> Result<HotelCandidate, Vec<Violation>> {
    let mut violations = Violations::new();

    let name = violations.check(required_text("name", row.get("name")));
    let web_link = violations.check(web_link("webLink", row.get("webLink")));
    let country = violations.check(required_text("country", row.get("country")));
    let city = violations.check(required_text("city", row.get("city")));
    let address = violations.check(required_text("address", row.get("address")));
    let email = violations.check(email("email", row.get("email")));
    let is_open = violations.check(csv_flag("isOpen", row.get("isOpen")));
    let longitude = violations.check(coordinate("longitude", row.get("longitude"), LONGITUDE_RANGE));
    let latitude = violations.check(coordinate("latitude", row.get("latitude"), LATITUDE_RANGE));

    match (
        name, web_link, country, city, address, email, is_open, longitude, latitude,
    ) {
        (
            Some(name),
            Some(web_link),
            Some(country),
            Some(city),
            Some(address),
            Some(email),
            Some(is_open),
            Some(longitude),
            Some(latitude),
        ) => Ok(HotelCandidate {
            name,
            web_link,
            country,
            city,
            address,
            email,
            is_open,
            longitude,
            latitude,
        }),
        _ => Err(violations.into_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_row() -> Vec<(&'static str, &'static str)> {
        vec![
            ("name", "礁溪老爺酒店"),
            ("address", "五峰路69號"),
            ("email", "hotel@example.com"),
            ("country", "台灣"),
            ("city", "宜蘭"),
            ("longitude", "121.776"),
            ("latitude", "24.671"),
            ("isOpen", "1"),
        ]
    }

    fn row_with(overrides: &[(&'static str, &'static str)]) -> RawRow {
        let mut fields = valid_row();
        for (column, value) in overrides {
            match fields.iter_mut().find(|(c, _)| c == column) {
                Some(field) => field.1 = *value,
                None => fields.push((*column, *value)),
            }
        }
        fields.into_iter().collect()
    }

    fn messages(row: &RawRow) -> Vec<String> {
        validate_row(row)
            .expect_err("row should be rejected")
            .into_iter()
            .map(|v| v.message)
            .collect()
    }

    #[test]
    fn valid_row_without_web_link_has_no_link() {
        let candidate = validate_row(&row_with(&[])).expect("valid row");

        assert_eq!(candidate.name, "礁溪老爺酒店");
        assert_eq!(candidate.web_link, None);
        assert!(candidate.is_open);
        assert_eq!(candidate.longitude, "121.776");
        assert_eq!(candidate.latitude, "24.671");
    }

    #[test]
    fn empty_web_link_is_absent() {
        let candidate = validate_row(&row_with(&[("webLink", "")])).expect("valid row");
        assert_eq!(candidate.web_link, None);
    }

    #[test]
    fn http_and_https_links_are_kept() {
        for link in ["http://hotel.example", "https://www.hotelroyal.com.tw/rooms?x=1"] {
            let candidate = validate_row(&row_with(&[("webLink", link)])).expect("valid row");
            assert_eq!(candidate.web_link.as_deref(), Some(link));
        }
    }

    #[test]
    fn non_http_links_are_rejected() {
        for link in [
            "ftp://hotel.example",
            "hotel.example",
            "not a url",
            "https://a.example\nX",
            "https://a.example/\trooms",
            "https://a.example/two words",
        ] {
            assert_eq!(
                messages(&row_with(&[("webLink", link)])),
                vec!["webLink must be a URL address"]
            );
        }
    }

    #[test]
    fn is_open_accepts_only_zero_and_one() {
        let open = validate_row(&row_with(&[("isOpen", "1")])).expect("open");
        let closed = validate_row(&row_with(&[("isOpen", "0")])).expect("closed");
        assert!(open.is_open);
        assert!(!closed.is_open);

        for raw in ["true", "false", "2", "", "yes"] {
            let violations = validate_row(&row_with(&[("isOpen", raw)])).expect_err(raw);
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].field, "isOpen");
            assert_eq!(violations[0].message, IS_OPEN_MESSAGE);
        }
    }

    #[test]
    fn missing_is_open_column_is_a_violation() {
        let row: RawRow = valid_row()
            .into_iter()
            .filter(|(column, _)| *column != "isOpen")
            .chain([("is_open", "true")])
            .collect();

        assert_eq!(messages(&row), vec![IS_OPEN_MESSAGE]);
    }

    #[test]
    fn latitude_out_of_range_reports_bound() {
        assert_eq!(
            messages(&row_with(&[("latitude", "94.671")])),
            vec!["latitude must not be greater than 90"]
        );
        assert_eq!(
            messages(&row_with(&[("latitude", "-90.5")])),
            vec!["latitude must not be less than -90"]
        );
    }

    #[test]
    fn longitude_bounds_are_inclusive() {
        for raw in ["-180", "180", "0"] {
            assert!(validate_row(&row_with(&[("longitude", raw)])).is_ok(), "{raw}");
        }
        assert_eq!(
            messages(&row_with(&[("longitude", "180.0001")])),
            vec!["longitude must not be greater than 180"]
        );
    }

    #[test]
    fn signed_decimals_are_accepted() {
        for raw in ["+5", "-5", "121.776", "-0.5", "+89.999999"] {
            assert!(validate_row(&row_with(&[("latitude", raw)])).is_ok(), "{raw}");
        }
    }

    #[test]
    fn non_numeric_coordinates_are_rejected() {
        for raw in ["abc", "NaN", "inf", "12,5", "1e1", "5.", ".5", "1.2.3", "--5"] {
            assert_eq!(
                messages(&row_with(&[("longitude", raw)])),
                vec!["longitude must be a number string"]
            );
        }
    }

    #[test]
    fn collects_every_violation_in_field_order() {
        let row: RawRow = [
            ("name", ""),
            ("webLink", "nope"),
            ("country", ""),
            ("city", ""),
            ("address", ""),
            ("email", "not-an-email"),
            ("isOpen", "maybe"),
            ("longitude", "999"),
            ("latitude", "x"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            messages(&row),
            vec![
                "name should not be empty",
                "webLink must be a URL address",
                "country should not be empty",
                "city should not be empty",
                "address should not be empty",
                "email must be an email",
                IS_OPEN_MESSAGE,
                "longitude must not be greater than 180",
                "latitude must be a number string",
            ]
        );
    }

    #[test]
    fn validation_is_repeatable() {
        let good = row_with(&[]);
        let bad = row_with(&[("email", "broken")]);

        assert_eq!(validate_row(&good), validate_row(&good));
        assert_eq!(validate_row(&bad), validate_row(&bad));
    }

    #[test]
    fn unknown_columns_are_ignored() {
        assert!(validate_row(&row_with(&[("stars", "5")])).is_ok());
    }
}

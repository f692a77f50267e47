//! Storm date input handling.

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};

const INPUT_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Parse the date typed by the user.
pub fn parse_storm_date(input: &str) -> AppResult<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("a storm date is required".to_string()));
    }
    INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| {
            AppError::Validation(format!("'{trimmed}' is not a date (expected YYYY-MM-DD)"))
        })
}

/// Date as the job service expects it.
pub fn service_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_iso_and_us_forms() {
        let iso = parse_storm_date("2024-05-01").unwrap();
        let us = parse_storm_date(" 05/01/2024 ").unwrap();
        assert_eq!(iso, us);
        assert_eq!(service_date(iso), "2024-05-01");
    }

    #[test]
    fn empty_input_is_a_validation_error() {
        assert!(matches!(parse_storm_date("   "), Err(AppError::Validation(_))));
    }

    #[test]
    fn impossible_dates_are_rejected() {
        assert!(parse_storm_date("2024-02-30").is_err());
        assert!(parse_storm_date("yesterday").is_err());
    }
}

//! Conversion between the stored `YYYY-MM-DD` project date and the French
//! "Mois Année" string edited in the admin form.

use chrono::{DateTime, Datelike, Month, NaiveDate};

use crate::errors::AppError;

/// Canonical French month names, indexed by `Month::number_from_month() - 1`.
const MONTH_NAMES: [&str; 12] = [
    "Janvier", "Février", "Mars", "Avril", "Mai", "Juin",
    "Juillet", "Août", "Septembre", "Octobre", "Novembre", "Décembre",
];

/// Looks up a lower-cased month word, accepting unaccented spellings.
fn month_from_word(word: &str) -> Option<Month> {
    let month = match word {
        "janvier" => Month::January,
        "février" | "fevrier" => Month::February,
        "mars" => Month::March,
        "avril" => Month::April,
        "mai" => Month::May,
        "juin" => Month::June,
        "juillet" => Month::July,
        "août" | "aout" => Month::August,
        "septembre" => Month::September,
        "octobre" => Month::October,
        "novembre" => Month::November,
        "décembre" | "decembre" => Month::December,
        _ => return None,
    };
    Some(month)
}

pub fn month_name(month: Month) -> &'static str {
    MONTH_NAMES[month.number_from_month() as usize - 1]
}

/// Renders a stored date as `"<Mois> <Année>"`.
///
/// Empty input gives an empty string. Unparsable input is logged and also
/// gives an empty string; callers never see an error from this direction.
pub fn to_display(iso_date: &str) -> String {
    let iso_date = iso_date.trim();
    if iso_date.is_empty() {
        return String::new();
    }

    match parse_calendar_date(iso_date) {
        Some(date) => format_display(date),
        None => {
            tracing::warn!(input = %iso_date, "unable to format stored project date");
            String::new()
        }
    }
}

pub fn format_display(date: NaiveDate) -> String {
    let month = Month::try_from(date.month() as u8).unwrap_or(Month::January);
    format!("{} {}", month_name(month), date.year())
}

fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Parses `"<Mois> <Année>"` into the first day of that month.
pub fn to_storage(display_text: &str) -> Result<NaiveDate, AppError> {
    let (month_word, year_word) = display_text
        .trim()
        .split_once(' ')
        .ok_or(AppError::InvalidDateFormat)?;

    let month = month_from_word(&month_word.trim().to_lowercase())
        .ok_or(AppError::InvalidDateFormat)?;

    let year_word = year_word.trim();
    if year_word.len() != 4 || !year_word.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidDateFormat);
    }
    let year: i32 = year_word.parse().map_err(|_| AppError::InvalidDateFormat)?;

    NaiveDate::from_ymd_opt(year, month.number_from_month(), 1)
        .ok_or(AppError::InvalidDateFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iso(text: &str) -> String {
        to_storage(text).expect("valid display date").to_string()
    }

    #[test]
    fn every_canonical_month_round_trips() {
        for year in ["1999", "2024", "2031"] {
            for name in MONTH_NAMES {
                let input = format!("{name} {year}");
                let first = to_storage(&input).unwrap();
                let again = to_storage(&to_display(&first.to_string())).unwrap();

                assert_eq!(first, again, "round trip failed for {input}");
                assert_eq!(to_display(&first.to_string()), input);
            }
        }
    }

    #[test]
    fn accented_and_unaccented_february_agree() {
        assert_eq!(iso("Fevrier 2024"), "2024-02-01");
        assert_eq!(iso("Février 2024"), "2024-02-01");
        assert_eq!(iso("aout 2023"), "2023-08-01");
        assert_eq!(iso("DECEMBRE 2020"), "2020-12-01");
    }

    #[test]
    fn unaccented_input_displays_canonical_spelling() {
        let date = to_storage("aout 2023").unwrap();
        assert_eq!(to_display(&date.to_string()), "Août 2023");
    }

    #[test]
    fn unknown_month_is_rejected() {
        assert!(matches!(to_storage("Smarch 2024"), Err(AppError::InvalidDateFormat)));
    }

    #[test]
    fn missing_year_is_rejected() {
        assert!(matches!(to_storage("Janvier"), Err(AppError::InvalidDateFormat)));
        assert!(matches!(to_storage("Janvier "), Err(AppError::InvalidDateFormat)));
    }

    #[test]
    fn malformed_shapes_are_rejected() {
        for input in ["", "2024 Janvier", "Janvier 24", "Janvier 2024 extra", "Janvier abcd"] {
            assert!(
                matches!(to_storage(input), Err(AppError::InvalidDateFormat)),
                "expected rejection for {input:?}"
            );
        }
    }

    #[test]
    fn display_of_empty_or_garbage_is_empty() {
        assert_eq!(to_display(""), "");
        assert_eq!(to_display("not a date"), "");
    }

    #[test]
    fn display_accepts_timestamps() {
        assert_eq!(to_display("2023-08-01T10:00:00Z"), "Août 2023");
        assert_eq!(to_display("2022-03-15"), "Mars 2022");
    }
}

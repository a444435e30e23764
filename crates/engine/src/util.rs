//! Internal helpers for input normalization and validation.
//!
//! These utilities are **not** part of the public API. They centralize the
//! checks shared by the ops so every entry point enforces the same rules.

use chrono::NaiveDate;

use crate::{EngineError, ResultEngine, students::NISN_MAX_LEN};

/// Minimum accepted password length, in characters.
pub(crate) const PASSWORD_MIN_LEN: usize = 6;

/// Trim `value` and drop it when nothing is left.
pub(crate) fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Trim a mandatory field, failing with `message` when it is blank.
pub(crate) fn normalize_required(value: &str, message: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidField(message.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Reject `value` when it is longer than `max` characters.
pub(crate) fn check_max_len(value: &str, max: usize, field: &str) -> ResultEngine<()> {
    if value.chars().count() > max {
        return Err(EngineError::InvalidField(format!(
            "{field} maksimal {max} karakter"
        )));
    }
    Ok(())
}

/// Trim an optional text field, keeping an empty string for blanks.
pub(crate) fn trimmed_or_empty(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// A NISN is 1 to 20 ASCII digits.
pub(crate) fn normalize_nisn(value: &str) -> ResultEngine<String> {
    let nisn = normalize_required(value, "NISN wajib diisi")?;
    if nisn.len() > NISN_MAX_LEN || !nisn.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::InvalidField(format!(
            "NISN harus berupa angka (maksimal {NISN_MAX_LEN} digit)"
        )));
    }
    Ok(nisn)
}

/// Enrollment year: exactly four digits.
pub(crate) fn normalize_angkatan(value: &str) -> ResultEngine<String> {
    let angkatan = value.trim();
    if angkatan.len() != 4 || !angkatan.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::InvalidField(
            "Angkatan harus 4 digit tahun".to_string(),
        ));
    }
    Ok(angkatan.to_string())
}

pub(crate) fn validate_password(password: &str, message: &str) -> ResultEngine<()> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(EngineError::InvalidField(message.to_string()));
    }
    Ok(())
}

/// Rupiah amounts are whole and strictly positive.
pub(crate) fn validate_nominal(nominal: i64) -> ResultEngine<i64> {
    if nominal <= 0 {
        return Err(EngineError::InvalidField(
            "Nominal harus lebih dari 0".to_string(),
        ));
    }
    Ok(nominal)
}

/// Half-open date range `[first day of month, first day of next month)`.
pub(crate) fn month_range(year: i32, month: u32) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let invalid = || EngineError::InvalidField("Bulan atau tahun tidak valid".to_string());
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(invalid)?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_trims_and_drops_blanks() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty(" a@b.c ".to_string()), Some("a@b.c".to_string()));
    }

    #[test]
    fn nisn_must_be_digits() {
        assert_eq!(normalize_nisn(" 2024001 ").unwrap(), "2024001");
        assert!(normalize_nisn("20A4").is_err());
        assert!(normalize_nisn("").is_err());
        assert!(normalize_nisn(&"1".repeat(21)).is_err());
    }

    #[test]
    fn angkatan_is_four_digits() {
        assert_eq!(normalize_angkatan("2024").unwrap(), "2024");
        assert!(normalize_angkatan("24").is_err());
        assert!(normalize_angkatan("20x4").is_err());
    }

    #[test]
    fn max_len_counts_characters() {
        assert!(check_max_len("ééé", 3, "Kelas").is_ok());
        assert_eq!(
            check_max_len("10 IPA 1 Unggulan", 10, "Kelas").unwrap_err(),
            EngineError::InvalidField("Kelas maksimal 10 karakter".to_string())
        );
    }

    #[test]
    fn december_range_rolls_into_next_year() {
        let (start, end) = month_range(2024, 12).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn month_out_of_range_is_rejected() {
        assert!(month_range(2024, 0).is_err());
        assert!(month_range(2024, 13).is_err());
    }
}

//! Minor-unit money helpers.
//!
//! Amounts are carried as `i64` minor units (paise/cents) end to end; the
//! database stores them as `BIGINT`. Nothing in the service does float
//! arithmetic on money.

/// Clamp a computed balance at zero.
///
/// Concessions can push the raw balance formula below zero; the ledger
/// reports zero outstanding in that case rather than a credit.
#[inline]
pub fn floor_zero(minor: i64) -> i64 {
    minor.max(0)
}

/// Render minor units as a decimal string, e.g. `70050` -> `"700.50"`.
pub fn display_minor(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_zero_clamps_negatives() {
        assert_eq!(floor_zero(-500), 0);
        assert_eq!(floor_zero(0), 0);
        assert_eq!(floor_zero(250), 250);
    }

    #[test]
    fn display_whole_and_fractional() {
        assert_eq!(display_minor(70000), "700.00");
        assert_eq!(display_minor(70050), "700.50");
        assert_eq!(display_minor(5), "0.05");
        assert_eq!(display_minor(0), "0.00");
    }

    #[test]
    fn display_negative() {
        assert_eq!(display_minor(-150), "-1.50");
    }
}

#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use cron::Schedule;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::error::{Error, Result};

/// Validate a cron expression (seconds-resolution syntax).
///
/// # Errors
/// Returns a validation error if the expression does not parse
pub fn validate_cron(expr: &str) -> Result<()> {
    Schedule::from_str(expr)
        .map(|_| ())
        .map_err(|e| Error::Validation(format!("Invalid cron expression '{expr}': {e}")))
}

/// Next fire time of a cron expression strictly after `after`, in UTC.
///
/// # Errors
/// Returns a validation error if the expression does not parse
pub fn next_cron_fire(expr: &str, after: OffsetDateTime) -> Result<Option<OffsetDateTime>> {
    let schedule = Schedule::from_str(expr)
        .map_err(|e| Error::Validation(format!("Invalid cron expression '{expr}': {e}")))?;

    let after_chrono = chrono_from_unix(after.unix_timestamp());
    Ok(schedule
        .after(&after_chrono)
        .next()
        .map(|dt| OffsetDateTime::from_unix_timestamp(dt.timestamp()).unwrap_or(after)))
}

fn chrono_from_unix(secs: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0)
        .unwrap_or_else(chrono::Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_validate_cron() {
        assert!(validate_cron("0 0 2 * * *").is_ok());
        assert!(validate_cron("not a cron").is_err());
    }

    #[test]
    fn test_next_cron_fire_daily_two_am() {
        let after = datetime!(2025-03-10 12:00:00 UTC);
        let next = next_cron_fire("0 0 2 * * *", after).unwrap().unwrap();
        assert_eq!(next, datetime!(2025-03-11 2:00:00 UTC));
    }
}

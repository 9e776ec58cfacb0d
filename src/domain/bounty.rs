//! Bounty drafts and their validation
//!
//! A [`BountyDraft`] is what the user edits. [`BountyDraft::validate_in`]
//! turns it into a [`ValidatedBounty`] carrying the reward in wei and the
//! deadline as a Unix timestamp, or reports the first problem found.

use alloy::primitives::utils::parse_ether;
use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use super::U256;
use crate::infra::ValidationError;

/// Time of day used when the user picks only a date
pub const DEFAULT_DEADLINE_TIME: &str = "23:59";

/// Editable bounty form state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BountyDraft {
    pub title: String,
    pub description: String,
    pub requirements: String,
    /// Reward in native-currency units, as typed (e.g. "0.5")
    pub reward: String,
    pub date: Option<NaiveDate>,
    /// Time of day as `HH:MM`
    pub time: String,
}

impl Default for BountyDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            requirements: String::new(),
            reward: String::new(),
            date: None,
            time: DEFAULT_DEADLINE_TIME.to_string(),
        }
    }
}

/// A draft that passed local validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBounty {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub reward_wei: U256,
    /// Unix seconds
    pub deadline: u64,
}

impl BountyDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        requirements: impl Into<String>,
        reward: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            requirements: requirements.into(),
            reward: reward.into(),
            ..Default::default()
        }
    }

    pub fn with_deadline(mut self, date: NaiveDate, time: impl Into<String>) -> Self {
        self.date = Some(date);
        self.time = time.into();
        self
    }

    /// Validate against the local time zone
    pub fn validate(&self) -> Result<ValidatedBounty, ValidationError> {
        self.validate_in(&Local)
    }

    /// Validate, resolving the deadline in `tz`
    pub fn validate_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<ValidatedBounty, ValidationError> {
        let title = required("title", &self.title)?;
        let description = required("description", &self.description)?;
        let requirements = required("requirements", &self.requirements)?;
        let reward_wei = parse_reward(&self.reward)?;
        let date = self.date.ok_or(ValidationError::MissingDeadline)?;
        let time = parse_time(&self.time)?;
        let deadline = deadline_timestamp(date, time, tz)?;

        Ok(ValidatedBounty {
            title,
            description,
            requirements,
            reward_wei,
            deadline,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Parse a decimal native-currency amount into wei (18 decimals)
pub fn parse_reward(raw: &str) -> Result<U256, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField("reward"));
    }
    if trimmed.starts_with('-') {
        return Err(ValidationError::NonPositiveReward);
    }

    let wei = parse_ether(trimmed)
        .map_err(|e| ValidationError::InvalidReward(format!("{trimmed}: {e}")))?;
    if wei.is_zero() {
        return Err(ValidationError::NonPositiveReward);
    }
    Ok(wei)
}

/// Parse an `HH:MM` time of day
pub fn parse_time(raw: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| ValidationError::InvalidTime(raw.to_string()))
}

/// Combine a date and time of day in `tz` into Unix seconds.
///
/// Seconds are always zero. A wall-clock time that occurs twice (DST
/// fall-back) resolves to the earlier instant; one that never occurs is
/// rejected.
pub fn deadline_timestamp<Tz: TimeZone>(
    date: NaiveDate,
    time: NaiveTime,
    tz: &Tz,
) -> Result<u64, ValidationError> {
    let local = date.and_time(time);
    let instant = tz
        .from_local_datetime(&local)
        .earliest()
        .ok_or(ValidationError::UnresolvableDeadline)?;
    u64::try_from(instant.timestamp()).map_err(|_| ValidationError::UnresolvableDeadline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn draft() -> BountyDraft {
        BountyDraft::new("Fix bug", "Crash on start", "Send a PR", "0.5")
            .with_deadline(NaiveDate::from_ymd_opt(2030, 1, 15).unwrap(), "23:59")
    }

    #[test]
    fn test_validate_converts_reward_and_deadline() {
        let validated = draft().validate_in(&Utc).unwrap();

        assert_eq!(
            validated.reward_wei,
            U256::from(500_000_000_000_000_000u64)
        );
        // 2030-01-15T23:59:00Z
        assert_eq!(validated.deadline, 1_894_751_940);
        assert_eq!(validated.title, "Fix bug");
    }

    #[test]
    fn test_default_time_is_end_of_day() {
        assert_eq!(BountyDraft::default().time, "23:59");
    }

    #[test]
    fn test_missing_fields_are_reported_in_order() {
        let mut d = draft();
        d.title = "   ".to_string();
        assert_eq!(
            d.validate_in(&Utc).unwrap_err(),
            ValidationError::MissingField("title")
        );

        let mut d = draft();
        d.requirements.clear();
        assert_eq!(
            d.validate_in(&Utc).unwrap_err(),
            ValidationError::MissingField("requirements")
        );
    }

    #[test]
    fn test_missing_date() {
        let mut d = draft();
        d.date = None;
        assert_eq!(
            d.validate_in(&Utc).unwrap_err(),
            ValidationError::MissingDeadline
        );
    }

    #[test]
    fn test_reward_must_be_positive() {
        assert_eq!(parse_reward("0"), Err(ValidationError::NonPositiveReward));
        assert_eq!(parse_reward("0.000"), Err(ValidationError::NonPositiveReward));
        assert_eq!(parse_reward("-1"), Err(ValidationError::NonPositiveReward));
        assert!(matches!(
            parse_reward("abc"),
            Err(ValidationError::InvalidReward(_))
        ));
    }

    #[test]
    fn test_reward_whole_units() {
        assert_eq!(
            parse_reward("2").unwrap(),
            U256::from(2_000_000_000_000_000_000u128)
        );
    }

    #[test]
    fn test_invalid_time() {
        assert!(matches!(
            parse_time("25:00"),
            Err(ValidationError::InvalidTime(_))
        ));
        assert!(matches!(
            parse_time("noon"),
            Err(ValidationError::InvalidTime(_))
        ));
        assert_eq!(
            parse_time("07:05").unwrap(),
            NaiveTime::from_hms_opt(7, 5, 0).unwrap()
        );
    }

    #[test]
    fn test_deadline_respects_timezone_offset() {
        let tz = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2030, 1, 15).unwrap();
        let time = NaiveTime::from_hms_opt(23, 59, 0).unwrap();

        let utc = deadline_timestamp(date, time, &Utc).unwrap();
        let plus_two = deadline_timestamp(date, time, &tz).unwrap();
        assert_eq!(utc - plus_two, 2 * 3600);
    }
}

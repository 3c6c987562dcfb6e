// Account removal form ("sortie des effectifs")

use chrono::{DateTime, Duration, TimeZone};
use serde::{Deserialize, Serialize};

use crate::client::models::DeleteUserRequest;
use crate::form::ValidationError;
use crate::login::PersonName;
use crate::types::{component, person_from_dn};

/// Longest retention accepted, ten years.
pub const MAX_RETENTION_DAYS: u32 = 3650;
/// Minutes are meant for short delays; one year at most.
pub const MAX_RETENTION_MINUTES: u32 = 525_600;

/// How long a disabled account is kept before the directory deletes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retention {
    pub days: u32,
    pub minutes: u32,
}

impl Retention {
    pub fn immediate() -> Self {
        Self::default()
    }

    pub fn is_immediate(&self) -> bool {
        self.days == 0 && self.minutes == 0
    }

    /// Date the account will be removed, formatted like the directory
    /// stores it (`%Y-%m-%d %H:%M`). `None` for immediate deletion, or when
    /// the date falls outside the representable range.
    pub fn planned_deletion<Tz>(&self, now: DateTime<Tz>) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        if self.is_immediate() {
            return None;
        }
        let at = now
            .checked_add_signed(Duration::days(i64::from(self.days)))?
            .checked_add_signed(Duration::minutes(i64::from(self.minutes)))?;
        Some(at.format("%Y-%m-%d %H:%M").to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct OffboardingForm {
    dn: Option<String>,
    person: PersonName,
    pub immediate: bool,
    pub retention_days: String,
    pub retention_minutes: String,
}

impl OffboardingForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the account to remove from a search result.
    pub fn select_user(&mut self, dn: &str) {
        let dn = dn.trim();
        self.person = person_from_dn(dn);
        self.dn = Some(dn.to_string()).filter(|d| !d.is_empty());
    }

    pub fn dn(&self) -> Option<&str> {
        self.dn.as_deref()
    }

    pub fn person(&self) -> &PersonName {
        &self.person
    }

    /// OU the selected account currently lives in.
    pub fn current_ou(&self) -> Option<String> {
        self.dn.as_deref().and_then(|dn| component(dn, "OU"))
    }

    pub fn retention(&self) -> Result<Retention, ValidationError> {
        if self.immediate {
            return Ok(Retention::immediate());
        }

        let days = self.retention_days.trim();
        let minutes = self.retention_minutes.trim();
        if days.is_empty() && minutes.is_empty() {
            return Err(ValidationError::new("Retention period is required")
                .field("retention_days", "Enter a number of days or minutes")
                .field("retention_minutes", "Enter a number of days or minutes"));
        }

        let days = parse_count(days);
        let minutes = parse_count(minutes);

        let mut err = ValidationError::new("Retention period is invalid");
        match days {
            None => err = err.field("retention_days", "Must be a whole number"),
            Some(d) if d > MAX_RETENTION_DAYS => {
                err = err.field("retention_days", format!("At most {} days", MAX_RETENTION_DAYS))
            }
            Some(_) => {}
        }
        match minutes {
            None => err = err.field("retention_minutes", "Must be a whole number"),
            Some(m) if m > MAX_RETENTION_MINUTES => {
                err = err.field("retention_minutes", format!("At most {} minutes", MAX_RETENTION_MINUTES))
            }
            Some(_) => {}
        }
        err.into_result()?;

        let retention = Retention {
            days: days.unwrap_or(0),
            minutes: minutes.unwrap_or(0),
        };
        if retention.is_immediate() {
            tracing::warn!("Zero retention entered: the account will be deleted immediately");
        }
        Ok(retention)
    }

    /// Set when deferred deletion was chosen but the period adds up to zero,
    /// which the directory treats as immediate deletion.
    pub fn zero_retention_notice(&self) -> Option<&'static str> {
        if self.immediate {
            return None;
        }
        match self.retention() {
            Ok(retention) if retention.is_immediate() => {
                Some("Retention period is zero: the account will be deleted immediately")
            }
            _ => None,
        }
    }

    pub fn to_request(&self) -> Result<DeleteUserRequest, ValidationError> {
        let Some(dn) = self.dn.clone() else {
            return Err(ValidationError::new("No account selected").field("dn", "Select a user to remove"));
        };
        let retention = self.retention()?;

        Ok(DeleteUserRequest {
            dn,
            full_name: self.person.full_name().trim().to_string(),
            retention_days: retention.days,
            retention_minutes: retention.minutes,
        })
    }
}

/// Empty counts as zero; anything else must be a non-negative integer.
fn parse_count(raw: &str) -> Option<u32> {
    if raw.is_empty() {
        return Some(0);
    }
    raw.parse().ok()
}

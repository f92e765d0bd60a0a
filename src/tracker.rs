//! Session state for the shared access codes.
//!
//! Every configured code maps to at most one reservation. Entries are fixed
//! at construction; check-in and check-out only swap the reservation value.
//! Availability is always derived from the mapping, never stored.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// The occupant of a code and when their slot runs out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservation {
    pub occupant: String,
    pub expires_at: DateTime<Utc>,
}

impl Reservation {
    /// Whether the reservation's end time has passed. Informational only:
    /// nothing releases an expired code except an explicit check-out.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whole minutes left before expiry, rounded up; zero once expired
    pub fn minutes_left(&self, now: DateTime<Utc>) -> i64 {
        let secs = (self.expires_at - now).num_seconds();
        if secs <= 0 {
            0
        } else {
            (secs + 59) / 60
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    code: String,
    reservation: Option<Reservation>,
}

/// Owns the code -> reservation mapping, in configured order
#[derive(Debug, Clone)]
pub struct Tracker {
    slots: Vec<Slot>,
}

/// Serializable view of a single code
#[derive(Debug, Clone, Serialize)]
pub struct CodeStatus {
    pub code: String,
    pub available: bool,
    pub occupant: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Serializable view of the whole tracker
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub available: usize,
    pub total: usize,
    pub codes: Vec<CodeStatus>,
}

impl Tracker {
    /// Create a tracker with every code unoccupied. Duplicate names collapse
    /// onto the first occurrence so each code has exactly one entry.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut slots: Vec<Slot> = Vec::new();
        for code in codes {
            let code = code.into();
            if slots.iter().any(|s| s.code == code) {
                continue;
            }
            slots.push(Slot {
                code,
                reservation: None,
            });
        }
        Self { slots }
    }

    fn slot(&self, code: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.code == code)
    }

    fn slot_mut(&mut self, code: &str) -> Result<&mut Slot> {
        self.slots
            .iter_mut()
            .find(|s| s.code == code)
            .ok_or_else(|| anyhow!("Unknown code: {}", code))
    }

    /// All configured codes in order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.code.as_str())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.slot(code).is_some()
    }

    pub fn total(&self) -> usize {
        self.slots.len()
    }

    /// Current reservation of a code, if any
    pub fn reservation(&self, code: &str) -> Option<&Reservation> {
        self.slot(code).and_then(|s| s.reservation.as_ref())
    }

    /// True iff the code is configured and has no reservation
    pub fn is_available(&self, code: &str) -> bool {
        self.slot(code).is_some_and(|s| s.reservation.is_none())
    }

    pub fn available_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.reservation.is_none())
            .count()
    }

    /// Available codes, in configured order
    pub fn available_codes(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|s| s.reservation.is_none())
            .map(|s| s.code.as_str())
            .collect()
    }

    /// Reserve `code` for `name` until `now + minutes`.
    ///
    /// Rejects an empty name, a zero duration, an unknown code and a code
    /// that is already occupied. On rejection the state is untouched.
    pub fn check_in(
        &mut self,
        name: &str,
        minutes: u32,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<&Reservation> {
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("Occupant name must not be empty"));
        }
        if minutes == 0 {
            return Err(anyhow!("Duration must be a positive number of minutes"));
        }

        let slot = self.slot_mut(code)?;
        if let Some(existing) = &slot.reservation {
            return Err(anyhow!(
                "{} is already in use by {}",
                code,
                existing.occupant
            ));
        }

        let expires_at = now + Duration::minutes(i64::from(minutes));
        log::info!("check-in: {} -> {} until {}", code, name, expires_at);
        Ok(&*slot.reservation.insert(Reservation {
            occupant: name.to_string(),
            expires_at,
        }))
    }

    /// Release `code`. Returns the discarded reservation, or `None` if the
    /// code was already free (which is not an error).
    pub fn check_out(&mut self, code: &str) -> Result<Option<Reservation>> {
        let slot = self.slot_mut(code)?;
        let released = slot.reservation.take();
        match &released {
            Some(r) => log::info!("check-out: {} released by {}", code, r.occupant),
            None => log::debug!("check-out: {} was already available", code),
        }
        Ok(released)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            available: self.available_count(),
            total: self.total(),
            codes: self
                .slots
                .iter()
                .map(|s| CodeStatus {
                    code: s.code.clone(),
                    available: s.reservation.is_none(),
                    occupant: s.reservation.as_ref().map(|r| r.occupant.clone()),
                    expires_at: s.reservation.as_ref().map(|r| r.expires_at),
                })
                .collect(),
        }
    }
}

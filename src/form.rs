//! Transient check-in form input.
//!
//! Holds what the user has typed so far. Nothing here is part of the
//! tracked state; a submission only reaches the tracker when every field
//! passes its presence check.

use crate::tracker::{Reservation, Tracker};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct CheckInForm {
    pub name: String,
    pub duration: String,
    selected: Option<String>,
}

/// Parse the duration field as a positive number of minutes.
/// Anything else (blank, non-numeric, zero, negative, overflow) is `None`.
pub fn parse_minutes(input: &str) -> Option<u32> {
    match input.trim().parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(minutes) => Some(minutes),
    }
}

impl CheckInForm {
    /// Start with the first configured code selected
    pub fn new(tracker: &Tracker) -> Self {
        Self {
            selected: tracker.codes().next().map(str::to_string),
            ..Self::default()
        }
    }

    pub fn minutes(&self) -> Option<u32> {
        parse_minutes(&self.duration)
    }

    /// Whether the check-in button is enabled
    pub fn can_submit(&self) -> bool {
        !self.name.trim().is_empty() && self.minutes().is_some()
    }

    /// Pick a code from the selector. Only available codes are offered.
    pub fn select(&mut self, code: &str, tracker: &Tracker) -> Result<()> {
        if !tracker.contains(code) {
            return Err(anyhow!("Unknown code: {}", code));
        }
        if !tracker.is_available(code) {
            return Err(anyhow!("{} is not available", code));
        }
        self.selected = Some(code.to_string());
        Ok(())
    }

    /// The code a submit would use: the stored selection while it is still
    /// available, otherwise the first available code.
    pub fn effective_code<'a>(&'a self, tracker: &'a Tracker) -> Option<&'a str> {
        match self.selected.as_deref() {
            Some(code) if tracker.is_available(code) => Some(code),
            _ => tracker.available_codes().into_iter().next(),
        }
    }

    /// Reset name and duration; the selected code is kept
    pub fn clear(&mut self) {
        self.name.clear();
        self.duration.clear();
    }

    /// Submit the form against the tracker.
    ///
    /// Returns `Ok(None)` without touching anything when the button would be
    /// disabled or no code is available. On success the name and duration
    /// fields are cleared.
    pub fn submit(
        &mut self,
        tracker: &mut Tracker,
        now: DateTime<Utc>,
    ) -> Result<Option<(String, Reservation)>> {
        let Some(minutes) = self.minutes() else {
            log::debug!("check-in ignored: invalid duration {:?}", self.duration);
            return Ok(None);
        };
        if self.name.trim().is_empty() {
            log::debug!("check-in ignored: empty name");
            return Ok(None);
        }
        let Some(code) = self.effective_code(tracker).map(str::to_string) else {
            log::debug!("check-in ignored: no code available");
            return Ok(None);
        };

        let reservation = tracker.check_in(&self.name, minutes, &code, now)?.clone();
        self.clear();
        Ok(Some((code, reservation)))
    }
}

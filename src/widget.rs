//! The code tracker widget: owned tracker state, the form, and display settings.

use crate::config::{Config, DisplayConfig};
use crate::form::CheckInForm;
use crate::render;
use crate::tracker::{Reservation, Tracker};
use anyhow::Result;
use chrono::{DateTime, Utc};

pub struct Widget {
    pub tracker: Tracker,
    pub form: CheckInForm,
    pub display: DisplayConfig,
}

impl Widget {
    pub fn new(config: &Config) -> Self {
        let tracker = Tracker::new(config.codes.iter().cloned());
        let form = CheckInForm::new(&tracker);
        Self {
            tracker,
            form,
            display: config.display.clone(),
        }
    }

    /// Submit the check-in form. `None` means the submit was ignored.
    pub fn check_in(&mut self, now: DateTime<Utc>) -> Result<Option<(String, Reservation)>> {
        self.form.submit(&mut self.tracker, now)
    }

    pub fn check_out(&mut self, code: &str) -> Result<Option<Reservation>> {
        self.tracker.check_out(code)
    }

    pub fn is_available(&self, code: &str) -> bool {
        self.tracker.is_available(code)
    }

    pub fn available_count(&self) -> usize {
        self.tracker.available_count()
    }

    /// Whether the check-in form is shown at all
    pub fn form_visible(&self) -> bool {
        self.available_count() > 0
    }

    pub fn render(&self, now: DateTime<Utc>) -> String {
        render::render(&self.tracker, &self.form, &self.display, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap()
    }

    #[test]
    fn test_widget_from_config() {
        let mut config = Config::with_default_codes();
        config.codes = vec!["North".to_string(), "South".to_string()];
        let widget = Widget::new(&config);
        assert_eq!(widget.tracker.total(), 2);
        assert_eq!(widget.available_count(), 2);
        assert!(widget.form_visible());
    }

    #[test]
    fn test_bob_scenario_through_widget() {
        let mut widget = Widget::new(&Config::with_default_codes());
        widget.form.select("Code B", &widget.tracker).unwrap();
        widget.form.name = "Bob".to_string();
        widget.form.duration = "45".to_string();

        let (code, reservation) = widget.check_in(start()).unwrap().unwrap();
        assert_eq!(code, "Code B");
        assert_eq!(reservation.expires_at, start() + Duration::minutes(45));
        assert_eq!(widget.available_count(), 2);
        assert!(!widget.is_available("Code B"));

        let released = widget.check_out("Code B").unwrap();
        assert_eq!(released.unwrap().occupant, "Bob");
        assert_eq!(widget.available_count(), 3);
        assert!(widget.is_available("Code B"));
    }

    #[test]
    fn test_form_visibility_follows_availability() {
        let mut config = Config::with_default_codes();
        config.codes = vec!["Solo".to_string()];
        let mut widget = Widget::new(&config);
        widget.form.name = "Ann".to_string();
        widget.form.duration = "5".to_string();
        widget.check_in(start()).unwrap().unwrap();
        assert!(!widget.form_visible());

        widget.check_out("Solo").unwrap();
        assert!(widget.form_visible());
        assert_eq!(widget.form.effective_code(&widget.tracker), Some("Solo"));
    }
}

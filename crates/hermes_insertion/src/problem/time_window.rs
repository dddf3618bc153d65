use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub type TimeWindows = SmallVec<[TimeWindow; 1]>;

/// Bounds on the operation start of an activity. A missing bound is
/// unbounded on that side.
#[derive(Deserialize, Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    start: Option<Timestamp>,
    end: Option<Timestamp>,
}

impl TimeWindow {
    pub const UNBOUNDED: TimeWindow = TimeWindow {
        start: None,
        end: None,
    };

    pub fn new(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        TimeWindow { start, end }
    }

    pub fn start(&self) -> Option<Timestamp> {
        self.start
    }

    pub fn end(&self) -> Option<Timestamp> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// A window whose start is after its end can never be satisfied and is
    /// rejected when the problem is built.
    pub fn is_valid(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }

    pub fn earliest(&self) -> Timestamp {
        self.start.unwrap_or(Timestamp::MIN)
    }

    pub fn latest(&self) -> Timestamp {
        self.end.unwrap_or(Timestamp::MAX)
    }

    pub fn is_satisfied(&self, start: Timestamp) -> bool {
        start <= self.latest()
    }

    /// Width of the window, `None` when one side is unbounded.
    pub fn width(&self) -> Option<SignedDuration> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }
}

/// The windows to try for an activity. Activities without windows are tried
/// once, unbounded.
pub fn candidate_windows(time_windows: &[TimeWindow]) -> impl Iterator<Item = TimeWindow> + '_ {
    let unbounded = time_windows.is_empty().then_some(TimeWindow::UNBOUNDED);
    time_windows.iter().copied().chain(unbounded)
}

#[derive(Default)]
pub struct TimeWindowBuilder {
    start: Option<Timestamp>,
    end: Option<Timestamp>,
}

impl TimeWindowBuilder {
    pub fn with_start(mut self, start: Timestamp) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: Timestamp) -> Self {
        self.end = Some(end);
        self
    }

    pub fn build(self) -> TimeWindow {
        TimeWindow {
            start: self.start,
            end: self.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let start: Timestamp = "2025-06-10T08:00:00+02:00".parse().unwrap();
        let end: Timestamp = "2025-06-10T10:00:00+02:00".parse().unwrap();
        let time_window = TimeWindowBuilder::default()
            .with_start(start)
            .with_end(end)
            .build();

        assert_eq!(time_window.start().unwrap(), start);
        assert_eq!(time_window.end().unwrap(), end);
        assert_eq!(time_window.width(), Some(SignedDuration::from_hours(2)));
    }

    #[test]
    fn test_is_valid() {
        let early: Timestamp = "2025-06-10T08:00:00Z".parse().unwrap();
        let late: Timestamp = "2025-06-10T10:00:00Z".parse().unwrap();

        assert!(TimeWindow::new(Some(early), Some(late)).is_valid());
        assert!(TimeWindow::new(None, Some(early)).is_valid());
        assert!(!TimeWindow::new(Some(late), Some(early)).is_valid());
    }

    #[test]
    fn test_unbounded_sides() {
        let time_window = TimeWindow::UNBOUNDED;

        assert_eq!(time_window.earliest(), Timestamp::MIN);
        assert_eq!(time_window.latest(), Timestamp::MAX);
        assert!(time_window.width().is_none());
        assert!(time_window.is_satisfied(Timestamp::MAX));
    }

    #[test]
    fn test_candidate_windows() {
        let start: Timestamp = "2025-06-10T08:00:00Z".parse().unwrap();
        let windows = [
            TimeWindow::new(Some(start), None),
            TimeWindow::new(None, Some(start)),
        ];

        assert_eq!(candidate_windows(&windows).count(), 2);
        assert_eq!(
            candidate_windows(&[]).collect::<Vec<_>>(),
            vec![TimeWindow::UNBOUNDED]
        );
    }
}

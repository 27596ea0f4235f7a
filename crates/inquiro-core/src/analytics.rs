use std::time::{Duration, Instant};

/// Session-local study counters shown on the analytics tab.
#[derive(Debug, Clone, Default)]
pub struct StudyStats {
    pub documents: usize,
    pub uploads: usize,
    pub questions_asked: usize,
    pub answers_received: usize,
    pub flashcards_generated: usize,
    pub cards_reviewed: usize,
    started: Option<Instant>,
}

impl StudyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset everything and start the session clock.
    pub fn start(&mut self, now: Instant) {
        *self = Self {
            started: Some(now),
            ..Self::default()
        };
    }

    pub fn stop(&mut self) {
        *self = Self::default();
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.started
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default()
    }

    /// Share of asked questions that came back with an answer, in percent.
    pub fn answer_rate(&self) -> Option<u8> {
        if self.questions_asked == 0 {
            return None;
        }
        let rate = self.answers_received * 100 / self.questions_asked;
        Some(rate.min(100) as u8)
    }
}

/// "1h 05m", "12m 03s" or "42s".
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_resets_counters() {
        let now = Instant::now();
        let mut stats = StudyStats::new();
        stats.questions_asked = 4;
        stats.start(now);
        assert_eq!(stats.questions_asked, 0);
        assert_eq!(stats.elapsed(now + Duration::from_secs(90)), Duration::from_secs(90));
    }

    #[test]
    fn test_answer_rate() {
        let mut stats = StudyStats::new();
        assert_eq!(stats.answer_rate(), None);
        stats.questions_asked = 4;
        stats.answers_received = 3;
        assert_eq!(stats.answer_rate(), Some(75));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(42)), "42s");
        assert_eq!(format_elapsed(Duration::from_secs(723)), "12m 03s");
        assert_eq!(format_elapsed(Duration::from_secs(3900)), "1h 05m");
    }
}

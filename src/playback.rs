// Play/pause state for stepping the ranking view through periods.
//
// The state only counts ticks. Which period is on screen is derived from the
// counter each time it is read, so stopping needs no cleanup.
use serde::Serialize;

use crate::types::Period;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AnimationState {
    pub status: PlaybackStatus,
    pub tick_count: u64,
}

impl AnimationState {
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// Index into a sequence of `len` periods: wraps while playing, always
    /// the first period while stopped.
    pub fn period_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        match self.status {
            PlaybackStatus::Playing => Some((self.tick_count % len as u64) as usize),
            PlaybackStatus::Stopped => Some(0),
        }
    }

    pub fn current_period(&self, periods: &[Period]) -> Option<Period> {
        self.period_index(periods.len()).map(|i| periods[i])
    }

    /// The period a rank delta compares against: the one before the current
    /// period, only while playing and not on the first period.
    pub fn previous_period(&self, periods: &[Period]) -> Option<Period> {
        if !self.is_playing() {
            return None;
        }
        match self.period_index(periods.len()) {
            Some(i) if i > 0 => Some(periods[i - 1]),
            _ => None,
        }
    }
}

/// Driver-facing wrapper. An external timer calls [`Animation::tick`] once per
/// interval and a play/pause control calls [`Animation::toggle`].
#[derive(Debug, Clone, Default)]
pub struct Animation {
    state: AnimationState,
}

impl Animation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Flip between stopped and playing. The tick counter is kept.
    pub fn toggle(&mut self) -> AnimationState {
        self.state.status = match self.state.status {
            PlaybackStatus::Stopped => PlaybackStatus::Playing,
            PlaybackStatus::Playing => PlaybackStatus::Stopped,
        };
        self.state
    }

    /// Advance one tick; ignored while stopped.
    pub fn tick(&mut self) -> AnimationState {
        if self.state.is_playing() {
            self.state.tick_count += 1;
        }
        self.state
    }

    pub fn current_period(&self, periods: &[Period]) -> Option<Period> {
        self.state.current_period(periods)
    }

    pub fn previous_period(&self, periods: &[Period]) -> Option<Period> {
        self.state.previous_period(periods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn years() -> Vec<Period> {
        (2018..=2024).collect()
    }

    #[test]
    fn starts_stopped_at_zero() {
        let a = Animation::new();
        assert_eq!(a.state().status, PlaybackStatus::Stopped);
        assert_eq!(a.state().tick_count, 0);
        assert_eq!(a.current_period(&years()), Some(2018));
    }

    #[test]
    fn stopped_always_shows_first_period() {
        let state = AnimationState {
            status: PlaybackStatus::Stopped,
            tick_count: 7,
        };
        assert_eq!(state.current_period(&years()), Some(2018));
        assert_eq!(state.previous_period(&years()), None);
    }

    #[test]
    fn playing_wraps_around() {
        let mut a = Animation::new();
        a.toggle();
        for _ in 0..8 {
            a.tick();
        }
        assert_eq!(a.state().tick_count, 8);
        assert_eq!(a.current_period(&years()), Some(2019));
        assert_eq!(a.previous_period(&years()), Some(2018));
    }

    #[test]
    fn tick_is_ignored_while_stopped() {
        let mut a = Animation::new();
        let s = a.tick();
        assert_eq!(s.tick_count, 0);
    }

    #[test]
    fn toggle_keeps_tick_count() {
        let mut a = Animation::new();
        a.toggle();
        a.tick();
        a.tick();
        a.tick();
        let stopped = a.toggle();
        assert_eq!(stopped.status, PlaybackStatus::Stopped);
        assert_eq!(stopped.tick_count, 3);
        assert_eq!(a.current_period(&years()), Some(2018));
        let resumed = a.toggle();
        assert_eq!(resumed.tick_count, 3);
        assert_eq!(a.current_period(&years()), Some(2021));
    }

    #[test]
    fn first_period_has_no_previous_even_when_playing() {
        let mut a = Animation::new();
        a.toggle();
        for _ in 0..7 {
            a.tick();
        }
        assert_eq!(a.current_period(&years()), Some(2018));
        assert_eq!(a.previous_period(&years()), None);
    }

    #[test]
    fn empty_sequence_has_no_period() {
        let mut a = Animation::new();
        assert_eq!(a.current_period(&[]), None);
        a.toggle();
        a.tick();
        assert_eq!(a.current_period(&[]), None);
    }
}

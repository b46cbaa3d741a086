use dotboy_core::gameboy::FramePacer;
use std::time::{Duration, Instant};

const GB_FPS: f64 = 59.7275;
const FRAME_TIME: Duration = Duration::from_nanos((1e9_f64 / GB_FPS) as u64);

/// Sleeps until the next frame deadline when enabled.
pub struct FixedPacer {
    enabled: bool,
    next_frame: Option<Instant>,
}

impl FixedPacer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            next_frame: None,
        }
    }
}

impl FramePacer for FixedPacer {
    fn frame_completed(&mut self, _frame_count: u64) {
        if !self.enabled {
            return;
        }
        let target = self
            .next_frame
            .get_or_insert_with(|| Instant::now() + FRAME_TIME);
        let now = Instant::now();
        if now < *target {
            std::thread::sleep(*target - now);
            *target += FRAME_TIME;
        } else {
            // Fell behind; don't try to catch up.
            *target = now + FRAME_TIME;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_time_is_about_16_7_ms() {
        assert_eq!(FRAME_TIME.as_micros(), 16_742);
    }

    #[test]
    fn paced_frames_take_at_least_a_frame_time() {
        let mut pacer = FixedPacer::new(true);
        let start = Instant::now();
        for n in 1..=3 {
            pacer.frame_completed(n);
        }
        assert!(start.elapsed() >= FRAME_TIME * 3);
    }

    #[test]
    fn disabled_pacer_never_sleeps() {
        let mut pacer = FixedPacer::new(false);
        let start = Instant::now();
        for n in 1..=100 {
            pacer.frame_completed(n);
        }
        assert!(start.elapsed() < FRAME_TIME);
    }
}

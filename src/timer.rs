use std::time::Instant;

/// Measures wall-clock time between frames.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last: Instant,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Seconds since the previous mark, then restarts the measurement.
    pub fn mark(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;
        elapsed.as_secs_f32()
    }

    /// Seconds since the previous mark, without restarting.
    pub fn peek(&self) -> f32 {
        self.last.elapsed().as_secs_f32()
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;

    #[test]
    fn peek_does_not_reset() {
        let mut timer = FrameTimer::new();
        thread::sleep(Duration::from_millis(5));

        let peeked = timer.peek();
        assert!(peeked >= 0.005);
        assert!(timer.mark() >= peeked);
        assert!(timer.peek() < peeked);
    }
}

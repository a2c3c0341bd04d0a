pub struct FixedTimestep {
    tick_rate: u32,
    dt: f32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            tick_rate,
            dt: 1.0 / tick_rate as f32,
            accumulator: 0.0,
        }
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.min(0.25);
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }

    /// Time left until the next tick is due.
    pub fn remaining(&self) -> f32 {
        (self.dt - self.accumulator).max(0.0)
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// Fires at most once per `advance`, keeping the leftover so the cadence stays in phase.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    interval: f32,
    elapsed: f32,
}

impl IntervalTimer {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            elapsed: 0.0,
        }
    }

    /// Fires once the accumulated time reaches the interval. Reaching it exactly counts, so
    /// an interval of N whole ticks fires on every Nth tick.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            true
        } else {
            false
        }
    }
}

/// Parses a period in seconds, rejecting zero, negatives and non-finite values.
pub fn parse_interval(s: &str) -> Result<f32, String> {
    let secs: f32 = s
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not a number of seconds", s))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("interval must be a positive number of seconds, got `{}`", s));
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_timestep_accumulation() {
        let mut ts = FixedTimestep::new(60);

        ts.accumulate(1.0 / 30.0);
        assert!(ts.consume_tick());
        assert!(ts.consume_tick());
        assert!(!ts.consume_tick());
    }

    #[test]
    fn fixed_timestep_clamps_long_frames() {
        let mut ts = FixedTimestep::new(4);

        ts.accumulate(10.0);
        assert!(ts.consume_tick());
        assert!(!ts.consume_tick());
    }

    #[test]
    fn interval_timer_preserves_phase() {
        let mut timer = IntervalTimer::new(0.25);

        assert!(!timer.advance(0.125));
        assert!(timer.advance(0.25));
        assert!(timer.advance(0.125));
        assert!(!timer.advance(0.125));
    }

    #[test]
    fn interval_timer_fires_on_exact_boundary() {
        let mut timer = IntervalTimer::new(4.0 / 64.0);

        for _ in 0..3 {
            assert!(!timer.advance(1.0 / 64.0));
        }
        assert!(timer.advance(1.0 / 64.0));
        assert!(!timer.advance(1.0 / 64.0));
    }

    #[test]
    fn fixed_timestep_reset_drops_backlog() {
        let mut ts = FixedTimestep::new(60);

        ts.accumulate(0.2);
        ts.reset();
        assert!(!ts.consume_tick());
        assert_eq!(ts.tick_rate(), 60);
    }

    #[test]
    fn parse_interval_accepts_positive_seconds() {
        assert_eq!(parse_interval("0.05"), Ok(0.05));
        assert_eq!(parse_interval("2"), Ok(2.0));
    }

    #[test]
    fn parse_interval_rejects_degenerate_periods() {
        for input in ["0", "-0.1", "NaN", "inf", "-inf", "fast", ""] {
            assert!(parse_interval(input).is_err(), "{input:?} accepted");
        }
    }

    #[test]
    fn interval_timer_fires_once_per_advance() {
        let mut timer = IntervalTimer::new(0.25);

        assert!(timer.advance(1.0));
        assert!(timer.advance(0.0));
        assert!(timer.advance(0.0));
        assert!(timer.advance(0.0));
        assert!(!timer.advance(0.0));
    }
}

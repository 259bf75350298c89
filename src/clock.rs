use crate::life::Grid;
use std::time::{Duration, Instant};

/// Simulated time advanced by a fixed increment per tick, never by wall-clock
/// delta, so the same speed and tick count always land on the same time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationClock {
    time: f64,
    step: f64,
}

impl AnimationClock {
    pub fn new(step: f64) -> Self {
        Self { time: 0.0, step }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// `speed_pct` scales the per-tick increment (100 = nominal).
    pub fn tick(&mut self, playing: bool, speed_pct: f64) -> bool {
        if !playing {
            return false;
        }
        self.time += self.step * speed_pct.max(0.0) / 100.0;
        true
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
    }
}

/// Generation counter for the automaton; one `step` per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationClock {
    generation: u64,
}

impl GenerationClock {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tick(&mut self, playing: bool, grid: &mut Grid) -> bool {
        if !playing {
            return false;
        }
        self.step_once(grid);
        true
    }

    pub fn step_once(&mut self, grid: &mut Grid) {
        grid.step();
        self.generation += 1;
    }

    pub fn reset(&mut self) {
        self.generation = 0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerId {
    Render,
    Advance,
    Generation,
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    id: TimerId,
    interval: Duration,
    next: Instant,
}

/// Cooperative fixed-interval timers. Nothing runs on its own; the owner asks
/// which timers are due and runs them on its own thread.
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) `id` to fire every `interval`, first at `now + interval`.
    pub fn every(&mut self, id: TimerId, interval: Duration, now: Instant) {
        let interval = interval.max(Duration::from_millis(1));
        let t = Timer {
            id,
            interval,
            next: now + interval,
        };
        match self.timers.iter_mut().find(|t| t.id == id) {
            Some(slot) => *slot = t,
            None => self.timers.push(t),
        }
    }

    /// Change an interval without resetting the phase unless it differs.
    pub fn retime(&mut self, id: TimerId, interval: Duration, now: Instant) {
        let interval = interval.max(Duration::from_millis(1));
        if let Some(t) = self.timers.iter().find(|t| t.id == id) {
            if t.interval == interval {
                return;
            }
        }
        self.every(id, interval, now);
    }

    pub fn interval(&self, id: TimerId) -> Option<Duration> {
        self.timers.iter().find(|t| t.id == id).map(|t| t.interval)
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|t| t.id != id);
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_idle(&self) -> bool {
        self.timers.is_empty()
    }

    /// Timers whose deadline has passed, in arming order. Each is re-armed one
    /// interval later; beats missed entirely are dropped, not replayed.
    pub fn due(&mut self, now: Instant) -> Vec<TimerId> {
        let mut fired = Vec::new();
        for t in &mut self.timers {
            if t.next <= now {
                fired.push(t.id);
                t.next += t.interval;
                if t.next <= now {
                    t.next = now + t.interval;
                }
            }
        }
        fired
    }

    pub fn until_next(&self, now: Instant) -> Option<Duration> {
        self.timers
            .iter()
            .map(|t| t.next.saturating_duration_since(now))
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::life::Pattern;

    #[test]
    fn paused_clock_is_frozen() {
        let mut c = AnimationClock::new(0.1);
        assert!(!c.tick(false, 100.0));
        assert_eq!(c.time(), 0.0);
    }

    #[test]
    fn speed_scales_increment_not_rate() {
        let mut slow = AnimationClock::new(0.1);
        let mut fast = AnimationClock::new(0.1);
        for _ in 0..10 {
            slow.tick(true, 50.0);
            fast.tick(true, 200.0);
        }
        assert!((slow.time() - 0.5).abs() < 1e-12);
        assert!((fast.time() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn replay_is_deterministic() {
        let run = || {
            let mut c = AnimationClock::new(1.0 / 60.0);
            for i in 0..600 {
                c.tick(i % 7 != 0, 130.0);
            }
            c.time()
        };
        assert_eq!(run().to_bits(), run().to_bits());
    }

    #[test]
    fn generation_clock_steps_grid() {
        let mut g = Grid::new(5, 5, false).unwrap();
        g.place_pattern(&Pattern::parse("b", &["OOO"]).unwrap(), 1, 2);
        let mut gc = GenerationClock::default();
        assert!(!gc.tick(false, &mut g));
        assert_eq!(gc.generation(), 0);
        assert!(g.get(1, 2));

        gc.tick(true, &mut g);
        assert_eq!(gc.generation(), 1);
        assert!(!g.get(1, 2) && g.get(2, 1));

        gc.reset();
        assert_eq!(gc.generation(), 0);
    }

    #[test]
    fn scheduler_fires_on_interval() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.every(TimerId::Render, Duration::from_millis(16), t0);
        s.every(TimerId::Generation, Duration::from_millis(100), t0);

        assert!(s.due(t0).is_empty());
        assert_eq!(s.until_next(t0), Some(Duration::from_millis(16)));
        assert_eq!(s.due(t0 + Duration::from_millis(16)), vec![TimerId::Render]);
        assert_eq!(
            s.due(t0 + Duration::from_millis(100)),
            vec![TimerId::Render, TimerId::Generation]
        );
    }

    #[test]
    fn scheduler_skips_missed_beats() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.every(TimerId::Advance, Duration::from_millis(10), t0);
        let late = t0 + Duration::from_millis(95);
        assert_eq!(s.due(late), vec![TimerId::Advance]);
        assert!(s.due(late).is_empty());
        assert_eq!(s.until_next(late), Some(Duration::from_millis(10)));
    }

    #[test]
    fn retime_only_resets_on_change() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.every(TimerId::Generation, Duration::from_millis(100), t0);
        let t1 = t0 + Duration::from_millis(60);
        s.retime(TimerId::Generation, Duration::from_millis(100), t1);
        assert_eq!(s.until_next(t1), Some(Duration::from_millis(40)));
        s.retime(TimerId::Generation, Duration::from_millis(50), t1);
        assert_eq!(s.until_next(t1), Some(Duration::from_millis(50)));
        assert_eq!(s.interval(TimerId::Generation), Some(Duration::from_millis(50)));
    }

    #[test]
    fn cancel_all_is_idempotent() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.every(TimerId::Render, Duration::from_millis(16), t0);
        s.cancel_all();
        s.cancel_all();
        assert!(s.is_idle());
        assert!(s.due(t0 + Duration::from_secs(5)).is_empty());
        assert_eq!(s.until_next(t0), None);
    }
}

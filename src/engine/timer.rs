// Scene clock and deferred callbacks. Firing is synchronous: `advance`
// returns what fired and the scene reacts within the same step.

// float slack so 500 + 500 + ... lands on the boundary it should
const EPSILON: f64 = 1e-6;
// a zero delay loop would fire forever within one step
const MIN_DELAY_MS: f64 = 1.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Repeat {
    /// Runs once
    Once,
    /// Runs once, then `n` more times
    Times(u32),
    Forever,
}

impl Repeat {
    fn total_runs(self) -> Option<u32> {
        match self {
            Repeat::Once => Some(1),
            Repeat::Times(extra) => Some(extra.saturating_add(1)),
            Repeat::Forever => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimerFired {
    pub id: TimerId,
    /// Scene time the timer was due, not the end of the step
    pub at_ms: f64,
}

#[derive(Debug)]
struct Timer {
    id: TimerId,
    delay_ms: f64,
    elapsed_ms: f64,
    runs_left: Option<u32>,
    paused: bool,
}

#[derive(Debug, Default)]
pub struct Clock {
    now_ms: f64,
    timers: Vec<Timer>,
    next_id: u64,
}

impl Clock {
    pub fn new() -> Self {
        Clock::default()
    }

    /// Milliseconds since the scene started
    pub fn now(&self) -> f64 {
        self.now_ms
    }

    pub fn delayed_call(&mut self, delay_ms: f64) -> TimerId {
        self.add_repeat(delay_ms, Repeat::Once)
    }

    pub fn add_loop(&mut self, delay_ms: f64) -> TimerId {
        self.add_repeat(delay_ms, Repeat::Forever)
    }

    pub fn add_repeat(&mut self, delay_ms: f64, repeat: Repeat) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            delay_ms: delay_ms.max(MIN_DELAY_MS),
            elapsed_ms: 0.0,
            runs_left: repeat.total_runs(),
            paused: false,
        });
        id
    }

    /// Cancels without firing. False if it already finished or never existed.
    pub fn remove(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        self.timers.len() != before
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timer(id).is_some()
    }

    /// Time until the next firing
    pub fn remaining(&self, id: TimerId) -> Option<f64> {
        self.timer(id)
            .map(|timer| (timer.delay_ms - timer.elapsed_ms).max(0.0))
    }

    pub fn set_paused(&mut self, id: TimerId, paused: bool) -> bool {
        match self.timers.iter_mut().find(|timer| timer.id == id) {
            Some(timer) => {
                timer.paused = paused;
                true
            }
            None => false,
        }
    }

    /// Moves scene time forward and returns every firing inside the step,
    /// ordered by due time. A loop can fire more than once per step.
    pub fn advance(&mut self, delta_ms: f64) -> Vec<TimerFired> {
        self.now_ms += delta_ms;
        let now = self.now_ms;
        let mut fired = Vec::new();

        for timer in self.timers.iter_mut().filter(|timer| !timer.paused) {
            timer.elapsed_ms += delta_ms;
            while timer.runs_left != Some(0) && timer.elapsed_ms + EPSILON >= timer.delay_ms {
                timer.elapsed_ms = (timer.elapsed_ms - timer.delay_ms).max(0.0);
                if let Some(runs) = timer.runs_left.as_mut() {
                    *runs -= 1;
                }
                fired.push(TimerFired {
                    id: timer.id,
                    at_ms: now - timer.elapsed_ms,
                });
            }
        }

        self.timers.retain(|timer| timer.runs_left != Some(0));
        fired.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
        fired
    }

    fn timer(&self, id: TimerId) -> Option<&Timer> {
        self.timers.iter().find(|timer| timer.id == id)
    }
}

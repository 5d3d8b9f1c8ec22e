use crate::engine::timer::Repeat;
use std::f64::consts::PI;

// a zero length pass would never consume time
const MIN_DURATION_MS: f64 = 1.0;

/// Easing curves, all map 0 -> 0 and 1 -> 1
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicOut,
    SineInOut,
    BackIn,
    BackOut,
    BounceOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        // overshoot constants of the classic "back" curves
        const C1: f64 = 1.70158;
        const C3: f64 = C1 + 1.0;
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
            Easing::BackIn => C3 * t * t * t - C1 * t * t,
            Easing::BackOut => 1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2),
            Easing::BounceOut => bounce_out(t),
        }
    }
}

fn bounce_out(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TweenStatus {
    Running,
    /// Returned by exactly one `advance` call, the one that finished it
    Completed,
    /// Finished or killed earlier
    Idle,
}

/// Interpolates one number from `from` to `to`.
///
/// ┌────────── One cycle ──────────┐
/// │ forward : from ──ease(p)──► to│
/// │ yoyo    : to ──ease(1-p)──► from
/// └───────────────────────────────┘
/// `Repeat::Times(n)` runs n more cycles before completing.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    from: f64,
    to: f64,
    duration_ms: f64,
    easing: Easing,
    yoyo: bool,
    repeat: Repeat,
    elapsed_ms: f64,
    reversing: bool,
    cycles_done: u32,
    finished: bool,
}

impl Tween {
    pub fn new(from: f64, to: f64, duration_ms: f64) -> Self {
        Tween {
            from,
            to,
            duration_ms: duration_ms.max(MIN_DURATION_MS),
            easing: Easing::Linear,
            yoyo: false,
            repeat: Repeat::Once,
            elapsed_ms: 0.0,
            reversing: false,
            cycles_done: 0,
            finished: false,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn yoyo(mut self) -> Self {
        self.yoyo = true;
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Progress of the current pass, 0..=1
    pub fn progress(&self) -> f64 {
        (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn value(&self) -> f64 {
        let p = self.progress();
        let eased = if self.reversing {
            self.easing.apply(1.0 - p)
        } else {
            self.easing.apply(p)
        };
        lerp(self.from, self.to, eased)
    }

    pub fn advance(&mut self, delta_ms: f64) -> TweenStatus {
        if self.finished {
            return TweenStatus::Idle;
        }

        let mut remaining = delta_ms.max(0.0);
        loop {
            let left_in_pass = self.duration_ms - self.elapsed_ms;
            if remaining < left_in_pass {
                self.elapsed_ms += remaining;
                return TweenStatus::Running;
            }
            remaining -= left_in_pass;
            self.elapsed_ms = self.duration_ms;

            if self.yoyo && !self.reversing {
                self.reversing = true;
                self.elapsed_ms = 0.0;
                continue;
            }

            self.cycles_done += 1;
            let more_cycles = match self.repeat {
                Repeat::Once => false,
                Repeat::Times(extra) => self.cycles_done <= extra,
                Repeat::Forever => true,
            };
            if !more_cycles {
                // park on the final value of the last pass
                self.finished = true;
                return TweenStatus::Completed;
            }
            self.reversing = false;
            self.elapsed_ms = 0.0;
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TweenId(u64);

/// Running tweens of a scene
#[derive(Debug, Default)]
pub struct Tweens {
    active: Vec<(TweenId, Tween)>,
    next_id: u64,
}

impl Tweens {
    pub fn new() -> Self {
        Tweens::default()
    }

    pub fn add(&mut self, tween: Tween) -> TweenId {
        let id = TweenId(self.next_id);
        self.next_id += 1;
        self.active.push((id, tween));
        id
    }

    pub fn value(&self, id: TweenId) -> Option<f64> {
        self.active
            .iter()
            .find(|(active, _)| *active == id)
            .map(|(_, tween)| tween.value())
    }

    pub fn is_active(&self, id: TweenId) -> bool {
        self.active.iter().any(|(active, _)| *active == id)
    }

    /// Stops without reporting completion
    pub fn kill(&mut self, id: TweenId) -> bool {
        let before = self.active.len();
        self.active.retain(|(active, _)| *active != id);
        self.active.len() != before
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Advances everything, drops finished tweens and returns the ones that
    /// completed in this step
    pub fn update(&mut self, delta_ms: f64) -> Vec<TweenId> {
        let mut completed = Vec::new();
        for (id, tween) in self.active.iter_mut() {
            if tween.advance(delta_ms) == TweenStatus::Completed {
                completed.push(*id);
            }
        }
        self.active.retain(|(_, tween)| !tween.is_finished());
        completed
    }
}

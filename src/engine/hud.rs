use crate::engine::signals::Signals;
use crate::engine::{Color, Rect, Renderer, Size, TextStyle, Vec2};

/// Status text overlay. Keeps the last rendered lines and only rebuilds
/// them when the signals moved to a new revision.
#[derive(Debug)]
pub struct Hud {
    position: Vec2,
    style: TextStyle,
    lines: Vec<String>,
    seen_revision: Option<u64>,
}

impl Hud {
    pub fn new(position: Vec2) -> Self {
        Hud {
            position,
            style: TextStyle::default(),
            lines: Vec::new(),
            seen_revision: None,
        }
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    /// Re-renders through `render` if anything changed, returns whether it did
    pub fn sync(&mut self, signals: &Signals, render: impl FnOnce(&Signals) -> Vec<String>) -> bool {
        if self.seen_revision == Some(signals.revision()) {
            return false;
        }
        self.lines = render(signals);
        self.seen_revision = Some(signals.revision());
        true
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn draw(&self, renderer: &Renderer) {
        if !self.lines.is_empty() {
            renderer.fill_text(&self.lines, self.position, &self.style);
        }
    }
}

/// Clamped gauge behind health and progress bars
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Meter {
    value: f64,
    max: f64,
}

impl Meter {
    /// Starts full
    pub fn new(max: f64) -> Self {
        let max = max.max(0.0);
        Meter { value: max, max }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn fraction(&self) -> f64 {
        if self.max == 0.0 {
            0.0
        } else {
            self.value / self.max
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value <= 0.0
    }

    pub fn is_full(&self) -> bool {
        self.value >= self.max
    }

    /// Returns true when the clamped value differs from the old one
    pub fn set(&mut self, value: f64) -> bool {
        let clamped = value.clamp(0.0, self.max);
        if clamped == self.value {
            return false;
        }
        self.value = clamped;
        true
    }

    pub fn apply(&mut self, delta: f64) -> bool {
        self.set(self.value + delta)
    }
}

/// Background track plus a fill proportional to `fraction`
pub fn draw_bar(renderer: &Renderer, track: &Rect, fraction: f64, fill: Color, background: Color) {
    renderer.fill_rect(track, background);
    let filled = Rect::new(
        track.position,
        Size::new(track.size.width * fraction.clamp(0.0, 1.0), track.size.height),
    );
    if filled.size.width > 0.0 {
        renderer.fill_rect(&filled, fill);
    }
}

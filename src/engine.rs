use crate::browser;
use anyhow::{anyhow, Result};
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::f64::consts::TAU;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::rc::Rc;
use std::str::FromStr;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use self::input::KeyState;

pub mod hud;
pub mod input;
pub mod motion;
pub mod pool;
pub mod signals;
pub mod texture;
pub mod timer;
pub mod tween;

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    /// One fixed simulation step of `delta_ms` milliseconds
    fn update(&mut self, keystate: &KeyState, delta_ms: f64);
    fn draw(&mut self, renderer: &Renderer);
}

// length of a frame in milliseconds
const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;
// a backgrounded tab can come back with seconds of delta, don't replay all of it
const MAX_ACCUMULATED_DELTA: f32 = 250.0;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut input_receiver = input::prepare_input()?;
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let renderer = Renderer::new(browser::context()?);
        let mut keystate = KeyState::new();

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            input::process_input(&mut keystate, &mut input_receiver);

            let frame_delta = (perf - game_loop.last_frame) as f32;
            game_loop.accumulated_delta =
                (game_loop.accumulated_delta + frame_delta).min(MAX_ACCUMULATED_DELTA);
            while game_loop.accumulated_delta > FRAME_SIZE {
                game.update(&keystate, FRAME_SIZE as f64);
                // edges (just pressed) are consumed by the first step that sees them
                keystate.end_frame();
                game_loop.accumulated_delta -= FRAME_SIZE;
            }
            game_loop.last_frame = perf;
            game.draw(&renderer);

            if let Some(next_frame) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(next_frame) {
                    error!("GameLoop: {:#?}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

// ==================== Geometry ====================
#[derive(Debug, Default, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction, or ZERO for a zero vector
    pub fn normalized(&self) -> Vec2 {
        let length = self.length();
        if length == 0.0 {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / length, self.y / length)
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Vec2) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, scale: f64) -> Vec2 {
        Vec2::new(self.x * scale, self.y * scale)
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

/// Axis aligned rectangle, `position` is the top left corner
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Rect {
    pub position: Vec2,
    pub size: Size,
}

impl Rect {
    pub const fn new(position: Vec2, size: Size) -> Self {
        Rect { position, size }
    }

    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect::new(Vec2::new(x, y), Size::new(width, height))
    }

    /// Rectangle of `size` around `center` (sprites use a centered origin)
    pub fn centered(center: Vec2, size: Size) -> Self {
        Rect::from_xywh(
            center.x - size.width * 0.5,
            center.y - size.height * 0.5,
            size.width,
            size.height,
        )
    }

    pub fn left(&self) -> f64 {
        self.position.x
    }

    pub fn right(&self) -> f64 {
        self.position.x + self.size.width
    }

    pub fn top(&self) -> f64 {
        self.position.y
    }

    pub fn bottom(&self) -> f64 {
        self.position.y + self.size.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.position.x + self.size.width * 0.5,
            self.position.y + self.size.height * 0.5,
        )
    }

    /// Strict overlap, touching edges don't count
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }
}

/// 0xRRGGBB, written as "#rrggbb" in config files
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const WHITE: Color = Color(0xffffff);

    pub fn to_css(self) -> String {
        format!("#{:06x}", self.0 & 0x00ff_ffff)
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| anyhow!("color '{}' must start with '#'", s))?;
        if hex.len() != 6 {
            return Err(anyhow!("color '{}' must have six hex digits", s));
        }
        u32::from_str_radix(hex, 16)
            .map(Color)
            .map_err(|err| anyhow!("color '{}' is not hex : {}", s, err))
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> String {
        color.to_css()
    }
}

// ==================== Rendering ====================
#[derive(Debug, Clone)]
pub struct TextStyle {
    pub font: String,
    pub color: Color,
    pub line_height: f64,
    pub background: Option<Color>,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            font: "16px monospace".to_string(),
            color: Color::WHITE,
            line_height: 20.0,
            background: Some(Color::BLACK),
        }
    }
}

pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn new(context: CanvasRenderingContext2d) -> Self {
        Renderer { context }
    }

    pub fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.position.x,
            rect.position.y,
            rect.size.width,
            rect.size.height,
        );
    }

    pub fn set_alpha(&self, alpha: f64) {
        self.context.set_global_alpha(alpha.clamp(0.0, 1.0));
    }

    pub fn fill_rect(&self, rect: &Rect, color: Color) {
        self.context.set_fill_style_str(&color.to_css());
        self.context.fill_rect(
            rect.position.x,
            rect.position.y,
            rect.size.width,
            rect.size.height,
        );
    }

    pub fn stroke_rect(&self, rect: &Rect, color: Color, line_width: f64) {
        self.context.set_stroke_style_str(&color.to_css());
        self.context.set_line_width(line_width);
        self.context.stroke_rect(
            rect.position.x,
            rect.position.y,
            rect.size.width,
            rect.size.height,
        );
    }

    pub fn fill_circle(&self, center: Vec2, radius: f64, color: Color) {
        self.context.set_fill_style_str(&color.to_css());
        self.context.begin_path();
        if let Err(err) = self.context.arc(center.x, center.y, radius, 0.0, TAU) {
            error!("Renderer::fill_circle : {:#?}", err);
            return;
        }
        self.context.fill();
    }

    pub fn fill_polygon(&self, points: &[Vec2], color: Color) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.context.set_fill_style_str(&color.to_css());
        self.context.begin_path();
        self.context.move_to(first.x, first.y);
        for point in rest {
            self.context.line_to(point.x, point.y);
        }
        self.context.close_path();
        self.context.fill();
    }

    /// Multi-line text, one line per entry, starting at `position`
    pub fn fill_text(&self, lines: &[String], position: Vec2, style: &TextStyle) {
        self.context.set_font(&style.font);
        self.context.set_text_baseline("top");
        if let Some(background) = style.background {
            let widest = lines
                .iter()
                .filter_map(|line| self.context.measure_text(line).ok())
                .map(|metrics| metrics.width())
                .fold(0.0, f64::max);
            self.fill_rect(
                &Rect::from_xywh(
                    position.x - 6.0,
                    position.y - 4.0,
                    widest + 12.0,
                    style.line_height * lines.len() as f64 + 8.0,
                ),
                background,
            );
        }
        self.context.set_fill_style_str(&style.color.to_css());
        for (row, line) in lines.iter().enumerate() {
            let y = position.y + style.line_height * row as f64;
            if let Err(err) = self.context.fill_text(line, position.x, y) {
                error!("Renderer::fill_text : {:#?}", err);
            }
        }
    }

    /// Blits an offscreen canvas with its center at `center`
    pub fn draw_canvas(&self, canvas: &HtmlCanvasElement, center: Vec2) {
        let x = center.x - canvas.width() as f64 * 0.5;
        let y = center.y - canvas.height() as f64 * 0.5;
        if let Err(err) = self
            .context
            .draw_image_with_html_canvas_element(canvas, x, y)
        {
            error!("Renderer::draw_canvas : {:#?}", err);
        }
    }
}

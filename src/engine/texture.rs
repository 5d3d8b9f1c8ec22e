use crate::browser;
use crate::engine::{Color, Rect, Renderer, Vec2};
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use web_sys::HtmlCanvasElement;

/// Vector shape in texture-local pixels
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect { rect: Rect, color: Color },
    StrokeRect { rect: Rect, color: Color, line_width: f64 },
    Circle { center: Vec2, radius: f64, color: Color },
    Triangle { points: [Vec2; 3], color: Color },
}

impl Shape {
    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Rect { rect, .. } | Shape::StrokeRect { rect, .. } => *rect,
            Shape::Circle { center, radius, .. } => Rect::from_xywh(
                center.x - radius,
                center.y - radius,
                radius * 2.0,
                radius * 2.0,
            ),
            Shape::Triangle { points, .. } => {
                let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
                let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
                let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
                let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
                Rect::from_xywh(min_x, min_y, max_x - min_x, max_y - min_y)
            }
        }
    }

    pub fn paint(&self, renderer: &Renderer) {
        match self {
            Shape::Rect { rect, color } => renderer.fill_rect(rect, *color),
            Shape::StrokeRect {
                rect,
                color,
                line_width,
            } => renderer.stroke_rect(rect, *color, *line_width),
            Shape::Circle {
                center,
                radius,
                color,
            } => renderer.fill_circle(*center, *radius, *color),
            Shape::Triangle { points, color } => renderer.fill_polygon(points, *color),
        }
    }
}

/// Recipe for a procedurally drawn sprite, rasterized once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSpec {
    pub key: &'static str,
    pub width: u32,
    pub height: u32,
    pub shapes: Vec<Shape>,
}

impl TextureSpec {
    pub fn new(key: &'static str, width: u32, height: u32) -> Self {
        TextureSpec {
            key,
            width,
            height,
            shapes: Vec::new(),
        }
    }

    /// Whole canvas filled with one color
    pub fn solid(key: &'static str, width: u32, height: u32, color: Color) -> Self {
        TextureSpec::new(key, width, height).fill_rect(
            Rect::from_xywh(0.0, 0.0, width as f64, height as f64),
            color,
        )
    }

    pub fn fill_rect(mut self, rect: Rect, color: Color) -> Self {
        self.shapes.push(Shape::Rect { rect, color });
        self
    }

    pub fn stroke_rect(mut self, rect: Rect, color: Color, line_width: f64) -> Self {
        self.shapes.push(Shape::StrokeRect {
            rect,
            color,
            line_width,
        });
        self
    }

    pub fn fill_circle(mut self, center: Vec2, radius: f64, color: Color) -> Self {
        self.shapes.push(Shape::Circle {
            center,
            radius,
            color,
        });
        self
    }

    pub fn fill_triangle(mut self, points: [Vec2; 3], color: Color) -> Self {
        self.shapes.push(Shape::Triangle { points, color });
        self
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_xywh(0.0, 0.0, self.width as f64, self.height as f64)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(anyhow!(
                "texture '{}' has an empty canvas ({}x{})",
                self.key,
                self.width,
                self.height
            ));
        }
        let canvas = self.bounds();
        if let Some(shape) = self
            .shapes
            .iter()
            .find(|shape| !shape.bounds().intersects(&canvas))
        {
            return Err(anyhow!(
                "texture '{}' has a shape outside its canvas : {:?}",
                self.key,
                shape
            ));
        }
        Ok(())
    }
}

pub struct Texture {
    canvas: HtmlCanvasElement,
}

impl Texture {
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn rasterize(spec: &TextureSpec) -> Result<Self> {
        spec.validate()?;
        let canvas = browser::create_canvas(spec.width, spec.height)?;
        let renderer = Renderer::new(browser::context_for(&canvas)?);
        for shape in &spec.shapes {
            shape.paint(&renderer);
        }
        Ok(Texture { canvas })
    }
}

#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<&'static str, Texture>,
}

impl TextureCache {
    pub fn new() -> Self {
        TextureCache::default()
    }

    pub fn generate(&mut self, spec: &TextureSpec) -> Result<()> {
        let texture = Texture::rasterize(spec)
            .with_context(|| format!("generating texture '{}'", spec.key))?;
        self.textures.insert(spec.key, texture);
        Ok(())
    }

    pub fn generate_all(&mut self, specs: &[TextureSpec]) -> Result<()> {
        specs.iter().try_for_each(|spec| self.generate(spec))
    }

    pub fn get(&self, key: &str) -> Option<&Texture> {
        self.textures.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.textures.contains_key(key)
    }

    /// Draws `key` centered at `center`; unknown keys draw nothing
    pub fn draw(&self, renderer: &Renderer, key: &str, center: Vec2) {
        if let Some(texture) = self.get(key) {
            renderer.draw_canvas(&texture.canvas, center);
        }
    }

    pub fn draw_with_alpha(&self, renderer: &Renderer, key: &str, center: Vec2, alpha: f64) {
        renderer.set_alpha(alpha);
        self.draw(renderer, key, center);
        renderer.set_alpha(1.0);
    }
}

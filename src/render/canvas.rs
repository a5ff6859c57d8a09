//! Canvas 2D renderer for the web build
//!
//! Projects the scene with the trailing camera and paints it far to near.
//! Bloom is approximated with shadow glow scaled by the scene's emphasis, and
//! [`CanvasWash`] tints the finished frame while the emphasis is raised.

use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::{Camera, PostProcess, Renderer, SceneView, SpriteKind, wash_alpha};
use crate::sim::{EntityKind, PowerUp};

const BACKGROUND: &str = "#1a0205";
const RING_COLOR: &str = "rgba(170, 30, 40, 0.55)";

fn sprite_color(kind: SpriteKind) -> &'static str {
    match kind {
        SpriteKind::Entity(EntityKind::Virus) => "#7cff4f",
        SpriteKind::Entity(EntityKind::Clot) => "#5a0a12",
        SpriteKind::Entity(EntityKind::RedCell) => "#e0283c",
        SpriteKind::Entity(EntityKind::Antibody(PowerUp::Invincible)) => "#ffd84a",
        SpriteKind::Entity(EntityKind::Antibody(PowerUp::Speed)) => "#4fc3ff",
        SpriteKind::Player { invincible: true } => "#fff3b0",
        SpriteKind::Player { invincible: false } => "#f4f4ff",
    }
}

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasRenderer {
    /// None if the canvas has no 2D context
    pub fn new(canvas: HtmlCanvasElement) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()??
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { canvas, ctx })
    }

    /// Post-process stage drawing onto the same canvas. `resting` is the
    /// emphasis outside invincibility.
    pub fn wash(&self, resting: f32) -> CanvasWash {
        CanvasWash {
            canvas: self.canvas.clone(),
            ctx: self.ctx.clone(),
            strength: resting,
            resting,
        }
    }

    /// Keep the backing store matched to the displayed size
    pub fn resize(&mut self, dpr: f64) {
        let w = (self.canvas.client_width() as f64 * dpr) as u32;
        let h = (self.canvas.client_height() as f64 * dpr) as u32;
        if w > 0 && h > 0 && (w != self.canvas.width() || h != self.canvas.height()) {
            self.canvas.set_width(w);
            self.canvas.set_height(h);
        }
    }

    fn size(&self) -> (f64, f64) {
        canvas_size(&self.canvas)
    }

    fn circle(&self, x: f64, y: f64, r: f64) -> bool {
        self.ctx.begin_path();
        self.ctx.arc(x, y, r.max(0.5), 0.0, TAU).is_ok()
    }
}

impl Renderer for CanvasRenderer {
    fn render(&mut self, scene: &SceneView, camera: &Camera) {
        let (w, h) = self.size();
        let aspect = (w / h.max(1.0)) as f32;
        let half_w = w * 0.5;
        let half_h = h * 0.5;
        let to_screen = |x: f32, y: f32| (half_w + x as f64 * half_w, half_h - y as f64 * half_h);

        self.ctx.set_shadow_blur(0.0);
        self.ctx.set_fill_style_str(BACKGROUND);
        self.ctx.fill_rect(0.0, 0.0, w, h);

        // Tube walls, far rings first
        self.ctx.set_stroke_style_str(RING_COLOR);
        self.ctx.set_line_width(2.0);
        for center in &scene.rings {
            let Some((ndc, scale)) = camera.project(*center, aspect) else {
                continue;
            };
            let (x, y) = to_screen(ndc.x, ndc.y);
            let r = (scene.ring_radius * scale) as f64 * half_h;
            if self.circle(x, y, r) {
                self.ctx.stroke();
            }
        }

        // Glow follows the emphasis
        self.ctx.set_shadow_blur((scene.emphasis.max(0.0) * 18.0) as f64);
        for sprite in &scene.sprites {
            let Some((ndc, scale)) = camera.project(sprite.pos, aspect) else {
                continue;
            };
            let (x, y) = to_screen(ndc.x, ndc.y);
            let r = (sprite.radius * scale) as f64 * half_h;
            let color = sprite_color(sprite.kind);
            self.ctx.set_shadow_color(color);
            self.ctx.set_fill_style_str(color);
            if self.circle(x, y, r) {
                self.ctx.fill();
            }
        }
    }
}

fn canvas_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
    (canvas.width() as f64, canvas.height() as f64)
}

/// Full-frame tint while invincible
pub struct CanvasWash {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    strength: f32,
    resting: f32,
}

impl PostProcess for CanvasWash {
    fn set_strength(&mut self, strength: f32) {
        self.strength = strength.max(0.0);
    }

    fn render(&mut self) {
        let wash = wash_alpha(self.strength, self.resting);
        if wash <= 0.0 {
            return;
        }
        let (w, h) = canvas_size(&self.canvas);
        self.ctx.set_shadow_blur(0.0);
        self.ctx
            .set_fill_style_str(&format!("rgba(255, 210, 90, {:.3})", wash));
        self.ctx.fill_rect(0.0, 0.0, w, h);
    }
}

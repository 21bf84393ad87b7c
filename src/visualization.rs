use crate::config::DisplayConfig;
use crate::error::FluidError;
use crate::grid::{GridDims, Vector2};
use crate::session::Session;
use minifb::{Key, MouseButton, MouseMode, Window, WindowOptions};
use std::time::Instant;

// Colors
const NEEDLE_COLOR: u32 = 0x00202020;
const STIRRER_COLOR: u32 = 0x0000A000;
const PARTICLE_COLOR: u32 = 0x00000000;

const NEEDLE_GAIN: f32 = 0.5; // Needle length in cells per unit of speed
const CIRCLE_SEGMENTS: usize = 48;

fn draw_line(buffer: &mut [u32], width: usize, height: usize, x0: isize, y0: isize, x1: isize, y1: isize, color: u32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let mut err = dx + dy;
    let mut x = x0;
    let mut y = y0;
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };

    loop {
        if x >= 0 && x < width as isize && y >= 0 && y < height as isize {
            buffer[(y as usize) * width + (x as usize)] = color;
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Blue for negative, white for zero, red for positive; clamped to [-1, 1].
pub fn divergence_to_color(divergence: f32) -> u32 {
    let t = if divergence.is_finite() { divergence.clamp(-1.0, 1.0) } else { 0.0 };
    let fade = (255.0 * (1.0 - t.abs())) as u32;
    if t >= 0.0 {
        (0xFF << 16) | (fade << 8) | fade
    } else {
        (fade << 16) | (fade << 8) | 0xFF
    }
}

/// Maps grid coordinates onto the pixel buffer. Row 0 is at the bottom of
/// the window.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    pub dims: GridDims,
    pub width: usize,
    pub height: usize,
}

impl Projection {
    fn cell_w(&self) -> f32 {
        self.width as f32 / self.dims.cols as f32
    }

    fn cell_h(&self) -> f32 {
        self.height as f32 / self.dims.rows as f32
    }

    pub fn to_screen(&self, p: Vector2) -> (isize, isize) {
        let x = p.x * self.cell_w();
        let y = self.height as f32 - p.y * self.cell_h();
        (x.floor() as isize, y.floor() as isize)
    }

    pub fn to_grid(&self, x: f32, y: f32) -> Vector2 {
        Vector2::new(x / self.cell_w(), (self.height as f32 - y) / self.cell_h())
    }
}

/// Draw one frame of `session` into `buffer` (`width * height`, 0RGB).
pub fn render_frame(session: &Session, buffer: &mut [u32], width: usize, height: usize, needle_spacing: usize) {
    let dims = session.dims();
    let proj = Projection { dims, width, height };

    // Divergence heatmap
    let divergence = session.divergence();
    for (y, line) in buffer.chunks_mut(width).enumerate().take(height) {
        for (x, pixel) in line.iter_mut().enumerate() {
            let g = proj.to_grid(x as f32 + 0.5, y as f32 + 0.5);
            let col = (g.x.max(0.0) as usize).min(dims.cols - 1);
            let row = (g.y.max(0.0) as usize).min(dims.rows - 1);
            *pixel = divergence_to_color(divergence.at(col, row));
        }
    }

    // Velocity needles
    let velocity = session.velocity();
    let spacing = needle_spacing.max(1);
    for (col, row) in dims.iter_interior() {
        if col % spacing != 0 || row % spacing != 0 {
            continue;
        }
        let center = dims.cell_center(col, row);
        let tip = center + velocity.at(col, row) * NEEDLE_GAIN;
        if !tip.is_finite() {
            continue;
        }
        let (x0, y0) = proj.to_screen(center);
        let (x1, y1) = proj.to_screen(tip);
        draw_line(buffer, width, height, x0, y0, x1, y1, NEEDLE_COLOR);
    }

    // Stirrer
    let stirrer = session.stirrer();
    if stirrer.enabled && stirrer.radius > 0.0 {
        let point = |k: usize| {
            let a = std::f32::consts::TAU * k as f32 / CIRCLE_SEGMENTS as f32;
            proj.to_screen(stirrer.center + Vector2::new(a.cos(), a.sin()) * stirrer.radius)
        };
        for k in 0..CIRCLE_SEGMENTS {
            let (x0, y0) = point(k);
            let (x1, y1) = point(k + 1);
            draw_line(buffer, width, height, x0, y0, x1, y1, STIRRER_COLOR);
        }
    }

    // Particles
    for p in session.particles() {
        let (x, y) = proj.to_screen(*p);
        for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            let (px, py) = (x + dx, y + dy);
            if px >= 0 && py >= 0 && (px as usize) < width && (py as usize) < height {
                buffer[py as usize * width + px as usize] = PARTICLE_COLOR;
            }
        }
    }
}

// Launch the interactive viewer; returns when the window is closed
pub fn run_viewer(session: &mut Session, display: &DisplayConfig) -> Result<(), FluidError> {
    let width = display.width;
    let height = display.height;
    let mut buffer: Vec<u32> = vec![0; width * height];

    let mut window = Window::new("stirbox", width, height, WindowOptions::default())
        .map_err(|e| FluidError::Window(e.to_string()))?;
    window.set_target_fps(60);

    let proj = Projection { dims: session.dims(), width, height };
    let start = Instant::now();
    let mut last_report = 0.0;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if window.get_mouse_down(MouseButton::Left) {
            if let Some((x, y)) = window.get_mouse_pos(MouseMode::Discard) {
                session.override_stirrer(proj.to_grid(x, y), None);
            }
        }

        let now = start.elapsed().as_secs_f64();
        session.step(now);

        render_frame(session, &mut buffer, width, height, display.needle_spacing);
        window
            .update_with_buffer(&buffer, width, height)
            .map_err(|e| FluidError::Window(e.to_string()))?;

        if now - last_report >= 1.0 {
            last_report = now;
            let stats = session.stats();
            window.set_title(&format!(
                "stirbox  t={:.1}s  residual={:.4}  liquid={:.0}",
                session.physics_time(),
                stats.last_residual,
                session.liquid().total_liquid()
            ));
            log::debug!("{} sub-steps, residual {:.6}", stats.substeps, stats.last_residual);
        }
    }
    Ok(())
}

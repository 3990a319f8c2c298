use sketch_types::{CANVAS_HEIGHT, CANVAS_WIDTH, DrawPrimitive, PrimitiveKind};
use tracing::debug;

/// Rendering target for the replicator. The session owns exactly one of
/// these; UI backends implement it over their drawing context, `Pixmap`
/// implements it in memory for headless use and tests.
pub trait RasterSurface {
    fn begin_stroke(&mut self, x: f64, y: f64, color: &str, pen_size: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn end_stroke(&mut self);
    fn clear(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StrokeState {
    Idle,
    StrokeOpen,
}

/// Owns the append-only primitive log for the active round and the raster
/// derived from it. Malformed sequences (a `draw-move` or `draw-end` with no
/// open stroke) are tolerated artifacts of best-effort delivery: silent
/// no-ops, never errors.
pub struct CanvasReplicator<R: RasterSurface> {
    raster: R,
    log: Vec<DrawPrimitive>,
    stroke: StrokeState,
}

impl<R: RasterSurface> CanvasReplicator<R> {
    pub fn new(raster: R) -> Self {
        Self {
            raster,
            log: Vec::new(),
            stroke: StrokeState::Idle,
        }
    }

    pub fn log(&self) -> &[DrawPrimitive] {
        &self.log
    }

    pub fn raster(&self) -> &R {
        &self.raster
    }

    pub fn stroke_open(&self) -> bool {
        self.stroke == StrokeState::StrokeOpen
    }

    /// Append one primitive and render it. Only primitives that had an
    /// effect are logged, so replaying the log is equivalent to the applied
    /// sequence.
    pub fn apply(&mut self, primitive: DrawPrimitive) {
        match primitive.kind {
            PrimitiveKind::DrawStart => {
                if self.stroke == StrokeState::StrokeOpen {
                    debug!("draw-start while a stroke is open; closing previous stroke");
                    self.raster.end_stroke();
                }
                self.raster.begin_stroke(
                    primitive.x,
                    primitive.y,
                    &primitive.color,
                    primitive.pen_size,
                );
                self.stroke = StrokeState::StrokeOpen;
                self.log.push(primitive);
            }
            PrimitiveKind::DrawMove => {
                if self.stroke == StrokeState::StrokeOpen {
                    self.raster.line_to(primitive.x, primitive.y);
                    self.log.push(primitive);
                } else {
                    debug!("draw-move with no open stroke; ignoring");
                }
            }
            PrimitiveKind::DrawEnd => {
                if self.stroke == StrokeState::StrokeOpen {
                    self.raster.end_stroke();
                    self.stroke = StrokeState::Idle;
                    self.log.push(primitive);
                } else {
                    debug!("draw-end with no open stroke; ignoring");
                }
            }
            PrimitiveKind::ClearCanvas => {
                // Atomic: both the raster and the log are emptied together.
                self.raster.clear();
                self.log.clear();
                self.stroke = StrokeState::Idle;
            }
        }
    }

    /// Replay a full primitive log from a blank raster, in order. Used on
    /// mid-round join, since only primitives are ever transmitted. A log
    /// ending with an unterminated stroke is force-closed so no stroke
    /// remains open afterwards.
    pub fn load_snapshot(&mut self, log: Vec<DrawPrimitive>) {
        self.reset();
        for primitive in log {
            self.apply(primitive);
        }
        if self.stroke == StrokeState::StrokeOpen {
            debug!("snapshot ended mid-stroke; force-closing");
            self.raster.end_stroke();
            self.stroke = StrokeState::Idle;
        }
    }

    /// Clear both raster and log. Called at every round boundary.
    pub fn reset(&mut self) {
        self.raster.clear();
        self.log.clear();
        self.stroke = StrokeState::Idle;
    }
}

struct Pen {
    color: u32,
    radius: i32,
    last_x: i32,
    last_y: i32,
}

/// In-memory ARGB raster with square-pen Bresenham stroke rendering.
/// A pixel value of 0 is blank.
pub struct Pixmap {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    pen: Option<Pen>,
}

impl Pixmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height) as usize],
            pen: None,
        }
    }

    /// Raster sized to the canvas-logical space.
    pub fn canvas_sized() -> Self {
        Self::new(CANVAS_WIDTH as u32, CANVAS_HEIGHT as u32)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p == 0)
    }

    fn stamp(&mut self, cx: i32, cy: i32, color: u32, radius: i32) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let (x, y) = (cx + dx, cy + dy);
                if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
                    self.pixels[(y as u32 * self.width + x as u32) as usize] = color;
                }
            }
        }
    }

    fn stamp_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32, radius: i32) {
        // Bresenham; stamps the pen footprint at every step.
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            self.stamp(x, y, color, radius);
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
}

/// Parse a `#rrggbb` color into ARGB; anything unparsable renders black.
fn parse_color(color: &str) -> u32 {
    let rgb = color
        .strip_prefix('#')
        .filter(|hex| hex.len() == 6)
        .and_then(|hex| u32::from_str_radix(hex, 16).ok())
        .unwrap_or(0);
    0xFF00_0000 | rgb
}

impl RasterSurface for Pixmap {
    fn begin_stroke(&mut self, x: f64, y: f64, color: &str, pen_size: f64) {
        let color = parse_color(color);
        let radius = ((pen_size / 2.0).round() as i32).max(0);
        let (x, y) = (x.round() as i32, y.round() as i32);
        self.stamp(x, y, color, radius);
        self.pen = Some(Pen {
            color,
            radius,
            last_x: x,
            last_y: y,
        });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let (x, y) = (x.round() as i32, y.round() as i32);
        if let Some(pen) = self.pen.as_mut() {
            let (x0, y0) = (pen.last_x, pen.last_y);
            pen.last_x = x;
            pen.last_y = y;
            let (color, radius) = (pen.color, pen.radius);
            self.stamp_line(x0, y0, x, y, color, radius);
        }
    }

    fn end_stroke(&mut self) {
        self.pen = None;
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
        self.pen = None;
    }
}

use sketch_types::{
    CANVAS_HEIGHT, CANVAS_WIDTH, DEFAULT_COLOR, DEFAULT_PEN_SIZE, DrawPrimitive, MAX_PEN_SIZE,
    MIN_PEN_SIZE,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BrushSettings {
    pub color: String,
    pub pen_size: f64,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            pen_size: DEFAULT_PEN_SIZE,
        }
    }
}

/// Gates raw pointer input behind the draw permission and converts device
/// coordinates to canvas-logical space. Produces at most one primitive per
/// pointer sample; the caller echoes it locally and emits it outward.
pub struct InputCapture {
    brush: BrushSettings,
    pressed: bool,
    display_width: f64,
    display_height: f64,
}

impl Default for InputCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl InputCapture {
    pub fn new() -> Self {
        Self {
            brush: BrushSettings::default(),
            pressed: false,
            display_width: CANVAS_WIDTH,
            display_height: CANVAS_HEIGHT,
        }
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn set_color(&mut self, color: &str) {
        self.brush.color = color.to_string();
    }

    /// Pen size is clamped to the toolbar range.
    pub fn set_pen_size(&mut self, size: f64) {
        self.brush.pen_size = size.clamp(MIN_PEN_SIZE, MAX_PEN_SIZE);
    }

    /// On-screen size of the canvas element; scaling corrects for the
    /// display size differing from the fixed logical size.
    pub fn set_display_size(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.display_width = width;
            self.display_height = height;
        }
    }

    fn to_logical(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * CANVAS_WIDTH / self.display_width,
            y * CANVAS_HEIGHT / self.display_height,
        )
    }

    /// Accepted presses open a stroke; rejected ones leave state untouched.
    pub fn pointer_down(
        &mut self,
        can_draw: bool,
        x: f64,
        y: f64,
        user_id: &str,
    ) -> Option<DrawPrimitive> {
        if !can_draw || self.pressed {
            return None;
        }
        self.pressed = true;
        let (x, y) = self.to_logical(x, y);
        Some(DrawPrimitive::start(
            x,
            y,
            &self.brush.color,
            self.brush.pen_size,
            user_id,
        ))
    }

    /// Exactly one `draw-move` per motion sample while pressed.
    pub fn pointer_move(
        &mut self,
        can_draw: bool,
        x: f64,
        y: f64,
        user_id: &str,
    ) -> Option<DrawPrimitive> {
        if !can_draw || !self.pressed {
            return None;
        }
        let (x, y) = self.to_logical(x, y);
        Some(DrawPrimitive::move_to(
            x,
            y,
            &self.brush.color,
            self.brush.pen_size,
            user_id,
        ))
    }

    /// Release always pairs an accepted press with exactly one `draw-end`,
    /// even if permission was lost mid-stroke, so no remote stroke is left
    /// open.
    pub fn pointer_up(&mut self, user_id: &str) -> Option<DrawPrimitive> {
        if !self.pressed {
            return None;
        }
        self.pressed = false;
        Some(DrawPrimitive::end(user_id))
    }

    /// The pointer leaving the canvas is an implicit release; the real
    /// pointer-up may never arrive.
    pub fn pointer_leave(&mut self, user_id: &str) -> Option<DrawPrimitive> {
        self.pointer_up(user_id)
    }
}

use rand::Rng;

/// Half-width of the square the button may jump within, in pixels.
pub const OFFSET_RANGE: f64 = 100.0;
/// Scale lost on every decline.
pub const SCALE_STEP: f64 = 0.1;
/// The button never shrinks below this.
pub const MIN_SCALE: f64 = 0.3;
/// At or below this scale the label is replaced by an ellipsis.
pub const LABEL_HIDE_SCALE: f64 = 0.5;

pub const ENCOURAGEMENTS: [&str; 4] = [
    "Come on, try again! 😊",
    "That's not the right answer! 💕",
    "I know you don't mean that! 😉",
    "The button is getting shy! 🙈",
];

/// What a single decline produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Decline {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
    pub encouragement: &'static str,
}

/// Position and size of the "no" button for the current question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvasiveButton {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

impl Default for EvasiveButton {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
        }
    }
}

impl EvasiveButton {
    /// Jump somewhere else and shrink.
    pub fn on_decline<R: Rng>(&mut self, rng: &mut R) -> Decline {
        self.offset_x = rng.random_range(-OFFSET_RANGE..=OFFSET_RANGE);
        self.offset_y = rng.random_range(-OFFSET_RANGE..=OFFSET_RANGE);
        self.scale = (self.scale - SCALE_STEP).max(MIN_SCALE);

        Decline {
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            scale: self.scale,
            encouragement: ENCOURAGEMENTS[rng.random_range(0..ENCOURAGEMENTS.len())],
        }
    }

    /// Back to the origin at full size. Called whenever the question changes.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn label_visible(&self) -> bool {
        self.scale > LABEL_HIDE_SCALE
    }
}

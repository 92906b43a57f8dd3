//! Output buffer consumed by the host surface
//!
//! Output is a sequence of completed lines plus an optional open line that
//! PRINT items (and INPUT prompts) keep appending to until a newline.

/// Width of a comma print zone
pub const ZONE_WIDTH: usize = 14;

/// Line emitted by CLS for the host to act on
pub const CLEAR_SCREEN: &str = "\x0c";

/// Marker line printed whenever the interpreter is ready for a command
pub const READY: &str = "READY.";

/// Append-only line buffer
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    lines: Vec<String>,
    open: Option<String>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text to the open line
    pub fn write(&mut self, text: &str) {
        self.open.get_or_insert_with(String::new).push_str(text);
    }

    /// Finish the open line (an empty one if nothing was written)
    pub fn newline(&mut self) {
        let line = self.open.take().unwrap_or_default();
        self.lines.push(line);
    }

    /// Emit a whole line, first finishing any open one
    pub fn push_line(&mut self, text: impl Into<String>) {
        if let Some(open) = self.open.take() {
            self.lines.push(open);
        }
        self.lines.push(text.into());
    }

    /// Pad the open line to the start of the next print zone
    pub fn next_zone(&mut self) {
        let line = self.open.get_or_insert_with(String::new);
        let column = line.chars().count();
        let target = (column / ZONE_WIDTH + 1) * ZONE_WIDTH;
        line.extend(std::iter::repeat(' ').take(target - column));
    }

    pub fn is_line_open(&self) -> bool {
        self.open.is_some()
    }

    /// Drain every line, including the open one
    pub fn take_lines(&mut self) -> Vec<String> {
        if let Some(open) = self.open.take() {
            self.lines.push(open);
        }
        std::mem::take(&mut self.lines)
    }
}

/// Render a number the way PRINT and STR$ show it
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        // as i64 also folds -0 into 0
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

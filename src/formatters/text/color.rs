//! Color manager for text output
//!
//! Keeps one color per level plus a mark color, together with their
//! precomputed ANSI escape sequences.

use crate::core::log_level::{check_level, LogLevel, LEVEL_COUNT};
use colored::Color;
use std::collections::HashMap;

pub const RESET_SEQ: &str = "\x1b[0m";

/// Default level colors: green up to `Info`, yellow for `Warn`, red above.
pub fn default_colors() -> HashMap<LogLevel, Color> {
    HashMap::from([
        (LogLevel::Trace, Color::Green),
        (LogLevel::Debug, Color::Green),
        (LogLevel::Info, Color::Green),
        (LogLevel::Warn, Color::Yellow),
        (LogLevel::Error, Color::Red),
        (LogLevel::Fatal, Color::Red),
    ])
}

pub const DEFAULT_MARK_COLOR: Color = Color::Magenta;

fn color_seq(color: Color) -> String {
    format!("\x1b[{}m", color.to_fg_str())
}

#[derive(Debug, Clone)]
pub(crate) struct ColorManager {
    colors: [Color; LEVEL_COUNT],
    mark_color: Color,
    color_seqs: [String; LEVEL_COUNT],
    mark_seq: String,
}

impl ColorManager {
    pub fn new(color_map: &HashMap<LogLevel, Color>, mark_color: Color) -> Self {
        let mut mgr = Self {
            colors: [Color::White; LEVEL_COUNT],
            mark_color,
            color_seqs: std::array::from_fn(|_| color_seq(Color::White)),
            mark_seq: color_seq(mark_color),
        };
        mgr.map_colors(&default_colors());
        mgr.map_colors(color_map);
        mgr
    }

    pub fn color(&self, level: LogLevel) -> Color {
        self.colors[level.index()]
    }

    pub fn set_color(&mut self, level: LogLevel, color: Color) {
        check_level(level);
        self.colors[level.index()] = color;
        self.color_seqs[level.index()] = color_seq(color);
    }

    pub fn map_colors(&mut self, color_map: &HashMap<LogLevel, Color>) {
        for (&level, &color) in color_map {
            self.set_color(level, color);
        }
    }

    pub fn mark_color(&self) -> Color {
        self.mark_color
    }

    pub fn set_mark_color(&mut self, color: Color) {
        self.mark_color = color;
        self.mark_seq = color_seq(color);
    }

    /// Opening and closing sequences for a record.
    pub fn ears(&self, level: LogLevel, mark: bool) -> (&str, &str) {
        if mark {
            (&self.mark_seq, RESET_SEQ)
        } else {
            (&self.color_seqs[level.index()], RESET_SEQ)
        }
    }
}

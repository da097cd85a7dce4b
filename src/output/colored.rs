//! Terminal colours for tiers and the phase diagram

use crate::types::Tier;
use colored::{Color, ColoredString, Colorize};

/// Grey used for the phase diagram header line
const HEADER_GREY: Color = Color::TrueColor {
    r: 168,
    g: 168,
    b: 168,
};

impl Tier {
    /// Colour of a latency in this tier
    pub fn color(&self) -> Color {
        match self {
            Tier::Fast => Color::Green,
            Tier::Moderate => Color::Yellow,
            Tier::Slow => Color::Red,
        }
    }
}

/// Applies colours only when enabled
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.enabled {
            text.color(color)
        } else {
            text.normal()
        }
    }

    pub fn tier(&self, text: &str, tier: Tier) -> ColoredString {
        self.colorize(text, tier.color())
    }

    /// Numbers in the phase diagram
    pub fn value(&self, text: &str) -> ColoredString {
        self.colorize(text, Color::Cyan)
    }

    pub fn header(&self, text: &str) -> ColoredString {
        self.colorize(text, HEADER_GREY)
    }
}

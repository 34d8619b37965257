use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const X_LABEL: &str = "# of elements (in Millions)";
pub const LINE_WIDTH: u32 = 2;
pub const MARKER_SIZE: u32 = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("No style for implementation {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    Star,
    Circle,
    TriangleDown,
    Cross,
}

impl Marker {
    pub fn glyph(&self) -> char {
        match self {
            Marker::Star => '*',
            Marker::Circle => 'o',
            Marker::TriangleDown => 'v',
            Marker::Cross => 'x',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    Solid,
    Dotted,
    Dashed,
    DashDot,
}

impl LineStyle {
    pub fn pattern(&self) -> &'static str {
        match self {
            LineStyle::Solid => "-",
            LineStyle::Dotted => ":",
            LineStyle::Dashed => "--",
            LineStyle::DashDot => "-.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const CORNFLOWER_BLUE: Rgb = Rgb(100, 149, 237);
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 128, 0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesStyle {
    pub marker: Marker,
    pub line: LineStyle,
    pub color: Rgb,
}

impl Display for SeriesStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Rgb(r, g, b) = self.color;
        write!(
            f,
            "marker '{}', line '{}', color #{r:02x}{g:02x}{b:02x}",
            self.marker.glyph(),
            self.line.pattern()
        )
    }
}

const BUILTIN: &[(&str, SeriesStyle)] = &[
    (
        "ArtMap",
        SeriesStyle {
            marker: Marker::Star,
            line: LineStyle::Solid,
            color: Rgb::CORNFLOWER_BLUE,
        },
    ),
    (
        "UnorderedMap",
        SeriesStyle {
            marker: Marker::Circle,
            line: LineStyle::Dotted,
            color: Rgb::BLACK,
        },
    ),
    (
        "Map",
        SeriesStyle {
            marker: Marker::TriangleDown,
            line: LineStyle::Dashed,
            color: Rgb::BLACK,
        },
    ),
    (
        "BtreeMap",
        SeriesStyle {
            marker: Marker::Cross,
            line: LineStyle::DashDot,
            color: Rgb::GREEN,
        },
    ),
];

/// Implementation name to line style mapping
#[derive(Debug, Clone, Copy)]
pub struct StyleTable {
    entries: &'static [(&'static str, SeriesStyle)],
}

impl Default for StyleTable {
    fn default() -> Self {
        Self { entries: BUILTIN }
    }
}

impl StyleTable {
    pub fn lookup(&self, implementation: &str) -> Option<&SeriesStyle> {
        self.entries
            .iter()
            .find(|(name, _)| *name == implementation)
            .map(|(_, style)| style)
    }

    pub fn resolve(&self, implementation: &str) -> Result<&SeriesStyle, StyleError> {
        self.lookup(implementation)
            .ok_or_else(|| StyleError::Unknown(implementation.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static SeriesStyle)> {
        self.entries.iter().map(|(name, style)| (*name, style))
    }
}

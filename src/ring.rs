//! Geometry for the three-segment progress ring drawn next to each student.
//!
//! Everything here is pure: [`RingGeometry::derive`] turns the three counters
//! into arc lengths and offsets, and [`RingChart`] only renders what was
//! derived.

use maud::{Markup, Render, html};
use std::f64::consts::PI;

pub const DEFAULT_RING_SIZE: f64 = 80.0;
pub const RING_STROKE_WIDTH: f64 = 8.0;

const TRACK_COLOUR: &str = "#f3f4f6";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Category {
    Passed,
    Redo,
    Pending,
}

impl Category {
    /// Drawing order around the ring, starting at 12 o'clock.
    pub const ORDER: [Self; 3] = [Self::Passed, Self::Redo, Self::Pending];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "Pass",
            Self::Redo => "Redo",
            Self::Pending => "Pending",
        }
    }

    pub const fn stroke(self) -> &'static str {
        match self {
            Self::Passed => "#10b981",
            Self::Redo => "#ef4444",
            Self::Pending => "#f97316",
        }
    }

    pub const fn dot_class(self) -> &'static str {
        match self {
            Self::Passed => "bg-green-500",
            Self::Redo => "bg-red-500",
            Self::Pending => "bg-orange-500",
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ExerciseCounts {
    pub passed: u32,
    pub redo: u32,
    pub pending: u32,
}

impl ExerciseCounts {
    pub const fn get(self, category: Category) -> u32 {
        match category {
            Category::Passed => self.passed,
            Category::Redo => self.redo,
            Category::Pending => self.pending,
        }
    }

    pub fn total(self) -> u64 {
        u64::from(self.passed) + u64::from(self.redo) + u64::from(self.pending)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RingSegment {
    pub category: Category,
    pub count: u32,
    pub ratio: f64,
    pub arc_length: f64,
    pub offset: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RingGeometry {
    NoData {
        size: f64,
    },
    Proportional {
        size: f64,
        radius: f64,
        circumference: f64,
        total: u64,
        segments: Vec<RingSegment>,
    },
}

impl RingGeometry {
    #[allow(clippy::cast_precision_loss)]
    pub fn derive(counts: ExerciseCounts, size: f64) -> Self {
        let total = counts.total();
        if total == 0 {
            return Self::NoData { size };
        }

        let radius = ((size - RING_STROKE_WIDTH) / 2.0).max(0.0);
        let circumference = 2.0 * PI * radius;

        let mut offset = 0.0;
        let mut segments = Vec::with_capacity(Category::ORDER.len());
        for category in Category::ORDER {
            let count = counts.get(category);
            let ratio = f64::from(count) / total as f64;
            let arc_length = ratio * circumference;

            if count > 0 {
                segments.push(RingSegment {
                    category,
                    count,
                    ratio,
                    arc_length,
                    offset,
                });
            }
            offset += arc_length;
        }

        Self::Proportional {
            size,
            radius,
            circumference,
            total,
            segments,
        }
    }

    pub const fn size(&self) -> f64 {
        match self {
            Self::NoData { size } | Self::Proportional { size, .. } => *size,
        }
    }

    pub fn segments(&self) -> &[RingSegment] {
        match self {
            Self::NoData { .. } => &[],
            Self::Proportional { segments, .. } => segments,
        }
    }
}

/// Renders a [`RingGeometry`] as an inline SVG donut with the total centred.
pub struct RingChart(pub RingGeometry);

impl RingChart {
    pub fn new(counts: ExerciseCounts) -> Self {
        Self::with_size(counts, DEFAULT_RING_SIZE)
    }

    pub fn with_size(counts: ExerciseCounts, size: f64) -> Self {
        Self(RingGeometry::derive(counts, size))
    }
}

impl Render for RingChart {
    fn render(&self) -> Markup {
        let size = self.0.size();
        let dimensions = format!("width: {size}px; height: {size}px;");

        match &self.0 {
            RingGeometry::NoData { .. } => html! {
                div class="flex items-center justify-center bg-gray-100 rounded-full" style=(dimensions) {
                    span class="text-xs text-gray-500" {"No data"}
                }
            },
            RingGeometry::Proportional {
                radius,
                circumference,
                total,
                segments,
                ..
            } => {
                let centre = size / 2.0;
                html! {
                    div class="relative" style=(dimensions) {
                        svg width=(size) height=(size) class="transform -rotate-90" {
                            circle cx=(centre) cy=(centre) r=(radius) fill="transparent" stroke=(TRACK_COLOUR) stroke-width=(RING_STROKE_WIDTH) {}
                            @for segment in segments {
                                circle
                                    cx=(centre) cy=(centre) r=(radius)
                                    fill="transparent"
                                    stroke=(segment.category.stroke())
                                    stroke-width=(RING_STROKE_WIDTH)
                                    stroke-dasharray={(segment.arc_length) " " (circumference)}
                                    stroke-dashoffset=(-segment.offset) {}
                            }
                        }
                        div class="absolute inset-0 flex items-center justify-center" {
                            span class="text-sm font-semibold text-gray-700" {(total)}
                        }
                    }
                }
            }
        }
    }
}

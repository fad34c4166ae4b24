//! Stacking simulation for H-beams loaded into the cutter opening.
//!
//! Beams lie side by side across the opening width, each taking `H`. Every
//! other row is shifted sideways by the flange thickness so its flanges nest
//! into the row below, which lets rows sit `B/2 + t1/2` apart instead of a
//! full `B`.

use serde::Serialize;

use crate::types::{CrossSection, CutterSettings, ProductKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PackingResult {
    pub count: u32,
    pub rows: u32,
    /// Height spanned by the placed rows, not the full opening.
    pub used_height: f64,
    pub cap_even: u32,
    pub cap_odd: u32,
    pub spacing_y: f64,
    pub spacing_x: f64,
}

fn positive(v: f64) -> Option<f64> {
    (v.is_finite() && v > 0.0).then_some(v)
}

fn row_cap(row: u32, cap_even: u32, cap_odd: u32) -> u32 {
    if row % 2 == 0 { cap_even } else { cap_odd }
}

/// How many bars of `section` fit in one load of an opening.
pub fn stackable_count(
    opening_height: f64,
    opening_width: f64,
    section: CrossSection,
) -> PackingResult {
    let (Some(height), Some(width), Some(h), Some(b), Some(t1), Some(t2)) = (
        positive(opening_height),
        positive(opening_width),
        positive(section.h),
        positive(section.b),
        positive(section.t1),
        positive(section.t2),
    ) else {
        return PackingResult::default();
    };

    let spacing_x = t2;
    let spacing_y = b / 2.0 + t1 / 2.0;

    if h > width && spacing_x + h > width {
        return PackingResult::default();
    }
    if height < b {
        return PackingResult::default();
    }

    let cap_even = (width / h).floor() as u32;
    let cap_odd = ((width - spacing_x) / h).floor().max(0.0) as u32;

    let mut rows: u32 = 0;
    let mut count: u32 = 0;
    let mut y = height - b;
    let mut row: u32 = 0;
    while y >= 0.0 {
        let cap = row_cap(row, cap_even, cap_odd);
        if cap > 0 {
            rows = rows.saturating_add(1);
            count = cap.saturating_add(count);
        }
        row = row.wrapping_add(1);
        y -= spacing_y;
    }

    let used_height = if rows > 0 {
        b + (rows - 1) as f64 * spacing_y
    } else {
        0.0
    };

    PackingResult {
        count,
        rows,
        used_height,
        cap_even,
        cap_odd,
        spacing_y,
        spacing_x,
    }
}

/// Smallest stack height that holds at least `n` bars.
pub fn used_height_for_count(
    opening_height: f64,
    opening_width: f64,
    section: CrossSection,
    n: u32,
) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let full = stackable_count(opening_height, opening_width, section);
    if full.count == 0 {
        return 0.0;
    }
    if n >= full.count {
        return full.used_height;
    }
    if full.cap_even == 0 && full.cap_odd == 0 {
        return 0.0;
    }

    let mut remaining = n;
    let mut rows: u32 = 0;
    let mut row: u32 = 0;
    while remaining > 0 {
        let cap = row_cap(row, full.cap_even, full.cap_odd);
        if cap > 0 {
            rows += 1;
            remaining = remaining.saturating_sub(cap);
        }
        row = row.wrapping_add(1);
    }
    if rows > 0 {
        section.b + (rows - 1) as f64 * full.spacing_y
    } else {
        0.0
    }
}

/// Bars of `product` that fit in one load. Non-beam stock is cut one bar at a time.
pub fn stackable_for_product(
    product: &str,
    spec: &str,
    opening_width: f64,
    opening_height: f64,
) -> u32 {
    match ProductKind::of(product) {
        ProductKind::Beam => {
            stackable_count(opening_height, opening_width, CrossSection::parse(spec)).count
        }
        ProductKind::Other => 1,
    }
}

/// Height the saw travels through for a load of `bars_loaded` bars, or a full load
/// when `None`. Falls back to the opening height when the simulation yields nothing.
pub fn cutting_height(
    product: &str,
    spec: &str,
    opening_width: f64,
    opening_height: f64,
    bars_loaded: Option<u32>,
) -> f64 {
    match ProductKind::of(product) {
        ProductKind::Beam => {
            let section = CrossSection::parse(spec);
            let used = match bars_loaded {
                Some(n) if n > 0 => {
                    used_height_for_count(opening_height, opening_width, section, n)
                }
                _ => stackable_count(opening_height, opening_width, section).used_height,
            };
            if used > 0.0 { used } else { opening_height }
        }
        ProductKind::Other => opening_height,
    }
}

/// Capacity and height answers the allocator needs about one product.
pub trait StackModel {
    fn stackable(&self, product: &str, spec: &str, settings: &CutterSettings) -> u32;

    fn height(
        &self,
        product: &str,
        spec: &str,
        settings: &CutterSettings,
        bars_loaded: Option<u32>,
    ) -> f64;
}

/// Simulated H-beam stacking; every other product loads one bar at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeamStacking;

impl StackModel for BeamStacking {
    fn stackable(&self, product: &str, spec: &str, settings: &CutterSettings) -> u32 {
        stackable_for_product(product, spec, settings.max_width, settings.max_height)
    }

    fn height(
        &self,
        product: &str,
        spec: &str,
        settings: &CutterSettings,
        bars_loaded: Option<u32>,
    ) -> f64 {
        cutting_height(
            product,
            spec,
            settings.max_width,
            settings.max_height,
            bars_loaded,
        )
    }
}

//! Layout strategies
//!
//! Pure placement math: an ordered item list plus a strategy and parameters
//! map to one position per item. No hidden state, so identical inputs always
//! give identical output.

use crate::foundation::math::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named placement strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
    /// Centered row along the base axis
    Horizontal,
    /// Rows and columns centered on the base position
    Grid,
    /// Column stacked downward from the base position
    Vertical,
}

impl LayoutStrategy {
    /// Parse a strategy name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "horizontal" | "row" => Some(Self::Horizontal),
            "grid" => Some(Self::Grid),
            "vertical" | "column" => Some(Self::Vertical),
            _ => None,
        }
    }

    /// Canonical name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Grid => "grid",
            Self::Vertical => "vertical",
        }
    }
}

impl fmt::Display for LayoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters shared by all strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Distance between neighbours (columns for grid)
    pub spacing: f32,

    /// Distance between grid rows
    pub row_spacing: f32,

    /// Grid column count (0 is treated as 1)
    pub columns: u32,

    /// Center of the arrangement
    pub base: Vec3,

    /// Direction of the horizontal spread
    pub axis: Vec3,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            spacing: 1.8,
            row_spacing: 1.4,
            columns: 3,
            base: Vec3::new(0.0, 1.6, -3.0),
            axis: Vec3::new(1.0, 0.0, 0.0),
        }
    }
}

/// Grid dimensions for `count` items in `columns` columns
///
/// Returns `(rows, columns_in_use)`.
pub fn grid_dimensions(count: usize, columns: u32) -> (usize, usize) {
    let columns = (columns.max(1)) as usize;
    if count == 0 {
        return (0, 0);
    }
    (count.div_ceil(columns), columns.min(count))
}

/// Compute one position per item, in input order
pub fn layout<T>(items: &[T], strategy: LayoutStrategy, params: &LayoutParams) -> Vec<Vec3> {
    positions(items.len(), strategy, params)
}

/// Compute `count` positions for the given strategy
pub fn positions(count: usize, strategy: LayoutStrategy, params: &LayoutParams) -> Vec<Vec3> {
    match strategy {
        LayoutStrategy::Horizontal => (0..count)
            .map(|i| params.base + params.axis * centered_offset(i, count, params.spacing))
            .collect(),
        LayoutStrategy::Grid => {
            let (rows, columns_in_use) = grid_dimensions(count, params.columns);
            let columns = params.columns.max(1) as usize;
            let up = Vec3::y();

            (0..count)
                .map(|i| {
                    let row = i / columns;
                    let col = i % columns;
                    let x = centered_offset(col, columns_in_use, params.spacing);
                    let y = -centered_offset(row, rows, params.row_spacing);
                    params.base + params.axis * x + up * y
                })
                .collect()
        }
        LayoutStrategy::Vertical => (0..count)
            .map(|i| params.base - Vec3::y() * (i as f32 * params.spacing))
            .collect(),
    }
}

/// Offset of slot `index` in a centered spread of `count` slots
fn centered_offset(index: usize, count: usize, spacing: f32) -> f32 {
    if count == 0 {
        return 0.0;
    }
    -((count - 1) as f32 * spacing) / 2.0 + index as f32 * spacing
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_params(spacing: f32) -> LayoutParams {
        LayoutParams {
            spacing,
            row_spacing: 1.0,
            columns: 3,
            base: Vec3::zeros(),
            axis: Vec3::x(),
        }
    }

    #[test]
    fn test_horizontal_two_panels_centered() {
        let out = positions(2, LayoutStrategy::Horizontal, &flat_params(1.8));
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].x, -0.9, epsilon = 1e-6);
        assert_relative_eq!(out[1].x, 0.9, epsilon = 1e-6);
    }

    #[test]
    fn test_horizontal_single_panel_at_base() {
        let mut params = flat_params(2.0);
        params.base = Vec3::new(1.0, 2.0, 3.0);
        let out = positions(1, LayoutStrategy::Horizontal, &params);
        assert_eq!(out, vec![Vec3::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn test_length_and_determinism_for_all_strategies() {
        let params = LayoutParams::default();
        for strategy in [LayoutStrategy::Horizontal, LayoutStrategy::Grid, LayoutStrategy::Vertical] {
            for n in 0..12 {
                let items: Vec<usize> = (0..n).collect();
                let first = layout(&items, strategy, &params);
                let second = layout(&items, strategy, &params);
                assert_eq!(first.len(), n);
                assert_eq!(first, second, "{} layout not deterministic for n={}", strategy, n);
            }
        }
    }

    #[test]
    fn test_grid_rows_bound() {
        for columns in 1..6u32 {
            for n in 1..20usize {
                let (rows, _) = grid_dimensions(n, columns);
                assert_eq!(rows, n.div_ceil(columns as usize));
                for i in 0..n {
                    assert!(i / (columns as usize) < rows);
                }
            }
        }
    }

    #[test]
    fn test_grid_positions_centered() {
        let mut params = flat_params(2.0);
        params.columns = 2;
        params.row_spacing = 1.0;

        // 3 items, 2 columns -> 2 rows
        let out = positions(3, LayoutStrategy::Grid, &params);
        assert_relative_eq!(out[0], Vec3::new(-1.0, 0.5, 0.0), epsilon = 1e-6);
        assert_relative_eq!(out[1], Vec3::new(1.0, 0.5, 0.0), epsilon = 1e-6);
        assert_relative_eq!(out[2], Vec3::new(-1.0, -0.5, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_grid_zero_columns_treated_as_one() {
        let mut params = flat_params(1.0);
        params.columns = 0;
        let out = positions(3, LayoutStrategy::Grid, &params);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|p| p.x.abs() < 1e-6));
    }

    #[test]
    fn test_vertical_descends_from_base() {
        let mut params = flat_params(0.5);
        params.base = Vec3::new(0.0, 2.0, -1.0);
        let out = positions(3, LayoutStrategy::Vertical, &params);
        assert_relative_eq!(out[0].y, 2.0);
        assert_relative_eq!(out[1].y, 1.5);
        assert_relative_eq!(out[2].y, 1.0);
        assert!(out.iter().all(|p| p.z == -1.0));
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(LayoutStrategy::from_name(" Grid "), Some(LayoutStrategy::Grid));
        assert_eq!(LayoutStrategy::from_name("carousel"), None);
        assert_eq!(LayoutStrategy::Vertical.to_string(), "vertical");
    }
}

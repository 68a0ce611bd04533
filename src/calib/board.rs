use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Corner position in image pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImagePoint {
    pub x: f32,
    pub y: f32,
}

impl ImagePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Corner position on the physical target, in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Printed chessboard target.
///
/// `columns` and `rows` count interior corners, not squares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardGeometry {
    pub columns: u32,
    pub rows: u32,
    /// Square edge length in meters
    pub square_size: f32,
}

impl Default for BoardGeometry {
    fn default() -> Self {
        Self {
            columns: 6,
            rows: 9,
            square_size: 0.01905,
        }
    }
}

impl BoardGeometry {
    pub fn corner_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Reference corners on the z = 0 plane, row by row
    pub fn object_points(&self) -> Vec<ObjectPoint> {
        let s = self.square_size;
        (0..self.rows)
            .flat_map(|i| {
                (0..self.columns).map(move |j| ObjectPoint {
                    x: j as f32 * s,
                    y: i as f32 * s,
                    z: 0.0,
                })
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns < 2 || self.rows < 2 {
            return Err(Error::InvalidConfig(format!(
                "board needs at least 2x2 interior corners, got {}x{}",
                self.columns, self.rows
            )));
        }
        if self.square_size.is_nan() || self.square_size <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "square size must be positive, got {}",
                self.square_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_points_row_major() {
        let board = BoardGeometry {
            columns: 3,
            rows: 2,
            square_size: 0.5,
        };
        let points = board.object_points();
        assert_eq!(points.len(), board.corner_count());
        assert_eq!(points[0], ObjectPoint { x: 0.0, y: 0.0, z: 0.0 });
        assert_eq!(points[2], ObjectPoint { x: 1.0, y: 0.0, z: 0.0 });
        assert_eq!(points[3], ObjectPoint { x: 0.0, y: 0.5, z: 0.0 });
        assert!(points.iter().all(|p| p.z == 0.0));
    }

    #[test]
    fn test_default_board() {
        let board = BoardGeometry::default();
        assert_eq!(board.corner_count(), 54);
        let last = board.object_points()[53];
        assert!((last.x - 5.0 * 0.01905).abs() < 1e-6);
        assert!((last.y - 8.0 * 0.01905).abs() < 1e-6);
    }

    #[test]
    fn test_validate_board() {
        assert!(BoardGeometry::default().validate().is_ok());
        let flat = BoardGeometry {
            rows: 1,
            ..BoardGeometry::default()
        };
        assert!(flat.validate().is_err());
        let unsized_board = BoardGeometry {
            square_size: f32::NAN,
            ..BoardGeometry::default()
        };
        assert!(unsized_board.validate().is_err());
    }
}

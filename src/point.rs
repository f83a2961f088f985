use serde::{Deserialize, Serialize};

/// A point in homogeneous coordinates, matching the DOMPoint value shape.
///
/// Missing fields deserialize to the init defaults (x, y, z zero and w one),
/// so `{"x": 3}` is the 2D point (3, 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Point {
    /// A 2D point on the z = 0 plane with w = 1.
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            w: 1.0,
        }
    }

    pub const fn new_3d(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_defaults() {
        assert_eq!(Point::default(), Point::new_3d(0.0, 0.0, 0.0, 1.0));
        let p: Point = serde_json::from_str(r#"{"x": 3.0}"#).unwrap();
        assert_eq!(p, Point::new(3.0, 0.0));
    }

    #[test]
    fn json_round_trip() {
        let p = Point::new_3d(1.0, 2.0, 3.0, 0.5);
        let text = serde_json::to_string(&p).unwrap();
        let back: Point = serde_json::from_str(&text).unwrap();
        assert_eq!(p, back);
    }
}

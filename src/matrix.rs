use crate::parse::{self, ParseError};
use crate::point::Point;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    #[error("expected exactly 6 or 16 matrix coefficients, got {0}")]
    BadLength(usize),
    #[error("matrix init sets both '{alias}' and '{canonical}' with different values")]
    AliasMismatch {
        alias: &'static str,
        canonical: &'static str,
    },
}

const IDENTITY: [[f64; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// A 4x4 homogeneous transform matrix with the DOMMatrix coefficient layout.
///
/// Coefficients are stored row-major, so `m[0]` is the m11..m14 row and
/// translation lives in `m[3]` (m41..m44). The 2D affine shorthand maps
/// `a,b,c,d,e,f` onto m11,m12,m21,m22,m41,m42:
///
/// - `x' = a*x + c*y + e`
/// - `y' = b*x + d*y + f`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix {
    m: [[f64; 4]; 4],
    // True only while the matrix is representable by the 6-term 2D shorthand.
    // Once an operation or setter drops it to false it stays false, even if
    // every 3D-only coefficient is later written back to its default.
    is2d: bool,
}

/// True iff the twelve 3D-only slots hold their identity defaults.
fn coeffs_are_2d(m: &[[f64; 4]; 4]) -> bool {
    m[0][2] == 0.0
        && m[0][3] == 0.0
        && m[1][2] == 0.0
        && m[1][3] == 0.0
        && m[2][0] == 0.0
        && m[2][1] == 0.0
        && m[2][2] == 1.0
        && m[2][3] == 0.0
        && m[3][2] == 0.0
        && m[3][3] == 1.0
}

/// Row-major product with `lhs` on the left: `out[i][j] = sum(lhs[i][k] * rhs[k][j])`.
fn mul_rows(lhs: &[[f64; 4]; 4], rhs: &[[f64; 4]; 4]) -> [[f64; 4]; 4] {
    std::array::from_fn(|i| std::array::from_fn(|j| (0..4).map(|k| lhs[i][k] * rhs[k][j]).sum()))
}

// Getter/setter pairs. The 2D-range slots never affect the `is2d` flag.
macro_rules! coef_2d {
    ($($get:ident, $set:ident, $r:expr, $c:expr;)*) => {
        $(
            #[inline]
            pub const fn $get(&self) -> f64 {
                self.m[$r][$c]
            }
            #[inline]
            pub fn $set(&mut self, v: f64) {
                self.m[$r][$c] = v;
            }
        )*
    };
}

// 3D-only slots: writing anything but the identity default drops `is2d`,
// and writing the default back does not restore it.
macro_rules! coef_3d {
    ($($get:ident, $set:ident, $r:expr, $c:expr, $default:expr;)*) => {
        $(
            #[inline]
            pub const fn $get(&self) -> f64 {
                self.m[$r][$c]
            }
            #[inline]
            pub fn $set(&mut self, v: f64) {
                if v != $default {
                    self.is2d = false;
                }
                self.m[$r][$c] = v;
            }
        )*
    };
}

// The conventional 2D aliases over the m-slots.
macro_rules! alias_2d {
    ($($get:ident => $m:ident, $set:ident => $set_m:ident;)*) => {
        $(
            #[inline]
            pub const fn $get(&self) -> f64 {
                self.$m()
            }
            #[inline]
            pub fn $set(&mut self, v: f64) {
                self.$set_m(v)
            }
        )*
    };
}

// Constructors
// ------------------------------------------------------------------------------
impl Matrix {
    pub const fn identity() -> Self {
        Self {
            m: IDENTITY,
            is2d: true,
        }
    }

    /// Identity matrix; same as [`Matrix::identity`].
    pub const fn new() -> Self {
        Self::identity()
    }

    /// Constructs a 2D affine matrix from the 6-term shorthand.
    pub const fn from_2d(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self {
            m: [
                [a, b, 0.0, 0.0],
                [c, d, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [e, f, 0.0, 1.0],
            ],
            is2d: true,
        }
    }

    /// Constructs from 16 row-major coefficients (m11, m12, ..., m44).
    ///
    /// The 2D flag is derived by the exact coefficient test, so 16 values
    /// whose 3D-only slots hold their defaults still count as 2D.
    pub fn from_3d(vals: [f64; 16]) -> Self {
        let m = std::array::from_fn(|i| std::array::from_fn(|j| vals[i * 4 + j]));
        Self::raw(m)
    }

    /// Count-based dispatch over a flat coefficient slice: exactly 6 values
    /// build the 2D form, exactly 16 the 3D form.
    pub fn from_slice(vals: &[f64]) -> Result<Self, MatrixError> {
        match vals.len() {
            6 => Ok(Self::from_2d(
                vals[0], vals[1], vals[2], vals[3], vals[4], vals[5],
            )),
            16 => {
                let mut flat = [0.0; 16];
                flat.copy_from_slice(vals);
                Ok(Self::from_3d(flat))
            }
            n => Err(MatrixError::BadLength(n)),
        }
    }

    /// Parses a CSS transform list (e.g. `"translate(10px) rotate(45deg)"`).
    pub fn from_css(css: &str) -> Result<Self, ParseError> {
        parse::parse_transform_list(css)
    }

    fn raw(m: [[f64; 4]; 4]) -> Self {
        Self {
            is2d: coeffs_are_2d(&m),
            m,
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl FromStr for Matrix {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse::parse_transform_list(s)
    }
}

// Accessors
// ------------------------------------------------------------------------------
impl Matrix {
    coef_2d! {
        m11, set_m11, 0, 0;
        m12, set_m12, 0, 1;
        m21, set_m21, 1, 0;
        m22, set_m22, 1, 1;
        m41, set_m41, 3, 0;
        m42, set_m42, 3, 1;
    }

    coef_3d! {
        m13, set_m13, 0, 2, 0.0;
        m14, set_m14, 0, 3, 0.0;
        m23, set_m23, 1, 2, 0.0;
        m24, set_m24, 1, 3, 0.0;
        m31, set_m31, 2, 0, 0.0;
        m32, set_m32, 2, 1, 0.0;
        m33, set_m33, 2, 2, 1.0;
        m34, set_m34, 2, 3, 0.0;
        m43, set_m43, 3, 2, 0.0;
        m44, set_m44, 3, 3, 1.0;
    }

    alias_2d! {
        a => m11, set_a => set_m11;
        b => m12, set_b => set_m12;
        c => m21, set_c => set_m21;
        d => m22, set_d => set_m22;
        e => m41, set_e => set_m41;
        f => m42, set_f => set_m42;
    }

    /// Whether the matrix is representable by the 2D affine shorthand.
    /// Reads the cached flag; see the field note about stickiness.
    pub const fn is_2d(&self) -> bool {
        self.is2d
    }

    /// Exact (no-epsilon) comparison against the identity coefficients.
    pub fn is_identity(&self) -> bool {
        self.m == IDENTITY
    }
}

// Algebra
// ------------------------------------------------------------------------------
//
// Every operation folds its elementary matrix in with the new matrix on the
// left of the row-major product, i.e. `multiply_self(B)` computes B x A.
// Points transform as row vectors, so the most recently folded operation is
// the first one applied to a point. This is what makes
// `translate(10, 0).scale(2)` map (0, 0) to (10, 0) and not (20, 0).
impl Matrix {
    fn fold(&mut self, other: &Matrix) {
        self.m = mul_rows(&other.m, &self.m);
        self.is2d = self.is2d && other.is2d;
    }

    pub fn multiply_self(&mut self, other: &Matrix) -> &mut Self {
        self.fold(other);
        self
    }

    /// Folds `other` on the far side: the result applies the receiver's
    /// transforms first and `other` last.
    pub fn pre_multiply_self(&mut self, other: &Matrix) -> &mut Self {
        self.m = mul_rows(&self.m, &other.m);
        self.is2d = self.is2d && other.is2d;
        self
    }

    pub fn multiply(&self, other: &Matrix) -> Matrix {
        let mut out = *self;
        out.fold(other);
        out
    }

    pub fn translate_self(&mut self, tx: f64, ty: f64, tz: f64) -> &mut Self {
        self.fold(&Matrix::raw([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [tx, ty, tz, 1.0],
        ]));
        self
    }

    pub fn translate(&self, tx: f64, ty: f64, tz: f64) -> Matrix {
        let mut out = *self;
        out.translate_self(tx, ty, tz);
        out
    }

    /// Scales about `(origin_x, origin_y, origin_z)`.
    ///
    /// Performed as three separate folds (translate to the origin, scale,
    /// translate back) so each step keeps its own 2D/3D flag bookkeeping.
    pub fn scale_self(
        &mut self,
        sx: f64,
        sy: f64,
        sz: f64,
        origin_x: f64,
        origin_y: f64,
        origin_z: f64,
    ) -> &mut Self {
        self.translate_self(origin_x, origin_y, origin_z);
        self.fold(&Matrix::raw([
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, sz, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]));
        self.translate_self(-origin_x, -origin_y, -origin_z);
        self
    }

    pub fn scale(
        &self,
        sx: f64,
        sy: f64,
        sz: f64,
        origin_x: f64,
        origin_y: f64,
        origin_z: f64,
    ) -> Matrix {
        let mut out = *self;
        out.scale_self(sx, sy, sz, origin_x, origin_y, origin_z);
        out
    }

    /// Rotates about the fixed axes, angles in degrees. A point is rotated
    /// about X first, then Y, then Z, so the Z matrix folds in first.
    /// Any X or Y rotation drops the 2D flag regardless of the angle value.
    pub fn rotate_self(&mut self, rot_x: f64, rot_y: f64, rot_z: f64) -> &mut Self {
        if rot_x != 0.0 || rot_y != 0.0 {
            self.is2d = false;
        }
        let (sin_z, cos_z) = rot_z.to_radians().sin_cos();
        self.fold(&Matrix::raw([
            [cos_z, sin_z, 0.0, 0.0],
            [-sin_z, cos_z, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]));
        let (sin_y, cos_y) = rot_y.to_radians().sin_cos();
        self.fold(&Matrix::raw([
            [cos_y, 0.0, -sin_y, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [sin_y, 0.0, cos_y, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]));
        let (sin_x, cos_x) = rot_x.to_radians().sin_cos();
        self.fold(&Matrix::raw([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, cos_x, sin_x, 0.0],
            [0.0, -sin_x, cos_x, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]));
        self
    }

    pub fn rotate(&self, rot_x: f64, rot_y: f64, rot_z: f64) -> Matrix {
        let mut out = *self;
        out.rotate_self(rot_x, rot_y, rot_z);
        out
    }

    /// Rotates by `angle` degrees around the axis `(x, y, z)`.
    ///
    /// The axis is normalized first; a zero-length axis is a no-op. Any axis
    /// with a nonzero X or Y component drops the 2D flag, even when the
    /// resulting coefficients would pass the 2D test.
    pub fn rotate_axis_angle_self(&mut self, x: f64, y: f64, z: f64, angle: f64) -> &mut Self {
        let len = (x * x + y * y + z * z).sqrt();
        if len == 0.0 {
            return self;
        }
        if x != 0.0 || y != 0.0 {
            self.is2d = false;
        }
        let (x, y, z) = (x / len, y / len, z / len);
        let half = angle.to_radians() / 2.0;
        let sc = half.sin() * half.cos();
        let sq = half.sin() * half.sin();
        self.fold(&Matrix::raw([
            [
                1.0 - 2.0 * (y * y + z * z) * sq,
                2.0 * (x * y * sq + z * sc),
                2.0 * (x * z * sq - y * sc),
                0.0,
            ],
            [
                2.0 * (x * y * sq - z * sc),
                1.0 - 2.0 * (x * x + z * z) * sq,
                2.0 * (y * z * sq + x * sc),
                0.0,
            ],
            [
                2.0 * (x * z * sq + y * sc),
                2.0 * (y * z * sq - x * sc),
                1.0 - 2.0 * (x * x + y * y) * sq,
                0.0,
            ],
            [0.0, 0.0, 0.0, 1.0],
        ]));
        self
    }

    pub fn rotate_axis_angle(&self, x: f64, y: f64, z: f64, angle: f64) -> Matrix {
        let mut out = *self;
        out.rotate_axis_angle_self(x, y, z, angle);
        out
    }

    /// Skews by `ax` degrees along X and `ay` degrees along Y.
    pub fn skew_self(&mut self, ax: f64, ay: f64) -> &mut Self {
        self.fold(&Matrix::raw([
            [1.0, ay.to_radians().tan(), 0.0, 0.0],
            [ax.to_radians().tan(), 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]));
        self
    }

    pub fn skew(&self, ax: f64, ay: f64) -> Matrix {
        let mut out = *self;
        out.skew_self(ax, ay);
        out
    }

    pub fn skew_x_self(&mut self, angle: f64) -> &mut Self {
        self.skew_self(angle, 0.0)
    }

    pub fn skew_x(&self, angle: f64) -> Matrix {
        self.skew(angle, 0.0)
    }

    pub fn skew_y_self(&mut self, angle: f64) -> &mut Self {
        self.skew_self(0.0, angle)
    }

    pub fn skew_y(&self, angle: f64) -> Matrix {
        self.skew(0.0, angle)
    }

    pub fn flip_x_self(&mut self) -> &mut Self {
        self.fold(&Matrix::from_2d(-1.0, 0.0, 0.0, 1.0, 0.0, 0.0));
        self
    }

    pub fn flip_x(&self) -> Matrix {
        let mut out = *self;
        out.flip_x_self();
        out
    }

    pub fn flip_y_self(&mut self) -> &mut Self {
        self.fold(&Matrix::from_2d(1.0, 0.0, 0.0, -1.0, 0.0, 0.0));
        self
    }

    pub fn flip_y(&self) -> Matrix {
        let mut out = *self;
        out.flip_y_self();
        out
    }

    /// Inverts a 2D matrix in place via the closed-form affine inverse.
    ///
    /// A singular matrix (determinant exactly zero) does not error: every
    /// coefficient becomes NaN and the 2D flag drops, leaving an in-band
    /// "not invertible" value for callers to check.
    ///
    /// Panics if the matrix is not 2D; no 3D inverse is implemented.
    pub fn invert_self(&mut self) -> &mut Self {
        if !self.is2d {
            panic!("3D matrix inversion is not supported");
        }
        let (a, b, c, d, e, f) = (self.a(), self.b(), self.c(), self.d(), self.e(), self.f());
        let det = a * d - b * c;
        if det == 0.0 {
            self.m = [[f64::NAN; 4]; 4];
            self.is2d = false;
            return self;
        }
        *self = Matrix::from_2d(
            d / det,
            -b / det,
            -c / det,
            a / det,
            (c * f - d * e) / det,
            (b * e - a * f) / det,
        );
        self
    }

    pub fn invert(&self) -> Matrix {
        let mut out = *self;
        out.invert_self();
        out
    }

    /// Applies this matrix to a point in homogeneous coordinates.
    ///
    /// 2D matrices take a short path through the 6-term shorthand when the
    /// input has z = 0 and w = 1; it produces exactly the same values as the
    /// full 4x4 product.
    pub fn transform_point(&self, p: Point) -> Point {
        if self.is2d && p.z == 0.0 && p.w == 1.0 {
            return Point {
                x: self.a() * p.x + self.c() * p.y + self.e(),
                y: self.b() * p.x + self.d() * p.y + self.f(),
                z: 0.0,
                w: 1.0,
            };
        }
        let m = &self.m;
        Point {
            x: m[0][0] * p.x + m[1][0] * p.y + m[2][0] * p.z + m[3][0] * p.w,
            y: m[0][1] * p.x + m[1][1] * p.y + m[2][1] * p.z + m[3][1] * p.w,
            z: m[0][2] * p.x + m[1][2] * p.y + m[2][2] * p.z + m[3][2] * p.w,
            w: m[0][3] * p.x + m[1][3] * p.y + m[2][3] * p.z + m[3][3] * p.w,
        }
    }

    /// Re-parses a CSS transform list and replaces the receiver in place.
    pub fn set_matrix_value(&mut self, css: &str) -> Result<&mut Self, ParseError> {
        *self = parse::parse_transform_list(css)?;
        Ok(self)
    }
}

// Export surface
// ------------------------------------------------------------------------------
impl Matrix {
    /// The 16 coefficients in row-major order (m11, m12, ..., m44).
    pub fn to_float64_array(&self) -> [f64; 16] {
        std::array::from_fn(|i| self.m[i / 4][i % 4])
    }

    pub fn to_float32_array(&self) -> [f32; 16] {
        self.to_float64_array().map(|v| v as f32)
    }

    /// All named coefficients plus the `is2D`/`isIdentity` flags, under their
    /// DOM field names. Non-finite coefficients serialize as null.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for Matrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Matrix", 24)?;
        s.serialize_field("a", &self.a())?;
        s.serialize_field("b", &self.b())?;
        s.serialize_field("c", &self.c())?;
        s.serialize_field("d", &self.d())?;
        s.serialize_field("e", &self.e())?;
        s.serialize_field("f", &self.f())?;
        s.serialize_field("m11", &self.m11())?;
        s.serialize_field("m12", &self.m12())?;
        s.serialize_field("m13", &self.m13())?;
        s.serialize_field("m14", &self.m14())?;
        s.serialize_field("m21", &self.m21())?;
        s.serialize_field("m22", &self.m22())?;
        s.serialize_field("m23", &self.m23())?;
        s.serialize_field("m24", &self.m24())?;
        s.serialize_field("m31", &self.m31())?;
        s.serialize_field("m32", &self.m32())?;
        s.serialize_field("m33", &self.m33())?;
        s.serialize_field("m34", &self.m34())?;
        s.serialize_field("m41", &self.m41())?;
        s.serialize_field("m42", &self.m42())?;
        s.serialize_field("m43", &self.m43())?;
        s.serialize_field("m44", &self.m44())?;
        s.serialize_field("is2D", &self.is_2d())?;
        s.serialize_field("isIdentity", &self.is_identity())?;
        s.end()
    }
}

// Canonical serialization
// ------------------------------------------------------------------------------

/// Fixed 12-digit decimal, trailing zeros stripped, `-0` collapsed to `0`.
fn fmt_coef(v: f64) -> String {
    let s = format!("{v:.12}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

impl fmt::Display for Matrix {
    /// Minimal CSS form: `matrix(a, b, c, d, e, f)` while 2D, else the full
    /// row-major `matrix3d(...)`. Re-parsing the output reproduces the
    /// coefficients.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is2d {
            write!(
                f,
                "matrix({}, {}, {}, {}, {}, {})",
                fmt_coef(self.a()),
                fmt_coef(self.b()),
                fmt_coef(self.c()),
                fmt_coef(self.d()),
                fmt_coef(self.e()),
                fmt_coef(self.f()),
            )
        } else {
            let terms = self.to_float64_array().map(fmt_coef);
            write!(f, "matrix3d({})", terms.join(", "))
        }
    }
}

// Matrix-like conversion
// ------------------------------------------------------------------------------

/// The explicit "matrix-like" input: every recognized field, all optional.
///
/// Absent fields take their identity defaults. An alias pair (`a`/`m11` and
/// friends) may be set on both sides only if the two values agree.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MatrixInit {
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub c: Option<f64>,
    pub d: Option<f64>,
    pub e: Option<f64>,
    pub f: Option<f64>,
    pub m11: Option<f64>,
    pub m12: Option<f64>,
    pub m13: Option<f64>,
    pub m14: Option<f64>,
    pub m21: Option<f64>,
    pub m22: Option<f64>,
    pub m23: Option<f64>,
    pub m24: Option<f64>,
    pub m31: Option<f64>,
    pub m32: Option<f64>,
    pub m33: Option<f64>,
    pub m34: Option<f64>,
    pub m41: Option<f64>,
    pub m42: Option<f64>,
    pub m43: Option<f64>,
    pub m44: Option<f64>,
}

impl TryFrom<MatrixInit> for Matrix {
    type Error = MatrixError;

    fn try_from(init: MatrixInit) -> Result<Self, Self::Error> {
        fn pick(
            alias: Option<f64>,
            canonical: Option<f64>,
            names: (&'static str, &'static str),
            default: f64,
        ) -> Result<f64, MatrixError> {
            match (alias, canonical) {
                (Some(x), Some(y)) if x != y => Err(MatrixError::AliasMismatch {
                    alias: names.0,
                    canonical: names.1,
                }),
                (Some(x), _) => Ok(x),
                (_, Some(y)) => Ok(y),
                (None, None) => Ok(default),
            }
        }

        Ok(Matrix::from_3d([
            pick(init.a, init.m11, ("a", "m11"), 1.0)?,
            pick(init.b, init.m12, ("b", "m12"), 0.0)?,
            init.m13.unwrap_or(0.0),
            init.m14.unwrap_or(0.0),
            pick(init.c, init.m21, ("c", "m21"), 0.0)?,
            pick(init.d, init.m22, ("d", "m22"), 1.0)?,
            init.m23.unwrap_or(0.0),
            init.m24.unwrap_or(0.0),
            init.m31.unwrap_or(0.0),
            init.m32.unwrap_or(0.0),
            init.m33.unwrap_or(1.0),
            init.m34.unwrap_or(0.0),
            pick(init.e, init.m41, ("e", "m41"), 0.0)?,
            pick(init.f, init.m42, ("f", "m42"), 0.0)?,
            init.m43.unwrap_or(0.0),
            init.m44.unwrap_or(1.0),
        ]))
    }
}

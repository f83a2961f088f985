use crate::matrix::Matrix;

const COEF_NAMES: [&str; 16] = [
    "m11", "m12", "m13", "m14", "m21", "m22", "m23", "m24", "m31", "m32", "m33", "m34", "m41",
    "m42", "m43", "m44",
];

/// Asserts every coefficient of `got` is within `tol` of `want`.
///
/// A `tol` of 0.0 demands bitwise-equal arithmetic, which holds when two
/// inputs ran the exact same operation sequence.
pub fn assert_matrix_approx_eq(got: &Matrix, want: &Matrix, tol: f64) {
    let g = got.to_float64_array();
    let w = want.to_float64_array();
    for (name, (gv, wv)) in COEF_NAMES.iter().zip(g.iter().zip(w.iter())) {
        assert!(
            (gv - wv).abs() <= tol,
            "coefficient {name} differs: got {gv}, want {wv} (tol {tol})\n got: {got}\nwant: {want}"
        );
    }
}

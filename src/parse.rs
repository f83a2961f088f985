//! CSS transform-list parsing.
//!
//! A transform list is zero or more functional terms (`translate(10px, 2px)`,
//! `rotate(45deg)`, ...) separated by whitespace, commas, or nothing at all.
//! Parsing runs as a pipeline of pure helpers: split the input into terms,
//! validate each term against the fixed grammar and convert its arguments,
//! then reduce the resulting op list onto an identity matrix. Nothing is
//! returned on error, only the `ParseError` naming the offending piece.

use crate::matrix::Matrix;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unknown transform function '{0}'")]
    UnknownFunction(String),
    #[error("unterminated transform function '{0}'")]
    Unterminated(String),
    #[error("expected a transform function, found '{0}'")]
    NotAFunction(String),
    #[error("'{func}' expects {expected} arguments, got {got}")]
    WrongArity {
        func: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("expected a number, got '{0}'")]
    BadNumber(String),
    #[error("expected an angle in deg, rad, or turn, got '{0}'")]
    BadAngle(String),
    #[error("expected a length in px, got '{0}'")]
    BadLength(String),
    #[error("expected a number or percentage, got '{0}'")]
    BadScale(String),
}

/// Single-word values that stand for the identity matrix.
const IDENTITY_KEYWORDS: [&str; 6] = [
    "inherit",
    "initial",
    "revert",
    "revert-layer",
    "unset",
    "none",
];

/// One validated term with its arguments converted to the operation's native
/// units: degrees for angles, plain numbers for everything else. Single-axis
/// forms are already rewritten into their vector form here.
#[derive(Debug, Clone, PartialEq)]
enum Op {
    Matrix([f64; 6]),
    Matrix3d([f64; 16]),
    Translate(f64, f64, f64),
    Scale(f64, f64, f64),
    Rotate(f64, f64, f64),
    RotateAxisAngle(f64, f64, f64, f64),
    Skew(f64, f64),
}

/// Parses a CSS transform list into the matrix it reduces to.
///
/// The empty list and the identity keywords (`none`, `unset`, ...) produce
/// the identity matrix. Terms compose in writing order, leftmost first.
pub fn parse_transform_list(input: &str) -> Result<Matrix, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || IDENTITY_KEYWORDS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        return Ok(Matrix::identity());
    }

    let mut ops = Vec::new();
    for term in split_terms(trimmed)? {
        ops.push(parse_term(term)?);
    }

    let mut out = Matrix::identity();
    for op in &ops {
        apply(&mut out, op);
    }
    Ok(out)
}

fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || ch == ','
}

/// Splits the list at every `)`, keeping the text before each one. Empty
/// fragments are discarded, which lets terms be written back-to-back. Any
/// non-separator text after the final `)` is an error.
fn split_terms(input: &str) -> Result<Vec<&str>, ParseError> {
    let mut terms = Vec::new();
    let mut rest = input;
    while let Some(idx) = rest.find(')') {
        let frag = rest[..idx].trim_matches(is_separator);
        if !frag.is_empty() {
            terms.push(frag);
        }
        rest = &rest[idx + 1..];
    }
    let tail = rest.trim_matches(is_separator);
    if !tail.is_empty() {
        return Err(if tail.contains('(') {
            ParseError::Unterminated(tail.to_string())
        } else {
            ParseError::NotAFunction(tail.to_string())
        });
    }
    Ok(terms)
}

/// Validates one `name(args` fragment (the `)` was consumed by the split)
/// and converts its arguments. Function names match case-insensitively.
fn parse_term(term: &str) -> Result<Op, ParseError> {
    let Some((name, args)) = term.split_once('(') else {
        return Err(ParseError::NotAFunction(term.to_string()));
    };
    let name = name.trim().to_ascii_lowercase();
    let args: Vec<&str> = if args.trim().is_empty() {
        Vec::new()
    } else {
        args.split(',').map(str::trim).collect()
    };

    match name.as_str() {
        "matrix" => {
            expect_args("matrix", "6", &args, 6, 6)?;
            let mut vals = [0.0; 6];
            for (slot, tok) in vals.iter_mut().zip(&args) {
                *slot = number(tok)?;
            }
            Ok(Op::Matrix(vals))
        }
        "matrix3d" => {
            expect_args("matrix3d", "16", &args, 16, 16)?;
            let mut vals = [0.0; 16];
            for (slot, tok) in vals.iter_mut().zip(&args) {
                *slot = number(tok)?;
            }
            Ok(Op::Matrix3d(vals))
        }
        "translate" => {
            expect_args("translate", "1 to 2", &args, 1, 2)?;
            let tx = length_px(args[0])?;
            let ty = args.get(1).map(|tok| length_px(tok)).transpose()?;
            Ok(Op::Translate(tx, ty.unwrap_or(0.0), 0.0))
        }
        "translate3d" => {
            expect_args("translate3d", "3", &args, 3, 3)?;
            Ok(Op::Translate(
                length_px(args[0])?,
                length_px(args[1])?,
                length_px(args[2])?,
            ))
        }
        "translatex" => {
            expect_args("translateX", "1", &args, 1, 1)?;
            Ok(Op::Translate(length_px(args[0])?, 0.0, 0.0))
        }
        "translatey" => {
            expect_args("translateY", "1", &args, 1, 1)?;
            Ok(Op::Translate(0.0, length_px(args[0])?, 0.0))
        }
        "translatez" => {
            expect_args("translateZ", "1", &args, 1, 1)?;
            Ok(Op::Translate(0.0, 0.0, length_px(args[0])?))
        }
        "scale" => {
            expect_args("scale", "1 to 2", &args, 1, 2)?;
            let sx = factor(args[0])?;
            let sy = args.get(1).map(|tok| factor(tok)).transpose()?;
            Ok(Op::Scale(sx, sy.unwrap_or(sx), 1.0))
        }
        "scale3d" => {
            expect_args("scale3d", "3", &args, 3, 3)?;
            Ok(Op::Scale(
                factor(args[0])?,
                factor(args[1])?,
                factor(args[2])?,
            ))
        }
        "scalex" => {
            expect_args("scaleX", "1", &args, 1, 1)?;
            Ok(Op::Scale(factor(args[0])?, 1.0, 1.0))
        }
        "scaley" => {
            expect_args("scaleY", "1", &args, 1, 1)?;
            Ok(Op::Scale(1.0, factor(args[0])?, 1.0))
        }
        "scalez" => {
            expect_args("scaleZ", "1", &args, 1, 1)?;
            Ok(Op::Scale(1.0, 1.0, factor(args[0])?))
        }
        "rotate" => {
            expect_args("rotate", "1", &args, 1, 1)?;
            Ok(Op::Rotate(0.0, 0.0, angle_deg(args[0])?))
        }
        "rotate3d" => {
            expect_args("rotate3d", "4", &args, 4, 4)?;
            Ok(Op::RotateAxisAngle(
                number(args[0])?,
                number(args[1])?,
                number(args[2])?,
                angle_deg(args[3])?,
            ))
        }
        "rotatex" => {
            expect_args("rotateX", "1", &args, 1, 1)?;
            Ok(Op::Rotate(angle_deg(args[0])?, 0.0, 0.0))
        }
        "rotatey" => {
            expect_args("rotateY", "1", &args, 1, 1)?;
            Ok(Op::Rotate(0.0, angle_deg(args[0])?, 0.0))
        }
        "rotatez" => {
            expect_args("rotateZ", "1", &args, 1, 1)?;
            Ok(Op::Rotate(0.0, 0.0, angle_deg(args[0])?))
        }
        "skew" => {
            expect_args("skew", "1 to 2", &args, 1, 2)?;
            let ax = angle_deg(args[0])?;
            let ay = args.get(1).map(|tok| angle_deg(tok)).transpose()?;
            Ok(Op::Skew(ax, ay.unwrap_or(0.0)))
        }
        "skewx" => {
            expect_args("skewX", "1", &args, 1, 1)?;
            Ok(Op::Skew(angle_deg(args[0])?, 0.0))
        }
        "skewy" => {
            expect_args("skewY", "1", &args, 1, 1)?;
            Ok(Op::Skew(0.0, angle_deg(args[0])?))
        }
        _ => Err(ParseError::UnknownFunction(name)),
    }
}

fn expect_args(
    func: &'static str,
    expected: &'static str,
    args: &[&str],
    lo: usize,
    hi: usize,
) -> Result<(), ParseError> {
    if args.len() < lo || args.len() > hi {
        return Err(ParseError::WrongArity {
            func,
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn finite(tok: &str) -> Option<f64> {
    tok.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Bare number. Rust's float parser also accepts "NaN" and "inf"; those are
/// rejected so a malformed token can never become a coefficient.
fn number(tok: &str) -> Result<f64, ParseError> {
    finite(tok).ok_or_else(|| ParseError::BadNumber(tok.to_string()))
}

/// Angle with a required `deg`, `rad`, or `turn` suffix, converted to degrees.
fn angle_deg(tok: &str) -> Result<f64, ParseError> {
    let lower = tok.to_ascii_lowercase();
    let value = if let Some(n) = lower.strip_suffix("deg") {
        finite(n)
    } else if let Some(n) = lower.strip_suffix("turn") {
        finite(n).map(|v| v * 360.0)
    } else if let Some(n) = lower.strip_suffix("rad") {
        finite(n).map(f64::to_degrees)
    } else {
        None
    };
    value.ok_or_else(|| ParseError::BadAngle(tok.to_string()))
}

/// Length: bare number or `px`. Other units have no meaning without a layout
/// context, so they are rejected.
fn length_px(tok: &str) -> Result<f64, ParseError> {
    let lower = tok.to_ascii_lowercase();
    let n = lower.strip_suffix("px").unwrap_or(&lower);
    finite(n).ok_or_else(|| ParseError::BadLength(tok.to_string()))
}

/// Scale factor: bare number, or a percentage divided by 100.
fn factor(tok: &str) -> Result<f64, ParseError> {
    let value = match tok.strip_suffix('%') {
        Some(n) => finite(n).map(|v| v / 100.0),
        None => finite(tok),
    };
    value.ok_or_else(|| ParseError::BadScale(tok.to_string()))
}

/// Folds one op into the running matrix through the algebra primitives.
fn apply(out: &mut Matrix, op: &Op) {
    match *op {
        Op::Matrix([a, b, c, d, e, f]) => {
            out.multiply_self(&Matrix::from_2d(a, b, c, d, e, f));
        }
        Op::Matrix3d(vals) => {
            out.multiply_self(&Matrix::from_3d(vals));
        }
        Op::Translate(tx, ty, tz) => {
            out.translate_self(tx, ty, tz);
        }
        Op::Scale(sx, sy, sz) => {
            out.scale_self(sx, sy, sz, 0.0, 0.0, 0.0);
        }
        Op::Rotate(rx, ry, rz) => {
            out.rotate_self(rx, ry, rz);
        }
        Op::RotateAxisAngle(x, y, z, angle) => {
            out.rotate_axis_angle_self(x, y, z, angle);
        }
        Op::Skew(ax, ay) => {
            out.skew_self(ax, ay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;
    use crate::test_helpers::assert_matrix_approx_eq;

    fn parsed(input: &str) -> Matrix {
        parse_transform_list(input).unwrap_or_else(|err| panic!("parse of {input:?}: {err}"))
    }

    #[test]
    fn translate_in_px() {
        assert_eq!(
            parsed("translate(12px, 50px)").to_string(),
            "matrix(1, 0, 0, 1, 12, 50)"
        );
        assert_eq!(
            parsed("translate(12, 50)").to_string(),
            "matrix(1, 0, 0, 1, 12, 50)"
        );
        // One-argument form leaves y alone.
        assert_eq!(
            parsed("translate(7px)").to_string(),
            "matrix(1, 0, 0, 1, 7, 0)"
        );
    }

    #[test]
    fn scale_two_factors() {
        assert_eq!(
            parsed("scale(2, 0.5)").to_string(),
            "matrix(2, 0, 0, 0.5, 0, 0)"
        );
        // One factor scales both axes.
        assert_eq!(parsed("scale(3)").to_string(), "matrix(3, 0, 0, 3, 0, 0)");
    }

    #[test]
    fn scale_accepts_percentages() {
        assert_eq!(
            parsed("scale(50%, 200%)").to_string(),
            "matrix(0.5, 0, 0, 2, 0, 0)"
        );
    }

    #[test]
    fn rotate_half_turn() {
        assert_eq!(
            parsed("rotate(0.5turn)").to_string(),
            "matrix(-1, 0, 0, -1, 0, 0)"
        );
    }

    #[test]
    fn rotate_units_agree() {
        let deg = parsed("rotate(90deg)");
        assert_matrix_approx_eq(&deg, &parsed("rotate(1.5707963267948966rad)"), 1e-12);
        assert_matrix_approx_eq(&deg, &parsed("rotate(0.25turn)"), 1e-12);
    }

    #[test]
    fn identity_keywords() {
        for kw in ["none", "unset", "inherit", "initial", "revert", "revert-layer"] {
            let m = parsed(kw);
            assert!(m.is_identity(), "{kw} should be identity");
            assert_eq!(m.to_string(), "matrix(1, 0, 0, 1, 0, 0)");
        }
        assert!(parsed("").is_identity());
        assert!(parsed("   ").is_identity());
    }

    #[test]
    fn list_applies_leftmost_term_first() {
        assert_eq!(
            parsed("translate(10px, 20px) matrix(1, 2, 3, 4, 5, 6)").to_string(),
            "matrix(1, 2, 3, 4, 15, 26)"
        );
    }

    #[test]
    fn terms_may_be_packed_or_comma_separated() {
        let spaced = parsed("translate(10px) rotate(90deg)");
        assert_matrix_approx_eq(&parsed("translate(10px)rotate(90deg)"), &spaced, 0.0);
        assert_matrix_approx_eq(&parsed("translate(10px), rotate(90deg)"), &spaced, 0.0);
    }

    #[test]
    fn function_names_and_units_are_case_insensitive() {
        assert_eq!(
            parsed("TRANSLATE(12PX, 50Px)").to_string(),
            "matrix(1, 0, 0, 1, 12, 50)"
        );
        assert_matrix_approx_eq(&parsed("ROTATE(90DEG)"), &parsed("rotate(90deg)"), 0.0);
    }

    #[test]
    fn single_axis_forms_fill_identity_elements() {
        assert_eq!(
            parsed("translateX(4px)").to_string(),
            "matrix(1, 0, 0, 1, 4, 0)"
        );
        assert_eq!(
            parsed("translateY(4px)").to_string(),
            "matrix(1, 0, 0, 1, 0, 4)"
        );
        assert_eq!(parsed("scaleX(2)").to_string(), "matrix(2, 0, 0, 1, 0, 0)");
        assert_eq!(parsed("scaleY(2)").to_string(), "matrix(1, 0, 0, 2, 0, 0)");
        assert_matrix_approx_eq(&parsed("rotateZ(33deg)"), &parsed("rotate(33deg)"), 0.0);
    }

    #[test]
    fn z_axis_forms_go_3d() {
        let m = parsed("translateZ(5px)");
        assert!(!m.is_2d());
        assert_eq!(m.m43(), 5.0);

        let m = parsed("scaleZ(3)");
        assert!(!m.is_2d());
        assert_eq!(m.m33(), 3.0);

        assert!(!parsed("rotateX(30deg)").is_2d());
        assert!(!parsed("rotateY(30deg)").is_2d());
    }

    #[test]
    fn translate3d_and_scale3d() {
        let m = parsed("translate3d(1px, 2px, 3px)");
        assert!(!m.is_2d());
        assert_eq!((m.m41(), m.m42(), m.m43()), (1.0, 2.0, 3.0));

        let m = parsed("scale3d(2, 3, 4)");
        assert_eq!((m.m11(), m.m22(), m.m33()), (2.0, 3.0, 4.0));
    }

    #[test]
    fn rotate3d_about_z_matches_rotate() {
        let m = parsed("rotate3d(0, 0, 1, 90deg)");
        assert!(m.is_2d());
        assert_matrix_approx_eq(&m, &parsed("rotate(90deg)"), 1e-12);

        assert!(!parsed("rotate3d(1, 1, 0, 0deg)").is_2d());
    }

    #[test]
    fn skew_forms() {
        let m = parsed("skew(30deg, 10deg)");
        assert!((m.c() - 30f64.to_radians().tan()).abs() < 1e-15);
        assert!((m.b() - 10f64.to_radians().tan()).abs() < 1e-15);
        assert_eq!(parsed("skewX(30deg)").b(), 0.0);
        assert_eq!(parsed("skewY(30deg)").c(), 0.0);
    }

    #[test]
    fn matrix3d_literal() {
        let m = parsed("matrix3d(1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 10, 20, 30, 1)");
        assert!(!m.is_2d());
        assert_eq!((m.m41(), m.m42(), m.m43()), (10.0, 20.0, 30.0));
    }

    #[test]
    fn angle_without_unit_is_rejected() {
        assert_eq!(
            parse_transform_list("rotate(5)"),
            Err(ParseError::BadAngle("5".to_string()))
        );
    }

    #[test]
    fn unknown_function_is_rejected() {
        assert_eq!(
            parse_transform_list("bogus(1,2)"),
            Err(ParseError::UnknownFunction("bogus".to_string()))
        );
    }

    #[test]
    fn bad_units_are_rejected() {
        assert_eq!(
            parse_transform_list("translate(10em)"),
            Err(ParseError::BadLength("10em".to_string()))
        );
        assert_eq!(
            parse_transform_list("translate(10%)"),
            Err(ParseError::BadLength("10%".to_string()))
        );
        assert_eq!(
            parse_transform_list("scale(2px)"),
            Err(ParseError::BadScale("2px".to_string()))
        );
        assert_eq!(
            parse_transform_list("rotate(45grad)"),
            Err(ParseError::BadAngle("45grad".to_string()))
        );
        assert_eq!(
            parse_transform_list("matrix(1, 0, 0, 1, 0, 1px)"),
            Err(ParseError::BadNumber("1px".to_string()))
        );
        assert_eq!(
            parse_transform_list("matrix(1, 0, 0, 1, 0, NaN)"),
            Err(ParseError::BadNumber("NaN".to_string()))
        );
    }

    #[test]
    fn wrong_argument_counts_are_rejected() {
        assert_eq!(
            parse_transform_list("matrix(1, 2, 3, 4, 5)"),
            Err(ParseError::WrongArity {
                func: "matrix",
                expected: "6",
                got: 5,
            })
        );
        assert_eq!(
            parse_transform_list("matrix3d(1, 2, 3)"),
            Err(ParseError::WrongArity {
                func: "matrix3d",
                expected: "16",
                got: 3,
            })
        );
        assert_eq!(
            parse_transform_list("translate(1px, 2px, 3px)"),
            Err(ParseError::WrongArity {
                func: "translate",
                expected: "1 to 2",
                got: 3,
            })
        );
        assert_eq!(
            parse_transform_list("rotate()"),
            Err(ParseError::WrongArity {
                func: "rotate",
                expected: "1",
                got: 0,
            })
        );
    }

    #[test]
    fn unterminated_and_junk_input_are_rejected() {
        assert_eq!(
            parse_transform_list("rotate(45deg"),
            Err(ParseError::Unterminated("rotate(45deg".to_string()))
        );
        assert_eq!(
            parse_transform_list("rotate(45deg) leftovers"),
            Err(ParseError::NotAFunction("leftovers".to_string()))
        );
    }

    #[test]
    fn errors_never_leave_a_partial_matrix() {
        // The first term is fine; the second must poison the whole parse.
        assert!(parse_transform_list("translate(10px) bogus(1)").is_err());
        assert!(parse_transform_list("translate(10px) rotate(5)").is_err());
    }

    #[test]
    fn canonical_form_round_trips_2d() {
        let m = parsed("translate(12.5px, -3px) rotate(33deg) scale(1.25, 0.8) skewX(9deg)");
        assert!(m.is_2d());
        let back = parsed(&m.to_string());
        assert_matrix_approx_eq(&back, &m, 1e-9);
        assert_eq!(back.to_string(), m.to_string());
    }

    #[test]
    fn canonical_form_round_trips_3d() {
        let m = parsed("rotate3d(1, 2, 3, 40deg) translate3d(10px, 20px, 30px) scale3d(2, 2, 2)");
        assert!(!m.is_2d());
        let back = parsed(&m.to_string());
        assert_matrix_approx_eq(&back, &m, 1e-9);
    }

    #[test]
    fn parsed_matrix_transforms_points() {
        let m = parsed("translate(10px) scale(2)");
        let p = m.transform_point(Point::new(1.0, 1.0));
        assert_eq!((p.x, p.y), (12.0, 2.0));
    }
}

use xform::matrix::Matrix;
use xform::point::Point;

const DEMO_LIST: &str = "translate(120px, 40px) rotate(30deg) scale(1.5)";

fn main() {
    // All command-line args joined form the transform list, so quoting is
    // optional: `xform translate(10px) rotate(45deg)` works as-is.
    let args: Vec<String> = std::env::args().skip(1).collect();
    let list = if args.is_empty() {
        DEMO_LIST.to_string()
    } else {
        args.join(" ")
    };

    let matrix: Matrix = list.parse().expect("Failed to parse transform list");

    println!("input:     {list}");
    println!("canonical: {matrix}");
    println!(
        "is2d: {}  identity: {}",
        matrix.is_2d(),
        matrix.is_identity()
    );

    // Where the unit square lands under the transform.
    for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
        let p = matrix.transform_point(Point::new(x, y));
        println!("  ({x}, {y}) -> ({}, {})", p.x, p.y);
    }
}

//! A black-and-white raster that scripts draw on and save as a plain PBM
//! image. Drawing outside the canvas is clipped silently.

use super::fixed_arg;
use crate::environment::FunctionTable;
use crate::evaluator::{self, Error};
use crate::native::PrimitiveFn;
use crate::typename::Type;
use crate::types::{Arity, Expression, NativeObject, NativeValue};
use itertools::Itertools;
use std::any::Any;
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};

pub const CANVAS: &str = "canvas";
const MAX_SIDE: i64 = 1 << 14;
const MAX_COORDINATE: i64 = 1 << 20;

#[derive(Debug)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: RefCell<Vec<bool>>,
}

impl NativeObject for Canvas {
    fn type_tag(&self) -> Type {
        Type::new(CANVAS)
    }

    fn describe(&self) -> String {
        format!("<canvas {}x{}>", self.width, self.height)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: RefCell::new(vec![false; width * height]),
        }
    }

    pub fn plot(&self, x: i64, y: i64) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        self.pixels.borrow_mut()[y as usize * self.width + x as usize] = true;
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.pixels.borrow()[y * self.width + x]
    }

    /// Bresenham's line, both end points included.
    pub fn line(&self, (x0, y0): (i64, i64), (x1, y1): (i64, i64)) {
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.plot(x, y);
            if x == x1 && y == y1 {
                break;
            }
            let doubled = 2 * err;
            if doubled >= dy {
                err += dy;
                x += sx;
            }
            if doubled <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn write_pbm<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "P1")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        let pixels = self.pixels.borrow();
        for row in pixels.chunks(self.width.max(1)) {
            writeln!(out, "{}", row.iter().map(|&on| if on { '1' } else { '0' }).join(" "))?;
        }
        Ok(())
    }
}

fn coordinate(args: &[Expression], position: usize, function: &str) -> evaluator::Result<i64> {
    match fixed_arg(args, position, function)? {
        n if n.abs() <= MAX_COORDINATE => Ok(n),
        n => Err(Error::Native(format!("{}: coordinate {} is out of range", function, n))),
    }
}

fn side(args: &[Expression], position: usize) -> evaluator::Result<usize> {
    match fixed_arg(args, position, "canvas")? {
        n if (1..=MAX_SIDE).contains(&n) => Ok(n as usize),
        n => Err(Error::Native(format!(
            "canvas: side {} is outside 1..={}",
            n, MAX_SIDE
        ))),
    }
}

const NEW_CANVAS: PrimitiveFn = PrimitiveFn {
    name: "canvas",
    fn_ptr: |_, args| {
        let canvas = Canvas::new(side(args, 0)?, side(args, 1)?);
        Ok(Expression::Native(NativeValue::new(canvas)))
    },
    arity: Arity::exactly(2),
    parameters: &["int", "int"],
    returns: CANVAS,
};

const POINT: PrimitiveFn = PrimitiveFn {
    name: "point",
    fn_ptr: point_,
    arity: Arity::exactly(3),
    parameters: &[CANVAS, "int", "int"],
    returns: CANVAS,
};

fn point_(_: &FunctionTable, args: &[Expression]) -> evaluator::Result {
    let canvas = args[0].as_native::<Canvas>()?;
    canvas.plot(coordinate(args, 1, "point")?, coordinate(args, 2, "point")?);
    Ok(args[0].clone())
}

const LINE: PrimitiveFn = PrimitiveFn {
    name: "line",
    fn_ptr: line_,
    arity: Arity::exactly(5),
    parameters: &[CANVAS, "int", "int", "int", "int"],
    returns: CANVAS,
};

fn line_(_: &FunctionTable, args: &[Expression]) -> evaluator::Result {
    let canvas = args[0].as_native::<Canvas>()?;
    let start = (coordinate(args, 1, "line")?, coordinate(args, 2, "line")?);
    let end = (coordinate(args, 3, "line")?, coordinate(args, 4, "line")?);
    canvas.line(start, end);
    Ok(args[0].clone())
}

const SAVE: PrimitiveFn = PrimitiveFn {
    name: "save",
    fn_ptr: save_,
    arity: Arity::exactly(2),
    parameters: &[CANVAS, "str"],
    returns: "list",
};

fn save_(_: &FunctionTable, args: &[Expression]) -> evaluator::Result {
    let canvas = args[0].as_native::<Canvas>()?;
    let path = args[1].as_string()?;
    let mut out = BufWriter::new(File::create(path)?);
    canvas.write_pbm(&mut out)?;
    out.flush()?;
    log::debug!("saved {} to {}", canvas.describe(), path);
    Ok(Expression::new_list())
}

pub fn register(table: &mut FunctionTable) {
    for func in [NEW_CANVAS, POINT, LINE, SAVE] {
        table.register_native(Box::new(func));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use std::fs;

    fn rows(canvas: &Canvas) -> Vec<String> {
        let mut out = Vec::new();
        canvas.write_pbm(&mut out).unwrap();
        String::from_utf8(out).unwrap().lines().skip(2).map(String::from).collect()
    }

    #[test]
    fn diagonal_line() {
        let canvas = Canvas::new(3, 3);
        canvas.line((0, 0), (2, 2));
        assert_eq!(rows(&canvas), vec!["1 0 0", "0 1 0", "0 0 1"]);
    }

    #[test]
    fn lines_are_clipped() {
        let canvas = Canvas::new(4, 2);
        canvas.line((-2, 1), (10, 1));
        canvas.plot(7, 7);
        assert_eq!(rows(&canvas), vec!["0 0 0 0", "1 1 1 1"]);
        assert!(canvas.is_set(3, 1));
        assert!(!canvas.is_set(3, 0));
    }

    #[test]
    fn scripts_draw_and_save() {
        let mut path = std::env::temp_dir();
        path.push(format!("lazylisp-{}-canvas.pbm", std::process::id()));
        let source = format!(
            "(set c (canvas 2 2))\n(point c 1 0)\n(line c 0 1 1 1)\n(save c \"{}\")",
            path.display()
        );
        let printed = Interpreter::new().run_str(&source).unwrap();
        assert_eq!(printed, vec!["<canvas 2x2>", "<canvas 2x2>", "'()"]);
        let image = fs::read_to_string(&path).unwrap();
        assert_eq!(image, "P1\n2 2\n0 1\n1 1\n");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn sides_must_be_positive() {
        assert!(Interpreter::new().run_str("(canvas 0 5)").is_err());
    }

    #[test]
    fn far_coordinates_are_rejected() {
        let source = "(set c (canvas 2 2))\n(line c 0 0 9999999999 0)";
        assert!(Interpreter::new().run_str(source).is_err());
    }
}

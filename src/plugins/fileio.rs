use crate::environment::FunctionTable;
use crate::evaluator::{self, Error};
use crate::native::PrimitiveFn;
use crate::typename::Type;
use crate::types::{Arity, Expression, NativeObject, NativeValue};
use std::any::Any;
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub const FILE: &str = "file";

/// A file opened for writing. Dropping the last reference flushes and closes
/// it, so a script that forgets `close` still gets its output.
#[derive(Debug)]
pub struct FileHandle {
    path: PathBuf,
    writer: RefCell<Option<BufWriter<File>>>,
}

impl NativeObject for FileHandle {
    fn type_tag(&self) -> Type {
        Type::new(FILE)
    }

    fn describe(&self) -> String {
        let state = match self.writer.borrow().is_some() {
            true => "open",
            false => "closed",
        };
        format!("<file {} ({})>", self.path.display(), state)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl FileHandle {
    fn closed_error(&self, function: &str) -> Error {
        Error::Native(format!("{}: {} is already closed", function, self.path.display()))
    }
}

const OPEN: PrimitiveFn = PrimitiveFn {
    name: "open",
    fn_ptr: open_,
    arity: Arity::exactly(1),
    parameters: &["str"],
    returns: FILE,
};

fn open_(_: &FunctionTable, args: &[Expression]) -> evaluator::Result {
    let path = PathBuf::from(args[0].as_string()?);
    let file = File::create(&path)?;
    log::debug!("opened {} for writing", path.display());
    let handle = FileHandle {
        path,
        writer: RefCell::new(Some(BufWriter::new(file))),
    };
    Ok(Expression::Native(NativeValue::new(handle)))
}

const WRITE: PrimitiveFn = PrimitiveFn {
    name: "write",
    fn_ptr: write_,
    arity: Arity::exactly(2),
    parameters: &[FILE, "str"],
    returns: "list",
};

fn write_(_: &FunctionTable, args: &[Expression]) -> evaluator::Result {
    let handle = args[0].as_native::<FileHandle>()?;
    let text = args[1].as_string()?;
    let mut slot = handle.writer.borrow_mut();
    let writer = slot.as_mut().ok_or_else(|| handle.closed_error("write"))?;
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(Expression::new_list())
}

const CLOSE: PrimitiveFn = PrimitiveFn {
    name: "close",
    fn_ptr: close_,
    arity: Arity::exactly(1),
    parameters: &[FILE],
    returns: "list",
};

fn close_(_: &FunctionTable, args: &[Expression]) -> evaluator::Result {
    let handle = args[0].as_native::<FileHandle>()?;
    let mut writer = handle
        .writer
        .borrow_mut()
        .take()
        .ok_or_else(|| handle.closed_error("close"))?;
    writer.flush()?;
    log::debug!("closed {}", handle.path.display());
    Ok(Expression::new_list())
}

pub fn register(table: &mut FunctionTable) {
    for func in [OPEN, WRITE, CLOSE] {
        table.register_native(Box::new(func));
    }
}

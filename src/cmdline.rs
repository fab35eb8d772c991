use crate::interpreter::{self, Interpreter};
use crate::reader::Reader;
use linefeed::{DefaultTerminal, Interface, ReadResult, Terminal};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

pub fn setup() -> io::Result<Interface<DefaultTerminal>> {
    let interface = linefeed::Interface::new("lazylisp")?;
    interface.set_prompt("lazy> ")?;
    if let Some(path) = history_path() {
        interface.load_history(path).ok();
    };
    Ok(interface)
}

fn history_path() -> Option<PathBuf> {
    match dirs::data_dir() {
        Some(mut path) => {
            path.push(".lazylisp_history");
            Some(path)
        }
        None => None,
    }
}

pub fn save_history<T: Terminal>(interface: &Interface<T>) -> io::Result<()> {
    match history_path() {
        Some(path) => interface.save_history(path),
        None => Ok(()),
    }
}

pub fn repl<T: Terminal>(interface: &Interface<T>, mut processor: impl FnMut(&str) -> String) {
    loop {
        match interface.read_line() {
            Ok(ReadResult::Eof) => break,
            Ok(ReadResult::Signal(sig)) => {
                writeln!(interface, "Received signal {:?}", sig).ok();
            }
            Ok(ReadResult::Input(line)) => {
                interface.add_history_unique(line.clone());
                let output = processor(&line);
                if !output.is_empty() {
                    writeln!(interface, "{}", output).ok();
                }
            }
            Err(e) => {
                writeln!(interface, "Error: {}", e).ok();
                break;
            }
        }
    }
}

fn run_script<R: io::BufRead>(input: R) -> Result<(), interpreter::Error> {
    let mut interpreter = Interpreter::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    interpreter.run(Reader::new(input), &mut out)
}

/// `args` as given to the process: the program name, then an optional script
/// path.
pub fn launch(args: Vec<String>) -> Result<(), interpreter::Error> {
    match args.get(1) {
        Some(path) => {
            log::debug!("running script {}", path);
            run_script(BufReader::new(File::open(path)?))
        }
        None if atty::is(atty::Stream::Stdin) => {
            let interface = setup()?;
            let mut interpreter = Interpreter::new();
            repl(&interface, |line| interpreter.rep(line));
            save_history(&interface)?;
            Ok(())
        }
        None => {
            let stdin = io::stdin();
            let input = stdin.lock();
            run_script(input)
        }
    }
}

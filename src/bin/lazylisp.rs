use ansi_term::Colour::Red;
use lazylisp::cmdline;

fn main() {
    pretty_env_logger::init();
    let args = std::env::args().collect();
    if let Err(e) = cmdline::launch(args) {
        eprintln!("{}", Red.paint(format!("Error: {}", e)));
        std::process::exit(1);
    }
}

//! Entry point for the `wayfriend` command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = wayfriend_cli::run() {
        eprintln!("wayfriend: {err}");
        std::process::exit(1);
    }
}

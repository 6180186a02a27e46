//! groupscope CLI binary entrypoint.

fn main() {
    if let Err(err) = groupscope_cli::app::run() {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

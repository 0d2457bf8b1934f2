fn main() {
    if let Err(e) = botline::cli::main() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

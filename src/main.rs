fn main() {
    if let Err(e) = streamchat::cli::main() {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}

fn main() {
    if let Err(err) = steptree::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

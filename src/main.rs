fn main() {
    if let Err(err) = archviz::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

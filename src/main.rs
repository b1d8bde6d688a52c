fn main() {
    if let Err(e) = digital_object_linker_lib::run() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

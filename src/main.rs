fn main() {
    if let Err(err) = image_annotate::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

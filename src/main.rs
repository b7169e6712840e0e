fn main() {
    if let Err(err) = menta_sales::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn main() {
    let options = match leetjump_core::runtime::parse_cli_args(std::env::args_os()) {
        Ok(options) => options,
        Err(error) => error.exit(),
    };

    if let Err(error) = leetjump_core::runtime::run_with_options(options) {
        eprintln!("[leetjump] {error}");
        std::process::exit(1);
    }
}

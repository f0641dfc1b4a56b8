fn main() {
    use clap::Parser;
    use std::error::Error;
    let args = mangascrape::cli::Args::parse();
    let level = if args.verbose { "info" } else { "warn" };
    if let Err(e) = mangascrape::logging::init(level) {
        eprintln!("Warning: {:#}", e);
    }
    if let Err(e) = mangascrape::cli::run(&args) {
        eprintln!("{}", e);
        if args.verbose {
            let mut source = e.source();
            while let Some(s) = source {
                eprintln!("  cause: {}", s);
                source = s.source();
            }
        }
        std::process::exit(e.exit_code());
    }
}

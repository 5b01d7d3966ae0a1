use ago_fmt::{args, logging, run_app};

fn main() {
    // Parse command-line arguments
    let args = args::args_checks();
    logging::init_logging(args.verbose);

    if let Err(e) = run_app(&args) {
        eprintln!("Application error: {e:#}");
        std::process::exit(1);
    }
}

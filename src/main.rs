use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = oimtax::Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("OIMTAX_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = oimtax::run(cli) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

//! pingcloud - HTTP(S) latency to cloud provider regions

use pingcloud::{
    cli::Cli,
    config::{display_config_summary, load_config},
    registry::RegistrySource,
    build_info, App, ErrorReporter, Result,
};
use std::{io, process};

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    let cli = Cli::parse_args();
    let use_color = !cli.no_color && std::env::var("NO_COLOR").map_or(true, |v| v.is_empty());

    if let Err(e) = run_application(cli).await {
        ErrorReporter::new(use_color).report_error(&e);
        process::exit(1);
    }
}

async fn run_application(cli: Cli) -> Result<()> {
    let config = load_config(cli)?;

    if config.debug {
        eprintln!("{}", build_info());
        eprintln!("{}", display_config_summary(&config));
        eprintln!("Registry: {}", RegistrySource::resolve(&config).describe());
        eprintln!();
    }

    let app = App::new(config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    app.run(&mut out).await
}

use clap::Parser;
use intel_cli::Cli;

fn main() -> anyhow::Result<()> {
    setup_tracing();
    intel_cli::run(Cli::parse())
}

fn setup_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

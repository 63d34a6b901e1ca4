use clap::Parser;
use fireplan::api::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    fireplan::logging::init_logging(cli.verbose, cli.log_json);

    if let Err(e) = fireplan::api::run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

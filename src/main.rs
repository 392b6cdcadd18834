use clap::Parser;
use homeloan::cli::{Cli, Command, init_logging, run_schedule};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.log_level) {
        eprintln!("Logger error: {e}");
    }

    match cli.command {
        Command::Serve(args) => {
            if let Err(e) = homeloan::api::run_http_server(args.bind, args.port).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Schedule(args) => match run_schedule(&args) {
            Ok(out) => print!("{out}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
    }
}

use clap::Parser;

use revobank::cli::{ops, Cli, Commands};
use revobank::BankResult;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> BankResult<()> {
    match cli.command {
        Commands::Serve { config, port } => ops::serve(&config, port).await,
        Commands::InitConfig { path, force } => ops::init_config(&path, force),
        Commands::GenSecret => {
            println!("{}", ops::generate_secret());
            Ok(())
        }
        Commands::CreateAdmin {
            username,
            email,
            password,
            config,
        } => ops::create_admin(&config, username, email, password),
    }
}

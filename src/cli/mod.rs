pub mod ops;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(name = "revobank")]
#[command(about = "RevoBank personal banking API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API until Ctrl-C
    Serve {
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,
        /// Overrides server.port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Write a default config file with a fresh JWT secret
    InitConfig {
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        path: String,
        #[arg(long)]
        force: bool,
    },
    /// Print a random 256-bit secret as hex
    GenSecret,
    /// Register an administrator
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,
    },
}

//! Subcommand implementations

use rand::rngs::OsRng;
use rand::RngCore;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::api::ApiServer;
use crate::bank::Bank;
use crate::config::BankConfig;
use crate::error::{BankError, BankResult};
use crate::logging::init_tracing;
use crate::user::NewUser;

/// 32 random bytes, hex encoded.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub async fn serve(config_path: &str, port: Option<u16>) -> BankResult<()> {
    let mut config = BankConfig::load_or_default(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }
    init_tracing(&config.logging, config.server.environment);
    info!(
        environment = ?config.server.environment,
        db = %config.storage.db_path,
        "🏦 RevoBank starting"
    );

    let bank = Arc::new(Bank::open(&config)?);
    ApiServer::new(bank, &config.server.host, config.server.port)
        .start(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => tracing::error!("failed to listen for Ctrl-C: {}", e),
    }
}

pub fn init_config(path: &str, force: bool) -> BankResult<()> {
    if Path::new(path).exists() && !force {
        return Err(BankError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path
        )));
    }
    let mut config = BankConfig::default();
    config.auth.jwt_secret = generate_secret();
    std::fs::write(path, config.to_toml()?)
        .map_err(|e| BankError::Config(format!("writing {}: {}", path, e)))?;
    println!("Wrote {}", path);
    Ok(())
}

pub fn create_admin(config_path: &str, username: String, email: String, password: String) -> BankResult<()> {
    let config = BankConfig::load_or_default(config_path)?;
    init_tracing(&config.logging, config.server.environment);
    let bank = Bank::open(&config)?;
    let admin = bank.create_admin(NewUser {
        username,
        email,
        password,
        ..Default::default()
    })?;
    bank.flush()?;
    println!("Created admin '{}' (id {})", admin.username, admin.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_secret_shape() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let path = std::env::temp_dir().join(format!("revobank-{}.toml", uuid::Uuid::new_v4()));
        let path = path.to_string_lossy().to_string();

        init_config(&path, false).unwrap();
        assert!(matches!(init_config(&path, false), Err(BankError::Config(_))));
        init_config(&path, true).unwrap();

        let written: BankConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.auth.jwt_secret.len(), 64);
        std::fs::remove_file(&path).unwrap();
    }
}

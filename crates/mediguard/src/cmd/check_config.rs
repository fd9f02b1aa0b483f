//! Check-config command - validate a configuration file
//!
//! Prints the effective settings. The JWT secret is never printed.

use std::path::Path;

use anyhow::Result;
use mediguard_config::{Config, FanOut, NotifyProvider};

use super::load_config;

/// Run the check-config command
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    println!("configuration OK\n");
    print!("{}", summary(&config));
    Ok(())
}

/// Human-readable summary of the effective settings
fn summary(config: &Config) -> String {
    let notify = match config.notify.provider {
        NotifyProvider::Log => "log".to_string(),
        NotifyProvider::Expo => format!(
            "expo ({}, batch {}, timeout {:?})",
            config.notify.expo_url, config.notify.batch_size, config.notify.timeout
        ),
    };
    let fan_out = match config.notify.fan_out {
        FanOut::AllRegistered => "all_registered",
        FanOut::OwnerOnly => "owner_only",
    };
    let withdrawn = if config.records.withdrawn_data.hides_withdrawn() {
        "hide"
    } else {
        "retain"
    };

    let mut out = String::new();
    out.push_str(&format!("  server      {} (cors: {})\n", config.server.addr(), config.server.cors));
    out.push_str(&format!(
        "  database    {} (max connections: {})\n",
        config.storage.db_path().display(),
        config.storage.max_connections
    ));
    out.push_str(&format!(
        "  auth        issuer {}, token ttl {:?}\n",
        config.auth.issuer, config.auth.token_ttl
    ));
    out.push_str(&format!(
        "  records     utc offset {}, withdrawn data {}\n",
        config.records.utc_offset, withdrawn
    ));
    out.push_str(&format!("  notify      {}, fan-out {}\n", notify, fan_out));
    out.push_str(&format!("  log         level {}\n", config.log.level.as_str()));
    out
}

// src/sys/firewall.rs
//
// ufw backend. `ufw allow` is idempotent on its own ("Skipping adding existing rule").

use async_trait::async_trait;
use tracing::info;

use crate::sys::command::run_checked;
use crate::sys::traits::{FirewallManager, FirewallRule};

pub struct UfwFirewallManager;

#[async_trait]
impl FirewallManager for UfwFirewallManager {
    async fn allow(&self, rule: &FirewallRule) -> Result<(), String> {
        if rule.port == 0 {
            return Err("Port 0 is reserved and cannot be opened".into());
        }

        let spec = rule.to_string();
        run_checked("ufw", &["allow", &spec])
            .await
            .map_err(|e| format!("ufw allow {} failed: {}", spec, e))?;

        info!("🛡️ Firewall: allow {}", spec);
        Ok(())
    }

    async fn is_active(&self) -> Result<bool, String> {
        let status = run_checked("ufw", &["status"]).await?;
        Ok(status_is_active(&status))
    }

    async fn enable(&self) -> Result<(), String> {
        run_checked("ufw", &["--force", "enable"]).await.map(|_| ())
    }
}

fn status_is_active(status: &str) -> bool {
    status
        .lines()
        .any(|line| line.trim().eq_ignore_ascii_case("status: active"))
}

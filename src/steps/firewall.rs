// src/steps/firewall.rs

use tracing::{info, warn};

use crate::error::ProvisionError;
use crate::sys::traits::{FirewallManager, FirewallRule};

pub struct FirewallConfigurer<'a> {
    firewall: &'a dyn FirewallManager,
    tunnel_port: u16,
}

impl<'a> FirewallConfigurer<'a> {
    pub fn new(firewall: &'a dyn FirewallManager, tunnel_port: u16) -> Self {
        Self { firewall, tunnel_port }
    }

    /// SSH first, so enabling the firewall can never lock the operator out.
    pub fn rules(&self) -> Vec<FirewallRule> {
        vec![
            FirewallRule::tcp(22),
            FirewallRule::tcp(80),
            FirewallRule::tcp(443),
            FirewallRule::udp(self.tunnel_port),
        ]
    }

    pub async fn apply(&self) -> Result<(), ProvisionError> {
        for rule in self.rules() {
            self.firewall
                .allow(&rule)
                .await
                .map_err(ProvisionError::Firewall)?;
        }

        let active = match self.firewall.is_active().await {
            Ok(active) => active,
            Err(e) => {
                warn!("Could not read firewall status ({}), enabling anyway", e);
                false
            }
        };
        if active {
            return Ok(());
        }

        // Best effort: the ports are allowed even if activation fails.
        match self.firewall.enable().await {
            Ok(()) => info!("🛡️ Firewall enabled"),
            Err(e) => warn!("Firewall could not be enabled: {}", e),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::fake::FakeHost;

    #[tokio::test]
    async fn opens_ports_and_enables_inactive_firewall() {
        let host = FakeHost::new().firewall_active(false);
        FirewallConfigurer::new(&host, 443).apply().await.unwrap();
        assert_eq!(
            host.calls(),
            vec![
                "ufw allow 22/tcp",
                "ufw allow 80/tcp",
                "ufw allow 443/tcp",
                "ufw allow 443/udp",
                "ufw status",
                "ufw --force enable",
            ]
        );
    }

    #[tokio::test]
    async fn active_firewall_is_left_alone() {
        let host = FakeHost::new().firewall_active(true);
        FirewallConfigurer::new(&host, 443).apply().await.unwrap();
        assert!(!host.called("ufw --force enable"));
    }

    #[tokio::test]
    async fn udp_rule_follows_tunnel_port() {
        let host = FakeHost::new();
        let rules = FirewallConfigurer::new(&host, 8443).rules();
        assert!(rules.contains(&FirewallRule::udp(8443)));
        assert!(rules.contains(&FirewallRule::tcp(443)));
    }

    #[tokio::test]
    async fn enable_failure_is_not_fatal() {
        let host = FakeHost::new().failing("ufw --force enable");
        assert!(FirewallConfigurer::new(&host, 443).apply().await.is_ok());
    }

    #[tokio::test]
    async fn rule_failure_is_fatal() {
        let host = FakeHost::new().failing("ufw allow 80/tcp");
        let err = FirewallConfigurer::new(&host, 443).apply().await.unwrap_err();
        assert!(matches!(err, ProvisionError::Firewall(_)));
        assert!(!host.called("ufw allow 443"));
    }
}

// src/sys/systemd.rs

use async_trait::async_trait;
use tokio::process::Command;

use crate::sys::command::run_checked;
use crate::sys::traits::ServiceManager;

pub struct LinuxSystemdManager;

#[async_trait]
impl ServiceManager for LinuxSystemdManager {
    async fn enable_and_start(&self, service_name: &str) -> Result<(), String> {
        run_checked("systemctl", &["enable", "--now", service_name])
            .await
            .map(|_| ())
    }

    async fn enable(&self, service_name: &str) -> Result<(), String> {
        run_checked("systemctl", &["enable", service_name]).await.map(|_| ())
    }

    async fn restart(&self, service_name: &str) -> Result<(), String> {
        run_checked("systemctl", &["restart", service_name]).await.map(|_| ())
    }

    async fn is_active(&self, service_name: &str) -> bool {
        // `is-active --quiet` answers through the exit code alone.
        Command::new("systemctl")
            .args(["is-active", "--quiet", service_name])
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

// src/steps/packages.rs

use tracing::info;

use crate::config::WEB_SERVICE;
use crate::error::ProvisionError;
use crate::sys::traits::{PackageManager, ServiceManager};

pub const REQUIRED_PACKAGES: &[&str] =
    &["nginx", "certbot", "python3-certbot-nginx", "curl", "ufw"];

pub struct PackageProvisioner<'a> {
    packages: &'a dyn PackageManager,
    services: &'a dyn ServiceManager,
}

impl<'a> PackageProvisioner<'a> {
    pub fn new(packages: &'a dyn PackageManager, services: &'a dyn ServiceManager) -> Self {
        Self { packages, services }
    }

    /// No partial-install recovery: any package manager failure ends the run.
    pub async fn ensure(&self) -> Result<(), ProvisionError> {
        info!("Refreshing package indices");
        self.packages
            .refresh_indices()
            .await
            .map_err(ProvisionError::DependencyInstall)?;

        info!(packages = ?REQUIRED_PACKAGES, "Installing required packages");
        self.packages
            .install(REQUIRED_PACKAGES)
            .await
            .map_err(ProvisionError::DependencyInstall)?;

        self.services
            .enable_and_start(WEB_SERVICE)
            .await
            .map_err(|detail| ProvisionError::ServiceRestart {
                service: WEB_SERVICE.to_string(),
                detail,
            })
    }
}

// src/sys/packages.rs

use async_trait::async_trait;

use crate::sys::command::run_checked_with_env;
use crate::sys::traits::PackageManager;

// Keeps debconf from stopping the run on a prompt.
const APT_ENV: &[(&str, &str)] = &[("DEBIAN_FRONTEND", "noninteractive")];

pub struct AptPackageManager;

#[async_trait]
impl PackageManager for AptPackageManager {
    async fn refresh_indices(&self) -> Result<(), String> {
        run_checked_with_env("apt-get", &["update"], APT_ENV).await.map(|_| ())
    }

    async fn install(&self, packages: &[&str]) -> Result<(), String> {
        let mut args = vec!["install", "-y"];
        args.extend_from_slice(packages);
        run_checked_with_env("apt-get", &args, APT_ENV).await.map(|_| ())
    }
}

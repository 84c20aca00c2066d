// src/steps/site.rs
//
// Masquerade site + nginx vhost. The new vhost only goes live after `nginx -t`
// accepts it; a rejected config leaves the running server untouched.

use chrono::Local;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::config::{ProvisionerConfig, WEB_SERVICE};
use crate::error::ProvisionError;
use crate::request::ProvisioningRequest;
use crate::sys::proxy::render_http_vhost;
use crate::sys::traits::ProxyManager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteDefinition {
    pub webroot: PathBuf,
    pub vhost_path: PathBuf,
    pub backup_path: Option<PathBuf>,
}

pub struct SiteConfigurer<'a> {
    config: &'a ProvisionerConfig,
    proxy: &'a dyn ProxyManager,
}

impl<'a> SiteConfigurer<'a> {
    pub fn new(config: &'a ProvisionerConfig, proxy: &'a dyn ProxyManager) -> Self {
        Self { config, proxy }
    }

    pub async fn apply(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<SiteDefinition, ProvisionError> {
        let domain = request.domain.as_str();

        // 1. Web root + landing page (always rewritten)
        let webroot = self.config.web_root.join(domain);
        fs::create_dir_all(&webroot)
            .await
            .map_err(|e| ProvisionError::io(&webroot, e))?;
        let index = webroot.join("index.html");
        fs::write(&index, render_landing_page(domain))
            .await
            .map_err(|e| ProvisionError::io(&index, e))?;

        // 2. Vhost definition, backing up whatever was there
        let available = self.config.nginx_dir.join("sites-available");
        let enabled = self.config.nginx_dir.join("sites-enabled");
        for dir in [&available, &enabled] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| ProvisionError::io(dir, e))?;
        }

        let vhost_path = available.join(format!("{}.conf", domain));
        let backup_path = if exists(&vhost_path).await? {
            let stamp = Local::now().format("%Y%m%d%H%M%S").to_string();
            let backup = next_backup_path(&vhost_path, &stamp).await?;
            fs::copy(&vhost_path, &backup)
                .await
                .map_err(|e| ProvisionError::io(&backup, e))?;
            info!(backup = %backup.display(), "Backed up existing vhost");
            Some(backup)
        } else {
            None
        };

        let webroot_str = webroot.to_string_lossy();
        fs::write(&vhost_path, render_http_vhost(domain, &webroot_str))
            .await
            .map_err(|e| ProvisionError::io(&vhost_path, e))?;

        // 3. Enable it and get the distro default out of the way
        let enabled_link = enabled.join(format!("{}.conf", domain));
        if !link_present(&enabled_link).await? {
            fs::symlink(&vhost_path, &enabled_link)
                .await
                .map_err(|e| ProvisionError::io(&enabled_link, e))?;
        }
        let default_site = enabled.join("default");
        if link_present(&default_site).await? {
            fs::remove_file(&default_site)
                .await
                .map_err(|e| ProvisionError::io(&default_site, e))?;
            warn!("Removed nginx default site from sites-enabled");
        }

        // 4. Validate before apply
        test_and_reload(self.proxy).await?;

        Ok(SiteDefinition {
            webroot,
            vhost_path,
            backup_path,
        })
    }
}

/// `nginx -t`, then reload. A failed check skips the reload entirely.
pub(crate) async fn test_and_reload(proxy: &dyn ProxyManager) -> Result<(), ProvisionError> {
    proxy
        .test_config()
        .await
        .map_err(ProvisionError::SiteConfigInvalid)?;
    proxy
        .reload()
        .await
        .map_err(|detail| ProvisionError::ServiceRestart {
            service: WEB_SERVICE.to_string(),
            detail,
        })
}

/// `<vhost>.bak.<stamp>`, with a `-N` suffix when a backup from the same second exists.
async fn next_backup_path(vhost_path: &Path, stamp: &str) -> Result<PathBuf, ProvisionError> {
    let base = format!("{}.bak.{}", vhost_path.display(), stamp);
    let mut candidate = PathBuf::from(&base);
    let mut counter = 1;
    while exists(&candidate).await? {
        candidate = PathBuf::from(format!("{}-{}", base, counter));
        counter += 1;
    }
    Ok(candidate)
}

/// Follows symlinks. Only "not found" counts as absent; any other failure is an error.
async fn exists(path: &Path) -> Result<bool, ProvisionError> {
    fs::try_exists(path)
        .await
        .map_err(|e| ProvisionError::io(path, e))
}

/// Like `exists`, but a dangling symlink counts as present.
async fn link_present(path: &Path) -> Result<bool, ProvisionError> {
    match fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ProvisionError::io(path, e)),
    }
}

fn render_landing_page(domain: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{domain}</title>
    <style>
        body {{
            font-family: system-ui, sans-serif;
            max-width: 40rem;
            margin: 4rem auto;
            color: #333;
        }}
        h1 {{ font-weight: 300; }}
    </style>
</head>
<body>
    <h1>Welcome to {domain}</h1>
    <p>This site is under construction. Please check back soon.</p>
</body>
</html>
"#,
        domain = domain
    )
}

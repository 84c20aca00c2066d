// src/steps/tunnel.rs

use std::fs as std_fs;
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;
use tokio::fs as tokio_fs;
use tracing::info;

use crate::config::{ProvisionerConfig, TUNNEL_SERVICE};
use crate::error::ProvisionError;
use crate::request::ProvisioningRequest;
use crate::steps::yaml_string;
use crate::sys::secrets::SharedSecret;
use crate::sys::ssl::CertificateBundle;
use crate::sys::traits::{ServiceManager, TunnelBootstrap};

// ==============================================================================
// 1. Installer
// ==============================================================================

pub struct TunnelInstaller<'a> {
    config: &'a ProvisionerConfig,
    bootstrap: &'a dyn TunnelBootstrap,
}

impl<'a> TunnelInstaller<'a> {
    pub fn new(config: &'a ProvisionerConfig, bootstrap: &'a dyn TunnelBootstrap) -> Self {
        Self { config, bootstrap }
    }

    /// Always pulls the current upstream release; there is no version pin.
    pub async fn install(&self) -> Result<(), ProvisionError> {
        info!(installer = %self.config.installer_url, "Installing latest Hysteria 2");
        self.bootstrap
            .install_latest(&self.config.installer_url)
            .await
            .map_err(ProvisionError::TunnelInstall)
    }
}

// ==============================================================================
// 2. Server Configuration
// ==============================================================================

pub struct TunnelConfig<'a> {
    pub listen_address: String,
    pub cert: CertificateBundle,
    pub secret: &'a SharedSecret,
    pub masquerade_target_url: String,
}

impl<'a> TunnelConfig<'a> {
    pub fn new(request: &'a ProvisioningRequest, cert: CertificateBundle, port: u16) -> Self {
        Self {
            listen_address: format!(":{}", port),
            cert,
            secret: &request.shared_secret,
            masquerade_target_url: format!("https://{}", request.domain),
        }
    }

    /// Renders the server YAML with the plaintext secret in scope only inside `action`.
    fn with_rendered<R>(&self, action: impl FnOnce(&str) -> R) -> R {
        self.secret.use_secret(|secret| {
            let rendered = format!(
                r#"listen: {listen}

tls:
  cert: {cert}
  key: {key}

auth:
  type: password
  password: {password}

masquerade:
  type: proxy
  proxy:
    url: {url}
    rewriteHost: true
"#,
                listen = yaml_string(&self.listen_address),
                cert = yaml_string(&self.cert.cert_path.to_string_lossy()),
                key = yaml_string(&self.cert.key_path.to_string_lossy()),
                password = yaml_string(secret),
                url = yaml_string(&self.masquerade_target_url),
            );
            action(&rendered)
        })
    }

    /// Written with 0600 from inception: the file holds the shared secret.
    pub fn write_to(&self, path: &Path) -> Result<(), ProvisionError> {
        if let Some(parent) = path.parent() {
            std_fs::create_dir_all(parent).map_err(|e| ProvisionError::io(parent, e))?;
        }

        // `mode()` only applies on creation; a pre-existing file is tightened
        // before the secret reaches it.
        match std_fs::set_permissions(path, std_fs::Permissions::from_mode(0o600)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ProvisionError::io(path, e)),
        }

        self.with_rendered(|rendered| {
            let mut file = std_fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)
                .map_err(|e| ProvisionError::io(path, e))?;
            file.write_all(rendered.as_bytes())
                .map_err(|e| ProvisionError::io(path, e))?;
            file.sync_all().map_err(|e| ProvisionError::io(path, e))
        })
    }
}

pub struct TunnelConfigurer<'a> {
    config: &'a ProvisionerConfig,
    services: &'a dyn ServiceManager,
}

impl<'a> TunnelConfigurer<'a> {
    pub fn new(config: &'a ProvisionerConfig, services: &'a dyn ServiceManager) -> Self {
        Self { config, services }
    }

    pub async fn configure(&self, request: &ProvisioningRequest) -> Result<(), ProvisionError> {
        // Re-derived from the domain rather than trusted from the previous step.
        let bundle = CertificateBundle::for_domain(&self.config.cert_live_dir, &request.domain);
        for path in [&bundle.cert_path, &bundle.key_path] {
            let present = tokio_fs::try_exists(path)
                .await
                .map_err(|e| ProvisionError::io(path, e))?;
            if !present {
                return Err(ProvisionError::CertificateMissing { path: path.clone() });
            }
        }

        let tunnel = TunnelConfig::new(request, bundle, self.config.tunnel_port);
        tunnel.write_to(&self.config.tunnel_config_path)?;
        info!(path = %self.config.tunnel_config_path.display(), "Tunnel configuration written");

        self.services.enable(TUNNEL_SERVICE).await.map_err(unit_failure)?;
        self.services.restart(TUNNEL_SERVICE).await.map_err(unit_failure)
    }
}

fn unit_failure(detail: String) -> ProvisionError {
    ProvisionError::ServiceRestart {
        service: TUNNEL_SERVICE.to_string(),
        detail,
    }
}

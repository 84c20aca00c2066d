// src/error.rs

use std::path::PathBuf;

use thiserror::Error;

/// Every failure the provisioning run can hit. All of them end the run; the
/// non-fatal conditions (unknown distro, odd email, firewall enable) are only
/// logged and never become a `ProvisionError`.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("this tool must run as root (effective uid {euid})")]
    Permission { euid: u32 },

    #[error("cannot determine the host operating system: {0}")]
    EnvironmentDetection(String),

    #[error("aborted by operator: {0}")]
    AbortedByUser(String),

    #[error("could not read interactive input: {0}")]
    Prompt(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("package installation failed: {0}")]
    DependencyInstall(String),

    #[error("nginx rejected the site configuration, reload skipped: {0}")]
    SiteConfigInvalid(String),

    #[error("certificate issuance failed: {detail}{}", public_ip_hint(.public_ip))]
    CertificateIssuance {
        detail: String,
        public_ip: Option<String>,
    },

    #[error("tunnel installer failed: {0}")]
    TunnelInstall(String),

    #[error("certificate material missing at {}", .path.display())]
    CertificateMissing { path: PathBuf },

    #[error("service {service} failed to start: {detail}")]
    ServiceRestart { service: String, detail: String },

    #[error("kernel parameters could not be applied: {0}")]
    KernelTuning(String),

    #[error("firewall rule failed: {0}")]
    Firewall(String),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProvisionError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn public_ip_hint(ip: &Option<String>) -> String {
    match ip {
        Some(ip) => format!(
            " (this host's public IP is {}; check that the domain's A record points here)",
            ip
        ),
        None => String::new(),
    }
}

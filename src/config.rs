// src/config.rs

use std::env;
use std::path::PathBuf;

use crate::error::ProvisionError;

pub const WEB_SERVICE: &str = "nginx";
pub const TUNNEL_SERVICE: &str = "hysteria-server.service";

#[derive(Clone, Debug)]
pub struct ProvisionerConfig {
    // 📂 Host paths (overridable for staging hosts and tests)
    pub web_root: PathBuf,
    pub nginx_dir: PathBuf,
    pub cert_live_dir: PathBuf,
    pub tunnel_config_path: PathBuf,
    pub sysctl_path: PathBuf,
    pub os_release_path: PathBuf,

    // 🌐 Tunnel endpoint
    pub tunnel_port: u16,
    pub installer_url: String,
}

impl ProvisionerConfig {
    pub fn load() -> Result<Self, ProvisionError> {
        // The port ends up in the tunnel config, the firewall rules and the client
        // snippet, so a typo here must stop the run before anything is touched.
        let tunnel_port = match env::var("HY2P_TUNNEL_PORT") {
            Ok(raw) => parse_port(&raw)?,
            Err(_) => 443,
        };

        Ok(Self {
            web_root: path_var("HY2P_WEB_ROOT", "/var/www"),
            nginx_dir: path_var("HY2P_NGINX_DIR", "/etc/nginx"),
            cert_live_dir: path_var("HY2P_CERT_LIVE_DIR", "/etc/letsencrypt/live"),
            tunnel_config_path: path_var("HY2P_TUNNEL_CONFIG", "/etc/hysteria/config.yaml"),
            sysctl_path: path_var("HY2P_SYSCTL_FILE", "/etc/sysctl.d/99-hysteria.conf"),
            os_release_path: path_var("HY2P_OS_RELEASE", "/etc/os-release"),
            tunnel_port,
            installer_url: env::var("HY2P_INSTALLER_URL")
                .unwrap_or_else(|_| "https://get.hy2.sh/".to_string()),
        })
    }
}

fn path_var(key: &str, default: &str) -> PathBuf {
    PathBuf::from(env::var(key).unwrap_or_else(|_| default.to_string()))
}

fn parse_port(raw: &str) -> Result<u16, ProvisionError> {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ProvisionError::Config(format!(
            "HY2P_TUNNEL_PORT must be a port number between 1 and 65535, got '{}'",
            raw
        ))),
        Ok(port) => Ok(port),
    }
}

#[cfg(test)]
impl ProvisionerConfig {
    /// Every host path relocated under `root`, mirroring the real layout.
    pub fn rooted_at(root: &std::path::Path) -> Self {
        Self {
            web_root: root.join("var/www"),
            nginx_dir: root.join("etc/nginx"),
            cert_live_dir: root.join("etc/letsencrypt/live"),
            tunnel_config_path: root.join("etc/hysteria/config.yaml"),
            sysctl_path: root.join("etc/sysctl.d/99-hysteria.conf"),
            os_release_path: root.join("etc/os-release"),
            tunnel_port: 443,
            installer_url: "https://get.hy2.sh/".to_string(),
        }
    }
}

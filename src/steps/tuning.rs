// src/steps/tuning.rs

use tokio::fs;
use tracing::info;

use crate::config::ProvisionerConfig;
use crate::error::ProvisionError;
use crate::sys::traits::KernelTuner;

/// Socket buffer ceilings for QUIC. Fixed values, not derived from host memory.
pub const UDP_BUFFER_TUNABLES: &[(&str, u64)] = &[
    ("net.core.rmem_max", 16_777_216),
    ("net.core.wmem_max", 16_777_216),
];

pub struct SystemTuner<'a> {
    config: &'a ProvisionerConfig,
    kernel: &'a dyn KernelTuner,
}

impl<'a> SystemTuner<'a> {
    pub fn new(config: &'a ProvisionerConfig, kernel: &'a dyn KernelTuner) -> Self {
        Self { config, kernel }
    }

    pub async fn apply(&self) -> Result<(), ProvisionError> {
        let path = &self.config.sysctl_path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ProvisionError::io(parent, e))?;
        }
        fs::write(path, render_sysctl_file())
            .await
            .map_err(|e| ProvisionError::io(path, e))?;

        self.kernel
            .reload_parameters()
            .await
            .map_err(ProvisionError::KernelTuning)?;
        info!(path = %path.display(), "UDP buffer sizes applied");
        Ok(())
    }
}

fn render_sysctl_file() -> String {
    let mut out = String::from("# Managed by hy2-provision: UDP buffers for QUIC\n");
    for (key, value) in UDP_BUFFER_TUNABLES {
        out.push_str(&format!("{}={}\n", key, value));
    }
    out
}

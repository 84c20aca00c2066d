// src/steps/guard.rs

use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::error::ProvisionError;
use crate::sys::traits::{HostInspector, Prompter};

pub const SUPPORTED_DISTROS: &[&str] = &["debian", "ubuntu"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsIdentity {
    pub id: String,
    pub pretty_name: Option<String>,
}

impl OsIdentity {
    pub fn is_supported(&self) -> bool {
        SUPPORTED_DISTROS.contains(&self.id.as_str())
    }

    fn label(&self) -> &str {
        self.pretty_name.as_deref().unwrap_or(&self.id)
    }
}

/// Runs before anything on the host is touched.
pub struct EnvironmentGuard<'a> {
    host: &'a dyn HostInspector,
    prompter: &'a dyn Prompter,
    os_release_path: &'a Path,
}

impl<'a> EnvironmentGuard<'a> {
    pub fn new(
        host: &'a dyn HostInspector,
        prompter: &'a dyn Prompter,
        os_release_path: &'a Path,
    ) -> Self {
        Self { host, prompter, os_release_path }
    }

    pub async fn check(&self) -> Result<OsIdentity, ProvisionError> {
        let euid = self.host.effective_uid();
        if euid != 0 {
            return Err(ProvisionError::Permission { euid });
        }

        let content = fs::read_to_string(self.os_release_path).await.map_err(|e| {
            let path = self.os_release_path.display();
            ProvisionError::EnvironmentDetection(format!("{}: {}", path, e))
        })?;
        let os = parse_os_release(&content).ok_or_else(|| {
            ProvisionError::EnvironmentDetection(format!(
                "{} has no ID field",
                self.os_release_path.display()
            ))
        })?;

        if os.is_supported() {
            info!(os = os.label(), "Operating system supported");
            return Ok(os);
        }

        warn!(os = os.label(), "Only Debian and Ubuntu are supported");
        let proceed = self
            .prompter
            .confirm(&format!("{} is not supported. Continue anyway?", os.label()))
            .await
            .map_err(ProvisionError::Prompt)?;
        if !proceed {
            return Err(ProvisionError::AbortedByUser(format!(
                "declined to continue on unsupported OS {}",
                os.label()
            )));
        }
        Ok(os)
    }
}

/// Pulls `ID` and `PRETTY_NAME` out of an os-release file.
pub fn parse_os_release(content: &str) -> Option<OsIdentity> {
    let mut id = None;
    let mut pretty_name = None;
    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches(|c: char| c == '"' || c == '\'').to_string();
        match key {
            "ID" => id = Some(value.to_ascii_lowercase()),
            "PRETTY_NAME" => pretty_name = Some(value),
            _ => {}
        }
    }
    id.filter(|id| !id.is_empty())
        .map(|id| OsIdentity { id, pretty_name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::fake::FakeHost;

    const UBUNTU: &str =
        "PRETTY_NAME=\"Ubuntu 24.04 LTS\"\nNAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\n";
    const FEDORA: &str = "NAME=\"Fedora Linux\"\nID=fedora\nPRETTY_NAME=\"Fedora Linux 40\"\n";

    fn os_release(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn parses_quoted_fields() {
        let os = parse_os_release(UBUNTU).unwrap();
        assert_eq!(os.id, "ubuntu");
        assert_eq!(os.pretty_name.as_deref(), Some("Ubuntu 24.04 LTS"));
        assert!(os.is_supported());
    }

    #[test]
    fn missing_id_is_none() {
        assert!(parse_os_release("NAME=Something\n").is_none());
        assert!(parse_os_release("ID=\n").is_none());
    }

    #[tokio::test]
    async fn non_root_is_refused() {
        let host = FakeHost::new().as_uid(1000);
        let file = os_release(UBUNTU);
        let err = EnvironmentGuard::new(&host, &host, file.path()).check().await.unwrap_err();
        assert!(matches!(err, ProvisionError::Permission { euid: 1000 }));
    }

    #[tokio::test]
    async fn supported_os_needs_no_confirmation() {
        let host = FakeHost::new();
        let file = os_release(UBUNTU);
        EnvironmentGuard::new(&host, &host, file.path()).check().await.unwrap();
        assert!(!host.called("confirm"));
    }

    #[tokio::test]
    async fn unsupported_os_continues_after_confirmation() {
        let host = FakeHost::new();
        let file = os_release(FEDORA);
        let os = EnvironmentGuard::new(&host, &host, file.path()).check().await.unwrap();
        assert_eq!(os.id, "fedora");
        assert!(host.called("confirm"));
    }

    #[tokio::test]
    async fn unsupported_os_declined_aborts() {
        let host = FakeHost::new().declining_confirmation();
        let file = os_release(FEDORA);
        let err = EnvironmentGuard::new(&host, &host, file.path()).check().await.unwrap_err();
        assert!(matches!(err, ProvisionError::AbortedByUser(_)));
    }

    #[tokio::test]
    async fn unreadable_os_release_is_detection_error() {
        let host = FakeHost::new();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("os-release");
        let err = EnvironmentGuard::new(&host, &host, &missing).check().await.unwrap_err();
        assert!(matches!(err, ProvisionError::EnvironmentDetection(_)));
    }
}

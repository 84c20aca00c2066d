use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::sys::command::run_checked;
use crate::sys::traits::CertificateClient;

// ==============================================================================
// 1. Certificate Material (owned by certbot, located by us)
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateBundle {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl CertificateBundle {
    /// certbot's live layout: `<live>/<domain>/{fullchain,privkey}.pem`.
    pub fn for_domain(live_dir: &Path, domain: &str) -> Self {
        let domain_dir = live_dir.join(domain);
        Self {
            cert_path: domain_dir.join("fullchain.pem"),
            key_path: domain_dir.join("privkey.pem"),
        }
    }

    /// First file of the pair that is not on disk, if any.
    pub fn first_missing(&self) -> Option<&Path> {
        [&self.cert_path, &self.key_path]
            .into_iter()
            .find(|p| !p.is_file())
            .map(PathBuf::as_path)
    }
}

// ==============================================================================
// 2. Certbot Implementation
// ==============================================================================

pub struct CertbotClient;

#[async_trait]
impl CertificateClient for CertbotClient {
    async fn issue(&self, domain: &str, email: &str) -> Result<(), String> {
        run_checked(
            "certbot",
            &[
                "--nginx",
                "-d",
                domain,
                "--email",
                email,
                "--agree-tos",
                "--non-interactive",
                "--redirect",
            ],
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn bundle_paths_follow_live_layout() {
        let live = Path::new("/etc/letsencrypt/live");
        let bundle = CertificateBundle::for_domain(live, "proxy.example.com");
        assert_eq!(
            bundle.cert_path,
            PathBuf::from("/etc/letsencrypt/live/proxy.example.com/fullchain.pem")
        );
        assert_eq!(
            bundle.key_path,
            PathBuf::from("/etc/letsencrypt/live/proxy.example.com/privkey.pem")
        );
    }

    #[test]
    fn first_missing_reports_each_absent_file() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = CertificateBundle::for_domain(dir.path(), "a.example");
        assert_eq!(bundle.first_missing(), Some(bundle.cert_path.as_path()));

        fs::create_dir_all(bundle.cert_path.parent().unwrap()).unwrap();
        fs::write(&bundle.cert_path, "cert").unwrap();
        assert_eq!(bundle.first_missing(), Some(bundle.key_path.as_path()));

        fs::write(&bundle.key_path, "key").unwrap();
        assert_eq!(bundle.first_missing(), None);
    }
}

// src/steps/certificate.rs

use tracing::{error, info};

use crate::config::ProvisionerConfig;
use crate::error::ProvisionError;
use crate::request::ProvisioningRequest;
use crate::steps::site::test_and_reload;
use crate::sys::ssl::CertificateBundle;
use crate::sys::traits::{CertificateClient, HostInspector, ProxyManager};

pub struct CertificateIssuer<'a> {
    config: &'a ProvisionerConfig,
    certs: &'a dyn CertificateClient,
    proxy: &'a dyn ProxyManager,
    host: &'a dyn HostInspector,
}

impl<'a> CertificateIssuer<'a> {
    pub fn new(
        config: &'a ProvisionerConfig,
        certs: &'a dyn CertificateClient,
        proxy: &'a dyn ProxyManager,
        host: &'a dyn HostInspector,
    ) -> Self {
        Self { config, certs, proxy, host }
    }

    /// One attempt per run. Let's Encrypt rate limits make blind retries costly.
    pub async fn issue(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<CertificateBundle, ProvisionError> {
        info!(domain = %request.domain, "Requesting certificate");

        if let Err(detail) = self.certs.issue(&request.domain, &request.contact_email).await {
            // Nearly every failure here is DNS not pointing at us yet.
            let public_ip = self.host.public_ip().await;
            error!(public_ip = ?public_ip, "Certificate issuance failed");
            return Err(ProvisionError::CertificateIssuance { detail, public_ip });
        }

        let bundle = CertificateBundle::for_domain(&self.config.cert_live_dir, &request.domain);
        if let Some(missing) = bundle.first_missing() {
            return Err(ProvisionError::CertificateMissing {
                path: missing.to_path_buf(),
            });
        }

        // certbot rewrote the vhost for TLS; check it before nginx picks it up.
        test_and_reload(self.proxy).await?;
        info!(cert = %bundle.cert_path.display(), "Certificate issued");
        Ok(bundle)
    }
}

// src/steps/verify.rs
//
// Read-only: reports what it sees and never fails the run.

use crate::config::{TUNNEL_SERVICE, WEB_SERVICE};
use crate::request::ProvisioningRequest;
use crate::steps::yaml_string;
use crate::sys::traits::ServiceManager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceState {
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub services: Vec<ServiceState>,
    /// Clash-Meta style proxy entry, ready to paste into a client profile.
    pub client_config: String,
    pub share_uri: String,
}

impl VerificationReport {
    pub fn all_active(&self) -> bool {
        self.services.iter().all(|s| s.active)
    }
}

pub struct Verifier<'a> {
    services: &'a dyn ServiceManager,
    tunnel_port: u16,
}

impl<'a> Verifier<'a> {
    pub fn new(services: &'a dyn ServiceManager, tunnel_port: u16) -> Self {
        Self { services, tunnel_port }
    }

    pub async fn verify(&self, request: &ProvisioningRequest) -> VerificationReport {
        let mut services = Vec::new();
        for name in [WEB_SERVICE, TUNNEL_SERVICE] {
            services.push(ServiceState {
                name: name.to_string(),
                active: self.services.is_active(name).await,
            });
        }

        VerificationReport {
            services,
            client_config: render_client_config(request, self.tunnel_port),
            share_uri: render_share_uri(request, self.tunnel_port),
        }
    }
}

fn proxy_name(domain: &str) -> String {
    format!("hy2-{}", domain)
}

pub fn render_client_config(request: &ProvisioningRequest, port: u16) -> String {
    request.shared_secret.use_secret(|secret| {
        format!(
            r#"proxies:
  - name: {name}
    type: hysteria2
    server: {server}
    port: {port}
    password: {password}
    skip-cert-verify: false
    alpn: [h3]
"#,
            name = yaml_string(&proxy_name(&request.domain)),
            server = request.domain,
            port = port,
            password = yaml_string(secret),
        )
    })
}

pub fn render_share_uri(request: &ProvisioningRequest, port: u16) -> String {
    request.shared_secret.use_secret(|secret| {
        format!(
            "hysteria2://{auth}@{host}:{port}/?sni={host}#{name}",
            auth = urlencoding::encode(secret),
            host = request.domain,
            port = port,
            name = urlencoding::encode(&proxy_name(&request.domain)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::fake::FakeHost;
    use crate::sys::secrets::SharedSecret;

    fn request(secret: &str) -> ProvisioningRequest {
        ProvisioningRequest {
            domain: "proxy.example.com".into(),
            contact_email: "admin@example.com".into(),
            shared_secret: SharedSecret::new(secret.into()),
            skip_firewall: false,
            skip_sysctl_tuning: false,
        }
    }

    #[test]
    fn client_config_is_valid_yaml_with_expected_fields() {
        let rendered = render_client_config(&request("s3cret"), 443);
        assert!(rendered.contains("server: proxy.example.com"));
        assert!(rendered.contains("port: 443"));
        assert!(rendered.contains("alpn: [h3]"));

        let yaml: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
        let proxy = &yaml["proxies"][0];
        assert_eq!(proxy["name"].as_str(), Some("hy2-proxy.example.com"));
        assert_eq!(proxy["type"].as_str(), Some("hysteria2"));
        assert_eq!(proxy["port"].as_u64(), Some(443));
        assert_eq!(proxy["password"].as_str(), Some("s3cret"));
        assert_eq!(proxy["skip-cert-verify"].as_bool(), Some(false));
        assert_eq!(proxy["alpn"][0].as_str(), Some("h3"));
    }

    #[test]
    fn share_uri_encodes_secret() {
        let uri = render_share_uri(&request("a b/c@d"), 443);
        assert_eq!(
            uri,
            concat!(
                "hysteria2://a%20b%2Fc%40d@proxy.example.com:443/",
                "?sni=proxy.example.com#hy2-proxy.example.com"
            )
        );
    }

    #[tokio::test]
    async fn reports_both_services() {
        let host = FakeHost::new().failing("systemctl is-active hysteria-server.service");
        let report = Verifier::new(&host, 443).verify(&request("s3cret")).await;
        assert_eq!(
            report.services,
            vec![
                ServiceState { name: "nginx".into(), active: true },
                ServiceState { name: "hysteria-server.service".into(), active: false },
            ]
        );
        assert!(!report.all_active());
    }
}

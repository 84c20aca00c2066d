use async_trait::async_trait;

use crate::config::WEB_SERVICE;
use crate::sys::command::run_checked;
use crate::sys::traits::ProxyManager;

// ==============================================================================
// Nginx Implementation
// ==============================================================================
pub struct NginxManager;

#[async_trait]
impl ProxyManager for NginxManager {
    async fn test_config(&self) -> Result<(), String> {
        run_checked("nginx", &["-t"])
            .await
            .map(|_| ())
            .map_err(|e| format!("Nginx config error: {}", e))
    }

    async fn reload(&self) -> Result<(), String> {
        run_checked("systemctl", &["reload", WEB_SERVICE])
            .await
            .map(|_| ())
            .map_err(|e| format!("Systemd reload failed: {}", e))
    }
}

/// Server block for the masquerade site. HTTP only: certbot's nginx plugin adds
/// the TLS listener and the redirect once the certificate is issued.
pub fn render_http_vhost(domain: &str, webroot: &str) -> String {
    format!(
        r#"server {{
    listen 80;
    listen [::]:80;
    server_name {domain};

    root {webroot};
    index index.html;

    location /.well-known/acme-challenge/ {{
        allow all;
    }}

    location / {{
        try_files $uri $uri/ =404;
        add_header X-Content-Type-Options "nosniff" always;
    }}
}}
"#,
        domain = domain,
        webroot = webroot
    )
}

use async_trait::async_trait;

// Every external tool the provisioner drives sits behind one of these contracts.
// Implementations report failures as plain strings; the steps decide which
// provisioning error a failure becomes.

// ==============================================================================
// 1. Host Identity & Operator Input
// ==============================================================================

#[async_trait]
pub trait HostInspector: Send + Sync {
    fn effective_uid(&self) -> u32;

    /// Best effort: `None` when the host cannot reach an IP echo service.
    async fn public_ip(&self) -> Option<String>;
}

#[async_trait]
pub trait Prompter: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String, String>;
    async fn confirm(&self, question: &str) -> Result<bool, String>;
}

// ==============================================================================
// 2. Packages & Services
// ==============================================================================

#[async_trait]
pub trait PackageManager: Send + Sync {
    async fn refresh_indices(&self) -> Result<(), String>;
    async fn install(&self, packages: &[&str]) -> Result<(), String>;
}

#[async_trait]
pub trait ServiceManager: Send + Sync {
    async fn enable_and_start(&self, service_name: &str) -> Result<(), String>;
    async fn enable(&self, service_name: &str) -> Result<(), String>;
    async fn restart(&self, service_name: &str) -> Result<(), String>;
    async fn is_active(&self, service_name: &str) -> bool;
}

// ==============================================================================
// 3. Reverse Proxy (validate-before-apply)
// ==============================================================================

#[async_trait]
pub trait ProxyManager: Send + Sync {
    /// Syntax-checks the on-disk configuration without touching the running server.
    async fn test_config(&self) -> Result<(), String>;

    /// Reloads the running server. Callers must have passed `test_config` first.
    async fn reload(&self) -> Result<(), String>;
}

// ==============================================================================
// 4. Certificates & Tunnel Bootstrap
// ==============================================================================

#[async_trait]
pub trait CertificateClient: Send + Sync {
    /// Non-interactive, redirect-enabled issuance bound to the domain's vhost.
    async fn issue(&self, domain: &str, email: &str) -> Result<(), String>;
}

#[async_trait]
pub trait TunnelBootstrap: Send + Sync {
    /// Installs or upgrades the tunnel server to the latest upstream release.
    async fn install_latest(&self, installer_url: &str) -> Result<(), String>;
}

// ==============================================================================
// 5. Kernel Tunables
// ==============================================================================

#[async_trait]
pub trait KernelTuner: Send + Sync {
    /// Re-applies every sysctl configuration file on the host.
    async fn reload_parameters(&self) -> Result<(), String>;
}

// ==============================================================================
// 6. Firewall Abstraction
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirewallRule {
    pub port: u16,
    pub protocol: Protocol,
}

impl FirewallRule {
    pub fn tcp(port: u16) -> Self {
        Self { port, protocol: Protocol::Tcp }
    }

    pub fn udp(port: u16) -> Self {
        Self { port, protocol: Protocol::Udp }
    }
}

impl std::fmt::Display for FirewallRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol.as_str())
    }
}

#[async_trait]
pub trait FirewallManager: Send + Sync {
    /// Must be idempotent: allowing an existing rule is not an error.
    async fn allow(&self, rule: &FirewallRule) -> Result<(), String>;
    async fn is_active(&self) -> Result<bool, String>;
    async fn enable(&self) -> Result<(), String>;
}

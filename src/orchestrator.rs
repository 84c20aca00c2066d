// src/orchestrator.rs

use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::ProvisionerConfig;
use crate::error::ProvisionError;
use crate::request::{ProvisioningRequest, RequestArgs, RequestResolver};
use crate::steps::certificate::CertificateIssuer;
use crate::steps::firewall::FirewallConfigurer;
use crate::steps::guard::EnvironmentGuard;
use crate::steps::packages::PackageProvisioner;
use crate::steps::site::{SiteConfigurer, SiteDefinition};
use crate::steps::tuning::SystemTuner;
use crate::steps::tunnel::{TunnelConfigurer, TunnelInstaller};
use crate::steps::verify::{VerificationReport, Verifier};
use crate::sys::firewall::UfwFirewallManager;
use crate::sys::host::{LinuxHost, ScriptBootstrap, SysctlTuner, TerminalPrompter};
use crate::sys::packages::AptPackageManager;
use crate::sys::proxy::NginxManager;
use crate::sys::ssl::CertbotClient;
use crate::sys::systemd::LinuxSystemdManager;
use crate::sys::traits::{
    CertificateClient, FirewallManager, HostInspector, KernelTuner, PackageManager, Prompter,
    ProxyManager, ServiceManager, TunnelBootstrap,
};

// ==============================================================================
// 1. Run States
// ==============================================================================

/// Forward-only: each state is reached once, in this order. `Tuned` and
/// `Firewalled` may be skipped; anything else failing aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Guarded,
    Resolved,
    PackagesReady,
    SiteReady,
    CertIssued,
    TunnelInstalled,
    TunnelConfigured,
    Tuned,
    Firewalled,
    Verified,
}

impl Stage {
    /// The component whose success moves the run into this state.
    pub fn step_name(&self) -> &'static str {
        match self {
            Stage::Init => "Init",
            Stage::Guarded => "EnvironmentGuard",
            Stage::Resolved => "RequestResolver",
            Stage::PackagesReady => "PackageProvisioner",
            Stage::SiteReady => "SiteConfigurer",
            Stage::CertIssued => "CertificateIssuer",
            Stage::TunnelInstalled => "TunnelInstaller",
            Stage::TunnelConfigured => "TunnelConfigurer",
            Stage::Tuned => "SystemTuner",
            Stage::Firewalled => "FirewallConfigurer",
            Stage::Verified => "Verifier",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Terminal failure state. `reached` is the last state the host is known to be in.
#[derive(Debug, Error)]
#[error("{} failed: {error}", .failed.step_name())]
pub struct Aborted {
    pub failed: Stage,
    pub reached: Stage,
    #[source]
    pub error: ProvisionError,
}

struct Progress {
    reached: Stage,
    history: Vec<Stage>,
}

impl Progress {
    fn new() -> Self {
        Self {
            reached: Stage::Init,
            history: vec![Stage::Init],
        }
    }

    fn advance<T>(
        &mut self,
        target: Stage,
        result: Result<T, ProvisionError>,
    ) -> Result<T, Aborted> {
        match result {
            Ok(value) => {
                info!(stage = %target, "✔ {}", target.step_name());
                self.reached = target;
                self.history.push(target);
                Ok(value)
            }
            Err(error) => Err(Aborted {
                failed: target,
                reached: self.reached,
                error,
            }),
        }
    }

    fn skip(&self, target: Stage, flag: &str) {
        info!(stage = %target, "Skipping {} ({})", target.step_name(), flag);
    }
}

// ==============================================================================
// 2. Host Capabilities
// ==============================================================================

/// Every external tool the run touches. Swapping these is how tests drive the
/// full state machine without a real host.
#[derive(Clone)]
pub struct Capabilities {
    pub host: Arc<dyn HostInspector>,
    pub prompter: Arc<dyn Prompter>,
    pub packages: Arc<dyn PackageManager>,
    pub services: Arc<dyn ServiceManager>,
    pub proxy: Arc<dyn ProxyManager>,
    pub certs: Arc<dyn CertificateClient>,
    pub tunnel: Arc<dyn TunnelBootstrap>,
    pub kernel: Arc<dyn KernelTuner>,
    pub firewall: Arc<dyn FirewallManager>,
}

impl Capabilities {
    pub fn linux() -> Self {
        Self {
            host: Arc::new(LinuxHost),
            prompter: Arc::new(TerminalPrompter::new()),
            packages: Arc::new(AptPackageManager),
            services: Arc::new(LinuxSystemdManager),
            proxy: Arc::new(NginxManager),
            certs: Arc::new(CertbotClient),
            tunnel: Arc::new(ScriptBootstrap),
            kernel: Arc::new(SysctlTuner),
            firewall: Arc::new(UfwFirewallManager),
        }
    }
}

// ==============================================================================
// 3. Orchestrator
// ==============================================================================

pub struct ProvisionOutcome {
    pub request: ProvisioningRequest,
    pub site: SiteDefinition,
    pub report: VerificationReport,
    pub history: Vec<Stage>,
}

pub struct Orchestrator {
    config: ProvisionerConfig,
    caps: Capabilities,
}

impl Orchestrator {
    pub fn new(config: ProvisionerConfig, caps: Capabilities) -> Self {
        Self { config, caps }
    }

    pub async fn run(&self, args: RequestArgs) -> Result<ProvisionOutcome, Aborted> {
        let config = &self.config;
        let caps = &self.caps;
        let mut progress = Progress::new();

        let guard = EnvironmentGuard::new(
            caps.host.as_ref(),
            caps.prompter.as_ref(),
            &config.os_release_path,
        );
        let guarded = guard.check().await;
        progress.advance(Stage::Guarded, guarded)?;

        let resolved = RequestResolver::new(caps.prompter.as_ref()).resolve(args).await;
        let request = progress.advance(Stage::Resolved, resolved)?;
        info!(
            domain = %request.domain,
            email = %request.contact_email,
            "Provisioning request resolved"
        );

        let packages = PackageProvisioner::new(caps.packages.as_ref(), caps.services.as_ref())
            .ensure()
            .await;
        progress.advance(Stage::PackagesReady, packages)?;

        let site = SiteConfigurer::new(config, caps.proxy.as_ref()).apply(&request).await;
        let site = progress.advance(Stage::SiteReady, site)?;

        let issuer = CertificateIssuer::new(
            config,
            caps.certs.as_ref(),
            caps.proxy.as_ref(),
            caps.host.as_ref(),
        );
        let cert = issuer.issue(&request).await;
        progress.advance(Stage::CertIssued, cert)?;

        let installed = TunnelInstaller::new(config, caps.tunnel.as_ref()).install().await;
        progress.advance(Stage::TunnelInstalled, installed)?;

        let configured = TunnelConfigurer::new(config, caps.services.as_ref())
            .configure(&request)
            .await;
        progress.advance(Stage::TunnelConfigured, configured)?;

        if request.skip_sysctl_tuning {
            progress.skip(Stage::Tuned, "--no-sysctl");
        } else {
            let tuned = SystemTuner::new(config, caps.kernel.as_ref()).apply().await;
            progress.advance(Stage::Tuned, tuned)?;
        }

        if request.skip_firewall {
            progress.skip(Stage::Firewalled, "--no-ufw");
        } else {
            let firewalled = FirewallConfigurer::new(caps.firewall.as_ref(), config.tunnel_port)
                .apply()
                .await;
            progress.advance(Stage::Firewalled, firewalled)?;
        }

        let report = Verifier::new(caps.services.as_ref(), config.tunnel_port)
            .verify(&request)
            .await;
        progress.advance(Stage::Verified, Ok(()))?;

        Ok(ProvisionOutcome {
            request,
            site,
            report,
            history: progress.history,
        })
    }
}

// src/request.rs
//
// Collecting a request (flags, prompts, generated secret) is kept apart from
// validating it, so `validate` stays a pure function of the collected values.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::error::ProvisionError;
use crate::sys::secrets::SharedSecret;
use crate::sys::traits::Prompter;

static DOMAIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.-]+$").expect("static domain pattern"));

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern"));

/// Whatever the operator supplied up front; any field may be missing.
#[derive(Debug, Default, Clone)]
pub struct RequestArgs {
    pub domain: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub skip_firewall: bool,
    pub skip_sysctl_tuning: bool,
}

/// Fully collected but not yet validated.
#[derive(Debug)]
pub struct CollectedRequest {
    pub domain: String,
    pub contact_email: String,
    pub shared_secret: SharedSecret,
    pub skip_firewall: bool,
    pub skip_sysctl_tuning: bool,
}

/// Immutable for the rest of the run; every step borrows it.
#[derive(Debug)]
pub struct ProvisioningRequest {
    pub domain: String,
    pub contact_email: String,
    pub shared_secret: SharedSecret,
    pub skip_firewall: bool,
    pub skip_sysctl_tuning: bool,
}

pub struct RequestResolver<'a> {
    prompter: &'a dyn Prompter,
}

impl<'a> RequestResolver<'a> {
    pub fn new(prompter: &'a dyn Prompter) -> Self {
        Self { prompter }
    }

    pub async fn resolve(&self, args: RequestArgs) -> Result<ProvisioningRequest, ProvisionError> {
        let collected = self.collect(args).await?;
        validate(collected)
    }

    /// Fills every gap: prompts for domain and email, generates the secret.
    pub async fn collect(&self, args: RequestArgs) -> Result<CollectedRequest, ProvisionError> {
        let domain = match non_blank(args.domain) {
            Some(domain) => domain,
            None => self.ask("Domain pointing at this host (e.g. proxy.example.com)").await?,
        };
        let contact_email = match non_blank(args.email) {
            Some(email) => email,
            None => self.ask("Contact email for Let's Encrypt").await?,
        };
        let shared_secret = match non_blank(args.password) {
            Some(password) => SharedSecret::new(password),
            None => {
                info!("No password supplied, generating a random one");
                SharedSecret::generate()
            }
        };

        Ok(CollectedRequest {
            domain,
            contact_email,
            shared_secret,
            skip_firewall: args.skip_firewall,
            skip_sysctl_tuning: args.skip_sysctl_tuning,
        })
    }

    async fn ask(&self, question: &str) -> Result<String, ProvisionError> {
        self.prompter
            .ask(question)
            .await
            .map_err(ProvisionError::Prompt)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Rejects a bad domain outright; an implausible email only earns a warning.
pub fn validate(collected: CollectedRequest) -> Result<ProvisioningRequest, ProvisionError> {
    // Checked exactly as supplied; surrounding whitespace is not a hostname.
    validate_domain_format(&collected.domain)?;
    let domain = collected.domain.to_ascii_lowercase();

    let contact_email = collected.contact_email.trim().to_string();
    if !is_plausible_email(&contact_email) {
        warn!(email = %contact_email, "Contact email looks implausible, continuing anyway");
    }

    if collected.shared_secret.is_empty() {
        return Err(ProvisionError::InvalidInput("shared secret cannot be empty".into()));
    }

    Ok(ProvisioningRequest {
        domain,
        contact_email,
        shared_secret: collected.shared_secret,
        skip_firewall: collected.skip_firewall,
        skip_sysctl_tuning: collected.skip_sysctl_tuning,
    })
}

/// Hostname grammar plus path safety: the domain becomes a directory name
/// under the web root and a file name under nginx's sites directories.
pub fn validate_domain_format(domain: &str) -> Result<(), ProvisionError> {
    if !DOMAIN_PATTERN.is_match(domain) {
        return Err(ProvisionError::InvalidInput(format!(
            "'{}' is not a valid domain name",
            domain
        )));
    }
    if domain.contains("..")
        || domain.starts_with(['.', '-'])
        || domain.ends_with(['.', '-'])
    {
        return Err(ProvisionError::InvalidInput(format!(
            "'{}' is not a valid domain name",
            domain
        )));
    }
    Ok(())
}

pub fn is_plausible_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

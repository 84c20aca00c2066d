// src/sys/host.rs

use async_trait::async_trait;
use nix::unistd::geteuid;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;

use crate::sys::command::run_checked;
use crate::sys::traits::{HostInspector, KernelTuner, Prompter, TunnelBootstrap};

const PUBLIC_IP_ECHO: &str = "https://api.ipify.org";

// ==============================================================================
// 1. Identity
// ==============================================================================

pub struct LinuxHost;

#[async_trait]
impl HostInspector for LinuxHost {
    fn effective_uid(&self) -> u32 {
        geteuid().as_raw()
    }

    async fn public_ip(&self) -> Option<String> {
        let out = run_checked("curl", &["-4", "-s", "--max-time", "5", PUBLIC_IP_ECHO])
            .await
            .ok()?;
        let ip = out.trim();
        (!ip.is_empty()).then(|| ip.to_string())
    }
}

// ==============================================================================
// 2. Terminal Prompts
// ==============================================================================

/// One buffered reader for the whole run, so piped answers are not swallowed
/// by a reader that is dropped after the first prompt.
pub struct TerminalPrompter {
    stdin: Mutex<BufReader<Stdin>>,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            stdin: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }

    async fn read_line(&self, question: &str) -> Result<String, String> {
        let mut stderr = tokio::io::stderr();
        stderr
            .write_all(question.as_bytes())
            .await
            .map_err(|e| e.to_string())?;
        stderr.flush().await.map_err(|e| e.to_string())?;

        let mut line = String::new();
        let read = self
            .stdin
            .lock()
            .await
            .read_line(&mut line)
            .await
            .map_err(|e| e.to_string())?;
        if read == 0 {
            return Err("stdin closed before an answer was given".into());
        }
        Ok(line.trim().to_string())
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn ask(&self, question: &str) -> Result<String, String> {
        self.read_line(&format!("{}: ", question)).await
    }

    async fn confirm(&self, question: &str) -> Result<bool, String> {
        let answer = self.read_line(&format!("{} [y/N]: ", question)).await?;
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}

// ==============================================================================
// 3. Kernel Tunables
// ==============================================================================

pub struct SysctlTuner;

#[async_trait]
impl KernelTuner for SysctlTuner {
    async fn reload_parameters(&self) -> Result<(), String> {
        run_checked("sysctl", &["--system"]).await.map(|_| ())
    }
}

// ==============================================================================
// 4. Tunnel Bootstrap Script
// ==============================================================================

pub struct ScriptBootstrap;

#[async_trait]
impl TunnelBootstrap for ScriptBootstrap {
    async fn install_latest(&self, installer_url: &str) -> Result<(), String> {
        // Process substitution needs bash; the URL comes from our own config.
        let script = format!("bash <(curl -fsSL {})", installer_url);
        run_checked("bash", &["-c", &script]).await.map(|_| ())
    }
}

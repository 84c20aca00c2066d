// src/sys/secrets.rs

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use secrecy::{ExposeSecret, SecretString};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;
use zeroize::Zeroizing;

/// Raw entropy behind a generated secret.
pub const SECRET_BYTES: usize = 24;

/// SharedSecret holds the tunnel password from the moment it is resolved until
/// it is rendered into the tunnel config and the client snippet.
///
/// 1. `Debug` prints `[REDACTED]`, so a request can be traced without leaking it.
/// 2. The backing buffer is zeroized when the value is dropped.
pub struct SharedSecret {
    value: SecretString,
}

impl SharedSecret {
    pub fn new(value: String) -> Self {
        Self {
            value: SecretString::new(value),
        }
    }

    /// 24 bytes from the OS RNG, URL-safe base64 without padding (32 chars).
    pub fn generate() -> Self {
        Self::generate_from(&mut OsRng)
    }

    fn generate_from(primary: &mut dyn RngCore) -> Self {
        let mut raw = Zeroizing::new([0u8; SECRET_BYTES]);
        fill_secret_bytes(primary, &mut raw[..]);
        Self::new(URL_SAFE_NO_PAD.encode(&raw[..]))
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    /// Exposes the plaintext only for the duration of `action`.
    pub fn use_secret<F, R>(&self, action: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        action(self.value.expose_secret())
    }
}

/// Fills `out` from `primary`. If that fails, falls back to a `StdRng` seeded
/// from clock, pid and stack address. `thread_rng` is no fallback here: it seeds
/// itself from the same OS source and panics when that source is down.
fn fill_secret_bytes(primary: &mut dyn RngCore, out: &mut [u8]) {
    if let Err(e) = primary.try_fill_bytes(out) {
        warn!("OS random source unavailable ({}), falling back to a weaker seeded RNG", e);
        StdRng::seed_from_u64(fallback_seed()).fill_bytes(out);
    }
}

fn fallback_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let marker = 0u8;
    let address = &marker as *const u8 as u64;
    nanos ^ (u64::from(std::process::id()) << 32) ^ address.rotate_left(17)
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

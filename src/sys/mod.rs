// Capability contracts live in `traits`; every other module is one Linux backend.

pub mod traits;     // Global contracts
pub mod command;    // External process execution
pub mod secrets;    // Memory hygiene (SharedSecret)
pub mod host;       // Identity, prompts, sysctl, tunnel bootstrap
pub mod packages;   // apt-get
pub mod systemd;    // Service units
pub mod proxy;      // Ingress (Nginx)
pub mod ssl;        // Certificate issuance (certbot)
pub mod firewall;   // Network policy enforcement (ufw)

#[cfg(test)]
pub mod fake;       // Recording stand-in for all of the above

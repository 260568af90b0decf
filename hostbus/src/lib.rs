//! Typed, cached D-Bus proxies for the daemons that manage a Linux host.
//!
//! This crate maps a handful of system services onto local objects:
//!
//! - systemd: boot timing, power control, unit start/stop/reload
//! - systemd-logind: power control without interactive authorization
//! - systemd-timedated: clock, time zone and NTP
//! - Home Assistant OS-Agent: diagnostics and AppArmor profile loading
//! - NetworkManager: connectivity, activation and saved-profile editing
//!
//! Each object caches the properties of its interface and exposes them
//! through typed accessors. Commands go straight to the daemon.
//!
//! # Example
//!
//! ```no_run
//! use hostbus::HostBus;
//!
//! # async fn example() -> hostbus::Result<()> {
//! let mut host = HostBus::system().await?;
//! host.connect().await?;
//!
//! println!("NTP synchronized: {}", host.timedate().ntp_synchronized()?);
//! println!("AppArmor parser: {}", host.agent().apparmor().version()?);
//! # Ok(())
//! # }
//! ```
//!
//! # Lifecycle
//!
//! A proxy object starts unattached with an empty property snapshot.
//! Attaching resolves its bus handle; refreshing replaces the snapshot in
//! one atomic swap. Until then:
//!
//! - accessors fail with [`ProxyError::PropertyUnavailable`];
//! - commands fail with [`ProxyError::NotConnected`] without touching the
//!   bus.
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`](Result), whose error type is
//! [`ProxyError`]. Errors reported by a daemon are passed through unchanged
//! as [`ProxyError::Remote`]; nothing is retried.
//!
//! # Testing
//!
//! [`bus::MemoryBus`] implements the transport in-process and records every
//! remote call, so code built on [`HostBus`] can be exercised without a
//! running bus.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging. To see
//! log output, add a logging implementation like `env_logger`. For example:
//!
//! ```no_run,ignore
//! env_logger::init();
//! // ...
//! ```

// Public API modules
pub mod api;
pub mod bus;
pub mod core;
pub mod services;
pub mod types;

// Re-exported public API
pub use api::config::{BusAddress, HostBusConfig};
pub use api::host_bus::{ConnectReport, HostBus};
pub use api::models::{
    ActiveConnectionState, Attachment, ConnectionProperties, Connectivity, EthernetProperties,
    IpProperties, ProxyError, SettingsProfile, StartMode, UnitInfo, Version, VersionParseError,
    VlanProperties, WirelessProperties, WirelessSecurityProperties,
};
pub use crate::core::settings_merge::{MergePolicy, SectionRule, SettingsDocument};

/// A specialized `Result` type for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use zvariant::{OwnedObjectPath, Type};

/// Errors produced by proxy objects and the services built on them.
///
/// The variants separate local precondition failures (`NotConnected`,
/// `PropertyUnavailable`) from remote ones (`Remote`), so callers can tell
/// "not attached yet" apart from "the daemon said no".
///
/// # Examples
///
/// ```no_run
/// use hostbus::{HostBus, ProxyError};
///
/// # async fn example() -> hostbus::Result<()> {
/// let mut host = HostBus::system().await?;
/// host.connect().await?;
///
/// match host.logind().reboot().await {
///     Ok(()) => println!("rebooting"),
///     Err(ProxyError::NotConnected) => eprintln!("logind is not available on this host"),
///     Err(e) => eprintln!("reboot failed: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Error)]
pub enum ProxyError {
    /// A guarded operation was invoked before the proxy was attached.
    #[error("not connected to D-Bus object")]
    NotConnected,

    /// The named service is not present on the bus.
    #[error("D-Bus service {service} is not available")]
    ServiceUnavailable { service: String },

    /// The service is present but the object does not implement the interface.
    #[error("D-Bus service {service} does not provide interface {interface}")]
    InterfaceUnavailable { service: String, interface: String },

    /// The property has not been fetched yet or is absent from the last snapshot.
    #[error("property {0} is not available")]
    PropertyUnavailable(String),

    /// A raw property value could not be converted to its typed form.
    #[error("failed to decode property {property}: {reason}")]
    Decoding { property: String, reason: String },

    /// The remote service reported a version older than required.
    #[error("{service} version {found} is older than the required {minimum}")]
    VersionUnsupported {
        service: String,
        found: Version,
        minimum: Version,
    },

    /// Any failure reported by the transport during a property fetch or method call.
    #[error("D-Bus error: {0}")]
    Remote(#[from] zbus::Error),
}

impl ProxyError {
    pub(crate) fn decoding(property: &str, reason: impl Into<String>) -> Self {
        Self::Decoding {
            property: property.to_owned(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for the attachment failures that leave an optional
    /// service degraded instead of failing the host.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable { .. } | Self::InterfaceUnavailable { .. }
        )
    }
}

/// Outcome of attaching a proxy object to its remote counterpart.
#[derive(Debug)]
pub enum Attachment {
    /// A bus handle was obtained; guarded operations are now allowed.
    Attached,
    /// The service or interface is missing. The object stays unattached and
    /// every guarded call fails with [`ProxyError::NotConnected`].
    Degraded(ProxyError),
}

impl Attachment {
    pub fn is_attached(&self) -> bool {
        matches!(self, Self::Attached)
    }
}

/// A dotted numeric version such as `1.22.10`.
///
/// Only the leading numeric components take part in comparisons; anything
/// after them (`-dev`, `~rc1`) is kept for display only. Missing trailing
/// components compare as zero, so `1.14` equals `1.14.0`.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    parts: Vec<u64>,
}

impl Version {
    /// Builds a version from numeric components.
    pub fn new(parts: &[u64]) -> Self {
        let raw = parts
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        Self {
            raw,
            parts: parts.to_vec(),
        }
    }

    /// The numeric components used for ordering.
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    /// The version string as reported by the service.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn component(&self, idx: usize) -> u64 {
        self.parts.get(idx).copied().unwrap_or(0)
    }
}

/// Error returned when a version string has no leading numeric component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version string: {0:?}")]
pub struct VersionParseError(pub String);

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut parts = Vec::new();

        for segment in trimmed.split('.') {
            let digits: String = segment.chars().take_while(char::is_ascii_digit).collect();
            if digits.is_empty() {
                break;
            }
            match digits.parse::<u64>() {
                Ok(n) => parts.push(n),
                Err(_) => return Err(VersionParseError(s.to_owned())),
            }
            if digits.len() != segment.len() {
                break;
            }
        }

        if parts.is_empty() {
            return Err(VersionParseError(s.to_owned()));
        }

        Ok(Self {
            raw: trimmed.to_owned(),
            parts,
        })
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        other.parse::<Version>().is_ok_and(|v| v == *self)
    }
}

/// NetworkManager global connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// Connectivity checks are disabled or have not run.
    Unknown,
    /// The host is not connected to any network.
    None,
    /// Behind a captive portal.
    Portal,
    /// Connected, but no route to the internet.
    Limited,
    /// Full internet access.
    Full,
    /// Code not mapped to a specific variant.
    Other(u32),
}

impl From<u32> for Connectivity {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Unknown,
            1 => Self::None,
            2 => Self::Portal,
            3 => Self::Limited,
            4 => Self::Full,
            v => Self::Other(v),
        }
    }
}

impl Display for Connectivity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::None => write!(f, "none"),
            Self::Portal => write!(f, "portal"),
            Self::Limited => write!(f, "limited"),
            Self::Full => write!(f, "full"),
            Self::Other(v) => write!(f, "unknown connectivity ({v})"),
        }
    }
}

/// NetworkManager active connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveConnectionState {
    Unknown,
    Activating,
    Activated,
    Deactivating,
    Deactivated,
    Other(u32),
}

impl From<u32> for ActiveConnectionState {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Unknown,
            1 => Self::Activating,
            2 => Self::Activated,
            3 => Self::Deactivating,
            4 => Self::Deactivated,
            v => Self::Other(v),
        }
    }
}

impl Display for ActiveConnectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Activating => write!(f, "activating"),
            Self::Activated => write!(f, "activated"),
            Self::Deactivating => write!(f, "deactivating"),
            Self::Deactivated => write!(f, "deactivated"),
            Self::Other(v) => write!(f, "unknown state ({v})"),
        }
    }
}

/// One row of systemd's `ListUnits` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct UnitInfo {
    pub name: String,
    pub description: String,
    pub load_state: String,
    pub active_state: String,
    pub sub_state: String,
    pub following: String,
    pub object_path: OwnedObjectPath,
    pub job_id: u32,
    pub job_type: String,
    pub job_path: OwnedObjectPath,
}

/// Job mode passed to systemd unit control methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMode {
    /// Queue the job, replacing conflicting queued jobs.
    #[default]
    Replace,
    /// Fail if the job conflicts with a queued one.
    Fail,
    /// Stop everything else (`isolate`).
    Isolate,
    /// Ignore unit dependencies.
    IgnoreDependencies,
    /// Ignore ordering and requirement dependencies.
    IgnoreRequirements,
}

impl StartMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Fail => "fail",
            Self::Isolate => "isolate",
            Self::IgnoreDependencies => "ignore-dependencies",
            Self::IgnoreRequirements => "ignore-requirements",
        }
    }
}

impl Display for StartMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `connection` section of a settings document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionProperties {
    pub id: Option<String>,
    pub uuid: Option<String>,
    pub connection_type: Option<String>,
    pub interface_name: Option<String>,
}

/// `802-3-ethernet` section of a settings document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EthernetProperties {
    pub assigned_mac: Option<String>,
}

/// `802-11-wireless` section of a settings document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WirelessProperties {
    /// SSID decoded as strict UTF-8.
    pub ssid: Option<String>,
    pub assigned_mac: Option<String>,
    pub mode: Option<String>,
    pub powersave: Option<u32>,
}

/// `802-11-wireless-security` section of a settings document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WirelessSecurityProperties {
    pub auth_alg: Option<String>,
    pub key_mgmt: Option<String>,
    pub psk: Option<String>,
}

/// `vlan` section of a settings document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VlanProperties {
    pub id: Option<u32>,
    pub parent: Option<String>,
}

/// `ipv4` or `ipv6` section of a settings document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IpProperties {
    pub method: Option<String>,
}

/// Typed view of a connection profile.
///
/// Each field is `None` exactly when the corresponding section is missing
/// from the document. A present section always yields `Some`, even when
/// every field inside it is absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsProfile {
    pub connection: Option<ConnectionProperties>,
    pub ethernet: Option<EthernetProperties>,
    pub wireless: Option<WirelessProperties>,
    pub wireless_security: Option<WirelessSecurityProperties>,
    pub vlan: Option<VlanProperties>,
    pub ipv4: Option<IpProperties>,
    pub ipv6: Option<IpProperties>,
}

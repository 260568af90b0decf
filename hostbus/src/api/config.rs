use crate::api::models::Version;
use crate::bus::ZbusFactory;
use crate::core::settings_merge::MergePolicy;
use crate::Result;

/// Which message bus to connect to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BusAddress {
    /// The system bus, where the host daemons live.
    #[default]
    System,
    Session,
    /// An explicit D-Bus address, e.g. `unix:path=/run/dbus/system_bus_socket`.
    Address(String),
}

impl BusAddress {
    /// Opens a `zbus` connection to this bus.
    pub async fn connect(&self) -> Result<ZbusFactory> {
        match self {
            Self::System => ZbusFactory::system().await,
            Self::Session => ZbusFactory::session().await,
            Self::Address(address) => ZbusFactory::address(address).await,
        }
    }
}

/// Settings for a [`HostBus`](crate::HostBus).
///
/// # Example
///
/// ```
/// use hostbus::{BusAddress, HostBusConfig, Version};
///
/// let config = HostBusConfig::default()
///     .with_bus(BusAddress::Session)
///     .with_network_manager_min_version(Version::new(&[1, 20]));
///
/// assert_eq!(config.bus, BusAddress::Session);
/// assert_eq!(config.network_manager_min_version, "1.20.0");
/// ```
#[derive(Debug, Clone)]
pub struct HostBusConfig {
    pub bus: BusAddress,
    /// Oldest NetworkManager accepted during [`HostBus::connect`](crate::HostBus::connect).
    /// Defaults to `1.14.6`.
    pub network_manager_min_version: Version,
    /// How connection profile updates are merged.
    pub merge_policy: MergePolicy,
}

impl Default for HostBusConfig {
    fn default() -> Self {
        Self {
            bus: BusAddress::default(),
            network_manager_min_version: Version::new(&[1, 14, 6]),
            merge_policy: MergePolicy::default(),
        }
    }
}

impl HostBusConfig {
    #[must_use]
    pub fn with_bus(mut self, bus: BusAddress) -> Self {
        self.bus = bus;
        self
    }

    #[must_use]
    pub fn with_network_manager_min_version(mut self, version: Version) -> Self {
        self.network_manager_min_version = version;
        self
    }

    #[must_use]
    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }
}

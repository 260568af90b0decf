//! NetworkManager objects.
//!
//! Only the manager is a well-known singleton. Devices, access points,
//! active connections and saved profiles are discovered through it and
//! attached on demand.

pub mod access_point;
pub mod active_connection;
pub mod manager;
pub mod setting;
pub mod wireless;

pub use access_point::{AccessPoint, AccessPointInterface};
pub use active_connection::{ActiveConnection, ActiveConnectionInterface};
pub use manager::{NetworkManager, NetworkManagerInterface};
pub use setting::{NetworkSetting, SettingsConnectionInterface};
pub use wireless::{WirelessDevice, WirelessInterface};

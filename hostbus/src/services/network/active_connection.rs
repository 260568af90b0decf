use crate::api::models::ActiveConnectionState;
use crate::bus::{BusHandle, ZbusHandle};
use crate::core::convert;
use crate::core::proxy::{Interface, ProxyObject};
use crate::types::constants::network;
use crate::Result;

/// `org.freedesktop.NetworkManager.Connection.Active`.
#[derive(Debug)]
pub struct ActiveConnectionInterface;

impl Interface for ActiveConnectionInterface {
    const SERVICE: &'static str = network::SERVICE;
    const NAME: &'static str = network::ACTIVE_CONNECTION;
}

/// A connection profile currently applied to a device.
pub type ActiveConnection<H = ZbusHandle> = ProxyObject<H, ActiveConnectionInterface>;

impl<H: BusHandle> ProxyObject<H, ActiveConnectionInterface> {
    pub fn state(&self) -> Result<ActiveConnectionState> {
        self.property(network::STATE, convert::uint32)
            .map(ActiveConnectionState::from)
    }

    pub fn id(&self) -> Result<String> {
        self.property(network::ID, convert::text)
    }

    pub fn uuid(&self) -> Result<String> {
        self.property(network::UUID, convert::text)
    }

    /// Path of the settings object this connection was activated from.
    pub fn setting_object(&self) -> Result<String> {
        self.property(network::CONNECTION, convert::object_path)
    }
}

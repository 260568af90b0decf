use crate::bus::{BusHandle, ZbusHandle};
use crate::core::convert;
use crate::core::proxy::{Interface, ProxyObject};
use crate::types::constants::network;
use crate::Result;

/// `org.freedesktop.NetworkManager.AccessPoint`.
#[derive(Debug)]
pub struct AccessPointInterface;

impl Interface for AccessPointInterface {
    const SERVICE: &'static str = network::SERVICE;
    const NAME: &'static str = network::ACCESS_POINT;
}

/// A Wi-Fi access point seen by a wireless device.
pub type AccessPoint<H = ZbusHandle> = ProxyObject<H, AccessPointInterface>;

impl<H: BusHandle> ProxyObject<H, AccessPointInterface> {
    /// Network name. Fails on SSIDs that are not valid UTF-8.
    pub fn ssid(&self) -> Result<String> {
        self.property(network::SSID, convert::byte_text)
    }

    /// Radio frequency in MHz.
    pub fn frequency(&self) -> Result<u32> {
        self.property(network::FREQUENCY, convert::uint32)
    }

    /// BSSID.
    pub fn mac(&self) -> Result<String> {
        self.property(network::HW_ADDRESS, convert::text)
    }

    /// `NM80211Mode` code (1 = ad-hoc, 2 = infrastructure, 3 = AP).
    pub fn mode(&self) -> Result<u32> {
        self.property(network::MODE, convert::uint32)
    }

    /// Signal quality in percent.
    pub fn strength(&self) -> Result<u8> {
        self.property(network::STRENGTH, convert::uint8)
    }
}

use log::debug;
use zvariant::OwnedObjectPath;

use crate::bus::{BusFactory, BusHandle, ZbusHandle};
use crate::core::proxy::{Interface, ProxyObject};
use crate::services::network::access_point::AccessPoint;
use crate::types::constants::network;
use crate::Result;

/// `org.freedesktop.NetworkManager.Device.Wireless`.
#[derive(Debug)]
pub struct WirelessInterface;

impl Interface for WirelessInterface {
    const SERVICE: &'static str = network::SERVICE;
    const NAME: &'static str = network::WIRELESS_DEVICE;
}

/// A Wi-Fi device.
pub type WirelessDevice<H = ZbusHandle> = ProxyObject<H, WirelessInterface>;

impl<H: BusHandle> ProxyObject<H, WirelessInterface> {
    /// Every access point the device currently knows about, attached and
    /// populated.
    ///
    /// An access point that disappears between enumeration and attachment
    /// fails the whole call.
    pub async fn access_points<F>(&self, bus: &F) -> Result<Vec<AccessPoint<H>>>
    where
        F: BusFactory<Handle = H>,
    {
        let paths: Vec<OwnedObjectPath> = self.call("GetAllAccessPoints", &()).await?;
        debug!("{} reports {} access points", self.path(), paths.len());

        let mut access_points = Vec::with_capacity(paths.len());
        for path in paths {
            let mut ap = AccessPoint::<H>::discovered(path.as_str());
            ap.attach(bus).await?;
            access_points.push(ap);
        }
        Ok(access_points)
    }
}

use log::debug;

use crate::bus::{BusHandle, ZbusHandle};
use crate::core::proxy::{Interface, ProxyObject, Singleton};
use crate::types::constants::logind;
use crate::Result;

/// `org.freedesktop.login1.Manager`.
#[derive(Debug)]
pub struct LogindManager;

impl Interface for LogindManager {
    const SERVICE: &'static str = logind::SERVICE;
    const NAME: &'static str = logind::MANAGER;
}

impl Singleton for LogindManager {
    const PATH: &'static str = logind::PATH;
}

/// The login manager. Only its power commands are used; it is never
/// refreshed.
pub type Logind<H = ZbusHandle> = ProxyObject<H, LogindManager>;

impl<H: BusHandle> ProxyObject<H, LogindManager> {
    /// Reboots without asking for interactive authorization.
    pub async fn reboot(&self) -> Result<()> {
        debug!("Requesting reboot through logind");
        self.call("Reboot", &(false,)).await
    }

    /// Powers off without asking for interactive authorization.
    pub async fn power_off(&self) -> Result<()> {
        debug!("Requesting power off through logind");
        self.call("PowerOff", &(false,)).await
    }
}

use chrono::{DateTime, Utc};
use log::debug;
use zvariant::OwnedObjectPath;

use crate::api::models::{StartMode, UnitInfo};
use crate::bus::{BusHandle, ZbusHandle};
use crate::core::convert;
use crate::core::proxy::{Interface, ProxyObject, Singleton};
use crate::types::constants::systemd;
use crate::Result;

/// `org.freedesktop.systemd1.Manager` on the system manager object.
#[derive(Debug)]
pub struct SystemdManager;

impl Interface for SystemdManager {
    const SERVICE: &'static str = systemd::SERVICE;
    const NAME: &'static str = systemd::MANAGER;
}

impl Singleton for SystemdManager {
    const PATH: &'static str = systemd::PATH;
}

/// The systemd service manager.
pub type Systemd<H = ZbusHandle> = ProxyObject<H, SystemdManager>;

impl<H: BusHandle> ProxyObject<H, SystemdManager> {
    /// Seconds from power-on until userspace finished booting.
    ///
    /// Sum of the firmware, loader, kernel and userspace monotonic
    /// timestamps.
    pub fn startup_time(&self) -> Result<f64> {
        let components = [
            systemd::FIRMWARE_TIMESTAMP_MONOTONIC,
            systemd::LOADER_TIMESTAMP_MONOTONIC,
            systemd::KERNEL_TIMESTAMP_MONOTONIC,
            systemd::USERSPACE_TIMESTAMP_MONOTONIC,
        ]
        .into_iter()
        .map(|name| Ok((name, self.property(name, convert::uint64)?)))
        .collect::<Result<Vec<_>>>()?;

        convert::seconds_from_usec(&components)
    }

    /// Wall-clock time at which boot finished.
    pub fn boot_timestamp(&self) -> Result<DateTime<Utc>> {
        self.property(systemd::FINISH_TIMESTAMP, convert::usec_datetime)
    }

    pub async fn reboot(&self) -> Result<()> {
        debug!("Requesting reboot through systemd");
        self.call("Reboot", &()).await
    }

    pub async fn power_off(&self) -> Result<()> {
        debug!("Requesting power off through systemd");
        self.call("PowerOff", &()).await
    }

    /// Starts `unit`. Returns the object path of the queued job.
    pub async fn start_unit(&self, unit: &str, mode: StartMode) -> Result<String> {
        self.unit_job("StartUnit", unit, mode).await
    }

    pub async fn stop_unit(&self, unit: &str, mode: StartMode) -> Result<String> {
        self.unit_job("StopUnit", unit, mode).await
    }

    /// Reloads `unit` if it supports reloading, restarts it otherwise.
    pub async fn reload_unit(&self, unit: &str, mode: StartMode) -> Result<String> {
        self.unit_job("ReloadOrRestartUnit", unit, mode).await
    }

    pub async fn restart_unit(&self, unit: &str, mode: StartMode) -> Result<String> {
        self.unit_job("RestartUnit", unit, mode).await
    }

    /// Every unit currently loaded by the manager.
    pub async fn list_units(&self) -> Result<Vec<UnitInfo>> {
        self.call("ListUnits", &()).await
    }

    async fn unit_job(&self, method: &str, unit: &str, mode: StartMode) -> Result<String> {
        debug!("{method} {unit} ({mode})");
        let job: OwnedObjectPath = self.call(method, &(unit, mode.as_str())).await?;
        Ok(job.as_str().to_owned())
    }
}

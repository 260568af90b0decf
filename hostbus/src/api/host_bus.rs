use log::{debug, info, warn};

use crate::api::config::HostBusConfig;
use crate::api::models::{Attachment, ProxyError};
use crate::bus::{BusFactory, ZbusFactory};
use crate::core::proxy::ProxyObject;
use crate::core::settings_merge::SettingsDocument;
use crate::services::network::{
    AccessPoint, ActiveConnection, NetworkManager, NetworkSetting, WirelessDevice,
};
use crate::services::{Logind, OsAgent, Systemd, TimeDate};
use crate::types::constants::{logind, network, systemd, timedate};
use crate::Result;

/// What [`HostBus::connect`] managed to attach.
#[derive(Debug, Default)]
pub struct ConnectReport {
    /// Services that are attached and usable. OS-Agent objects are listed
    /// by interface name, since each one attaches on its own.
    pub attached: Vec<&'static str>,
    /// Services or OS-Agent objects left unattached, with the reason.
    pub degraded: Vec<(&'static str, ProxyError)>,
}

impl ConnectReport {
    /// `true` when every service attached.
    pub fn is_complete(&self) -> bool {
        self.degraded.is_empty()
    }

    fn record(&mut self, service: &'static str, attachment: Attachment) {
        match attachment {
            Attachment::Attached => self.attached.push(service),
            Attachment::Degraded(reason) => {
                match &reason {
                    ProxyError::InterfaceUnavailable { .. } => {
                        info!("No {service} support on the host: {reason}");
                    }
                    _ => warn!("Can't connect to {service}: {reason}"),
                }
                self.degraded.push((service, reason));
            }
        }
    }
}

/// Entry point: the host daemons this crate knows about, on one bus.
///
/// All daemons are optional. A daemon that is not running, or does not
/// implement the expected interface, is reported by [`connect`](Self::connect)
/// and every command sent to it afterwards fails with
/// [`ProxyError::NotConnected`].
///
/// # Example
///
/// ```no_run
/// use hostbus::HostBus;
///
/// # async fn example() -> hostbus::Result<()> {
/// let mut host = HostBus::system().await?;
/// let report = host.connect().await?;
/// if !report.is_complete() {
///     eprintln!("running with reduced host support");
/// }
///
/// println!("booted in {:.1}s", host.systemd().startup_time()?);
/// println!("time zone: {}", host.timedate().timezone()?);
/// # Ok(())
/// # }
/// ```
pub struct HostBus<F: BusFactory = ZbusFactory> {
    bus: F,
    config: HostBusConfig,
    systemd: Systemd<F::Handle>,
    logind: Logind<F::Handle>,
    timedate: TimeDate<F::Handle>,
    agent: OsAgent<F::Handle>,
    network: NetworkManager<F::Handle>,
}

impl HostBus<ZbusFactory> {
    /// Connects to the system bus with the default configuration.
    ///
    /// Only the bus connection is opened; call [`connect`](Self::connect)
    /// to attach the daemons.
    pub async fn system() -> Result<Self> {
        Self::from_config(HostBusConfig::default()).await
    }

    /// Connects to the bus named in `config`.
    pub async fn from_config(config: HostBusConfig) -> Result<Self> {
        let bus = config.bus.connect().await?;
        Ok(Self::new(bus, config))
    }
}

impl<F: BusFactory> HostBus<F> {
    /// Wraps an already opened bus. Nothing is attached yet.
    pub fn new(bus: F, config: HostBusConfig) -> Self {
        Self {
            bus,
            config,
            systemd: ProxyObject::owned(),
            logind: ProxyObject::owned(),
            timedate: ProxyObject::owned(),
            agent: OsAgent::new(),
            network: ProxyObject::owned(),
        }
    }

    /// Attaches every daemon, loads their properties and checks the
    /// NetworkManager version.
    ///
    /// Missing daemons are logged and listed in the report rather than
    /// failing the call.
    ///
    /// # Errors
    ///
    /// Transport failures other than a missing service or interface, and
    /// [`ProxyError::VersionUnsupported`] when NetworkManager is older than
    /// the configured minimum. In the latter case every other daemon is
    /// already attached and usable.
    pub async fn connect(&mut self) -> Result<ConnectReport> {
        let mut report = ConnectReport::default();

        report.record(systemd::SERVICE, self.systemd.attach(&self.bus).await?);
        report.record(logind::SERVICE, self.logind.attach(&self.bus).await?);
        report.record(timedate::SERVICE, self.timedate.attach(&self.bus).await?);
        for (object, attachment) in self.agent.attach(&self.bus).await? {
            report.record(object, attachment);
        }
        report.record(network::SERVICE, self.network.attach(&self.bus).await?);

        self.refresh().await?;

        if self.network.is_attached()
            && let Err(e) = self
                .network
                .validate_version(&self.config.network_manager_min_version)
        {
            warn!("Host NetworkManager is not supported: {e}");
            return Err(e);
        }

        debug!(
            "Connected {} services, {} degraded",
            report.attached.len(),
            report.degraded.len()
        );
        Ok(report)
    }

    /// Re-reads the properties of every attached daemon.
    pub async fn refresh(&self) -> Result<()> {
        if self.systemd.is_attached() {
            self.systemd.refresh().await?;
        }
        if self.timedate.is_attached() {
            self.timedate.refresh().await?;
        }
        if self.agent.is_attached() {
            self.agent.refresh().await?;
        }
        if self.network.is_attached() {
            self.network.refresh().await?;
        }
        Ok(())
    }

    pub fn bus(&self) -> &F {
        &self.bus
    }

    pub fn config(&self) -> &HostBusConfig {
        &self.config
    }

    pub fn systemd(&self) -> &Systemd<F::Handle> {
        &self.systemd
    }

    pub fn logind(&self) -> &Logind<F::Handle> {
        &self.logind
    }

    pub fn timedate(&self) -> &TimeDate<F::Handle> {
        &self.timedate
    }

    pub fn agent(&self) -> &OsAgent<F::Handle> {
        &self.agent
    }

    pub fn network(&self) -> &NetworkManager<F::Handle> {
        &self.network
    }

    /// Attaches the access point at `path`.
    pub async fn access_point(&self, path: &str) -> Result<AccessPoint<F::Handle>> {
        let mut ap = AccessPoint::<F::Handle>::discovered(path);
        ap.attach(&self.bus).await?;
        Ok(ap)
    }

    /// Attaches the wireless device at `path`.
    pub async fn wireless_device(&self, path: &str) -> Result<WirelessDevice<F::Handle>> {
        let mut device = WirelessDevice::<F::Handle>::discovered(path);
        device.attach(&self.bus).await?;
        Ok(device)
    }

    /// Attaches the active connection at `path`.
    pub async fn active_connection(&self, path: &str) -> Result<ActiveConnection<F::Handle>> {
        let mut connection = ActiveConnection::<F::Handle>::discovered(path);
        connection.attach(&self.bus).await?;
        Ok(connection)
    }

    /// Attaches the saved profile at `path` and loads it.
    pub async fn network_setting(&self, path: &str) -> Result<NetworkSetting<F::Handle>> {
        let mut setting = NetworkSetting::new(path, self.config.merge_policy.clone());
        setting.attach(&self.bus).await?;
        Ok(setting)
    }

    /// Activates the saved profile at `settings` on `device` and attaches
    /// the resulting active connection.
    pub async fn activate_connection(
        &self,
        settings: &str,
        device: &str,
    ) -> Result<ActiveConnection<F::Handle>> {
        self.network
            .activate_connection(&self.bus, settings, device)
            .await
    }

    /// Saves `settings` as a new profile, activates it on `device` and
    /// attaches both resulting objects. The profile uses the configured
    /// merge policy.
    pub async fn add_and_activate_connection(
        &self,
        settings: &SettingsDocument,
        device: &str,
    ) -> Result<(NetworkSetting<F::Handle>, ActiveConnection<F::Handle>)> {
        self.network
            .add_and_activate_connection(
                &self.bus,
                settings,
                device,
                self.config.merge_policy.clone(),
            )
            .await
    }
}

impl<F: BusFactory> std::fmt::Debug for HostBus<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBus")
            .field("systemd", &self.systemd)
            .field("logind", &self.logind)
            .field("timedate", &self.timedate)
            .field("agent", &self.agent.is_attached())
            .field("network", &self.network)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

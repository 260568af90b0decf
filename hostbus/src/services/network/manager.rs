use log::debug;
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue};

use crate::api::models::{Connectivity, ProxyError, Version};
use crate::bus::{BusFactory, BusHandle, SignatureMode, ZbusHandle};
use crate::core::convert;
use crate::core::proxy::{Interface, ProxyObject, Singleton};
use crate::core::settings_merge::{MergePolicy, SettingsDocument};
use crate::services::network::active_connection::ActiveConnection;
use crate::services::network::setting::NetworkSetting;
use crate::types::constants::{freedesktop, network};
use crate::Result;

/// `org.freedesktop.NetworkManager` on the manager's root object.
#[derive(Debug)]
pub struct NetworkManagerInterface;

impl Interface for NetworkManagerInterface {
    const SERVICE: &'static str = network::SERVICE;
    const NAME: &'static str = network::INTERFACE;
}

impl Singleton for NetworkManagerInterface {
    const PATH: &'static str = network::PATH;
}

/// The NetworkManager daemon.
pub type NetworkManager<H = ZbusHandle> = ProxyObject<H, NetworkManagerInterface>;

fn object_path(path: &str) -> Result<ObjectPath<'_>> {
    ObjectPath::try_from(path).map_err(|e| ProxyError::Remote(e.into()))
}

impl<H: BusHandle> ProxyObject<H, NetworkManagerInterface> {
    pub fn version(&self) -> Result<Version> {
        self.property(network::VERSION, convert::version)
    }

    /// Checks the cached daemon version against `minimum`.
    ///
    /// # Errors
    ///
    /// [`ProxyError::VersionUnsupported`] when the daemon is older than
    /// `minimum`; [`ProxyError::PropertyUnavailable`] before the first
    /// refresh.
    pub fn validate_version(&self, minimum: &Version) -> Result<Version> {
        let found = self.version()?;
        if found < *minimum {
            return Err(ProxyError::VersionUnsupported {
                service: network::SERVICE.to_owned(),
                found,
                minimum: minimum.clone(),
            });
        }
        debug!("NetworkManager {found} satisfies minimum {minimum}");
        Ok(found)
    }

    /// Connectivity state as of the last refresh.
    pub fn connectivity(&self) -> Result<Connectivity> {
        self.property(network::CONNECTIVITY, convert::uint32)
            .map(Connectivity::from)
    }

    /// Asks the daemon for its connectivity state.
    ///
    /// With `force` the daemon re-runs its connectivity probe before
    /// answering; otherwise the current `Connectivity` property is read
    /// directly from the daemon, bypassing the snapshot.
    pub async fn check_connectivity(&self, force: bool) -> Result<Connectivity> {
        let code = if force {
            self.call::<_, u32>("CheckConnectivity", &()).await?
        } else {
            let value: OwnedValue = self
                .call_on(
                    freedesktop::PROPERTIES,
                    "Get",
                    &(network::INTERFACE, network::CONNECTIVITY),
                    SignatureMode::Strip,
                )
                .await?;
            convert::uint32(network::CONNECTIVITY, &value)?
        };
        Ok(Connectivity::from(code))
    }

    /// Object paths of every network device.
    pub fn devices(&self) -> Result<Vec<String>> {
        self.property(network::DEVICES, convert::object_paths)
    }

    /// Object paths of every active connection.
    pub fn active_connections(&self) -> Result<Vec<String>> {
        self.property(network::ACTIVE_CONNECTIONS, convert::object_paths)
    }

    /// Activates the saved profile at `settings` on `device`.
    ///
    /// Returns the resulting active connection, attached and populated.
    pub async fn activate_connection<F>(
        &self,
        bus: &F,
        settings: &str,
        device: &str,
    ) -> Result<ActiveConnection<H>>
    where
        F: BusFactory<Handle = H>,
    {
        debug!("Activating {settings} on {device}");
        let args = (
            object_path(settings)?,
            object_path(device)?,
            object_path(network::NO_OBJECT)?,
        );
        let active: OwnedObjectPath = self.call("ActivateConnection", &args).await?;

        let mut connection = ActiveConnection::<H>::discovered(active.as_str());
        connection.attach(bus).await?;
        Ok(connection)
    }

    /// Saves `settings` as a new profile and activates it on `device`.
    ///
    /// Returns the new profile, loaded under `policy`, and the resulting
    /// active connection.
    pub async fn add_and_activate_connection<F>(
        &self,
        bus: &F,
        settings: &SettingsDocument,
        device: &str,
        policy: MergePolicy,
    ) -> Result<(NetworkSetting<H>, ActiveConnection<H>)>
    where
        F: BusFactory<Handle = H>,
    {
        debug!("Adding and activating a new profile on {device}");
        let args = (
            settings,
            object_path(device)?,
            object_path(network::NO_OBJECT)?,
        );
        let (setting_path, active_path): (OwnedObjectPath, OwnedObjectPath) =
            self.call("AddAndActivateConnection", &args).await?;

        let mut setting = NetworkSetting::new(setting_path.as_str(), policy);
        setting.attach(bus).await?;

        let mut connection = ActiveConnection::<H>::discovered(active_path.as_str());
        connection.attach(bus).await?;

        Ok((setting, connection))
    }
}

//! Saved connection profiles.

use arc_swap::ArcSwapOption;
use log::debug;
use std::sync::Arc;

use crate::api::models::{
    Attachment, ConnectionProperties, EthernetProperties, IpProperties, ProxyError,
    SettingsProfile, VlanProperties, WirelessProperties, WirelessSecurityProperties,
};
use crate::bus::{BusFactory, BusHandle, SignatureMode, ZbusHandle};
use crate::core::projection::project;
use crate::core::proxy::{Interface, ProxyObject};
use crate::core::settings_merge::{merge_settings, MergePolicy, SettingsDocument};
use crate::types::constants::{network, settings};
use crate::Result;

/// `org.freedesktop.NetworkManager.Settings.Connection`.
#[derive(Debug)]
pub struct SettingsConnectionInterface;

impl Interface for SettingsConnectionInterface {
    const SERVICE: &'static str = network::SERVICE;
    const NAME: &'static str = network::SETTINGS_CONNECTION;
}

async fn get_settings<H: BusHandle>(
    proxy: &ProxyObject<H, SettingsConnectionInterface>,
    mode: SignatureMode,
) -> Result<SettingsDocument> {
    proxy
        .call_on(network::SETTINGS_CONNECTION, "GetSettings", &(), mode)
        .await
}

async fn fetch_profile<H: BusHandle>(
    proxy: &ProxyObject<H, SettingsConnectionInterface>,
) -> Result<SettingsProfile> {
    let doc = get_settings(proxy, SignatureMode::Strip).await?;
    project(&doc)
}

/// One saved NetworkManager connection profile.
///
/// Attaching loads the profile with `GetSettings` and keeps a typed
/// projection of it. Changes go through [`NetworkSetting::update`], which
/// re-fetches the profile, overlays the change and writes it back.
///
/// # Example
///
/// ```no_run
/// use hostbus::HostBus;
/// use hostbus::core::settings_merge::SettingsDocument;
/// use std::collections::HashMap;
/// use zvariant::{OwnedValue, Value};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut host = HostBus::system().await?;
/// host.connect().await?;
///
/// let setting = host
///     .network_setting("/org/freedesktop/NetworkManager/Settings/1")
///     .await?;
/// println!("{:?}", setting.ipv4()?);
///
/// let mut intent = SettingsDocument::new();
/// intent.insert(
///     "ipv4".into(),
///     HashMap::from([("method".to_owned(), OwnedValue::try_from(Value::from("manual"))?)]),
/// );
/// setting.update(intent).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct NetworkSetting<H = ZbusHandle> {
    proxy: ProxyObject<H, SettingsConnectionInterface>,
    profile: ArcSwapOption<SettingsProfile>,
    policy: MergePolicy,
}

impl<H: BusHandle> NetworkSetting<H> {
    pub fn new(path: impl Into<String>, policy: MergePolicy) -> Self {
        Self {
            proxy: ProxyObject::discovered(path),
            profile: ArcSwapOption::empty(),
            policy,
        }
    }

    pub fn path(&self) -> &str {
        self.proxy.path()
    }

    pub fn is_attached(&self) -> bool {
        self.proxy.is_attached()
    }

    /// Attaches to the settings object and loads its profile.
    ///
    /// The handle and the profile are installed together. If either step
    /// fails the setting is left unattached and the error is returned.
    pub async fn attach<F>(&mut self, bus: &F) -> Result<Attachment>
    where
        F: BusFactory<Handle = H>,
    {
        let mut proxy = ProxyObject::discovered(self.proxy.path());
        let staged = match proxy.attach(bus).await {
            Ok(attachment) => fetch_profile(&proxy).await.map(|p| (attachment, p)),
            Err(e) => Err(e),
        };

        match staged {
            Ok((attachment, profile)) => {
                self.proxy = proxy;
                self.profile.store(Some(Arc::new(profile)));
                Ok(attachment)
            }
            Err(e) => {
                self.proxy.detach();
                Err(e)
            }
        }
    }

    /// Re-reads the profile and replaces the typed projection.
    pub async fn reload(&self) -> Result<()> {
        let profile = fetch_profile(&self.proxy).await?;
        self.profile.store(Some(Arc::new(profile)));
        Ok(())
    }

    /// The full profile as stored by NetworkManager. Secrets are not
    /// included.
    pub async fn get_settings(&self) -> Result<SettingsDocument> {
        get_settings(&self.proxy, SignatureMode::Strip).await
    }

    /// Applies `intent` to the profile.
    ///
    /// The current profile is fetched fresh, merged with `intent` under this
    /// setting's [`MergePolicy`] and written back with one `Update` call. A
    /// failed fetch or write is returned unchanged and nothing is retried.
    /// The cached projection is left alone; call [`reload`](Self::reload)
    /// to see the result.
    pub async fn update(&self, intent: SettingsDocument) -> Result<()> {
        let current = get_settings(&self.proxy, SignatureMode::Preserve).await?;

        let merged = merge_settings(current, intent, &self.policy);
        debug!(
            "Updating {} ({} sections)",
            self.proxy.path(),
            merged.len()
        );
        self.proxy.call("Update", &(merged,)).await
    }

    /// Removes the profile from NetworkManager.
    pub async fn delete(&self) -> Result<()> {
        debug!("Deleting connection profile {}", self.proxy.path());
        self.proxy.call("Delete", &()).await
    }

    /// The whole projection, if a profile has been loaded.
    pub fn profile(&self) -> Option<Arc<SettingsProfile>> {
        self.profile.load_full()
    }

    fn section<T>(
        &self,
        name: &str,
        pick: impl FnOnce(&SettingsProfile) -> &Option<T>,
    ) -> Result<Option<T>>
    where
        T: Clone,
    {
        let profile = self.profile.load();
        let profile = profile
            .as_deref()
            .ok_or_else(|| ProxyError::PropertyUnavailable(name.to_owned()))?;
        Ok(pick(profile).clone())
    }

    pub fn connection(&self) -> Result<Option<ConnectionProperties>> {
        self.section(settings::CONNECTION, |p| &p.connection)
    }

    pub fn ethernet(&self) -> Result<Option<EthernetProperties>> {
        self.section(settings::ETHERNET, |p| &p.ethernet)
    }

    pub fn wireless(&self) -> Result<Option<WirelessProperties>> {
        self.section(settings::WIRELESS, |p| &p.wireless)
    }

    pub fn wireless_security(&self) -> Result<Option<WirelessSecurityProperties>> {
        self.section(settings::WIRELESS_SECURITY, |p| &p.wireless_security)
    }

    pub fn vlan(&self) -> Result<Option<VlanProperties>> {
        self.section(settings::VLAN, |p| &p.vlan)
    }

    pub fn ipv4(&self) -> Result<Option<IpProperties>> {
        self.section(settings::IPV4, |p| &p.ipv4)
    }

    pub fn ipv6(&self) -> Result<Option<IpProperties>> {
        self.section(settings::IPV6, |p| &p.ipv6)
    }
}

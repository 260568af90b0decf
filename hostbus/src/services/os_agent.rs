//! Home Assistant OS-Agent and its AppArmor child object.

use log::debug;
use zvariant::Value;

use crate::api::models::{Attachment, Version};
use crate::bus::{BusFactory, BusHandle, SignatureMode, ZbusHandle};
use crate::core::convert;
use crate::core::proxy::{Interface, ProxyObject, Singleton};
use crate::types::constants::{freedesktop, os_agent};
use crate::Result;

/// `io.hass.os` on the agent's root object.
#[derive(Debug)]
pub struct AgentInterface;

impl Interface for AgentInterface {
    const SERVICE: &'static str = os_agent::SERVICE;
    const NAME: &'static str = os_agent::INTERFACE;
}

impl Singleton for AgentInterface {
    const PATH: &'static str = os_agent::PATH;
}

/// `io.hass.os.AppArmor`.
#[derive(Debug)]
pub struct AppArmorInterface;

impl Interface for AppArmorInterface {
    const SERVICE: &'static str = os_agent::SERVICE;
    const NAME: &'static str = os_agent::APPARMOR_INTERFACE;
}

impl Singleton for AppArmorInterface {
    const PATH: &'static str = os_agent::APPARMOR_PATH;
}

/// The AppArmor profile loader exposed by OS-Agent.
pub type AppArmor<H = ZbusHandle> = ProxyObject<H, AppArmorInterface>;

impl<H: BusHandle> ProxyObject<H, AppArmorInterface> {
    /// Version of the host's AppArmor parser.
    pub fn version(&self) -> Result<Version> {
        self.property(os_agent::PARSER_VERSION, convert::version)
    }

    /// Loads or replaces the profile at `profile`, caching the compiled
    /// form under `cache`.
    pub async fn load_profile(&self, profile: &str, cache: &str) -> Result<()> {
        debug!("Loading AppArmor profile {profile}");
        self.call("LoadProfile", &(profile, cache)).await
    }

    pub async fn unload_profile(&self, profile: &str, cache: &str) -> Result<()> {
        debug!("Unloading AppArmor profile {profile}");
        self.call("UnloadProfile", &(profile, cache)).await
    }
}

/// OS-Agent root object plus the child objects this crate uses.
#[derive(Debug)]
pub struct OsAgent<H = ZbusHandle> {
    agent: ProxyObject<H, AgentInterface>,
    apparmor: AppArmor<H>,
}

impl<H: BusHandle> Default for OsAgent<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: BusHandle> OsAgent<H> {
    pub fn new() -> Self {
        Self {
            agent: ProxyObject::owned(),
            apparmor: ProxyObject::owned(),
        }
    }

    pub fn apparmor(&self) -> &AppArmor<H> {
        &self.apparmor
    }

    /// The root `io.hass.os` object.
    pub fn agent(&self) -> &ProxyObject<H, AgentInterface> {
        &self.agent
    }

    pub fn is_attached(&self) -> bool {
        self.agent.is_attached()
    }

    /// Attaches the root object, then its children.
    ///
    /// Returns one outcome per object, labelled with its interface name.
    /// Children are neither attempted nor reported when the root itself is
    /// missing, and any previous child handles are dropped.
    pub async fn attach<F>(&mut self, bus: &F) -> Result<Vec<(&'static str, Attachment)>>
    where
        F: BusFactory<Handle = H>,
    {
        let root = self.agent.attach(bus).await?;
        if !root.is_attached() {
            self.apparmor.detach();
            return Ok(vec![(os_agent::INTERFACE, root)]);
        }
        let apparmor = self.apparmor.attach(bus).await?;
        Ok(vec![
            (os_agent::INTERFACE, root),
            (os_agent::APPARMOR_INTERFACE, apparmor),
        ])
    }

    /// Refreshes the root object and every attached child.
    pub async fn refresh(&self) -> Result<()> {
        self.agent.refresh().await?;
        if self.apparmor.is_attached() {
            self.apparmor.refresh().await?;
        }
        Ok(())
    }

    /// Version of the running OS-Agent.
    pub fn version(&self) -> Result<Version> {
        self.agent.property(os_agent::VERSION, convert::version)
    }

    /// Whether diagnostics reporting is enabled.
    pub fn diagnostics(&self) -> Result<bool> {
        self.agent.property(os_agent::DIAGNOSTICS, convert::boolean)
    }

    /// Enables or disables diagnostics reporting.
    ///
    /// Writes the remote property; the cached value changes on the next
    /// refresh.
    pub async fn set_diagnostics(&self, enabled: bool) -> Result<()> {
        debug!("Setting OS-Agent diagnostics to {enabled}");
        self.agent
            .call_on(
                freedesktop::PROPERTIES,
                "Set",
                &(os_agent::INTERFACE, os_agent::DIAGNOSTICS, Value::from(enabled)),
                SignatureMode::Strip,
            )
            .await
    }
}

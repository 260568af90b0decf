//! `zbus`-backed transport.

use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use zbus::proxy::CacheProperties;
use zbus::{Connection, DBusError};
use zbus_xml::Node;
use zvariant::{DynamicType, OwnedObjectPath, Type};

use crate::api::models::ProxyError;
use crate::bus::{BusFactory, BusHandle, PropertyMap, SignatureMode};
use crate::types::constants::freedesktop;
use crate::Result;

/// Error names the bus daemon uses when nobody owns the destination.
const SERVICE_MISSING_ERRORS: [&str; 3] = [
    "org.freedesktop.DBus.Error.ServiceUnknown",
    "org.freedesktop.DBus.Error.NameHasNoOwner",
    "org.freedesktop.DBus.Error.Spawn.ServiceNotFound",
];

/// Error names for a reachable service that does not publish the object.
const OBJECT_MISSING_ERRORS: [&str; 3] = [
    "org.freedesktop.DBus.Error.UnknownObject",
    "org.freedesktop.DBus.Error.UnknownInterface",
    "org.freedesktop.DBus.Error.UnknownMethod",
];

fn error_name(e: &zbus::Error) -> Option<String> {
    match e {
        zbus::Error::MethodError(name, _, _) => Some(name.as_str().to_owned()),
        zbus::Error::FDO(e) => Some(e.name().as_str().to_owned()),
        _ => None,
    }
}

/// Maps a failed `Introspect` to the attachment error it stands for.
fn introspect_error(e: zbus::Error, service: &str, interface: &str) -> ProxyError {
    match error_name(&e).as_deref() {
        Some(name) if SERVICE_MISSING_ERRORS.contains(&name) => ProxyError::ServiceUnavailable {
            service: service.to_owned(),
        },
        Some(name) if OBJECT_MISSING_ERRORS.contains(&name) => ProxyError::InterfaceUnavailable {
            service: service.to_owned(),
            interface: interface.to_owned(),
        },
        _ => e.into(),
    }
}

/// Whether the introspection data of an object lists `interface`.
fn implements(xml: &str, interface: &str) -> Result<bool> {
    let node = Node::from_reader(xml.as_bytes())
        .map_err(|e| ProxyError::Remote(zbus::Error::Failure(e.to_string())))?;
    Ok(node
        .interfaces()
        .iter()
        .any(|i| i.name().as_str() == interface))
}

/// Opens handles over a shared `zbus` connection.
///
/// Cloning is cheap; every clone and every handle shares the same
/// underlying connection.
#[derive(Debug, Clone)]
pub struct ZbusFactory {
    conn: Connection,
}

impl ZbusFactory {
    /// Connects to the system bus.
    pub async fn system() -> Result<Self> {
        Ok(Self::from_connection(Connection::system().await?))
    }

    /// Connects to the session bus.
    pub async fn session() -> Result<Self> {
        Ok(Self::from_connection(Connection::session().await?))
    }

    /// Connects to the bus at `address` (e.g. `unix:path=/run/dbus/system_bus_socket`).
    pub async fn address(address: &str) -> Result<Self> {
        let conn = zbus::connection::Builder::address(address)?.build().await?;
        Ok(Self::from_connection(conn))
    }

    /// Wraps an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[async_trait]
impl BusFactory for ZbusFactory {
    type Handle = ZbusHandle;

    async fn connect(&self, service: &str, path: &str, interface: &str) -> Result<ZbusHandle> {
        let handle = ZbusHandle {
            conn: self.conn.clone(),
            service: service.to_owned(),
            path: OwnedObjectPath::try_from(path.to_owned()).map_err(zbus::Error::from)?,
        };

        let introspectable = handle.proxy(freedesktop::INTROSPECTABLE).await?;
        let xml: String = match introspectable.call_method("Introspect", &()).await {
            Ok(reply) => reply.body().deserialize()?,
            Err(e) => return Err(introspect_error(e, service, interface)),
        };

        if !implements(&xml, interface)? {
            return Err(ProxyError::InterfaceUnavailable {
                service: service.to_owned(),
                interface: interface.to_owned(),
            });
        }

        debug!("Connected to {service} at {path} ({interface})");
        Ok(handle)
    }
}

/// Handle to one remote object over `zbus`.
#[derive(Debug, Clone)]
pub struct ZbusHandle {
    conn: Connection,
    service: String,
    path: OwnedObjectPath,
}

impl ZbusHandle {
    /// Builds an uncached generic proxy for `interface` on this object.
    async fn proxy(&self, interface: &str) -> Result<zbus::Proxy<'static>> {
        Ok(zbus::proxy::Builder::new(&self.conn)
            .destination(self.service.clone())?
            .path(self.path.clone())?
            .interface(interface.to_owned())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?)
    }
}

#[async_trait]
impl BusHandle for ZbusHandle {
    fn service(&self) -> &str {
        &self.service
    }

    fn path(&self) -> &str {
        self.path.as_str()
    }

    async fn get_properties(&self, interface: &str) -> Result<PropertyMap> {
        let proxy = self.proxy(freedesktop::PROPERTIES).await?;
        let reply = proxy.call_method("GetAll", &(interface,)).await?;
        let body = reply.body();
        let properties: PropertyMap = body.deserialize()?;
        Ok(properties)
    }

    async fn call_method<A, R>(
        &self,
        interface: &str,
        method: &str,
        args: &A,
        mode: SignatureMode,
    ) -> Result<R>
    where
        A: Serialize + DynamicType + Sync,
        R: DeserializeOwned + Type + Send,
    {
        // zvariant values always carry their signature, so both modes decode
        // the same way; the mode only matters to transports that flatten
        // variants on read.
        debug!(
            "Calling {interface}.{method} on {} ({mode:?})",
            self.path.as_str()
        );
        let proxy = self.proxy(interface).await?;
        let reply = proxy.call_method(method, args).await?;
        let body = reply.body();
        let value: R = body.deserialize()?;
        Ok(value)
    }
}

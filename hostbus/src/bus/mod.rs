//! Transport boundary.
//!
//! The proxy layer never talks to the wire directly. It consumes three
//! operations through the traits below: connect to a service object,
//! read every property of an interface, and call a method. [`ZbusFactory`]
//! implements them over a real `zbus` connection; [`MemoryBus`] implements
//! them in-process for tests and offline tooling.

mod memory;
mod zbus_backend;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use zvariant::{DynamicType, OwnedValue, Type};

use crate::Result;

pub use memory::{MemoryBus, MemoryHandle, RecordedCall};
pub use zbus_backend::{ZbusFactory, ZbusHandle};

/// Raw property bag as returned by `org.freedesktop.DBus.Properties.GetAll`.
pub type PropertyMap = HashMap<String, OwnedValue>;

/// How values inside a method reply are handed back.
///
/// `Strip` is the normal read path. `Preserve` is requested when the reply is
/// going to be written back to the service (for example a settings document
/// fetched for a fetch-merge-write cycle), so every value must keep the exact
/// D-Bus type it arrived with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureMode {
    #[default]
    Strip,
    Preserve,
}

/// Opens handles to remote objects.
#[async_trait]
pub trait BusFactory: Send + Sync {
    type Handle: BusHandle;

    /// Resolves `service` at `path` and checks that the object implements
    /// `interface`.
    ///
    /// # Errors
    ///
    /// [`ProxyError::ServiceUnavailable`](crate::ProxyError::ServiceUnavailable)
    /// when nobody owns `service`,
    /// [`ProxyError::InterfaceUnavailable`](crate::ProxyError::InterfaceUnavailable)
    /// when the object lacks `interface`.
    async fn connect(&self, service: &str, path: &str, interface: &str) -> Result<Self::Handle>;
}

/// A capability bound to one remote object.
#[async_trait]
pub trait BusHandle: Send + Sync {
    /// Bus name this handle talks to.
    fn service(&self) -> &str;

    /// Object path this handle talks to.
    fn path(&self) -> &str;

    /// Reads every property of `interface` in one round trip.
    async fn get_properties(&self, interface: &str) -> Result<PropertyMap>;

    /// Invokes `interface.method` with `args` and decodes the reply as `R`.
    ///
    /// `args` is the method's argument tuple (`&()` for no arguments).
    async fn call_method<A, R>(
        &self,
        interface: &str,
        method: &str,
        args: &A,
        mode: SignatureMode,
    ) -> Result<R>
    where
        A: Serialize + DynamicType + Sync,
        R: DeserializeOwned + Type + Send;
}

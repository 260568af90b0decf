//! Generic proxy object.
//!
//! A [`ProxyObject`] pairs an optional bus handle with the cached property
//! snapshot of one interface. What an object can do beyond attach and
//! refresh is decided by its interface marker: each service module adds
//! typed accessors as an inherent impl on `ProxyObject<H, Marker>`.

use arc_swap::ArcSwap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use zvariant::{DynamicType, Type, Value};

use crate::api::models::{Attachment, ProxyError};
use crate::bus::{BusFactory, BusHandle, SignatureMode};
use crate::core::guard::guarded;
use crate::core::snapshot::PropertySnapshot;
use crate::Result;

/// A remote interface a proxy object can be bound to.
pub trait Interface: Send + Sync + 'static {
    /// Well-known bus name of the owning daemon.
    const SERVICE: &'static str;
    /// Interface whose properties populate the snapshot.
    const NAME: &'static str;
}

/// An interface published once at a fixed path by its daemon.
pub trait Singleton: Interface {
    const PATH: &'static str;
}

/// How the object came to be known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Locator {
    /// Fixed service and path; a missing daemon is survivable.
    Owned,
    /// Path taken from an enumeration on a parent object.
    Discovered,
}

/// Local stand-in for one remote object.
pub struct ProxyObject<H, I> {
    path: String,
    locator: Locator,
    handle: Option<H>,
    snapshot: ArcSwap<PropertySnapshot>,
    interface: PhantomData<fn() -> I>,
}

impl<H, I> ProxyObject<H, I>
where
    H: BusHandle,
    I: Interface,
{
    /// Creates the unattached proxy of a daemon's well-known object.
    pub fn owned() -> Self
    where
        I: Singleton,
    {
        Self::with_locator(I::PATH.to_owned(), Locator::Owned)
    }

    /// Creates an unattached proxy for a path returned by an enumeration.
    pub fn discovered(path: impl Into<String>) -> Self {
        Self::with_locator(path.into(), Locator::Discovered)
    }

    fn with_locator(path: String, locator: Locator) -> Self {
        Self {
            path,
            locator,
            handle: None,
            snapshot: ArcSwap::from_pointee(PropertySnapshot::default()),
            interface: PhantomData,
        }
    }

    pub fn service(&self) -> &'static str {
        I::SERVICE
    }

    pub fn interface(&self) -> &'static str {
        I::NAME
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    /// Resolves the bus handle for this object.
    ///
    /// For an owned object a missing service or interface is reported as
    /// [`Attachment::Degraded`] and the object stays unattached. A
    /// discovered object propagates every failure, and also fetches its
    /// properties: the new handle and snapshot are installed together only
    /// once both steps have succeeded.
    ///
    /// Re-attaching replaces the previous handle. Any outcome other than
    /// [`Attachment::Attached`] leaves the object unattached, even if it
    /// was attached before; the last snapshot stays readable.
    pub async fn attach<F>(&mut self, bus: &F) -> Result<Attachment>
    where
        F: BusFactory<Handle = H>,
    {
        let connected = match bus.connect(I::SERVICE, &self.path, I::NAME).await {
            Ok(handle) if self.locator == Locator::Discovered => handle
                .get_properties(I::NAME)
                .await
                .map(|properties| (handle, Some(properties))),
            Ok(handle) => Ok((handle, None)),
            Err(e) => Err(e),
        };

        match connected {
            Ok((handle, properties)) => {
                if let Some(properties) = properties {
                    self.snapshot.store(Arc::new(PropertySnapshot::new(properties)));
                }
                self.handle = Some(handle);
                Ok(Attachment::Attached)
            }
            Err(e) => {
                self.detach();
                if self.locator == Locator::Owned && e.is_unavailable() {
                    Ok(Attachment::Degraded(e))
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Drops the bus handle. Guarded operations fail with
    /// [`ProxyError::NotConnected`] until the next successful attach.
    pub fn detach(&mut self) {
        self.handle = None;
    }

    /// Re-reads every property of the interface and swaps in the result.
    ///
    /// Readers see either the previous snapshot or the new one, never a mix.
    /// A failed or cancelled refresh leaves the previous snapshot in place.
    pub async fn refresh(&self) -> Result<()> {
        let properties = guarded(self.handle(), |h| h.get_properties(I::NAME)).await?;
        self.snapshot.store(Arc::new(PropertySnapshot::new(properties)));
        Ok(())
    }

    /// The snapshot as of the last completed refresh.
    pub fn snapshot(&self) -> Arc<PropertySnapshot> {
        self.snapshot.load_full()
    }

    /// Looks up `name` in the snapshot and converts it.
    ///
    /// # Errors
    ///
    /// [`ProxyError::PropertyUnavailable`] if the property is not in the
    /// snapshot (including before the first refresh); whatever `convert`
    /// returns otherwise.
    pub fn property<T>(
        &self,
        name: &str,
        convert: impl FnOnce(&str, &Value<'_>) -> Result<T>,
    ) -> Result<T> {
        let snapshot = self.snapshot.load();
        let value = snapshot
            .get(name)
            .ok_or_else(|| ProxyError::PropertyUnavailable(name.to_owned()))?;
        convert(name, &**value)
    }

    /// Calls `method` on this object's interface.
    pub async fn call<A, R>(&self, method: &str, args: &A) -> Result<R>
    where
        A: Serialize + DynamicType + Sync,
        R: DeserializeOwned + Type + Send,
    {
        self.call_on(I::NAME, method, args, SignatureMode::Strip).await
    }

    /// Calls `method` on an arbitrary interface of this object.
    pub async fn call_on<A, R>(
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
        guarded(self.handle(), |h| h.call_method(interface, method, args, mode)).await
    }
}

impl<H, I: Interface> fmt::Debug for ProxyObject<H, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyObject")
            .field("service", &I::SERVICE)
            .field("interface", &I::NAME)
            .field("path", &self.path)
            .field("locator", &self.locator)
            .field("attached", &self.handle.is_some())
            .field("properties", &self.snapshot.load().len())
            .finish()
    }
}

//! In-process transport.
//!
//! `MemoryBus` stands in for a bus daemon: objects are registered with the
//! interfaces they implement, property bags and canned method replies are
//! stored per interface, and every remote operation is recorded so callers
//! can assert exactly which calls went out.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::value::UnitDeserializer;
use serde::de::{DeserializeOwned, IntoDeserializer};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use zvariant::serialized::{Context, Data};
use zvariant::{DynamicType, OwnedValue, Type, LE};

use crate::api::models::ProxyError;
use crate::bus::{BusFactory, BusHandle, PropertyMap, SignatureMode};
use crate::types::constants::freedesktop;
use crate::Result;

/// One remote operation observed by a [`MemoryBus`].
#[derive(Clone)]
pub struct RecordedCall {
    pub path: String,
    pub interface: String,
    pub method: String,
    pub mode: SignatureMode,
    args: Option<Arc<Data<'static, 'static>>>,
}

impl RecordedCall {
    /// Decodes the arguments the call was made with.
    ///
    /// Property reads carry no arguments and return `None`.
    pub fn args<T>(&self) -> Option<Result<T>>
    where
        T: DeserializeOwned + Type,
    {
        self.args.as_ref().map(|data| decode(data))
    }
}

impl std::fmt::Debug for RecordedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordedCall")
            .field("path", &self.path)
            .field("interface", &self.interface)
            .field("method", &self.method)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for RecordedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}.{}", self.path, self.interface, self.method)
    }
}

enum Reply {
    Value(Data<'static, 'static>),
    Error(String),
}

#[derive(Default)]
struct MemoryObject {
    interfaces: HashSet<String>,
    properties: HashMap<String, PropertyMap>,
    replies: HashMap<(String, String), Reply>,
}

#[derive(Default)]
struct MemoryState {
    objects: HashMap<(String, String), MemoryObject>,
    calls: Vec<RecordedCall>,
}

/// An in-memory message bus.
///
/// Clones share state, so a test can keep one clone for setup and
/// assertions while handing another to the code under test.
///
/// # Example
///
/// ```
/// use hostbus::bus::MemoryBus;
/// use zvariant::{OwnedValue, Value};
///
/// let bus = MemoryBus::new();
/// bus.set_property(
///     "org.freedesktop.timedate1",
///     "/org/freedesktop/timedate1",
///     "org.freedesktop.timedate1",
///     "Timezone",
///     OwnedValue::try_from(Value::from("Etc/UTC")).unwrap(),
/// );
/// assert!(bus.calls().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct MemoryBus {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panicking test thread must not cascade into every other assertion.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_object<T>(
        &self,
        service: &str,
        path: &str,
        f: impl FnOnce(&mut MemoryObject) -> T,
    ) -> T {
        let mut state = self.lock();
        let object = state
            .objects
            .entry((service.to_owned(), path.to_owned()))
            .or_default();
        f(object)
    }

    /// Registers `interface` on the object without any properties.
    pub fn add_interface(&self, service: &str, path: &str, interface: &str) {
        self.with_object(service, path, |object| {
            object.interfaces.insert(interface.to_owned());
            object.properties.entry(interface.to_owned()).or_default();
        });
    }

    /// Replaces the whole property bag of `interface`, registering it if needed.
    pub fn set_properties(&self, service: &str, path: &str, interface: &str, properties: PropertyMap) {
        self.with_object(service, path, |object| {
            object.interfaces.insert(interface.to_owned());
            object.properties.insert(interface.to_owned(), properties);
        });
    }

    /// Sets a single property of `interface`, registering it if needed.
    pub fn set_property(
        &self,
        service: &str,
        path: &str,
        interface: &str,
        name: &str,
        value: OwnedValue,
    ) {
        self.with_object(service, path, |object| {
            object.interfaces.insert(interface.to_owned());
            object
                .properties
                .entry(interface.to_owned())
                .or_default()
                .insert(name.to_owned(), value);
        });
    }

    /// Removes an object, as if its owner dropped off the bus.
    pub fn remove_object(&self, service: &str, path: &str) {
        self.lock()
            .objects
            .remove(&(service.to_owned(), path.to_owned()));
    }

    /// Stores the reply returned for `interface.method`.
    ///
    /// Methods without a stored reply answer with an empty body, which only
    /// decodes as `()`. `org.freedesktop.DBus.Properties.Get` and `Set`
    /// without a stored reply read and write the object's property bags.
    pub fn set_reply<T>(&self, service: &str, path: &str, interface: &str, method: &str, reply: &T) -> Result<()>
    where
        T: Serialize + DynamicType,
    {
        let data = encode(reply)?;
        self.with_object(service, path, |object| {
            object.interfaces.insert(interface.to_owned());
            object
                .replies
                .insert((interface.to_owned(), method.to_owned()), Reply::Value(data));
        });
        Ok(())
    }

    /// Makes `interface.method` fail with a remote error carrying `message`.
    pub fn fail_method(&self, service: &str, path: &str, interface: &str, method: &str, message: &str) {
        self.with_object(service, path, |object| {
            object.interfaces.insert(interface.to_owned());
            object.replies.insert(
                (interface.to_owned(), method.to_owned()),
                Reply::Error(message.to_owned()),
            );
        });
    }

    /// Every operation recorded so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Recorded operations rendered as `"<path>-<interface>.<method>"`.
    pub fn call_log(&self) -> Vec<String> {
        self.lock().calls.iter().map(ToString::to_string).collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl std::fmt::Debug for MemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MemoryBus")
            .field("objects", &state.objects.len())
            .field("calls", &state.calls.len())
            .finish()
    }
}

fn encode<T>(value: &T) -> Result<Data<'static, 'static>>
where
    T: Serialize + DynamicType + ?Sized,
{
    let ctxt = Context::new_dbus(LE, 0);
    zvariant::to_bytes(ctxt, value).map_err(|e| ProxyError::Remote(e.into()))
}

fn decode<T>(data: &Data<'static, 'static>) -> Result<T>
where
    T: DeserializeOwned + Type,
{
    data.deserialize::<T>()
        .map(|(value, _)| value)
        .map_err(|e| ProxyError::Remote(e.into()))
}

/// Decodes an empty reply body, which only succeeds for `()`.
fn unit_reply<R: DeserializeOwned>(interface: &str, method: &str) -> Result<R> {
    let empty: UnitDeserializer<serde::de::value::Error> = ().into_deserializer();
    R::deserialize(empty)
        .map_err(|_| remote_failure(format!("no reply configured for {interface}.{method}")))
}

fn remote_failure(message: impl Into<String>) -> ProxyError {
    ProxyError::Remote(zbus::Error::Failure(message.into()))
}

#[async_trait]
impl BusFactory for MemoryBus {
    type Handle = MemoryHandle;

    async fn connect(&self, service: &str, path: &str, interface: &str) -> Result<MemoryHandle> {
        let state = self.lock();
        let service_known = state.objects.keys().any(|(s, _)| s == service);
        if !service_known {
            return Err(ProxyError::ServiceUnavailable {
                service: service.to_owned(),
            });
        }

        let implements = state
            .objects
            .get(&(service.to_owned(), path.to_owned()))
            .is_some_and(|object| object.interfaces.contains(interface));
        if !implements {
            return Err(ProxyError::InterfaceUnavailable {
                service: service.to_owned(),
                interface: interface.to_owned(),
            });
        }

        Ok(MemoryHandle {
            bus: self.clone(),
            service: service.to_owned(),
            path: path.to_owned(),
        })
    }
}

/// Handle to one object on a [`MemoryBus`].
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    bus: MemoryBus,
    service: String,
    path: String,
}

#[async_trait]
impl BusHandle for MemoryHandle {
    fn service(&self) -> &str {
        &self.service
    }

    fn path(&self) -> &str {
        &self.path
    }

    async fn get_properties(&self, interface: &str) -> Result<PropertyMap> {
        let mut state = self.bus.lock();
        state.calls.push(RecordedCall {
            path: self.path.clone(),
            interface: interface.to_owned(),
            method: "GetAll".to_owned(),
            mode: SignatureMode::Strip,
            args: None,
        });

        let key = (self.service.clone(), self.path.clone());
        let object = state
            .objects
            .get(&key)
            .ok_or_else(|| remote_failure(format!("object {} vanished", self.path)))?;
        let properties = object
            .properties
            .get(interface)
            .ok_or_else(|| remote_failure(format!("unknown interface {interface}")))?;

        let mut copy = PropertyMap::with_capacity(properties.len());
        for (name, value) in properties {
            let value =
                OwnedValue::try_from(&**value).map_err(|e| ProxyError::Remote(e.into()))?;
            copy.insert(name.clone(), value);
        }
        Ok(copy)
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
        let encoded = Arc::new(encode(args)?);
        let mut state = self.bus.lock();
        state.calls.push(RecordedCall {
            path: self.path.clone(),
            interface: interface.to_owned(),
            method: method.to_owned(),
            mode,
            args: Some(Arc::clone(&encoded)),
        });

        let key = (self.service.clone(), self.path.clone());
        let object = state
            .objects
            .get(&key)
            .ok_or_else(|| remote_failure(format!("object {} vanished", self.path)))?;

        let reply = object.replies.get(&(interface.to_owned(), method.to_owned()));
        if reply.is_none() && interface == freedesktop::PROPERTIES {
            return match method {
                "Get" => {
                    let (target, name): (String, String) = decode(&encoded)?;
                    let value = object
                        .properties
                        .get(&target)
                        .and_then(|bag| bag.get(&name))
                        .ok_or_else(|| remote_failure(format!("unknown property {target}.{name}")))?;
                    decode(&encode(&**value)?)
                }
                "Set" => {
                    let (target, name, value): (String, String, OwnedValue) = decode(&encoded)?;
                    let object = state
                        .objects
                        .get_mut(&key)
                        .ok_or_else(|| remote_failure(format!("object {} vanished", self.path)))?;
                    object
                        .properties
                        .entry(target)
                        .or_default()
                        .insert(name, value);
                    unit_reply(interface, method)
                }
                _ => Err(remote_failure(format!("unknown method {interface}.{method}"))),
            };
        }

        match reply {
            Some(Reply::Value(data)) => decode(data),
            Some(Reply::Error(message)) => Err(remote_failure(message.clone())),
            None => unit_reply(interface, method),
        }
    }
}

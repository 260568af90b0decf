//! Proxy-object lifecycle and the pure algorithms behind it.
//!
//! Nothing in here knows about particular daemons. Service modules build
//! on [`proxy::ProxyObject`] and the conversions in [`convert`].

pub mod convert;
pub mod guard;
pub mod projection;
pub mod proxy;
pub mod settings_merge;
pub mod snapshot;

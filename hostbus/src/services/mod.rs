//! Typed proxies for the individual system daemons.
//!
//! Each daemon gets an interface marker and a type alias over
//! [`ProxyObject`](crate::core::proxy::ProxyObject); its accessors and
//! commands live in an inherent impl on that alias.

pub mod logind;
pub mod network;
pub mod os_agent;
pub mod systemd;
pub mod timedate;

pub use logind::{Logind, LogindManager};
pub use os_agent::{AgentInterface, AppArmor, AppArmorInterface, OsAgent};
pub use systemd::{Systemd, SystemdManager};
pub use timedate::{TimeDate, TimedateInterface};

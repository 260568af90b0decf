//! Shared fixtures: an in-memory host with every daemon present.

#![allow(dead_code)]

use hostbus::bus::{MemoryBus, PropertyMap};
use hostbus::types::constants::{logind, network, os_agent, systemd, timedate};
use hostbus::{HostBus, HostBusConfig};
use zvariant::{ObjectPath, OwnedValue, Value};

pub const DEVICE_1: &str = "/org/freedesktop/NetworkManager/Devices/1";
pub const SETTINGS_1: &str = "/org/freedesktop/NetworkManager/Settings/1";
pub const ACTIVE_1: &str = "/org/freedesktop/NetworkManager/ActiveConnection/1";

pub fn val<'a>(v: impl Into<Value<'a>>) -> OwnedValue {
    OwnedValue::try_from(v.into()).unwrap()
}

pub fn path_val(path: &str) -> OwnedValue {
    val(ObjectPath::try_from(path).unwrap())
}

pub fn paths_val(paths: &[&str]) -> OwnedValue {
    let paths: Vec<ObjectPath<'_>> = paths
        .iter()
        .map(|p| ObjectPath::try_from(*p).unwrap())
        .collect();
    val(paths)
}

pub fn props(pairs: Vec<(&str, OwnedValue)>) -> PropertyMap {
    pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
}

pub fn systemd_props() -> PropertyMap {
    props(vec![
        (systemd::FIRMWARE_TIMESTAMP_MONOTONIC, val(100_000u64)),
        (systemd::LOADER_TIMESTAMP_MONOTONIC, val(200_000u64)),
        (systemd::KERNEL_TIMESTAMP_MONOTONIC, val(300_000u64)),
        (systemd::USERSPACE_TIMESTAMP_MONOTONIC, val(400_000u64)),
        (systemd::FINISH_TIMESTAMP, val(1_700_000_000_000_000u64)),
    ])
}

pub fn timedate_props(zone: &str, usec: u64) -> PropertyMap {
    props(vec![
        (timedate::TIMEZONE, val(zone)),
        (timedate::NTP, val(true)),
        (timedate::NTP_SYNCHRONIZED, val(false)),
        (timedate::TIME_USEC, val(usec)),
    ])
}

pub fn network_props(version: &str) -> PropertyMap {
    props(vec![
        (network::VERSION, val(version)),
        (network::CONNECTIVITY, val(4u32)),
        (network::DEVICES, paths_val(&[DEVICE_1])),
        (network::ACTIVE_CONNECTIONS, paths_val(&[])),
    ])
}

pub fn active_connection_props() -> PropertyMap {
    props(vec![
        (network::ID, val("Wired connection 1")),
        (network::UUID, val("0c23631e-2118-355c-bbb0-8943229cb0d6")),
        (network::STATE, val(2u32)),
        (network::CONNECTION, path_val(SETTINGS_1)),
    ])
}

/// A bus where every daemon is running with plausible properties.
pub fn full_bus() -> MemoryBus {
    let bus = MemoryBus::new();
    bus.set_properties(systemd::SERVICE, systemd::PATH, systemd::MANAGER, systemd_props());
    bus.add_interface(logind::SERVICE, logind::PATH, logind::MANAGER);
    bus.set_properties(
        timedate::SERVICE,
        timedate::PATH,
        timedate::INTERFACE,
        timedate_props("Etc/UTC", 1_700_000_000_000_000),
    );
    bus.set_properties(
        os_agent::SERVICE,
        os_agent::PATH,
        os_agent::INTERFACE,
        props(vec![
            (os_agent::VERSION, val("1.2.2")),
            (os_agent::DIAGNOSTICS, val(false)),
        ]),
    );
    bus.set_properties(
        os_agent::SERVICE,
        os_agent::APPARMOR_PATH,
        os_agent::APPARMOR_INTERFACE,
        props(vec![(os_agent::PARSER_VERSION, val("2.13.2"))]),
    );
    bus.set_properties(
        network::SERVICE,
        network::PATH,
        network::INTERFACE,
        network_props("1.22.10"),
    );
    bus
}

/// A host over `bus` that has not been connected yet.
pub fn host(bus: &MemoryBus) -> HostBus<MemoryBus> {
    HostBus::new(bus.clone(), HostBusConfig::default())
}

/// A connected host over `bus`, with the call log cleared.
pub async fn connected(bus: &MemoryBus) -> HostBus<MemoryBus> {
    let mut host = host(bus);
    host.connect().await.unwrap();
    bus.clear_calls();
    host
}

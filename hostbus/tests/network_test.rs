//! NetworkManager proxies: version check, connectivity, activation and
//! connection profile updates.

mod common;

use std::collections::HashMap;

use common::*;
use hostbus::bus::{MemoryBus, MemoryHandle, SignatureMode};
use hostbus::core::convert;
use hostbus::services::network::NetworkSetting;
use hostbus::types::constants::{network, systemd};
use hostbus::{
    ActiveConnectionState, BusAddress, Connectivity, HostBus, HostBusConfig, MergePolicy,
    ProxyError, SettingsDocument, Version,
};
use zvariant::OwnedObjectPath;

const AP_1: &str = "/org/freedesktop/NetworkManager/AccessPoint/1";
const AP_2: &str = "/org/freedesktop/NetworkManager/AccessPoint/2";

fn nm_log(method: &str) -> String {
    format!("{}-{}.{method}", network::PATH, network::INTERFACE)
}

fn object_path(path: &str) -> OwnedObjectPath {
    OwnedObjectPath::try_from(path).unwrap()
}

fn stored_settings() -> SettingsDocument {
    let mut doc = SettingsDocument::new();
    doc.insert(
        "connection".into(),
        HashMap::from([
            ("id".to_owned(), val("Supervisor eth0")),
            ("uuid".to_owned(), val("0c23631e-2118-355c-bbb0-8943229cb0d6")),
            ("type".to_owned(), val("802-3-ethernet")),
            ("interface-name".to_owned(), val("eth0")),
        ]),
    );
    doc.insert(
        "802-3-ethernet".into(),
        HashMap::from([("assigned-mac-address".to_owned(), val("preserve"))]),
    );
    doc.insert(
        "ipv4".into(),
        HashMap::from([
            ("method".to_owned(), val("auto")),
            ("address-data".to_owned(), val(vec!["192.168.2.148/24"])),
            ("dns".to_owned(), val(vec![16_843_009u32])),
            ("gateway".to_owned(), val("192.168.2.1")),
        ]),
    );
    doc.insert(
        "ipv6".into(),
        HashMap::from([("method".to_owned(), val("auto"))]),
    );
    doc
}

/// Registers the settings object at `SETTINGS_1` and the active connection
/// at `ACTIVE_1`.
fn with_connection_objects(bus: &MemoryBus) {
    bus.add_interface(network::SERVICE, SETTINGS_1, network::SETTINGS_CONNECTION);
    bus.set_reply(
        network::SERVICE,
        SETTINGS_1,
        network::SETTINGS_CONNECTION,
        "GetSettings",
        &stored_settings(),
    )
    .unwrap();
    bus.set_properties(
        network::SERVICE,
        ACTIVE_1,
        network::ACTIVE_CONNECTION,
        active_connection_props(),
    );
}

fn section_keys(doc: &SettingsDocument, section: &str) -> Vec<String> {
    let mut keys: Vec<_> = doc[section].keys().cloned().collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn test_network_manager_version_supported() {
    let bus = full_bus();
    let host = connected(&bus).await;

    assert_eq!(host.network().version().unwrap(), "1.22.10");
    let found = host
        .network()
        .validate_version(&Version::new(&[1, 14, 6]))
        .unwrap();
    assert_eq!(found.parts(), &[1, 22, 10]);
}

#[tokio::test]
async fn test_network_manager_version_too_old() {
    let bus = full_bus();
    bus.set_properties(
        network::SERVICE,
        network::PATH,
        network::INTERFACE,
        network_props("1.13.9"),
    );
    let mut host = host(&bus);

    match host.connect().await {
        Err(ProxyError::VersionUnsupported { found, minimum, .. }) => {
            assert_eq!(found, "1.13.9");
            assert_eq!(minimum, "1.14.6");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(host.network().version().unwrap(), "1.13.9");
    // Everything else was attached before the check ran.
    assert_eq!(host.systemd().startup_time().unwrap(), 1.0);
}

#[tokio::test]
async fn test_minimum_version_is_configurable() {
    let bus = full_bus();
    bus.set_properties(
        network::SERVICE,
        network::PATH,
        network::INTERFACE,
        network_props("1.13.9"),
    );
    let config = HostBusConfig::default()
        .with_bus(BusAddress::Session)
        .with_network_manager_min_version(Version::new(&[1, 10]));
    let mut host = HostBus::new(bus.clone(), config);

    assert!(host.connect().await.unwrap().is_complete());
}

#[tokio::test]
async fn test_network_manager_lists() {
    let bus = full_bus();
    let host = connected(&bus).await;

    assert_eq!(host.network().devices().unwrap(), vec![DEVICE_1]);
    assert!(host.network().active_connections().unwrap().is_empty());
    assert_eq!(host.network().connectivity().unwrap(), Connectivity::Full);
}

#[tokio::test]
async fn test_check_connectivity() {
    let bus = full_bus();
    bus.set_reply(
        network::SERVICE,
        network::PATH,
        network::INTERFACE,
        "CheckConnectivity",
        &4u32,
    )
    .unwrap();
    let host = connected(&bus).await;

    assert_eq!(
        host.network().check_connectivity(false).await.unwrap(),
        Connectivity::Full
    );
    assert_eq!(
        bus.call_log(),
        vec!["/org/freedesktop/NetworkManager-org.freedesktop.DBus.Properties.Get"]
    );

    bus.clear_calls();
    assert_eq!(
        host.network().check_connectivity(true).await.unwrap(),
        Connectivity::Full
    );
    assert_eq!(bus.call_log(), vec![nm_log("CheckConnectivity")]);
}

#[tokio::test]
async fn test_activate_connection() {
    let bus = full_bus();
    with_connection_objects(&bus);
    bus.set_reply(
        network::SERVICE,
        network::PATH,
        network::INTERFACE,
        "ActivateConnection",
        &object_path(ACTIVE_1),
    )
    .unwrap();
    let host = connected(&bus).await;

    let connection = host.activate_connection(SETTINGS_1, DEVICE_1).await.unwrap();

    assert_eq!(connection.state().unwrap(), ActiveConnectionState::Activated);
    assert_eq!(connection.setting_object().unwrap(), SETTINGS_1);
    assert_eq!(connection.id().unwrap(), "Wired connection 1");
    assert_eq!(
        bus.call_log(),
        vec![
            nm_log("ActivateConnection"),
            format!("{ACTIVE_1}-{}.GetAll", network::ACTIVE_CONNECTION),
        ]
    );

    let (settings, device, specific): (OwnedObjectPath, OwnedObjectPath, OwnedObjectPath) =
        bus.calls()[0].args().unwrap().unwrap();
    assert_eq!(settings.as_str(), SETTINGS_1);
    assert_eq!(device.as_str(), DEVICE_1);
    assert_eq!(specific.as_str(), "/");
}

#[tokio::test]
async fn test_add_and_activate_connection() {
    let bus = full_bus();
    with_connection_objects(&bus);
    bus.set_reply(
        network::SERVICE,
        network::PATH,
        network::INTERFACE,
        "AddAndActivateConnection",
        &(object_path(SETTINGS_1), object_path(ACTIVE_1)),
    )
    .unwrap();
    let host = connected(&bus).await;

    let (settings, connection) = host
        .add_and_activate_connection(&stored_settings(), DEVICE_1)
        .await
        .unwrap();

    assert_eq!(
        settings.connection().unwrap().unwrap().uuid.as_deref(),
        Some("0c23631e-2118-355c-bbb0-8943229cb0d6")
    );
    assert_eq!(settings.ipv4().unwrap().unwrap().method.as_deref(), Some("auto"));
    assert_eq!(connection.state().unwrap(), ActiveConnectionState::Activated);
    assert_eq!(connection.setting_object().unwrap(), SETTINGS_1);

    let log = bus.call_log();
    assert_eq!(log[0], nm_log("AddAndActivateConnection"));
    assert!(log.contains(&format!(
        "{SETTINGS_1}-{}.GetSettings",
        network::SETTINGS_CONNECTION
    )));
}

#[tokio::test]
async fn test_network_setting_projection() {
    let bus = full_bus();
    with_connection_objects(&bus);
    let host = connected(&bus).await;

    let setting = host.network_setting(SETTINGS_1).await.unwrap();

    let connection = setting.connection().unwrap().unwrap();
    assert_eq!(connection.id.as_deref(), Some("Supervisor eth0"));
    assert_eq!(connection.interface_name.as_deref(), Some("eth0"));
    assert_eq!(
        setting.ethernet().unwrap().unwrap().assigned_mac.as_deref(),
        Some("preserve")
    );
    assert_eq!(setting.ipv6().unwrap().unwrap().method.as_deref(), Some("auto"));
    assert!(setting.wireless().unwrap().is_none());
    assert!(setting.wireless_security().unwrap().is_none());
    assert!(setting.vlan().unwrap().is_none());
}

#[tokio::test]
async fn test_network_setting_unattached() {
    let bus = full_bus();
    with_connection_objects(&bus);
    let setting = NetworkSetting::<MemoryHandle>::new(SETTINGS_1, MergePolicy::default());

    assert!(matches!(
        setting.connection(),
        Err(ProxyError::PropertyUnavailable(_))
    ));
    assert!(matches!(
        setting.update(SettingsDocument::new()).await,
        Err(ProxyError::NotConnected)
    ));
    assert!(matches!(setting.delete().await, Err(ProxyError::NotConnected)));
    assert!(bus.calls().is_empty());
}

#[tokio::test]
async fn test_network_setting_attach_failure_leaves_it_unattached() {
    let bus = full_bus();
    with_connection_objects(&bus);
    bus.fail_method(
        network::SERVICE,
        SETTINGS_1,
        network::SETTINGS_CONNECTION,
        "GetSettings",
        "no secrets agent",
    );
    let mut setting = NetworkSetting::<MemoryHandle>::new(SETTINGS_1, MergePolicy::default());

    assert!(matches!(
        setting.attach(&bus).await,
        Err(ProxyError::Remote(_))
    ));
    assert!(!setting.is_attached());
    assert!(matches!(
        setting.connection(),
        Err(ProxyError::PropertyUnavailable(_))
    ));

    bus.clear_calls();
    assert!(matches!(setting.delete().await, Err(ProxyError::NotConnected)));
    assert!(bus.calls().is_empty());
}

#[tokio::test]
async fn test_network_setting_failed_reattach_drops_handle() {
    let bus = full_bus();
    with_connection_objects(&bus);
    let mut setting = NetworkSetting::<MemoryHandle>::new(SETTINGS_1, MergePolicy::default());
    setting.attach(&bus).await.unwrap();
    assert!(setting.is_attached());

    bus.fail_method(
        network::SERVICE,
        SETTINGS_1,
        network::SETTINGS_CONNECTION,
        "GetSettings",
        "no such connection",
    );
    assert!(setting.attach(&bus).await.is_err());
    assert!(!setting.is_attached());

    bus.clear_calls();
    assert!(matches!(
        setting.update(SettingsDocument::new()).await,
        Err(ProxyError::NotConnected)
    ));
    assert!(bus.calls().is_empty());
}

#[tokio::test]
async fn test_network_setting_update_merges_fresh_document() {
    let bus = full_bus();
    with_connection_objects(&bus);
    let host = connected(&bus).await;
    let setting = host.network_setting(SETTINGS_1).await.unwrap();
    bus.clear_calls();

    let mut intent = SettingsDocument::new();
    intent.insert(
        "ipv4".into(),
        HashMap::from([("method".to_owned(), val("disabled"))]),
    );
    intent.insert(
        "connection".into(),
        HashMap::from([("autoconnect".to_owned(), val(true))]),
    );
    setting.update(intent).await.unwrap();

    let calls = bus.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].method, "GetSettings");
    assert_eq!(calls[0].mode, SignatureMode::Preserve);
    assert_eq!(calls[1].method, "Update");

    let (written,): (SettingsDocument,) = calls[1].args().unwrap().unwrap();
    assert_eq!(section_keys(&written, "ipv4"), vec!["method"]);
    assert_eq!(
        convert::text("method", &written["ipv4"]["method"]).unwrap(),
        "disabled"
    );
    // Untargeted IP section keeps its fields.
    assert_eq!(section_keys(&written, "ipv6"), vec!["method"]);
    // Non-IP sections are overlaid, not stripped.
    assert_eq!(
        section_keys(&written, "connection"),
        vec!["autoconnect", "id", "interface-name", "type", "uuid"]
    );
    assert!(written.contains_key("802-3-ethernet"));

    // The cached projection is only replaced by an explicit reload.
    assert_eq!(setting.ipv4().unwrap().unwrap().method.as_deref(), Some("auto"));
}

#[tokio::test]
async fn test_network_setting_update_failures() {
    let bus = full_bus();
    with_connection_objects(&bus);
    let host = connected(&bus).await;
    let setting = host.network_setting(SETTINGS_1).await.unwrap();

    bus.fail_method(
        network::SERVICE,
        SETTINGS_1,
        network::SETTINGS_CONNECTION,
        "Update",
        "connection is read-only",
    );
    bus.clear_calls();
    assert!(matches!(
        setting.update(SettingsDocument::new()).await,
        Err(ProxyError::Remote(zbus::Error::Failure(m))) if m == "connection is read-only"
    ));
    assert_eq!(bus.calls().len(), 2);

    bus.fail_method(
        network::SERVICE,
        SETTINGS_1,
        network::SETTINGS_CONNECTION,
        "GetSettings",
        "no such connection",
    );
    bus.clear_calls();
    assert!(setting.update(SettingsDocument::new()).await.is_err());
    // Fetch failed, so nothing was written.
    assert_eq!(bus.call_log().len(), 1);
}

#[tokio::test]
async fn test_network_setting_delete() {
    let bus = full_bus();
    with_connection_objects(&bus);
    let host = connected(&bus).await;
    let setting = host.network_setting(SETTINGS_1).await.unwrap();
    bus.clear_calls();

    setting.delete().await.unwrap();
    assert_eq!(
        bus.call_log(),
        vec![format!("{SETTINGS_1}-{}.Delete", network::SETTINGS_CONNECTION)]
    );
}

#[tokio::test]
async fn test_wireless_access_points() {
    let bus = full_bus();
    bus.add_interface(network::SERVICE, DEVICE_1, network::WIRELESS_DEVICE);
    bus.set_reply(
        network::SERVICE,
        DEVICE_1,
        network::WIRELESS_DEVICE,
        "GetAllAccessPoints",
        &vec![object_path(AP_1), object_path(AP_2)],
    )
    .unwrap();
    bus.set_properties(
        network::SERVICE,
        AP_1,
        network::ACCESS_POINT,
        props(vec![
            (network::SSID, val(b"UPC4814466".to_vec())),
            (network::FREQUENCY, val(2462u32)),
            (network::HW_ADDRESS, val("E4:57:40:A9:D7:DE")),
            (network::MODE, val(2u32)),
            (network::STRENGTH, val(47u8)),
        ]),
    );
    bus.set_properties(
        network::SERVICE,
        AP_2,
        network::ACCESS_POINT,
        props(vec![(network::SSID, val(vec![0xffu8, 0xfe]))]),
    );
    let host = connected(&bus).await;

    let device = host.wireless_device(DEVICE_1).await.unwrap();
    let aps = device.access_points(host.bus()).await.unwrap();
    assert_eq!(aps.len(), 2);

    let ap = &aps[0];
    assert_eq!(ap.ssid().unwrap(), "UPC4814466");
    assert_eq!(ap.frequency().unwrap(), 2462);
    assert_eq!(ap.mac().unwrap(), "E4:57:40:A9:D7:DE");
    assert_eq!(ap.mode().unwrap(), 2);
    assert_eq!(ap.strength().unwrap(), 47);

    assert!(matches!(
        aps[1].ssid(),
        Err(ProxyError::Decoding { property, .. }) if property == network::SSID
    ));
    assert!(matches!(
        aps[1].frequency(),
        Err(ProxyError::PropertyUnavailable(_))
    ));
}

#[tokio::test]
async fn test_missing_network_manager_is_degraded() {
    let bus = full_bus();
    bus.remove_object(network::SERVICE, network::PATH);
    let mut host = host(&bus);

    let report = host.connect().await.unwrap();
    assert_eq!(report.degraded.len(), 1);
    assert_eq!(report.degraded[0].0, network::SERVICE);
    assert!(matches!(
        host.network().check_connectivity(true).await,
        Err(ProxyError::NotConnected)
    ));
    assert!(report.attached.contains(&systemd::SERVICE));
}

//! Well-known D-Bus names, object paths, interfaces and property keys.
//!
//! These values identify the remote objects this crate talks to. They are
//! configuration rather than logic: nothing outside the service modules
//! should need to reference them directly.

/// Interfaces every D-Bus object exposes.
pub mod freedesktop {
    pub const PROPERTIES: &str = "org.freedesktop.DBus.Properties";
    pub const INTROSPECTABLE: &str = "org.freedesktop.DBus.Introspectable";
}

/// systemd manager.
pub mod systemd {
    pub const SERVICE: &str = "org.freedesktop.systemd1";
    pub const PATH: &str = "/org/freedesktop/systemd1";
    pub const MANAGER: &str = "org.freedesktop.systemd1.Manager";

    pub const FINISH_TIMESTAMP: &str = "FinishTimestamp";
    pub const FIRMWARE_TIMESTAMP_MONOTONIC: &str = "FirmwareTimestampMonotonic";
    pub const LOADER_TIMESTAMP_MONOTONIC: &str = "LoaderTimestampMonotonic";
    pub const KERNEL_TIMESTAMP_MONOTONIC: &str = "KernelTimestampMonotonic";
    pub const USERSPACE_TIMESTAMP_MONOTONIC: &str = "UserspaceTimestampMonotonic";
}

/// systemd-logind.
pub mod logind {
    pub const SERVICE: &str = "org.freedesktop.login1";
    pub const PATH: &str = "/org/freedesktop/login1";
    pub const MANAGER: &str = "org.freedesktop.login1.Manager";
}

/// systemd-timedated.
pub mod timedate {
    pub const SERVICE: &str = "org.freedesktop.timedate1";
    pub const PATH: &str = "/org/freedesktop/timedate1";
    pub const INTERFACE: &str = "org.freedesktop.timedate1";

    pub const TIMEZONE: &str = "Timezone";
    pub const NTP: &str = "NTP";
    pub const NTP_SYNCHRONIZED: &str = "NTPSynchronized";
    pub const TIME_USEC: &str = "TimeUSec";
}

/// Home Assistant OS-Agent.
pub mod os_agent {
    pub const SERVICE: &str = "io.hass.os";
    pub const PATH: &str = "/io/hass/os";
    pub const INTERFACE: &str = "io.hass.os";
    pub const APPARMOR_PATH: &str = "/io/hass/os/AppArmor";
    pub const APPARMOR_INTERFACE: &str = "io.hass.os.AppArmor";

    pub const VERSION: &str = "Version";
    pub const DIAGNOSTICS: &str = "Diagnostics";
    pub const PARSER_VERSION: &str = "ParserVersion";
}

/// NetworkManager.
pub mod network {
    pub const SERVICE: &str = "org.freedesktop.NetworkManager";
    pub const PATH: &str = "/org/freedesktop/NetworkManager";
    pub const INTERFACE: &str = "org.freedesktop.NetworkManager";
    pub const ACCESS_POINT: &str = "org.freedesktop.NetworkManager.AccessPoint";
    pub const ACTIVE_CONNECTION: &str = "org.freedesktop.NetworkManager.Connection.Active";
    pub const WIRELESS_DEVICE: &str = "org.freedesktop.NetworkManager.Device.Wireless";
    pub const SETTINGS_CONNECTION: &str = "org.freedesktop.NetworkManager.Settings.Connection";

    /// Placeholder path NetworkManager uses for "no object".
    pub const NO_OBJECT: &str = "/";

    pub const VERSION: &str = "Version";
    pub const CONNECTIVITY: &str = "Connectivity";
    pub const DEVICES: &str = "Devices";
    pub const ACTIVE_CONNECTIONS: &str = "ActiveConnections";

    pub const SSID: &str = "Ssid";
    pub const FREQUENCY: &str = "Frequency";
    pub const HW_ADDRESS: &str = "HwAddress";
    pub const MODE: &str = "Mode";
    pub const STRENGTH: &str = "Strength";

    pub const ID: &str = "Id";
    pub const UUID: &str = "Uuid";
    pub const STATE: &str = "State";
    pub const CONNECTION: &str = "Connection";
}

/// Section and field names inside a NetworkManager settings document.
pub mod settings {
    pub const CONNECTION: &str = "connection";
    pub const ETHERNET: &str = "802-3-ethernet";
    pub const WIRELESS: &str = "802-11-wireless";
    pub const WIRELESS_SECURITY: &str = "802-11-wireless-security";
    pub const VLAN: &str = "vlan";
    pub const IPV4: &str = "ipv4";
    pub const IPV6: &str = "ipv6";

    pub const ID: &str = "id";
    pub const UUID: &str = "uuid";
    pub const TYPE: &str = "type";
    pub const INTERFACE_NAME: &str = "interface-name";
    pub const PARENT: &str = "parent";
    pub const ASSIGNED_MAC: &str = "assigned-mac-address";
    pub const SSID: &str = "ssid";
    pub const MODE: &str = "mode";
    pub const POWERSAVE: &str = "powersave";
    pub const AUTH_ALG: &str = "auth-alg";
    pub const KEY_MGMT: &str = "key-mgmt";
    pub const PSK: &str = "psk";
    pub const METHOD: &str = "method";

    /// Runtime/negotiated IP fields dropped from the current document before
    /// an intent is overlaid on an `ipv4`/`ipv6` section.
    pub const IP_DERIVED_FIELDS: [&str; 5] = ["addresses", "address-data", "dns", "gateway", "method"];
}

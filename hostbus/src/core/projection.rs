//! Typed view over a connection profile.

use zvariant::Value;

use crate::api::models::{
    ConnectionProperties, EthernetProperties, IpProperties, SettingsProfile, VlanProperties,
    WirelessProperties, WirelessSecurityProperties,
};
use crate::core::convert;
use crate::core::settings_merge::{SettingsDocument, SettingsSection};
use crate::types::constants::settings;
use crate::Result;

/// Reads one optional field, tagging conversion failures `"<section>.<field>"`.
fn field<T>(
    section_name: &str,
    section: &SettingsSection,
    key: &str,
    convert: impl FnOnce(&str, &Value<'_>) -> Result<T>,
) -> Result<Option<T>> {
    section
        .get(key)
        .map(|value| convert(&format!("{section_name}.{key}"), &**value))
        .transpose()
}

/// Splits `doc` into typed per-section records.
///
/// A record is `Some` exactly when its section is present, even if none of
/// the fields it knows about are. Unknown sections and fields are ignored.
/// No bus access is involved.
pub fn project(doc: &SettingsDocument) -> Result<SettingsProfile> {
    let connection = doc
        .get(settings::CONNECTION)
        .map(|s| -> Result<_> {
            let name = settings::CONNECTION;
            Ok(ConnectionProperties {
                id: field(name, s, settings::ID, convert::text)?,
                uuid: field(name, s, settings::UUID, convert::text)?,
                connection_type: field(name, s, settings::TYPE, convert::text)?,
                interface_name: field(name, s, settings::INTERFACE_NAME, convert::text)?,
            })
        })
        .transpose()?;

    let ethernet = doc
        .get(settings::ETHERNET)
        .map(|s| -> Result<_> {
            Ok(EthernetProperties {
                assigned_mac: field(settings::ETHERNET, s, settings::ASSIGNED_MAC, convert::text)?,
            })
        })
        .transpose()?;

    let wireless = doc
        .get(settings::WIRELESS)
        .map(|s| -> Result<_> {
            let name = settings::WIRELESS;
            Ok(WirelessProperties {
                ssid: field(name, s, settings::SSID, convert::byte_text)?,
                assigned_mac: field(name, s, settings::ASSIGNED_MAC, convert::text)?,
                mode: field(name, s, settings::MODE, convert::text)?,
                powersave: field(name, s, settings::POWERSAVE, convert::uint32)?,
            })
        })
        .transpose()?;

    let wireless_security = doc
        .get(settings::WIRELESS_SECURITY)
        .map(|s| -> Result<_> {
            let name = settings::WIRELESS_SECURITY;
            Ok(WirelessSecurityProperties {
                auth_alg: field(name, s, settings::AUTH_ALG, convert::text)?,
                key_mgmt: field(name, s, settings::KEY_MGMT, convert::text)?,
                psk: field(name, s, settings::PSK, convert::text)?,
            })
        })
        .transpose()?;

    let vlan = doc
        .get(settings::VLAN)
        .map(|s| -> Result<_> {
            Ok(VlanProperties {
                id: field(settings::VLAN, s, settings::ID, convert::uint32)?,
                parent: field(settings::VLAN, s, settings::PARENT, convert::text)?,
            })
        })
        .transpose()?;

    let ip = |name: &str| -> Result<Option<IpProperties>> {
        doc.get(name)
            .map(|s| -> Result<_> {
                Ok(IpProperties {
                    method: field(name, s, settings::METHOD, convert::text)?,
                })
            })
            .transpose()
    };

    Ok(SettingsProfile {
        connection,
        ethernet,
        wireless,
        wireless_security,
        vlan,
        ipv4: ip(settings::IPV4)?,
        ipv6: ip(settings::IPV6)?,
    })
}

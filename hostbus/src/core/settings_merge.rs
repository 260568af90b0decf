//! Fetch-merge-write support for NetworkManager connection profiles.
//!
//! A profile is a two-level document: sections (`connection`, `ipv4`, ...)
//! mapping field names to values. Callers describe a change as a partial
//! document of the same shape, which is overlaid on a freshly fetched copy
//! of the current profile before the whole thing is written back.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use zvariant::OwnedValue;

use crate::types::constants::settings;

/// Fields of one settings section.
pub type SettingsSection = HashMap<String, OwnedValue>;

/// A complete or partial connection profile, keyed by section name.
pub type SettingsDocument = HashMap<String, SettingsSection>;

/// How one section is merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRule {
    pub name: String,
    /// Fields removed from the current section before the intent is
    /// overlaid, because the daemon derives them from other settings.
    pub strip: Vec<String>,
}

impl SectionRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strip: Vec::new(),
        }
    }

    #[must_use]
    pub fn stripping<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.strip.extend(fields.into_iter().map(Into::into));
        self
    }
}

/// The sections a merge touches and the fields it strips from each.
///
/// The default recognizes the seven profile sections and strips the
/// runtime IP fields (`addresses`, `address-data`, `dns`, `gateway`,
/// `method`) from `ipv4` and `ipv6`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePolicy {
    rules: Vec<SectionRule>,
}

impl Default for MergePolicy {
    fn default() -> Self {
        let plain = [
            settings::CONNECTION,
            settings::ETHERNET,
            settings::WIRELESS,
            settings::WIRELESS_SECURITY,
            settings::VLAN,
        ];
        let ip = [settings::IPV4, settings::IPV6];

        let rules = plain
            .into_iter()
            .map(SectionRule::new)
            .chain(
                ip.into_iter()
                    .map(|name| SectionRule::new(name).stripping(settings::IP_DERIVED_FIELDS)),
            )
            .collect();

        Self { rules }
    }
}

impl MergePolicy {
    /// A policy recognizing exactly `rules`.
    pub fn new(rules: Vec<SectionRule>) -> Self {
        Self { rules }
    }

    /// Adds `rule`, replacing any existing rule for the same section.
    #[must_use]
    pub fn with_rule(mut self, rule: SectionRule) -> Self {
        self.rules.retain(|r| r.name != rule.name);
        self.rules.push(rule);
        self
    }

    pub fn rule(&self, section: &str) -> Option<&SectionRule> {
        self.rules.iter().find(|r| r.name == section)
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }
}

/// Overlays `intent` on `current`.
///
/// For every section the policy recognizes:
///
/// - not named by the intent: kept as is;
/// - named by the intent but absent from `current`: taken from the intent;
/// - present in both: the rule's strip list is removed from the current
///   section, then the intent's fields overwrite or extend it.
///
/// Sections the policy does not recognize are dropped from the intent.
/// `current` should be the profile as just fetched from the daemon, not a
/// cached copy.
///
/// # Example
///
/// ```
/// use hostbus::core::settings_merge::{merge_settings, MergePolicy, SettingsDocument};
/// use std::collections::HashMap;
/// use zvariant::{OwnedValue, Value};
///
/// let val = |s: &str| OwnedValue::try_from(Value::from(s)).unwrap();
///
/// let mut current = SettingsDocument::new();
/// current.insert(
///     "ipv4".into(),
///     HashMap::from([
///         ("method".to_owned(), val("auto")),
///         ("gateway".to_owned(), val("192.168.1.1")),
///     ]),
/// );
///
/// let mut intent = SettingsDocument::new();
/// intent.insert("ipv4".into(), HashMap::from([("method".to_owned(), val("manual"))]));
///
/// let merged = merge_settings(current, intent, &MergePolicy::default());
/// assert_eq!(merged["ipv4"].len(), 1);
/// assert!(merged["ipv4"].contains_key("method"));
/// ```
pub fn merge_settings(
    mut current: SettingsDocument,
    intent: SettingsDocument,
    policy: &MergePolicy,
) -> SettingsDocument {
    for (name, fields) in intent {
        let Some(rule) = policy.rule(&name) else {
            continue;
        };

        match current.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(fields);
            }
            Entry::Occupied(mut slot) => {
                let section = slot.get_mut();
                for field in &rule.strip {
                    section.remove(field);
                }
                section.extend(fields);
            }
        }
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::convert;
    use zvariant::Value;

    fn val<'a>(v: impl Into<Value<'a>>) -> OwnedValue {
        OwnedValue::try_from(v.into()).unwrap()
    }

    fn section(fields: Vec<(&str, OwnedValue)>) -> SettingsSection {
        fields.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    fn text_of(doc: &SettingsDocument, section: &str, field: &str) -> Option<String> {
        doc.get(section)?
            .get(field)
            .map(|v| convert::text(field, v).unwrap())
    }

    fn sample() -> SettingsDocument {
        let mut doc = SettingsDocument::new();
        doc.insert(
            "connection".into(),
            section(vec![("id", val("Home")), ("type", val("802-11-wireless"))]),
        );
        doc.insert(
            "802-11-wireless".into(),
            section(vec![("ssid", val(b"HomeWifi".to_vec())), ("mode", val("infrastructure"))]),
        );
        doc.insert(
            "ipv4".into(),
            section(vec![
                ("method", val("auto")),
                ("address-data", val(vec!["192.168.1.20/24"])),
                ("dns", val(vec![16_843_009u32])),
                ("route-metric", val(100i64)),
            ]),
        );
        doc.insert(
            "ipv6".into(),
            section(vec![("method", val("auto")), ("gateway", val("fe80::1"))]),
        );
        doc
    }

    fn shape(doc: &SettingsDocument) -> Vec<(String, Vec<String>)> {
        let mut out: Vec<_> = doc
            .iter()
            .map(|(name, fields)| {
                let mut keys: Vec<_> = fields.keys().cloned().collect();
                keys.sort();
                (name.clone(), keys)
            })
            .collect();
        out.sort();
        out
    }

    #[test]
    fn empty_intent_is_identity() {
        let before = shape(&sample());
        let merged = merge_settings(sample(), SettingsDocument::new(), &MergePolicy::default());
        assert_eq!(shape(&merged), before);
        assert_eq!(text_of(&merged, "ipv4", "method").as_deref(), Some("auto"));
    }

    #[test]
    fn ipv4_intent_strips_derived_fields() {
        let mut intent = SettingsDocument::new();
        intent.insert("ipv4".into(), section(vec![("method", val("manual"))]));

        let merged = merge_settings(sample(), intent, &MergePolicy::default());

        let ipv4 = &merged["ipv4"];
        assert_eq!(text_of(&merged, "ipv4", "method").as_deref(), Some("manual"));
        assert!(!ipv4.contains_key("address-data"));
        assert!(!ipv4.contains_key("dns"));
        // Not in the strip list.
        assert!(ipv4.contains_key("route-metric"));

        // ipv6 was not targeted and keeps its gateway.
        assert_eq!(text_of(&merged, "ipv6", "gateway").as_deref(), Some("fe80::1"));
    }

    #[test]
    fn ipv4_only_method_survives() {
        let mut current = SettingsDocument::new();
        current.insert(
            "ipv4".into(),
            section(vec![
                ("method", val("auto")),
                ("address-data", val(vec!["10.0.0.2/8"])),
                ("dns", val(vec![134_744_072u32])),
            ]),
        );
        let mut intent = SettingsDocument::new();
        intent.insert("ipv4".into(), section(vec![("method", val("manual"))]));

        let merged = merge_settings(current, intent, &MergePolicy::default());
        assert_eq!(shape(&merged), vec![("ipv4".to_owned(), vec!["method".to_owned()])]);
        assert_eq!(text_of(&merged, "ipv4", "method").as_deref(), Some("manual"));
    }

    #[test]
    fn non_ip_sections_overlay_without_stripping() {
        let mut intent = SettingsDocument::new();
        intent.insert("802-11-wireless".into(), section(vec![("mode", val("ap"))]));

        let merged = merge_settings(sample(), intent, &MergePolicy::default());

        let wireless = &merged["802-11-wireless"];
        assert_eq!(wireless.len(), 2);
        assert_eq!(
            convert::byte_text("ssid", &wireless["ssid"]).unwrap(),
            "HomeWifi"
        );
        assert_eq!(text_of(&merged, "802-11-wireless", "mode").as_deref(), Some("ap"));
    }

    #[test]
    fn missing_section_is_adopted_verbatim() {
        let mut intent = SettingsDocument::new();
        intent.insert(
            "vlan".into(),
            section(vec![("id", val(10u32)), ("parent", val("eth0"))]),
        );

        let merged = merge_settings(sample(), intent, &MergePolicy::default());
        assert_eq!(merged["vlan"].len(), 2);
        assert_eq!(text_of(&merged, "vlan", "parent").as_deref(), Some("eth0"));
    }

    #[test]
    fn unrecognized_sections_are_ignored() {
        let mut intent = SettingsDocument::new();
        intent.insert("proxy".into(), section(vec![("method", val("none"))]));

        let merged = merge_settings(sample(), intent, &MergePolicy::default());
        assert!(!merged.contains_key("proxy"));
    }

    #[test]
    fn policy_strip_list_is_configurable() {
        let policy = MergePolicy::default().with_rule(SectionRule::new("ipv4").stripping(["dns"]));
        let mut intent = SettingsDocument::new();
        intent.insert("ipv4".into(), section(vec![("method", val("manual"))]));

        let merged = merge_settings(sample(), intent, &policy);
        let ipv4 = &merged["ipv4"];
        assert!(!ipv4.contains_key("dns"));
        assert!(ipv4.contains_key("address-data"));
    }

    #[test]
    fn default_policy_covers_profile_sections() {
        let policy = MergePolicy::default();
        let mut names: Vec<_> = policy.sections().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            [
                "802-11-wireless",
                "802-11-wireless-security",
                "802-3-ethernet",
                "connection",
                "ipv4",
                "ipv6",
                "vlan"
            ]
        );
        assert!(policy.rule("connection").unwrap().strip.is_empty());
        assert_eq!(policy.rule("ipv6").unwrap().strip.len(), 5);
    }
}

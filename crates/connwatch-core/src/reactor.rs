// ── Notification reactor ──
//
// Turns raw notification records into minimal replica patches. A record
// either fully applies, or is a no-op (unknown entry/property), or is a
// protocol violation (payload does not match the signal's shape). The
// reactor never partially applies a patch.

use serde_json::Value;
use tracing::debug;

use connwatch_bus::{Category, NotificationRecord};

use crate::error::CoreError;
use crate::event::ChangeEvent;
use crate::model::{ObjectPath, PropertyMap};
use crate::store::Replica;

/// A classified inbound record.
pub(crate) enum Inbound {
    /// A change notification for a tracked category.
    Change(Notification),
    /// An interactive-credential request from the remote service.
    Agent,
    /// A signal from an interface the core does not track.
    Unknown { interface: String },
}

/// A change notification with its category resolved.
pub(crate) struct Notification {
    pub category: Category,
    pub path: String,
    pub signal: String,
    pub data: Option<Value>,
}

/// Sort an incoming record by originating interface.
pub(crate) fn classify(record: NotificationRecord) -> Inbound {
    match record.interface.parse::<Category>() {
        Ok(category) => Inbound::Change(Notification {
            category,
            path: record.path,
            signal: record.signal,
            data: record.data,
        }),
        Err(_) if record.interface == "Agent" => Inbound::Agent,
        Err(_) => Inbound::Unknown {
            interface: record.interface,
        },
    }
}

/// Apply one notification to the replica.
///
/// Returns the normalized change when the replica was actually modified,
/// `None` for no-ops, and `ProtocolViolation` when the payload shape does
/// not match the signal.
pub(crate) fn apply(
    replica: &mut Replica,
    namespace: &str,
    notification: &Notification,
) -> Result<Option<ChangeEvent>, CoreError> {
    match notification.category {
        Category::Service => apply_service(replica, namespace, notification),
        Category::Technology => apply_technology(replica, namespace, notification),
        Category::Manager => apply_manager(replica, notification),
    }
}

// ── Per-object property changes ──────────────────────────────────────

fn apply_service(
    replica: &mut Replica,
    namespace: &str,
    notification: &Notification,
) -> Result<Option<ChangeEvent>, CoreError> {
    let (name, value) = property_pair(notification.data.as_ref())?;
    let path = ObjectPath::qualify(namespace, "service", &notification.path);

    if replica.patch_service_property(&path, name, value.clone()) {
        Ok(Some(ChangeEvent::ServiceProperty {
            path,
            name: name.to_owned(),
            value,
        }))
    } else {
        Ok(None)
    }
}

fn apply_technology(
    replica: &mut Replica,
    namespace: &str,
    notification: &Notification,
) -> Result<Option<ChangeEvent>, CoreError> {
    let (name, value) = property_pair(notification.data.as_ref())?;
    let path = ObjectPath::qualify(namespace, "technology", &notification.path);

    if replica.patch_technology_property(&path, name, value.clone()) {
        Ok(Some(ChangeEvent::TechnologyProperty {
            path,
            name: name.to_owned(),
            value,
        }))
    } else {
        Ok(None)
    }
}

// ── Manager-level signals ────────────────────────────────────────────

fn apply_manager(
    replica: &mut Replica,
    notification: &Notification,
) -> Result<Option<ChangeEvent>, CoreError> {
    match notification.signal.as_str() {
        "ServicesChanged" => apply_services_changed(replica, notification.data.as_ref()),

        "PropertyChanged" => {
            let (name, value) = property_pair(notification.data.as_ref())?;
            replica.set_global_property(name, value.clone());
            Ok(Some(ChangeEvent::GlobalProperty {
                name: name.to_owned(),
                value,
            }))
        }

        "TechnologyAdded" => {
            let (path, properties) = object_pair(notification.data.as_ref())?;
            replica.upsert_technology(path.clone(), properties);
            Ok(Some(ChangeEvent::TechnologyAdded { path }))
        }

        "TechnologyRemoved" => {
            let path = notification
                .data
                .as_ref()
                .and_then(Value::as_str)
                .ok_or_else(|| CoreError::protocol("TechnologyRemoved payload is not a path"))?;
            let path = ObjectPath::new(path);
            if replica.remove_technology(&path) {
                Ok(Some(ChangeEvent::TechnologyRemoved { path }))
            } else {
                Ok(None)
            }
        }

        // Peer-related and other manager signals are out of scope.
        other => {
            debug!(signal = other, "unhandled manager signal ignored");
            Ok(None)
        }
    }
}

fn apply_services_changed(
    replica: &mut Replica,
    data: Option<&Value>,
) -> Result<Option<ChangeEvent>, CoreError> {
    let [added_raw, removed_raw] = pair_slice(data, "ServicesChanged")?;

    // Removals first: a service that moved keeps a single entry.
    let removed_list = removed_raw
        .as_array()
        .ok_or_else(|| CoreError::protocol("ServicesChanged removed-list is not an array"))?;
    let mut removed = Vec::new();
    for item in removed_list {
        let path = item
            .as_str()
            .ok_or_else(|| CoreError::protocol("removed service entry is not a path"))?;
        let path = ObjectPath::new(path);
        if replica.remove_service(&path) {
            removed.push(path);
        }
    }

    let added_list = added_raw
        .as_array()
        .ok_or_else(|| CoreError::protocol("ServicesChanged added-list is not an array"))?;
    let mut added = Vec::new();
    for item in added_list {
        let (path, properties) = object_pair(Some(item))?;
        // An empty dictionary means "present but unmodified" -- skip it.
        if properties.is_empty() {
            continue;
        }
        added.push(path.clone());
        replica.upsert_service(path, properties);
    }

    if added.is_empty() && removed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(ChangeEvent::ServicesUpdated { added, removed }))
    }
}

// ── Payload helpers ──────────────────────────────────────────────────

fn pair_slice<'a>(
    data: Option<&'a Value>,
    signal: &str,
) -> Result<[&'a Value; 2], CoreError> {
    let items = data
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::protocol(format!("{signal} payload is not an array")))?;
    match items.as_slice() {
        [first, second] => Ok([first, second]),
        _ => Err(CoreError::protocol(format!(
            "{signal} payload must be a two-element array"
        ))),
    }
}

/// `["Name", value]` — the property-change payload shape.
fn property_pair(data: Option<&Value>) -> Result<(&str, Value), CoreError> {
    let [name, value] = pair_slice(data, "property change")?;
    let name = name
        .as_str()
        .ok_or_else(|| CoreError::protocol("property name is not a string"))?;
    Ok((name, value.clone()))
}

/// `[path, {properties}]` — the object-entry payload shape.
fn object_pair(data: Option<&Value>) -> Result<(ObjectPath, PropertyMap), CoreError> {
    let [path, dict] = pair_slice(data, "object entry")?;
    let path = path
        .as_str()
        .ok_or_else(|| CoreError::protocol("object path is not a string"))?;
    let properties: PropertyMap = serde_json::from_value(dict.clone())
        .map_err(|_| CoreError::protocol("object properties are not a dictionary"))?;
    Ok((ObjectPath::new(path), properties))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::ServiceState;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const NS: &str = "/net/connman";

    fn notification(category: Category, path: &str, signal: &str, data: Value) -> Notification {
        Notification {
            category,
            path: path.into(),
            signal: signal.into(),
            data: Some(data),
        }
    }

    fn replica_with(technologies: Value, services: Value) -> Replica {
        let mut replica = Replica::new();
        replica.load_state(
            serde_json::from_value(json!({"State": "idle", "OfflineMode": false})).unwrap(),
        );
        replica.load_technologies(serde_json::from_value(technologies).unwrap());
        replica.load_services(serde_json::from_value(services).unwrap());
        replica
    }

    fn service_paths(replica: &Replica) -> Vec<&str> {
        replica.services().map(|s| s.path().as_str()).collect()
    }

    fn technology_paths(replica: &Replica) -> Vec<&str> {
        replica.technologies().map(|t| t.path().as_str()).collect()
    }

    fn wifi_fixture() -> Replica {
        replica_with(
            json!([
                {"path": "/net/connman/technology/wifi",
                 "properties": {"Name": "WiFi", "Type": "wifi", "Powered": true, "Connected": true}},
                {"path": "/net/connman/technology/ethernet",
                 "properties": {"Name": "Wired", "Type": "ethernet", "Powered": true, "Connected": false}},
            ]),
            json!([
                {"path": "/net/connman/service/wifi_home",
                 "properties": {"Name": "Home", "Type": "wifi", "State": "online", "Strength": 81}},
                {"path": "/net/connman/service/wifi_cafe",
                 "properties": {"Name": "Cafe", "Type": "wifi", "State": "idle", "Strength": 40}},
            ]),
        )
    }

    // ── Per-service property changes ─────────────────────────────────

    #[test]
    fn service_property_change_patches_in_place() {
        let mut replica = wifi_fixture();
        let n = notification(
            Category::Service,
            "wifi_home",
            "PropertyChanged",
            json!(["Strength", 57]),
        );

        let change = apply(&mut replica, NS, &n).unwrap();
        assert_eq!(
            change,
            Some(ChangeEvent::ServiceProperty {
                path: ObjectPath::new("/net/connman/service/wifi_home"),
                name: "Strength".into(),
                value: json!(57),
            })
        );
        let service = replica
            .service(&ObjectPath::new("/net/connman/service/wifi_home"))
            .unwrap();
        assert_eq!(service.strength(), Some(57));
    }

    #[test]
    fn unknown_service_is_ignored_unchanged() {
        let mut replica = wifi_fixture();
        let before = serde_json::to_value(replica.services().collect::<Vec<_>>()).unwrap();

        let n = notification(
            Category::Service,
            "wifi_nowhere",
            "PropertyChanged",
            json!(["Strength", 10]),
        );
        assert_eq!(apply(&mut replica, NS, &n).unwrap(), None);

        let after = serde_json::to_value(replica.services().collect::<Vec<_>>()).unwrap();
        assert_eq!(before, after);
        assert!(replica.last_patch().is_none());
    }

    #[test]
    fn unknown_property_is_not_introduced() {
        let mut replica = wifi_fixture();
        let n = notification(
            Category::Service,
            "wifi_home",
            "PropertyChanged",
            json!(["Favorite", true]),
        );

        assert_eq!(apply(&mut replica, NS, &n).unwrap(), None);
        let service = replica
            .service(&ObjectPath::new("/net/connman/service/wifi_home"))
            .unwrap();
        assert!(service.properties().get("Favorite").is_none());
    }

    #[test]
    fn later_patch_wins_for_same_property() {
        let mut replica = wifi_fixture();
        for strength in [12, 93] {
            let n = notification(
                Category::Service,
                "wifi_home",
                "PropertyChanged",
                json!(["Strength", strength]),
            );
            apply(&mut replica, NS, &n).unwrap();
        }

        let service = replica
            .service(&ObjectPath::new("/net/connman/service/wifi_home"))
            .unwrap();
        assert_eq!(service.strength(), Some(93));
    }

    #[test]
    fn technology_property_change_patches_in_place() {
        let mut replica = wifi_fixture();
        let n = notification(
            Category::Technology,
            "ethernet",
            "PropertyChanged",
            json!(["Connected", true]),
        );

        assert!(apply(&mut replica, NS, &n).unwrap().is_some());
        let tech = replica
            .technology(&ObjectPath::new("/net/connman/technology/ethernet"))
            .unwrap();
        assert!(tech.connected());
    }

    // ── Manager: ServicesChanged ─────────────────────────────────────

    #[test]
    fn services_changed_adds_and_removes() {
        let mut replica = wifi_fixture();
        let n = notification(
            Category::Manager,
            "/",
            "ServicesChanged",
            json!([
                [["/net/connman/service/wifi_new", {"Name": "New", "Type": "wifi", "State": "online"}]],
                ["/net/connman/service/wifi_cafe"],
            ]),
        );

        let change = apply(&mut replica, NS, &n).unwrap();
        assert_eq!(
            change,
            Some(ChangeEvent::ServicesUpdated {
                added: vec![ObjectPath::new("/net/connman/service/wifi_new")],
                removed: vec![ObjectPath::new("/net/connman/service/wifi_cafe")],
            })
        );
        assert_eq!(
            service_paths(&replica),
            ["/net/connman/service/wifi_home", "/net/connman/service/wifi_new"]
        );
    }

    #[test]
    fn services_changed_skips_empty_dictionaries() {
        let mut replica = wifi_fixture();
        let n = notification(
            Category::Manager,
            "/",
            "ServicesChanged",
            json!([[["/net/connman/service/wifi_home", {}]], []]),
        );

        assert_eq!(apply(&mut replica, NS, &n).unwrap(), None);
        assert_eq!(replica.service_count(), 2);
    }

    #[test]
    fn services_changed_upsert_replaces_existing_properties() {
        let mut replica = wifi_fixture();
        let n = notification(
            Category::Manager,
            "/",
            "ServicesChanged",
            json!([[["/net/connman/service/wifi_home", {"Name": "Home-5G", "Type": "wifi", "State": "ready"}]], []]),
        );

        apply(&mut replica, NS, &n).unwrap();
        assert_eq!(replica.service_count(), 2);
        let service = replica
            .service(&ObjectPath::new("/net/connman/service/wifi_home"))
            .unwrap();
        assert_eq!(service.name(), Some("Home-5G"));
        assert_eq!(service.state(), Some(ServiceState::Ready));
    }

    #[test]
    fn removed_then_readded_service_appears_once() {
        let mut replica = wifi_fixture();
        let n = notification(
            Category::Manager,
            "/",
            "ServicesChanged",
            json!([
                [["/net/connman/service/wifi_home", {"Name": "Home", "Type": "wifi", "State": "idle"}]],
                ["/net/connman/service/wifi_home"],
            ]),
        );

        apply(&mut replica, NS, &n).unwrap();
        let homes = service_paths(&replica)
            .iter()
            .filter(|p| **p == "/net/connman/service/wifi_home")
            .count();
        assert_eq!(homes, 1);
    }

    // ── Manager: global state ────────────────────────────────────────

    #[test]
    fn manager_property_change_adds_absent_global_property() {
        let mut replica = wifi_fixture();
        let n = notification(
            Category::Manager,
            "/",
            "PropertyChanged",
            json!(["SessionMode", true]),
        );

        assert!(apply(&mut replica, NS, &n).unwrap().is_some());
        assert_eq!(replica.global_state().get("SessionMode"), Some(&json!(true)));
    }

    // ── Manager: technologies ────────────────────────────────────────

    #[test]
    fn technology_added_appends() {
        let mut replica = wifi_fixture();
        let n = notification(
            Category::Manager,
            "/",
            "TechnologyAdded",
            json!(["/net/connman/technology/bluetooth", {"Name": "Bluetooth", "Type": "bluetooth", "Powered": false}]),
        );

        apply(&mut replica, NS, &n).unwrap();
        assert_eq!(
            technology_paths(&replica),
            [
                "/net/connman/technology/wifi",
                "/net/connman/technology/ethernet",
                "/net/connman/technology/bluetooth",
            ]
        );
    }

    #[test]
    fn technology_removed_preserves_relative_order() {
        let mut replica = wifi_fixture();
        let n = notification(
            Category::Manager,
            "/",
            "TechnologyRemoved",
            json!("/net/connman/technology/wifi"),
        );

        let change = apply(&mut replica, NS, &n).unwrap();
        assert_eq!(
            change,
            Some(ChangeEvent::TechnologyRemoved {
                path: ObjectPath::new("/net/connman/technology/wifi"),
            })
        );
        assert_eq!(technology_paths(&replica), ["/net/connman/technology/ethernet"]);
    }

    #[test]
    fn technology_removed_for_unknown_path_is_a_no_op() {
        let mut replica = wifi_fixture();
        let n = notification(
            Category::Manager,
            "/",
            "TechnologyRemoved",
            json!("/net/connman/technology/cellular"),
        );

        assert_eq!(apply(&mut replica, NS, &n).unwrap(), None);
        assert_eq!(replica.technology_count(), 2);
    }

    #[test]
    fn unknown_manager_signal_is_ignored() {
        let mut replica = wifi_fixture();
        let n = notification(Category::Manager, "/", "PeersChanged", json!([[], []]));
        assert_eq!(apply(&mut replica, NS, &n).unwrap(), None);
    }

    // ── Uniqueness across a patch sequence ───────────────────────────

    #[test]
    fn identifiers_stay_unique_across_patch_sequences() {
        let mut replica = wifi_fixture();
        let patches = [
            notification(
                Category::Manager,
                "/",
                "TechnologyAdded",
                json!(["/net/connman/technology/wifi", {"Name": "WiFi", "Type": "wifi"}]),
            ),
            notification(
                Category::Manager,
                "/",
                "ServicesChanged",
                json!([[["/net/connman/service/wifi_home", {"Name": "Home", "Type": "wifi", "State": "online"}]], []]),
            ),
            notification(
                Category::Manager,
                "/",
                "ServicesChanged",
                json!([[["/net/connman/service/wifi_cafe", {"Name": "Cafe", "Type": "wifi", "State": "idle"}]],
                       ["/net/connman/service/wifi_home"]]),
            ),
        ];
        for n in &patches {
            apply(&mut replica, NS, n).unwrap();
        }

        let mut services = service_paths(&replica);
        services.sort_unstable();
        services.dedup();
        assert_eq!(services.len(), replica.service_count());

        let mut technologies = technology_paths(&replica);
        technologies.sort_unstable();
        technologies.dedup();
        assert_eq!(technologies.len(), replica.technology_count());
    }

    // ── Malformed payloads ───────────────────────────────────────────

    #[test]
    fn malformed_payloads_are_protocol_violations() {
        let mut replica = wifi_fixture();
        let cases = [
            notification(Category::Service, "wifi_home", "PropertyChanged", json!("oops")),
            notification(Category::Service, "wifi_home", "PropertyChanged", json!(["only-one"])),
            notification(Category::Manager, "/", "ServicesChanged", json!({"added": []})),
            notification(Category::Manager, "/", "TechnologyRemoved", json!(42)),
            notification(Category::Manager, "/", "TechnologyAdded", json!(["/t/x", "not-a-dict"])),
        ];

        for n in cases {
            let result = apply(&mut replica, NS, &n);
            assert!(
                matches!(result, Err(CoreError::ProtocolViolation { .. })),
                "expected protocol violation for signal {}",
                n.signal
            );
        }
        // None of them touched the replica.
        assert_eq!(replica.service_count(), 2);
        assert_eq!(replica.technology_count(), 2);
    }

    // ── Classification ───────────────────────────────────────────────

    #[test]
    fn classify_routes_by_interface() {
        let record = |interface: &str| NotificationRecord {
            interface: interface.into(),
            path: String::new(),
            signal: "PropertyChanged".into(),
            data: None,
        };

        assert!(matches!(classify(record("Service")), Inbound::Change(n) if n.category == Category::Service));
        assert!(matches!(classify(record("Agent")), Inbound::Agent));
        assert!(matches!(classify(record("Peer")), Inbound::Unknown { .. }));
    }
}

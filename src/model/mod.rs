pub mod stats;

use serde::{Deserialize, Deserializer, Serialize};

use crate::map::LatLng;

/// Owner name shown when a node's `memberId` does not resolve.
pub const UNKNOWN_OWNER: &str = "Unknown";

/// Read an explicit `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Raw `{lat, lng}` pair as it appears in `nodes.json`.
///
/// Either coordinate may be missing or null; use [`Node::coordinates`] to get
/// a position that is safe to hand to the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLocation {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// A mesh network device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub area: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hardware: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mesh_role: String,
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub location: Option<RawLocation>,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub is_online: Option<bool>,
    #[serde(default)]
    pub is_testing: Option<bool>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_on_map: bool,
}

impl Node {
    /// First dot-segment of the id (`rep01` for `rep01.ip3.ipnt.uk`).
    pub fn short_id(&self) -> &str {
        self.id.split('.').next().unwrap_or(&self.id)
    }

    /// Area code as it appears in URLs.
    pub fn route_area(&self) -> String {
        self.area.to_ascii_lowercase()
    }

    /// Missing `isOnline` counts as online.
    pub fn is_online(&self) -> bool {
        self.is_online != Some(false)
    }

    pub fn is_testing(&self) -> bool {
        self.is_testing == Some(true)
    }

    /// Only records explicitly marked public are shown.
    pub fn is_public(&self) -> bool {
        self.is_public == Some(true)
    }

    pub fn is_repeater(&self) -> bool {
        self.mesh_role == "repeater"
    }

    /// Name for list rows and popups; falls back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Position on the map, if both coordinates are present and sane.
    ///
    /// `(0, 0)` is treated as an unset location.
    pub fn coordinates(&self) -> Option<LatLng> {
        let raw = self.location?;
        let lat = raw.lat?;
        let lng = raw.lng?;
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        if lat == 0.0 && lng == 0.0 {
            return None;
        }
        Some(LatLng::new(lat, lng))
    }

    /// Whether the node gets a marker when it survives filtering.
    pub fn is_mappable(&self) -> bool {
        self.show_on_map && self.coordinates().is_some()
    }

    /// Fill `area` from the second dot-segment of the id when the input
    /// omitted it.
    pub(crate) fn normalize(&mut self) {
        if self.area.trim().is_empty() {
            if let Some(area) = self.id.split('.').nth(1) {
                self.area = area.to_string();
            }
        }
    }
}

/// A node owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub avatar_path: Option<String>,
    #[serde(default, alias = "joined", alias = "joinedDate")]
    pub join_date: Option<String>,
}

impl Member {
    pub fn is_public(&self) -> bool {
        self.is_public == Some(true)
    }
}

/// Resolve a node owner's display name, `"Unknown"` when absent.
pub fn owner_name<'a>(members: &'a [Member], member_id: Option<&str>) -> &'a str {
    member_id
        .and_then(|id| members.iter().find(|m| m.id == id))
        .map(|m| m.name.as_str())
        .unwrap_or(UNKNOWN_OWNER)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfigLocation {
    pub center: LatLng,
    #[serde(default = "default_config_zoom")]
    pub zoom: f64,
}

fn default_config_zoom() -> f64 {
    11.0
}

/// Site-level configuration (`config.json`).
///
/// Only `location` is read by the engine; everything else (contact details
/// and the like) is kept as opaque JSON for the viewer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub location: Option<ConfigLocation>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Everything the data provider hands over for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub config: SiteConfig,
    pub nodes: Vec<Node>,
    pub members: Vec<Member>,
}

impl Dataset {
    /// The zero-state used when loading fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a dataset from raw records, dropping non-public entries and
    /// normalizing node areas.
    pub fn from_parts(config: SiteConfig, nodes: Vec<Node>, members: Vec<Member>) -> Self {
        let nodes = nodes
            .into_iter()
            .filter(Node::is_public)
            .map(|mut n| {
                n.normalize();
                n
            })
            .collect();
        let members = members.into_iter().filter(Member::is_public).collect();
        Self {
            config,
            nodes,
            members,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.members.is_empty()
    }

    pub fn owner_name(&self, member_id: Option<&str>) -> &str {
        owner_name(&self.members, member_id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn node(id: &str, lat: f64, lng: f64) -> Node {
        let mut n = Node {
            id: id.to_string(),
            area: String::new(),
            name: format!("Node {}", id),
            hardware: "Heltec V3".to_string(),
            mesh_role: "client".to_string(),
            member_id: None,
            location: Some(RawLocation {
                lat: Some(lat),
                lng: Some(lng),
            }),
            elevation: None,
            is_online: None,
            is_testing: None,
            is_public: Some(true),
            show_on_map: true,
        };
        n.normalize();
        n
    }

    pub fn member(id: &str, name: &str) -> Member {
        Member {
            id: id.to_string(),
            name: name.to_string(),
            is_public: Some(true),
            avatar_path: None,
            join_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn parses_camel_case_node() {
        let json = r#"{
            "id": "rep01.ip3.ipnt.uk",
            "area": "IP3",
            "name": "Ipswich Repeater",
            "hardware": "RAK4631",
            "meshRole": "repeater",
            "memberId": "m1",
            "location": {"lat": 52.0, "lng": 1.1},
            "isOnline": false,
            "isPublic": true,
            "showOnMap": true
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.short_id(), "rep01");
        assert_eq!(node.route_area(), "ip3");
        assert!(!node.is_online());
        assert!(!node.is_testing());
        assert!(node.is_public());
        assert!(node.is_repeater());
        assert_eq!(node.coordinates(), Some(LatLng::new(52.0, 1.1)));
    }

    #[test]
    fn missing_fields_degrade_to_defaults() {
        let node: Node = serde_json::from_str(r#"{"id": "c1.ip4.ipnt.uk"}"#).unwrap();
        assert!(node.is_online());
        assert!(!node.is_testing());
        assert!(!node.show_on_map);
        assert_eq!(node.coordinates(), None);
        assert_eq!(node.display_name(), "c1.ip4.ipnt.uk");
        assert!(!node.is_public());
    }

    #[test]
    fn null_fields_degrade_to_defaults() {
        let json = r#"{
            "id": "rep01.ip3.ipnt.uk",
            "area": null,
            "name": null,
            "hardware": null,
            "meshRole": null,
            "memberId": null,
            "location": null,
            "isOnline": null,
            "isPublic": true,
            "showOnMap": null
        }"#;
        let mut node: Node = serde_json::from_str(json).unwrap();
        node.normalize();
        assert_eq!(node.area, "ip3");
        assert_eq!(node.display_name(), "rep01.ip3.ipnt.uk");
        assert_eq!(node.hardware, "");
        assert!(!node.is_repeater());
        assert!(node.is_online());
        assert!(!node.show_on_map);

        let member: Member = serde_json::from_str(r#"{"id": "m1", "name": null}"#).unwrap();
        assert_eq!(member.name, "");
    }

    #[test]
    fn unresolvable_coordinates() {
        let mut n = node("a.ip1.ipnt.uk", 0.0, 0.0);
        assert_eq!(n.coordinates(), None);
        n.location = Some(RawLocation {
            lat: Some(f64::NAN),
            lng: Some(1.0),
        });
        assert_eq!(n.coordinates(), None);
        n.location = Some(RawLocation {
            lat: Some(52.0),
            lng: None,
        });
        assert_eq!(n.coordinates(), None);
        n.location = Some(RawLocation {
            lat: Some(95.0),
            lng: Some(1.0),
        });
        assert_eq!(n.coordinates(), None);
    }

    #[test]
    fn area_derived_from_id() {
        let n = node("rep02.ip5.ipnt.uk", 52.0, 1.0);
        assert_eq!(n.area, "ip5");
    }

    #[test]
    fn unknown_owner_literal() {
        let members = vec![member("m1", "Alice")];
        assert_eq!(owner_name(&members, Some("m1")), "Alice");
        assert_eq!(owner_name(&members, Some("m404")), "Unknown");
        assert_eq!(owner_name(&members, None), "Unknown");
    }

    #[test]
    fn dataset_drops_private_entries() {
        let mut hidden = node("h.ip1.ipnt.uk", 52.0, 1.0);
        hidden.is_public = Some(false);
        let mut unmarked = node("u.ip1.ipnt.uk", 52.0, 1.0);
        unmarked.is_public = None;
        let mut private_member = member("m2", "Bob");
        private_member.is_public = Some(false);
        let mut unmarked_member = member("m3", "Carol");
        unmarked_member.is_public = None;
        let data = Dataset::from_parts(
            SiteConfig::default(),
            vec![node("v.ip1.ipnt.uk", 52.0, 1.0), hidden, unmarked],
            vec![member("m1", "Alice"), private_member, unmarked_member],
        );
        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.members.len(), 1);
        assert!(data.node("v.ip1.ipnt.uk").is_some());
    }

    #[test]
    fn site_config_keeps_extra_keys() {
        let json = r#"{"location": {"center": {"lat": 52.05, "lng": 1.15}, "zoom": 10},
                       "contact": {"email": "hello@example.org"}}"#;
        let cfg: SiteConfig = serde_json::from_str(json).unwrap();
        let loc = cfg.location.unwrap();
        assert_eq!(loc.zoom, 10.0);
        assert!(cfg.extra.contains_key("contact"));
    }
}

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use crate::model::Node;

/// User-chosen constraints on the node list.
///
/// Every dimension is optional; `None` or an empty string means the
/// dimension does not constrain anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Case-insensitive substring of `hardware`.
    pub hardware: Option<String>,
    /// Exact `meshRole`.
    pub mesh_role: Option<String>,
    /// Exact `memberId`.
    pub member_id: Option<String>,
    pub online_only: bool,
    pub include_testing: bool,
}

impl FilterCriteria {
    fn hardware_needle(&self) -> Option<String> {
        active(&self.hardware).map(str::to_lowercase)
    }

    /// Whether a single node passes every active dimension.
    pub fn matches(&self, node: &Node) -> bool {
        self.matches_with(node, self.hardware_needle().as_deref())
    }

    fn matches_with(&self, node: &Node, hardware_needle: Option<&str>) -> bool {
        let hardware_ok =
            hardware_needle.map_or(true, |needle| node.hardware.to_lowercase().contains(needle));
        let role_ok = active(&self.mesh_role).map_or(true, |role| node.mesh_role == role);
        let owner_ok =
            active(&self.member_id).map_or(true, |owner| node.member_id.as_deref() == Some(owner));
        let online_ok = !self.online_only || node.is_online();
        let testing_ok = self.include_testing || !node.is_testing();

        hardware_ok && role_ok && owner_ok && online_ok && testing_ok
    }

    pub fn is_unconstrained(&self) -> bool {
        active(&self.hardware).is_none()
            && active(&self.mesh_role).is_none()
            && active(&self.member_id).is_none()
            && !self.online_only
            && self.include_testing
    }
}

fn active(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Display order for nodes: area, then id.
pub fn node_order(a: &Node, b: &Node) -> Ordering {
    a.area.cmp(&b.area).then_with(|| a.id.cmp(&b.id))
}

/// Filter and order a node sequence. Pure; the input is left untouched.
pub fn apply(nodes: &[Node], criteria: &FilterCriteria) -> Vec<Node> {
    let needle = criteria.hardware_needle();
    let mut out: Vec<Node> = nodes
        .iter()
        .filter(|n| criteria.matches_with(n, needle.as_deref()))
        .cloned()
        .collect();
    out.sort_by(node_order);
    log::debug!("filter kept {} of {} nodes", out.len(), nodes.len());
    out
}

/// Dropdown values, always computed from the unfiltered sequence so the
/// choices never shrink while the user filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Distinct hardware strings, first-seen order.
    pub hardware: Vec<String>,
    /// Distinct mesh roles, first-seen order.
    pub mesh_roles: Vec<String>,
    /// Distinct owner ids, sorted.
    pub owners: Vec<String>,
}

impl FilterOptions {
    pub fn from_nodes(nodes: &[Node]) -> Self {
        Self {
            hardware: distinct(nodes.iter().map(|n| n.hardware.as_str())),
            mesh_roles: distinct(nodes.iter().map(|n| n.mesh_role.as_str())),
            owners: nodes
                .iter()
                .filter_map(|n| n.member_id.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| !v.is_empty() && seen.insert(*v))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::node;

    fn sample() -> Vec<Node> {
        let mut a = node("rep01.ip3.ipnt.uk", 52.0, 1.1);
        a.mesh_role = "repeater".into();
        a.hardware = "RAK4631".into();
        a.member_id = Some("m2".into());

        let mut b = node("cli01.ip1.ipnt.uk", 52.05, 1.15);
        b.hardware = "Heltec V3".into();
        b.member_id = Some("m1".into());
        b.is_online = Some(false);

        let mut c = node("tst01.ip3.ipnt.uk", 52.01, 1.12);
        c.hardware = "heltec v3".into();
        c.is_testing = Some(true);
        c.member_id = Some("m1".into());

        let mut d = node("cli02.ip1.ipnt.uk", 52.06, 1.16);
        d.hardware = "T-Beam".into();

        vec![a, b, c, d]
    }

    fn ids(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn default_criteria_hides_testing_and_orders() {
        let out = apply(&sample(), &FilterCriteria::default());
        assert_eq!(
            ids(&out),
            vec!["cli01.ip1.ipnt.uk", "cli02.ip1.ipnt.uk", "rep01.ip3.ipnt.uk"]
        );
    }

    #[test]
    fn include_testing() {
        let criteria = FilterCriteria {
            include_testing: true,
            ..Default::default()
        };
        let out = apply(&sample(), &criteria);
        assert_eq!(out.len(), 4);
        assert_eq!(out[3].id, "tst01.ip3.ipnt.uk");
    }

    #[test]
    fn hardware_is_case_insensitive_substring() {
        let criteria = FilterCriteria {
            hardware: Some("HELTEC".into()),
            include_testing: true,
            ..Default::default()
        };
        let out = apply(&sample(), &criteria);
        assert_eq!(ids(&out), vec!["cli01.ip1.ipnt.uk", "tst01.ip3.ipnt.uk"]);
    }

    #[test]
    fn role_owner_and_online_combine() {
        let criteria = FilterCriteria {
            member_id: Some("m1".into()),
            online_only: true,
            include_testing: true,
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &criteria)), vec!["tst01.ip3.ipnt.uk"]);

        let criteria = FilterCriteria {
            mesh_role: Some("repeater".into()),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &criteria)), vec!["rep01.ip3.ipnt.uk"]);
    }

    #[test]
    fn empty_strings_do_not_constrain() {
        let criteria = FilterCriteria {
            hardware: Some(String::new()),
            mesh_role: Some(String::new()),
            member_id: Some(String::new()),
            include_testing: true,
            ..Default::default()
        };
        assert!(criteria.is_unconstrained());
        assert_eq!(apply(&sample(), &criteria).len(), 4);
    }

    #[test]
    fn output_is_subset_satisfying_predicate_and_sorted() {
        let nodes = sample();
        let all = [
            FilterCriteria::default(),
            FilterCriteria {
                online_only: true,
                ..Default::default()
            },
            FilterCriteria {
                hardware: Some("v3".into()),
                include_testing: true,
                ..Default::default()
            },
            FilterCriteria {
                member_id: Some("m2".into()),
                mesh_role: Some("client".into()),
                ..Default::default()
            },
        ];
        for criteria in &all {
            let out = apply(&nodes, criteria);
            for n in &out {
                assert!(nodes.contains(n));
                assert!(criteria.matches(n));
            }
            assert!(out.windows(2).all(|w| node_order(&w[0], &w[1]) == Ordering::Less));
            assert_eq!(apply(&out, criteria), out);
        }
    }

    #[test]
    fn options_come_from_unfiltered_nodes() {
        let opts = FilterOptions::from_nodes(&sample());
        assert_eq!(opts.hardware, vec!["RAK4631", "Heltec V3", "heltec v3", "T-Beam"]);
        assert_eq!(opts.mesh_roles, vec!["repeater", "client"]);
        assert_eq!(opts.owners, vec!["m1", "m2"]);
    }
}

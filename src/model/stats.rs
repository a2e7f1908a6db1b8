//! Summary figures shown next to the directory: totals, coverage estimate,
//! and per-member helpers.

use chrono::{DateTime, NaiveDate};

use crate::map::LatLngBounds;

use super::{Dataset, Member, Node};

/// km² per square degree, a rough figure good enough for a headline stat.
const KM2_PER_SQ_DEGREE: f64 = 12_400.0;
const MIN_COVERAGE_KM2: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteStats {
    pub total_nodes: usize,
    pub total_members: usize,
    pub coverage_area_km2: u64,
}

impl SiteStats {
    pub fn from_dataset(data: &Dataset) -> Self {
        Self {
            total_nodes: data.nodes.len(),
            total_members: data.members.len(),
            coverage_area_km2: coverage_area_km2(&data.nodes),
        }
    }
}

/// Bounding-box coverage estimate. Zero without any located node, otherwise
/// at least 50 km².
pub fn coverage_area_km2(nodes: &[Node]) -> u64 {
    let Some(bounds) = LatLngBounds::from_points(nodes.iter().filter_map(Node::coordinates)) else {
        return 0;
    };
    let area = (bounds.lat_span() * bounds.lng_span() * KM2_PER_SQ_DEGREE).round();
    (area as u64).max(MIN_COVERAGE_KM2)
}

pub fn online_count(nodes: &[Node]) -> usize {
    nodes.iter().filter(|n| n.is_online()).count()
}

pub fn repeater_count(nodes: &[Node]) -> usize {
    nodes.iter().filter(|n| n.is_repeater()).count()
}

/// Public nodes owned by a member.
pub fn member_node_count(nodes: &[Node], member_id: &str) -> usize {
    nodes
        .iter()
        .filter(|n| n.is_public() && n.member_id.as_deref() == Some(member_id))
        .count()
}

/// Avatar URL under the deployment prefix, `None` when the member has none.
pub fn avatar_url(member: &Member, path_prefix: &str) -> Option<String> {
    let path = member.avatar_path.as_deref().filter(|p| !p.is_empty())?;
    Some(format!("{}{}", path_prefix.trim_end_matches('/'), path))
}

/// One line of the members listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRow {
    pub id: String,
    pub name: String,
    pub node_count: usize,
    pub avatar_url: Option<String>,
    pub joined: String,
}

/// Members in dataset order with their node counts.
pub fn member_rows(data: &Dataset, path_prefix: &str) -> Vec<MemberRow> {
    data.members
        .iter()
        .map(|m| MemberRow {
            id: m.id.clone(),
            name: m.name.clone(),
            node_count: member_node_count(&data.nodes, &m.id),
            avatar_url: avatar_url(m, path_prefix),
            joined: format_join_date(m.join_date.as_deref()),
        })
        .collect()
}

/// "March 2024" style join date. Accepts plain dates and RFC 3339 stamps;
/// anything else yields an empty string.
pub fn format_join_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return String::new();
    };
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d").ok());
    match date {
        Some(d) => d.format("%B %Y").to_string(),
        None => {
            log::debug!("unparseable join date: {}", raw);
            String::new()
        }
    }
}

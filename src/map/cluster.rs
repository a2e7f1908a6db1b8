//! Greedy pixel-radius clustering.
//!
//! Markers are visited in insertion order; each joins the first cluster whose
//! anchor lies within the radius at the current zoom, otherwise it starts a
//! new one. Cheap and stable for the tens-to-hundreds of markers a mesh
//! directory holds.

use super::projection::{project, unproject, Point};
use super::{ClusterOptions, LatLng, MarkerId};

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Mean position of the members.
    pub center: LatLng,
    pub members: Vec<MarkerId>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }
}

pub fn cluster_markers(
    markers: &[(MarkerId, LatLng)],
    zoom: f64,
    options: &ClusterOptions,
) -> Vec<Cluster> {
    if zoom >= options.disable_clustering_at_zoom {
        return markers
            .iter()
            .map(|&(id, pos)| Cluster {
                center: pos,
                members: vec![id],
            })
            .collect();
    }

    struct Group {
        anchor: Point,
        sum: Point,
        members: Vec<MarkerId>,
    }

    let radius_sq = options.max_cluster_radius_px * options.max_cluster_radius_px;
    let mut groups: Vec<Group> = Vec::new();

    for &(id, pos) in markers {
        let pt = project(pos, zoom);
        let hit = groups.iter_mut().find(|g| {
            let dx = g.anchor.x - pt.x;
            let dy = g.anchor.y - pt.y;
            dx * dx + dy * dy <= radius_sq
        });
        match hit {
            Some(g) => {
                g.sum.x += pt.x;
                g.sum.y += pt.y;
                g.members.push(id);
            }
            None => groups.push(Group {
                anchor: pt,
                sum: pt,
                members: vec![id],
            }),
        }
    }

    groups
        .into_iter()
        .map(|g| {
            let n = g.members.len() as f64;
            let mean = Point {
                x: g.sum.x / n,
                y: g.sum.y / n,
            };
            Cluster {
                center: unproject(mean, zoom),
                members: g.members,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<(MarkerId, LatLng)> {
        vec![
            (MarkerId(1), LatLng::new(52.0000, 1.1000)),
            (MarkerId(2), LatLng::new(52.0005, 1.1005)),
            (MarkerId(3), LatLng::new(52.3000, 1.6000)),
        ]
    }

    #[test]
    fn nearby_markers_merge_at_low_zoom() {
        let clusters = cluster_markers(&markers(), 10.0, &ClusterOptions::default());
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members, vec![MarkerId(1), MarkerId(2)]);
        assert!(clusters[1].is_single());
    }

    #[test]
    fn clustering_off_at_threshold() {
        let clusters = cluster_markers(&markers(), 16.0, &ClusterOptions::default());
        assert_eq!(clusters.len(), 3);
        assert!(clusters.iter().all(Cluster::is_single));
    }

    #[test]
    fn every_marker_lands_in_exactly_one_cluster() {
        let clusters = cluster_markers(&markers(), 3.0, &ClusterOptions::default());
        let total: usize = clusters.iter().map(Cluster::len).sum();
        assert_eq!(total, 3);
        assert_eq!(clusters.len(), 1);
    }
}

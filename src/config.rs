//! Engine constants and viewer configuration.
//!
//! Values can be overridden through environment variables:
//!
//! | variable               | meaning                                       |
//! |------------------------|-----------------------------------------------|
//! | `MESHVIEW_SITE`        | base URL of the deployed site                 |
//! | `MESHVIEW_DATA_DIR`    | local site root holding `assets/data/*.json`  |
//! | `MESHVIEW_PATH_PREFIX` | deployment base path (e.g. `/mesh`)           |
//! | `MESHVIEW_DOMAIN`      | node id domain suffix (default `ipnt.uk`)     |
//! | `MESHVIEW_ROUTE_STYLE` | `short` (`/<area>/<id>`) or `nodes`           |

use std::path::PathBuf;

use crate::map::{CameraView, ClusterOptions, LatLng};

/// Camera constants used by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTuning {
    /// Zoom used when exactly one node is visible.
    pub single_node_zoom: f64,
    pub fit_padding_px: f64,
    /// Cap for fitting many nodes, so near-identical positions do not
    /// zoom in absurdly far.
    pub fit_max_zoom: f64,
    /// Zoom for a node's detail view.
    pub focus_zoom: f64,
    pub popup_clearance_max_px: f64,
    pub popup_clearance_ratio: f64,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            single_node_zoom: 13.0,
            fit_padding_px: 20.0,
            fit_max_zoom: 13.0,
            focus_zoom: 16.0,
            popup_clearance_max_px: 80.0,
            popup_clearance_ratio: 0.15,
        }
    }
}

/// Camera when nothing else is known.
pub const FALLBACK_VIEW: CameraView = CameraView {
    center: LatLng::new(52.05917, 1.15545),
    zoom: 11.0,
};

/// Zoom for the initial camera when more than one node has a location.
pub const INITIAL_MULTI_NODE_ZOOM: f64 = 11.0;

/// Shape of the canonical detail URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteStyle {
    /// `/<area>/<shortId>`
    #[default]
    Short,
    /// `/nodes/<area>/<shortId>`
    Nodes,
}

impl RouteStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Some(RouteStyle::Short),
            "nodes" => Some(RouteStyle::Nodes),
            _ => None,
        }
    }
}

/// Settings shared by the router and the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Domain suffix of node ids (`<shortId>.<area>.<domain>`).
    pub domain: String,
    /// Deployment base path, no trailing slash (`""` for root).
    pub path_prefix: String,
    pub route_style: RouteStyle,
    pub camera: CameraTuning,
    pub cluster: ClusterOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            domain: "ipnt.uk".to_string(),
            path_prefix: String::new(),
            route_style: RouteStyle::Short,
            camera: CameraTuning::default(),
            cluster: ClusterOptions::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_path_prefix(mut self, prefix: &str) -> Self {
        self.path_prefix = normalize_prefix(prefix);
        self
    }
}

/// `"mesh/"` → `"/mesh"`, `"/"` → `""`.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Where the viewer gets its data from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSetting {
    Site(String),
    Dir(PathBuf),
}

/// Viewer configuration, defaults overridable from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub source: SourceSetting,
    /// Explicit prefix; when `None` and the source is a site, the prefix is
    /// discovered from the site's `<meta name="path-prefix">` tag.
    pub path_prefix: Option<String>,
    /// URL to open at start-up.
    pub start_url: String,
    pub engine: EngineConfig,
}

impl ViewerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let source = match (lookup("MESHVIEW_SITE"), lookup("MESHVIEW_DATA_DIR")) {
            (Some(site), _) if !site.trim().is_empty() => SourceSetting::Site(site),
            (_, Some(dir)) if !dir.trim().is_empty() => SourceSetting::Dir(PathBuf::from(dir)),
            _ => SourceSetting::Dir(PathBuf::from(".")),
        };
        let path_prefix = lookup("MESHVIEW_PATH_PREFIX").map(|p| normalize_prefix(&p));

        let mut engine = EngineConfig::default();
        if let Some(domain) = lookup("MESHVIEW_DOMAIN").filter(|d| !d.trim().is_empty()) {
            engine.domain = domain.trim().to_string();
        }
        if let Some(style) = lookup("MESHVIEW_ROUTE_STYLE") {
            match RouteStyle::parse(&style) {
                Some(s) => engine.route_style = s,
                None => log::warn!("unknown MESHVIEW_ROUTE_STYLE {:?}, using short", style),
            }
        }
        if let Some(prefix) = &path_prefix {
            engine.path_prefix = prefix.clone();
        }

        Self {
            source,
            path_prefix,
            start_url: "/nodes/".to_string(),
            engine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = ViewerConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg.source, SourceSetting::Dir(PathBuf::from(".")));
        assert_eq!(cfg.path_prefix, None);
        assert_eq!(cfg.engine.domain, "ipnt.uk");
        assert_eq!(cfg.engine.route_style, RouteStyle::Short);
        assert_eq!(cfg.engine.camera.focus_zoom, 16.0);
        assert_eq!(cfg.engine.cluster.max_cluster_radius_px, 50.0);
    }

    #[test]
    fn overrides() {
        let cfg = ViewerConfig::from_lookup(lookup(&[
            ("MESHVIEW_SITE", "https://mesh.example.org"),
            ("MESHVIEW_PATH_PREFIX", "mesh/"),
            ("MESHVIEW_DOMAIN", "example.net"),
            ("MESHVIEW_ROUTE_STYLE", "Nodes"),
        ]));
        assert_eq!(
            cfg.source,
            SourceSetting::Site("https://mesh.example.org".into())
        );
        assert_eq!(cfg.path_prefix.as_deref(), Some("/mesh"));
        assert_eq!(cfg.engine.path_prefix, "/mesh");
        assert_eq!(cfg.engine.domain, "example.net");
        assert_eq!(cfg.engine.route_style, RouteStyle::Nodes);
    }

    #[test]
    fn prefix_normalization() {
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix("mesh"), "/mesh");
        assert_eq!(normalize_prefix("/a/b/"), "/a/b");
    }
}

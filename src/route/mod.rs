//! List/detail routing.
//!
//! - `history` — back/forward stack of visited URLs
//! - `machine` — the route state machine driven by [`RouteMessage`]s
//!
//! This module holds the URL codec: every URL the viewer accepts maps to
//! exactly one [`RouteState`], and every state has one canonical URL.

pub mod history;
pub mod machine;

use url::Url;

use crate::config::{EngineConfig, RouteStyle};
use crate::model::Node;

/// Base used to resolve relative paths; only the path and query survive.
const PARSE_BASE: &str = "http://localhost/";

/// What the viewer is showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RouteState {
    #[default]
    List,
    Detail { area: String, short_id: String },
}

impl RouteState {
    /// Detail state; the area is stored lowercase as it appears in URLs.
    pub fn detail(area: impl Into<String>, short_id: impl Into<String>) -> Self {
        RouteState::Detail {
            area: area.into().to_ascii_lowercase(),
            short_id: short_id.into(),
        }
    }

    pub fn is_detail(&self) -> bool {
        matches!(self, RouteState::Detail { .. })
    }
}

/// Route target of a single node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeLink {
    pub area: String,
    pub short_id: String,
}

impl NodeLink {
    pub fn of(node: &Node) -> Self {
        Self {
            area: node.route_area(),
            short_id: node.short_id().to_string(),
        }
    }

    pub fn state(&self) -> RouteState {
        RouteState::detail(&self.area, &self.short_id)
    }
}

/// Input to the route state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMessage {
    /// User picked a node (list row or popup button). Pushes a URL.
    Select(NodeLink),
    /// User asked for the list. Pushes a URL.
    ShowList,
    /// Direct navigation (address bar, deep link). Pushes the URL as typed.
    Navigate(String),
    /// History traversal; state is re-derived from the resulting URL only.
    Back,
    Forward,
}

/// Converts between URLs and route states under a path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteCodec {
    prefix: String,
    style: RouteStyle,
}

impl RouteCodec {
    pub fn new(prefix: &str, style: RouteStyle) -> Self {
        Self {
            prefix: crate::config::normalize_prefix(prefix),
            style,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.path_prefix, config.route_style)
    }

    /// Canonical URL (path only) for a state.
    pub fn format(&self, state: &RouteState) -> String {
        match state {
            RouteState::List => format!("{}/nodes/", self.prefix),
            RouteState::Detail { area, short_id } => {
                let area = area.to_ascii_lowercase();
                match self.style {
                    RouteStyle::Short => format!("{}/{}/{}", self.prefix, area, short_id),
                    RouteStyle::Nodes => format!("{}/nodes/{}/{}", self.prefix, area, short_id),
                }
            }
        }
    }

    /// Derive a state from a URL or path. Anything unrecognised is `List`.
    ///
    /// Accepted detail forms: `/<area>/<id>`, `/nodes/<area>/<id>` and
    /// `?area=<area>&node=<id>`; a detail path wins over the query form.
    pub fn parse(&self, input: &str) -> RouteState {
        let url = match Url::parse(PARSE_BASE).and_then(|base| base.join(input.trim())) {
            Ok(url) => url,
            Err(e) => {
                log::debug!("unparseable route {:?}: {}", input, e);
                return RouteState::List;
            }
        };

        let path = url.path();
        // The prefix only counts when it ends on a segment boundary.
        let path = match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => path,
        };
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let from_path = match segments.as_slice() {
            ["nodes", area, id] => Some(RouteState::detail(*area, *id)),
            [area, id] if *area != "nodes" => Some(RouteState::detail(*area, *id)),
            _ => None,
        };
        if let Some(state) = from_path {
            return state;
        }

        let mut area = None;
        let mut node = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "area" if !value.is_empty() => area = Some(value.into_owned()),
                "node" if !value.is_empty() => node = Some(value.into_owned()),
                _ => {}
            }
        }
        match (area, node) {
            (Some(area), Some(node)) => RouteState::detail(area, node),
            _ => RouteState::List,
        }
    }
}

/// Find the node a detail route points at, over the unfiltered sequence.
///
/// Matches `id == short_id` or `id == "<short_id>.<area>.<domain>"`,
/// ASCII case-insensitively.
pub fn resolve<'a>(nodes: &'a [Node], area: &str, short_id: &str, domain: &str) -> Option<&'a Node> {
    let full = format!("{}.{}.{}", short_id, area, domain);
    nodes
        .iter()
        .find(|n| n.id.eq_ignore_ascii_case(short_id) || n.id.eq_ignore_ascii_case(&full))
}

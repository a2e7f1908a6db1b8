//! The three site resources.
//!
//! `config.json`, `nodes.json` and `members.json` live under
//! `assets/data/` of the deployed site. They are fetched in parallel and
//! joined; if any one of them fails the whole load fails and the viewer
//! starts from an empty dataset.

use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use super::fetch::{self, fetch_text};
use super::{prefix, LoadError};
use crate::config::{SourceSetting, ViewerConfig};
use crate::model::{Dataset, Member, Node, SiteConfig};

const DATA_DIR: &str = "assets/data";
const ACCEPT_JSON: &str = "application/json,*/*;q=0.8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Config,
    Nodes,
    Members,
}

impl Resource {
    pub fn file_name(self) -> &'static str {
        match self {
            Resource::Config => "config.json",
            Resource::Nodes => "nodes.json",
            Resource::Members => "members.json",
        }
    }

    /// Site-relative path, without prefix.
    pub fn path(self) -> String {
        format!("{}/{}", DATA_DIR, self.file_name())
    }
}

#[derive(Deserialize)]
struct NodesFile {
    #[serde(default)]
    nodes: Vec<Node>,
}

#[derive(Deserialize)]
struct MembersFile {
    #[serde(default)]
    members: Vec<Member>,
}

pub fn parse_config(text: &str) -> Result<SiteConfig, LoadError> {
    serde_json::from_str(text).map_err(|source| LoadError::Parse {
        resource: Resource::Config.file_name(),
        source,
    })
}

pub fn parse_nodes(text: &str) -> Result<Vec<Node>, LoadError> {
    serde_json::from_str::<NodesFile>(text)
        .map(|f| f.nodes)
        .map_err(|source| LoadError::Parse {
            resource: Resource::Nodes.file_name(),
            source,
        })
}

pub fn parse_members(text: &str) -> Result<Vec<Member>, LoadError> {
    serde_json::from_str::<MembersFile>(text)
        .map(|f| f.members)
        .map_err(|source| LoadError::Parse {
            resource: Resource::Members.file_name(),
            source,
        })
}

/// Where the resources come from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// A deployed site; resources resolve under `prefix`.
    Http {
        client: Client,
        base: Url,
        prefix: String,
    },
    /// A built site on disk. The prefix is a URL concern only.
    Dir { root: PathBuf, prefix: String },
}

impl DataSource {
    pub fn http(base: Url, prefix: &str) -> Result<Self, LoadError> {
        Ok(DataSource::Http {
            client: fetch::client()?,
            base,
            prefix: crate::config::normalize_prefix(prefix),
        })
    }

    pub fn dir(root: impl Into<PathBuf>, prefix: &str) -> Self {
        DataSource::Dir {
            root: root.into(),
            prefix: crate::config::normalize_prefix(prefix),
        }
    }

    /// Build the source described by `config`, discovering the path prefix
    /// from the site when none was configured.
    pub fn open(config: &ViewerConfig) -> Result<Self, LoadError> {
        match &config.source {
            SourceSetting::Site(site) => {
                let base = fetch::site_url(site)?;
                let client = fetch::client()?;
                let prefix = match &config.path_prefix {
                    Some(p) => p.clone(),
                    None => prefix::discover(&client, &base).unwrap_or_else(|e| {
                        log::warn!("could not discover path prefix, assuming none: {}", e);
                        String::new()
                    }),
                };
                Ok(DataSource::Http {
                    client,
                    base,
                    prefix,
                })
            }
            SourceSetting::Dir(root) => Ok(Self::dir(
                root.clone(),
                config.path_prefix.as_deref().unwrap_or(""),
            )),
        }
    }

    pub fn prefix(&self) -> &str {
        match self {
            DataSource::Http { prefix, .. } | DataSource::Dir { prefix, .. } => prefix,
        }
    }

    /// Absolute URL of a resource on an HTTP source.
    pub fn resource_url(base: &Url, prefix: &str, resource: Resource) -> Result<Url, LoadError> {
        let path = format!("{}/{}", prefix, resource.path());
        base.join(&path).map_err(|source| LoadError::Url { url: path, source })
    }

    pub fn read(&self, resource: Resource) -> Result<String, LoadError> {
        match self {
            DataSource::Http {
                client,
                base,
                prefix,
            } => {
                let url = Self::resource_url(base, prefix, resource)?;
                Ok(fetch_text(client, &url, ACCEPT_JSON)?.body)
            }
            DataSource::Dir { root, .. } => read_file(&root.join(resource.path())),
        }
    }

    /// Load all three resources concurrently. Any failure fails the load.
    pub fn try_load(&self) -> Result<Dataset, LoadError> {
        let (config, (nodes, members)) = rayon::join(
            || self.read(Resource::Config).and_then(|t| parse_config(&t)),
            || {
                rayon::join(
                    || self.read(Resource::Nodes).and_then(|t| parse_nodes(&t)),
                    || self.read(Resource::Members).and_then(|t| parse_members(&t)),
                )
            },
        );
        Ok(Dataset::from_parts(config?, nodes?, members?))
    }

    /// Fail-soft load: errors are logged and yield the empty dataset.
    pub fn load_dataset(&self) -> Dataset {
        match self.try_load() {
            Ok(data) => {
                log::info!(
                    "loaded {} public nodes and {} public members",
                    data.nodes.len(),
                    data.members.len()
                );
                data
            }
            Err(e) => {
                log::error!("error loading data: {}", e);
                Dataset::empty()
            }
        }
    }
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Outcome of a viewer start-up load.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub dataset: Dataset,
    /// Prefix the data was found under; routes use the same one.
    pub prefix: String,
}

/// Open the configured source and load it. Never fails: a source that
/// cannot even be opened behaves like a failed load.
pub fn load(config: &ViewerConfig) -> Loaded {
    match DataSource::open(config) {
        Ok(source) => Loaded {
            dataset: source.load_dataset(),
            prefix: source.prefix().to_string(),
        },
        Err(e) => {
            log::error!("error loading data: {}", e);
            Loaded {
                dataset: Dataset::empty(),
                prefix: config.path_prefix.clone().unwrap_or_default(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const NODES: &str = r#"{"nodes": [
        {"id": "rep01.ip3.ipnt.uk", "area": "IP3", "name": "Ipswich Repeater",
         "hardware": "RAK4631", "meshRole": "repeater", "memberId": "m1",
         "location": {"lat": 52.0, "lng": 1.1}, "isOnline": true,
         "isPublic": true, "showOnMap": true},
        {"id": "hid01.ip3.ipnt.uk", "isPublic": false},
        {"id": "cli01.ip1.ipnt.uk", "isPublic": true, "location": {"lat": null, "lng": 1.0}},
        {"id": "new01.ip1.ipnt.uk", "name": "Unreviewed"}
    ]}"#;
    const MEMBERS: &str = r#"{"members": [
        {"id": "m1", "name": "Alice", "isPublic": true, "joinDate": "2023-04-01"},
        {"id": "m2", "name": "Bob", "isPublic": false}
    ]}"#;
    const CONFIG: &str = r#"{"location": {"center": {"lat": 52.05, "lng": 1.15}, "zoom": 10}}"#;

    /// Fresh site directory under the system temp dir.
    fn site_dir(name: &str, files: &[(Resource, &str)]) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "meshview-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join(DATA_DIR)).unwrap();
        for (resource, body) in files {
            fs::write(root.join(resource.path()), body).unwrap();
        }
        root
    }

    #[test]
    fn parses_wrapped_arrays() {
        let nodes = parse_nodes(NODES).unwrap();
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0].mesh_role, "repeater");
        assert_eq!(parse_members(MEMBERS).unwrap()[0].join_date.as_deref(), Some("2023-04-01"));
        assert_eq!(parse_nodes("{}").unwrap(), Vec::new());
        assert!(matches!(
            parse_nodes("[1, 2]"),
            Err(LoadError::Parse { resource: "nodes.json", .. })
        ));
    }

    #[test]
    fn null_fields_do_not_fail_the_parse() {
        let json = r#"{"nodes": [
            {"id": "rep01.ip3.ipnt.uk", "name": null, "hardware": null,
             "meshRole": null, "area": null, "showOnMap": null, "isPublic": true}
        ]}"#;
        let nodes = parse_nodes(json).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "");
        assert!(!nodes[0].show_on_map);
        let members = parse_members(r#"{"members": [{"id": "m1", "name": null, "isPublic": true}]}"#);
        assert_eq!(members.unwrap()[0].name, "");
    }

    #[test]
    fn loads_directory_and_drops_private_records() {
        let root = site_dir(
            "ok",
            &[
                (Resource::Config, CONFIG),
                (Resource::Nodes, NODES),
                (Resource::Members, MEMBERS),
            ],
        );
        let data = DataSource::dir(&root, "").try_load().unwrap();
        assert_eq!(data.nodes.len(), 2);
        assert_eq!(data.members.len(), 1);
        assert_eq!(data.config.location.map(|l| l.zoom), Some(10.0));
        assert_eq!(data.node("cli01.ip1.ipnt.uk").map(|n| n.area.as_str()), Some("ip1"));
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn one_missing_resource_fails_the_whole_load() {
        let root = site_dir(
            "partial",
            &[(Resource::Config, CONFIG), (Resource::Nodes, NODES)],
        );
        let source = DataSource::dir(&root, "");
        assert!(matches!(source.try_load(), Err(LoadError::Io { .. })));
        assert!(source.load_dataset().is_empty());
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn malformed_json_fails_the_whole_load() {
        let root = site_dir(
            "malformed",
            &[
                (Resource::Config, CONFIG),
                (Resource::Nodes, "{\"nodes\": [oops"),
                (Resource::Members, MEMBERS),
            ],
        );
        let data = DataSource::dir(&root, "").load_dataset();
        assert_eq!(data, Dataset::empty());
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn resource_urls_carry_the_prefix() {
        let base = Url::parse("https://mesh.example.org/").unwrap();
        let url = DataSource::resource_url(&base, "/mesh", Resource::Nodes).unwrap();
        assert_eq!(url.as_str(), "https://mesh.example.org/mesh/assets/data/nodes.json");
        let url = DataSource::resource_url(&base, "", Resource::Config).unwrap();
        assert_eq!(url.as_str(), "https://mesh.example.org/assets/data/config.json");
    }

    #[test]
    fn unopenable_source_loads_empty() {
        let config = ViewerConfig {
            source: SourceSetting::Dir(PathBuf::from("/nonexistent/meshview")),
            path_prefix: Some("/mesh".into()),
            ..ViewerConfig::from_lookup(|_| None)
        };
        let loaded = load(&config);
        assert!(loaded.dataset.is_empty());
        assert_eq!(loaded.prefix, "/mesh");
    }
}

//! View-sync engine for a mesh-node map directory.
//!
//! A node list, its filters, a clustered marker map and list/detail routing
//! are kept consistent with each other:
//!
//! - `filter`  — criteria and the derived, ordered node view
//! - `map`     — map surface contract, canvas and the marker reconciler
//! - `route`   — URL codec, history and the route state machine
//! - `session` — ties the three together for one loaded dataset
//! - `net`     — loads the site's data resources
//! - `model`   — nodes, members, site config and statistics

pub mod config;
pub mod filter;
pub mod map;
pub mod model;
pub mod net;
pub mod route;
pub mod session;

pub use config::{EngineConfig, ViewerConfig};
pub use model::{Dataset, Member, Node};
pub use session::{MapViewState, Session};

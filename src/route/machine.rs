//! The list/detail state machine.
//!
//! UI code never mutates routing state directly: it sends [`RouteMessage`]s
//! through a [`RouteSender`], and the [`Router`], their only consumer,
//! applies them on [`Router::pump`]. Camera side effects go through the
//! injected [`MapController`].

use std::sync::mpsc;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::map::reconciler::MapController;
use crate::model::{Dataset, Node};

use super::history::SessionHistory;
use super::{resolve, NodeLink, RouteCodec, RouteMessage, RouteState};

/// Cloneable handle for emitting route messages.
#[derive(Debug, Clone)]
pub struct RouteSender {
    tx: mpsc::Sender<RouteMessage>,
}

impl RouteSender {
    pub fn send(&self, msg: RouteMessage) {
        if self.tx.send(msg).is_err() {
            log::debug!("route message dropped, router is gone");
        }
    }

    pub fn select(&self, link: NodeLink) {
        self.send(RouteMessage::Select(link));
    }

    pub fn select_node(&self, node: &Node) {
        self.select(NodeLink::of(node));
    }

    pub fn show_list(&self) {
        self.send(RouteMessage::ShowList);
    }

    pub fn navigate(&self, url: impl Into<String>) {
        self.send(RouteMessage::Navigate(url.into()));
    }

    pub fn back(&self) {
        self.send(RouteMessage::Back);
    }

    pub fn forward(&self) {
        self.send(RouteMessage::Forward);
    }
}

/// How a transition was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// First state derived at load; effects always run.
    Load,
    /// User action or direct navigation; the URL was pushed.
    Push,
    /// History traversal; the URL was only accepted.
    Traverse,
}

pub struct Router<M: MapController> {
    state: RouteState,
    current_node: Option<String>,
    codec: RouteCodec,
    domain: String,
    data: Arc<Dataset>,
    history: SessionHistory,
    map: M,
    tx: mpsc::Sender<RouteMessage>,
    rx: mpsc::Receiver<RouteMessage>,
}

impl<M: MapController> Router<M> {
    /// Create the router and derive the initial state from `start_url`.
    pub fn new(data: Arc<Dataset>, config: &EngineConfig, map: M, start_url: &str) -> Self {
        let (tx, rx) = mpsc::channel();
        let codec = RouteCodec::from_config(config);
        let mut router = Self {
            state: RouteState::List,
            current_node: None,
            codec,
            domain: config.domain.clone(),
            data,
            history: SessionHistory::new(start_url.trim()),
            map,
            tx,
            rx,
        };
        let initial = router.codec.parse(start_url);
        router.enter(initial, Trigger::Load);
        router
    }

    pub fn sender(&self) -> RouteSender {
        RouteSender {
            tx: self.tx.clone(),
        }
    }

    pub fn state(&self) -> &RouteState {
        &self.state
    }

    /// Node shown by the detail view.
    pub fn current_node(&self) -> Option<&Node> {
        let id = self.current_node.as_deref()?;
        self.data.node(id)
    }

    pub fn current_url(&self) -> &str {
        self.history.current()
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn codec(&self) -> &RouteCodec {
        &self.codec
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    /// Apply every queued message. Returns whether the state changed.
    pub fn pump(&mut self) -> bool {
        let before = self.state.clone();
        while let Ok(msg) = self.rx.try_recv() {
            self.handle(msg);
        }
        before != self.state
    }

    pub fn handle(&mut self, msg: RouteMessage) {
        log::debug!("route message {:?}", msg);
        match msg {
            RouteMessage::Select(link) => {
                let target = link.state();
                if self.settled(&target) == self.state {
                    return;
                }
                self.history.push(self.codec.format(&target));
                self.enter(target, Trigger::Push);
            }
            RouteMessage::ShowList => {
                if self.state == RouteState::List {
                    return;
                }
                self.history.push(self.codec.format(&RouteState::List));
                self.enter(RouteState::List, Trigger::Push);
            }
            RouteMessage::Navigate(url) => {
                let url = url.trim().to_string();
                let target = self.codec.parse(&url);
                if self.settled(&target) == self.state {
                    log::debug!("{} leads to the current view", url);
                    return;
                }
                self.history.push(url);
                self.enter(target, Trigger::Push);
            }
            RouteMessage::Back => {
                let Some(url) = self.history.back() else {
                    return;
                };
                let target = self.codec.parse(url);
                self.enter(target, Trigger::Traverse);
            }
            RouteMessage::Forward => {
                let Some(url) = self.history.forward() else {
                    return;
                };
                let target = self.codec.parse(url);
                self.enter(target, Trigger::Traverse);
            }
        }
    }

    /// Where `target` ends up: detail routes with no matching node fall
    /// back to the list.
    fn settled(&self, target: &RouteState) -> RouteState {
        match target {
            RouteState::Detail { area, short_id }
                if resolve(&self.data.nodes, area, short_id, &self.domain).is_none() =>
            {
                RouteState::List
            }
            _ => target.clone(),
        }
    }

    fn enter(&mut self, target: RouteState, trigger: Trigger) {
        if trigger != Trigger::Load && target == self.state {
            return;
        }
        match target {
            RouteState::List => self.enter_list(),
            RouteState::Detail { area, short_id } => {
                let data = Arc::clone(&self.data);
                match resolve(&data.nodes, &area, &short_id, &self.domain) {
                    Some(node) => {
                        log::info!("showing node {}", node.id);
                        self.map.close_popups();
                        self.state = RouteState::Detail { area, short_id };
                        self.current_node = Some(node.id.clone());
                        self.map.focus_on(node);
                    }
                    None => {
                        log::warn!("no node for /{}/{}, showing the list", area, short_id);
                        self.history
                            .replace(self.codec.format(&RouteState::List));
                        if trigger == Trigger::Load || self.state != RouteState::List {
                            self.enter_list();
                        }
                    }
                }
            }
        }
    }

    fn enter_list(&mut self) {
        self.state = RouteState::List;
        self.current_node = None;
        self.map.close_popups();
        self.map.fit_to_visible();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::node;
    use crate::model::SiteConfig;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Focus(String),
        Fit,
        Close,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl MapController for Recorder {
        fn focus_on(&mut self, node: &Node) {
            self.calls.push(Call::Focus(node.id.clone()));
        }
        fn fit_to_visible(&mut self) {
            self.calls.push(Call::Fit);
        }
        fn close_popups(&mut self) {
            self.calls.push(Call::Close);
        }
    }

    fn data() -> Arc<Dataset> {
        Arc::new(Dataset::from_parts(
            SiteConfig::default(),
            vec![
                node("rep01.ip3.ipnt.uk", 52.0, 1.1),
                node("cli01.ip1.ipnt.uk", 52.05, 1.15),
            ],
            Vec::new(),
        ))
    }

    fn router(start: &str) -> Router<Recorder> {
        Router::new(data(), &EngineConfig::default(), Recorder::default(), start)
    }

    #[test]
    fn deep_link_resolves_to_detail() {
        let r = router("/ip3/rep01");
        assert_eq!(r.state(), &RouteState::detail("ip3", "rep01"));
        assert_eq!(r.current_node().map(|n| n.id.as_str()), Some("rep01.ip3.ipnt.uk"));
        assert_eq!(
            r.map().calls,
            vec![Call::Close, Call::Focus("rep01.ip3.ipnt.uk".into())]
        );
    }

    #[test]
    fn unknown_deep_link_redirects_to_list() {
        let r = router("/ip3/unknown");
        assert_eq!(r.state(), &RouteState::List);
        assert!(r.current_node().is_none());
        assert_eq!(r.current_url(), "/nodes/");
        assert_eq!(r.map().calls, vec![Call::Close, Call::Fit]);
    }

    #[test]
    fn query_form_deep_link() {
        let r = router("/nodes/?area=ip1&node=cli01");
        assert_eq!(r.state(), &RouteState::detail("ip1", "cli01"));
    }

    #[test]
    fn select_pushes_and_focuses() {
        let mut r = router("/nodes/");
        let tx = r.sender();
        tx.select_node(&node("cli01.ip1.ipnt.uk", 0.0, 0.0));
        assert!(r.pump());
        assert_eq!(r.current_url(), "/ip1/cli01");
        assert_eq!(r.history().len(), 2);
        assert_eq!(
            r.map().calls.last(),
            Some(&Call::Focus("cli01.ip1.ipnt.uk".into()))
        );
    }

    #[test]
    fn redundant_navigation_is_a_no_op() {
        let mut r = router("/ip3/rep01");
        let calls_before = r.map().calls.len();
        let tx = r.sender();
        tx.select(NodeLink {
            area: "ip3".into(),
            short_id: "rep01".into(),
        });
        assert!(!r.pump());
        assert_eq!(r.map().calls.len(), calls_before);
        assert_eq!(r.history().len(), 1);

        let mut r = router("/nodes/");
        let calls_before = r.map().calls.len();
        r.sender().show_list();
        r.pump();
        assert_eq!(r.map().calls.len(), calls_before);
    }

    #[test]
    fn back_to_list_closes_popups_then_fits() {
        let mut r = router("/ip3/rep01");
        r.sender().show_list();
        r.pump();
        assert_eq!(r.state(), &RouteState::List);
        assert_eq!(r.current_url(), "/nodes/");
        let tail: Vec<_> = r.map().calls.iter().rev().take(2).rev().cloned().collect();
        assert_eq!(tail, vec![Call::Close, Call::Fit]);
    }

    #[test]
    fn history_traversal_rederives_from_url() {
        let mut r = router("/nodes/");
        let tx = r.sender();
        tx.navigate("/ip3/rep01");
        tx.navigate("/nodes/ip1/cli01");
        tx.back();
        r.pump();
        assert_eq!(r.state(), &RouteState::detail("ip3", "rep01"));
        tx.back();
        r.pump();
        assert_eq!(r.state(), &RouteState::List);
        tx.forward();
        tx.forward();
        r.pump();
        assert_eq!(r.state(), &RouteState::detail("ip1", "cli01"));
        assert_eq!(r.current_url(), "/nodes/ip1/cli01");
        tx.forward();
        assert!(!r.pump());
    }

    #[test]
    fn unknown_node_from_detail_falls_back_to_list() {
        let mut r = router("/ip3/rep01");
        r.sender().navigate("/ip3/nope");
        r.pump();
        assert_eq!(r.state(), &RouteState::List);
        assert_eq!(r.current_url(), "/nodes/");
        assert_eq!(r.map().calls.last(), Some(&Call::Fit));
    }

    #[test]
    fn unknown_node_from_list_adds_no_history() {
        let mut r = router("/nodes/");
        let calls_before = r.map().calls.len();
        r.sender().navigate("/ip3/nope");
        assert!(!r.pump());
        assert_eq!(r.history().len(), 1);
        assert!(!r.history().can_go_back());
        assert_eq!(r.current_url(), "/nodes/");
        assert_eq!(r.map().calls.len(), calls_before);
    }

    #[test]
    fn uppercase_area_matches_selected_node() {
        let mut r = router("/IP3/rep01");
        assert_eq!(r.state(), &RouteState::detail("ip3", "rep01"));
        let calls_before = r.map().calls.len();
        r.sender().select_node(&node("rep01.ip3.ipnt.uk", 52.0, 1.1));
        assert!(!r.pump());
        assert_eq!(r.history().len(), 1);
        assert_eq!(r.map().calls.len(), calls_before);
    }

    #[test]
    fn filtered_out_nodes_still_resolve() {
        // Routing looks at the full dataset; filters only affect markers.
        let mut hidden = node("tst01.ip3.ipnt.uk", 52.0, 1.1);
        hidden.is_testing = Some(true);
        let data = Arc::new(Dataset::from_parts(SiteConfig::default(), vec![hidden], Vec::new()));
        let r = Router::new(data, &EngineConfig::default(), Recorder::default(), "/ip3/tst01");
        assert!(r.state().is_detail());
    }
}

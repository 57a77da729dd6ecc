// src/view.rs

use tracing::{debug, warn};

use crate::graph::MarketGraph;

/// Coordination phases for the fetch → build → request → show lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No data yet.
    Idle,
    /// Feed fetches in flight. A failed fetch leaves the view here.
    DataLoading,
    /// Both datasets arrived and the graph was built.
    GraphReady,
    /// A path request is outstanding.
    PathRequested,
    /// A resolved path is displayed.
    PathShown,
}

/// Process-local state machine owning the current graph, the displayed path
/// and the flags gating fetch/show/animate.
///
/// All mutation goes through named transition methods so the retry, reset and
/// animation-lock interactions stay auditable. Single-threaded by design.
pub struct ViewState {
    phase: Phase,
    graph: Option<MarketGraph>,
    path: Option<Vec<String>>,
    show_path: bool,
    animation_running: bool,
    generation: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            graph: None,
            path: None,
            show_path: false,
            animation_running: false,
            generation: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn graph(&self) -> Option<&MarketGraph> {
        self.graph.as_ref()
    }

    pub fn path(&self) -> Option<&[String]> {
        self.path.as_deref()
    }

    pub fn show_path(&self) -> bool {
        self.show_path
    }

    /// Find/reset controls are disabled while the renderer animates.
    pub fn controls_locked(&self) -> bool {
        self.animation_running
    }

    /// Idle → DataLoading. The caller starts both feed fetches.
    pub fn begin_loading(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::DataLoading;
        }
    }

    /// Both raw datasets are present: DataLoading → GraphReady. The graph is
    /// built exactly once per load.
    pub fn graph_ready(&mut self, graph: MarketGraph) {
        if self.phase != Phase::DataLoading {
            warn!(phase = ?self.phase, "graph_ready ignored outside DataLoading");
            return;
        }
        self.graph = Some(graph);
        self.phase = Phase::GraphReady;
    }

    /// User asked to find a path: GraphReady → PathRequested.
    ///
    /// Returns the generation to tag the in-flight request with, or `None`
    /// when the transition is refused (wrong phase or animation lock).
    pub fn request_path(&mut self) -> Option<u64> {
        if self.animation_running || self.phase != Phase::GraphReady {
            debug!(phase = ?self.phase, locked = self.animation_running, "find-path refused");
            return None;
        }
        self.show_path = true;
        self.generation += 1;
        self.phase = Phase::PathRequested;
        Some(self.generation)
    }

    /// Apply a resolved path: PathRequested → PathShown.
    ///
    /// The result fully replaces the previous path or is dropped; a stale
    /// generation (a response that outlived a reset) is never applied.
    pub fn apply_path(&mut self, generation: u64, path: Vec<String>) -> bool {
        if generation != self.generation || self.phase != Phase::PathRequested {
            debug!(
                generation,
                current = self.generation,
                "stale or unexpected path response dropped"
            );
            return false;
        }
        self.path = Some(path);
        self.phase = Phase::PathShown;
        true
    }

    /// An abandoned or exhausted request. The displayed path is untouched;
    /// the view keeps waiting for a reset or another find.
    pub fn request_failed(&mut self, generation: u64) {
        if generation == self.generation && self.phase == Phase::PathRequested {
            warn!(generation, "path request abandoned");
        }
    }

    /// User reset: clear the displayed path and the show flag, back toward
    /// GraphReady. An in-flight request is not cancelled, but bumping the
    /// generation makes its late response stale.
    pub fn reset(&mut self) -> bool {
        if self.animation_running || !self.show_path {
            return false;
        }
        self.show_path = false;
        self.path = None;
        self.generation += 1;
        if matches!(self.phase, Phase::PathRequested | Phase::PathShown) {
            self.phase = Phase::GraphReady;
        }
        true
    }

    /// Animation lock driven by the rendering collaborator.
    pub fn set_animation_running(&mut self, running: bool) {
        self.animation_running = running;
    }
}

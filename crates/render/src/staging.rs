//! Off-screen staging of the rendered document.
//!
//! Capture must not depend on the viewport: the staged copy is a deep clone
//! of the rendered node, forced to page width, parked outside the visible
//! canvas and attached to the host so the capture engine can measure it.
//! A staged node is detached exactly once, either through
//! [`StagedNode::release`] or when the guard is dropped on an early exit.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use quoteprint_invoicing::PageGeometry;

use crate::error::StagingError;
use crate::node::{RenderNode, WHITE, Width};

/// Where staged nodes are parked (top-left corner, in CSS pixels).
pub const OFFSCREEN_ORIGIN: (i32, i32) = (-10_000, -10_000);

/// Counters describing the host's staging history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub staged: u64,
    pub released: u64,
    /// Nodes currently attached.
    pub attached: usize,
}

#[derive(Debug, Default)]
struct HostState {
    next_id: u64,
    attached: BTreeSet<u64>,
    staged: u64,
    released: u64,
}

/// Host for staged nodes. Cheap to clone; clones share the same attachment set.
#[derive(Debug, Clone, Default)]
pub struct OffscreenRenderHost {
    state: Arc<Mutex<HostState>>,
}

impl OffscreenRenderHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clone `rendered`, force it to the page width and attach it off-screen.
    pub fn stage(
        &self,
        rendered: &RenderNode,
        geometry: PageGeometry,
    ) -> Result<StagedNode, StagingError> {
        if rendered.is_empty() {
            return Err(StagingError::EmptyNode);
        }
        let width_px = geometry.width_px();
        if width_px == 0 {
            return Err(StagingError::ZeroWidth);
        }

        let mut node = rendered.clone();
        node.width = Width::Px(width_px);
        if node.background.is_none() {
            node.background = Some(WHITE);
        }
        let height_px = node.measure_height(width_px);

        let id = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.attached.insert(id);
            state.staged += 1;
            id
        };
        debug!(stage_id = id, width_px, height_px, "node staged off-screen");

        Ok(StagedNode {
            id,
            node,
            width_px,
            height_px,
            origin: OFFSCREEN_ORIGIN,
            host: self.clone(),
            released: false,
        })
    }

    pub fn stats(&self) -> HostStats {
        let state = self.lock();
        HostStats {
            staged: state.staged,
            released: state.released,
            attached: state.attached.len(),
        }
    }

    fn detach(&self, id: u64) {
        let mut state = self.lock();
        if state.attached.remove(&id) {
            state.released += 1;
            debug!(stage_id = id, "staged node released");
        }
    }
}

/// A node attached to the off-screen host. Detached exactly once.
#[derive(Debug)]
pub struct StagedNode {
    id: u64,
    node: RenderNode,
    width_px: u32,
    height_px: u32,
    origin: (i32, i32),
    host: OffscreenRenderHost,
    released: bool,
}

impl StagedNode {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn node(&self) -> &RenderNode {
        &self.node
    }

    /// Forced page width in CSS pixels.
    pub fn width_px(&self) -> u32 {
        self.width_px
    }

    /// Measured height at the forced width.
    pub fn height_px(&self) -> u32 {
        self.height_px
    }

    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    /// Detach from the host.
    pub fn release(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if !self.released {
            self.released = true;
            self.host.detach(self.id);
        }
    }
}

impl Drop for StagedNode {
    fn drop(&mut self) {
        self.detach();
    }
}

//=========================================================================
// Stage Manager
//=========================================================================
//
// Owns the current stage and the eye-catch deck, drives the stage once
// per frame, and performs stage swaps.
//
// Stages are not kept between activations: each swap disposes the
// outgoing stage and builds the incoming one from its registered factory.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use super::{FrameContext, HostSignal, RequestQueue, Stage, StageContext, StageKey, StageRequest};
use crate::core::eyecatch::{EyecatchDeck, EyecatchError};
use crate::core::input::FrameInput;
use crate::core::lifecycle::LifecycleNode;
use crate::core::render::DrawContext;
use crate::core::viewer::ViewerCommand;

//=== StageRegistry =======================================================

/// Builds a fresh stage. Called on the render thread at swap time.
pub type StageFactory<S> = Box<dyn Fn(&StageContext) -> Box<dyn Stage<S>> + Send + Sync>;

/// Stage factories by key, plus the well-known keys the manager needs.
pub struct StageRegistry<S: StageKey> {
    factories: HashMap<S, StageFactory<S>>,
    initial: Option<S>,
    viewer_play: Option<S>,
    viewer_idle: Option<S>,
}

impl<S: StageKey> StageRegistry<S> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            initial: None,
            viewer_play: None,
            viewer_idle: None,
        }
    }

    pub fn register<F>(&mut self, key: S, factory: F)
    where
        F: Fn(&StageContext) -> Box<dyn Stage<S>> + Send + Sync + 'static,
    {
        if self.factories.insert(key, Box::new(factory)).is_some() {
            warn!(target: "stage", "Stage {:?} was already registered and has been replaced", key);
        }
    }

    pub fn set_initial(&mut self, key: S) {
        self.initial = Some(key);
    }

    /// Stages entered on viewer Play and Stop commands.
    pub fn set_viewer_stages(&mut self, play: S, idle: S) {
        self.viewer_play = Some(play);
        self.viewer_idle = Some(idle);
    }

    pub fn initial(&self) -> Option<S> {
        self.initial
    }

    pub fn viewer_play(&self) -> Option<S> {
        self.viewer_play
    }

    pub fn viewer_idle(&self) -> Option<S> {
        self.viewer_idle
    }

    pub fn contains(&self, key: S) -> bool {
        self.factories.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    fn build(&self, key: S, ctx: &StageContext) -> Option<Box<dyn Stage<S>>> {
        self.factories.get(&key).map(|factory| factory(ctx))
    }
}

impl<S: StageKey> Default for StageRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

//=== StageManager ========================================================

pub struct StageManager<S: StageKey> {
    registry: Arc<StageRegistry<S>>,
    current: Option<(S, LifecycleNode<Box<dyn Stage<S>>>)>,
    eyecatch: EyecatchDeck,
    requests: RequestQueue<S>,
}

impl<S: StageKey> StageManager<S> {
    //--- Construction -----------------------------------------------------

    pub fn new(registry: Arc<StageRegistry<S>>, eyecatch: EyecatchDeck) -> Self {
        Self {
            registry,
            current: None,
            eyecatch,
            requests: RequestQueue::new(),
        }
    }

    /// Builds and activates the initial stage.
    pub fn start(&mut self, ctx: &mut StageContext) -> bool {
        match self.registry.initial() {
            Some(initial) => {
                debug!(target: "stage", "Starting with initial stage {:?}", initial);
                self.request_stage_swap(initial, ctx)
            }
            None => {
                warn!(target: "stage", "No initial stage configured");
                false
            }
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn current_key(&self) -> Option<S> {
        self.current.as_ref().map(|(key, _)| *key)
    }

    pub fn current_stage(&self) -> Option<&LifecycleNode<Box<dyn Stage<S>>>> {
        self.current.as_ref().map(|(_, stage)| stage)
    }

    pub fn eyecatch(&self) -> &EyecatchDeck {
        &self.eyecatch
    }

    pub fn eyecatch_mut(&mut self) -> &mut EyecatchDeck {
        &mut self.eyecatch
    }

    //--- Operations -------------------------------------------------------

    /// Selects a registered eye-catch and starts closing it.
    pub fn select_and_close_eyecatch(&mut self, name: &str, speed: f64) -> Result<(), EyecatchError> {
        self.eyecatch.select_and_close(name, speed)
    }

    /// Replaces the current stage with a freshly built `next`.
    ///
    /// The outgoing stage is deactivated and disposed before the incoming
    /// one is built. Returns `false` (keeping the current stage) when `next`
    /// is not registered.
    pub fn request_stage_swap(&mut self, next: S, ctx: &mut StageContext) -> bool {
        if !self.registry.contains(next) {
            warn!(target: "stage", "Attempted to swap to unregistered stage {:?}", next);
            return false;
        }

        if let Some((previous, mut stage)) = self.current.take() {
            debug!(target: "stage", "Leaving stage {:?}", previous);
            stage.deactivate(ctx);
            stage.dispose(ctx);
        }

        let Some(stage) = self.registry.build(next, ctx) else {
            return false;
        };
        let mut node = LifecycleNode::new(stage);
        node.activate(ctx);
        info!(target: "stage", "Stage {:?} ({}) is now current", next, node.name());

        self.current = Some((next, node));
        true
    }

    /// Runs one frame: viewer commands, the current stage, then queued
    /// requests.
    pub fn update(
        &mut self,
        dc: &mut dyn DrawContext,
        input: &FrameInput,
        viewer: Vec<ViewerCommand>,
        ctx: &mut StageContext,
    ) {
        for command in viewer {
            self.handle_viewer_command(command, ctx);
        }

        if let Some((_, stage)) = self.current.as_mut() {
            if stage.is_active() {
                let mut frame = FrameContext {
                    ctx: &mut *ctx,
                    dc,
                    input,
                    eyecatch: &mut self.eyecatch,
                    requests: &mut self.requests,
                };
                stage.progress_and_draw(&mut frame);
            }
        }

        for request in self.requests.take() {
            match request {
                StageRequest::Swap(next) => {
                    self.request_stage_swap(next, ctx);
                }
                StageRequest::RestartApplication => ctx.notify_host(HostSignal::RestartRequested),
                StageRequest::Exit => ctx.notify_host(HostSignal::ExitRequested),
            }
        }
    }

    pub fn release_swapchain_resources(&mut self, ctx: &mut StageContext) {
        if let Some((_, stage)) = self.current.as_mut() {
            stage.release_swapchain_resources(ctx);
        }
    }

    pub fn restore_swapchain_resources(&mut self, ctx: &mut StageContext) {
        if let Some((_, stage)) = self.current.as_mut() {
            stage.restore_swapchain_resources(ctx);
        }
    }

    /// Deactivates and disposes the current stage.
    pub fn shutdown(&mut self, ctx: &mut StageContext) {
        if let Some((key, mut stage)) = self.current.take() {
            stage.deactivate(ctx);
            stage.dispose(ctx);
            info!(target: "stage", "Stage {:?} disposed on shutdown", key);
        }
        self.requests.take();
    }

    //--- Internal Helpers -------------------------------------------------

    fn handle_viewer_command(&mut self, command: ViewerCommand, ctx: &mut StageContext) {
        let target = match command {
            ViewerCommand::Play(request) => {
                info!(target: "viewer", "Play {} from bar {}", request.path.display(), request.start_bar);
                ctx.viewer_request = Some(request);
                self.registry.viewer_play()
            }
            ViewerCommand::Stop => {
                info!(target: "viewer", "Stop");
                ctx.viewer_request = None;
                self.registry.viewer_idle()
            }
        };

        match target {
            Some(key) => {
                self.request_stage_swap(key, ctx);
            }
            None => warn!(target: "viewer", "Viewer command received but no viewer stages are registered"),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

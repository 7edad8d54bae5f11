//=========================================================================
// Lifecycle
//=========================================================================
//
// Activation / deactivation / disposal state machine shared by every stage,
// eye-catch host and panel node, plus the swap-chain resource sub-state.
//
// Architecture:
// ```text
//   LifecycleNode<A>
//     ├─ state: Inactive ─activate()─► Active ─deactivate()─► Inactive
//     │                                  │
//     │                    release() / restore()  (resources_released)
//     │
//     └─ dispose() ─► (deactivate) ─► Disposed  [terminal]
// ```
//
// The node owns the state; the wrapped `Activity` only supplies hooks.
// Every operation is idempotent, so hooks fire at most once per change.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::ops::{Deref, DerefMut};

use log::trace;

//=== ActivationState =====================================================

/// Activation state of a [`LifecycleNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivationState {
    /// Constructed (or deactivated) and not currently running.
    Inactive,

    /// Running; swap-chain resources may be released and restored.
    Active,

    /// Disposed. Terminal, no further transitions.
    Disposed,
}

impl Default for ActivationState {
    fn default() -> Self {
        Self::Inactive
    }
}

//=== Activity Trait ======================================================

/// Lifecycle hooks for anything driven by a [`LifecycleNode`].
///
/// All hooks default to no-ops; implement only what the object needs.
/// `C` is the explicit context handed through by the owner (stages receive
/// a [`crate::core::stage::StageContext`], panel nodes use `()`).
///
/// ```rust
/// use aetheric_stage::core::lifecycle::{Activity, LifecycleNode};
///
/// #[derive(Default)]
/// struct Backdrop { loaded: bool }
///
/// impl Activity for Backdrop {
///     fn on_activate(&mut self, _ctx: &mut ()) { self.loaded = true; }
///     fn on_deactivate(&mut self, _ctx: &mut ()) { self.loaded = false; }
/// }
///
/// let mut node = LifecycleNode::new(Backdrop::default());
/// node.activate(&mut ());
/// assert!(node.loaded);
/// ```
pub trait Activity<C: ?Sized = ()> {
    /// Called once when the node goes Inactive → Active.
    fn on_activate(&mut self, _ctx: &mut C) {}

    /// Called once when the node goes Active → Inactive.
    fn on_deactivate(&mut self, _ctx: &mut C) {}

    /// Drops resources tied to the current display surface.
    fn on_release_swapchain_resources(&mut self, _ctx: &mut C) {}

    /// Rebuilds resources tied to the (new) display surface.
    fn on_restore_swapchain_resources(&mut self, _ctx: &mut C) {}

    /// Final cleanup. Runs after deactivation, exactly once.
    fn on_dispose(&mut self, _ctx: &mut C) {}
}

impl<C: ?Sized, T: Activity<C> + ?Sized> Activity<C> for Box<T> {
    fn on_activate(&mut self, ctx: &mut C) {
        (**self).on_activate(ctx)
    }

    fn on_deactivate(&mut self, ctx: &mut C) {
        (**self).on_deactivate(ctx)
    }

    fn on_release_swapchain_resources(&mut self, ctx: &mut C) {
        (**self).on_release_swapchain_resources(ctx)
    }

    fn on_restore_swapchain_resources(&mut self, ctx: &mut C) {
        (**self).on_restore_swapchain_resources(ctx)
    }

    fn on_dispose(&mut self, ctx: &mut C) {
        (**self).on_dispose(ctx)
    }
}

//=== LifecycleNode =======================================================

/// Owns an [`Activity`] and enforces its lifecycle rules.
///
/// `resources_released` is only ever true while the node is Active;
/// deactivation clears it because the next activation starts fresh.
#[derive(Debug)]
pub struct LifecycleNode<A> {
    state: ActivationState,
    resources_released: bool,
    inner: A,
}

impl<A> LifecycleNode<A> {
    //--- Construction -----------------------------------------------------

    /// Wraps `inner` in an Inactive node.
    pub fn new(inner: A) -> Self {
        Self {
            state: ActivationState::Inactive,
            resources_released: false,
            inner,
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ActivationState::Active
    }

    pub fn is_disposed(&self) -> bool {
        self.state == ActivationState::Disposed
    }

    /// True while Active with swap-chain resources currently released.
    pub fn resources_released(&self) -> bool {
        self.resources_released
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.inner
    }

    //--- Transitions ------------------------------------------------------

    /// Inactive → Active. No-op when Active or Disposed.
    pub fn activate<C: ?Sized>(&mut self, ctx: &mut C)
    where
        A: Activity<C>,
    {
        if self.state != ActivationState::Inactive {
            return;
        }

        self.inner.on_activate(ctx);
        self.state = ActivationState::Active;
        self.resources_released = false;
    }

    /// Active → Inactive. No-op otherwise.
    pub fn deactivate<C: ?Sized>(&mut self, ctx: &mut C)
    where
        A: Activity<C>,
    {
        if self.state != ActivationState::Active {
            return;
        }

        self.inner.on_deactivate(ctx);
        self.state = ActivationState::Inactive;
        self.resources_released = false;
    }

    /// Releases swap-chain resources. Effective only when Active and not
    /// already released.
    pub fn release_swapchain_resources<C: ?Sized>(&mut self, ctx: &mut C)
    where
        A: Activity<C>,
    {
        if self.state != ActivationState::Active || self.resources_released {
            return;
        }

        self.inner.on_release_swapchain_resources(ctx);
        self.resources_released = true;
    }

    /// Restores swap-chain resources. Effective only when Active and
    /// currently released.
    pub fn restore_swapchain_resources<C: ?Sized>(&mut self, ctx: &mut C)
    where
        A: Activity<C>,
    {
        if self.state != ActivationState::Active || !self.resources_released {
            return;
        }

        self.inner.on_restore_swapchain_resources(ctx);
        self.resources_released = false;
    }

    /// Deactivates (if needed), runs the dispose hook, and marks the node
    /// Disposed. Idempotent.
    pub fn dispose<C: ?Sized>(&mut self, ctx: &mut C)
    where
        A: Activity<C>,
    {
        if self.state == ActivationState::Disposed {
            return;
        }

        self.deactivate(ctx);
        self.inner.on_dispose(ctx);
        self.state = ActivationState::Disposed;
        trace!("lifecycle node disposed");
    }
}

impl<A> Deref for LifecycleNode<A> {
    type Target = A;

    fn deref(&self) -> &A {
        &self.inner
    }
}

impl<A> DerefMut for LifecycleNode<A> {
    fn deref_mut(&mut self) -> &mut A {
        &mut self.inner
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

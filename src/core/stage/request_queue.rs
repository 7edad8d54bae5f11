//=========================================================================
// Request Queue
//=========================================================================
//
// Stages queue requests here while they run. The stage manager processes
// the queue after the stage has finished its frame, so a stage is never
// disposed from inside its own update.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::StageKey;

//=== StageRequest ========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRequest<S: StageKey> {
    /// Replace the current stage with `S`.
    Swap(S),

    /// Ask the host to rebuild the whole application.
    RestartApplication,

    /// Ask the host to quit.
    Exit,
}

//=== RequestQueue ========================================================

pub struct RequestQueue<S: StageKey> {
    queue: Vec<StageRequest<S>>,
}

impl<S: StageKey> RequestQueue<S> {
    pub fn new() -> Self {
        Self { queue: Vec::new() }
    }

    pub fn push(&mut self, request: StageRequest<S>) {
        self.queue.push(request);
    }

    /// Shorthand for `push(StageRequest::Swap(next))`.
    pub fn swap_to(&mut self, next: S) {
        self.push(StageRequest::Swap(next));
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageRequest<S>> {
        self.queue.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Takes all requests, leaving the queue empty.
    pub fn take(&mut self) -> Vec<StageRequest<S>> {
        std::mem::take(&mut self.queue)
    }
}

impl<S: StageKey> Default for RequestQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
    enum TestStage {
        A,
        B,
    }

    impl StageKey for TestStage {}

    #[test]
    fn take_preserves_order_and_empties() {
        let mut queue = RequestQueue::new();
        queue.swap_to(TestStage::A);
        queue.push(StageRequest::Exit);
        queue.swap_to(TestStage::B);
        assert_eq!(queue.len(), 3);

        let taken = queue.take();
        assert_eq!(
            taken,
            vec![
                StageRequest::Swap(TestStage::A),
                StageRequest::Exit,
                StageRequest::Swap(TestStage::B),
            ]
        );
        assert!(queue.is_empty());
    }
}

//=========================================================================
// Event Collector
//=========================================================================
//
// Render-side collector with bounded polling and disconnect detection.
//
// Architecture:
//   Receiver<PlatformEvent> → collect_frame() → FrameInput + viewer cmds
//                                             → TickControl
//
// Bounded polling prevents a flood of platform events from starving the
// frame.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{Receiver, TryRecvError};
use log::warn;

//=== Internal Dependencies ===============================================

use super::PlatformEvent;
use crate::core::input::FrameInput;
use crate::core::viewer::ViewerCommand;

//=== TickControl =========================================================

/// Update loop control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickControl {
    Continue,
    Exit,
}

//=== EventCollector ======================================================

/// Drains platform events once per frame.
pub(crate) struct EventCollector {
    receiver: Receiver<PlatformEvent>,
    input: FrameInput,
    viewer: Vec<ViewerCommand>,
}

impl EventCollector {
    const MAX_EVENTS_PER_FRAME: usize = 100;

    pub(crate) fn new(receiver: Receiver<PlatformEvent>) -> Self {
        Self {
            receiver,
            input: FrameInput::new(),
            viewer: Vec::new(),
        }
    }

    /// Collects pending platform events (bounded to prevent starvation).
    ///
    /// Returns `Exit` once the platform side has hung up.
    pub(crate) fn collect_frame(&mut self) -> TickControl {
        self.input.clear();
        self.viewer.clear();
        let mut drained = 0;

        while drained < Self::MAX_EVENTS_PER_FRAME {
            match self.receiver.try_recv() {
                Ok(event) => {
                    self.handle_event(event);
                    drained += 1;
                }
                Err(TryRecvError::Disconnected) => return TickControl::Exit,
                Err(TryRecvError::Empty) => break,
            }
        }

        if drained >= Self::MAX_EVENTS_PER_FRAME {
            warn!(target: "platform::input", "Event queue backlog: drained {} events this frame", drained);
        }

        TickControl::Continue
    }

    /// Inputs collected this frame.
    pub(crate) fn input(&self) -> &FrameInput {
        &self.input
    }

    /// Takes the viewer commands collected this frame.
    pub(crate) fn take_viewer_commands(&mut self) -> Vec<ViewerCommand> {
        std::mem::take(&mut self.viewer)
    }

    fn handle_event(&mut self, event: PlatformEvent) {
        match event {
            PlatformEvent::Inputs(batch) => self.input.extend(batch),
            PlatformEvent::Viewer(command) => self.viewer.push(command),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::MenuInput;
    use crate::core::viewer::ViewerPlayRequest;
    use crossbeam_channel::unbounded;

    #[test]
    fn collect_handles_empty_queue() {
        let (_tx, rx) = unbounded::<PlatformEvent>();
        let mut collector = EventCollector::new(rx);

        let result = collector.collect_frame();

        assert_eq!(result, TickControl::Continue);
        assert!(collector.input().is_empty());
    }

    #[test]
    fn collect_aggregates_multiple_batches_in_order() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx);

        tx.send(PlatformEvent::Inputs(vec![MenuInput::Down])).unwrap();
        tx.send(PlatformEvent::Inputs(vec![MenuInput::Down, MenuInput::Confirm])).unwrap();

        collector.collect_frame();

        let seen: Vec<_> = collector.input().iter().collect();
        assert_eq!(seen, vec![MenuInput::Down, MenuInput::Down, MenuInput::Confirm]);
    }

    #[test]
    fn collect_separates_viewer_commands() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx);

        tx.send(PlatformEvent::Viewer(ViewerCommand::Play(ViewerPlayRequest::new("x.dtx"))))
            .unwrap();
        tx.send(PlatformEvent::Inputs(vec![MenuInput::Cancel])).unwrap();

        collector.collect_frame();

        assert_eq!(collector.input().len(), 1);
        let commands = collector.take_viewer_commands();
        assert_eq!(commands.len(), 1);
        assert!(collector.take_viewer_commands().is_empty());
    }

    #[test]
    fn collect_clears_previous_frame() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx);

        tx.send(PlatformEvent::Inputs(vec![MenuInput::Up])).unwrap();
        collector.collect_frame();
        assert_eq!(collector.input().len(), 1);

        collector.collect_frame();
        assert!(collector.input().is_empty());
    }

    #[test]
    fn collect_is_bounded_per_frame() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx);

        for _ in 0..150 {
            tx.send(PlatformEvent::Inputs(vec![MenuInput::Down])).unwrap();
        }

        collector.collect_frame();
        assert_eq!(collector.input().len(), 100);

        collector.collect_frame();
        assert_eq!(collector.input().len(), 50);
    }

    #[test]
    fn collect_returns_exit_on_disconnect() {
        let (tx, rx) = unbounded::<PlatformEvent>();
        let mut collector = EventCollector::new(rx);

        drop(tx);

        assert_eq!(collector.collect_frame(), TickControl::Exit);
    }
}

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::{
    EventRegistry, FrameHandle, FrameScheduler, Host, ListenerId, ListenerKind, Viewport,
};

/// Single-threaded host with an explicit frame queue.
///
/// Frames requested during one tick are returned by the next call to
/// [`HeadlessHost::fire_frames`]; a cancelled handle is never returned.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    viewport: Viewport,
    next_id: u64,
    pending: BTreeSet<FrameHandle>,
    listeners: BTreeMap<ListenerId, ListenerKind>,
    ticks: u64,
}

impl HeadlessHost {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Drain every frame due this tick.
    pub fn fire_frames(&mut self) -> Vec<FrameHandle> {
        self.ticks += 1;
        let due: Vec<FrameHandle> = std::mem::take(&mut self.pending).into_iter().collect();
        trace!(tick = self.ticks, due = due.len(), "firing frames");
        due
    }

    pub fn is_pending(&self, handle: FrameHandle) -> bool {
        self.pending.contains(&handle)
    }

    pub fn pending_frames(&self) -> usize {
        self.pending.len()
    }

    pub fn listener_count(&self, kind: ListenerKind) -> usize {
        self.listeners.values().filter(|k| **k == kind).count()
    }

    /// Listener ids that should receive a notification of `kind`.
    pub fn listeners_for(&self, kind: ListenerKind) -> Vec<ListenerId> {
        self.listeners
            .iter()
            .filter(|(_, k)| **k == kind)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl FrameScheduler for HeadlessHost {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        self.pending.insert(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.remove(&handle);
    }
}

impl EventRegistry for HeadlessHost {
    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.insert(id, kind);
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn is_listening(&self, id: ListenerId) -> bool {
        self.listeners.contains_key(&id)
    }
}

impl Host for HeadlessHost {
    fn viewport(&self) -> Viewport {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_frames_fire_once() {
        let mut host = HeadlessHost::new(Viewport::new(10, 10));
        let a = host.request_frame();
        let b = host.request_frame();
        assert_ne!(a, b);
        assert_eq!(host.fire_frames(), vec![a, b]);
        assert!(host.fire_frames().is_empty());
        assert_eq!(host.ticks(), 2);
    }

    #[test]
    fn cancelled_frame_never_fires() {
        let mut host = HeadlessHost::new(Viewport::new(10, 10));
        let handle = host.request_frame();
        host.cancel_frame(handle);
        host.cancel_frame(handle);
        assert!(!host.is_pending(handle));
        assert!(host.fire_frames().is_empty());
    }

    #[test]
    fn listeners_register_and_remove() {
        let mut host = HeadlessHost::new(Viewport::new(10, 10));
        let pointer = host.add_listener(ListenerKind::PointerMove);
        let resize = host.add_listener(ListenerKind::Resize);
        assert_eq!(host.listener_count(ListenerKind::PointerMove), 1);
        assert_eq!(host.listeners_for(ListenerKind::Resize), vec![resize]);

        host.remove_listener(pointer);
        host.remove_listener(pointer);
        assert!(!host.is_listening(pointer));
        assert!(host.is_listening(resize));
        assert_eq!(host.listener_count(ListenerKind::PointerMove), 0);
    }
}

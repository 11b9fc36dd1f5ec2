//! Synthetic input thread.
//!
//! Pointer and resize notifications are produced off the render thread and
//! delivered as messages; the render loop drains them in order, so the
//! engines are only ever touched from one thread.

use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use glam::Vec2;
use stardrift_platform::Viewport;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    PointerMove(Vec2),
    Resize(Viewport),
    /// The host is ready to paint; due frame callbacks run now.
    Frame,
}

#[derive(Debug, Clone, Copy)]
pub struct FeedPlan {
    pub frames: u32,
    pub viewport: Viewport,
    pub moves_per_frame: u32,
    pub resize: Option<(u32, Viewport)>,
}

/// Point on a slow Lissajous figure spanning most of the viewport.
pub fn lissajous(t: f32, viewport: Viewport) -> Vec2 {
    let size = viewport.size();
    let centre = Vec2::new(viewport.x as f32, viewport.y as f32) + size / 2.0;
    centre + Vec2::new((3.0 * t).sin() * size.x * 0.4, (2.0 * t).sin() * size.y * 0.4)
}

pub fn spawn_pointer_feed(plan: FeedPlan) -> (Receiver<HostEvent>, JoinHandle<()>) {
    let (sender, receiver) = crossbeam_channel::bounded::<HostEvent>(64);
    let handle = std::thread::spawn(move || produce(plan, &sender));
    (receiver, handle)
}

fn produce(plan: FeedPlan, sender: &Sender<HostEvent>) {
    let mut viewport = plan.viewport;
    let mut sample = 0u32;
    for frame in 0..plan.frames {
        let mut batch = Vec::with_capacity(plan.moves_per_frame as usize + 2);
        if let Some((at, resized)) = plan.resize {
            if at == frame {
                viewport = resized;
                batch.push(HostEvent::Resize(resized));
            }
        }
        for _ in 0..plan.moves_per_frame {
            batch.push(HostEvent::PointerMove(lissajous(sample as f32 * 0.02, viewport)));
            sample += 1;
        }
        batch.push(HostEvent::Frame);
        for event in batch {
            if sender.send(event).is_err() {
                warn!(frame, "render loop hung up; stopping pointer feed");
                return;
            }
        }
    }
    debug!(frames = plan.frames, moves = sample, "pointer feed finished");
}

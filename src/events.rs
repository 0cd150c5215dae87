//! Interrupt-driven wake-event system.
//!
//! Events are produced by:
//! - The EVSE link task (charge/fault state transitions)
//! - The WiFi manager (network phase changes)
//! - The web / MQTT request handlers (parsed commands queued)
//! - Timer callbacks (scheduled LED wakes)
//!
//! Events are consumed by the main event loop, which wakes the LED manager
//! and re-runs arbitration.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ EVSE link   │────▶│              │     │              │
//! │ WiFi mgr    │────▶│  Event Queue │────▶│  Main Loop   │
//! │ Web/MQTT    │────▶│  (lock-free) │     │  (consumer)  │
//! │ Timer       │────▶│              │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

/// Maximum number of pending events.
/// Power of 2 for efficient ring buffer modulo.
const EVENT_QUEUE_CAP: usize = 16;

/// Wake-event types, ordered by rough priority.
/// Lower discriminant = higher priority when multiple events
/// are pending simultaneously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    /// The EVSE controller reported a charge/fault state transition.
    EvseStateChanged = 0,
    /// The WiFi manager reported a network phase change.
    NetworkChanged = 1,
    /// A parsed command is waiting in the command queue.
    CommandReceived = 10,
    /// A previously-scheduled timed wake fired.
    TimerWake = 20,
}

// ── Lock-free SPSC ring buffer ────────────────────────────────
//
// Collaborator tasks / timer callbacks write (produce), the main loop
// reads (consume).  Uses atomic head/tail indices.  The buffer is kept
// in a static so callback contexts can access it without a handle.

static EVENT_HEAD: AtomicU8 = AtomicU8::new(0);
static EVENT_TAIL: AtomicU8 = AtomicU8::new(0);
// SAFETY: EVENT_BUFFER is accessed exclusively through push_event /
// pop_event.  Producer: collaborator notification context — one writer.
// Consumer: main-loop task — one reader.  The acquire/release pairs on
// the indices enforce the SPSC discipline.
static mut EVENT_BUFFER: [u8; EVENT_QUEUE_CAP] = [0; EVENT_QUEUE_CAP];

/// Push an event into the queue.
/// Safe to call from callback context (lock-free).
/// Returns `false` if the queue is full (event dropped — the next
/// drained event of the same kind supersedes it anyway).
pub fn push_event(event: Event) -> bool {
    let head = EVENT_HEAD.load(Ordering::Relaxed);
    let tail = EVENT_TAIL.load(Ordering::Acquire);
    let next_head = (head + 1) % EVENT_QUEUE_CAP as u8;

    if next_head == tail {
        return false; // Queue full — drop event.
    }

    // SAFETY: single producer; see buffer invariant above.
    unsafe {
        EVENT_BUFFER[head as usize] = event as u8;
    }

    EVENT_HEAD.store(next_head, Ordering::Release);
    true
}

/// Pop the next event from the queue.
/// Called from the main loop (single consumer).
/// Returns `None` if the queue is empty.
pub fn pop_event() -> Option<Event> {
    let tail = EVENT_TAIL.load(Ordering::Relaxed);
    let head = EVENT_HEAD.load(Ordering::Acquire);

    if tail == head {
        return None; // Empty.
    }

    let raw = unsafe { EVENT_BUFFER[tail as usize] };
    EVENT_TAIL.store((tail + 1) % EVENT_QUEUE_CAP as u8, Ordering::Release);

    event_from_u8(raw)
}

/// Drain all pending events into a callback.
/// Processes events in FIFO order.
pub fn drain_events(mut handler: impl FnMut(Event)) {
    while let Some(event) = pop_event() {
        handler(event);
    }
}

/// Check if the event queue is empty.
pub fn queue_is_empty() -> bool {
    let tail = EVENT_TAIL.load(Ordering::Relaxed);
    let head = EVENT_HEAD.load(Ordering::Acquire);
    tail == head
}

// ── Internal ──────────────────────────────────────────────────

fn event_from_u8(raw: u8) -> Option<Event> {
    match raw {
        0 => Some(Event::EvseStateChanged),
        1 => Some(Event::NetworkChanged),
        10 => Some(Event::CommandReceived),
        20 => Some(Event::TimerWake),
        _ => None,
    }
}

//! Lifecycle and tick notifications.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// The continuous loop has started.
    Running,
    /// A tick has fully completed.
    Step,
    /// The continuous loop has exited.
    Stopped,
}

impl SimEvent {
    pub fn name(self) -> &'static str {
        match self {
            SimEvent::Running => "running",
            SimEvent::Step => "step",
            SimEvent::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Observer of simulation events.
///
/// Handlers run synchronously on the thread driving the simulation, so a slow handler
/// delays the next tick.
pub trait Listener: Send {
    fn handle(&mut self, event: SimEvent);
}

impl<F> Listener for F
where
    F: FnMut(SimEvent) + Send,
{
    fn handle(&mut self, event: SimEvent) {
        self(event)
    }
}

/// Ordered fan-out of events to registered listeners.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Box<dyn Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<L: Listener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `event` to every listener in registration order.
    pub fn fire(&mut self, event: SimEvent) {
        log::trace!("firing {event} to {} listeners", self.listeners.len());
        for listener in &mut self.listeners {
            listener.handle(event);
        }
    }
}

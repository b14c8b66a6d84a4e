//! Typed command bus for driving a session from outside its owning thread.
//!
//! Exactly one receiver is bound at a time. Subscribing again replaces the
//! previous binding, so a re-created UI never ends up with two handlers.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

use crate::engine::ResumeMode;

/// Something an external controller asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Volume(f32),
    PlaybackRate(f32),
    SeekTo { seconds: f64, mode: ResumeMode },
    Destroy,
}

#[derive(Debug)]
struct Route {
    id: u64,
    sender: Sender<Command>,
}

#[derive(Debug, Default)]
struct Routing {
    next_id: u64,
    route: Option<Route>,
}

/// Cloneable publisher side of the bus.
#[derive(Debug, Clone, Default)]
pub struct ControlBus {
    routing: Arc<Mutex<Routing>>,
}

impl ControlBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send `command` to the bound receiver.
    ///
    /// Returns `false` when nothing is bound or the receiver is gone.
    pub fn publish(&self, command: Command) -> bool {
        let routing = self.routing.lock().unwrap_or_else(PoisonError::into_inner);
        match routing.route.as_ref() {
            Some(route) => route.sender.send(command).is_ok(),
            None => {
                debug!("dropping {:?}: no receiver bound", command);
                false
            }
        }
    }

    /// Bind a new receiver, replacing any earlier one.
    pub fn subscribe(&self) -> CommandReceiver {
        let mut routing = self.routing.lock().unwrap_or_else(PoisonError::into_inner);
        routing.next_id += 1;
        let id = routing.next_id;
        let (sender, receiver) = mpsc::channel();
        if routing.route.replace(Route { id, sender }).is_some() {
            debug!("control binding {} replaced an earlier binding", id);
        }
        CommandReceiver { id, receiver }
    }

    /// Unbind `receiver` if it is still the bound one.
    pub fn release(&self, receiver: &CommandReceiver) {
        let mut routing = self.routing.lock().unwrap_or_else(PoisonError::into_inner);
        if routing.route.as_ref().is_some_and(|route| route.id == receiver.id) {
            routing.route = None;
        }
    }

    /// Remove whatever binding exists.
    pub fn unsubscribe(&self) {
        let mut routing = self.routing.lock().unwrap_or_else(PoisonError::into_inner);
        routing.route = None;
    }

    pub fn is_bound(&self) -> bool {
        let routing = self.routing.lock().unwrap_or_else(PoisonError::into_inner);
        routing.route.is_some()
    }
}

/// Consumer side of a [`ControlBus`] binding.
#[derive(Debug)]
pub struct CommandReceiver {
    id: u64,
    receiver: Receiver<Command>,
}

impl CommandReceiver {
    pub fn try_next(&self) -> Option<Command> {
        match self.receiver.try_recv() {
            Ok(command) => Some(command),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Take every command queued so far.
    pub fn drain(&self) -> Vec<Command> {
        self.receiver.try_iter().collect()
    }
}

//! Pub-sub state store
//!
//! Holds the shell state with shallow-merge updates and synchronous
//! subscriber notification. The single in-process source of truth that
//! drives the small UI state machine.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Shell state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShellState {
    pub is_open: bool,
    pub is_voice_mode: bool,
}

/// A shallow-merge update: only set fields change
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub is_open: Option<bool>,
    pub is_voice_mode: Option<bool>,
}

impl StateUpdate {
    pub fn open(value: bool) -> Self {
        Self {
            is_open: Some(value),
            ..Default::default()
        }
    }

    pub fn voice_mode(value: bool) -> Self {
        Self {
            is_voice_mode: Some(value),
            ..Default::default()
        }
    }
}

type Subscriber = Box<dyn Fn(&ShellState) + Send + Sync>;

/// Tiny pub-sub store
pub struct Store {
    state: Mutex<ShellState>,
    subscribers: Mutex<HashMap<u64, Subscriber>>,
    next_subscriber: Mutex<u64>,
}

impl Store {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ShellState::default()),
            subscribers: Mutex::new(HashMap::new()),
            next_subscriber: Mutex::new(0),
        })
    }

    pub fn state(&self) -> ShellState {
        self.state.lock().clone()
    }

    /// Shallow-merge the update and notify subscribers when anything
    /// actually changed
    pub fn set_state(&self, update: StateUpdate) {
        let (changed, snapshot) = {
            let mut state = self.state.lock();
            let before = state.clone();
            if let Some(open) = update.is_open {
                state.is_open = open;
            }
            if let Some(voice) = update.is_voice_mode {
                state.is_voice_mode = voice;
            }
            (*state != before, state.clone())
        };
        if changed {
            for subscriber in self.subscribers.lock().values() {
                subscriber(&snapshot);
            }
        }
    }

    pub fn subscribe(&self, subscriber: Subscriber) -> u64 {
        let mut next = self.next_subscriber.lock();
        let id = *next;
        *next += 1;
        self.subscribers.lock().insert(id, subscriber);
        id
    }

    pub fn unsubscribe(&self, id: u64) {
        self.subscribers.lock().remove(&id);
    }
}

//! Embeddable SDK runtime
//!
//! The outermost layer: a pub-sub state store, the shadow-isolated shell
//! state machine (open/close debounce, voice toggle, bubbles) and the
//! `Sdk` facade that wires page extraction, caching, the sales agent, the
//! LLM backend and the voice pipeline together.

pub mod sdk;
pub mod shell;
pub mod store;

pub use sdk::{AgentReply, HostBindings, Sdk};
pub use shell::{ShellController, ShellInput};
pub use store::{ShellState, StateUpdate, Store};

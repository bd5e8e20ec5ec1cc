//! Shell state machine
//!
//! The floating shell renders inside the SDK's shadow-isolated root on the
//! page document. Open/close is driven by pointer enter/leave with a close
//! debounce; closing is suppressed while voice mode is active or an
//! assistant bubble is hovered. A click outside the shell closes it and
//! removes visible assistant bubbles.

use crate::store::{StateUpdate, Store};
use blitsum_config::constants::shell as shell_consts;
use blitsum_page::PageDocument;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Host pointer/keyboard input routed to the shell
#[derive(Debug, Clone)]
pub enum ShellInput {
    PointerEnter,
    PointerLeave,
    OutsideClick,
    BubbleHoverStart,
    BubbleHoverEnd,
    /// Enter key or the send button
    Submit { text: String },
    VoiceToggle,
}

/// A rendered assistant bubble
#[derive(Debug, Clone)]
pub struct Bubble {
    pub text: String,
    pub is_error: bool,
}

/// Shell controller over the store and the SDK shell root
pub struct ShellController {
    store: Arc<Store>,
    doc: Arc<PageDocument>,
    bubbles: Arc<Mutex<Vec<Bubble>>>,
    bubble_hovered: Arc<AtomicBool>,
    close_task: Mutex<Option<JoinHandle<()>>>,
    /// Live voice status line ("Listening…" etc.)
    status: Mutex<String>,
    /// Messages submitted through the input, drained by the SDK
    submissions: Mutex<Vec<String>>,
}

impl ShellController {
    pub fn new(store: Arc<Store>, doc: Arc<PageDocument>) -> Arc<Self> {
        doc.mount_sdk_root();
        Arc::new(Self {
            store,
            doc,
            bubbles: Arc::new(Mutex::new(Vec::new())),
            bubble_hovered: Arc::new(AtomicBool::new(false)),
            close_task: Mutex::new(None),
            status: Mutex::new(String::new()),
            submissions: Mutex::new(Vec::new()),
        })
    }

    /// Route one host input through the state machine
    pub fn handle(&self, input: ShellInput) {
        match input {
            ShellInput::PointerEnter => {
                self.cancel_pending_close();
                self.store.set_state(StateUpdate::open(true));
            }
            ShellInput::PointerLeave => {
                let state = self.store.state();
                // closing is suppressed in voice mode and over a bubble
                if state.is_voice_mode || self.bubble_hovered.load(Ordering::SeqCst) {
                    return;
                }
                self.schedule_close();
            }
            ShellInput::OutsideClick => {
                self.cancel_pending_close();
                self.store.set_state(StateUpdate::open(false));
                self.bubbles.lock().clear();
            }
            ShellInput::BubbleHoverStart => {
                self.bubble_hovered.store(true, Ordering::SeqCst);
                self.cancel_pending_close();
            }
            ShellInput::BubbleHoverEnd => {
                self.bubble_hovered.store(false, Ordering::SeqCst);
            }
            ShellInput::Submit { text } => {
                let text = text.trim().to_string();
                if !text.is_empty() {
                    self.submissions.lock().push(text);
                }
            }
            ShellInput::VoiceToggle => {
                let entering = !self.store.state().is_voice_mode;
                self.store.set_state(StateUpdate::voice_mode(entering));
                if entering {
                    self.cancel_pending_close();
                    self.store.set_state(StateUpdate::open(true));
                } else {
                    *self.status.lock() = String::new();
                }
            }
        }
    }

    fn schedule_close(&self) {
        let store = Arc::clone(&self.store);
        let hovered = Arc::clone(&self.bubble_hovered);
        let task = tokio::spawn(async move {
            tokio::time::sleep(shell_consts::CLOSE_DEBOUNCE).await;
            if !hovered.load(Ordering::SeqCst) && !store.state().is_voice_mode {
                store.set_state(StateUpdate::open(false));
            }
        });
        if let Some(prior) = self.close_task.lock().replace(task) {
            prior.abort();
        }
    }

    fn cancel_pending_close(&self) {
        if let Some(task) = self.close_task.lock().take() {
            task.abort();
        }
    }

    /// Render an assistant message as a bubble in the shell
    pub fn push_bubble(&self, text: impl Into<String>, is_error: bool) {
        let text = text.into();
        self.doc.append_shell_text(&text);
        self.bubbles.lock().push(Bubble { text, is_error });
    }

    pub fn bubbles(&self) -> Vec<Bubble> {
        self.bubbles.lock().clone()
    }

    /// Update the live voice status indicator
    pub fn set_status(&self, status: impl Into<String>) {
        *self.status.lock() = status.into();
    }

    pub fn status(&self) -> String {
        self.status.lock().clone()
    }

    /// Drain messages submitted since the last call
    pub fn take_submissions(&self) -> Vec<String> {
        std::mem::take(&mut *self.submissions.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn setup() -> (Arc<Store>, Arc<ShellController>) {
        let doc = Arc::new(PageDocument::from_html(
            "https://acme.dev",
            "<html><body><main>host</main></body></html>",
        ));
        let store = Store::new();
        let shell = ShellController::new(Arc::clone(&store), doc);
        (store, shell)
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_opens_leave_closes_after_debounce() {
        let (store, shell) = setup();
        shell.handle(ShellInput::PointerEnter);
        assert!(store.state().is_open);

        shell.handle(ShellInput::PointerLeave);
        // still open inside the debounce window
        assert!(store.state().is_open);

        tokio::time::advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;
        assert!(!store.state().is_open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reenter_cancels_close() {
        let (store, shell) = setup();
        shell.handle(ShellInput::PointerEnter);
        shell.handle(ShellInput::PointerLeave);
        shell.handle(ShellInput::PointerEnter);

        tokio::time::advance(Duration::from_millis(300)).await;
        tokio::task::yield_now().await;
        assert!(store.state().is_open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_voice_mode_suppresses_close() {
        let (store, shell) = setup();
        shell.handle(ShellInput::VoiceToggle);
        assert!(store.state().is_voice_mode);
        assert!(store.state().is_open);

        shell.handle(ShellInput::PointerLeave);
        tokio::time::advance(Duration::from_millis(300)).await;
        tokio::task::yield_now().await;
        assert!(store.state().is_open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bubble_hover_suppresses_close() {
        let (store, shell) = setup();
        shell.handle(ShellInput::PointerEnter);
        shell.handle(ShellInput::BubbleHoverStart);
        shell.handle(ShellInput::PointerLeave);

        tokio::time::advance(Duration::from_millis(300)).await;
        tokio::task::yield_now().await;
        assert!(store.state().is_open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outside_click_closes_and_clears_bubbles() {
        let (store, shell) = setup();
        shell.handle(ShellInput::PointerEnter);
        shell.push_bubble("Hi! Looking for anything?", false);
        assert_eq!(shell.bubbles().len(), 1);

        shell.handle(ShellInput::OutsideClick);
        assert!(!store.state().is_open);
        assert!(shell.bubbles().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_trims_and_queues() {
        let (_store, shell) = setup();
        shell.handle(ShellInput::Submit {
            text: "  show me pricing  ".to_string(),
        });
        shell.handle(ShellInput::Submit {
            text: "   ".to_string(),
        });
        assert_eq!(shell.take_submissions(), vec!["show me pricing"]);
        assert!(shell.take_submissions().is_empty());
    }
}

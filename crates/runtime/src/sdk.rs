//! SDK facade
//!
//! `Sdk::init(config)` wires the whole runtime: page document, extractor
//! and cache, the action executor, the navigation agent, conversation flow
//! and sales analyzer, the LLM backend, the shell and the voice pipeline.
//! Anything the intent parser recognizes as intent-shaped routes through
//! the navigation agent, which owns the confidence gate and answers
//! low-confidence requests with the category-listing suggestion; plain
//! conversational chatter goes through the prompt builder to the LLM and
//! back out through the directive parser.

use crate::shell::ShellController;
use crate::store::{StateUpdate, Store};
use blitsum_agent::{
    directives, BehaviorEvent, BehaviorTracker, ConversationFlow, EngagementEngine, FiredTrigger,
    IntentParser, NavigationAgent, SalesAnalyzer,
};
use blitsum_config::constants::shell::VISITED_KEY;
use blitsum_config::RuntimeConfig;
use blitsum_core::{
    ActionKind, ConversationLog, ConversationStage, Directive, IntentKind, KeyValueStore,
    PageContext, SpeechRecognizer, Turn,
};
use blitsum_llm::{build_messages, LlmBackend, Message, PromptBuilder};
use blitsum_page::{ActionExecutor, CacheWatch, ContentCache, PageDocument, PageExtractor};
use blitsum_voice::{TtsSpeaker, VoiceError, VoiceEvent, VoiceSession};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Fallback reply when the LLM transport fails
const RETRY_MESSAGE: &str =
    "Sorry — something went wrong on my end. Mind trying that again?";

/// Host-provided services the SDK cannot own
pub struct HostBindings {
    pub doc: Arc<PageDocument>,
    pub llm: Arc<dyn LlmBackend>,
    pub speaker: Arc<dyn TtsSpeaker>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub storage: Arc<dyn KeyValueStore>,
}

/// One assistant reply with what happened along the way
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub text: String,
    pub stage: ConversationStage,
    pub directives: Vec<Directive>,
    pub via_navigation: bool,
    pub is_error: bool,
}

struct VoiceMode {
    session: Arc<VoiceSession>,
    turn_loop: JoinHandle<()>,
}

/// The embedded runtime
pub struct Sdk {
    config: RuntimeConfig,
    doc: Arc<PageDocument>,
    cache: Arc<ContentCache>,
    _cache_watch: CacheWatch,
    executor: Arc<ActionExecutor>,
    navigator: Arc<NavigationAgent>,
    flow: Arc<ConversationFlow>,
    tracker: Arc<BehaviorTracker>,
    engine: Arc<EngagementEngine>,
    engine_task: Mutex<Option<JoinHandle<()>>>,
    llm: Arc<dyn LlmBackend>,
    speaker: Arc<dyn TtsSpeaker>,
    recognizer: Arc<dyn SpeechRecognizer>,
    storage: Arc<dyn KeyValueStore>,
    pub store: Arc<Store>,
    pub shell: Arc<ShellController>,
    history: Mutex<ConversationLog>,
    voice: Mutex<Option<VoiceMode>>,
    started: AtomicBool,
}

impl Sdk {
    /// Build and start the runtime. Safe to call before or after the host
    /// page finished loading; starting an already started instance is a
    /// no-op.
    pub fn init(
        config: RuntimeConfig,
        host: HostBindings,
    ) -> (Arc<Self>, mpsc::Receiver<FiredTrigger>) {
        let store = Store::new();
        let shell = ShellController::new(Arc::clone(&store), Arc::clone(&host.doc));

        let cache = Arc::new(ContentCache::new());
        let cache_watch = ContentCache::watch(Arc::clone(&cache), &host.doc);

        let executor = Arc::new(ActionExecutor::new(Arc::clone(&host.doc)));
        let initial_context = Arc::new(PageExtractor::extract(&host.doc));
        cache.set(
            ContentCache::key_for(&host.doc),
            (*initial_context).clone(),
        );
        let navigator = Arc::new(NavigationAgent::new(
            Arc::clone(&executor),
            Arc::clone(&initial_context),
        ));

        let tracker = BehaviorTracker::new(Arc::clone(&host.doc));
        let (engine, trigger_rx) =
            EngagementEngine::new(blitsum_config::triggers::default_rules());

        let history = ConversationLog::with_capacity(config.history_entries());

        let sdk = Arc::new(Self {
            config,
            doc: host.doc,
            cache,
            _cache_watch: cache_watch,
            executor,
            navigator,
            flow: Arc::new(ConversationFlow::new()),
            tracker,
            engine,
            engine_task: Mutex::new(None),
            llm: host.llm,
            speaker: host.speaker,
            recognizer: host.recognizer,
            storage: host.storage,
            store,
            shell,
            history: Mutex::new(history),
            voice: Mutex::new(None),
            started: AtomicBool::new(false),
        });
        sdk.start();
        (sdk, trigger_rx)
    }

    /// Idempotent startup: behavior clock, trigger loop, visited flag
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.tracker.init();
        let engine_task = EngagementEngine::run(&self.engine, &self.tracker);
        *self.engine_task.lock() = Some(engine_task);

        if self.storage.get(VISITED_KEY).is_none() {
            if let Err(e) = self.storage.set(VISITED_KEY, "true") {
                tracing::warn!("could not persist visited flag: {e}");
            }
        }
    }

    pub fn tracker(&self) -> &Arc<BehaviorTracker> {
        &self.tracker
    }

    pub fn flow(&self) -> &Arc<ConversationFlow> {
        &self.flow
    }

    /// Current page context, served from the cache when fresh
    pub fn page_context(&self) -> Arc<PageContext> {
        let key = ContentCache::key_for(&self.doc);
        if let Some(context) = self.cache.get(&key) {
            return context;
        }
        let context = Arc::new(PageExtractor::extract(&self.doc));
        self.cache.set(key, (*context).clone());
        self.navigator.update_context(Arc::clone(&context));
        context
    }

    /// Handle one user message through the navigation or conversational
    /// path and render the reply into the shell
    pub async fn handle_user_message(&self, text: &str) -> AgentReply {
        self.tracker.handle_event(BehaviorEvent::MessageSent);
        let ctx = self.page_context();
        self.navigator.update_context(Arc::clone(&ctx));

        self.history.lock().push(Turn::user(text));

        let parsed = IntentParser::parse(text, &ctx);
        // the navigation agent owns the confidence gate: any intent-shaped
        // utterance goes through it, and low-confidence ones come back as
        // the deterministic category-listing suggestion
        let reply = if parsed.intent != IntentKind::Unknown {
            self.handle_navigation(text, &parsed).await
        } else {
            self.handle_conversation(text, &ctx).await
        };

        self.history.lock().push(Turn::assistant(&reply.text));
        self.shell.push_bubble(&reply.text, reply.is_error);
        reply
    }

    async fn handle_navigation(
        &self,
        text: &str,
        parsed: &blitsum_core::ParsedIntent,
    ) -> AgentReply {
        let result = self.navigator.navigate(text).await;
        if result
            .plan
            .iter()
            .any(|action| action.kind == ActionKind::Compare)
        {
            self.tracker.handle_event(BehaviorEvent::PlanComparison);
        }
        tracing::debug!(
            intent = parsed.intent.as_str(),
            success = result.success,
            "navigation handled"
        );
        AgentReply {
            text: result.response,
            stage: self.flow.current(),
            directives: Vec::new(),
            via_navigation: true,
            is_error: false,
        }
    }

    async fn handle_conversation(&self, text: &str, ctx: &Arc<PageContext>) -> AgentReply {
        let stage = self.flow.advance(text);

        let (user_messages, llm_history) = {
            let history = self.history.lock();
            let users: Vec<String> = history
                .user_messages()
                .iter()
                .map(|m| m.to_string())
                .collect();
            // the current user turn is passed separately to the prompt
            let turns = history.turns();
            let prior = turns[..turns.len().saturating_sub(1)]
                .iter()
                .map(|t| match t.role {
                    blitsum_core::TurnRole::User => Message::user(&t.content),
                    blitsum_core::TurnRole::Assistant => Message::assistant(&t.content),
                })
                .collect::<Vec<_>>();
            (users, prior)
        };
        let user_refs: Vec<&str> = user_messages.iter().map(|s| s.as_str()).collect();

        let profile = SalesAnalyzer::build_profile(&user_refs, self.tracker.snapshot());
        let bant = SalesAnalyzer::bant(&user_refs);

        let mut builder = PromptBuilder::new(ctx)
            .with_stage(stage, ConversationFlow::prompt_fragment(stage))
            .with_profile(&profile)
            .voice_mode(self.store.state().is_voice_mode);

        if stage == ConversationStage::Closing && bant.is_qualified {
            let closing = SalesAnalyzer::select_closing(&profile, &bant, ctx);
            builder = builder.with_closing_guidance(format!(
                "Use the {} close. Say: \"{}\" Then: {}",
                closing.technique.as_str(),
                closing.statement,
                closing.follow_up
            ));
            for action in &closing.actions {
                let outcome = self.executor.execute(action, ctx).await;
                if let Some(error) = outcome.error {
                    tracing::debug!(error, "closing action skipped");
                }
            }
        }

        let system_prompt = builder.build();
        let messages = build_messages(system_prompt, &llm_history, text);

        match self.llm.generate(&messages).await {
            Ok(raw) => {
                let parsed = directives::parse_reply(&raw);
                for directive in &parsed.directives {
                    let outcome = self.executor.dispatch_directive(directive, ctx).await;
                    if let Some(error) = outcome.error {
                        tracing::debug!(error, "directive failed");
                    }
                }
                AgentReply {
                    text: parsed.text,
                    stage,
                    directives: parsed.directives,
                    via_navigation: false,
                    is_error: false,
                }
            }
            Err(e) => {
                tracing::warn!("llm request failed: {e}");
                AgentReply {
                    text: RETRY_MESSAGE.to_string(),
                    stage,
                    directives: Vec::new(),
                    via_navigation: false,
                    is_error: true,
                }
            }
        }
    }

    /// Enter voice mode: create the session, start it, and pump completed
    /// turns through the conversation path
    pub async fn enter_voice_mode(sdk: &Arc<Self>) -> Result<Arc<VoiceSession>, VoiceError> {
        {
            let voice = sdk.voice.lock();
            if let Some(mode) = voice.as_ref() {
                return Ok(Arc::clone(&mode.session));
            }
        }

        let session = Arc::new(VoiceSession::new(
            Arc::clone(&sdk.recognizer),
            Arc::clone(&sdk.speaker),
            Duration::from_millis(sdk.config.voice.silence_threshold_ms),
        ));
        session.start().await?;
        sdk.store.set_state(StateUpdate::voice_mode(true));
        sdk.store.set_state(StateUpdate::open(true));

        let turn_loop = Self::spawn_voice_turn_loop(sdk, &session);
        *sdk.voice.lock() = Some(VoiceMode {
            session: Arc::clone(&session),
            turn_loop,
        });
        Ok(session)
    }

    fn spawn_voice_turn_loop(sdk: &Arc<Self>, session: &Arc<VoiceSession>) -> JoinHandle<()> {
        let sdk = Arc::clone(sdk);
        let session = Arc::clone(session);
        let mut events = session.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    VoiceEvent::TurnReady { transcript } => {
                        let reply = sdk.handle_user_message(&transcript).await;
                        match session.speak_response(&reply.text).await {
                            Ok(()) | Err(VoiceError::Interrupted) => {}
                            Err(e) => {
                                sdk.shell.push_bubble(e.to_string(), true);
                            }
                        }
                        sdk.shell.set_status(session.status_line());
                    }
                    VoiceEvent::StateChanged { .. } => {
                        sdk.shell.set_status(session.status_line());
                    }
                    VoiceEvent::Error { message } => {
                        sdk.shell.push_bubble(message, true);
                    }
                    _ => {}
                }
            }
        })
    }

    /// Exit voice mode, destroying the session and releasing the mic and
    /// audio resources
    pub async fn exit_voice_mode(&self) {
        let mode = self.voice.lock().take();
        if let Some(mode) = mode {
            mode.session.stop().await;
            mode.turn_loop.abort();
        }
        self.store.set_state(StateUpdate::voice_mode(false));
        self.shell.set_status("");
    }

    /// Conversation history snapshot
    pub fn history(&self) -> Vec<Turn> {
        self.history.lock().turns().to_vec()
    }

    /// Tear the runtime down: behavior clock, trigger loop, pending visual
    /// effects and any live voice session
    pub async fn teardown(&self) {
        self.exit_voice_mode().await;
        if let Some(task) = self.engine_task.lock().take() {
            task.abort();
        }
        self.tracker.teardown();
        self.executor.teardown();
        self.started.store(false, Ordering::SeqCst);
    }
}

//! Per-message routing state machine.
//!
//! Each inbound message runs through a fixed priority list of handlers. The first
//! one that applies produces the reply:
//!
//! 1. ended session: fixed notice, nothing changes
//! 2. crisis keyword: crisis message with handoff, session ends
//! 3. FAQ trigger: templated answer, consumes a turn (configurable)
//! 4. meta-query: canned description of the assistant, free
//! 5. small talk: canned greeting, free
//! 6. anything else consumes a turn; off-domain conversations get a redirect,
//!    the rest a generated reply
//!
//! When a substantive turn uses up the budget, the conversation is classified
//! into a suggestion category and the session ends.

pub mod replies;
pub mod topic;

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::bundle::ConfigBundle;
use crate::classify::{Classifiers, MetaQuery};
use crate::llm::{GenerateRequest, LLMError, TextGenerator};
use crate::session::{Session, SessionState, SessionStore};

pub use topic::{NON_DOMAIN_CATEGORY, TopicVerdict};

/// Which handler produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Ended,
    Crisis,
    Faq,
    Meta(MetaQuery),
    SmallTalk,
    OffTopic,
    Generated,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Ended => "ended",
            Route::Crisis => "crisis",
            Route::Faq => "faq",
            Route::Meta(_) => "meta",
            Route::SmallTalk => "small_talk",
            Route::OffTopic => "off_topic",
            Route::Generated => "generated",
        }
    }
}

/// Result of routing one chat message.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub session_id: String,
    pub reply: String,
    pub end: bool,
    pub remaining: u32,
    /// Set when the conversation should be handed to a human.
    pub handoff: bool,
    /// Present on the turn that closed the session by budget; confidence is
    /// rounded to three decimals.
    pub topic: Option<TopicVerdict>,
    pub route: Route,
}

/// Session position without sending a message.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub session_id: String,
    pub remaining: u32,
    pub end: bool,
}

/// Routes chat messages against a configuration snapshot and the session store.
#[derive(Clone)]
pub struct ResponseRouter {
    sessions: SessionStore,
    generator: Arc<dyn TextGenerator>,
    default_model: String,
}

impl ResponseRouter {
    pub fn new(
        sessions: SessionStore,
        generator: Arc<dyn TextGenerator>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            generator,
            default_model: default_model.into(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Report where a session stands, creating it if needed.
    pub fn status(&self, bundle: &ConfigBundle, session_id: Option<&str>) -> SessionStatus {
        let session_id = resolve_session_id(session_id);
        let session = self.sessions.get_or_create(&session_id);
        SessionStatus {
            remaining: session.remaining(bundle.settings.max_turns),
            end: session.ended,
            session_id,
        }
    }

    /// Route one message.
    pub async fn chat(
        &self,
        bundle: &ConfigBundle,
        session_id: Option<&str>,
        message: &str,
    ) -> ChatOutcome {
        let session_id = resolve_session_id(session_id);
        let message = message.trim();
        let mut session = self.sessions.get_or_create(&session_id);

        let settings = &bundle.settings;
        let max_turns = settings.max_turns;
        let classifiers = bundle.classifiers();

        if session.ended {
            return self.reply(&session, max_turns, Route::Ended, replies::SESSION_ENDED);
        }

        if classifiers.is_crisis(message) {
            session.end();
            self.sessions.commit(session.clone());
            let mut outcome = self.reply(&session, max_turns, Route::Crisis, &bundle.crisis.message);
            outcome.handoff = true;
            return outcome;
        }

        if let Some(answer) = classifiers.match_faq(message) {
            if settings.faq_consumes_turn {
                record_turn(&mut session, &classifiers, message, max_turns);
                self.sessions.commit(session.clone());
            }
            return self.reply(&session, max_turns, Route::Faq, answer);
        }

        if let Some(kind) = classifiers.match_meta_query(message) {
            let reply = match kind {
                MetaQuery::Who => replies::meta_who(bundle.clinic_name()),
                MetaQuery::Can => replies::meta_can(max_turns),
                MetaQuery::About => replies::meta_about(bundle.clinic_name()),
            };
            return self.reply(&session, max_turns, Route::Meta(kind), &reply);
        }

        if classifiers.is_small_talk(message) {
            return self.reply(&session, max_turns, Route::SmallTalk, replies::SMALL_TALK);
        }

        // Committed before the generative call so a slow provider does not hold
        // back the turn count seen by other requests.
        record_turn(&mut session, &classifiers, message, max_turns);
        self.sessions.commit(session.clone());

        let (route, mut reply) = if session.on_topic {
            (Route::Generated, self.generate_reply(bundle, message).await)
        } else {
            (Route::OffTopic, replies::OFF_TOPIC.to_string())
        };

        if session.state(max_turns) != SessionState::Terminating {
            return self.reply(&session, max_turns, route, &reply);
        }

        let verdict = self.classify_topic(bundle, &session).await;
        let closing = closing_text(bundle);
        let label = bundle
            .suggestion_label(&verdict.category)
            .filter(|_| verdict.meets_threshold(settings.classify_confidence));
        reply = match label {
            Some(label) => replies::with_recommendation(&reply, label, &closing),
            None => replies::with_closing(&reply, &closing),
        };

        session.end();
        self.sessions.commit(session.clone());
        debug!(
            session_id = %session.id,
            category = %verdict.category,
            confidence = ?verdict.confidence,
            recommended = label.is_some(),
            "Session closed by turn limit"
        );

        let mut outcome = self.reply(&session, max_turns, route, &reply);
        outcome.topic = Some(TopicVerdict {
            confidence: verdict.rounded_confidence(),
            ..verdict
        });
        outcome
    }

    fn reply(&self, session: &Session, max_turns: u32, route: Route, reply: &str) -> ChatOutcome {
        debug!(session_id = %session.id, route = route.as_str(), turns = session.turns, "Routed message");
        ChatOutcome {
            session_id: session.id.clone(),
            reply: reply.to_string(),
            end: session.ended,
            remaining: session.remaining(max_turns),
            handoff: false,
            topic: None,
            route,
        }
    }

    fn model<'a>(&'a self, bundle: &'a ConfigBundle) -> &'a str {
        bundle
            .settings
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model)
    }

    /// Generated reply, or a warning text when the provider is unavailable.
    async fn generate_reply(&self, bundle: &ConfigBundle, message: &str) -> String {
        let request = GenerateRequest::new(self.model(bundle), &bundle.system_prompt, message);
        match self.generator.generate(request).await {
            Ok(text) if text.is_empty() => bundle.settings.reply_fallback.clone(),
            Ok(text) => text,
            Err(LLMError::NotConfigured) => replies::NOT_CONFIGURED.to_string(),
            Err(e) => {
                warn!(error = %e, "Generative call failed");
                replies::generation_failed(&e)
            }
        }
    }

    /// Classify the last `max_turns` transcript entries.
    async fn classify_topic(&self, bundle: &ConfigBundle, session: &Session) -> TopicVerdict {
        let window = bundle.settings.max_turns as usize;
        let skip = session.transcript_len().saturating_sub(window);
        let conversation = session.transcript().skip(skip).collect::<Vec<_>>().join(" ");

        let prompt = topic::classification_prompt(
            bundle.suggestions.iter().map(|(category, _)| category.as_str()),
            &conversation,
        );
        let request = GenerateRequest::new(self.model(bundle), &bundle.system_prompt, prompt);
        match self.generator.generate(request).await {
            Ok(raw) => TopicVerdict::parse(&raw),
            Err(e) => {
                warn!(error = %e, "Topic classification failed");
                TopicVerdict::default()
            }
        }
    }
}

/// Count a turn and latch the on-topic flag.
///
/// Relevance is checked over the whole retained window so a keyword split
/// across consecutive messages still counts; the flag keeps earlier matches
/// once they fall out of the window.
fn record_turn(session: &mut Session, classifiers: &Classifiers<'_>, message: &str, max_turns: u32) {
    session.record_turn(message, max_turns);
    if classifiers.is_domain_relevant(session.transcript()) {
        session.mark_on_topic();
    }
}

/// Configured closing text, or the default naming the turn budget.
fn closing_text(bundle: &ConfigBundle) -> String {
    if bundle.closing.is_empty() {
        replies::default_closing(bundle.settings.max_turns)
    } else {
        bundle.closing.clone()
    }
}

fn resolve_session_id(session_id: Option<&str>) -> String {
    session_id
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

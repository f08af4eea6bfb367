//! Turn controller: one user turn as an explicit state machine
//!
//! Phases:
//! - SENT → ACCEPTED: reply passes the switching policy
//! - SENT → SWITCHED → RESENT: refusal detected, budget left, not on fallback
//! - SENT → REVERTED → RESENT: empty reply, back to the primary model
//! - SENT → ABORTED: call failed (or empty-reply cap reached)
//!
//! RESENT behaves like SENT and may loop through the same edges. Every
//! rollback restores the snapshot taken right after the user message and
//! returns the toolbox to its checkpoint from the same moment.

use chrono::Utc;

use crate::config::SwitchConfig;
use crate::core::client::ChatBackend;
use crate::core::policy::SwitchPolicy;
use crate::core::toolbox::ToolBox;
use crate::error::{ChatError, Result};
use crate::types::{
    ChatMessage, ChatRequest, Conversation, ReasonCode, Transition, TurnOutcome, TurnPhase,
    TurnSnapshot,
};

/// Asked before switching: `(current_model, fallback_model) -> proceed?`
pub type SwitchConfirm = Box<dyn FnMut(&str, &str) -> bool + Send>;

/// Next thing the turn loop does
enum Step {
    Call(TurnPhase),
    Switch { from: TurnPhase, to: String },
    Revert { from: TurnPhase },
    Accept { from: TurnPhase, reply: String, reason: ReasonCode },
    Abort { from: TurnPhase, error: ChatError, reason: ReasonCode },
}

/// Per-turn bookkeeping
#[derive(Debug, Default)]
struct TurnRecord {
    switches: u32,
    empty_retries: u32,
    transitions: Vec<Transition>,
}

impl TurnRecord {
    fn push(&mut self, from: TurnPhase, to: TurnPhase, reason: ReasonCode) {
        tracing::debug!(%from, %to, reason = reason.code(), "turn transition");
        self.transitions.push(Transition { from, to, reason });
    }

    fn finish(self, phase: TurnPhase, reply: Option<String>, model: &str, error: Option<String>) -> TurnOutcome {
        debug_assert!(phase.is_terminal());
        TurnOutcome {
            timestamp: Utc::now(),
            phase,
            reply,
            model: model.to_string(),
            switches: self.switches,
            empty_retries: self.empty_retries,
            transitions: self.transitions,
            error,
        }
    }
}

/// Drives user turns against a backend, owning the active model choice
pub struct TurnController {
    config: SwitchConfig,
    policy: SwitchPolicy,
    active_model: String,
    confirm: Option<SwitchConfirm>,
}

impl std::fmt::Debug for TurnController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnController")
            .field("config", &self.config)
            .field("active_model", &self.active_model)
            .field("confirm", &self.confirm.is_some())
            .finish()
    }
}

impl TurnController {
    /// Controller with the default trigger set, starting on the primary model
    pub fn new(config: SwitchConfig) -> Self {
        let active_model = config.primary_model.clone();
        Self {
            config,
            policy: SwitchPolicy::new(),
            active_model,
            confirm: None,
        }
    }

    /// Replace the trigger set
    pub fn with_policy(mut self, policy: SwitchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Ask before every switch; declining accepts the reply as is
    pub fn with_confirmation(mut self, confirm: SwitchConfirm) -> Self {
        self.confirm = Some(confirm);
        self
    }

    /// Model the next call will use
    pub fn active_model(&self) -> &str {
        &self.active_model
    }

    pub fn config(&self) -> &SwitchConfig {
        &self.config
    }

    pub fn policy(&self) -> &SwitchPolicy {
        &self.policy
    }

    /// Run one user turn to a terminal phase
    ///
    /// On ACCEPTED the history ends with the assistant reply; on ABORTED it
    /// ends with the user message.
    pub async fn run_turn(
        &mut self,
        backend: &dyn ChatBackend,
        tools: &mut dyn ToolBox,
        conversation: &mut Conversation,
        user_input: &str,
    ) -> TurnOutcome {
        conversation.push(ChatMessage::user(user_input));
        let snapshot = TurnSnapshot::take(conversation);
        tools.checkpoint();
        tracing::debug!(messages = snapshot.len(), "turn snapshot taken");
        let mut record = TurnRecord::default();
        let mut step = Step::Call(TurnPhase::Sent);

        loop {
            step = match step {
                Step::Call(phase) => match self.exchange(backend, tools, conversation).await {
                    Ok(reply) => self.judge(phase, reply, &record),
                    Err(error) => Step::Abort {
                        from: phase,
                        error,
                        reason: ReasonCode::T004_CALL_FAILED,
                    },
                },

                Step::Switch { from, to } => {
                    snapshot.restore(conversation);
                    tools.rollback();
                    tracing::info!(from = %self.active_model, to = %to, "refusal detected, switching model");
                    record.push(from, TurnPhase::Switched, ReasonCode::T002_REFUSAL_DETECTED);
                    record.push(TurnPhase::Switched, TurnPhase::Resent, ReasonCode::T003_RESEND_FALLBACK);
                    self.active_model = to;
                    record.switches += 1;
                    Step::Call(TurnPhase::Resent)
                }

                Step::Revert { from } => {
                    snapshot.restore(conversation);
                    tools.rollback();
                    tracing::warn!(
                        from = %self.active_model,
                        to = %self.config.primary_model,
                        retries = record.empty_retries + 1,
                        "empty reply, reverting to primary model"
                    );
                    record.push(from, TurnPhase::Reverted, ReasonCode::T002_EMPTY_REPLY);
                    record.push(TurnPhase::Reverted, TurnPhase::Resent, ReasonCode::T003_RESEND_PRIMARY);
                    self.active_model = self.config.primary_model.clone();
                    record.empty_retries += 1;
                    Step::Call(TurnPhase::Resent)
                }

                Step::Accept { from, reply, reason } => {
                    record.push(from, TurnPhase::Accepted, reason);
                    conversation.push(ChatMessage::assistant(reply.clone()));
                    return record.finish(TurnPhase::Accepted, Some(reply), &self.active_model, None);
                }

                Step::Abort { from, error, reason } => {
                    snapshot.restore(conversation);
                    tools.rollback();
                    tracing::error!(error = %error, model = %self.active_model, "turn aborted");
                    record.push(from, TurnPhase::Aborted, reason);
                    return record.finish(TurnPhase::Aborted, None, &self.active_model, Some(error.to_string()));
                }
            };
        }
    }

    /// Decide what a finished reply means for the turn
    fn judge(&mut self, from: TurnPhase, reply: String, record: &TurnRecord) -> Step {
        let Some(fallback) = self.config.fallback.as_ref() else {
            return Step::Accept { from, reply, reason: ReasonCode::T001_REPLY_ACCEPTED };
        };

        if let Some(trigger) = self.policy.first_match(&reply) {
            tracing::debug!(trigger, model = %self.active_model, "reply matched refusal trigger");
            if self.active_model == fallback.model {
                return Step::Accept { from, reply, reason: ReasonCode::T001_ALREADY_ON_FALLBACK };
            }
            if record.switches >= fallback.max_switches_per_turn {
                return Step::Accept { from, reply, reason: ReasonCode::T001_SWITCH_BUDGET_EXHAUSTED };
            }
            if let Some(confirm) = self.confirm.as_mut() {
                if !confirm(&self.active_model, &fallback.model) {
                    return Step::Accept { from, reply, reason: ReasonCode::T001_SWITCH_DECLINED };
                }
            }
            return Step::Switch { from, to: fallback.model.clone() };
        }

        if reply.is_empty() {
            if let Some(limit) = fallback.max_empty_retries {
                if record.empty_retries >= limit {
                    return Step::Abort {
                        from,
                        error: ChatError::EmptyRetriesExhausted(record.empty_retries),
                        reason: ReasonCode::T004_EMPTY_RETRIES_EXHAUSTED,
                    };
                }
            }
            return Step::Revert { from };
        }

        Step::Accept { from, reply, reason: ReasonCode::T001_REPLY_ACCEPTED }
    }

    /// One model exchange: call, resolve tool rounds, return the final text
    async fn exchange(
        &self,
        backend: &dyn ChatBackend,
        tools: &mut dyn ToolBox,
        conversation: &mut Conversation,
    ) -> Result<String> {
        let declared = tools.declarations().to_vec();
        let offered = (!declared.is_empty()).then_some(declared.as_slice());

        let mut reply = backend
            .complete(&ChatRequest {
                model: &self.active_model,
                messages: conversation.messages(),
                tools: offered,
            })
            .await?;

        let mut rounds = 0;
        while reply.has_tool_calls() && rounds < self.config.max_tool_rounds {
            rounds += 1;
            let calls = reply.tool_calls.take().unwrap_or_default();
            conversation.push(ChatMessage::assistant_tool_calls(calls.clone()));

            for call in &calls {
                let args = call.function.parsed_arguments();
                tracing::info!(tool = %call.function.name, id = %call.id, "running tool");
                let result = tools.call(&call.function.name, &args);
                conversation.push(ChatMessage::tool_result(call.id.clone(), &result));
            }

            let followup_tools = if self.config.tools_on_followup { offered } else { None };
            reply = backend
                .complete(&ChatRequest {
                    model: &self.active_model,
                    messages: conversation.messages(),
                    tools: followup_tools,
                })
                .await?;
        }

        Ok(reply.text_or_empty().to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FallbackConfig;
    use crate::core::toolbox::NoTools;
    use crate::types::{AssistantReply, Role};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies and remembers which model each call used
    struct Scripted {
        replies: Mutex<VecDeque<Result<AssistantReply>>>,
        models: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<AssistantReply>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                models: Mutex::new(Vec::new()),
            }
        }

        fn texts(texts: &[&str]) -> Self {
            Self::new(texts.iter().map(|t| Ok(AssistantReply::text(*t))).collect())
        }

        fn models(&self) -> Vec<String> {
            self.models.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for Scripted {
        async fn complete(&self, request: &ChatRequest<'_>) -> Result<AssistantReply> {
            self.models.lock().unwrap().push(request.model.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ChatError::Backend("script exhausted".into())))
        }
    }

    fn config() -> SwitchConfig {
        SwitchConfig {
            primary_model: "primary".into(),
            fallback: Some(FallbackConfig {
                model: "fallback".into(),
                max_switches_per_turn: 1,
                max_empty_retries: None,
            }),
            max_tool_rounds: 1,
            tools_on_followup: false,
        }
    }

    #[tokio::test]
    async fn test_plain_reply_accepted() {
        let backend = Scripted::texts(&["Hello there."]);
        let mut controller = TurnController::new(config());
        let mut conv = Conversation::with_system("sys");

        let out = controller.run_turn(&backend, &mut NoTools, &mut conv, "hi").await;

        assert!(out.is_accepted());
        assert_eq!(out.reply.as_deref(), Some("Hello there."));
        assert_eq!(out.switches, 0);
        assert_eq!(conv.len(), 3);
        assert_eq!(conv.last().unwrap().role, Role::Assistant);
        assert_eq!(backend.models(), vec!["primary"]);
    }

    #[tokio::test]
    async fn test_refusal_switches_once() {
        let backend = Scripted::texts(&["I can't help with that request.", "Sure, here you go."]);
        let mut controller = TurnController::new(config());
        let mut conv = Conversation::with_system("sys");

        let out = controller.run_turn(&backend, &mut NoTools, &mut conv, "please").await;

        assert!(out.is_accepted());
        assert_eq!(out.switches, 1);
        assert_eq!(out.model, "fallback");
        assert_eq!(controller.active_model(), "fallback");
        assert_eq!(backend.models(), vec!["primary", "fallback"]);
        // no refusal leaked into history
        assert_eq!(conv.count_role(Role::Assistant), 1);
        assert_eq!(conv.last().unwrap().content.as_deref(), Some("Sure, here you go."));
    }

    #[tokio::test]
    async fn test_refusal_on_fallback_is_accepted() {
        let backend = Scripted::texts(&["I can't help with that.", "That is forbidden."]);
        let mut controller = TurnController::new(config());
        let mut conv = Conversation::new();

        let out = controller.run_turn(&backend, &mut NoTools, &mut conv, "x").await;

        assert!(out.is_accepted());
        assert_eq!(out.switches, 1);
        assert_eq!(out.final_reason(), Some(ReasonCode::T001_ALREADY_ON_FALLBACK));
        assert_eq!(out.reply.as_deref(), Some("That is forbidden."));
    }

    #[tokio::test]
    async fn test_no_fallback_accepts_everything() {
        let backend = Scripted::texts(&[""]);
        let mut controller = TurnController::new(SwitchConfig::without_fallback("gm"));
        let mut conv = Conversation::new();

        let out = controller.run_turn(&backend, &mut NoTools, &mut conv, "x").await;

        assert!(out.is_accepted());
        assert_eq!(out.reply.as_deref(), Some(""));
        assert_eq!(backend.models(), vec!["gm"]);
    }

    #[tokio::test]
    async fn test_declined_switch_keeps_reply() {
        let backend = Scripted::texts(&["I cannot comply."]);
        let mut controller = TurnController::new(config()).with_confirmation(Box::new(|_: &str, _: &str| false));
        let mut conv = Conversation::new();

        let out = controller.run_turn(&backend, &mut NoTools, &mut conv, "x").await;

        assert!(out.is_accepted());
        assert_eq!(out.final_reason(), Some(ReasonCode::T001_SWITCH_DECLINED));
        assert_eq!(controller.active_model(), "primary");
    }

    #[tokio::test]
    async fn test_call_failure_aborts_and_keeps_user_message() {
        let backend = Scripted::new(vec![Err(ChatError::Backend("down".into()))]);
        let mut controller = TurnController::new(config());
        let mut conv = Conversation::with_system("sys");

        let out = controller.run_turn(&backend, &mut NoTools, &mut conv, "hello?").await;

        assert_eq!(out.phase, TurnPhase::Aborted);
        assert!(out.error.unwrap().contains("down"));
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.last().unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn test_empty_retry_cap() {
        let backend = Scripted::texts(&["", "", ""]);
        let mut cfg = config();
        if let Some(fb) = cfg.fallback.as_mut() {
            fb.max_empty_retries = Some(2);
        }
        let mut controller = TurnController::new(cfg);
        let mut conv = Conversation::new();

        let out = controller.run_turn(&backend, &mut NoTools, &mut conv, "x").await;

        assert_eq!(out.phase, TurnPhase::Aborted);
        assert_eq!(out.empty_retries, 2);
        assert_eq!(out.final_reason(), Some(ReasonCode::T004_EMPTY_RETRIES_EXHAUSTED));
        assert_eq!(conv.len(), 1);
    }
}

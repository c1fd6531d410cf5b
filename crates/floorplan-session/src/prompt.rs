//! Asynchronous prompts
//!
//! Actions that need a value from the user ask a [`Prompter`] and get back
//! either the value or a cancellation. Whatever drives the prompt (a
//! terminal, a dialog, a script) sits behind the trait.

use std::collections::VecDeque;

use async_trait::async_trait;

/// Answer to a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome<T> {
    Value(T),
    Cancelled,
}

impl<T> PromptOutcome<T> {
    pub fn value(self) -> Option<T> {
        match self {
            PromptOutcome::Value(v) => Some(v),
            PromptOutcome::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PromptOutcome<U> {
        match self {
            PromptOutcome::Value(v) => PromptOutcome::Value(f(v)),
            PromptOutcome::Cancelled => PromptOutcome::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PromptOutcome::Cancelled)
    }
}

/// Source of user input for actions that need it
#[async_trait]
pub trait Prompter: Send {
    /// Ask for a line of text, pre-filled with `default` when given
    async fn ask(&mut self, question: &str, default: Option<&str>) -> PromptOutcome<String>;

    /// Ask a yes/no question
    async fn confirm(&mut self, question: &str) -> bool;
}

/// Prompter that replays canned answers, in order
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<PromptOutcome<String>>,
    confirmations: VecDeque<bool>,
    /// Every question asked so far
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, text: impl Into<String>) -> Self {
        self.answers.push_back(PromptOutcome::Value(text.into()));
        self
    }

    pub fn cancel(mut self) -> Self {
        self.answers.push_back(PromptOutcome::Cancelled);
        self
    }

    pub fn confirm_with(mut self, yes: bool) -> Self {
        self.confirmations.push_back(yes);
        self
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn ask(&mut self, question: &str, _default: Option<&str>) -> PromptOutcome<String> {
        self.asked.push(question.to_string());
        // Running out of answers counts as dismissing the prompt
        self.answers.pop_front().unwrap_or(PromptOutcome::Cancelled)
    }

    async fn confirm(&mut self, question: &str) -> bool {
        self.asked.push(question.to_string());
        self.confirmations.pop_front().unwrap_or(false)
    }
}

//! Interactive decisions behind an injectable [`Prompter`].
//!
//! Orchestration code never reads stdin directly; it asks a `Prompter`, so
//! the same logic runs against a terminal or a scripted answer queue.
use std::collections::VecDeque;
use std::io::IsTerminal as _;
use std::sync::Mutex;

/// Source of answers to interactive questions.
pub trait Prompter: Send + Sync + std::fmt::Debug {
    /// Ask a yes/no question. Empty input selects `default`.
    fn confirm(&self, question: &str, default: bool) -> bool;

    /// Ask the user to pick one of `options`; returns its index.
    fn choose(&self, question: &str, options: &[&str]) -> usize;
}

/// [`Prompter`] that asks on the controlling terminal.
///
/// When stdin is not a terminal every question resolves to its default
/// (the `default` argument for confirmations, the first option for choices).
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str, default: bool) -> bool {
        if !std::io::stdin().is_terminal() {
            return default;
        }
        dialoguer::Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()
            .unwrap_or(default)
    }

    fn choose(&self, question: &str, options: &[&str]) -> usize {
        if !std::io::stdin().is_terminal() || options.is_empty() {
            return 0;
        }
        dialoguer::Select::new()
            .with_prompt(question)
            .items(options)
            .default(0)
            .interact()
            .unwrap_or(0)
    }
}

/// A pre-recorded answer for [`ScriptedPrompter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    /// Reply to a `confirm` question.
    Confirm(bool),
    /// Reply to a `choose` question (option index).
    Choice(usize),
}

/// [`Prompter`] that replays queued answers, for tests and unattended runs.
///
/// Questions are recorded in the order they were asked. When the queue is
/// exhausted, or the next answer is of the wrong kind, the question's
/// default is used.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    /// Create a prompter that will reply with `answers` in order.
    #[must_use]
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Questions asked so far.
    #[must_use]
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    fn next(&self, question: &str) -> Option<Answer> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.to_string());
        }
        self.answers.lock().ok()?.pop_front()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str, default: bool) -> bool {
        match self.next(question) {
            Some(Answer::Confirm(yes)) => yes,
            _ => default,
        }
    }

    fn choose(&self, question: &str, options: &[&str]) -> usize {
        match self.next(question) {
            Some(Answer::Choice(i)) if i < options.len() => i,
            _ => 0,
        }
    }
}

use crate::config::Prompt;
use std::collections::VecDeque;

/// The prompts currently on screen.
///
/// Index 0 is the newest entry, furthest from being typed; the last entry is
/// the active prompt the keyboard is judged against.
#[derive(Debug, Default, Clone)]
pub struct DisplayQueue {
    entries: VecDeque<Prompt>,
}

impl DisplayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with a freshly scheduled batch.
    ///
    /// The first prompt of the batch becomes the active one, so a sequence
    /// group is typed in the order it was written.
    pub fn fill(&mut self, batch: Vec<Prompt>) {
        self.entries = batch.into_iter().rev().collect();
    }

    pub fn active(&self) -> Option<&Prompt> {
        self.entries.back()
    }

    /// The prompt that becomes active after the current one is answered
    pub fn upcoming(&self) -> Option<&Prompt> {
        self.entries.iter().rev().nth(1)
    }

    pub fn pop_active(&mut self) -> Option<Prompt> {
        self.entries.pop_back()
    }

    pub fn push_newest(&mut self, prompt: Prompt) {
        self.entries.push_front(prompt);
    }

    /// Drop every entry for `name`, returning how many were removed
    pub fn remove_named(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|p| p.name != name);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from newest (top of the screen) to active (bottom)
    pub fn iter(&self) -> impl Iterator<Item = &Prompt> {
        self.entries.iter()
    }
}

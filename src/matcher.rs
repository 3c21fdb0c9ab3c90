use crate::config::DEFAULT_VISIBLE_PROMPTS;
use crate::keys::{decode, encode, is_modifier, is_single_key, normalize, KeySet};
use crate::queue::DisplayQueue;
use crate::scheduler::WeightedScheduler;
use tracing::debug;

/// Result of feeding one key transition to the engine.
///
/// Any reported outcome means the display changed and should be redrawn.
#[derive(Clone, Debug, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Outcome {
    Correct,
    Incorrect,
    InProgress,
}

/// Keyboard state tracked between events
#[derive(Debug, Default, Clone)]
pub struct InputState {
    /// canonical tokens of every key currently held
    pub current_keys: KeySet,
    /// a chord has been started and is waiting for its remaining keys
    pub waiting_for_combination: bool,
    /// tokens of the chord being waited for
    pub target_hotkey_parts: KeySet,
    /// the active prompt has been missed at least once
    pub wrong_attempt: bool,
    /// canonical form of the keys held at the last key down
    pub last_pressed: String,
}

/// Judges key transitions against the active prompt and keeps the display
/// queue topped up from the scheduler.
///
/// Hotkeys that are a single non-modifier key are judged on the press itself.
/// Everything else is a chord: the first matching key starts a wait, and the
/// wait ends as soon as the held keys either equal the target (correct) or
/// stray outside it (incorrect). Releasing keys mid-chord until nothing of the
/// target is held counts as a miss.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    scheduler: WeightedScheduler,
    queue: DisplayQueue,
    input: InputState,
    visible_prompts: usize,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new(WeightedScheduler::new(), DEFAULT_VISIBLE_PROMPTS)
    }
}

impl MatchEngine {
    pub fn new(scheduler: WeightedScheduler, visible_prompts: usize) -> Self {
        let mut engine = Self {
            scheduler,
            queue: DisplayQueue::new(),
            input: InputState::default(),
            visible_prompts,
        };
        engine.refill();
        engine
    }

    pub fn scheduler(&self) -> &WeightedScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut WeightedScheduler {
        &mut self.scheduler
    }

    pub fn queue(&self) -> &DisplayQueue {
        &self.queue
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn visible_prompts(&self) -> usize {
        self.visible_prompts
    }

    pub fn is_awaiting_combination(&self) -> bool {
        self.input.waiting_for_combination
    }

    pub fn set_visible_prompts(&mut self, visible_prompts: usize) {
        if self.visible_prompts != visible_prompts {
            self.visible_prompts = visible_prompts;
            self.reset();
        }
    }

    /// Throw away the queue and any partial chord, then schedule a fresh batch
    pub fn reset(&mut self) {
        self.queue.clear();
        self.stop_waiting();
        self.input.wrong_attempt = false;
        self.refill();
    }

    /// Forget every held key without a verdict, e.g. after input was suppressed
    pub fn release_all(&mut self) {
        self.input.current_keys.clear();
        self.stop_waiting();
    }

    /// Drop queue entries for a prompt that no longer exists
    pub fn forget_prompt(&mut self, name: &str) {
        let active_removed = self.queue.active().is_some_and(|p| p.name == name);
        self.queue.remove_named(name);
        if active_removed {
            self.stop_waiting();
            self.input.wrong_attempt = false;
        }
        self.refill();
    }

    /// Schedule a full batch when the queue has run dry
    pub fn refill(&mut self) -> bool {
        if !self.queue.is_empty() {
            return false;
        }
        let batch = self.scheduler.next_batch(self.visible_prompts);
        self.queue.fill(batch);
        !self.queue.is_empty()
    }

    pub fn key_down(&mut self, raw: &str) -> Option<Outcome> {
        let token = normalize(raw);
        self.input.current_keys.insert(token.clone());
        self.input.last_pressed = encode(&self.input.current_keys);

        let Some(active) = self.queue.active() else {
            self.refill();
            return None;
        };
        let name = active.name.clone();
        let target = decode(&active.hotkey);

        if is_single_key(&target) {
            let held = self.held_non_modifiers();
            return if held == 1 && target.contains(&token) {
                Some(self.correct(&name))
            } else if held > 1 || (held == 1 && !target.contains(&token)) {
                Some(self.incorrect(&name))
            } else {
                None
            };
        }

        if !self.input.waiting_for_combination {
            if target.contains(&token) {
                self.await_combination(target);
                return Some(Outcome::InProgress);
            }
            return None;
        }

        let held = &self.input.current_keys;
        if !held.is_subset(&self.input.target_hotkey_parts) {
            self.stop_waiting();
            Some(self.incorrect(&name))
        } else if *held == self.input.target_hotkey_parts {
            self.stop_waiting();
            let outcome = self.correct(&name);
            self.carry_over();
            Some(outcome)
        } else {
            None
        }
    }

    pub fn key_up(&mut self, raw: &str) -> Option<Outcome> {
        let token = normalize(raw);
        if !self.input.current_keys.remove(&token) {
            return None;
        }

        let name = self.queue.active()?.name.clone();

        if self.input.waiting_for_combination {
            let held = &self.input.current_keys;
            if held.is_empty() || !held.is_subset(&self.input.target_hotkey_parts) {
                self.stop_waiting();
                if !self.input.wrong_attempt {
                    return Some(self.incorrect(&name));
                }
            }
            return None;
        }

        let target = self.queue.active().map(|p| decode(&p.hotkey))?;
        if is_single_key(&target) && self.held_non_modifiers() > 0 && !self.input.wrong_attempt {
            return Some(self.incorrect(&name));
        }
        None
    }

    fn held_non_modifiers(&self) -> usize {
        self.input
            .current_keys
            .iter()
            .filter(|k| !is_modifier(k))
            .count()
    }

    fn await_combination(&mut self, target: KeySet) {
        self.input.waiting_for_combination = true;
        self.input.target_hotkey_parts = target;
        self.input.wrong_attempt = false;
    }

    fn stop_waiting(&mut self) {
        self.input.waiting_for_combination = false;
        self.input.target_hotkey_parts.clear();
    }

    /// Keys still held after a completed chord may already start the next one
    fn carry_over(&mut self) {
        let Some(next) = self.queue.active() else {
            return;
        };
        let next_target = decode(&next.hotkey);
        if self
            .input
            .current_keys
            .iter()
            .any(|k| next_target.contains(k))
        {
            self.await_combination(next_target);
        }
    }

    fn correct(&mut self, name: &str) -> Outcome {
        self.scheduler.performance_mut().record_correct(name);
        self.input.wrong_attempt = false;
        self.queue.pop_active();

        if self.queue.len() < self.visible_prompts {
            if let Some(next) = self.scheduler.next_batch(1).into_iter().next() {
                self.queue.push_newest(next);
            }
        }

        debug!(
            prompt = name,
            streak = self.scheduler.performance().streak(name),
            weight = self.scheduler.performance().weight(name),
            "correct"
        );
        Outcome::Correct
    }

    fn incorrect(&mut self, name: &str) -> Outcome {
        self.scheduler.performance_mut().record_miss(name);
        self.input.wrong_attempt = true;
        debug!(
            prompt = name,
            pressed = %self.input.last_pressed,
            weight = self.scheduler.performance().weight(name),
            "incorrect"
        );
        Outcome::Incorrect
    }
}

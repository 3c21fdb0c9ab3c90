use crate::config::{
    check_weight, parse_sequence_groups, parse_weight, Config, Prompt, SequenceGroup,
    VISIBLE_PROMPTS_RANGE,
};
use crate::error::{Result, TrainerError};
use crate::keys::canonical_hotkey;
use crate::matcher::{MatchEngine, Outcome};
use crate::scheduler::{Performance, WeightedScheduler};
use tracing::info;

/// One row of the drill display
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayEntry {
    pub name: String,
    /// `None` while hotkeys are hidden
    pub hotkey: Option<String>,
    pub active: bool,
    /// the entry is active and has been missed at least once
    pub wrong: bool,
}

/// Everything the drill front end talks to: the match engine plus the
/// prompt editing operations and display settings.
#[derive(Debug, Clone)]
pub struct Trainer {
    engine: MatchEngine,
    show_hotkeys: bool,
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Trainer {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            engine: MatchEngine::new(scheduler(seed), crate::config::DEFAULT_VISIBLE_PROMPTS),
            show_hotkeys: true,
        }
    }

    pub fn from_config(cfg: Config, seed: Option<u64>) -> Result<Self> {
        cfg.validate()?;
        let mut scheduler = scheduler(seed);
        scheduler.replace(cfg.prompts, cfg.sequence_groups);
        Ok(Self {
            engine: MatchEngine::new(scheduler, cfg.visible_prompts),
            show_hotkeys: true,
        })
    }

    /// Swap in a new configuration. Nothing changes when it fails validation.
    pub fn apply_config(&mut self, cfg: Config) -> Result<()> {
        cfg.validate()?;
        self.engine
            .scheduler_mut()
            .replace(cfg.prompts, cfg.sequence_groups);
        if self.engine.visible_prompts() == cfg.visible_prompts {
            self.engine.reset();
        } else {
            self.engine.set_visible_prompts(cfg.visible_prompts);
        }
        Ok(())
    }

    pub fn to_config(&self) -> Config {
        let scheduler = self.engine.scheduler();
        Config {
            prompts: scheduler.prompts().to_vec(),
            visible_prompts: self.engine.visible_prompts(),
            sequence_groups: scheduler.sequence_groups().to_vec(),
        }
    }

    pub fn prompts(&self) -> &[Prompt] {
        self.engine.scheduler().prompts()
    }

    pub fn sequence_groups(&self) -> &[SequenceGroup] {
        self.engine.scheduler().sequence_groups()
    }

    pub fn performance(&self) -> &Performance {
        self.engine.scheduler().performance()
    }

    pub fn key_down(&mut self, raw: &str) -> Option<Outcome> {
        self.engine.key_down(raw)
    }

    pub fn key_up(&mut self, raw: &str) -> Option<Outcome> {
        self.engine.key_up(raw)
    }

    pub fn release_all_keys(&mut self) {
        self.engine.release_all();
    }

    /// Add a prompt bound to the canonical form of `raw_keys`, returning that hotkey
    pub fn add_prompt<S: AsRef<str>>(
        &mut self,
        name: &str,
        raw_keys: &[S],
        weight: f64,
    ) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrainerError::EmptyName);
        }
        let hotkey = canonical_hotkey(raw_keys);
        if hotkey.is_empty() {
            return Err(TrainerError::EmptyHotkey(name.to_string()));
        }
        let weight = check_weight(weight)?;

        self.engine.scheduler_mut().add_prompt(Prompt {
            name: name.to_string(),
            hotkey: hotkey.clone(),
            weight,
        })?;
        info!(prompt = name, %hotkey, weight, "added prompt");
        self.engine.refill();
        Ok(hotkey)
    }

    /// Same as [`Trainer::add_prompt`] with the weight given as user text
    pub fn add_prompt_with_weight_text<S: AsRef<str>>(
        &mut self,
        name: &str,
        raw_keys: &[S],
        weight: &str,
    ) -> Result<String> {
        let weight = parse_weight(weight)?;
        self.add_prompt(name, raw_keys, weight)
    }

    pub fn remove_prompt(&mut self, name: &str) -> Result<Prompt> {
        let removed = self
            .engine
            .scheduler_mut()
            .remove_prompt(name)
            .ok_or_else(|| TrainerError::UnknownPrompt(name.to_string()))?;
        self.engine.forget_prompt(name);
        info!(prompt = name, "removed prompt");
        Ok(removed)
    }

    pub fn add_sequence_group(
        &mut self,
        name: &str,
        prompts: Vec<String>,
        weight: f64,
    ) -> Result<()> {
        self.engine.scheduler_mut().add_group(SequenceGroup {
            name: name.to_string(),
            prompts,
            weight,
        })?;
        info!(group = name, "added sequence group");
        self.engine.refill();
        Ok(())
    }

    /// Add every group in `group1: a,b;group2: c`, or none of them
    pub fn add_sequence_groups_from_text(&mut self, text: &str) -> Result<usize> {
        let groups = parse_sequence_groups(text)?;
        let added = groups.len();
        for group in groups {
            self.add_sequence_group(&group.name, group.prompts, group.weight)?;
        }
        Ok(added)
    }

    pub fn remove_sequence_group(&mut self, index: usize) -> Result<SequenceGroup> {
        let removed = self
            .engine
            .scheduler_mut()
            .remove_group(index)
            .ok_or(TrainerError::UnknownSequence(index))?;
        info!(group = %removed.name, "removed sequence group");
        Ok(removed)
    }

    pub fn set_sequence_group_weight(&mut self, index: usize, weight: &str) -> Result<()> {
        let weight = parse_weight(weight)?;
        self.engine.scheduler_mut().set_group_weight(index, weight)
    }

    pub fn visible_prompts(&self) -> usize {
        self.engine.visible_prompts()
    }

    /// Change how many prompts are on screen. Values outside 1..=10 are ignored.
    pub fn set_visible_prompts(&mut self, visible_prompts: usize) -> bool {
        if !VISIBLE_PROMPTS_RANGE.contains(&visible_prompts) {
            return false;
        }
        self.engine.set_visible_prompts(visible_prompts);
        true
    }

    pub fn show_hotkeys(&self) -> bool {
        self.show_hotkeys
    }

    pub fn toggle_show_hotkeys(&mut self) -> bool {
        self.show_hotkeys = !self.show_hotkeys;
        self.show_hotkeys
    }

    pub fn wrong_attempt(&self) -> bool {
        self.engine.input().wrong_attempt
    }

    pub fn last_pressed(&self) -> &str {
        &self.engine.input().last_pressed
    }

    /// Queue entries from newest (top) to active (bottom)
    pub fn view(&self) -> Vec<DisplayEntry> {
        let queue = self.engine.queue();
        let last = queue.len().saturating_sub(1);
        queue
            .iter()
            .enumerate()
            .map(|(i, prompt)| {
                let active = i == last;
                DisplayEntry {
                    name: prompt.name.clone(),
                    hotkey: self.show_hotkeys.then(|| prompt.hotkey.clone()),
                    active,
                    wrong: active && self.wrong_attempt(),
                }
            })
            .collect()
    }
}

fn scheduler(seed: Option<u64>) -> WeightedScheduler {
    match seed {
        Some(seed) => WeightedScheduler::with_seed(seed),
        None => WeightedScheduler::new(),
    }
}

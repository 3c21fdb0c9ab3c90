use crate::config::{check_weight, Prompt, SequenceGroup};
use crate::error::{Result, TrainerError};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Dynamic weight multiplier applied on every miss
pub const MISS_PENALTY: f64 = 1.2;
/// Dynamic weight multiplier applied on a correct answer past the streak threshold
pub const STREAK_DECAY: f64 = 0.8;
/// Correct answers in a row needed before the dynamic weight starts to decay
pub const STREAK_THRESHOLD: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Record {
    weight: f64,
    streak: u32,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            weight: 1.0,
            streak: 0,
        }
    }
}

/// Dynamic weights and correct-answer streaks keyed by prompt name.
///
/// Names without a record read as weight `1.0` and streak `0`. Weights are
/// neither floored nor capped.
#[derive(Debug, Default, Clone)]
pub struct Performance {
    records: HashMap<String, Record>,
}

impl Performance {
    pub fn weight(&self, name: &str) -> f64 {
        self.records.get(name).copied().unwrap_or_default().weight
    }

    pub fn streak(&self, name: &str) -> u32 {
        self.records.get(name).copied().unwrap_or_default().streak
    }

    pub fn record_correct(&mut self, name: &str) {
        let record = self.records.entry(name.to_string()).or_default();
        record.streak += 1;
        if record.streak > STREAK_THRESHOLD {
            record.weight *= STREAK_DECAY;
        }
    }

    pub fn record_miss(&mut self, name: &str) {
        let record = self.records.entry(name.to_string()).or_default();
        record.weight *= MISS_PENALTY;
        record.streak = 0;
    }

    pub fn forget(&mut self, name: &str) {
        self.records.remove(name);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// One alternative of the top-level weighted draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    Prompt(usize),
    Group(usize),
}

/// A sequence group mid-playback; `cursor` counts the names already emitted
#[derive(Debug, Clone)]
struct ActiveSequence {
    names: Vec<String>,
    cursor: usize,
}

impl ActiveSequence {
    fn remaining(&self) -> &[String] {
        &self.names[self.cursor.min(self.names.len())..]
    }

    fn take(&mut self, count: usize) -> Vec<String> {
        let taken: Vec<String> = self.remaining().iter().take(count).cloned().collect();
        self.cursor += taken.len();
        taken
    }
}

/// Decides which prompts are shown next.
///
/// Standalone prompts compete with whole sequence groups in a single weighted
/// draw. Once a group wins, its prompts are handed out in order until fewer
/// remain than a batch asks for; that short tail is dropped.
#[derive(Debug, Clone)]
pub struct WeightedScheduler {
    prompts: Vec<Prompt>,
    groups: Vec<SequenceGroup>,
    performance: Performance,
    sequence: Option<ActiveSequence>,
    rng: StdRng,
}

impl Default for WeightedScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightedScheduler {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Scheduler whose draws are reproducible for a given seed
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            prompts: Vec::new(),
            groups: Vec::new(),
            performance: Performance::default(),
            sequence: None,
            rng,
        }
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn prompt(&self, name: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.name == name)
    }

    pub fn sequence_groups(&self) -> &[SequenceGroup] {
        &self.groups
    }

    pub fn performance(&self) -> &Performance {
        &self.performance
    }

    pub fn performance_mut(&mut self) -> &mut Performance {
        &mut self.performance
    }

    /// Names of the active sequence group that have not been handed out yet
    pub fn current_sequence(&self) -> Option<&[String]> {
        self.sequence.as_ref().map(ActiveSequence::remaining)
    }

    /// Swap in a new prompt set, dropping all dynamic state
    pub fn replace(&mut self, prompts: Vec<Prompt>, groups: Vec<SequenceGroup>) {
        self.prompts = prompts;
        self.groups = groups;
        self.performance.clear();
        self.sequence = None;
    }

    pub fn add_prompt(&mut self, prompt: Prompt) -> Result<()> {
        if self.prompt(&prompt.name).is_some() {
            return Err(TrainerError::DuplicatePrompt(prompt.name));
        }
        check_weight(prompt.weight)?;
        self.prompts.push(prompt);
        Ok(())
    }

    /// Remove a prompt together with its dynamic weight and streak
    pub fn remove_prompt(&mut self, name: &str) -> Option<Prompt> {
        let index = self.prompts.iter().position(|p| p.name == name)?;
        self.performance.forget(name);
        Some(self.prompts.remove(index))
    }

    pub fn add_group(&mut self, group: SequenceGroup) -> Result<()> {
        if group.prompts.is_empty() {
            return Err(TrainerError::EmptySequence(group.name));
        }
        check_weight(group.weight)?;
        for missing in group.prompts.iter().filter(|n| self.prompt(n).is_none()) {
            warn!(group = %group.name, prompt = %missing, "sequence group lists an unknown prompt");
        }
        self.groups.push(group);
        Ok(())
    }

    pub fn remove_group(&mut self, index: usize) -> Option<SequenceGroup> {
        (index < self.groups.len()).then(|| self.groups.remove(index))
    }

    pub fn set_group_weight(&mut self, index: usize, weight: f64) -> Result<()> {
        let weight = check_weight(weight)?;
        let group = self
            .groups
            .get_mut(index)
            .ok_or(TrainerError::UnknownSequence(index))?;
        group.weight = weight;
        Ok(())
    }

    /// Selection weight of a standalone prompt: dynamic multiplier times base weight.
    /// May be infinite once the multiplier has overflowed.
    pub fn effective_weight(&self, prompt: &Prompt) -> f64 {
        if prompt.weight == 0.0 {
            return 0.0;
        }
        self.performance.weight(&prompt.name) * prompt.weight
    }

    /// Pick up to `count` prompts to show next.
    ///
    /// Returns an empty batch when nothing can be drawn (no prompts or groups,
    /// or every weight is zero).
    pub fn next_batch(&mut self, count: usize) -> Vec<Prompt> {
        if count == 0 {
            return Vec::new();
        }

        if let Some(sequence) = self.sequence.as_mut() {
            if sequence.remaining().len() >= count {
                let names = sequence.take(count);
                return self.resolve(&names);
            }
            debug!(
                dropped = sequence.remaining().len(),
                "sequence tail shorter than batch, returning to weighted selection"
            );
            self.sequence = None;
        }

        let mut candidates = Vec::with_capacity(self.prompts.len() + self.groups.len());
        let mut weights = Vec::with_capacity(candidates.capacity());
        for (i, prompt) in self.prompts.iter().enumerate() {
            candidates.push(Candidate::Prompt(i));
            weights.push(self.effective_weight(prompt));
        }
        for (i, group) in self.groups.iter().enumerate() {
            let playable = group.prompts.iter().any(|n| self.prompt(n).is_some());
            candidates.push(Candidate::Group(i));
            weights.push(if playable { group.weight } else { 0.0 });
        }

        let picked = match WeightedIndex::new(drawable(weights)) {
            Ok(dist) => candidates[dist.sample(&mut self.rng)],
            Err(err) => {
                warn!(%err, "nothing to schedule");
                return Vec::new();
            }
        };

        match picked {
            Candidate::Prompt(i) => {
                let mut batch = vec![self.prompts[i].clone()];
                batch.extend(self.draw_prompts(count - 1));
                batch
            }
            Candidate::Group(i) => {
                let group = &self.groups[i];
                debug!(group = %group.name, "starting sequence group");
                let mut sequence = ActiveSequence {
                    names: group.prompts.clone(),
                    cursor: 0,
                };
                let names = sequence.take(count);
                self.sequence = Some(sequence);
                self.resolve(&names)
            }
        }
    }

    /// Independent weighted draws over the standalone prompts, with replacement
    fn draw_prompts(&mut self, count: usize) -> Vec<Prompt> {
        if count == 0 || self.prompts.is_empty() {
            return Vec::new();
        }
        let weights: Vec<f64> = self
            .prompts
            .iter()
            .map(|p| self.effective_weight(p))
            .collect();
        match WeightedIndex::new(drawable(weights)) {
            Ok(dist) => (0..count)
                .map(|_| self.prompts[dist.sample(&mut self.rng)].clone())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn resolve(&self, names: &[String]) -> Vec<Prompt> {
        names
            .iter()
            .filter_map(|name| {
                let prompt = self.prompt(name).cloned();
                if prompt.is_none() {
                    warn!(prompt = %name, "skipping unknown prompt in sequence");
                }
                prompt
            })
            .collect()
    }
}

/// `WeightedIndex` needs a finite total. When the weights overflow it, each
/// one is scaled by the largest; infinite weights count as 1 and every finite
/// weight next to them as 0.
fn drawable(weights: Vec<f64>) -> Vec<f64> {
    if weights.iter().sum::<f64>().is_finite() {
        return weights;
    }
    let largest = weights.iter().copied().fold(0.0, f64::max);
    weights
        .into_iter()
        .map(|w| if w.is_infinite() { 1.0 } else { w / largest })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(name: &str, hotkey: &str, weight: f64) -> Prompt {
        Prompt {
            name: name.to_string(),
            hotkey: hotkey.to_string(),
            weight,
        }
    }

    fn group(name: &str, prompts: &[&str], weight: f64) -> SequenceGroup {
        SequenceGroup {
            name: name.to_string(),
            prompts: prompts.iter().map(|p| p.to_string()).collect(),
            weight,
        }
    }

    fn names(batch: &[Prompt]) -> Vec<&str> {
        batch.iter().map(|p| p.name.as_str()).collect()
    }

    /// Prompts a, b, c with zero weight so only the group can win a draw
    fn group_only_scheduler() -> WeightedScheduler {
        let mut scheduler = WeightedScheduler::with_seed(7);
        for name in ["a", "b", "c"] {
            scheduler.add_prompt(prompt(name, name, 0.0)).unwrap();
        }
        scheduler.add_group(group("G", &["a", "b", "c"], 1.0)).unwrap();
        scheduler
    }

    #[test]
    fn test_performance_defaults() {
        let perf = Performance::default();
        assert_eq!(perf.weight("anything"), 1.0);
        assert_eq!(perf.streak("anything"), 0);
    }

    #[test]
    fn test_three_misses_compound_the_penalty() {
        let mut perf = Performance::default();
        for _ in 0..3 {
            perf.record_miss("A");
        }
        assert_eq!(perf.streak("A"), 0);
        assert!((perf.weight("A") - 1.2_f64.powi(3)).abs() < 1e-12);
    }

    #[test]
    fn test_decay_starts_after_streak_threshold_and_streak_keeps_counting() {
        let mut perf = Performance::default();
        perf.record_correct("A");
        perf.record_correct("A");
        assert_eq!(perf.weight("A"), 1.0);

        perf.record_correct("A");
        assert!((perf.weight("A") - 0.8).abs() < 1e-12);
        perf.record_correct("A");
        assert!((perf.weight("A") - 0.64).abs() < 1e-12);
        assert_eq!(perf.streak("A"), 4);

        perf.record_miss("A");
        assert_eq!(perf.streak("A"), 0);
        assert!((perf.weight("A") - 0.64 * 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_empty_scheduler_yields_empty_batch() {
        let mut scheduler = WeightedScheduler::with_seed(1);
        assert!(scheduler.next_batch(3).is_empty());
    }

    #[test]
    fn test_zero_total_weight_yields_empty_batch() {
        let mut scheduler = WeightedScheduler::with_seed(1);
        scheduler.add_prompt(prompt("a", "a", 0.0)).unwrap();
        scheduler.add_group(group("g", &["a"], 0.0)).unwrap();
        assert!(scheduler.next_batch(2).is_empty());
    }

    #[test]
    fn test_zero_count_yields_empty_batch() {
        let mut scheduler = WeightedScheduler::with_seed(1);
        scheduler.add_prompt(prompt("a", "a", 1.0)).unwrap();
        assert!(scheduler.next_batch(0).is_empty());
    }

    #[test]
    fn test_standalone_batch_fills_requested_count() {
        let mut scheduler = WeightedScheduler::with_seed(3);
        scheduler.add_prompt(prompt("only", "q", 1.0)).unwrap();
        let batch = scheduler.next_batch(4);
        assert_eq!(names(&batch), vec!["only"; 4]);
    }

    #[test]
    fn test_zero_weight_prompt_is_never_drawn() {
        let mut scheduler = WeightedScheduler::with_seed(11);
        scheduler.add_prompt(prompt("never", "n", 0.0)).unwrap();
        scheduler.add_prompt(prompt("always", "a", 1.0)).unwrap();
        for _ in 0..200 {
            assert!(scheduler.next_batch(3).iter().all(|p| p.name == "always"));
        }
    }

    #[test]
    fn test_heavier_prompts_are_drawn_more_often() {
        let mut scheduler = WeightedScheduler::with_seed(42);
        scheduler.add_prompt(prompt("heavy", "h", 9.0)).unwrap();
        scheduler.add_prompt(prompt("light", "l", 1.0)).unwrap();

        let heavy = (0..1000)
            .flat_map(|_| scheduler.next_batch(1))
            .filter(|p| p.name == "heavy")
            .count();
        assert!(heavy > 800, "heavy drawn {heavy} times out of 1000");
    }

    #[test]
    fn test_dynamic_weight_shifts_selection() {
        let mut scheduler = WeightedScheduler::with_seed(5);
        scheduler.add_prompt(prompt("missed", "m", 1.0)).unwrap();
        scheduler.add_prompt(prompt("known", "k", 1.0)).unwrap();
        for _ in 0..20 {
            scheduler.performance_mut().record_miss("missed");
        }
        let missed = (0..500)
            .flat_map(|_| scheduler.next_batch(1))
            .filter(|p| p.name == "missed")
            .count();
        assert!(missed > 450, "missed drawn {missed} times out of 500");
    }

    #[test]
    fn test_overflowing_total_weight_still_draws() {
        let mut scheduler = WeightedScheduler::with_seed(8);
        scheduler.add_prompt(prompt("a", "a", 1e308)).unwrap();
        scheduler.add_prompt(prompt("b", "b", 1e308)).unwrap();
        scheduler.add_group(group("g", &["a", "b"], 1.0)).unwrap();
        for _ in 0..50 {
            assert!(!scheduler.next_batch(2).is_empty());
        }
    }

    #[test]
    fn test_infinite_dynamic_weight_dominates_selection() {
        let mut scheduler = WeightedScheduler::with_seed(8);
        scheduler.add_prompt(prompt("hot", "h", 1e308)).unwrap();
        scheduler.add_prompt(prompt("cold", "c", 1.0)).unwrap();
        for _ in 0..4 {
            scheduler.performance_mut().record_miss("hot");
        }
        assert!(scheduler
            .effective_weight(&scheduler.prompts()[0])
            .is_infinite());

        for _ in 0..50 {
            assert!(scheduler.next_batch(3).iter().all(|p| p.name == "hot"));
        }
    }

    #[test]
    fn test_drawable_rescales_only_on_overflow() {
        assert_eq!(drawable(vec![1.0, 2.0]), vec![1.0, 2.0]);
        assert_eq!(drawable(vec![f64::MAX, f64::MAX, 0.0]), vec![1.0, 1.0, 0.0]);
        assert_eq!(drawable(vec![f64::INFINITY, 5.0]), vec![1.0, 0.0]);
    }

    #[test]
    fn test_same_seed_reproduces_draws() {
        let build = || {
            let mut scheduler = WeightedScheduler::with_seed(99);
            for (name, weight) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
                scheduler.add_prompt(prompt(name, name, weight)).unwrap();
            }
            scheduler.add_group(group("g", &["c", "a"], 1.5)).unwrap();
            scheduler
        };
        let (mut first, mut second) = (build(), build());
        for _ in 0..50 {
            assert_eq!(first.next_batch(3), second.next_batch(3));
        }
    }

    #[test]
    fn test_sequence_plays_in_order_without_redraw() {
        let mut scheduler = group_only_scheduler();
        assert_eq!(names(&scheduler.next_batch(2)), vec!["a", "b"]);
        assert_eq!(scheduler.current_sequence().unwrap(), ["c".to_string()]);
        assert_eq!(names(&scheduler.next_batch(1)), vec!["c"]);
        assert_eq!(scheduler.current_sequence().unwrap().len(), 0);

        // exhausted: the next request draws again and restarts the group
        assert_eq!(names(&scheduler.next_batch(1)), vec!["a"]);
    }

    #[test]
    fn test_short_sequence_tail_is_dropped() {
        let mut scheduler = group_only_scheduler();
        assert_eq!(names(&scheduler.next_batch(2)), vec!["a", "b"]);

        // only "c" remains but two are requested: the tail is abandoned
        let batch = scheduler.next_batch(2);
        assert_eq!(names(&batch), vec!["a", "b"]);
        assert_eq!(scheduler.current_sequence().unwrap(), ["c".to_string()]);
    }

    #[test]
    fn test_group_shorter_than_batch() {
        let mut scheduler = group_only_scheduler();
        scheduler.remove_group(0).unwrap();
        scheduler.add_group(group("pair", &["b", "a"], 1.0)).unwrap();
        assert_eq!(names(&scheduler.next_batch(5)), vec!["b", "a"]);
    }

    #[test]
    fn test_unknown_sequence_members_are_skipped() {
        let mut scheduler = WeightedScheduler::with_seed(2);
        scheduler.add_prompt(prompt("a", "a", 0.0)).unwrap();
        scheduler.add_group(group("g", &["ghost", "a"], 1.0)).unwrap();
        assert_eq!(names(&scheduler.next_batch(2)), vec!["a"]);
    }

    #[test]
    fn test_group_without_known_prompts_is_not_drawn() {
        let mut scheduler = WeightedScheduler::with_seed(2);
        scheduler.add_group(group("g", &["ghost"], 1.0)).unwrap();
        assert!(scheduler.next_batch(2).is_empty());
        assert!(scheduler.current_sequence().is_none());
    }

    #[test]
    fn test_duplicate_and_invalid_prompts_are_rejected() {
        let mut scheduler = WeightedScheduler::with_seed(1);
        scheduler.add_prompt(prompt("a", "a", 1.0)).unwrap();
        assert!(matches!(
            scheduler.add_prompt(prompt("a", "b", 1.0)),
            Err(TrainerError::DuplicatePrompt(_))
        ));
        assert!(matches!(
            scheduler.add_prompt(prompt("b", "b", f64::NAN)),
            Err(TrainerError::InvalidWeight(_))
        ));
        assert!(matches!(
            scheduler.add_group(group("g", &[], 1.0)),
            Err(TrainerError::EmptySequence(_))
        ));
        assert_eq!(scheduler.prompts().len(), 1);
        assert!(scheduler.sequence_groups().is_empty());
    }

    #[test]
    fn test_remove_prompt_drops_dynamic_state() {
        let mut scheduler = WeightedScheduler::with_seed(1);
        scheduler.add_prompt(prompt("a", "a", 1.0)).unwrap();
        scheduler.performance_mut().record_miss("a");
        assert!(scheduler.remove_prompt("a").is_some());
        assert_eq!(scheduler.performance().weight("a"), 1.0);
        assert!(scheduler.remove_prompt("a").is_none());
    }

    #[test]
    fn test_group_weight_edits() {
        let mut scheduler = group_only_scheduler();
        scheduler.set_group_weight(0, 2.5).unwrap();
        assert_eq!(scheduler.sequence_groups()[0].weight, 2.5);
        assert!(matches!(
            scheduler.set_group_weight(3, 1.0),
            Err(TrainerError::UnknownSequence(3))
        ));
        assert!(scheduler.set_group_weight(0, -1.0).is_err());
        assert_eq!(scheduler.sequence_groups()[0].weight, 2.5);
        assert!(scheduler.remove_group(5).is_none());
    }
}

use crate::app_dirs::AppDirs;
use crate::error::{Result, TrainerError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::info;

pub const VISIBLE_PROMPTS_RANGE: RangeInclusive<usize> = 1..=10;
pub const DEFAULT_VISIBLE_PROMPTS: usize = 3;

/// A named drill item bound to a canonical hotkey string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prompt {
    pub name: String,
    pub hotkey: String,
    pub weight: f64,
}

/// Prompts that are always played back in the listed order once selected
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequenceGroup {
    pub name: String,
    pub prompts: Vec<String>,
    #[serde(default = "default_group_weight")]
    pub weight: f64,
}

fn default_group_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub prompts: Vec<Prompt>,
    pub visible_prompts: usize,
    #[serde(default)]
    pub sequence_groups: Vec<SequenceGroup>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompts: Vec::new(),
            visible_prompts: DEFAULT_VISIBLE_PROMPTS,
            sequence_groups: Vec::new(),
        }
    }
}

impl Config {
    /// Reject configurations the trainer cannot run with
    pub fn validate(&self) -> Result<()> {
        if !VISIBLE_PROMPTS_RANGE.contains(&self.visible_prompts) {
            return Err(TrainerError::VisiblePrompts(self.visible_prompts));
        }

        let mut names = HashSet::new();
        for prompt in &self.prompts {
            if !names.insert(prompt.name.as_str()) {
                return Err(TrainerError::DuplicatePrompt(prompt.name.clone()));
            }
            check_weight(prompt.weight)?;
        }

        for group in &self.sequence_groups {
            if group.prompts.is_empty() {
                return Err(TrainerError::EmptySequence(group.name.clone()));
            }
            check_weight(group.weight)?;
        }

        Ok(())
    }
}

pub(crate) fn check_weight(weight: f64) -> Result<f64> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(weight)
    } else {
        Err(TrainerError::InvalidWeight(weight.to_string()))
    }
}

/// Parse a user-entered weight such as `"1.5"`
pub fn parse_weight(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| TrainerError::InvalidWeight(text.to_string()))
        .and_then(|w| check_weight(w).map_err(|_| TrainerError::InvalidWeight(text.to_string())))
}

/// Parse sequence groups written as `group1: prompt1,prompt2;group2: prompt3`.
///
/// Blank segments between `;` are skipped. Any malformed segment fails the
/// whole parse so that no partial set of groups is ever returned.
pub fn parse_sequence_groups(text: &str) -> Result<Vec<SequenceGroup>> {
    let malformed = || TrainerError::SequenceFormat(text.to_string());
    let mut groups = Vec::new();

    for segment in text.split(';') {
        if segment.trim().is_empty() {
            continue;
        }

        let mut parts = segment.split(':');
        let (name, prompts) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(prompts), None) => (name.trim(), prompts),
            _ => return Err(malformed()),
        };

        let prompts: Vec<String> = prompts.split(',').map(|p| p.trim().to_string()).collect();
        if name.is_empty() || prompts.iter().any(|p| p.is_empty()) {
            return Err(malformed());
        }

        groups.push(SequenceGroup {
            name: name.to_string(),
            prompts,
            weight: default_group_weight(),
        });
    }

    if groups.is_empty() {
        return Err(malformed());
    }

    Ok(groups)
}

pub trait ConfigStore {
    fn load(&self) -> Result<Config>;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the file if it exists, otherwise start from an empty configuration
    pub fn load_or_default(&self) -> Result<Config> {
        if self.exists() {
            self.load()
        } else {
            Ok(Config::default())
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<Config> {
        let bytes = fs::read(&self.path)?;
        let cfg: Config = serde_json::from_slice(&bytes)?;
        cfg.validate()?;
        info!(
            path = %self.path.display(),
            prompts = cfg.prompts.len(),
            sequence_groups = cfg.sequence_groups.len(),
            "loaded config"
        );
        Ok(cfg)
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        info!(path = %self.path.display(), "saved config");
        Ok(())
    }
}

pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{
        KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use hotkey_trainer::{
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    keys::{decode, HotkeyCapture, KeyInput, TerminalKeys},
    logging,
    runtime::{CrosstermEventSource, DrillEvent, DrillEventSource, FixedTicker, Runner, Ticker},
    Trainer, TrainerError,
};
use itertools::Itertools;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use tracing::{error, info};
use unicode_width::UnicodeWidthStr;

const TICK_RATE_MS: u64 = 100;
const DEFAULT_WEIGHT_TEXT: &str = "1.0";

/// keyboard shortcut drills that adapt to the hotkeys you miss
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal trainer for keyboard shortcuts. Prompts you miss come back more often, prompts you know well fade into the background, and sequence groups drill whole workflows in order."
)]
pub struct Cli {
    /// configuration file (defaults to the platform config directory)
    #[clap(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// seed the prompt selection for a reproducible drill
    #[clap(long, global = true)]
    seed: Option<u64>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// start a drill session (the default)
    Run {
        /// number of prompts on screen (1-10)
        #[clap(short = 'n', long)]
        visible: Option<usize>,

        /// hide the hotkey next to each prompt
        #[clap(long)]
        hide_hotkeys: bool,
    },
    /// list prompts and sequence groups
    List,
    /// add a prompt, e.g. `add Save ctrl+s`
    Add {
        name: String,
        hotkey: String,
        #[clap(short, long, default_value = "1")]
        weight: String,
    },
    /// remove a prompt by name
    Remove { name: String },
    /// add sequence groups written as `group1: prompt1,prompt2;group2: prompt3`
    AddGroups { text: String },
    /// remove the sequence group at INDEX (as shown by `list`)
    RemoveGroup { index: usize },
    /// change the selection weight of a sequence group
    GroupWeight { index: usize, weight: String },
    /// set how many prompts are on screen (1-10)
    Visible { count: usize },
}

impl Cli {
    fn store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, strum_macros::Display)]
pub enum MenuItem {
    #[strum(to_string = "Toggle hotkeys")]
    ToggleHotkeys,
    #[strum(to_string = "More prompts")]
    MoreVisible,
    #[strum(to_string = "Fewer prompts")]
    FewerVisible,
    #[strum(to_string = "Add prompt")]
    AddPrompt,
    #[strum(to_string = "Save")]
    Save,
    #[strum(to_string = "Reload config")]
    Reload,
    #[strum(to_string = "Quit")]
    Quit,
}

pub const MENU_ITEMS: [MenuItem; 7] = [
    MenuItem::ToggleHotkeys,
    MenuItem::MoreVisible,
    MenuItem::FewerVisible,
    MenuItem::AddPrompt,
    MenuItem::Save,
    MenuItem::Reload,
    MenuItem::Quit,
];

/// What the keyboard is currently talking to. Only `Drill` feeds the trainer;
/// every other mode suppresses drill input.
#[derive(Debug, Clone)]
pub enum Mode {
    Drill,
    Menu { selected: usize },
    AddName { name: String },
    AddHotkey { name: String, capture: HotkeyCapture },
    AddWeight { name: String, hotkey: String, text: String },
}

#[derive(Debug)]
pub struct App {
    pub trainer: Trainer,
    pub store: FileConfigStore,
    pub mode: Mode,
    pub status: Option<String>,
    pub should_quit: bool,
    keys: TerminalKeys,
    reports_release: bool,
}

impl App {
    pub fn new(trainer: Trainer, store: FileConfigStore, reports_release: bool) -> Self {
        Self {
            trainer,
            store,
            mode: Mode::Drill,
            status: None,
            should_quit: false,
            keys: TerminalKeys::new(reports_release),
            reports_release,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let mode = std::mem::replace(&mut self.mode, Mode::Drill);
        self.mode = match mode {
            Mode::Drill => self.drill_key(key),
            Mode::Menu { selected } => self.menu_key(selected, key),
            Mode::AddName { name } => self.name_key(name, key),
            Mode::AddHotkey { name, capture } => self.capture_key(name, capture, key),
            Mode::AddWeight { name, hotkey, text } => self.weight_key(name, hotkey, text, key),
        };
    }

    /// Forget held keys on both sides so nothing typed outside the drill leaks in
    fn reset_keys(&mut self) {
        self.keys = TerminalKeys::new(self.reports_release);
        self.trainer.release_all_keys();
    }

    fn drill_key(&mut self, key: KeyEvent) -> Mode {
        if key.code == KeyCode::Esc {
            if key.kind == KeyEventKind::Press {
                self.reset_keys();
                self.status = None;
                return Mode::Menu { selected: 0 };
            }
            return Mode::Drill;
        }

        for input in self.keys.translate(&key) {
            match input {
                KeyInput::Down(raw) => self.trainer.key_down(&raw),
                KeyInput::Up(raw) => self.trainer.key_up(&raw),
            };
        }
        Mode::Drill
    }

    fn menu_key(&mut self, selected: usize, key: KeyEvent) -> Mode {
        if key.kind != KeyEventKind::Press {
            return Mode::Menu { selected };
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => Mode::Menu {
                selected: (selected + MENU_ITEMS.len() - 1) % MENU_ITEMS.len(),
            },
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => Mode::Menu {
                selected: (selected + 1) % MENU_ITEMS.len(),
            },
            KeyCode::Enter => self.activate(selected),
            KeyCode::Esc => {
                self.reset_keys();
                Mode::Drill
            }
            _ => Mode::Menu { selected },
        }
    }

    fn activate(&mut self, selected: usize) -> Mode {
        let stay = Mode::Menu { selected };
        let Some(item) = MENU_ITEMS.get(selected) else {
            return stay;
        };

        match item {
            MenuItem::ToggleHotkeys => {
                self.trainer.toggle_show_hotkeys();
                stay
            }
            MenuItem::MoreVisible => {
                if !self
                    .trainer
                    .set_visible_prompts(self.trainer.visible_prompts() + 1)
                {
                    self.status = Some("already showing the most prompts".to_string());
                }
                stay
            }
            MenuItem::FewerVisible => {
                if !self
                    .trainer
                    .set_visible_prompts(self.trainer.visible_prompts().saturating_sub(1))
                {
                    self.status = Some("at least one prompt stays on screen".to_string());
                }
                stay
            }
            MenuItem::AddPrompt => Mode::AddName {
                name: String::new(),
            },
            MenuItem::Save => {
                self.status = Some(match self.store.save(&self.trainer.to_config()) {
                    Ok(()) => format!("saved to {}", self.store.path().display()),
                    Err(e) => {
                        error!(%e, "saving config failed");
                        format!("save failed: {e}")
                    }
                });
                stay
            }
            MenuItem::Reload => {
                let reloaded = self
                    .store
                    .load_or_default()
                    .and_then(|cfg| self.trainer.apply_config(cfg));
                self.status = Some(match reloaded {
                    Ok(()) => format!("reloaded {}", self.store.path().display()),
                    Err(e) => {
                        error!(%e, "reloading config failed");
                        format!("reload failed: {e}")
                    }
                });
                stay
            }
            MenuItem::Quit => {
                self.should_quit = true;
                Mode::Drill
            }
        }
    }

    fn name_key(&mut self, mut name: String, key: KeyEvent) -> Mode {
        if key.kind != KeyEventKind::Press {
            return Mode::AddName { name };
        }

        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => name.push(c),
            KeyCode::Backspace => {
                name.pop();
            }
            KeyCode::Enter if name.trim().is_empty() => {
                self.status = Some(TrainerError::EmptyName.to_string());
            }
            KeyCode::Enter => {
                self.status = None;
                self.keys = TerminalKeys::new(self.reports_release);
                return Mode::AddHotkey {
                    name: name.trim().to_string(),
                    capture: HotkeyCapture::new(),
                };
            }
            KeyCode::Esc => {
                return Mode::Menu {
                    selected: menu_index(MenuItem::AddPrompt),
                }
            }
            _ => {}
        }
        Mode::AddName { name }
    }

    fn capture_key(&mut self, name: String, mut capture: HotkeyCapture, key: KeyEvent) -> Mode {
        if key.code == KeyCode::Esc && capture.hotkey().is_empty() {
            if key.kind == KeyEventKind::Press {
                self.keys = TerminalKeys::new(self.reports_release);
                return Mode::AddName { name };
            }
            return Mode::AddHotkey { name, capture };
        }

        for input in self.keys.translate(&key) {
            match input {
                KeyInput::Down(raw) => capture.key_down(&raw),
                KeyInput::Up(raw) => capture.key_up(&raw),
            }
        }

        if !capture.is_complete() {
            return Mode::AddHotkey { name, capture };
        }

        self.keys = TerminalKeys::new(self.reports_release);
        Mode::AddWeight {
            name,
            hotkey: capture.hotkey(),
            text: DEFAULT_WEIGHT_TEXT.to_string(),
        }
    }

    fn weight_key(&mut self, name: String, hotkey: String, mut text: String, key: KeyEvent) -> Mode {
        if key.kind != KeyEventKind::Press {
            return Mode::AddWeight { name, hotkey, text };
        }

        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => text.push(c),
            KeyCode::Backspace => {
                text.pop();
            }
            KeyCode::Enter => {
                let tokens: Vec<String> = decode(&hotkey).into_iter().collect();
                match self.trainer.add_prompt_with_weight_text(&name, &tokens, &text) {
                    Ok(hotkey) => {
                        self.status = Some(format!("added '{name}' ({hotkey})"));
                    }
                    Err(e @ TrainerError::InvalidWeight(_)) => {
                        self.status = Some(e.to_string());
                        return Mode::AddWeight { name, hotkey, text };
                    }
                    Err(e) => self.status = Some(e.to_string()),
                }
                self.reset_keys();
                return Mode::Drill;
            }
            KeyCode::Esc => {
                self.status = None;
                return Mode::AddHotkey {
                    name,
                    capture: HotkeyCapture::new(),
                };
            }
            _ => {}
        }
        Mode::AddWeight { name, hotkey, text }
    }
}

fn menu_index(item: MenuItem) -> usize {
    MENU_ITEMS.iter().position(|i| *i == item).unwrap_or(0)
}

/// Human readable listing of prompts and sequence groups
fn describe(trainer: &Trainer) -> String {
    let mut lines = Vec::new();

    let name_width = trainer
        .prompts()
        .iter()
        .map(|p| p.name.width())
        .max()
        .unwrap_or(0);

    lines.push(format!(
        "prompts ({}, {} on screen)",
        trainer.prompts().len(),
        trainer.visible_prompts()
    ));
    for prompt in trainer.prompts() {
        let padding = " ".repeat(name_width - prompt.name.width());
        lines.push(format!(
            "  {}{}  {:<16} weight {}",
            prompt.name, padding, prompt.hotkey, prompt.weight
        ));
    }

    lines.push(format!(
        "sequence groups ({})",
        trainer.sequence_groups().len()
    ));
    for (index, group) in trainer.sequence_groups().iter().enumerate() {
        lines.push(format!(
            "  {index}: {} [{}] weight {}",
            group.name,
            group.prompts.iter().join(", "),
            group.weight
        ));
    }

    lines.join("\n")
}

/// Apply a one-shot editing command and save the result
fn edit_config(cli: &Cli, command: &Command) -> Result<String, Box<dyn Error>> {
    let store = cli.store();
    let mut trainer = Trainer::from_config(store.load_or_default()?, cli.seed)?;

    let message = match command {
        Command::List | Command::Run { .. } => return Ok(describe(&trainer)),
        Command::Add {
            name,
            hotkey,
            weight,
        } => {
            let tokens: Vec<String> = decode(hotkey).into_iter().collect();
            let hotkey = trainer.add_prompt_with_weight_text(name, &tokens, weight)?;
            format!("added '{}' ({hotkey})", name.trim())
        }
        Command::Remove { name } => {
            trainer.remove_prompt(name)?;
            format!("removed '{name}'")
        }
        Command::AddGroups { text } => {
            let added = trainer.add_sequence_groups_from_text(text)?;
            format!("added {added} sequence group(s)")
        }
        Command::RemoveGroup { index } => {
            let group = trainer.remove_sequence_group(*index)?;
            format!("removed sequence group '{}'", group.name)
        }
        Command::GroupWeight { index, weight } => {
            trainer.set_sequence_group_weight(*index, weight)?;
            format!("sequence group {index} weight set to {}", weight.trim())
        }
        Command::Visible { count } => {
            if !trainer.set_visible_prompts(*count) {
                return Err(TrainerError::VisiblePrompts(*count).into());
            }
            format!("showing {count} prompt(s)")
        }
    };

    store.save(&trainer.to_config())?;
    info!(path = %store.path().display(), %message, "config updated");
    Ok(message)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _log_guard = logging::init(&AppDirs::log_dir()).ok();

    let command = cli.command.clone().unwrap_or(Command::Run {
        visible: None,
        hide_hotkeys: false,
    });

    let Command::Run {
        visible,
        hide_hotkeys,
    } = command
    else {
        println!("{}", edit_config(&cli, &command)?);
        return Ok(());
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = cli.store();
    let mut trainer = Trainer::from_config(store.load_or_default()?, cli.seed)?;
    if let Some(visible) = visible {
        if !trainer.set_visible_prompts(visible) {
            let mut cmd = Cli::command();
            cmd.error(
                ErrorKind::InvalidValue,
                TrainerError::VisiblePrompts(visible).to_string(),
            )
            .exit();
        }
    }
    if hide_hotkeys {
        trainer.toggle_show_hotkeys();
    }

    enable_raw_mode()?;
    let reports_release = matches!(supports_keyboard_enhancement(), Ok(true));

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    if reports_release {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                    | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
            )
        )?;
    }
    info!(reports_release, "starting drill");

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(trainer, store, reports_release);
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner);

    if reports_release {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: DrillEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    while !app.should_quit {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let first = runner.step();
        for event in std::iter::once(first).chain(runner.drain()) {
            if let DrillEvent::Key(key) = event {
                app.handle_key(key);
                if app.should_quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

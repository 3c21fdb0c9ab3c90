use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};

use hotkey_trainer::DisplayEntry;

use crate::{App, MenuItem, Mode, MENU_ITEMS};

const HORIZONTAL_MARGIN: u16 = 5;
const POPUP_WIDTH: u16 = 44;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let [header, body, footer] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .horizontal_margin(HORIZONTAL_MARGIN)
        .areas(area);

        let last_pressed = match self.trainer.last_pressed() {
            "" => "-",
            pressed => pressed,
        };
        Paragraph::new(Line::from(vec![
            Span::styled("last pressed  ", dim_style),
            Span::styled(last_pressed, bold_style.fg(Color::Cyan)),
        ]))
        .alignment(Alignment::Center)
        .render(header, buf);

        let entries = self.trainer.view();
        if entries.is_empty() {
            Paragraph::new(Span::styled(
                "nothing to drill yet, press esc and choose 'Add prompt'",
                italic_style.fg(Color::Yellow),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(body, buf);
        } else {
            let lines: Vec<Line> = entries.iter().map(entry_line).collect();
            let [queue_area] = Layout::vertical([Constraint::Length(lines.len() as u16)])
                .flex(Flex::Center)
                .areas(body);
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .render(queue_area, buf);
        }

        let footer_line = match &self.status {
            Some(status) => Line::from(Span::styled(status.as_str(), italic_style)),
            None => Line::from(vec![
                Span::styled("esc", bold_style),
                Span::styled(" menu", dim_style),
            ]),
        };
        Paragraph::new(footer_line)
            .alignment(Alignment::Center)
            .render(footer, buf);

        match &self.mode {
            Mode::Drill => {}
            Mode::Menu { selected } => render_menu(self, *selected, area, buf),
            Mode::AddName { name } => render_dialog(
                " Add prompt ",
                vec![
                    Line::from("name of the new prompt"),
                    Line::from(vec![
                        Span::styled(name.as_str(), bold_style),
                        Span::styled("_", dim_style),
                    ]),
                    Line::from(Span::styled("enter confirm  esc back", dim_style)),
                ],
                area,
                buf,
            ),
            Mode::AddHotkey { name, capture } => {
                let hotkey = match capture.hotkey() {
                    h if h.is_empty() => "...".to_string(),
                    h => h,
                };
                render_dialog(
                    " Add prompt ",
                    vec![
                        Line::from(format!("press the hotkey for '{name}'")),
                        Line::from(Span::styled(hotkey, bold_style.fg(Color::Cyan))),
                        Line::from(Span::styled("release all keys to finish  esc back", dim_style)),
                    ],
                    area,
                    buf,
                );
            }
            Mode::AddWeight { name, hotkey, text } => render_dialog(
                " Add prompt ",
                vec![
                    Line::from(format!("weight for '{name}' ({hotkey})")),
                    Line::from(vec![
                        Span::styled(text.as_str(), bold_style),
                        Span::styled("_", dim_style),
                    ]),
                    Line::from(Span::styled("enter add  esc re-record", dim_style)),
                ],
                area,
                buf,
            ),
        }
    }
}

fn entry_line(entry: &DisplayEntry) -> Line<'static> {
    let hotkey_style = Style::default().fg(Color::Magenta);
    let mut spans = Vec::new();

    if entry.active {
        spans.push(Span::styled(
            "▶ ",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            entry.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    } else {
        spans.push(Span::styled(
            entry.name.clone(),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    if let Some(hotkey) = &entry.hotkey {
        let style = if entry.active {
            hotkey_style
        } else {
            hotkey_style.add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(format!("  {hotkey}"), style));
    }

    if entry.wrong {
        spans.push(Span::styled(
            " ●",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    Line::from(spans)
}

pub fn menu_label(app: &App, item: MenuItem) -> String {
    match item {
        MenuItem::ToggleHotkeys if app.trainer.show_hotkeys() => "Hide hotkeys".to_string(),
        MenuItem::ToggleHotkeys => "Show hotkeys".to_string(),
        MenuItem::MoreVisible | MenuItem::FewerVisible => {
            format!("{item} ({} shown)", app.trainer.visible_prompts())
        }
        _ => item.to_string(),
    }
}

fn render_menu(app: &App, selected: usize, area: Rect, buf: &mut Buffer) {
    let lines: Vec<Line> = MENU_ITEMS
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let label = menu_label(app, *item);
            if i == selected {
                Line::from(Span::styled(
                    format!("> {label}"),
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(format!("  {label}"))
            }
        })
        .collect();
    render_dialog(" Menu ", lines, area, buf);
}

fn render_dialog(title: &str, lines: Vec<Line>, area: Rect, buf: &mut Buffer) {
    let popup = popup_area(area, POPUP_WIDTH, lines.len() as u16 + 2);
    Clear.render(popup, buf);
    Paragraph::new(lines)
        .block(Block::bordered().title(title.to_string()))
        .render(popup, buf);
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [vertical] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(vertical);
    popup
}

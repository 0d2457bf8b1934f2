//! Dashboard screen: the caller's bots and the public catalog.
//!
//! On entry both lists are fetched concurrently; tab switching afterwards is
//! pure local state with no refetch. A failed fetch is logged and degrades to
//! an empty list rather than an error banner.

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::error::Error;
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::api::ApiClient;
use crate::core::bot::Bot;
use crate::core::session::Session;
use crate::ui::bot_card::card_lines;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardTab {
    MyBots,
    PublicBots,
}

/// What the caller chose; the CLI layer routes from here.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardOutcome {
    OpenChat(Bot),
    EditBot(Bot),
    Quit,
}

enum DashboardEvent {
    Loaded {
        my_bots: Vec<Bot>,
        public_bots: Vec<Bot>,
    },
}

pub struct DashboardState {
    tab: DashboardTab,
    my_bots: Vec<Bot>,
    public_bots: Vec<Bot>,
    selected: usize,
    loading: bool,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            tab: DashboardTab::MyBots,
            my_bots: Vec::new(),
            public_bots: Vec::new(),
            selected: 0,
            loading: true,
        }
    }

    pub fn tab(&self) -> DashboardTab {
        self.tab
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn my_bot_count(&self) -> usize {
        self.my_bots.len()
    }

    pub fn public_bot_count(&self) -> usize {
        self.public_bots.len()
    }

    pub fn visible_bots(&self) -> &[Bot] {
        match self.tab {
            DashboardTab::MyBots => &self.my_bots,
            DashboardTab::PublicBots => &self.public_bots,
        }
    }

    pub fn selected_bot(&self) -> Option<&Bot> {
        self.visible_bots().get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn on_loaded(&mut self, my_bots: Vec<Bot>, public_bots: Vec<Bot>) {
        self.my_bots = my_bots;
        self.public_bots = public_bots;
        self.loading = false;
        self.clamp_selection();
    }

    pub fn toggle_tab(&mut self) {
        self.tab = match self.tab {
            DashboardTab::MyBots => DashboardTab::PublicBots,
            DashboardTab::PublicBots => DashboardTab::MyBots,
        };
        self.selected = 0;
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.visible_bots().len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_bots().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn run_dashboard(
    api: &ApiClient,
    session: &Session,
) -> Result<DashboardOutcome, Box<dyn Error>> {
    let mut state = DashboardState::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<DashboardEvent>();

    spawn_load(api, session, tx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = loop {
        terminal.draw(|f| draw_dashboard(f, &state, session, api.base_url()))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        break Ok(DashboardOutcome::Quit);
                    }
                    KeyCode::Char('q') | KeyCode::Esc => break Ok(DashboardOutcome::Quit),
                    KeyCode::Tab | KeyCode::Left | KeyCode::Right => state.toggle_tab(),
                    KeyCode::Up | KeyCode::Char('k') => state.select_previous(),
                    KeyCode::Down | KeyCode::Char('j') => state.select_next(),
                    KeyCode::Enter => {
                        if let Some(bot) = state.selected_bot() {
                            break Ok(DashboardOutcome::OpenChat(bot.clone()));
                        }
                    }
                    KeyCode::Char('e') => {
                        if state.tab() == DashboardTab::MyBots {
                            if let Some(bot) = state.selected_bot() {
                                break Ok(DashboardOutcome::EditBot(bot.clone()));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        while let Ok(event) = rx.try_recv() {
            match event {
                DashboardEvent::Loaded {
                    my_bots,
                    public_bots,
                } => state.on_loaded(my_bots, public_bots),
            }
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn spawn_load(api: &ApiClient, session: &Session, tx: mpsc::UnboundedSender<DashboardEvent>) {
    let api = api.clone();
    let user_id = session.user_id.clone();
    tokio::spawn(async move {
        let (my_bots, public_bots) =
            tokio::join!(api.my_bots(&user_id), api.public_bots());

        let my_bots = my_bots.unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to load own bots");
            Vec::new()
        });
        let public_bots = public_bots.unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to load public bots");
            Vec::new()
        });

        let _ = tx.send(DashboardEvent::Loaded {
            my_bots,
            public_bots,
        });
    });
}

fn draw_dashboard(f: &mut Frame, state: &DashboardState, session: &Session, base_url: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("Welcome back, {}", session.full_name),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Manage your bots and discover new ones",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    f.render_widget(header, chunks[0]);

    f.render_widget(Paragraph::new(tab_line(state)), chunks[1]);

    if state.is_loading() {
        let loading = Paragraph::new("Loading your dashboard...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default());
        f.render_widget(loading, chunks[2]);
    } else if state.visible_bots().is_empty() {
        f.render_widget(empty_state(state.tab()), chunks[2]);
    } else {
        let width = chunks[2].width.saturating_sub(4) as usize;
        let (lines, selected_range) = bot_list_lines(state, base_url, width);
        let offset = scroll_offset(selected_range, chunks[2].height);
        let list = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((offset, 0));
        f.render_widget(list, chunks[2]);
    }

    let footer = Paragraph::new(Span::styled(
        "Tab: switch  ↑/↓: select  Enter: chat  e: edit  q: quit",
        Style::default().fg(Color::DarkGray),
    ));
    f.render_widget(footer, chunks[3]);
}

fn tab_line(state: &DashboardState) -> Line<'static> {
    let active = Style::default()
        .fg(Color::Blue)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let inactive = Style::default().fg(Color::DarkGray);

    let (my_style, public_style) = match state.tab() {
        DashboardTab::MyBots => (active, inactive),
        DashboardTab::PublicBots => (inactive, active),
    };

    Line::from(vec![
        Span::styled(format!("My Bots ({})", state.my_bot_count()), my_style),
        Span::raw("   "),
        Span::styled(
            format!("Public Bots ({})", state.public_bot_count()),
            public_style,
        ),
    ])
}

fn empty_state(tab: DashboardTab) -> Paragraph<'static> {
    let lines = match tab {
        DashboardTab::MyBots => vec![
            Line::from(Span::styled(
                "No bots yet",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from("Create your first bot to get started:"),
            Line::from(Span::styled(
                "  botline create-bot --name \"Luna\" --type Companion ...",
                Style::default().fg(Color::Cyan),
            )),
        ],
        DashboardTab::PublicBots => vec![
            Line::from(Span::styled(
                "No public bots yet",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from("Check back later, or publish one of your own."),
        ],
    };
    Paragraph::new(lines)
}

/// Render every visible card into one flat line list. Returns the line range
/// of the selected card so the scroll offset can keep it in view.
fn bot_list_lines(
    state: &DashboardState,
    base_url: &str,
    width: usize,
) -> (Vec<Line<'static>>, (usize, usize)) {
    let is_owner_tab = state.tab() == DashboardTab::MyBots;
    let mut lines = Vec::new();
    let mut selected_range = (0, 0);

    for (index, bot) in state.visible_bots().iter().enumerate() {
        let start = lines.len();
        let card = card_lines(bot, is_owner_tab, base_url, width);
        let selected = index == state.selected_index();
        for (card_index, line) in card.into_iter().enumerate() {
            let marker = if selected && card_index == 0 {
                Span::styled("▶ ", Style::default().fg(Color::Blue))
            } else {
                Span::raw("  ")
            };
            let mut spans = vec![marker];
            spans.extend(line.spans);
            lines.push(Line::from(spans));
        }
        lines.push(Line::from(""));
        if selected {
            selected_range = (start, lines.len());
        }
    }

    (lines, selected_range)
}

fn scroll_offset(selected_range: (usize, usize), height: u16) -> u16 {
    let height = height as usize;
    let (start, end) = selected_range;
    if height == 0 || end <= height {
        return 0;
    }
    // Scroll just enough to bring the selected card's bottom into view.
    (end - height).min(start) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bot::Privacy;

    fn bot(id: &str, owner: &str) -> Bot {
        Bot {
            bot_id: id.to_string(),
            user_id: Some(owner.to_string()),
            name: format!("bot-{id}"),
            avatar: None,
            type_of_bot: "Companion".to_string(),
            privacy: Privacy::Public,
            bio: String::new(),
            first_message: None,
            situation: String::new(),
            back_story: String::new(),
            personality: String::new(),
            chatting_way: String::new(),
        }
    }

    #[test]
    fn tab_counts_match_fetched_lists() {
        let mut state = DashboardState::new();
        state.on_loaded(vec![bot("a", "u1")], vec![bot("b", "u2"), bot("c", "u3")]);

        assert_eq!(state.my_bot_count(), 1);
        assert_eq!(state.public_bot_count(), 2);
        assert!(!state.is_loading());
    }

    #[test]
    fn tab_switch_is_local_and_resets_selection() {
        let mut state = DashboardState::new();
        state.on_loaded(
            vec![bot("a", "u1"), bot("b", "u1")],
            vec![bot("c", "u2")],
        );
        state.select_next();
        assert_eq!(state.selected_index(), 1);

        state.toggle_tab();
        assert_eq!(state.tab(), DashboardTab::PublicBots);
        assert_eq!(state.selected_index(), 0);
        assert_eq!(state.visible_bots().len(), 1);

        state.toggle_tab();
        assert_eq!(state.tab(), DashboardTab::MyBots);
    }

    #[test]
    fn selection_clamps_to_list_bounds() {
        let mut state = DashboardState::new();
        state.on_loaded(vec![bot("a", "u1")], Vec::new());

        state.select_next();
        assert_eq!(state.selected_index(), 0);
        state.select_previous();
        assert_eq!(state.selected_index(), 0);
    }

    #[test]
    fn failed_fetch_degrades_to_empty_lists() {
        // The load task substitutes empty vecs on failure; the state layer
        // treats that exactly like a valid empty response.
        let mut state = DashboardState::new();
        state.on_loaded(Vec::new(), Vec::new());

        assert!(!state.is_loading());
        assert!(state.visible_bots().is_empty());
        assert!(state.selected_bot().is_none());
    }

    #[test]
    fn selected_card_scrolls_into_view() {
        assert_eq!(scroll_offset((0, 4), 10), 0);
        assert_eq!(scroll_offset((12, 18), 10), 8);
        // Never scroll the selected card's top above the viewport.
        assert_eq!(scroll_offset((2, 30), 10), 2);
    }
}

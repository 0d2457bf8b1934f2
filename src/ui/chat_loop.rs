//! Chat screen: transcript, input, and history management for one bot.
//!
//! The screen loads the bot profile and prior history concurrently under a
//! cancellation token, keyed by a load generation so completions that land
//! after the screen was torn down or re-keyed are dropped instead of mutating
//! state. Sends are gated by a busy flag, so exchanges only ever append at
//! the transcript tail and reconcile in place.

use ratatui::crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseEventKind,
};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::error::Error;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tui_textarea::TextArea;

use crate::api::{ApiClient, ApiError, AskResponse, HistoryFetch};
use crate::core::bot::Bot;
use crate::core::session::Session;
use crate::core::transcript::{Reply, Transcript, MISSING_REPLY, SEND_ERROR_REPLY};

/// Where the caller goes after this screen exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    Back,
    Quit,
}

/// Restart and delete share the deletion endpoint; only the prompt differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    Restart,
    Delete,
}

impl ConfirmAction {
    fn prompt(self) -> &'static str {
        match self {
            ConfirmAction::Restart => {
                "Restart this chat? This will delete all messages. (y/n)"
            }
            ConfirmAction::Delete => "Delete this chat history? (y/n)",
        }
    }
}

enum ChatEvent {
    Loaded {
        generation: u64,
        bot: Result<Bot, ApiError>,
        history: Result<HistoryFetch, ApiError>,
    },
    Reply {
        entry_id: u64,
        result: Result<AskResponse, ApiError>,
    },
    HistoryCleared {
        result: Result<(), ApiError>,
    },
}

pub struct ChatState {
    bot: Option<Bot>,
    transcript: Transcript,
    loading: bool,
    sending: bool,
    generation: u64,
    confirm: Option<ConfirmAction>,
    scroll_offset: u16,
    auto_scroll: bool,
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            bot: None,
            transcript: Transcript::new(),
            loading: true,
            sending: false,
            generation: 1,
            confirm: None,
            scroll_offset: 0,
            auto_scroll: true,
        }
    }

    pub fn bot(&self) -> Option<&Bot> {
        self.bot.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn confirm(&self) -> Option<ConfirmAction> {
        self.confirm
    }

    /// Apply a completed profile/history load. Results from a superseded
    /// generation are dropped wholesale, as are cancellations; neither may
    /// touch state after teardown.
    pub fn handle_loaded(
        &mut self,
        generation: u64,
        bot: Result<Bot, ApiError>,
        history: Result<HistoryFetch, ApiError>,
    ) {
        if generation != self.generation {
            return;
        }

        match bot {
            Ok(bot) => self.bot = Some(bot),
            Err(err) if err.is_cancelled() => return,
            Err(err) => {
                tracing::error!(error = %err, "failed to load bot profile");
                self.loading = false;
                return;
            }
        }

        let greeting = self
            .bot
            .as_ref()
            .map(|bot| bot.greeting().to_string())
            .unwrap_or_default();

        match history {
            Ok(HistoryFetch::Loaded(records)) => {
                self.transcript.load(records, &greeting);
            }
            Ok(HistoryFetch::Failed(reason)) => {
                // Degrade to the greeting; the page still becomes ready.
                tracing::warn!(reason = %reason, "history fetch failed, showing greeting");
                self.transcript.greet(&greeting);
            }
            Err(err) if err.is_cancelled() => return,
            Err(err) => {
                tracing::warn!(error = %err, "history fetch failed, showing greeting");
                self.transcript.greet(&greeting);
            }
        }

        self.loading = false;
    }

    /// Whether a send may start: non-empty input, nothing in flight, and the
    /// bot profile present.
    pub fn can_send(&self, input: &str) -> bool {
        !input.trim().is_empty() && !self.sending && !self.loading && self.bot.is_some()
    }

    /// Append the pending exchange and flip the busy flag. Returns the local
    /// id the reply reconciles against.
    pub fn begin_send(&mut self, message: String) -> u64 {
        self.sending = true;
        self.auto_scroll = true;
        self.transcript.begin_send(message)
    }

    pub fn handle_reply(&mut self, entry_id: u64, result: Result<AskResponse, ApiError>) {
        self.sending = false;
        match result {
            Ok(response) => {
                if let Some(error) = response.error.as_deref() {
                    tracing::warn!(error = %error, "backend reported a chat error");
                }
                let text = response
                    .response
                    .unwrap_or_else(|| MISSING_REPLY.to_string());
                self.transcript.resolve(entry_id, text);
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to send message");
                self.transcript.fail(entry_id, SEND_ERROR_REPLY.to_string());
            }
        }
    }

    /// Re-key the screen for a fresh load. Bumping the generation makes any
    /// still-in-flight load stale, so its completion is dropped.
    pub fn begin_reload(&mut self) {
        self.generation += 1;
        self.loading = true;
        self.sending = false;
        self.confirm = None;
    }

    pub fn request_confirm(&mut self, action: ConfirmAction) {
        if !self.loading {
            self.confirm = Some(action);
        }
    }

    pub fn dismiss_confirm(&mut self) -> Option<ConfirmAction> {
        self.confirm.take()
    }

    /// Apply the history-deletion result: success clears the transcript,
    /// failure leaves it untouched and is logged only.
    pub fn handle_cleared(&mut self, result: Result<(), ApiError>) {
        match result {
            Ok(()) => self.transcript.clear(),
            Err(err) => tracing::error!(error = %err, "failed to delete chat history"),
        }
    }

    fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    fn scroll_down(&mut self, lines: u16, max_offset: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(max_offset);
        if self.scroll_offset >= max_offset {
            self.auto_scroll = true;
        }
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn run_chat(
    api: &ApiClient,
    session: &Session,
    bot_id: &str,
) -> Result<ChatOutcome, Box<dyn Error>> {
    let mut state = ChatState::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<ChatEvent>();
    let mut cancel = CancellationToken::new();
    let started = Instant::now();

    spawn_load(api, session, bot_id, state.generation(), &cancel, tx.clone());

    let mut textarea = TextArea::default();
    textarea.set_cursor_line_style(Style::default());
    textarea.set_placeholder_text("Type your message...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = loop {
        terminal.draw(|f| draw_chat(f, &mut state, &textarea, started))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if state.confirm().is_some() {
                        match key.code {
                            // Restart and delete confirm into the same call.
                            KeyCode::Char('y') | KeyCode::Char('Y') => {
                                state.dismiss_confirm();
                                spawn_clear(api, session, bot_id, tx.clone());
                            }
                            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                                state.dismiss_confirm();
                            }
                            _ => {}
                        }
                        continue;
                    }

                    match key.code {
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            break Ok(ChatOutcome::Quit);
                        }
                        KeyCode::Esc => break Ok(ChatOutcome::Back),
                        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            state.request_confirm(ConfirmAction::Restart);
                        }
                        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            state.request_confirm(ConfirmAction::Delete);
                        }
                        KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            // Abandon the old load before re-keying.
                            cancel.cancel();
                            cancel = CancellationToken::new();
                            state.begin_reload();
                            spawn_load(
                                api,
                                session,
                                bot_id,
                                state.generation(),
                                &cancel,
                                tx.clone(),
                            );
                        }
                        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                            textarea.insert_newline();
                        }
                        KeyCode::Enter => {
                            let input = textarea.lines().join("\n");
                            if state.can_send(&input) {
                                let message = input.trim().to_string();
                                textarea = TextArea::default();
                                textarea.set_cursor_line_style(Style::default());
                                textarea.set_placeholder_text("Type your message...");
                                let entry_id = state.begin_send(message.clone());
                                spawn_send(api, session, bot_id, message, entry_id, tx.clone());
                            }
                        }
                        KeyCode::Up => state.scroll_up(1),
                        KeyCode::Down => {
                            let max = max_scroll_offset(&state, &terminal);
                            state.scroll_down(1, max);
                        }
                        KeyCode::PageUp => state.scroll_up(10),
                        KeyCode::PageDown => {
                            let max = max_scroll_offset(&state, &terminal);
                            state.scroll_down(10, max);
                        }
                        _ => {
                            textarea.input(tui_textarea::Input::from(key));
                        }
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => state.scroll_up(3),
                    MouseEventKind::ScrollDown => {
                        let max = max_scroll_offset(&state, &terminal);
                        state.scroll_down(3, max);
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        while let Ok(chat_event) = rx.try_recv() {
            match chat_event {
                ChatEvent::Loaded {
                    generation,
                    bot,
                    history,
                } => state.handle_loaded(generation, bot, history),
                ChatEvent::Reply { entry_id, result } => state.handle_reply(entry_id, result),
                ChatEvent::HistoryCleared { result } => state.handle_cleared(result),
            }
        }
    };

    // Abandon any in-flight load; its completion would be stale anyway.
    cancel.cancel();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

fn spawn_load(
    api: &ApiClient,
    session: &Session,
    bot_id: &str,
    generation: u64,
    cancel: &CancellationToken,
    tx: mpsc::UnboundedSender<ChatEvent>,
) {
    let api = api.clone();
    let user_id = session.user_id.clone();
    let bot_id = bot_id.to_string();
    let cancel = cancel.clone();
    tokio::spawn(async move {
        let (bot, history) = tokio::join!(
            api.bot(&bot_id, &cancel),
            api.history(&user_id, &bot_id, &cancel)
        );
        let _ = tx.send(ChatEvent::Loaded {
            generation,
            bot,
            history,
        });
    });
}

fn spawn_send(
    api: &ApiClient,
    session: &Session,
    bot_id: &str,
    message: String,
    entry_id: u64,
    tx: mpsc::UnboundedSender<ChatEvent>,
) {
    let api = api.clone();
    let user_id = session.user_id.clone();
    let bot_id = bot_id.to_string();
    tokio::spawn(async move {
        let result = api.ask(&user_id, &bot_id, &message).await;
        let _ = tx.send(ChatEvent::Reply { entry_id, result });
    });
}

fn spawn_clear(
    api: &ApiClient,
    session: &Session,
    bot_id: &str,
    tx: mpsc::UnboundedSender<ChatEvent>,
) {
    let api = api.clone();
    let user_id = session.user_id.clone();
    let bot_id = bot_id.to_string();
    tokio::spawn(async move {
        let result = api.restart_history(&user_id, &bot_id).await;
        let _ = tx.send(ChatEvent::HistoryCleared { result });
    });
}

fn max_scroll_offset<B: ratatui::backend::Backend>(
    state: &ChatState,
    terminal: &Terminal<B>,
) -> u16 {
    let size = terminal.size().unwrap_or_default();
    // Header takes 2 rows, the input block 3.
    let available = size.height.saturating_sub(5);
    let total = build_transcript_lines(state, Instant::now(), size.width).len() as u16;
    total.saturating_sub(available)
}

fn draw_chat(f: &mut Frame, state: &mut ChatState, textarea: &TextArea, started: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    f.render_widget(header_paragraph(state), chunks[0]);

    if state.is_loading() {
        let loading = Paragraph::new("Loading chat...")
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(loading, chunks[1]);
    } else {
        // Lines arrive pre-wrapped to the area width, so row counting and
        // the scroll offset agree with what is actually rendered.
        let lines = build_transcript_lines(state, started, chunks[1].width);
        let available = chunks[1].height;
        let total = lines.len() as u16;
        let max_offset = total.saturating_sub(available);
        if state.auto_scroll {
            state.scroll_offset = max_offset;
        } else {
            state.scroll_offset = state.scroll_offset.min(max_offset);
        }

        let transcript = Paragraph::new(lines).scroll((state.scroll_offset, 0));
        f.render_widget(transcript, chunks[1]);
    }

    if let Some(action) = state.confirm() {
        let prompt = Paragraph::new(action.prompt())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title("Confirm"));
        f.render_widget(prompt, chunks[2]);
    } else {
        let title = if state.is_sending() {
            "Waiting for reply..."
        } else {
            "Type your message (Enter: send, Ctrl+R: restart, Ctrl+D: delete, Esc: back)"
        };
        let mut input = textarea.clone();
        input.set_block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(&input, chunks[2]);
    }
}

fn header_paragraph(state: &ChatState) -> Paragraph<'static> {
    let line = match state.bot() {
        Some(bot) => Line::from(vec![
            Span::styled(
                bot.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                bot.type_of_bot.clone(),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        None if state.is_loading() => Line::from(Span::styled(
            "Loading...",
            Style::default().fg(Color::DarkGray),
        )),
        None => Line::from(Span::styled(
            "Bot unavailable",
            Style::default().fg(Color::Red),
        )),
    };
    Paragraph::new(vec![line, Line::from("")])
}

fn build_transcript_lines(state: &ChatState, started: Instant, width: u16) -> Vec<Line<'static>> {
    let width = (width as usize).max(8);
    let bot_name = state
        .bot()
        .map(|bot| bot.name.clone())
        .unwrap_or_else(|| "Bot".to_string());
    let bot_prefix = format!("{bot_name}: ");
    let bot_prefix_style = Style::default()
        .fg(Color::Magenta)
        .add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();

    for entry in state.transcript().entries() {
        if !entry.message.is_empty() {
            push_prefixed_lines(
                &mut lines,
                "You: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
                &entry.message,
                Style::default().fg(Color::Cyan),
                width,
            );
            lines.push(Line::from(""));
        }

        match &entry.reply {
            Reply::Pending => {
                lines.push(pending_line(started));
                lines.push(Line::from(""));
            }
            Reply::Received(text) => {
                push_prefixed_lines(
                    &mut lines,
                    &bot_prefix,
                    bot_prefix_style,
                    text,
                    Style::default().fg(Color::White),
                    width,
                );
                lines.push(Line::from(""));
            }
            Reply::Failed(text) => {
                push_prefixed_lines(
                    &mut lines,
                    &bot_prefix,
                    bot_prefix_style,
                    text,
                    Style::default().fg(Color::Red),
                    width,
                );
                lines.push(Line::from(""));
            }
        }
    }

    lines
}

/// Wrap `text` under a leading prefix, indenting continuation rows to the
/// prefix width so the body forms a column.
fn push_prefixed_lines(
    lines: &mut Vec<Line<'static>>,
    prefix: &str,
    prefix_style: Style,
    text: &str,
    style: Style,
    width: usize,
) {
    let body_width = width.saturating_sub(prefix.width()).max(1);
    let indent = " ".repeat(prefix.width());

    for (row_index, row) in wrap_text(text, body_width).into_iter().enumerate() {
        if row_index == 0 {
            lines.push(Line::from(vec![
                Span::styled(prefix.to_string(), prefix_style),
                Span::styled(row, style),
            ]));
        } else {
            lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled(row, style),
            ]));
        }
    }
}

/// Word-wrap to a cell budget, hard-breaking words wider than a whole row.
/// Source newlines are preserved as row boundaries.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();

    for source_line in text.split('\n') {
        let mut row = String::new();
        let mut row_width = 0usize;
        for word in source_line.split_whitespace() {
            let word_width = word.width();
            let sep = usize::from(!row.is_empty());
            if row_width + sep + word_width <= width {
                if sep == 1 {
                    row.push(' ');
                }
                row.push_str(word);
                row_width += sep + word_width;
                continue;
            }
            if !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            if word_width <= width {
                row.push_str(word);
                row_width = word_width;
            } else {
                for ch in word.chars() {
                    let ch_width = ch.width().unwrap_or(0);
                    if row_width + ch_width > width {
                        rows.push(std::mem::take(&mut row));
                        row_width = 0;
                    }
                    row.push(ch);
                    row_width += ch_width;
                }
            }
        }
        rows.push(row);
    }

    rows
}

fn pending_line(started: Instant) -> Line<'static> {
    let phase = (started.elapsed().as_millis() / 300) % 3;
    let dots = match phase {
        0 => "●∙∙",
        1 => "∙●∙",
        _ => "∙∙●",
    };
    Line::from(Span::styled(
        dots.to_string(),
        Style::default().fg(Color::DarkGray),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChatRecord;
    use crate::core::bot::Privacy;

    fn sample_bot(first_message: Option<&str>) -> Bot {
        Bot {
            bot_id: "b1".to_string(),
            user_id: Some("u1".to_string()),
            name: "Luna".to_string(),
            avatar: None,
            type_of_bot: "Companion".to_string(),
            privacy: Privacy::Public,
            bio: String::new(),
            first_message: first_message.map(str::to_string),
            situation: String::new(),
            back_story: String::new(),
            personality: String::new(),
            chatting_way: String::new(),
        }
    }

    fn ask_ok(text: &str) -> Result<AskResponse, ApiError> {
        Ok(AskResponse {
            response: Some(text.to_string()),
            error: None,
        })
    }

    #[test]
    fn empty_history_shows_the_configured_opening_line() {
        let mut state = ChatState::new();
        state.handle_loaded(
            state.generation(),
            Ok(sample_bot(Some("Hi there!"))),
            Ok(HistoryFetch::Loaded(Vec::new())),
        );

        assert!(!state.is_loading());
        assert_eq!(state.transcript().len(), 1);
        let entry = &state.transcript().entries()[0];
        assert!(entry.message.is_empty());
        assert_eq!(entry.reply.text(), Some("Hi there!"));
    }

    #[test]
    fn empty_history_without_opening_line_uses_default_greeting() {
        let mut state = ChatState::new();
        state.handle_loaded(
            state.generation(),
            Ok(sample_bot(None)),
            Ok(HistoryFetch::Loaded(Vec::new())),
        );

        let entry = &state.transcript().entries()[0];
        assert_eq!(
            entry.reply.text(),
            Some(crate::core::bot::DEFAULT_GREETING)
        );
    }

    #[test]
    fn failed_history_fetch_degrades_to_greeting() {
        let mut state = ChatState::new();
        state.handle_loaded(
            state.generation(),
            Ok(sample_bot(Some("Hi there!"))),
            Ok(HistoryFetch::Failed("connection refused".to_string())),
        );

        assert!(!state.is_loading());
        assert_eq!(state.transcript().len(), 1);
        assert_eq!(state.transcript().entries()[0].reply.text(), Some("Hi there!"));
    }

    #[test]
    fn stale_generation_results_are_dropped() {
        let mut state = ChatState::new();
        state.handle_loaded(
            state.generation() + 1,
            Ok(sample_bot(Some("Hi there!"))),
            Ok(HistoryFetch::Loaded(Vec::new())),
        );

        assert!(state.is_loading());
        assert!(state.bot().is_none());
        assert!(state.transcript().is_empty());
    }

    #[test]
    fn reload_makes_the_previous_load_stale() {
        let mut state = ChatState::new();
        let old_generation = state.generation();
        state.begin_reload();

        // The superseded load completes late; nothing may change.
        state.handle_loaded(
            old_generation,
            Ok(sample_bot(Some("Hi there!"))),
            Ok(HistoryFetch::Loaded(Vec::new())),
        );
        assert!(state.is_loading());
        assert!(state.bot().is_none());

        state.handle_loaded(
            state.generation(),
            Ok(sample_bot(Some("Hi there!"))),
            Ok(HistoryFetch::Loaded(Vec::new())),
        );
        assert!(!state.is_loading());
        assert_eq!(state.transcript().len(), 1);
    }

    #[test]
    fn cancelled_load_never_mutates_state() {
        let mut state = ChatState::new();
        state.handle_loaded(
            state.generation(),
            Err(ApiError::Cancelled),
            Err(ApiError::Cancelled),
        );

        assert!(state.is_loading());
        assert!(state.transcript().is_empty());
    }

    #[test]
    fn send_appends_pending_then_resolves_to_reply_text() {
        let mut state = ChatState::new();
        state.handle_loaded(
            state.generation(),
            Ok(sample_bot(Some("Hi there!"))),
            Ok(HistoryFetch::Loaded(Vec::new())),
        );

        assert!(state.can_send("hello"));
        let id = state.begin_send("hello".to_string());
        assert!(state.is_sending());
        assert_eq!(state.transcript().len(), 2);
        assert!(state.transcript().entries()[1].reply.is_pending());

        state.handle_reply(id, ask_ok("Hello! How can I help?"));
        assert!(!state.is_sending());
        assert_eq!(
            state.transcript().entries()[1].reply,
            Reply::Received("Hello! How can I help?".to_string())
        );
    }

    #[test]
    fn overlapping_sends_are_blocked_by_the_busy_flag() {
        let mut state = ChatState::new();
        state.handle_loaded(
            state.generation(),
            Ok(sample_bot(None)),
            Ok(HistoryFetch::Loaded(Vec::new())),
        );

        state.begin_send("first".to_string());
        assert!(!state.can_send("second"));
    }

    #[test]
    fn blank_input_cannot_be_sent() {
        let mut state = ChatState::new();
        state.handle_loaded(
            state.generation(),
            Ok(sample_bot(None)),
            Ok(HistoryFetch::Loaded(Vec::new())),
        );

        assert!(!state.can_send(""));
        assert!(!state.can_send("   \n"));
    }

    #[test]
    fn reply_without_response_field_uses_the_apology_fallback() {
        let mut state = ChatState::new();
        state.handle_loaded(
            state.generation(),
            Ok(sample_bot(None)),
            Ok(HistoryFetch::Loaded(Vec::new())),
        );

        let id = state.begin_send("hello".to_string());
        state.handle_reply(
            id,
            Ok(AskResponse {
                response: None,
                error: Some("Bot not found".to_string()),
            }),
        );

        assert_eq!(
            state.transcript().entries()[1].reply,
            Reply::Received(MISSING_REPLY.to_string())
        );
    }

    #[test]
    fn failed_send_surfaces_the_literal_error_reply() {
        let mut state = ChatState::new();
        state.handle_loaded(
            state.generation(),
            Ok(sample_bot(None)),
            Ok(HistoryFetch::Loaded(Vec::new())),
        );

        let id = state.begin_send("hello".to_string());
        state.handle_reply(
            id,
            Err(ApiError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                detail: "boom".to_string(),
            }),
        );

        assert_eq!(
            state.transcript().entries()[1].reply,
            Reply::Failed(SEND_ERROR_REPLY.to_string())
        );
    }

    #[test]
    fn history_deletion_clears_only_on_success() {
        let mut state = ChatState::new();
        state.handle_loaded(
            state.generation(),
            Ok(sample_bot(None)),
            Ok(HistoryFetch::Loaded(vec![ChatRecord {
                message: "hello".to_string(),
                response: "hi".to_string(),
                timestamp: None,
            }])),
        );
        assert_eq!(state.transcript().len(), 1);

        state.handle_cleared(Err(ApiError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            detail: "down".to_string(),
        }));
        assert_eq!(state.transcript().len(), 1);

        state.handle_cleared(Ok(()));
        assert!(state.transcript().is_empty());
    }

    #[test]
    fn confirm_is_requested_and_dismissed() {
        let mut state = ChatState::new();
        state.handle_loaded(
            state.generation(),
            Ok(sample_bot(None)),
            Ok(HistoryFetch::Loaded(Vec::new())),
        );

        state.request_confirm(ConfirmAction::Restart);
        assert_eq!(state.confirm(), Some(ConfirmAction::Restart));
        assert_eq!(state.dismiss_confirm(), Some(ConfirmAction::Restart));
        assert_eq!(state.confirm(), None);
    }

    #[test]
    fn wrap_text_breaks_on_word_boundaries() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn wrap_text_hard_breaks_oversized_words() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn rendered_rows_never_exceed_the_area_width() {
        let mut state = ChatState::new();
        state.handle_loaded(
            state.generation(),
            Ok(sample_bot(None)),
            Ok(HistoryFetch::Loaded(Vec::new())),
        );
        let id = state.begin_send("hi".to_string());
        state.handle_reply(
            id,
            ask_ok("a reply long enough that it has to wrap onto several rows"),
        );

        let width = 24u16;
        let lines = build_transcript_lines(&state, Instant::now(), width);
        for line in &lines {
            let row_width: usize = line.spans.iter().map(|span| span.content.width()).sum();
            assert!(
                row_width <= width as usize,
                "row {:?} is {row_width} cells wide",
                line
            );
        }
        // One row per logical line would be 6; wrapping must add rows, and
        // the scroll range is derived from this same count.
        assert!(lines.len() > 6);
    }

    #[test]
    fn example_scenario_from_first_greeting_to_reply() {
        // u1 opens chat for b1 whose opening line is "Hi there!"; history is
        // empty, then "hello" is sent and answered.
        let mut state = ChatState::new();
        state.handle_loaded(
            state.generation(),
            Ok(sample_bot(Some("Hi there!"))),
            Ok(HistoryFetch::Loaded(Vec::new())),
        );

        assert_eq!(state.transcript().len(), 1);
        assert_eq!(state.transcript().entries()[0].reply.text(), Some("Hi there!"));

        let id = state.begin_send("hello".to_string());
        assert_eq!(state.transcript().len(), 2);
        assert!(state.transcript().entries()[1].reply.is_pending());

        state.handle_reply(id, ask_ok("Hello! How can I help?"));
        assert_eq!(
            state.transcript().entries()[1].reply.text(),
            Some("Hello! How can I help?")
        );
    }
}

//! Terminal lifecycle and the main event loop.
//!
//! A blocking thread polls crossterm events into a channel; the async loop
//! selects between key input and feed updates, mutates the app, and redraws
//! after every event. Raw mode and the alternate screen are restored on the
//! way out even when the loop errors.

use std::error::Error;
use std::io;
use std::time::Duration;

use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use tokio::sync::{mpsc, watch};
use unicode_width::UnicodeWidthStr;

use crate::auth::Identity;
use crate::commands;
use crate::core::app::App;
use crate::core::feed::FeedUpdate;
use crate::core::profile;
use crate::core::session::Mode;
use crate::ui::autocomplete::{self, CompletionMenu};
use crate::ui::boot;
use crate::ui::editor::EditorAction;
use crate::ui::transcript::LineKind;
use crate::utils::input::sanitize_line;

type Backend = CrosstermBackend<io::Stdout>;

fn setup_terminal() -> Result<Terminal<Backend>, Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout)).inspect_err(|_| {
        let _ = disable_raw_mode();
    })?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<Backend>) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Blocking crossterm poller. Ends when the receiver side is dropped.
fn spawn_input_thread(tx: mpsc::UnboundedSender<Event>) {
    std::thread::spawn(move || loop {
        match event::poll(Duration::from_millis(100)) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.send(ev).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!(%err, "terminal read failed");
                    break;
                }
            },
            Ok(false) => {
                if tx.is_closed() {
                    break;
                }
            }
            Err(err) => {
                tracing::error!(%err, "terminal poll failed");
                break;
            }
        }
    });
}

#[derive(Default)]
struct InputState {
    line: String,
    history: Vec<String>,
    history_index: Option<usize>,
    menu: CompletionMenu,
}

impl InputState {
    fn remember(&mut self, line: &str) {
        if self.history.last().map(String::as_str) != Some(line) {
            self.history.push(line.to_string());
        }
        self.history_index = None;
    }

    fn recall_previous(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let index = match self.history_index {
            None => self.history.len() - 1,
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_index = Some(index);
        self.line = self.history[index].clone();
    }

    fn recall_next(&mut self) {
        match self.history_index {
            Some(i) if i + 1 < self.history.len() => {
                self.history_index = Some(i + 1);
                self.line = self.history[i + 1].clone();
            }
            Some(_) => {
                self.history_index = None;
                self.line.clear();
            }
            None => {}
        }
    }
}

pub async fn run(
    mut app: App,
    mut feeds_rx: mpsc::UnboundedReceiver<FeedUpdate>,
) -> Result<(), Box<dyn Error>> {
    let mut terminal = setup_terminal()?;
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    spawn_input_thread(input_tx);

    for line in boot::boot_lines() {
        app.transcript.plain(line);
    }
    for line in boot::welcome_lines(env!("CARGO_PKG_VERSION")) {
        app.transcript.plain(line);
    }

    let mut input = InputState::default();
    let mut session_watch = app.gateway.watch_session();
    let result = event_loop(
        &mut app,
        &mut input,
        &mut terminal,
        &mut input_rx,
        &mut feeds_rx,
        &mut session_watch,
    )
    .await;
    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    app: &mut App,
    input: &mut InputState,
    terminal: &mut Terminal<Backend>,
    input_rx: &mut mpsc::UnboundedReceiver<Event>,
    feeds_rx: &mut mpsc::UnboundedReceiver<FeedUpdate>,
    session_watch: &mut watch::Receiver<Option<Identity>>,
) -> Result<(), Box<dyn Error>> {
    let mut watch_open = true;
    loop {
        terminal.draw(|frame| render(frame, app, input))?;
        if app.should_quit {
            return Ok(());
        }
        tokio::select! {
            maybe_event = input_rx.recv() => {
                let Some(event) = maybe_event else { return Ok(()) };
                if let Event::Key(key) = event {
                    if key.kind == KeyEventKind::Press {
                        handle_key(app, input, key.code, key.modifiers).await;
                    }
                }
            }
            maybe_update = feeds_rx.recv() => {
                let Some(update) = maybe_update else { return Ok(()) };
                let before = app.transcript.len();
                app.handle_feed_update(update);
                ring_on_alert(app, before);
            }
            changed = session_watch.changed(), if watch_open => {
                match changed {
                    Ok(()) => {
                        let identity = session_watch.borrow_and_update().clone();
                        app.apply_session_change(identity);
                    }
                    Err(_) => watch_open = false,
                }
            }
        }
    }
}

/// BEL on a fresh alert line, unless muted.
fn ring_on_alert(app: &App, lines_before: usize) {
    if app.config.muted || app.transcript.len() <= lines_before {
        return;
    }
    if app
        .transcript
        .lines()
        .last()
        .is_some_and(|line| line.kind == LineKind::Alert)
    {
        print!("\x07");
    }
}

async fn handle_key(app: &mut App, input: &mut InputState, code: KeyCode, modifiers: KeyModifiers) {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }
    if app.session.mode == Mode::ProfileEdit {
        handle_editor_key(app, code).await;
        return;
    }

    match code {
        KeyCode::Char(ch) => {
            input.menu.close();
            input.line.push(ch);
        }
        KeyCode::Backspace => {
            input.menu.close();
            input.line.pop();
        }
        KeyCode::Esc => input.menu.close(),
        KeyCode::Tab => handle_tab(app, input),
        KeyCode::Up => {
            if input.menu.is_open() {
                input.menu.previous();
            } else {
                input.recall_previous();
            }
        }
        KeyCode::Down => {
            if input.menu.is_open() {
                input.menu.next();
            } else {
                input.recall_next();
            }
        }
        KeyCode::Enter => {
            if let Some(selection) = input.menu.selected() {
                input.line = autocomplete::commit(&input.line, selection);
                input.menu.close();
                return;
            }
            let line = sanitize_line(&input.line);
            input.line.clear();
            if line.is_empty() {
                return;
            }
            input.remember(&line);
            if app.session.mode.in_conversation() {
                commands::process_conversation_input(app, &line).await;
            } else {
                commands::dispatch(app, &line).await;
            }
        }
        _ => {}
    }
}

fn handle_tab(app: &App, input: &mut InputState) {
    if input.menu.is_open() {
        input.menu.next();
        return;
    }
    let suggestions = autocomplete::suggest(&input.line, app.session.mode, &app.participants);
    match suggestions.len() {
        0 => {}
        1 => input.line = autocomplete::commit(&input.line, &suggestions[0]),
        _ => input.menu.open(suggestions),
    }
}

async fn handle_editor_key(app: &mut App, code: KeyCode) {
    let Some(editor) = app.editor.as_mut() else {
        app.enter_command_mode();
        return;
    };
    match code {
        KeyCode::Up => editor.select_previous(),
        KeyCode::Down => editor.select_next(),
        KeyCode::Char(ch) => editor.push_char(ch),
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Esc => {
            if editor.is_editing() {
                editor.abort_edit();
            } else {
                app.enter_command_mode();
            }
        }
        KeyCode::Enter => match editor.activate() {
            EditorAction::Edited => {}
            EditorAction::Cancel => app.enter_command_mode(),
            EditorAction::Save => save_profile_edits(app).await,
        },
        _ => {}
    }
}

async fn save_profile_edits(app: &mut App) {
    let Some(editor) = app.editor.take() else { return };
    let Some(uid) = app.session.uid().map(str::to_string) else {
        app.enter_command_mode();
        return;
    };
    let result = profile::update_editable(
        &app.store,
        &uid,
        &editor.display_name,
        &editor.bio,
        &editor.avatar_art,
    )
    .await;
    app.enter_command_mode();
    match result {
        Ok(()) => app.transcript.system("PROFILE UPDATED."),
        Err(err) => app.transcript.error(format!("PROFILE SAVE FAILED: {err}")),
    }
}

fn render(frame: &mut Frame, app: &App, input: &InputState) {
    let menu_height = if input.menu.is_open() {
        input.menu.options().len().min(6) as u16
    } else {
        0
    };
    let [transcript_area, menu_area, input_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(menu_height),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    if app.session.mode == Mode::ProfileEdit {
        render_editor(frame, app, transcript_area);
    } else {
        render_transcript(frame, app, transcript_area);
    }

    if input.menu.is_open() {
        let lines: Vec<Line> = input
            .menu
            .options()
            .iter()
            .enumerate()
            .map(|(i, option)| {
                Line::styled(
                    format!(" {option} "),
                    app.theme.menu_style(i == input.menu.selected_index()),
                )
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), menu_area);
    }

    let prompt = app.prompt();
    let prompt_line = Line::from(vec![
        Span::styled(format!("{prompt} "), app.theme.prompt_style()),
        Span::styled(input.line.clone(), app.theme.style_for(LineKind::Plain)),
    ]);
    frame.render_widget(Paragraph::new(prompt_line), input_area);
    let cursor_x = input_area.x + (prompt.width() + 1 + input.line.width()) as u16;
    frame.set_cursor_position((cursor_x.min(input_area.right()), input_area.y));
}

fn render_transcript(frame: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for entry in app.transcript.lines() {
        let style = app.theme.style_for(entry.kind);
        for (i, body) in entry.body.split('\n').enumerate() {
            let mut spans = Vec::new();
            if i == 0 {
                if let Some(prefix) = &entry.prefix {
                    spans.push(Span::styled(format!("[{prefix}]: "), style));
                }
            }
            spans.push(Span::styled(body.to_string(), style));
            if i == 0 && entry.burn {
                spans.push(Span::styled(
                    " [BURN]",
                    app.theme.style_for(LineKind::Alert),
                ));
            }
            lines.push(Line::from(spans));
        }
    }
    // Pin the tail of the transcript to the bottom of the area.
    let visible = area.height as usize;
    let skip = lines.len().saturating_sub(visible);
    frame.render_widget(Paragraph::new(lines.split_off(skip)), area);
}

fn render_editor(frame: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let Some(editor) = &app.editor else { return };
    let mut lines = vec![
        Line::styled("PROFILE EDITOR", app.theme.prompt_style()),
        Line::raw(""),
    ];
    for (i, field) in editor.fields().iter().enumerate() {
        let selected = i == editor.selected_index();
        let marker = if selected { "> " } else { "  " };
        let value = if selected && editor.is_editing() {
            format!("{}_", editor.buffer().unwrap_or_default())
        } else {
            editor.value_of(*field).to_string()
        };
        let text = if field.is_text() {
            format!("{marker}{:<14} {value}", field.label())
        } else {
            format!("{marker}{}", field.label())
        };
        lines.push(Line::styled(text, app.theme.menu_style(selected)));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "Enter edits/commits a field. Esc cancels.",
        app.theme.style_for(LineKind::System),
    ));
    frame.render_widget(Paragraph::new(lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_recall_walks_back_and_forward() {
        let mut input = InputState::default();
        input.remember("first");
        input.remember("second");

        input.recall_previous();
        assert_eq!(input.line, "second");
        input.recall_previous();
        assert_eq!(input.line, "first");
        input.recall_previous();
        assert_eq!(input.line, "first");

        input.recall_next();
        assert_eq!(input.line, "second");
        input.recall_next();
        assert_eq!(input.line, "");
    }

    #[test]
    fn consecutive_duplicate_lines_are_stored_once() {
        let mut input = InputState::default();
        input.remember("help");
        input.remember("help");
        assert_eq!(input.history.len(), 1);
    }
}

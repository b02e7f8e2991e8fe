use crate::{
    command::{Command, masked_input, parse_command},
    presentation::Panel,
    styles,
    view::{self, ViewSnap},
};
use anyhow::Result;
use async_trait::async_trait;
use crossterm::{
    event::{Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use precis_actors::{
    RelayMsg,
    actor::{Actor, Addr, Context},
    keystore::KeyStore,
    relay::RelayActor,
    system::ShutdownHandle,
};
use precis_common::{Credential, RequestKind, protocol::RelayResponse};
use ratatui::{Terminal, backend::CrosstermBackend, style::Style};
use std::{
    io::{self, Stdout},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::oneshot;

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub const KEY_PROMPT: &str = "Please save your Gemini API key to get started.";
pub const KEY_SAVED: &str = "API key saved.";
pub const RELAY_UNREACHABLE: &str = "Communication error with the relay.";
pub const ALREADY_LOADING: &str = "A summary is already in progress.";
const KEY_USAGE: &str = "Usage: /key <your Gemini API key>";

const KEY_SAVED_TTL: Duration = Duration::from_secs(2);
const NOTICE_TTL: Duration = Duration::from_secs(4);

pub enum TuiMsg {
    /// Check for a stored key and prompt for one if absent.
    Startup,
    InputEvent(CtEvent),
    Tick,
    Submit(String),
    Summarize(RequestKind),
    Relayed(RelayResponse),
    OpError(String),
    Shutdown,
}

struct Notice {
    text: String,
    style: Style,
    until: Instant,
}

/// Popup state without the terminal: input line, panel, transient status.
#[derive(Default)]
pub struct PopupState {
    pub panel: Panel,
    pub input: String,
    pub input_cursor: usize,
    pub scroll: usize,
    pub show_help: bool,
    notice: Option<Notice>,
    spin_idx: usize,
}

impl PopupState {
    pub fn new() -> Self {
        Self::default()
    }

    fn cursor_left(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        self.input_cursor -= 1;
        while self.input_cursor > 0 && !self.input.is_char_boundary(self.input_cursor) {
            self.input_cursor -= 1;
        }
    }

    fn cursor_right(&mut self) {
        if self.input_cursor >= self.input.len() {
            return;
        }
        self.input_cursor += 1;
        while self.input_cursor < self.input.len()
            && !self.input.is_char_boundary(self.input_cursor)
        {
            self.input_cursor += 1;
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        self.input.insert(self.input_cursor, ch);
        self.input_cursor += ch.len_utf8();
    }

    pub fn backspace(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        let mut prev = self.input_cursor.saturating_sub(1);
        while prev > 0 && !self.input.is_char_boundary(prev) {
            prev -= 1;
        }
        self.input.drain(prev..self.input_cursor);
        self.input_cursor = prev;
    }

    fn delete(&mut self) {
        if self.input_cursor >= self.input.len() {
            return;
        }
        let start = self.input_cursor;
        let mut end = start + 1;
        while end < self.input.len() && !self.input.is_char_boundary(end) {
            end += 1;
        }
        self.input.drain(start..end);
    }

    /// Take the input line, leaving it empty.
    pub fn take_input(&mut self) -> String {
        self.input_cursor = 0;
        std::mem::take(&mut self.input)
    }

    /// Input as shown on screen, with the caret's display column.
    pub fn displayed_input(&self) -> (String, u16) {
        let shown = masked_input(&self.input);
        let caret = view::visual_caret_col(&masked_input(&self.input[..self.input_cursor]));
        (shown, caret)
    }

    pub fn set_notice(&mut self, text: impl Into<String>, style: Style, ttl: Duration) {
        self.notice = Some(Notice {
            text: text.into(),
            style,
            until: Instant::now() + ttl,
        });
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|n| n.text.as_str())
    }

    /// Drop the notice once its time is up. Returns true if one was dropped.
    pub fn expire_notice(&mut self, now: Instant) -> bool {
        if self.notice.as_ref().is_some_and(|n| now >= n.until) {
            self.notice = None;
            return true;
        }
        false
    }

    /// Enter Loading. Refused while a request is already in flight.
    pub fn begin_request(&mut self) -> bool {
        if self.panel.is_loading() {
            return false;
        }
        self.panel = Panel::Loading;
        self.show_help = false;
        self.scroll = 0;
        true
    }

    pub fn finish_request(&mut self, response: RelayResponse) {
        self.panel = Panel::from(response);
        self.scroll = 0;
    }

    pub fn key_saved(&mut self) {
        if self.panel == Panel::Error(KEY_PROMPT.to_string()) {
            self.panel = Panel::Hidden;
        }
        self.set_notice(KEY_SAVED, styles::notice(), KEY_SAVED_TTL);
    }

    fn spinner(&self) -> &'static str {
        if self.panel.is_loading() {
            BRAILLE_FRAMES[self.spin_idx % BRAILLE_FRAMES.len()]
        } else {
            " "
        }
    }

    fn step_spinner(&mut self) -> bool {
        if self.panel.is_loading() {
            self.spin_idx = (self.spin_idx + 1) % BRAILLE_FRAMES.len();
            return true;
        }
        false
    }
}

pub struct TuiActor {
    // deps
    relay: Addr<RelayActor>,
    keys: Arc<dyn KeyStore>,
    me: Addr<TuiActor>,
    target: String,

    // terminal
    term: Terminal<CrosstermBackend<Stdout>>,
    tick_rate: Duration,
    last_tick: Instant,

    state: PopupState,
    dirty: bool,

    // shutdown coordination
    shutdown: ShutdownHandle,
}

impl TuiActor {
    /// Takes over the terminal. `me` is this actor's own reserved address,
    /// used to deliver relay replies back into the mailbox.
    pub fn new(
        relay: Addr<RelayActor>,
        keys: Arc<dyn KeyStore>,
        me: Addr<TuiActor>,
        target: impl Into<String>,
        shutdown: ShutdownHandle,
    ) -> Result<Self> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut term = Terminal::new(backend)?;
        term.clear()?;

        Ok(Self {
            relay,
            keys,
            me,
            target: target.into(),
            term,
            tick_rate: Duration::from_millis(80),
            last_tick: Instant::now(),
            state: PopupState::new(),
            dirty: true,
            shutdown,
        })
    }

    fn draw(&mut self) -> Result<()> {
        let (input, caret_col) = self.state.displayed_input();
        let snap = ViewSnap {
            input,
            caret_col,
            panel: self.state.panel.clone(),
            show_help: self.state.show_help,
            notice: self
                .state
                .notice
                .as_ref()
                .map(|n| (n.text.clone(), n.style)),
            scroll: self.state.scroll,
            spinner: self.state.spinner(),
            target: self.target.clone(),
        };
        view::draw(&mut self.term, &snap)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<TuiMsg> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        self.dirty = true;
        let state = &mut self.state;
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL)
            | (KeyCode::Char('q'), KeyModifiers::CONTROL) => return Some(TuiMsg::Shutdown),
            (KeyCode::F(1), _) => return Some(TuiMsg::Summarize(RequestKind::PageContent)),
            (KeyCode::F(2), _) => return Some(TuiMsg::Summarize(RequestKind::VideoTranscript)),
            (KeyCode::PageUp, _) => state.scroll = state.scroll.saturating_sub(5),
            (KeyCode::PageDown, _) => state.scroll = state.scroll.saturating_add(5),
            (KeyCode::Up, _) => state.scroll = state.scroll.saturating_sub(1),
            (KeyCode::Down, _) => state.scroll = state.scroll.saturating_add(1),
            (KeyCode::Enter, _) => return Some(TuiMsg::Submit(state.take_input())),
            (KeyCode::Left, _) => state.cursor_left(),
            (KeyCode::Right, _) => state.cursor_right(),
            (KeyCode::Home, _) => state.input_cursor = 0,
            (KeyCode::End, _) => state.input_cursor = state.input.len(),
            (KeyCode::Backspace, _) => state.backspace(),
            (KeyCode::Delete, _) => state.delete(),
            (KeyCode::Esc, _) => {
                state.take_input();
            }
            (KeyCode::Char(ch), _) => state.insert_char(ch),
            _ => self.dirty = false,
        }
        None
    }

    fn request_summary(&mut self, kind: RequestKind) {
        self.dirty = true;
        if !self.state.begin_request() {
            self.state
                .set_notice(ALREADY_LOADING, styles::dim(), NOTICE_TTL);
            return;
        }
        tracing::info!(%kind, "tui.summarize");

        let (reply, rx) = oneshot::channel::<RelayResponse>();
        if self
            .relay
            .try_send(RelayMsg::Summarize { kind, reply })
            .is_err()
        {
            tracing::error!(%kind, "tui.relay.unreachable");
            self.state
                .finish_request(RelayResponse::Error(RELAY_UNREACHABLE.into()));
            return;
        }

        let me = self.me.clone();
        tokio::spawn(async move {
            let response = rx
                .await
                .unwrap_or_else(|_| RelayResponse::Error(RELAY_UNREACHABLE.into()));
            let _ = me.send(TuiMsg::Relayed(response)).await;
        });
    }

    async fn save_key(&mut self, key: String) {
        match self.keys.set(Credential::new(key)).await {
            Ok(()) => self.state.key_saved(),
            Err(e) => self
                .state
                .set_notice(format!("× {e}"), styles::error(), NOTICE_TTL),
        }
    }

    async fn route_submit(&mut self, line: String) {
        let s = line.trim();
        if s.is_empty() {
            return;
        }
        self.dirty = true;
        match parse_command(s) {
            Command::Summarize(kind) => self.request_summary(kind),
            Command::Key(Some(key)) => self.save_key(key).await,
            Command::Key(None) => self.state.set_notice(KEY_USAGE, styles::dim(), NOTICE_TTL),
            Command::Help => self.state.show_help = !self.state.show_help,
            Command::Quit => {
                let _ = self.me.try_send(TuiMsg::Shutdown);
            }
            Command::Unknown(s) => self.state.set_notice(
                format!("× Unknown command: {s}. Try /help."),
                styles::error(),
                NOTICE_TTL,
            ),
        }
    }
}

fn restore_terminal() {
    disable_raw_mode().ok();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

impl Drop for TuiActor {
    fn drop(&mut self) {
        restore_terminal();
    }
}

#[async_trait]
impl Actor for TuiActor {
    type Msg = TuiMsg;

    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()> {
        match msg {
            TuiMsg::Startup => {
                if self.keys.get().await.is_none() {
                    self.state.panel = Panel::Error(KEY_PROMPT.to_string());
                    self.dirty = true;
                }
            }
            TuiMsg::InputEvent(ev) => {
                if let CtEvent::Key(k) = ev
                    && let Some(next) = self.handle_key(k)
                {
                    let _ = self.me.try_send(next);
                }
                if matches!(ev, CtEvent::Resize(..)) {
                    self.dirty = true;
                }
            }
            TuiMsg::Submit(line) => self.route_submit(line).await,
            TuiMsg::Summarize(kind) => self.request_summary(kind),
            TuiMsg::Relayed(response) => {
                if let RelayResponse::Error(e) = &response {
                    tracing::debug!(error = %e, "tui.relay.error");
                }
                self.state.finish_request(response);
                self.dirty = true;
            }
            TuiMsg::OpError(e) => {
                self.state
                    .set_notice(format!("× Error: {e}"), styles::error(), NOTICE_TTL);
                self.dirty = true;
            }
            TuiMsg::Tick => {
                let now = Instant::now();
                if self.state.expire_notice(now) | self.state.step_spinner() {
                    self.dirty = true;
                }
                if self.dirty || self.last_tick.elapsed() >= self.tick_rate {
                    self.draw()?;
                    self.last_tick = now;
                    self.dirty = false;
                }
            }
            TuiMsg::Shutdown => {
                restore_terminal();
                self.shutdown.signal();
                ctx.stop();
            }
        }

        Ok(())
    }
}

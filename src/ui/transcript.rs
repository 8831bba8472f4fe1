//! The transcript: everything appended to the terminal history.
//!
//! The core appends ready-to-display lines in arrival order; rendering and
//! reveal effects are presentation concerns handled by the loop. Lines that
//! came from persisted messages keep their message id so an observed
//! self-destruct deletion can remove them again.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Plain,
    System,
    Error,
    Alert,
    ChatOwn,
    ChatPeer,
    RadioOwn,
    RadioPeer,
    Art,
}

#[derive(Debug, Clone)]
pub struct TranscriptLine {
    pub kind: LineKind,
    /// Sender tag rendered as `[NAME]: ` before the body.
    pub prefix: Option<String>,
    pub body: String,
    /// Self-destruct marker; rendered with a burn tag.
    pub burn: bool,
    /// Persisted message id, when this line mirrors a stored message.
    pub message_id: Option<String>,
}

impl TranscriptLine {
    fn new(kind: LineKind, prefix: Option<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            prefix,
            body: body.into(),
            burn: false,
            message_id: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Transcript {
    lines: Vec<TranscriptLine>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn push(&mut self, line: TranscriptLine) {
        self.lines.push(line);
    }

    pub fn plain(&mut self, body: impl Into<String>) {
        self.push(TranscriptLine::new(LineKind::Plain, None, body));
    }

    pub fn system(&mut self, body: impl Into<String>) {
        self.push(TranscriptLine::new(
            LineKind::System,
            Some("SYSTEM".into()),
            body,
        ));
    }

    pub fn error(&mut self, body: impl Into<String>) {
        self.push(TranscriptLine::new(
            LineKind::Error,
            Some("ERROR".into()),
            body,
        ));
    }

    pub fn alert(&mut self, body: impl Into<String>) {
        self.push(TranscriptLine::new(
            LineKind::Alert,
            Some("ALERT".into()),
            body,
        ));
    }

    pub fn art(&mut self, body: impl Into<String>) {
        self.push(TranscriptLine::new(LineKind::Art, None, body));
    }

    /// Append a line mirroring a persisted message.
    pub fn message(
        &mut self,
        kind: LineKind,
        sender: impl Into<String>,
        body: impl Into<String>,
        message_id: impl Into<String>,
        burn: bool,
    ) {
        let mut line = TranscriptLine::new(kind, Some(sender.into()), body);
        line.message_id = Some(message_id.into());
        line.burn = burn;
        self.push(line);
    }

    /// Remove the line mirroring a deleted message; `false` when the id was
    /// never displayed (or already removed).
    pub fn remove_message(&mut self, message_id: &str) -> bool {
        let before = self.lines.len();
        self.lines
            .retain(|line| line.message_id.as_deref() != Some(message_id));
        self.lines.len() != before
    }
}

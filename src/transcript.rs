//! Session transcript: append-only message log plus terminal rendering.
//!
//! ## Model
//! - Entries are never edited or reordered; every append pins the view to
//!   the newest entry (no "user has scrolled up" detection).
//! - The typing indicator is an explicit tagged entry, so removal is
//!   type-checked instead of inferred from "last child" position.
//! - The transcript lives in memory only and dies with the process.

use colored::*;

use crate::api::SourceHit;

/// Text shown in the typing placeholder bubble.
pub const TYPING_LABEL: &str = "Digitando...";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Assistant,
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Author::User => write!(f, "Você"),
            Author::Assistant => write!(f, "Mentor"),
        }
    }
}

/// Structured annotations carried by an assistant reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageMeta {
    pub sources: Vec<SourceHit>,
    pub xp_awarded: Option<i64>,
    pub next_task: Option<String>,
}

/// One chat bubble.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub text: String,
    pub author: Author,
    pub meta: MessageMeta,
}

/// A transcript entry: a message plus the placeholder tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub message: Message,
    pub is_placeholder: bool,
}

/// Append-only transcript with a bottom-pinned viewport.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    scroll: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript::default()
    }

    /// Append a message and pin the viewport to it.
    pub fn append(&mut self, text: impl Into<String>, author: Author, meta: MessageMeta) {
        self.entries.push(TranscriptEntry {
            message: Message {
                text: text.into(),
                author,
                meta,
            },
            is_placeholder: false,
        });
        self.scroll = self.entries.len();
    }

    /// Append the transient typing placeholder.
    pub fn show_typing(&mut self) {
        self.entries.push(TranscriptEntry {
            message: Message {
                text: TYPING_LABEL.to_string(),
                author: Author::Assistant,
                meta: MessageMeta::default(),
            },
            is_placeholder: true,
        });
        self.scroll = self.entries.len();
    }

    /// Remove the typing placeholder if and only if it is the newest entry.
    ///
    /// A no-op on an empty transcript or when the last entry is a real
    /// message; this guards the race where both the error path and the
    /// success path of one send cycle attempt cleanup. Returns whether an
    /// entry was removed.
    pub fn clear_typing(&mut self) -> bool {
        match self.entries.last() {
            Some(entry) if entry.is_placeholder => {
                self.entries.pop();
                self.scroll = self.entries.len();
                true
            }
            _ => false,
        }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Viewport anchor. Always equal to `len()`: every append scrolls to
    /// the newest entry unconditionally.
    pub fn scroll_position(&self) -> usize {
        self.scroll
    }
}

// -- Rendering --------------------------------------------------------------

/// Render one entry as terminal lines. The first line is the bubble itself,
/// followed by one line per annotation (citations, XP delta, next task).
pub fn render_entry(entry: &TranscriptEntry) -> Vec<String> {
    let message = &entry.message;
    let header = match message.author {
        Author::User => format!("{}", message.author).bold().cyan(),
        Author::Assistant => format!("{}", message.author).bold().green(),
    };
    let bubble = if entry.is_placeholder {
        format!("{header}: {}", message.text.dimmed())
    } else {
        format!("{header}: {}", message.text)
    };

    let mut lines = vec![bubble];
    for hit in &message.meta.sources {
        lines.push(format!("  {}", format!("(Fonte: {})", hit.source).dimmed()));
    }
    if let Some(xp) = message.meta.xp_awarded {
        lines.push(format!("  {}", format!("{xp:+} XP").yellow().bold()));
    }
    if let Some(task) = &message.meta.next_task {
        lines.push(format!("  {}", format!("Próximo passo: {task}").blue()));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_meta() -> MessageMeta {
        MessageMeta::default()
    }

    #[test]
    fn test_append_pins_scroll_to_bottom() {
        let mut t = Transcript::new();
        t.append("Olá", Author::User, user_meta());
        assert_eq!(t.len(), 1);
        assert_eq!(t.scroll_position(), 1);
        t.append("Oi!", Author::Assistant, user_meta());
        assert_eq!(t.scroll_position(), 2);
    }

    #[test]
    fn test_show_typing_appends_placeholder() {
        let mut t = Transcript::new();
        t.show_typing();
        assert_eq!(t.len(), 1);
        let last = t.last().expect("entry");
        assert!(last.is_placeholder);
        assert_eq!(last.message.text, TYPING_LABEL);
        assert_eq!(last.message.author, Author::Assistant);
    }

    #[test]
    fn test_clear_typing_removes_placeholder() {
        let mut t = Transcript::new();
        t.append("Olá", Author::User, user_meta());
        t.show_typing();
        assert!(t.clear_typing());
        assert_eq!(t.len(), 1);
        assert!(!t.last().expect("entry").is_placeholder);
    }

    #[test]
    fn test_clear_typing_on_empty_transcript_is_noop() {
        let mut t = Transcript::new();
        assert!(!t.clear_typing());
        assert!(t.is_empty());
    }

    #[test]
    fn test_clear_typing_leaves_real_message_alone() {
        let mut t = Transcript::new();
        t.append("Olá", Author::User, user_meta());
        assert!(!t.clear_typing());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_clear_typing_twice_second_is_noop() {
        let mut t = Transcript::new();
        t.append("Olá", Author::User, user_meta());
        t.show_typing();
        assert!(t.clear_typing());
        assert!(!t.clear_typing());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_clear_typing_updates_scroll() {
        let mut t = Transcript::new();
        t.append("Olá", Author::User, user_meta());
        t.show_typing();
        t.clear_typing();
        assert_eq!(t.scroll_position(), 1);
    }

    #[test]
    fn test_author_display() {
        assert_eq!(Author::User.to_string(), "Você");
        assert_eq!(Author::Assistant.to_string(), "Mentor");
    }

    #[test]
    fn test_render_entry_plain_bubble_single_line() {
        let entry = TranscriptEntry {
            message: Message {
                text: "Oi!".to_string(),
                author: Author::Assistant,
                meta: MessageMeta::default(),
            },
            is_placeholder: false,
        };
        let lines = render_entry(&entry);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Oi!"));
    }

    #[test]
    fn test_render_entry_annotations_in_order() {
        let entry = TranscriptEntry {
            message: Message {
                text: "Frações são partes de um todo.".to_string(),
                author: Author::Assistant,
                meta: MessageMeta {
                    sources: vec![SourceHit {
                        source: "bncc.pdf".to_string(),
                        score: Some(0.9),
                        snippet: None,
                    }],
                    xp_awarded: Some(5),
                    next_task: Some("Resolver 2 exercícios".to_string()),
                },
            },
            is_placeholder: false,
        };
        let lines = render_entry(&entry);
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("(Fonte: bncc.pdf)"));
        assert!(lines[2].contains("+5 XP"));
        assert!(lines[3].contains("Próximo passo: Resolver 2 exercícios"));
    }

    #[test]
    fn test_render_entry_negative_xp_signed() {
        let entry = TranscriptEntry {
            message: Message {
                text: "x".to_string(),
                author: Author::Assistant,
                meta: MessageMeta {
                    xp_awarded: Some(-3),
                    ..Default::default()
                },
            },
            is_placeholder: false,
        };
        let lines = render_entry(&entry);
        assert!(lines[1].contains("-3 XP"));
    }
}

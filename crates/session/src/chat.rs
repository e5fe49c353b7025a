use std::collections::VecDeque;
use std::fmt;
use tileworld_common::EntityId;

/// Who a chat line came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatSource {
    Player { id: EntityId, username: String },
    System,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub source: ChatSource,
    pub text: String,
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ChatSource::Player { username, .. } => write!(f, "{username}: {}", self.text),
            ChatSource::System => write!(f, "* {}", self.text),
        }
    }
}

/// Bounded chat history; the oldest line goes first when full.
#[derive(Debug, Clone)]
pub struct ChatLog {
    lines: VecDeque<ChatLine>,
    capacity: usize,
}

impl ChatLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, line: ChatLine) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn push_player(&mut self, id: EntityId, username: String, text: String) {
        self.push(ChatLine {
            source: ChatSource::Player { id, username },
            text,
        });
    }

    pub fn push_system(&mut self, text: impl Into<String>) {
        self.push(ChatLine {
            source: ChatSource::System,
            text: text.into(),
        });
    }

    pub fn lines(&self) -> impl DoubleEndedIterator<Item = &ChatLine> {
        self.lines.iter()
    }

    pub fn last(&self) -> Option<&ChatLine> {
        self.lines.back()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_line_drops_when_full() {
        let mut log = ChatLog::new(2);
        log.push_system("one");
        log.push_system("two");
        log.push_system("three");
        let texts: Vec<_> = log.lines().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["two", "three"]);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut log = ChatLog::new(0);
        log.push_system("ignored");
        assert!(log.is_empty());
    }

    #[test]
    fn display_formats() {
        let mut log = ChatLog::new(4);
        log.push_player("p1".into(), "alice".into(), "hi".into());
        log.push_system("server restarting");
        let lines: Vec<_> = log.lines().map(|l| l.to_string()).collect();
        assert_eq!(lines, ["alice: hi", "* server restarting"]);
    }
}

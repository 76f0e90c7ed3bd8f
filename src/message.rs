use std::path::PathBuf;

/// A source photo staged by the user, kept as its on-disk path plus the
/// mime type detected from the extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub path: PathBuf,
    pub mime_type: String,
}

/// A generated design image as delivered by the API: base64 data plus the
/// mime type the provider reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignImage {
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    User {
        text: String,
    },
    UserWithImages {
        text: String,
        images: Vec<SourceImage>,
    },
    Ai {
        text: String,
        image: Option<DesignImage>,
    },
}

impl ChatMessage {
    pub fn is_user(&self) -> bool {
        matches!(
            self,
            ChatMessage::User { .. } | ChatMessage::UserWithImages { .. }
        )
    }

    /// The generated image carried by this message, if it is a design
    /// message (an AI entry with an image attached).
    pub fn design_image(&self) -> Option<&DesignImage> {
        match self {
            ChatMessage::Ai {
                image: Some(image), ..
            } => Some(image),
            _ => None,
        }
    }
}

/// Ordered chat history. Messages are never edited in place: the log only
/// grows by appending, or shrinks from the tail when an exchange is undone.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recently appended design message, scanning from the tail.
    pub fn last_design(&self) -> Option<&DesignImage> {
        self.messages.iter().rev().find_map(|m| m.design_image())
    }

    pub fn has_design(&self) -> bool {
        self.last_design().is_some()
    }

    /// Remove the trailing user/AI exchange. A design or edit round always
    /// appends a user message followed by an AI response, so undo pops
    /// exactly that pair. If the tail is not shaped like an exchange the
    /// log is left untouched and `false` is returned.
    pub fn undo_exchange(&mut self) -> bool {
        let n = self.messages.len();
        if n < 2 {
            return false;
        }
        let last_is_ai = matches!(self.messages[n - 1], ChatMessage::Ai { .. });
        if last_is_ai && self.messages[n - 2].is_user() {
            self.messages.truncate(n - 2);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(data: &str) -> DesignImage {
        DesignImage {
            data: data.to_string(),
            mime_type: "image/png".to_string(),
        }
    }

    fn ai_with_image(data: &str) -> ChatMessage {
        ChatMessage::Ai {
            text: "listo".to_string(),
            image: Some(design(data)),
        }
    }

    fn user(text: &str) -> ChatMessage {
        ChatMessage::User {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_undo_removes_trailing_exchange() {
        let mut log = MessageLog::new();
        log.push(ChatMessage::Ai {
            text: "hola".to_string(),
            image: None,
        });
        log.push(user("haz el salón moderno"));
        log.push(ai_with_image("abc"));

        assert!(log.undo_exchange());
        assert_eq!(log.len(), 1);
        assert!(!log.has_design());
    }

    #[test]
    fn test_undo_accepts_user_with_images_tail() {
        let mut log = MessageLog::new();
        log.push(ChatMessage::UserWithImages {
            text: "rediseña".to_string(),
            images: vec![],
        });
        log.push(ai_with_image("abc"));

        assert!(log.undo_exchange());
        assert!(log.is_empty());
    }

    #[test]
    fn test_undo_is_noop_on_unexpected_tail() {
        let mut log = MessageLog::new();
        log.push(ChatMessage::Ai {
            text: "hola".to_string(),
            image: None,
        });
        log.push(user("pendiente"));

        let before = log.messages().to_vec();
        assert!(!log.undo_exchange());
        assert_eq!(log.messages(), before.as_slice());

        // A second invocation is equally safe.
        assert!(!log.undo_exchange());
        assert_eq!(log.messages(), before.as_slice());
    }

    #[test]
    fn test_undo_is_noop_on_short_log() {
        let mut log = MessageLog::new();
        assert!(!log.undo_exchange());
        log.push(ai_with_image("solo"));
        assert!(!log.undo_exchange());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_last_design_picks_most_recent() {
        let mut log = MessageLog::new();
        log.push(user("primero"));
        log.push(ai_with_image("primera"));
        log.push(user("segundo"));
        log.push(ai_with_image("segunda"));
        log.push(user("texto suelto"));
        log.push(ChatMessage::Ai {
            text: "sin imagen".to_string(),
            image: None,
        });

        let base = log.last_design().expect("design expected");
        assert_eq!(base.data, "segunda");
    }

    #[test]
    fn test_last_design_none_without_images() {
        let mut log = MessageLog::new();
        log.push(ChatMessage::Ai {
            text: "saludo".to_string(),
            image: None,
        });
        log.push(user("hola"));
        assert!(log.last_design().is_none());
        assert!(!log.has_design());
    }
}

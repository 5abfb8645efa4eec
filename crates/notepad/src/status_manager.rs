use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Success,
    Warning,
    Error,
}

impl MessageType {
    fn auto_clear_after(self) -> Duration {
        match self {
            MessageType::Info => Duration::from_secs(3),
            MessageType::Success => Duration::from_secs(3),
            MessageType::Warning => Duration::from_secs(5),
            MessageType::Error => Duration::from_secs(7),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub content: String,
    pub message_type: MessageType,
    pub stamped_at: DateTime<Local>,
    created_at: Instant,
    auto_clear_after: Duration,
}

impl StatusMessage {
    pub fn new(content: String, message_type: MessageType) -> Self {
        Self {
            content,
            message_type,
            stamped_at: Local::now(),
            created_at: Instant::now(),
            auto_clear_after: message_type.auto_clear_after(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.auto_clear_after
    }

    /// Text shown in the status line, e.g. `14:02:11  Saved notes.txt`.
    pub fn display_text(&self) -> String {
        format!("{}  {}", self.stamped_at.format("%H:%M:%S"), self.content)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusManager {
    current_message: Option<StatusMessage>,
}

impl StatusManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_info(&mut self, message: impl Into<String>) {
        self.set(message.into(), MessageType::Info);
    }

    pub fn set_success(&mut self, message: impl Into<String>) {
        self.set(message.into(), MessageType::Success);
    }

    pub fn set_warning(&mut self, message: impl Into<String>) {
        self.set(message.into(), MessageType::Warning);
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.set(message.into(), MessageType::Error);
    }

    /// Drop the current message once it has expired.
    pub fn update(&mut self) {
        if self.current_message.as_ref().is_some_and(|m| m.is_expired()) {
            self.current_message = None;
        }
    }

    pub fn current_message(&self) -> Option<&StatusMessage> {
        self.current_message.as_ref()
    }

    fn set(&mut self, content: String, message_type: MessageType) {
        match message_type {
            MessageType::Error => log::error!("{}", content),
            MessageType::Warning => log::warn!("{}", content),
            _ => log::debug!("status: {}", content),
        }
        self.current_message = Some(StatusMessage::new(content, message_type));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_status_manager_creation() {
        let manager = StatusManager::new();
        assert!(manager.current_message().is_none());
    }

    #[test]
    fn test_message_types() {
        let mut manager = StatusManager::new();

        manager.set_info("Info message");
        let message = manager.current_message().unwrap();
        assert_eq!(message.message_type, MessageType::Info);
        assert_eq!(message.content, "Info message");

        manager.set_success("Saved");
        assert_eq!(manager.current_message().unwrap().message_type, MessageType::Success);

        manager.set_warning("Careful");
        assert_eq!(manager.current_message().unwrap().message_type, MessageType::Warning);

        manager.set_error("Broken");
        assert_eq!(manager.current_message().unwrap().message_type, MessageType::Error);
    }

    #[test]
    fn test_display_text_is_time_stamped() {
        let message = StatusMessage::new("Saved notes.txt".to_string(), MessageType::Success);
        let text = message.display_text();
        assert!(text.ends_with("  Saved notes.txt"));
        assert_eq!(text.len(), "00:00:00  Saved notes.txt".len());
    }

    #[test]
    fn test_update_expired_message() {
        let mut manager = StatusManager::new();
        let mut message = StatusMessage::new("Test".to_string(), MessageType::Info);
        message.auto_clear_after = Duration::from_millis(1);
        manager.current_message = Some(message);

        thread::sleep(Duration::from_millis(10));

        manager.update();
        assert!(manager.current_message().is_none());
    }

    #[test]
    fn test_fresh_message_survives_update() {
        let mut manager = StatusManager::new();
        manager.set_error("Still here");
        manager.update();
        assert!(manager.current_message().is_some());
    }
}

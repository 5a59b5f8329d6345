/// Payload attached to a session history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryState {
    pub index: i64,
}

/// The browser window a presentation runs in.
pub trait Host {
    /// Current window title.
    fn title(&self) -> &str;
    fn set_title(&mut self, title: String);
    /// Address fragment without the leading `#`, if the address has one.
    fn fragment(&self) -> Option<&str>;
    /// Add a history entry after the current one.
    fn push_state(&mut self, state: HistoryState, url: &str);
    /// Overwrite the current history entry.
    fn replace_state(&mut self, state: HistoryState, url: &str);
    fn scroll_to(&mut self, x: u32, y: u32);
}

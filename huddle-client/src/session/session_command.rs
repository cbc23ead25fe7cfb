/// Requests from the local user to a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    SendChat(String),
    ToggleAudio,
    ToggleVideo,
    Leave,
}

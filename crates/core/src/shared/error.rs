/// Error returned across collaborator boundaries (clips, encoders, colour
/// transforms). Thread-safe so render calls can run on worker threads.
pub type SendError = Box<dyn std::error::Error + Send + Sync>;

mod core;
mod history;
mod state;
mod streaming;


pub use state::ConversationManager;
pub use streaming::ChunkStream;

#[cfg(test)]
use history::*;

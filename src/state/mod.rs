mod conversation;
pub mod reconciler;
pub mod session;

pub use conversation::{ChunkStream, ConversationManager};
pub use reconciler::{ChunkEffect, StreamReconciler};
pub use session::{Phase, Role, Session, Turn};

pub mod document;
pub mod frame;
pub mod manager;

pub use frame::{Frame, FrameMessageReceiver, FrameMessageSender, FrameSignal, ProcessFrame};
pub use manager::SandboxManager;

use super::document::render_document;
use super::frame::{Frame, FrameSignal};
use crate::util::parse_error_message;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FrameErrorPayload {
    message: String,
}

/// Owns the one frame and the execution state bound to it.
pub struct SandboxManager {
    frame: Box<dyn Frame>,
    running: bool,
    last_error: Option<String>,
    reload_pending: bool,
}

impl SandboxManager {
    pub fn new(frame: Box<dyn Frame>) -> Self {
        Self {
            frame,
            running: true,
            last_error: None,
            reload_pending: false,
        }
    }

    /// Rebuild the frame around `code`. Nothing of the previous run survives.
    pub fn execute(&mut self, code: &str) -> Result<()> {
        self.last_error = None;
        self.reload_pending = false;
        self.running = true;
        tracing::debug!(bytes = code.len(), "executing sketch");
        self.frame.load(&render_document(code))
    }

    /// Pause the draw loop. Returns false when already stopped.
    pub fn stop(&mut self) -> Result<bool> {
        if !self.running {
            return Ok(false);
        }
        self.running = false;
        self.frame.post(FrameSignal::Stop)?;
        Ok(true)
    }

    /// Continue the draw loop. Returns false when already running.
    pub fn resume(&mut self) -> Result<bool> {
        if self.running {
            return Ok(false);
        }
        self.running = true;
        self.frame.post(FrameSignal::Resume)?;
        Ok(true)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn reload_pending(&self) -> bool {
        self.reload_pending
    }

    pub fn mark_reload_pending(&mut self) {
        self.reload_pending = true;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Remember `message` as the last error. Returns true when it differs from
    /// the previous one.
    pub fn record_error(&mut self, message: &str) -> bool {
        let is_new = self.last_error.as_deref() != Some(message);
        self.last_error = Some(message.to_string());
        is_new
    }

    /// Decode a raw `{"message": "..."}` payload posted by the frame.
    pub fn parse_frame_message(raw: &str) -> Option<String> {
        match serde_json::from_str::<FrameErrorPayload>(raw) {
            Ok(payload) => Some(parse_error_message(&payload.message)),
            Err(error) => {
                tracing::warn!(%error, payload = raw, "could not parse frame message");
                None
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_frame::RecordingFrame;
    use super::*;

    fn manager() -> (SandboxManager, RecordingFrame) {
        let frame = RecordingFrame::default();
        (SandboxManager::new(Box::new(frame.clone())), frame)
    }

    #[test]
    fn test_execute_loads_fresh_document_and_resets_state() {
        let (mut sandbox, frame) = manager();
        sandbox.record_error("TypeError: x");
        sandbox.mark_reload_pending();
        sandbox.stop().unwrap();

        sandbox.execute("function draw(){}").unwrap();

        assert!(sandbox.is_running());
        assert!(!sandbox.reload_pending());
        assert!(sandbox.last_error().is_none());
        let log = frame.log.lock().unwrap();
        assert_eq!(log.documents.len(), 1);
        assert!(log.documents[0].contains("function draw(){}"));
    }

    #[test]
    fn test_stop_and_resume_are_idempotent() {
        let (mut sandbox, frame) = manager();
        assert!(!sandbox.resume().unwrap());
        assert!(sandbox.stop().unwrap());
        assert!(!sandbox.stop().unwrap());
        assert!(sandbox.resume().unwrap());
        assert!(!sandbox.resume().unwrap());

        let log = frame.log.lock().unwrap();
        assert_eq!(log.signals, vec![FrameSignal::Stop, FrameSignal::Resume]);
        assert!(log.documents.is_empty(), "signals never rebuild the frame");
    }

    #[test]
    fn test_record_error_deduplicates_consecutive_repeats() {
        let (mut sandbox, _frame) = manager();
        assert!(sandbox.record_error("ReferenceError: foo is not defined"));
        assert!(!sandbox.record_error("ReferenceError: foo is not defined"));
        assert!(sandbox.record_error("TypeError: bar"));
        assert!(sandbox.record_error("ReferenceError: foo is not defined"));
        assert_eq!(sandbox.last_error(), Some("ReferenceError: foo is not defined"));
    }

    #[test]
    fn test_parse_frame_message() {
        assert_eq!(
            SandboxManager::parse_frame_message(r#"{"message":"ReferenceError: foo"}"#),
            Some("ReferenceError: foo".to_string())
        );
        assert_eq!(SandboxManager::parse_frame_message("not json"), None);
        assert_eq!(SandboxManager::parse_frame_message(r#"{"other":1}"#), None);
    }
}

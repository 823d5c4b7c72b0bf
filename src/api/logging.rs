//! Raw request/response dumps for diagnosing the model endpoint.
//!
//! Request bodies are only dumped when `SKETCH_DEBUG_PAYLOAD` is set; stream
//! events that fail to parse are always dumped. Dumps go to
//! `SKETCH_API_LOG_PATH`, to a file under `/tmp` when stderr is a terminal (so
//! they do not garble the REPL), or to stderr otherwise.

use crate::util::parse_bool_str;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;

const DEFAULT_API_LOG_PATH: &str = "/tmp/sketch-debug-payload.log";
const DEBUG_PAYLOAD_ENV: &str = "SKETCH_DEBUG_PAYLOAD";
const API_LOG_PATH_ENV: &str = "SKETCH_API_LOG_PATH";

#[derive(Debug, PartialEq, Eq)]
enum DumpTarget {
    File(PathBuf),
    Stderr,
}

pub fn debug_payload_enabled() -> bool {
    std::env::var(DEBUG_PAYLOAD_ENV)
        .ok()
        .and_then(|v| parse_bool_str(&v))
        .unwrap_or(false)
}

pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let body = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<unserializable payload>".to_string());
    dump(&format!("[sketch] request url={request_url}\n{body}\n"));
}

pub fn emit_sse_parse_error(data: &str, parse_error: &serde_json::Error) {
    tracing::warn!(
        error = %parse_error,
        bytes = data.len(),
        "dropping unparseable stream event"
    );
    dump(&format!(
        "[sketch] unparseable event bytes={} error={parse_error}\n{data}\n",
        data.len()
    ));
}

fn dump(record: &str) {
    if let DumpTarget::File(path) = dump_target() {
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| file.write_all(record.as_bytes()));
        match written {
            Ok(()) => return,
            Err(error) => {
                tracing::debug!(%error, path = %path.display(), "dump file unavailable")
            }
        }
    }
    eprintln!("{record}");
}

fn dump_target() -> DumpTarget {
    let configured = std::env::var(API_LOG_PATH_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match configured {
        Some(path) => DumpTarget::File(PathBuf::from(path)),
        None if std::io::stderr().is_terminal() => {
            DumpTarget::File(PathBuf::from(DEFAULT_API_LOG_PATH))
        }
        None => DumpTarget::Stderr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_payload_flag_parsing() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(DEBUG_PAYLOAD_ENV, "1");
        assert!(debug_payload_enabled());
        std::env::set_var(DEBUG_PAYLOAD_ENV, "yes");
        assert!(debug_payload_enabled());
        std::env::set_var(DEBUG_PAYLOAD_ENV, "off");
        assert!(!debug_payload_enabled());
        std::env::remove_var(DEBUG_PAYLOAD_ENV);
        assert!(!debug_payload_enabled());
    }

    #[test]
    fn test_configured_path_receives_dumps() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.log");
        std::env::set_var(API_LOG_PATH_ENV, &path);

        assert_eq!(dump_target(), DumpTarget::File(path.clone()));
        emit_debug_payload("http://localhost/v1alpha", &serde_json::json!({"contents": []}));

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("request url=http://localhost/v1alpha"));
        assert!(written.contains("\"contents\": []"));
        std::env::remove_var(API_LOG_PATH_ENV);
    }

    #[test]
    fn test_unparseable_event_dump_records_size() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.log");
        std::env::set_var(API_LOG_PATH_ENV, &path);

        let data = "{not json";
        let parse_error = serde_json::from_str::<Value>(data).unwrap_err();
        emit_sse_parse_error(data, &parse_error);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("unparseable event bytes=9 "));
        assert!(written.contains("{not json"));
        std::env::remove_var(API_LOG_PATH_ENV);
    }
}

use reqwest::Url;

/// Parse "true"/"false"/"1"/"0" (and yes/no, on/off).
pub fn parse_bool_str(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Returns true for parseable http:// and https:// URLs.
pub fn is_http_url(url: &str) -> bool {
    match Url::parse(url.trim()) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some(),
        Err(_) => false,
    }
}

/// Reduce an error text to the single string shown to the user.
///
/// Backend errors embed `{"error": {"message": "..."}}` after the first `{`;
/// when that shape parses, only the inner message is kept. Anything else is
/// returned unchanged.
pub fn parse_error_message(raw: &str) -> String {
    if let Some(split_pos) = raw.find('{') {
        let json_part = &raw[split_pos..];
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(json_part) {
            if let Some(message) = value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(|message| message.as_str())
            {
                return message.to_string();
            }
        }
    }

    raw.to_string()
}

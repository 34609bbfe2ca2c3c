// src/utils/html.rs

/// Sanitizes user-written HTML with ammonia's whitelist.
///
/// Safe formatting tags (`<b>`, `<p>`) survive; `<script>` and its content,
/// `<iframe>` and event-handler attributes are removed. Comments are stored
/// sanitized, so every client can render them as-is.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_and_handlers() {
        let cleaned = clean_html("<b>Nice</b><script>alert(1)</script><a onclick=\"x()\">link</a>");
        assert!(cleaned.contains("<b>Nice</b>"));
        assert!(!cleaned.contains("script"));
        assert!(!cleaned.contains("onclick"));
    }
}

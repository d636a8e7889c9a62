use crate::mode::EscapeMode;

/// Returns the body of a JSON string literal for `s`, without the
/// surrounding quotes.
pub fn escape(s: &str, mode: EscapeMode) -> String {
    match mode {
        EscapeMode::Strict => escape_strict(s),
        EscapeMode::Compat => escape_compat(s),
    }
}

fn escape_strict(s: &str) -> String {
    match serde_json::to_string(s) {
        Ok(mut quoted) => {
            // A serialized str is always `"..."`.
            quoted.pop();
            quoted.remove(0);
            quoted
        }
        Err(e) => {
            log::warn!("Falling back to compat escaping: {}", e);
            escape_compat(s)
        }
    }
}

fn escape_compat(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

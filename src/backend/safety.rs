use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").ok());
// 3-3-4 digit groups, optional country code and area-code parentheses.
// Dates and plain number lists do not have that shape.
static PHONE_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[ .-]?)?(?:\(\d{3}\)\s?|\b\d{3}[ .-]?)\d{3}[ .-]?\d{4}\b").ok()
});

/// Words a story for a child must never contain.
const DISALLOWED: [&str; 6] = ["shit", "fuck", "bitch", "damn", "kill yourself", "suicide"];

const MAX_GENERATED_LEN: usize = 10_000;

/// Strip emails and phone numbers from generated text before it is shown.
pub fn redact_pii(input: &str) -> String {
    let mut out = input.to_string();
    if let Some(re) = EMAIL_RE.as_ref() {
        out = re.replace_all(&out, "[hidden]").to_string();
    }
    if let Some(re) = PHONE_RE.as_ref() {
        out = re.replace_all(&out, "[hidden]").to_string();
    }
    out
}

/// Ok when generated text is suitable for a young reader.
pub fn policy_check(input: &str) -> Result<(), String> {
    let lower = input.to_lowercase();
    if let Some(word) = DISALLOWED.iter().find(|w| lower.contains(*w)) {
        return Err(format!("disallowed phrase: {word}"));
    }
    if input.len() > MAX_GENERATED_LEN {
        return Err("content too large".to_string());
    }
    Ok(())
}

//! Prompt assembly: transcript quoting and template substitution.

use crate::models::ChatMessage;

pub const FOCUS_SLOT: &str = "{focus}";
pub const MESSAGES_SLOT: &str = "{messages}";

/// Quote arbitrary text for the transcript so the model can tell message
/// boundaries apart no matter what the text contains.
///
/// Wraps the text in double quotes and escapes backslashes, double quotes,
/// and control characters; the result always fits on one line and
/// round-trips losslessly.
pub fn quote_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render the message batch as one transcript line per message, oldest first:
/// `"author": "content"`.
pub fn render_transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|msg| format!("{}: {}", quote_text(&msg.author), quote_text(&msg.content)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Substitute `{focus}` and `{messages}` into the template.
///
/// Single pass over the template, so slot-like text inside the substituted
/// values is never itself substituted.
pub fn render_prompt(template: &str, focus: &str, messages: &str) -> String {
    let mut out = String::with_capacity(template.len() + focus.len() + messages.len());
    let mut rest = template;

    loop {
        let focus_at = rest.find(FOCUS_SLOT);
        let messages_at = rest.find(MESSAGES_SLOT);

        let (at, slot, value) = match (focus_at, messages_at) {
            (Some(f), Some(m)) if f < m => (f, FOCUS_SLOT, focus),
            (Some(f), None) => (f, FOCUS_SLOT, focus),
            (_, Some(m)) => (m, MESSAGES_SLOT, messages),
            (None, None) => break,
        };

        out.push_str(&rest[..at]);
        out.push_str(value);
        rest = &rest[at + slot.len()..];
    }

    out.push_str(rest);
    out
}

/// A usable template carries exactly one of each slot. Checked once at
/// startup so a bad override fails the process, not a command.
pub fn validate_template(template: &str) -> Result<(), String> {
    for slot in [FOCUS_SLOT, MESSAGES_SLOT] {
        match template.matches(slot).count() {
            1 => {}
            0 => return Err(format!("template is missing the {slot} slot")),
            n => return Err(format!("template has {n} {slot} slots, expected exactly one")),
        }
    }
    Ok(())
}

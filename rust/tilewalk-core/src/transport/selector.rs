//! Structured view of a transport's display selector.
//!
//! Catalog rows encode "which destination variant" as text: `"Amulet of glory: Draynor Village"`,
//! `"ardougne teleport:cast"`, `"3: Tree Gnome Stronghold"` (adventure log entry) or `"2. Edgeville"`
//! (numbered menu entry). The walker parses that text once and the executors read fields.

/// Parsed display selector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubDestination {
    /// Text before the first `:`, trimmed. The whole selector when there is no separator.
    pub label: String,
    /// Text after the first `:`, trimmed. `None` when there is no separator or it is empty.
    pub option: Option<String>,
    /// Leading `N:` adventure-log index, if present.
    pub log_index: Option<u32>,
    /// Leading `N.` menu index, if present.
    pub menu_index: Option<u32>,
}

impl SubDestination {
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim();
        let menu_index = leading_number(text, '.');
        if let Some(idx) = leading_number(text, ':') {
            // "3: Tree Gnome Stronghold" names an adventure log row, not a label/option pair
            let rest = text.split_once(':').map(|(_, r)| r.trim()).unwrap_or_default();
            return SubDestination { label: rest.to_string(), option: None, log_index: Some(idx), menu_index };
        }
        match text.split_once(':') {
            Some((label, option)) => {
                let option = option.trim();
                SubDestination {
                    label: label.trim().to_string(),
                    option: if option.is_empty() { None } else { Some(option.to_string()) },
                    log_index: None,
                    menu_index,
                }
            }
            None => SubDestination { label: text.to_string(), option: None, log_index: None, menu_index },
        }
    }

    pub fn has_option(&self) -> bool {
        self.option.is_some()
    }

    /// Option text, or `default` when absent.
    pub fn option_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.option.as_deref().unwrap_or(default)
    }
}

fn leading_number(text: &str, terminator: char) -> Option<u32> {
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    match text[digits.len()..].chars().next() {
        Some(c) if c == terminator => digits.parse().ok(),
        _ => None,
    }
}

//! Notification text for a forwarded alert

use crate::extractor::AlertRecord;
use crate::RuleAction;
use serde_json::{json, Value};

const MAX_RAW_FRAGMENTS: usize = 12;
const MAX_FRAGMENT_LEN: usize = 80;

/// Who makes the decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionMode {
    /// The user picks one of four buttons
    Interactive,
    /// The analyzer decides and calls back on its own
    AutoExecute { callback_url: String },
}

/// Render the alert for the gateway's `message` tool
pub fn render(record: &AlertRecord, mode: &DecisionMode) -> String {
    let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| "unknown".to_string());

    let process = match &record.pid {
        Some(pid) => format!("{} (pid {})", or_unknown(&record.process_name), pid),
        None => or_unknown(&record.process_name),
    };
    let remote = match &record.protocol {
        Some(proto) => format!("{} ({})", record.remote_endpoint(), proto),
        None => record.remote_endpoint(),
    };

    let mut message = format!(
        "🔥 *LuLu Firewall Alert*\n\n\
        *Process:* {}\n\
        *Path:* {}\n\
        *Arguments:* {}\n\
        *Remote:* {}\n\
        *Reverse DNS:* {}\n",
        process,
        or_unknown(&record.path),
        record.args.as_deref().map(|a| truncate(a, 200)).unwrap_or_else(|| "none".to_string()),
        remote,
        or_unknown(&record.reverse_dns),
    );

    if record.is_unknown() && !record.raw_fragments.is_empty() {
        message.push_str("\n*Raw alert text:*\n");
        for fragment in record.raw_fragments.iter().take(MAX_RAW_FRAGMENTS) {
            message.push_str(&format!("• {}\n", truncate(fragment, MAX_FRAGMENT_LEN)));
        }
    }

    message.push('\n');
    match mode {
        DecisionMode::Interactive => {
            message.push_str(
                "🤖 *Analyzer:* judge whether this connection is expected for this process \
                (vendor domains, update servers, telemetry, or a suspicious destination). \
                Give a one-line risk assessment, then ask the user to choose exactly one \
                of these four options:\n",
            );
            for (i, action) in RuleAction::ALL.iter().enumerate() {
                message.push_str(&format!("{}. {}\n", i + 1, action.choice_caption()));
            }
        }
        DecisionMode::AutoExecute { callback_url } => {
            message.push_str(&format!(
                "🤖 *Analyzer:* auto-execute is on. Decide on exactly one of \
                allow, allow-once, block, block-once, then call\n\
                POST {}/callback with body {{\"action\": \"<choice>\", \"messageId\": \"<this message id>\"}}\n",
                callback_url
            ));
        }
    }

    message
}

/// Inline keyboard with the four choices, two per row
pub fn choice_buttons() -> Value {
    let button = |action: RuleAction| {
        json!({
            "text": action.choice_caption(),
            "callback_data": format!("lulu:{}", action.as_str()),
        })
    };
    json!([
        [button(RuleAction::Allow), button(RuleAction::AllowOnce)],
        [button(RuleAction::Block), button(RuleAction::BlockOnce)],
    ])
}

/// Original text plus the outcome of the action
pub fn with_outcome(original: &str, action: RuleAction, success: bool) -> String {
    let glyph = if success { "✅" } else { "❌" };
    let outcome = if success { action.label().to_string() } else { format!("{} failed", action) };
    format!("{}\n\n{} {}", original.trim_end(), glyph, outcome)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() > max_len {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    } else {
        s.to_string()
    }
}

//! Mention scrubbing for inbound chat text.
//!
//! Pattern rules and the classifier should see natural-language content, not
//! platform mention syntax. Replacements:
//! - user mentions (`<@123>`, `<@!123>`)  -> "user"
//! - role mentions (`<@&123>`)            -> "role"
//! - broadcast mentions (`@everyone`, `@here`) -> their literal words
//! - any other `@name` token              -> removed
//!
//! The result is trimmed. Total over all inputs; callers must treat an empty
//! result as non-actionable (no detection is performed on it).

use once_cell::sync::Lazy;
use regex::Regex;

static ROLE_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@&\d+>").expect("role mention regex"));
static USER_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@!?\d+>").expect("user mention regex"));
static OTHER_AT: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+").expect("at-token regex"));

/// Scrub mention syntax and trim. Idempotent: the output contains no mention
/// tokens, so a second pass is a no-op.
pub fn normalize(text: &str) -> String {
    let t = ROLE_MENTION.replace_all(text, "role");
    let t = USER_MENTION.replace_all(&t, "user");
    let t = t.replace("@everyone", "everyone").replace("@here", "here");
    let t = OTHER_AT.replace_all(&t, "");
    t.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_and_role_mentions_become_placeholders() {
        assert_eq!(normalize("hey <@123456> look"), "hey user look");
        assert_eq!(normalize("hey <@!99> look"), "hey user look");
        assert_eq!(normalize("ping <@&42> please"), "ping role please");
    }

    #[test]
    fn broadcast_mentions_keep_their_words() {
        assert_eq!(normalize("@everyone free stuff"), "everyone free stuff");
        assert_eq!(normalize("@here come quick"), "here come quick");
    }

    #[test]
    fn bare_at_tokens_are_removed() {
        assert_eq!(normalize("thanks @alice for the tip"), "thanks  for the tip");
    }

    #[test]
    fn whitespace_only_input_normalizes_to_empty() {
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("<@123>"), "user");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in [
            "hey <@123> and <@&55>, @everyone @here @bob check this",
            "plain text stays plain",
            "  padded  ",
            "",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }
}

//! Deterministic scam pattern rules.
//!
//! A fixed, versioned, ordered rule table grouped by scam category. The
//! boolean outcome is a plain OR over all rules; evaluation order only
//! decides which rule ids get reported first (at most the first 3, for
//! diagnostics). Stateless and side-effect-free.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Bump when the rule table changes; recorded alongside dataset samples.
pub const RULESET_VERSION: u32 = 3;

/// Maximum number of matched rule ids reported per scan.
const MAX_REPORTED: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Impersonation,
    Investment,
    Giveaway,
    GiveawayDm,
    Phishing,
    PaidTask,
    Urgency,
    MaliciousLink,
}

struct PatternRule {
    id: &'static str,
    category: RuleCategory,
    pattern: &'static str,
}

const RULES: &[PatternRule] = &[
    // Impersonation / free-gift offers (platform perk scams)
    PatternRule { id: "nitro-free", category: RuleCategory::Impersonation, pattern: r"free.*nitro|nitro.*free|nitro.*giveaway|claim.*nitro" },
    PatternRule { id: "nitro-brand", category: RuleCategory::Impersonation, pattern: r"discord.*nitro|nitro.*discord" },
    PatternRule { id: "gift-link", category: RuleCategory::Impersonation, pattern: r"discord\.gift|discord\.com/gift|nitro.*claim" },
    // Investment / crypto lures
    PatternRule { id: "invest-return", category: RuleCategory::Investment, pattern: r"invest.*(?:and|get|return|back)" },
    PatternRule { id: "guaranteed-profit", category: RuleCategory::Investment, pattern: r"guaranteed.*(?:return|profit|income)" },
    PatternRule { id: "no-risk", category: RuleCategory::Investment, pattern: r"no risk.*(?:invest|profit|money)" },
    PatternRule { id: "quick-money", category: RuleCategory::Investment, pattern: r"get.*\$.*back|return.*\$.*hours|earn.*quick" },
    PatternRule { id: "crypto-claim", category: RuleCategory::Investment, pattern: r"crypto.*(?:free|airdrop|claim)" },
    PatternRule { id: "coin-airdrop", category: RuleCategory::Investment, pattern: r"bitcoin|ethereum|btc|eth.*(?:free|claim|airdrop)" },
    PatternRule { id: "free-crypto", category: RuleCategory::Investment, pattern: r"(?:free|instant).*crypto" },
    // Giveaway lures
    PatternRule { id: "giving-away", category: RuleCategory::Giveaway, pattern: r"giving\s+away|giveaway" },
    PatternRule { id: "claim-prize", category: RuleCategory::Giveaway, pattern: r"give.*away|claim.*prize|win.*(?:ps5|xbox|macbook|laptop)" },
    PatternRule { id: "limited-slots", category: RuleCategory::Giveaway, pattern: r"limited.*slots?|first.*(?:people|members|users)" },
    PatternRule { id: "free-hardware", category: RuleCategory::Giveaway, pattern: r"free.*(?:ps5|xbox|iphone|macbook|steam|air|monitor|laptop|ipad)" },
    PatternRule { id: "first-come", category: RuleCategory::Giveaway, pattern: r"free.*come.*served|first.*come.*free" },
    // Giveaway + DM-me lures
    PatternRule { id: "broadcast-free", category: RuleCategory::GiveawayDm, pattern: r"\beveryone\b.*\bfree\b|\bfree\b.*\beveryone\b|\bhere\b.*\bfree\b|\bfree\b.*\bhere\b" },
    PatternRule { id: "free-dm", category: RuleCategory::GiveawayDm, pattern: r"free.*(?:dm|message|dm\s+me)" },
    PatternRule { id: "giveaway-dm", category: RuleCategory::GiveawayDm, pattern: r"giveaway.*dm|dm.*giveaway" },
    PatternRule { id: "dm-interested", category: RuleCategory::GiveawayDm, pattern: r"(?:dm|message).*(?:interested|if|you)" },
    PatternRule { id: "dm-me", category: RuleCategory::GiveawayDm, pattern: r"dm\s+(?:if|me|interested)" },
    PatternRule { id: "message-me", category: RuleCategory::GiveawayDm, pattern: r"message\s+(?:if|me|interested)" },
    // Phishing / account-suspension lures
    PatternRule { id: "verify-account", category: RuleCategory::Phishing, pattern: r"verify.*account|confirm.*account|validate.*account" },
    PatternRule { id: "account-suspended", category: RuleCategory::Phishing, pattern: r"account.*(?:suspended|banned|compromised|flagged)" },
    PatternRule { id: "click-verify", category: RuleCategory::Phishing, pattern: r"click.*verify|verify.*click|urgent.*verify" },
    PatternRule { id: "urgent-account", category: RuleCategory::Phishing, pattern: r"urgent.*account|account.*urgent|immediately.*verify" },
    // Paid-task lures
    PatternRule { id: "get-paid", category: RuleCategory::PaidTask, pattern: r"get\s+paid|earn.*money|quick.*cash|make.*money.*fast" },
    PatternRule { id: "paid-beta", category: RuleCategory::PaidTask, pattern: r"beta.*(?:tester|test)|testing.*paid|paid.*test" },
    PatternRule { id: "dollar-guarantee", category: RuleCategory::PaidTask, pattern: r"\$.*(?:guarantee|guaranteed)" },
    PatternRule { id: "paid-dm", category: RuleCategory::PaidTask, pattern: r"paid.*(?:dm|message)|(?:dm|message).*paid" },
    // Urgency language
    PatternRule { id: "act-now", category: RuleCategory::Urgency, pattern: r"act now|hurry|limited time|don't miss|only.*(?:slots?|spots?|available)" },
    PatternRule { id: "click-here", category: RuleCategory::Urgency, pattern: r"click.*here|click.*link|click.*now" },
    PatternRule { id: "link-below", category: RuleCategory::Urgency, pattern: r"link.*below|below.*link" },
    PatternRule { id: "dm-for-info", category: RuleCategory::Urgency, pattern: r"dm.*(?:for|details|info)" },
    PatternRule { id: "urgency-combo", category: RuleCategory::Urgency, pattern: r"(?:act|click|verify|confirm|hurry).*(?:now|fast|urgent|asap)" },
    PatternRule { id: "scarcity-count", category: RuleCategory::Urgency, pattern: r"(?:limited|only|first|last).*\d+" },
    // URL shorteners / malicious domains
    PatternRule { id: "url-shortener", category: RuleCategory::MaliciousLink, pattern: r"bit\.ly|tinyurl|t\.co|short\.link|link\.shortener" },
    PatternRule { id: "brand-domain", category: RuleCategory::MaliciousLink, pattern: r"(?:discord|steam|nitro|crypto|paypal).*(?:free|claim|gift|verify)\.(?:com|net|xyz|click|site)" },
    PatternRule { id: "lure-domain", category: RuleCategory::MaliciousLink, pattern: r"(?:free|claim|win).*(?:\.com|\.net|\.xyz)" },
];

static COMPILED: Lazy<Vec<Regex>> = Lazy::new(|| {
    RULES
        .iter()
        .map(|r| Regex::new(r.pattern).expect("invalid scam pattern rule"))
        .collect()
});

/// Outcome of a pattern scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternScan {
    /// True iff at least one rule matched.
    pub suspicious: bool,
    /// Ids of the first matching rules, in table order (capped at 3).
    pub matched: Vec<&'static str>,
}

/// Evaluate the rule table against `text`. Case-insensitive.
pub fn scan(text: &str) -> PatternScan {
    let lower = text.to_lowercase();
    let mut matched = Vec::new();
    let mut suspicious = false;

    for (rule, re) in RULES.iter().zip(COMPILED.iter()) {
        if re.is_match(&lower) {
            suspicious = true;
            if matched.len() < MAX_REPORTED {
                matched.push(rule.id);
            }
        }
    }

    PatternScan { suspicious, matched }
}

/// Category of a rule id, for reporting. `None` for unknown ids.
pub fn category_of(rule_id: &str) -> Option<RuleCategory> {
    RULES.iter().find(|r| r.id == rule_id).map(|r| r.category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nitro_lure_matches() {
        let scan = scan("FREE NITRO! dm me now!!");
        assert!(scan.suspicious);
        assert_eq!(scan.matched.first(), Some(&"nitro-free"));
        assert_eq!(category_of("nitro-free"), Some(RuleCategory::Impersonation));
    }

    #[test]
    fn clean_text_does_not_match() {
        assert!(!scan("Good morning everyone").suspicious);
        assert!(!scan("let's grab lunch at noon?").suspicious);
        assert!(!scan("").suspicious);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(scan("VERIFY YOUR ACCOUNT IMMEDIATELY").suspicious);
        assert!(scan("verify your account immediately").suspicious);
    }

    #[test]
    fn reports_at_most_three_rule_ids() {
        // Trips nitro, giveaway, dm and urgency rules at once.
        let scan = scan("free nitro giveaway, dm me, act now, click here bit.ly/x");
        assert!(scan.suspicious);
        assert_eq!(scan.matched.len(), 3);
    }

    #[test]
    fn boolean_outcome_is_order_independent() {
        // `suspicious` is an OR over the table; spot-check that texts hitting
        // a single late rule still flip the boolean.
        let scan = scan("grab it via bit.ly");
        assert!(scan.suspicious);
        assert_eq!(scan.matched, vec!["url-shortener"]);
    }

    #[test]
    fn phishing_and_investment_rules_fire() {
        assert!(scan("your account was suspended, click to verify").suspicious);
        assert!(scan("guaranteed profit, no risk investment!").suspicious);
        assert!(scan("get paid to beta test, dm for details").suspicious);
    }
}

//! Legal text evaluation.
//!
//! Matching is deliberately forgiving about obfuscation: before any rule
//! runs, the text is normalized by inserting a boundary at every internal
//! lower→upper case transition, so `"FreeMoney"` matches a blocked keyword
//! `"free money"` and the literal `"freemoney"` still matches via the
//! case-insensitive substring check.
//!
//! Locale overrides are **union semantics**: the override's lists extend
//! the global lists. Lookup tries the exact normalized locale (`pt_br`)
//! first, then the bare language (`pt`).

use crate::localize::normalize_locale;
use crate::policy::{LegalAction, LegalPolicy};
use regex::RegexBuilder;
use serde::Serialize;

/// Outcome of evaluating one piece of text.
#[derive(Debug, Clone, Serialize)]
pub struct LegalCheckResult {
    pub passed: bool,
    pub action: LegalAction,
    pub flagged: bool,
    pub should_block: bool,
    pub hits: Vec<String>,
    pub warnings: Vec<String>,
    pub violations: Vec<String>,
}

struct EffectiveChecks {
    blocked_keywords: Vec<String>,
    blocked_regex: Vec<String>,
    action: LegalAction,
}

fn checks_for_locale(policy: &LegalPolicy, locale: &str) -> EffectiveChecks {
    let normalized = normalize_locale(locale);
    let mut checks = EffectiveChecks {
        blocked_keywords: policy.checks.blocked_keywords.clone(),
        blocked_regex: policy.checks.blocked_regex.clone(),
        action: policy.default_action,
    };

    let override_entry = policy.locale_overrides.get(&normalized).or_else(|| {
        normalized
            .split_once('_')
            .and_then(|(language, _)| policy.locale_overrides.get(language))
    });

    if let Some(entry) = override_entry {
        checks
            .blocked_keywords
            .extend(entry.blocked_keywords.iter().cloned());
        checks
            .blocked_regex
            .extend(entry.blocked_regex.iter().cloned());
        if let Some(action) = entry.default_action {
            checks.action = action;
        }
    }

    checks
}

/// Insert a space at each internal `aB` case transition, then collapse
/// whitespace runs. Keeps matching stable across concatenated-word
/// obfuscation and odd spacing.
fn normalize_for_matching(text: &str) -> String {
    let mut separated = String::with_capacity(text.len() + 8);
    let mut previous: Option<char> = None;
    for character in text.chars() {
        if let Some(prev) = previous
            && prev.is_lowercase()
            && character.is_uppercase()
        {
            separated.push(' ');
        }
        separated.push(character);
        previous = Some(character);
    }
    separated.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Evaluate `text` under the locale-effective checks of `policy`.
///
/// `strict` escalates any flagged result to blocking regardless of the
/// policy action.
pub fn evaluate_legal_text(
    text: &str,
    locale: &str,
    policy: &LegalPolicy,
    strict: bool,
) -> LegalCheckResult {
    let checks = checks_for_locale(policy, locale);
    let normalized = normalize_for_matching(text);
    let lowered = normalized.to_lowercase();
    // Keywords are checked against the boundary-inserted form AND the plain
    // lowered text: "free money" catches "FreeMoney" via the former, while
    // "freemoney" still catches the literal "FreeMoney" via the latter.
    let lowered_raw = text.to_lowercase();

    let mut hits: Vec<String> = Vec::new();
    for keyword in &checks.blocked_keywords {
        let needle = keyword.to_lowercase();
        if lowered.contains(&needle) || lowered_raw.contains(&needle) {
            hits.push(format!("keyword:{keyword}"));
        }
    }
    for pattern in &checks.blocked_regex {
        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(regex) => {
                if regex.is_match(&normalized) {
                    hits.push(format!("regex:{pattern}"));
                }
            }
            // An unparseable pattern is a policy authoring mistake; surface
            // it as a hit so it cannot silently disable a rule.
            Err(_) => hits.push(format!("regex_error:{pattern}")),
        }
    }

    let flagged = !hits.is_empty();
    let should_block = flagged && (strict || checks.action == LegalAction::Block);

    let mut violations = Vec::new();
    if flagged {
        violations.push(format!(
            "Legal content matched blocked rules: {}",
            hits.join("; ")
        ));
    }

    LegalCheckResult {
        passed: !should_block,
        action: checks.action,
        flagged,
        should_block,
        hits,
        warnings: Vec::new(),
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{LegalChecks, LegalLocaleOverride};

    fn policy_with(keywords: &[&str], regexes: &[&str], action: LegalAction) -> LegalPolicy {
        LegalPolicy {
            version: 1,
            default_action: action,
            checks: LegalChecks {
                blocked_keywords: keywords.iter().map(|s| s.to_string()).collect(),
                blocked_regex: regexes.iter().map(|s| s.to_string()).collect(),
            },
            locale_overrides: Default::default(),
        }
    }

    #[test]
    fn clean_text_passes() {
        let policy = policy_with(&["scam"], &[], LegalAction::Block);
        let result = evaluate_legal_text("A perfectly fine headline", "en", &policy, false);
        assert!(result.passed);
        assert!(!result.flagged);
        assert!(result.hits.is_empty());
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let policy = policy_with(&["freemoney"], &[], LegalAction::Block);
        let result = evaluate_legal_text("Get FREEMONEY now", "en", &policy, false);
        assert!(result.flagged);
        assert!(result.should_block);
        assert_eq!(result.hits, vec!["keyword:freemoney"]);
    }

    #[test]
    fn keyword_matches_across_internal_case_boundary() {
        let policy = policy_with(&["freemoney"], &[], LegalAction::Block);
        let result = evaluate_legal_text("Claim your FreeMoney today", "en", &policy, false);
        assert!(result.should_block, "hits: {:?}", result.hits);
    }

    #[test]
    fn separated_keyword_catches_concatenated_obfuscation() {
        let policy = policy_with(&["free money"], &[], LegalAction::Block);
        let result = evaluate_legal_text("Claim your FreeMoney today", "en", &policy, false);
        assert!(result.flagged, "hits: {:?}", result.hits);
    }

    #[test]
    fn warn_action_flags_without_blocking() {
        let policy = policy_with(&["gamble"], &[], LegalAction::Warn);
        let result = evaluate_legal_text("gamble responsibly", "en", &policy, false);
        assert!(result.flagged);
        assert!(!result.should_block);
        assert!(result.passed);
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn strict_mode_escalates_warn_to_block() {
        let policy = policy_with(&["gamble"], &[], LegalAction::Warn);
        let result = evaluate_legal_text("gamble responsibly", "en", &policy, true);
        assert!(result.should_block);
        assert!(!result.passed);
    }

    #[test]
    fn regex_matches_case_insensitively() {
        let policy = policy_with(&[], &[r"\bwin\s+big\b"], LegalAction::Block);
        let result = evaluate_legal_text("WIN BIG tonight", "en", &policy, false);
        assert!(result.should_block);
        assert_eq!(result.hits, vec![format!("regex:{}", r"\bwin\s+big\b")]);
    }

    #[test]
    fn invalid_regex_is_reported_as_hit() {
        let policy = policy_with(&[], &["("], LegalAction::Warn);
        let result = evaluate_legal_text("anything", "en", &policy, false);
        assert_eq!(result.hits, vec!["regex_error:("]);
        assert!(result.flagged);
    }

    #[test]
    fn locale_override_is_additive() {
        let mut policy = policy_with(&["x"], &[], LegalAction::Block);
        policy.locale_overrides.insert(
            "es".to_string(),
            LegalLocaleOverride {
                blocked_keywords: vec!["y".to_string()],
                ..Default::default()
            },
        );

        let es_x = evaluate_legal_text("contains x here", "es", &policy, false);
        let es_y = evaluate_legal_text("contains y here", "es", &policy, false);
        let en_y = evaluate_legal_text("contains y here", "en", &policy, false);

        assert!(es_x.flagged, "global keyword applies under the override");
        assert!(es_y.flagged, "override keyword applies for its locale");
        assert!(!en_y.flagged, "override keyword does not leak to en");
    }

    #[test]
    fn region_locale_falls_back_to_language_override() {
        let mut policy = policy_with(&[], &[], LegalAction::Warn);
        policy.locale_overrides.insert(
            "pt".to_string(),
            LegalLocaleOverride {
                blocked_keywords: vec!["gratis".to_string()],
                ..Default::default()
            },
        );
        let result = evaluate_legal_text("tudo gratis", "pt-BR", &policy, false);
        assert!(result.flagged);
    }

    #[test]
    fn locale_override_action_decides_blocking() {
        let mut policy = policy_with(&["x"], &[], LegalAction::Warn);
        policy.locale_overrides.insert(
            "es".to_string(),
            LegalLocaleOverride {
                default_action: Some(LegalAction::Block),
                ..Default::default()
            },
        );
        let es = evaluate_legal_text("x marks the spot", "es", &policy, false);
        let en = evaluate_legal_text("x marks the spot", "en", &policy, false);
        assert!(es.should_block);
        assert!(!en.should_block);
    }
}

//! Heuristic fraud-risk scoring over free text.
//!
//! Two indicator families, held as immutable module data so new indicators
//! are added here and nowhere else: literal phrases matched as
//! case-insensitive substrings, and structural patterns matched as regexes.
//! The score is an ordinal ranking signal, not a probability.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Literal high-risk phrases, lowercase. English first, then Indonesian.
pub const RISK_PHRASES: &[&str] = &[
    // English
    "scam",
    "phishing",
    "smishing",
    "spoof",
    "giveaway",
    "free iphone",
    "airdrop",
    "binary option",
    "forex signal",
    "win cash",
    "win money",
    "win prize",
    "verification code",
    "one-time password",
    "otp code",
    "kyc",
    "double your money",
    "guaranteed profit",
    // Indonesian
    "penipuan",
    "modus",
    "phising",
    "hadiah gratis",
    "promo gratis",
    "bagi-bagi",
    "bagi bagi",
    "klik link",
    "link di bio",
    "tautan di bio",
    "transfer dulu",
    "deposit dulu",
    "saldo bonus",
    "langsung cair",
    "kode otp",
    "rekening penipu",
];

/// Structural patterns, applied to lowercased text.
pub static RISK_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            // US-style with separators, or Indonesian mobile (+628.. / 08..).
            "phone",
            Regex::new(r"\b(?:\+62|0)8\d{2}[-.\s]?\d{3,4}[-.\s]?\d{3,5}\b|\b\d{3}[-.\s]\d{3}[-.\s]\d{4}\b")
                .expect("valid regex"),
        ),
        (
            // ETH hex, bech32, and a lowercase base58 approximation.
            "wallet",
            Regex::new(r"\b(?:0x[a-f0-9]{40}|bc1[a-z0-9]{11,71}|[13][a-km-z1-9]{25,34})\b")
                .expect("valid regex"),
        ),
        (
            "imperative",
            Regex::new(
                r"\b(?:click|tap|klik)\s+(?:the\s+|this\s+)?(?:link|tautan|here|disini|di\s?sini)\b|\b(?:verify|verifikasi|claim|klaim)\s+(?:your\s+)?(?:account|akun|prize|reward|hadiah|bonus|wallet)\b",
            )
            .expect("valid regex"),
        ),
    ]
});

/// High-confidence fraud phrases. Any one of them present adds
/// [`AMPLIFIER_BONUS`] to the score, once.
pub const AMPLIFIER_PHRASES: &[&str] = &[
    "send money first",
    "seed phrase",
    "private key",
    "recovery phrase",
    "processing fee",
    "kirim uang dulu",
    "biaya admin dulu",
];

/// One-shot score bonus when an amplifier phrase is present. Hand-tuned.
pub const AMPLIFIER_BONUS: u32 = 2;

/// Report flagging thresholds (inclusive). Hand-tuned, kept configurable
/// here rather than derived.
pub const RISK_FLAG_HIGH: u32 = 3;
pub const RISK_FLAG_MEDIUM: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskAssessment {
    pub score: u32,
    /// Distinct matched indicators, first-occurrence order.
    pub matches: Vec<String>,
}

/// Score a block of free text. Deterministic: the same input always yields
/// the same `(score, matches)`. No text scores zero with no matches.
pub fn score(text: Option<&str>) -> RiskAssessment {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return RiskAssessment::default();
    };
    let lowered = text.to_lowercase();

    let mut seen: HashSet<String> = HashSet::new();
    let mut matches: Vec<String> = Vec::new();

    for phrase in RISK_PHRASES {
        if lowered.contains(phrase) && seen.insert((*phrase).to_string()) {
            matches.push((*phrase).to_string());
        }
    }

    for (_label, re) in RISK_PATTERNS.iter() {
        for m in re.find_iter(&lowered) {
            let hit = m.as_str().to_string();
            if seen.insert(hit.clone()) {
                matches.push(hit);
            }
        }
    }

    let mut score = matches.len() as u32;
    if AMPLIFIER_PHRASES.iter().any(|p| lowered.contains(p)) {
        score += AMPLIFIER_BONUS;
    }

    RiskAssessment { score, matches }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_scores_zero() {
        let a = score(Some(""));
        assert_eq!(a.score, 0);
        assert!(a.matches.is_empty());
        assert_eq!(score(None), RiskAssessment::default());
    }

    #[test]
    fn deterministic_across_calls() {
        let text = "GIVEAWAY! klik link di bio, transfer dulu ya";
        let a = score(Some(text));
        let b = score(Some(text));
        assert_eq!(a, b);
        assert!(a.score >= 3);
    }

    #[test]
    fn case_insensitive_substring_match() {
        let a = score(Some("Beware of PHISHING attempts"));
        assert_eq!(a.matches, vec!["phishing"]);
        assert_eq!(a.score, 1);
    }

    #[test]
    fn matches_deduplicated_first_occurrence() {
        let a = score(Some("penipuan here, penipuan there, then modus"));
        assert_eq!(a.matches, vec!["penipuan", "modus"]);
        assert_eq!(a.score, 2);
    }

    #[test]
    fn phone_pattern_matches() {
        let a = score(Some("hubungi 0812-3456-7890 sekarang"));
        assert_eq!(a.score, 1);
        assert_eq!(a.matches, vec!["0812-3456-7890"]);
    }

    #[test]
    fn wallet_pattern_matches() {
        let a = score(Some(
            "send to 0x52908400098527886e0f7030069857d2e4169ee7 now",
        ));
        assert_eq!(a.score, 1);
    }

    #[test]
    fn imperative_pattern_matches() {
        let a = score(Some("please Click the link below"));
        assert_eq!(a.matches, vec!["click the link"]);
    }

    #[test]
    fn amplifier_adds_exactly_two() {
        let base = score(Some("giveaway time"));
        assert_eq!(base.score, 1);

        let amplified = score(Some("giveaway time, send money first"));
        assert_eq!(amplified.score, base.score + AMPLIFIER_BONUS);
        // The amplifier itself is not an indicator match.
        assert_eq!(amplified.matches, vec!["giveaway"]);
    }

    #[test]
    fn amplifier_applies_once() {
        let a = score(Some("seed phrase and private key and processing fee"));
        assert_eq!(a.score, AMPLIFIER_BONUS);
        assert!(a.matches.is_empty());
    }

    #[test]
    fn plain_text_scores_zero() {
        let a = score(Some("cooking pasta with my grandmother on sunday"));
        assert_eq!(a.score, 0);
        assert!(a.matches.is_empty());
    }
}

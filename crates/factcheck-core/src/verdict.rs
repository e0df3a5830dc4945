use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static VERDICT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(verified|misleading|unverifiable|false)\b")
        .expect("verdict pattern must compile")
});

static LABELLED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:verdict|conclusion)\W{0,6}(verified|misleading|unverifiable|false)\b")
        .expect("labelled verdict pattern must compile")
});

/// Verdict labels the Analyst is asked to use.
///
/// The label is requested only through prompt wording. Responses carry the
/// Analyst's text untouched; detection is used for log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Verified,
    Misleading,
    Unverifiable,
    False,
}

impl Verdict {
    pub const ALL: [Verdict; 4] = [
        Verdict::Verified,
        Verdict::Misleading,
        Verdict::Unverifiable,
        Verdict::False,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Verified => "Verified",
            Verdict::Misleading => "Misleading",
            Verdict::Unverifiable => "Unverifiable",
            Verdict::False => "False",
        }
    }

    /// Verdict named after a `Verdict:` or `Conclusion:` label, otherwise the
    /// first verdict keyword appearing in `text`.
    pub fn detect(text: &str) -> Option<Verdict> {
        let keyword = match LABELLED_PATTERN.captures(text) {
            Some(captures) => captures.get(1)?,
            None => VERDICT_PATTERN.find(text)?,
        };
        Self::from_keyword(keyword.as_str())
    }

    fn from_keyword(keyword: &str) -> Option<Verdict> {
        match keyword.to_ascii_lowercase().as_str() {
            "verified" => Some(Verdict::Verified),
            "misleading" => Some(Verdict::Misleading),
            "unverifiable" => Some(Verdict::Unverifiable),
            "false" => Some(Verdict::False),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Identifier casing checks and conversion.
//!
//! Leading and trailing `_`/`$` are treated as decoration: `_private_helper`
//! is snake_case, `__init__` has the core `init`. Conversions keep the
//! decoration intact.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CaseStyle {
    #[serde(rename = "snake_case")]
    Snake,
    #[serde(rename = "camelCase")]
    Camel,
    #[serde(rename = "PascalCase")]
    Pascal,
    #[serde(rename = "UPPER_CASE")]
    UpperSnake,
}

impl CaseStyle {
    pub const ALL: [CaseStyle; 4] = [
        CaseStyle::Snake,
        CaseStyle::Camel,
        CaseStyle::Pascal,
        CaseStyle::UpperSnake,
    ];

    /// Accepts the canonical names plus common spellings
    /// (`UPPER_SNAKE`, `SCREAMING_SNAKE_CASE`, `snake`, `pascal`).
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "snakecase" | "snake" => Some(CaseStyle::Snake),
            "camelcase" | "camel" => Some(CaseStyle::Camel),
            "pascalcase" | "pascal" => Some(CaseStyle::Pascal),
            "uppercase" | "upper" | "uppersnake" | "uppersnakecase" | "screamingsnakecase"
            | "constantcase" => Some(CaseStyle::UpperSnake),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStyle::Snake => "snake_case",
            CaseStyle::Camel => "camelCase",
            CaseStyle::Pascal => "PascalCase",
            CaseStyle::UpperSnake => "UPPER_CASE",
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        let core = split_decoration(name).1;
        if core.is_empty() {
            return true;
        }
        match self {
            CaseStyle::Snake => {
                !core.contains("__")
                    && core
                        .chars()
                        .all(|c| c == '_' || (c.is_alphanumeric() && !c.is_uppercase()))
            }
            CaseStyle::UpperSnake => {
                !core.contains("__")
                    && core
                        .chars()
                        .all(|c| c == '_' || (c.is_alphanumeric() && !c.is_lowercase()))
            }
            CaseStyle::Camel => {
                core.chars().all(char::is_alphanumeric)
                    && core.chars().next().is_some_and(|c| !c.is_uppercase())
            }
            CaseStyle::Pascal => {
                core.chars().all(char::is_alphanumeric)
                    && core.chars().next().is_some_and(|c| !c.is_lowercase())
            }
        }
    }

    /// Re-case a name. The result always satisfies [`CaseStyle::matches`].
    pub fn convert(&self, name: &str) -> String {
        let (prefix, core, suffix) = split_decoration(name);
        let words = split_words(core);
        if words.is_empty() {
            return name.to_string();
        }
        let body = match self {
            CaseStyle::Snake => words
                .iter()
                .map(|w| w.to_lowercase())
                .collect::<Vec<_>>()
                .join("_"),
            CaseStyle::UpperSnake => words
                .iter()
                .map(|w| w.to_uppercase())
                .collect::<Vec<_>>()
                .join("_"),
            CaseStyle::Camel => words
                .iter()
                .enumerate()
                .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
                .collect(),
            CaseStyle::Pascal => words.iter().map(|w| capitalize(w)).collect(),
        };
        format!("{prefix}{body}{suffix}")
    }

    /// Most specific style a name is written in. Single lowercase words
    /// (valid snake and camel) and mixed names have no style.
    pub fn detect(name: &str) -> Option<Self> {
        let core = split_decoration(name).1;
        if !core.chars().any(char::is_alphabetic) {
            return None;
        }
        let has_upper = core.chars().any(char::is_uppercase);
        let has_lower = core.chars().any(char::is_lowercase);
        let has_underscore = core.contains('_');

        if has_upper && !has_lower && (has_underscore || core.chars().count() > 1) {
            Some(CaseStyle::UpperSnake)
        } else if !has_upper && has_underscore && CaseStyle::Snake.matches(name) {
            Some(CaseStyle::Snake)
        } else if !has_underscore && has_upper && CaseStyle::Pascal.matches(name) {
            Some(CaseStyle::Pascal)
        } else if !has_underscore && has_upper && CaseStyle::Camel.matches(name) {
            Some(CaseStyle::Camel)
        } else {
            None
        }
    }
}

impl fmt::Display for CaseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_decoration(c: char) -> bool {
    c == '_' || c == '$'
}

/// Split `__name__` into (`__`, `name`, `__`)
pub fn split_decoration(name: &str) -> (&str, &str, &str) {
    let start = name.len() - name.trim_start_matches(is_decoration).len();
    let rest = &name[start..];
    let core = rest.trim_end_matches(is_decoration);
    let suffix = &rest[core.len()..];
    (&name[..start], core, suffix)
}

/// Words of an identifier: `getHTTPResponse2` -> [get, HTTP, Response2],
/// `user_data` -> [user, data]. Digits stay with the preceding word.
pub fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    for part in name.split(|c: char| is_decoration(c) || !c.is_alphanumeric()) {
        let chars: Vec<char> = part.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            let boundary = i > 0 && c.is_uppercase() && {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                prev.is_lowercase()
                    || prev.is_numeric()
                    || (prev.is_uppercase() && next_is_lower)
            };
            if boundary && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            current.push(c);
        }
        if !current.is_empty() {
            words.push(current);
        }
    }
    words
}

/// Lowercased first word, ignoring decoration
pub fn first_word(name: &str) -> Option<String> {
    split_words(split_decoration(name).1)
        .into_iter()
        .next()
        .map(|w| w.to_lowercase())
}

/// Lowercased last word, ignoring decoration
pub fn last_word(name: &str) -> Option<String> {
    split_words(split_decoration(name).1)
        .pop()
        .map(|w| w.to_lowercase())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_basic_styles() {
        assert!(CaseStyle::Snake.matches("get_user_data"));
        assert!(CaseStyle::Snake.matches("_private_helper"));
        assert!(CaseStyle::Snake.matches("__init__"));
        assert!(!CaseStyle::Snake.matches("getUser"));
        assert!(CaseStyle::Camel.matches("getUserData"));
        assert!(!CaseStyle::Camel.matches("get_user"));
        assert!(CaseStyle::Pascal.matches("UserCard"));
        assert!(CaseStyle::Pascal.matches("T"));
        assert!(CaseStyle::UpperSnake.matches("MAX_RETRIES"));
        assert!(!CaseStyle::UpperSnake.matches("Max_Retries"));
        assert!(!CaseStyle::UpperSnake.matches("MAX__RETRIES"));
    }

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("getHTTPResponse2"), vec!["get", "HTTP", "Response2"]);
        assert_eq!(split_words("user_data"), vec!["user", "data"]);
        assert_eq!(split_words("UserCard"), vec!["User", "Card"]);
        assert_eq!(split_words("v2Api"), vec!["v2", "Api"]);
    }

    #[test]
    fn test_convert_keeps_decoration() {
        assert_eq!(CaseStyle::Snake.convert("_getUser"), "_get_user");
        assert_eq!(CaseStyle::Camel.convert("fetch_user_data"), "fetchUserData");
        assert_eq!(CaseStyle::Pascal.convert("user_card"), "UserCard");
        assert_eq!(CaseStyle::UpperSnake.convert("maxRetries"), "MAX_RETRIES");
        assert_eq!(CaseStyle::Snake.convert("HTTPServer"), "http_server");
    }

    #[test]
    fn test_detect() {
        assert_eq!(CaseStyle::detect("get_user"), Some(CaseStyle::Snake));
        assert_eq!(CaseStyle::detect("getUser"), Some(CaseStyle::Camel));
        assert_eq!(CaseStyle::detect("UserCard"), Some(CaseStyle::Pascal));
        assert_eq!(CaseStyle::detect("API_URL"), Some(CaseStyle::UpperSnake));
        assert_eq!(CaseStyle::detect("T"), Some(CaseStyle::Pascal));
        assert_eq!(CaseStyle::detect("start"), None);
        assert_eq!(CaseStyle::detect("Mixed_Case"), None);
    }

    #[test]
    fn test_parse_style_names() {
        assert_eq!(CaseStyle::parse("UPPER_CASE"), Some(CaseStyle::UpperSnake));
        assert_eq!(CaseStyle::parse("UPPER_SNAKE"), Some(CaseStyle::UpperSnake));
        assert_eq!(CaseStyle::parse("snake_case"), Some(CaseStyle::Snake));
        assert_eq!(CaseStyle::parse("camelCase"), Some(CaseStyle::Camel));
        assert_eq!(CaseStyle::parse("kebab-case"), None);
    }

    #[test]
    fn test_first_and_last_word() {
        assert_eq!(first_word("_createUser").as_deref(), Some("create"));
        assert_eq!(last_word("success_response").as_deref(), Some("response"));
        assert_eq!(first_word("__"), None);
    }
}

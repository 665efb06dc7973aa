//! Verb taxonomy and verb-prefix suggestions.

use super::casing::{first_word, last_word, split_decoration, CaseStyle};
use crate::core::{ContextLabel, Language};
use std::collections::BTreeSet;

/// Verbs accepted as a function-name prefix when nothing is configured
pub const DEFAULT_VERBS: &[&str] = &[
    "get", "set", "create", "update", "delete", "remove", "add", "process", "validate", "check",
    "verify", "ensure", "handle", "parse", "format", "convert", "transform", "build", "generate",
    "load", "save", "read", "write", "fetch", "send", "receive", "start", "stop", "run",
    "execute", "perform", "calculate", "compute", "is", "has", "can", "should", "will", "must",
    "on", "init", "initialize", "setup", "reset", "clear", "find", "list", "search", "query",
    "register", "apply", "render", "use", "to", "open", "close", "connect", "disconnect",
    "extract", "insert", "merge", "normalize", "sanitize", "serialize", "deserialize", "encode",
    "decode", "resolve", "submit", "show", "hide", "print", "log", "map", "filter", "sort",
    "make", "collect", "prepare", "refresh", "upload", "download", "import", "export", "track",
    "notify", "emit", "dispatch", "schedule", "retry", "wait", "cleanup", "compare",
    "count", "define", "describe", "detect", "enable", "disable", "mark", "match", "install",
    "configure", "analyze", "report", "learn", "migrate", "rollback", "backup", "restore",
];

/// Additional verbs recognised when learning a taxonomy from a codebase
const LEXICON_EXTRAS: &[&str] = &[
    "sync", "toggle", "mount", "unmount", "bind", "pick", "wrap", "unwrap", "flush", "drain",
    "spawn", "poll", "ping", "seed", "deploy", "select", "split", "join", "copy", "move",
    "append", "push", "pop", "peek", "replace", "strip", "trim", "scan", "walk", "visit",
    "assert", "raise", "throw", "catch", "try", "lock", "unlock", "acquire", "release", "cache",
    "invalidate", "authenticate", "authorize", "login", "logout", "signup", "subscribe",
    "unsubscribe", "publish", "broadcast", "consume", "produce", "fill", "attach", "detach",
    "allow", "deny", "accept", "reject", "approve", "cancel", "abort", "finish", "complete",
    "begin", "end", "test", "mock", "patch", "stub", "group", "aggregate", "summarize",
];

/// Last words that read as nouns a getter would return
const NOUN_SUFFIXES: &[&str] = &[
    "data", "info", "list", "count", "total", "name", "names", "id", "ids", "value", "values",
    "config", "settings", "status", "state", "details", "summary", "items", "size", "length",
    "path", "url", "type", "key", "keys", "index", "version", "options", "user", "users",
];

pub fn default_verbs() -> BTreeSet<String> {
    DEFAULT_VERBS.iter().map(|v| v.to_string()).collect()
}

/// Whether a word is a verb known to the learner
pub fn is_lexicon_verb(word: &str) -> bool {
    let word = word.to_lowercase();
    DEFAULT_VERBS.contains(&word.as_str()) || LEXICON_EXTRAS.contains(&word.as_str())
}

/// Whether the first word of `name` is in `verbs`
pub fn has_verb_prefix(name: &str, verbs: &BTreeSet<String>) -> bool {
    first_word(name).is_some_and(|word| verbs.contains(&word))
}

/// Pick a generic verb for a name that lacks one. The result is always a
/// member of `verbs` when `verbs` is non-empty.
pub fn choose_verb(
    name: &str,
    docstring: Option<&str>,
    label: ContextLabel,
    verbs: &BTreeSet<String>,
) -> Option<String> {
    let mut candidates: Vec<&str> = Vec::new();
    if let Some(verb) = docstring.and_then(verb_from_docstring) {
        candidates.push(verb);
    }
    if label == ContextLabel::FrameworkHandler {
        candidates.push("handle");
    }
    if last_word(name).is_some_and(|w| NOUN_SUFFIXES.contains(&w.as_str())) {
        candidates.push("get");
    }
    candidates.extend(["process", "get", "handle"]);

    candidates
        .into_iter()
        .find(|verb| verbs.contains(*verb))
        .map(str::to_string)
        .or_else(|| verbs.iter().next().cloned())
}

fn verb_from_docstring(docstring: &str) -> Option<&'static str> {
    let lowered = docstring.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();
    let mentions = |stems: &[&str]| words.iter().any(|w| stems.iter().any(|s| w.starts_with(s)));

    if mentions(&["return", "get"]) {
        Some("get")
    } else if mentions(&["create", "build"]) {
        Some("create")
    } else if mentions(&["check", "validat", "verif"]) {
        Some("validate")
    } else {
        None
    }
}

/// Prefix `name` with `verb`, keeping the name's own casing:
/// `user_data` -> `get_user_data`, `userData` -> `getUserData`.
pub fn prepend_verb(verb: &str, name: &str, language: Language) -> String {
    let (prefix, core, suffix) = split_decoration(name);
    if core.is_empty() {
        return name.to_string();
    }
    let fallback = if language.is_python() {
        CaseStyle::Snake
    } else {
        CaseStyle::Camel
    };
    let style = CaseStyle::detect(name).unwrap_or(fallback);
    let starts_with_letter = core.chars().next().is_some_and(char::is_alphabetic);

    let body = match style {
        CaseStyle::Snake => format!("{verb}_{core}"),
        CaseStyle::UpperSnake => format!("{}_{core}", verb.to_uppercase()),
        CaseStyle::Camel | CaseStyle::Pascal if !starts_with_letter => format!("{verb}_{core}"),
        CaseStyle::Camel => format!("{verb}{}", upper_first(core)),
        CaseStyle::Pascal => format!("{}{core}", upper_first(verb)),
    };
    format!("{prefix}{body}{suffix}")
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

//! Naming rules and the rule set they live in.
//!
//! A rule occupies a slot made of its category, language, declaration kind
//! and the context labels it covers. Two rules of one category may never
//! cover the same label for the same kind and language, so every
//! declaration sees at most one verb-prefix rule and one casing rule.

use super::casing::CaseStyle;
use super::verbs::default_verbs;
use crate::core::{ContextLabel, Declaration, DeclarationKind, Error, Language, Result, Severity};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleCategory {
    VerbPrefix,
    Casing,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::VerbPrefix => write!(f, "verb-prefix"),
            RuleCategory::Casing => write!(f, "casing"),
        }
    }
}

/// Which context labels a rule applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSelector {
    Any,
    Labels(BTreeSet<ContextLabel>),
}

impl ContextSelector {
    pub fn only(label: ContextLabel) -> Self {
        ContextSelector::Labels([label].into_iter().collect())
    }

    pub fn labels<I: IntoIterator<Item = ContextLabel>>(labels: I) -> Self {
        ContextSelector::Labels(labels.into_iter().collect())
    }

    pub fn matches(&self, label: ContextLabel) -> bool {
        match self {
            ContextSelector::Any => true,
            ContextSelector::Labels(labels) => labels.contains(&label),
        }
    }

    fn overlaps(&self, other: &ContextSelector) -> bool {
        match (self, other) {
            (ContextSelector::Labels(a), ContextSelector::Labels(b)) => !a.is_disjoint(b),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    Any,
    Function,
    Assignment,
}

impl KindFilter {
    pub fn matches(&self, kind: DeclarationKind) -> bool {
        match self {
            KindFilter::Any => true,
            KindFilter::Function => kind == DeclarationKind::Function,
            KindFilter::Assignment => kind == DeclarationKind::Assignment,
        }
    }

    fn overlaps(&self, other: &KindFilter) -> bool {
        match (self, other) {
            (KindFilter::Any, _) | (_, KindFilter::Any) => true,
            (a, b) => a == b,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// First word must be one of `verbs` (lowercase)
    VerbPrefix { verbs: BTreeSet<String> },
    /// Name must be written in one of `accepted`; the first is preferred
    Casing { accepted: Vec<CaseStyle> },
}

impl Requirement {
    pub fn category(&self) -> RuleCategory {
        match self {
            Requirement::VerbPrefix { .. } => RuleCategory::VerbPrefix,
            Requirement::Casing { .. } => RuleCategory::Casing,
        }
    }
}

/// Literal names and compiled regexes exempted from a rule
#[derive(Debug, Clone, Default)]
pub struct ExceptionSet {
    names: BTreeSet<String>,
    patterns: Vec<Regex>,
}

impl ExceptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Compile and add patterns. A bad regex is a configuration error.
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let regex = Regex::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e))?;
            self.patterns.push(regex);
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.patterns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Literal name match, or a pattern matching the name or the
    /// `name = value` signature of an assignment
    pub fn excepts(&self, decl: &Declaration) -> bool {
        if self.names.contains(&decl.name) {
            return true;
        }
        if self.patterns.is_empty() {
            return false;
        }
        let signature = decl.signature();
        self.patterns
            .iter()
            .any(|p| p.is_match(&decl.name) || p.is_match(&signature))
    }
}

impl PartialEq for ExceptionSet {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
            && self.patterns.len() == other.patterns.len()
            && self
                .patterns
                .iter()
                .zip(&other.patterns)
                .all(|(a, b)| a.as_str() == b.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamingRule {
    /// Configuration path of the rule, e.g. `functions.require_verb_prefix`
    pub id: String,
    pub applies_to: ContextSelector,
    pub kind: KindFilter,
    /// `None` applies to every language
    pub language: Option<Language>,
    pub requirement: Requirement,
    pub exceptions: ExceptionSet,
    pub severity: Severity,
}

impl NamingRule {
    pub fn verb_prefix(
        id: impl Into<String>,
        applies_to: ContextSelector,
        language: Option<Language>,
        verbs: BTreeSet<String>,
    ) -> Self {
        Self {
            id: id.into(),
            applies_to,
            kind: KindFilter::Function,
            language,
            requirement: Requirement::VerbPrefix { verbs },
            exceptions: ExceptionSet::new(),
            severity: Severity::default(),
        }
    }

    pub fn casing(
        id: impl Into<String>,
        applies_to: ContextSelector,
        kind: KindFilter,
        language: Option<Language>,
        accepted: Vec<CaseStyle>,
    ) -> Self {
        Self {
            id: id.into(),
            applies_to,
            kind,
            language,
            requirement: Requirement::Casing { accepted },
            exceptions: ExceptionSet::new(),
            severity: Severity::default(),
        }
    }

    pub fn with_exceptions(mut self, exceptions: ExceptionSet) -> Self {
        self.exceptions = exceptions;
        self
    }

    pub fn category(&self) -> RuleCategory {
        self.requirement.category()
    }

    pub fn applies(&self, decl: &Declaration, label: ContextLabel) -> bool {
        self.language.is_none_or(|l| l == decl.language)
            && self.kind.matches(decl.kind)
            && self.applies_to.matches(label)
    }

    fn shares_slot_with(&self, other: &NamingRule) -> bool {
        let languages_overlap = match (self.language, other.language) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        self.category() == other.category()
            && languages_overlap
            && self.kind.overlaps(&other.kind)
            && self.applies_to.overlaps(&other.applies_to)
    }
}

/// Names exempted from every rule: dunders, conventional entry points and
/// framework callbacks, variance-suffixed TypeVars, placeholder names with
/// no word in them (`_`, `$`)
const GLOBAL_EXCEPTION_NAMES: &[&str] = &[
    "main",
    "setUp",
    "tearDown",
    "setUpClass",
    "tearDownClass",
    "setUpModule",
    "tearDownModule",
    "constructor",
    "render",
    "toString",
    "toJSON",
    "valueOf",
];

const GLOBAL_EXCEPTION_PATTERNS: &[&str] = &[
    r"^__\w+__$",
    r"^_*[A-Za-z0-9]+_(?:co|contra)$",
    r"^[_$]+$",
];

/// The complete naming grammar for a run
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    rules: Vec<NamingRule>,
    exceptions: ExceptionSet,
    function_exceptions: BTreeSet<String>,
    assignment_exceptions: BTreeSet<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl RuleSet {
    /// No rules, only the built-in global exceptions
    pub fn empty() -> Self {
        let exceptions = ExceptionSet::new()
            .with_names(GLOBAL_EXCEPTION_NAMES.iter().copied())
            .with_patterns(GLOBAL_EXCEPTION_PATTERNS)
            .unwrap_or_default();
        Self {
            rules: Vec::new(),
            exceptions,
            function_exceptions: BTreeSet::new(),
            assignment_exceptions: BTreeSet::new(),
        }
    }

    /// Built-in grammar for every supported language
    pub fn defaults() -> Self {
        let mut set = Self::empty();
        for language in Language::ALL {
            set.rules.extend(default_rules(language));
        }
        set
    }

    pub fn rules(&self) -> &[NamingRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: &str, language: Language) -> Option<&NamingRule> {
        self.rules
            .iter()
            .find(|r| r.id == id && r.language.is_none_or(|l| l == language))
    }

    /// Add a rule. Fails if another rule already covers one of its slots.
    pub fn add(&mut self, rule: NamingRule) -> Result<()> {
        if let Some(existing) = self.rules.iter().find(|r| r.shares_slot_with(&rule)) {
            return Err(Error::configuration(format!(
                "rule '{}' conflicts with rule '{}' for the same {} slot",
                rule.id,
                existing.id,
                rule.category()
            )));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Replace the rule with the same id and language, or add it
    pub fn set(&mut self, rule: NamingRule) -> Result<()> {
        self.remove(&rule.id, rule.language);
        self.add(rule)
    }

    pub fn remove(&mut self, id: &str, language: Option<Language>) {
        self.rules
            .retain(|r| !(r.id == id && r.language == language));
    }

    pub fn add_global_patterns<I, S>(&mut self, patterns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exceptions = std::mem::take(&mut self.exceptions).with_patterns(patterns)?;
        Ok(())
    }

    pub fn add_function_exceptions<I: IntoIterator<Item = String>>(&mut self, names: I) {
        self.function_exceptions.extend(names);
    }

    pub fn add_assignment_exceptions<I: IntoIterator<Item = String>>(&mut self, names: I) {
        self.assignment_exceptions.extend(names);
    }

    pub fn set_severity(&mut self, severity: Severity) {
        for rule in &mut self.rules {
            rule.severity = severity;
        }
    }

    /// Exempt from every rule regardless of label
    pub fn is_globally_excepted(&self, decl: &Declaration) -> bool {
        let by_kind = match decl.kind {
            DeclarationKind::Function => &self.function_exceptions,
            DeclarationKind::Assignment => &self.assignment_exceptions,
        };
        by_kind.contains(&decl.name) || self.exceptions.excepts(decl)
    }

    /// Rules that apply to a declaration, verb-prefix rules first
    pub fn applicable<'a>(
        &'a self,
        decl: &'a Declaration,
        label: ContextLabel,
    ) -> impl Iterator<Item = &'a NamingRule> + 'a {
        let verb = self
            .rules
            .iter()
            .filter(move |r| r.category() == RuleCategory::VerbPrefix && r.applies(decl, label));
        let casing = self
            .rules
            .iter()
            .filter(move |r| r.category() == RuleCategory::Casing && r.applies(decl, label));
        verb.chain(casing)
    }
}

/// Default rules for one language
pub fn default_rules(language: Language) -> Vec<NamingRule> {
    use CaseStyle::*;
    use ContextLabel::*;

    let python = language.is_python();
    let lang = Some(language);
    let function_style = if python { vec![Snake] } else { vec![Camel] };
    let variable_styles = if python {
        vec![Snake, UpperSnake]
    } else {
        vec![Camel, Pascal, UpperSnake]
    };
    let instance_styles = if python {
        vec![Snake]
    } else {
        vec![Camel, Pascal]
    };

    vec![
        NamingRule::verb_prefix(
            "functions.require_verb_prefix",
            ContextSelector::only(RegularFunction),
            lang,
            default_verbs(),
        ),
        NamingRule::casing(
            "functions.style",
            ContextSelector::labels([RegularFunction, CliCommand, TestFunction, ResponseFactory]),
            KindFilter::Function,
            lang,
            function_style,
        ),
        NamingRule::casing(
            "variables.style",
            ContextSelector::only(RegularFunction),
            KindFilter::Assignment,
            lang,
            variable_styles,
        ),
        NamingRule::casing(
            "constants.style",
            ContextSelector::only(Constant),
            KindFilter::Assignment,
            lang,
            vec![UpperSnake],
        ),
        NamingRule::casing(
            "typevars.style",
            ContextSelector::only(TypeVar),
            KindFilter::Assignment,
            lang,
            vec![Pascal],
        ),
        NamingRule::casing(
            "singletons.style",
            ContextSelector::only(Singleton),
            KindFilter::Assignment,
            lang,
            instance_styles.clone(),
        ),
        NamingRule::casing(
            "loggers.style",
            ContextSelector::only(LoggerInstance),
            KindFilter::Assignment,
            lang,
            instance_styles,
        ),
    ]
}

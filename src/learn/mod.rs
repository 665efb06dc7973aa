//! Pattern learning: infer a starting configuration from an existing
//! codebase.
//!
//! The learner does not judge names. It counts what it sees per context
//! label and lists every name the built-in grammar would flag as an
//! exception, so adopting the learned file reports nothing on the code it
//! was learned from.

use crate::analysis::framework_patterns::{CliStyle, Framework, FrameworkDetector};
use crate::analysis::{classify, classify_project, FrameworkProfile, SkippedFile};
use crate::config::{
    CategoryRules, ContextExceptions, FrameworksConfig, GrammarOpsConfig, ProjectConfig,
    StyleSpec, VerbExceptions, VerbPrefixConfig,
};
use crate::core::{
    CancellationToken, ContextLabel, Declaration, Error, Language, Result, SourceFile,
};
use crate::naming::casing::{first_word, split_words};
use crate::naming::verbs::is_lexicon_verb;
use crate::naming::{evaluate_all, CaseStyle, RuleSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Default output file of `learn`
pub const LEARNED_CONFIG_FILE: &str = ".grammarops.learned.json";

const CONFIG_VERSION: &str = "2.0.0";
const EXAMPLES_KEPT: usize = 3;
pub const GRADUAL_ADOPTION_THRESHOLD: usize = 50;

/// Casing bucket for names that fit no single style (`start`, `get_HTTP`)
const LOWERCASE_WORD: &str = "lowercase";
const MIXED: &str = "mixed";

/// Frequency tables for one context label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextStats {
    pub count: usize,
    pub casing: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_casing: Option<String>,
    /// First words of function names
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub prefixes: BTreeMap<String, usize>,
    pub examples: Vec<String>,
}

impl ContextStats {
    fn observe(&mut self, decl: &Declaration) {
        self.count += 1;
        *self.casing.entry(casing_bucket(&decl.name)).or_insert(0) += 1;
        if decl.is_function() {
            if let Some(word) = first_word(&decl.name) {
                *self.prefixes.entry(word).or_insert(0) += 1;
            }
        }
        if self.examples.len() < EXAMPLES_KEPT && !self.examples.contains(&decl.name) {
            self.examples.push(decl.name.clone());
        }
    }

    /// Most frequent real style; ties go to the earlier style in
    /// [`CaseStyle::ALL`]
    fn finish(&mut self) {
        let mut best: Option<(CaseStyle, usize)> = None;
        for style in CaseStyle::ALL {
            let count = self.casing.get(style.as_str()).copied().unwrap_or(0);
            if count > 0 && best.is_none_or(|(_, top)| count > top) {
                best = Some((style, count));
            }
        }
        self.dominant_casing = best.map(|(style, _)| style.as_str().to_string());
    }
}

fn casing_bucket(name: &str) -> String {
    match CaseStyle::detect(name) {
        Some(style) => style.as_str().to_string(),
        None if split_words(name).len() <= 1 => LOWERCASE_WORD.to_string(),
        None => MIXED.to_string(),
    }
}

/// A configuration file plus the learner-only `contexts` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearnedConfig {
    #[serde(flatten)]
    pub config: GrammarOpsConfig,
    /// Keyed by context label; labels never observed are absent
    #[serde(default)]
    pub contexts: BTreeMap<String, ContextStats>,
}

impl LearnedConfig {
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .map_err(|e| Error::file_system("failed to write learned configuration", path, e))
    }
}

/// Everything a `learn` run produced, for reporting
#[derive(Debug, Clone)]
pub struct LearnOutcome {
    pub learned: LearnedConfig,
    pub profile: FrameworkProfile,
    pub files_analyzed: usize,
    pub skipped: Vec<SkippedFile>,
    pub functions: usize,
    pub assignments: usize,
    /// CLI style backed by observed command names, if any were seen
    pub observed_cli_style: Option<CliStyle>,
}

/// Learns naming patterns from classified declarations
#[derive(Debug, Clone)]
pub struct PatternLearner {
    project_name: Option<String>,
    grammar: RuleSet,
}

impl Default for PatternLearner {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternLearner {
    pub fn new() -> Self {
        Self {
            project_name: None,
            grammar: RuleSet::defaults(),
        }
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn learn(
        &self,
        files: &[SourceFile],
        profile: FrameworkProfile,
        cancel: &CancellationToken,
    ) -> LearnOutcome {
        let project = classify_project(files, &profile, cancel);
        let declarations: Vec<&Declaration> =
            project.declarations.iter().map(|c| &c.declaration).collect();

        let observed_cli_style = learn_cli_style(&declarations, &profile);
        let profile = match observed_cli_style {
            Some(style) => profile.with_cli_style(style),
            None => profile,
        };

        let mut contexts: BTreeMap<ContextLabel, ContextStats> = BTreeMap::new();
        let mut function_exceptions = BTreeSet::new();
        let mut constant_exceptions = BTreeSet::new();
        let mut verbs: BTreeMap<Language, BTreeSet<String>> = BTreeMap::new();
        let mut languages: BTreeMap<Language, usize> = BTreeMap::new();

        for file in files {
            *languages.entry(file.language).or_insert(0) += 1;
        }

        for decl in &declarations {
            let label = classify(decl, &profile);
            contexts.entry(label).or_default().observe(decl);

            if decl.is_function() {
                if let Some(word) = first_word(&decl.name).filter(|w| is_lexicon_verb(w)) {
                    verbs.entry(decl.language).or_default().insert(word);
                }
            }

            if !evaluate_all(decl, label, &self.grammar).is_empty() {
                if decl.is_function() {
                    function_exceptions.insert(decl.name.clone());
                } else {
                    constant_exceptions.insert(decl.name.clone());
                }
            }
        }
        for stats in contexts.values_mut() {
            stats.finish();
        }

        let observed_languages: BTreeSet<Language> =
            declarations.iter().map(|d| d.language).collect();
        let cli_hint = profile.idioms.cli_style.as_str();
        let rules = observed_languages
            .iter()
            .map(|language| {
                let categories = language_rules(
                    cli_hint,
                    contexts.contains_key(&ContextLabel::ResponseFactory),
                    verbs.remove(language),
                );
                (language.key().to_string(), categories)
            })
            .collect();

        let mut config = GrammarOpsConfig {
            version: Some(CONFIG_VERSION.to_string()),
            project: ProjectConfig {
                name: self.project_name.clone(),
                project_type: Some(
                    if profile.is_empty() { "library" } else { "fullstack" }.to_string(),
                ),
                language: dominant_language(&languages).map(|l| l.key().to_string()),
            },
            frameworks: FrameworksConfig {
                auto_detect: true,
                detected: profile.frameworks.iter().map(|f| f.key().to_string()).collect(),
            },
            rules,
            ..GrammarOpsConfig::default()
        };
        config.exceptions.functions = function_exceptions.into_iter().collect();
        config.exceptions.constants = constant_exceptions.into_iter().collect();
        config.exceptions.patterns.allow = allow_patterns(&contexts, &profile);

        log::info!(
            "Learned {} contexts from {} declarations",
            contexts.len(),
            declarations.len()
        );

        let functions = declarations.iter().filter(|d| d.is_function()).count();
        LearnOutcome {
            learned: LearnedConfig {
                config,
                contexts: contexts
                    .into_iter()
                    .map(|(label, stats)| (label.as_str().to_string(), stats))
                    .collect(),
            },
            files_analyzed: project.files_analyzed,
            skipped: project.skipped,
            functions,
            assignments: declarations.len() - functions,
            observed_cli_style,
            profile,
        }
    }
}

/// Detect frameworks, then learn with default settings
pub fn learn(files: &[SourceFile]) -> LearnedConfig {
    let profile = FrameworkDetector::new().detect(files);
    PatternLearner::new()
        .learn(files, profile, &CancellationToken::new())
        .learned
}

/// `rails` when most CLI-decorated functions are single words
fn learn_cli_style(declarations: &[&Declaration], profile: &FrameworkProfile) -> Option<CliStyle> {
    let as_rails = profile.clone().with_cli_style(CliStyle::Rails);
    let commands: Vec<&&Declaration> = declarations
        .iter()
        .filter(|d| classify(d, &as_rails) == ContextLabel::CliCommand)
        .collect();
    if commands.is_empty() {
        return None;
    }
    let single_word = commands
        .iter()
        .filter(|d| split_words(&d.name).len() == 1)
        .count();
    log::debug!(
        "{} of {} CLI commands are single words",
        single_word,
        commands.len()
    );
    Some(if single_word * 2 > commands.len() {
        CliStyle::Rails
    } else {
        CliStyle::VerbNoun
    })
}

fn language_rules(
    cli_hint: &str,
    has_factories: bool,
    verbs: Option<BTreeSet<String>>,
) -> BTreeMap<String, CategoryRules> {
    let exceptions = ContextExceptions {
        cli_commands: Some(cli_hint.to_string()),
        test_functions: Some("test_prefix_only".to_string()),
        response_factories: Some(
            if has_factories { "noun_response_pattern" } else { "create_pattern" }.to_string(),
        ),
        names: Vec::new(),
    };
    let functions = CategoryRules {
        style: None,
        require_verb_prefix: Some(VerbPrefixConfig {
            enabled: true,
            exceptions: VerbExceptions::Contexts(exceptions),
            verbs: verbs.map(|v| v.into_iter().collect()),
        }),
    };
    let constants = CategoryRules {
        style: Some(StyleSpec::One(CaseStyle::UpperSnake.as_str().to_string())),
        require_verb_prefix: None,
    };
    BTreeMap::from([
        ("constants".to_string(), constants),
        ("functions".to_string(), functions),
    ])
}

/// Language with the most files; ties go to the earlier language
fn dominant_language(counts: &BTreeMap<Language, usize>) -> Option<Language> {
    let mut best: Option<(Language, usize)> = None;
    for language in Language::ALL {
        let count = counts.get(&language).copied().unwrap_or(0);
        if count > 0 && best.is_none_or(|(_, top)| count > top) {
            best = Some((language, count));
        }
    }
    best.map(|(language, _)| language)
}

fn allow_patterns(
    contexts: &BTreeMap<ContextLabel, ContextStats>,
    profile: &FrameworkProfile,
) -> Vec<String> {
    let mut patterns = Vec::new();
    if contexts.contains_key(&ContextLabel::TypeVar) {
        patterns.push(r"^[A-Z] = TypeVar\(");
    }
    if contexts.contains_key(&ContextLabel::LoggerInstance) {
        patterns.push(r"^logger = logging\.getLogger");
    }
    if profile.is_active(Framework::FastAPI) {
        patterns.push(r"^app = FastAPI\(");
        patterns.push(r"^router = APIRouter\(");
    }
    if profile.is_active(Framework::Flask) {
        patterns.push(r"^app = Flask\(");
    }
    patterns.into_iter().map(String::from).collect()
}

impl LearnOutcome {
    /// Plain-text learning report
    pub fn report(&self, project: &Path) -> String {
        let config = &self.learned.config;
        let mut lines = vec!["Pattern Learning Report".to_string(), "=".repeat(50)];

        lines.push(String::new());
        lines.push(format!("Project: {}", project.display()));
        lines.push(format!("Files analyzed: {}", self.files_analyzed));
        if !self.skipped.is_empty() {
            lines.push(format!("Files skipped: {}", self.skipped.len()));
        }
        lines.push(format!("Functions: {}", self.functions));
        lines.push(format!("Assignments: {}", self.assignments));

        lines.push(String::new());
        let frameworks: Vec<String> = self.profile.frameworks.iter().map(|f| f.to_string()).collect();
        lines.push(format!(
            "Detected Frameworks: {}",
            if frameworks.is_empty() { "none".to_string() } else { frameworks.join(", ") }
        ));

        lines.push(String::new());
        lines.push("Context Patterns:".to_string());
        for (label, stats) in &self.learned.contexts {
            let casing = stats
                .dominant_casing
                .as_deref()
                .map(|c| format!(" (mostly {c})"))
                .unwrap_or_default();
            lines.push(format!("  {label}: {}{casing}", stats.count));
            for example in &stats.examples {
                lines.push(format!("    - {example}"));
            }
        }

        lines.push(String::new());
        lines.push("Learned Exceptions:".to_string());
        lines.push(format!("  Functions: {}", config.exceptions.functions.len()));
        lines.push(format!("  Constants: {}", config.exceptions.constants.len()));
        lines.push(format!(
            "  Allow patterns: {}",
            config.exceptions.patterns.allow.len()
        ));

        lines.push(String::new());
        lines.push("Recommendations:".to_string());
        if let Some(style) = self.observed_cli_style {
            lines.push(format!("  - Use {} style for CLI commands", style.as_str()));
        }
        if self.learned.contexts.contains_key(ContextLabel::TypeVar.as_str()) {
            lines.push("  - Allow TypeVar naming conventions".to_string());
        }
        if config.exceptions.functions.len() > GRADUAL_ADOPTION_THRESHOLD {
            lines.push("  - Consider gradual adoption for function naming".to_string());
        }
        lines.push(format!(
            "  - Rename {LEARNED_CONFIG_FILE} to .grammarops.config.json to adopt these rules"
        ));

        lines.join("\n")
    }
}

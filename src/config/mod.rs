//! Configuration file model (`.grammarops.config.json`).
//!
//! Every section is `#[serde(default)]`: missing keys take built-in
//! defaults and unknown keys are ignored. Names that select behaviour
//! (languages, rule categories, styles, frameworks) are validated when the
//! rule set and framework profile are built.

pub mod loader;
pub mod rules;

pub use loader::{load_config, LoadedConfig, CONFIG_FILE_NAMES};
pub use rules::build_rule_set;

use crate::analysis::framework_patterns::{
    CliStyle, Framework, FrameworkDetector, FrameworkProfile,
};
use crate::core::{Error, Result, SourceFile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarOpsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub project: ProjectConfig,
    pub frameworks: FrameworksConfig,
    /// `rules.<language>.<category>`
    pub rules: BTreeMap<String, BTreeMap<String, CategoryRules>>,
    pub exceptions: ExceptionsConfig,
    pub paths: PathsConfig,
    pub enforcement: EnforcementConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworksConfig {
    pub auto_detect: bool,
    pub detected: Vec<String>,
}

impl Default for FrameworksConfig {
    fn default() -> Self {
        Self {
            auto_detect: true,
            detected: Vec::new(),
        }
    }
}

/// Settings for one rule category (`functions`, `constants`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryRules {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_verb_prefix: Option<VerbPrefixConfig>,
}

/// `"style": "UPPER_CASE"` or `"style": ["camelCase", "PascalCase"]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleSpec {
    One(String),
    Many(Vec<String>),
}

impl StyleSpec {
    pub fn names(&self) -> Vec<&str> {
        match self {
            StyleSpec::One(name) => vec![name.as_str()],
            StyleSpec::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbPrefixConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "VerbExceptions::is_empty")]
    pub exceptions: VerbExceptions,
    /// Replaces the built-in verb taxonomy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbs: Option<Vec<String>>,
}

impl Default for VerbPrefixConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exceptions: VerbExceptions::default(),
            verbs: None,
        }
    }
}

/// Either a plain list of exempted names or the learned per-context hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerbExceptions {
    Names(Vec<String>),
    Contexts(ContextExceptions),
}

impl Default for VerbExceptions {
    fn default() -> Self {
        VerbExceptions::Names(Vec::new())
    }
}

impl VerbExceptions {
    pub fn is_empty(&self) -> bool {
        matches!(self, VerbExceptions::Names(names) if names.is_empty())
    }

    pub fn names(&self) -> &[String] {
        match self {
            VerbExceptions::Names(names) => names,
            VerbExceptions::Contexts(contexts) => &contexts.names,
        }
    }

    pub fn cli_commands(&self) -> Option<&str> {
        match self {
            VerbExceptions::Contexts(contexts) => contexts.cli_commands.as_deref(),
            VerbExceptions::Names(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextExceptions {
    /// `rails` or `verb_noun`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli_commands: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_functions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_factories: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExceptionsConfig {
    pub functions: Vec<String>,
    pub constants: Vec<String>,
    pub patterns: PatternsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternsConfig {
    pub allow: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Substrings or glob patterns of paths to leave out
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnforcementConfig {
    pub level: String,
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            level: "warning".to_string(),
        }
    }
}

impl GrammarOpsConfig {
    /// Frameworks named under `frameworks.detected`
    pub fn declared_frameworks(&self) -> Result<Vec<Framework>> {
        self.frameworks
            .detected
            .iter()
            .map(|name| {
                Framework::parse(name)
                    .ok_or_else(|| Error::configuration(format!("unknown framework '{name}'")))
            })
            .collect()
    }

    /// CLI style forced by `...require_verb_prefix.exceptions.cli_commands`
    pub fn cli_style_override(&self) -> Result<Option<CliStyle>> {
        let mut style = None;
        for categories in self.rules.values() {
            let hint = categories
                .get("functions")
                .and_then(|f| f.require_verb_prefix.as_ref())
                .and_then(|v| v.exceptions.cli_commands());
            if let Some(hint) = hint {
                let parsed = CliStyle::parse(hint).ok_or_else(|| {
                    Error::configuration(format!("unknown CLI command style '{hint}'"))
                })?;
                style = Some(parsed);
            }
        }
        Ok(style)
    }

    /// Build the framework profile for a project: auto-detected unless
    /// disabled, plus any frameworks named explicitly.
    pub fn resolve_profile(&self, files: &[SourceFile]) -> Result<FrameworkProfile> {
        let declared = self.declared_frameworks()?;
        let profile = if self.frameworks.auto_detect {
            FrameworkDetector::new().detect(files).including(declared)
        } else {
            log::info!("Framework auto-detection disabled by configuration");
            FrameworkProfile::with_frameworks(declared)
        };
        Ok(match self.cli_style_override()? {
            Some(style) => profile.with_cli_style(style),
            None => profile,
        })
    }
}

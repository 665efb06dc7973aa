//! Framework Detector Implementation

use super::patterns::{
    framework_for_import, scan_imports, signature, Framework, Idiom, IdiomEffect, IDIOM_PATTERNS,
    SIGNATURES,
};
use crate::core::SourceFile;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Number of evidence lines shown per framework in reports
pub const EVIDENCE_SHOWN: usize = 3;

/// How CLI commands are named in the project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CliStyle {
    /// `start`, `stop`, `build`
    Rails,
    /// `start_server`, `build_image`
    #[default]
    VerbNoun,
}

impl CliStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "rails" => Some(CliStyle::Rails),
            "verb_noun" => Some(CliStyle::VerbNoun),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CliStyle::Rails => "rails",
            CliStyle::VerbNoun => "verb_noun",
        }
    }
}

/// Project-wide idiom flags. Everything is off until a framework or idiom
/// pattern turns it on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdiomFlags {
    pub cli_style: CliStyle,
    pub uses_response_factories: bool,
    pub dependency_injection: bool,
    pub noun_fixtures: bool,
    pub validator_methods: bool,
    pub component_functions: bool,
    pub lifecycle_hooks: bool,
}

impl IdiomFlags {
    fn apply(&mut self, idiom: Idiom) {
        match idiom {
            Idiom::RailsCli => self.cli_style = CliStyle::Rails,
            Idiom::ResponseFactories => self.uses_response_factories = true,
            Idiom::DependencyInjection => self.dependency_injection = true,
            Idiom::NounFixtures => self.noun_fixtures = true,
            Idiom::ValidatorMethods => self.validator_methods = true,
            Idiom::ComponentFunctions => self.component_functions = true,
            Idiom::LifecycleHooks => self.lifecycle_hooks = true,
        }
    }

    /// Flags that differ from the default, for display
    pub fn active(&self) -> Vec<(&'static str, String)> {
        let mut active = Vec::new();
        if self.cli_style != CliStyle::default() {
            active.push(("cli_style", self.cli_style.as_str().to_string()));
        }
        let booleans = [
            ("response_factories", self.uses_response_factories),
            ("dependency_injection", self.dependency_injection),
            ("noun_fixtures", self.noun_fixtures),
            ("validator_methods", self.validator_methods),
            ("component_functions", self.component_functions),
            ("lifecycle_hooks", self.lifecycle_hooks),
        ];
        active.extend(
            booleans
                .into_iter()
                .filter(|(_, on)| *on)
                .map(|(name, _)| (name, "true".to_string())),
        );
        active
    }
}

/// Frameworks detected for a project, immutable once built
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkProfile {
    pub frameworks: BTreeSet<Framework>,
    pub idioms: IdiomFlags,
    pub evidence: BTreeMap<Framework, Vec<String>>,
}

impl FrameworkProfile {
    /// No frameworks, conservative idiom flags
    pub fn empty() -> Self {
        Self::default()
    }

    /// Profile for an explicit framework list, as named in configuration
    pub fn with_frameworks<I>(frameworks: I) -> Self
    where
        I: IntoIterator<Item = Framework>,
    {
        Self::build(frameworks.into_iter().collect(), BTreeMap::new(), &[])
    }

    fn build(
        frameworks: BTreeSet<Framework>,
        evidence: BTreeMap<Framework, Vec<String>>,
        extra_idioms: &[Idiom],
    ) -> Self {
        let mut idioms = IdiomFlags::default();
        frameworks
            .iter()
            .flat_map(|f| signature(*f).idioms.iter())
            .chain(extra_idioms.iter())
            .for_each(|idiom| idioms.apply(*idiom));
        Self {
            frameworks,
            idioms,
            evidence,
        }
    }

    /// Add frameworks on top of a detected profile, keeping its evidence
    pub fn including<I>(mut self, frameworks: I) -> Self
    where
        I: IntoIterator<Item = Framework>,
    {
        for framework in frameworks {
            if self.frameworks.insert(framework) {
                for idiom in signature(framework).idioms {
                    self.idioms.apply(*idiom);
                }
            }
        }
        self
    }

    pub fn with_cli_style(mut self, cli_style: CliStyle) -> Self {
        self.idioms.cli_style = cli_style;
        self
    }

    pub fn is_active(&self, framework: Framework) -> bool {
        self.frameworks.contains(&framework)
    }

    pub fn any_active(&self, frameworks: &[Framework]) -> bool {
        frameworks.iter().any(|f| self.is_active(*f))
    }

    pub fn is_empty(&self) -> bool {
        self.frameworks.is_empty()
    }

    /// Plain-text detection report
    pub fn report(&self) -> String {
        let mut lines = vec!["Framework Detection Report".to_string(), "=".repeat(50)];

        if self.frameworks.is_empty() {
            lines.push(String::new());
            lines.push("No frameworks detected".to_string());
        } else {
            let names: Vec<String> = self.frameworks.iter().map(|f| f.to_string()).collect();
            lines.push(String::new());
            lines.push(format!("Detected Frameworks: {}", names.join(", ")));
            lines.push(String::new());
            lines.push("Evidence:".to_string());
            for framework in &self.frameworks {
                let Some(evidence) = self.evidence.get(framework) else {
                    continue;
                };
                lines.push(format!("{framework}:"));
                for item in evidence.iter().take(EVIDENCE_SHOWN) {
                    lines.push(format!("  - {item}"));
                }
                if evidence.len() > EVIDENCE_SHOWN {
                    lines.push(format!("  ... and {} more", evidence.len() - EVIDENCE_SHOWN));
                }
            }
        }

        let active = self.idioms.active();
        if !active.is_empty() {
            lines.push(String::new());
            lines.push("Active Idioms:".to_string());
            for (name, value) in active {
                lines.push(format!("  - {name}: {value}"));
            }
        }

        lines.join("\n")
    }
}

/// Scans project files for framework imports and idioms
#[derive(Debug, Default)]
pub struct FrameworkDetector {
    evidence: BTreeMap<Framework, Vec<String>>,
    idioms: Vec<Idiom>,
}

impl FrameworkDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detect frameworks across every file. A framework is active when at
    /// least one file carries its signature.
    pub fn detect(mut self, files: &[SourceFile]) -> FrameworkProfile {
        for file in files {
            self.scan_imports(file);
        }
        for file in files {
            self.scan_markers(file);
            self.scan_idioms(file);
        }

        let frameworks = self.evidence.keys().copied().collect();
        FrameworkProfile::build(frameworks, self.evidence, &self.idioms)
    }

    /// Read and detect. Unreadable files are skipped with a warning.
    pub fn detect_paths(self, paths: &[PathBuf]) -> FrameworkProfile {
        let files: Vec<SourceFile> = paths
            .iter()
            .filter_map(|path| match SourceFile::read(path) {
                Ok(file) => Some(file),
                Err(e) => {
                    log::warn!("Skipping {} during detection: {}", path.display(), e);
                    None
                }
            })
            .collect();
        self.detect(&files)
    }

    fn add_evidence(&mut self, framework: Framework, evidence: String) {
        let entries = self.evidence.entry(framework).or_default();
        if !entries.contains(&evidence) {
            entries.push(evidence);
        }
    }

    fn scan_imports(&mut self, file: &SourceFile) {
        let python = file.language.is_python();
        let name = file_name(&file.path);
        for module in scan_imports(&file.content, file.language) {
            if let Some(framework) = framework_for_import(&module, python) {
                log::debug!("{} imports {} ({})", name, module, framework);
                self.add_evidence(framework, format!("Import found: {module} in {name}"));
            }
        }
    }

    fn scan_markers(&mut self, file: &SourceFile) {
        let python = file.language.is_python();
        let name = file_name(&file.path);
        for sig in SIGNATURES.iter().filter(|s| s.python == python) {
            for marker in sig.code_markers {
                if file.content.contains(marker) {
                    self.add_evidence(sig.framework, format!("Pattern found: {marker} in {name}"));
                }
            }
            for marker in sig.decorator_markers {
                if file.content.contains(marker) {
                    self.add_evidence(
                        sig.framework,
                        format!("Decorator found: {marker} in {name}"),
                    );
                }
            }
        }
    }

    fn scan_idioms(&mut self, file: &SourceFile) {
        let python = file.language.is_python();
        let name = file_name(&file.path);
        for pattern in IDIOM_PATTERNS.iter().filter(|p| p.python == python) {
            if !pattern.regex.is_match(&file.content) {
                continue;
            }
            match pattern.effect {
                IdiomEffect::Activates(framework) => {
                    self.add_evidence(framework, format!("{} in {}", pattern.description, name))
                }
                IdiomEffect::Flags(idiom) => {
                    if !self.idioms.contains(&idiom) {
                        self.idioms.push(idiom);
                    }
                }
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

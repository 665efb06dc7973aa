//! Framework signature table and idiom patterns
//!
//! The table is static data. Adding a framework means adding a variant and a
//! signature row; nothing is registered at runtime.

use crate::core::Language;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Frameworks the detector knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    FastAPI,
    Django,
    Flask,
    Typer,
    Click,
    Pytest,
    Pydantic,
    SQLAlchemy,
    React,
    Vue,
    Angular,
    NextJS,
}

impl Framework {
    pub const ALL: [Framework; 12] = [
        Framework::FastAPI,
        Framework::Django,
        Framework::Flask,
        Framework::Typer,
        Framework::Click,
        Framework::Pytest,
        Framework::Pydantic,
        Framework::SQLAlchemy,
        Framework::React,
        Framework::Vue,
        Framework::Angular,
        Framework::NextJS,
    ];

    /// Lowercase key used in configuration (`frameworks.detected`)
    pub fn key(&self) -> &'static str {
        match self {
            Framework::FastAPI => "fastapi",
            Framework::Django => "django",
            Framework::Flask => "flask",
            Framework::Typer => "typer",
            Framework::Click => "click",
            Framework::Pytest => "pytest",
            Framework::Pydantic => "pydantic",
            Framework::SQLAlchemy => "sqlalchemy",
            Framework::React => "react",
            Framework::Vue => "vue",
            Framework::Angular => "angular",
            Framework::NextJS => "nextjs",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let lowered = s.to_lowercase();
        let key = match lowered.as_str() {
            "next" | "next.js" => "nextjs",
            other => other,
        };
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    pub fn is_python(&self) -> bool {
        signature(*self).python
    }

    pub fn applies_to(&self, language: Language) -> bool {
        self.is_python() == language.is_python()
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Framework::FastAPI => "FastAPI",
            Framework::Django => "Django",
            Framework::Flask => "Flask",
            Framework::Typer => "Typer",
            Framework::Click => "Click",
            Framework::Pytest => "pytest",
            Framework::Pydantic => "Pydantic",
            Framework::SQLAlchemy => "SQLAlchemy",
            Framework::React => "React",
            Framework::Vue => "Vue",
            Framework::Angular => "Angular",
            Framework::NextJS => "Next.js",
        };
        f.write_str(name)
    }
}

/// Project-wide conventions a framework implies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idiom {
    RailsCli,
    ResponseFactories,
    DependencyInjection,
    NounFixtures,
    ValidatorMethods,
    ComponentFunctions,
    LifecycleHooks,
}

/// One row of the signature table
#[derive(Debug)]
pub struct FrameworkSignature {
    pub framework: Framework,
    /// Whether the framework lives in Python files (otherwise JS/TS)
    pub python: bool,
    /// Import roots: `fastapi`, `@angular`, `next`
    pub packages: &'static [&'static str],
    /// Substrings that only appear in code using the framework
    pub code_markers: &'static [&'static str],
    pub decorator_markers: &'static [&'static str],
    pub idioms: &'static [Idiom],
}

pub static SIGNATURES: &[FrameworkSignature] = &[
    FrameworkSignature {
        framework: Framework::FastAPI,
        python: true,
        packages: &["fastapi"],
        code_markers: &[],
        decorator_markers: &[],
        idioms: &[Idiom::ResponseFactories, Idiom::DependencyInjection],
    },
    FrameworkSignature {
        framework: Framework::Django,
        python: true,
        packages: &["django", "rest_framework"],
        code_markers: &["urlpatterns", "INSTALLED_APPS", "MIDDLEWARE"],
        decorator_markers: &["@login_required", "@require_http_methods"],
        idioms: &[],
    },
    FrameworkSignature {
        framework: Framework::Flask,
        python: true,
        packages: &["flask"],
        code_markers: &[],
        decorator_markers: &["@app.route", "@bp.route", "@blueprint.route"],
        idioms: &[],
    },
    FrameworkSignature {
        framework: Framework::Typer,
        python: true,
        packages: &["typer"],
        code_markers: &[],
        decorator_markers: &[],
        idioms: &[Idiom::RailsCli],
    },
    FrameworkSignature {
        framework: Framework::Click,
        python: true,
        packages: &["click"],
        code_markers: &[],
        decorator_markers: &["@click.command", "@click.group"],
        idioms: &[Idiom::RailsCli],
    },
    FrameworkSignature {
        framework: Framework::Pytest,
        python: true,
        packages: &["pytest"],
        code_markers: &[],
        decorator_markers: &["@pytest.fixture", "@pytest.mark"],
        idioms: &[Idiom::NounFixtures],
    },
    FrameworkSignature {
        framework: Framework::Pydantic,
        python: true,
        packages: &["pydantic", "pydantic_settings"],
        code_markers: &[],
        decorator_markers: &["@validator", "@field_validator", "@model_validator"],
        idioms: &[Idiom::ValidatorMethods],
    },
    FrameworkSignature {
        framework: Framework::SQLAlchemy,
        python: true,
        packages: &["sqlalchemy"],
        code_markers: &["__tablename__", "declarative_base()"],
        decorator_markers: &[],
        idioms: &[],
    },
    FrameworkSignature {
        framework: Framework::React,
        python: false,
        packages: &["react", "react-dom", "react-native"],
        code_markers: &["React.createElement"],
        decorator_markers: &[],
        idioms: &[Idiom::ComponentFunctions, Idiom::LifecycleHooks],
    },
    FrameworkSignature {
        framework: Framework::Vue,
        python: false,
        packages: &["vue", "@vue", "nuxt"],
        code_markers: &["defineComponent("],
        decorator_markers: &[],
        idioms: &[Idiom::LifecycleHooks],
    },
    FrameworkSignature {
        framework: Framework::Angular,
        python: false,
        packages: &["@angular"],
        code_markers: &[],
        decorator_markers: &["@Component(", "@Injectable(", "@NgModule("],
        idioms: &[Idiom::LifecycleHooks, Idiom::DependencyInjection],
    },
    FrameworkSignature {
        framework: Framework::NextJS,
        python: false,
        packages: &["next"],
        code_markers: &["getServerSideProps", "getStaticProps"],
        decorator_markers: &[],
        idioms: &[Idiom::ComponentFunctions],
    },
];

/// Signature row for a framework. The table covers every variant.
pub fn signature(framework: Framework) -> &'static FrameworkSignature {
    SIGNATURES
        .iter()
        .find(|s| s.framework == framework)
        .unwrap_or(&SIGNATURES[0])
}

/// Framework whose import root matches a module path
pub fn framework_for_import(module: &str, python: bool) -> Option<Framework> {
    let root = import_root(module, python)?;
    SIGNATURES
        .iter()
        .filter(|s| s.python == python)
        .find(|s| s.packages.contains(&root))
        .map(|s| s.framework)
}

/// `fastapi.routing` -> `fastapi`, `@angular/core` -> `@angular`,
/// `next/router` -> `next`. Relative imports have no root.
pub fn import_root(module: &str, python: bool) -> Option<&str> {
    let module = module.trim();
    if module.is_empty() || module.starts_with('.') || module.starts_with('/') {
        return None;
    }
    let separator = if python { '.' } else { '/' };
    module.split(separator).next().filter(|root| !root.is_empty())
}

static PYTHON_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:from[ \t]+([\w.]+)[ \t]+import\b|import[ \t]+([\w.]+(?:[ \t]*,[ \t]*[\w.]+)*))",
    )
    .unwrap()
});

static ECMASCRIPT_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:\bimport\s+(?:[\w*{}\s,$]+?\s+from\s+)?['"]([^'"]+)['"]|\brequire\(\s*['"]([^'"]+)['"]\s*\)|\bimport\(\s*['"]([^'"]+)['"]\s*\))"#,
    )
    .unwrap()
});

/// Module paths imported by a file, in source order
pub fn scan_imports(content: &str, language: Language) -> Vec<String> {
    if language.is_python() {
        PYTHON_IMPORT
            .captures_iter(content)
            .flat_map(|caps| {
                let modules = caps.get(1).or_else(|| caps.get(2));
                modules
                    .map(|m| {
                        m.as_str()
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .collect::<Vec<String>>()
                    })
                    .unwrap_or_default()
            })
            .collect()
    } else {
        ECMASCRIPT_IMPORT
            .captures_iter(content)
            .filter_map(|caps| {
                caps.get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str().to_string())
            })
            .collect()
    }
}

/// Effect of an idiom pattern match
#[derive(Debug, Clone, Copy)]
pub enum IdiomEffect {
    /// Evidence that a framework is in use
    Activates(Framework),
    /// Sets an idiom flag without activating anything
    Flags(Idiom),
}

pub struct IdiomPattern {
    pub python: bool,
    pub description: &'static str,
    pub regex: Lazy<Regex>,
    pub effect: IdiomEffect,
}

macro_rules! idiom_pattern {
    ($python:expr, $description:expr, $regex:expr, $effect:expr) => {
        IdiomPattern {
            python: $python,
            description: $description,
            regex: Lazy::new(|| Regex::new($regex).unwrap()),
            effect: $effect,
        }
    };
}

pub static IDIOM_PATTERNS: [IdiomPattern; 8] = [
    idiom_pattern!(
        true,
        "FastAPI singleton",
        r"(?m)^\s*\w+\s*=\s*(?:fastapi\.)?(?:FastAPI|APIRouter)\(",
        IdiomEffect::Activates(Framework::FastAPI)
    ),
    idiom_pattern!(
        true,
        "Flask singleton",
        r"(?m)^\s*\w+\s*=\s*(?:flask\.)?(?:Flask|Blueprint)\(",
        IdiomEffect::Activates(Framework::Flask)
    ),
    idiom_pattern!(
        true,
        "Typer application",
        r"(?m)^\s*\w+\s*=\s*(?:typer\.)?Typer\(",
        IdiomEffect::Activates(Framework::Typer)
    ),
    idiom_pattern!(
        true,
        "click command group",
        r"(?m)^\s*@click\.group\(",
        IdiomEffect::Activates(Framework::Click)
    ),
    idiom_pattern!(
        true,
        "Django URL configuration",
        r"(?m)^\s*urlpatterns\s*=",
        IdiomEffect::Activates(Framework::Django)
    ),
    idiom_pattern!(
        true,
        "SQLAlchemy declarative base",
        r"(?m)^\s*\w+\s*=\s*(?:\w+\.)*declarative_base\(",
        IdiomEffect::Activates(Framework::SQLAlchemy)
    ),
    idiom_pattern!(
        true,
        "Depends() injection",
        r"\bDepends\(",
        IdiomEffect::Flags(Idiom::DependencyInjection)
    ),
    idiom_pattern!(
        false,
        "Vue application",
        r"\bcreateApp\(",
        IdiomEffect::Flags(Idiom::LifecycleHooks)
    ),
];

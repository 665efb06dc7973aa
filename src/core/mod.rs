//! Core domain types shared by every analysis phase.
//!
//! A [`Declaration`] is produced once per function or module-level assignment
//! while walking a file. It is an immutable value for the rest of the run:
//! the classifier, rule engine, learner and migrator only ever read it.

pub mod errors;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use errors::{Error, Result};

/// Source languages understood by the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::JavaScript, Language::TypeScript];

    pub fn from_extension(ext: &str) -> Option<Self> {
        static EXTENSION_MAP: &[(&[&str], Language)] = &[
            (&["py", "pyi"], Language::Python),
            (&["js", "jsx", "mjs", "cjs"], Language::JavaScript),
            (&["ts", "tsx", "mts", "cts"], Language::TypeScript),
        ];

        EXTENSION_MAP
            .iter()
            .find(|(exts, _)| exts.contains(&ext))
            .map(|(_, lang)| *lang)
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse the lowercase key used in configuration files (`rules.python`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "python" | "py" => Some(Language::Python),
            "javascript" | "js" => Some(Language::JavaScript),
            "typescript" | "ts" => Some(Language::TypeScript),
            _ => None,
        }
    }

    /// Canonical configuration key
    pub fn key(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
        }
    }

    pub fn is_python(&self) -> bool {
        matches!(self, Language::Python)
    }

    /// JavaScript and TypeScript share naming conventions
    pub fn is_ecmascript(&self) -> bool {
        matches!(self, Language::JavaScript | Language::TypeScript)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_str = match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
        };
        write!(f, "{display_str}")
    }
}

/// A readable source file handed to the detector, learner and extractors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub language: Language,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, language: Language, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language,
            content: content.into(),
        }
    }

    /// Read a file from disk, inferring its language from the extension
    pub fn read(path: &Path) -> Result<Self> {
        let language = Language::from_path(path).ok_or_else(|| {
            Error::parse(path, 0, "unsupported file extension")
        })?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system("Failed to read source file", path, e))?;
        Ok(Self::new(path, language, content))
    }
}

/// Location in source code (1-indexed line)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Function,
    Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnclosingScope {
    #[default]
    Module,
    Class,
    CliGroup,
}

/// Structural shape of an assignment's right-hand side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ValueShape {
    /// String, number, boolean, None/null
    Literal,
    /// List/tuple/set/dict/array/object whose elements are all literals
    LiteralCollection,
    /// Call or `new` expression; `callee` is the dotted path (`logging.getLogger`)
    Call { callee: String },
    Other,
}

impl ValueShape {
    pub fn is_literal(&self) -> bool {
        matches!(self, ValueShape::Literal | ValueShape::LiteralCollection)
    }

    pub fn callee(&self) -> Option<&str> {
        match self {
            ValueShape::Call { callee } => Some(callee),
            _ => None,
        }
    }

    /// Last segment of the callee path: `typer.Typer` -> `Typer`
    pub fn callee_name(&self) -> Option<&str> {
        self.callee()
            .map(|callee| callee.rsplit('.').next().unwrap_or(callee))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedValue {
    /// Raw source text of the right-hand side
    pub text: String,
    pub shape: ValueShape,
}

/// A function/method definition or a module-level assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub language: Language,
    pub location: SourceLocation,
    /// Raw decorator text including the leading `@`
    pub decorators: Vec<String>,
    pub scope: EnclosingScope,
    pub parent_class: Option<String>,
    pub parameters: Vec<String>,
    pub return_type: Option<String>,
    pub docstring: Option<String>,
    pub value: Option<AssignedValue>,
    pub contains_jsx: bool,
    /// ES `get`/`set` accessor method
    #[serde(default)]
    pub is_accessor: bool,
}

impl Declaration {
    /// Minimal function declaration, mostly useful for building fixtures
    pub fn function(name: impl Into<String>, language: Language, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            kind: DeclarationKind::Function,
            language,
            location,
            decorators: Vec::new(),
            scope: EnclosingScope::Module,
            parent_class: None,
            parameters: Vec::new(),
            return_type: None,
            docstring: None,
            value: None,
            contains_jsx: false,
            is_accessor: false,
        }
    }

    pub fn assignment(
        name: impl Into<String>,
        language: Language,
        location: SourceLocation,
        value: AssignedValue,
    ) -> Self {
        Self {
            kind: DeclarationKind::Assignment,
            value: Some(value),
            ..Self::function(name, language, location)
        }
    }

    pub fn with_decorators<I, S>(mut self, decorators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.decorators = decorators.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_scope(mut self, scope: EnclosingScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    pub fn with_accessor(mut self, is_accessor: bool) -> Self {
        self.is_accessor = is_accessor;
        self
    }

    pub fn with_jsx(mut self, contains_jsx: bool) -> Self {
        self.contains_jsx = contains_jsx;
        self
    }

    /// Same declaration under a different name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn is_function(&self) -> bool {
        self.kind == DeclarationKind::Function
    }

    pub fn is_assignment(&self) -> bool {
        self.kind == DeclarationKind::Assignment
    }

    pub fn value_shape(&self) -> Option<&ValueShape> {
        self.value.as_ref().map(|v| &v.shape)
    }

    /// Text that exception patterns are matched against besides the bare
    /// name: `name = value` for assignments.
    pub fn signature(&self) -> String {
        match &self.value {
            Some(value) => format!("{} = {}", self.name, value.text),
            None => self.name.clone(),
        }
    }

    /// Parameters without the implicit receiver (`self`, `cls`)
    pub fn explicit_parameters(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .map(String::as_str)
            .filter(|p| *p != "self" && *p != "cls")
    }
}

/// Classification of a declaration by its syntactic and framework context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContextLabel {
    RegularFunction,
    CliCommand,
    TestFunction,
    ResponseFactory,
    FrameworkHandler,
    Constant,
    Singleton,
    TypeVar,
    LoggerInstance,
}

impl ContextLabel {
    pub const ALL: [ContextLabel; 9] = [
        ContextLabel::RegularFunction,
        ContextLabel::CliCommand,
        ContextLabel::TestFunction,
        ContextLabel::ResponseFactory,
        ContextLabel::FrameworkHandler,
        ContextLabel::Constant,
        ContextLabel::Singleton,
        ContextLabel::TypeVar,
        ContextLabel::LoggerInstance,
    ];

    /// Identifier used in JSON output and learned configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextLabel::RegularFunction => "RegularFunction",
            ContextLabel::CliCommand => "CliCommand",
            ContextLabel::TestFunction => "TestFunction",
            ContextLabel::ResponseFactory => "ResponseFactory",
            ContextLabel::FrameworkHandler => "FrameworkHandler",
            ContextLabel::Constant => "Constant",
            ContextLabel::Singleton => "Singleton",
            ContextLabel::TypeVar => "TypeVar",
            ContextLabel::LoggerInstance => "LoggerInstance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_str() == s)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ContextLabel::RegularFunction => "Regular Function",
            ContextLabel::CliCommand => "CLI Command",
            ContextLabel::TestFunction => "Test Function",
            ContextLabel::ResponseFactory => "Response Factory",
            ContextLabel::FrameworkHandler => "Framework Handler",
            ContextLabel::Constant => "Constant",
            ContextLabel::Singleton => "Singleton Instance",
            ContextLabel::TypeVar => "Type Variable",
            ContextLabel::LoggerInstance => "Logger Instance",
        }
    }

    pub fn explanation(&self) -> &'static str {
        match self {
            ContextLabel::RegularFunction => {
                "Standard functions should indicate what action they perform"
            }
            ContextLabel::CliCommand => {
                "Command-line interface commands often use Rails-style naming (start, stop, build)"
            }
            ContextLabel::TestFunction => "Test functions already carry the test prefix",
            ContextLabel::ResponseFactory => {
                "Factory functions are named after what they create (success_response)"
            }
            ContextLabel::FrameworkHandler => {
                "Framework-invoked functions keep the names the framework expects"
            }
            ContextLabel::Constant => "Constants use UPPER_CASE to stand apart from variables",
            ContextLabel::Singleton => {
                "Framework objects like `app = FastAPI()` are variables and use lowercase"
            }
            ContextLabel::TypeVar => "TypeVars follow typing conventions: `T` or `TUser`",
            ContextLabel::LoggerInstance => {
                "Logger instances are variables: `logger = logging.getLogger(__name__)`"
            }
        }
    }
}

impl fmt::Display for ContextLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity attached to violations, driven by `enforcement.level`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    #[default]
    Warning,
    Error,
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" | "hint" => Some(Severity::Info),
            "warning" | "warn" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Cooperative cancellation flag, checked between files
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

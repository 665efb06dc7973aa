//! Terminal styling: colour and emoji decisions for console output

use crate::core::Severity;
use colored::*;
use std::env;
use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Auto,   // Detect based on terminal
    Always, // Force colors on
    Never,  // Force colors off
}

impl ColorMode {
    pub fn should_use_color(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => detect_color_support(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattingConfig {
    pub color: ColorMode,
    pub emoji: bool,
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            color: ColorMode::Auto,
            emoji: true,
        }
    }
}

impl FormattingConfig {
    /// Honour `NO_COLOR`, `CLICOLOR=0` and `CLICOLOR_FORCE=1`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Check NO_COLOR environment variable (per no-color.org standard)
        if env::var("NO_COLOR").is_ok() {
            config.color = ColorMode::Never;
        }

        if let Ok(val) = env::var("CLICOLOR") {
            if val == "0" {
                config.color = ColorMode::Never;
            }
        }

        if let Ok(val) = env::var("CLICOLOR_FORCE") {
            if val == "1" {
                config.color = ColorMode::Always;
            }
        }

        config
    }

    /// `--no-color` wins over the environment and also drops emoji
    pub fn with_no_color(mut self, no_color: bool) -> Self {
        if no_color {
            self.color = ColorMode::Never;
            self.emoji = false;
        }
        self
    }

    /// ASCII-only, no colours
    pub fn plain() -> Self {
        Self {
            color: ColorMode::Never,
            emoji: false,
        }
    }
}

/// Icons used in console reports, each with an ASCII fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Search,
    Location,
    Issue,
    Suggestion,
    Info,
    Summary,
    Clean,
}

impl Icon {
    fn glyphs(self) -> (&'static str, &'static str) {
        match self {
            Icon::Search => ("🔍", "[SEARCH]"),
            Icon::Location => ("📍", "*"),
            Icon::Issue => ("❌", "[ISSUE]"),
            Icon::Suggestion => ("💡", "[SUGGEST]"),
            Icon::Info => ("ℹ", "[INFO]"),
            Icon::Summary => ("📊", "[SUMMARY]"),
            Icon::Clean => ("✓", "[OK]"),
        }
    }
}

/// Applies a [`FormattingConfig`] to report text
#[derive(Debug, Clone, Copy)]
pub struct Styler {
    color: bool,
    emoji: bool,
}

impl Styler {
    pub fn new(config: FormattingConfig) -> Self {
        let color = config.color.should_use_color();
        colored::control::set_override(color);
        Self {
            color,
            emoji: config.emoji && color,
        }
    }

    pub fn plain() -> Self {
        Self::new(FormattingConfig::plain())
    }

    fn paint(&self, text: &str, f: impl FnOnce(&str) -> ColoredString) -> String {
        if self.color {
            f(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn icon(&self, icon: Icon) -> &'static str {
        let (glyph, fallback) = icon.glyphs();
        if self.emoji {
            glyph
        } else {
            fallback
        }
    }

    pub fn header(&self, text: &str) -> String {
        self.paint(text, |t| t.blue().bold())
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint(text, |t| t.bold())
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(text, |t| t.dimmed())
    }

    pub fn success(&self, text: &str) -> String {
        self.paint(text, |t| t.green())
    }

    pub fn suggestion(&self, text: &str) -> String {
        self.paint(text, |t| t.green().bold())
    }

    pub fn severity(&self, severity: Severity, text: &str) -> String {
        match severity {
            Severity::Error => self.paint(text, |t| t.red().bold()),
            Severity::Warning => self.paint(text, |t| t.yellow()),
            Severity::Info => self.paint(text, |t| t.cyan()),
        }
    }
}

fn detect_color_support() -> bool {
    // Check if we're in a dumb terminal
    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    std::io::stdout().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_styler_passes_text_through() {
        let styler = Styler::plain();
        assert_eq!(styler.header("Summary"), "Summary");
        assert_eq!(styler.severity(Severity::Error, "bad"), "bad");
        assert_eq!(styler.icon(Icon::Suggestion), "[SUGGEST]");
    }

    #[test]
    fn test_no_color_flag_overrides_environment() {
        let config = FormattingConfig {
            color: ColorMode::Always,
            emoji: true,
        }
        .with_no_color(true);
        assert_eq!(config, FormattingConfig::plain());
    }
}

//! Turns a [`GrammarOpsConfig`] into a validated [`RuleSet`].
//!
//! Every regex is compiled and every name is checked here, so evaluation
//! later on cannot fail.

use super::{CategoryRules, GrammarOpsConfig, VerbPrefixConfig};
use crate::core::{ContextLabel, Error, Language, Result, Severity};
use crate::naming::verbs::default_verbs;
use crate::naming::{CaseStyle, ContextSelector, ExceptionSet, KindFilter, NamingRule, RuleSet};
use std::collections::BTreeSet;

/// Rule categories recognised under `rules.<language>`
pub const CATEGORIES: &[&str] = &[
    "functions",
    "variables",
    "constants",
    "typevars",
    "singletons",
    "loggers",
    "handlers",
];

/// Labels and declaration kind governed by a category
fn category_slot(category: &str) -> Option<(ContextSelector, KindFilter)> {
    use ContextLabel::*;
    let slot = match category {
        "functions" => (
            ContextSelector::labels([RegularFunction, CliCommand, TestFunction, ResponseFactory]),
            KindFilter::Function,
        ),
        "variables" => (ContextSelector::only(RegularFunction), KindFilter::Assignment),
        "constants" => (ContextSelector::only(Constant), KindFilter::Assignment),
        "typevars" => (ContextSelector::only(TypeVar), KindFilter::Assignment),
        "singletons" => (ContextSelector::only(Singleton), KindFilter::Assignment),
        "loggers" => (ContextSelector::only(LoggerInstance), KindFilter::Assignment),
        "handlers" => (ContextSelector::only(FrameworkHandler), KindFilter::Function),
        _ => return None,
    };
    Some(slot)
}

/// Build the rule set for a run: built-in defaults overridden slot by slot
pub fn build_rule_set(config: &GrammarOpsConfig) -> Result<RuleSet> {
    let mut set = RuleSet::defaults();

    for (language_key, categories) in &config.rules {
        let language = Language::parse(language_key).ok_or_else(|| {
            Error::configuration(format!("unknown language '{language_key}' under rules"))
        })?;
        for (category, settings) in categories {
            apply_category(&mut set, language, category, settings)?;
        }
    }

    set.add_function_exceptions(config.exceptions.functions.iter().cloned());
    set.add_assignment_exceptions(config.exceptions.constants.iter().cloned());
    set.add_global_patterns(&config.exceptions.patterns.allow)?;

    let level = &config.enforcement.level;
    let severity = Severity::parse(level)
        .ok_or_else(|| Error::configuration(format!("unknown enforcement level '{level}'")))?;
    set.set_severity(severity);

    log::debug!("Built rule set with {} rules", set.rules().len());
    Ok(set)
}

fn apply_category(
    set: &mut RuleSet,
    language: Language,
    category: &str,
    settings: &CategoryRules,
) -> Result<()> {
    let (selector, kind) = category_slot(category).ok_or_else(|| {
        Error::configuration(format!(
            "unknown rule category '{category}' (expected one of: {})",
            CATEGORIES.join(", ")
        ))
    })?;

    if let Some(style) = &settings.style {
        let accepted = style
            .names()
            .into_iter()
            .map(|name| {
                CaseStyle::parse(name)
                    .ok_or_else(|| Error::configuration(format!("unknown style '{name}'")))
            })
            .collect::<Result<Vec<_>>>()?;
        if accepted.is_empty() {
            return Err(Error::configuration(format!(
                "{language}.{category}.style lists no styles"
            )));
        }
        set.set(NamingRule::casing(
            format!("{category}.style"),
            selector.clone(),
            kind,
            Some(language),
            accepted,
        ))?;
    }

    if let Some(verb_prefix) = &settings.require_verb_prefix {
        if kind != KindFilter::Function {
            log::warn!(
                "Ignoring {language}.{category}.require_verb_prefix: assignments carry no verb prefix"
            );
            return Ok(());
        }
        let id = format!("{category}.require_verb_prefix");
        if !verb_prefix.enabled {
            set.remove(&id, Some(language));
            return Ok(());
        }
        // Factories, CLI commands and tests never need a verb
        let selector = if category == "functions" {
            ContextSelector::only(ContextLabel::RegularFunction)
        } else {
            selector
        };
        let exceptions =
            ExceptionSet::new().with_names(verb_prefix.exceptions.names().iter().cloned());
        let rule = NamingRule::verb_prefix(id, selector, Some(language), taxonomy(verb_prefix)?)
            .with_exceptions(exceptions);
        set.set(rule)?;
    }

    Ok(())
}

/// Configured verb list, or the built-in taxonomy
fn taxonomy(config: &VerbPrefixConfig) -> Result<BTreeSet<String>> {
    let Some(verbs) = &config.verbs else {
        return Ok(default_verbs());
    };
    let mut taxonomy = BTreeSet::new();
    for verb in verbs {
        let verb = verb.trim().to_lowercase();
        if verb.is_empty() || !verb.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::configuration(format!(
                "verb '{verb}' must be a single lowercase word"
            )));
        }
        taxonomy.insert(verb);
    }
    if taxonomy.is_empty() {
        return Err(Error::configuration("verb taxonomy is empty"));
    }
    Ok(taxonomy)
}

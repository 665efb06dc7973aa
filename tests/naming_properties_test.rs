use grammarops::analysis::classify;
use grammarops::analysis::framework_patterns::{Framework, FrameworkProfile};
use grammarops::core::{ContextLabel, Declaration, EnclosingScope, Language, SourceLocation};
use grammarops::naming::{evaluate_all, CaseStyle, RuleSet};
use proptest::prelude::*;

fn snake_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}(_[a-z][a-z0-9]{0,7}){0,2}"
}

fn camel_name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}([A-Z][a-z0-9]{1,7}){0,2}"
}

fn any_name() -> impl Strategy<Value = String> {
    prop_oneof![
        snake_name(),
        camel_name(),
        "[A-Z][a-z]{1,6}([A-Z][a-z]{1,6}){0,2}",
        "[A-Z]{1,6}(_[A-Z0-9]{1,6}){0,2}",
    ]
}

/// Placeholder names and names with leading underscores or `$`
fn decorated_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("_".to_string()),
        Just("__".to_string()),
        Just("$".to_string()),
        "[_$][a-z]{1,6}",
        "_{1,2}[a-z]{1,6}(_[a-z]{1,6})?",
    ]
}

fn language() -> impl Strategy<Value = Language> {
    prop_oneof![
        Just(Language::Python),
        Just(Language::JavaScript),
        Just(Language::TypeScript),
    ]
}

fn function(name: &str, language: Language) -> Declaration {
    Declaration::function(name, language, SourceLocation::new("prop.py", 1))
}

proptest! {
    #[test]
    fn prop_rails_cli_commands_never_need_verbs(name in any_name(), lang in language()) {
        prop_assume!(!name.to_lowercase().starts_with("test"));
        let profile = FrameworkProfile::with_frameworks([Framework::Typer]);
        let decl = function(&name, lang).with_scope(EnclosingScope::CliGroup);

        let label = classify(&decl, &profile);
        prop_assert_eq!(label, ContextLabel::CliCommand);
        let rules = RuleSet::defaults();
        prop_assert!(evaluate_all(&decl, label, &rules)
            .iter()
            .all(|v| !v.is_verb_prefix()));
    }

    #[test]
    fn prop_test_functions_never_need_verbs(suffix in snake_name()) {
        let name = format!("test_{suffix}");
        let decl = function(&name, Language::Python);

        let label = classify(&decl, &FrameworkProfile::empty());
        prop_assert_eq!(label, ContextLabel::TestFunction);
        prop_assert!(evaluate_all(&decl, label, &RuleSet::defaults())
            .iter()
            .all(|v| !v.is_verb_prefix()));
    }

    #[test]
    fn prop_verb_suggestions_satisfy_the_rule(
        name in prop_oneof![any_name(), decorated_name()],
        lang in language()
    ) {
        let rules = RuleSet::defaults();
        let decl = function(&name, lang);
        let violations = evaluate_all(&decl, ContextLabel::RegularFunction, &rules);

        for violation in violations.iter().filter(|v| v.is_verb_prefix()) {
            let suggested = violation
                .suggested_name
                .as_deref()
                .expect("default verbs always give a suggestion");
            prop_assert_ne!(suggested, name.as_str());
            let renamed = decl.renamed(suggested);
            prop_assert!(
                evaluate_all(&renamed, ContextLabel::RegularFunction, &rules)
                    .iter()
                    .all(|v| v.rule_id != violation.rule_id),
                "{} -> {} still violates {}",
                name,
                suggested,
                violation.rule_id
            );
        }
    }

    #[test]
    fn prop_convert_always_matches(name in any_name()) {
        for style in CaseStyle::ALL {
            let converted = style.convert(&name);
            prop_assert!(
                style.matches(&converted),
                "{} converted to {:?} gave {}",
                name,
                style,
                converted
            );
        }
    }
}

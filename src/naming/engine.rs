//! Rule evaluation. Evaluation never fails: every regex was compiled when
//! the rule set was built.

use super::casing::CaseStyle;
use super::rules::{NamingRule, Requirement, RuleCategory, RuleSet};
use super::verbs::{choose_verb, has_verb_prefix, prepend_verb};
use crate::core::{ContextLabel, Declaration, Severity};
use serde::Serialize;

/// A declaration that broke a naming rule
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub declaration: Declaration,
    pub label: ContextLabel,
    pub rule_id: String,
    #[serde(skip)]
    pub category: RuleCategory,
    /// Preferred style for casing violations
    #[serde(skip)]
    pub target_style: Option<CaseStyle>,
    pub suggested_name: Option<String>,
    pub severity: Severity,
    pub message: String,
}

impl Violation {
    pub fn is_verb_prefix(&self) -> bool {
        self.category == RuleCategory::VerbPrefix
    }

    /// Short description of the problem for reports
    pub fn issue(&self) -> &'static str {
        match self.category {
            RuleCategory::VerbPrefix => "Missing verb prefix",
            RuleCategory::Casing => "Wrong casing",
        }
    }
}

/// First violated rule, verb-prefix rules before casing rules
pub fn evaluate(decl: &Declaration, label: ContextLabel, rules: &RuleSet) -> Option<Violation> {
    if rules.is_globally_excepted(decl) {
        return None;
    }
    rules
        .applicable(decl, label)
        .find_map(|rule| check_rule(decl, label, rule))
}

/// Every violated rule for a declaration
pub fn evaluate_all(decl: &Declaration, label: ContextLabel, rules: &RuleSet) -> Vec<Violation> {
    if rules.is_globally_excepted(decl) {
        return Vec::new();
    }
    rules
        .applicable(decl, label)
        .filter_map(|rule| check_rule(decl, label, rule))
        .collect()
}

fn check_rule(decl: &Declaration, label: ContextLabel, rule: &NamingRule) -> Option<Violation> {
    if rule.exceptions.excepts(decl) {
        return None;
    }
    match &rule.requirement {
        Requirement::VerbPrefix { verbs } => {
            if decl.is_assignment()
                || matches!(label, ContextLabel::TestFunction | ContextLabel::CliCommand)
                || has_verb_prefix(&decl.name, verbs)
            {
                return None;
            }
            let suggested = choose_verb(&decl.name, decl.docstring.as_deref(), label, verbs)
                .map(|verb| prepend_verb(&verb, &decl.name, decl.language))
                .filter(|name| *name != decl.name);
            Some(Violation {
                declaration: decl.clone(),
                label,
                rule_id: rule.id.clone(),
                category: RuleCategory::VerbPrefix,
                target_style: None,
                suggested_name: suggested,
                severity: rule.severity,
                message: format!(
                    "{} '{}' should start with a verb",
                    label.description(),
                    decl.name
                ),
            })
        }
        Requirement::Casing { accepted } => {
            if accepted.is_empty() || accepted.iter().any(|style| style.matches(&decl.name)) {
                return None;
            }
            let target = accepted[0];
            let converted = target.convert(&decl.name);
            let suggested = (converted != decl.name).then_some(converted);
            let expected = accepted
                .iter()
                .map(CaseStyle::as_str)
                .collect::<Vec<_>>()
                .join(" or ");
            Some(Violation {
                declaration: decl.clone(),
                label,
                rule_id: rule.id.clone(),
                category: RuleCategory::Casing,
                target_style: Some(target),
                suggested_name: suggested,
                severity: rule.severity,
                message: format!(
                    "{} '{}' should be {}",
                    label.description(),
                    decl.name,
                    expected
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AssignedValue, Language, SourceLocation, ValueShape};
    use pretty_assertions::assert_eq;

    fn py_func(name: &str) -> Declaration {
        Declaration::function(name, Language::Python, SourceLocation::new("a.py", 1))
    }

    fn py_assign(name: &str, text: &str, shape: ValueShape) -> Declaration {
        Declaration::assignment(
            name,
            Language::Python,
            SourceLocation::new("a.py", 1),
            AssignedValue {
                text: text.to_string(),
                shape,
            },
        )
    }

    #[test]
    fn test_missing_verb_prefix_suggests_get() {
        let rules = RuleSet::defaults();
        let violation =
            evaluate(&py_func("userData"), ContextLabel::RegularFunction, &rules).unwrap();
        assert_eq!(violation.rule_id, "functions.require_verb_prefix");
        assert_eq!(violation.suggested_name.as_deref(), Some("getUserData"));
        assert_eq!(violation.severity, Severity::Warning);
    }

    #[test]
    fn test_docstring_picks_the_verb() {
        let rules = RuleSet::defaults();
        let decl = py_func("widget").with_docstring("Build a widget from settings.");
        let violation = evaluate(&decl, ContextLabel::RegularFunction, &rules).unwrap();
        assert_eq!(violation.suggested_name.as_deref(), Some("create_widget"));
    }

    #[test]
    fn test_placeholder_names_are_not_flagged() {
        let rules = RuleSet::defaults();
        let register = py_func("_").with_decorators(["@fmt.register"]);
        assert!(evaluate_all(&register, ContextLabel::RegularFunction, &rules).is_empty());
        let dollar =
            Declaration::function("$", Language::JavaScript, SourceLocation::new("a.js", 1));
        assert!(evaluate_all(&dollar, ContextLabel::RegularFunction, &rules).is_empty());
    }

    #[test]
    fn test_evaluate_all_reports_casing_too() {
        let rules = RuleSet::defaults();
        let violations = evaluate_all(&py_func("userData"), ContextLabel::RegularFunction, &rules);
        let ids: Vec<_> = violations.iter().map(|v| v.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["functions.require_verb_prefix", "functions.style"]);
        assert_eq!(violations[1].suggested_name.as_deref(), Some("user_data"));
        assert_eq!(violations[1].target_style, Some(CaseStyle::Snake));
    }

    #[test]
    fn test_cli_command_and_test_bypass_verb_prefix() {
        let rules = RuleSet::defaults();
        assert_eq!(evaluate(&py_func("start"), ContextLabel::CliCommand, &rules), None);
        assert_eq!(
            evaluate(&py_func("test_user_login"), ContextLabel::TestFunction, &rules),
            None
        );
    }

    #[test]
    fn test_singleton_lowercase_is_fine() {
        let rules = RuleSet::defaults();
        let app = py_assign(
            "app",
            "FastAPI()",
            ValueShape::Call {
                callee: "FastAPI".to_string(),
            },
        );
        assert_eq!(evaluate(&app, ContextLabel::Singleton, &rules), None);
    }

    #[test]
    fn test_typevar_not_held_to_constant_rule() {
        let rules = RuleSet::defaults();
        let t = py_assign(
            "T",
            "TypeVar('T')",
            ValueShape::Call {
                callee: "TypeVar".to_string(),
            },
        );
        assert_eq!(evaluate(&t, ContextLabel::TypeVar, &rules), None);
    }

    #[test]
    fn test_constant_casing() {
        let rules = RuleSet::defaults();
        let constant = py_assign("MAX__RETRIES", "3", ValueShape::Literal);
        let violation = evaluate(&constant, ContextLabel::Constant, &rules).unwrap();
        assert_eq!(violation.rule_id, "constants.style");
        assert_eq!(violation.suggested_name.as_deref(), Some("MAX_RETRIES"));
    }

    #[test]
    fn test_globally_excepted_names_never_violate() {
        let rules = RuleSet::defaults();
        assert!(evaluate_all(&py_func("__init__"), ContextLabel::RegularFunction, &rules).is_empty());
        assert!(evaluate_all(&py_func("main"), ContextLabel::RegularFunction, &rules).is_empty());
    }

    #[test]
    fn test_suggestion_is_self_consistent() {
        let rules = RuleSet::defaults();
        for name in ["userData", "payment", "users_list", "widget"] {
            let decl = py_func(name);
            let violation = evaluate(&decl, ContextLabel::RegularFunction, &rules).unwrap();
            let renamed = decl.renamed(violation.suggested_name.unwrap());
            let again = evaluate_all(&renamed, ContextLabel::RegularFunction, &rules);
            assert!(
                again.iter().all(|v| v.rule_id != violation.rule_id),
                "{name} -> {} still violates",
                renamed.name
            );
        }
    }
}

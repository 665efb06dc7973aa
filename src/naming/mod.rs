//! Naming grammar: casing, verb taxonomy, rules and their evaluation.

pub mod casing;
pub mod engine;
pub mod rules;
pub mod verbs;

pub use casing::CaseStyle;
pub use engine::{evaluate, evaluate_all, Violation};
pub use rules::{
    ContextSelector, ExceptionSet, KindFilter, NamingRule, Requirement, RuleCategory, RuleSet,
};

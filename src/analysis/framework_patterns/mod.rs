//! Framework Detection
//!
//! Scans a project's import statements and idiomatic code patterns to decide
//! which frameworks are in use and which project-wide naming idioms follow.
//!
//! # Example
//!
//! ```ignore
//! use grammarops::analysis::framework_patterns::FrameworkDetector;
//!
//! let profile = FrameworkDetector::new().detect(&files);
//! println!("{}", profile.report());
//! ```

pub mod detector;
pub mod patterns;

pub use detector::{CliStyle, FrameworkDetector, FrameworkProfile, IdiomFlags};
pub use patterns::{Framework, Idiom};

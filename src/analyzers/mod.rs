//! Per-language declaration extraction on top of tree-sitter.

use crate::core::{Declaration, Language, Result, SourceFile};
use tree_sitter::Tree;

pub mod parser;
pub mod python;
pub mod typescript;

pub use python::PythonExtractor;
pub use typescript::EcmaScriptExtractor;

/// Turns a parsed tree into the declarations the classifier consumes.
pub trait DeclarationExtractor: Send + Sync {
    fn extract(&self, tree: &Tree, file: &SourceFile) -> Vec<Declaration>;
    fn language(&self) -> Language;
}

pub fn extractor_for(language: Language) -> Box<dyn DeclarationExtractor> {
    match language {
        Language::Python => Box::new(PythonExtractor),
        Language::JavaScript | Language::TypeScript => {
            Box::new(EcmaScriptExtractor::new(language))
        }
    }
}

/// Parse a source file, failing with a parse error on syntax errors
pub fn parse_file(file: &SourceFile) -> Result<Tree> {
    parser::parse_source(&file.content, &file.path, file.language)
}

/// Parse and walk one file. Declarations come back in source order.
pub fn extract_declarations(file: &SourceFile) -> Result<Vec<Declaration>> {
    let tree = parse_file(file)?;
    let mut declarations = extractor_for(file.language).extract(&tree, file);
    declarations.sort_by_key(|d| d.location.line);
    log::debug!(
        "Extracted {} declarations from {}",
        declarations.len(),
        file.path.display()
    );
    Ok(declarations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;

    #[test]
    fn test_extract_declarations_rejects_syntax_errors() {
        let file = SourceFile::new("broken.ts", Language::TypeScript, "function (");
        let result = extract_declarations(&file);
        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[test]
    fn test_declarations_sorted_by_line() {
        let file = SourceFile::new(
            "m.py",
            Language::Python,
            "class A:\n    def b(self):\n        pass\n\nX = 1\n\ndef c():\n    pass\n",
        );
        let decls = extract_declarations(&file).unwrap();
        let lines: Vec<_> = decls.iter().map(|d| d.location.line).collect();
        assert_eq!(lines, vec![2, 5, 7]);
    }

    #[test]
    fn test_extractor_language() {
        assert_eq!(extractor_for(Language::Python).language(), Language::Python);
        assert_eq!(
            extractor_for(Language::TypeScript).language(),
            Language::TypeScript
        );
    }
}

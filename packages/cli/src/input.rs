//! Loading input files and parsing flag values.

use std::path::Path;

use nusach_engine::config::MAX_INPUT_SIZE;
use nusach_engine::{
    DocumentKind, EngineError, GenderEngine, GenderProfile, RuleTable, SectionRecord,
    VariableContext,
};

use crate::error::{CliError, Result};

fn load_error(what: &'static str, path: &Path, source: EngineError) -> CliError {
    CliError::Load {
        what,
        path: path.display().to_string(),
        source,
    }
}

/// Read a template file.
pub fn load_template(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| load_error("template", path, EngineError::IoError(e)))?;
    if content.len() > MAX_INPUT_SIZE {
        return Err(load_error(
            "template",
            path,
            EngineError::LoadError(format!(
                "Template too large: {} bytes (max {MAX_INPUT_SIZE})",
                content.len()
            )),
        ));
    }
    Ok(content)
}

/// Read form data; no file means an empty context.
pub fn load_context(path: Option<&Path>) -> Result<VariableContext> {
    match path {
        Some(path) => {
            VariableContext::from_path(path).map_err(|e| load_error("context", path, e))
        }
        None => Ok(VariableContext::new()),
    }
}

/// Read a section catalog.
pub fn load_records(path: &Path) -> Result<Vec<SectionRecord>> {
    SectionRecord::list_from_path(path).map_err(|e| load_error("sections", path, e))
}

/// Build the engine for a document kind, appending rules from `rules` if given.
pub fn load_engine(kind: DocumentKind, rules: Option<&Path>) -> Result<GenderEngine> {
    let engine = GenderEngine::for_document(kind);
    match rules {
        Some(path) => {
            let extra = RuleTable::from_path(path).map_err(|e| load_error("rule table", path, e))?;
            tracing::debug!(rules = extra.len(), path = %path.display(), "Loaded extra rules");
            engine
                .with_extra_rules(extra)
                .map_err(|e| load_error("rule table", path, e))
        }
        None => Ok(engine),
    }
}

/// Parse a `--profile` value.
pub fn parse_profile(value: &str) -> std::result::Result<GenderProfile, String> {
    GenderProfile::parse(value).ok_or_else(|| {
        format!("unknown gender profile '{value}' (expected male, female, plural or organization)")
    })
}

/// Parse a `--kind` value.
pub fn parse_kind(value: &str) -> std::result::Result<DocumentKind, String> {
    value.parse()
}

/// Parse a `NAME=PROFILE` pair, as used by `--actor` and `--section`.
pub fn parse_actor_profile(value: &str) -> std::result::Result<(String, GenderProfile), String> {
    let (name, profile) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PROFILE, got '{value}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in '{value}'"));
    }
    Ok((name.to_string(), parse_profile(profile)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_parse_profile() {
        assert_eq!(parse_profile("female"), Ok(GenderProfile::Female));
        assert_eq!(parse_profile("נקבה"), Ok(GenderProfile::Female));
        assert!(parse_profile("neutral").unwrap_err().contains("neutral"));
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("power_of_attorney"), Ok(DocumentKind::PowerOfAttorney));
        assert!(parse_kind("lease").is_err());
    }

    #[test]
    fn test_parse_actor_profile() {
        assert_eq!(
            parse_actor_profile("seller = plural"),
            Ok(("seller".to_string(), GenderProfile::Plural))
        );
        assert!(parse_actor_profile("seller").is_err());
        assert!(parse_actor_profile("=female").is_err());
        assert!(parse_actor_profile("seller=x").is_err());
    }

    #[test]
    fn test_load_context_none_is_empty() {
        assert!(load_context(None).unwrap().is_empty());
    }

    #[test]
    fn test_load_context_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"name": "דנה", "has_car": true}}"#).unwrap();

        let ctx = load_context(Some(file.path())).unwrap();
        assert_eq!(ctx.text("name"), "דנה");
        assert!(ctx.is_truthy("has_car"));
    }

    #[test]
    fn test_load_missing_template_names_file() {
        let err = load_template(Path::new("/nonexistent/template.txt")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/template.txt"));
    }

    #[test]
    fn test_load_engine_with_rules() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "rules:\n  - find: היא\n    replace: זו").unwrap();

        let engine = load_engine(DocumentKind::General, Some(file.path())).unwrap();
        assert_eq!(engine.apply("הוא", GenderProfile::Female), "זו");
    }

    #[test]
    fn test_load_engine_invalid_rules() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "rules:\n  - find: ''\n    replace: x").unwrap();

        let err = load_engine(DocumentKind::General, Some(file.path())).unwrap_err();
        assert!(matches!(err, CliError::Load { what: "rule table", .. }));
    }

    #[test]
    fn test_load_engine_rules_conflicting_with_builtin() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "rules:\n  - word: היא\n    forms: [היא, הוא, הם]").unwrap();

        let err = load_engine(DocumentKind::General, Some(file.path())).unwrap_err();
        assert!(matches!(err, CliError::Load { what: "rule table", .. }));
    }
}

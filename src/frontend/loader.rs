use crate::error::{IsuprofError, Result};
use crate::frontend::ast::{File, ImportName, NodeId};
use crate::frontend::lexer::Lexer;
use crate::frontend::parser::Parser;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

/// One parsed source file of the package.
#[derive(Debug, Clone)]
pub struct Unit {
    /// File name without directory; the rewritten unit keeps it.
    pub filename: String,
    /// Path used in diagnostics.
    pub path: String,
    pub source: String,
    pub file: File,
    /// Import path to how this file binds it.
    pub imports: BTreeMap<String, ImportName>,
}

/// Timing information from loading a directory.
#[derive(Debug, Clone, Default)]
pub struct LoadTimings {
    pub lexer: Duration,
    pub parser: Duration,
}

/// Lists the Go source files of `dir`, sorted by name. Test files are
/// excluded.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| IsuprofError::Load(format!("failed to read directory '{}': {}", dir.display(), e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| IsuprofError::Load(format!("failed to read directory '{}': {}", dir.display(), e)))?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".go") || name.ends_with("_test.go") || !path.is_file() {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Parses every Go file of `dir` and returns the units of the selected
/// package: `package` if given, else `main` if present, else the only one.
pub fn load_units(dir: &Path, package: Option<&str>) -> Result<(String, Vec<Unit>)> {
    let files = discover(dir)?;
    if files.is_empty() {
        return Err(IsuprofError::Load(format!(
            "no Go source files in '{}'",
            dir.display()
        )));
    }

    let mut timings = LoadTimings::default();
    let mut next_id: NodeId = 0;
    let mut units = Vec::with_capacity(files.len());
    for path in &files {
        let (unit, end_id) = parse_unit(path, next_id, &mut timings)?;
        next_id = end_id;
        units.push(unit);
    }
    debug!(
        files = units.len(),
        lexer_us = timings.lexer.as_micros() as u64,
        parser_us = timings.parser.as_micros() as u64,
        "parsed directory"
    );

    let name = select_package(&units, package)?;
    units.retain(|u| u.file.package.name == name);
    Ok((name, units))
}

fn parse_unit(path: &Path, base_id: NodeId, timings: &mut LoadTimings) -> Result<(Unit, NodeId)> {
    let source = fs::read_to_string(path)
        .map_err(|e| IsuprofError::Load(format!("failed to read '{}': {}", path.display(), e)))?;
    let display = path.to_string_lossy().to_string();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| display.clone());

    let start = Instant::now();
    let mut lexer = Lexer::new(&display, &source);
    let tokens = lexer.scan_tokens().map_err(IsuprofError::Parse)?;
    timings.lexer += start.elapsed();

    let start = Instant::now();
    let mut parser = Parser::new(&display, tokens, base_id);
    let file = parser.parse_file().map_err(IsuprofError::Parse)?;
    let end_id = parser.next_node_id();
    timings.parser += start.elapsed();

    let imports = file
        .imports
        .iter()
        .map(|spec| (spec.path.clone(), spec.name.clone()))
        .collect();

    Ok((
        Unit {
            filename,
            path: display,
            source,
            file,
            imports,
        },
        end_id,
    ))
}

fn select_package(units: &[Unit], requested: Option<&str>) -> Result<String> {
    let names: BTreeSet<&str> = units.iter().map(|u| u.file.package.name.as_str()).collect();

    if let Some(requested) = requested {
        if names.contains(requested) {
            return Ok(requested.to_string());
        }
        return Err(IsuprofError::Load(format!(
            "package '{}' not found (found: {})",
            requested,
            names.into_iter().collect::<Vec<_>>().join(", ")
        )));
    }
    if names.contains("main") {
        return Ok("main".to_string());
    }
    if names.len() == 1 {
        if let Some(only) = names.first() {
            return Ok(only.to_string());
        }
    }
    Err(IsuprofError::Load(format!(
        "multiple packages found ({}); set `package` in isuprof.toml",
        names.into_iter().collect::<Vec<_>>().join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::visit::file_roots;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "b.go", "package main\n");
        write(&dir, "a.go", "package main\n");
        write(&dir, "a_test.go", "package main\n");
        write(&dir, "notes.txt", "");
        fs::create_dir(dir.path().join("sub.go")).unwrap();

        let files = discover(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.go", "b.go"]);
    }

    #[test]
    fn test_node_ids_unique_across_files() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "a.go", "package main\n\nfunc a() { b(1, 2) }\n");
        write(&dir, "b.go", "package main\n\nfunc b(x, y int) { a() }\n");

        let (_, units) = load_units(dir.path(), None).unwrap();
        let mut seen = HashSet::new();
        for unit in &units {
            file_roots(&unit.file, &mut |e| {
                assert!(seen.insert(e.id()), "duplicate node id {}", e.id());
            });
        }
        assert!(seen.len() >= 2);
    }

    #[test]
    fn test_select_package() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "a.go", "package main\n");
        write(&dir, "doc.go", "package other\n");

        let (name, units) = load_units(dir.path(), None).unwrap();
        assert_eq!(name, "main");
        assert_eq!(units.len(), 1);

        let (name, units) = load_units(dir.path(), Some("other")).unwrap();
        assert_eq!(name, "other");
        assert_eq!(units[0].filename, "doc.go");

        let err = load_units(dir.path(), Some("missing")).unwrap_err();
        assert!(matches!(err, IsuprofError::Load(_)));
    }

    #[test]
    fn test_ambiguous_packages() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "a.go", "package alpha\n");
        write(&dir, "b.go", "package beta\n");
        let err = load_units(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("multiple packages"));
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_units(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("no Go source files"));
    }

    #[test]
    fn test_parse_error_has_location() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "bad.go", "package main\n\nfunc main() {\n\tx := \n}\n");
        let err = load_units(dir.path(), None).unwrap_err();
        let IsuprofError::Parse(message) = err else {
            panic!("expected parse error");
        };
        assert!(message.contains("bad.go:"));
    }

    #[test]
    fn test_imports_recorded() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir,
            "main.go",
            "package main\n\nimport (\n\t\"fmt\"\n\tstr \"strings\"\n\t. \"math\"\n\t_ \"os\"\n)\n",
        );
        let (_, units) = load_units(dir.path(), None).unwrap();
        let imports = &units[0].imports;
        assert_eq!(imports["fmt"], ImportName::Default);
        assert_eq!(imports["strings"], ImportName::Alias("str".to_string()));
        assert_eq!(imports["math"], ImportName::Dot);
        assert_eq!(imports["os"], ImportName::Blank);
    }
}

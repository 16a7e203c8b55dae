//! Call-site instrumentation: signature registry, wrapper generation,
//! rewriting and emission.

pub mod emitter;
pub mod generator;
pub mod names;
pub mod registry;
pub mod rewriter;
pub mod signature;

use crate::config::Config;
use crate::error::{IsuprofError, Result};
use crate::frontend::load_package;
use emitter::{Output, generated_unit, rewrite_unit, write_outputs};
use generator::WrapperTable;
use names::{NameResolver, package_scope};
use registry::SignatureRegistry;
use rewriter::{RewriteStats, Rewriter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Summary of a finished run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Number of source files processed.
    pub files: usize,
    pub rewritten: usize,
    pub skipped: usize,
    /// Distinct wrappers generated.
    pub wrappers: usize,
    /// Files written, generated unit last.
    pub outputs: Vec<PathBuf>,
}

/// One instrumentation run over a package directory.
pub struct Instrumenter {
    config: Config,
    output_dir: PathBuf,
}

impl Instrumenter {
    pub fn new(config: Config, output_dir: PathBuf) -> Self {
        Self { config, output_dir }
    }

    pub fn run(&self, dir: &Path) -> Result<Report> {
        let started = Instant::now();
        let mut package = load_package(dir, &self.config)?;

        let generated = &self.config.generated_file;
        if package.units.iter().any(|unit| &unit.filename == generated) {
            return Err(IsuprofError::Config(format!(
                "generated_file `{}` would overwrite a source file of the package",
                generated
            )));
        }

        let mut registry = SignatureRegistry::new();
        let mut wrappers = WrapperTable::new();
        let mut names = NameResolver::new(&package.types.stubs, package_scope(&package.units));
        let mut totals = RewriteStats::default();

        for unit in &mut package.units {
            names.enter_unit(&unit.imports);
            let stats = Rewriter::new(
                &package.types,
                &mut registry,
                &mut wrappers,
                &mut names,
                &unit.path,
            )
            .rewrite_file(&mut unit.file)?;
            totals.rewritten += stats.rewritten;
            totals.skipped += stats.skipped;
            totals.untouched += stats.untouched;
        }

        let mut outputs: Vec<Output> = package
            .units
            .iter()
            .map(|unit| Output {
                path: self.output_dir.join(&unit.filename),
                contents: rewrite_unit(unit),
            })
            .collect();
        outputs.push(Output {
            path: self.output_dir.join(generated),
            contents: generated_unit(&package.name, &self.config.build_tag, &wrappers, &mut names),
        });
        write_outputs(&outputs)?;

        info!(
            package = %package.name,
            rewritten = totals.rewritten,
            skipped = totals.skipped,
            wrappers = wrappers.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "instrumented package"
        );
        Ok(Report {
            files: package.units.len(),
            rewritten: totals.rewritten,
            skipped: totals.skipped,
            wrappers: wrappers.len(),
            outputs: outputs.into_iter().map(|o| o.path).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn run(files: &[(&str, &str)], config: Config) -> (tempfile::TempDir, Result<Report>) {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();
        for (name, contents) in files {
            fs::write(src.join(name), contents).unwrap();
        }
        let out = dir.path().join("build");
        let report = Instrumenter::new(config, out).run(&src);
        (dir, report)
    }

    #[test]
    fn test_shared_wrapper_across_units() {
        let (dir, report) = run(
            &[
                ("a.go", "package main\n\nfunc add(a, b int) int { return a + b }\n\nfunc main() {\n\tadd(1, 2)\n\tsub(3, 4)\n}\n"),
                ("b.go", "package main\n\nfunc sub(a, b int) int { return a - b }\n"),
            ],
            Config::default(),
        );
        let report = report.unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.rewritten, 2);
        assert_eq!(report.wrappers, 1);

        let a = fs::read_to_string(dir.path().join("build/a.go")).unwrap();
        let generated = fs::read_to_string(dir.path().join("build/isuprof_generated.go")).unwrap();
        let wrapper = generated
            .lines()
            .find_map(|l| l.strip_prefix("func _isuprofWrapper"))
            .and_then(|rest| rest.split('(').next())
            .unwrap()
            .to_string();
        assert!(a.contains(&format!("\t_isuprofWrapper{}(add, 1, 2)\n", wrapper)));
        assert!(a.contains(&format!("\t_isuprofWrapper{}(sub, 3, 4)\n", wrapper)));
        assert_eq!(
            fs::read_to_string(dir.path().join("build/b.go")).unwrap(),
            "package main\n\nfunc sub(a, b int) int { return a - b }\n"
        );
    }

    #[test]
    fn test_generated_file_name_collision() {
        let (dir, report) = run(
            &[("isuprof_generated.go", "package main\n\nfunc main() {}\n")],
            Config::default(),
        );
        assert!(matches!(report, Err(IsuprofError::Config(_))));
        assert!(!dir.path().join("build").exists());
    }

    #[test]
    fn test_failed_run_writes_nothing() {
        let (dir, report) = run(
            &[
                ("a.go", "package main\n\nfunc main() { helper() }\n"),
                ("b.go", "package main\n\nfunc other() { undefined() }\n"),
            ],
            Config::default(),
        );
        assert!(matches!(report, Err(IsuprofError::TypeCheck(_))));
        assert!(!dir.path().join("build").exists());
    }

    #[test]
    fn test_dot_import_alias_in_generated_unit() {
        let source = "package main\n\nimport . \"strings\"\n\nfunc main() {\n\tr := NewReplacer(\"a\", \"b\")\n\t_ = r\n\tsplit := Split\n\t_ = split(\"a,b\", \",\")\n}\n";
        let (dir, report) = run(&[("main.go", source)], Config::default());
        report.unwrap();
        let generated = fs::read_to_string(dir.path().join("build/isuprof_generated.go")).unwrap();
        assert!(generated.contains("\t_isuprof_strings \"strings\"\n"));
        assert!(generated.contains("*_isuprof_strings.Replacer"));
    }

    #[test]
    fn test_unsafe_pointer_signature_imports_unsafe() {
        let source = "package main\n\nimport \"unsafe\"\n\nfunc addr(p unsafe.Pointer) uintptr { return uintptr(p) }\n\nfunc main() {\n\tx := 1\n\t_ = addr(unsafe.Pointer(&x))\n\t_ = unsafe.Sizeof(x)\n}\n";
        let (dir, report) = run(&[("main.go", source)], Config::default());
        let report = report.unwrap();
        assert_eq!(report.rewritten, 1);
        assert_eq!(report.wrappers, 1);
        let generated = fs::read_to_string(dir.path().join("build/isuprof_generated.go")).unwrap();
        assert!(generated.contains("\t\"time\"\n\t\"unsafe\"\n)\n"));
        assert!(generated.contains("(a func(unsafe.Pointer) uintptr, p0 unsafe.Pointer) (r0 uintptr)"));
    }

    #[test]
    fn test_custom_tag_and_file_name() {
        let config = Config::parse("build_tag = \"bench\"\ngenerated_file = \"zz_prof.go\"\n").unwrap();
        let (dir, report) = run(&[("main.go", "package main\n\nfunc main() {}\n")], config);
        let report = report.unwrap();
        assert_eq!(report.wrappers, 0);
        let generated = fs::read_to_string(dir.path().join("build/zz_prof.go")).unwrap();
        assert!(generated.starts_with("//go:build bench\n// +build bench\n"));
        assert!(!generated.contains("reflect"));
    }
}

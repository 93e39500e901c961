//! Build-script driver
//!
//! Lists the source files holding adapters explicitly, generates one
//! `{stem}_pipelines.rs` per source under `OUT_DIR`, and reports what was
//! written. Include the output next to the adapters:
//!
//! ```ignore
//! include!(concat!(env!("OUT_DIR"), "/adapters_pipelines.rs"));
//! ```

use std::path::{Path, PathBuf};

use crate::config::GeneratorConfig;
use crate::error::{CodegenError, Result};
use crate::frontend::Diagnostic;

/// First line of every generated file
pub const GENERATED_HEADER: &str = "// @generated by beacon-codegen. Do not edit.";

/// One output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Source the wrappers were generated from
    pub source: PathBuf,
    /// Output path
    pub output: PathBuf,
    /// Wrapper names in the file
    pub wrappers: Vec<String>,
    /// False when the existing file already had this content
    pub written: bool,
}

/// Summary of a build-script run
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Output files, one per source
    pub files: Vec<GeneratedFile>,
    /// Adapters skipped across all sources
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// Wrappers generated across all files
    pub fn wrapper_count(&self) -> usize {
        self.files.iter().map(|file| file.wrappers.len()).sum()
    }
}

/// Generates pipelines for a fixed list of source files
#[derive(Debug, Clone)]
pub struct Builder {
    config: GeneratorConfig,
    config_path: Option<PathBuf>,
    sources: Vec<PathBuf>,
    out_dir: Option<PathBuf>,
    cargo_directives: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Builder with the default configuration
    pub fn new() -> Self {
        Self {
            config: GeneratorConfig::default(),
            config_path: None,
            sources: Vec::new(),
            out_dir: None,
            cargo_directives: true,
        }
    }

    /// Use an explicit configuration
    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a TOML file
    pub fn config_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        self.config = GeneratorConfig::load(path)?;
        self.config_path = Some(path.to_path_buf());
        Ok(self)
    }

    /// Add a source file
    pub fn source(mut self, path: impl AsRef<Path>) -> Self {
        self.sources.push(path.as_ref().to_path_buf());
        self
    }

    /// Add several source files
    pub fn sources(mut self, paths: impl IntoIterator<Item = impl AsRef<Path>>) -> Self {
        self.sources
            .extend(paths.into_iter().map(|path| path.as_ref().to_path_buf()));
        self
    }

    /// Write to `dir` instead of `OUT_DIR`
    pub fn out_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.out_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Print `cargo:` directives (on by default)
    pub fn cargo_directives(mut self, enabled: bool) -> Self {
        self.cargo_directives = enabled;
        self
    }

    /// Generate every source
    pub fn generate(&self) -> Result<Report> {
        self.config.validate()?;
        let out_dir = match &self.out_dir {
            Some(dir) => dir.clone(),
            None => std::env::var_os("OUT_DIR")
                .map(PathBuf::from)
                .ok_or(CodegenError::MissingOutDir)?,
        };
        std::fs::create_dir_all(&out_dir).map_err(|err| CodegenError::io(&out_dir, err))?;

        if let Some(path) = &self.config_path {
            self.directive(format!("rerun-if-changed={}", path.display()));
        }

        let mut report = Report::default();
        for source in &self.sources {
            self.directive(format!("rerun-if-changed={}", source.display()));
            let (file, diagnostics) = self.generate_one(source, &out_dir)?;
            for diagnostic in &diagnostics {
                self.directive(format!("warning={diagnostic}"));
            }
            report.diagnostics.extend(diagnostics);
            report.files.push(file);
        }

        tracing::info!(
            files = report.files.len(),
            wrappers = report.wrapper_count(),
            skipped = report.diagnostics.len(),
            "adapter pipelines generated"
        );
        Ok(report)
    }

    fn generate_one(&self, source: &Path, out_dir: &Path) -> Result<(GeneratedFile, Vec<Diagnostic>)> {
        let text = std::fs::read_to_string(source).map_err(|err| CodegenError::io(source, err))?;
        let parsed = syn::parse_file(&text).map_err(|err| CodegenError::parse(source, err))?;
        let stem = source
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("adapters");

        let mut expansion = crate::expand(&parsed.items, stem, &self.config);
        // Emitted text must parse before it lands in OUT_DIR.
        expansion.tokens()?;
        for diagnostic in &mut expansion.diagnostics {
            diagnostic.location.file = source.display().to_string();
        }

        let mut contents = format!("{GENERATED_HEADER}\n");
        if !expansion.wrappers.is_empty() {
            contents.push('\n');
            contents.push_str(&expansion.source_text());
        }

        let output = out_dir.join(format!("{stem}_pipelines.rs"));
        let written = write_if_changed(&output, &contents)?;
        tracing::debug!(
            source = %source.display(),
            output = %output.display(),
            written,
            "pipeline file"
        );

        let file = GeneratedFile {
            source: source.to_path_buf(),
            output,
            wrappers: expansion
                .wrappers
                .iter()
                .map(|wrapper| wrapper.wrapper.clone())
                .collect(),
            written,
        };
        Ok((file, expansion.diagnostics))
    }

    fn directive(&self, directive: String) {
        if self.cargo_directives {
            println!("cargo:{directive}");
        }
    }
}

/// Write `contents` unless the file already holds exactly that
fn write_if_changed(path: &Path, contents: &str) -> Result<bool> {
    if let Ok(existing) = std::fs::read_to_string(path) {
        if existing == contents {
            return Ok(false);
        }
    }
    std::fs::write(path, contents).map_err(|err| CodegenError::io(path, err))?;
    Ok(true)
}

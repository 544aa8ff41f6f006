//! Page assembly: from a directory of sources to a directory of pages.
//!
//! Each source file is highlighted, annotated and poured into the shared
//! template along with its title, back-navigation and the build stamp. The
//! document named by `home` becomes `index.html` and gets no back-navigation.
//!
//! Failing to list the sources or load the template stops the run. A page that
//! can't be read or written is logged and counted, and the run moves on.

use crate::annotation::{AnnotationRule, CompiledRules};
use crate::config::{Configuration, Site};
use crate::highlight::{highlight_or_original, Highlight, SyntectHighlighter};
use crate::template::{Fragments, Placeholder, Template};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use globset::{Glob, GlobMatcher};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

/// A source file to publish.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceDocument {
    /// File name without its extension
    pub name: String,
    pub path: PathBuf,
}

/// Statistics from rendering a site, used for user feedback.
#[derive(Debug, Default)]
pub struct RenderStats {
    /// Pages written successfully
    pub written: Vec<PathBuf>,
    /// Sources whose page couldn't be produced
    pub failed: Vec<PathBuf>,
}

/// The build stamp shared by every page of a run, `YYYY.MMDD.HHMM`.
pub fn version_stamp(at: NaiveDateTime) -> String {
    at.format("%Y.%m%d.%H%M").to_string()
}

/// `prefix` followed by `name` with its first letter uppercased and the rest
/// lowercased.
pub fn page_title(prefix: &str, name: &str) -> String {
    let mut chars = name.chars();
    let name: String = match chars.next() {
        None => String::new(),
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
    };
    format!("{prefix}{name}")
}

pub fn compile_block_globs(patterns: &[String]) -> Result<Vec<GlobMatcher>> {
    patterns
        .iter()
        .map(|pattern| {
            Glob::new(pattern)
                .with_context(|| format!("Invalid glob pattern: {}", pattern))
                .map(|g| g.compile_matcher())
        })
        .collect()
}

/// List the files directly inside `dir` with the given extension, skipping
/// hidden and ignored files and anything a block glob matches.
pub fn discover(dir: &Path, extension: &str, block: &[GlobMatcher]) -> Result<Vec<SourceDocument>> {
    use ignore::WalkBuilder;

    let mut documents = Vec::new();
    for entry in WalkBuilder::new(dir).max_depth(Some(1)).build() {
        let entry = entry
            .with_context(|| format!("Failed to list source directory {}", dir.display()))?;
        let path = entry.path();

        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let relative = path.strip_prefix(dir).unwrap_or(path);
        if block.iter().any(|glob| glob.is_match(relative)) {
            log::debug!("Blocked {}", path.display());
            continue;
        }

        let name = match path.file_stem().and_then(|s| s.to_str()) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                log::warn!("Skipping {}: no usable document name", path.display());
                continue;
            }
        };

        documents.push(SourceDocument {
            name,
            path: entry.into_path(),
        });
    }

    documents.sort();
    Ok(documents)
}

/// Turns source documents into finished pages.
pub struct Assembler<'a> {
    site: &'a Site,
    rules: CompiledRules,
    template: Template,
    highlighter: &'a dyn Highlight,
    version: String,
}

impl<'a> Assembler<'a> {
    pub fn new(
        site: &'a Site,
        rules: &[AnnotationRule],
        template: Template,
        highlighter: &'a dyn Highlight,
        version: String,
    ) -> Assembler<'a> {
        let used = template.placeholders();
        for placeholder in Placeholder::all() {
            if !used.contains(&placeholder.key()) {
                log::warn!("Template doesn't use the {placeholder} placeholder");
            }
        }
        for key in used.iter() {
            if !Placeholder::all().iter().any(|p| p.key() == *key) {
                log::warn!("Template placeholder {{{{{key}}}}} will never be filled");
            }
        }

        let rules = CompiledRules::compile(rules);
        log::debug!("Compiled {} annotation patterns", rules.pattern_count());

        Assembler {
            site,
            rules,
            template,
            highlighter,
            version,
        }
    }

    fn is_home(&self, document: &SourceDocument) -> bool {
        document.name == self.site.home
    }

    pub fn output_path(&self, document: &SourceDocument) -> PathBuf {
        let name = if self.is_home(document) {
            "index"
        } else {
            document.name.as_str()
        };
        self.site.output_dir.join(format!("{name}.html"))
    }

    pub fn fragments(&self, document: &SourceDocument, source: &str) -> Fragments {
        let highlighted = highlight_or_original(self.highlighter, source, &self.site.language);
        let go_back = if self.is_home(document) {
            ""
        } else {
            self.site.go_back.as_str()
        };

        let mut fragments = Fragments::new();
        fragments
            .set(Placeholder::Code, self.rules.annotate(&highlighted))
            .set(Placeholder::File, document.name.as_str())
            .set(Placeholder::GoBack, go_back)
            .set(Placeholder::Version, self.version.as_str())
            .set(
                Placeholder::Title,
                page_title(&self.site.title_prefix, &document.name),
            );
        fragments
    }

    pub fn render(&self, document: &SourceDocument, source: &str) -> String {
        self.template.render(&self.fragments(document, source))
    }

    fn write_page(&self, document: &SourceDocument) -> Result<PathBuf> {
        let source = std::fs::read_to_string(&document.path)
            .with_context(|| format!("Failed to read {}", document.path.display()))?;
        let page = self.render(document, &source);

        let out = self.output_path(document);
        std::fs::write(&out, page).with_context(|| format!("Failed to write {}", out.display()))?;
        Ok(out)
    }

    /// Write a page for every document. Documents that fail are logged and
    /// recorded in the stats without stopping the others.
    pub fn run(&self, documents: &[SourceDocument], progress: &ProgressBar) -> Result<RenderStats> {
        std::fs::create_dir_all(&self.site.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                self.site.output_dir.display()
            )
        })?;

        let mut stats = RenderStats::default();
        for document in documents {
            progress.set_message(document.name.clone());
            log::debug!("Rendering {}", document.path.display());

            match self.write_page(document) {
                Ok(out) => {
                    log::info!("Wrote {}", out.display());
                    stats.written.push(out);
                }
                Err(e) => {
                    log::error!("Skipping {}: {e:#}", document.path.display());
                    stats.failed.push(document.path.clone());
                }
            }
            progress.inc(1);
        }

        Ok(stats)
    }
}

/// Render every page described by `config`.
pub fn render_site(config: &Configuration, progress: &ProgressBar) -> Result<RenderStats> {
    let site = &config.site;
    let version = version_stamp(chrono::Local::now().naive_local());

    let block = compile_block_globs(&site.block_globs)?;
    let documents = discover(&site.source_dir, &site.extension, &block)?;
    let template = Template::load(&site.template)?;
    let highlighter =
        SyntectHighlighter::new(site.theme).with_context(|| "Failed to load highlighter")?;

    progress.set_length(documents.len() as u64);
    let assembler = Assembler::new(site, &config.rules, template, &highlighter, version);
    assembler.run(&documents, progress)
}

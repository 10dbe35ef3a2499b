//! Taskrc loader: line parser, include splicing and override merging.

use super::include::{IncludeSearchPaths, expand_home};
use super::merge::deep_merge;
use super::tree::{ConfigTree, TreeBuilder};
use crate::error::{Error, Result};
use crate::fields::UdaRegistry;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the taskrc file.
pub const TASKRC_ENV: &str = "TASKRC";

/// Default taskrc location for the current user (`$TASKRC` or `~/.taskrc`).
pub fn default_taskrc_path() -> Option<PathBuf> {
    std::env::var_os(TASKRC_ENV)
        .filter(|v| !v.is_empty())
        .map(|v| expand_home(&v.to_string_lossy()))
        .or_else(|| dirs::home_dir().map(|h| h.join(".taskrc")))
}

/// A parsed taskrc.
///
/// The merged settings are exposed as an immutable [`ConfigTree`]; lines that
/// were skipped during parsing are kept as `diagnostics`.
#[derive(Debug)]
pub struct TaskRc {
    path: Option<PathBuf>,
    tree: ConfigTree,
    diagnostics: Vec<Error>,
}

impl TaskRc {
    /// Load a taskrc using search paths discovered from the environment.
    pub fn load(path: impl AsRef<Path>, overrides: ConfigTree) -> Result<Self> {
        Self::build(path, overrides, &IncludeSearchPaths::discover())
    }

    /// Load a taskrc with explicit include search paths.
    ///
    /// Fails only when `path` (or a resolved include) cannot be read, or when
    /// includes form a cycle. Unresolvable includes and malformed lines are
    /// logged, recorded in [`TaskRc::diagnostics`] and skipped.
    pub fn build(
        path: impl AsRef<Path>,
        overrides: ConfigTree,
        search: &IncludeSearchPaths,
    ) -> Result<Self> {
        let path = normalize(&expand_home(&path.as_ref().to_string_lossy()));
        let mut parser = Parser {
            search,
            stack: Vec::new(),
            diagnostics: Vec::new(),
        };
        let parsed = parser.read(&path)?;
        Ok(Self {
            path: Some(path),
            tree: deep_merge(parsed, overrides),
            diagnostics: parser.diagnostics,
        })
    }

    /// A taskrc backed by no file, holding only `overrides`.
    pub fn from_tree(overrides: ConfigTree) -> Self {
        Self {
            path: None,
            tree: overrides,
            diagnostics: Vec::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn into_tree(self) -> ConfigTree {
        self.tree
    }

    /// Recoverable problems hit while parsing, in file order.
    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    pub fn get(&self, dotted: &str) -> Option<&str> {
        self.tree.get_path(dotted)
    }

    /// User-defined attributes declared under `uda.*`.
    pub fn udas(&self) -> UdaRegistry {
        UdaRegistry::from_config(&self.tree)
    }
}

impl std::fmt::Display for TaskRc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "TaskRc file at {}", path.display()),
            None => write!(f, "TaskRc without file"),
        }
    }
}

struct Parser<'a> {
    search: &'a IncludeSearchPaths,
    /// Files currently being read, outermost first.
    stack: Vec<PathBuf>,
    diagnostics: Vec<Error>,
}

impl Parser<'_> {
    fn read(&mut self, path: &Path) -> Result<ConfigTree> {
        let identity = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if self.stack.contains(&identity) {
            let mut chain = self.stack.clone();
            chain.push(identity);
            return Err(Error::IncludeCycle { chain });
        }

        let content = std::fs::read_to_string(path).map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Parsing taskrc {}", path.display());

        self.stack.push(identity);
        let result = self.parse(path, &content);
        self.stack.pop();
        result
    }

    fn parse(&mut self, path: &Path, content: &str) -> Result<ConfigTree> {
        let mut builder = TreeBuilder::new();

        for (index, raw_line) in content.lines().enumerate() {
            let line = sanitize(raw_line);
            if line.is_empty() {
                continue;
            }

            if let Some(target) = line.strip_prefix("include ") {
                let target = target.trim();
                match self.search.resolve(target, Some(path)) {
                    Ok(resolved) => {
                        let included = self.read(&resolved)?;
                        builder = deep_merge(builder.freeze(), included).into_builder();
                    }
                    Err(err) => {
                        warn!(
                            "Error encountered while adding TaskRc at '{}' (from TaskRc file at '{}'): {}",
                            target,
                            path.display(),
                            err
                        );
                        self.diagnostics.push(err);
                    }
                }
                continue;
            }

            match split_setting(&line) {
                Some((key, value)) => builder.set_dotted(key, value.to_string()),
                None => {
                    let err = Error::MalformedLine {
                        path: path.to_path_buf(),
                        line_number: index + 1,
                        line: line.clone(),
                    };
                    warn!(
                        "Error encountered while processing configuration setting '{}' (from TaskRc file at '{}')",
                        line,
                        path.display()
                    );
                    self.diagnostics.push(err);
                }
            }
        }

        Ok(builder.freeze())
    }
}

/// Strip an unescaped `#` comment and surrounding whitespace.
///
/// `\#` yields a literal `#`; other backslashes are kept as written.
pub fn sanitize(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            _ => out.push(c),
        }
    }
    out.trim().to_string()
}

/// Split `key = value` on the first `=`. Keys must have no empty segments.
fn split_setting(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() || key.split('.').any(str::is_empty) {
        return None;
    }
    Some((key, value.trim()))
}

/// Lexically clean `.` components so the recorded path is stable.
fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

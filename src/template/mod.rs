//! Template loading and rendering
//!
//! Compiled handlebars templates live in a process-wide registry that is
//! populated lazily on first use and never evicted. A template identifier
//! is either a bare document path ("util") or a composite "path|section"
//! naming one section of a multi-template document. Documents resolve to
//! `templates/<path>.hbs` under the fetcher's root.
//!
//! Loads for the same path are not deduplicated: concurrent `apply` calls
//! on an uncached id each fetch separately and the last writer into the
//! registry wins. Compiled output for a path is deterministic, so the
//! race is benign.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;

/// Transport failure from a template fetch, HTTP-shaped.
/// Status 0 means the source was unreachable.
#[derive(Debug, Clone, Error)]
#[error("fetch failed with status {status}")]
pub struct FetchError {
    pub status: u16,
    pub body: Option<String>,
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("template compile failed: {0}")]
    Compile(#[from] handlebars::TemplateError),
}

/// Collaborator that retrieves raw template text for a document path.
#[async_trait]
pub trait TemplateFetcher: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<String, FetchError>;
}

/// Reads template documents from `<root>/templates/<path>.hbs`.
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TemplateFetcher for DirFetcher {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let file = self.root.join("templates").join(format!("{}.hbs", path));
        match tokio::fs::read_to_string(&file).await {
            Ok(text) => Ok(text),
            Err(e) => {
                let status = match e.kind() {
                    std::io::ErrorKind::NotFound => 404,
                    std::io::ErrorKind::PermissionDenied => 403,
                    _ => 0,
                };
                tracing::debug!("template read failed for {}: {}", file.display(), e);
                Err(FetchError { status, body: None })
            }
        }
    }
}

/// Where rendered markup goes: a one-shot callback, or appended to a
/// caller-owned buffer.
pub enum TemplateSink<'a> {
    Callback(Box<dyn FnOnce(String) + 'a>),
    Append(&'a mut String),
}

impl<'a> TemplateSink<'a> {
    fn deliver(self, markup: String) {
        match self {
            TemplateSink::Callback(f) => f(markup),
            TemplateSink::Append(buf) => buf.push_str(&markup),
        }
    }
}

/// Cloneable handle to the template cache and loader.
#[derive(Clone)]
pub struct TemplateService {
    inner: Arc<Inner>,
}

struct Inner {
    fetcher: Box<dyn TemplateFetcher>,
    registry: RwLock<Handlebars<'static>>,
}

impl TemplateService {
    pub fn new(fetcher: impl TemplateFetcher + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher: Box::new(fetcher),
                registry: RwLock::new(Handlebars::new()),
            }),
        }
    }

    pub fn has_template(&self, id: &str) -> bool {
        self.inner.registry.read().unwrap().has_template(id)
    }

    /// Renders an already-compiled template. Logs and returns None when
    /// the id is unknown or rendering fails.
    pub fn render_cached<T: Serialize>(&self, id: &str, context: &T) -> Option<String> {
        let registry = self.inner.registry.read().unwrap();
        if !registry.has_template(id) {
            tracing::error!("no compiled template for id {}", id);
            return None;
        }
        match registry.render(id, context) {
            Ok(markup) => Some(markup),
            Err(e) => {
                tracing::error!("render of template {} failed: {}", id, e);
                None
            }
        }
    }

    /// Renders `id` against `context` and delivers the markup through
    /// `sink`. A cached id renders without any I/O; otherwise the owning
    /// document is loaded first (multi mode when the id is composite).
    ///
    /// A composite id that is still unknown after its document loaded is
    /// logged and delivers nothing; the call itself still succeeds.
    pub async fn apply<T: Serialize>(
        &self,
        id: &str,
        context: &T,
        sink: TemplateSink<'_>,
    ) -> Result<(), TemplateError> {
        if !self.has_template(id) {
            let (path, multi) = match id.split_once('|') {
                Some((path, _)) => (path, true),
                None => (id, false),
            };
            self.load(path, multi).await?;
        }
        if let Some(markup) = self.render_cached(id, context) {
            sink.deliver(markup);
        }
        Ok(())
    }

    /// Fetches and compiles one template document. In multi mode the
    /// document is split on `{>name}` marker lines and each section is
    /// registered under `path|name`; otherwise the whole document is
    /// registered under `path`.
    pub async fn load(&self, path: &str, multi: bool) -> Result<(), TemplateError> {
        let source = self.inner.fetcher.fetch(path).await?;
        let mut registry = self.inner.registry.write().unwrap();
        if multi {
            for (name, body) in split_sections(&source) {
                registry.register_template_string(&format!("{}|{}", path, name), body)?;
            }
        } else {
            registry.register_template_string(path, source)?;
        }
        Ok(())
    }

    /// Loads every path in multi mode, concurrently. Individual failures
    /// are logged, never surfaced; the future completes once all loads
    /// have finished either way.
    pub async fn preload(&self, paths: &[String]) {
        let mut handles = Vec::new();
        for path in paths {
            let service = self.clone();
            let path = path.clone();
            handles.push(tokio::spawn(async move {
                if let Err(e) = service.load(&path, true).await {
                    tracing::warn!("preload of template document {} failed: {}", path, e);
                }
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }
}

/// Splits a multi-template document into named sections.
///
/// A section starts at a line of the form `{>name}` (the rest of the
/// marker line after the identifier is discarded). Lines before the
/// first marker belong to no section and are dropped.
fn split_sections(source: &str) -> Vec<(String, String)> {
    let normalized = source.replace("\r\n", "\n").replace('\r', "\n");
    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();
    for line in normalized.split('\n') {
        if let Some(name) = section_marker(line) {
            sections.push((name.to_string(), Vec::new()));
        } else if let Some((_, lines)) = sections.last_mut() {
            lines.push(line);
        }
    }
    sections
        .into_iter()
        .map(|(name, lines)| (name, lines.join("\n")))
        .collect()
}

/// Returns the section name when the line is a `{>name}` marker.
/// The line must end with `}` (trailing whitespace aside); the name is
/// whatever sits before the first closing brace.
fn section_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_end();
    let rest = trimmed.strip_prefix("{>")?;
    if rest.len() < 2 || !trimmed.ends_with('}') {
        return None;
    }
    let end = rest.find('}')?;
    Some(rest[..end].trim())
}

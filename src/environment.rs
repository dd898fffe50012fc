//! Template environment
//!
//! An [`Environment`] bundles a [`Loader`] with compile and render options so
//! templates can be loaded by path and rendered with consistent settings.

use crate::context::Context;
use crate::loader::{normalize_path, LoadError, Loader};
use crate::parser::ast::Template;
use crate::parser::parse::{compile_with, CompileError, CompileOptions};
use crate::render::engine::{RenderOptions, Renderer};
use crate::render::errors::{ErrorKind, RenderError};

/// Any failure of an operation that loads, compiles and renders
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Load(_) => ErrorKind::Io,
            Error::Compile(_) => ErrorKind::Syntax,
            Error::Render(err) => err.kind(),
        }
    }
}

/// Loader plus options shared by every template it serves
#[derive(Debug, Clone, Default)]
pub struct Environment<L> {
    loader: L,
    compile_options: CompileOptions,
    render_options: RenderOptions,
}

impl<L: Loader> Environment<L> {
    pub fn new(loader: L) -> Self {
        Environment {
            loader,
            compile_options: CompileOptions::default(),
            render_options: RenderOptions::default(),
        }
    }

    pub fn with_compile_options(mut self, options: CompileOptions) -> Self {
        self.compile_options = options;
        self
    }

    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn compile_options(&self) -> &CompileOptions {
        &self.compile_options
    }

    pub fn render_options(&self) -> &RenderOptions {
        &self.render_options
    }

    /// Compile template text with this environment's options
    pub fn compile(&self, source: &str) -> Result<Template, CompileError> {
        compile_with(source, &self.compile_options)
    }

    /// Read and compile the template at `path`. The template remembers its
    /// path so a `parse` of itself is caught.
    pub fn load(&self, path: &str) -> Result<Template, Error> {
        let source = self.loader.read_text(path)?;
        let template = self.compile(&source)?;
        Ok(template.with_name(normalize_path(path)))
    }

    pub fn render(&self, template: &Template, context: &mut Context) -> Result<String, RenderError> {
        Renderer::new(context, &self.loader)
            .with_options(self.render_options)
            .with_compile_options(self.compile_options)
            .render(template)
    }

    /// Compile and render template text in one step
    pub fn render_str(&self, source: &str, context: &mut Context) -> Result<String, Error> {
        let template = self.compile(source)?;
        Ok(self.render(&template, context)?)
    }

    /// Load, compile and render the template at `path`
    pub fn render_file(&self, path: &str, context: &mut Context) -> Result<String, Error> {
        let template = self.load(path)?;
        Ok(self.render(&template, context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;

    fn env() -> Environment<MemoryLoader> {
        Environment::new(
            MemoryLoader::new()
                .with("base.html", "<{% parse 'body.html' %}>")
                .with("body.html", "{{ title }}")
                .with("loop.html", "{% parse 'loop.html' %}")
                .with("broken.html", "{% end %}"),
        )
    }

    #[test]
    fn test_render_file() {
        let mut context: Context = [("title", "Hi")].into_iter().collect();
        assert_eq!(env().render_file("base.html", &mut context).unwrap(), "<Hi>");
    }

    #[test]
    fn test_load_names_template() {
        let template = env().load("./body.html").unwrap();
        assert_eq!(template.name(), Some("body.html"));
    }

    #[test]
    fn test_named_template_parsing_itself() {
        let err = env().render_file("loop.html", &mut Context::new()).unwrap_err();
        assert!(matches!(err, Error::Render(RenderError::SelfInclusion { .. })));
        assert_eq!(err.kind(), ErrorKind::Recursion);
    }

    #[test]
    fn test_error_kinds() {
        let env = env();
        let err = env.render_file("missing.html", &mut Context::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        let err = env.render_file("broken.html", &mut Context::new()).unwrap_err();
        assert!(matches!(err, Error::Compile(_)));
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn test_options_are_applied() {
        let env = Environment::new(MemoryLoader::new())
            .with_compile_options(CompileOptions::default().with_trim_blocks(true))
            .with_render_options(RenderOptions::default().with_max_loop_iterations(Some(2)));
        assert_eq!(
            env.render_str("{% x = 1 %}\nvalue={{ x }}", &mut Context::new()).unwrap(),
            "value=1"
        );
        let err = env
            .render_str("{% while true %}{% end %}", &mut Context::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Limit);
    }
}

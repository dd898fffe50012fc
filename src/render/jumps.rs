use crate::parser::ast::AstNode;
use crate::render::engine::{ControlFlow, Renderer};
use crate::render::errors::RenderError;

impl Renderer<'_> {
    /// Evaluate a `return` and signal the enclosing blocks to stop
    pub(crate) fn execute_return(&mut self, expr: &AstNode) -> Result<ControlFlow, RenderError> {
        let value = self.evaluate_expr(expr)?;
        Ok(ControlFlow::Return(value))
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::loader::MemoryLoader;
    use crate::parser::parse::compile;
    use crate::render::engine::Renderer;

    fn render(source: &str) -> String {
        let template = compile(source).unwrap();
        let mut context = Context::new();
        let loader = MemoryLoader::new();
        Renderer::new(&mut context, &loader).render(&template).unwrap()
    }

    #[test]
    fn test_return_skips_remaining_statements() {
        let source = "{% function f() %}{% return 1 %}{% x = 1 / 0 %}{% end %}{{ f() }}";
        assert_eq!(render(source), "1");
    }

    #[test]
    fn test_return_unwinds_nested_blocks() {
        let source = "{% function f(n) %}{% while true %}{% if n > 2 %}{% return n %}{% end %}\
                      {% n = n + 1 %}{% end %}{% end %}{{ f(0) }}";
        assert_eq!(render(source), "3");
    }

    #[test]
    fn test_return_value_keeps_its_type() {
        let source = "{% function pair() %}{% return 'a' + 'b' %}{% end %}{{ pair() == 'ab' }}";
        assert_eq!(render(source), "true");
    }
}

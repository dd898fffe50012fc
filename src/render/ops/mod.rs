pub mod binary;
pub mod unary;

// Operators are `impl Renderer` methods; nothing to re-export

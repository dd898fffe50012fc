// Default limits for the renderer

/// Maximum nesting of `parse` statements
/// Bounds indirect cycles such as a.html -> b.html -> a.html
pub const MAX_INCLUDE_DEPTH: usize = 16;

/// Maximum nesting of template function calls
pub const MAX_CALL_DEPTH: usize = 64;

/// Maximum iterations of a single `while` loop
pub const MAX_LOOP_ITERATIONS: usize = 100_000;

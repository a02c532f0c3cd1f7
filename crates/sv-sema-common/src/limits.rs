//! Centralized limits and thresholds for the semantic core.
//!
//! Centralizing these values documents the rationale for each limit in one
//! place and makes them easy to tune for an embedder without hunting through
//! call sites.
//!
//! # Categories
//!
//! - **Walk bounds**: defend against a corrupted parent chain or scope graph,
//!   not against any legal SystemVerilog construct.
//! - **Elaboration bounds**: bound the work generate constructs can expand
//!   into, since their trip count is only known after constant evaluation.

/// Maximum number of parent-scope hops `find_ancestor` and the Local-mode
/// parent walk will take before giving up and reporting a structural
/// diagnostic instead of looping forever.
///
/// A well-formed scope graph never approaches this; it exists only to bound
/// the damage from a corrupted parent chain introduced by a bug elsewhere
/// in elaboration.
pub const MAX_SCOPE_WALK_ITERATIONS: u32 = 10_000;

/// Default maximum number of iterations a `LoopGenerate` construct may
/// expand before `GenerateLoopTooManyIterations` is reported and expansion
/// stops.
///
/// The SystemVerilog LRM does not fix this bound; `1 << 20` is a
/// conservative default chosen so that a real (if unusual) large
/// loop-generate still elaborates, while a runaway loop (e.g. a condition
/// that never becomes false) terminates in well under a second. Embedders
/// may override it per-compilation via `sv_sema::generate::ElaborationOptions`.
pub const MAX_GENERATE_ITERATIONS: usize = 1 << 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_bound_is_conservative_but_nonzero() {
        assert!(MAX_GENERATE_ITERATIONS > 0);
    }
}

//! Pattern matching infrastructure for UOp graphs.
//!
//! # Architecture
//!
//! [`PatternMatcher`] uses a two-tier dispatch strategy:
//!
//! 1. **Indexed patterns**: stored in a `HashMap<OpKey, Vec<Closure>>` for
//!    O(1) lookup - only patterns registered for the input's kind are tried
//! 2. **Wildcard patterns**: tried after indexed patterns
//!
//! Rules are plain closures doing native Rust pattern matching on [`Op`],
//! taking a mutable context threaded in at rewrite time (no `Rc<RefCell<>>`
//! capture).

use std::collections::HashMap;
use std::sync::Arc;

use crate::op::OpKey;
use crate::uop::UOp;

/// Result of applying a pattern rewrite.
#[derive(Debug, Clone)]
pub enum RewriteResult {
    /// Pattern didn't match or the rule declined to rewrite.
    NoMatch,
    /// Pattern matched and produced a replacement node.
    Rewritten(Arc<UOp>),
    /// Pattern matched and wants children processed before finalization.
    Gate(Arc<UOp>),
}

/// Closure type for pattern matching + rewriting.
pub type PatternClosure<C> = Box<dyn Fn(&Arc<UOp>, &mut C) -> RewriteResult + Send + Sync>;

/// Op-kind-indexed pattern matcher.
///
/// # Type Parameter
///
/// - `C`: context type passed to every pattern closure. Use `()` for
///   stateless matching.
///
/// # Example
///
/// ```ignore
/// let mut matcher = PatternMatcher::<()>::new();
/// matcher.add(&[OpKey::Binary(BinaryOp::Add)], |uop, _ctx| {
///     let Op::Binary(BinaryOp::Add, lhs, rhs) = uop.op() else {
///         return RewriteResult::NoMatch;
///     };
///     // ...
///     RewriteResult::NoMatch
/// });
/// ```
pub struct PatternMatcher<C = ()> {
    /// Patterns indexed by OpKey - tried first.
    indexed: HashMap<OpKey, Vec<PatternClosure<C>>>,
    /// Wildcard patterns - tried after indexed patterns.
    wildcards: Vec<PatternClosure<C>>,
}

impl<C> PatternMatcher<C> {
    pub fn new() -> Self {
        Self { indexed: HashMap::new(), wildcards: Vec::new() }
    }

    /// Add a pattern for specific OpKey(s). An empty key list registers a
    /// wildcard.
    pub fn add<F>(&mut self, keys: &[OpKey], closure: F)
    where
        F: Fn(&Arc<UOp>, &mut C) -> RewriteResult + Send + Sync + 'static,
    {
        match keys {
            [] => self.wildcards.push(Box::new(closure)),
            [key] => self.indexed.entry(*key).or_default().push(Box::new(closure)),
            keys => {
                // Multiple keys share the closure through an Arc.
                let shared = Arc::new(closure);
                for key in keys {
                    let shared = Arc::clone(&shared);
                    self.indexed
                        .entry(*key)
                        .or_default()
                        .push(Box::new(move |uop: &Arc<UOp>, ctx: &mut C| shared(uop, ctx)));
                }
            }
        }
    }

    /// Number of registered patterns.
    pub fn len(&self) -> usize {
        self.indexed.values().map(|v| v.len()).sum::<usize>() + self.wildcards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty() && self.wildcards.is_empty()
    }

    /// Attempt to rewrite a node using registered patterns. The first
    /// non-`NoMatch` result wins.
    pub fn rewrite(&self, uop: &Arc<UOp>, ctx: &mut C) -> RewriteResult {
        let key = uop.key();

        if let Some(patterns) = self.indexed.get(&key) {
            tracing::trace!(op_key = ?key, pattern_count = patterns.len(), "trying indexed patterns");
            for (idx, closure) in patterns.iter().enumerate() {
                let result = closure(uop, ctx);
                if !matches!(result, RewriteResult::NoMatch) {
                    tracing::debug!(op_key = ?key, pattern_idx = idx, "pattern matched");
                    return result;
                }
            }
        }

        for (idx, closure) in self.wildcards.iter().enumerate() {
            let result = closure(uop, ctx);
            if !matches!(result, RewriteResult::NoMatch) {
                tracing::debug!(wildcard_idx = idx, "wildcard pattern matched");
                return result;
            }
        }

        RewriteResult::NoMatch
    }
}

impl<C> Default for PatternMatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

// Matcher composition: patterns from `rhs` are appended.
impl<C> std::ops::Add for PatternMatcher<C> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        for (key, patterns) in rhs.indexed {
            self.indexed.entry(key).or_default().extend(patterns);
        }
        self.wildcards.extend(rhs.wildcards);
        self
    }
}

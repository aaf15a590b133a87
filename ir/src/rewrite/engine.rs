//! Graph rewrite engine.
//!
//! Implements fixed-point rewriting over a UOp DAG in two stages per node:
//!
//! - Stage 0 (Rewrite): fixed-point pattern matching on the current node
//! - Stage 1 (Finalize): reconstruct with the children's results and link
//!   the original node to its final replacement
//!
//! By default patterns see the original children (top-down style). A pattern
//! can return `RewriteResult::Gate` to ask for children first, or the caller
//! can use [`graph_rewrite_bottom_up`] to always process children before
//! finalizing - the right mode for rules that must reach accesses anywhere
//! in the graph.
//!
//! Context is passed at rewrite time through `graph_rewrite()`, not captured
//! in closures.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::pattern::{PatternMatcher, RewriteResult};
use crate::uop::{UOp, UOpKey};

/// Stage in the two-stage rewrite algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Rewrite,
    Finalize,
}

/// Stack entry. `original` is the node consumers reference (the key in the
/// results cache); `working` is the node after pattern rewrites.
struct StackEntry {
    original: Arc<UOp>,
    stage: Stage,
    working: Arc<UOp>,
    /// Retry count for deferred Finalize entries.
    retries: u32,
}

impl StackEntry {
    fn rewrite(node: Arc<UOp>) -> Self {
        Self { original: node.clone(), stage: Stage::Rewrite, working: node, retries: 0 }
    }

    fn finalize(original: Arc<UOp>, working: Arc<UOp>) -> Self {
        Self { original, stage: Stage::Finalize, working, retries: 0 }
    }
}

/// Result lookup with path compression: chains of rewrites collapse so
/// repeated lookups are O(1).
struct ResultMap {
    results: HashMap<UOpKey, Arc<UOp>>,
}

impl ResultMap {
    fn new() -> Self {
        Self { results: HashMap::new() }
    }

    fn get(&mut self, node: &Arc<UOp>) -> Arc<UOp> {
        let key = UOpKey(node.clone());
        let Some(result) = self.results.get(&key).cloned() else {
            return node.clone();
        };
        if Arc::ptr_eq(&result, node) {
            return result;
        }

        let mut current = result;
        let mut path = vec![key];
        const MAX_DEPTH: usize = 100;
        for _ in 0..MAX_DEPTH {
            let current_key = UOpKey(current.clone());
            match self.results.get(&current_key) {
                Some(next) if !Arc::ptr_eq(next, &current) => {
                    path.push(current_key);
                    current = next.clone();
                }
                _ => break,
            }
        }
        for k in path {
            self.results.insert(k, current.clone());
        }
        current
    }

    fn link(&mut self, original: Arc<UOp>, result: Arc<UOp>) {
        self.results.insert(UOpKey(original), result);
    }

    fn contains(&self, node: &Arc<UOp>) -> bool {
        self.results.contains_key(&UOpKey(node.clone()))
    }
}

/// Internal engine state, generic over context type `C`.
struct RewriteEngine<'a, C> {
    matcher: &'a PatternMatcher<C>,
    ctx: &'a mut C,
    results: ResultMap,
    /// Nodes currently on the stack or being processed (prevents duplicate
    /// pushes in DAGs with shared children).
    pending: HashSet<UOpKey>,
    /// When true, every node's children are processed before finalization.
    bottom_up: bool,
}

impl<'a, C> RewriteEngine<'a, C> {
    fn new(matcher: &'a PatternMatcher<C>, ctx: &'a mut C, bottom_up: bool) -> Self {
        Self { matcher, ctx, results: ResultMap::new(), pending: HashSet::new(), bottom_up }
    }

    /// Stage 0: fixed-point pattern matching on one node.
    fn handle_rewrite(&mut self, stack: &mut Vec<StackEntry>, original: Arc<UOp>, working: Arc<UOp>) {
        const MAX_ITERATIONS: usize = 1000;
        let mut node = working;
        let mut needs_children = false;

        for i in 0..MAX_ITERATIONS {
            match self.matcher.rewrite(&node, self.ctx) {
                RewriteResult::Rewritten(new_node) => node = new_node,
                RewriteResult::Gate(_) => {
                    needs_children = true;
                    break;
                }
                RewriteResult::NoMatch => break,
            }
            if i == MAX_ITERATIONS - 1 {
                panic!(
                    "rewrite iteration limit ({MAX_ITERATIONS}) exceeded: patterns are looping on {:?}",
                    node.key()
                );
            }
        }

        stack.push(StackEntry::finalize(original, node.clone()));

        if needs_children || self.bottom_up {
            // Children in reverse so the LIFO stack processes them in order.
            for child in node.sources().iter().rev() {
                let child_key = UOpKey(child.clone());
                if !self.pending.contains(&child_key) && !self.results.contains(child) {
                    self.pending.insert(child_key);
                    stack.push(StackEntry::rewrite(child.clone()));
                }
            }
        }
    }

    /// Stage 1: reconstruct with optimized children, link the result.
    ///
    /// If a shared child was scheduled but has not finished yet, the entry
    /// is re-queued at the bottom of the stack so the child runs first.
    fn handle_finalize(
        &mut self,
        stack: &mut Vec<StackEntry>,
        original: Arc<UOp>,
        working: Arc<UOp>,
        retries: u32,
    ) {
        let sources = working.sources();
        if sources.is_empty() {
            let result = self.results.get(&working);
            self.link_result(original, result);
            return;
        }

        let needs_defer = sources
            .iter()
            .any(|src| !self.results.contains(src) && self.pending.contains(&UOpKey(src.clone())));
        if needs_defer {
            const MAX_RETRIES: u32 = 10_000;
            if retries >= MAX_RETRIES {
                panic!("finalize stuck waiting for sources after {MAX_RETRIES} retries: {working:?}");
            }
            stack.insert(
                0,
                StackEntry { original, stage: Stage::Finalize, working, retries: retries + 1 },
            );
            return;
        }

        let mut new_sources = Vec::with_capacity(sources.len());
        let mut any_changed = false;
        for src in &sources {
            let optimized = self.results.get(src);
            if !Arc::ptr_eq(&optimized, src) {
                any_changed = true;
            }
            new_sources.push(optimized);
        }

        if !any_changed {
            let result = self.results.get(&working);
            self.link_result(original, result);
            return;
        }

        let reconstructed = working.with_sources(new_sources);

        // The reconstructed node may enable new patterns: push it back to the
        // Rewrite stage, then link the original to whatever it becomes.
        let recon_key = UOpKey(reconstructed.clone());
        if !self.results.contains(&reconstructed) && !self.pending.contains(&recon_key) {
            stack.push(StackEntry::finalize(original, reconstructed.clone()));
            self.pending.insert(recon_key);
            stack.push(StackEntry::rewrite(reconstructed));
            return;
        }

        let result = self.results.get(&reconstructed);
        self.link_result(original, result);
    }

    fn link_result(&mut self, original: Arc<UOp>, result: Arc<UOp>) {
        self.pending.remove(&UOpKey(original.clone()));
        self.results.link(original, result);
    }

    fn rewrite(&mut self, root: Arc<UOp>) -> Arc<UOp> {
        if self.results.contains(&root) {
            return self.results.get(&root);
        }

        self.pending.insert(UOpKey(root.clone()));
        let mut stack = vec![StackEntry::rewrite(root.clone())];

        const MAX_TOTAL_ITERATIONS: usize = 100_000;
        let mut iterations = 0;

        while let Some(StackEntry { original, stage, working, retries }) = stack.pop() {
            iterations += 1;
            if iterations > MAX_TOTAL_ITERATIONS {
                panic!(
                    "rewrite total iteration limit ({MAX_TOTAL_ITERATIONS}) exceeded; stack size {}",
                    stack.len()
                );
            }

            if self.results.contains(&original) {
                continue;
            }

            match stage {
                Stage::Rewrite => self.handle_rewrite(&mut stack, original, working),
                Stage::Finalize => self.handle_finalize(&mut stack, original, working, retries),
            }
        }

        self.results.get(&root)
    }
}

/// Apply graph rewriting to a UOp DAG. Patterns see original children;
/// children are only processed when a pattern returns `Gate`.
pub fn graph_rewrite<C>(matcher: &PatternMatcher<C>, root: Arc<UOp>, ctx: &mut C) -> Arc<UOp> {
    RewriteEngine::new(matcher, ctx, false).rewrite(root)
}

/// Apply graph rewriting with bottom-up traversal: every node's children are
/// processed first. Use this when rules must reach nodes anywhere in the
/// graph, not just the root.
pub fn graph_rewrite_bottom_up<C>(matcher: &PatternMatcher<C>, root: Arc<UOp>, ctx: &mut C) -> Arc<UOp> {
    RewriteEngine::new(matcher, ctx, true).rewrite(root)
}

//! The signature rewrite sweep.
//!
//! Runs once per function after every access-site rewrite has committed,
//! because it needs the final per-argument attribute state. Arguments that
//! carry descriptor metadata become hardware-descriptor typed (normalized
//! tile shape); every other argument becomes a raw global pointer with a
//! 16-byte divisibility hint. Declared results are dropped and the return
//! terminator is replaced by the value-less sink anchoring the lowered
//! stores.

use tessel_dtype::DType;
use tessel_ir::layout::normalize;
use tessel_ir::{Function, Op, OpKey, PatternMatcher, RewriteResult, UOp, graph_rewrite_bottom_up};

/// Byte alignment stamped on every non-descriptor argument. A blanket
/// guarantee assumed for all surviving generic-path tensors, not re-derived
/// from the per-access alignment analysis.
const DIVISIBILITY_HINT: u32 = 16;

struct SignatureContext {
    arg_types: Vec<DType>,
}

fn signature_patterns() -> PatternMatcher<SignatureContext> {
    let mut matcher = PatternMatcher::new();

    // Retype argument references to the rewritten signature, casting each
    // back to its original tensor view so body operands stay type-correct
    // (later dialect conversion erases the cast pairs).
    matcher.add(&[OpKey::Arg], |uop, ctx: &mut SignatureContext| {
        let Op::Arg { index } = uop.op() else {
            return RewriteResult::NoMatch;
        };
        let Some(new_type) = ctx.arg_types.get(*index) else {
            return RewriteResult::NoMatch;
        };
        if uop.dtype() == *new_type {
            return RewriteResult::NoMatch;
        }
        match UOp::tensor_cast(UOp::arg(*index, new_type.clone()), uop.dtype()) {
            Ok(cast) => RewriteResult::Rewritten(cast),
            Err(_) => RewriteResult::NoMatch,
        }
    });

    // The lowered function returns nothing by value: the terminator becomes
    // a sink that keeps the stores anchored.
    matcher.add(&[OpKey::Return], |uop, _ctx: &mut SignatureContext| {
        let Op::Return { values } = uop.op() else {
            return RewriteResult::NoMatch;
        };
        RewriteResult::Rewritten(UOp::sink(values.to_vec()))
    });

    matcher
}

/// Rewrite one function's signature in place.
///
/// Functions with any non-tensor input or output are skipped: that is not
/// this rewrite's concern, a later pass deals with them.
pub fn rewrite_signature(func: &mut Function) {
    let all_tensors = func.arg_types.iter().chain(func.result_types.iter()).all(DType::is_tensor);
    if !all_tensors {
        tracing::debug!(function = %func.name, "skipping signature rewrite: non-tensor inputs or results");
        return;
    }

    let mut new_arg_types = Vec::with_capacity(func.arg_types.len());
    for (index, arg_type) in func.arg_types.iter().enumerate() {
        let DType::Tensor { elem, .. } = arg_type else {
            new_arg_types.push(arg_type.clone());
            continue;
        };
        let new_type = match &func.arg_attrs[index].tma_descriptor {
            Some(descriptor) => {
                let tile_dims = normalize(&descriptor.tile_shape, &descriptor.layout);
                DType::TensorDesc { elem: *elem, tile_dims: tile_dims.to_vec() }
            }
            None => DType::global_ptr(*elem),
        };
        new_arg_types.push(new_type);
    }

    // Descriptor arguments are exempt from the hint; everything else gets
    // the blanket guarantee.
    for (index, attrs) in func.arg_attrs.iter_mut().enumerate() {
        if attrs.tma_descriptor.is_none() && new_arg_types[index].is_ptr() {
            attrs.divisibility = Some(DIVISIBILITY_HINT);
        }
    }

    let mut ctx = SignatureContext { arg_types: new_arg_types.clone() };
    func.body = graph_rewrite_bottom_up(&signature_patterns(), func.body.clone(), &mut ctx);
    func.arg_types = new_arg_types;
    func.result_types.clear();
}

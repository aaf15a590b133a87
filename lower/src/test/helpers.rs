//! Shared builders for lowering tests.

use std::sync::Arc;

use tessel_device::{ComputeCapability, DeviceDescription};
use tessel_dtype::{DType, ScalarDType};
use tessel_ir::{Function, Layout, Module, SInt, UOp};

pub fn hopper() -> DeviceDescription {
    DeviceDescription {
        name: "H100".into(),
        compute_capability: ComputeCapability::HOPPER,
        ..DeviceDescription::default()
    }
}

pub fn pre_hopper() -> DeviceDescription {
    DeviceDescription {
        name: "A100".into(),
        compute_capability: ComputeCapability::new(8, 0),
        ..DeviceDescription::default()
    }
}

pub fn index_offsets(values: &[i64]) -> Vec<Arc<UOp>> {
    values.iter().map(|&v| UOp::index_const(v)).collect()
}

pub fn unit_strides(rank: usize) -> Vec<SInt> {
    (0..rank).map(|_| SInt::from(1)).collect()
}

/// `fn extract_tile(src: tensor) -> tensor { return extract(src) }`
pub fn extract_function(
    original: &[i64],
    tile: &[i64],
    offsets: &[i64],
    layout: Layout,
    strides: Vec<SInt>,
    elem: ScalarDType,
) -> Function {
    let src_type = DType::tensor(elem, original.to_vec());
    let src = UOp::arg(0, src_type.clone());
    let extract =
        UOp::tile_extract(src, tile.to_vec(), index_offsets(offsets), strides, layout).unwrap();
    let tile_type = extract.dtype();
    Function::new("extract_tile", vec![src_type], vec![tile_type], UOp::return_(vec![extract]))
}

pub fn extract_function_f32(original: &[i64], tile: &[i64], offsets: &[i64], layout: Layout) -> Function {
    extract_function(original, tile, offsets, layout, unit_strides(original.len()), ScalarDType::Float32)
}

/// `fn insert_tile(tile: tensor, dst: tensor) -> tensor { return insert(tile, dst) }`
pub fn insert_function(
    original: &[i64],
    tile: &[i64],
    offsets: &[i64],
    layout: Layout,
    strides: Vec<SInt>,
    elem: ScalarDType,
) -> Function {
    let tile_type = DType::tensor(elem, tile.to_vec());
    let dst_type = DType::tensor(elem, original.to_vec());
    let tile_arg = UOp::arg(0, tile_type.clone());
    let dst_arg = UOp::arg(1, dst_type.clone());
    let insert =
        UOp::tile_insert(tile_arg, dst_arg, index_offsets(offsets), strides, layout).unwrap();
    Function::new("insert_tile", vec![tile_type, dst_type.clone()], vec![dst_type], UOp::return_(vec![insert]))
}

pub fn module_of(func: Function) -> Module {
    Module::new(vec![func])
}

//! Raw memory views of reference-free values. This is the only place where values are reinterpreted as bytes and
//! back; all of it goes through `bytemuck`, which checks sizes and never requires alignment of the byte side.
//!
//! The wire format is little-endian while these views expose host memory, hence big-endian hosts are rejected.

#[cfg(target_endian = "big")]
compile_error!("luminpack copies host memory verbatim and only supports little-endian targets");

use bytemuck::Pod;
use std::mem::size_of;

/// A flat, fixed-size value without references or padding which can be copied byte for byte. Implemented for every
/// `bytemuck::Pod`, so `#[derive(Pod, Zeroable)]` on a `#[repr(C)]` struct opts it into the fast paths.
pub trait Unmanaged: Pod {}

impl<T: Pod> Unmanaged for T {}

#[inline]
pub(crate) fn bytes_of<T: Unmanaged>(value: &T) -> &[u8] {
    bytemuck::bytes_of(value)
}

#[inline]
pub(crate) fn slice_bytes<T: Unmanaged>(values: &[T]) -> &[u8] {
    if size_of::<T>() == 0 {
        return &[];
    }
    bytemuck::cast_slice(values)
}

/// Reads a value from `bytes`, which must be exactly `size_of::<T>()` long and may be unaligned.
#[inline]
pub(crate) fn read<T: Unmanaged>(bytes: &[u8]) -> T {
    bytemuck::pod_read_unaligned(bytes)
}

/// Copies `bytes`, exactly `len * size_of::<T>()` long, into `out` which gets resized to hold `len` elements.
pub(crate) fn read_into<T: Unmanaged>(bytes: &[u8], len: usize, out: &mut Vec<T>) {
    out.clear();
    out.resize(len, T::zeroed());
    if !bytes.is_empty() {
        bytemuck::cast_slice_mut::<T, u8>(out.as_mut_slice()).copy_from_slice(bytes);
    }
}

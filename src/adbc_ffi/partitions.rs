//! Export of partition identifiers into `AdbcPartitions`.
//!
//! All identifiers are concatenated into one flat buffer; the pointer array is
//! computed from offsets into it. The three allocations live in a single
//! boxed owner referenced from `private_data`, so one release frees them
//! together.

use std::os::raw::c_void;
use std::ptr::{null, null_mut};

use super::types::FFI_AdbcPartitions;

struct PartitionBuffers {
    _flat: Box<[u8]>,
    _pointers: Box<[*const u8]>,
    _lengths: Box<[usize]>,
}

/// Build the C view of `ids`. The caller owns the result and must call its
/// `release` callback.
pub(crate) fn export_partitions(ids: &[Vec<u8>]) -> FFI_AdbcPartitions {
    let lengths: Box<[usize]> = ids.iter().map(Vec::len).collect();
    let flat: Box<[u8]> = ids.concat().into_boxed_slice();

    let base = flat.as_ptr();
    let mut offset = 0;
    let mut pointers: Box<[*const u8]> = lengths
        .iter()
        .map(|len| {
            let ptr = base.wrapping_add(offset);
            offset += len;
            ptr
        })
        .collect();

    let partitions = pointers.as_mut_ptr();
    let partition_lengths = lengths.as_ptr();
    let owner = Box::new(PartitionBuffers {
        _flat: flat,
        _pointers: pointers,
        _lengths: lengths,
    });

    FFI_AdbcPartitions {
        num_partitions: ids.len(),
        partitions,
        partition_lengths,
        private_data: Box::into_raw(owner).cast::<c_void>(),
        release: Some(release_partitions),
    }
}

unsafe extern "C" fn release_partitions(partitions: *mut FFI_AdbcPartitions) {
    let Some(partitions) = partitions.as_mut() else {
        return;
    };
    if !partitions.private_data.is_null() {
        drop(Box::from_raw(partitions.private_data.cast::<PartitionBuffers>()));
    }
    partitions.num_partitions = 0;
    partitions.partitions = null_mut();
    partitions.partition_lengths = null();
    partitions.private_data = null_mut();
    partitions.release = None;
}

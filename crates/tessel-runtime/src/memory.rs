use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use std::sync::Arc;

use bytemuck::Pod;

use crate::id::BufferId;

/// Word-aligned storage shared by every clone of a [buffer](Buffer).
#[derive(Debug)]
struct Storage {
    id: BufferId,
    words: spin::RwLock<Vec<u64>>,
}

/// Handle to device-resident storage holding `len` elements of `T`.
///
/// Cloning a buffer clones the handle, not the data. The storage lives until the last handle is
/// dropped, including the handles captured by kernels still waiting in a queue.
pub struct Buffer<T: Pod> {
    storage: Arc<Storage>,
    len: usize,
    _elem: PhantomData<T>,
}

impl<T: Pod> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            len: self.len,
            _elem: PhantomData,
        }
    }
}

impl<T: Pod> core::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.storage.id)
            .field("len", &self.len)
            .field("elem", &core::any::type_name::<T>())
            .finish()
    }
}

fn words_for<T>(len: usize) -> usize {
    (len * size_of::<T>()).div_ceil(size_of::<u64>())
}

impl<T: Pod> Buffer<T> {
    pub(crate) fn zeroed(len: usize) -> Self {
        assert!(
            align_of::<T>() <= align_of::<u64>(),
            "Element alignment larger than 8 bytes isn't supported"
        );

        Self {
            storage: Arc::new(Storage {
                id: BufferId::new(),
                words: spin::RwLock::new(vec![0; words_for::<T>(len)]),
            }),
            len,
            _elem: PhantomData,
        }
    }

    pub(crate) fn from_slice(data: &[T]) -> Self {
        let buffer = Self::zeroed(data.len());
        buffer.write().copy_from_slice(data);
        buffer
    }

    /// The id of the underlying storage.
    pub fn id(&self) -> BufferId {
        self.storage.id
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no element.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.len * size_of::<T>()
    }

    /// Whether both handles point to the same storage.
    pub fn same_storage<U: Pod>(&self, other: &Buffer<U>) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Shared view of the elements.
    ///
    /// Only kernels and transfers running on the queue should access the storage, so the lock is
    /// never contended under in-order execution.
    pub fn read(&self) -> BufferRead<'_, T> {
        BufferRead {
            guard: self.storage.words.read(),
            len: self.len,
            _elem: PhantomData,
        }
    }

    /// Exclusive view of the elements.
    pub fn write(&self) -> BufferWrite<'_, T> {
        BufferWrite {
            guard: self.storage.words.write(),
            len: self.len,
            _elem: PhantomData,
        }
    }
}

/// Shared view of a [buffer](Buffer).
pub struct BufferRead<'a, T: Pod> {
    guard: spin::RwLockReadGuard<'a, Vec<u64>>,
    len: usize,
    _elem: PhantomData<T>,
}

impl<T: Pod> Deref for BufferRead<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &bytemuck::cast_slice::<u64, T>(&self.guard)[..self.len]
    }
}

/// Exclusive view of a [buffer](Buffer).
pub struct BufferWrite<'a, T: Pod> {
    guard: spin::RwLockWriteGuard<'a, Vec<u64>>,
    len: usize,
    _elem: PhantomData<T>,
}

impl<T: Pod> Deref for BufferWrite<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &bytemuck::cast_slice::<u64, T>(&self.guard)[..self.len]
    }
}

impl<T: Pod> DerefMut for BufferWrite<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut bytemuck::cast_slice_mut::<u64, T>(&mut self.guard)[..self.len]
    }
}

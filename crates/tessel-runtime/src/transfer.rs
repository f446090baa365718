use bytemuck::Pod;

use crate::{event::Event, memory::Buffer, queue::Queue, server::ExecutionError};

/// Copy `host` into a new device buffer.
pub fn copy_to_device<T: Pod + Send + Sync>(queue: &Queue, host: &[T]) -> Buffer<T> {
    queue.create(host)
}

/// Copy the first `host.len()` elements of `buffer` into `host`.
///
/// Waits for every work enqueued before the copy, so the returned event is already complete.
pub fn copy_to_host<T: Pod + Send + Sync>(
    queue: &Queue,
    buffer: &Buffer<T>,
    host: &mut [T],
) -> Result<Event, ExecutionError> {
    let data = queue.read(buffer)?;
    let count = host.len().min(data.len());
    host[..count].copy_from_slice(&data[..count]);

    Ok(Event::complete())
}

/// Enqueue a copy of `host` into an existing device buffer.
pub fn copy_into_device<T: Pod + Send + Sync>(
    queue: &Queue,
    host: &[T],
    buffer: &Buffer<T>,
) -> Event {
    queue.write(buffer, host)
}

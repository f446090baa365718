use core::future::Future;
use std::sync::Arc;

use bytemuck::Pod;

use crate::{
    channel::{HostTask, Message, QueueServer},
    config::GlobalConfig,
    device::DeviceProperties,
    event::{Event, IntoEvents},
    future,
    id::QueueId,
    kernel::Kernel,
    logging::ServerLogger,
    memory::Buffer,
    server::{ExecutionError, LaunchError, Stage},
};

/// In-order device command queue.
///
/// Work is executed by a dedicated server thread in submission order: work enqueued earlier
/// completes no later than work enqueued after it. Enqueuing never blocks; every method that
/// enqueues returns an [event](Event) tracking the work.
///
/// Cloning a queue clones the handle, both clones feed the same server.
#[derive(Clone, Debug)]
pub struct Queue {
    state: Arc<QueueState>,
}

#[derive(Debug)]
struct QueueState {
    id: QueueId,
    properties: DeviceProperties,
    sender: async_channel::Sender<Message>,
}

impl Default for Queue {
    fn default() -> Self {
        Self::new(DeviceProperties::from_config(&GlobalConfig::get().device))
    }
}

impl Queue {
    /// Create a queue on a device with the given properties.
    pub fn new(properties: DeviceProperties) -> Self {
        Self::with_logger(properties, ServerLogger::new())
    }

    /// Create a queue that logs with the given logger.
    pub fn with_logger(properties: DeviceProperties, logger: ServerLogger) -> Self {
        let id = QueueId::new();
        log::debug!("Creating {id} on {properties:?}");
        let sender = QueueServer::start(id, properties.clone(), logger);

        Self {
            state: Arc::new(QueueState {
                id,
                properties,
                sender,
            }),
        }
    }

    /// The queue id.
    pub fn id(&self) -> QueueId {
        self.state.id
    }

    /// Properties of the device behind the queue.
    pub fn properties(&self) -> &DeviceProperties {
        &self.state.properties
    }

    /// Allocate a buffer holding a copy of `data`.
    pub fn create<T: Pod + Send + Sync>(&self, data: &[T]) -> Buffer<T> {
        Buffer::from_slice(data)
    }

    /// Allocate a zeroed buffer of `len` elements.
    pub fn empty<T: Pod + Send + Sync>(&self, len: usize) -> Buffer<T> {
        Buffer::zeroed(len)
    }

    /// Enqueue a copy of `data` into the start of `buffer`.
    pub fn write<T: Pod + Send + Sync>(&self, buffer: &Buffer<T>, data: &[T]) -> Event {
        let target = buffer.clone();
        let data = data.to_vec();

        self.submit_task(
            "write",
            Box::new(move || {
                if data.len() > target.len() {
                    return Err(LaunchError::kernel(format!(
                        "write of {} elements into a buffer of {}",
                        data.len(),
                        target.len()
                    )));
                }
                target.write()[..data.len()].copy_from_slice(&data);
                Ok(())
            }),
        )
    }

    /// Enqueue a read of the whole buffer, resolved once every earlier work completed.
    pub fn read_async<T: Pod + Send + Sync>(
        &self,
        buffer: &Buffer<T>,
    ) -> impl Future<Output = Result<Vec<T>, ExecutionError>> + Send + 'static {
        let (callback, response) = async_channel::bounded(1);
        let source = buffer.clone();

        let event = self.submit_task(
            "read",
            Box::new(move || {
                // The receiver only disappears when the caller dropped the future.
                let _ = callback.try_send(source.read().to_vec());
                Ok(())
            }),
        );

        async move {
            match response.recv().await {
                Ok(data) => Ok(data),
                Err(_) => {
                    event.wait_async().await?;
                    Err(ExecutionError::Disconnected)
                }
            }
        }
    }

    /// Read the whole buffer, blocking until every earlier work completed.
    pub fn read<T: Pod + Send + Sync>(&self, buffer: &Buffer<T>) -> Result<Vec<T>, ExecutionError> {
        future::block_on(self.read_async(buffer))
    }

    /// Enqueue a kernel, started once every dependency completed.
    ///
    /// The kernel is tagged with `stage`; a failure reported by the returned event names it.
    pub fn launch<K: Kernel>(&self, kernel: K, stage: Stage, dependencies: impl IntoEvents) -> Event {
        self.launch_boxed(Box::new(kernel), stage, dependencies.into_events())
    }

    /// Enqueue a boxed kernel, see [launch](Queue::launch).
    pub fn launch_boxed(
        &self,
        kernel: Box<dyn Kernel>,
        stage: Stage,
        dependencies: Vec<Event>,
    ) -> Event {
        log::trace!(
            "{} enqueue {} {} ({stage})",
            self.state.id,
            kernel.name(),
            kernel.range()
        );
        let (event, signal) = Event::pending();

        self.send(Message::Launch {
            kernel,
            stage,
            dependencies,
            signal,
        });

        event
    }

    /// Block until every enqueued work completed.
    pub fn sync(&self) -> Result<(), ExecutionError> {
        let (callback, response) = async_channel::bounded(1);
        self.send(Message::Sync(callback));

        response
            .recv_blocking()
            .map_err(|_| ExecutionError::Disconnected)
    }

    /// Log the profiling summary of the kernels executed so far and reset it.
    pub fn profile_summary(&self) {
        self.send(Message::ProfileSummary);
    }

    fn submit_task(&self, name: &'static str, task: HostTask) -> Event {
        let (event, signal) = Event::pending();
        self.send(Message::Task { name, task, signal });
        event
    }

    fn send(&self, message: Message) {
        // A closed channel drops the message and its signal, which disconnects its event.
        if self.state.sender.send_blocking(message).is_err() {
            log::warn!("{} is closed, work dropped", self.state.id);
        }
    }
}

use core::panic::AssertUnwindSafe;
use core::time::Duration;

use crate::{
    device::DeviceProperties,
    event::{Event, EventSignal},
    id::QueueId,
    kernel::{Grid, Kernel, LocalMemory},
    logging::ServerLogger,
    server::{ExecutionError, LaunchError, Stage},
};

pub(crate) type HostTask = Box<dyn FnOnce() -> Result<(), LaunchError> + Send>;

type Callback<Response> = async_channel::Sender<Response>;

pub(crate) enum Message {
    Launch {
        kernel: Box<dyn Kernel>,
        stage: Stage,
        dependencies: Vec<Event>,
        signal: EventSignal,
    },
    Task {
        name: &'static str,
        task: HostTask,
        signal: EventSignal,
    },
    Sync(Callback<()>),
    ProfileSummary,
}

/// Executes the messages of one queue in submission order on its own thread.
pub(crate) struct QueueServer {
    id: QueueId,
    properties: DeviceProperties,
    logger: ServerLogger,
}

impl QueueServer {
    /// Spawn the server thread and return the sending side of its queue.
    pub(crate) fn start(
        id: QueueId,
        properties: DeviceProperties,
        logger: ServerLogger,
    ) -> async_channel::Sender<Message> {
        let (sender, receiver) = async_channel::unbounded::<Message>();

        std::thread::spawn(move || {
            let mut server = QueueServer {
                id,
                properties,
                logger,
            };
            log::trace!("{id} started");

            while let Ok(message) = receiver.recv_blocking() {
                server.handle(message);
            }

            server.logger.profile_summary();
            log::trace!("{id} stopped");
        });

        sender
    }

    fn handle(&mut self, message: Message) {
        match message {
            Message::Launch {
                kernel,
                stage,
                dependencies,
                signal,
            } => self.launch(kernel, stage, dependencies, signal),
            Message::Task { name, task, signal } => {
                let start = web_time::Instant::now();
                let result = match std::panic::catch_unwind(AssertUnwindSafe(task)) {
                    Ok(result) => result,
                    Err(payload) => Err(LaunchError::kernel(panic_reason(payload))),
                };
                let result = result.map_err(|source| ExecutionError::Failed {
                    stage: Stage::single(name),
                    kernel: name.to_string(),
                    source,
                });
                signal.complete(result, Some(start.elapsed()));
            }
            Message::Sync(callback) => {
                // The receiver only disappears when the caller gave up waiting.
                let _ = callback.try_send(());
            }
            Message::ProfileSummary => self.logger.profile_summary(),
        }
    }

    fn launch(
        &mut self,
        kernel: Box<dyn Kernel>,
        stage: Stage,
        dependencies: Vec<Event>,
        signal: EventSignal,
    ) {
        for dependency in dependencies.iter() {
            if let Err(err) = dependency.wait() {
                log::debug!("{} skipped {}: {err}", self.id, kernel.name());
                signal.complete(
                    Err(ExecutionError::DependencyFailed {
                        stage,
                        source: Box::new(err),
                    }),
                    None,
                );
                return;
            }
        }

        if self.logger.launch_activated() {
            self.logger.log_launch(format!(
                "[{}] {} {} local_memory={}B {stage}",
                self.id,
                kernel.name(),
                kernel.range(),
                kernel.local_memory_size(),
            ));
        }
        log::trace!("{} running {} ({stage})", self.id, kernel.name());

        match self.run(kernel.as_ref()) {
            Ok(duration) => {
                if self.logger.profile_level().is_some() {
                    self.logger.register_profiled(kernel.name(), duration);
                }
                signal.complete(Ok(()), Some(duration));
            }
            Err(source) => {
                log::debug!("{} failed {}: {source}", self.id, kernel.name());
                signal.complete(
                    Err(ExecutionError::Failed {
                        stage,
                        kernel: kernel.name().to_string(),
                        source,
                    }),
                    None,
                );
            }
        }
    }

    fn validate(&self, kernel: &dyn Kernel) -> Result<(), LaunchError> {
        let range = kernel.range();

        if !range.is_divisible() {
            return Err(LaunchError::InvalidRange {
                global: range.global,
                local: range.local,
            });
        }

        let requested = range.workgroup_size();
        let max = self.properties.max_workgroup_size();
        if requested > max {
            return Err(LaunchError::WorkgroupTooLarge { requested, max });
        }

        let local_memory = kernel.local_memory_size();
        if local_memory > 0 {
            if !self.properties.has_local_memory() {
                return Err(LaunchError::LocalMemoryUnavailable {
                    requested: local_memory,
                });
            }

            let max = self.properties.max_local_memory_size();
            if local_memory > max {
                return Err(LaunchError::LocalMemoryExceeded {
                    requested: local_memory,
                    max,
                });
            }
        }

        Ok(())
    }

    fn run(&mut self, kernel: &dyn Kernel) -> Result<Duration, LaunchError> {
        self.validate(kernel)?;

        let mut local = LocalMemory::new(kernel.local_memory_size());
        let start = web_time::Instant::now();
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let mut grid = Grid::new(kernel.range(), &mut local);
            kernel.execute(&mut grid)
        }));

        match result {
            Ok(Ok(())) => Ok(start.elapsed()),
            Ok(Err(err)) => Err(err),
            Err(payload) => Err(LaunchError::kernel(panic_reason(payload))),
        }
    }
}

fn panic_reason(payload: Box<dyn core::any::Any + Send>) -> String {
    if let Some(reason) = payload.downcast_ref::<&str>() {
        format!("kernel panicked: {reason}")
    } else if let Some(reason) = payload.downcast_ref::<String>() {
        format!("kernel panicked: {reason}")
    } else {
        "kernel panicked".to_string()
    }
}

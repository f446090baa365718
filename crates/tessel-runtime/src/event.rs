use core::time::Duration;
use std::sync::Arc;

use variadics_please::all_tuples;

use crate::future;
use crate::server::ExecutionError;

/// Completion state of an [event](Event).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventStatus {
    /// The work hasn't finished yet.
    Pending,
    /// The work finished successfully.
    Complete,
    /// The work failed.
    Failed(ExecutionError),
}

#[derive(Debug)]
struct EventState {
    status: spin::Mutex<EventStatus>,
    duration: spin::Mutex<Option<Duration>>,
    done: async_channel::Receiver<()>,
}

/// Completion token for work enqueued on a [queue](crate::Queue).
///
/// Cloning an event clones the token; every clone observes the same completion.
#[derive(Clone, Debug)]
pub struct Event {
    state: Arc<EventState>,
}

/// Server side of an [event](Event), consumed when the work finishes.
///
/// Dropping a signal without completing it leaves the event disconnected.
#[derive(Debug)]
pub(crate) struct EventSignal {
    state: Arc<EventState>,
    _sender: async_channel::Sender<()>,
}

impl Event {
    pub(crate) fn pending() -> (Event, EventSignal) {
        let (sender, receiver) = async_channel::bounded(1);
        let state = Arc::new(EventState {
            status: spin::Mutex::new(EventStatus::Pending),
            duration: spin::Mutex::new(None),
            done: receiver,
        });

        (
            Event {
                state: state.clone(),
            },
            EventSignal {
                state,
                _sender: sender,
            },
        )
    }

    /// An event that is already complete.
    pub fn complete() -> Self {
        let (event, signal) = Self::pending();
        signal.complete(Ok(()), None);
        event
    }

    /// An event that already failed with the given error.
    pub fn failed(error: ExecutionError) -> Self {
        let (event, signal) = Self::pending();
        signal.complete(Err(error), None);
        event
    }

    /// Current status, without blocking.
    pub fn status(&self) -> EventStatus {
        // The status is final once the channel is closed.
        let closed = self.state.done.is_closed();
        let status = self.state.status.lock().clone();

        match status {
            EventStatus::Pending if closed => EventStatus::Failed(ExecutionError::Disconnected),
            status => status,
        }
    }

    /// Whether the work has finished, successfully or not.
    pub fn is_complete(&self) -> bool {
        !matches!(self.status(), EventStatus::Pending)
    }

    /// Time the device spent on the work, available once complete.
    pub fn duration(&self) -> Option<Duration> {
        *self.state.duration.lock()
    }

    /// Wait for completion without blocking the thread.
    pub async fn wait_async(&self) -> Result<(), ExecutionError> {
        // The channel never carries a message, it only closes once the signal is gone.
        let _ = self.state.done.recv().await;

        match self.status() {
            EventStatus::Complete => Ok(()),
            EventStatus::Failed(err) => Err(err),
            EventStatus::Pending => Err(ExecutionError::Disconnected),
        }
    }

    /// Block the calling thread until the work finished.
    pub fn wait(&self) -> Result<(), ExecutionError> {
        future::block_on(self.wait_async())
    }

    /// Whether both events track the same work.
    pub fn same_event(&self, other: &Event) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl EventSignal {
    /// Record the result and wake every waiter.
    pub(crate) fn complete(self, result: Result<(), ExecutionError>, duration: Option<Duration>) {
        *self.state.duration.lock() = duration;
        *self.state.status.lock() = match result {
            Ok(()) => EventStatus::Complete,
            Err(err) => EventStatus::Failed(err),
        };
        // Dropping the sender closes the channel.
    }
}

/// Anything that holds zero or more [events](Event).
///
/// Implemented for events, references to events, vectors, slices, arrays, options and tuples of
/// any of these, so collections can be nested freely.
pub trait IntoEvents {
    /// Push every event held by `self` into `events`.
    fn collect_events(self, events: &mut Vec<Event>);

    /// Flatten into a vector of events.
    fn into_events(self) -> Vec<Event>
    where
        Self: Sized,
    {
        let mut events = Vec::new();
        self.collect_events(&mut events);
        events
    }
}

impl IntoEvents for Event {
    fn collect_events(self, events: &mut Vec<Event>) {
        events.push(self);
    }
}

impl IntoEvents for &Event {
    fn collect_events(self, events: &mut Vec<Event>) {
        events.push(self.clone());
    }
}

impl<T: IntoEvents> IntoEvents for Vec<T> {
    fn collect_events(self, events: &mut Vec<Event>) {
        for item in self {
            item.collect_events(events);
        }
    }
}

impl<'a, T> IntoEvents for &'a Vec<T>
where
    &'a T: IntoEvents,
{
    fn collect_events(self, events: &mut Vec<Event>) {
        self.as_slice().collect_events(events);
    }
}

impl<'a, T> IntoEvents for &'a [T]
where
    &'a T: IntoEvents,
{
    fn collect_events(self, events: &mut Vec<Event>) {
        for item in self {
            item.collect_events(events);
        }
    }
}

impl<T: IntoEvents, const N: usize> IntoEvents for [T; N] {
    fn collect_events(self, events: &mut Vec<Event>) {
        for item in self {
            item.collect_events(events);
        }
    }
}

impl<T: IntoEvents> IntoEvents for Option<T> {
    fn collect_events(self, events: &mut Vec<Event>) {
        if let Some(item) = self {
            item.collect_events(events);
        }
    }
}

macro_rules! impl_into_events_tuple {
    ($($param:ident),*) => {
        impl<$($param: IntoEvents),*> IntoEvents for ($($param,)*) {
            #[allow(non_snake_case, unused_variables)]
            fn collect_events(self, events: &mut Vec<Event>) {
                let ($($param,)*) = self;
                $($param.collect_events(events);)*
            }
        }
    };
}

all_tuples!(impl_into_events_tuple, 0, 12, T);

/// Block the calling thread until every event completed.
///
/// Accepts any nesting of events, see [IntoEvents]. Every event is awaited even when one
/// failed; the first error in flattening order is returned. Without any event, returns
/// immediately.
pub fn wait<E: IntoEvents>(events: E) -> Result<(), ExecutionError> {
    let events = events.into_events();
    let mut result = Ok(());

    for event in events.iter() {
        if let Err(err) = event.wait() {
            log::debug!("Awaited event failed: {err}");
            if result.is_ok() {
                result = Err(err);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{LaunchError, Stage};

    #[test]
    fn wait_without_events_returns() {
        assert_eq!(wait(()), Ok(()));
        assert_eq!(wait(Vec::<Event>::new()), Ok(()));
    }

    #[test]
    fn nested_collections_are_flattened() {
        let a = Event::complete();
        let b = Event::complete();
        let c = Event::complete();

        let events = (vec![a.clone(), b.clone()], [Some(&c)], &a).into_events();

        assert_eq!(events.len(), 4);
        assert!(events[2].same_event(&c));
        assert_eq!(wait((vec![a, b], [Some(&c)])), Ok(()));
    }

    #[test]
    fn failure_is_reported() {
        let err = ExecutionError::Failed {
            stage: Stage::single("copy"),
            kernel: "write".into(),
            source: LaunchError::kernel("bad"),
        };

        assert_eq!(wait((Event::complete(), Event::failed(err.clone()))), Err(err));
    }

    #[test]
    fn dropped_signal_disconnects() {
        let (event, signal) = Event::pending();

        assert_eq!(event.status(), EventStatus::Pending);
        drop(signal);

        assert_eq!(event.wait(), Err(ExecutionError::Disconnected));
    }

    #[test]
    fn signal_from_another_thread() {
        let (event, signal) = Event::pending();
        let handle = std::thread::spawn(move || {
            signal.complete(Ok(()), Some(Duration::from_micros(3)));
        });

        assert_eq!(event.wait(), Ok(()));
        assert_eq!(event.duration(), Some(Duration::from_micros(3)));
        handle.join().unwrap();
    }
}

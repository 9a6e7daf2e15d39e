//! Notification bus between the simulator and external observers.
//!
//! Statistics collectors and front ends subscribe here to learn about
//! lifecycle transitions without polling. Notifications are delivered
//! synchronously from within the simulator's locked sections, so a
//! listener must never call back into blocking simulator control
//! methods; doing so deadlocks and is documented as misuse rather than
//! detected at runtime.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::time::SimTime;

/// The closed set of signals a simulator announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimSignal {
    /// The simulation clock advanced.
    TimeChanged,
    /// A driver-loop run began.
    Started,
    /// A stop was requested; the loop is winding down.
    Stopping,
    /// The driver loop exited.
    Stopped,
    /// The clock passed the replication's warmup time.
    Warmup,
    /// The replication began executing.
    StartOfReplication,
    /// The replication reached its end.
    EndOfReplication,
    /// A throttled-loop batch completed; observers may redraw.
    UpdateAnimation,
    /// The throttle delay was reconfigured.
    AnimationDelayChanged,
}

impl fmt::Display for SimSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimSignal::TimeChanged => "time-changed",
            SimSignal::Started => "started",
            SimSignal::Stopping => "stopping",
            SimSignal::Stopped => "stopped",
            SimSignal::Warmup => "warmup",
            SimSignal::StartOfReplication => "start-of-replication",
            SimSignal::EndOfReplication => "end-of-replication",
            SimSignal::UpdateAnimation => "update-animation",
            SimSignal::AnimationDelayChanged => "animation-delay-changed",
        };
        write!(f, "{name}")
    }
}

/// A signal paired with the simulation time at which it fired.
#[derive(Debug, Clone)]
pub struct SimNotification<T: SimTime> {
    pub signal: SimSignal,
    pub time: T,
}

/// Observer of simulator lifecycle signals.
///
/// Implementations must be cheap and non-blocking: they run on the
/// simulator's worker thread while the simulator lock is held.
pub trait SimulationListener<T: SimTime>: Send + Sync {
    fn on_notification(&self, notification: &SimNotification<T>);
}

/// Identifies one subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber<T: SimTime> {
    id: u64,
    /// `None` subscribes to every signal.
    filter: Option<Vec<SimSignal>>,
    listener: Arc<dyn SimulationListener<T>>,
}

/// Subscriber registry with snapshot delivery.
///
/// Delivery iterates over a snapshot of the matching listeners, so a
/// listener may subscribe or unsubscribe (through the simulator) between
/// deliveries without invalidating an in-flight iteration.
pub struct Notifier<T: SimTime> {
    subscribers: Vec<Subscriber<T>>,
    next_id: u64,
}

impl<T: SimTime> Notifier<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    /// Subscribes a listener to every signal.
    pub fn subscribe(&mut self, listener: Arc<dyn SimulationListener<T>>) -> SubscriptionId {
        self.subscribe_inner(None, listener)
    }

    /// Subscribes a listener to a subset of signals.
    pub fn subscribe_filtered(
        &mut self,
        signals: &[SimSignal],
        listener: Arc<dyn SimulationListener<T>>,
    ) -> SubscriptionId {
        self.subscribe_inner(Some(signals.to_vec()), listener)
    }

    fn subscribe_inner(
        &mut self,
        filter: Option<Vec<SimSignal>>,
        listener: Arc<dyn SimulationListener<T>>,
    ) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            filter,
            listener,
        });
        tracing::debug!(subscription = id, "listener subscribed");
        SubscriptionId(id)
    }

    /// Removes a subscription. Returns whether it was present.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id.0);
        before != self.subscribers.len()
    }

    /// Removes every subscription.
    pub fn detach_all(&mut self) {
        self.subscribers.clear();
    }

    /// Returns the number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Delivers a signal to every matching subscriber.
    pub fn fire(&self, signal: SimSignal, time: &T) {
        let snapshot: Vec<Arc<dyn SimulationListener<T>>> = self
            .subscribers
            .iter()
            .filter(|s| match &s.filter {
                None => true,
                Some(signals) => signals.contains(&signal),
            })
            .map(|s| Arc::clone(&s.listener))
            .collect();

        if snapshot.is_empty() {
            return;
        }

        let notification = SimNotification {
            signal,
            time: time.clone(),
        };
        for listener in snapshot {
            listener.on_notification(&notification);
        }
    }
}

impl<T: SimTime> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Listener trait objects are not Debug; report the registry shape only.
impl<T: SimTime> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::time::TimeTicks;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(SimSignal, TimeTicks)>>,
    }

    impl SimulationListener<TimeTicks> for Recorder {
        fn on_notification(&self, notification: &SimNotification<TimeTicks>) {
            self.seen
                .lock()
                .push((notification.signal, notification.time));
        }
    }

    #[test]
    fn subscribed_listener_receives_signals() {
        let mut notifier = Notifier::new();
        let recorder = Arc::new(Recorder::default());
        notifier.subscribe(recorder.clone());

        notifier.fire(SimSignal::Started, &TimeTicks::new(0));
        notifier.fire(SimSignal::TimeChanged, &TimeTicks::new(5));

        let seen = recorder.seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (SimSignal::Started, TimeTicks::new(0)));
        assert_eq!(seen[1], (SimSignal::TimeChanged, TimeTicks::new(5)));
    }

    #[test]
    fn filtered_subscription_only_sees_requested_signals() {
        let mut notifier = Notifier::new();
        let recorder = Arc::new(Recorder::default());
        notifier.subscribe_filtered(&[SimSignal::EndOfReplication], recorder.clone());

        notifier.fire(SimSignal::TimeChanged, &TimeTicks::new(1));
        notifier.fire(SimSignal::EndOfReplication, &TimeTicks::new(10));

        let seen = recorder.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, SimSignal::EndOfReplication);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut notifier = Notifier::new();
        let recorder = Arc::new(Recorder::default());
        let id = notifier.subscribe(recorder.clone());

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));

        notifier.fire(SimSignal::Started, &TimeTicks::new(0));
        assert!(recorder.seen.lock().is_empty());
    }

    #[test]
    fn detach_all_clears_the_registry() {
        let mut notifier = Notifier::new();
        notifier.subscribe(Arc::new(Recorder::default()));
        notifier.subscribe(Arc::new(Recorder::default()));

        assert_eq!(notifier.subscriber_count(), 2);
        notifier.detach_all();
        assert_eq!(notifier.subscriber_count(), 0);
    }
}

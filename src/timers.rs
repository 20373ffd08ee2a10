/// Milliseconds on the session's monotonic clock
pub type Millis = u64;

/// Cancellation handle returned for every scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Scheduled<E> {
    handle: TimerHandle,
    deadline: Millis,
    event: E,
}

/// Timers owned by a single session. Nothing fires on its own: the owner
/// drains due entries from its event loop, so dropping the queue drops every
/// pending callback with it.
#[derive(Debug)]
pub struct TimerQueue<E> {
    next_id: u64,
    entries: Vec<Scheduled<E>>,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn schedule(&mut self, deadline: Millis, event: E) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(Scheduled {
            handle,
            deadline,
            event,
        });
        handle
    }

    /// Returns false if the timer already fired or was cancelled
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|s| s.handle != handle);
        self.entries.len() != before
    }

    pub fn cancel_all(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.entries.iter().map(|s| s.deadline).min()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|s| s.handle == handle)
    }

    /// Remove the earliest timer whose deadline lies strictly before `now`.
    /// Ties go to the timer scheduled first.
    pub fn pop_due(&mut self, now: Millis) -> Option<(TimerHandle, Millis, E)> {
        let pos = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, s)| s.deadline < now)
            .min_by_key(|(_, s)| (s.deadline, s.handle.0))
            .map(|(i, _)| i)?;
        let s = self.entries.remove(pos);
        Some((s.handle, s.deadline, s.event))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

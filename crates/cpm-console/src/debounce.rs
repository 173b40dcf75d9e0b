//! Debounced triggers
//!
//! Collapses a burst of input events on one source into a single synthetic
//! trigger fired once the source has been quiet for the configured period.

use std::collections::HashMap;

use cpm_core::{Document, ElementId, EventKind, Scheduler, TimerId};
use tracing::debug;

use crate::task::Task;

#[derive(Debug, Clone)]
struct Binding {
    trigger: EventKind,
    pending: Option<TimerId>,
}

/// One outstanding timer per bound source.
#[derive(Debug)]
pub struct DebouncedTrigger {
    quiet_ms: u64,
    bindings: HashMap<ElementId, Binding>,
}

impl DebouncedTrigger {
    /// A trigger with no bound sources.
    pub fn new(quiet_ms: u64) -> Self {
        Self {
            quiet_ms,
            bindings: HashMap::new(),
        }
    }

    /// Route input on `source` to a synthetic `trigger` event. Rebinding
    /// replaces the trigger and keeps any pending timer.
    pub fn bind(&mut self, source: ElementId, trigger: EventKind) {
        match self.bindings.get_mut(&source) {
            Some(binding) => binding.trigger = trigger,
            None => {
                self.bindings.insert(
                    source,
                    Binding {
                        trigger,
                        pending: None,
                    },
                );
            }
        }
    }

    /// Stop debouncing `source`, discarding any pending trigger.
    pub fn unbind(&mut self, scheduler: &mut Scheduler<Task>, source: ElementId) -> bool {
        let Some(binding) = self.bindings.remove(&source) else {
            return false;
        };
        if let Some(timer) = binding.pending {
            scheduler.cancel(timer);
        }
        true
    }

    /// Unbind every source that has left the document. Returns how many were dropped.
    pub fn prune(&mut self, doc: &Document, scheduler: &mut Scheduler<Task>) -> usize {
        let detached: Vec<ElementId> = self
            .bindings
            .keys()
            .copied()
            .filter(|source| !doc.is_connected(*source))
            .collect();
        for source in &detached {
            self.unbind(scheduler, *source);
        }
        detached.len()
    }

    /// Restart the quiet period for `source`. Returns `false` for unbound sources.
    pub fn on_input(&mut self, scheduler: &mut Scheduler<Task>, source: ElementId) -> bool {
        let quiet_ms = self.quiet_ms;
        let Some(binding) = self.bindings.get_mut(&source) else {
            return false;
        };
        if let Some(previous) = binding.pending.take() {
            scheduler.cancel(previous);
        }
        binding.pending = Some(scheduler.schedule(quiet_ms, Task::DebounceFire { source }));
        true
    }

    /// The quiet period elapsed. Returns the trigger to dispatch on `source`,
    /// or `None` if the source was unbound or has left the document.
    pub fn fire(&mut self, doc: &Document, source: ElementId) -> Option<EventKind> {
        let binding = self.bindings.get_mut(&source)?;
        binding.pending = None;
        if !doc.is_connected(source) {
            debug!(%source, "debounced source detached; trigger dropped");
            return None;
        }
        Some(binding.trigger.clone())
    }

    /// Whether `source` has a trigger waiting for its quiet period to end.
    pub fn is_pending(&self, source: ElementId) -> bool {
        self.bindings
            .get(&source)
            .is_some_and(|b| b.pending.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpm_core::{ElementSpec, Timestamp};

    fn setup() -> (Document, Scheduler<Task>, DebouncedTrigger, ElementId) {
        let doc = Document::with_body(&[ElementSpec::new("input").id("search-input")]).unwrap();
        let source = doc.get_element_by_id("search-input").unwrap();
        let mut debounce = DebouncedTrigger::new(300);
        debounce.bind(source, EventKind::from_name("search"));
        (doc, Scheduler::new(), debounce, source)
    }

    #[test]
    fn burst_leaves_a_single_timer_after_the_last_input() {
        let (_, mut sched, mut debounce, source) = setup();
        for at in [0, 100, 250] {
            sched.advance_clock(Timestamp::from_millis(at));
            assert!(debounce.on_input(&mut sched, source));
        }
        assert_eq!(sched.pending_timers(), 1);
        assert_eq!(sched.next_deadline(), Some(Timestamp::from_millis(550)));
    }

    #[test]
    fn fire_yields_the_bound_trigger() {
        let (doc, mut sched, mut debounce, source) = setup();
        debounce.on_input(&mut sched, source);
        assert!(debounce.is_pending(source));
        assert_eq!(debounce.fire(&doc, source), Some(EventKind::Custom("search".into())));
        assert!(!debounce.is_pending(source));
    }

    #[test]
    fn unbind_discards_pending_trigger() {
        let (_, mut sched, mut debounce, source) = setup();
        debounce.on_input(&mut sched, source);
        assert!(debounce.unbind(&mut sched, source));
        assert_eq!(sched.pending_timers(), 0);
        assert!(!debounce.on_input(&mut sched, source));
    }

    #[test]
    fn detached_source_does_not_fire() {
        let (mut doc, mut sched, mut debounce, source) = setup();
        debounce.on_input(&mut sched, source);
        doc.remove(source).unwrap();
        assert_eq!(debounce.fire(&doc, source), None);
    }
}

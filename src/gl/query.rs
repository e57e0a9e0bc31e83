//! Registry and completion polling for in-flight device queries.
//!
//! Query results become available at an indeterminate future time. The
//! registry never waits for them: the owning render loop calls
//! [`Context::poll_queries`] once per tick, each entry gets one
//! non-blocking availability check, and results are delivered exactly
//! once through the channel chosen at issuance. Polling itself never
//! fails; a device error during a check discards the query and surfaces
//! the error through the delivery channel instead.
//!
//! [`Context::poll_queries`]: crate::gl::context::Context::poll_queries

use std::cell::RefCell;
use std::rc::Rc;

use super::device::{GlDevice, QueryId};
use super::error::{ContextError, Result};
use super::structs::QueryTarget;

/// Lifecycle of one in-flight query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Pending,
    Ready,
    Discarded,
}

/// What a completed query delivers: the result value, or the failure
/// that ended it.
pub type QueryOutcome = Result<u64>;

/// Shared slot a query result is fulfilled into.
#[derive(Clone, Default)]
pub struct QuerySlot {
    inner: Rc<RefCell<Option<QueryOutcome>>>,
}

impl QuerySlot {
    pub fn get(&self) -> Option<QueryOutcome> {
        self.inner.borrow().clone()
    }

    pub fn is_fulfilled(&self) -> bool {
        self.inner.borrow().is_some()
    }

    fn fill(&self, outcome: QueryOutcome) {
        *self.inner.borrow_mut() = Some(outcome);
    }
}

pub(crate) enum Delivery {
    Callback(Box<dyn FnOnce(QueryOutcome)>),
    Slot(QuerySlot),
}

/// One in-flight asynchronous device query.
pub struct PendingQuery {
    query: QueryId,
    target: QueryTarget,
    state: QueryState,
    delivery: Option<Delivery>,
}

impl PendingQuery {
    pub fn target(&self) -> QueryTarget {
        self.target
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    /// Deliver `outcome` through the issuance channel, at most once.
    fn deliver(&mut self, outcome: QueryOutcome) {
        match self.delivery.take() {
            Some(Delivery::Callback(callback)) => callback(outcome),
            Some(Delivery::Slot(slot)) => slot.fill(outcome),
            None => {}
        }
    }
}

/// The set of in-flight queries of one context.
#[derive(Default)]
pub struct QueryRegistry {
    entries: Vec<PendingQuery>,
}

impl QueryRegistry {
    pub(crate) fn track(&mut self, query: QueryId, target: QueryTarget, delivery: Delivery) {
        self.entries.push(PendingQuery {
            query,
            target,
            state: QueryState::Pending,
            delivery: Some(delivery),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run one non-blocking completion pass over every entry.
    pub fn poll(&mut self, device: &mut dyn GlDevice) {
        let mut index = 0;
        while index < self.entries.len() {
            let query = self.entries[index].query;
            match device.query_available(query) {
                Ok(false) => {
                    index += 1;
                }
                Ok(true) => {
                    let mut entry = self.entries.remove(index);
                    let outcome = device.query_result(query);
                    entry.state = if outcome.is_ok() {
                        QueryState::Ready
                    } else {
                        QueryState::Discarded
                    };
                    let _ = device.delete_query(query);
                    entry.deliver(outcome);
                }
                Err(err) => {
                    // The availability check itself failed; the consumer
                    // hears about it, the poll loop does not.
                    let mut entry = self.entries.remove(index);
                    entry.state = QueryState::Discarded;
                    let _ = device.delete_query(query);
                    entry.deliver(Err(err));
                }
            }
        }
    }

    /// Discard every entry, delivering the teardown failure to each
    /// consumer.
    pub fn discard_all(&mut self, device: &mut dyn GlDevice) {
        for mut entry in self.entries.drain(..) {
            entry.state = QueryState::Discarded;
            let _ = device.delete_query(entry.query);
            entry.deliver(Err(ContextError::QueryDiscarded));
        }
    }
}

//! Named, weighted actions
//!
//! Each actor kind declares its actions once in an `ActionSet`, which is then
//! shared read-only across every actor of that kind. Selection builds a
//! cumulative-weight array at registration time and picks with a single
//! uniform draw.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rand::Rng;

use crate::api::ApiError;

/// How an action iteration ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The action ran its calls to completion
    Done,
    /// A required cached ID was missing; no calls were made
    Skipped,
}

/// Result of one action iteration
pub type ActionResult = Result<Completion, ApiError>;

/// Boxed async handler over an actor's state
pub type Handler<A> =
    Arc<dyn for<'a> Fn(&'a mut A) -> Pin<Box<dyn Future<Output = ActionResult> + Send + 'a>> + Send + Sync>;

/// One named, weighted action of an actor kind
pub struct Action<A> {
    name: &'static str,
    weight: u32,
    handler: Handler<A>,
}

impl<A> Action<A> {
    pub fn new(name: &'static str, weight: u32, handler: Handler<A>) -> Self {
        Self {
            name,
            // A zero weight would make the action unreachable; treat it as 1.
            weight: weight.max(1),
            handler,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Run one iteration of this action against `state`
    pub fn perform<'a>(
        &self,
        state: &'a mut A,
    ) -> Pin<Box<dyn Future<Output = ActionResult> + Send + 'a>> {
        (self.handler)(state)
    }
}

/// Wrap an `async fn(&mut State) -> ActionResult` into an [`Action`].
///
/// ```ignore
/// ActionSet::new().register(action!("read_stream", 3, Self::read_stream))
/// ```
#[macro_export]
macro_rules! action {
    ($name:literal, $weight:expr, $func:path) => {
        $crate::harness::Action::new(
            $name,
            $weight,
            ::std::sync::Arc::new(move |state| ::std::boxed::Box::pin($func(state))),
        )
    };
}

/// The action table of one actor kind
pub struct ActionSet<A> {
    actions: Vec<Action<A>>,
    cumulative: Vec<u32>,
    total_weight: u32,
}

impl<A> ActionSet<A> {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            cumulative: Vec::new(),
            total_weight: 0,
        }
    }

    pub fn register(mut self, action: Action<A>) -> Self {
        self.total_weight += action.weight();
        self.cumulative.push(self.total_weight);
        self.actions.push(action);
        self
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.actions.iter().map(Action::name)
    }

    /// Look up one action by name
    pub fn get(&self, name: &str) -> Option<&Action<A>> {
        self.actions.iter().find(|action| action.name == name)
    }

    /// Draw one action proportionally to the registered weights
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<&Action<A>> {
        if self.actions.is_empty() {
            return None;
        }
        let draw = rng.random_range(0..self.total_weight);
        let idx = self.cumulative.partition_point(|&bound| bound <= draw);
        self.actions.get(idx)
    }
}

impl<A> Default for ActionSet<A> {
    fn default() -> Self {
        Self::new()
    }
}

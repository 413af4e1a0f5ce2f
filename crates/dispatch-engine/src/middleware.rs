//! Prioritized asynchronous filter/annotate pipeline.

use crate::container::Container;
use futures::future::BoxFuture;
use std::future::Future;
use tracing::debug;

type StepFn =
    Box<dyn Fn(Container) -> BoxFuture<'static, anyhow::Result<Option<Container>>> + Send + Sync>;

/// One step in the chain. Returning `None` drops the event silently;
/// returning an error aborts the chain and surfaces to the caller.
pub struct Middleware {
    name: Option<String>,
    priority: i32,
    run: StepFn,
}

impl Middleware {
    pub fn new<F, Fut>(name: impl Into<String>, priority: i32, step: F) -> Self
    where
        F: Fn(Container) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<Container>>> + Send + 'static,
    {
        Self {
            name: Some(name.into()),
            priority,
            run: Box::new(move |container| Box::pin(step(container))),
        }
    }

    pub fn anonymous<F, Fut>(priority: i32, step: F) -> Self
    where
        F: Fn(Container) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<Container>>> + Send + 'static,
    {
        Self {
            name: None,
            priority,
            run: Box::new(move |container| Box::pin(step(container))),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }
}

/// Steps ordered by ascending priority, ties broken by registration order.
#[derive(Default)]
pub struct MiddlewareChain {
    steps: Vec<Middleware>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insertion sort keeps iteration order current without a sort pass at
    /// dispatch time.
    pub fn register(&mut self, step: Middleware) {
        let at = self
            .steps
            .partition_point(|existing| existing.priority <= step.priority);
        self.steps.insert(at, step);
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order. Steps are strictly sequential; later steps
    /// depend on fields set by earlier ones.
    pub async fn run(&self, mut container: Container) -> anyhow::Result<Option<Container>> {
        for step in &self.steps {
            match (step.run)(container).await {
                Ok(Some(next)) => container = next,
                Ok(None) => {
                    debug!(
                        step = step.name.as_deref().unwrap_or("<unnamed>"),
                        "middleware vetoed event"
                    );
                    return Ok(None);
                }
                Err(fault) => {
                    let step = step.name.as_deref().unwrap_or("<unnamed>").to_string();
                    return Err(fault.context(format!("middleware step {step} failed")));
                }
            }
        }
        Ok(Some(container))
    }
}

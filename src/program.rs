// program.rs
use std::future::Future;

use futures_util::future::{BoxFuture, FutureExt, join_all};

use crate::{
    error::{BatchError, IotError},
    models::Message,
    service::IotService,
};

/// Awaits each operation in order. Operations are lazy futures, so one that
/// follows a failure is never polled; the first error is returned.
pub async fn sequence<I, F, T>(operations: I) -> Result<Vec<T>, IotError>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, IotError>>,
{
    let mut outputs = Vec::new();
    for operation in operations {
        outputs.push(operation.await?);
    }
    Ok(outputs)
}

/// Drives every operation to completion concurrently, then reports all
/// failures together as a `BatchError`.
pub async fn parallel<I, F, T>(operations: I) -> Result<Vec<T>, IotError>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, IotError>>,
{
    let results = join_all(operations).await;
    let attempted = results.len();

    let mut outputs = Vec::with_capacity(attempted);
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(output) => outputs.push(output),
            Err(e) => failures.push(e),
        }
    }

    if failures.is_empty() {
        Ok(outputs)
    } else {
        Err(BatchError::new(attempted, failures).into())
    }
}

/// A multi-device routine built from messages and the two combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routine {
    Send(Message),
    Sequence(Vec<Routine>),
    Parallel(Vec<Routine>),
}

impl Routine {
    pub fn send(message: Message) -> Self {
        Routine::Send(message)
    }

    pub fn sequence(steps: impl IntoIterator<Item = Routine>) -> Self {
        Routine::Sequence(steps.into_iter().collect())
    }

    pub fn parallel(steps: impl IntoIterator<Item = Routine>) -> Self {
        Routine::Parallel(steps.into_iter().collect())
    }

    pub fn execute<'a>(&'a self, service: &'a IotService) -> BoxFuture<'a, Result<(), IotError>> {
        async move {
            match self {
                Routine::Send(message) => service.dispatch(message).await,
                Routine::Sequence(steps) => {
                    let operations: Vec<_> =
                        steps.iter().map(|step| step.execute(service)).collect();
                    sequence(operations).await?;
                    Ok(())
                }
                Routine::Parallel(steps) => {
                    let operations: Vec<_> =
                        steps.iter().map(|step| step.execute(service)).collect();
                    parallel(operations).await?;
                    Ok(())
                }
            }
        }
        .boxed()
    }
}

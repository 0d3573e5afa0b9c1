use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::{debug, warn};

use crate::agent::{AgentCell, AgentContext, Message};
use crate::state::{FailureReason, HandlerFailure};

use super::types::DrainOutcome;

/// 清空收件箱并依次处理快照中的消息
///
/// 收件箱在处理前一次性清空；处理期间新到达的消息留到下一轮。
pub async fn drain_and_process(
    cell: &AgentCell,
    round: u32,
    handler_timeout: Option<Duration>,
) -> DrainOutcome {
    let batch = cell.mailbox().drain();
    process_batch(cell, batch, round, handler_timeout).await
}

/// 处理已取出的一批消息，单条消息失败不影响其余消息
pub async fn process_batch(
    cell: &AgentCell,
    batch: Vec<Message>,
    round: u32,
    handler_timeout: Option<Duration>,
) -> DrainOutcome {
    let mut outcome = DrainOutcome::default();
    if batch.is_empty() {
        return outcome;
    }
    debug!(agent = %cell.id(), round, pending = batch.len(), "draining mailbox");

    for message in batch {
        outcome.processed += 1;
        match invoke(cell, message.clone(), round, handler_timeout).await {
            Ok(Some(response)) => outcome.responses.push(response),
            Ok(None) => {}
            Err(reason) => {
                warn!(
                    agent = %cell.id(),
                    round,
                    kind = %message.kind(),
                    from = %message.sender(),
                    ?reason,
                    "handler failed, message dropped"
                );
                outcome.failures.push(HandlerFailure {
                    round,
                    agent: cell.id().clone(),
                    message,
                    reason,
                });
            }
        }
    }
    outcome
}

async fn invoke(
    cell: &AgentCell,
    message: Message,
    round: u32,
    handler_timeout: Option<Duration>,
) -> std::result::Result<Option<Message>, FailureReason> {
    let ctx = AgentContext {
        id: cell.id(),
        knowledge: cell.knowledge(),
        round,
    };
    let call = AssertUnwindSafe(cell.handler().handle(message, &ctx)).catch_unwind();

    let result = match handler_timeout {
        Some(limit) => {
            let started = Instant::now();
            let result = tokio::time::timeout(limit, call)
                .await
                .map_err(|_| timed_out(limit))?;
            // 阻塞线程的 handler 无法被提前打断，只能事后判定超时
            if started.elapsed() > limit {
                return Err(timed_out(limit));
            }
            result
        }
        None => call.await,
    };

    match result {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(err)) => Err(FailureReason::Error(err.to_string())),
        Err(payload) => Err(FailureReason::Panic(panic_message(payload.as_ref()))),
    }
}

fn timed_out(limit: Duration) -> FailureReason {
    FailureReason::Timeout {
        limit_ms: limit.as_millis() as u64,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "handler panicked".to_string()
    }
}

//! The step-program engine: a per-connection actor task that owns the
//! socket exclusively and drains a FIFO of submitted commands one at a
//! time.
//!
//! This is the async/await transcription of the source's hand-rolled
//! `StreamProtocol` scheduling loop (`_do` / `_advance` / `_work`). There
//! the loop has to poll an `is_waiting()` flag and re-enter itself from I/O
//! callbacks because the language has no native suspension; here `.await`
//! *is* the suspension point, so the loop is a plain `while let Some(cmd) =
//! rx.recv().await`.

use tokio::sync::{mpsc, oneshot};

use crate::adaptor::Adaptor;
use crate::error::{ClientError, Result};
use crate::step::{self, Program};
use crate::value::Value;
use crate::wire::Frame;

/// One submitted operation: a request frame, the steps that decode its
/// response, and the one-shot sender the engine replies through.
struct Command {
    frame: Frame,
    steps: Program,
    reply: oneshot::Sender<Result<Value>>,
}

/// A non-owning capability to submit commands to a running engine task.
///
/// Cloning an `EngineHandle` shares the same underlying channel, so several
/// callers may pipeline commands against the same connection; the engine
/// task still drains them one at a time, in submission order.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
}

impl EngineHandle {
    /// Enqueue `frame` plus its decode `steps` and await the engine's
    /// reply. Ordering with respect to other `submit` calls on the same
    /// handle (or a clone of it) is FIFO.
    pub async fn submit(&self, frame: Frame, steps: Program) -> Result<Value> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command {
                frame,
                steps,
                reply,
            })
            .await
            .map_err(|_| ClientError::ConnectionClosed)?;
        rx.await.map_err(|_| ClientError::ConnectionClosed)?
    }
}

/// Spawn the engine task over `adaptor`, returning a handle callers use to
/// submit commands. The task runs until every `EngineHandle` clone has been
/// dropped (closing the channel) or the connection is tainted and its
/// backlog drained.
pub fn spawn<A>(adaptor: A, max_frame_len: u32) -> EngineHandle
where
    A: Adaptor + 'static,
{
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(run(adaptor, rx, max_frame_len));
    EngineHandle { tx }
}

/// The engine task body: pop a command, write its frame, run its step
/// program, reply once. On the first unrecoverable error the connection is
/// tainted and every command still in the channel is failed with
/// [`ClientError::ConnectionClosed`] without touching the socket again.
async fn run<A>(mut adaptor: A, mut rx: mpsc::Receiver<Command>, max_frame_len: u32)
where
    A: Adaptor,
{
    while let Some(cmd) = rx.recv().await {
        tracing::debug!(steps = cmd.steps.len(), "engine: executing command");
        let outcome = execute(&mut adaptor, cmd.frame, &cmd.steps, max_frame_len).await;
        let tainted = matches!(&outcome, Err(e) if e.is_connection_fatal());
        match &outcome {
            Ok(_) => tracing::debug!("engine: command complete"),
            Err(e) if tainted => tracing::error!(error = %e, "engine: command complete with fatal error"),
            Err(e) => tracing::debug!(error = %e, "engine: command complete with protocol error"),
        }
        let _ = cmd.reply.send(outcome);
        if tainted {
            tracing::error!("engine: connection tainted, draining backlog");
            drain(rx).await;
            return;
        }
    }
    tracing::debug!("engine: command channel closed, shutting down");
}

async fn execute<A: Adaptor>(
    adaptor: &mut A,
    frame: Frame,
    steps: &Program,
    max_frame_len: u32,
) -> Result<Value> {
    adaptor.write_frame(&frame).await?;
    step::run_program(steps, adaptor, max_frame_len).await
}

/// Fail every command still queued with [`ClientError::ConnectionClosed`],
/// deferred onto the runtime rather than run as one synchronous stack, so a
/// long backlog doesn't block the task that dropped the last live handle.
async fn drain(mut rx: mpsc::Receiver<Command>) {
    crate::adaptor::schedule(async move {
        while let Some(cmd) = rx.recv().await {
            let _ = cmd.reply.send(Err(ClientError::ConnectionClosed));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Step;
    use crate::test_support::MockAdaptor;
    use crate::wire::frame;

    #[tokio::test]
    async fn submit_resolves_with_decoded_value() {
        let adaptor = MockAdaptor::with_response([0x00]);
        let handle = spawn(adaptor, crate::wire::decode::DEFAULT_MAX_FRAME_LEN);
        let result = handle
            .submit(frame::t0(crate::protocol::op::SYNC), vec![Step::DecodeSuccess])
            .await
            .unwrap();
        assert_eq!(result, Value::Unit);
    }

    #[tokio::test]
    async fn pipelined_commands_resolve_in_submission_order() {
        let mut response = Vec::new();
        response.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x01, b'a']);
        response.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x01, b'b']);
        let adaptor = MockAdaptor::with_response(response);
        let handle = spawn(adaptor, crate::wire::decode::DEFAULT_MAX_FRAME_LEN);

        let first = handle.submit(
            frame::t1(crate::protocol::op::GET, b"k1"),
            vec![Step::DecodeSuccess, Step::DecodeString],
        );
        let second = handle.submit(
            frame::t1(crate::protocol::op::GET, b"k2"),
            vec![Step::DecodeSuccess, Step::DecodeString],
        );
        let (a, b) = tokio::join!(first, second);
        assert_eq!(a.unwrap().into_bytes().unwrap(), &b"a"[..]);
        assert_eq!(b.unwrap().into_bytes().unwrap(), &b"b"[..]);
    }

    #[tokio::test]
    async fn protocol_error_does_not_taint_the_connection() {
        // One byte of response for the failing `get`, then a full `rnum`
        // response for the command queued behind it: a protocol error (a
        // missing key) must not stop the connection from serving later
        // commands.
        let mut response = vec![0x01];
        response.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2A]);
        let adaptor = MockAdaptor::with_response(response);
        let handle = spawn(adaptor, crate::wire::decode::DEFAULT_MAX_FRAME_LEN);

        let first = handle
            .submit(
                frame::t1(crate::protocol::op::GET, b"missing"),
                vec![Step::DecodeSuccess, Step::DecodeString],
            )
            .await;
        assert!(matches!(first, Err(ClientError::Protocol { status: 1 })));

        let second = handle
            .submit(frame::t0(crate::protocol::op::RNUM), vec![Step::DecodeU64])
            .await
            .unwrap();
        assert_eq!(second.into_u64().unwrap(), 42);
    }

    #[tokio::test]
    async fn framing_error_taints_connection_and_fails_queued_commands() {
        // An oversized length field is a framing error and must taint the
        // connection: the queued command behind it never touches the
        // socket again and resolves to `ConnectionClosed`.
        let adaptor = MockAdaptor::with_response([0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
        let handle = spawn(adaptor, crate::wire::decode::DEFAULT_MAX_FRAME_LEN);

        let first = handle
            .submit(
                frame::t1(crate::protocol::op::GET, b"key"),
                vec![Step::DecodeSuccess, Step::DecodeString],
            )
            .await;
        assert!(matches!(first, Err(ClientError::Framing(_))));

        let second = handle
            .submit(frame::t0(crate::protocol::op::RNUM), vec![Step::DecodeU64])
            .await;
        assert!(matches!(second, Err(ClientError::ConnectionClosed)));
    }
}

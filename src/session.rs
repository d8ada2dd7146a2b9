//! Session engine: one live connection's lifecycle.
//!
//! The engine owns the transport for the duration of a session and drives
//! a strict request/response loop: read one inbound unit, classify it,
//! dispatch to the matching pipeline, write one outcome. At most one
//! outcome is ever in flight, so outbound order always equals inbound
//! order. The only other concurrency is the keepalive task, which is
//! cancelled unconditionally on every exit path before the transport is
//! released.

use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::Result;
use crate::capability::Capabilities;
use crate::config::EngineConfig;
use crate::pipeline::{AudioPipeline, CameraPipeline, ScreenPipeline};
use crate::sniff::{self, ContentKind};
use crate::transport::{Inbound, Transport};
use crate::types::{ErrorEnvelope, Frame, OutboundMessage};

/// Liveness probe payload. The collaborator transport does not require an
/// application-level pong.
const PING_PAYLOAD: &str = "ping";

/// Lifecycle state of one session. States are entered strictly in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Connecting,
    Active,
    Draining,
    Closed,
}

/// Engine for one live connection.
///
/// Created on accept, destroyed on terminal cleanup; exactly one instance
/// exists per connection. Pipeline state (caches, history) is scoped to
/// the engine instance.
pub struct SessionEngine<T: Transport> {
    transport: T,
    state: SessionState,
    config: EngineConfig,
    audio: AudioPipeline,
    camera: CameraPipeline,
    screen: ScreenPipeline,
}

impl<T: Transport> SessionEngine<T> {
    /// Build an engine over an accepted transport.
    pub fn new(transport: T, capabilities: Capabilities, config: EngineConfig) -> Self {
        let audio = AudioPipeline::new(
            capabilities.speech,
            capabilities.transcoder,
            config.language.clone(),
        );
        let camera = CameraPipeline::new(
            capabilities.vision,
            capabilities.chat.clone(),
            config.camera.clone(),
            config.history_cap,
            config.cleanup_every,
        );
        let screen = ScreenPipeline::new(
            capabilities.chat,
            config.screen.clone(),
            config.comment_interval,
            config.history_cap,
            config.cleanup_every,
        );
        Self { transport, state: SessionState::Connecting, config, audio, camera, screen }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session to completion.
    ///
    /// Returns `Ok(())` on an orderly disconnect (explicit signal or remote
    /// close) and the transport error on an unrecoverable read failure.
    /// Either way the keepalive task is cancelled and the transport is
    /// released exactly once before returning.
    pub async fn run(mut self) -> Result<()> {
        self.transition(SessionState::Active);

        let cancel = CancellationToken::new();
        let (tick_tx, mut tick_rx) = mpsc::channel(1);
        let keepalive = tokio::spawn(keepalive_task(
            tick_tx,
            cancel.clone(),
            self.config.keepalive_interval,
        ));

        let result = self.active_loop(&mut tick_rx).await;

        self.transition(SessionState::Draining);

        // Cancellation must be unconditional: a pending probe must never
        // fire after the connection resource is released.
        cancel.cancel();
        let _ = keepalive.await;

        if let Err(e) = self.transport.close().await {
            warn!(error = %e, "Error releasing transport");
        }
        self.transition(SessionState::Closed);

        result
    }

    /// The Active-state loop: probes and inbound units, one at a time.
    async fn active_loop(&mut self, tick_rx: &mut mpsc::Receiver<()>) -> Result<()> {
        enum Step {
            Probe,
            Inbound(Result<Option<Inbound>>),
        }

        let mut frame_count = 0u64;
        loop {
            // Resolve the select to a value first so the transport borrow
            // taken by the read future has ended before we write to it.
            let step = tokio::select! {
                Some(()) = tick_rx.recv() => Step::Probe,
                inbound = self.transport.recv() => Step::Inbound(inbound),
            };

            match step {
                Step::Probe => {
                    // A failed probe is logged but not fatal by itself; a
                    // dead transport surfaces on the next read.
                    if let Err(e) = self.transport.send_text(PING_PAYLOAD).await {
                        warn!(error = %e, "Failed to send liveness probe");
                    }
                }
                Step::Inbound(Ok(Some(Inbound::Binary(data)))) => {
                    frame_count += 1;
                    debug!(bytes = data.len(), frame_count, "Received binary frame");
                    self.dispatch(data).await;
                }
                Step::Inbound(Ok(Some(Inbound::Text(text)))) => {
                    // Control traffic: logged, no pipeline, no reply.
                    info!(text = %text, "Received text control message");
                }
                Step::Inbound(Ok(Some(Inbound::Disconnect))) => {
                    info!(frame_count, "Client initiated disconnect");
                    return Ok(());
                }
                Step::Inbound(Ok(None)) => {
                    info!(frame_count, "Client disconnected");
                    return Ok(());
                }
                Step::Inbound(Err(e)) => {
                    error!(error = %e, "Unrecoverable transport read error");
                    return Err(e);
                }
            }
        }
    }

    /// Classify one binary frame, run the matching pipeline, and write the
    /// outcome back.
    async fn dispatch(&mut self, data: Vec<u8>) {
        let frame = Frame::new(data);
        let outcome = match sniff::classify(&frame.data) {
            ContentKind::Audio => self.audio.process(frame).await,
            ContentKind::CameraImage => self.camera.process(frame).await,
            ContentKind::ScreenImage => self.screen.process(frame).await,
            ContentKind::Unknown => {
                // Unknown frames are dropped, never forwarded and never
                // answered.
                warn!(bytes = frame.len(), "Dropping frame with unrecognized prefix");
                return;
            }
        };

        let message = outcome.to_message();
        if let Err(e) = self.transport.send(&message).await {
            // A write failure does not end the session; only a transport
            // level read failure does. Answer best-effort and move on.
            warn!(error = %e, "Failed to write outcome");
            let fallback = OutboundMessage::Error {
                error: ErrorEnvelope {
                    kind: "unknown".to_string(),
                    message: "failed to deliver analysis result".to_string(),
                },
            };
            if let Err(e) = self.transport.send(&fallback).await {
                warn!(error = %e, "Failed to write fallback error envelope");
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(next > self.state, "session states advance strictly forward");
        debug!(from = ?self.state, to = ?next, "Session state transition");
        self.state = next;
    }
}

/// Emits one keepalive tick per period until cancelled.
///
/// The probe itself is written by the session loop, which owns the
/// transport; this task only paces it. Dropping the receiver also stops
/// the task, as a backstop if the loop is torn down abruptly.
async fn keepalive_task(tick_tx: mpsc::Sender<()>, cancel: CancellationToken, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the probe starts one full
    // period after activation.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Keepalive task cancelled");
                break;
            }
            _ = ticker.tick() => {
                if tick_tx.send(()).await.is_err() {
                    debug!("Keepalive receiver dropped");
                    break;
                }
            }
        }
    }
}

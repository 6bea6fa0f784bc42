use crate::api::reference::GridReference;
use crate::core::constants::ACK_TIMEOUT;
use crate::util::coord::GeodeticPosition;
use crate::util::dms::{Hemisphere, to_dms};
use crate::util::error::{BngError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Generation token identifying one delivery attempt.
///
/// Handles increase monotonically per coordinator, so a completion carrying
/// an older handle can never resolve a newer delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeliveryHandle(u64);

impl DeliveryHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeliveryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What gets sent to the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPayload {
    /// Full 12-character grid reference
    pub bng: String,
    /// Latitude in signed-floor DMS, N/S suffix
    pub latitude: String,
    /// Longitude in signed-floor DMS, E/W suffix
    pub longitude: String,
}

impl DeliveryPayload {
    pub fn new(reference: &GridReference, position: &GeodeticPosition) -> Self {
        Self {
            bng: reference.to_string(),
            latitude: to_dms(position.latitude, Hemisphere::LATITUDE),
            longitude: to_dms(position.longitude, Hemisphere::LONGITUDE),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| BngError::Serialization(e.to_string()))
    }
}

/// Outbound channel to the peer.
///
/// `send` only starts a delivery. The outcome must be reported back later
/// through [`DeliveryCoordinator::on_acknowledge`] or
/// [`DeliveryCoordinator::on_delivery_failure`] with the same handle.
/// Returning an error counts as an immediate delivery failure.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, handle: DeliveryHandle, payload: &DeliveryPayload) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub ack_timeout: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            ack_timeout: ACK_TIMEOUT,
        }
    }
}

impl DeliveryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }
}

/// Observable state of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Idle,
    AwaitingAck {
        handle: DeliveryHandle,
        deadline: Instant,
    },
}

enum Slot {
    Idle,
    AwaitingAck {
        handle: DeliveryHandle,
        deadline: Instant,
        timer: AbortHandle,
    },
}

struct State {
    slot: Slot,
    last_handle: u64,
}

struct Shared<T> {
    transport: T,
    config: DeliveryConfig,
    state: Mutex<State>,
}

/// Sends grid references to a peer, one at a time.
///
/// At most one delivery is in flight. A request made while awaiting an
/// acknowledgement is dropped. Each delivery ends on the first of
/// acknowledgement, failure, or the ack deadline; later events for the same
/// handle are ignored. Nothing is retried.
///
/// Must be used inside a tokio runtime: the deadline is a spawned timer task.
pub struct DeliveryCoordinator<T: Transport> {
    shared: Arc<Shared<T>>,
}

impl<T: Transport> Clone for DeliveryCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Transport> DeliveryCoordinator<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, DeliveryConfig::default())
    }

    pub fn with_config(transport: T, config: DeliveryConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                config,
                state: Mutex::new(State {
                    slot: Slot::Idle,
                    last_handle: 0,
                }),
            }),
        }
    }

    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    pub fn state(&self) -> DeliveryState {
        match self.shared.state.lock().slot {
            Slot::Idle => DeliveryState::Idle,
            Slot::AwaitingAck {
                handle, deadline, ..
            } => DeliveryState::AwaitingAck { handle, deadline },
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.shared.state.lock().slot, Slot::Idle)
    }

    /// Starts delivering `reference` unless a delivery is already in flight.
    ///
    /// Returns the handle of the new delivery, or `None` if the request was
    /// dropped.
    pub fn request_delivery(
        &self,
        reference: &GridReference,
        position: &GeodeticPosition,
    ) -> Option<DeliveryHandle> {
        let (handle, payload) = {
            let mut state = self.shared.state.lock();
            if let Slot::AwaitingAck { handle, .. } = state.slot {
                debug!(in_flight = %handle, reference = %reference, "delivery in flight, dropping request");
                return None;
            }

            state.last_handle += 1;
            let handle = DeliveryHandle(state.last_handle);
            let deadline = Instant::now() + self.shared.config.ack_timeout;
            let timer = self.spawn_deadline(handle, deadline);
            state.slot = Slot::AwaitingAck {
                handle,
                deadline,
                timer,
            };
            (handle, DeliveryPayload::new(reference, position))
        };

        debug!(%handle, bng = %payload.bng, latitude = %payload.latitude, longitude = %payload.longitude, "sending");
        // The lock is released so a transport may complete synchronously.
        if let Err(e) = self.shared.transport.send(handle, &payload) {
            self.on_delivery_failure(handle, &e.to_string());
        }
        Some(handle)
    }

    /// The peer acknowledged `handle`. Returns `false` if it was already resolved.
    pub fn on_acknowledge(&self, handle: DeliveryHandle) -> bool {
        let resolved = self.resolve(handle);
        if resolved {
            info!(%handle, "delivered");
        } else {
            debug!(%handle, "ignoring stale acknowledgement");
        }
        resolved
    }

    /// The transport reported failure for `handle`. Returns `false` if it was already resolved.
    pub fn on_delivery_failure(&self, handle: DeliveryHandle, error: &str) -> bool {
        let resolved = self.resolve(handle);
        if resolved {
            warn!(%handle, error, "unable to deliver");
        } else {
            debug!(%handle, error, "ignoring stale delivery failure");
        }
        resolved
    }

    /// The ack deadline for `handle` elapsed. Returns `false` if it was already resolved.
    pub fn on_timeout(&self, handle: DeliveryHandle) -> bool {
        let resolved = self.resolve(handle);
        if resolved {
            warn!(%handle, timeout = ?self.shared.config.ack_timeout, "timed out waiting for acknowledgement");
        }
        resolved
    }

    fn resolve(&self, handle: DeliveryHandle) -> bool {
        let mut state = self.shared.state.lock();
        match state.slot {
            Slot::AwaitingAck { handle: current, .. } if current == handle => {}
            _ => return false,
        }
        if let Slot::AwaitingAck { timer, .. } = std::mem::replace(&mut state.slot, Slot::Idle) {
            timer.abort();
        }
        true
    }

    fn spawn_deadline(&self, handle: DeliveryHandle, deadline: Instant) -> AbortHandle {
        let coordinator = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            coordinator.on_timeout(handle);
        })
        .abort_handle()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub sent: Mutex<Vec<(DeliveryHandle, DeliveryPayload)>>,
    }

    impl RecordingTransport {
        pub fn sent(&self) -> Vec<(DeliveryHandle, DeliveryPayload)> {
            self.sent.lock().clone()
        }
    }

    impl Transport for RecordingTransport {
        fn send(&self, handle: DeliveryHandle, payload: &DeliveryPayload) -> Result<()> {
            self.sent.lock().push((handle, payload.clone()));
            Ok(())
        }
    }

    struct RefusingTransport;

    impl Transport for RefusingTransport {
        fn send(&self, _: DeliveryHandle, _: &DeliveryPayload) -> Result<()> {
            Err(BngError::Transport("outbox closed".into()))
        }
    }

    fn reference() -> GridReference {
        GridReference {
            letters: ['S', 'P'],
            easting: 97,
            northing: 33506,
        }
    }

    fn position() -> GeodeticPosition {
        GeodeticPosition::new(-2.5, 52.5)
    }

    #[test]
    fn test_payload_format() -> Result<()> {
        let payload = DeliveryPayload::new(&reference(), &position());
        assert_eq!(payload.bng, "SP0009733506");
        assert_eq!(payload.latitude, "52°30'0\"N");
        assert_eq!(payload.longitude, "-3°-30'0\"W");

        let json: serde_json::Value = serde_json::from_str(&payload.to_json()?)
            .map_err(|e| BngError::Serialization(e.to_string()))?;
        assert_eq!(json["bng"], "SP0009733506");
        Ok(())
    }

    #[test]
    fn test_config_builder() {
        assert_eq!(DeliveryConfig::default().ack_timeout, Duration::from_secs(20));
        let config = DeliveryConfig::new().ack_timeout(Duration::from_secs(5));
        assert_eq!(config.ack_timeout, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_then_acknowledge() {
        let coordinator = DeliveryCoordinator::new(RecordingTransport::default());
        assert_eq!(coordinator.state(), DeliveryState::Idle);

        let start = Instant::now();
        let handle = coordinator
            .request_delivery(&reference(), &position())
            .expect("idle coordinator accepts a request");

        assert_eq!(
            coordinator.state(),
            DeliveryState::AwaitingAck {
                handle,
                deadline: start + Duration::from_secs(20),
            }
        );
        assert_eq!(coordinator.transport().sent().len(), 1);

        assert!(coordinator.on_acknowledge(handle));
        assert!(coordinator.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_is_dropped() {
        let coordinator = DeliveryCoordinator::new(RecordingTransport::default());
        let first = coordinator.request_delivery(&reference(), &position());
        let before = coordinator.state();

        assert_eq!(coordinator.request_delivery(&reference(), &position()), None);
        assert_eq!(coordinator.state(), before);
        assert_eq!(coordinator.transport().sent().len(), 1);

        let first = first.expect("first request sent");
        assert!(coordinator.on_acknowledge(first));
        let second = coordinator
            .request_delivery(&reference(), &position())
            .expect("second request sent");
        assert_eq!(second.id(), first.id() + 1);
        assert_eq!(coordinator.transport().sent().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_to_idle() {
        let coordinator = DeliveryCoordinator::new(RecordingTransport::default());
        let handle = coordinator
            .request_delivery(&reference(), &position())
            .expect("sent");

        tokio::time::sleep(Duration::from_secs(19)).await;
        assert!(!coordinator.is_idle());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(coordinator.is_idle());

        // late acknowledgement after the timeout won
        assert!(!coordinator.on_acknowledge(handle));
        assert!(coordinator.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_acknowledge_cancels_timeout() {
        let coordinator = DeliveryCoordinator::new(RecordingTransport::default());
        let first = coordinator
            .request_delivery(&reference(), &position())
            .expect("sent");
        assert!(coordinator.on_acknowledge(first));
        assert!(!coordinator.on_timeout(first));

        tokio::time::sleep(Duration::from_secs(10)).await;
        let second = coordinator
            .request_delivery(&reference(), &position())
            .expect("sent");

        // the first delivery's deadline must not cut the second one short
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(matches!(
            coordinator.state(),
            DeliveryState::AwaitingAck { handle, .. } if handle == second
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_resolves_once() {
        let coordinator = DeliveryCoordinator::new(RecordingTransport::default());
        let handle = coordinator
            .request_delivery(&reference(), &position())
            .expect("sent");

        assert!(coordinator.on_delivery_failure(handle, "peer busy"));
        assert!(!coordinator.on_acknowledge(handle));
        assert!(!coordinator.on_delivery_failure(handle, "peer busy"));
        assert!(coordinator.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_handle_does_not_resolve_newer_delivery() {
        let coordinator = DeliveryCoordinator::new(RecordingTransport::default());
        let first = coordinator
            .request_delivery(&reference(), &position())
            .expect("sent");
        assert!(coordinator.on_timeout(first));

        let second = coordinator
            .request_delivery(&reference(), &position())
            .expect("sent");
        assert!(!coordinator.on_acknowledge(first));
        assert!(!coordinator.is_idle());
        assert!(coordinator.on_acknowledge(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_send_is_a_failure() {
        let coordinator = DeliveryCoordinator::new(RefusingTransport);
        let handle = coordinator.request_delivery(&reference(), &position());
        assert!(handle.is_some());
        assert!(coordinator.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_timeout() {
        let config = DeliveryConfig::new().ack_timeout(Duration::from_secs(2));
        let coordinator = DeliveryCoordinator::with_config(RecordingTransport::default(), config);
        coordinator.request_delivery(&reference(), &position());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(coordinator.is_idle());
    }
}

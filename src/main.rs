use bngref_rs::{
    BngError, DeliveryCoordinator, DeliveryHandle, DeliveryPayload, GeodeticPosition,
    LocationOptions, LocationProvider, PeerView, PositionResponder, Transport,
};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Hands payloads to the simulated peer over an in-process channel.
struct ChannelTransport(mpsc::UnboundedSender<(DeliveryHandle, DeliveryPayload)>);

impl Transport for ChannelTransport {
    fn send(&self, handle: DeliveryHandle, payload: &DeliveryPayload) -> Result<(), BngError> {
        self.0
            .send((handle, payload.clone()))
            .map_err(|e| BngError::Transport(e.to_string()))
    }
}

struct FixedLocation(GeodeticPosition);

impl LocationProvider for FixedLocation {
    fn current_position(
        &self,
        _: &LocationOptions,
    ) -> impl Future<Output = Result<GeodeticPosition, BngError>> + Send {
        std::future::ready(Ok(self.0))
    }
}

#[tokio::main]
async fn main() -> Result<(), BngError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let coordinator = DeliveryCoordinator::new(ChannelTransport(tx));
    let responder = PositionResponder::new(
        FixedLocation(GeodeticPosition::new(-2.2479699500757597, 53.48082746395233)),
        coordinator.clone(),
    );

    let mut peer = PeerView::new();
    for _ in 0..3 {
        if peer.needs_refresh(Instant::now()) {
            responder.handle_request().await;
        }
        while let Ok((handle, payload)) = rx.try_recv() {
            info!(transaction = handle.id(), bng = %payload.bng, latitude = %payload.latitude, longitude = %payload.longitude, "peer received");
            peer.apply(payload, Instant::now());
            coordinator.on_acknowledge(handle);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    if let Some(reference) = peer.reference() {
        println!("{reference}");
    }
    Ok(())
}

//! # bngref-rs
//!
//! Turns WGS84 positions into British National Grid references and delivers
//! them to a peer, one at a time, under an acknowledgement timeout.
//!
//! ### 1. `GridReference` - Encoding a Position
//!
//! ```no_run
//! use bngref_rs::GridReference;
//!
//! # fn main() -> Result<(), bngref_rs::BngError> {
//! let reference = GridReference::from_wgs84(-0.1276, 51.5072)?;
//! println!("{}", reference); // TQ3004380358
//! # Ok(())
//! # }
//! ```
//!
//! The steps are also available separately: project with [`wgs84_to_bng`],
//! then [`encode`] the planar point, which runs the 5x5 square subdivision
//! ([`point_to_square`]) twice.
//!
//! ### 2. `DeliveryCoordinator` - Sending to a Peer
//!
//! ```no_run
//! use bngref_rs::{
//!     BngError, DeliveryCoordinator, DeliveryHandle, DeliveryPayload, GeodeticPosition,
//!     GridReference, Transport,
//! };
//!
//! struct Stdout;
//!
//! impl Transport for Stdout {
//!     fn send(&self, handle: DeliveryHandle, payload: &DeliveryPayload) -> Result<(), BngError> {
//!         println!("{handle}: {}", payload.to_json()?);
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), BngError> {
//! let coordinator = DeliveryCoordinator::new(Stdout);
//! let position = GeodeticPosition::new(-2.0, 52.0);
//! let reference = GridReference::from_position(&position)?;
//!
//! if let Some(handle) = coordinator.request_delivery(&reference, &position) {
//!     // ...later, when the peer confirms receipt
//!     coordinator.on_acknowledge(handle);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### 3. `PositionResponder` - Answering Requests
//!
//! Wires a [`LocationProvider`] to a coordinator: each
//! [`handle_request`](PositionResponder::handle_request) fetches a position,
//! encodes it and starts a delivery, quietly dropping anything that fails.

pub mod api;
pub mod core;
pub mod util;

pub use api::{
    DeliveryConfig, DeliveryCoordinator, DeliveryHandle, DeliveryPayload, DeliveryState,
    GridReference, LocationOptions, LocationProvider, PeerView, PositionResponder, Transport,
    encode, in_coverage,
};
pub use core::{
    ACK_TIMEOUT, BNG_PROJ_DEFINITION, COVERAGE_ENVELOPE, GRID_EXTENT, SQUARE_LETTERS,
    SquareResult, grid_bounds, letter_to_square, point_to_square,
};
pub use util::{
    BngError, Coordinate, GeodeticPosition, Hemisphere, Result, to_dms, wgs84_to_bng,
};

pub use geo_types;

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::point;
    use parking_lot::Mutex;
    use std::time::{Duration, Instant};

    #[test]
    fn test_end_to_end_workflow() -> Result<()> {
        let position = GeodeticPosition::new(-2.0, 52.0);
        assert!(in_coverage(&position));

        let planar = wgs84_to_bng(&position)?;
        let reference = encode(&position, &planar)?;
        assert_eq!(reference.to_string(), "SP0009733506");

        let major = letter_to_square(reference.letters[0], &grid_bounds());
        let minor = major.and_then(|m| letter_to_square(reference.letters[1], &m));
        let minor = minor.expect("encoded letters name a square");
        assert!(minor.min().x <= planar.x() && planar.x() < minor.max().x);
        assert!(minor.min().y <= planar.y() && planar.y() < minor.max().y);
        Ok(())
    }

    #[test]
    fn test_reference_digits_are_fixed_width() -> Result<()> {
        for &(lon, lat) in &[(-2.0, 52.0), (-5.0, 50.1), (-3.1883, 55.9533), (-1.0, 60.0)] {
            let reference = GridReference::from_wgs84(lon, lat)?;
            let text = reference.to_string();
            assert_eq!(text.len(), 12);
            assert!(text[..2].chars().all(|c| c.is_ascii_uppercase() && c != 'I'));
            assert!(text[2..].chars().all(|c| c.is_ascii_digit()));
            assert_eq!(text.parse::<GridReference>()?, reference);
        }
        Ok(())
    }

    #[test]
    fn test_subdivision_with_geo_types_macros() {
        let pt = point! { x: 383_641.07, y: 398_262.60 };
        let major = point_to_square(&pt, &grid_bounds());
        let minor = point_to_square(&major.relative, &major.local_bounds());
        assert_eq!(format!("{}{}", major.letter, minor.letter), "SJ");
        assert_eq!(minor.relative.x().round(), 83_641.0);
        assert_eq!(minor.relative.y().round(), 98_263.0);
    }

    struct Loopback {
        peer: Mutex<PeerView>,
        sent: Mutex<Vec<DeliveryHandle>>,
    }

    impl Transport for Loopback {
        fn send(&self, handle: DeliveryHandle, payload: &DeliveryPayload) -> Result<()> {
            self.peer.lock().apply_json(&payload.to_json()?, Instant::now())?;
            self.sent.lock().push(handle);
            Ok(())
        }
    }

    struct Fixed(GeodeticPosition);

    impl LocationProvider for Fixed {
        fn current_position(
            &self,
            _: &LocationOptions,
        ) -> impl std::future::Future<Output = Result<GeodeticPosition>> + Send {
            std::future::ready(Ok(self.0))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_deliver_acknowledge_cycle() {
        let transport = Loopback {
            peer: Mutex::new(PeerView::new()),
            sent: Mutex::new(Vec::new()),
        };
        let coordinator = DeliveryCoordinator::new(transport);
        let responder =
            PositionResponder::new(Fixed(GeodeticPosition::new(-0.1276, 51.5072)), coordinator);

        assert!(responder.coordinator().transport().peer.lock().needs_refresh(Instant::now()));

        let handle = responder.handle_request().await.expect("delivery started");
        {
            let peer = responder.coordinator().transport().peer.lock();
            assert_eq!(peer.reference(), Some("TQ3004380358"));
            assert!(!peer.needs_refresh(Instant::now()));
        }

        // a second ping before the ack is absorbed
        assert_eq!(responder.handle_request().await, None);
        assert!(responder.coordinator().on_acknowledge(handle));

        // nothing acknowledges this one, so it times out
        let second = responder.handle_request().await.expect("delivery started");
        assert!(second > handle);
        tokio::time::sleep(ACK_TIMEOUT + Duration::from_secs(1)).await;
        assert_eq!(responder.coordinator().state(), DeliveryState::Idle);
        assert_eq!(responder.coordinator().transport().sent.lock().len(), 2);
    }
}

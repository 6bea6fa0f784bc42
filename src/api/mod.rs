pub mod delivery;
pub mod peer;
pub mod reference;
pub mod responder;

pub use delivery::{
    DeliveryConfig, DeliveryCoordinator, DeliveryHandle, DeliveryPayload, DeliveryState, Transport,
};
pub use peer::PeerView;
pub use reference::{GridReference, encode, in_coverage};
pub use responder::{LocationOptions, LocationProvider, PositionResponder};

use crate::api::delivery::{DeliveryCoordinator, DeliveryHandle, Transport};
use crate::api::reference::GridReference;
use crate::core::constants::{LOCATION_MAXIMUM_AGE, LOCATION_TIMEOUT};
use crate::util::coord::GeodeticPosition;
use crate::util::error::{BngError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Options passed to the location provider on every fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationOptions {
    pub high_accuracy: bool,
    /// Oldest cached fix the provider may return
    pub maximum_age: Duration,
    pub timeout: Duration,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: LOCATION_MAXIMUM_AGE,
            timeout: LOCATION_TIMEOUT,
        }
    }
}

impl LocationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn high_accuracy(mut self, enabled: bool) -> Self {
        self.high_accuracy = enabled;
        self
    }

    pub fn maximum_age(mut self, age: Duration) -> Self {
        self.maximum_age = age;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Source of the device's current WGS84 position.
pub trait LocationProvider: Send + Sync {
    fn current_position(
        &self,
        options: &LocationOptions,
    ) -> impl Future<Output = Result<GeodeticPosition>> + Send;
}

/// Answers a peer's position request with a grid reference.
///
/// Each request fetches a fresh position, encodes it and hands it to the
/// [`DeliveryCoordinator`]. Every failure along the way is logged and
/// absorbed: the peer simply asks again later.
pub struct PositionResponder<L, T: Transport> {
    location: L,
    coordinator: DeliveryCoordinator<T>,
    options: LocationOptions,
}

impl<L: LocationProvider, T: Transport> PositionResponder<L, T> {
    pub fn new(location: L, coordinator: DeliveryCoordinator<T>) -> Self {
        Self {
            location,
            coordinator,
            options: LocationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LocationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn coordinator(&self) -> &DeliveryCoordinator<T> {
        &self.coordinator
    }

    pub fn options(&self) -> &LocationOptions {
        &self.options
    }

    /// Handles one inbound request. Returns the handle of the delivery it
    /// started, if any.
    pub async fn handle_request(&self) -> Option<DeliveryHandle> {
        debug!("position requested by peer");
        match self.location.current_position(&self.options).await {
            Ok(position) => self.deliver(&position),
            Err(e) => {
                debug!(error = %e, "no position available");
                None
            }
        }
    }

    /// Encodes `position` and starts a delivery if none is in flight.
    pub fn deliver(&self, position: &GeodeticPosition) -> Option<DeliveryHandle> {
        if !self.coordinator.is_idle() {
            debug!("still awaiting acknowledgement, ignoring position");
            return None;
        }
        debug!(
            longitude = position.longitude,
            latitude = position.latitude,
            "got position"
        );

        let reference = match GridReference::from_position(position) {
            Ok(reference) => reference,
            Err(BngError::OutOfBounds { .. }) => {
                debug!("position outside the national grid");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "unable to encode position");
                return None;
            }
        };
        debug!(%reference, "encoded");

        self.coordinator.request_delivery(&reference, position)
    }
}

use crate::error::BallotError;
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

pub const UNAVAILABLE_MESSAGE: &str =
    "Biometric authentication is not available or no biometrics are enrolled on this device.";
pub const VERIFICATION_MESSAGE: &str = "Biometric verification failed. Please try again.";

// Device biometric surface; matching itself happens on the device.
#[async_trait]
pub trait BiometricService: Send + Sync {
    async fn has_hardware(&self) -> bool;
    async fn is_enrolled(&self) -> bool;
    async fn authenticate(&self, prompt: &str) -> bool;
}

pub struct AuthGate {
    service: Arc<dyn BiometricService>,
}

impl AuthGate {
    pub fn new(service: Arc<dyn BiometricService>) -> Self {
        Self { service }
    }

    // Single attempt. A retry needs a fresh user action.
    pub async fn verify(&self, prompt: &str) -> Result<(), BallotError> {
        if !self.service.has_hardware().await {
            warn!("No biometric hardware present");
            return Err(BallotError::Unavailable(UNAVAILABLE_MESSAGE.to_string()));
        }
        if !self.service.is_enrolled().await {
            warn!("No biometrics enrolled");
            return Err(BallotError::Unavailable(UNAVAILABLE_MESSAGE.to_string()));
        }

        if self.service.authenticate(prompt).await {
            info!("Biometric challenge passed");
            Ok(())
        } else {
            warn!("Biometric challenge rejected");
            Err(BallotError::Verification(VERIFICATION_MESSAGE.to_string()))
        }
    }
}

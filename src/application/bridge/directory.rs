use super::error::BridgeError;
use crate::application::tooling::CapabilityProvider;
use crate::domain::capability::{CapabilityDescriptor, ToolDirective, to_directive_envelope};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Session-scoped cache of the provider's capability listing.
///
/// The listing is fetched once, on first use, and read-only afterwards.
pub struct CapabilityDirectory {
    provider: Arc<dyn CapabilityProvider>,
    descriptors: OnceCell<Vec<CapabilityDescriptor>>,
}

impl CapabilityDirectory {
    pub fn new(provider: Arc<dyn CapabilityProvider>) -> Self {
        Self {
            provider,
            descriptors: OnceCell::new(),
        }
    }

    pub fn provider(&self) -> &Arc<dyn CapabilityProvider> {
        &self.provider
    }

    pub async fn list(&self) -> Result<&[CapabilityDescriptor], BridgeError> {
        let descriptors = self
            .descriptors
            .get_or_try_init(|| async {
                let listed = self
                    .provider
                    .list_capabilities()
                    .await
                    .map_err(BridgeError::CapabilityListing)?;
                info!(count = listed.len(), "Capability directory populated");
                Ok::<_, BridgeError>(listed)
            })
            .await?;
        Ok(descriptors.as_slice())
    }

    pub async fn envelope(&self) -> Result<Vec<ToolDirective>, BridgeError> {
        Ok(to_directive_envelope(self.list().await?))
    }

    pub async fn contains(&self, name: &str) -> Result<bool, BridgeError> {
        Ok(self.list().await?.iter().any(|descriptor| descriptor.name == name))
    }
}

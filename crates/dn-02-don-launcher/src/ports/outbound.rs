//! Driven ports (Outbound dependencies)

use crate::domain::{OracleError, ReaderError};
use async_trait::async_trait;
use shared_types::{ActiveAndCandidate, Don, DonId, Ocr3ConfigWithMeta, OracleType, PluginType};

/// Reads OCR3 configurations from the home chain.
#[async_trait]
pub trait HomeChainReader: Send + Sync {
    /// Active and candidate configuration for one DON and plugin type.
    ///
    /// Either half may be the zero value (empty digest).
    async fn get_ocr_configs(
        &self,
        don_id: DonId,
        plugin_type: PluginType,
    ) -> Result<ActiveAndCandidate, ReaderError>;
}

/// Builds oracle instances.
#[async_trait]
pub trait OracleCreator: Send + Sync {
    /// The role this node plays; fixed for the creator's lifetime.
    fn oracle_type(&self) -> OracleType;

    /// Build (but do not start) an instance running `config` for `don`.
    async fn create(
        &self,
        don: &Don,
        config: &Ocr3ConfigWithMeta,
    ) -> Result<Box<dyn OracleInstance>, OracleError>;
}

/// A runnable protocol instance for one configuration digest.
#[async_trait]
pub trait OracleInstance: Send + Sync {
    async fn start(&self) -> Result<(), OracleError>;

    /// Stop the instance and release its resources.
    async fn close(&self) -> Result<(), OracleError>;
}

use async_trait::async_trait;

use crate::Result;

/// Where rendered alerts are posted.
///
/// A failed delivery is reported as `Error::Delivery`; callers treat it as
/// non-fatal and keep their alert state unchanged.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, destination: i64, message: &str) -> Result<()>;
}

//! Root capability lookup: hub configurations imply their root
//! capabilities; nothing here is ever persisted.

use common::error::StoreError;
use common::zcap::{self, Capability};

use super::{Verifier, VerifyFailure};

impl Verifier {
    /// Materialize the root capability `url` names, consulting the hub
    /// configuration it belongs to.
    pub(crate) async fn materialize_root(&self, url: &str) -> Result<Capability, VerifyFailure> {
        let hub_id = hub_id_from_zcap_url(self.settings().base_url(), url)
            .ok_or(VerifyFailure::CapabilityNotFound)?;
        let record = match self.database().get_config(hub_id).await {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => return Err(VerifyFailure::CapabilityNotFound),
            Err(err) => return Err(VerifyFailure::Backend(err)),
        };
        zcap::root_capability(self.settings().base_url(), url, &record.config)
            .ok_or(VerifyFailure::CapabilityNotFound)
    }
}

/// Extract the hub id from `<base>/data-hubs/<hubId>/zcaps/<suffix>`.
fn hub_id_from_zcap_url<'a>(base_url: &str, url: &'a str) -> Option<&'a str> {
    let rest = url.strip_prefix(base_url)?.strip_prefix("/data-hubs/")?;
    let (hub_id, _) = rest.split_once("/zcaps/")?;
    Some(hub_id)
}

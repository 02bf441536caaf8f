use std::time::Duration;

use crate::error::BalancerError;

/// Identity and scope for one balancer instance.
///
/// Construction is fallible: an empty `owner_id` or any empty element of the scoping tuple is a
/// precondition error, fatal at construction time (spec §7).
#[derive(Debug, Clone)]
pub struct BalancerConfig {
    /// Identifies this process uniquely in the fleet; must persist for the lifetime of this
    /// balancer instance.
    pub owner_id: String,
    pub namespace: String,
    pub hub: String,
    pub consumer_group: String,
    /// Records older than this are considered orphans.
    pub expiration_window: Duration,
}

impl BalancerConfig {
    pub fn new(
        owner_id: impl Into<String>,
        namespace: impl Into<String>,
        hub: impl Into<String>,
        consumer_group: impl Into<String>,
        expiration_window: Duration,
    ) -> Result<Self, BalancerError> {
        let owner_id = owner_id.into();
        let namespace = namespace.into();
        let hub = hub.into();
        let consumer_group = consumer_group.into();

        if owner_id.is_empty() {
            return Err(BalancerError::Precondition("owner_id is empty".to_owned()));
        }
        if namespace.is_empty() || hub.is_empty() || consumer_group.is_empty() {
            return Err(BalancerError::Precondition(
                "namespace, hub, and consumer_group must all be non-empty".to_owned(),
            ));
        }

        Ok(Self {
            owner_id,
            namespace,
            hub,
            consumer_group,
            expiration_window,
        })
    }
}

use {
    prometheus::Encoder,
    std::{collections::HashMap, sync::OnceLock},
};

/// Process wide storage for every metrics struct.
static REGISTRY: OnceLock<prometheus_metric_storage::StorageRegistry> = OnceLock::new();

/// Configures the process wide registry with a metric name prefix and labels
/// shared by all metrics.
///
/// Only the first call has an effect. Once [`get_storage_registry`] handed
/// out the default registry the configuration is ignored as well.
pub fn setup_registry_reentrant(prefix: Option<String>, labels: Option<HashMap<String, String>>) {
    let Ok(registry) = prometheus::Registry::new_custom(prefix, labels) else {
        tracing::warn!("invalid metrics registry configuration, using defaults");
        return;
    };
    REGISTRY
        .set(prometheus_metric_storage::StorageRegistry::new(registry))
        .ok();
}

/// The process wide registry. Falls back to an unprefixed registry so tests
/// never need to set one up.
pub fn get_storage_registry() -> &'static prometheus_metric_storage::StorageRegistry {
    REGISTRY.get_or_init(prometheus_metric_storage::StorageRegistry::default)
}

/// Everything gathered so far in the prometheus text format.
pub fn encode() -> String {
    let mut buffer = Vec::new();
    let families = get_storage_registry().registry().gather();
    if let Err(err) = prometheus::TextEncoder::new().encode(&families, &mut buffer) {
        tracing::warn!(?err, "failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

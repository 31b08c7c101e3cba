use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::taxonomy::Taxonomy;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish static taxonomy gauges.
    ///
    /// Installing a recorder is process-global, so only the binary calls this.
    pub fn init(taxonomy: &Taxonomy) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        describe_counter!("extractions_total", "Text extractions by record kind");
        describe_counter!(
            "fields_defaulted_total",
            "Required fields the validator had to default, by field"
        );
        describe_counter!(
            "chat_canned_replies_total",
            "Chat messages answered without the generative service"
        );

        gauge!("taxonomy_categories").set(taxonomy.categories.classes.len() as f64);
        gauge!("taxonomy_resource_types").set(taxonomy.resource_types.classes.len() as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

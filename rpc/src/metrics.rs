//! Prometheus metrics for the registry API.
//!
//! [`RegistryMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

pub struct RegistryMetrics {
    pub registry: Registry,

    // ── Authentication ──────────────────────────────────────────────────
    pub challenges_issued: IntCounter,
    /// Login attempts by outcome (`success`, or the failure code).
    pub authentications: IntCounterVec,

    // ── Proofs ──────────────────────────────────────────────────────────
    pub proofs_generated: IntCounter,
    /// Proof verifications by outcome (`valid`, or the failure code).
    pub verifications: IntCounterVec,
    /// Shareable-proof verdicts by status.
    pub envelope_verdicts: IntCounterVec,

    // ── Ledger ──────────────────────────────────────────────────────────
    /// Ledger calls abandoned after the configured timeout.
    pub ledger_timeouts: IntGauge,
    pub parcel_count: IntGauge,
}

impl RegistryMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let challenges_issued = register_int_counter_with_registry!(
            Opts::new(
                "cadastre_challenges_issued_total",
                "Login challenges issued"
            ),
            registry
        )?;
        let authentications = register_int_counter_vec_with_registry!(
            Opts::new(
                "cadastre_authentications_total",
                "Login attempts by outcome"
            ),
            &["outcome"],
            registry
        )?;

        let proofs_generated = register_int_counter_with_registry!(
            Opts::new(
                "cadastre_proofs_generated_total",
                "Ownership proofs generated, shareable or not"
            ),
            registry
        )?;
        let verifications = register_int_counter_vec_with_registry!(
            Opts::new(
                "cadastre_proof_verifications_total",
                "Ownership proof verifications by outcome"
            ),
            &["outcome"],
            registry
        )?;
        let envelope_verdicts = register_int_counter_vec_with_registry!(
            Opts::new(
                "cadastre_envelope_verdicts_total",
                "Shareable proof verdicts by status"
            ),
            &["status"],
            registry
        )?;

        let ledger_timeouts = register_int_gauge_with_registry!(
            Opts::new(
                "cadastre_ledger_timeouts",
                "Ledger calls that exceeded the timeout since start"
            ),
            registry
        )?;
        let parcel_count = register_int_gauge_with_registry!(
            Opts::new("cadastre_parcel_count", "Registered parcels"),
            registry
        )?;

        Ok(Self {
            registry,
            challenges_issued,
            authentications,
            proofs_generated,
            verifications,
            envelope_verdicts,
            ledger_timeouts,
            parcel_count,
        })
    }

    pub fn record_verification(&self, code: Option<&str>) {
        self.verifications
            .with_label_values(&[code.unwrap_or("valid")])
            .inc();
    }

    /// Encode every registered metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

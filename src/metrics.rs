//! Store metrics.
//!
//! Thin wrappers over the `metrics` facade so call sites never spell metric
//! names by hand. Without an installed recorder these are no-ops.

pub struct CatalogMetrics;

impl CatalogMetrics {
    /// Record a playback view
    pub fn record_view() {
        ::metrics::counter!("catalog_views_total").increment(1);
    }

    /// Record an authentication attempt; `outcome` is `success` or `failure`
    pub fn record_login(outcome: &'static str) {
        ::metrics::counter!("catalog_logins_total", "outcome" => outcome).increment(1);
    }

    pub fn record_registration() {
        ::metrics::counter!("catalog_registrations_total").increment(1);
    }

    pub fn record_message_sent() {
        ::metrics::counter!("catalog_messages_sent_total").increment(1);
    }

    /// Record a catalog write; `op` is `add`, `update` or `remove`
    pub fn record_item_write(op: &'static str) {
        ::metrics::counter!("catalog_items_written_total", "op" => op).increment(1);
    }

    pub fn record_ledger_size(entries: usize) {
        ::metrics::gauge!("catalog_ledger_entries").set(entries as f64);
    }
}

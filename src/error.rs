// src/error.rs
//
// Run-boundary failures. Source-level errors never reach this type: an
// unreachable source is contained in the run report, while store and delivery
// errors abort the run so the store's last consistent state is preserved.

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Any record-store operation error. Fatal to the current run; no
    /// partial-write recovery is attempted.
    #[error("record store failure: {0}")]
    Store(#[from] sqlx::Error),

    /// The delivery channel reported failure. No state transition happened;
    /// the batch stays pending and is retried by the next run's window query.
    #[error("notification delivery failed: {0}")]
    Delivery(anyhow::Error),
}

//! Telemetry Collector
//!
//! Runs the configured field queries in order against one session. The bus
//! is half-duplex and the addressing commands mutate session state consumed
//! by the very next request, so queries are strictly serialized through the
//! `&mut` session borrow.

use crate::fields::FieldQuery;
use crate::snapshot::TelemetrySnapshot;
use obd_link::{execute, LinkError, VehicleBus, DEFAULT_MAX_ATTEMPTS};
use tracing::{info, warn};

/// Read one field: select the module's CAN header and receive address, then
/// issue the value request.
///
/// If either addressing command exhausts its retries the value command is
/// never attempted against the misconfigured bus, and the failure surfaces
/// as [`LinkError::Addressing`].
pub async fn query_addressed<B>(bus: &mut B, query: &FieldQuery) -> Result<f64, LinkError>
where
    B: VehicleBus + ?Sized,
{
    for addressing in [query.header, query.receive_address] {
        execute(bus, addressing, DEFAULT_MAX_ATTEMPTS)
            .await
            .map_err(|err| match err {
                LinkError::NoValidResponse { command, attempts } => {
                    LinkError::Addressing { command, attempts }
                }
                other => other,
            })?;
    }

    let decoded = execute(bus, query.value, DEFAULT_MAX_ATTEMPTS).await?;
    decoded.reading().ok_or_else(|| {
        LinkError::Unexpected(format!(
            "value command {} decoded to a non-numeric payload",
            query.value
        ))
    })
}

/// Collect every configured field into a snapshot.
///
/// A failing field is logged and omitted; it never aborts the run. The
/// returned snapshot may be partial or empty, both valid results.
pub async fn collect<B>(bus: &mut B, fields: &[FieldQuery]) -> TelemetrySnapshot
where
    B: VehicleBus + ?Sized,
{
    let mut snapshot = TelemetrySnapshot::default();

    for query in fields {
        match query_addressed(bus, query).await {
            Ok(value) => {
                info!(field = query.field, value, "field collected");
                snapshot.insert(query.field, value);
            }
            Err(err) => {
                warn!(field = query.field, "error querying field: {err}");
            }
        }
    }

    info!(
        "collected {} of {} configured fields",
        snapshot.len(),
        fields.len()
    );
    snapshot
}

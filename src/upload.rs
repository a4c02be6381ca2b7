//! Sequential batch upload and its aggregate outcome.

use tracing::{Instrument, error, info, info_span, warn};

use crate::delivery::{Delivery, DeliveryClient, Method};
use crate::error::Result;

/// Aggregate result of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOutcome {
    pub total: usize,
    pub succeeded: usize,
    /// 1-based positions of the records that failed, in file order.
    pub failed: Vec<usize>,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, position: usize, delivery: &Delivery) {
        self.total += 1;
        if delivery.is_success() {
            self.succeeded += 1;
        } else {
            self.failed.push(position);
        }
    }
}

/// POSTs every record to `path`, one at a time, in order.
///
/// A failed record is logged and counted; the loop keeps going. Only a
/// structural error (such as an invalid URI) stops the run and is returned.
#[tracing::instrument(skip(client, records), fields(count = records.len()))]
pub async fn upload_records(
    client: &DeliveryClient,
    records: &[String],
    path: &str,
) -> Result<UploadOutcome> {
    info!("Uploading entries");
    let mut outcome = UploadOutcome::default();

    for (index, record) in records.iter().enumerate() {
        let position = index + 1;
        let delivery = client
            .send(Method::Post, record, path)
            .instrument(info_span!("record", position))
            .await?;

        match &delivery {
            Delivery::Success { status, body } if !delivery.is_success() => {
                error!(position, status, record = %record, body = %body, "Failed to send");
            }
            Delivery::Success { .. } => {}
            Delivery::ConnectionError { message } => {
                error!(position, record = %record, error = %message, "Failed to send");
            }
            Delivery::TooLarge { content_length, .. } => {
                error!(position, content_length, "Received {content_length} bytes.");
            }
            Delivery::HttpError { status, body } => {
                error!(position, status, body = %body, "Got an error response code of {status}");
            }
        }

        outcome.record(position, &delivery);
    }

    if outcome.is_success() {
        info!(total = outcome.total, "All messages sent successfully");
    } else {
        warn!(
            total = outcome.total,
            failed = outcome.failed.len(),
            "Some data failed to upload"
        );
    }

    Ok(outcome)
}

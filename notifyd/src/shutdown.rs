use crate::push::PushReceiver;

/// Close the clear queue and wait for queued clears to finish their writes.
pub async fn graceful_shutdown(receiver: &PushReceiver) {
    tracing::info!("Shutdown sequence started");

    receiver.aggregator().close().await;
    tracing::info!("Shutdown: clear queue closed");

    tracing::info!("Shutdown sequence completed");
}

use crate::config::Config;
use crate::decode;
use crate::store::{RowSink, SensorStore};
use crate::topic;
use anyhow::Result;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use tokio::time::{sleep, Duration};

/// Device column value when the topic carries no device segment.
const DEFAULT_DEVICE: &str = "device";

/// Subscription loop. The transport owns reconnect behavior: a dropped
/// connection breaks the poll loop, and the outer loop rebuilds the client and
/// resubscribes. Messages are processed one at a time to completion; nothing a
/// single message does can take the subscription down.
pub async fn run_ingestor(config: &Config, store: &mut SensorStore) -> Result<()> {
    let filter = config.topic_filter();
    loop {
        let mut options = MqttOptions::new(
            config.mqtt_client_id.clone(),
            config.mqtt_host.clone(),
            config.mqtt_port,
        );
        options.set_keep_alive(config.mqtt_keepalive());

        let (client, mut eventloop) = AsyncClient::new(options, 32);

        match client.subscribe(filter.clone(), QoS::AtLeastOnce).await {
            Ok(_) => {
                tracing::info!(topic=%filter, "subscribed to sparkplug feed");
            }
            Err(err) => {
                tracing::warn!(error=%err, "failed to subscribe; retrying");
                sleep(Duration::from_secs(2)).await;
                continue;
            }
        }

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(publish))) => {
                    handle_publish(&publish.topic, &publish.payload, config.enable_spb, store)
                        .await;
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error=%err, "MQTT connection dropped; reconnecting");
                    break;
                }
            }
        }

        sleep(Duration::from_secs(1)).await;
    }
}

/// One message, start to finish: classify, gate, decode, write. Decode is
/// total; a write failure is logged with the originating topic and the message
/// is dropped, so delivery is at-least-once but processing is at-most-once.
pub(crate) async fn handle_publish<S: RowSink>(
    topic: &str,
    payload: &[u8],
    sparkplug_enabled: bool,
    sink: &mut S,
) {
    let key = topic::classify(topic);
    if !key.kind.bears_data() {
        return;
    }

    let metrics = decode::decode(payload, sparkplug_enabled);
    if metrics.is_empty() {
        tracing::debug!(topic, "no metrics decoded");
        return;
    }

    let device = if key.device.is_empty() {
        DEFAULT_DEVICE
    } else {
        key.device.as_str()
    };

    if let Err(err) = sink.write_row(device, &metrics).await {
        tracing::warn!(error=%err, topic, "failed to persist decoded metrics");
    }
}

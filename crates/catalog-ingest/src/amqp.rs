//! [`Broker`] over AMQP 0-9-1, backed by `lapin`.

use futures::StreamExt as _;
use lapin::{
  BasicProperties, Connection, ConnectionProperties,
  options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions,
    QueueDeclareOptions,
  },
  types::{AMQPValue, FieldTable, LongString, ShortString},
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
  BrokerError,
  broker::{Broker, Channel, Delivery, Publication},
};

/// Deliveries handed out before an acknowledgement is required.
const PREFETCH: u16 = 1;

// ─── Broker ──────────────────────────────────────────────────────────────────

/// A lazily connected AMQP broker.
///
/// The connection is shared by every channel and re-established when a
/// channel is requested after it dropped.
pub struct AmqpBroker {
  uri:        String,
  connection: Mutex<Option<Connection>>,
}

impl AmqpBroker {
  pub fn new(uri: impl Into<String>) -> Self {
    Self { uri: uri.into(), connection: Mutex::new(None) }
  }

  /// Close the connection if one is open.
  pub async fn close(&self) -> Result<(), BrokerError> {
    if let Some(connection) = self.connection.lock().await.take() {
      connection
        .close(200, "shutdown")
        .await
        .map_err(|e| BrokerError::Connection(Box::new(e)))?;
      info!("broker connection closed");
    }
    Ok(())
  }
}

impl Broker for AmqpBroker {
  type Channel = AmqpChannel;

  async fn open_channel(&self) -> Result<AmqpChannel, BrokerError> {
    let mut slot = self.connection.lock().await;

    let connection = match slot.take() {
      Some(connection) if connection.status().connected() => connection,
      _ => {
        let connection =
          Connection::connect(&self.uri, ConnectionProperties::default())
            .await
            .map_err(|e| BrokerError::Connection(Box::new(e)))?;
        info!("connected to broker");
        connection
      }
    };
    let channel = connection.create_channel().await;
    *slot = Some(connection);

    let channel = channel.map_err(|e| BrokerError::Channel(Box::new(e)))?;
    channel
      .basic_qos(PREFETCH, BasicQosOptions::default())
      .await
      .map_err(|e| BrokerError::Channel(Box::new(e)))?;

    Ok(AmqpChannel { channel, consumer: None })
  }
}

// ─── Channel ─────────────────────────────────────────────────────────────────

pub struct AmqpChannel {
  channel:  lapin::Channel,
  /// The consumed queue's name and its delivery stream, once consuming.
  consumer: Option<(String, lapin::Consumer)>,
}

impl Channel for AmqpChannel {
  type Delivery = AmqpDelivery;

  async fn declare_queue(&mut self, queue: &str) -> Result<(), BrokerError> {
    let options = QueueDeclareOptions {
      durable: true,
      ..QueueDeclareOptions::default()
    };
    self
      .channel
      .queue_declare(queue, options, FieldTable::default())
      .await
      .map_err(|e| BrokerError::Declare {
        queue:  queue.to_owned(),
        source: Box::new(e),
      })?;
    debug!(queue, "queue declared");
    Ok(())
  }

  async fn consume(
    &mut self,
    queue: &str,
    consumer_tag: &str,
  ) -> Result<(), BrokerError> {
    let consumer = self
      .channel
      .basic_consume(
        queue,
        consumer_tag,
        BasicConsumeOptions::default(),
        FieldTable::default(),
      )
      .await
      .map_err(|e| BrokerError::Consume {
        queue:  queue.to_owned(),
        source: Box::new(e),
      })?;
    self.consumer = Some((queue.to_owned(), consumer));
    Ok(())
  }

  async fn next_delivery(
    &mut self,
  ) -> Option<Result<AmqpDelivery, BrokerError>> {
    let (queue, consumer) = self.consumer.as_mut()?;
    let next = consumer.next().await?;
    Some(next.map(AmqpDelivery).map_err(|e| BrokerError::Consume {
      queue:  queue.clone(),
      source: Box::new(e),
    }))
  }

  async fn publish(
    &mut self,
    publication: Publication<'_>,
  ) -> Result<(), BrokerError> {
    let mut headers = FieldTable::default();
    for (name, value) in publication.headers {
      headers.insert(
        ShortString::from(name),
        AMQPValue::LongString(LongString::from(value)),
      );
    }
    let properties = BasicProperties::default()
      .with_content_type(ShortString::from(publication.content_type))
      .with_headers(headers);

    let queue = publication.queue;
    let publish_error = |e: lapin::Error| BrokerError::Publish {
      queue:  queue.to_owned(),
      source: Box::new(e),
    };
    self
      .channel
      .basic_publish(
        "",
        queue,
        BasicPublishOptions::default(),
        publication.body,
        properties,
      )
      .await
      .map_err(publish_error)?
      .await
      .map_err(publish_error)?;
    Ok(())
  }
}

// ─── Delivery ────────────────────────────────────────────────────────────────

pub struct AmqpDelivery(lapin::message::Delivery);

impl Delivery for AmqpDelivery {
  fn body(&self) -> &[u8] { &self.0.data }

  async fn ack(self) -> Result<(), BrokerError> {
    self
      .0
      .acker
      .ack(BasicAckOptions::default())
      .await
      .map_err(|e| BrokerError::Ack(Box::new(e)))
  }
}

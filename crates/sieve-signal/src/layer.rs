//! Redirects `tracing` events into the event queue.
//!
//! The broker's logger and the model driver keep using ordinary `tracing`
//! macros. Events under the configured target prefixes are turned into
//! queued records instead of reaching the default sink.

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::queue::EventSender;
use crate::record::{Level, Source};

/// A `tracing_subscriber` layer feeding the event queue.
#[derive(Debug, Clone)]
pub struct QueueLayer {
    sender: EventSender,
    broker_target: String,
    model_target: String,
}

impl QueueLayer {
    /// Route events whose target starts with `broker_target` as broker records
    /// and those under `model_target` as driver records.
    pub fn new(
        sender: EventSender,
        broker_target: impl Into<String>,
        model_target: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            broker_target: broker_target.into(),
            model_target: model_target.into(),
        }
    }

    /// Which source a target belongs to, if any.
    pub fn source_for(&self, target: &str) -> Option<Source> {
        if !self.broker_target.is_empty() && target.starts_with(self.broker_target.as_str()) {
            Some(Source::Broker)
        } else if !self.model_target.is_empty() && target.starts_with(self.model_target.as_str())
        {
            Some(Source::Driver)
        } else {
            None
        }
    }

    /// Whether events with this metadata are captured by the queue.
    pub fn captures(&self, metadata: &Metadata<'_>) -> bool {
        self.source_for(metadata.target()).is_some()
    }
}

impl<S: Subscriber> Layer<S> for QueueLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let Some(source) = self.source_for(metadata.target()) else {
            return;
        };
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.sender
            .emit(Level::from(metadata.level()), source, visitor.finish());
    }
}

/// Collects the `message` field followed by any other fields as `key=value`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", name, value);
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), format_args!("{}", value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }
}

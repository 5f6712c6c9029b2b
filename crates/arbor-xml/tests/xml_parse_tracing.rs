//! The `xml.parse` span records token and error counts.

#![cfg(feature = "tracing")]

use std::sync::{Arc, Mutex};

use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Debug, Default)]
struct ParseTraceState {
    spans: usize,
    input_len: Option<u64>,
    tokens: Option<u64>,
    errors: Option<u64>,
}

struct ParseTraceCapture {
    state: Arc<Mutex<ParseTraceState>>,
}

struct CountVisitor<'a>(&'a mut ParseTraceState);

impl Visit for CountVisitor<'_> {
    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "input_len" => self.0.input_len = Some(value),
            "tokens" => self.0.tokens = Some(value),
            "errors" => self.0.errors = Some(value),
            _ => {}
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
}

impl<S> Layer<S> for ParseTraceCapture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::Id,
        _ctx: Context<'_, S>,
    ) {
        if attrs.metadata().name() == "xml.parse" {
            let mut state = self.state.lock().expect("trace state lock");
            state.spans += 1;
            attrs.record(&mut CountVisitor(&mut state));
        }
    }

    fn on_record(
        &self,
        _id: &tracing::Id,
        values: &tracing::span::Record<'_>,
        _ctx: Context<'_, S>,
    ) {
        let mut state = self.state.lock().expect("trace state lock");
        values.record(&mut CountVisitor(&mut state));
    }
}

#[test]
fn parse_span_records_counts() {
    let trace_state = Arc::new(Mutex::new(ParseTraceState::default()));
    let subscriber = tracing_subscriber::registry().with(ParseTraceCapture {
        state: Arc::clone(&trace_state),
    });
    let _guard = tracing::subscriber::set_default(subscriber);
    tracing::callsite::rebuild_interest_cache();

    let input = "<a><b></a>";
    let parse = arbor_xml::parse(input);
    assert_eq!(parse.errors.len(), 1);

    let state = trace_state.lock().expect("trace state lock");
    assert_eq!(state.spans, 1);
    assert_eq!(state.input_len, Some(input.len() as u64));
    assert_eq!(state.tokens, Some(arbor_xml::tokenize(input).len() as u64));
    assert_eq!(state.errors, Some(1));
}

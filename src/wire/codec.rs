//! Encoding and decoding of the engine's text protocol.
//!
//! # Requests
//!
//! ```text
//! P|<len>|<query>\n        plan
//! Q|<len>|<query>\n        query
//! <identity> <secs> <val>\n metric submission
//! ```
//!
//! `<len>` is the UTF-8 byte length of `<query>`. The query text itself is never
//! inspected, so it may contain any of the protocol's delimiters.
//!
//! # Replies
//!
//! Replies are not length-framed; the engine closes the stream when done.
//!
//! ```text
//! E<message>
//! R|<field>|<field>...
//! R|<key>=<ts>:<val>,<ts>:<val>|<key>=...
//! ```

use crate::core::{BoloError, Measurement, Result, Sample, Series, SeriesMap};

/// Separator between reply segments
const SEGMENT_SEP: u8 = b'|';
/// Separator between a metric key and its tuples
const KEY_SEP: u8 = b'=';
/// Separator between tuples of a series
const TUPLE_SEP: u8 = b',';
/// Separator between a tuple's timestamp and value
const VALUE_SEP: u8 = b':';

/// Request kind, written as the first byte of a request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Ask which fields a query would select
    Plan,
    /// Execute a query
    Query,
}

impl Verb {
    pub fn as_char(self) -> char {
        match self {
            Verb::Plan => 'P',
            Verb::Query => 'Q',
        }
    }
}

/// Encode one request line.
pub fn encode_request(verb: Verb, query: &str) -> Vec<u8> {
    format!("{}|{}|{}\n", verb.as_char(), query.len(), query).into_bytes()
}

/// Encode one metric submission line.
pub fn encode_sample_line(identity: &str, sample: &Sample) -> String {
    format!("{} {} {:.6}\n", identity, sample.unix_seconds(), sample.value)
}

/// Check the reply's type byte and return everything after it.
///
/// `E` replies become [`BoloError::Remote`]. Empty replies and unknown type
/// bytes become [`BoloError::Protocol`].
fn result_body(reply: &[u8]) -> Result<&[u8]> {
    match reply.split_first() {
        Some((b'R', body)) => Ok(body),
        Some((b'E', message)) => Err(BoloError::remote(String::from_utf8_lossy(message))),
        _ => Err(BoloError::protocol("unrecognized reply")),
    }
}

fn utf8<'a>(bytes: &'a [u8], what: &str) -> Result<&'a str> {
    std::str::from_utf8(bytes)
        .map_err(|e| BoloError::decode(format!("{} is not valid UTF-8: {}", what, e)))
}

/// Decode a reply to a plan request into the selected field names.
///
/// The byte after `R` is the leading separator and is skipped. A reply with
/// nothing after it selects no fields.
pub fn decode_plan_reply(reply: &[u8]) -> Result<Vec<String>> {
    let body = result_body(reply)?;
    let fields = body.get(1..).unwrap_or_default();
    if fields.is_empty() {
        return Ok(Vec::new());
    }

    fields
        .split(|b| *b == SEGMENT_SEP)
        .map(|field| utf8(field, "field name").map(str::to_string))
        .collect()
}

/// Decode a reply to a query request.
///
/// The first `|`-separated segment after `R` is always discarded; well-formed
/// replies start with a separator, so that segment is empty. Any malformed
/// segment or tuple fails the whole reply. A key that appears twice keeps its
/// last series.
pub fn decode_query_reply(reply: &[u8]) -> Result<SeriesMap> {
    let body = result_body(reply)?;

    let mut out = SeriesMap::new();
    for segment in body.split(|b| *b == SEGMENT_SEP).skip(1) {
        let (key, series) = decode_segment(segment)?;
        out.insert(key, series);
    }

    Ok(out)
}

fn decode_segment(segment: &[u8]) -> Result<(String, Series)> {
    let mut parts = segment.split(|b| *b == KEY_SEP);
    let (key, tuples) = match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(tuples), None) => (key, tuples),
        _ => {
            return Err(BoloError::decode(format!(
                "no metric name found in {{{}}}",
                String::from_utf8_lossy(segment)
            )))
        },
    };

    let key = utf8(key, "metric key")?.to_string();
    let series = tuples
        .split(|b| *b == TUPLE_SEP)
        .filter(|tuple| !tuple.is_empty())
        .map(decode_tuple)
        .collect::<Result<Series>>()?;

    Ok((key, series))
}

fn decode_tuple(tuple: &[u8]) -> Result<Measurement> {
    let malformed = || {
        BoloError::decode(format!(
            "malformed ts:v tuple found: [{}]",
            String::from_utf8_lossy(tuple)
        ))
    };

    let mut parts = tuple.split(|b| *b == VALUE_SEP);
    let (ts, value) = match (parts.next(), parts.next(), parts.next()) {
        (Some(ts), Some(value), None) => (ts, value),
        _ => return Err(malformed()),
    };

    let ts = utf8(ts, "timestamp")?;
    // Digits only; `u64::from_str` would also take a leading `+`.
    if !ts.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BoloError::decode(format!("bad timestamp '{}': not an unsigned integer", ts)));
    }
    let ts: u64 = ts
        .parse()
        .map_err(|e| BoloError::decode(format!("bad timestamp '{}': {}", ts, e)))?;

    let value = utf8(value, "value")?;
    let value: f64 = value
        .parse()
        .map_err(|e| BoloError::decode(format!("bad value '{}': {}", value, e)))?;

    Ok(Measurement::from_raw(ts, value))
}

//! Wire protocol spoken with the bolo engine.

pub mod codec;

pub use codec::{
    decode_plan_reply, decode_query_reply, encode_request, encode_sample_line, Verb,
};

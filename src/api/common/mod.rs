mod passthrough;

pub(crate) use passthrough::{forward, relay_response};

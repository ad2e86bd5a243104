//! Session control channel: proctor actions to students, student activity
//! to proctors, over one JSON WebSocket per client.

pub(crate) mod channel;
pub(crate) mod protocol;
pub(crate) mod registry;
pub(crate) mod socket;
pub(crate) mod store;

#[cfg(test)]
mod tests;

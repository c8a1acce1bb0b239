//! Transport abstraction.

use std::future::Future;

use contracts::{ClientError, WireEnvelope};

/// A live connection carrying event envelopes in both directions.
///
/// `recv` returns `None` once the connection is gone (peer close or
/// transport failure) and `Some(Err(_))` for a malformed inbound message
/// on an otherwise healthy connection. Callers may keep reading after a
/// malformed message.
pub trait Connection: Send {
    fn send(
        &mut self,
        envelope: &WireEnvelope,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn recv(&mut self) -> impl Future<Output = Option<Result<WireEnvelope, ClientError>>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// Connection factory.
///
/// `connect` performs one full handshake attempt. Retry scheduling is the
/// supervisor's job, never the transport's.
pub trait Transport: Send + Sync + 'static {
    type Conn: Connection + 'static;

    fn connect(&self) -> impl Future<Output = Result<Self::Conn, ClientError>> + Send;
}

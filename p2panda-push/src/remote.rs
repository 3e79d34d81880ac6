// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push handler for devices which delegate push decryption to a remote protocol service.
use std::time::Duration;

use tracing::debug;

use crate::config::{Config, DEFAULT_RPC_TIMEOUT};
use crate::crypto::Rng;
use crate::crypto::x25519::{PublicKey, SecretKey};
use crate::error::PushError;
use crate::handler::PushHandler;
use crate::traits::ProtocolService;
use crate::wire::{PushReceiveReply, PushReceiveRequest, PushServer, PushSetServerRequest};

/// Forwards push payloads to a remote protocol service and returns its replies as they are.
///
/// Holds no key material. Every call is cancelled after the configured timeout and is not
/// retried.
#[derive(Clone, Debug)]
pub struct RemotePushHandler<C> {
    client: C,
    timeout: Duration,
}

impl<C> RemotePushHandler<C>
where
    C: ProtocolService,
{
    pub fn new(client: C) -> Self {
        Self {
            client,
            timeout: DEFAULT_RPC_TIMEOUT,
        }
    }

    pub fn from_config(client: C, config: &Config) -> Self {
        Self {
            client,
            timeout: config.rpc_timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

async fn with_deadline<T, E>(
    deadline: Duration,
    call: impl Future<Output = Result<T, E>>,
) -> Result<T, PushError>
where
    E: std::error::Error,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(PushError::Transport(err.to_string())),
        Err(_) => {
            debug!(?deadline, "remote protocol service did not respond in time");
            Err(PushError::Timeout(deadline))
        }
    }
}

impl<C> PushHandler for RemotePushHandler<C>
where
    C: ProtocolService,
{
    fn receive_push(
        &self,
        payload: &[u8],
    ) -> impl Future<Output = Result<PushReceiveReply, PushError>> + Send {
        let call = self.client.push_receive(PushReceiveRequest {
            payload: payload.to_vec(),
        });
        with_deadline(self.timeout, call)
    }

    fn update_push_server(
        &self,
        server: &PushServer,
    ) -> impl Future<Output = Result<(), PushError>> + Send {
        let call = self.client.push_set_server(PushSetServerRequest {
            server: server.clone(),
        });
        with_deadline(self.timeout, call)
    }

    fn push_public_key(&self) -> Result<PublicKey, PushError> {
        Err(PushError::Unsupported("reading the push public key"))
    }

    fn set_push_secret_key(&self, _secret_key: SecretKey) -> Result<(), PushError> {
        Err(PushError::Unsupported("setting the push secret key"))
    }

    fn rotate_push_key(&self, _rng: &Rng) -> Result<PublicKey, PushError> {
        Err(PushError::Unsupported("rotating the push key"))
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for push handlers.
//!
//! `Config` can be passed into `PushHandlerBuilder::from_config` or
//! `RemotePushHandler::from_config` instead of setting every option on its own.
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Deadline of calls to a remote protocol service.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(5);

/// Key in the account cache under which the trusted push server record is kept.
pub const DEFAULT_PUSH_SERVER_CACHE_KEY: &str = "/account_cache/push_server_pk";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Time after which a call to the remote protocol service is cancelled.
    pub rpc_timeout: Duration,

    /// Account cache key of the trusted push server record.
    pub push_server_cache_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            push_server_cache_key: DEFAULT_PUSH_SERVER_CACHE_KEY.to_owned(),
        }
    }
}

//! config.rs - DiceMix client configuration

//
// Copyright (c) 2019 Stegos AG
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use crate::error::DiceMixError;
use serde_derive::{Deserialize, Serialize};
use std::time::Duration;

/// Client configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// WebSocket endpoint of the relay
    pub relay_url: String,
    /// How long to wait for each relay response (secs)
    pub response_timeout: u64,
    /// Hard cap on the number of slots in one run
    pub max_messages: usize,
    /// Number of messages to contribute
    pub num_msgs: u32,
}

/// Default values for client configuration.
impl Default for ClientConfig {
    fn default() -> ClientConfig {
        ClientConfig {
            relay_url: "ws://localhost:8082/ws".to_string(),
            response_timeout: 30,
            max_messages: 1000,
            num_msgs: 1,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), DiceMixError> {
        if self.response_timeout == 0 {
            return Err(DiceMixError::InvalidConfig(
                "response_timeout must be positive".to_string(),
            ));
        }
        if self.num_msgs == 0 || self.num_msgs as usize > self.max_messages {
            return Err(DiceMixError::InvalidConfig(format!(
                "num_msgs must be in 1..={}, got {}",
                self.max_messages, self.num_msgs
            )));
        }
        Ok(())
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout)
    }
}

//! transport.rs - Relay connection

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
use log::*;
use std::io;
use std::net::TcpStream;
use std::time::{Duration, Instant};
use tungstenite::protocol::Message;
use tungstenite::{Error as WsError, WebSocket};

/// Framed, ordered channel to the relay.
pub trait Transport {
    fn send(&mut self, data: Vec<u8>) -> Result<(), DiceMixError>;
    /// Blocks until the next frame or the response timeout, whichever
    /// comes first. Control frames do not extend the wait.
    fn recv(&mut self) -> Result<Vec<u8>, DiceMixError>;
    fn close(&mut self);
}

/// Blocking WebSocket client, binary frames only.
pub struct WebSocketTransport {
    endpoint: String,
    socket: WebSocket<TcpStream>,
    timeout: Duration,
}

impl WebSocketTransport {
    pub fn connect(endpoint: &str, timeout: Duration) -> Result<Self, DiceMixError> {
        info!("Connecting to {}", endpoint);
        let (socket, _response) =
            tungstenite::connect(endpoint).map_err(|e| DiceMixError::Transport(e.to_string()))?;
        info!("Connected to {}", endpoint);
        Ok(WebSocketTransport {
            endpoint: endpoint.to_string(),
            socket,
            timeout,
        })
    }

    /// Limits the next socket read to what is left until `deadline`.
    fn arm(&mut self, deadline: Instant) -> Result<(), DiceMixError> {
        let now = Instant::now();
        if now >= deadline {
            return Err(DiceMixError::Timeout);
        }
        self.socket
            .get_ref()
            .set_read_timeout(Some(deadline - now))
            .map_err(|e| DiceMixError::Transport(e.to_string()))
    }
}

fn map_ws_error(e: WsError) -> DiceMixError {
    match e {
        WsError::Io(ref e)
            if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut =>
        {
            DiceMixError::Timeout
        }
        WsError::ConnectionClosed | WsError::AlreadyClosed => {
            DiceMixError::ConnectionClosed("closed by relay".to_string())
        }
        e => DiceMixError::Transport(e.to_string()),
    }
}

impl Transport for WebSocketTransport {
    fn send(&mut self, data: Vec<u8>) -> Result<(), DiceMixError> {
        trace!("[{}] <= {} bytes", self.endpoint, data.len());
        self.socket
            .write_message(Message::Binary(data))
            .map_err(map_ws_error)
    }

    fn recv(&mut self) -> Result<Vec<u8>, DiceMixError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            self.arm(deadline)?;
            match self.socket.read_message().map_err(map_ws_error)? {
                Message::Binary(data) => {
                    trace!("[{}] => {} bytes", self.endpoint, data.len());
                    return Ok(data);
                }
                Message::Close(frame) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "closed by relay".to_string());
                    return Err(DiceMixError::ConnectionClosed(reason));
                }
                Message::Text(text) => {
                    return Err(DiceMixError::InvalidMessage(format!(
                        "unexpected text frame: {}",
                        text
                    )));
                }
                // pings are answered by tungstenite itself
                Message::Ping(_) | Message::Pong(_) => continue,
            }
        }
    }

    fn close(&mut self) {
        if let Err(e) = self.socket.close(None) {
            debug!("[{}] close: {}", self.endpoint, e);
        }
        // drain until the close handshake completes
        let deadline = Instant::now() + self.timeout;
        while self.arm(deadline).is_ok() && self.socket.read_message().is_ok() {}
    }
}

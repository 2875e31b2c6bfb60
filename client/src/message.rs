//! message.rs - Relay protocol messages

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
use dicemix_crypto::dicemix::{DcMessage, PeerId};
use dicemix_crypto::field::Fe;
use dicemix_crypto::signature::{self, SigningKeyPair};
use dicemix_serialization::traits::ProtoConvert;
use std::time::{SystemTime, UNIX_EPOCH};

/// Relay-assigned run identifier.
pub type SessionId = u64;

/// Relay's view of one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub id: PeerId,
    pub pkey: Vec<u8>,
    pub num_msgs: u32,
    pub dc_simple_vector: Vec<DcMessage>,
    pub ok: bool,
    pub confirmation: bool,
}

impl PeerInfo {
    pub fn new(id: PeerId) -> PeerInfo {
        PeerInfo {
            id,
            pkey: Vec::new(),
            num_msgs: 0,
            dc_simple_vector: Vec::new(),
            ok: false,
            confirmation: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeader {
    pub session_id: SessionId,
    /// Non-empty means the relay aborted the run.
    pub err: String,
    pub message: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Join { id: PeerId },
    StartDiceMix { peers: Vec<PeerInfo> },
    KeyExchange { peers: Vec<PeerInfo> },
    DcExp { roots: Vec<u64> },
    DcSimple {
        peers: Vec<PeerInfo>,
        messages: Vec<DcMessage>,
    },
    TxDone,
    KeskRequest,
}

impl ResponseBody {
    pub fn name(&self) -> &'static str {
        match self {
            ResponseBody::Join { .. } => "Join",
            ResponseBody::StartDiceMix { .. } => "StartDiceMix",
            ResponseBody::KeyExchange { .. } => "KeyExchange",
            ResponseBody::DcExp { .. } => "DcExp",
            ResponseBody::DcSimple { .. } => "DcSimple",
            ResponseBody::TxDone => "TxDone",
            ResponseBody::KeskRequest => "KeskRequest",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub header: ResponseHeader,
    pub body: ResponseBody,
}

impl Response {
    pub fn new(session_id: SessionId, body: ResponseBody) -> Response {
        let header = ResponseHeader {
            session_id,
            timestamp: timestamp(),
            ..Default::default()
        };
        Response { header, body }
    }

    pub fn error(session_id: SessionId, err: &str, body: ResponseBody) -> Response {
        let mut response = Response::new(session_id, body);
        response.header.err = err.to_string();
        response
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub session_id: SessionId,
    pub id: PeerId,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Join,
    Ltpk {
        pkey: Vec<u8>,
    },
    KeyExchange {
        pkey: Vec<u8>,
        num_msgs: u32,
    },
    DcExp {
        dc_exp_vector: Vec<Fe>,
    },
    DcSimple {
        dc_simple_vector: Vec<DcMessage>,
        my_ok: bool,
        next_pkey: Vec<u8>,
    },
    Confirmation {
        confirmation: bool,
    },
    Kesk {
        skey: Vec<u8>,
    },
}

impl RequestBody {
    pub fn name(&self) -> &'static str {
        match self {
            RequestBody::Join => "Join",
            RequestBody::Ltpk { .. } => "Ltpk",
            RequestBody::KeyExchange { .. } => "KeyExchange",
            RequestBody::DcExp { .. } => "DcExp",
            RequestBody::DcSimple { .. } => "DcSimple",
            RequestBody::Confirmation { .. } => "Confirmation",
            RequestBody::Kesk { .. } => "Kesk",
        }
    }

    /// The relay learns our long-term key only from the Ltpk request,
    /// so neither it nor the Join request can carry a signature.
    pub fn is_signed(&self) -> bool {
        match self {
            RequestBody::Join | RequestBody::Ltpk { .. } => false,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub header: RequestHeader,
    pub body: RequestBody,
}

/// Wire envelope for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Serialized `Request`.
    pub request_data: Vec<u8>,
    /// DER ECDSA signature over `request_data`, empty for unsigned requests.
    pub signature: Vec<u8>,
}

impl SignedRequest {
    pub fn new(request: &Request, ltkp: &SigningKeyPair) -> Result<SignedRequest, DiceMixError> {
        let request_data = request.into_buffer()?;
        let signature = if request.body.is_signed() {
            ltkp.sign(&request_data)
        } else {
            Vec::new()
        };
        Ok(SignedRequest {
            request_data,
            signature,
        })
    }

    pub fn request(&self) -> Result<Request, DiceMixError> {
        Ok(Request::from_buffer(&self.request_data)?)
    }

    pub fn verify(&self, pkey: &[u8]) -> bool {
        signature::verify(pkey, &self.request_data, &self.signature)
    }
}

pub(crate) fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

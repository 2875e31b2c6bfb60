//! protos.rs - Protobuf conversion for relay messages

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

use failure::Error;
use protobuf::RepeatedField;

use dicemix_crypto::dicemix::{DcMessage, MESSAGE_SIZE};
use dicemix_crypto::field::Fe;
use dicemix_serialization::traits::*;

include!(concat!(env!("OUT_DIR"), "/protos/mod.rs"));

use crate::message::*;

fn dc_messages_from_proto(field: &str, proto: &[Vec<u8>]) -> Result<Vec<DcMessage>, Error> {
    let mut messages = Vec::with_capacity(proto.len());
    for bytes in proto {
        if bytes.len() != MESSAGE_SIZE {
            return Err(
                ProtoError::InvalidLength(field.to_string(), MESSAGE_SIZE, bytes.len()).into(),
            );
        }
        let mut msg = [0u8; MESSAGE_SIZE];
        msg.copy_from_slice(bytes);
        messages.push(msg);
    }
    Ok(messages)
}

fn dc_messages_into_proto(messages: &[DcMessage]) -> RepeatedField<Vec<u8>> {
    RepeatedField::from_vec(messages.iter().map(|m| m.to_vec()).collect())
}

fn peers_from_proto(proto: &[relay::PeerInfo]) -> Result<Vec<PeerInfo>, Error> {
    proto.iter().map(PeerInfo::from_proto).collect()
}

fn peers_into_proto(peers: &[PeerInfo]) -> RepeatedField<relay::PeerInfo> {
    RepeatedField::from_vec(peers.iter().map(PeerInfo::into_proto).collect())
}

fn missing(field: &str, packet: &str) -> Error {
    ProtoError::MissingField(field.to_string(), packet.to_string()).into()
}

// -----------------------------------------------------------

impl ProtoConvert for PeerInfo {
    type Proto = relay::PeerInfo;
    fn into_proto(&self) -> Self::Proto {
        let mut proto = relay::PeerInfo::new();
        proto.set_id(self.id);
        proto.set_pkey(self.pkey.clone());
        proto.set_num_msgs(self.num_msgs);
        proto.set_dc_simple_vector(dc_messages_into_proto(&self.dc_simple_vector));
        proto.set_ok(self.ok);
        proto.set_confirmation(self.confirmation);
        proto
    }

    fn from_proto(proto: &Self::Proto) -> Result<Self, Error> {
        Ok(PeerInfo {
            id: proto.get_id(),
            pkey: proto.get_pkey().to_vec(),
            num_msgs: proto.get_num_msgs(),
            dc_simple_vector: dc_messages_from_proto(
                "dc_simple_vector",
                proto.get_dc_simple_vector(),
            )?,
            ok: proto.get_ok(),
            confirmation: proto.get_confirmation(),
        })
    }
}

impl ProtoConvert for ResponseHeader {
    type Proto = relay::ResponseHeader;
    fn into_proto(&self) -> Self::Proto {
        let mut proto = relay::ResponseHeader::new();
        proto.set_session_id(self.session_id);
        proto.set_err(self.err.clone());
        proto.set_message(self.message.clone());
        proto.set_timestamp(self.timestamp);
        proto
    }

    fn from_proto(proto: &Self::Proto) -> Result<Self, Error> {
        Ok(ResponseHeader {
            session_id: proto.get_session_id(),
            err: proto.get_err().to_string(),
            message: proto.get_message().to_string(),
            timestamp: proto.get_timestamp(),
        })
    }
}

impl ProtoConvert for Response {
    type Proto = relay::Response;
    fn into_proto(&self) -> Self::Proto {
        let mut proto = relay::Response::new();
        proto.set_header(self.header.into_proto());
        match &self.body {
            ResponseBody::Join { id } => {
                let mut body = relay::JoinResponse::new();
                body.set_id(*id);
                proto.set_join(body);
            }
            ResponseBody::StartDiceMix { peers } => {
                let mut body = relay::PeerList::new();
                body.set_peers(peers_into_proto(peers));
                proto.set_start_dicemix(body);
            }
            ResponseBody::KeyExchange { peers } => {
                let mut body = relay::PeerList::new();
                body.set_peers(peers_into_proto(peers));
                proto.set_key_exchange(body);
            }
            ResponseBody::DcExp { roots } => {
                let mut body = relay::DcExpResponse::new();
                body.set_roots(roots.clone());
                proto.set_dc_exp(body);
            }
            ResponseBody::DcSimple { peers, messages } => {
                let mut body = relay::DcSimpleResponse::new();
                body.set_peers(peers_into_proto(peers));
                body.set_messages(dc_messages_into_proto(messages));
                proto.set_dc_simple(body);
            }
            ResponseBody::TxDone => proto.set_tx_done(relay::TxDone::new()),
            ResponseBody::KeskRequest => proto.set_kesk_request(relay::KeskRequest::new()),
        }
        proto
    }

    fn from_proto(proto: &Self::Proto) -> Result<Self, Error> {
        if !proto.has_header() {
            return Err(missing("header", "Response"));
        }
        let header = ResponseHeader::from_proto(proto.get_header())?;
        let body = match proto.body {
            Some(relay::Response_oneof_body::join(ref msg)) => ResponseBody::Join {
                id: msg.get_id(),
            },
            Some(relay::Response_oneof_body::start_dicemix(ref msg)) => {
                ResponseBody::StartDiceMix {
                    peers: peers_from_proto(msg.get_peers())?,
                }
            }
            Some(relay::Response_oneof_body::key_exchange(ref msg)) => ResponseBody::KeyExchange {
                peers: peers_from_proto(msg.get_peers())?,
            },
            Some(relay::Response_oneof_body::dc_exp(ref msg)) => ResponseBody::DcExp {
                roots: msg.get_roots().to_vec(),
            },
            Some(relay::Response_oneof_body::dc_simple(ref msg)) => ResponseBody::DcSimple {
                peers: peers_from_proto(msg.get_peers())?,
                messages: dc_messages_from_proto("messages", msg.get_messages())?,
            },
            Some(relay::Response_oneof_body::tx_done(_)) => ResponseBody::TxDone,
            Some(relay::Response_oneof_body::kesk_request(_)) => ResponseBody::KeskRequest,
            None => return Err(missing("body", "Response")),
        };
        Ok(Response { header, body })
    }
}

impl ProtoConvert for RequestHeader {
    type Proto = relay::RequestHeader;
    fn into_proto(&self) -> Self::Proto {
        let mut proto = relay::RequestHeader::new();
        proto.set_session_id(self.session_id);
        proto.set_id(self.id);
        proto.set_timestamp(self.timestamp);
        proto
    }

    fn from_proto(proto: &Self::Proto) -> Result<Self, Error> {
        Ok(RequestHeader {
            session_id: proto.get_session_id(),
            id: proto.get_id(),
            timestamp: proto.get_timestamp(),
        })
    }
}

impl ProtoConvert for Request {
    type Proto = relay::Request;
    fn into_proto(&self) -> Self::Proto {
        let mut proto = relay::Request::new();
        proto.set_header(self.header.into_proto());
        match &self.body {
            RequestBody::Join => proto.set_join(relay::JoinRequest::new()),
            RequestBody::Ltpk { pkey } => {
                let mut body = relay::LtpkRequest::new();
                body.set_pkey(pkey.clone());
                proto.set_ltpk(body);
            }
            RequestBody::KeyExchange { pkey, num_msgs } => {
                let mut body = relay::KeyExchangeRequest::new();
                body.set_pkey(pkey.clone());
                body.set_num_msgs(*num_msgs);
                proto.set_key_exchange(body);
            }
            RequestBody::DcExp { dc_exp_vector } => {
                let mut body = relay::DcExpRequest::new();
                body.set_dc_exp_vector(dc_exp_vector.iter().map(|fe| fe.value()).collect());
                proto.set_dc_exp(body);
            }
            RequestBody::DcSimple {
                dc_simple_vector,
                my_ok,
                next_pkey,
            } => {
                let mut body = relay::DcSimpleRequest::new();
                body.set_dc_simple_vector(dc_messages_into_proto(dc_simple_vector));
                body.set_my_ok(*my_ok);
                body.set_next_pkey(next_pkey.clone());
                proto.set_dc_simple(body);
            }
            RequestBody::Confirmation { confirmation } => {
                let mut body = relay::ConfirmationRequest::new();
                body.set_confirmation(*confirmation);
                proto.set_confirmation(body);
            }
            RequestBody::Kesk { skey } => {
                let mut body = relay::KeskResponse::new();
                body.set_skey(skey.clone());
                proto.set_kesk(body);
            }
        }
        proto
    }

    fn from_proto(proto: &Self::Proto) -> Result<Self, Error> {
        if !proto.has_header() {
            return Err(missing("header", "Request"));
        }
        let header = RequestHeader::from_proto(proto.get_header())?;
        let body = match proto.body {
            Some(relay::Request_oneof_body::join(_)) => RequestBody::Join,
            Some(relay::Request_oneof_body::ltpk(ref msg)) => RequestBody::Ltpk {
                pkey: msg.get_pkey().to_vec(),
            },
            Some(relay::Request_oneof_body::key_exchange(ref msg)) => RequestBody::KeyExchange {
                pkey: msg.get_pkey().to_vec(),
                num_msgs: msg.get_num_msgs(),
            },
            Some(relay::Request_oneof_body::dc_exp(ref msg)) => RequestBody::DcExp {
                dc_exp_vector: msg.get_dc_exp_vector().iter().map(|v| Fe::new(*v)).collect(),
            },
            Some(relay::Request_oneof_body::dc_simple(ref msg)) => RequestBody::DcSimple {
                dc_simple_vector: dc_messages_from_proto(
                    "dc_simple_vector",
                    msg.get_dc_simple_vector(),
                )?,
                my_ok: msg.get_my_ok(),
                next_pkey: msg.get_next_pkey().to_vec(),
            },
            Some(relay::Request_oneof_body::confirmation(ref msg)) => RequestBody::Confirmation {
                confirmation: msg.get_confirmation(),
            },
            Some(relay::Request_oneof_body::kesk(ref msg)) => RequestBody::Kesk {
                skey: msg.get_skey().to_vec(),
            },
            None => return Err(missing("body", "Request")),
        };
        Ok(Request { header, body })
    }
}

impl ProtoConvert for SignedRequest {
    type Proto = relay::SignedRequest;
    fn into_proto(&self) -> Self::Proto {
        let mut proto = relay::SignedRequest::new();
        proto.set_request_data(self.request_data.clone());
        proto.set_signature(self.signature.clone());
        proto
    }

    fn from_proto(proto: &Self::Proto) -> Result<Self, Error> {
        if proto.get_request_data().is_empty() {
            return Err(missing("request_data", "SignedRequest"));
        }
        Ok(SignedRequest {
            request_data: proto.get_request_data().to_vec(),
            signature: proto.get_signature().to_vec(),
        })
    }
}

// -----------------------------------------------------------

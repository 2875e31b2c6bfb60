//! Protocol tests against an in-memory relay.

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

mod errors;
mod run;

use crate::message::*;
use crate::{ClientConfig, DiceMixClient, DiceMixError, Outcome, RunReport, Transport};
use dicemix_crypto::dicemix::{dc_message_hashes, DcMessage, PeerId, MESSAGE_SIZE};
use dicemix_crypto::field::{reduce, Fe};
use dicemix_crypto::signature::SigningKeyPair;
use dicemix_crypto::utils::xor_bytes;
use dicemix_serialization::traits::ProtoConvert;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

const SESSION_ID: SessionId = 7;

pub(crate) fn init_logger() {
    let _ = simple_logger::init_with_level(log::Level::Debug);
}

fn id(i: usize) -> PeerId {
    i as PeerId + 1
}

/// Clients plus what the relay has learned about them.
pub(crate) struct Sandbox {
    pub clients: Vec<DiceMixClient>,
    pub infos: Vec<PeerInfo>,
    pub ltpks: Vec<Vec<u8>>,
}

impl Sandbox {
    pub fn new(num_msgs: &[u32]) -> Sandbox {
        Self::with_config(num_msgs, ClientConfig::default())
    }

    pub fn with_config(num_msgs: &[u32], cfg: ClientConfig) -> Sandbox {
        init_logger();
        let clients = num_msgs
            .iter()
            .map(|n| {
                let cfg = ClientConfig {
                    num_msgs: *n,
                    ..cfg.clone()
                };
                DiceMixClient::new(cfg, SigningKeyPair::generate()).unwrap()
            })
            .collect();
        Sandbox {
            clients,
            infos: (0..num_msgs.len()).map(|i| PeerInfo::new(id(i))).collect(),
            ltpks: vec![Vec::new(); num_msgs.len()],
        }
    }

    /// Decodes a request as the relay would and checks its signature.
    fn open(&self, i: usize, signed: SignedRequest) -> Request {
        let buffer = signed.into_buffer().unwrap();
        let signed = SignedRequest::from_buffer(&buffer).unwrap();
        let request = signed.request().unwrap();
        if request.body.is_signed() {
            assert!(signed.verify(&self.ltpks[i]), "bad signature from {}", id(i));
        } else {
            assert!(signed.signature.is_empty());
        }
        request
    }

    pub fn deliver(&mut self, responses: Vec<Response>) -> Vec<Request> {
        assert_eq!(responses.len(), self.clients.len());
        let mut requests = Vec::new();
        for (i, response) in responses.into_iter().enumerate() {
            let signed = match self.clients[i].handle_response(response).unwrap() {
                Outcome::Reply(signed) => signed,
                Outcome::Done(report) => panic!("unexpected end of run: {:?}", report),
            };
            requests.push(self.open(i, signed));
        }
        requests
    }

    pub fn broadcast(&mut self, body: ResponseBody) -> Vec<Request> {
        let responses = (0..self.clients.len())
            .map(|_| Response::new(SESSION_ID, body.clone()))
            .collect();
        self.deliver(responses)
    }

    pub fn join(&mut self) {
        let mut responses = Vec::new();
        for (i, client) in self.clients.iter_mut().enumerate() {
            let request = client.join().unwrap().request().unwrap();
            assert_eq!(request.body, RequestBody::Join);
            responses.push(Response::new(0, ResponseBody::Join { id: id(i) }));
        }
        for (i, request) in self.deliver(responses).into_iter().enumerate() {
            assert_eq!(request.header.id, id(i));
            match request.body {
                RequestBody::Ltpk { pkey } => self.ltpks[i] = pkey,
                body => panic!("expected Ltpk, got {:?}", body),
            }
        }
    }

    /// Starts a round; records announced keys and counts.
    pub fn start(&mut self) -> Vec<Request> {
        let peers = (0..self.clients.len()).map(|i| PeerInfo::new(id(i))).collect();
        let requests = self.broadcast(ResponseBody::StartDiceMix { peers });
        for (i, request) in requests.iter().enumerate() {
            assert_eq!(request.header.session_id, SESSION_ID);
            assert_eq!(request.header.id, id(i));
            match &request.body {
                RequestBody::KeyExchange { pkey, num_msgs } => {
                    self.infos[i].pkey = pkey.clone();
                    self.infos[i].num_msgs = *num_msgs;
                }
                body => panic!("expected KeyExchange, got {:?}", body),
            }
        }
        requests
    }

    pub fn key_exchange(&mut self) -> Vec<Request> {
        let peers = self.infos.clone();
        self.broadcast(ResponseBody::KeyExchange { peers })
    }

    /// Roots as a relay would find them, in sorted order.
    pub fn roots(&self) -> Vec<u64> {
        let mut roots: Vec<u64> = self
            .clients
            .iter()
            .flat_map(|c| dc_message_hashes(c.my_messages()))
            .map(reduce)
            .collect();
        roots.sort();
        roots
    }

    pub fn dc_exp(&mut self, roots: &[u64]) -> Vec<Request> {
        self.broadcast(ResponseBody::DcExp {
            roots: roots.to_vec(),
        })
    }

    /// XOR of all DC-SIMPLE vectors; records vectors and flags per peer.
    pub fn combine_simple(&mut self, requests: &[Request]) -> Vec<DcMessage> {
        let mut combined: Vec<DcMessage> = Vec::new();
        for (i, request) in requests.iter().enumerate() {
            match &request.body {
                RequestBody::DcSimple {
                    dc_simple_vector,
                    my_ok,
                    ..
                } => {
                    if combined.is_empty() {
                        combined = vec![[0u8; MESSAGE_SIZE]; dc_simple_vector.len()];
                    }
                    for (c, v) in combined.iter_mut().zip(dc_simple_vector.iter()) {
                        xor_bytes(&mut c[..], &v[..]);
                    }
                    self.infos[i].dc_simple_vector = dc_simple_vector.clone();
                    self.infos[i].ok = *my_ok;
                }
                body => panic!("expected DcSimple, got {:?}", body),
            }
        }
        combined
    }

    pub fn dc_simple(&mut self, messages: Vec<DcMessage>) -> Vec<bool> {
        let peers = self.infos.clone();
        self.broadcast(ResponseBody::DcSimple { peers, messages })
            .into_iter()
            .map(|request| match request.body {
                RequestBody::Confirmation { confirmation } => confirmation,
                body => panic!("expected Confirmation, got {:?}", body),
            })
            .collect()
    }

    pub fn finish(&mut self) -> Vec<RunReport> {
        self.clients
            .iter_mut()
            .map(
                |c| match c.handle_response(Response::new(SESSION_ID, ResponseBody::TxDone)) {
                    Ok(Outcome::Done(report)) => report,
                    other => panic!("expected Done, got {:?}", other),
                },
            )
            .collect()
    }

    /// Join, start, key exchange, DC-EXP and DC-SIMPLE with honest roots.
    pub fn run_until_confirmation(&mut self) -> (Vec<DcMessage>, Vec<bool>) {
        self.join();
        self.start();
        self.key_exchange();
        let roots = self.roots();
        let requests = self.dc_exp(&roots);
        let messages = self.combine_simple(&requests);
        let confirmations = self.dc_simple(messages.clone());
        (messages, confirmations)
    }
}

/// Field sum of DC-EXP vectors.
pub(crate) fn combine_exp(requests: &[Request]) -> Vec<Fe> {
    let mut combined: Vec<Fe> = Vec::new();
    for request in requests {
        match &request.body {
            RequestBody::DcExp { dc_exp_vector } => {
                if combined.is_empty() {
                    combined = vec![Fe::zero(); dc_exp_vector.len()];
                }
                for (c, v) in combined.iter_mut().zip(dc_exp_vector.iter()) {
                    *c += *v;
                }
            }
            body => panic!("expected DcExp, got {:?}", body),
        }
    }
    combined
}

/// sum(root^(i+1)) for i in 0..len.
pub(crate) fn power_sums(roots: &[u64], len: usize) -> Vec<Fe> {
    (0..len as u64)
        .map(|i| {
            roots
                .iter()
                .fold(Fe::zero(), |sum, r| sum + Fe::new(*r).pow(i + 1))
        })
        .collect()
}

/// Client side of an in-process connection.
pub(crate) struct ChannelTransport {
    pub tx: Sender<Vec<u8>>,
    pub rx: Receiver<Vec<u8>>,
    pub timeout: Duration,
    pub closed: bool,
}

impl Transport for ChannelTransport {
    fn send(&mut self, data: Vec<u8>) -> Result<(), DiceMixError> {
        self.tx
            .send(data)
            .map_err(|_| DiceMixError::ConnectionClosed("relay is gone".to_string()))
    }

    fn recv(&mut self) -> Result<Vec<u8>, DiceMixError> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(data) => Ok(data),
            Err(RecvTimeoutError::Timeout) => Err(DiceMixError::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                Err(DiceMixError::ConnectionClosed("relay is gone".to_string()))
            }
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

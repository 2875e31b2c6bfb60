//! DiceMix Light Client.

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

// ========================================================================
// The client takes part in one DiceMix run coordinated by a relay. The
// relay never learns which participant owns which message; it only
// combines the DC-net vectors it is given and hands back the results.
//
// Conversation with the relay, one request in flight at a time:
//
//   Join          -> Join { id }               relay assigns our peer id
//   Ltpk          -> StartDiceMix { peers }    round begins
//   KeyExchange   -> KeyExchange { peers }     peers' NIKE keys and counts
//   DcExp         -> DcExp { roots }           hashes of all messages
//   DcSimple      -> DcSimple { peers, msgs }  all messages in their slots
//   Confirmation  -> TxDone | KeskRequest
//   Kesk          -> StartDiceMix | TxDone     after a blame
//
// Ltpk announces our long-term key, so it and Join go out unsigned; every
// later request is signed with that key.
//
// After a KeskRequest we reveal the round's NIKE secret so the relay can
// expose whoever disrupted the run, then switch to the keypair announced
// together with our DC-SIMPLE vector. A following StartDiceMix reuses
// that keypair.
//
// Any relay error, malformed response or protocol violation is returned
// as a DiceMixError and ends the run.
// ========================================================================

pub mod config;
mod error;
pub mod message;
mod protos;
pub mod state;
pub mod transport;

#[cfg(test)]
mod test;

pub use crate::config::ClientConfig;
pub use crate::error::DiceMixError;
pub use crate::transport::{Transport, WebSocketTransport};

use crate::message::*;
use crate::state::{cloaks, merge_peers, start_peers, Peer, RunState, Session};
use dicemix_crypto::dicemix::{self, DcMessage, PeerId};
use dicemix_crypto::keystream::DiceMixRng;
use dicemix_crypto::nike::NikeKeyPair;
use dicemix_crypto::signature::SigningKeyPair;
use dicemix_serialization::traits::ProtoConvert;
use log::*;
use std::fmt;
use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Protocol state, named after the last request sent.
pub enum State {
    Offline,
    JoinSent,
    LtpkSent,
    KeyExchangeSent,
    ExpSent,
    SimpleSent,
    ConfirmationSent,
    KeskSent,
    Done,
    Failed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub session_id: SessionId,
    pub my_id: PeerId,
    /// All messages of the final round, by slot.
    pub messages: Vec<DcMessage>,
    /// Our own consistency check of the final round.
    pub confirmed: bool,
    /// Number of times we revealed a round key.
    pub blame_rounds: u32,
}

/// What to do after a response.
#[derive(Debug)]
pub enum Outcome {
    Reply(SignedRequest),
    Done(RunReport),
}

/// DiceMix participant.
pub struct DiceMixClient {
    cfg: ClientConfig,
    state: State,
    session: Session,
    peers: Vec<Peer>,
    run: RunState,
    blame_rounds: u32,
}

impl DiceMixClient {
    pub fn new(cfg: ClientConfig, ltkp: SigningKeyPair) -> Result<DiceMixClient, DiceMixError> {
        cfg.validate()?;
        debug!("Long-term key: {:?}", ltkp);
        Ok(DiceMixClient {
            cfg,
            state: State::Offline,
            session: Session::new(ltkp),
            peers: Vec::new(),
            run: RunState::default(),
            blame_rounds: 0,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn my_id(&self) -> PeerId {
        self.session.my_id
    }

    pub fn session_id(&self) -> SessionId {
        self.session.session_id
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    /// Messages generated for the current round.
    pub fn my_messages(&self) -> &[DcMessage] {
        &self.run.my_msgs
    }

    /// Runs the whole conversation over `transport`, which is closed on return.
    pub fn run<T: Transport>(&mut self, transport: &mut T) -> Result<RunReport, DiceMixError> {
        let result = self.drive(transport);
        transport.close();
        match result {
            Ok(ref report) => info!(
                "DiceMix run finished: session={}, messages={}, confirmed={}",
                report.session_id,
                report.messages.len(),
                report.confirmed
            ),
            Err(ref e) => error!("DiceMix run aborted: {}", e),
        }
        result
    }

    fn drive<T: Transport>(&mut self, transport: &mut T) -> Result<RunReport, DiceMixError> {
        let join = self.join()?;
        transport.send(join.into_buffer()?)?;
        loop {
            let buffer = transport.recv()?;
            let response = Response::from_buffer(&buffer)?;
            match self.handle_response(response)? {
                Outcome::Reply(request) => transport.send(request.into_buffer()?)?,
                Outcome::Done(report) => return Ok(report),
            }
        }
    }

    /// First request of a run.
    pub fn join(&mut self) -> Result<SignedRequest, DiceMixError> {
        if self.state != State::Offline {
            return Err(DiceMixError::UnexpectedResponse(
                self.state.to_string(),
                "Join".to_string(),
            ));
        }
        info!("Attempting to join a DiceMix run");
        self.send(RequestBody::Join, State::JoinSent)
    }

    /// Advances the state machine by one relay response.
    pub fn handle_response(&mut self, response: Response) -> Result<Outcome, DiceMixError> {
        match self.try_handle_response(response) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.reset_state();
                Err(e)
            }
        }
    }

    fn try_handle_response(&mut self, response: Response) -> Result<Outcome, DiceMixError> {
        let Response { header, body } = response;
        debug!(
            "Received: state={}, response={}, session={}",
            self.state,
            body.name(),
            header.session_id
        );
        if !header.err.is_empty() {
            return Err(DiceMixError::RelayError(header.err));
        }
        if !header.message.is_empty() {
            info!("Relay: {}", header.message);
        }

        match (self.state, body) {
            (State::JoinSent, ResponseBody::Join { id }) => self.on_join(id),
            (State::LtpkSent, ResponseBody::StartDiceMix { peers })
            | (State::KeskSent, ResponseBody::StartDiceMix { peers }) => {
                self.on_start_dicemix(header.session_id, &peers)
            }
            (State::KeyExchangeSent, ResponseBody::KeyExchange { peers }) => {
                self.on_key_exchange(&peers)
            }
            (State::ExpSent, ResponseBody::DcExp { roots }) => self.on_dc_exp(roots),
            (State::SimpleSent, ResponseBody::DcSimple { peers, messages }) => {
                self.on_dc_simple(&peers, messages)
            }
            (State::ConfirmationSent, ResponseBody::TxDone)
            | (State::KeskSent, ResponseBody::TxDone) => self.on_tx_done(),
            (State::ConfirmationSent, ResponseBody::KeskRequest) => self.on_kesk_request(),
            (state, body) => Err(DiceMixError::UnexpectedResponse(
                state.to_string(),
                body.name().to_string(),
            )),
        }
    }

    fn on_join(&mut self, id: PeerId) -> Result<Outcome, DiceMixError> {
        self.session.my_id = id;
        info!("Joined: my_id={}", id);
        let pkey = self.session.ltkp.public_bytes();
        self.reply(RequestBody::Ltpk { pkey }, State::LtpkSent)
    }

    fn on_start_dicemix(
        &mut self,
        session_id: SessionId,
        peers: &[PeerInfo],
    ) -> Result<Outcome, DiceMixError> {
        self.session.session_id = session_id;
        self.peers = start_peers(self.session.my_id, peers)?;
        self.run = RunState::default();
        info!(
            "DiceMix run started: session={}, peers={}",
            session_id,
            self.peers.len()
        );

        // rotated in by the last blame, announced already
        let kepk = match self.session.kepk.take() {
            Some(kepk) => kepk,
            None => NikeKeyPair::generate(),
        };
        debug!("Round key: {:?}", kepk);
        let pkey = kepk.public_bytes();
        self.session.kepk = Some(kepk);

        let num_msgs = self.cfg.num_msgs;
        self.reply(
            RequestBody::KeyExchange { pkey, num_msgs },
            State::KeyExchangeSent,
        )
    }

    fn on_key_exchange(&mut self, peers: &[PeerInfo]) -> Result<Outcome, DiceMixError> {
        let old = mem::replace(&mut self.peers, Vec::new());
        self.peers = merge_peers(old, peers)?;

        let total_slots = dicemix::dc_total_slots(
            self.cfg.num_msgs as usize,
            self.peers.iter().map(|p| p.num_msgs),
            self.cfg.max_messages,
        )?;

        let kepk = self.session.kepk.as_ref().ok_or_else(|| {
            DiceMixError::InvalidMessage("No round key for key exchange".to_string())
        })?;
        for peer in self.peers.iter_mut() {
            let shared_key = kepk.shared_secret(&peer.pkey)?;
            peer.dicemix = Some(DiceMixRng::new(&shared_key));
            peer.shared_key = Some(shared_key);
        }

        let my_msgs: Vec<DcMessage> = (0..self.cfg.num_msgs)
            .map(|_| dicemix::random_message())
            .collect();
        let my_hashes = dicemix::dc_message_hashes(&my_msgs);
        debug!("My messages: {:?}", my_msgs);

        let dc_exp = dicemix::dc_exp_vector(
            self.session.my_id,
            &my_hashes,
            total_slots,
            cloaks(&mut self.peers)?,
        );

        self.run.my_msgs = my_msgs;
        self.run.my_hashes = my_hashes;
        self.run.total_slots = total_slots;
        self.run.dc_exp = dc_exp.clone();
        self.reply(
            RequestBody::DcExp {
                dc_exp_vector: dc_exp,
            },
            State::ExpSent,
        )
    }

    fn on_dc_exp(&mut self, roots: Vec<u64>) -> Result<Outcome, DiceMixError> {
        debug!("Roots: {:?}", roots);
        let out = dicemix::dc_run_simple(
            &self.run.my_msgs,
            &self.run.my_hashes,
            &roots,
            self.run.total_slots,
            self.cfg.max_messages,
            cloaks(&mut self.peers)?,
        )?;
        if !out.my_ok {
            warn!("Failed to reserve slots for my messages");
        }

        if self.session.next_kepk.is_none() {
            self.session.next_kepk = Some(NikeKeyPair::generate());
        }
        let next_pkey = self
            .session
            .next_kepk
            .as_ref()
            .map(NikeKeyPair::public_bytes)
            .unwrap_or_default();

        self.run.roots = roots;
        self.run.slots = out.slots;
        self.run.my_ok = out.my_ok;
        self.run.dc_simple = out.vector.clone();
        self.reply(
            RequestBody::DcSimple {
                dc_simple_vector: out.vector,
                my_ok: out.my_ok,
                next_pkey,
            },
            State::SimpleSent,
        )
    }

    fn on_dc_simple(
        &mut self,
        peers: &[PeerInfo],
        messages: Vec<DcMessage>,
    ) -> Result<Outcome, DiceMixError> {
        let old = mem::replace(&mut self.peers, Vec::new());
        self.peers = merge_peers(old, peers)?;
        for peer in self.peers.iter().filter(|p| !p.ok) {
            warn!("Peer {} failed to reserve its slots", peer.id);
        }

        if messages.len() != self.run.total_slots {
            return Err(DiceMixError::MessageCountMismatch(
                self.run.total_slots,
                messages.len(),
            ));
        }
        let confirmation =
            dicemix::dc_verify_proceed(&self.run.my_hashes, &self.run.roots, &messages);
        info!("All messages received, agree to proceed: {}", confirmation);
        self.run.all_messages = messages;

        self.reply(
            RequestBody::Confirmation { confirmation },
            State::ConfirmationSent,
        )
    }

    fn on_tx_done(&mut self) -> Result<Outcome, DiceMixError> {
        info!("Transaction successful, all peers agreed");
        self.state = State::Done;
        let run = &self.run;
        let confirmed = !run.all_messages.is_empty()
            && dicemix::dc_verify_proceed(&run.my_hashes, &run.roots, &run.all_messages);
        Ok(Outcome::Done(RunReport {
            session_id: self.session.session_id,
            my_id: self.session.my_id,
            messages: self.run.all_messages.clone(),
            confirmed,
            blame_rounds: self.blame_rounds,
        }))
    }

    fn on_kesk_request(&mut self) -> Result<Outcome, DiceMixError> {
        let kepk = self.session.kepk.take().ok_or_else(|| {
            DiceMixError::InvalidMessage("No round key to reveal".to_string())
        })?;
        warn!("Blame requested, revealing round key {:?}", kepk);
        let skey = kepk.secret_bytes();

        self.session.kepk = self.session.next_kepk.take();
        self.blame_rounds += 1;
        self.reply(RequestBody::Kesk { skey }, State::KeskSent)
    }

    fn reply(&mut self, body: RequestBody, next: State) -> Result<Outcome, DiceMixError> {
        self.send(body, next).map(Outcome::Reply)
    }

    fn send(&mut self, body: RequestBody, next: State) -> Result<SignedRequest, DiceMixError> {
        let header = RequestHeader {
            session_id: self.session.session_id,
            id: self.session.my_id,
            timestamp: timestamp(),
        };
        debug!(
            "Sending: request={}, state={} => {}",
            body.name(),
            self.state,
            next
        );
        let request = Request { header, body };
        let signed = SignedRequest::new(&request, &self.session.ltkp)?;
        self.state = next;
        Ok(signed)
    }

    /// Drops all run material after a fatal error.
    fn reset_state(&mut self) {
        self.state = State::Failed;
        self.peers.clear();
        self.run = RunState::default();
        self.session.kepk = None;
        self.session.next_kepk = None;
    }
}

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

use super::*;
use crate::State;
use assert_matches::assert_matches;
use dicemix_crypto::CryptoError;

fn response(body: ResponseBody) -> Response {
    Response::new(SESSION_ID, body)
}

#[test]
fn relay_error_is_fatal() {
    let mut s = Sandbox::new(&[1]);
    s.clients[0].join().unwrap();
    let err = s.clients[0]
        .handle_response(Response::error(0, "Relay is full", ResponseBody::Join { id: 1 }))
        .unwrap_err();
    assert_matches!(err, DiceMixError::RelayError(ref e) if e == "Relay is full");
    assert_eq!(s.clients[0].state(), State::Failed);

    // nothing is accepted afterwards
    assert_matches!(
        s.clients[0].handle_response(response(ResponseBody::Join { id: 1 })),
        Err(DiceMixError::UnexpectedResponse(_, _))
    );
}

#[test]
fn out_of_order_response() {
    let mut s = Sandbox::new(&[1, 1]);
    s.join();
    assert_matches!(
        s.clients[0].handle_response(response(ResponseBody::DcExp { roots: vec![1, 2] })),
        Err(DiceMixError::UnexpectedResponse(ref state, ref body))
            if state == "LtpkSent" && body == "DcExp"
    );
    assert_eq!(s.clients[0].state(), State::Failed);
}

#[test]
fn join_once() {
    let mut s = Sandbox::new(&[1]);
    s.clients[0].join().unwrap();
    assert_matches!(
        s.clients[0].join(),
        Err(DiceMixError::UnexpectedResponse(_, _))
    );
}

#[test]
fn kesk_only_after_confirmation() {
    let mut s = Sandbox::new(&[1, 1]);
    s.join();
    s.start();
    assert_matches!(
        s.clients[0].handle_response(response(ResponseBody::KeskRequest)),
        Err(DiceMixError::UnexpectedResponse(_, _))
    );
}

#[test]
fn duplicate_peer() {
    let mut s = Sandbox::new(&[1, 1]);
    s.join();
    let peers = vec![PeerInfo::new(1), PeerInfo::new(2), PeerInfo::new(2)];
    assert_matches!(
        s.clients[0].handle_response(response(ResponseBody::StartDiceMix { peers })),
        Err(DiceMixError::DuplicatePeer(2))
    );
}

#[test]
fn too_many_peers() {
    let mut s = Sandbox::new(&[1, 1]);
    s.join();
    s.start();
    let mut peers = s.infos.clone();
    peers.push(PeerInfo::new(3));
    assert_matches!(
        s.clients[0].handle_response(response(ResponseBody::KeyExchange { peers })),
        Err(DiceMixError::TooManyPeers(2, 3))
    );
}

#[test]
fn duplicate_peer_in_key_exchange() {
    let mut s = Sandbox::new(&[1, 1, 1]);
    s.join();
    s.start();
    let mut peers = s.infos[..2].to_vec();
    let mut dup = s.infos[1].clone();
    dup.num_msgs = 5;
    peers.push(dup);
    assert_matches!(
        s.clients[0].handle_response(response(ResponseBody::KeyExchange { peers })),
        Err(DiceMixError::DuplicatePeer(2))
    );
    assert_eq!(s.clients[0].state(), State::Failed);
}

#[test]
fn peer_missing_from_key_exchange() {
    let mut s = Sandbox::new(&[1, 1, 1]);
    s.join();
    s.start();
    let peers = s.infos[..2].to_vec();
    assert_matches!(
        s.clients[0].handle_response(response(ResponseBody::KeyExchange { peers })),
        Err(DiceMixError::PeerCountMismatch(2, 1))
    );
    assert_eq!(s.clients[0].state(), State::Failed);
}

#[test]
fn peer_missing_from_dc_simple() {
    let mut s = Sandbox::new(&[1, 1]);
    s.join();
    s.start();
    s.key_exchange();
    let roots = s.roots();
    let requests = s.dc_exp(&roots);
    let messages = s.combine_simple(&requests);
    let peers = s.infos[..1].to_vec();
    assert_matches!(
        s.clients[0].handle_response(response(ResponseBody::DcSimple { peers, messages })),
        Err(DiceMixError::PeerCountMismatch(1, 0))
    );
}

#[test]
fn too_many_messages() {
    let cfg = ClientConfig {
        max_messages: 10,
        ..Default::default()
    };
    let mut s = Sandbox::with_config(&[1, 1], cfg);
    s.join();
    s.start();
    let mut peers = s.infos.clone();
    peers[1].num_msgs = 10;
    assert_matches!(
        s.clients[0].handle_response(response(ResponseBody::KeyExchange { peers })),
        Err(DiceMixError::TooManyMessages(11, 10))
    );
}

#[test]
fn invalid_peer_key() {
    let mut s = Sandbox::new(&[1, 1]);
    s.join();
    s.start();
    let mut peers = s.infos.clone();
    peers[1].pkey.pop();
    assert_matches!(
        s.clients[0].handle_response(response(ResponseBody::KeyExchange { peers })),
        Err(DiceMixError::Crypto(CryptoError::InvalidBinaryLength(32, 31)))
    );
}

#[test]
fn root_count_mismatch() {
    let mut s = Sandbox::new(&[1, 1]);
    s.join();
    s.start();
    s.key_exchange();
    let roots = s.roots();
    assert_matches!(
        s.clients[0].handle_response(response(ResponseBody::DcExp {
            roots: roots[..1].to_vec()
        })),
        Err(DiceMixError::RootCountMismatch(2, 1))
    );
}

#[test]
fn message_count_mismatch() {
    let mut s = Sandbox::new(&[1, 1]);
    s.join();
    s.start();
    s.key_exchange();
    let roots = s.roots();
    let requests = s.dc_exp(&roots);
    let mut messages = s.combine_simple(&requests);
    messages.push([0u8; MESSAGE_SIZE]);
    let peers = s.infos.clone();
    assert_matches!(
        s.clients[0].handle_response(response(ResponseBody::DcSimple { peers, messages })),
        Err(DiceMixError::MessageCountMismatch(2, 3))
    );
}

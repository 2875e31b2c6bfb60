//! state.rs - Session, peer registry and per-run state

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
use crate::message::{PeerInfo, SessionId};
use dicemix_crypto::dicemix::{DcMessage, PeerId};
use dicemix_crypto::field::Fe;
use dicemix_crypto::keystream::DiceMixRng;
use dicemix_crypto::nike::NikeKeyPair;
use dicemix_crypto::signature::SigningKeyPair;
use log::*;
use std::collections::{HashMap, HashSet};

/// Identity material of the local participant.
#[derive(Debug)]
pub struct Session {
    pub my_id: PeerId,
    pub session_id: SessionId,
    /// Long-term signing key, survives runs.
    pub ltkp: SigningKeyPair,
    /// Key exchange keypair of the current round.
    pub kepk: Option<NikeKeyPair>,
    /// Keypair announced for the round after a blame.
    pub next_kepk: Option<NikeKeyPair>,
}

impl Session {
    pub fn new(ltkp: SigningKeyPair) -> Session {
        Session {
            my_id: 0,
            session_id: 0,
            ltkp,
            kepk: None,
            next_kepk: None,
        }
    }
}

/// A remote participant of the current run.
#[derive(Debug)]
pub struct Peer {
    pub id: PeerId,
    pub pkey: Vec<u8>,
    pub num_msgs: u32,
    pub shared_key: Option<Vec<u8>>,
    pub dicemix: Option<DiceMixRng>,
    pub dc_simple_vector: Vec<DcMessage>,
    pub ok: bool,
    pub confirmation: bool,
}

impl Peer {
    pub fn new(id: PeerId) -> Peer {
        Peer {
            id,
            pkey: Vec::new(),
            num_msgs: 0,
            shared_key: None,
            dicemix: None,
            dc_simple_vector: Vec::new(),
            ok: false,
            confirmation: false,
        }
    }
}

/// Local messages and DC-net vectors of one run.
#[derive(Debug, Default)]
pub struct RunState {
    pub my_msgs: Vec<DcMessage>,
    pub my_hashes: Vec<u64>,
    pub slots: Vec<usize>,
    pub my_ok: bool,
    pub total_slots: usize,
    pub dc_exp: Vec<Fe>,
    pub dc_simple: Vec<DcMessage>,
    pub roots: Vec<u64>,
    pub all_messages: Vec<DcMessage>,
}

/// Peer set of a new round: every id in `peers` except self, no duplicates.
pub fn start_peers(my_id: PeerId, peers: &[PeerInfo]) -> Result<Vec<Peer>, DiceMixError> {
    let mut seen: HashSet<PeerId> = HashSet::with_capacity(peers.len());
    let mut out = Vec::with_capacity(peers.len());
    for info in peers {
        if !seen.insert(info.id) {
            return Err(DiceMixError::DuplicatePeer(info.id));
        }
        if info.id != my_id {
            out.push(Peer::new(info.id));
        }
    }
    if out.len() == peers.len() {
        warn!("Relay did not list us (id={}) among the participants", my_id);
    }
    Ok(out)
}

/// Rebuilds the peer set from a relay peer list.
///
/// Ids outside `old` are dropped, but every peer of `old` must be listed
/// exactly once. Key material already derived for a peer moves over to
/// the new entry; everything else comes from `infos`.
pub fn merge_peers(old: Vec<Peer>, infos: &[PeerInfo]) -> Result<Vec<Peer>, DiceMixError> {
    // +1 for ourselves, the relay lists every participant
    if old.len() + 1 < infos.len() {
        return Err(DiceMixError::TooManyPeers(old.len() + 1, infos.len()));
    }

    let expected = old.len();
    let mut known: HashMap<PeerId, Peer> = old.into_iter().map(|p| (p.id, p)).collect();
    let mut seen: HashSet<PeerId> = HashSet::with_capacity(infos.len());
    let mut merged = Vec::with_capacity(expected);
    for info in infos {
        if !seen.insert(info.id) {
            return Err(DiceMixError::DuplicatePeer(info.id));
        }
        let prev = match known.remove(&info.id) {
            Some(prev) => prev,
            None => {
                debug!("Ignoring peer {} not in this run", info.id);
                continue;
            }
        };
        merged.push(Peer {
            id: info.id,
            pkey: info.pkey.clone(),
            num_msgs: info.num_msgs,
            shared_key: prev.shared_key,
            dicemix: prev.dicemix,
            dc_simple_vector: info.dc_simple_vector.clone(),
            ok: info.ok,
            confirmation: info.confirmation,
        });
    }
    if !known.is_empty() {
        let mut missing: Vec<PeerId> = known.keys().cloned().collect();
        missing.sort();
        error!("Relay dropped peers {:?} from the run", missing);
        return Err(DiceMixError::PeerCountMismatch(expected, merged.len()));
    }
    Ok(merged)
}

/// (id, keystream) of every peer, in peer order.
pub fn cloaks(peers: &mut [Peer]) -> Result<Vec<(PeerId, &mut DiceMixRng)>, DiceMixError> {
    let mut out = Vec::with_capacity(peers.len());
    for peer in peers.iter_mut() {
        let id = peer.id;
        match peer.dicemix.as_mut() {
            Some(rng) => out.push((id, rng)),
            None => {
                return Err(DiceMixError::InvalidMessage(format!(
                    "No shared key with peer {}",
                    id
                )));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn info(id: PeerId, num_msgs: u32) -> PeerInfo {
        PeerInfo {
            id,
            pkey: vec![id as u8; 32],
            num_msgs,
            ..PeerInfo::new(id)
        }
    }

    #[test]
    fn start_excludes_self() {
        let peers = start_peers(2, &[info(1, 0), info(2, 0), info(3, 0)]).unwrap();
        let ids: Vec<PeerId> = peers.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn start_rejects_duplicates() {
        assert_matches!(
            start_peers(1, &[info(1, 0), info(3, 0), info(3, 0)]),
            Err(DiceMixError::DuplicatePeer(3))
        );
    }

    #[test]
    fn merge_keeps_keys() {
        let mut old = vec![Peer::new(2), Peer::new(3)];
        old[0].shared_key = Some(vec![9; 32]);
        old[0].dicemix = Some(DiceMixRng::new(&[9; 32]));

        let merged = merge_peers(old, &[info(4, 4), info(2, 2), info(3, 3)]).unwrap();
        // 4 is unknown
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, 2);
        assert_eq!(merged[0].num_msgs, 2);
        assert_eq!(merged[0].pkey, vec![2u8; 32]);
        assert_eq!(merged[0].shared_key, Some(vec![9; 32]));
        assert!(merged[0].dicemix.is_some());
        assert_eq!(merged[1].id, 3);
        assert!(merged[1].shared_key.is_none());
    }

    #[test]
    fn merge_rejects_oversized_list() {
        let old = vec![Peer::new(2)];
        assert_matches!(
            merge_peers(old, &[info(1, 1), info(2, 1), info(3, 1)]),
            Err(DiceMixError::TooManyPeers(2, 3))
        );
    }

    #[test]
    fn merge_rejects_duplicates() {
        let old = vec![Peer::new(2), Peer::new(3)];
        assert_matches!(
            merge_peers(old, &[info(1, 1), info(2, 1), info(2, 5)]),
            Err(DiceMixError::DuplicatePeer(2))
        );
    }

    #[test]
    fn merge_rejects_missing_peer() {
        let old = vec![Peer::new(2), Peer::new(3)];
        assert_matches!(
            merge_peers(old, &[info(1, 1), info(2, 1)]),
            Err(DiceMixError::PeerCountMismatch(2, 1))
        );
    }

    #[test]
    fn cloaks_need_keystreams() {
        let mut peers = vec![Peer::new(2), Peer::new(3)];
        peers[0].dicemix = Some(DiceMixRng::new(b"a"));
        assert_matches!(cloaks(&mut peers), Err(DiceMixError::InvalidMessage(_)));
        peers[1].dicemix = Some(DiceMixRng::new(b"b"));
        let ids: Vec<PeerId> = cloaks(&mut peers).unwrap().iter().map(|c| c.0).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}

//! mod.rs - DiceMix DC-net encoding for anonymous message exchange

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
//

use crate::field::{reduce, Fe};
use crate::hash::short_hash;
use crate::keystream::DiceMixRng;
use crate::utils::xor_bytes;
use crate::CryptoError;
use log::*;
use rand::{thread_rng, RngCore};

// ------------------------------------------------
/*
A DiceMix run uses two DC-nets back to back.

DC-EXP: every participant publishes, for each global slot i (i = 0..S),

    my_dc[i] = sum_m hash(m)^(i+1) + sum_p sgn(my_id, p) * pad(p, i)

where m runs over our own messages and p over every other participant.
pad(p, i) is the i-th field element drawn from the keystream shared with p,
and sgn() is +1 on one side of the pair and -1 on the other. Summed over all
participants the pads cancel pairwise, leaving the power sums of all message
hashes. The relay solves those for the hashes themselves ("roots") and hands
them back, one per slot, in an order nobody controls.

DC-SIMPLE: each participant finds its own hashes among the roots, which
reserves one slot per message, places the raw message bytes there and XORs
every slot with one 20-byte pad per peer. XORing all vectors together
reveals every message in its slot without revealing who wrote it.

Draw order per peer keystream is fixed: S field elements for DC-EXP, then S
byte pads for DC-SIMPLE, both in ascending slot order. The peer holding the
other end of the stream performs exactly the same draws.
*/
// -------------------------------------------------

pub const MESSAGE_SIZE: usize = 20; // bytes, 160 bits

pub type PeerId = i32;
pub type DcMessage = [u8; MESSAGE_SIZE];
pub type DcExpVector = Vec<Fe>;
pub type DcSimpleVector = Vec<DcMessage>;

/// Fresh random message for a run.
pub fn random_message() -> DcMessage {
    let mut msg = [0u8; MESSAGE_SIZE];
    thread_rng().fill_bytes(&mut msg);
    msg
}

pub fn dc_message_hashes(msgs: &[DcMessage]) -> Vec<u64> {
    msgs.iter().map(|m| short_hash(&m[..])).collect()
}

/// my_count + sum(peer counts), checked against the hard cap.
pub fn dc_total_slots<I>(
    my_count: usize,
    peer_counts: I,
    max_slots: usize,
) -> Result<usize, CryptoError>
where
    I: IntoIterator<Item = u32>,
{
    let total = peer_counts
        .into_iter()
        .fold(my_count, |sum, n| sum.saturating_add(n as usize));
    if total > max_slots {
        return Err(CryptoError::TooManyMessages(total, max_slots));
    }
    Ok(total)
}

/// Builds our DC-EXP vector.
///
/// `cloaks` yields (peer id, keystream shared with that peer) in the same
/// order on every call site; each stream is advanced by `total_slots` draws.
pub fn dc_exp_vector<'a, I>(
    my_id: PeerId,
    my_hashes: &[u64],
    total_slots: usize,
    cloaks: I,
) -> DcExpVector
where
    I: IntoIterator<Item = (PeerId, &'a mut DiceMixRng)>,
{
    let mut my_dc = vec![Fe::zero(); total_slots];

    // power sums: my_dc[i] += hash^(i+1)
    for h in my_hashes {
        let base = Fe::new(*h);
        let mut pow = Fe::one();
        for cell in my_dc.iter_mut() {
            pow *= base;
            *cell += pow;
        }
    }

    // cloaking: my_dc[i] += sgn(my_id - p.id) * pad
    for (peer_id, rng) in cloaks {
        for cell in my_dc.iter_mut() {
            let pad = rng.field_element();
            if my_id > peer_id {
                *cell += -pad;
            } else {
                *cell += pad;
            }
        }
    }

    debug!("My msg hashes = {:?}", my_hashes);
    debug!("My DC-EXP vector = {:?}", my_dc);
    my_dc
}

/// Finds the slot of each of our messages among the relay's roots.
///
/// A message resolves only if its reduced hash occurs exactly once in
/// `roots` and no other of our messages took the same slot. The flag is
/// false if any message fails; resolved entries are still returned.
pub fn dc_obtain_slots(my_hashes: &[u64], roots: &[u64]) -> (Vec<Option<usize>>, bool) {
    let mut slots: Vec<Option<usize>> = vec![None; my_hashes.len()];
    let mut ok = true;
    for (j, h) in my_hashes.iter().enumerate() {
        let h = reduce(*h);
        let mut found = roots.iter().enumerate().filter(|(_, r)| **r == h);
        match (found.next(), found.next()) {
            (Some((i, _)), None) if !slots.contains(&Some(i)) => slots[j] = Some(i),
            _ => ok = false,
        }
    }
    (slots, ok)
}

/// Places messages into their slots and XOR-cloaks every slot once per peer.
pub fn dc_simple_vector<'a, I>(
    my_msgs: &[DcMessage],
    slots: &[usize],
    total_slots: usize,
    cloaks: I,
) -> Result<DcSimpleVector, CryptoError>
where
    I: IntoIterator<Item = (PeerId, &'a mut DiceMixRng)>,
{
    if my_msgs.len() != slots.len() {
        return Err(CryptoError::SlotCountMismatch(my_msgs.len(), slots.len()));
    }
    let mut vector = vec![[0u8; MESSAGE_SIZE]; total_slots];
    for (msg, slot) in my_msgs.iter().zip(slots.iter()) {
        match vector.get_mut(*slot) {
            Some(cell) => *cell = *msg,
            None => return Err(CryptoError::InvalidSlot(*slot, total_slots)),
        }
    }
    debug!("Slots = {:?}", vector);

    for (_, rng) in cloaks {
        for cell in vector.iter_mut() {
            xor_bytes(&mut cell[..], &rng.bytes(MESSAGE_SIZE));
        }
    }
    debug!("My DC-SIMPLE vector = {:?}", vector);
    Ok(vector)
}

/// Result of the DC-SIMPLE round.
#[derive(Debug, Clone)]
pub struct DcSimpleOutput {
    pub vector: DcSimpleVector,
    /// All of our messages reserved a slot.
    pub my_ok: bool,
    /// Slot used for each message (the fallback mapping when !my_ok).
    pub slots: Vec<usize>,
}

/// Runs DC-SIMPLE with slot reservation.
///
/// Failure to reserve a slot is not an error: the run continues with
/// `my_ok = false` and messages go to slots 0..n so that peers can recompute
/// our contribution during blame. Oversized runs, a roots vector whose
/// length differs from `total_slots` and more messages than slots are errors.
pub fn dc_run_simple<'a, I>(
    my_msgs: &[DcMessage],
    my_hashes: &[u64],
    roots: &[u64],
    total_slots: usize,
    max_slots: usize,
    cloaks: I,
) -> Result<DcSimpleOutput, CryptoError>
where
    I: IntoIterator<Item = (PeerId, &'a mut DiceMixRng)>,
{
    if total_slots > max_slots {
        return Err(CryptoError::TooManyMessages(total_slots, max_slots));
    }
    if roots.len() != total_slots {
        return Err(CryptoError::RootCountMismatch(total_slots, roots.len()));
    }

    let (resolved, my_ok) = dc_obtain_slots(my_hashes, roots);
    let slots: Vec<usize> = if my_ok {
        resolved.into_iter().flatten().collect()
    } else {
        warn!("Some of my messages are missing from the roots, using fallback slots");
        (0..my_msgs.len()).collect()
    };

    let vector = dc_simple_vector(my_msgs, &slots, total_slots, cloaks)?;
    Ok(DcSimpleOutput {
        vector,
        my_ok,
        slots,
    })
}

/// Checks that every slot we own holds a message matching the root there.
pub fn dc_verify_proceed(my_hashes: &[u64], roots: &[u64], all_messages: &[DcMessage]) -> bool {
    let (slots, ok) = dc_obtain_slots(my_hashes, roots);
    if !ok {
        return false;
    }
    for slot in slots.into_iter().flatten() {
        let msg = match all_messages.get(slot) {
            Some(msg) => msg,
            None => return false,
        };
        if roots[slot] != reduce(short_hash(&msg[..])) {
            return false;
        }
    }
    true
}

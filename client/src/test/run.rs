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
use dicemix_crypto::field::P;
use std::sync::mpsc::channel;
use std::thread;

struct Connection {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl Connection {
    fn recv(&self) -> Request {
        let buffer = self.rx.recv_timeout(Duration::from_secs(10)).unwrap();
        SignedRequest::from_buffer(&buffer).unwrap().request().unwrap()
    }

    fn send(&self, body: ResponseBody) {
        let response = Response::new(SESSION_ID, body);
        self.tx.send(response.into_buffer().unwrap()).unwrap();
    }
}

fn spawn_client(
    timeout: Duration,
) -> (Connection, thread::JoinHandle<(Result<RunReport, DiceMixError>, bool)>) {
    let (to_relay, from_client) = channel();
    let (to_client, from_relay) = channel();
    let handle = thread::spawn(move || {
        let mut transport = ChannelTransport {
            tx: to_relay,
            rx: from_relay,
            timeout,
            closed: false,
        };
        let cfg = ClientConfig::default();
        let mut client = DiceMixClient::new(cfg, SigningKeyPair::generate()).unwrap();
        let result = client.run(&mut transport);
        (result, transport.closed)
    });
    let conn = Connection {
        tx: to_client,
        rx: from_client,
    };
    (conn, handle)
}

/// Roots of x + y = s1, x^2 + y^2 = s2.
fn solve_two(s1: Fe, s2: Fe) -> Vec<u64> {
    let two = Fe::new(2);
    let inv2 = two.pow(P - 2);
    // (x - y)^2
    let disc = two * s2 - s1 * s1;
    // P = 3 (mod 4)
    let r = disc.pow((P + 1) / 4);
    assert_eq!(r * r, disc);
    let mut roots = vec![((s1 + r) * inv2).value(), ((s1 - r) * inv2).value()];
    roots.sort();
    roots
}

/// A relay for two single-message clients.
fn relay(conns: &[Connection]) -> Vec<DcMessage> {
    for (i, conn) in conns.iter().enumerate() {
        assert_eq!(conn.recv().body, RequestBody::Join);
        conn.send(ResponseBody::Join { id: id(i) });
    }
    for conn in conns {
        assert_matches::assert_matches!(conn.recv().body, RequestBody::Ltpk { .. });
    }

    let peers: Vec<PeerInfo> = (0..conns.len()).map(|i| PeerInfo::new(id(i))).collect();
    for conn in conns {
        conn.send(ResponseBody::StartDiceMix {
            peers: peers.clone(),
        });
    }
    let mut infos = peers;
    for (i, conn) in conns.iter().enumerate() {
        match conn.recv().body {
            RequestBody::KeyExchange { pkey, num_msgs } => {
                infos[i].pkey = pkey;
                infos[i].num_msgs = num_msgs;
            }
            body => panic!("expected KeyExchange, got {:?}", body),
        }
    }

    for conn in conns {
        conn.send(ResponseBody::KeyExchange {
            peers: infos.clone(),
        });
    }
    let requests: Vec<Request> = conns.iter().map(Connection::recv).collect();
    let exp = combine_exp(&requests);
    let roots = solve_two(exp[0], exp[1]);

    for conn in conns {
        conn.send(ResponseBody::DcExp {
            roots: roots.clone(),
        });
    }
    let mut messages = vec![[0u8; MESSAGE_SIZE]; 2];
    for (i, conn) in conns.iter().enumerate() {
        match conn.recv().body {
            RequestBody::DcSimple {
                dc_simple_vector,
                my_ok,
                ..
            } => {
                assert!(my_ok);
                for (m, v) in messages.iter_mut().zip(dc_simple_vector.iter()) {
                    xor_bytes(&mut m[..], &v[..]);
                }
                infos[i].dc_simple_vector = dc_simple_vector;
                infos[i].ok = my_ok;
            }
            body => panic!("expected DcSimple, got {:?}", body),
        }
    }

    for conn in conns {
        conn.send(ResponseBody::DcSimple {
            peers: infos.clone(),
            messages: messages.clone(),
        });
    }
    for conn in conns {
        assert_eq!(
            conn.recv().body,
            RequestBody::Confirmation { confirmation: true }
        );
    }
    for conn in conns {
        conn.send(ResponseBody::TxDone);
    }
    messages
}

#[test]
fn run_over_transport() {
    init_logger();
    let timeout = Duration::from_secs(10);
    let (conn1, client1) = spawn_client(timeout);
    let (conn2, client2) = spawn_client(timeout);

    let messages = relay(&[conn1, conn2]);

    for (i, handle) in vec![client1, client2].into_iter().enumerate() {
        let (result, closed) = handle.join().unwrap();
        let report = result.unwrap();
        assert!(closed);
        assert_eq!(report.my_id, id(i));
        assert_eq!(report.messages, messages);
        assert!(report.confirmed);
    }
    assert_ne!(messages[0], messages[1]);
}

#[test]
fn silent_relay_times_out() {
    init_logger();
    let (conn, client) = spawn_client(Duration::from_millis(50));
    assert_eq!(conn.recv().body, RequestBody::Join);
    let (result, closed) = client.join().unwrap();
    assert_matches::assert_matches!(result, Err(DiceMixError::Timeout));
    assert!(closed);
}

#[test]
fn relay_hangs_up() {
    init_logger();
    let (conn, client) = spawn_client(Duration::from_secs(10));
    assert_eq!(conn.recv().body, RequestBody::Join);
    drop(conn);
    let (result, closed) = client.join().unwrap();
    assert_matches::assert_matches!(result, Err(DiceMixError::ConnectionClosed(_)));
    assert!(closed);
}

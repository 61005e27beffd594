/*!
 * Socket Tests
 * Listener/connect rendezvous and connected peer I/O
 */

use super::common::{eventually, kernel_with, run};
use coop_kernel::{
    ErrorKind, KernelConfig, PipeEnd, PipeError, ShutdownMode, SocketError, SocketState,
    SyscallContext, SyscallError,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const PORT: u16 = 80;

#[test]
fn test_rendezvous_is_full_duplex() {
    let heard = Arc::new(Mutex::new(Vec::<String>::new()));
    let server_log = Arc::clone(&heard);
    let client_log = Arc::clone(&heard);

    let status = run(move |ctx: &SyscallContext, _| {
        let listener = ctx.socket(PORT).unwrap();
        ctx.listen(listener).unwrap();

        let client = ctx
            .exec(
                move |ctx: &SyscallContext, _| {
                    let sock = ctx.socket(0).unwrap();
                    ctx.connect(sock, PORT, None).unwrap();
                    ctx.write(sock, b"ping").unwrap();

                    let mut buf = [0u8; 4];
                    ctx.read(sock, &mut buf).unwrap();
                    client_log.lock().push(String::from_utf8_lossy(&buf).into_owned());
                    0
                },
                Vec::new(),
            )
            .unwrap();

        let peer = ctx.accept(listener).unwrap();
        let mut buf = [0u8; 4];
        ctx.read(peer, &mut buf).unwrap();
        server_log.lock().push(String::from_utf8_lossy(&buf).into_owned());
        ctx.write(peer, b"pong").unwrap();

        assert_eq!(ctx.socket_stats(peer).unwrap().state, SocketState::Peer);
        assert_eq!(ctx.wait_child(Some(client)).unwrap(), (client, 0));
        0
    });

    assert_eq!(status, 0);
    assert_eq!(*heard.lock(), vec!["ping".to_string(), "pong".to_string()]);
}

#[test]
fn test_connections_do_not_cross_talk() {
    let status = run(|ctx: &SyscallContext, _| {
        let listener = ctx.socket(PORT).unwrap();
        ctx.listen(listener).unwrap();

        let mut clients = Vec::new();
        for tag in [b'a', b'b'] {
            let client = ctx
                .create_thread(
                    move |ctx: &SyscallContext, _| {
                        let sock = ctx.socket(0).unwrap();
                        ctx.connect(sock, PORT, None).unwrap();
                        ctx.write(sock, &[tag; 3]).unwrap();
                        let mut buf = [0u8; 3];
                        ctx.read(sock, &mut buf).unwrap();
                        (buf == [tag.to_ascii_uppercase(); 3]) as i32
                    },
                    Vec::new(),
                )
                .unwrap();
            clients.push(client);
        }

        for _ in 0..2 {
            let peer = ctx.accept(listener).unwrap();
            let mut buf = [0u8; 3];
            ctx.read(peer, &mut buf).unwrap();
            ctx.write(peer, &[buf[0].to_ascii_uppercase(); 3]).unwrap();
        }

        clients
            .into_iter()
            .map(|tid| ctx.thread_join(tid).unwrap())
            .sum::<i32>()
            - 2
    });
    assert_eq!(status, 0);
}

#[test]
fn test_requests_admitted_in_fifo_order() {
    let status = run(|ctx: &SyscallContext, _| {
        let listener = ctx.socket(PORT).unwrap();
        ctx.listen(listener).unwrap();

        let mut clients = Vec::new();
        for i in 0..3u8 {
            let client = ctx
                .create_thread(
                    move |ctx: &SyscallContext, _| {
                        let sock = ctx.socket(0).unwrap();
                        ctx.connect(sock, PORT, None).unwrap();
                        ctx.write(sock, &[i]).unwrap();
                        0
                    },
                    Vec::new(),
                )
                .unwrap();
            clients.push(client);
            // queue them one at a time so enqueue order is known
            let queued = usize::from(i) + 1;
            assert!(eventually(|| ctx.socket_stats(listener).unwrap().pending == queued));
        }

        let mut order = Vec::new();
        for _ in 0..3 {
            let peer = ctx.accept(listener).unwrap();
            let mut byte = [0u8; 1];
            ctx.read(peer, &mut byte).unwrap();
            order.push(byte[0]);
        }
        assert_eq!(order, vec![0, 1, 2]);

        for client in clients {
            assert_eq!(ctx.thread_join(client).unwrap(), 0);
        }
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_connect_timeout_leaves_no_residue() {
    let status = run(|ctx: &SyscallContext, _| {
        let listener = ctx.socket(PORT).unwrap();
        ctx.listen(listener).unwrap();

        let sock = ctx.socket(0).unwrap();
        let err = ctx
            .connect(sock, PORT, Some(Duration::from_millis(50)))
            .unwrap_err();
        assert!(matches!(err, SyscallError::Socket(SocketError::TimedOut { .. })));
        assert_eq!(err.kind(), ErrorKind::PeerGone);

        assert_eq!(ctx.socket_stats(listener).unwrap().pending, 0);
        assert_eq!(ctx.kernel().stats().pending_requests, 0);

        // the socket is reusable after the failed attempt
        let stats = ctx.socket_stats(sock).unwrap();
        assert_eq!(stats.state, SocketState::Unbound);
        assert_eq!(stats.refcount, 0);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_listen_port_is_exclusive() {
    let status = run(|ctx: &SyscallContext, _| {
        let first = ctx.socket(9).unwrap();
        let second = ctx.socket(9).unwrap();
        ctx.listen(first).unwrap();
        assert_eq!(
            ctx.listen(second).unwrap_err(),
            SyscallError::Socket(SocketError::PortInUse(9))
        );

        ctx.close(first).unwrap();
        ctx.listen(second).unwrap();
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_port_bounds() {
    let status = run(|ctx: &SyscallContext, _| {
        let unbound = ctx.socket(0).unwrap();
        assert_eq!(
            ctx.listen(unbound).unwrap_err(),
            SyscallError::Socket(SocketError::InvalidPort(0))
        );

        let err = ctx.socket(5000).unwrap_err();
        assert_eq!(err, SyscallError::Socket(SocketError::InvalidPort(5000)));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        assert_eq!(
            ctx.connect(unbound, 81, None).unwrap_err(),
            SyscallError::Socket(SocketError::NoListener(81))
        );
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_accept_fails_when_listener_closes() {
    let status = run(|ctx: &SyscallContext, _| {
        let listener = ctx.socket(PORT).unwrap();
        ctx.listen(listener).unwrap();

        let acceptor = ctx
            .create_thread(
                move |ctx: &SyscallContext, _| match ctx.accept(listener) {
                    Err(SyscallError::Socket(SocketError::ListenerClosed(PORT))) => 0,
                    _ => 1,
                },
                Vec::new(),
            )
            .unwrap();

        assert!(eventually(|| ctx.socket_stats(listener).unwrap().refcount == 1));
        ctx.close(listener).unwrap();

        assert_eq!(ctx.thread_join(acceptor).unwrap(), 0);
        assert_eq!(ctx.kernel().stats().sockets, 0);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_pending_connect_fails_when_listener_closes() {
    let status = run(|ctx: &SyscallContext, _| {
        let listener = ctx.socket(PORT).unwrap();
        ctx.listen(listener).unwrap();

        let connector = ctx
            .create_thread(
                move |ctx: &SyscallContext, _| {
                    let sock = ctx.socket(0).unwrap();
                    match ctx.connect(sock, PORT, None) {
                        Err(e) if e.kind() == ErrorKind::PeerGone => 0,
                        _ => 1,
                    }
                },
                Vec::new(),
            )
            .unwrap();

        assert!(eventually(|| ctx.socket_stats(listener).unwrap().pending == 1));
        ctx.close(listener).unwrap();

        assert_eq!(ctx.thread_join(connector).unwrap(), 0);
        assert_eq!(ctx.kernel().stats().pending_requests, 0);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_shutdown_write_gives_peer_eof() {
    let status = run(|ctx: &SyscallContext, _| {
        let listener = ctx.socket(PORT).unwrap();
        ctx.listen(listener).unwrap();

        let client = ctx
            .create_thread(
                move |ctx: &SyscallContext, _| {
                    let sock = ctx.socket(0).unwrap();
                    ctx.connect(sock, PORT, None).unwrap();
                    ctx.write(sock, b"bye").unwrap();
                    ctx.shutdown(sock, ShutdownMode::Write).unwrap();
                    match ctx.write(sock, b"more") {
                        Err(SyscallError::Socket(SocketError::Shutdown(_))) => 0,
                        _ => 1,
                    }
                },
                Vec::new(),
            )
            .unwrap();

        let peer = ctx.accept(listener).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(ctx.read(peer, &mut buf).unwrap(), 3);
        assert_eq!(ctx.read(peer, &mut buf).unwrap(), 0);
        assert_eq!(ctx.thread_join(client).unwrap(), 0);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_closing_peer_breaks_partner_writes() {
    let status = run(|ctx: &SyscallContext, _| {
        let listener = ctx.socket(PORT).unwrap();
        ctx.listen(listener).unwrap();

        let pipe = ctx.pipe().unwrap();
        let client = ctx
            .create_thread(
                move |ctx: &SyscallContext, _| {
                    let sock = ctx.socket(0).unwrap();
                    ctx.connect(sock, PORT, None).unwrap();
                    // wait for the acceptor to hang up
                    let mut token = [0u8; 1];
                    ctx.read(pipe.read, &mut token).unwrap();
                    match ctx.write(sock, b"anyone?") {
                        Err(e) if e.kind() == ErrorKind::PeerGone => 0,
                        _ => 1,
                    }
                },
                Vec::new(),
            )
            .unwrap();

        let peer = ctx.accept(listener).unwrap();
        ctx.close(peer).unwrap();
        ctx.write(pipe.write, b"!").unwrap();

        assert_eq!(ctx.thread_join(client).unwrap(), 0);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_io_requires_connected_peer() {
    let status = run(|ctx: &SyscallContext, _| {
        let sock = ctx.socket(0).unwrap();
        let mut buf = [0u8; 1];
        let err = ctx.read(sock, &mut buf).unwrap_err();
        assert_eq!(
            err,
            SyscallError::Socket(SocketError::InvalidState {
                expected: SocketState::Peer,
                actual: SocketState::Unbound,
            })
        );
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert!(ctx.shutdown(sock, ShutdownMode::Both).is_err());
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_blocked_reader_wakes_on_own_read_shutdown() {
    let status = run(|ctx: &SyscallContext, _| {
        let listener = ctx.socket(PORT).unwrap();
        ctx.listen(listener).unwrap();

        // the connector's socket stays open, so only the shutdown can wake the reader
        let client = ctx
            .create_thread(
                move |ctx: &SyscallContext, _| {
                    let sock = ctx.socket(0).unwrap();
                    ctx.connect(sock, PORT, None).unwrap();
                    0
                },
                Vec::new(),
            )
            .unwrap();
        let peer = ctx.accept(listener).unwrap();
        assert_eq!(ctx.thread_join(client).unwrap(), 0);

        let reader = ctx
            .create_thread(
                move |ctx: &SyscallContext, _| {
                    let mut buf = [0u8; 8];
                    match ctx.read(peer, &mut buf) {
                        Err(SyscallError::Socket(SocketError::Pipe(PipeError::EndClosed(
                            PipeEnd::Read,
                        )))) => 0,
                        _ => 1,
                    }
                },
                Vec::new(),
            )
            .unwrap();

        std::thread::sleep(Duration::from_millis(50));
        ctx.shutdown(peer, ShutdownMode::Read).unwrap();

        assert_eq!(ctx.thread_join(reader).unwrap(), 0);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_accept_keeps_request_queued_when_fids_run_out() {
    // listener, connector socket and one filler fill the table
    let kernel = kernel_with(KernelConfig::default().with_max_fileid(3));
    let status = kernel
        .boot(
            |ctx: &SyscallContext, _| {
                let listener = ctx.socket(PORT).unwrap();
                ctx.listen(listener).unwrap();

                let client = ctx
                    .create_thread(
                        move |ctx: &SyscallContext, _| {
                            let sock = ctx.socket(0).unwrap();
                            ctx.connect(sock, PORT, None).unwrap();
                            ctx.write(sock, b"x").unwrap();
                            0
                        },
                        Vec::new(),
                    )
                    .unwrap();
                assert!(eventually(|| ctx.socket_stats(listener).unwrap().pending == 1));

                let filler = ctx.socket(0).unwrap();
                let err = ctx.accept(listener).unwrap_err();
                assert!(matches!(
                    err,
                    SyscallError::Socket(SocketError::Descriptor(_))
                ));
                assert_eq!(err.kind(), ErrorKind::ResourceExhausted);
                assert_eq!(ctx.socket_stats(listener).unwrap().pending, 1);

                ctx.close(filler).unwrap();
                let peer = ctx.accept(listener).unwrap();
                let mut byte = [0u8; 1];
                assert_eq!(ctx.read(peer, &mut byte).unwrap(), 1);
                assert_eq!(&byte, b"x");

                assert_eq!(ctx.thread_join(client).unwrap(), 0);
                0
            },
            Vec::new(),
        )
        .unwrap();
    assert_eq!(status, 0);
}

#[test]
fn test_closed_connector_is_refused_and_skipped() {
    let status = run(|ctx: &SyscallContext, _| {
        let listener = ctx.socket(PORT).unwrap();
        ctx.listen(listener).unwrap();

        let doomed = ctx.socket(0).unwrap();
        let first = ctx
            .create_thread(
                move |ctx: &SyscallContext, _| match ctx.connect(doomed, PORT, None) {
                    Err(SyscallError::Socket(SocketError::Refused)) => 0,
                    _ => 1,
                },
                Vec::new(),
            )
            .unwrap();
        assert!(eventually(|| ctx.socket_stats(listener).unwrap().pending == 1));

        let second = ctx
            .create_thread(
                move |ctx: &SyscallContext, _| {
                    let sock = ctx.socket(0).unwrap();
                    ctx.connect(sock, PORT, None).unwrap();
                    ctx.write(sock, b"b").unwrap();
                    0
                },
                Vec::new(),
            )
            .unwrap();
        assert!(eventually(|| ctx.socket_stats(listener).unwrap().pending == 2));

        ctx.close(doomed).unwrap();
        assert_eq!(ctx.thread_join(first).unwrap(), 0);

        let peer = ctx.accept(listener).unwrap();
        let mut byte = [0u8; 1];
        ctx.read(peer, &mut byte).unwrap();
        assert_eq!(&byte, b"b");
        assert_eq!(ctx.thread_join(second).unwrap(), 0);
        assert_eq!(ctx.kernel().stats().pending_requests, 0);
        0
    });
    assert_eq!(status, 0);
}

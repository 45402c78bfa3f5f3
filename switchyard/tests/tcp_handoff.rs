#![cfg(unix)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use switchyard::Command;

#[test]
fn tcp_handoff_with_peek() {
    let pipe_path = std::env::temp_dir().join(format!("switchyard-tcp-{}", std::process::id()));
    std::fs::remove_file(&pipe_path).ok();

    let tcp_listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let tcp_addr = tcp_listener.local_addr().unwrap();

    let ipc_listener = switchyard::listen(&pipe_path, 1 << 20).unwrap();

    // The IPC receiver: gets the handed-off TCP connection and reads the
    // full reconstructed stream, then echoes it back.
    let receiver = thread::spawn(move || {
        let mut conn = ipc_listener.accept().unwrap();
        assert_eq!(conn.receive_command().unwrap(), Command::TCPConn);
        let (mut tcp, extra) = conn.receive_tcp().unwrap();
        assert!(extra);
        let msg = conn.receive_data().unwrap();
        assert_eq!(msg, b"message");

        let mut buf = [0u8; 14];
        let mut read = 0;
        while read < buf.len() {
            read += tcp.read(&mut buf[read..]).unwrap();
        }
        tcp.write(&buf).unwrap();
        buf
    });

    // The external TCP client: connects, sends the body, then reads the
    // echo back once the handoff has happened.
    let client = thread::spawn(move || {
        let mut stream = TcpStream::connect(tcp_addr).unwrap();
        stream.write_all(b"1:this-is-body").unwrap();
        let mut echoed = [0u8; 14];
        stream.read_exact(&mut echoed).unwrap();
        echoed
    });

    // The "gateway" role: accepts the external TCP connection, peeks (reads)
    // the first two bytes, and hands the rest off over the pipe.
    let (accepted, _) = tcp_listener.accept().unwrap();
    let mut peeked = [0u8; 2];
    let mut accepted_for_read = accepted.try_clone().unwrap();
    accepted_for_read.read_exact(&mut peeked).unwrap();
    assert_eq!(&peeked, b"1:");

    thread::sleep(std::time::Duration::from_millis(20));
    let mut dialer = switchyard::dial(&pipe_path, 1 << 20).unwrap();
    dialer.send_tcp(accepted, &peeked, b"message").unwrap();

    let seen_by_receiver = receiver.join().unwrap();
    assert_eq!(&seen_by_receiver, b"1:this-is-body");

    let echoed = client.join().unwrap();
    assert_eq!(&echoed, b"1:this-is-body");
}

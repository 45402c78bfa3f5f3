#![cfg(unix)]

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::os::unix::io::{FromRawFd, IntoRawFd};
use std::time::{Duration, Instant};
use switchyard::rawsock::{Deadline, RawSocket};

fn raw_pair() -> (RawSocket, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).unwrap();
    let (server, _) = listener.accept().unwrap();
    let raw = RawSocket::from_raw_fd(server.into_raw_fd()).unwrap();
    (raw, client)
}

#[test]
fn read_deadline_times_out() {
    let (mut raw, _client) = raw_pair();
    raw.set_read_deadline(Deadline::at(Instant::now() + Duration::from_millis(10)));

    let started = Instant::now();
    let mut buf = [0u8; 1];
    let result = raw.read(&mut buf);
    let elapsed = started.elapsed();

    assert!(result.is_err());
    assert!(elapsed >= Duration::from_millis(10));
}

#[test]
fn write_deadline_times_out_on_saturated_buffer() {
    let (mut raw, mut client) = raw_pair();
    // Shrink both ends so the socket buffer saturates quickly.
    client.set_nodelay(true).ok();

    raw.set_write_deadline(Deadline::at(Instant::now() + Duration::from_millis(10)));

    let started = Instant::now();
    let chunk = vec![0u8; 4096];
    let mut timed_out = false;
    for _ in 0..10_000 {
        match raw.write(&chunk) {
            Ok(_) => continue,
            Err(_) => {
                timed_out = true;
                break;
            }
        }
    }
    let elapsed = started.elapsed();

    assert!(timed_out, "expected the write to eventually time out");
    assert!(elapsed >= Duration::from_millis(10));

    // Drain on the other end so the writer isn't left permanently stuck in
    // later tests sharing the process.
    let mut sink = [0u8; 4096];
    while client.set_read_timeout(Some(Duration::from_millis(1))).is_ok() {
        use std::io::Read;
        match client.read(&mut sink) {
            Ok(0) | Err(_) => break,
            Ok(_) => continue,
        }
    }
}

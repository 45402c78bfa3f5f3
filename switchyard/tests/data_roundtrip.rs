#![cfg(unix)]

use std::thread;
use switchyard::Command;

#[test]
fn data_round_trip() {
    let path = tempfile::Builder::new()
        .prefix("switchyard-data-")
        .tempfile()
        .unwrap()
        .path()
        .to_path_buf();
    std::fs::remove_file(&path).ok();

    let listener = switchyard::listen(&path, 1 << 20).unwrap();
    let server_path = path.clone();
    let server = thread::spawn(move || {
        let mut conn = listener.accept().unwrap();
        assert_eq!(conn.receive_command().unwrap(), Command::Data);
        conn.receive_data().unwrap()
    });

    // Give the listener a moment to bind before dialing.
    thread::sleep(std::time::Duration::from_millis(20));
    let mut client = switchyard::dial(&server_path, 1 << 20).unwrap();
    client.send_data(&[1, 2, 3]).unwrap();

    let received = server.join().unwrap();
    assert_eq!(received, vec![1, 2, 3]);
}

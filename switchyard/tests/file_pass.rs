#![cfg(unix)]

use std::io::{Read, Seek, SeekFrom, Write};
use std::thread;
use switchyard::Command;

#[test]
fn file_pass_with_message() {
    let pipe_path = std::env::temp_dir().join(format!("switchyard-file-{}", std::process::id()));
    std::fs::remove_file(&pipe_path).ok();

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(b"1234567890").unwrap();
    tmp.flush().unwrap();
    let tmp_path = tmp.path().to_path_buf();
    let tmp_name = tmp_path.file_name().unwrap().to_string_lossy().into_owned();

    let listener = switchyard::listen(&pipe_path, 1 << 20).unwrap();
    let server = thread::spawn(move || {
        let mut conn = listener.accept().unwrap();
        assert_eq!(conn.receive_command().unwrap(), Command::File);
        let (mut file, name, extra) = conn.receive_file().unwrap();
        assert!(extra);
        let msg = conn.receive_data().unwrap();

        let mut contents = String::new();
        file.seek(SeekFrom::Start(0)).unwrap();
        file.read_to_string(&mut contents).unwrap();
        (contents, name, msg)
    });

    thread::sleep(std::time::Duration::from_millis(20));
    let mut client = switchyard::dial(&pipe_path, 1 << 20).unwrap();
    let file = std::fs::File::open(&tmp_path).unwrap();
    client.send_file(file, &tmp_name, &[1, 2, 3, 4]).unwrap();

    let (contents, name, msg) = server.join().unwrap();
    assert_eq!(contents, "1234567890");
    assert_eq!(name, tmp_name);
    assert_eq!(msg, vec![1, 2, 3, 4]);
}

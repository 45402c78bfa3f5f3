//! Handle-duplication descriptor passing for `File` on Windows: rather than
//! an out-of-band ancillary message, the sender duplicates its handle
//! directly into the receiver's process (found via the PID exchanged at
//! connect time) and carries the resulting handle value as a cookie in the
//! metadata frame.

use crate::codec::{read_bool, read_bytes, read_len, write_bool, write_bytes, write_with_length};
use crate::error::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{Read, Write};
use std::os::windows::io::{AsRawHandle, FromRawHandle, RawHandle};
use windows_sys::Win32::Foundation::{CloseHandle, DUPLICATE_SAME_ACCESS, HANDLE};
use windows_sys::Win32::System::Threading::{OpenProcess, PROCESS_DUP_HANDLE};

struct FileMetaWin {
    handle_cookie: u64,
    name: String,
    extra: bool,
}

impl FileMetaWin {
    fn serialize<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u64::<BigEndian>(self.handle_cookie)?;
        write_bytes(w, self.name.as_bytes())?;
        write_bool(w, self.extra)?;
        Ok(())
    }

    fn deserialize<R: Read>(r: &mut R, max_len: u32) -> Result<FileMetaWin> {
        let handle_cookie = r.read_u64::<BigEndian>()?;
        let name_bytes = read_bytes(r, max_len)?;
        let name = String::from_utf8_lossy(&name_bytes).into_owned();
        let extra = read_bool(r)?;
        Ok(FileMetaWin {
            handle_cookie,
            name,
            extra,
        })
    }
}

pub fn send<P: Read + Write>(
    pipe: &mut P,
    file: File,
    name: &str,
    extra: &[u8],
    peer_pid: u32,
) -> Result<()> {
    let duplicated = duplicate_into(peer_pid, file.as_raw_handle() as HANDLE)?;
    let meta = FileMetaWin {
        handle_cookie: duplicated as u64,
        name: name.to_string(),
        extra: !extra.is_empty(),
    };
    let mut payload = Vec::new();
    write_with_length(&mut payload, |buf| meta.serialize(buf))?;
    pipe.write_all(&payload)?;
    drop(file);

    if meta.extra {
        write_bytes(pipe, extra)?;
    }
    Ok(())
}

pub fn receive<P: Read + Write>(pipe: &mut P, max_len: u32) -> Result<(File, String, bool)> {
    let len = read_len(pipe, max_len)?;
    let mut buf = vec![0u8; len as usize];
    crate::codec::read_all(pipe, &mut buf)?;
    let meta = FileMetaWin::deserialize(&mut &buf[..], max_len)?;
    let handle = meta.handle_cookie as RawHandle;
    let file = unsafe { File::from_raw_handle(handle) };
    Ok((file, meta.name, meta.extra))
}

/// Open `peer_pid` with `PROCESS_DUP_HANDLE` and duplicate `handle` into it
/// with the same access rights; the resulting value is only meaningful in
/// the peer's handle table.
fn duplicate_into(peer_pid: u32, handle: HANDLE) -> Result<HANDLE> {
    unsafe {
        let target_process = OpenProcess(PROCESS_DUP_HANDLE, 0, peer_pid);
        if target_process == 0 {
            return Err(Error::System(std::io::Error::last_os_error()));
        }
        let current_process = windows_sys::Win32::System::Threading::GetCurrentProcess();
        let mut duplicated: HANDLE = 0;
        let ok = windows_sys::Win32::Foundation::DuplicateHandle(
            current_process,
            handle,
            target_process,
            &mut duplicated,
            0,
            0,
            DUPLICATE_SAME_ACCESS,
        );
        CloseHandle(target_process);
        if ok == 0 {
            return Err(Error::System(std::io::Error::last_os_error()));
        }
        Ok(duplicated)
    }
}

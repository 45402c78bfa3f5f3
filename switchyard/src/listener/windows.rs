//! Named pipe transport for Windows, plus the PID exchange that handle
//! duplication needs: each side must know the other's process id before any
//! descriptor can be duplicated across the pipe.

use crate::error::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use std::os::windows::ffi::OsStrExt;
use std::os::windows::io::{AsRawHandle, FromRawHandle, RawHandle};
use std::path::Path;
use windows_sys::Win32::Foundation::{CloseHandle, GetLastError, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, ReadFile, WriteFile, FILE_FLAG_OVERLAPPED, FILE_GENERIC_READ, FILE_GENERIC_WRITE,
    OPEN_EXISTING,
};
use windows_sys::Win32::System::Pipes::{
    ConnectNamedPipe, CreateNamedPipeW, PIPE_ACCESS_DUPLEX, PIPE_READMODE_BYTE,
    PIPE_TYPE_BYTE, PIPE_UNLIMITED_INSTANCES, PIPE_WAIT,
};
use windows_sys::Win32::System::Threading::GetCurrentProcessId;

const BUF_SIZE: u32 = 65536;

/// A connected named pipe instance, read/written synchronously via
/// `ReadFile`/`WriteFile`.
pub struct Pipe {
    handle: HANDLE,
}

unsafe impl Send for Pipe {}

impl Read for Pipe {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut read = 0u32;
        let ok = unsafe {
            ReadFile(
                self.handle,
                buf.as_mut_ptr(),
                buf.len() as u32,
                &mut read,
                std::ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(read as usize)
    }
}

impl Write for Pipe {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut written = 0u32;
        let ok = unsafe {
            WriteFile(
                self.handle,
                buf.as_ptr(),
                buf.len() as u32,
                &mut written,
                std::ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(written as usize)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl AsRawHandle for Pipe {
    fn as_raw_handle(&self) -> RawHandle {
        self.handle as RawHandle
    }
}

impl FromRawHandle for Pipe {
    unsafe fn from_raw_handle(handle: RawHandle) -> Pipe {
        Pipe {
            handle: handle as HANDLE,
        }
    }
}

impl Drop for Pipe {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.handle);
        }
    }
}

pub struct Listener {
    path: Vec<u16>,
}

pub fn listen<P: AsRef<Path>>(path: P) -> Result<Listener> {
    Ok(Listener {
        path: wide_pipe_path(path),
    })
}

impl Listener {
    /// Each call creates (and, after a client connects, hands off) one pipe
    /// instance; a fresh instance is created for the next caller.
    pub fn accept(&self) -> Result<(Pipe, u32)> {
        let handle = unsafe {
            CreateNamedPipeW(
                self.path.as_ptr(),
                PIPE_ACCESS_DUPLEX,
                PIPE_TYPE_BYTE | PIPE_READMODE_BYTE | PIPE_WAIT,
                PIPE_UNLIMITED_INSTANCES,
                BUF_SIZE,
                BUF_SIZE,
                0,
                std::ptr::null(),
            )
        };
        if handle == INVALID_HANDLE_VALUE {
            return Err(Error::System(std::io::Error::last_os_error()));
        }
        let connected = unsafe { ConnectNamedPipe(handle, std::ptr::null_mut()) };
        if connected == 0 {
            let err = unsafe { GetLastError() };
            const ERROR_PIPE_CONNECTED: u32 = 535;
            if err != ERROR_PIPE_CONNECTED {
                return Err(Error::System(std::io::Error::last_os_error()));
            }
        }
        let mut pipe = Pipe { handle };
        let peer_pid = recv_send_pid(&mut pipe)?;
        Ok((pipe, peer_pid))
    }

    pub fn close(self) -> Result<()> {
        Ok(())
    }
}

pub fn dial<P: AsRef<Path>>(path: P) -> Result<(Pipe, u32)> {
    let wide = wide_pipe_path(path);
    let handle = unsafe {
        CreateFileW(
            wide.as_ptr(),
            FILE_GENERIC_READ | FILE_GENERIC_WRITE,
            0,
            std::ptr::null(),
            OPEN_EXISTING,
            FILE_FLAG_OVERLAPPED,
            0,
        )
    };
    if handle == INVALID_HANDLE_VALUE {
        return Err(Error::System(std::io::Error::last_os_error()));
    }
    let mut pipe = Pipe { handle };
    let peer_pid = send_recv_pid(&mut pipe)?;
    Ok((pipe, peer_pid))
}

fn wide_pipe_path<P: AsRef<Path>>(name: P) -> Vec<u16> {
    let full = format!(r"\\.\pipe\{}", name.as_ref().display());
    std::ffi::OsStr::new(&full)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// Dialer writes its PID first, then reads the listener's.
fn send_recv_pid(pipe: &mut Pipe) -> Result<u32> {
    let my_pid = unsafe { GetCurrentProcessId() };
    pipe.write_u32::<BigEndian>(my_pid)?;
    Ok(pipe.read_u32::<BigEndian>()?)
}

/// Listener side reads the dialer's PID first, then writes its own.
fn recv_send_pid(pipe: &mut Pipe) -> Result<u32> {
    let peer_pid = pipe.read_u32::<BigEndian>()?;
    let my_pid = unsafe { GetCurrentProcessId() };
    pipe.write_u32::<BigEndian>(my_pid)?;
    Ok(peer_pid)
}

//! The framed control connection over the local pipe: one command byte,
//! then a command-specific payload. Concurrent calls from two threads
//! against the same `Conn` are not supported -- callers are expected to
//! already have a single reader and a single writer per direction.

use crate::codec::{read_bytes, write_bytes};
use crate::command::Command;
use crate::error::Result;
use crate::gateway::{FileGateway, SocketGateway};
use crate::listener::Pipe;
use crate::tcpconn::TcpConn;
use slog::{debug, o, Discard, Logger};
use std::fs::File;
use std::io::{Read, Write};
use std::net::TcpStream;

pub struct Conn {
    pipe: Pipe,
    file_gw: FileGateway,
    sock_gw: SocketGateway,
    max_frame_len: u32,
    log: Logger,
}

impl Conn {
    pub(crate) fn new(pipe: Pipe, peer_pid: Option<u32>, max_frame_len: u32) -> Conn {
        Conn {
            pipe,
            file_gw: FileGateway::new(peer_pid),
            sock_gw: SocketGateway::new(peer_pid),
            max_frame_len,
            log: Logger::root(Discard, o!()),
        }
    }

    pub fn set_logger(&mut self, log: Logger) {
        self.log = log;
    }

    pub fn send_data(&mut self, data: &[u8]) -> Result<()> {
        Command::Data.write(&mut self.pipe)?;
        write_bytes(&mut self.pipe, data)?;
        debug!(self.log, "sent data frame"; "len" => data.len());
        Ok(())
    }

    pub fn receive_data_len(&mut self) -> Result<u32> {
        crate::codec::read_len(&mut self.pipe, self.max_frame_len)
    }

    pub fn receive_data(&mut self) -> Result<Vec<u8>> {
        let data = read_bytes(&mut self.pipe, self.max_frame_len)?;
        debug!(self.log, "received data frame"; "len" => data.len());
        Ok(data)
    }

    pub fn send_file(&mut self, file: File, name: &str, msg: &[u8]) -> Result<()> {
        Command::File.write(&mut self.pipe)?;
        self.file_gw.send(&mut self.pipe, file, name, msg)?;
        debug!(self.log, "sent file"; "name" => name, "extra_len" => msg.len());
        Ok(())
    }

    pub fn receive_file(&mut self) -> Result<(File, String, bool)> {
        let (file, name, extra) = self.file_gw.receive(&mut self.pipe, self.max_frame_len)?;
        debug!(self.log, "received file"; "name" => &name, "extra" => extra);
        Ok((file, name, extra))
    }

    pub fn send_tcp(&mut self, conn: TcpStream, peeked: &[u8], msg: &[u8]) -> Result<()> {
        Command::TCPConn.write(&mut self.pipe)?;
        self.sock_gw.send(&mut self.pipe, conn, peeked, msg)?;
        debug!(self.log, "sent tcp conn"; "peeked_len" => peeked.len(), "extra_len" => msg.len());
        Ok(())
    }

    pub fn receive_tcp(&mut self) -> Result<(TcpConn, bool)> {
        let (conn, extra) = self.sock_gw.receive(&mut self.pipe, self.max_frame_len)?;
        debug!(self.log, "received tcp conn"; "extra" => extra);
        Ok((conn, extra))
    }

    pub fn receive_command(&mut self) -> Result<Command> {
        Command::read(&mut self.pipe)
    }

    pub fn close(self) -> Result<()> {
        Ok(())
    }
}

impl Read for Conn {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.pipe.read(buf)
    }
}

impl Write for Conn {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pipe.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.pipe.flush()
    }
}

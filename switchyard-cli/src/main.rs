use clap::{Parser, Subcommand};
use slog::info;
use std::fs::File;
use std::net::TcpStream;
use std::path::PathBuf;
use switchyard::{Command as IpcCommand, Config};

#[derive(Parser)]
#[command(name = "switchyard", about = "Pass files and TCP connections between processes over a local pipe")]
struct Cli {
    /// Name of the local pipe endpoint.
    #[arg(long, default_value = "switchyard")]
    pipe: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Listen on the pipe and print every frame received.
    Listen,
    /// Dial the pipe and send a file.
    SendFile {
        path: PathBuf,
        #[arg(default_value = "")]
        message: String,
    },
    /// Dial the pipe and hand off a TCP connection already established to `addr`.
    SendTcp { addr: String },
}

fn main() {
    let cli = Cli::parse();
    let cfg = Config {
        pipe_name: cli.pipe.clone(),
        ..Config::default()
    };
    let log = switchyard::logging::build(&cfg.log);

    let result = match cli.command {
        Cmd::Listen => run_listen(&cfg, &log),
        Cmd::SendFile { path, message } => run_send_file(&cfg, &path, message.as_bytes()),
        Cmd::SendTcp { addr } => run_send_tcp(&cfg, &addr),
    };

    if let Err(e) = result {
        eprintln!("switchyard: {}", e);
        std::process::exit(1);
    }
}

fn run_listen(cfg: &Config, log: &slog::Logger) -> switchyard::Result<()> {
    let listener = switchyard::listen(&cfg.pipe_name, cfg.max_frame_len)?;
    info!(log, "listening"; "pipe" => &cfg.pipe_name);
    loop {
        let mut conn = listener.accept()?;
        info!(log, "accepted connection");
        match conn.receive_command()? {
            IpcCommand::Data => {
                let data = conn.receive_data()?;
                info!(log, "received data"; "len" => data.len());
            }
            IpcCommand::File => {
                let (_file, name, extra) = conn.receive_file()?;
                info!(log, "received file"; "name" => name, "extra" => extra);
                if extra {
                    let msg = conn.receive_data()?;
                    info!(log, "received trailing message"; "len" => msg.len());
                }
            }
            IpcCommand::TCPConn => {
                let (_tcp, extra) = conn.receive_tcp()?;
                info!(log, "received tcp connection"; "extra" => extra);
                if extra {
                    let msg = conn.receive_data()?;
                    info!(log, "received trailing message"; "len" => msg.len());
                }
            }
        }
    }
}

fn run_send_file(cfg: &Config, path: &PathBuf, message: &[u8]) -> switchyard::Result<()> {
    let file = File::open(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut conn = switchyard::dial(&cfg.pipe_name, cfg.max_frame_len)?;
    conn.send_file(file, &name, message)
}

fn run_send_tcp(cfg: &Config, addr: &str) -> switchyard::Result<()> {
    let tcp = TcpStream::connect(addr)?;
    let mut conn = switchyard::dial(&cfg.pipe_name, cfg.max_frame_len)?;
    conn.send_tcp(tcp, &[], &[])
}

// Interactive client: blocking line editor multiplexed against a socket.
//
// A background thread plays the server side of a Unix socket pair: it echoes
// every line sent to it and pushes a "tick" message when the client is idle,
// so server output keeps interleaving with the prompt.

use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixStream;
use std::thread;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use ttyline::terminals::StdioTerminal;
use ttyline::{signals, EditorConfig, History, LineEditor, ReadOutcome};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("\n[client] error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> ttyline::Result<()> {
    println!("[client] connected to demo server");
    println!("  <text>     send a message");
    println!("  history    show command history");
    println!("  quit       exit (Ctrl+C / Ctrl+D also work)");
    println!();

    let (mut socket, server) = UnixStream::pair()?;
    spawn_server(server);

    if let Err(e) = signals::install() {
        eprintln!("[client] running without signal handling: {}", e);
    }

    let config = EditorConfig::default().with_prompt("[you] ");
    let mut history = History::from_config(&config);
    let mut editor = LineEditor::new(&config);
    let mut terminal = StdioTerminal::new();
    let mut inbox = [0u8; 4096];

    loop {
        match editor.read_line(&mut terminal, &mut history, Some(socket.as_raw_fd()))? {
            ReadOutcome::ExternalReady => {
                let n = socket.read(&mut inbox)?;
                if n == 0 {
                    println!("[client] server closed the connection");
                    break;
                }
                let text = String::from_utf8_lossy(&inbox[..n]);
                print!("[server] {}", text);
                if !text.ends_with('\n') {
                    println!();
                }
                io::stdout().flush()?;
            }
            ReadOutcome::Line(line) => match line.trim() {
                "quit" => break,
                "history" => {
                    for (i, entry) in history.iter().enumerate() {
                        println!("{:>3}  {}", i + 1, entry);
                    }
                }
                "" => {}
                text => socket.write_all(format!("{}\n", text).as_bytes())?,
            },
            ReadOutcome::EndOfInput | ReadOutcome::Interrupted => break,
        }
    }

    println!("[client] disconnecting...");
    signals::restore_default_handlers()?;
    Ok(())
}

fn spawn_server(mut stream: UnixStream) {
    thread::spawn(move || {
        if stream.set_read_timeout(Some(Duration::from_secs(10))).is_err() {
            return;
        }
        let mut buf = [0u8; 1024];
        let mut ticks = 0u32;
        loop {
            let reply = match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => format!("echo: {}", String::from_utf8_lossy(&buf[..n])),
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    ticks += 1;
                    format!("tick {}\n", ticks)
                }
                Err(_) => break,
            };
            if stream.write_all(reply.as_bytes()).is_err() {
                break;
            }
        }
    });
}

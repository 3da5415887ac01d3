// Server console: non-blocking line editor driven by a host poll(2) loop.
//
// The host owns the wait. Whenever stdin is readable it hands control to the
// editor for one byte; in between it prints periodic status output, hiding
// the prompt first so the half-typed command is redrawn intact.

use std::io;
use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;
use ttyline::terminals::StdioTerminal;
use ttyline::{signals, EditorConfig, History, PollEditor, PollStatus, Terminal};

const STATUS_EVERY: Duration = Duration::from_secs(15);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("\n[server] error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> ttyline::Result<()> {
    println!("[server] console ready: list | send <id> <msg> | broadcast <msg> | quit");

    if let Err(e) = signals::install() {
        eprintln!("[server] running without signal handling: {}", e);
    }

    let config = EditorConfig::default().with_prompt("server> ");
    let mut history = History::from_config(&config);
    let mut console = PollEditor::new(&config);
    let mut terminal = StdioTerminal::new();
    let clients = ["client-1", "client-2", "client-3"];
    let mut last_status = Instant::now();

    console.start(&mut terminal);

    let result = loop {
        if last_status.elapsed() >= STATUS_EVERY {
            console.hide_prompt(&mut terminal)?;
            terminal.write(format!("[server] {} clients connected\r\n", clients.len()).as_bytes())?;
            last_status = Instant::now();
        }

        // A timeout still gets one call so pending signals are handled
        terminal.wait_for_input(None, Duration::from_millis(200))?;

        match console.process_input(&mut terminal, &mut history)? {
            PollStatus::Pending => {}
            PollStatus::EndOfInput => break Ok(()),
            PollStatus::Line(line) => {
                let reply = match dispatch(&line, &clients) {
                    Some(reply) => reply,
                    None => break Ok(()),
                };
                if !reply.is_empty() {
                    terminal.write(reply.replace('\n', "\r\n").as_bytes())?;
                    terminal.flush()?;
                }
            }
        }
    };

    console.finish(&mut terminal);
    signals::restore_default_handlers()?;
    println!("[server] shutting down");
    result
}

/// Returns the text to print, or `None` to stop the server.
fn dispatch(line: &str, clients: &[&str]) -> Option<String> {
    let mut parts = line.trim().splitn(2, ' ');
    let command = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    let reply = match command {
        "" => String::new(),
        "quit" => return None,
        "list" => clients
            .iter()
            .enumerate()
            .map(|(i, id)| format!("  [{}] {}\n", i + 1, id))
            .collect(),
        "send" => match rest.split_once(' ') {
            Some((id, msg)) if clients.contains(&id) => format!("[server] -> {}: {}\n", id, msg),
            Some((id, _)) => format!("[server] no such client: {}\n", id),
            None => "usage: send <id> <msg>\n".to_string(),
        },
        "broadcast" if !rest.is_empty() => {
            format!("[server] -> {} clients: {}\n", clients.len(), rest)
        }
        "broadcast" => "usage: broadcast <msg>\n".to_string(),
        other => format!("[server] unknown command: {}\n", other),
    };
    Some(reply)
}

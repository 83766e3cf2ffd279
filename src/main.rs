use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use flume::RecvTimeoutError;

use keycue::config::Config;
use keycue::ipc::{self, Command, Event};
use keycue::monitor::{self, Monitor, TimerMsg};

#[derive(Parser)]
#[command(name = "keycue", about = "Keystroke monitor that cues AI suggestions")]
struct Cli {
    /// Path to the config file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the journal file path from the config
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Per-keystroke diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config);
    if let Some(path) = cli.log_file {
        config.log_file = path.to_string_lossy().into_owned();
    }
    let config = Arc::new(config);

    let (events, event_rx) = ipc::channel();
    let (timer_tx, timer_rx) = flume::unbounded::<TimerMsg>();
    let monitor = Monitor::new(Arc::clone(&config), events.clone(), timer_tx)
        .with_verbose(cli.verbose);

    eprintln!("[KEYCUE] journal: {}", config.log_file);

    // Single writer thread - every stdout line is one atomic event
    let writer = thread::spawn(move || ipc::run_writer(event_rx));
    events.send(Event::Started {
        pid: std::process::id(),
    });

    // Live-suggestion timer
    let timer_monitor = monitor.clone();
    thread::spawn(move || monitor::run_live_timer(timer_monitor, timer_rx));

    // Foreground-window poll
    let win_monitor = monitor.clone();
    thread::spawn(move || {
        let interval = Duration::from_secs_f64(win_monitor.config.timing.window_poll_secs);
        while win_monitor.is_running() {
            monitor::window::check_change(&win_monitor);
            thread::sleep(interval);
        }
    });

    // Typing-pause poll
    let pause_monitor = monitor.clone();
    thread::spawn(move || {
        let interval = Duration::from_secs_f64(pause_monitor.config.timing.pause_poll_secs);
        while pause_monitor.is_running() {
            monitor::journal::check_pause(&pause_monitor, Instant::now());
            thread::sleep(interval);
        }
    });

    // Key hook (blocks its thread for the life of the process)
    monitor::keys::start_listener(monitor.clone());

    // Ctrl-C behaves like a shutdown command
    let ctrlc_monitor = monitor.clone();
    ctrlc::set_handler(move || {
        if ctrlc_monitor.is_running() {
            ctrlc_monitor.handle_command(Command::Shutdown);
        }
    })?;

    // Stdin reader thread; the dropped sender signals EOF
    let (line_tx, line_rx) = flume::unbounded::<String>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(l) => {
                    if line_tx.send(l).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    // Command loop. EOF is a normal shutdown, not an error.
    loop {
        match line_rx.recv_timeout(Duration::from_millis(200)) {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    match serde_json::from_str::<Command>(line) {
                        Ok(cmd) => monitor.handle_command(cmd),
                        Err(_) => events.error(format!("invalid command: {line}")),
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if !monitor.is_running() {
            break;
        }
    }

    // Shutdown: one final synchronous flush, then tear down
    if monitor.is_running() {
        monitor.flush_pending_sync();
        monitor.running.store(false, Ordering::SeqCst);
    }
    let _ = monitor.timer.send(TimerMsg::Shutdown);
    events.send(Event::Stopped);
    let _ = writer.join();

    // The rdev listener cannot be unhooked; it dies with the process
    std::process::exit(0);
}

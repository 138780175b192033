mod cli;
mod host;

use std::io::BufRead;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{Receiver, Select, TryRecvError};
use liteplay_core::PlaybackController;
use liteplay_engine::{ClockEngine, EngineConfig};

use cli::Cli;
use host::DemoHost;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let engine = ClockEngine::with_config(
        EngineConfig::default()
            .with_tick(Duration::from_millis(cli.tick_ms.max(1)))
            .with_seek_align_ms(cli.seek_align_ms),
    );
    let controller = PlaybackController::new(engine);
    let mut host = DemoHost::new(controller, cli.locator.clone(), cli.seek_step_ms);
    let lines = spawn_stdin_reader()?;

    println!("commands: start | pause | seek | stop | status | quit");
    println!("{}", host.label());
    run(&mut host, &lines);
    host.release();
    Ok(())
}

fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::Builder::new()
        .name("liteplay-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        log::error!("[demo] stdin: {}", err);
                        break;
                    }
                }
            }
        })
        .context("spawn stdin reader")?;
    Ok(rx)
}

fn run(host: &mut DemoHost, lines: &Receiver<String>) {
    let notifications = host.notifications().clone();
    let mut last_label = host.label().to_string();

    loop {
        let mut select = Select::new();
        let stdin_index = select.recv(lines);
        select.recv(&notifications);

        // Only readiness is observed here; the controller consumes notifications
        let ready = select.ready();
        if ready == stdin_index {
            match lines.try_recv() {
                Ok(line) => {
                    if !handle_command(host, line.trim()) {
                        return;
                    }
                }
                Err(TryRecvError::Disconnected) => return,
                Err(TryRecvError::Empty) => {}
            }
        } else {
            host.poll();
        }

        if host.label() != last_label {
            last_label = host.label().to_string();
            println!("{}", last_label);
        }
    }
}

/// Returns false once the user asked to quit
fn handle_command(host: &mut DemoHost, command: &str) -> bool {
    let result = match command {
        "" => Ok(()),
        "start" => host.on_start_click(),
        "pause" => host.on_pause_click(),
        "seek" => host.on_seek_click().map(|_| ()),
        "stop" => host.on_stop_click(),
        "status" => {
            println!(
                "{} (code {}) position={} ms duration={} ms",
                host.label(),
                host.status().code(),
                host.position(),
                host.duration()
            );
            Ok(())
        }
        "quit" | "exit" => return false,
        other => {
            println!("unknown command: {}", other);
            Ok(())
        }
    };

    if let Err(err) = result {
        log::warn!("[demo] {} rejected: {}", command, err);
    }
    true
}

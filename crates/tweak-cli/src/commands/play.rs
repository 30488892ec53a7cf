//! Interactive playback with live effect changes.
//!
//! Commands are read line by line from stdin while a status line shows the
//! position. Every parameter change rebuilds the graph at the current
//! position.

use super::common::{EffectArgs, describe_params, format_time};
use anyhow::Context;
use clap::Args;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use tweak_core::DEFAULT_BLOCK_SIZE;
use tweak_io::{
    AudioBackend, Clock, CpalBackend, LiveSession, PlaybackState, SessionConfig, SessionEvent,
    read_wav,
};

const STATUS_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Args)]
pub struct PlayArgs {
    /// WAV file to play
    #[arg(value_name = "FILE")]
    file: PathBuf,

    #[command(flatten)]
    effects: EffectArgs,

    /// Output device (index, exact name, or partial name)
    #[arg(short, long)]
    output: Option<String>,

    /// Device buffer size in frames
    #[arg(long)]
    buffer_size: Option<u32>,

    /// Graph processing block size in frames
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Load the file without starting playback
    #[arg(long)]
    paused: bool,
}

/// One line of interactive input.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Play,
    Pause,
    Seek(f64),
    Pitch(f32),
    Reverb(f32),
    Volume(f32),
    Speed(f32),
    Stop,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let (params, _) = args.effects.resolve()?;

    println!("Loading {}...", args.file.display());
    let buffer = Arc::new(
        read_wav(&args.file).with_context(|| format!("reading {}", args.file.display()))?,
    );
    println!(
        "  {} frames, {} channel(s), {} Hz, {:.1}s",
        buffer.frame_count(),
        buffer.channel_count(),
        buffer.sample_rate(),
        buffer.duration_secs()
    );

    let config = SessionConfig {
        block_size: args.block_size,
        buffer_size: args.buffer_size,
        device: args.output,
        ..SessionConfig::default()
    };
    let mut session = LiveSession::new(CpalBackend::new(), buffer, config)?;
    session.set_params(params)?;
    println!("  {}", describe_params(session.params()));
    println!();
    print_help();

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    if !args.paused {
        session.play(0.0)?;
    }

    let mut input_open = true;
    while running.load(Ordering::SeqCst) {
        if input_open {
            match rx.recv_timeout(STATUS_INTERVAL) {
                Ok(line) => match parse_action(&line) {
                    Ok(Some(action)) => match apply(&mut session, action) {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => println!("\nerror: {e}"),
                    },
                    Ok(None) => {}
                    Err(msg) => println!("\n{msg}"),
                },
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => input_open = false,
            }
        } else {
            std::thread::sleep(STATUS_INTERVAL);
        }

        match session.poll() {
            Some(SessionEvent::Ended) => {
                println!("\nEnded.");
                if !input_open {
                    break;
                }
            }
            Some(SessionEvent::DeviceError(message)) => {
                tracing::warn!(%message, "playback stopped by device error");
                println!("\nerror: audio device failed: {message}");
                if !input_open {
                    break;
                }
            }
            None => {}
        }

        print_status(&session);
    }

    session.stop()?;
    println!("\nStopped.");
    Ok(())
}

fn parse_action(line: &str) -> Result<Option<Action>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    if words.next().is_some() {
        return Err(format!("too many arguments: '{}'", line.trim()));
    }

    let number = |name: &str| -> Result<f32, String> {
        let text = arg.ok_or_else(|| format!("usage: {name} <value>"))?;
        text.parse::<f32>()
            .map_err(|_| format!("'{text}' is not a number"))
    };

    let action = match command.to_lowercase().as_str() {
        "play" | "resume" | "p" => Action::Play,
        "pause" => Action::Pause,
        "seek" => {
            let text = arg.ok_or("usage: seek <seconds | m:ss>")?;
            Action::Seek(parse_time(text).ok_or_else(|| format!("'{text}' is not a time"))?)
        }
        "pitch" => Action::Pitch(number("pitch")?),
        "reverb" => Action::Reverb(number("reverb")?),
        "volume" | "vol" => Action::Volume(number("volume")?),
        "speed" => Action::Speed(number("speed")?),
        "stop" => Action::Stop,
        "status" | "s" => Action::Status,
        "help" | "h" | "?" => Action::Help,
        "quit" | "exit" | "q" => Action::Quit,
        other => return Err(format!("unknown command '{other}' (type 'help')")),
    };
    Ok(Some(action))
}

/// Parses `90`, `90.5` or `1:30` into seconds.
fn parse_time(text: &str) -> Option<f64> {
    let secs = match text.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u64 = minutes.parse().ok()?;
            let seconds: f64 = seconds.parse().ok()?;
            if !(0.0..60.0).contains(&seconds) {
                return None;
            }
            minutes as f64 * 60.0 + seconds
        }
        None => text.parse().ok()?,
    };
    (secs.is_finite() && secs >= 0.0).then_some(secs)
}

fn apply<B: AudioBackend, C: Clock>(
    session: &mut LiveSession<B, C>,
    action: Action,
) -> tweak_io::Result<Flow> {
    let params = *session.params();
    match action {
        Action::Play => session.resume()?,
        Action::Pause => session.pause()?,
        Action::Seek(to) => session.seek(to)?,
        Action::Pitch(x) => session.set_params(params.with_pitch(x))?,
        Action::Reverb(x) => session.set_params(params.with_reverb(x))?,
        Action::Volume(x) => session.set_params(params.with_volume(x))?,
        Action::Speed(x) => session.set_params(params.with_speed(x))?,
        Action::Stop => session.stop()?,
        Action::Status => println!("\n{}", describe_params(session.params())),
        Action::Help => print_help(),
        Action::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn print_status<B: AudioBackend, C: Clock>(session: &LiveSession<B, C>) {
    let state = match session.state() {
        PlaybackState::Idle => "stopped",
        PlaybackState::Playing => "playing",
        PlaybackState::Paused => "paused",
    };
    print!(
        "\r[{state:>7}] {} / {}   ",
        format_time(session.elapsed()),
        format_time(session.duration())
    );
    let _ = std::io::stdout().flush();
}

fn print_help() {
    println!("Commands:");
    println!("  play | pause | stop     transport");
    println!("  seek <s | m:ss>         jump to a position");
    println!("  pitch <semitones>       e.g. pitch -3");
    println!("  reverb <0..1>           reverb amount");
    println!("  volume <0..5>           output gain");
    println!("  speed <0.25..4>         playback speed");
    println!("  status | help | quit");
    println!("Ctrl+C also quits.");
}

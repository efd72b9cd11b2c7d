use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::{bounded, Receiver, Sender};
use cursive::event::Key;
use cursive::traits::Nameable;
use cursive::views::{LinearLayout, TextView};
use tracing::{error, info, warn};

use chip8_vm::chip::{
    chip8::{
        cursive_display::{CursiveSink, Display, DEBUGGER_VIEW, SCREEN_VIEW},
        debugger::Debugger,
        Chip8, Chip8Config, Clock,
    },
    Chip,
};

/// Runs a CHIP-8 program in the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the program to load.
    rom: PathBuf,

    /// Instructions executed per second.
    #[arg(long, default_value_t = 600)]
    clock_hz: u32,

    /// Seed for the random number generator, for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// File the log is written to. The terminal belongs to the UI.
    #[arg(long, default_value = "chip8.log")]
    log_file: PathBuf,
}

/// Represents an event to be processed by the event loop.
enum Event {
    /// Occurs when the key passed in the enum value was pressed.
    Key(u8),

    /// Indicates that all keys are released. Terminals only report key
    /// presses, so one key is assigned to releasing all keys.
    KeyRelease,

    /// Raises the instruction rate.
    SpeedUp,

    /// Lowers the instruction rate.
    SlowDown,

    TogglePause,

    /// Executes a single instruction while paused.
    Step,

    SaveState,
    LoadState,

    /// Shut down.
    Quit,
}

/// Represents the channels available to the event loop.
struct EventLoopChannels {
    /// Where frames and debugger output are presented.
    sink: CursiveSink,

    /// The channel on which the Events are received.
    event_receiver: Receiver<Event>,

    /// A channel to report that the thread has completed shutdown.
    shutdown_sender: Sender<()>,
}

const CLOCK_STEP_HZ: u32 = 60;

/// The event loop. Processes pending events, runs a cycle unless the
/// debugger holds the chip, ticks the timers and presents the display at
/// 60 Hz, and sleeps for what is left of the cycle period.
fn event_loop(mut chip: Chip8, mut channels: EventLoopChannels) {
    let mut clock = Clock::new(chip.config().clock_hz);
    let mut debugger = Debugger::new();
    let mut save_slot: Option<Vec<u8>> = None;

    loop {
        let started = Instant::now();
        let mut inspect = false;

        while let Ok(event) = channels.event_receiver.try_recv() {
            match event {
                Event::Key(key) => chip.keypad_mut().set(key, true),
                Event::KeyRelease => chip.keypad_mut().release_all(),
                Event::SpeedUp => {
                    clock.set_clock_hz(clock.clock_hz() + CLOCK_STEP_HZ);
                    chip.set_clock_hz(clock.clock_hz());
                    info!(clock_hz = clock.clock_hz(), "speed changed");
                }
                Event::SlowDown => {
                    clock.set_clock_hz(clock.clock_hz().saturating_sub(CLOCK_STEP_HZ));
                    chip.set_clock_hz(clock.clock_hz());
                    info!(clock_hz = clock.clock_hz(), "speed changed");
                }
                Event::TogglePause => {
                    debugger.toggle();
                    inspect = true;
                }
                Event::Step => {
                    debugger.step();
                    inspect = true;
                }
                Event::SaveState => match chip.save_state() {
                    Ok(bytes) => save_slot = Some(bytes),
                    Err(e) => error!("saving state failed: {}", e),
                },
                Event::LoadState => match save_slot.as_deref() {
                    Some(bytes) => {
                        if let Err(e) = chip.load_state(bytes) {
                            error!("restoring state failed: {}", e);
                        }
                        inspect = true;
                    }
                    None => warn!("no saved state to restore"),
                },
                Event::Quit => {
                    if channels.shutdown_sender.send(()).is_err() {
                        warn!("ui stopped waiting for shutdown");
                    }
                    return;
                }
            }
        }

        if debugger.should_cycle() {
            chip.cycle();
            if clock.advance() {
                chip.tick_timers();
                chip.present(&mut channels.sink);
                inspect = true;
            }
        } else {
            chip.present(&mut channels.sink);
        }

        if inspect {
            channels.sink.show_debugger(chip.debug_report());
        }

        let period = if debugger.is_paused() {
            Duration::from_millis(10)
        } else {
            clock.period()
        };
        if let Some(remaining) = period.checked_sub(started.elapsed()) {
            std::thread::sleep(remaining);
        }
    }
}

fn setup_tracing(log_file: &Path) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    let file = std::fs::File::options()
        .truncate(true)
        .create(true)
        .write(true)
        .open(log_file)?;

    let (file_nb, guard) = tracing_appender::non_blocking(file);
    let file_layer = fmt::layer().with_writer(file_nb).with_ansi(false);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chip8_vm=info,emulator_text_ui=info"));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Constructs the UI and spawns the event loop and the UI thread.
fn main() {
    let cli = Cli::parse();

    let _tracing_guard = match setup_tracing(&cli.log_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", cli.log_file.display(), e);
            return;
        }
    };

    let mut chip8 = Chip8::with_config(Chip8Config {
        clock_hz: cli.clock_hz,
        seed: cli.seed,
    });
    match chip8.load_program(&cli.rom) {
        Ok(size) => info!(size, rom = %cli.rom.display(), "program loaded"),
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    }

    let mut siv = cursive::default();

    let sink = CursiveSink::new(siv.cb_sink().clone());
    let (event_sender, event_receiver) = bounded::<Event>(10);
    let (shutdown_sender, shutdown_receiver) = bounded::<()>(1);

    std::thread::spawn(move || {
        event_loop(
            chip8,
            EventLoopChannels {
                sink,
                event_receiver,
                shutdown_sender,
            },
        );
    });

    let sender = event_sender.clone();
    siv.add_global_callback(Key::Esc, move |s| {
        if sender.send(Event::Quit).is_ok() && shutdown_receiver.recv().is_err() {
            warn!("event loop ended before acknowledging shutdown");
        }
        s.quit();
    });

    for (i, j) in [
        ('1', 0x1),
        ('2', 0x2),
        ('3', 0x3),
        ('4', 0xC),
        ('q', 0x4),
        ('w', 0x5),
        ('e', 0x6),
        ('r', 0xD),
        ('a', 0x7),
        ('s', 0x8),
        ('d', 0x9),
        ('f', 0xE),
        ('z', 0xA),
        ('x', 0x0),
        ('c', 0xB),
        ('v', 0xF),
    ] {
        let sender = event_sender.clone();
        siv.add_global_callback(i, move |_s| {
            let _ = sender.send(Event::Key(j));
        });
    }

    let callbacks: [(cursive::event::Event, fn() -> Event); 7] = [
        (' '.into(), || Event::KeyRelease),
        (Key::Up.into(), || Event::SpeedUp),
        (Key::Down.into(), || Event::SlowDown),
        ('p'.into(), || Event::TogglePause),
        ('n'.into(), || Event::Step),
        (Key::F5.into(), || Event::SaveState),
        (Key::F9.into(), || Event::LoadState),
    ];
    for (trigger, event) in callbacks {
        let sender = event_sender.clone();
        siv.add_global_callback(trigger, move |_s| {
            let _ = sender.send(event());
        });
    }

    siv.add_layer(
        LinearLayout::horizontal()
            .child(Display::default().with_name(SCREEN_VIEW))
            .child(TextView::new("").with_name(DEBUGGER_VIEW)),
    );

    siv.run();
}

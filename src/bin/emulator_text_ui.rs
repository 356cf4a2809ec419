use clap::Parser;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use cursive::{view::Nameable, views::Dialog, CbSink, Cursive};
use log::{error, info, LevelFilter};
use ux::u4;

use chip8_vm::chip::{
    chip8::{
        cursive_display::{Display, DISPLAY_VIEW_NAME},
        Chip8, Quirks,
    },
    Chip, ChipWithCursiveDisplay, Keypad, Scheduler,
};

/// Ticks a key stays pressed after its key press event. Terminals do not
/// report key releases, so keys are released automatically.
const KEY_HOLD_TICKS: u8 = 6;

/// Steps per tick added or removed by the speed controls.
const SPEED_STEP: u32 = 2;

/// Keyboard layout, mapping the left hand side of a QWERTY keyboard onto
/// the hexadecimal keypad.
const KEY_MAP: [(char, u8); 16] = [
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
];

/// Runs a CHIP-8 program in the terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the program image to run
    rom: String,

    /// Instructions executed per timer tick
    #[arg(long, default_value_t = 10)]
    steps_per_tick: u32,

    /// Timer ticks per second
    #[arg(long, default_value_t = 60)]
    tick_rate: u32,

    /// Emulate the instruction variants of the COSMAC VIP interpreter
    #[arg(long)]
    cosmac_vip: bool,

    /// Only use the low nibble of VX for key skips instead of faulting
    #[arg(long)]
    mask_key_index: bool,
}

impl Args {
    fn quirks(&self) -> Quirks {
        let mut quirks = if self.cosmac_vip {
            Quirks::cosmac_vip()
        } else {
            Quirks::modern()
        };
        quirks.mask_key_index = self.mask_key_index;
        quirks
    }
}

/// Represents an event to be processed by the event loop.
enum Event {
    /// Occurs when the key passed in the enum value was pressed.
    Key(u4),

    /// Releases all keys at once.
    KeyRelease,

    /// Executes more instructions per tick.
    SpeedUp,

    /// Executes fewer instructions per tick.
    SlowDown,

    /// Shut down.
    Quit,
}

/// Represents the channels available to the event loop.
#[derive(Clone)]
struct EventLoopChannels {
    /// The channel to send the UI refresh messages to.
    gfx_sender: CbSink,

    /// The channel on which the Events are received.
    key_receiver: Receiver<Event>,

    /// A channel to report that the thread has completed
    /// shutdown.
    shutdown_sender: Sender<()>,
}

/// Keys pressed through the terminal, each released after a number of ticks.
struct HeldKeys {
    keypad: Keypad,
    remaining: [u8; 16],
}

impl HeldKeys {
    fn new() -> Self {
        HeldKeys {
            keypad: Keypad::new(),
            remaining: [0; 16],
        }
    }

    fn press(&mut self, key: u4) {
        self.keypad.press(key);
        self.remaining[u8::from(key) as usize] = KEY_HOLD_TICKS;
    }

    fn release_all(&mut self) {
        self.keypad.release_all();
        self.remaining = [0; 16];
    }

    fn tick(&mut self) {
        for (index, remaining) in self.remaining.iter_mut().enumerate() {
            if *remaining > 0 {
                *remaining -= 1;
                if *remaining == 0 {
                    self.keypad.release(u4::new(index as u8));
                }
            }
        }
    }
}

/// The event loop. Once per tick: (1) process pending events, (2) run one
/// scheduler tick on the chip, (3) update the UI, (4) wait for the next
/// tick. A fault stops the emulation; the loop then only waits for Quit.
fn event_loop<T>(mut chip: T, mut scheduler: Scheduler, io_channels: EventLoopChannels)
where
    T: Chip + ChipWithCursiveDisplay,
{
    let mut keys = HeldKeys::new();
    let mut pacer = scheduler.pacer();
    loop {
        loop {
            match io_channels.key_receiver.try_recv() {
                Ok(Event::Key(key)) => keys.press(key),
                Ok(Event::KeyRelease) => keys.release_all(),
                Ok(Event::SpeedUp) => {
                    scheduler.set_steps_per_tick(scheduler.steps_per_tick() + SPEED_STEP);
                }
                Ok(Event::SlowDown) => {
                    let steps = scheduler.steps_per_tick().saturating_sub(SPEED_STEP);
                    scheduler.set_steps_per_tick(steps);
                }
                Ok(Event::Quit) | Err(TryRecvError::Disconnected) => {
                    shutdown(&io_channels);
                    return;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        if let Err(fault) = scheduler.run_tick(&mut chip, &keys.keypad) {
            error!("{}", fault);
            let message = format!("{}\n\nPress Esc to quit.", fault);
            let _ = io_channels
                .gfx_sender
                .send(Box::new(move |s: &mut Cursive| {
                    s.add_layer(Dialog::text(message).title("Execution halted"));
                }));
            wait_for_quit(&io_channels);
            return;
        }
        keys.tick();

        if !chip.update_ui(&io_channels.gfx_sender) {
            return;
        }

        pacer.wait_for_next_tick();
    }
}

fn wait_for_quit(io_channels: &EventLoopChannels) {
    while let Ok(event) = io_channels.key_receiver.recv() {
        if let Event::Quit = event {
            break;
        }
    }
    shutdown(io_channels);
}

fn shutdown(io_channels: &EventLoopChannels) {
    // the UI may already be gone, in which case nobody waits for us
    let _ = io_channels.shutdown_sender.send(());
}

/// Constructs the UI and spawns the event loop and the UI thread.
fn main() {
    let args = Args::parse();

    let mut chip8 = Chip8::with_quirks(args.quirks());
    if let Err(e) = chip8.load_program(&args.rom) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    cursive::logger::init();
    log::set_max_level(LevelFilter::Debug);
    info!("Loaded {} with {:?}", args.rom, chip8.quirks());

    let scheduler = Scheduler::new(args.steps_per_tick, args.tick_rate);

    let mut siv = cursive::default();

    let cb_sink = siv.cb_sink().clone();
    let (key_sender, key_receiver) = bounded::<Event>(10);
    let (shutdown_sender, shutdown_receiver) = bounded::<()>(1);

    std::thread::spawn(move || {
        event_loop(
            chip8,
            scheduler,
            EventLoopChannels {
                gfx_sender: cb_sink,
                key_receiver,
                shutdown_sender,
            },
        );
    });

    let sender = key_sender.clone();
    siv.add_global_callback(cursive::event::Key::Esc, move |s| {
        if sender.send(Event::Quit).is_ok() {
            let _ = shutdown_receiver.recv();
        }
        s.quit();
    });

    for (c, key) in KEY_MAP {
        let sender = key_sender.clone();
        siv.add_global_callback(c, move |_s| {
            let _ = sender.try_send(Event::Key(u4::new(key)));
        });
    }

    let sender = key_sender.clone();
    siv.add_global_callback(' ', move |_s| {
        let _ = sender.try_send(Event::KeyRelease);
    });

    let sender = key_sender.clone();
    siv.add_global_callback(cursive::event::Key::Up, move |_s| {
        let _ = sender.try_send(Event::SpeedUp);
    });

    let sender = key_sender;
    siv.add_global_callback(cursive::event::Key::Down, move |_s| {
        let _ = sender.try_send(Event::SlowDown);
    });

    siv.add_global_callback('~', Cursive::toggle_debug_console);

    siv.add_layer(Display::default().with_name(DISPLAY_VIEW_NAME));

    siv.run();
}

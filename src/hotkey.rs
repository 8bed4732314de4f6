//! Global stop key.
//!
//! A single process-wide keyboard hook (rdev, behind the `hooks` feature) fans key
//! presses out to subscriber channels. Each run gets its own listener thread that
//! watches its channel for the stop key and exits as soon as the stop flag is set,
//! so it can always be joined.

use std::{
    fmt,
    io,
    str::FromStr,
    sync::mpsc::{Receiver, RecvTimeoutError},
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, info};

use crate::runner::StopFlag;

const POLL: Duration = Duration::from_millis(50);

/// Key that stops a run. Letters are case-insensitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopKey(char);

impl StopKey {
    pub fn new(c: char) -> Option<Self> {
        c.is_ascii_alphanumeric().then(|| Self(c.to_ascii_lowercase()))
    }

    pub fn as_char(self) -> char {
        self.0
    }
}

impl Default for StopKey {
    fn default() -> Self {
        Self('q')
    }
}

impl fmt::Display for StopKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StopKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => StopKey::new(c).ok_or_else(|| format!("'{c}' is not a letter or digit")),
            _ => Err(format!("expected a single letter or digit, got {s:?}")),
        }
    }
}

/// Blocks until `key` arrives on `presses` or `stop` is set by someone else.
pub fn watch(presses: Receiver<char>, key: StopKey, stop: &StopFlag) {
    while !stop.is_stopped() {
        match presses.recv_timeout(POLL) {
            Ok(c) if c.to_ascii_lowercase() == key.as_char() => {
                if stop.request_stop() {
                    info!("Stopping script due to '{key}' keypress.");
                }
                break;
            }
            Ok(_) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Key hook went away; listener exiting.");
                break;
            }
        }
    }
}

/// Starts the stop-key listener for one run. `Ok(None)` when no keyboard hook is available.
pub fn spawn_listener(stop: StopFlag, key: StopKey) -> io::Result<Option<JoinHandle<()>>> {
    let Some(presses) = subscribe() else {
        log::warn!("Keyboard hook unavailable; use the Stop button to halt.");
        return Ok(None);
    };

    let handle = thread::Builder::new()
        .name("stop-key-listener".into())
        .spawn(move || {
            info!("Key listener started. Press '{key}' to stop script.");
            watch(presses, key, &stop);
            info!("Key listener thread finished.");
        })?;
    Ok(Some(handle))
}

#[cfg(feature = "hooks")]
fn subscribe() -> Option<Receiver<char>> {
    hook::ensure_installed();
    hook::SUBSCRIBERS.lock().subscribe()
}

#[cfg(not(feature = "hooks"))]
fn subscribe() -> Option<Receiver<char>> {
    None
}

#[cfg(feature = "hooks")]
mod hook {
    use std::{
        sync::mpsc::{self, Receiver, Sender},
        thread,
    };

    use once_cell::sync::{Lazy, OnceCell};
    use parking_lot::Mutex;
    use rdev::{listen, Event, EventType, Key};

    pub(super) static SUBSCRIBERS: Lazy<Mutex<Subscribers>> = Lazy::new(|| Mutex::new(Subscribers::default()));
    static INSTALLED: OnceCell<()> = OnceCell::new();

    /// Channels of the live listeners. Once the hook has died nobody can subscribe again.
    #[derive(Default)]
    pub(super) struct Subscribers {
        senders: Vec<Sender<char>>,
        failed: bool,
    }

    impl Subscribers {
        pub(super) fn subscribe(&mut self) -> Option<Receiver<char>> {
            if self.failed {
                return None;
            }
            let (tx, rx) = mpsc::channel();
            self.senders.push(tx);
            Some(rx)
        }

        fn broadcast(&mut self, c: char) {
            self.senders.retain(|tx| tx.send(c).is_ok());
        }

        /// Dropping the senders tells every listener to give up.
        fn fail(&mut self) {
            self.failed = true;
            self.senders.clear();
        }
    }

    pub(super) fn ensure_installed() {
        INSTALLED.get_or_init(|| {
            let spawned = thread::Builder::new().name("key-hook".into()).spawn(|| {
                log::debug!("Installing global keyboard hook.");
                if let Err(error) = listen(on_event) {
                    log::error!("Keyboard hook failed: {error:?}");
                    SUBSCRIBERS.lock().fail();
                }
            });
            if let Err(e) = spawned {
                log::error!("Could not start keyboard hook thread: {e}");
                SUBSCRIBERS.lock().fail();
            }
        });
    }

    fn on_event(event: Event) {
        let EventType::KeyPress(key) = event.event_type else { return };
        let Some(c) = key_char(key) else { return };
        SUBSCRIBERS.lock().broadcast(c);
    }

    pub(super) fn key_char(key: Key) -> Option<char> {
        let c = match key {
            Key::KeyA => 'a',
            Key::KeyB => 'b',
            Key::KeyC => 'c',
            Key::KeyD => 'd',
            Key::KeyE => 'e',
            Key::KeyF => 'f',
            Key::KeyG => 'g',
            Key::KeyH => 'h',
            Key::KeyI => 'i',
            Key::KeyJ => 'j',
            Key::KeyK => 'k',
            Key::KeyL => 'l',
            Key::KeyM => 'm',
            Key::KeyN => 'n',
            Key::KeyO => 'o',
            Key::KeyP => 'p',
            Key::KeyQ => 'q',
            Key::KeyR => 'r',
            Key::KeyS => 's',
            Key::KeyT => 't',
            Key::KeyU => 'u',
            Key::KeyV => 'v',
            Key::KeyW => 'w',
            Key::KeyX => 'x',
            Key::KeyY => 'y',
            Key::KeyZ => 'z',
            Key::Num0 | Key::Kp0 => '0',
            Key::Num1 | Key::Kp1 => '1',
            Key::Num2 | Key::Kp2 => '2',
            Key::Num3 | Key::Kp3 => '3',
            Key::Num4 | Key::Kp4 => '4',
            Key::Num5 | Key::Kp5 => '5',
            Key::Num6 | Key::Kp6 => '6',
            Key::Num7 | Key::Kp7 => '7',
            Key::Num8 | Key::Kp8 => '8',
            Key::Num9 | Key::Kp9 => '9',
            _ => return None,
        };
        Some(c)
    }

}

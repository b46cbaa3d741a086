use crossbeam_channel::{Receiver, TryRecvError, unbounded};
use dotboy_core::{
    gameboy::InputProvider,
    joypad::{Button, ButtonEvent},
};
use log::{debug, warn};
use std::collections::VecDeque;
use std::io::BufRead;
use std::thread;

use crate::config::InputEntry;

/// Parse a line such as `press start` or `release a`.
pub fn parse_command(line: &str) -> Option<ButtonEvent> {
    let mut words = line.split_whitespace();
    let pressed = match words.next()? {
        "press" => true,
        "release" => false,
        _ => return None,
    };
    let button = Button::from_name(words.next()?)?;
    if words.next().is_some() {
        return None;
    }
    Some(ButtonEvent { button, pressed })
}

/// Replays configured transitions as frames go by.
pub struct ScriptedInput {
    pending: VecDeque<(u64, ButtonEvent)>,
    frame: u64,
}

impl ScriptedInput {
    pub fn new(entries: &[InputEntry]) -> Self {
        let mut pending: Vec<(u64, ButtonEvent)> = entries
            .iter()
            .filter_map(|e| match e.event() {
                Some(ev) => Some((e.frame, ev)),
                None => {
                    warn!("Ignoring scripted input with unknown button '{}'", e.button);
                    None
                }
            })
            .collect();
        pending.sort_by_key(|(frame, _)| *frame);
        Self {
            pending: pending.into(),
            frame: 0,
        }
    }

    pub fn set_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    fn next_due(&mut self) -> Option<ButtonEvent> {
        match self.pending.front() {
            Some((frame, _)) if *frame <= self.frame => self.pending.pop_front().map(|(_, e)| e),
            _ => None,
        }
    }
}

/// Button commands typed on stdin, read by a background thread.
pub struct StdinInput {
    rx: Receiver<ButtonEvent>,
    closed: bool,
}

impl StdinInput {
    pub fn spawn() -> Self {
        let (tx, rx) = unbounded();
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match parse_command(line) {
                    Some(event) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    None => warn!("Unrecognized input command: {line}"),
                }
            }
            debug!("stdin input thread exiting");
        });
        Self { rx, closed: false }
    }

    fn next(&mut self) -> Option<ButtonEvent> {
        if self.closed {
            return None;
        }
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }
}

/// Scripted transitions first, then anything typed interactively.
pub struct Inputs {
    pub scripted: ScriptedInput,
    pub stdin: Option<StdinInput>,
}

impl InputProvider for Inputs {
    fn poll(&mut self) -> Option<ButtonEvent> {
        self.scripted
            .next_due()
            .or_else(|| self.stdin.as_mut().and_then(StdinInput::next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(frame: u64, button: &str, pressed: bool) -> InputEntry {
        InputEntry {
            frame,
            button: button.into(),
            pressed,
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("press start"), Some(ButtonEvent::press(Button::Start)));
        assert_eq!(parse_command("  release   A "), Some(ButtonEvent::release(Button::A)));
        assert_eq!(parse_command("press"), None);
        assert_eq!(parse_command("hold up"), None);
        assert_eq!(parse_command("press up down"), None);
    }

    #[test]
    fn scripted_events_wait_for_their_frame() {
        let mut input = Inputs {
            scripted: ScriptedInput::new(&[
                entry(5, "a", false),
                entry(2, "a", true),
                entry(3, "bogus", true),
            ]),
            stdin: None,
        };
        assert_eq!(input.poll(), None);

        input.scripted.set_frame(2);
        assert_eq!(input.poll(), Some(ButtonEvent::press(Button::A)));
        assert_eq!(input.poll(), None);

        input.scripted.set_frame(9);
        assert_eq!(input.poll(), Some(ButtonEvent::release(Button::A)));
        assert_eq!(input.poll(), None);
    }
}

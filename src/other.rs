//! Input events and keyboard state.
//!
//! Window backends translate their native events into [`WindowEvent`]s. The [`KeyboardState`]
//! turns the stream of key events into per-tick press and release edges, so a key held across
//! several ticks is reported as pressed only once.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A keyboard key, independent of the window backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Escape,
    Space,
    Enter,
    Tab,
    /// A printable key, stored lowercase.
    Char(char),
    /// Any key the renderer has no name for.
    Other,
}

impl Key {
    /// Creates a printable key, normalizing it to lowercase.
    pub fn char(c: char) -> Self {
        Key::Char(c.to_ascii_lowercase())
    }
}

/// An event delivered by the window collaborator during a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// The user asked to close the window.
    Quit,
    /// The drawable area changed size, in pixels.
    Resized(i32, i32),
    KeyDown { key: Key, repeat: bool },
    KeyUp { key: Key },
}

/// The current state of the keyboard.
#[derive(Debug, Default)]
pub struct KeyboardState {
    pub down: HashSet<Key>,
    pub pressed: HashSet<Key>,
    pub released: HashSet<Key>,
}

impl KeyboardState {
    /// Forgets the edges of the previous tick. Keys still held stay down.
    pub fn begin_tick(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }

    /// Applies one event and returns the key it pressed, if any. Repeats, and presses of keys
    /// already down, do not produce a new press.
    pub fn apply(&mut self, event: &WindowEvent) -> Option<Key> {
        match *event {
            WindowEvent::KeyDown { key, repeat: false } => {
                if self.down.insert(key) {
                    self.pressed.insert(key);
                    return Some(key);
                }
            }
            WindowEvent::KeyUp { key } => {
                if self.down.remove(&key) {
                    self.released.insert(key);
                }
            }
            _ => {}
        }
        None
    }

    /// Returns whether the key went down during the current tick.
    pub fn just_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }
}

/// Which keys drive the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub exit: Key,
    pub toggle_wireframe: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            exit: Key::Escape,
            toggle_wireframe: Key::Char('w'),
        }
    }
}

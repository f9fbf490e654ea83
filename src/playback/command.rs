//! Operator commands and notices
//!
//! Commands arrive as single key presses. Commands that make no sense in the
//! current state are answered with a [`Notice`] and change nothing.

/// Keymap printed by the help command
pub const HELP: &str = "\
Play videos synchronously with automatic window placement.

Keymap:

    b) freeze the videos;
    c) continue playing the videos;
    g) show progress on console;
    h) show help on console;
    l) go to the earliest frame within the rewind limit;
    n) go to next frame;
    p) go to previous frame;
    q) quit;
    r) go to the latest frame.";

/// Keymap condensed to one line for status bars
pub const HELP_LINE: &str =
    "b freeze | c continue | g progress | h help | l earliest | n next | p previous | q quit | r latest";

/// A discrete operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Stop the player
    Quit,
    /// Pause on the current frame
    Freeze,
    /// Leave the frozen state, replaying any rewound frames first
    Resume,
    /// Show the next frame while frozen
    StepForward,
    /// Show the previous cached frame while frozen
    StepBackward,
    /// Jump to the newest cached frame while frozen
    JumpToLatest,
    /// Jump to the oldest cached frame while frozen
    JumpToEarliest,
    /// Print the current frame index of every stream
    Progress,
    /// Print the keymap
    Help,
}

impl Command {
    /// Map a key to a command; unknown keys map to `None`
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'q' => Some(Command::Quit),
            'b' => Some(Command::Freeze),
            'c' => Some(Command::Resume),
            'n' => Some(Command::StepForward),
            'p' => Some(Command::StepBackward),
            'r' => Some(Command::JumpToLatest),
            'l' => Some(Command::JumpToEarliest),
            'g' => Some(Command::Progress),
            'h' => Some(Command::Help),
            _ => None,
        }
    }
}

/// Console message for a command that did not move the playback position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Freeze while already frozen
    AlreadyFrozen,
    /// Navigation command while not frozen
    FreezeFirst,
    /// Step forward at the newest frame; one fresh frame will be read
    OneStepMore,
    /// Jump to latest at the newest frame
    AlreadyAtLatest,
    /// Step backward at the oldest frame
    CannotRewind,
    /// Jump to earliest at the oldest frame
    AlreadyAtEarliest,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Notice::AlreadyFrozen => "Already frozen",
            Notice::FreezeFirst => "Press `b' to freeze the frame first",
            Notice::OneStepMore => "One step more",
            Notice::AlreadyAtLatest => "Already at the latest frame",
            Notice::CannotRewind => "Cannot rewind anymore",
            Notice::AlreadyAtEarliest => "Already at the earliest frame",
        };
        f.write_str(msg)
    }
}

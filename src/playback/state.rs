//! Playback state machine
//!
//! Tracks whether playback is live, frozen on a cached frame set, or melting
//! (replaying cached frame sets forward until it catches up with the newest
//! one), and which cached frame set is on screen.
//!
//! ```text
//!            freeze                   resume (offset < -1)
//!   Live ───────────────► Frozen(o) ─────────────────────► Melting(o)
//!    ▲  ◄─────────────────   │  ▲                               │
//!    │   resume (o == -1)    │  └─────────── freeze ────────────┘
//!    │                       │ n / p / r / l move o
//!    └───────────────────────┴─── melting reaches -1 ◄──────────┘
//! ```
//!
//! Offsets count back from the newest cached frame set: `-1` is the newest,
//! `-len` the oldest still cached.

use super::command::{Command, Notice};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Every tick reads new frames
    #[default]
    Live,
    /// Every tick re-shows the cached frame set at the offset
    Frozen(isize),
    /// Every tick advances the offset by one towards `-1`, then goes live
    Melting(isize),
}

impl PlaybackState {
    /// Offset into the history, absent while live
    pub fn offset(&self) -> Option<isize> {
        match *self {
            PlaybackState::Live => None,
            PlaybackState::Frozen(o) | PlaybackState::Melting(o) => Some(o),
        }
    }

    /// Check if playback is frozen
    pub fn is_frozen(&self) -> bool {
        matches!(self, PlaybackState::Frozen(_))
    }
}

/// What a tick does before displaying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// Read one frame from every stream and cache the new frame set
    Advance,
    /// Show the cached frame set at this offset
    Replay(isize),
}

/// Result of applying a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Keep playing; the notice, if any, should be shown to the operator
    Continue(Option<Notice>),
    /// Print the current frame index of every stream
    Progress,
    /// Print the keymap
    Help,
    /// Stop the player
    Quit,
}

impl Response {
    fn notice(notice: Notice) -> Self {
        Response::Continue(Some(notice))
    }

    const OK: Response = Response::Continue(None);
}

/// The pause/rewind/resume controller
///
/// Owned by the tick driver. Offsets stay within `[-len, -1]` of the
/// history cache as long as `len` passed to [`apply`](Self::apply) is the
/// current cache length.
#[derive(Debug, Default)]
pub struct PlaybackMachine {
    state: PlaybackState,
    /// One-shot: the next tick reads fresh frames although frozen at `-1`
    peek: bool,
}

impl PlaybackMachine {
    /// Create a machine in the live state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Current offset, absent while live
    pub fn offset(&self) -> Option<isize> {
        self.state.offset()
    }

    /// Whether the next tick will read fresh frames while frozen
    pub fn peek_pending(&self) -> bool {
        self.peek
    }

    /// Decide what the coming tick does
    ///
    /// While melting this advances the offset first, so the returned offset
    /// is the one to display.
    pub fn begin_tick(&mut self) -> TickAction {
        match self.state {
            PlaybackState::Live => TickAction::Advance,
            PlaybackState::Frozen(_) if self.peek => TickAction::Advance,
            PlaybackState::Frozen(o) => TickAction::Replay(o),
            PlaybackState::Melting(o) => {
                let o = o + 1;
                self.state = PlaybackState::Melting(o);
                TickAction::Replay(o)
            }
        }
    }

    /// Finish a tick after its frame set was displayed
    pub fn end_tick(&mut self) {
        self.peek = false;
        if self.state == PlaybackState::Melting(-1) {
            self.state = PlaybackState::Live;
        }
    }

    /// Apply one operator command
    ///
    /// `cache_len` is the current number of cached frame sets.
    pub fn apply(&mut self, command: Command, cache_len: usize) -> Response {
        let oldest = -(cache_len as isize);

        match command {
            Command::Quit => Response::Quit,
            Command::Progress => Response::Progress,
            Command::Help => Response::Help,

            Command::Freeze => match self.state {
                PlaybackState::Frozen(_) => Response::notice(Notice::AlreadyFrozen),
                // Nothing has been shown yet
                PlaybackState::Live if cache_len == 0 => Response::OK,
                PlaybackState::Live => {
                    self.state = PlaybackState::Frozen(-1);
                    Response::OK
                }
                PlaybackState::Melting(o) => {
                    self.state = PlaybackState::Frozen(o);
                    Response::OK
                }
            },

            Command::Resume => {
                if let PlaybackState::Frozen(o) = self.state {
                    self.peek = false;
                    self.state = if o < -1 {
                        PlaybackState::Melting(o)
                    } else {
                        PlaybackState::Live
                    };
                }
                Response::OK
            }

            Command::StepForward => match self.state {
                // Next tick reads one fresh frame set without unfreezing
                PlaybackState::Frozen(o) if o + 1 >= 0 => {
                    self.peek = true;
                    Response::notice(Notice::OneStepMore)
                }
                PlaybackState::Frozen(o) => {
                    self.state = PlaybackState::Frozen(o + 1);
                    Response::OK
                }
                _ => Response::notice(Notice::FreezeFirst),
            },

            Command::JumpToLatest => self.navigate(|o| {
                if o + 1 >= 0 {
                    Err(Notice::AlreadyAtLatest)
                } else {
                    Ok(-1)
                }
            }),

            Command::StepBackward => self.navigate(|o| {
                if o <= oldest {
                    Err(Notice::CannotRewind)
                } else {
                    Ok(o - 1)
                }
            }),

            Command::JumpToEarliest => self.navigate(|o| {
                if o <= oldest {
                    Err(Notice::AlreadyAtEarliest)
                } else {
                    Ok(oldest)
                }
            }),
        }
    }

    /// Freeze as if the operator pressed freeze, used for freeze-on-start
    pub fn freeze(&mut self, cache_len: usize) -> Response {
        self.apply(Command::Freeze, cache_len)
    }

    /// Move the frozen offset; only valid while frozen
    fn navigate(&mut self, step: impl FnOnce(isize) -> Result<isize, Notice>) -> Response {
        let PlaybackState::Frozen(o) = self.state else {
            return Response::notice(Notice::FreezeFirst);
        };

        match step(o) {
            Ok(next) => {
                self.state = PlaybackState::Frozen(next);
                Response::OK
            }
            Err(notice) => Response::notice(notice),
        }
    }
}

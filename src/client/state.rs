//! Voice interaction state machine
//!
//! Tracks whether the client is idle, capturing speech, or playing a reply.
//! Capture and playback cancel each other: starting capture over playback
//! is an interruption.

/// Interaction state of the chat client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    /// Nothing capturing or playing
    #[default]
    Idle,
    /// Speech capture session active
    Listening,
    /// Assistant audio playing
    Speaking,
}

/// What the capture collaborator should do after a mic toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    /// Begin a capture session
    Start {
        /// Playback was cut off and must be stopped now
        interrupted_playback: bool,
    },
    /// End the active capture session
    Stop,
}

/// State machine for capture/playback coordination
#[derive(Debug, Default)]
pub struct InteractionMachine {
    state: InteractionState,
    pending_interruption: bool,
}

impl InteractionMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> InteractionState {
        self.state
    }

    #[must_use]
    pub const fn is_listening(&self) -> bool {
        matches!(self.state, InteractionState::Listening)
    }

    /// Mic button pressed: start capture, or stop it if already listening
    pub fn toggle_capture(&mut self) -> CaptureCommand {
        match self.state {
            InteractionState::Listening => {
                self.state = InteractionState::Idle;
                CaptureCommand::Stop
            }
            InteractionState::Speaking => {
                tracing::debug!("capture started over playback, marking interruption");
                self.state = InteractionState::Listening;
                self.pending_interruption = true;
                CaptureCommand::Start {
                    interrupted_playback: true,
                }
            }
            InteractionState::Idle => {
                self.state = InteractionState::Listening;
                CaptureCommand::Start {
                    interrupted_playback: false,
                }
            }
        }
    }

    /// Capture finished, failed, detected end of speech, or was stopped
    pub fn capture_ended(&mut self) {
        if self.state == InteractionState::Listening {
            self.state = InteractionState::Idle;
        }
    }

    /// Reply audio started; ignored while capturing
    pub fn playback_started(&mut self) {
        if self.state != InteractionState::Listening {
            self.state = InteractionState::Speaking;
        }
    }

    /// Reply audio finished or was stopped
    pub fn playback_stopped(&mut self) {
        if self.state == InteractionState::Speaking {
            self.state = InteractionState::Idle;
        }
    }

    /// Consume the interruption flag for the next submitted message
    pub const fn take_interruption(&mut self) -> bool {
        let flag = self.pending_interruption;
        self.pending_interruption = false;
        flag
    }
}

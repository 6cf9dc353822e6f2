//! Frame driver state machine.
//!
//! ```text
//! Uninitialized --initialize--> Ready --frame--> Ready ...
//!                                  \--failed frame--> Halted
//! ```
//!
//! Each [`FrameDriver::frame`] runs update, render and swap in that order.
//! A backend error ends the loop for good; there is no retry.

use crate::error::DriverError;

/// A simulation the driver can step.
///
/// Implemented by the CPU reference backend and the windowed GPU backend.
pub trait FrameBackend {
    /// Error raised by any phase.
    type Error: std::error::Error + 'static;

    /// Seed the current state slot from the particle keys.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Read the current slot and write advanced positions to the next slot.
    fn update(&mut self) -> Result<(), Self::Error>;

    /// Draw particles from the freshly written slot.
    fn render(&mut self) -> Result<(), Self::Error>;

    /// Make the written slot current.
    fn swap(&mut self);
}

/// Lifecycle state of a [`FrameDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No state texture has been seeded yet.
    Uninitialized,
    /// Frames may run.
    Ready,
    /// A frame failed; no further frames run.
    Halted,
}

/// Phase of the per-frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Advance positions into the next slot.
    Update,
    /// Draw the next slot.
    Render,
    /// Toggle slot roles.
    Swap,
}

/// Runs a [`FrameBackend`] through its lifecycle.
pub struct FrameDriver<B: FrameBackend> {
    backend: B,
    state: DriverState,
    frames: u64,
    failed_phase: Option<Phase>,
}

impl<B: FrameBackend> FrameDriver<B> {
    /// Wrap a backend; nothing runs until [`initialize`](Self::initialize).
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: DriverState::Uninitialized,
            frames: 0,
            failed_phase: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Completed frames.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Phase that halted the loop, if any.
    pub fn failed_phase(&self) -> Option<Phase> {
        self.failed_phase
    }

    /// Shared access to the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Seed the first state texture. Runs once.
    pub fn initialize(&mut self) -> Result<(), DriverError<B::Error>> {
        match self.state {
            DriverState::Uninitialized => {}
            DriverState::Ready => return Err(DriverError::AlreadyInitialized),
            DriverState::Halted => return Err(DriverError::Halted),
        }
        match self.backend.initialize() {
            Ok(()) => {
                self.state = DriverState::Ready;
                log::info!("simulation initialized");
                Ok(())
            }
            Err(e) => {
                self.state = DriverState::Halted;
                Err(DriverError::Backend(e))
            }
        }
    }

    /// Run one update, render and swap.
    pub fn frame(&mut self) -> Result<(), DriverError<B::Error>> {
        match self.state {
            DriverState::Ready => {}
            DriverState::Uninitialized => return Err(DriverError::Uninitialized),
            DriverState::Halted => return Err(DriverError::Halted),
        }

        if let Err(e) = self.backend.update() {
            return Err(self.halt(Phase::Update, e));
        }
        if let Err(e) = self.backend.render() {
            return Err(self.halt(Phase::Render, e));
        }
        self.backend.swap();
        self.frames += 1;
        log::trace!("frame {} complete", self.frames);
        Ok(())
    }

    /// Unwrap the backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    fn halt(&mut self, phase: Phase, error: B::Error) -> DriverError<B::Error> {
        log::error!("{:?} phase failed after {} frames: {}", phase, self.frames, error);
        self.state = DriverState::Halted;
        self.failed_phase = Some(phase);
        DriverError::Backend(error)
    }
}

/// Outcome of advancing the protocol model by one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The model has more to do in the current sequence.
    Continue,
    /// The model reached a restart point; the current sequence is complete.
    Restart,
}

impl Step {
    pub fn is_restart(&self) -> bool {
        matches!(self, Self::Restart)
    }
}

impl From<bool> for Step {
    fn from(restart: bool) -> Self {
        if restart {
            Self::Restart
        } else {
            Self::Continue
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model transition failed: {0}")]
    Transition(String),

    #[error("model has no enabled transitions")]
    Deadlock,
}

/// Trait abstracting the protocol model driver.
///
/// Each call takes exactly one model transition against the live broker.
/// Anything the transition logs must reach the event queue before the
/// broker or model emits the step-termination marker for it.
pub trait ModelStepper {
    fn step(&mut self) -> Result<Step, ModelError>;
}

impl<M: ModelStepper + ?Sized> ModelStepper for &mut M {
    fn step(&mut self) -> Result<Step, ModelError> {
        (**self).step()
    }
}

impl<M: ModelStepper + ?Sized> ModelStepper for Box<M> {
    fn step(&mut self) -> Result<Step, ModelError> {
        (**self).step()
    }
}

//! Per-frame orchestration.
//!
//! A frame is a short, fixed sequence of steps decided by two facts: whether
//! the volume is visible, and whether the destination is the opaque buffer
//! itself. [`FramePlan`] captures that decision as data so the GPU
//! orchestrator ([`VolumeRenderPass`]) and the CPU reference
//! ([`software::SoftwareFrame`]) execute the same sequence.

/// GPU orchestrator owning the frame buffers and passes.
pub mod renderer;
/// CPU execution of the frame plan on plain images.
pub mod software;

pub use renderer::VolumeRenderPass;

/// Where a frame's result goes.
#[derive(Debug)]
pub enum Destination<T> {
    /// A target distinct from every input.
    External(T),
    /// The opaque buffer itself. It is also read by the composite, so the
    /// result goes through the transient buffer first.
    Opaque,
}

impl<T> Destination<T> {
    /// Whether writing here would alias the opaque input.
    #[must_use]
    pub fn aliases_opaque(&self) -> bool {
        matches!(self, Self::Opaque)
    }
}

/// Render target of a composite step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTarget {
    /// Straight into the destination.
    Destination,
    /// Into the transient copy buffer.
    Transient,
}

/// Source of a copy step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopySource {
    /// The transient buffer holding a finished composite.
    Transient,
    /// The opaque buffer, passed through unmodified.
    Opaque,
}

/// One step of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStep {
    /// Raymarch the volume into the volume buffer.
    RaymarchVolume,
    /// Depth-composite the volume buffer over the opaque buffer.
    Composite {
        /// Where the merged image is written.
        target: StepTarget,
    },
    /// Copy a buffer into the destination.
    Copy {
        /// What is copied.
        source: CopySource,
    },
}

/// Ordered steps of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    steps: Vec<FrameStep>,
}

impl FramePlan {
    /// Decide the steps for a frame.
    ///
    /// Hidden volumes pass the opaque image through: copied into an
    /// external destination, or nothing at all when the destination is the
    /// opaque buffer already.
    #[must_use]
    pub fn new(visible: bool, aliases_opaque: bool) -> Self {
        let steps = match (visible, aliases_opaque) {
            (false, true) => Vec::new(),
            (false, false) => vec![FrameStep::Copy {
                source: CopySource::Opaque,
            }],
            (true, false) => vec![
                FrameStep::RaymarchVolume,
                FrameStep::Composite {
                    target: StepTarget::Destination,
                },
            ],
            (true, true) => vec![
                FrameStep::RaymarchVolume,
                FrameStep::Composite {
                    target: StepTarget::Transient,
                },
                FrameStep::Copy {
                    source: CopySource::Transient,
                },
            ],
        };
        Self { steps }
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[FrameStep] {
        &self.steps
    }

    /// Whether the transient buffer is written.
    #[must_use]
    pub fn uses_transient(&self) -> bool {
        self.steps.contains(&FrameStep::Composite {
            target: StepTarget::Transient,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_destination_composites_in_place() {
        let plan = FramePlan::new(true, false);
        assert_eq!(
            plan.steps(),
            &[
                FrameStep::RaymarchVolume,
                FrameStep::Composite {
                    target: StepTarget::Destination
                },
            ]
        );
        assert!(!plan.uses_transient());
    }

    #[test]
    fn aliased_destination_goes_through_transient() {
        let plan = FramePlan::new(true, true);
        assert!(plan.uses_transient());
        assert_eq!(
            plan.steps().last(),
            Some(&FrameStep::Copy {
                source: CopySource::Transient
            })
        );
    }

    #[test]
    fn hidden_volume_is_passthrough() {
        assert_eq!(
            FramePlan::new(false, false).steps(),
            &[FrameStep::Copy {
                source: CopySource::Opaque
            }]
        );
        assert!(FramePlan::new(false, true).steps().is_empty());
    }

    #[test]
    fn destination_aliasing() {
        assert!(Destination::<()>::Opaque.aliases_opaque());
        assert!(!Destination::External(()).aliases_opaque());
    }
}

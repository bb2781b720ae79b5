//! Built-in build steps.
//!
//! These cover the engine-neutral core of a player build: general player
//! settings, compiler defines, signing credentials, build info generation
//! and the pipeline step that performs the actual engine build call.

pub mod build_info;
pub mod defines;
pub mod general;
pub mod mobile;
pub mod pipeline;
pub mod signing;

pub use build_info::BuildInfoStep;
pub use defines::DefinesStep;
pub use general::GeneralOptionsStep;
pub use mobile::MobileRenderingOptionsStep;
pub use pipeline::PipelineStep;
pub use signing::SigningOptionsStep;

use crate::step::BuildStep;

/// The default step set, in discovery order. The scheduler reorders them by
/// their declared constraints.
pub fn default_steps() -> Vec<Box<dyn BuildStep>> {
    vec![
        Box::new(BuildInfoStep::default()),
        Box::new(PipelineStep::default()),
        Box::new(GeneralOptionsStep::default()),
        Box::new(MobileRenderingOptionsStep::default()),
        Box::new(DefinesStep::default()),
        Box::new(SigningOptionsStep::default()),
    ]
}

// ABOUTME: Validated domain types shared across the deployment pipeline.
// ABOUTME: Kubernetes resource names and container image references.

mod image_ref;
mod resource_name;

pub use image_ref::{ImageRef, ParseImageRefError};
pub use resource_name::{ResourceName, ResourceNameError};

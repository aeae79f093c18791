//! Lux Renderer - Whitted ray tracing on the CPU
//!
//! Turns an initialized [`lux_core::Scene`] into pixels: primary rays from
//! the camera, recursive reflection and refraction, Phong lighting with
//! shadows, and a rayon driven [`trace`] entry point that writes into any
//! [`RenderTarget`].

mod filter;
mod image_buffer;
mod lighting;
mod render;
mod sampler;
mod tonemap;
mod tracer;

pub use filter::Filter;
pub use image_buffer::{ImageBuffer, RenderTarget};
pub use lighting::{ambient_occlusion, is_occluded, local_lighting, shadow_amount, soft_shadow_amount};
pub use render::{trace, RenderJob, TraceResult};
pub use sampler::{square_to_cosine_hemisphere, square_to_disc, square_to_uniform_hemisphere, Sampler};
pub use tonemap::tone_map;
pub use tracer::{refract, schlick, TraceStats, WhittedTracer};

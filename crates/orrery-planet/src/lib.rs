//! Planet surface shading: bump-mapped lighting and layered coloring over the
//! terrain height field, plus the equirectangular texture baker that turns a
//! body's parameter records into the material shown while locked on.

mod shading;
mod texture;

pub use shading::{ShadingParams, shade_point, smoothstep};
pub use texture::bake_surface_texture;

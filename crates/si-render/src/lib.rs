pub mod hit;
pub mod overlay;

pub use hit::{hit_test, hit_test_region};
pub use overlay::{DisplayList, DrawCommand, OverlayCanvas, OverlayTheme, paint_overlay};

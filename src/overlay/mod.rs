mod renderer;
mod text;
#[cfg(test)]
mod tests;

pub use renderer::{class_color, OverlayRenderer};
pub(crate) use renderer::resolve_timestamp_timezone;
pub use text::TextPainter;

use bytes::Bytes;

/// Turns caption text into a complete SEI NAL unit.
///
/// An empty result means there is nothing to inject.
pub trait CaptionRenderer {
    fn render(&self, text: &str) -> Bytes;
}

impl<F> CaptionRenderer for F
where
    F: Fn(&str) -> Bytes,
{
    fn render(&self, text: &str) -> Bytes {
        self(text)
    }
}

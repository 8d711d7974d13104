// Frame sources feeding the frame loop
// Camera backends plug in here; `platform::pose::replay` provides a recorded one

use crate::models::capture::{CaptureResult, Frame};

/// Produces frames one at a time. `Ok(None)` means the source is exhausted.
/// Implementations release their device when dropped.
pub trait FrameSource {
    fn next_frame(&mut self) -> CaptureResult<Option<Frame>>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn next_frame(&mut self) -> CaptureResult<Option<Frame>> {
        (**self).next_frame()
    }
}

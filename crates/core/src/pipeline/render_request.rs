use std::path::PathBuf;

use crate::shared::rect::RectI;

/// One host render call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderRequest {
    pub time: f64,
    /// Area of the destination to fill, in canvas coordinates.
    pub render_window: RectI,
    pub destination_connected: bool,
}

impl RenderRequest {
    pub fn new(time: f64, render_window: RectI) -> Self {
        Self {
            time,
            render_window,
            destination_connected: true,
        }
    }

    pub fn without_destination(mut self) -> Self {
        self.destination_connected = false;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderStatus {
    Encoded { filename: PathBuf },
    /// Cancelled before the encode step; nothing was written.
    Aborted,
}

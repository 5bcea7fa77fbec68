use log::{debug, warn};

use crate::config::TrackerConfig;
use crate::error::Result;
use crate::geometry::Rect;
use crate::image::ColorImage;
use crate::session::*;

/// Sits between an interactive front end and the session. Edits to the roi
/// or the boxes schedule a re-initialization for the next frame, and a
/// calibration request is handed to exactly one frame.
pub struct TrackingController {
    session: TrackerSession,
    roi: Option<Rect>,
    boxes: Vec<Rect>,
    reinit_pending: bool,
    pending_calibration: Option<CalibrationRequest>,
    pub annotate: bool,
}

impl TrackingController {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            session: TrackerSession::new(config),
            roi: None,
            boxes: vec![],
            reinit_pending: false,
            pending_calibration: None,
            annotate: true,
        }
    }

    pub fn session(&self) -> &TrackerSession {
        &self.session
    }

    pub fn roi(&self) -> Option<Rect> {
        self.roi
    }

    pub fn boxes(&self) -> &[Rect] {
        &self.boxes
    }

    /// Track centers are roi-local, so a new roi re-initializes them.
    pub fn set_roi(&mut self, roi: Rect) {
        self.roi = Some(roi);
        self.reinit_pending = true;
    }

    pub fn set_boxes(&mut self, boxes: Vec<Rect>) {
        self.boxes = boxes;
        self.reinit_pending = true;
    }

    /// Replaces any request that has not been submitted yet.
    pub fn request_calibration(&mut self, index: usize, point: [i32; 2]) {
        if self.pending_calibration.is_some() {
            debug!("replacing pending calibration request");
        }
        self.pending_calibration = Some(CalibrationRequest { index, point });
    }

    pub fn has_pending_calibration(&self) -> bool {
        self.pending_calibration.is_some()
    }

    /// Track one frame. Returns None when there is nothing to track yet.
    /// Pending flags are consumed even when the session rejects the frame.
    pub fn on_frame(&mut self, frame: &mut ColorImage) -> Result<Option<TrackResult>> {
        let roi = match self.roi {
            Some(roi) if !self.boxes.is_empty() => roi,
            _ => return Ok(None),
        };

        let reinit = std::mem::take(&mut self.reinit_pending);
        let calibration = self.pending_calibration.take();
        let result = self.session.track(TrackRequest {
            frame,
            roi,
            boxes: &self.boxes,
            reinit,
            calibration,
            annotate: self.annotate,
        });

        match result {
            Ok(result) => {
                self.boxes.clone_from(&result.boxes);
                Ok(Some(result))
            }
            Err(err) => {
                warn!("frame rejected: {err}");
                Err(err)
            }
        }
    }

    /// Release the session state. The controller can be used again afterwards.
    pub fn shutdown(&mut self) {
        self.session.release();
    }
}

use log::{debug, warn};

use crate::association::Associator;
use crate::bbox::BoxBuilder;
use crate::blob::BlobDetector;
use crate::config::TrackerConfig;
use crate::error::{Result, TrackError};
use crate::estimator::HueModelEstimator;
use crate::geometry::Rect;
use crate::hsv::HsvImage;
use crate::hue::TrackHue;
use crate::image::{ColorImage, Image};
use crate::masker::HueMasker;
use crate::my_types::*;
use crate::visualization::annotate_frame;

/// State kept for one object between frames
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Track {
    /// Last known center, roi-local
    pub previous_center: Vector2f,
    pub hue: TrackHue,
}

/// Sample the hue of track `index` around `point` (frame coordinates)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalibrationRequest {
    pub index: usize,
    pub point: [i32; 2],
}

pub struct TrackRequest<'a> {
    /// Borrowed for this call only, outlines are drawn into it when `annotate` is set
    pub frame: &'a mut ColorImage,
    pub roi: Rect,
    /// One box per object, frame coordinates
    pub boxes: &'a [Rect],
    /// Recompute every track center from `boxes`
    pub reinit: bool,
    pub calibration: Option<CalibrationRequest>,
    pub annotate: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackStatus {
    Updated,
    /// No blob inside the gate, the box is unchanged
    Lost,
    /// No hue model yet, the box is unchanged
    Uncalibrated,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackResult {
    pub boxes: Vec<Rect>,
    pub updated: bool,
    pub statuses: Vec<TrackStatus>,
}

/// Per-object hue tracking across frames. Calls must be serialized by the owner.
pub struct TrackerSession {
    config: TrackerConfig,
    tracks: Vec<Track>,
    initialized: bool,
    estimator: HueModelEstimator,
    masker: HueMasker,
    detector: BlobDetector,
    associator: Associator,
    box_builder: BoxBuilder,
    // reused between tracks and frames
    mask: Image,
}

impl TrackerSession {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            estimator: HueModelEstimator::new(&config),
            masker: HueMasker::new(config.morph_radius),
            detector: BlobDetector::new(config.min_blob_area, config.min_blob_radius),
            associator: Associator::new(config.gate_radius),
            box_builder: BoxBuilder::new(config.box_padding),
            tracks: vec![],
            initialized: false,
            mask: Image::empty(),
            config,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Drop all track state. Calling it again is a no-op.
    pub fn release(&mut self) {
        if !self.tracks.is_empty() {
            debug!("releasing {} tracks", self.tracks.len());
        }
        self.tracks.clear();
        self.initialized = false;
        self.mask.clear();
    }

    /// Process one frame. Only input validation fails the call, and then
    /// nothing in the session has changed.
    pub fn track(&mut self, request: TrackRequest) -> Result<TrackResult> {
        let TrackRequest {
            frame,
            roi: requested_roi,
            boxes,
            reinit,
            calibration,
            annotate,
        } = request;

        if frame.is_empty() {
            return Err(TrackError::EmptyFrame);
        }
        let roi = requested_roi.intersect(&frame.bounds());
        if roi.is_empty() {
            return Err(TrackError::InvalidRoi { roi: requested_roi });
        }
        if boxes.is_empty() {
            return Err(TrackError::EmptyBoxes);
        }

        let n = boxes.len();
        if self.tracks.len() != n {
            debug!("object count {} -> {n}, resetting tracks", self.tracks.len());
            self.tracks = vec![Track::default(); n];
            self.initialized = false;
        }

        let origin = roi.origin();
        if reinit || !self.initialized {
            for (track, b) in self.tracks.iter_mut().zip(boxes) {
                track.previous_center = b.center() - origin;
            }
            self.initialized = true;
        }

        if let Some(CalibrationRequest { index, point }) = calibration {
            self.calibrate(frame, roi, index, point);
        }

        let hsv = HsvImage::from_region(frame, roi);
        let mut out = boxes.to_vec();
        let mut statuses = Vec::with_capacity(n);
        for (i, track) in self.tracks.iter_mut().enumerate() {
            let model = match track.hue.model() {
                Some(model) => model,
                None => {
                    statuses.push(TrackStatus::Uncalibrated);
                    continue;
                }
            };
            self.masker.mask(&hsv, model, &mut self.mask);
            let blobs = self.detector.detect(&self.mask);
            match self.associator.associate(&blobs, track.previous_center) {
                Some(blob) => {
                    track.previous_center = blob.center;
                    out[i] = self.box_builder.build(&blob.circle(), &roi);
                    statuses.push(TrackStatus::Updated);
                }
                None => {
                    debug!(
                        "track {i} lost near ({:.1}, {:.1}), {} candidates",
                        track.previous_center.x,
                        track.previous_center.y,
                        blobs.len()
                    );
                    statuses.push(TrackStatus::Lost);
                }
            }
        }

        if annotate {
            annotate_frame(frame, roi, &out);
        }

        Ok(TrackResult {
            updated: statuses.contains(&TrackStatus::Updated),
            boxes: out,
            statuses,
        })
    }

    /// The selected point becomes the new anchor of the track, even when
    /// there is too little color around it to estimate a model.
    fn calibrate(&mut self, frame: &ColorImage, roi: Rect, index: usize, point: [i32; 2]) {
        let track = match self.tracks.get_mut(index) {
            Some(track) => track,
            None => {
                warn!(
                    "calibration index {index} out of range for {} tracks",
                    self.tracks.len()
                );
                return;
            }
        };
        let local = Vector2f::new(
            point[0].saturating_sub(roi.x) as f32,
            point[1].saturating_sub(roi.y) as f32,
        );
        track.previous_center = local;
        match self.estimator.calibrate(frame, roi, local) {
            Ok(model) => {
                debug!("track {index} calibrated: {model:?}");
                track.hue = TrackHue::Calibrated(model);
            }
            Err(err) => debug!("track {index} keeps its hue model: {err}"),
        }
    }

    /// Flat array entry point: `roi = [x, y, w, h]`, `boxes = [x, y, w, h, ...]`
    /// updated in place, negative `calibration_index` means none. Returns
    /// whether any box moved; malformed input is reported as false.
    pub fn track_flat(
        &mut self,
        frame: &mut ColorImage,
        roi: [i32; 4],
        boxes: &mut [i32],
        reinit: bool,
        calibration_index: i32,
        calibration_point: Option<[i32; 2]>,
    ) -> bool {
        let rects = match Rect::from_flat(boxes) {
            Ok(rects) => rects,
            Err(err) => {
                warn!("rejected frame: {err}");
                return false;
            }
        };
        let calibration = match (usize::try_from(calibration_index), calibration_point) {
            (Ok(index), Some(point)) => Some(CalibrationRequest { index, point }),
            _ => None,
        };
        let request = TrackRequest {
            frame,
            roi: roi.into(),
            boxes: &rects,
            reinit,
            calibration,
            annotate: true,
        };
        match self.track(request) {
            Ok(result) => {
                Rect::write_flat(&result.boxes, boxes);
                result.updated
            }
            Err(err) => {
                warn!("rejected frame: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelFormat;

    const GREEN: [u8; 3] = [0, 255, 0];
    const RED: [u8; 3] = [255, 0, 0];
    const BLUE: [u8; 3] = [0, 0, 255];
    const GRAY: [u8; 3] = [128, 128, 128];

    fn frame_with(w: usize, h: usize, squares: &[(Rect, [u8; 3])]) -> ColorImage {
        let mut frame = ColorImage::filled(w, h, PixelFormat::Rgba, [0, 0, 0]);
        for (rect, rgb) in squares {
            frame.fill_rect(*rect, *rgb);
        }
        frame
    }

    fn request<'a>(
        frame: &'a mut ColorImage,
        roi: Rect,
        boxes: &'a [Rect],
        reinit: bool,
        calibration: Option<CalibrationRequest>,
    ) -> TrackRequest<'a> {
        TrackRequest {
            frame,
            roi,
            boxes,
            reinit,
            calibration,
            annotate: false,
        }
    }

    fn inside(rect: &Rect, p: Vector2f) -> bool {
        p.x >= rect.x as f32
            && p.x < rect.right() as f32
            && p.y >= rect.y as f32
            && p.y < rect.bottom() as f32
    }

    #[test]
    fn test_single_square_end_to_end() {
        let square = Rect::new(60, 40, 20, 20);
        let mut frame = frame_with(160, 120, &[(square, GREEN)]);
        let boxes = [Rect::new(55, 35, 30, 30)];
        let mut session = TrackerSession::new(TrackerConfig::default());

        let result = session
            .track(TrackRequest {
                frame: &mut frame,
                roi: Rect::new(20, 20, 120, 90),
                boxes: &boxes,
                reinit: true,
                calibration: Some(CalibrationRequest {
                    index: 0,
                    point: [70, 50],
                }),
                annotate: true,
            })
            .unwrap();

        assert!(result.updated);
        assert_eq!(result.statuses, vec![TrackStatus::Updated]);
        assert!(inside(&square, result.boxes[0].center()));
        assert_eq!(
            session.tracks()[0].hue.model().map(|m| m.center),
            Some(60)
        );
        // roi outline was drawn
        assert_eq!(frame.rgb(20, 20), RED);
    }

    #[test]
    fn test_two_objects_follow_motion() {
        let roi = Rect::new(10, 10, 180, 130);
        let red = Rect::new(40, 40, 16, 16);
        let blue = Rect::new(120, 60, 16, 16);
        let mut session = TrackerSession::new(TrackerConfig::default());
        let mut boxes = vec![Rect::new(38, 38, 20, 20), Rect::new(118, 58, 20, 20)];

        for (frame_index, calibration) in [
            (0, Some(CalibrationRequest { index: 0, point: [48, 48] })),
            (1, Some(CalibrationRequest { index: 1, point: [128, 68] })),
        ] {
            let mut frame = frame_with(200, 150, &[(red, RED), (blue, BLUE)]);
            let result = session
                .track(request(&mut frame, roi, &boxes, frame_index == 0, calibration))
                .unwrap();
            boxes = result.boxes;
        }
        assert!(session.tracks().iter().all(|t| t.hue.is_calibrated()));
        assert_eq!(session.tracks()[0].hue.model().map(|m| m.center), Some(0));
        assert_eq!(session.tracks()[1].hue.model().map(|m| m.center), Some(120));

        let red_moved = Rect::new(50, 45, 16, 16);
        let blue_moved = Rect::new(112, 66, 16, 16);
        let mut frame = frame_with(200, 150, &[(red_moved, RED), (blue_moved, BLUE)]);
        let result = session
            .track(request(&mut frame, roi, &boxes, false, None))
            .unwrap();
        assert!(result.updated);
        assert!(inside(&red_moved, result.boxes[0].center()));
        assert!(inside(&blue_moved, result.boxes[1].center()));
    }

    #[test]
    fn test_lost_object_keeps_box() {
        let roi = Rect::new(0, 0, 400, 300);
        let mut session = TrackerSession::new(TrackerConfig::default());
        let mut frame = frame_with(400, 300, &[(Rect::new(50, 50, 16, 16), GREEN)]);
        let first = session
            .track(request(
                &mut frame,
                roi,
                &[Rect::new(48, 48, 20, 20)],
                true,
                Some(CalibrationRequest {
                    index: 0,
                    point: [58, 58],
                }),
            ))
            .unwrap();
        assert!(first.updated);

        // 150 px away, outside the 120 px gate
        let mut frame = frame_with(400, 300, &[(Rect::new(200, 50, 16, 16), GREEN)]);
        let second = session
            .track(request(&mut frame, roi, &first.boxes, false, None))
            .unwrap();
        assert!(!second.updated);
        assert_eq!(second.statuses, vec![TrackStatus::Lost]);
        assert_eq!(second.boxes, first.boxes);
    }

    #[test]
    fn test_object_count_change_resets() {
        let roi = Rect::new(0, 0, 160, 120);
        let mut session = TrackerSession::new(TrackerConfig::default());
        let mut frame = frame_with(160, 120, &[(Rect::new(60, 40, 20, 20), GREEN)]);
        let boxes = [Rect::new(55, 35, 30, 30), Rect::new(10, 10, 10, 10)];
        session
            .track(request(
                &mut frame,
                roi,
                &boxes,
                false,
                Some(CalibrationRequest {
                    index: 0,
                    point: [70, 50],
                }),
            ))
            .unwrap();
        assert!(session.tracks()[0].hue.is_calibrated());

        let new_boxes = [Rect::new(100, 80, 20, 10)];
        let result = session
            .track(request(&mut frame, roi, &new_boxes, false, None))
            .unwrap();
        assert_eq!(session.tracks().len(), 1);
        assert_eq!(session.tracks()[0].hue, TrackHue::Uncalibrated);
        assert_eq!(session.tracks()[0].previous_center, Vector2f::new(110., 85.));
        assert_eq!(result.statuses, vec![TrackStatus::Uncalibrated]);
        assert_eq!(result.boxes, new_boxes.to_vec());
        assert!(!result.updated);
    }

    #[test]
    fn test_gray_calibration_keeps_model() {
        let roi = Rect::new(0, 0, 160, 120);
        let mut session = TrackerSession::new(TrackerConfig::default());
        let scene = [
            (Rect::new(60, 40, 20, 20), GREEN),
            (Rect::new(100, 40, 20, 20), GRAY),
        ];
        let boxes = [Rect::new(55, 35, 30, 30)];
        let mut frame = frame_with(160, 120, &scene);
        let green = CalibrationRequest {
            index: 0,
            point: [70, 50],
        };
        let first = session
            .track(request(&mut frame, roi, &boxes, true, Some(green)))
            .unwrap();
        let calibrated = session.tracks()[0].hue;
        assert!(calibrated.is_calibrated());

        let gray = CalibrationRequest {
            index: 0,
            point: [110, 50],
        };
        let mut frame = frame_with(160, 120, &scene);
        session
            .track(request(&mut frame, roi, &first.boxes, false, Some(gray)))
            .unwrap();
        assert_eq!(session.tracks()[0].hue, calibrated);
    }

    #[test]
    fn test_first_calibration_failure_stays_uncalibrated() {
        let roi = Rect::new(0, 0, 80, 60);
        let mut session = TrackerSession::new(TrackerConfig::default());
        let mut frame = frame_with(80, 60, &[(Rect::new(10, 10, 20, 20), GRAY)]);
        let result = session
            .track(request(
                &mut frame,
                roi,
                &[Rect::new(10, 10, 20, 20)],
                true,
                Some(CalibrationRequest {
                    index: 0,
                    point: [20, 20],
                }),
            ))
            .unwrap();
        assert_eq!(session.tracks()[0].hue, TrackHue::Uncalibrated);
        // the selection point still became the anchor
        assert_eq!(session.tracks()[0].previous_center, Vector2f::new(20., 20.));
        assert_eq!(result.statuses, vec![TrackStatus::Uncalibrated]);
    }

    #[test]
    fn test_invalid_input_leaves_state_alone() {
        let mut session = TrackerSession::new(TrackerConfig::default());
        let mut frame = frame_with(160, 120, &[(Rect::new(60, 40, 20, 20), GREEN)]);
        let boxes = [Rect::new(55, 35, 30, 30)];
        session
            .track(request(&mut frame, Rect::new(0, 0, 160, 120), &boxes, true, None))
            .unwrap();
        let before = session.tracks().to_vec();

        let bad_roi = Rect::new(500, 500, 10, 10);
        let err = session
            .track(request(&mut frame, bad_roi, &[Rect::default(); 3], true, None))
            .unwrap_err();
        assert_eq!(err, TrackError::InvalidRoi { roi: bad_roi });
        assert!(err.is_validation());

        let err = session
            .track(request(&mut frame, Rect::new(0, 0, 160, 120), &[], true, None))
            .unwrap_err();
        assert_eq!(err, TrackError::EmptyBoxes);

        let mut empty = ColorImage::filled(0, 0, PixelFormat::Rgb, [0, 0, 0]);
        let err = session
            .track(request(&mut empty, Rect::new(0, 0, 10, 10), &boxes, true, None))
            .unwrap_err();
        assert_eq!(err, TrackError::EmptyFrame);

        assert_eq!(session.tracks(), &before[..]);
        assert!(session.is_initialized());
    }

    #[test]
    fn test_reinit_recomputes_centers() {
        let roi = Rect::new(10, 10, 100, 100);
        let mut session = TrackerSession::new(TrackerConfig::default());
        let mut frame = frame_with(120, 120, &[]);
        session
            .track(request(&mut frame, roi, &[Rect::new(20, 20, 10, 10)], false, None))
            .unwrap();
        assert_eq!(session.tracks()[0].previous_center, Vector2f::new(15., 15.));

        // without reinit the boxes do not move the anchor
        session
            .track(request(&mut frame, roi, &[Rect::new(60, 60, 10, 10)], false, None))
            .unwrap();
        assert_eq!(session.tracks()[0].previous_center, Vector2f::new(15., 15.));

        session
            .track(request(&mut frame, roi, &[Rect::new(60, 60, 10, 10)], true, None))
            .unwrap();
        assert_eq!(session.tracks()[0].previous_center, Vector2f::new(55., 55.));
    }

    #[test]
    fn test_calibration_index_out_of_range_is_ignored() {
        let roi = Rect::new(0, 0, 160, 120);
        let mut session = TrackerSession::new(TrackerConfig::default());
        let mut frame = frame_with(160, 120, &[(Rect::new(60, 40, 20, 20), GREEN)]);
        let result = session
            .track(request(
                &mut frame,
                roi,
                &[Rect::new(55, 35, 30, 30)],
                true,
                Some(CalibrationRequest {
                    index: 3,
                    point: [70, 50],
                }),
            ))
            .unwrap();
        assert!(!result.updated);
        assert_eq!(session.tracks()[0].hue, TrackHue::Uncalibrated);
    }

    #[test]
    fn test_flat_entry_point() {
        let mut session = TrackerSession::new(TrackerConfig::default());
        let mut frame = frame_with(160, 120, &[(Rect::new(60, 40, 20, 20), GREEN)]);

        let mut malformed = [55, 35, 30];
        assert!(!session.track_flat(&mut frame, [0, 0, 160, 120], &mut malformed, true, -1, None));
        assert_eq!(malformed, [55, 35, 30]);
        assert!(session.tracks().is_empty());

        let mut boxes = [55, 35, 30, 30];
        assert!(!session.track_flat(&mut frame, [300, 0, 10, 10], &mut boxes, true, 0, Some([70, 50])));
        assert_eq!(boxes, [55, 35, 30, 30]);

        assert!(session.track_flat(&mut frame, [0, 0, 160, 120], &mut boxes, true, 0, Some([70, 50])));
        let b = Rect::from(boxes);
        assert!(inside(&Rect::new(60, 40, 20, 20), b.center()));

        // negative index means no calibration request
        let mut other = frame_with(160, 120, &[(Rect::new(60, 40, 20, 20), GREEN)]);
        let before = session.tracks()[0].hue;
        session.track_flat(&mut other, [0, 0, 160, 120], &mut boxes, false, -1, Some([5, 5]));
        assert_eq!(session.tracks()[0].hue, before);
    }

    #[test]
    fn test_flat_extreme_coordinates_are_rejected_quietly() {
        let mut session = TrackerSession::new(TrackerConfig::default());
        let mut frame = frame_with(160, 120, &[(Rect::new(60, 40, 20, 20), GREEN)]);
        let full = [0, 0, 160, 120];

        let mut boxes = [55, 35, 30, 30];
        assert!(!session.track_flat(&mut frame, [i32::MAX - 5, 0, 100, 10], &mut boxes, true, -1, None));
        assert!(!session.track_flat(&mut frame, [i32::MIN, i32::MIN, i32::MAX, i32::MAX], &mut boxes, true, -1, None));
        assert_eq!(boxes, [55, 35, 30, 30]);

        // a box far outside the frame is kept and not drawn
        let mut far = [i32::MAX - 1, 0, 10, 10];
        let before = frame.clone();
        assert!(!session.track_flat(&mut frame, full, &mut far, true, 0, Some([i32::MAX, 0])));
        assert_eq!(far, [i32::MAX - 1, 0, 10, 10]);
        assert!(!session.tracks()[0].hue.is_calibrated());
        assert_eq!(frame.rgb(70, 50), before.rgb(70, 50));

        // a calibrated track re-anchored out of range loses its object but keeps its model
        assert!(session.track_flat(&mut frame, full, &mut boxes, true, 0, Some([70, 50])));
        let model = session.tracks()[0].hue;
        let tracked = boxes;
        let mut next = frame_with(160, 120, &[(Rect::new(60, 40, 20, 20), GREEN)]);
        assert!(!session.track_flat(&mut next, full, &mut boxes, false, 0, Some([i32::MAX, i32::MIN])));
        assert_eq!(session.tracks()[0].hue, model);
        assert_eq!(boxes, tracked);
    }

    #[test]
    fn test_release_is_idempotent() {
        let config = TrackerConfig {
            gate_radius: 40.,
            ..TrackerConfig::default()
        };
        let mut session = TrackerSession::new(config.clone());
        session.release();
        let mut frame = frame_with(40, 40, &[]);
        session
            .track(request(&mut frame, Rect::new(0, 0, 40, 40), &[Rect::new(1, 1, 4, 4)], false, None))
            .unwrap();
        assert_eq!(session.tracks().len(), 1);
        session.release();
        session.release();
        assert!(session.tracks().is_empty());
        assert!(!session.is_initialized());
        // the configuration survives a release
        assert_eq!(session.config(), &config);
    }
}

use anyhow::Result;
#[cfg(any(feature = "rerun", feature = "opencv"))]
use anyhow::Context as AnyhowContext;
use clap::Parser;
use std::path::Path;

use indicatif::ProgressStyle;
use tracing::{debug, info, info_span, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use hue_tracker::config::TrackerConfig;
use hue_tracker::controller::TrackingController;
use hue_tracker::geometry::Rect;
use hue_tracker::session::TrackStatus;
use hue_tracker::synthetic::{SceneConfig, SyntheticScene};

#[derive(Parser)]
pub struct Args {
    /// Scene description (json), a built-in scene is used when absent
    #[clap(long)]
    pub scene: Option<String>,
    #[clap(long, default_value = "120")]
    pub frames: usize,
    /// Tracker config (json), replaces the tracker flags
    #[clap(long)]
    pub config: Option<String>,
    /// Margin between the frame border and the roi
    #[clap(long, default_value = "4")]
    pub roi_margin: i32,
    #[cfg(feature = "rerun")]
    #[clap(long)]
    pub rerun: Option<String>,
    #[cfg(feature = "opencv")]
    #[clap(long)]
    pub dump_dir: Option<String>,
    #[clap(flatten)]
    pub tracker: TrackerConfig,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // setup logging
    let indicatif_layer = IndicatifLayer::new();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stdout_writer()))
        .with(indicatif_layer)
        .init();

    let scene_config = match &args.scene {
        Some(path) => SceneConfig::from_json_file(Path::new(path))?,
        None => SceneConfig::default(),
    };
    let tracker_config = match &args.config {
        Some(path) => TrackerConfig::from_json_file(Path::new(path))?,
        None => args.tracker.clone(),
    };
    let scene = SyntheticScene::new(scene_config);
    let objects = scene.config.objects.clone();

    #[cfg(feature = "rerun")]
    let recorder = match &args.rerun {
        Some(path) => Some(
            rerun::RecordingStreamBuilder::new("hue_tracker")
                .save(path)
                .with_context(|| format!("failed to create recording {path}"))?,
        ),
        None => None,
    };
    #[cfg(feature = "opencv")]
    {
        if let Some(dir) = &args.dump_dir {
            std::fs::create_dir_all(dir).with_context(|| format!("failed to create {dir}"))?;
        }
    }

    let mut controller = TrackingController::new(tracker_config);
    let m = args.roi_margin;
    controller.set_roi(Rect::new(
        m,
        m,
        scene.config.width as i32 - 2 * m,
        scene.config.height as i32 - 2 * m,
    ));
    controller.set_boxes(objects.iter().map(|o| o.bounding_box(0)).collect());

    let header_span = info_span!("tracking");
    header_span.pb_set_style(&ProgressStyle::default_bar());
    header_span.pb_set_length(args.frames as u64);
    let header_span_enter = header_span.enter();

    let mut updated_frames = 0;
    let mut lost = vec![0usize; objects.len()];
    let mut center_error = vec![0f32; objects.len()];
    let mut matched = vec![0usize; objects.len()];

    for frame_index in 0..args.frames {
        // calibrate one object per frame, the way a user would tap them in turn
        if let Some(object) = objects.get(frame_index) {
            let p = object.position(frame_index);
            controller.request_calibration(frame_index, [p.x.round() as i32, p.y.round() as i32]);
        }

        let mut frame = scene.render(frame_index);
        let result = match controller.on_frame(&mut frame)? {
            Some(result) => result,
            None => {
                warn!("nothing to track in frame {frame_index}");
                continue;
            }
        };
        if result.updated {
            updated_frames += 1;
        }

        for (i, status) in result.statuses.iter().enumerate() {
            match status {
                TrackStatus::Updated => {
                    let truth = objects[i].position(frame_index);
                    center_error[i] += (result.boxes[i].center() - truth).norm();
                    matched[i] += 1;
                }
                TrackStatus::Lost => lost[i] += 1,
                TrackStatus::Uncalibrated => {}
            }
        }
        debug!(frame = frame_index, boxes = ?result.boxes, statuses = ?result.statuses);

        #[cfg(feature = "rerun")]
        {
            if let Some(recorder) = &recorder {
                recorder.set_time_sequence("frame", frame_index as i64);
                recorder.log("camera/frame", &rerun::Image::try_from(frame.to_array3())?)?;
            }
        }
        #[cfg(feature = "opencv")]
        {
            if let Some(dir) = &args.dump_dir {
                let path = Path::new(dir).join(format!("frame_{frame_index:05}.png"));
                hue_tracker::visualization::write_png(&frame, &path)?;
            }
        }

        header_span.pb_inc(1);
    }

    std::mem::drop(header_span_enter);
    std::mem::drop(header_span);

    info!("{updated_frames}/{} frames updated", args.frames);
    for i in 0..objects.len() {
        let mean_error = if matched[i] > 0 {
            center_error[i] / matched[i] as f32
        } else {
            f32::NAN
        };
        info!(
            "object {i}: matched {} frames, lost {} frames, mean center error {mean_error:.2} px",
            matched[i], lost[i]
        );
    }

    controller.shutdown();
    Ok(())
}

//! Bakes one wiggle loop into a GIF.
//!
//! Frames come from the same [`with_cycle_frame`] path live playback uses,
//! so frame `i` of the export is the frame the canvas showed at cycle index
//! `i`. The loop is fixed at [`CYCLE_COUNT`] iterations and always
//! terminates; any failure abandons the whole export.

pub mod gif;

use crate::canvas::renderer::{with_cycle_frame, CycleParams, RendererPort};
use crate::canvas::surface::PixelBuffer;
use crate::constants::{export_fps, CYCLE_COUNT};
use crate::drawing::{Drawing, DrawingRevision, JitterConfig};
use crate::error::{EncodeError, ExportError};

pub use self::gif::{write_gif, ImageGifEncoder};

/// Consumer of exported frames.
pub trait GifEncoderPort {
    fn begin(&mut self, width: u32, height: u32, fps: u32) -> Result<(), EncodeError>;
    fn add_frame(&mut self, frame: &PixelBuffer) -> Result<(), EncodeError>;
    fn finish(&mut self) -> Result<Vec<u8>, EncodeError>;

    /// Drops anything buffered after a failed export.
    fn abort(&mut self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportProgress {
    Started { total_frames: usize },
    Frame { index: usize, total_frames: usize },
    Finished { bytes: usize },
}

impl ExportProgress {
    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        match *self {
            ExportProgress::Started { .. } => 0.0,
            ExportProgress::Frame {
                index,
                total_frames,
            } => (index + 1) as f32 / total_frames.max(1) as f32,
            ExportProgress::Finished { .. } => 1.0,
        }
    }
}

/// Everything an export needs, captured when the user asked for it.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportJob {
    pub drawing: Drawing,
    pub revision: DrawingRevision,
    pub jitter: JitterConfig,
}

impl ExportJob {
    pub fn new(drawing: Drawing, revision: DrawingRevision, jitter: JitterConfig) -> Self {
        Self {
            drawing,
            revision,
            jitter,
        }
    }

    pub fn run(
        &self,
        renderer: &mut RendererPort<'_>,
        encoder: &mut dyn GifEncoderPort,
    ) -> Result<Vec<u8>, ExportError> {
        export_drawing_as_gif(&self.drawing, self.revision, renderer, encoder, self.jitter)
    }
}

pub fn export_drawing_as_gif(
    drawing: &Drawing,
    revision: DrawingRevision,
    renderer: &mut RendererPort<'_>,
    encoder: &mut dyn GifEncoderPort,
    jitter: JitterConfig,
) -> Result<Vec<u8>, ExportError> {
    export_drawing_as_gif_with_progress(drawing, revision, renderer, encoder, jitter, &mut |_| {})
}

pub fn export_drawing_as_gif_with_progress(
    drawing: &Drawing,
    revision: DrawingRevision,
    renderer: &mut RendererPort<'_>,
    encoder: &mut dyn GifEncoderPort,
    jitter: JitterConfig,
    progress: &mut dyn FnMut(ExportProgress),
) -> Result<Vec<u8>, ExportError> {
    if !renderer.is_available() {
        return Err(ExportError::Configuration(
            "renderer exposes neither basic nor cycle-cache rendering".to_string(),
        ));
    }

    let fps = export_fps();
    tracing::info!(
        width = drawing.width,
        height = drawing.height,
        strokes = drawing.strokes.len(),
        revision = %revision,
        capability = renderer.capability_name(),
        "GIF export started"
    );

    encoder
        .begin(drawing.width, drawing.height, fps)
        .map_err(ExportError::Begin)?;
    progress(ExportProgress::Started {
        total_frames: CYCLE_COUNT,
    });

    for index in 0..CYCLE_COUNT {
        let params = CycleParams::new(drawing, revision, index, jitter);
        let added = with_cycle_frame(renderer, &params, |frame| encoder.add_frame(frame));
        let result = match added {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(ExportError::Encoding {
                frame: index,
                source,
            }),
            Err(err) => Err(ExportError::from_render(index, err)),
        };
        if let Err(err) = result {
            tracing::warn!(frame = index, error = %err, "GIF export abandoned");
            encoder.abort();
            return Err(err);
        }
        progress(ExportProgress::Frame {
            index,
            total_frames: CYCLE_COUNT,
        });
    }

    let bytes = encoder.finish().map_err(ExportError::Finish)?;
    tracing::info!(bytes = bytes.len(), frames = CYCLE_COUNT, fps, "GIF export finished");
    progress(ExportProgress::Finished { bytes: bytes.len() });
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::{BrushColor, BrushSettings};
    use crate::canvas::renderer::{acquire_cycle_frame, CachingRenderer, DrawingRenderer, FrameRenderer, RenderParams};
    use crate::constants::cycle_duration_ms;
    use crate::drawing::{Point, Stroke, StrokeKind};
    use image::codecs::gif::GifDecoder;
    use image::AnimationDecoder;
    use std::io::Cursor;

    #[derive(Default)]
    struct RecordingEncoder {
        begun: Option<(u32, u32, u32)>,
        frames: Vec<PixelBuffer>,
        finished: usize,
        aborted: bool,
        fail_at: Option<usize>,
    }

    impl GifEncoderPort for RecordingEncoder {
        fn begin(&mut self, width: u32, height: u32, fps: u32) -> Result<(), EncodeError> {
            self.begun = Some((width, height, fps));
            Ok(())
        }

        fn add_frame(&mut self, frame: &PixelBuffer) -> Result<(), EncodeError> {
            if self.fail_at == Some(self.frames.len()) {
                return Err(EncodeError::InvalidParams("boom".into()));
            }
            self.frames.push(frame.clone());
            Ok(())
        }

        fn finish(&mut self) -> Result<Vec<u8>, EncodeError> {
            self.finished += 1;
            Ok(vec![0x47, 0x49, 0x46])
        }

        fn abort(&mut self) {
            self.aborted = true;
        }
    }

    fn scenario() -> Drawing {
        Drawing::empty(384, 256).with_stroke(Stroke {
            id: 1,
            kind: StrokeKind::Draw,
            brush: BrushSettings::pen(BrushColor::Palette(1), 3.0),
            points: vec![Point::new(10.0, 10.0, 0.0), Point::new(20.0, 10.0, 50.0)],
        })
    }

    #[test]
    fn adds_one_frame_per_cycle_index_on_both_paths() {
        let drawing = scenario();
        let cfg = JitterConfig::default();

        let mut basic = DrawingRenderer::default();
        let mut enc_basic = RecordingEncoder::default();
        export_drawing_as_gif(
            &drawing,
            DrawingRevision(1),
            &mut RendererPort::Basic(&mut basic),
            &mut enc_basic,
            cfg,
        )
        .unwrap();

        let mut caching = CachingRenderer::default();
        let mut enc_cached = RecordingEncoder::default();
        export_drawing_as_gif(
            &drawing,
            DrawingRevision(1),
            &mut RendererPort::Caching(&mut caching),
            &mut enc_cached,
            cfg,
        )
        .unwrap();

        for enc in [&enc_basic, &enc_cached] {
            assert_eq!(enc.frames.len(), CYCLE_COUNT);
            assert_eq!(enc.finished, 1);
            assert_eq!(enc.begun, Some((384, 256, export_fps())));
        }
        assert_eq!(enc_basic.frames, enc_cached.frames);
        assert_eq!(caching.cache().outstanding_leases(), 0);
    }

    #[test]
    fn export_matches_live_frames() {
        let drawing = scenario();
        let cfg = JitterConfig::default();
        let mut caching = CachingRenderer::default();
        let mut enc = RecordingEncoder::default();
        export_drawing_as_gif(
            &drawing,
            DrawingRevision(3),
            &mut RendererPort::Caching(&mut caching),
            &mut enc,
            cfg,
        )
        .unwrap();

        let mut live = DrawingRenderer::default();
        for (i, exported) in enc.frames.iter().enumerate() {
            let params = CycleParams::new(&drawing, DrawingRevision(3), i, cfg);
            let shown = acquire_cycle_frame(&mut RendererPort::Basic(&mut live), &params).unwrap();
            assert_eq!(&shown, exported, "frame {i}");
        }
    }

    #[test]
    fn scenario_loops_and_moves() {
        let drawing = scenario();
        let cfg = JitterConfig::new(1.2, 0.008);
        let mut enc = RecordingEncoder::default();
        let mut renderer = DrawingRenderer::default();
        export_drawing_as_gif(
            &drawing,
            DrawingRevision(1),
            &mut RendererPort::Basic(&mut renderer),
            &mut enc,
            cfg,
        )
        .unwrap();

        // frame CYCLE_COUNT wraps onto frame 0
        renderer
            .render(&RenderParams {
                drawing: &drawing,
                revision: DrawingRevision(1),
                elapsed_ms: cycle_duration_ms(),
                jitter: cfg,
            })
            .unwrap();
        assert_eq!(renderer.read_pixels().unwrap(), enc.frames[0]);

        assert_eq!(enc.frames.len(), CYCLE_COUNT);
        for i in 0..CYCLE_COUNT {
            for j in (i + 1)..CYCLE_COUNT {
                assert_ne!(enc.frames[i], enc.frames[j], "frames {i} and {j} are identical");
            }
        }
    }

    #[test]
    fn encoder_failure_aborts_without_finish() {
        let drawing = scenario();
        let mut renderer = CachingRenderer::default();
        let mut enc = RecordingEncoder {
            fail_at: Some(3),
            ..Default::default()
        };
        let err = export_drawing_as_gif(
            &drawing,
            DrawingRevision(1),
            &mut RendererPort::Caching(&mut renderer),
            &mut enc,
            JitterConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::Encoding { frame: 3, .. }));
        assert_eq!(enc.finished, 0);
        assert!(enc.aborted);
        assert_eq!(renderer.cache().outstanding_leases(), 0);
    }

    #[test]
    fn unavailable_renderer_is_a_configuration_error() {
        let mut enc = RecordingEncoder::default();
        let err = export_drawing_as_gif(
            &scenario(),
            DrawingRevision(0),
            &mut RendererPort::Unavailable,
            &mut enc,
            JitterConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::Configuration(_)));
        assert!(enc.begun.is_none());
    }

    #[test]
    fn surface_failure_surfaces_as_such() {
        let mut enc = RecordingEncoder::default();
        let mut renderer = DrawingRenderer::default();
        let err = export_drawing_as_gif(
            &Drawing::empty(0, 0),
            DrawingRevision(0),
            &mut RendererPort::Basic(&mut renderer),
            &mut enc,
            JitterConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::SurfaceUnavailable { .. }));
        assert_eq!(enc.finished, 0);
    }

    #[test]
    fn progress_reports_every_frame() {
        let mut events = Vec::new();
        let mut renderer = CachingRenderer::default();
        let mut enc = RecordingEncoder::default();
        export_drawing_as_gif_with_progress(
            &scenario(),
            DrawingRevision(1),
            &mut RendererPort::Caching(&mut renderer),
            &mut enc,
            JitterConfig::default(),
            &mut |p| events.push(p),
        )
        .unwrap();
        assert_eq!(events.len(), CYCLE_COUNT + 2);
        assert_eq!(events.first().map(|p| p.fraction()), Some(0.0));
        assert_eq!(events.last(), Some(&ExportProgress::Finished { bytes: 3 }));
    }

    #[test]
    fn scenario_decodes_as_looping_gif() {
        let job = ExportJob::new(scenario(), DrawingRevision(1), JitterConfig::default());
        let mut renderer = CachingRenderer::default();
        let mut encoder = ImageGifEncoder::new();
        let bytes = job
            .run(&mut RendererPort::Caching(&mut renderer), &mut encoder)
            .unwrap();
        assert_eq!(&bytes[..3], b"GIF");

        let decoder = GifDecoder::new(Cursor::new(bytes)).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), CYCLE_COUNT);
        for frame in &frames {
            let (num, den) = frame.delay().numer_denom_ms();
            assert_eq!(num as f64 / den as f64, 1000.0 / export_fps() as f64);
            assert_eq!(frame.buffer().dimensions(), (384, 256));
        }
    }
}

//! Streaming terrain generation from lines of text.
//!
//! Every line becomes one segment whose width follows the line's length.
//! Heights come from a slowly falling baseline plus two noise layers,
//! clamped per step so the surface never spikes. Segments are stitched
//! end to start: the first control point of a segment is pinned to the
//! exact last sampled point of the one before, so the surface is
//! continuous however the noise behaves.
//!
//! **Seed-based determinism:** both noise layers derive from one generator
//! seed, so the same seed and the same lines always give the same terrain.

use glam::Vec2;

use crate::noise_field::NoiseField;
use crate::source::LineSource;
use crate::spline::{self, TERRAIN_SAMPLE_SPACING};

/// Narrowest segment ever emitted; degenerate lines are widened to this.
pub const MIN_SEGMENT_WIDTH: f32 = 0.5;

/// Derive a deterministic u32 noise seed from a world seed and an offset.
/// Same (seed, offset) always gives the same result so terrain is reproducible.
#[inline]
fn deterministic_noise_seed(seed: u64, offset: u64) -> u32 {
    ((seed.wrapping_add(offset))
        .wrapping_mul(0x9e3779b97f4a7c15_u64)
        .wrapping_add(offset.wrapping_mul(0x6c078965_u64))
        >> 32) as u32
}

/// One streamed piece of terrain.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSegment {
    /// The line exactly as read.
    pub source_text: String,
    /// Text drawn along the surface. Never empty.
    pub display_text: String,
    /// Sparse control points, strictly increasing in X.
    pub control_points: Vec<Vec2>,
    /// Dense surface samples, right to left. The collider builder needs this
    /// winding for upward-facing normals.
    pub sampled_points: Vec<Vec2>,
    pub start_x: f32,
    pub end_x: f32,
    pub is_goal: bool,
}

impl TerrainSegment {
    /// Leftmost surface point.
    pub fn start_point(&self) -> Option<Vec2> {
        self.sampled_points.last().copied()
    }

    /// Rightmost surface point; the anchor for the next segment.
    pub fn end_point(&self) -> Option<Vec2> {
        self.sampled_points.first().copied()
    }

    /// Lowest sampled height.
    pub fn min_height(&self) -> f32 {
        self.sampled_points
            .iter()
            .map(|p| p.y)
            .fold(f32::INFINITY, f32::min)
    }

    pub fn width(&self) -> f32 {
        self.end_x - self.start_x
    }
}

/// Configuration for terrain generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Seed for both noise layers. None = fresh random seed per generator.
    pub seed: Option<u64>,
    /// World width of one character.
    pub char_width: f32,
    /// A control point every this many characters.
    pub point_stride: usize,
    /// Spacing between surface samples.
    pub sample_spacing: f32,
    /// Micro layer: bumpy detail.
    pub micro_frequency: f32,
    pub micro_amplitude: f32,
    pub micro_octaves: u32,
    /// Macro layer: hills and valleys, scaled by difficulty.
    pub macro_frequency: f32,
    pub macro_amplitude: f32,
    pub macro_octaves: u32,
    pub persistence: f32,
    /// Height change per world unit of X. Negative runs downhill.
    pub slope: f32,
    /// Largest height change between neighbouring control points.
    pub max_delta: f32,
    /// Share of a clamped step's error absorbed by the baseline (0..1).
    pub baseline_smoothing: f32,
    pub difficulty_start: f32,
    pub difficulty_step: f32,
    pub difficulty_max: f32,
    /// Per-segment growth of the micro frequency multiplier.
    pub frequency_step: f32,
    pub frequency_max: f32,
    pub goal_width: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            char_width: 0.5,
            point_stride: 4,
            sample_spacing: TERRAIN_SAMPLE_SPACING,
            micro_frequency: 0.9,
            micro_amplitude: 0.2,
            micro_octaves: 2,
            macro_frequency: 0.06,
            macro_amplitude: 1.0,
            macro_octaves: 3,
            persistence: 0.5,
            slope: -0.08,
            max_delta: 1.2,
            baseline_smoothing: 0.3,
            difficulty_start: 1.0,
            difficulty_step: 0.1,
            difficulty_max: 5.0,
            frequency_step: 0.02,
            frequency_max: 2.0,
            goal_width: 2.0,
        }
    }
}

/// Generator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeneratorPhase {
    Streaming,
    /// The goal segment has been emitted; nothing more will be produced.
    Completed,
}

/// Notable generator steps, reported to an optional `GeneratorLog`.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorEvent {
    SegmentBuilt {
        index: usize,
        start_x: f32,
        end_x: f32,
        control_points: usize,
        samples: usize,
        difficulty: f32,
    },
    FlatFallback {
        index: usize,
        chars: usize,
    },
    GoalEmitted {
        x: f32,
        y: f32,
    },
    Replayed {
        seed: u64,
    },
}

/// Receiver for generator instrumentation.
pub trait GeneratorLog {
    fn record(&mut self, event: &GeneratorEvent);
}

/// Forwards generator events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl GeneratorLog for LogSink {
    fn record(&mut self, event: &GeneratorEvent) {
        match event {
            GeneratorEvent::SegmentBuilt {
                index,
                start_x,
                end_x,
                control_points,
                samples,
                difficulty,
            } => log::debug!(
                "segment {index}: x {start_x:.2}..{end_x:.2}, {control_points} controls, {samples} samples, difficulty {difficulty:.1}"
            ),
            GeneratorEvent::FlatFallback { index, chars } => {
                log::debug!("segment {index}: {chars} chars too short, emitted flat")
            }
            GeneratorEvent::GoalEmitted { x, y } => log::info!("goal placed at ({x:.2}, {y:.2})"),
            GeneratorEvent::Replayed { seed } => log::info!("terrain replay from start, seed {seed}"),
        }
    }
}

/// Mutable bookkeeping carried from one segment to the next.
#[derive(Debug, Clone, Copy)]
struct StreamState {
    /// Right edge of the last segment.
    end_point: Vec2,
    /// Height of the last control point before smoothing.
    last_raw_y: f32,
    baseline_y: f32,
    difficulty: f32,
    frequency_scale: f32,
    segments: usize,
}

impl StreamState {
    fn new(config: &GeneratorConfig) -> Self {
        Self {
            end_point: Vec2::ZERO,
            last_raw_y: 0.0,
            baseline_y: 0.0,
            difficulty: config.difficulty_start,
            frequency_scale: 1.0,
            segments: 0,
        }
    }
}

/// Turns a line source into a stream of continuous terrain segments.
pub struct TerrainGenerator<S> {
    source: S,
    config: GeneratorConfig,
    seed: u64,
    micro: NoiseField,
    macro_: NoiseField,
    state: StreamState,
    phase: GeneratorPhase,
    log: Option<Box<dyn GeneratorLog>>,
}

impl<S: LineSource> TerrainGenerator<S> {
    pub fn new(source: S, config: GeneratorConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            source,
            micro: NoiseField::new(deterministic_noise_seed(seed, 0)),
            macro_: NoiseField::new(deterministic_noise_seed(seed, 1)),
            state: StreamState::new(&config),
            phase: GeneratorPhase::Streaming,
            config,
            seed,
            log: None,
        }
    }

    /// Attach an instrumentation sink.
    pub fn with_log(mut self, log: Box<dyn GeneratorLog>) -> Self {
        self.log = Some(log);
        self
    }

    fn emit(&mut self, event: GeneratorEvent) {
        if let Some(log) = self.log.as_mut() {
            log.record(&event);
        }
    }

    /// Produce the next segment if possible.
    ///
    /// Returns `None` when no line is ready yet (call again later) and
    /// forever after the goal segment. The goal is emitted exactly once,
    /// on the first call after the source reports exhaustion.
    pub fn generate_next(&mut self) -> Option<TerrainSegment> {
        if self.phase == GeneratorPhase::Completed {
            return None;
        }

        match self.source.pop_next_line() {
            Some(line) => Some(self.segment_from_line(line)),
            None if self.source.is_exhausted() => {
                self.phase = GeneratorPhase::Completed;
                Some(self.goal_segment())
            }
            None => None,
        }
    }

    fn segment_from_line(&mut self, line: String) -> TerrainSegment {
        let display_text = if line.is_empty() { " ".to_string() } else { line.clone() };
        let chars = display_text.chars().count();
        let start = self.state.end_point;
        let width = chars as f32 * self.config.char_width;
        let index = self.state.segments;

        let indices = control_indices(chars, self.config.point_stride);
        let degenerate = indices.len() < 2 || !(width >= MIN_SEGMENT_WIDTH * 0.5);

        let control_points = if degenerate {
            self.emit(GeneratorEvent::FlatFallback { index, chars });
            flat_span(start, width.max(MIN_SEGMENT_WIDTH))
        } else {
            let mut points = Vec::with_capacity(indices.len());
            // Pinned: the first segment starts at height 0 because the
            // initial end point is the origin.
            points.push(start);
            let mut prev_x = start.x;
            let last = indices.len() - 1;
            for (n, &i) in indices.iter().enumerate().skip(1) {
                // The last character closes the line at its full width.
                let x = if n == last {
                    start.x + width
                } else {
                    start.x + i as f32 * self.config.char_width
                };
                let y = self.next_height(x, x - prev_x);
                points.push(Vec2::new(x, y));
                prev_x = x;
            }
            points
        };

        let segment = self.finish_segment(line, display_text, control_points, false);
        self.emit(GeneratorEvent::SegmentBuilt {
            index,
            start_x: segment.start_x,
            end_x: segment.end_x,
            control_points: segment.control_points.len(),
            samples: segment.sampled_points.len(),
            difficulty: self.state.difficulty,
        });
        self.advance_difficulty();
        segment
    }

    /// Height of the next control point, `dx` to the right of the last.
    fn next_height(&mut self, x: f32, dx: f32) -> f32 {
        let cfg = &self.config;
        let state = &mut self.state;

        state.baseline_y += cfg.slope * dx;
        let micro = self.micro.octave_sample(
            x,
            cfg.micro_frequency * state.frequency_scale,
            cfg.micro_octaves,
            cfg.persistence,
        ) * cfg.micro_amplitude;
        let macro_ = self
            .macro_
            .octave_sample(x, cfg.macro_frequency, cfg.macro_octaves, cfg.persistence)
            * cfg.macro_amplitude
            * state.difficulty;

        let target = state.baseline_y + micro + macro_;
        let y = target.clamp(state.last_raw_y - cfg.max_delta, state.last_raw_y + cfg.max_delta);

        // When the clamp bites, move the baseline part way toward the
        // surface so the error fades out instead of accumulating.
        state.baseline_y += (y - target) * cfg.baseline_smoothing;
        state.last_raw_y = y;
        y
    }

    fn goal_segment(&mut self) -> TerrainSegment {
        let start = self.state.end_point;
        self.emit(GeneratorEvent::GoalEmitted {
            x: start.x,
            y: start.y,
        });
        let control_points = flat_span(start, self.config.goal_width);
        self.finish_segment(String::new(), "GOAL".to_string(), control_points, true)
    }

    /// Sample, reverse for winding and record the true right edge.
    fn finish_segment(
        &mut self,
        source_text: String,
        display_text: String,
        control_points: Vec<Vec2>,
        is_goal: bool,
    ) -> TerrainSegment {
        let mut sampled_points = spline::interpolate(&control_points, self.config.sample_spacing);
        sampled_points.reverse();

        let start_x = control_points.first().map_or(self.state.end_point.x, |p| p.x);
        let end_x = control_points.last().map_or(start_x, |p| p.x);
        if let Some(&end) = sampled_points.first() {
            self.state.end_point = end;
            self.state.last_raw_y = end.y;
        }
        self.state.segments += 1;

        TerrainSegment {
            source_text,
            display_text,
            control_points,
            sampled_points,
            start_x,
            end_x,
            is_goal,
        }
    }

    fn advance_difficulty(&mut self) {
        let cfg = &self.config;
        let state = &mut self.state;
        state.difficulty = (state.difficulty + cfg.difficulty_step).min(cfg.difficulty_max);
        state.frequency_scale = (state.frequency_scale + cfg.frequency_step).min(cfg.frequency_max);
    }

    /// Rewind the source and start over with the same seed, so the next
    /// segments repeat the run exactly. Returns false (and changes nothing)
    /// if the source cannot replay.
    pub fn replay(&mut self) -> bool {
        if !self.source.rewind() {
            return false;
        }
        self.state = StreamState::new(&self.config);
        self.phase = GeneratorPhase::Streaming;
        let seed = self.seed;
        self.emit(GeneratorEvent::Replayed { seed });
        true
    }

    /// Move emission back to the origin without touching the source:
    /// following segments use the lines not yet consumed. Difficulty keeps
    /// its progress. A completed generator goes back to streaming so the
    /// goal can be placed again.
    pub fn restart_geometry(&mut self) {
        self.state = StreamState {
            difficulty: self.state.difficulty,
            frequency_scale: self.state.frequency_scale,
            ..StreamState::new(&self.config)
        };
        self.phase = GeneratorPhase::Streaming;
    }

    pub fn is_complete(&self) -> bool {
        self.phase == GeneratorPhase::Completed
    }

    /// X where the next segment will start.
    pub fn current_x(&self) -> f32 {
        self.state.end_point.x
    }

    pub fn end_point(&self) -> Vec2 {
        self.state.end_point
    }

    pub fn difficulty(&self) -> f32 {
        self.state.difficulty
    }

    pub fn frequency_scale(&self) -> f32 {
        self.state.frequency_scale
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

/// Character indices that get a control point: every `stride`-th one, plus
/// the first and the last. A single character yields one index.
fn control_indices(chars: usize, stride: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..chars).step_by(stride.max(1)).collect();
    if let Some(last) = chars.checked_sub(1) {
        if indices.last() != Some(&last) {
            indices.push(last);
        }
    }
    indices
}

fn flat_span(start: Vec2, width: f32) -> Vec<Vec2> {
    vec![start, Vec2::new(start.x + width, start.y)]
}

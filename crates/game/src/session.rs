//! One run of the game: physics world, ball, streamed terrain and score.

use glam::Vec2;
use input::InputSnapshot;
use physics::{PhysicsError, PhysicsWorld, SoftBody, SoftBodyConfig, TerrainBody};
use procgen::{
    interpolate_closed, GeneratorConfig, LineSource, LogSink, TerrainGenerator, TerrainSegment,
    OUTLINE_SAMPLE_SPACING,
};
use serde::{Deserialize, Serialize};

use crate::scoring::Scoring;

/// What `restart` does with the terrain stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RestartPolicy {
    /// Keep reading where the stream left off; new terrain starts back at
    /// the origin.
    Continue,
    /// Rewind the source and regenerate with the same seed, repeating the
    /// level exactly. Falls back to `Continue` for sources that can't rewind.
    #[default]
    Replay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    GameOver,
    LevelComplete,
}

impl SessionState {
    /// Terminal states wait for `restart`.
    pub fn is_terminal(self) -> bool {
        self != SessionState::Running
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub start_position: Vec2,
    /// Segments generated up front (fewer if the source is slow).
    pub initial_segments: usize,
    /// How far ahead of the ball terrain must exist.
    pub look_ahead: f32,
    /// Distance below the lowest terrain at which the ball counts as lost.
    pub fall_margin: f32,
    pub restart_policy: RestartPolicy,
    pub generator: GeneratorConfig,
    pub soft_body: SoftBodyConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_position: Vec2::new(5.0, 3.0),
            initial_segments: 5,
            look_ahead: 50.0,
            fall_margin: 10.0,
            restart_policy: RestartPolicy::default(),
            generator: GeneratorConfig::default(),
            soft_body: SoftBodyConfig::default(),
        }
    }
}

pub struct GameSession<S> {
    config: SessionConfig,
    world: PhysicsWorld,
    ball: SoftBody,
    terrain: TerrainBody,
    generator: TerrainGenerator<S>,
    segments: Vec<TerrainSegment>,
    scoring: Scoring,
    state: SessionState,
    elapsed: f32,
    last_ball_x: f32,
    /// Lowest sampled terrain height so far. Starts at 0, the height of
    /// the first segment's left edge.
    lowest_terrain_y: f32,
}

impl<S: LineSource> GameSession<S> {
    pub fn new(source: S, config: SessionConfig) -> Result<Self, PhysicsError> {
        let mut world = PhysicsWorld::new();
        let ball = SoftBody::spawn(&mut world, config.start_position, config.soft_body.clone());
        let generator =
            TerrainGenerator::new(source, config.generator.clone()).with_log(Box::new(LogSink));
        log::info!("session started, terrain seed {}", generator.seed());

        let mut session = Self {
            last_ball_x: config.start_position.x,
            config,
            world,
            ball,
            terrain: TerrainBody::new(),
            generator,
            segments: Vec::new(),
            scoring: Scoring::new(),
            state: SessionState::Running,
            elapsed: 0.0,
            lowest_terrain_y: 0.0,
        };
        session.generate_initial()?;
        Ok(session)
    }

    /// Advance one frame. Does nothing once the run is over.
    pub fn update(&mut self, dt: f32, input: &InputSnapshot) -> Result<(), PhysicsError> {
        if self.state.is_terminal() {
            return Ok(());
        }
        self.elapsed += dt;

        self.process_input(dt, input)?;
        self.world.step(dt);

        let position = self.ball.center_position(&self.world)?;
        let distance = position.x - self.last_ball_x;
        if distance > 0.0 {
            let speed = self.ball.speed(&self.world)?;
            self.scoring.update(distance, speed, dt);
        }
        self.last_ball_x = position.x;

        self.generate_ahead(position.x)?;
        self.check_terminal(position);
        Ok(())
    }

    fn process_input(&mut self, dt: f32, input: &InputSnapshot) -> Result<(), PhysicsError> {
        let direction = input.direction();
        if direction != 0.0 {
            self.ball.apply_movement(&mut self.world, direction)?;
        }

        if input.jump_just_pressed {
            self.ball.start_compression();
        }
        if input.jump_held {
            self.ball.update_compression(&mut self.world, dt)?;
        }
        if input.jump_just_released {
            self.ball.release_jump(&mut self.world, direction)?;
        }
        Ok(())
    }

    fn generate_initial(&mut self) -> Result<(), PhysicsError> {
        for _ in 0..self.config.initial_segments {
            if let Some(segment) = self.generator.generate_next() {
                self.push_segment(segment)?;
            }
        }
        Ok(())
    }

    fn generate_ahead(&mut self, ball_x: f32) -> Result<(), PhysicsError> {
        let horizon = ball_x + self.config.look_ahead;
        while self.generator.current_x() < horizon && !self.generator.is_complete() {
            match self.generator.generate_next() {
                Some(segment) => self.push_segment(segment)?,
                None => break,
            }
        }
        Ok(())
    }

    fn push_segment(&mut self, segment: TerrainSegment) -> Result<(), PhysicsError> {
        self.terrain.add_segment(&mut self.world, &segment.sampled_points)?;
        self.lowest_terrain_y = self.lowest_terrain_y.min(segment.min_height());
        self.segments.push(segment);
        Ok(())
    }

    fn check_terminal(&mut self, position: Vec2) {
        if position.y < self.fall_floor() {
            self.state = SessionState::GameOver;
            log::info!(
                "ball lost at ({:.1}, {:.1}) after {:.1}s, score {}",
                position.x,
                position.y,
                self.elapsed,
                self.scoring.score()
            );
        } else if self
            .segments
            .iter()
            .any(|segment| segment.is_goal && position.x >= segment.end_x)
        {
            self.state = SessionState::LevelComplete;
            log::info!(
                "level complete in {:.1}s, score {}",
                self.elapsed,
                self.scoring.score()
            );
        }
    }

    /// Height below which the ball is considered lost.
    pub fn fall_floor(&self) -> f32 {
        self.lowest_terrain_y - self.config.fall_margin
    }

    /// Start over with a fresh ball, empty terrain and zero score.
    pub fn restart(&mut self) -> Result<(), PhysicsError> {
        self.terrain.clear(&mut self.world);
        self.segments.clear();
        self.scoring.reset();

        self.ball.respawn(&mut self.world, self.config.start_position);

        let replayed = match self.config.restart_policy {
            RestartPolicy::Replay => self.generator.replay(),
            RestartPolicy::Continue => false,
        };
        if !replayed {
            if self.config.restart_policy == RestartPolicy::Replay {
                log::warn!("line source cannot rewind; continuing the stream instead");
            }
            self.generator.restart_geometry();
        }

        self.state = SessionState::Running;
        self.elapsed = 0.0;
        self.last_ball_x = self.config.start_position.x;
        self.lowest_terrain_y = 0.0;
        self.generate_initial()?;
        log::info!("session restarted ({:?})", self.config.restart_policy);
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> u64 {
        self.scoring.score()
    }

    pub fn multiplier(&self) -> f32 {
        self.scoring.multiplier()
    }

    pub fn scoring(&self) -> &Scoring {
        &self.scoring
    }

    /// Seconds simulated since the run started.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn segments(&self) -> &[TerrainSegment] {
        &self.segments
    }

    pub fn ball(&self) -> &SoftBody {
        &self.ball
    }

    pub fn ball_position(&self) -> Result<Vec2, PhysicsError> {
        self.ball.center_position(&self.world)
    }

    /// Smooth closed outline of the ball for drawing.
    pub fn ball_outline(&self) -> Result<Vec<Vec2>, PhysicsError> {
        let rims = self.ball.outline(&self.world)?;
        Ok(interpolate_closed(&rims, OUTLINE_SAMPLE_SPACING))
    }

    pub fn is_on_ground(&self) -> bool {
        self.ball.is_on_ground(&self.world)
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn generator(&self) -> &TerrainGenerator<S> {
        &self.generator
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

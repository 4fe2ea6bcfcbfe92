//! A simulated shooting range for tests and demos
//!
//! The arena is a flat world of colored discs seen through a virtual camera.
//! Pointer moves turn the camera, a click destroys the disc under the aim
//! point, and destroyed discs respawn from a seeded sequence. Every clone of
//! an [`Arena`] shares the same world, so one clone can be the frame source
//! while another is the actuator.

use crate::devices::{ActivationInput, Actuator, FrameSource};
use crate::error::Result;
use crate::types::{Frame, ImageData, ImageFormat};
use blobtrack::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;

/// BGR color matching the default detector calibration (HSV 100, 255, 255)
pub const TARGET_BGR: [u8; 3] = [255, 170, 0];
pub const BACKGROUND_BGR: [u8; 3] = [40, 40, 40];

#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// Capture region size
    pub view_width: u32,
    pub view_height: u32,
    /// Half-extent of the square spawn area around the world origin
    pub spawn_extent: f32,
    pub target_radius: f32,
    pub num_targets: usize,
    /// Pointer counts per world pixel, matching the scheduler sensitivity
    pub sensitivity: f32,
    pub seed: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            view_width: 800,
            view_height: 640,
            spawn_extent: 300.0,
            target_radius: 14.0,
            num_targets: 3,
            sensitivity: 1.0,
            seed: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimTarget {
    pub position: Point,
    pub radius: f32,
}

#[derive(Debug)]
struct World {
    config: ArenaConfig,
    rng: StdRng,
    targets: Vec<SimTarget>,
    /// World point under the aim origin
    camera: Point,
    button_down: bool,
    toggle_down: bool,
    clicks: u64,
    destroyed: u64,
    frames: u64,
}

impl World {
    fn spawn(&mut self) -> SimTarget {
        let e = self.config.spawn_extent;
        let position = Point::new(
            self.rng.random_range(-e..=e),
            self.rng.random_range(-e..=e),
        );
        SimTarget {
            position,
            radius: self.config.target_radius,
        }
    }

    /// Top-left world coordinate of the view
    fn view_corner(&self) -> (i64, i64) {
        (
            self.camera.x.floor() as i64 - (self.config.view_width / 2) as i64,
            self.camera.y.floor() as i64 - (self.config.view_height / 2) as i64,
        )
    }

    fn render(&self) -> Frame {
        let (w, h) = (self.config.view_width, self.config.view_height);
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for _ in 0..w * h {
            data.extend_from_slice(&BACKGROUND_BGR);
        }

        let (ox, oy) = self.view_corner();
        for target in &self.targets {
            let r = target.radius;
            let cx = target.position.x - ox as f32;
            let cy = target.position.y - oy as f32;
            let x0 = (cx - r).floor().max(0.0) as u32;
            let y0 = (cy - r).floor().max(0.0) as u32;
            let x1 = (((cx + r).floor() + 1.0).max(0.0) as u32).min(w);
            let y1 = (((cy + r).floor() + 1.0).max(0.0) as u32).min(h);
            for y in y0..y1 {
                for x in x0..x1 {
                    let dx = x as f32 - cx;
                    let dy = y as f32 - cy;
                    if dx * dx + dy * dy <= r * r {
                        let i = ((y * w + x) * 3) as usize;
                        data[i..i + 3].copy_from_slice(&TARGET_BGR);
                    }
                }
            }
        }

        Frame::new(
            ImageData::new(data, w, h, ImageFormat::BGR),
            (ox as i32, oy as i32),
        )
    }

    /// World point currently under the frame's aim origin
    fn aim_point(&self) -> Point {
        let (ox, oy) = self.view_corner();
        Point::new(
            (ox + (self.config.view_width / 2) as i64) as f32,
            (oy + (self.config.view_height / 2) as i64) as f32,
        )
    }

    fn shoot(&mut self) {
        self.clicks += 1;
        let aim = self.aim_point();
        let hit = self
            .targets
            .iter()
            .position(|t| t.position.distance_to(&aim) <= t.radius);
        if let Some(idx) = hit {
            self.destroyed += 1;
            let replacement = self.spawn();
            log::debug!(
                "Arena: destroyed target at {}, respawned at {}",
                self.targets[idx].position,
                replacement.position
            );
            self.targets[idx] = replacement;
        }
    }
}

/// Shared handle to a simulated world
#[derive(Debug, Clone)]
pub struct Arena {
    world: Rc<RefCell<World>>,
}

impl Arena {
    pub fn new(config: ArenaConfig) -> Self {
        log::info!(
            "Creating Arena: view {}x{}, {} targets, seed {}",
            config.view_width,
            config.view_height,
            config.num_targets,
            config.seed
        );
        let mut world = World {
            rng: StdRng::seed_from_u64(config.seed),
            targets: Vec::with_capacity(config.num_targets),
            camera: Point::default(),
            button_down: false,
            toggle_down: false,
            clicks: 0,
            destroyed: 0,
            frames: 0,
            config,
        };
        for _ in 0..world.config.num_targets {
            let target = world.spawn();
            world.targets.push(target);
        }
        Self {
            world: Rc::new(RefCell::new(world)),
        }
    }

    /// Arena with explicit initial target placements
    pub fn with_targets(config: ArenaConfig, targets: Vec<SimTarget>) -> Self {
        let arena = Self::new(ArenaConfig {
            num_targets: 0,
            ..config
        });
        arena.world.borrow_mut().targets = targets;
        arena
    }

    pub fn targets(&self) -> Vec<SimTarget> {
        self.world.borrow().targets.clone()
    }

    pub fn camera(&self) -> Point {
        self.world.borrow().camera
    }

    pub fn clicks(&self) -> u64 {
        self.world.borrow().clicks
    }

    pub fn destroyed(&self) -> u64 {
        self.world.borrow().destroyed
    }

    pub fn frames_rendered(&self) -> u64 {
        self.world.borrow().frames
    }

    /// Hold or release the simulated toggle key
    pub fn set_toggle_down(&self, down: bool) {
        self.world.borrow_mut().toggle_down = down;
    }
}

impl FrameSource for Arena {
    fn grab(&mut self) -> Result<Frame> {
        let mut world = self.world.borrow_mut();
        world.frames += 1;
        Ok(world.render())
    }
}

impl Actuator for Arena {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<()> {
        let mut world = self.world.borrow_mut();
        let s = world.config.sensitivity;
        world.camera = world.camera.translated(dx as f32 / s, dy as f32 / s);
        Ok(())
    }

    fn press_primary(&mut self) -> Result<()> {
        self.world.borrow_mut().button_down = true;
        Ok(())
    }

    fn release_primary(&mut self) -> Result<()> {
        let mut world = self.world.borrow_mut();
        if world.button_down {
            world.button_down = false;
            world.shoot();
        }
        Ok(())
    }
}

impl ActivationInput for Arena {
    fn is_toggle_down(&mut self) -> bool {
        self.world.borrow().toggle_down
    }
}

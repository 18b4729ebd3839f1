// Game rules: scene setup, per-frame update, scoring and the countdown

use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::camera::Camera;
use crate::config::GameConfig;
use crate::scene::{Drawable, Scene, SceneNode};

pub const EYE: &str = "eye";
pub const CROSSHAIR: &str = "crosshair";
pub const GRASS: &str = "grass";

/// Frames left once the first hit starts the clock (20 s at 25 ms a frame).
pub const TIMER_FRAMES: i32 = 800;
/// Radians the eye spins about +Y every frame.
pub const EYE_SPIN: f32 = 0.3;
/// Where the eye sits before the first hit.
pub const EYE_START: Vec3 = Vec3::new(1.0, 0.2, 0.0);

// Respawn bounds, in world units from the player.
const MIN_COORD: f32 = 10.0;
const MAX_COORD: f32 = 20.0;

/// Everything the frame loop learned from the window since the last frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Relative mouse motion, screen x right and y down.
    pub mouse_delta: (f32, f32),
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Left button pressed this frame.
    pub fire: bool,
    pub quit: bool,
}

/// Owns the camera and scene and applies the rules once per frame.
pub struct Game {
    config: GameConfig,
    camera: Camera,
    scene: Scene,
    rng: StdRng,
    eye_target: Vec3,
    score: u32,
    timer: i32,
    timer_started: bool,
    finished: bool,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let seed = config.seed.unwrap_or_else(time_seed);
        log::debug!("Eye placement seed: {seed}");

        let mut camera = Camera::new();
        camera.set_eye_position(0.0, 0.0, 0.0);

        Self {
            config,
            camera,
            scene: build_scene(),
            rng: StdRng::seed_from_u64(seed),
            eye_target: EYE_START,
            score: 0,
            timer: TIMER_FRAMES,
            timer_started: false,
            finished: false,
        }
    }

    /// Advance one frame.
    pub fn update(&mut self, input: &FrameInput) {
        if self.finished {
            return;
        }
        if input.quit {
            log::info!("Quit requested");
            self.finished = true;
            return;
        }

        let (dx, dy) = input.mouse_delta;
        if dx != 0.0 || dy != 0.0 {
            // screen motion is inverted relative to the rotation direction
            self.camera.mouse_look(self.config.sensitivity, -dx, -dy);
            self.place_crosshair();
        }

        self.apply_movement(input);

        if input.fire && self.camera.looking_at_eye(self.eye_target) {
            self.on_hit();
        }

        if let Some(eye) = self.scene.node_mut(EYE) {
            eye.local_transform_mut().rotate(EYE_SPIN, 0.0, 1.0, 0.0);
        }

        if self.timer_started {
            self.timer -= 1;
            log::debug!("Timer: {}", self.timer);
            if self.timer < 0 {
                log::info!("Time is up");
                self.finished = true;
            }
        }
    }

    fn apply_movement(&mut self, input: &FrameInput) {
        let speed = self.config.camera_speed;
        let cam = &mut self.camera;
        if input.forward {
            cam.move_forward(speed);
        }
        if input.backward {
            cam.move_backward(speed);
        }
        if input.left {
            cam.move_left(speed);
        }
        if input.right {
            cam.move_right(speed);
        }
        if input.up {
            cam.move_up(speed);
        }
        if input.down {
            cam.move_down(speed);
        }
    }

    fn on_hit(&mut self) {
        let target = Vec3::new(
            random_xz(&mut self.rng, MIN_COORD, MAX_COORD),
            random_y(&mut self.rng, MAX_COORD),
            random_xz(&mut self.rng, MIN_COORD, MAX_COORD),
        );
        self.eye_target = target;

        // the respawned eye keeps unit scale, which lines it up with the hit radius
        if let Some(eye) = self.scene.node_mut(EYE) {
            eye.local_transform_mut()
                .load_identity()
                .translate(target.x, target.y, target.z);
        }

        self.score += 1;
        self.timer_started = true;
        log::info!("Hit! Score: {}", self.score);
        log::debug!("Eye moved to {target}");
    }

    /// Keeps the crosshair just in front of the camera along the view.
    fn place_crosshair(&mut self) {
        let view = self.camera.view_direction() * 200.0;
        if let Some(crosshair) = self.scene.node_mut(CROSSHAIR) {
            crosshair
                .local_transform_mut()
                .load_identity()
                .scale(0.0005, 0.0005, 0.0005)
                .translate(view.x, view.y, view.z);
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current world position the gaze test aims at.
    pub fn eye_target(&self) -> Vec3 {
        self.eye_target
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn timer(&self) -> i32 {
        self.timer
    }

    pub fn timer_started(&self) -> bool {
        self.timer_started
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

fn build_scene() -> Scene {
    let mut scene = Scene::new();

    let mut crosshair = SceneNode::new(CROSSHAIR, Drawable::Sphere { color: [1.0, 0.1, 0.1, 1.0] });
    crosshair
        .local_transform_mut()
        .load_identity()
        .translate(0.0, 0.0, 1.0)
        .scale(0.005, 0.005, 0.005);

    let mut eye = SceneNode::new(EYE, Drawable::Eyeball { color: [1.0, 0.97, 0.95, 1.0] });
    eye.local_transform_mut()
        .load_identity()
        .translate(EYE_START.x, EYE_START.y, EYE_START.z)
        .scale(0.05, 0.05, 0.05);

    let mut grass = SceneNode::new(GRASS, Drawable::Quad { color: [0.2, 0.6, 0.15, 1.0] });
    grass
        .local_transform_mut()
        .load_identity()
        .translate(0.0, -3.0, 0.0)
        .rotate(90f32.to_radians(), 1.0, 0.0, 0.0)
        .scale(50.0, 50.0, 50.0);

    let root = scene.root_mut();
    root.add_child(crosshair);
    root.add_child(eye);
    root.add_child(grass);
    scene
}

/// Uniform in `±[min, min + (max - min) / 2)`, never closer to zero than `min`.
pub fn random_xz(rng: &mut StdRng, min: f32, max: f32) -> f32 {
    let half = (max - min) / 2.0;
    let r: f32 = rng.random_range(-half..half);
    if r > 0.0 {
        r + min
    } else {
        r - min
    }
}

/// Uniform in `[0, max / 4]`.
pub fn random_y(rng: &mut StdRng, max: f32) -> f32 {
    rng.random_range(0.0..=max / 4.0)
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn game() -> Game {
        Game::new(GameConfig {
            seed: Some(42),
            ..GameConfig::default()
        })
    }

    /// Mouse motion that yaws the default camera onto +X, where the eye starts.
    fn aim_at_start() -> FrameInput {
        FrameInput {
            mouse_delta: (-FRAC_PI_2 / crate::config::DEFAULT_SENSITIVITY, 0.0),
            fire: true,
            ..FrameInput::default()
        }
    }

    #[test]
    fn scene_layout() {
        let game = game();
        let names: Vec<_> = game.scene().draw_list().into_iter().map(|d| d.name).collect();
        assert_eq!(names, [CROSSHAIR, EYE, GRASS]);

        let grass = game.scene().world_transform(GRASS).unwrap();
        assert!(grass.transform_point3(Vec3::ZERO).abs_diff_eq(Vec3::new(0.0, -3.0, 0.0), 1e-5));
        // the quad normal (+Z) now points along -Y, so it lies flat
        let normal = grass.transform_vector3(Vec3::Z).normalize();
        assert_relative_eq!(normal.y.abs(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn miss_does_not_score() {
        let mut game = game();
        game.update(&FrameInput {
            fire: true,
            ..FrameInput::default()
        });
        assert_eq!(game.score(), 0);
        assert!(!game.timer_started());
        assert_eq!(game.eye_target(), EYE_START);
    }

    #[test]
    fn hit_scores_and_respawns() {
        let mut game = game();
        game.update(&aim_at_start());

        assert_eq!(game.score(), 1);
        assert!(game.timer_started());
        assert_eq!(game.timer(), TIMER_FRAMES - 1);

        let target = game.eye_target();
        assert!(target.x.abs() >= MIN_COORD && target.z.abs() >= MIN_COORD);
        let eye = game.scene().world_transform(EYE).unwrap();
        assert!(eye.transform_point3(Vec3::ZERO).abs_diff_eq(target, 1e-4));
    }

    #[test]
    fn timer_ends_the_game() {
        let mut game = game();
        game.update(&aim_at_start());
        let idle = FrameInput::default();
        for _ in 0..TIMER_FRAMES - 1 {
            game.update(&idle);
        }
        assert!(!game.is_finished());
        assert_eq!(game.timer(), 0);
        game.update(&idle);
        assert!(game.is_finished());
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn timer_waits_for_first_hit() {
        let mut game = game();
        for _ in 0..1000 {
            game.update(&FrameInput::default());
        }
        assert!(!game.is_finished());
        assert_eq!(game.timer(), TIMER_FRAMES);
    }

    #[test]
    fn quit_finishes_immediately() {
        let mut game = game();
        game.update(&FrameInput {
            quit: true,
            ..FrameInput::default()
        });
        assert!(game.is_finished());
    }

    #[test]
    fn crosshair_follows_view() {
        let mut game = game();
        game.update(&FrameInput {
            mouse_delta: (120.0, -40.0),
            ..FrameInput::default()
        });
        let view = game.camera().view_direction();
        let crosshair = game.scene().world_transform(CROSSHAIR).unwrap();
        // scale is applied before the translation, so 200 * 0.0005 = 0.1
        assert!(crosshair.transform_point3(Vec3::ZERO).abs_diff_eq(view * 0.1, 1e-5));
    }

    #[test]
    fn eye_spins_in_place() {
        let mut game = game();
        let before = game.scene().world_transform(EYE).unwrap();
        game.update(&FrameInput::default());
        let after = game.scene().world_transform(EYE).unwrap();
        assert!(after
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(before.transform_point3(Vec3::ZERO), 1e-6));
        assert!(!after.abs_diff_eq(before, 1e-6));
    }

    #[test]
    fn movement_keys_move_camera() {
        let mut game = game();
        game.update(&FrameInput {
            forward: true,
            right: true,
            ..FrameInput::default()
        });
        let speed = game.config().camera_speed;
        assert_eq!(game.camera().eye_position(), Vec3::new(speed, 0.0, -speed));
    }

    #[test]
    fn respawn_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let xz = random_xz(&mut rng, MIN_COORD, MAX_COORD);
            assert!((10.0..=15.0).contains(&xz.abs()), "{xz}");
            let y = random_y(&mut rng, MAX_COORD);
            assert!((0.0..=5.0).contains(&y), "{y}");
        }
    }
}

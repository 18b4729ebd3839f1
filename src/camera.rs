// First-person camera used for aiming

use glam::{Mat4, Quat, Vec3};

/// Radius around the projected gaze point that counts as a hit.
pub const EYE_HIT_RADIUS: f32 = 1.0;

/// Viewer pose: where the eye is, where it looks, and which way is up.
///
/// `up_vector` never changes after construction; there is no roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    eye_position: Vec3,
    view_direction: Vec3,
    up_vector: Vec3,
    // last unit `view x up`, used while the view is parallel to up
    pitch_axis: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye_position: Vec3::ZERO,
            view_direction: Vec3::Z,
            up_vector: Vec3::Y,
            pitch_axis: Vec3::Z.cross(Vec3::Y),
        }
    }
}

impl Camera {
    /// Camera at the origin looking down +Z with +Y up.
    pub fn new() -> Self {
        log::debug!("Created a camera");
        Self::default()
    }

    /// Yaw by `dx * sensitivity` about the up vector, then pitch by
    /// `dy * sensitivity` about `view x up` of the already-yawed direction.
    ///
    /// Pitch is not clamped, so the view can flip past vertical. While the
    /// view direction is parallel to up, the last usable pitch axis (yawed
    /// along with the view) stands in for `view x up`.
    pub fn mouse_look(&mut self, sensitivity: f32, dx: f32, dy: f32) {
        let yaw = dx * sensitivity;
        self.view_direction = rotate_about(self.view_direction, yaw, self.up_vector);
        self.pitch_axis = rotate_about(self.pitch_axis, yaw, self.up_vector);

        let right = self.view_direction.cross(self.up_vector);
        if right.length_squared() > 1e-12 {
            self.pitch_axis = right.normalize();
        }
        self.view_direction = rotate_about(self.view_direction, dy * sensitivity, self.pitch_axis);
    }

    // Movement is along world axes, not relative to the view direction.

    pub fn move_forward(&mut self, speed: f32) {
        self.eye_position.z -= speed;
    }

    pub fn move_backward(&mut self, speed: f32) {
        self.eye_position.z += speed;
    }

    pub fn move_left(&mut self, speed: f32) {
        self.eye_position.x -= speed;
    }

    pub fn move_right(&mut self, speed: f32) {
        self.eye_position.x += speed;
    }

    pub fn move_up(&mut self, speed: f32) {
        self.eye_position.y += speed;
    }

    pub fn move_down(&mut self, speed: f32) {
        self.eye_position.y -= speed;
    }

    pub fn set_eye_position(&mut self, x: f32, y: f32, z: f32) {
        self.eye_position = Vec3::new(x, y, z);
    }

    /// View matrix looking from the eye towards `eye + view_direction`.
    pub fn world_to_view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(
            self.eye_position,
            self.eye_position + self.view_direction,
            self.up_vector,
        )
    }

    /// Approximate gaze test.
    ///
    /// Pushes the view direction out by the target's distance from the eye
    /// and checks whether the target sits within [`EYE_HIT_RADIUS`] of that
    /// point. The projected point is measured from the world origin, which
    /// matches the eye position while the player stays at the spawn point.
    pub fn looking_at_eye(&self, target: Vec3) -> bool {
        let distance_3d = target.distance(self.eye_position);
        let distance_2d = target.distance(distance_3d * self.view_direction);
        distance_2d < EYE_HIT_RADIUS
    }

    pub fn eye_position(&self) -> Vec3 {
        self.eye_position
    }

    pub fn view_direction(&self) -> Vec3 {
        self.view_direction
    }

    pub fn up_vector(&self) -> Vec3 {
        self.up_vector
    }

    pub fn eye_x(&self) -> f32 {
        self.eye_position.x
    }

    pub fn eye_y(&self) -> f32 {
        self.eye_position.y
    }

    pub fn eye_z(&self) -> f32 {
        self.eye_position.z
    }

    pub fn view_x(&self) -> f32 {
        self.view_direction.x
    }

    pub fn view_y(&self) -> f32 {
        self.view_direction.y
    }

    pub fn view_z(&self) -> f32 {
        self.view_direction.z
    }
}

fn rotate_about(v: Vec3, angle: f32, axis: Vec3) -> Vec3 {
    match axis.try_normalize() {
        Some(axis) => Quat::from_axis_angle(axis, angle) * v,
        None => v,
    }
}

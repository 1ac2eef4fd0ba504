use serde::{
    Deserialize,
    Serialize
};

pub type Vector3F = Vector3X<f32>;
pub type Vector3I = Vector3X<i32>;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Vector3X<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

/// Unit quaternion, `w` is the scalar part.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// Rotation followed by translation, the pose of an object in its parent frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vector3F,
    pub rotation: Quaternion,
}

impl<T: std::fmt::Display> std::fmt::Display for Vector3X<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{},{}]", self.x, self.y, self.z)
    }
}

impl std::fmt::Display for Quaternion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{};{})", self.x, self.y, self.z, self.w)
    }
}

impl<T> Vector3X<T>
where
    T: Default
{
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self { x: T::default(), y: T::default(), z: T::default() }
    }
}

impl<T> Vector3X<T>
where
    T: Into<f32> + Copy
{
    pub fn length_squared(&self) -> f32 {
        let xf: f32 = T::into(self.x);
        let yf: f32 = T::into(self.y);
        let zf: f32 = T::into(self.z);
        xf.powi(2) + yf.powi(2) + zf.powi(2)
    }

    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }
}

impl Vector3X<f32>
{
    pub fn dot(&self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(&self, rhs: Self) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    /// Component-wise closeness check, used mostly by tests.
    pub fn approx_eq(&self, rhs: &Self, epsilon: f32) -> bool {
        (self.x - rhs.x).abs() <= epsilon
            && (self.y - rhs.y).abs() <= epsilon
            && (self.z - rhs.z).abs() <= epsilon
    }
}

impl<T> std::ops::Add for Vector3X<T>
where
    T: std::ops::Add<Output = T>
{
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl<T> std::ops::AddAssign for Vector3X<T>
where
    T: std::ops::AddAssign
{
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl<T> std::ops::Neg for Vector3X<T>
where
    T: std::ops::Neg<Output = T>
{
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self {
            x: T::neg(self.x),
            y: T::neg(self.y),
            z: T::neg(self.z),
        }
    }
}

impl<T> std::ops::Mul<T> for Vector3X<T>
where
    T: std::ops::Mul<Output = T> + Copy
{
    type Output = Self;
    fn mul(self, rhs: T) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl<T> std::ops::Sub for Vector3X<T>
where
    T: std::ops::Sub<Output = T>
{
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: T::sub(self.x, rhs.x),
            y: T::sub(self.y, rhs.y),
            z: T::sub(self.z, rhs.z),
        }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians around `axis` (normalized here).
    pub fn from_axis_angle(axis: Vector3F, angle: f32) -> Self {
        let len = axis.length();
        if len == 0.0 {
            return Self::IDENTITY;
        }
        let (sin, cos) = (angle * 0.5).sin_cos();
        let s = sin / len;
        Self {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: cos,
        }
    }

    pub fn length_squared(&self) -> f32 {
        self.x.powi(2) + self.y.powi(2) + self.z.powi(2) + self.w.powi(2)
    }

    pub fn normalized(&self) -> Self {
        let len = self.length_squared().sqrt();
        if len == 0.0 {
            return Self::IDENTITY;
        }
        Self {
            x: self.x / len,
            y: self.y / len,
            z: self.z / len,
            w: self.w / len,
        }
    }

    /// Inverse of a rotation; for unit quaternions this is the conjugate.
    pub fn inverse(&self) -> Self {
        let len_sq = self.length_squared();
        if len_sq == 0.0 {
            return Self::IDENTITY;
        }
        Self {
            x: -self.x / len_sq,
            y: -self.y / len_sq,
            z: -self.z / len_sq,
            w: self.w / len_sq,
        }
    }

    pub fn rotate(&self, v: Vector3F) -> Vector3F {
        // v' = v + 2w(q x v) + 2(q x (q x v))
        let q = Vector3F::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }

    pub fn approx_eq(&self, rhs: &Self, epsilon: f32) -> bool {
        // q and -q are the same rotation
        let same = (self.x - rhs.x).abs() <= epsilon
            && (self.y - rhs.y).abs() <= epsilon
            && (self.z - rhs.z).abs() <= epsilon
            && (self.w - rhs.w).abs() <= epsilon;
        let flipped = (self.x + rhs.x).abs() <= epsilon
            && (self.y + rhs.y).abs() <= epsilon
            && (self.z + rhs.z).abs() <= epsilon
            && (self.w + rhs.w).abs() <= epsilon;
        same || flipped
    }
}

impl std::ops::Mul for Quaternion {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        }
    }
}

impl std::ops::Mul<Vector3F> for Quaternion {
    type Output = Vector3F;
    fn mul(self, rhs: Vector3F) -> Self::Output {
        self.rotate(rhs)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vector3F::zero(),
            rotation: Quaternion::IDENTITY,
        }
    }

    pub fn new(position: Vector3F, rotation: Quaternion) -> Self {
        Self { position, rotation }
    }

    pub fn with_position(mut self, position: Vector3F) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quaternion) -> Self {
        self.rotation = rotation;
        self
    }

    /// Maps a world-space point into this transform's local frame.
    pub fn inverse_transform_point(&self, point: Vector3F) -> Vector3F {
        self.rotation.inverse().rotate(point - self.position)
    }

    /// Maps a world-space orientation into this transform's local frame.
    pub fn inverse_transform_rotation(&self, rotation: Quaternion) -> Quaternion {
        self.rotation.inverse() * rotation
    }

    /// Maps a local-space point into the parent (world) frame.
    pub fn transform_point(&self, point: Vector3F) -> Vector3F {
        self.position + self.rotation.rotate(point)
    }

    /// World pose of a child given in this transform's local frame.
    pub fn compose(&self, local: &Transform) -> Transform {
        Transform {
            position: self.transform_point(local.position),
            rotation: self.rotation * local.rotation,
        }
    }

    /// Pose of `world` expressed in this transform's local frame.
    pub fn to_local(&self, world: &Transform) -> Transform {
        Transform {
            position: self.inverse_transform_point(world.position),
            rotation: self.inverse_transform_rotation(world.rotation),
        }
    }
}

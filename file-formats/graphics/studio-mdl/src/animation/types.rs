//! Pose types and rotation math for studio animation

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

/// Local position and rotation of a single bone
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct BonePose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for BonePose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Per-bone local pose produced by a sequence evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    bones: Vec<BonePose>,
}

impl Pose {
    /// Create a pose with `bone_count` identity bones
    pub fn new(bone_count: usize) -> Self {
        Self {
            bones: vec![BonePose::default(); bone_count],
        }
    }

    /// Resize to `bone_count` bones and reset every bone to identity
    pub fn reset(&mut self, bone_count: usize) {
        self.bones.clear();
        self.bones.resize(bone_count, BonePose::default());
    }

    /// Number of bones
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Check if the pose has no bones
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[BonePose] {
        &self.bones
    }

    pub fn bones_mut(&mut self) -> &mut [BonePose] {
        &mut self.bones
    }

    pub fn get(&self, bone: usize) -> Option<&BonePose> {
        self.bones.get(bone)
    }

    /// Copy bones `[0, end)` from another pose
    pub fn copy_prefix(&mut self, other: &Pose, end: usize) {
        let end = end.min(self.bones.len()).min(other.bones.len());
        self.bones[..end].copy_from_slice(&other.bones[..end]);
    }
}

/// Convert Euler angles in radians to a quaternion
///
/// `angles.x` rotates about X, `angles.y` about Y and `angles.z` about Z,
/// applied in Z, Y, X order.
pub fn angle_quaternion(angles: Vec3) -> Quat {
    let (sy, cy) = (angles.z * 0.5).sin_cos();
    let (sp, cp) = (angles.y * 0.5).sin_cos();
    let (sr, cr) = (angles.x * 0.5).sin_cos();

    Quat::from_xyzw(
        sr * cp * cy - cr * sp * sy,
        cr * sp * cy + sr * cp * sy,
        cr * cp * sy - sr * sp * cy,
        cr * cp * cy + sr * sp * sy,
    )
}

/// Spherical interpolation between two quaternions
///
/// `t <= 0` returns `p` and `t >= 1` returns `q` unchanged. In between, `q`
/// is flipped onto the hemisphere of `p` first. Nearly identical inputs
/// interpolate linearly; opposite inputs rotate through a perpendicular
/// quaternion.
pub fn quaternion_slerp(p: Quat, q: Quat, t: f32) -> Quat {
    if t <= 0.0 {
        return p;
    }
    if t >= 1.0 {
        return q;
    }

    let pa = p.to_array();
    let mut qa = q.to_array();

    let mut a = 0.0;
    let mut b = 0.0;
    for i in 0..4 {
        a += (pa[i] - qa[i]) * (pa[i] - qa[i]);
        b += (pa[i] + qa[i]) * (pa[i] + qa[i]);
    }
    if a > b {
        for value in &mut qa {
            *value = -*value;
        }
    }

    let cosom = pa[0] * qa[0] + pa[1] * qa[1] + pa[2] * qa[2] + pa[3] * qa[3];
    let mut out = [0.0f32; 4];

    if 1.0 + cosom > 0.000_001 {
        let (sclp, sclq) = if 1.0 - cosom > 0.000_001 {
            let omega = cosom.acos();
            let sinom = omega.sin();
            (
                ((1.0 - t) * omega).sin() / sinom,
                (t * omega).sin() / sinom,
            )
        } else {
            (1.0 - t, t)
        };
        for i in 0..4 {
            out[i] = sclp * pa[i] + sclq * qa[i];
        }
    } else {
        out = [-qa[1], qa[0], -qa[3], qa[2]];
        let sclp = ((1.0 - t) * FRAC_PI_2).sin();
        let sclq = (t * FRAC_PI_2).sin();
        for i in 0..3 {
            out[i] = sclp * pa[i] + sclq * out[i];
        }
    }

    Quat::from_array(out)
}

/// Remainder of `value / modulus` truncated toward zero
pub fn trunc_mod(value: f32, modulus: f32) -> f32 {
    value - (value / modulus).trunc() * modulus
}

/// Bring an angle difference in degrees into `[-180, 180]` with one step
pub fn wrap_degrees(delta: f32) -> f32 {
    if delta > 180.0 {
        delta - 360.0
    } else if delta < -180.0 {
        delta + 360.0
    } else {
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::f32::consts::PI;

    fn approx_quat(a: Quat, b: Quat) -> bool {
        (a.x - b.x).abs() < 1e-5
            && (a.y - b.y).abs() < 1e-5
            && (a.z - b.z).abs() < 1e-5
            && (a.w - b.w).abs() < 1e-5
    }

    #[test]
    fn test_angle_quaternion_axes() {
        let test_cases = vec![
            (Vec3::ZERO, Quat::IDENTITY),
            (Vec3::new(PI / 2.0, 0.0, 0.0), Quat::from_rotation_x(PI / 2.0)),
            (Vec3::new(0.0, PI / 2.0, 0.0), Quat::from_rotation_y(PI / 2.0)),
            (Vec3::new(0.0, 0.0, PI / 2.0), Quat::from_rotation_z(PI / 2.0)),
        ];

        for (angles, expected) in test_cases {
            let q = angle_quaternion(angles);
            assert!(approx_quat(q, expected), "{angles:?}: {q:?} != {expected:?}");
        }
    }

    #[test]
    fn test_slerp_endpoints_are_exact() {
        let p = angle_quaternion(Vec3::new(0.3, -0.2, 1.1));
        let q = angle_quaternion(Vec3::new(-0.4, 0.9, 0.1));

        assert_eq!(quaternion_slerp(p, q, 0.0), p);
        assert_eq!(quaternion_slerp(p, q, 1.0), q);
        assert_eq!(quaternion_slerp(p, q, -3.0), p);
        assert_eq!(quaternion_slerp(p, q, 7.0), q);
    }

    #[test]
    fn test_slerp_midpoint() {
        let p = Quat::IDENTITY;
        let q = Quat::from_rotation_z(PI / 2.0);
        let mid = quaternion_slerp(p, q, 0.5);
        assert!(approx_quat(mid, Quat::from_rotation_z(PI / 4.0)));
    }

    #[test]
    fn test_slerp_takes_short_arc() {
        let p = Quat::IDENTITY;
        let q = -Quat::from_rotation_z(PI / 2.0);
        let mid = quaternion_slerp(p, q, 0.5);
        assert!(approx_quat(mid, Quat::from_rotation_z(PI / 4.0)));
    }

    #[test]
    fn test_slerp_nearly_equal_is_linear() {
        let p = Quat::from_rotation_x(0.1);
        let mid = quaternion_slerp(p, p, 0.25);
        assert!(approx_quat(mid, p));
    }

    #[test]
    fn test_trunc_mod_and_wrap() {
        let test_cases = vec![(370.0, 10.0), (-370.0, -10.0), (90.0, 90.0)];
        for (value, expected) in test_cases {
            assert!((trunc_mod(value, 360.0) - expected).abs() < 1e-4, "{value}");
        }

        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(45.0), 45.0);
    }

    #[test]
    fn test_pose_copy_prefix() {
        let mut pose = Pose::new(3);
        let mut other = Pose::new(3);
        for bone in other.bones_mut() {
            bone.position = Vec3::ONE;
        }

        pose.copy_prefix(&other, 2);
        assert_eq!(pose.bones()[0].position, Vec3::ONE);
        assert_eq!(pose.bones()[1].position, Vec3::ONE);
        assert_eq!(pose.bones()[2].position, Vec3::ZERO);

        pose.reset(1);
        assert_eq!(pose.len(), 1);
        assert_eq!(pose.get(0), Some(&BonePose::default()));
    }
}

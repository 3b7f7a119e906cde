//! Bone hierarchy transform computation for studio skeletal animation
//!
//! Local bone poses are turned into 3x4 matrices and concatenated down the
//! parent chain. Two matrices are kept per bone: the render matrix, which
//! may live in view space and carry render effects, and the light matrix,
//! which always stays in world space.

use std::collections::HashMap;

use glam::{Quat, Vec3};

use crate::chunks::{StudioAttachment, StudioBone};
use crate::error::{Result, StudioError};

use super::types::Pose;

/// Most attachments an entity can expose
pub const MAX_ATTACHMENTS: usize = 4;

/// 3x4 affine transformation matrix (row-major, translation in column 3)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Mat3x4 {
    pub rows: [[f32; 4]; 3],
}

impl Mat3x4 {
    /// Identity matrix
    pub const IDENTITY: Self = Self {
        rows: [
            [1.0, 0.0, 0.0, 0.0], // Row 0
            [0.0, 1.0, 0.0, 0.0], // Row 1
            [0.0, 0.0, 1.0, 0.0], // Row 2
        ],
    };

    /// Create rotation matrix from quaternion with a translation
    pub fn from_quat_position(q: Quat, position: Vec3) -> Self {
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);

        Self {
            rows: [
                [
                    1.0 - 2.0 * y * y - 2.0 * z * z,
                    2.0 * x * y - 2.0 * w * z,
                    2.0 * x * z + 2.0 * w * y,
                    position.x,
                ],
                [
                    2.0 * x * y + 2.0 * w * z,
                    1.0 - 2.0 * x * x - 2.0 * z * z,
                    2.0 * y * z - 2.0 * w * x,
                    position.y,
                ],
                [
                    2.0 * x * z - 2.0 * w * y,
                    2.0 * y * z + 2.0 * w * x,
                    1.0 - 2.0 * x * x - 2.0 * y * y,
                    position.z,
                ],
            ],
        }
    }

    /// Create rotation matrix from pitch, yaw and roll in degrees
    pub fn from_angles(angles: Vec3) -> Self {
        let (sp, cp) = angles.x.to_radians().sin_cos();
        let (sy, cy) = angles.y.to_radians().sin_cos();
        let (sr, cr) = angles.z.to_radians().sin_cos();

        Self {
            rows: [
                [cp * cy, sr * sp * cy + cr * -sy, cr * sp * cy + -sr * -sy, 0.0],
                [cp * sy, sr * sp * sy + cr * cy, cr * sp * sy + -sr * cy, 0.0],
                [-sp, sr * cp, cr * cp, 0.0],
            ],
        }
    }

    /// Concatenate two transforms (self applied after other)
    pub fn concat(&self, other: &Self) -> Self {
        let a = &self.rows;
        let b = &other.rows;
        let mut out = [[0.0f32; 4]; 3];

        for (r, row) in out.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = a[r][0] * b[0][c] + a[r][1] * b[1][c] + a[r][2] * b[2][c];
            }
            row[3] += a[r][3];
        }

        Self { rows: out }
    }

    /// Transform a point by this matrix
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let m = &self.rows;
        Vec3::new(
            m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3],
            m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3],
            m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3],
        )
    }

    /// Translation part of the matrix
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.rows[0][3], self.rows[1][3], self.rows[2][3])
    }

    pub fn set_translation(&mut self, t: Vec3) {
        self.rows[0][3] = t.x;
        self.rows[1][3] = t.y;
        self.rows[2][3] = t.z;
    }
}

impl Default for Mat3x4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Mat3x4 {
    type Output = Mat3x4;

    fn mul(self, rhs: Self) -> Self::Output {
        self.concat(&rhs)
    }
}

/// World-space render and light matrices for every bone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneTransforms {
    pub render: Vec<Mat3x4>,
    pub light: Vec<Mat3x4>,
}

impl BoneTransforms {
    pub fn new(bone_count: usize) -> Self {
        Self {
            render: vec![Mat3x4::IDENTITY; bone_count],
            light: vec![Mat3x4::IDENTITY; bone_count],
        }
    }

    /// Resize to `bone_count` bones and reset every matrix to identity
    pub fn reset(&mut self, bone_count: usize) {
        self.render.clear();
        self.render.resize(bone_count, Mat3x4::IDENTITY);
        self.light.clear();
        self.light.resize(bone_count, Mat3x4::IDENTITY);
    }

    /// Number of bones
    pub fn len(&self) -> usize {
        self.render.len()
    }

    pub fn is_empty(&self) -> bool {
        self.render.is_empty()
    }

    /// World position of a bone according to its light matrix
    pub fn bone_position(&self, bone: usize) -> Option<Vec3> {
        self.light.get(bone).map(Mat3x4::translation)
    }
}

/// Matrices that root bones are concatenated onto
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMatrices {
    /// Entity rotation and origin, feeding the light matrices
    pub rotation: Mat3x4,
    /// View-space transform feeding the render matrices, if any
    pub alias: Option<Mat3x4>,
}

impl Default for RootMatrices {
    fn default() -> Self {
        Self {
            rotation: Mat3x4::IDENTITY,
            alias: None,
        }
    }
}

/// Render and light matrices saved from a previously animated model
///
/// Name lookup is ASCII case-insensitive; the first bone with a given name
/// wins.
#[derive(Debug, Clone, Default)]
pub struct BoneCache {
    names: Vec<String>,
    render: Vec<Mat3x4>,
    light: Vec<Mat3x4>,
    lookup: HashMap<String, usize>,
}

impl BoneCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cache with the bones of a just-animated model
    pub fn save(&mut self, bones: &[StudioBone], transforms: &BoneTransforms) {
        let count = bones.len().min(transforms.len());
        self.names.clear();
        self.render.clear();
        self.light.clear();
        self.lookup.clear();

        for (index, bone) in bones.iter().take(count).enumerate() {
            self.names.push(bone.name.clone());
            self.render.push(transforms.render[index]);
            self.light.push(transforms.light[index]);
            self.lookup
                .entry(bone.name.to_ascii_lowercase())
                .or_insert(index);
        }
    }

    /// Number of saved bones
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Saved render and light matrices for a bone name
    pub fn find(&self, name: &str) -> Option<(Mat3x4, Mat3x4)> {
        let index = *self.lookup.get(&name.to_ascii_lowercase())?;
        Some((self.render[index], self.light[index]))
    }
}

/// Compose world matrices for every bone of `pose`
///
/// Root bones are concatenated onto `root`; `fx` is applied to root render
/// matrices only. Bones whose name is found in `cache` copy the saved
/// matrices instead of composing their own. A parent that is out of range or
/// not yet computed is an error.
pub fn compose_bones<F>(
    bones: &[StudioBone],
    pose: &Pose,
    root: &RootMatrices,
    cache: Option<&BoneCache>,
    mut fx: F,
    out: &mut BoneTransforms,
) -> Result<()>
where
    F: FnMut(&mut Mat3x4),
{
    out.reset(bones.len());

    for (i, bone) in bones.iter().enumerate() {
        if let Some((render, light)) = cache.and_then(|cache| cache.find(&bone.name)) {
            out.render[i] = render;
            out.light[i] = light;
            continue;
        }

        let local = pose
            .get(i)
            .map(|p| Mat3x4::from_quat_position(p.rotation, p.position))
            .unwrap_or(Mat3x4::IDENTITY);

        if bone.is_root() {
            let light = root.rotation.concat(&local);
            let mut render = match &root.alias {
                Some(alias) => alias.concat(&local),
                None => light,
            };
            fx(&mut render);
            out.render[i] = render;
            out.light[i] = light;
        } else {
            let parent = bone
                .parent_index()
                .filter(|&parent| parent < i)
                .ok_or(StudioError::UnresolvedParent {
                    bone: i,
                    parent: bone.parent,
                })?;
            out.render[i] = out.render[parent].concat(&local);
            out.light[i] = out.light[parent].concat(&local);
        }
    }

    Ok(())
}

/// World positions of a model's attachments
///
/// Each attachment origin is transformed by the light matrix of its bone.
pub fn calc_attachments(
    attachments: &[StudioAttachment],
    transforms: &BoneTransforms,
) -> Result<Vec<Vec3>> {
    if attachments.len() > MAX_ATTACHMENTS {
        return Err(StudioError::TooManyAttachments(attachments.len()));
    }

    attachments
        .iter()
        .map(|attachment| {
            attachment
                .bone_index()
                .and_then(|bone| transforms.light.get(bone))
                .map(|matrix| matrix.transform_point(attachment.org))
                .ok_or_else(|| {
                    StudioError::ParseError(format!(
                        "attachment '{}' references missing bone {}",
                        attachment.name, attachment.bone
                    ))
                })
        })
        .collect()
}

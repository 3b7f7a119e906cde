//! Builder laying out binary studio models from typed parts
//!
//! Used by tests, benches and tools to produce real `.mdl` bytes that go
//! through the same parser as files on disk.
//!
//! ```
//! use studio_mdl::builder::{AnimLayer, ModelBuilder};
//! use studio_mdl::chunks::{StudioBone, StudioSequence};
//! use studio_mdl::StudioModel;
//!
//! let built = ModelBuilder::new("box.mdl")
//!     .bone(StudioBone { name: "root".into(), ..Default::default() })
//!     .animated_sequence(
//!         StudioSequence { label: "slide".into(), num_frames: 2, ..Default::default() },
//!         vec![AnimLayer::new().channel(0, 0, &[(2, &[0, 10])])],
//!     )
//!     .build()
//!     .unwrap();
//!
//! let model = StudioModel::parse(built.model).unwrap();
//! assert_eq!(model.sequences[0].label, "slide");
//! ```

use std::collections::BTreeMap;

use crate::animation::curve::encode_curve;
use crate::chunks::{
    ANIM_RECORD_SIZE, ATTACHMENT_SIZE, AnimRecord, BONE_CONTROLLER_SIZE, BONE_SIZE, CHANNEL_COUNT,
    EVENT_SIZE, SEQUENCE_GROUP_SIZE, SEQUENCE_SIZE, StudioAttachment, StudioBone,
    StudioBoneController, StudioSequence, StudioSequenceGroup,
};
use crate::error::{Result, StudioError};
use crate::header::{
    HEADER_SIZE, SEQUENCE_GROUP_HEADER_SIZE, STUDIO_VERSION, SequenceGroupHeader, StudioArray,
    StudioHeader,
};

/// Compressed curves of one blend layer, keyed by `(bone, channel)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimLayer {
    curves: BTreeMap<(usize, usize), Vec<u8>>,
}

impl AnimLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a curve for one channel of a bone
    ///
    /// Each span is `(total, samples)`, see [`encode_curve`].
    pub fn channel(mut self, bone: usize, channel: usize, spans: &[(u8, &[i16])]) -> Self {
        self.curves.insert((bone, channel), encode_curve(spans));
        self
    }

    /// Add a curve of already encoded slots
    pub fn raw_channel(mut self, bone: usize, channel: usize, data: Vec<u8>) -> Self {
        self.curves.insert((bone, channel), data);
        self
    }

    /// Lay out `num_bones` records followed by the curve data
    ///
    /// Offsets are relative to each record, and records of consecutive
    /// layers follow each other, so layers are encoded together.
    fn encode_layers(layers: &[AnimLayer], num_bones: usize) -> Result<Vec<u8>> {
        let records_len = layers.len() * num_bones * ANIM_RECORD_SIZE;
        let mut records = vec![AnimRecord::default(); layers.len() * num_bones];
        let mut tail = Vec::new();

        for (layer_index, layer) in layers.iter().enumerate() {
            for (&(bone, channel), curve) in &layer.curves {
                if bone >= num_bones || channel >= CHANNEL_COUNT {
                    return Err(StudioError::ParseError(format!(
                        "curve for bone {bone} channel {channel} is outside the skeleton"
                    )));
                }
                let record_index = layer_index * num_bones + bone;
                let record_pos = record_index * ANIM_RECORD_SIZE;
                let curve_pos = records_len + tail.len();
                let offset = u16::try_from(curve_pos - record_pos).map_err(|_| {
                    StudioError::ParseError(format!(
                        "curve for bone {bone} channel {channel} is too far from its record"
                    ))
                })?;
                records[record_index].offsets[channel] = offset;
                tail.extend_from_slice(curve);
            }
        }

        let mut data = Vec::with_capacity(records_len + tail.len());
        for record in &records {
            record.write(&mut data)?;
        }
        data.extend_from_slice(&tail);
        Ok(data)
    }
}

#[derive(Debug, Clone)]
struct SequenceEntry {
    sequence: StudioSequence,
    layers: Vec<AnimLayer>,
    group: Option<String>,
}

/// Bytes of a built model and its external sequence group files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltModel {
    pub model: Vec<u8>,
    /// `(group file name, bytes)` in group order, starting at group 1
    pub groups: Vec<(String, Vec<u8>)>,
}

/// Assembles a studio model from bones, controllers, sequences and curves
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    name: String,
    bones: Vec<StudioBone>,
    controllers: Vec<StudioBoneController>,
    attachments: Vec<StudioAttachment>,
    sequences: Vec<SequenceEntry>,
}

impl ModelBuilder {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn bone(mut self, bone: StudioBone) -> Self {
        self.bones.push(bone);
        self
    }

    pub fn controller(mut self, controller: StudioBoneController) -> Self {
        self.controllers.push(controller);
        self
    }

    pub fn attachment(mut self, attachment: StudioAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Add a sequence whose channels all hold the bone defaults
    pub fn sequence(self, sequence: StudioSequence) -> Self {
        self.animated_sequence(sequence, Vec::new())
    }

    /// Add a sequence stored in the model, one [`AnimLayer`] per blend
    ///
    /// Missing layers up to the sequence's blend count are left static.
    pub fn animated_sequence(mut self, sequence: StudioSequence, layers: Vec<AnimLayer>) -> Self {
        self.sequences.push(SequenceEntry {
            sequence,
            layers,
            group: None,
        });
        self
    }

    /// Add a static sequence stored in the external group file `group`
    pub fn external_sequence<S: Into<String>>(self, group: S, sequence: StudioSequence) -> Self {
        self.external_animated_sequence(group, sequence, Vec::new())
    }

    /// Add an animated sequence stored in the external group file `group`
    ///
    /// Sequences naming the same file share one group.
    pub fn external_animated_sequence<S: Into<String>>(
        mut self,
        group: S,
        sequence: StudioSequence,
        layers: Vec<AnimLayer>,
    ) -> Self {
        self.sequences.push(SequenceEntry {
            sequence,
            layers,
            group: Some(group.into()),
        });
        self
    }

    /// Lay out the model and its group files
    pub fn build(&self) -> Result<BuiltModel> {
        let num_bones = self.bones.len();

        let mut group_names: Vec<String> = Vec::new();
        for entry in &self.sequences {
            if let Some(name) = &entry.group
                && !group_names.contains(name)
            {
                group_names.push(name.clone());
            }
        }

        let mut group_files: Vec<Vec<u8>> = group_names
            .iter()
            .map(|_| vec![0u8; SEQUENCE_GROUP_HEADER_SIZE])
            .collect();
        let mut internal_anim = Vec::new();

        let bones_offset = HEADER_SIZE;
        let controllers_offset = bones_offset + num_bones * BONE_SIZE;
        let sequences_offset = controllers_offset + self.controllers.len() * BONE_CONTROLLER_SIZE;
        let events_offset = sequences_offset + self.sequences.len() * SEQUENCE_SIZE;
        let event_count: usize = self.sequences.iter().map(|e| e.sequence.events.len()).sum();
        let groups_offset = events_offset + event_count * EVENT_SIZE;
        let group_count = 1 + group_names.len();
        let attachments_offset = groups_offset + group_count * SEQUENCE_GROUP_SIZE;
        let anim_offset = attachments_offset + self.attachments.len() * ATTACHMENT_SIZE;

        let mut sequences = Vec::with_capacity(self.sequences.len());
        let mut next_event = events_offset;

        for entry in &self.sequences {
            let mut sequence = entry.sequence.clone();
            let mut layers = entry.layers.clone();
            layers.resize(sequence.blend_count().max(layers.len()).max(1), AnimLayer::new());
            let anim = AnimLayer::encode_layers(&layers, num_bones)?;

            match &entry.group {
                None => {
                    sequence.seq_group = 0;
                    sequence.anim_index = to_i32(anim_offset + internal_anim.len())?;
                    internal_anim.extend_from_slice(&anim);
                }
                Some(name) => {
                    let index = group_names.iter().position(|n| n == name).unwrap_or(0);
                    let file = &mut group_files[index];
                    sequence.seq_group = to_i32(index + 1)?;
                    sequence.anim_index = to_i32(file.len())?;
                    file.extend_from_slice(&anim);
                }
            }

            sequence.event_table =
                StudioArray::new(to_i32(sequence.events.len())?, to_i32(next_event)?);
            next_event += sequence.events.len() * EVENT_SIZE;
            sequences.push(sequence);
        }

        let mut groups = vec![StudioSequenceGroup {
            label: "default".to_string(),
            name: self.name.clone(),
            ..Default::default()
        }];
        groups.extend(group_names.iter().map(|name| StudioSequenceGroup {
            label: "default".to_string(),
            name: name.clone(),
            ..Default::default()
        }));

        let total = anim_offset + internal_anim.len();
        let header = StudioHeader {
            version: STUDIO_VERSION,
            name: self.name.clone(),
            length: to_i32(total)?,
            bones: table(num_bones, bones_offset)?,
            bone_controllers: table(self.controllers.len(), controllers_offset)?,
            sequences: table(sequences.len(), sequences_offset)?,
            sequence_groups: table(groups.len(), groups_offset)?,
            attachments: table(self.attachments.len(), attachments_offset)?,
            ..Default::default()
        };

        let mut model = Vec::with_capacity(total);
        header.write(&mut model)?;
        for bone in &self.bones {
            bone.write(&mut model)?;
        }
        for controller in &self.controllers {
            controller.write(&mut model)?;
        }
        for sequence in &sequences {
            sequence.write(&mut model)?;
        }
        for sequence in &sequences {
            for event in &sequence.events {
                event.write(&mut model)?;
            }
        }
        for group in &groups {
            group.write(&mut model)?;
        }
        for attachment in &self.attachments {
            attachment.write(&mut model)?;
        }
        model.extend_from_slice(&internal_anim);

        let mut built_groups = Vec::with_capacity(group_names.len());
        for (name, mut file) in group_names.into_iter().zip(group_files) {
            let group_header = SequenceGroupHeader {
                version: STUDIO_VERSION,
                name: name.clone(),
                length: to_i32(file.len())?,
            };
            let mut head = Vec::with_capacity(SEQUENCE_GROUP_HEADER_SIZE);
            group_header.write(&mut head)?;
            file[..SEQUENCE_GROUP_HEADER_SIZE].copy_from_slice(&head);
            built_groups.push((name, file));
        }

        Ok(BuiltModel {
            model,
            groups: built_groups,
        })
    }
}

fn to_i32(value: usize) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| StudioError::ParseError(format!("value {value} does not fit the format")))
}

fn table(count: usize, offset: usize) -> Result<StudioArray> {
    Ok(StudioArray::new(to_i32(count)?, to_i32(offset)?))
}

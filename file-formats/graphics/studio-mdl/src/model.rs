use std::fmt;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use custom_debug::Debug;

use crate::animation::curve::AnimTrack;
use crate::chunks::{
    ANIM_RECORD_SIZE, ATTACHMENT_SIZE, BONE_CONTROLLER_SIZE, BONE_SIZE, EVENT_SIZE,
    SEQUENCE_GROUP_SIZE, SEQUENCE_SIZE, StudioAttachment, StudioBone, StudioBoneController,
    StudioEvent, StudioSequence, StudioSequenceGroup,
};
use crate::error::{Result, StudioError};
use crate::file_resolver::{DirectoryResolver, FileResolver};
use crate::header::{HEADER_SIZE, SequenceGroupHeader, StudioArray, StudioHeader};

/// Largest skeleton accepted by the parser
pub const MAX_BONES: usize = 128;

/// First bone that keeps the main pose when a gait sequence is overlaid
pub const SPINE_BONE_NAME: &str = "Bip01 Spine";

fn trimmed_fmt<T: fmt::Debug>(items: &Vec<T>, f: &mut fmt::Formatter) -> fmt::Result {
    const FIRST_N: usize = 3;
    if items.len() <= FIRST_N {
        write!(f, "{:#?}", items)
    } else {
        write!(f, "{:#?} + {} elements", &items[..FIRST_N], items.len() - FIRST_N)
    }
}

fn byte_len_fmt(data: &Bytes, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "<{} bytes>", data.len())
}

fn groups_fmt(groups: &Vec<OnceLock<Bytes>>, f: &mut fmt::Formatter) -> fmt::Result {
    let loaded = groups.iter().filter(|group| group.get().is_some()).count();
    write!(f, "<{loaded}/{} loaded>", groups.len())
}

fn failures_fmt(failed: &Vec<AtomicBool>, f: &mut fmt::Formatter) -> fmt::Result {
    let count = failed.iter().filter(|flag| flag.load(Ordering::Relaxed)).count();
    write!(f, "<{count} failed>")
}

fn resolver_fmt(
    resolver: &Option<Box<dyn FileResolver + Send + Sync>>,
    f: &mut fmt::Formatter,
) -> fmt::Result {
    f.write_str(if resolver.is_some() { "Some(..)" } else { "None" })
}

/// Read `array.count` fixed-size records through `parse`
fn read_table<T, F>(
    data: &[u8],
    array: &StudioArray,
    record_size: usize,
    what: &'static str,
    parse: F,
) -> Result<Vec<T>>
where
    F: Fn(&mut Cursor<&[u8]>) -> Result<T>,
{
    let range = array.byte_range(record_size, data.len(), what)?;
    let mut cursor = Cursor::new(&data[range]);
    (0..array.len()).map(|_| parse(&mut cursor)).collect()
}

/// A parsed studio model with its animation data
///
/// The records the animation pipeline needs are decoded up front; curve
/// data stays in the raw buffer and is read on demand. Sequences stored in
/// external group files are loaded the first time they are evaluated.
#[derive(Debug)]
pub struct StudioModel {
    pub header: StudioHeader,
    #[debug(with = trimmed_fmt)]
    pub bones: Vec<StudioBone>,
    #[debug(with = trimmed_fmt)]
    pub bone_controllers: Vec<StudioBoneController>,
    #[debug(with = trimmed_fmt)]
    pub sequences: Vec<StudioSequence>,
    pub sequence_groups: Vec<StudioSequenceGroup>,
    pub attachments: Vec<StudioAttachment>,
    spine_bone: Option<usize>,
    #[debug(with = byte_len_fmt)]
    data: Bytes,
    #[debug(with = groups_fmt)]
    groups: Vec<OnceLock<Bytes>>,
    /// Groups whose last load failed; skipped by `group_data`
    #[debug(with = failures_fmt)]
    failed_groups: Vec<AtomicBool>,
    #[debug(with = resolver_fmt)]
    resolver: Option<Box<dyn FileResolver + Send + Sync>>,
}

impl StudioModel {
    /// Parse a model from its raw bytes
    pub fn parse<B: Into<Bytes>>(data: B) -> Result<Self> {
        let data: Bytes = data.into();
        if data.len() < HEADER_SIZE {
            return Err(StudioError::OutOfBounds {
                what: "header",
                offset: 0,
                len: data.len(),
            });
        }

        let header = StudioHeader::parse(&mut Cursor::new(&data[..]))?;

        if header.bones.len() > MAX_BONES {
            return Err(StudioError::ParseError(format!(
                "model has {} bones, at most {MAX_BONES} are supported",
                header.bones.len()
            )));
        }

        let bones = read_table(&data, &header.bones, BONE_SIZE, "bones", |r| {
            StudioBone::parse(r)
        })?;
        for (index, bone) in bones.iter().enumerate() {
            if bone.parent >= bones.len() as i32 || bone.parent < -1 {
                return Err(StudioError::ParseError(format!(
                    "bone {index} ('{}') has invalid parent {}",
                    bone.name, bone.parent
                )));
            }
        }

        let bone_controllers = read_table(
            &data,
            &header.bone_controllers,
            BONE_CONTROLLER_SIZE,
            "bone controllers",
            |r| StudioBoneController::parse(r),
        )?;

        let mut sequences = read_table(&data, &header.sequences, SEQUENCE_SIZE, "sequences", |r| {
            StudioSequence::parse(r)
        })?;
        for sequence in &mut sequences {
            sequence.events = read_table(&data, &sequence.event_table, EVENT_SIZE, "events", |r| {
                StudioEvent::parse(r)
            })?;
        }

        let sequence_groups = read_table(
            &data,
            &header.sequence_groups,
            SEQUENCE_GROUP_SIZE,
            "sequence groups",
            |r| StudioSequenceGroup::parse(r),
        )?;

        let attachments = read_table(
            &data,
            &header.attachments,
            ATTACHMENT_SIZE,
            "attachments",
            |r| StudioAttachment::parse(r),
        )?;
        for attachment in &attachments {
            if attachment.bone_index().is_none_or(|bone| bone >= bones.len()) {
                return Err(StudioError::ParseError(format!(
                    "attachment '{}' references missing bone {}",
                    attachment.name, attachment.bone
                )));
            }
        }

        let spine_bone = bones.iter().position(|bone| bone.name == SPINE_BONE_NAME);
        let groups = (0..sequence_groups.len()).map(|_| OnceLock::new()).collect();
        let failed_groups = (0..sequence_groups.len()).map(|_| AtomicBool::new(false)).collect();

        log::debug!(
            "Parsed studio model '{}': {} bones, {} controllers, {} sequences, {} groups, {} attachments",
            header.name,
            bones.len(),
            bone_controllers.len(),
            sequences.len(),
            sequence_groups.len(),
            attachments.len()
        );

        Ok(Self {
            header,
            bones,
            bone_controllers,
            sequences,
            sequence_groups,
            attachments,
            spine_bone,
            data,
            groups,
            failed_groups,
            resolver: None,
        })
    }

    /// Parse a model from a reader
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::parse(data)
    }

    /// Load a model from disk
    ///
    /// External sequence groups are resolved next to the model file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let model = Self::parse(data)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(model.with_resolver(DirectoryResolver::new(base)))
    }

    /// Use `resolver` to load external sequence groups
    ///
    /// Previously failed groups become eligible for loading again.
    pub fn with_resolver<R>(mut self, resolver: R) -> Self
    where
        R: FileResolver + Send + Sync + 'static,
    {
        self.resolver = Some(Box::new(resolver));
        for flag in &self.failed_groups {
            flag.store(false, Ordering::Relaxed);
        }
        self
    }

    /// Internal model name
    pub fn name(&self) -> &str {
        &self.header.name
    }

    /// Raw model bytes
    pub fn raw_data(&self) -> &Bytes {
        &self.data
    }

    pub fn sequence(&self, index: usize) -> Option<&StudioSequence> {
        self.sequences.get(index)
    }

    /// Index of the first bone named `name`
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.name == name)
    }

    /// Index of the first bone named `Bip01 Spine`
    pub fn spine_bone(&self) -> Option<usize> {
        self.spine_bone
    }

    /// Check if an external sequence group has been loaded
    pub fn is_group_loaded(&self, group: usize) -> bool {
        group == 0 || self.groups.get(group).is_some_and(|cell| cell.get().is_some())
    }

    /// Check if the last attempt to load a sequence group failed
    pub fn is_group_failed(&self, group: usize) -> bool {
        self.failed_groups
            .get(group)
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Bytes holding the animation data of a sequence group
    ///
    /// Group 0 is the model itself. Other groups are read through the
    /// resolver on first use and kept for the lifetime of the model. Every
    /// call retries a group that failed before; a success clears the failure.
    pub fn load_sequence_group(&self, group: usize) -> Result<&Bytes> {
        if group == 0 {
            return Ok(&self.data);
        }

        let cell = self
            .groups
            .get(group)
            .ok_or_else(|| StudioError::SequenceGroupLoad {
                group,
                reason: format!("model has {} sequence groups", self.groups.len()),
            })?;
        if let Some(data) = cell.get() {
            return Ok(data);
        }

        let resolver = self
            .resolver
            .as_ref()
            .ok_or_else(|| StudioError::SequenceGroupLoad {
                group,
                reason: "no file resolver configured".to_string(),
            })?;

        let info = &self.sequence_groups[group];
        let raw = resolver.load_sequence_group(group, info)?;
        let group_header = SequenceGroupHeader::parse(&mut Cursor::new(&raw[..]))?;

        log::info!(
            "Loaded sequence group {group} '{}' ({}, {} bytes)",
            info.name,
            group_header.name,
            raw.len()
        );

        if let Some(flag) = self.failed_groups.get(group) {
            flag.store(false, Ordering::Relaxed);
        }
        Ok(cell.get_or_init(|| Bytes::from(raw)))
    }

    /// Like [`load_sequence_group`](Self::load_sequence_group), but a group
    /// that failed is reported once and then skipped until it is loaded
    /// explicitly or the resolver is replaced
    pub fn group_data(&self, group: usize) -> Option<&Bytes> {
        if group != 0 && self.is_group_failed(group) {
            return None;
        }

        match self.load_sequence_group(group) {
            Ok(data) => Some(data),
            Err(err) => {
                log::warn!("Sequence group {group} unavailable: {err}");
                if let Some(flag) = self.failed_groups.get(group) {
                    flag.store(true, Ordering::Relaxed);
                }
                None
            }
        }
    }

    /// Animation records of one blend layer of `sequence`
    ///
    /// Returns `None` when the group cannot be loaded or the records do not
    /// fit in its data; the caller then samples bone defaults.
    pub fn anim_track(&self, sequence: &StudioSequence, layer: usize) -> Option<AnimTrack<'_>> {
        let group = sequence.group_index();
        let data = self.group_data(group)?;

        let mut base = usize::try_from(sequence.anim_index).ok()?;
        if group == 0 {
            let group_offset = self.sequence_groups.first().map_or(0, |g| g.data);
            base = base.checked_add(usize::try_from(group_offset).ok()?)?;
        }
        let layer_offset = layer.checked_mul(self.bones.len() * ANIM_RECORD_SIZE)?;
        base = base.checked_add(layer_offset)?;

        let track = AnimTrack::new(data, base, self.bones.len());
        if track.is_none() {
            log::warn!(
                "Sequence '{}' layer {layer} records at {base} run past group {group} ({} bytes)",
                sequence.label,
                data.len()
            );
        }
        track
    }
}

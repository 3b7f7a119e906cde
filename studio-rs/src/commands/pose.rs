//! `pose` command: evaluate a sequence and print world bone positions

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use glam::Vec3;
use serde::Serialize;
use std::path::PathBuf;
use studio_mdl::animation::{
    AnimationSettings, Animator, EntityAnimationState, FrameClock, GaitState, PlayerMotion,
    RenderPath, estimate_frame,
};
use studio_mdl::chunks::StudioEvent;

use crate::utils::{add_table_row, create_table, format_vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct PoseArgs {
    /// Path to the MDL file
    pub file: PathBuf,

    /// Sequence index or label
    #[arg(short, long, default_value = "0")]
    pub sequence: String,

    /// Seconds since the sequence started
    #[arg(short, long, default_value_t = 0.0)]
    pub time: f64,

    /// Length of the frame that ends at `--time`, bounding the event window
    #[arg(long, default_value_t = 0.1)]
    pub frametime: f64,

    /// Playback rate multiplier
    #[arg(long, default_value_t = 1.0)]
    pub framerate: f32,

    /// Blend inputs, up to two bytes
    #[arg(long, value_delimiter = ',', num_args = 1..=2)]
    pub blend: Vec<u8>,

    /// Bone controller inputs, up to four bytes
    #[arg(long, value_delimiter = ',', num_args = 1..=4)]
    pub controller: Vec<u8>,

    /// Mouth controller input
    #[arg(long, default_value_t = 0)]
    pub mouth: u8,

    /// Evaluate as a player with this leg sequence (index or label)
    #[arg(long)]
    pub gait: Option<String>,

    /// List client events fired in the last frame window
    #[arg(short, long)]
    pub events: bool,

    /// Disable frame and controller interpolation
    #[arg(long)]
    pub no_interp: bool,

    /// Drive the gait from the reported velocity instead of origin deltas
    #[arg(long)]
    pub velocity_gait: bool,

    /// Produce software-renderer matrices
    #[arg(long)]
    pub software: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl PoseArgs {
    /// Animation settings selected by the flags
    pub fn settings(&self) -> AnimationSettings {
        AnimationSettings {
            interpolate: !self.no_interp,
            gait_estimation: !self.velocity_gait,
            render_path: if self.software {
                RenderPath::Software
            } else {
                RenderPath::Hardware
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PoseReport {
    pub model: String,
    pub sequence: usize,
    pub label: String,
    pub time: f64,
    pub frame: f64,
    pub settings: AnimationSettings,
    pub bones: Vec<BoneReport>,
    pub attachments: Vec<[f32; 3]>,
    pub events: Vec<EventReport>,
}

#[derive(Debug, Serialize)]
pub struct BoneReport {
    pub index: usize,
    pub name: String,
    pub parent: i32,
    pub position: [f32; 3],
}

#[derive(Debug, Serialize)]
pub struct EventReport {
    pub frame: i32,
    pub event: i32,
    pub options: String,
}

impl From<&StudioEvent> for EventReport {
    fn from(event: &StudioEvent) -> Self {
        Self {
            frame: event.frame,
            event: event.event,
            options: event.options.clone(),
        }
    }
}

pub fn execute(args: &PoseArgs) -> Result<()> {
    let report = evaluate(args)?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print_report(&report),
    }

    Ok(())
}

/// Run the animator once for the requested sequence and time
pub fn evaluate(args: &PoseArgs) -> Result<PoseReport> {
    let model = super::load_model(&args.file)?;
    let sequence = super::find_sequence(&model, &args.sequence)?;
    let settings = args.settings();

    let mut state = EntityAnimationState::new(sequence);
    state.framerate = args.framerate;
    state.mouth = args.mouth;
    for (slot, value) in state.blending.iter_mut().zip(&args.blend) {
        *slot = *value;
    }
    for (slot, value) in state.controller.iter_mut().zip(&args.controller) {
        *slot = *value;
    }
    state.latched.prev_blending = state.blending;
    state.latched.prev_controller = state.controller;

    let clock = FrameClock {
        time: args.time,
        old_time: args.time - args.frametime,
        frame_count: 1,
    };
    let mut animator = Animator::new(settings);

    let events = match &args.gait {
        Some(gait) => {
            let gait_sequence = super::find_sequence(&model, gait)?;
            let mut gait_state = GaitState::default();
            let motion = PlayerMotion {
                gait_sequence,
                velocity: Vec3::ZERO,
            };
            animator.update_player(&model, &mut state, &mut gait_state, &motion, &clock, args.events)
        }
        None => animator.update_entity(&model, &mut state, &clock, args.events),
    }
    .with_context(|| format!("Failed to evaluate sequence {sequence}"))?;

    if !args.events && !model.attachments.is_empty() {
        animator.calc_attachments(&model)?;
    }

    let bones = model
        .bones
        .iter()
        .enumerate()
        .map(|(index, bone)| BoneReport {
            index,
            name: bone.name.clone(),
            parent: bone.parent,
            position: animator
                .transforms()
                .bone_position(index)
                .unwrap_or_default()
                .to_array(),
        })
        .collect();

    let (label, frame) = model
        .sequence(state.sequence)
        .map(|s| {
            let frame = estimate_frame(s, &state, args.time, settings.interpolate);
            (s.label.clone(), frame)
        })
        .unwrap_or_default();

    Ok(PoseReport {
        model: model.name().to_string(),
        sequence,
        label,
        time: args.time,
        frame,
        settings,
        bones,
        attachments: animator.attachments().iter().map(|a| a.to_array()).collect(),
        events: events.iter().map(EventReport::from).collect(),
    })
}

fn print_report(report: &PoseReport) {
    println!(
        "{} sequence {} '{}' at {:.3}s (frame {:.2})",
        report.model, report.sequence, report.label, report.time, report.frame
    );

    let mut table = create_table(vec!["Index", "Bone", "Parent", "Position"]);
    for bone in &report.bones {
        add_table_row(
            &mut table,
            vec![
                bone.index.to_string(),
                bone.name.clone(),
                bone.parent.to_string(),
                format_vec3(bone.position),
            ],
        );
    }
    table.printstd();

    if !report.attachments.is_empty() {
        println!("\nAttachments:");
        for (i, attachment) in report.attachments.iter().enumerate() {
            println!("  {i}: {}", format_vec3(*attachment));
        }
    }

    if !report.events.is_empty() {
        println!("\nEvents:");
        for event in &report.events {
            println!("  frame {} event {} {}", event.frame, event.event, event.options);
        }
    }
}

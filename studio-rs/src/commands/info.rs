//! `info` command: header, skeleton, controllers and sequences

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};
use studio_mdl::StudioModel;
use studio_mdl::chunks::ControllerSlot;

use crate::utils::{NodeType, TreeNode, TreeOptions, add_table_row, create_table, render_tree};

#[derive(Args)]
pub struct InfoArgs {
    /// Path to the MDL file
    pub file: PathBuf,

    /// Maximum depth of the bone tree
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Dump the parsed model structure
    #[arg(short = 'D', long)]
    pub detailed: bool,
}

pub fn execute(args: &InfoArgs) -> Result<()> {
    let model = super::load_model(&args.file)?;
    let header = &model.header;

    println!("=== Studio Model Information ===");
    println!("Name: {}", header.name);
    println!("Version: {}", header.version);
    println!("Length: {} bytes", header.length);
    println!("Flags: {:?}", header.flags);
    println!(
        "Bones: {}  Controllers: {}  Sequences: {}  Groups: {}  Attachments: {}",
        model.bones.len(),
        model.bone_controllers.len(),
        model.sequences.len(),
        model.sequence_groups.len(),
        model.attachments.len()
    );
    if let Some(spine) = model.spine_bone() {
        println!("Gait split at bone {spine}");
    }

    let options = TreeOptions {
        max_depth: args.depth,
        no_color: args.no_color,
        ..Default::default()
    };
    println!("\nSkeleton:");
    print!("{}", render_tree(&skeleton_tree(&model), &options));

    if !model.sequence_groups.is_empty() {
        println!("\nSequence Groups:");
        print!("{}", render_tree(&group_tree(&model, &args.file), &options));
    }

    if !model.bone_controllers.is_empty() {
        println!("\nBone Controllers:");
        let mut table = create_table(vec!["Index", "Bone", "Channel", "Range", "Input"]);
        for (i, controller) in model.bone_controllers.iter().enumerate() {
            let bone = usize::try_from(controller.bone)
                .ok()
                .and_then(|b| model.bones.get(b))
                .map_or_else(|| "-".to_string(), |b| b.name.clone());
            let input = match controller.slot() {
                ControllerSlot::Primary(slot) => format!("controller {slot}"),
                ControllerSlot::Mouth => "mouth".to_string(),
            };
            add_table_row(
                &mut table,
                vec![
                    i.to_string(),
                    bone,
                    format!("{:?}", controller.kind),
                    format!("{} .. {}", controller.start, controller.end),
                    input,
                ],
            );
        }
        table.printstd();
    }

    if !model.sequences.is_empty() {
        println!("\nSequences:");
        let mut table = create_table(vec![
            "Index", "Label", "Frames", "FPS", "Blends", "Loop", "Group", "Events",
        ]);
        for (i, sequence) in model.sequences.iter().enumerate() {
            add_table_row(
                &mut table,
                vec![
                    i.to_string(),
                    sequence.label.clone(),
                    sequence.num_frames.to_string(),
                    format!("{:.1}", sequence.fps),
                    sequence.blend_count().to_string(),
                    if sequence.is_looping() { "yes" } else { "no" }.to_string(),
                    sequence.group_index().to_string(),
                    sequence.events.len().to_string(),
                ],
            );
        }
        table.printstd();
    }

    if args.detailed {
        println!("\n=== Detailed Information ===");
        println!("{model:#?}");
    }

    Ok(())
}

/// Bones nested under their parents, with attachments hung off their bones
fn skeleton_tree(model: &StudioModel) -> TreeNode {
    fn bone_node(model: &StudioModel, index: usize) -> TreeNode {
        let bone = &model.bones[index];
        let mut node = TreeNode::new(format!("[{index}] {}", bone.name), NodeType::Bone);
        for (i, attachment) in model.attachments.iter().enumerate() {
            if attachment.bone_index() == Some(index) {
                node = node.add_child(TreeNode::new(
                    format!("attachment {i} {}", attachment.name),
                    NodeType::Attachment,
                ));
            }
        }
        for child in (index + 1..model.bones.len())
            .filter(|&c| model.bones[c].parent_index() == Some(index))
        {
            node = node.add_child(bone_node(model, child));
        }
        node
    }

    let mut root = TreeNode::new(model.name(), NodeType::Root);
    for (i, _) in model.bones.iter().enumerate().filter(|(_, b)| b.is_root()) {
        root = root.add_child(bone_node(model, i));
    }
    root
}

fn group_tree(model: &StudioModel, path: &Path) -> TreeNode {
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut root = TreeNode::new("groups", NodeType::Header);

    for (i, group) in model.sequence_groups.iter().enumerate() {
        let sequences = model
            .sequences
            .iter()
            .filter(|s| s.group_index() == i)
            .count();
        let mut node = TreeNode::new(format!("[{i}] {}", group.label), NodeType::Group)
            .with_metadata("sequences", sequences);
        if i > 0 {
            let flat = Path::new(&group.name)
                .file_name()
                .map(|name| base.join(name));
            let exists = base.join(&group.name).is_file() || flat.is_some_and(|p| p.is_file());
            node = node.with_external_ref(&group.name, Some(exists));
        }
        root = root.add_child(node);
    }
    root
}

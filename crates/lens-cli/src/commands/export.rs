use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;

use lens_archive::{ArchiveReader, export_conversation};
use lens_config::LensConfig;

use crate::cli::{ExportArgs, GlobalFlags};
use crate::output::output;

#[derive(Serialize)]
struct Exported {
    conversation_id: String,
    path: PathBuf,
}

/// Handle `cvl export`.
pub fn handle(args: &ExportArgs, flags: &GlobalFlags, config: &LensConfig) -> anyhow::Result<()> {
    let archive_dir = super::archive_dir(flags, config);
    let reader = ArchiveReader::new(&archive_dir);
    let exports_dir = PathBuf::from("exports");

    let path = export_conversation(&reader, &exports_dir, &args.chat_id, args.format.into())
        .with_context(|| format!("failed to export conversation {}", args.chat_id))?;

    output(
        &Exported {
            conversation_id: args.chat_id.clone(),
            path,
        },
        flags.format,
    )
}

//! `pano tour`: normalize several images into a saved tour.
//!
//! Normalized images and thumbnails are written next to the tour JSON
//! and referenced by file name.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Args;
use pano_pipeline::Ticket;
use pano_tour::{Direction, EXPORT_FILENAME, Hotspot, Scene, SceneSpec, Tour, scene_id, upload_title};

use super::{CliError, extension_for, media_type_for, read_input, write_output};
use crate::args::ConfigArgs;

#[derive(Args, Debug)]
pub struct TourArgs {
    /// Input images, in tour order.
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Where to write the tour JSON.
    #[arg(short, long, default_value = EXPORT_FILENAME)]
    pub output: PathBuf,

    /// Link consecutive scenes with forward/backward arrows.
    #[arg(long)]
    pub chain: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run(args: &TourArgs) -> Result<(), CliError> {
    let config = args.config.to_config()?;
    let out_dir = args
        .output
        .parent()
        .map_or_else(PathBuf::new, Path::to_path_buf);

    let mut sources = Vec::with_capacity(args.images.len());
    for path in &args.images {
        let bytes = read_input(path)?;
        let name = path.to_string_lossy();
        pano_pipeline::check_upload(&bytes, &name, media_type_for(path), &config)?;
        sources.push(pano_pipeline::compress_for_upload(&bytes, &config)?);
    }

    // Submit everything before waiting so an offloading strategy can
    // work through the queue while results are collected.
    let normalizer = args.config.strategy().build(&config)?;
    let tickets: Vec<Ticket> = sources
        .iter()
        .map(|source| normalizer.submit(source.image.bytes.clone(), &config))
        .collect();

    let base_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    let mut tour = Tour::new();
    for (i, ticket) in tickets.into_iter().enumerate() {
        let normalized = ticket.wait()?;
        let id = scene_id(base_ms + i as u128);

        let image_name = format!("{id}.{}", extension_for(&normalized.image.media_type));
        write_output(&out_dir.join(&image_name), &normalized.image.bytes)?;

        let thumbnail = pano_pipeline::thumbnail::scene_thumbnail(&normalized)?;
        let thumbnail_name = format!("{id}-thumb.png");
        write_output(&out_dir.join(&thumbnail_name), &thumbnail.bytes)?;

        let spec = SceneSpec::new(id, upload_title(tour.len()), image_name)
            .with_thumbnail(thumbnail_name);
        tour.add_scene(Scene::from_normalized(spec, &normalized))?;
    }
    drop(normalizer);

    if args.chain {
        chain_scenes(&mut tour)?;
    }

    let created_at = humantime::format_rfc3339_seconds(SystemTime::now()).to_string();
    let json = tour.to_saved(created_at).to_json_pretty()?;
    write_output(&args.output, json.as_bytes())?;
    println!("{} scenes", tour.len());
    Ok(())
}

/// Forward arrow from each scene to the next, backward arrow back.
fn chain_scenes(tour: &mut Tour) -> Result<(), CliError> {
    let ids: Vec<String> = tour.scene_ids().map(str::to_owned).collect();
    for pair in ids.windows(2) {
        let [from, to] = pair else { continue };
        tour.add_hotspot(
            from,
            Hotspot::street_view(format!("forward_{to}"), 0.0, 0.0, to.clone(), Direction::Forward),
        )?;
        tour.add_hotspot(
            to,
            Hotspot::street_view(format!("backward_{from}"), 0.0, 180.0, from.clone(), Direction::Backward),
        )?;
    }
    Ok(())
}

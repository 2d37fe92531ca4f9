use dngpack::dng_pipeline::{CfaPattern, FrameLayout, RawToDngPipeline};
use dngpack::logger;

use anyhow::{Context, anyhow};
use tracing::{error, info};

const USAGE: &str =
    "usage: dngpack <raw-file> <width> <height> <bpp> <stride> <cfa> [thumbnail.jpg] [output.dng]";

fn main() -> anyhow::Result<()> {
    logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 6 {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    let layout = FrameLayout {
        width: args[1].parse().context("invalid width")?,
        height: args[2].parse().context("invalid height")?,
        bits_per_pixel: args[3].parse().context("invalid bpp")?,
        stride: args[4].parse().context("invalid stride")?,
        cfa_pattern: args[5].parse::<CfaPattern>().map_err(|e| anyhow!(e))?,
    };
    let raw_path = &args[0];
    let thumbnail_path = args.get(6);
    let output_path = args.get(7).map(String::as_str).unwrap_or("output.dng");

    info!(
        input = raw_path,
        width = layout.width,
        height = layout.height,
        bits_per_pixel = layout.bits_per_pixel,
        "starting dngpack"
    );

    let pipeline = RawToDngPipeline::new();
    match pipeline.pack_file(raw_path, thumbnail_path, output_path, layout) {
        Ok(()) => info!(output = output_path, "pack successful"),
        Err(e) => {
            error!("pack failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

mod bar;
mod config;
mod error;
mod geometry;
mod raster;
mod render;
mod scale;
mod srs;

use bar::{ScaleBar, ScaleBarOptions};
use config::FileConfig;
use geometry::GeoExtent;

/// Generate latitude-aware distance scale bars for map-projected planetary imagery
///
/// Examples:
///   # Scale bar for a Mars Mercator mosaic (spatial reference from mars.prj)
///   latbar mars_merc.tif -o mars_scalebar.svg
///
///   # Override the spatial reference and clip to the northern hemisphere
///   latbar mars_merc.tif --projection "+proj=merc +lat_ts=0 +a=3396190 +b=3376200" --cliplat 0
///
///   # No raster: projection string plus an explicit geographic extent
///   latbar --projection "+proj=stere +lat_0=90 +lon_0=0 +a=3396190 +b=3376200" \
///          --extent 55,0,90,360 --cliplat 60
///
///   # Custom ticks at a 1:2,000,000 scale
///   latbar lunar_lamb.tif --major-ticks 50,100,150 --minor-ticks 25 --mapscale 2000000
#[derive(Parser, Debug)]
#[command(name = "latbar")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a map-projected raster (GeoTIFF). Omit to use --projection/--extent mode
    input: Option<PathBuf>,

    /// Path to config file (optional, auto-searches latbar.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Projection definition (proj4 or WKT). Overrides the raster's sidecar .prj;
    /// required when no raster is given
    #[arg(short = 'p', long)]
    projection: Option<String>,

    /// Geographic extent as minlat,minlon,maxlat,maxlon (degrees); required
    /// in projection-string mode, ignored in image mode
    #[arg(long, allow_hyphen_values = true)]
    extent: Option<String>,

    /// Number of vertical sample nodes (even values are promoted to odd)
    #[arg(short = 'n', long, default_value = "51")]
    nnodes: usize,

    /// Latitude at which the bar is clipped, e.g. 0 for the equator
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    cliplat: f64,

    /// Latitude gridline interval in degrees
    #[arg(long, default_value = "5")]
    lat_tick_interval: f64,

    /// Map scale denominator, e.g. 1000000 for 1:1,000,000
    #[arg(short = 'm', long, default_value = "1000000")]
    mapscale: f64,

    /// Unlabeled tick distances in km, comma separated
    #[arg(long, value_delimiter = ',', default_value = "12.5")]
    minor_ticks: Vec<f64>,

    /// Labeled tick distances in km, comma separated
    #[arg(long, value_delimiter = ',', default_value = "25,50,75")]
    major_ticks: Vec<f64>,

    /// Draw only the right half instead of mirroring about the center
    #[arg(long)]
    asymmetrical: bool,

    /// Bar height in cm
    #[arg(long, default_value = "4.0")]
    height: f64,

    /// Label font size in points
    #[arg(long, default_value = "12")]
    fontsize: f64,

    /// Padding added to each edge in cm
    #[arg(long, default_value = "1.0")]
    padding: f64,

    /// Output SVG file path
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn parse_extent(spec: &str) -> Result<GeoExtent> {
    let parts: Vec<f64> = spec
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .context("Extent values must be numeric")?;
    if parts.len() != 4 {
        bail!("--extent needs exactly 4 values: minlat,minlon,maxlat,maxlon");
    }
    let extent = GeoExtent::new(parts[0], parts[1], parts[2], parts[3]);
    if extent.minlat >= extent.maxlat {
        bail!("--extent minlat must be south of maxlat");
    }
    Ok(extent)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    let file_config = if let Some(ref config_path) = args.config {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .context(format!("Failed to read config file: {:?}", config_path))?;
            Some(toml::from_str(&contents).context("Failed to parse config file")?)
        } else {
            bail!("Config file not found: {:?}", config_path);
        }
    } else {
        FileConfig::load()
    };
    let file_config = file_config.unwrap_or_default();

    // CLI flags win over the config file; a flag left at its default
    // falls back to the file value
    let nnodes = if args.nnodes != 51 {
        args.nnodes
    } else {
        file_config.nnodes
    };
    let cliplat = if args.cliplat != 0.0 {
        args.cliplat
    } else {
        file_config.cliplat
    };
    let lat_tick_interval = if (args.lat_tick_interval - 5.0).abs() > f64::EPSILON {
        args.lat_tick_interval
    } else {
        file_config.lat_tick_interval
    };
    let mapscale = if (args.mapscale - 1_000_000.0).abs() > 0.01 {
        args.mapscale
    } else {
        file_config.mapscale
    };
    let lon_minor_ticks = if args.minor_ticks != vec![12.5] {
        args.minor_ticks.clone()
    } else {
        file_config.lon_minor_ticks.clone()
    };
    let lon_major_ticks = if args.major_ticks != vec![25.0, 50.0, 75.0] {
        args.major_ticks.clone()
    } else {
        file_config.lon_major_ticks.clone()
    };
    let symmetrical = if args.asymmetrical {
        false
    } else {
        file_config.symmetrical
    };
    let height = if (args.height - 4.0).abs() > 0.01 {
        args.height
    } else {
        file_config.height
    };
    let fontsize = if (args.fontsize - 12.0).abs() > 0.01 {
        args.fontsize
    } else {
        file_config.fontsize
    };
    let padding = if (args.padding - 1.0).abs() > 0.01 {
        args.padding
    } else {
        file_config.padding
    };
    let projection = args
        .projection
        .clone()
        .or_else(|| file_config.projection.clone());
    let output = args.output.clone().or_else(|| file_config.output.clone());
    let verbose = args.verbose || file_config.verbose;

    if args.input.is_none() && projection.is_none() {
        bail!("Must provide either a raster path, or --projection with --extent");
    }
    if args.input.is_none() && args.extent.is_none() {
        bail!("--projection mode requires --extent minlat,minlon,maxlat,maxlon");
    }

    let output_path = output.unwrap_or_else(|| {
        if let Some(ref input) = args.input {
            input.with_extension("svg")
        } else {
            PathBuf::from("scalebar.svg")
        }
    });

    println!("latbar - Latitude-aware Scale Bar Generator");
    println!("===========================================");
    println!();

    if verbose {
        println!("Configuration:");
        if let Some(ref input) = args.input {
            println!("  Input raster: {}", input.display());
        }
        if let Some(ref p) = projection {
            println!("  Projection: {}", p);
        }
        if let Some(ref e) = args.extent {
            println!("  Extent: {}", e);
        }
        println!("  Sample nodes: {}", nnodes);
        println!("  Clip latitude: {}", cliplat);
        println!("  Latitude tick interval: {}", lat_tick_interval);
        println!("  Map scale: 1:{}", mapscale);
        println!("  Major ticks (km): {:?}", lon_major_ticks);
        println!("  Minor ticks (km): {:?}", lon_minor_ticks);
        println!("  Symmetrical: {}", symmetrical);
        println!("  Bar height: {}cm", height);
        println!("  Font size: {}pt", fontsize);
        println!("  Padding: {}cm", padding);
        println!("  Output: {}", output_path.display());
        println!();
    }

    let options = ScaleBarOptions {
        nnodes,
        cliplat,
        lat_tick_interval,
        mapscale,
        lon_minor_ticks,
        lon_major_ticks,
        symmetrical,
        height,
        fontsize,
        padding,
    };

    let start = Instant::now();
    let scalebar = if let Some(ref input) = args.input {
        println!("Reading raster metadata: {}", input.display());
        ScaleBar::from_image(input, projection.as_deref(), &options)
            .context("Failed to build scale bar from raster")?
    } else {
        let extent = parse_extent(args.extent.as_ref().unwrap())?;
        println!("Building scale bar from projection string");
        ScaleBar::from_projstring(projection.as_ref().unwrap(), &extent, &options)
            .context("Failed to build scale bar from projection string")?
    };
    println!(
        "Computed scale bar geometry: {:.1}cm x {:.1}cm [{:.2}s]",
        scalebar.layout().width,
        scalebar.layout().height,
        start.elapsed().as_secs_f32()
    );

    let start = Instant::now();
    scalebar
        .save(&output_path)
        .context("Failed to write SVG file")?;
    println!(
        "Wrote {} [{:.2}s]",
        output_path.display(),
        start.elapsed().as_secs_f32()
    );

    println!();
    println!(
        "Done! Total time: {:.2}s",
        total_start.elapsed().as_secs_f32()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extent() {
        let e = parse_extent("-40, 0, 40, 180").unwrap();
        assert_eq!(e.minlat, -40.0);
        assert_eq!(e.maxlon, 180.0);
    }

    #[test]
    fn test_parse_extent_rejects_bad_input() {
        assert!(parse_extent("1,2,3").is_err());
        assert!(parse_extent("40,0,-40,180").is_err());
        assert!(parse_extent("a,b,c,d").is_err());
    }
}
